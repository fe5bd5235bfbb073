// docweave CLI entry point

use clap::Parser;
use docweave_cli::{logging, router::Cli};

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    match docweave_cli::run(cli) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            tracing::debug!("Command failed: {:?}", e);
            eprintln!("{}", e.user_message());
            std::process::exit(1);
        }
    }
}
