// Logging setup for the CLI

use tracing::Level;

/// Pick the log level from the CLI flags
pub fn level_for(verbose: bool) -> Level {
    if verbose {
        Level::DEBUG
    } else {
        Level::WARN
    }
}

/// Install the stderr subscriber; stdout stays reserved for command output
pub fn init_logging(verbose: bool) {
    tracing_subscriber::fmt()
        .with_max_level(level_for(verbose))
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .init();
}
