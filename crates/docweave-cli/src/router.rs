// Command line definition and dispatch

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use docweave_directives::{EngineSyntax, TemplateFormatter};
use tracing::debug;

use crate::{commands, error::CliResult};

/// docweave - translate model fields to and from template directives
#[derive(Parser, Debug)]
#[command(name = "docweave")]
#[command(bin_name = "docweave")]
#[command(about = "Translate model fields to and from template directives")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Engine syntax file (yaml, toml or json); defaults to Velocity
    #[arg(long, global = true, value_name = "PATH")]
    pub syntax: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Template text source; stdin when neither option is given
#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    /// Template text given inline
    #[arg(long, conflicts_with = "file")]
    pub content: Option<String>,

    /// File holding the template text
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Classify how a field occurs in template text
    Classify {
        /// Field name, e.g. developers.Name
        field: String,

        #[command(flatten)]
        input: InputArgs,
    },

    /// Rewrite references to a field into the loop item form
    Rewrite {
        /// Field name, e.g. developers.Name
        field: String,

        /// Prefix the item token even when no reference is found
        #[arg(long)]
        force: bool,

        #[command(flatten)]
        input: InputArgs,
    },

    /// Print a foreach header
    Loop {
        /// Loop variable
        item: String,

        /// Sequence being iterated
        sequence: String,
    },

    /// Print a conditional header
    If {
        /// Field tested by the conditional
        field: String,
    },

    /// Print an image registration call
    Image {
        /// Field holding the image
        field: String,
    },

    /// Print a dotted field reference built from path segments
    Field {
        /// Path segments, e.g. order customer name
        #[arg(required = true)]
        segments: Vec<String>,

        /// Leave out the leading sigil
        #[arg(long)]
        no_sigil: bool,
    },

    /// Print the loop counter variable
    Count,

    /// List the foreach directives found in template text
    Extract {
        #[command(flatten)]
        input: InputArgs,

        /// Report closers without popping open loops
        #[arg(long)]
        preserve_stack: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the container path of a field reference
    Prefix {
        /// Reference such as $developers.Name
        reference: String,
    },
}

/// Dispatch a parsed command line and return what should be printed
pub fn run(cli: Cli) -> CliResult<String> {
    let formatter = match &cli.syntax {
        Some(path) => {
            debug!("Using engine syntax from {}", path.display());
            TemplateFormatter::new(EngineSyntax::load_from_file(path)?)?
        }
        None => TemplateFormatter::velocity(),
    };

    match cli.command {
        Commands::Classify { field, input } => {
            Ok(commands::classify(&formatter, &field, &commands::read_input(&input)?))
        }
        Commands::Rewrite {
            field,
            force,
            input,
        } => Ok(commands::rewrite(
            &formatter,
            &field,
            &commands::read_input(&input)?,
            force,
        )),
        Commands::Loop { item, sequence } => Ok(commands::loop_start(&formatter, &item, &sequence)),
        Commands::If { field } => Ok(commands::if_start(&formatter, &field)),
        Commands::Image { field } => Ok(commands::image(&formatter, &field)),
        Commands::Field { segments, no_sigil } => {
            Ok(commands::simple_field(&formatter, &segments, !no_sigil))
        }
        Commands::Count => Ok(commands::loop_count(&formatter)),
        Commands::Extract {
            input,
            preserve_stack,
            json,
        } => commands::extract(
            &formatter,
            &commands::read_input(&input)?,
            preserve_stack,
            json,
        ),
        Commands::Prefix { reference } => commands::prefix(&formatter, &reference),
    }
}
