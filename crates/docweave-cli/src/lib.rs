//! docweave command line interface
//!
//! Thin shell over `docweave-directives` for inspecting template text and
//! producing directives by hand.

pub mod commands;
pub mod error;
pub mod logging;
pub mod router;

pub use error::{CliError, CliResult};
pub use router::{run, Cli, Commands};
