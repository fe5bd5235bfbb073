#![warn(missing_docs)]

//! Directive translation for document templates
//!
//! Translates between engine-neutral model fields (`developers.name`) and the
//! control-flow directives of a text-templating engine:
//! - classifying field occurrences in template snippets and rewriting them
//!   into loop item references
//! - synthesizing foreach, conditional, image and field directives
//! - extracting nested foreach structure from template text
//!
//! Every literal token comes from an [`EngineSyntax`]; Velocity is the
//! default engine.

pub mod classify;
pub mod error;
pub mod extract;
pub mod formatter;
pub mod synthesize;
pub mod syntax;

// Re-export public API
pub use classify::{FieldClassifier, FieldReference, ReferenceKind};
pub use error::{Result, SyntaxError};
pub use extract::{
    DirectiveStack, LoopDirective, LoopExtractor, MalformedReason, ScanEvent, ScanSummary,
};
pub use formatter::{DocumentFormatter, TemplateFormatter};
pub use synthesize::DirectiveSynthesizer;
pub use syntax::EngineSyntax;
