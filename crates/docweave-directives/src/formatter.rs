//! Document formatter
//!
//! The surface a document pipeline drives: one trait bundling
//! classification, synthesis and extraction, and one implementation that
//! targets any engine described by an [`EngineSyntax`].

use crate::{
    classify::{FieldClassifier, FieldReference, ReferenceKind},
    error::Result,
    extract::{DirectiveStack, LoopExtractor, ScanSummary},
    synthesize::DirectiveSynthesizer,
    syntax::EngineSyntax,
};

/// Translates model fields to and from an engine's directive syntax
pub trait DocumentFormatter {
    /// Rewrite references to `field_name` into the loop item form
    fn rewrite_as_item(&self, content: &str, field_name: &str, force_as_item: bool) -> String;

    /// Opening foreach header for `item_name` over `sequence_name`
    fn loop_start(&self, item_name: &str, sequence_name: &str) -> String;

    /// Closing foreach marker
    fn loop_end(&self) -> String;

    /// Opening conditional on `field_name`
    fn if_start(&self, field_name: &str) -> String;

    /// Closing conditional marker
    fn if_end(&self) -> String;

    /// Loop counter variable
    fn loop_count(&self) -> String;

    /// Image registration call for `field_name`
    fn image(&self, field_name: &str) -> String;

    /// Dotted field reference built from path segments
    fn simple_field(&self, enclose_in_sigil: bool, segments: &[&str]) -> String;

    /// Classify how `field_name` occurs in `content`
    fn classify(&self, content: &str, field_name: &str) -> ReferenceKind;

    /// Whether `field_name` occurs in `content` as a live reference
    fn is_model_field(&self, content: &str, field_name: &str) -> bool {
        self.classify(content, field_name).is_reference()
    }

    /// Whether `content` holds any reference at all
    fn contains_reference(&self, content: &str) -> bool;

    /// Scan `content` for foreach directives
    fn extract_loops(
        &self,
        content: &str,
        stack: &mut DirectiveStack,
        preserve_stack: bool,
    ) -> ScanSummary;

    /// Container path of a field reference
    fn model_token_prefix<'t>(&self, reference: &'t str) -> Option<&'t str>;

    /// Token prepended to fields hoisted under a loop
    fn item_token(&self) -> String;
}

/// [`DocumentFormatter`] driven by an [`EngineSyntax`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateFormatter {
    syntax: EngineSyntax,
}

impl TemplateFormatter {
    /// Create a formatter, rejecting syntaxes that cannot drive the scanner
    pub fn new(syntax: EngineSyntax) -> Result<Self> {
        syntax.validate()?;
        Ok(Self { syntax })
    }

    /// Formatter for the Velocity engine
    pub fn velocity() -> Self {
        Self {
            syntax: EngineSyntax::velocity(),
        }
    }

    /// The engine syntax in use
    pub fn syntax(&self) -> &EngineSyntax {
        &self.syntax
    }

    /// Classifier bound to this formatter's syntax
    pub fn classifier(&self) -> FieldClassifier<'_> {
        FieldClassifier::new(&self.syntax)
    }

    /// Synthesizer bound to this formatter's syntax
    pub fn synthesizer(&self) -> DirectiveSynthesizer<'_> {
        DirectiveSynthesizer::new(&self.syntax)
    }

    /// Extractor bound to this formatter's syntax
    pub fn extractor(&self) -> LoopExtractor<'_> {
        LoopExtractor::new(&self.syntax)
    }

    /// Classify and wrap the result with the field name
    pub fn reference(&self, content: &str, field_name: &str) -> FieldReference {
        self.classifier().reference(content, field_name)
    }
}

impl DocumentFormatter for TemplateFormatter {
    fn rewrite_as_item(&self, content: &str, field_name: &str, force_as_item: bool) -> String {
        self.classifier()
            .rewrite_as_item(content, field_name, force_as_item)
    }

    fn loop_start(&self, item_name: &str, sequence_name: &str) -> String {
        self.synthesizer().loop_start(item_name, sequence_name)
    }

    fn loop_end(&self) -> String {
        self.synthesizer().loop_end()
    }

    fn if_start(&self, field_name: &str) -> String {
        self.synthesizer().if_start(field_name)
    }

    fn if_end(&self) -> String {
        self.synthesizer().if_end()
    }

    fn loop_count(&self) -> String {
        self.synthesizer().loop_count()
    }

    fn image(&self, field_name: &str) -> String {
        self.synthesizer().image(field_name)
    }

    fn simple_field(&self, enclose_in_sigil: bool, segments: &[&str]) -> String {
        self.synthesizer().simple_field(enclose_in_sigil, segments)
    }

    fn classify(&self, content: &str, field_name: &str) -> ReferenceKind {
        self.classifier().classify(content, field_name)
    }

    fn contains_reference(&self, content: &str) -> bool {
        self.classifier().contains_reference(content)
    }

    fn extract_loops(
        &self,
        content: &str,
        stack: &mut DirectiveStack,
        preserve_stack: bool,
    ) -> ScanSummary {
        self.extractor().extract(content, stack, preserve_stack)
    }

    fn model_token_prefix<'t>(&self, reference: &'t str) -> Option<&'t str> {
        self.extractor().model_token_prefix(reference)
    }

    fn item_token(&self) -> String {
        self.syntax.item_token()
    }
}
