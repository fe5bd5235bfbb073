//! Directive synthesis
//!
//! Formats the literal directive text spliced into a document for the
//! downstream engine. Nothing here fails: an empty name yields a degenerate
//! but well-formed directive.

use crate::syntax::EngineSyntax;

/// Builds directive text for one engine syntax
#[derive(Debug, Clone, Copy)]
pub struct DirectiveSynthesizer<'a> {
    syntax: &'a EngineSyntax,
}

impl<'a> DirectiveSynthesizer<'a> {
    /// Create a synthesizer for the given syntax
    pub fn new(syntax: &'a EngineSyntax) -> Self {
        Self { syntax }
    }

    /// Opening foreach header, e.g. `#foreach($item in $developers)`
    pub fn loop_start(&self, item_name: &str, sequence_name: &str) -> String {
        let mut directive = String::from(self.syntax.loop_open.as_str());
        directive.push_str(&self.syntax.with_sigil(item_name));
        directive.push_str(&self.syntax.in_delimiter());
        directive.push_str(&self.syntax.with_sigil(sequence_name));
        directive.push(self.syntax.header_close);
        directive
    }

    /// Closing foreach marker; independent of the loop it closes
    pub fn loop_end(&self) -> String {
        self.syntax.loop_close.clone()
    }

    /// Opening conditional, e.g. `#if( $visible)`
    pub fn if_start(&self, field_name: &str) -> String {
        let mut directive = String::from(self.syntax.if_open.as_str());
        directive.push_str(&self.syntax.with_sigil(field_name));
        directive.push(self.syntax.header_close);
        directive
    }

    /// Closing conditional marker
    pub fn if_end(&self) -> String {
        self.syntax.if_close.clone()
    }

    /// Built-in loop counter variable
    pub fn loop_count(&self) -> String {
        self.syntax.loop_counter.clone()
    }

    /// Image registration call, e.g. `${___imageRegistry.registerImage($logo)}`
    pub fn image(&self, field_name: &str) -> String {
        let mut directive = self.syntax.image_open();
        directive.push_str(&self.syntax.with_sigil(field_name));
        directive.push_str(&self.syntax.image_close());
        directive
    }

    /// Flatten path segments into an engine field reference
    ///
    /// The first segment is kept verbatim and every following segment gets
    /// its first character upper-cased: `[order, customer, name]` becomes
    /// `$order.Customer.Name`.
    pub fn simple_field<S: AsRef<str>>(&self, enclose_in_sigil: bool, segments: &[S]) -> String {
        let mut field = String::new();
        if enclose_in_sigil {
            field.push(self.syntax.sigil);
        }
        for (index, segment) in segments.iter().enumerate() {
            let segment = segment.as_ref();
            if index == 0 {
                field.push_str(segment);
                continue;
            }
            field.push('.');
            field.push_str(&capitalize(segment));
        }
        field
    }
}

fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
