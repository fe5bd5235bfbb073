//! Field token classification
//!
//! Decides whether a model field appears in a template snippet as a live
//! engine reference and rewrites such references into the item form used
//! once the field is hoisted under a loop.
//!
//! Only the first sigil and the first occurrence of the field name are
//! compared. A snippet with several candidates (`$a $name`) is reported as
//! `NotPresent` even though `$name` is a reference.

use serde::{Deserialize, Serialize};

use crate::syntax::EngineSyntax;

/// How a field name occurs in a snippet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceKind {
    /// Sigil directly followed by the field (`$name`)
    BareSigil,
    /// Sigil, opening brace, then the field (`${name}`)
    BracedSigil,
    /// Literal text, or the field is absent
    NotPresent,
}

impl ReferenceKind {
    /// Whether the field is a live engine reference
    pub fn is_reference(&self) -> bool {
        !matches!(self, ReferenceKind::NotPresent)
    }
}

/// A field name together with how it occurs in a given snippet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldReference {
    /// Dotted field path (`developers.name`)
    pub name: String,
    /// Classification against the snippet it was looked up in
    pub kind: ReferenceKind,
}

impl FieldReference {
    /// Path segments of the field name
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.name.split('.')
    }
}

/// Classifies and rewrites field references for one engine syntax
#[derive(Debug, Clone, Copy)]
pub struct FieldClassifier<'a> {
    syntax: &'a EngineSyntax,
}

impl<'a> FieldClassifier<'a> {
    /// Create a classifier for the given syntax
    pub fn new(syntax: &'a EngineSyntax) -> Self {
        Self { syntax }
    }

    /// Classify how `field_name` occurs in `content`
    pub fn classify(&self, content: &str, field_name: &str) -> ReferenceKind {
        if content.is_empty() || field_name.is_empty() {
            return ReferenceKind::NotPresent;
        }
        let Some(sigil_index) = content.find(self.syntax.sigil) else {
            return ReferenceKind::NotPresent;
        };
        let Some(field_index) = content.find(field_name) else {
            return ReferenceKind::NotPresent;
        };

        let after_sigil = sigil_index + self.syntax.sigil.len_utf8();
        if field_index == after_sigil {
            return ReferenceKind::BareSigil;
        }

        let brace = self.syntax.open_brace;
        if field_index == after_sigil + brace.len_utf8()
            && content[..field_index].ends_with(brace)
        {
            return ReferenceKind::BracedSigil;
        }

        ReferenceKind::NotPresent
    }

    /// Classify and wrap the result with the field name
    pub fn reference(&self, content: &str, field_name: &str) -> FieldReference {
        FieldReference {
            name: field_name.to_string(),
            kind: self.classify(content, field_name),
        }
    }

    /// Whether `field_name` occurs in `content` as a live reference
    pub fn is_model_field(&self, content: &str, field_name: &str) -> bool {
        self.classify(content, field_name).is_reference()
    }

    /// Rewrite references to `field_name` into the item form
    ///
    /// `$name` becomes `$item_name` and `${name}` becomes `${item_name}`.
    /// When `content` holds no reference but `force_as_item` is set, the item
    /// token is prepended to the whole content, which callers use for bare
    /// field names they already know to be references.
    pub fn rewrite_as_item(&self, content: &str, field_name: &str, force_as_item: bool) -> String {
        let sigil = self.syntax.sigil;
        match self.classify(content, field_name) {
            ReferenceKind::BareSigil => content.replace(
                &format!("{}{}", sigil, field_name),
                &format!("{}{}", self.syntax.item_token(), field_name),
            ),
            ReferenceKind::BracedSigil => content.replace(
                &format!("{}{}{}", sigil, self.syntax.open_brace, field_name),
                &format!("{}{}", self.syntax.item_token_open_brace(), field_name),
            ),
            ReferenceKind::NotPresent if force_as_item => {
                format!("{}{}", self.syntax.item_token(), content)
            }
            ReferenceKind::NotPresent => content.to_string(),
        }
    }

    /// Coarse pre-filter: non-empty content containing the sigil
    pub fn contains_reference(&self, content: &str) -> bool {
        !content.is_empty() && content.contains(self.syntax.sigil)
    }
}
