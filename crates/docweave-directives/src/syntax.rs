//! Engine syntax configuration
//!
//! Every literal token the classifier, synthesizer and extractor emit or look
//! for lives here, so the same algorithms can target another engine by
//! swapping the configuration. Defaults reproduce Velocity.
//!
//! Syntax files can be YAML, TOML or JSON. Missing keys fall back to the
//! Velocity defaults:
//!
//! ```yaml
//! sigil: "$"
//! loop_open: "#foreach("
//! loop_close: "#end"
//! loop_counter: "$foreachCount"
//! ```

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SyntaxError};

/// Literal tokens of a target templating engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSyntax {
    /// Character introducing a reference (`$name`)
    pub sigil: char,
    /// Brace opening the braced reference form (`${name}`)
    pub open_brace: char,
    /// Brace closing the braced reference form
    pub close_brace: char,
    /// Opening prefix of a foreach header, up to and including its parenthesis
    pub loop_open: String,
    /// Marker closing a foreach block
    pub loop_close: String,
    /// Keyword separating the item from the sequence inside a foreach header
    pub in_keyword: String,
    /// Character terminating a directive header
    pub header_close: char,
    /// Opening of a conditional directive, including any padding
    pub if_open: String,
    /// Marker closing a conditional block
    pub if_close: String,
    /// Built-in variable holding the current loop iteration
    pub loop_counter: String,
    /// Name of the image registry object exposed to the template
    pub image_registry: String,
    /// Registry method that embeds an image
    pub image_register_call: String,
    /// Prefix given to fields hoisted under a loop item
    pub item_prefix: String,
}

impl Default for EngineSyntax {
    fn default() -> Self {
        Self {
            sigil: '$',
            open_brace: '{',
            close_brace: '}',
            loop_open: "#foreach(".to_string(),
            loop_close: "#end".to_string(),
            in_keyword: "in".to_string(),
            header_close: ')',
            if_open: "#if( ".to_string(),
            if_close: "#end".to_string(),
            loop_counter: "$velocityCount".to_string(),
            image_registry: "___imageRegistry".to_string(),
            image_register_call: "registerImage".to_string(),
            item_prefix: "item_".to_string(),
        }
    }
}

impl EngineSyntax {
    /// Syntax of the Velocity engine
    pub fn velocity() -> Self {
        Self::default()
    }

    /// Parse a syntax from YAML
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let syntax: Self =
            serde_yaml::from_str(content).map_err(|e| SyntaxError::parse("yaml", e))?;
        syntax.validate()?;
        Ok(syntax)
    }

    /// Parse a syntax from TOML
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let syntax: Self = toml::from_str(content).map_err(|e| SyntaxError::parse("toml", e))?;
        syntax.validate()?;
        Ok(syntax)
    }

    /// Parse a syntax from JSON
    pub fn from_json_str(content: &str) -> Result<Self> {
        let syntax: Self =
            serde_json::from_str(content).map_err(|e| SyntaxError::parse("json", e))?;
        syntax.validate()?;
        Ok(syntax)
    }

    /// Load a syntax file, picking the format from its extension
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading engine syntax from {}", path.display());

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let content = fs::read_to_string(path)?;

        match extension.as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&content),
            "toml" => Self::from_toml_str(&content),
            "json" => Self::from_json_str(&content),
            _ => Err(SyntaxError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Check that the syntax can drive the scanner and synthesizer
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("loop_open", &self.loop_open),
            ("loop_close", &self.loop_close),
            ("in_keyword", &self.in_keyword),
            ("if_open", &self.if_open),
            ("if_close", &self.if_close),
            ("item_prefix", &self.item_prefix),
        ];
        for (name, value) in required {
            if value.is_empty() {
                return Err(SyntaxError::Invalid(format!("{} must not be empty", name)));
            }
        }

        if self.in_keyword.chars().any(char::is_whitespace) {
            return Err(SyntaxError::Invalid(format!(
                "in_keyword must be a single word, got '{}'",
                self.in_keyword
            )));
        }
        if self.sigil.is_whitespace() {
            return Err(SyntaxError::Invalid("sigil must not be whitespace".to_string()));
        }
        if self.sigil == self.open_brace || self.sigil == self.close_brace {
            return Err(SyntaxError::Invalid(format!(
                "sigil '{}' collides with a brace",
                self.sigil
            )));
        }

        Ok(())
    }

    /// Token replacing the sigil of a field hoisted under a loop (`$item_`)
    pub fn item_token(&self) -> String {
        format!("{}{}", self.sigil, self.item_prefix)
    }

    /// Braced variant of [`item_token`](Self::item_token) (`${item_`)
    pub fn item_token_open_brace(&self) -> String {
        format!("{}{}{}", self.sigil, self.open_brace, self.item_prefix)
    }

    /// The in-keyword padded with the spaces that delimit it (` in `)
    pub fn in_delimiter(&self) -> String {
        format!(" {} ", self.in_keyword)
    }

    /// Opening of an image registration call (`${___imageRegistry.registerImage(`)
    pub fn image_open(&self) -> String {
        format!(
            "{}{}{}.{}(",
            self.sigil, self.open_brace, self.image_registry, self.image_register_call
        )
    }

    /// Closing of an image registration call (`)}`)
    pub fn image_close(&self) -> String {
        format!("){}", self.close_brace)
    }

    /// Prepend the sigil unless `name` already carries it
    pub(crate) fn with_sigil(&self, name: &str) -> String {
        if name.starts_with(self.sigil) {
            name.to_string()
        } else {
            format!("{}{}", self.sigil, name)
        }
    }

    /// Drop one leading sigil, if any
    pub(crate) fn strip_sigil<'a>(&self, name: &'a str) -> &'a str {
        name.strip_prefix(self.sigil).unwrap_or(name)
    }
}
