// Command implementations
//
// Each command returns the text to print so it can be tested without a
// terminal.

use std::{
    fs,
    io::{self, Read},
};

use docweave_directives::{
    DirectiveStack, DocumentFormatter, LoopDirective, ScanEvent, ScanSummary, TemplateFormatter,
};
use serde::Serialize;
use tracing::debug;

use crate::{
    error::{CliError, CliResult},
    router::InputArgs,
};

/// Read template text from the inline option, a file, or stdin
pub fn read_input(input: &InputArgs) -> CliResult<String> {
    match (&input.content, &input.file) {
        (Some(_), Some(_)) => Err(CliError::InvalidArgument {
            message: "--content and --file cannot be used together".to_string(),
        }),
        (Some(content), None) => Ok(content.clone()),
        (None, Some(path)) => {
            debug!("Reading template text from {}", path.display());
            Ok(fs::read_to_string(path)?)
        }
        (None, None) => {
            let mut content = String::new();
            io::stdin().read_to_string(&mut content)?;
            Ok(content)
        }
    }
}

/// Name the reference kind of `field` in `content`
pub fn classify(formatter: &TemplateFormatter, field: &str, content: &str) -> String {
    format!("{:?}", formatter.classify(content, field))
}

/// Rewrite references to `field` into the item form
pub fn rewrite(formatter: &TemplateFormatter, field: &str, content: &str, force: bool) -> String {
    formatter.rewrite_as_item(content, field, force)
}

/// Loop opening directive
pub fn loop_start(formatter: &TemplateFormatter, item: &str, sequence: &str) -> String {
    formatter.loop_start(item, sequence)
}

/// Conditional opening directive
pub fn if_start(formatter: &TemplateFormatter, field: &str) -> String {
    formatter.if_start(field)
}

/// Image embedding call
pub fn image(formatter: &TemplateFormatter, field: &str) -> String {
    formatter.image(field)
}

/// Dotted field reference built from path segments
pub fn simple_field(formatter: &TemplateFormatter, segments: &[String], enclose: bool) -> String {
    let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
    formatter.simple_field(enclose, &segments)
}

/// Loop counter reference
pub fn loop_count(formatter: &TemplateFormatter) -> String {
    formatter.loop_count()
}

/// Extraction report printed by `docweave extract --json`
#[derive(Debug, Serialize)]
pub struct ExtractReport {
    pub loops_found: usize,
    pub net_open: isize,
    pub events: Vec<ScanEvent>,
    pub open_loops: Vec<LoopDirective>,
}

impl ExtractReport {
    fn new(summary: ScanSummary, stack: &DirectiveStack) -> Self {
        Self {
            loops_found: summary.loops_found(),
            net_open: summary.net_open(),
            open_loops: stack.iter().cloned().collect(),
            events: summary.events,
        }
    }

    fn render_text(&self) -> String {
        let mut lines = Vec::new();
        for event in &self.events {
            lines.push(match event {
                ScanEvent::Opened(directive) => format!(
                    "open   {} ({} in {})",
                    directive.start_text, directive.item_name, directive.sequence_name
                ),
                ScanEvent::Closed { popped: Some(directive) } => {
                    format!("close  {} ({})", directive.end_text, directive.item_name)
                }
                ScanEvent::Closed { popped: None } => "close  (nothing open)".to_string(),
                ScanEvent::Absorbed { offset } => format!("close  at {}: skipped header", offset),
                ScanEvent::Malformed { offset, reason } => {
                    format!("skip   at {}: {:?}", offset, reason)
                }
            });
        }
        lines.push(format!(
            "{} loop(s) found, net open {}",
            self.loops_found, self.net_open
        ));
        for (depth, directive) in self.open_loops.iter().enumerate() {
            lines.push(format!(
                "{}{} in {}",
                "  ".repeat(depth),
                directive.item_name,
                directive.sequence_name
            ));
        }
        lines.join("\n")
    }
}

/// Scan template text for loops and render the report
pub fn extract(
    formatter: &TemplateFormatter,
    content: &str,
    preserve_stack: bool,
    json: bool,
) -> CliResult<String> {
    let mut stack = DirectiveStack::new();
    let summary = formatter.extract_loops(content, &mut stack, preserve_stack);
    let report = ExtractReport::new(summary, &stack);

    if json {
        Ok(serde_json::to_string_pretty(&report)?)
    } else {
        Ok(report.render_text())
    }
}

/// Container path of a field reference
pub fn prefix(formatter: &TemplateFormatter, reference: &str) -> CliResult<String> {
    formatter
        .model_token_prefix(reference)
        .map(str::to_string)
        .ok_or_else(|| CliError::NoPrefix(reference.to_string()))
}
