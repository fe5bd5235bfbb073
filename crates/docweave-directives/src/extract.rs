//! Loop directive extraction
//!
//! Recovers foreach nesting from flat template text using only the textual
//! opening prefix, header terminator and closing marker. The scan walks the
//! text once with a cursor:
//!
//! - whichever of "opening prefix" and "closing marker" comes first is
//!   handled next
//! - a recognized header pushes a [`LoopDirective`] on the caller's stack
//! - a closer pops the innermost directive opened by this scan, or one
//!   opened by earlier scans unless the stack is preserved
//! - a malformed header is reported and skipped; the scan goes on, and the
//!   next closer is absorbed by it instead of popping an outer loop
//!
//! Closing markers are shared by every block kind in some engines
//! (Velocity closes `#if` with `#end` too), so any closer pops.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::syntax::EngineSyntax;

/// One recognized foreach construct
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopDirective {
    /// Opening header exactly as it appears in the text
    pub start_text: String,
    /// Marker closing the loop
    pub end_text: String,
    /// Field path being iterated, without sigil
    pub sequence_name: String,
    /// Loop variable bound per iteration, without sigil
    pub item_name: String,
}

impl LoopDirective {
    /// Create a loop directive
    pub fn new(
        start_text: impl Into<String>,
        end_text: impl Into<String>,
        sequence_name: impl Into<String>,
        item_name: impl Into<String>,
    ) -> Self {
        Self {
            start_text: start_text.into(),
            end_text: end_text.into(),
            sequence_name: sequence_name.into(),
            item_name: item_name.into(),
        }
    }
}

/// Caller-owned stack of currently open loop directives
///
/// Iteration runs bottom (outermost) to top (innermost).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectiveStack {
    directives: Vec<LoopDirective>,
}

impl DirectiveStack {
    /// Create an empty stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a directive as the innermost open loop
    pub fn push(&mut self, directive: LoopDirective) {
        self.directives.push(directive);
    }

    /// Remove the innermost open loop
    pub fn pop(&mut self) -> Option<LoopDirective> {
        self.directives.pop()
    }

    /// Innermost open loop
    pub fn peek(&self) -> Option<&LoopDirective> {
        self.directives.last()
    }

    /// Whether no loop is open
    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// Number of open loops
    pub fn len(&self) -> usize {
        self.directives.len()
    }

    /// Open loops, outermost first
    pub fn iter(&self) -> std::slice::Iter<'_, LoopDirective> {
        self.directives.iter()
    }

    /// Drop every open loop
    pub fn clear(&mut self) {
        self.directives.clear();
    }
}

impl<'a> IntoIterator for &'a DirectiveStack {
    type Item = &'a LoopDirective;
    type IntoIter = std::slice::Iter<'a, LoopDirective>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl From<Vec<LoopDirective>> for DirectiveStack {
    fn from(directives: Vec<LoopDirective>) -> Self {
        Self { directives }
    }
}

/// Why a header starting with the opening prefix was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MalformedReason {
    /// No header terminator after the opening prefix
    Unterminated,
    /// No space separating the item from the rest of the header
    MissingItemSeparator,
    /// No in-keyword after the item
    MissingInKeyword,
    /// The item is empty once its sigil is stripped
    EmptyItem,
    /// The sequence is empty once its sigil is stripped
    EmptySequence,
}

/// Something the scan met, in text order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanEvent {
    /// A well-formed header was pushed on the stack
    Opened(LoopDirective),
    /// A closing marker; `popped` is the directive it removed, if any
    Closed {
        /// Directive removed from the stack
        popped: Option<LoopDirective>,
    },
    /// A closing marker matched a skipped header and left the stack alone
    Absorbed {
        /// Byte offset of the closing marker in the scanned text
        offset: usize,
    },
    /// A header was skipped without touching the stack
    Malformed {
        /// Byte offset of the opening prefix in the scanned text
        offset: usize,
        /// What was wrong with it
        reason: MalformedReason,
    },
}

/// Outcome of one extraction scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Events in text order
    pub events: Vec<ScanEvent>,
}

impl ScanSummary {
    /// Number of loop headers recognized
    pub fn loops_found(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, ScanEvent::Opened(_)))
            .count()
    }

    /// Number of closing markers that closed a loop or met an empty stack
    ///
    /// Closers absorbed by a malformed header are not counted.
    pub fn closers_found(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, ScanEvent::Closed { .. }))
            .count()
    }

    /// Number of headers skipped as malformed
    pub fn malformed_count(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, ScanEvent::Malformed { .. }))
            .count()
    }

    /// Loops opened minus closers met
    ///
    /// A lone closer gives `-1`, a balanced block gives `0`.
    pub fn net_open(&self) -> isize {
        self.loops_found() as isize - self.closers_found() as isize
    }

    /// Recognized directives in text order
    pub fn directives(&self) -> impl Iterator<Item = &LoopDirective> {
        self.events.iter().filter_map(|event| match event {
            ScanEvent::Opened(directive) => Some(directive),
            _ => None,
        })
    }
}

/// Header parse result
enum Header {
    Recognized { item: String, sequence: String },
    Malformed(MalformedReason),
}

/// Block opened during the current scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    /// A directive pushed on the caller's stack
    Loop,
    /// A malformed header; its closer must not pop anything
    Skipped,
}

/// Scans template text for foreach directives
#[derive(Debug, Clone, Copy)]
pub struct LoopExtractor<'a> {
    syntax: &'a EngineSyntax,
}

impl<'a> LoopExtractor<'a> {
    /// Create an extractor for the given syntax
    pub fn new(syntax: &'a EngineSyntax) -> Self {
        Self { syntax }
    }

    /// Scan `content`, pushing recognized loops and popping on closers
    ///
    /// Loops opened in `content` are always popped by their own closers.
    /// With `preserve_stack` set, surplus closers are still reported but
    /// never pop, so directives opened by separately scanned text survive
    /// this scan.
    pub fn extract(
        &self,
        content: &str,
        stack: &mut DirectiveStack,
        preserve_stack: bool,
    ) -> ScanSummary {
        let loop_open = self.syntax.loop_open.as_str();
        let loop_close = self.syntax.loop_close.as_str();
        let mut summary = ScanSummary::default();
        if loop_open.is_empty() || loop_close.is_empty() {
            warn!("loop markers are empty, nothing to scan for");
            return summary;
        }
        let mut cursor = 0;
        let mut frames: Vec<Frame> = Vec::new();

        while cursor < content.len() {
            let rest = &content[cursor..];
            let close_index = rest.find(loop_close);
            let open_index = rest.find(loop_open);

            let open_index = match (open_index, close_index) {
                (None, None) => break,
                (Some(open), Some(close)) if close > open => open,
                (Some(open), None) => open,
                (_, Some(close)) => {
                    let offset = cursor + close;
                    let event = match frames.pop() {
                        Some(Frame::Skipped) => {
                            trace!(offset, "closing marker of skipped header");
                            ScanEvent::Absorbed { offset }
                        }
                        None if preserve_stack => ScanEvent::Closed { popped: None },
                        Some(Frame::Loop) | None => ScanEvent::Closed {
                            popped: stack.pop(),
                        },
                    };
                    if let ScanEvent::Closed { popped } = &event {
                        trace!(
                            offset,
                            popped = ?popped.as_ref().map(|d| d.item_name.as_str()),
                            "closing marker"
                        );
                    }
                    summary.events.push(event);
                    cursor = offset + loop_close.len();
                    continue;
                }
            };

            let offset = cursor + open_index;
            let from_open = &rest[open_index..];
            let Some(close_paren) = from_open[loop_open.len()..].find(self.syntax.header_close)
            else {
                warn!(offset, "unterminated loop header");
                summary.events.push(ScanEvent::Malformed {
                    offset,
                    reason: MalformedReason::Unterminated,
                });
                frames.push(Frame::Skipped);
                cursor = offset + loop_open.len();
                continue;
            };

            let header_len = loop_open.len() + close_paren + self.syntax.header_close.len_utf8();
            let header = &from_open[..header_len];
            cursor = offset + header_len;

            match self.parse_header(header) {
                Header::Recognized { item, sequence } => {
                    debug!(offset, item = %item, sequence = %sequence, "loop directive");
                    let directive = LoopDirective::new(header, loop_close, sequence, item);
                    stack.push(directive.clone());
                    frames.push(Frame::Loop);
                    summary.events.push(ScanEvent::Opened(directive));
                }
                Header::Malformed(reason) => {
                    warn!(offset, ?reason, header, "malformed loop header");
                    frames.push(Frame::Skipped);
                    summary.events.push(ScanEvent::Malformed { offset, reason });
                }
            }
        }

        summary
    }

    /// Split `#foreach($d in $developers)` into item and sequence
    fn parse_header(&self, header: &str) -> Header {
        let inside = &header[self.syntax.loop_open.len()..];

        let Some(space_index) = inside.find(' ') else {
            return Header::Malformed(MalformedReason::MissingItemSeparator);
        };
        let (item, after_item) = inside.split_at(space_index);

        let in_delimiter = self.syntax.in_delimiter();
        let Some(in_index) = after_item.find(&in_delimiter) else {
            return Header::Malformed(MalformedReason::MissingInKeyword);
        };

        let item = self.syntax.strip_sigil(item.trim());
        if item.is_empty() {
            return Header::Malformed(MalformedReason::EmptyItem);
        }

        let after_in = &after_item[in_index + in_delimiter.len()..];
        let sequence = after_in
            .find(self.syntax.header_close)
            .map_or(after_in, |end| &after_in[..end]);
        let sequence = self.syntax.strip_sigil(sequence.trim());
        if sequence.is_empty() {
            return Header::Malformed(MalformedReason::EmptySequence);
        }

        Header::Recognized {
            item: item.to_string(),
            sequence: sequence.to_string(),
        }
    }

    /// Container path of a field reference
    ///
    /// `$developers.Name` gives `developers`, `$name` gives `name` and a
    /// reference without sigil gives `None`. The braces of the braced form
    /// are dropped as well (`${developers.Name}` gives `developers`).
    pub fn model_token_prefix<'t>(&self, reference: &'t str) -> Option<&'t str> {
        let sigil_index = reference.find(self.syntax.sigil)?;
        let mut field = &reference[sigil_index + self.syntax.sigil.len_utf8()..];
        if let Some(braced) = field.strip_prefix(self.syntax.open_brace) {
            field = braced.strip_suffix(self.syntax.close_brace).unwrap_or(braced);
        }

        match field.rfind('.') {
            Some(last_dot) => Some(&field[..last_dot]),
            None => Some(field),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn velocity() -> EngineSyntax {
        EngineSyntax::velocity()
    }

    #[test]
    fn test_extract_single_loop() {
        let syntax = velocity();
        let extractor = LoopExtractor::new(&syntax);
        let mut stack = DirectiveStack::new();

        let summary = extractor.extract("xxx#foreach($d in $developers)yyy", &mut stack, false);

        assert_eq!(summary.loops_found(), 1);
        assert_eq!(stack.len(), 1);
        let directive = stack.peek().unwrap();
        assert_eq!(directive.item_name, "d");
        assert_eq!(directive.sequence_name, "developers");
        assert_eq!(directive.start_text, "#foreach($d in $developers)");
        assert_eq!(directive.end_text, "#end");
    }

    #[test]
    fn test_extract_balanced_loop_drains_stack() {
        let syntax = velocity();
        let extractor = LoopExtractor::new(&syntax);
        let mut stack = DirectiveStack::new();

        let summary =
            extractor.extract("#foreach($d in $developers)$d.Name#end", &mut stack, false);

        assert_eq!(summary.loops_found(), 1);
        assert_eq!(summary.closers_found(), 1);
        assert_eq!(summary.net_open(), 0);
        assert!(stack.is_empty());
        assert_eq!(summary.directives().next().unwrap().item_name, "d");
    }

    #[test]
    fn test_extract_closer_before_opener() {
        let syntax = velocity();
        let extractor = LoopExtractor::new(&syntax);
        let mut stack = DirectiveStack::new();
        stack.push(LoopDirective::new("#foreach($p in $projects)", "#end", "projects", "p"));

        let summary = extractor.extract("a#end b#foreach($d in $developers)", &mut stack, false);

        assert_eq!(summary.net_open(), 0);
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.peek().unwrap().sequence_name, "developers");
        match &summary.events[0] {
            ScanEvent::Closed { popped: Some(popped) } => assert_eq!(popped.item_name, "p"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_extract_preserve_stack() {
        let syntax = velocity();
        let extractor = LoopExtractor::new(&syntax);
        let mut stack = DirectiveStack::new();
        stack.push(LoopDirective::new("#foreach($p in $projects)", "#end", "projects", "p"));

        let summary = extractor.extract("#end#end", &mut stack, true);

        assert_eq!(summary.closers_found(), 2);
        assert_eq!(summary.net_open(), -2);
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_extract_preserve_stack_pops_loops_opened_in_scan() {
        let syntax = velocity();
        let extractor = LoopExtractor::new(&syntax);
        let prior = LoopDirective::new("#foreach($p in $projects)", "#end", "projects", "p");
        let mut stack = DirectiveStack::from(vec![prior.clone()]);

        let summary = extractor.extract("#foreach($d in $xs)$d#end#end", &mut stack, true);

        assert_eq!(summary.loops_found(), 1);
        assert_eq!(stack.iter().collect::<Vec<_>>(), vec![&prior]);
        match &summary.events[1] {
            ScanEvent::Closed { popped: Some(popped) } => assert_eq!(popped.item_name, "d"),
            other => panic!("unexpected event: {:?}", other),
        }
        assert_eq!(summary.events[2], ScanEvent::Closed { popped: None });
    }

    #[test]
    fn test_extract_malformed_header_absorbs_its_closer() {
        let syntax = velocity();
        let extractor = LoopExtractor::new(&syntax);
        let prior = LoopDirective::new("#foreach($p in $projects)", "#end", "projects", "p");
        let mut stack = DirectiveStack::from(vec![prior.clone()]);

        let summary = extractor.extract("#foreach($d)x#end", &mut stack, false);

        assert_eq!(
            summary.events,
            vec![
                ScanEvent::Malformed {
                    offset: 0,
                    reason: MalformedReason::MissingItemSeparator
                },
                ScanEvent::Absorbed { offset: 13 },
            ]
        );
        assert_eq!(summary.net_open(), 0);
        assert_eq!(stack.peek(), Some(&prior));
    }

    #[test]
    fn test_extract_unterminated_header_absorbs_its_closer() {
        let syntax = velocity();
        let extractor = LoopExtractor::new(&syntax);
        let prior = LoopDirective::new("#foreach($p in $projects)", "#end", "projects", "p");
        let mut stack = DirectiveStack::from(vec![prior.clone()]);

        let summary = extractor.extract("#foreach($x #end", &mut stack, false);

        assert_eq!(
            summary.events,
            vec![
                ScanEvent::Malformed {
                    offset: 0,
                    reason: MalformedReason::Unterminated
                },
                ScanEvent::Absorbed { offset: 12 },
            ]
        );
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_extract_closer_after_skipped_block_pops_outer_loop() {
        let syntax = velocity();
        let extractor = LoopExtractor::new(&syntax);
        let mut stack = DirectiveStack::new();

        let summary = extractor.extract(
            "#foreach($p in $projects)#foreach($d)x#end$p#end",
            &mut stack,
            false,
        );

        assert_eq!(summary.malformed_count(), 1);
        assert_eq!(summary.closers_found(), 1);
        assert_eq!(summary.net_open(), 0);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_extract_lone_closer_on_empty_stack() {
        let syntax = velocity();
        let extractor = LoopExtractor::new(&syntax);
        let mut stack = DirectiveStack::new();

        let summary = extractor.extract("#end", &mut stack, false);

        assert_eq!(summary.net_open(), -1);
        assert_eq!(summary.events, vec![ScanEvent::Closed { popped: None }]);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_extract_no_directives() {
        let syntax = velocity();
        let extractor = LoopExtractor::new(&syntax);
        let mut stack = DirectiveStack::new();

        let summary = extractor.extract("Hello $name", &mut stack, false);

        assert!(summary.events.is_empty());
        assert_eq!(summary.net_open(), 0);
    }

    #[test]
    fn test_extract_unterminated_header() {
        let syntax = velocity();
        let extractor = LoopExtractor::new(&syntax);
        let mut stack = DirectiveStack::new();

        let summary = extractor.extract("#foreach($x", &mut stack, false);

        assert_eq!(summary.loops_found(), 0);
        assert_eq!(
            summary.events,
            vec![ScanEvent::Malformed {
                offset: 0,
                reason: MalformedReason::Unterminated
            }]
        );
        assert!(stack.is_empty());
    }

    #[test]
    fn test_extract_malformed_headers() {
        let syntax = velocity();
        let extractor = LoopExtractor::new(&syntax);
        let cases = [
            ("#foreach($d)", MalformedReason::MissingItemSeparator),
            ("#foreach($d of $developers)", MalformedReason::MissingInKeyword),
            ("#foreach($ in $developers)", MalformedReason::EmptyItem),
            ("#foreach($d in $)", MalformedReason::EmptySequence),
        ];

        for (content, expected) in cases {
            let mut stack = DirectiveStack::new();
            let summary = extractor.extract(content, &mut stack, false);
            assert_eq!(
                summary.events,
                vec![ScanEvent::Malformed {
                    offset: 0,
                    reason: expected
                }],
                "content: {}",
                content
            );
            assert!(stack.is_empty());
        }
    }

    #[test]
    fn test_extract_continues_after_malformed_header() {
        let syntax = velocity();
        let extractor = LoopExtractor::new(&syntax);
        let mut stack = DirectiveStack::new();

        let summary = extractor.extract(
            "#foreach($broken) #foreach($d in $developers)",
            &mut stack,
            false,
        );

        assert_eq!(summary.malformed_count(), 1);
        assert_eq!(summary.loops_found(), 1);
        assert_eq!(stack.peek().unwrap().item_name, "d");
    }

    #[test]
    fn test_extract_tolerates_padding() {
        let syntax = velocity();
        let extractor = LoopExtractor::new(&syntax);
        let mut stack = DirectiveStack::new();

        extractor.extract("#foreach($d  in  $developers )", &mut stack, false);

        let directive = stack.peek().unwrap();
        assert_eq!(directive.item_name, "d");
        assert_eq!(directive.sequence_name, "developers");
    }

    #[test]
    fn test_extract_dotted_sequence() {
        let syntax = velocity();
        let extractor = LoopExtractor::new(&syntax);
        let mut stack = DirectiveStack::new();

        extractor.extract("#foreach($r in $project.roles)", &mut stack, false);

        assert_eq!(stack.peek().unwrap().sequence_name, "project.roles");
    }

    #[test]
    fn test_extract_with_custom_syntax() {
        let syntax = EngineSyntax {
            loop_open: "{% for ".to_string(),
            loop_close: "{% endfor %}".to_string(),
            header_close: '%',
            ..Default::default()
        };
        let extractor = LoopExtractor::new(&syntax);
        let mut stack = DirectiveStack::new();

        let summary = extractor.extract("{% for d in developers %}{{ d }}", &mut stack, false);

        assert_eq!(summary.loops_found(), 1);
        let directive = stack.peek().unwrap();
        assert_eq!(directive.item_name, "d");
        assert_eq!(directive.sequence_name, "developers");
    }

    #[test]
    fn test_extract_with_empty_markers_scans_nothing() {
        let syntax = EngineSyntax {
            loop_close: String::new(),
            ..Default::default()
        };
        let extractor = LoopExtractor::new(&syntax);
        let mut stack = DirectiveStack::new();

        let summary = extractor.extract("#foreach($d in $developers)", &mut stack, false);

        assert!(summary.events.is_empty());
        assert!(stack.is_empty());
    }

    #[test]
    fn test_model_token_prefix() {
        let syntax = velocity();
        let extractor = LoopExtractor::new(&syntax);
        assert_eq!(extractor.model_token_prefix("$developers.Name"), Some("developers"));
        assert_eq!(
            extractor.model_token_prefix("$project.developers.Name"),
            Some("project.developers")
        );
        assert_eq!(extractor.model_token_prefix("$name"), Some("name"));
        assert_eq!(extractor.model_token_prefix("${developers.Name}"), Some("developers"));
        assert_eq!(extractor.model_token_prefix("developers.Name"), None);
        assert_eq!(None.and_then(|r| extractor.model_token_prefix(r)), None);
    }

    #[test]
    fn test_directive_stack_operations() {
        let mut stack = DirectiveStack::new();
        assert!(stack.is_empty());
        assert!(stack.pop().is_none());

        stack.push(LoopDirective::new("a", "#end", "as", "a"));
        stack.push(LoopDirective::new("b", "#end", "bs", "b"));
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.peek().unwrap().item_name, "b");
        assert_eq!(
            stack.iter().map(|d| d.item_name.as_str()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );

        assert_eq!(stack.pop().unwrap().item_name, "b");
        stack.clear();
        assert!(stack.is_empty());
    }
}
