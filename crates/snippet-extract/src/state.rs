use crate::marker::{MarkerKind, MarkerSyntax};
use crate::SnippetSpan;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Outside,
    Inside { start: usize },
}

/// Two-state scanner for a single snippet name.
///
/// The first start marker opens the region and the first end marker after it
/// closes it. End markers seen while outside and repeated start markers seen
/// while inside are ignored.
pub struct RegionScanner<'a> {
    name: &'a str,
    state: State,
}

impl<'a> RegionScanner<'a> {
    pub fn new(name: &'a str) -> Self {
        Self {
            name,
            state: State::Outside,
        }
    }

    /// Feeds one line; returns the inner line range once the region closes.
    pub fn feed(
        &mut self,
        syntax: &MarkerSyntax,
        index: usize,
        line: &str,
    ) -> Option<Range<usize>> {
        let marker = syntax.parse(line)?;

        match self.state {
            State::Outside if marker.is_start_of(self.name) => {
                self.state = State::Inside { start: index };
                None
            }
            State::Inside { start } if marker.is_end_of(self.name) => {
                self.state = State::Outside;
                Some(start + 1..index)
            }
            _ => None,
        }
    }
}

pub fn find_region(syntax: &MarkerSyntax, lines: &[&str], name: &str) -> Option<Range<usize>> {
    let mut scanner = RegionScanner::new(name);
    lines
        .iter()
        .enumerate()
        .find_map(|(index, line)| scanner.feed(syntax, index, line))
}

/// Pairs every start marker with the first later end marker of the same name.
pub fn collect_spans(syntax: &MarkerSyntax, lines: &[&str]) -> Vec<SnippetSpan> {
    let mut spans: Vec<SnippetSpan> = Vec::new();
    let mut open: Vec<usize> = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        let Some(marker) = syntax.parse(line) else {
            continue;
        };
        let line_number = index + 1;

        match marker.kind {
            MarkerKind::Start => {
                open.push(spans.len());
                spans.push(SnippetSpan {
                    name: marker.name,
                    start_line: line_number,
                    end_line: None,
                });
            }
            MarkerKind::End => {
                open.retain(|&span_idx| {
                    let span = &mut spans[span_idx];
                    if span.name == marker.name {
                        span.end_line = Some(line_number);
                        false
                    } else {
                        true
                    }
                });
            }
        }
    }

    spans
}
