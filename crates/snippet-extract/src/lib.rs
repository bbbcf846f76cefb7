mod line;
mod marker;
mod state;

pub use marker::{
    CommentPrefixes, Marker, MarkerKind, MarkerSyntax, PrefixError, DEFAULT_COMMENT_PREFIXES,
};

use line::canonical_lines;
use state::{collect_spans, find_region};
use std::sync::OnceLock;

/// Cleaned listing returned by [`Extractor::extract`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub text: String,
    /// `true` when a start/end pair for the requested name was found.
    pub isolated: bool,
}

/// A snippet region as authored in a listing. Line numbers are 1-based and
/// point at the marker lines themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetSpan {
    pub name: String,
    pub start_line: usize,
    pub end_line: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct Extractor {
    syntax: MarkerSyntax,
}

impl Extractor {
    pub fn new(prefixes: CommentPrefixes) -> Result<Self, PrefixError> {
        Ok(Self {
            syntax: MarkerSyntax::new(prefixes)?,
        })
    }

    /// Extractor for the default `//` and `#` prefixes, compiled once.
    pub fn shared() -> &'static Extractor {
        static SHARED: OnceLock<Extractor> = OnceLock::new();
        SHARED.get_or_init(|| {
            Extractor::new(CommentPrefixes::default())
                .expect("default comment prefixes must compile")
        })
    }

    pub fn prefixes(&self) -> &CommentPrefixes {
        self.syntax.prefixes()
    }

    /// Isolates `snippet` (when given and present), strips every marker
    /// comment, and returns the remaining lines.
    ///
    /// The requested name is trimmed before matching, the same way marker
    /// names are.
    ///
    /// A successful isolation always drops the first and last remaining line
    /// of the region, whether or not they are blank. When the name is absent,
    /// empty, or has no start/end pair, the whole listing is cleaned instead
    /// and nothing is trimmed.
    pub fn extract(&self, text: &str, snippet: Option<&str>) -> Extraction {
        let lines = canonical_lines(text);

        let region = snippet
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .and_then(|name| {
                let region = find_region(&self.syntax, &lines, name);
                if region.is_none() {
                    tracing::debug!(
                        snippet = name,
                        "snippet markers not found; using full listing"
                    );
                }
                region
            });

        let isolated = region.is_some();
        let candidate = match region {
            Some(range) => &lines[range],
            None => &lines[..],
        };

        let kept: Vec<&str> = candidate
            .iter()
            .copied()
            .filter(|line| !self.syntax.is_leftover(line))
            .collect();

        let kept = if isolated {
            kept.get(1..kept.len().saturating_sub(1))
                .unwrap_or_default()
        } else {
            &kept[..]
        };

        Extraction {
            text: kept.join("\n"),
            isolated,
        }
    }

    pub fn list_snippets(&self, text: &str) -> Vec<SnippetSpan> {
        collect_spans(&self.syntax, &canonical_lines(text))
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Extractor::shared().clone()
    }
}

/// Extracts with the default comment prefixes. See [`Extractor::extract`].
pub fn extract(text: &str, snippet: Option<&str>) -> String {
    Extractor::shared().extract(text, snippet).text
}

pub fn list_snippets(text: &str) -> Vec<SnippetSpan> {
    Extractor::shared().list_snippets(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn region_of_one_line_trims_to_nothing() {
        let text = "// snippet-start: x\nonly\n// snippet-end: x\n";
        let extraction = Extractor::shared().extract(text, Some("x"));
        assert!(extraction.isolated);
        assert_eq!(extraction.text, "");
    }

    #[test]
    fn empty_region_is_still_isolated() {
        let text = "before\n# snippet-start: x\n# snippet-end: x\nafter";
        let extraction = Extractor::shared().extract(text, Some("x"));
        assert!(extraction.isolated);
        assert_eq!(extraction.text, "");
    }

    #[test]
    fn empty_name_skips_isolation() {
        let text = "// snippet-start: \nbody\n// snippet-end: \n";
        let extraction = Extractor::shared().extract(text, Some(""));
        assert!(!extraction.isolated);
        assert_eq!(extraction.text, "body");
    }

    #[test]
    fn empty_input() {
        assert_eq!(extract("", None), "");
        assert_eq!(extract("", Some("x")), "");
    }

    #[test]
    fn custom_extractor_reports_prefixes() {
        let prefixes = CommentPrefixes::default().with_prefix("--").unwrap();
        let extractor = Extractor::new(prefixes).unwrap();
        assert_eq!(extractor.prefixes().len(), 3);
        assert_eq!(Extractor::default().prefixes(), &CommentPrefixes::default());
    }
}
