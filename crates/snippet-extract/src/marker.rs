use regex::Regex;
use std::fmt;
use thiserror::Error;

/// Comment prefixes recognised when no other set is configured.
pub const DEFAULT_COMMENT_PREFIXES: &[&str] = &["//", "#"];

#[derive(Debug, Error)]
pub enum PrefixError {
    #[error("at least one comment prefix is required")]
    Empty,

    #[error("comment prefix must not be blank (got {0:?})")]
    Blank(String),

    #[error("failed to compile marker pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Ordered set of comment syntaxes that may introduce a snippet marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentPrefixes {
    prefixes: Vec<String>,
}

impl CommentPrefixes {
    /// Builds a prefix set, dropping duplicates but keeping first-seen order.
    pub fn new<I, S>(prefixes: I) -> Result<Self, PrefixError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = CommentPrefixes {
            prefixes: Vec::new(),
        };
        for prefix in prefixes {
            set.push(prefix.into())?;
        }

        if set.prefixes.is_empty() {
            return Err(PrefixError::Empty);
        }

        Ok(set)
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Result<Self, PrefixError> {
        self.push(prefix.into())?;
        Ok(self)
    }

    pub fn extend<I, S>(mut self, prefixes: I) -> Result<Self, PrefixError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for prefix in prefixes {
            self.push(prefix.into())?;
        }
        Ok(self)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.prefixes.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    fn push(&mut self, prefix: String) -> Result<(), PrefixError> {
        let trimmed = prefix.trim();
        if trimmed.is_empty() {
            return Err(PrefixError::Blank(prefix));
        }

        if !self.prefixes.iter().any(|existing| existing == trimmed) {
            self.prefixes.push(trimmed.to_string());
        }
        Ok(())
    }
}

impl Default for CommentPrefixes {
    fn default() -> Self {
        CommentPrefixes {
            prefixes: DEFAULT_COMMENT_PREFIXES
                .iter()
                .map(|prefix| prefix.to_string())
                .collect(),
        }
    }
}

impl fmt::Display for CommentPrefixes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prefixes.join(", "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Start,
    End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub kind: MarkerKind,
    pub name: String,
}

impl Marker {
    pub fn is_start_of(&self, name: &str) -> bool {
        self.kind == MarkerKind::Start && self.name == name
    }

    pub fn is_end_of(&self, name: &str) -> bool {
        self.kind == MarkerKind::End && self.name == name
    }
}

/// Compiled marker patterns for one set of comment prefixes.
///
/// A marker line looks like `<prefix> snippet-start: <name>` or
/// `<prefix> snippet-end: <name>`; anything may precede the prefix, and at
/// least one space or tab must separate it from `snippet`. A leftover line
/// is any line where a prefix, whitespace, then the word `snippet` appear,
/// which covers every marker of every name.
#[derive(Debug, Clone)]
pub struct MarkerSyntax {
    prefixes: CommentPrefixes,
    marker: Regex,
    leftover: Regex,
}

impl MarkerSyntax {
    pub fn new(prefixes: CommentPrefixes) -> Result<Self, PrefixError> {
        let alternation = prefixes
            .iter()
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join("|");

        let marker = Regex::new(&format!(
            r"(?:{alternation})[ \t]+snippet-(start|end):[ \t]*(.*)$"
        ))?;
        let leftover = Regex::new(&format!(r"(?:{alternation})[ \t]+snippet"))?;

        Ok(MarkerSyntax {
            prefixes,
            marker,
            leftover,
        })
    }

    pub fn prefixes(&self) -> &CommentPrefixes {
        &self.prefixes
    }

    pub fn parse(&self, line: &str) -> Option<Marker> {
        let captures = self.marker.captures(line)?;
        let kind = match captures.get(1)?.as_str() {
            "start" => MarkerKind::Start,
            _ => MarkerKind::End,
        };
        let name = captures
            .get(2)
            .map(|m| m.as_str().trim())
            .unwrap_or_default();

        Some(Marker {
            kind,
            name: name.to_string(),
        })
    }

    pub fn is_leftover(&self, line: &str) -> bool {
        self.leftover.is_match(line)
    }
}
