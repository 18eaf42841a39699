//! Bracket-notation query key parser.
//!
//! `author[email][eq]` parses into the path `author`, `email` plus the
//! operation `eq`; `items[0][sku]` into `items`, `0`, `sku` with no operation.
//! Keys are case-insensitive and stored lower-cased. The trailing bracket is
//! read as an operation only when it spells one of the operation tags, so field
//! names that are ordinary words never collide with operators.

use std::fmt;

use crate::op::FilterOperationKind;

/// One step of a key path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Field(String),
    Index(usize),
}

impl Segment {
    /// Field segment, lower-cased for case-insensitive matching.
    #[must_use]
    pub fn field(name: &str) -> Self {
        Segment::Field(name.to_ascii_lowercase())
    }

    fn classify(raw: &str) -> Self {
        if raw.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(i) = raw.parse::<usize>() {
                return Segment::Index(i);
            }
        }
        Segment::Field(raw.to_owned())
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Field(name) => f.write_str(name),
            Segment::Index(i) => write!(f, "{i}"),
        }
    }
}

/// A parsed query key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub segments: Vec<Segment>,
    pub operation: Option<FilterOperationKind>,
}

impl QueryKey {
    #[must_use]
    pub fn new(segments: Vec<Segment>, operation: Option<FilterOperationKind>) -> Self {
        Self {
            segments,
            operation,
        }
    }

    /// Parse a raw key. Returns `None` for malformed keys (unbalanced or nested
    /// brackets, empty segments, trailing text after a closing bracket).
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let lowered = raw.to_ascii_lowercase();
        let (head, mut rest) = match lowered.find('[') {
            Some(pos) => lowered.split_at(pos),
            None => (lowered.as_str(), ""),
        };
        if head.is_empty() || head.contains(']') {
            return None;
        }

        let mut segments = vec![Segment::classify(head)];
        let mut bracketed = 0_usize;
        while !rest.is_empty() {
            let inner = rest.strip_prefix('[')?;
            let close = inner.find(']')?;
            let segment = &inner[..close];
            if segment.is_empty() || segment.contains('[') {
                return None;
            }
            segments.push(Segment::classify(segment));
            bracketed += 1;
            rest = &inner[close + 1..];
        }

        let mut operation = None;
        if bracketed > 0 {
            if let Some(Segment::Field(last)) = segments.last() {
                operation = FilterOperationKind::from_tag(last);
            }
            if operation.is_some() {
                segments.pop();
            }
        }

        Some(Self {
            segments,
            operation,
        })
    }

    /// Whether this key's path starts with `prefix`.
    #[must_use]
    pub fn starts_with(&self, prefix: &[Segment]) -> bool {
        self.segments.starts_with(prefix)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut segments = self.segments.iter();
        if let Some(first) = segments.next() {
            write!(f, "{first}")?;
        }
        for segment in segments {
            write!(f, "[{segment}]")?;
        }
        if let Some(op) = self.operation {
            write!(f, "[{op}]")?;
        }
        Ok(())
    }
}
