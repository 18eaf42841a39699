//! Raw request keys, parsed once and indexed by path.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::trace;

use crate::key::{QueryKey, Segment};
use crate::op::FilterOperationKind;

/// The raw filter input of one request: every key present plus its value.
///
/// Keys are parsed on insertion; malformed keys are dropped. A key that occurs
/// more than once (also when spelled in a different case) keeps all of its
/// values joined with `,` in arrival order, which is how repeated request
/// parameters are flattened before binding.
#[derive(Debug, Clone, Default)]
pub struct RawQuery {
    entries: HashMap<QueryKey, String>,
}

impl RawQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(key, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut query = Self::new();
        for (key, value) in pairs {
            query.insert(key.as_ref(), value);
        }
        query
    }

    /// Build from an `application/x-www-form-urlencoded` query string.
    /// A leading `?` is ignored.
    #[must_use]
    pub fn from_query_string(qs: &str) -> Self {
        let qs = qs.strip_prefix('?').unwrap_or(qs);
        Self::from_pairs(url::form_urlencoded::parse(qs.as_bytes()))
    }

    /// Add one raw key. Returns `false` if the key is malformed and was ignored.
    pub fn insert(&mut self, raw_key: &str, value: impl Into<String>) -> bool {
        let Some(key) = QueryKey::parse(raw_key) else {
            trace!(key = raw_key, "ignoring malformed filter key");
            return false;
        };
        let value = value.into();
        match self.entries.entry(key) {
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                existing.push(',');
                existing.push_str(&value);
            }
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
        }
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parsed keys, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &QueryKey> {
        self.entries.keys()
    }

    /// Value stored for `path` with the given trailing operation.
    ///
    /// A bare lookup whose last segment is a field spelled like an operation
    /// tag (`doc[new]`) also finds the key the parser read as `doc` + `new`.
    #[must_use]
    pub fn get(&self, path: &[Segment], operation: Option<FilterOperationKind>) -> Option<&str> {
        let key = QueryKey::new(path.to_vec(), operation);
        if let Some(value) = self.entries.get(&key) {
            return Some(value.as_str());
        }
        if operation.is_some() {
            return None;
        }
        let (Segment::Field(last), parent) = path.split_last()? else {
            return None;
        };
        let op = FilterOperationKind::from_tag(last)?;
        if parent.is_empty() {
            return None;
        }
        self.entries
            .get(&QueryKey::new(parent.to_vec(), Some(op)))
            .map(String::as_str)
    }

    /// Whether any key begins with `prefix`.
    #[must_use]
    pub fn has_prefix(&self, prefix: &[Segment]) -> bool {
        self.entries.keys().any(|key| key.starts_with(prefix))
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for RawQuery {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}
