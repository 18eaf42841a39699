//! The bound filter-request tree.

use std::sync::Arc;

use crate::leaf::FilterOperations;
use crate::shape::FilterShape;
use crate::value::Value;

/// What was bound for one field of a filter type.
#[derive(Debug, Clone)]
pub enum FilterEntry {
    /// Plain parameter taken verbatim from its exact key.
    Scalar(Value),
    Leaf(FilterOperations),
    Nested(FilterRequestNode),
    /// Children for indices `0..len`, never empty.
    List(Vec<FilterRequestNode>),
}

/// One bound filter object. Holds only the fields the request mentioned, in
/// declaration order.
#[derive(Debug, Clone)]
pub struct FilterRequestNode {
    shape: Arc<FilterShape>,
    entries: Vec<(&'static str, FilterEntry)>,
}

impl FilterRequestNode {
    #[must_use]
    pub fn new(shape: Arc<FilterShape>) -> Self {
        Self {
            shape,
            entries: Vec::new(),
        }
    }

    pub(crate) fn insert(&mut self, field: &'static str, entry: FilterEntry) {
        self.entries.push((field, entry));
    }

    /// Shape this node was built from.
    #[must_use]
    pub fn shape(&self) -> &Arc<FilterShape> {
        &self.shape
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FilterEntry)> + '_ {
        self.entries.iter().map(|(name, entry)| (*name, entry))
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FilterEntry> {
        self.entries
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(field))
            .map(|(_, entry)| entry)
    }

    #[must_use]
    pub fn scalar(&self, field: &str) -> Option<&Value> {
        match self.get(field)? {
            FilterEntry::Scalar(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn leaf(&self, field: &str) -> Option<&FilterOperations> {
        match self.get(field)? {
            FilterEntry::Leaf(ops) => Some(ops),
            _ => None,
        }
    }

    #[must_use]
    pub fn nested(&self, field: &str) -> Option<&FilterRequestNode> {
        match self.get(field)? {
            FilterEntry::Nested(node) => Some(node),
            _ => None,
        }
    }

    #[must_use]
    pub fn list(&self, field: &str) -> Option<&[FilterRequestNode]> {
        match self.get(field)? {
            FilterEntry::List(items) => Some(items),
            _ => None,
        }
    }
}
