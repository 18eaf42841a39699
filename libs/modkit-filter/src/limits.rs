//! Safety caps applied while binding a filter tree.

use serde::Deserialize;

/// Binding limits.
///
/// Deserializable so it can sit inside a module's config section; missing keys
/// fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilterLimits {
    /// Maximum nesting depth (default: 8). Keys below it fail the bind.
    pub max_depth: usize,
    /// Maximum number of entries of one list field (default: 100)
    pub max_list_items: usize,
    /// Maximum number of values of one `in`/`nin` operation (default: 1000)
    pub max_in_values: usize,
}

impl Default for FilterLimits {
    fn default() -> Self {
        Self {
            max_depth: 8,
            max_list_items: 100,
            max_in_values: 1000,
        }
    }
}

impl FilterLimits {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_depth(mut self, max: usize) -> Self {
        self.max_depth = max;
        self
    }

    #[must_use]
    pub fn with_max_list_items(mut self, max: usize) -> Self {
        self.max_list_items = max;
        self
    }

    #[must_use]
    pub fn with_max_in_values(mut self, max: usize) -> Self {
        self.max_in_values = max;
        self
    }
}
