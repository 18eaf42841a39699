//! Declared field types.
//!
//! `FieldKind` is the logical type of a filterable value; `ValueType` adds
//! nullability on top of it. Both the filter-request shapes and the candidate
//! record schemas describe their fields with `ValueType`, and the compiler
//! checks the two sides against each other ignoring nullability.

use std::fmt;

/// Logical field types supported in bracket filters.
///
/// This enum describes the data type of a field for the purpose of:
/// - Value coercion when binding raw query strings
/// - Deciding which operations a field supports
/// - Contract checks between filter types and record types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    String,
    I64,
    F64,
    Bool,
    Uuid,
    DateTimeUtc,
    Date,
    Time,
    Decimal,
}

impl FieldKind {
    /// Whether text operations (`li`, `sw`, `ew` and their negations) apply.
    #[must_use]
    pub const fn is_text(self) -> bool {
        matches!(self, FieldKind::String)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::String => write!(f, "String"),
            FieldKind::I64 => write!(f, "I64"),
            FieldKind::F64 => write!(f, "F64"),
            FieldKind::Bool => write!(f, "Bool"),
            FieldKind::Uuid => write!(f, "Uuid"),
            FieldKind::DateTimeUtc => write!(f, "DateTimeUtc"),
            FieldKind::Date => write!(f, "Date"),
            FieldKind::Time => write!(f, "Time"),
            FieldKind::Decimal => write!(f, "Decimal"),
        }
    }
}

/// Declared type of a field: a kind plus nullability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ValueType {
    pub kind: FieldKind,
    pub nullable: bool,
}

impl ValueType {
    #[must_use]
    pub const fn required(kind: FieldKind) -> Self {
        Self {
            kind,
            nullable: false,
        }
    }

    #[must_use]
    pub const fn optional(kind: FieldKind) -> Self {
        Self {
            kind,
            nullable: true,
        }
    }

    /// The non-nullable underlying kind values are coerced to.
    #[must_use]
    pub const fn underlying(self) -> FieldKind {
        self.kind
    }

    /// Two declared types are compatible when they agree up to nullability.
    #[must_use]
    pub fn compatible_with(self, other: ValueType) -> bool {
        self.kind == other.kind
    }
}

impl From<FieldKind> for ValueType {
    fn from(kind: FieldKind) -> Self {
        Self::required(kind)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "Option<{}>", self.kind)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}
