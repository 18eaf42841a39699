use std::fmt;

/// Filter operations available in bracket notation (`field[op]=value`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperationKind {
    /// `eq`: field equals value
    Eq,
    /// `ne`: field differs from value
    Ne,
    /// `gt`
    Gt,
    /// `gte`
    Gte,
    /// `lt`
    Lt,
    /// `lte`
    Lte,
    /// `li`: case-insensitive substring
    Like,
    /// `nli`
    NotLike,
    /// `sw`: case-insensitive prefix
    StartsWith,
    /// `nsw`
    NotStartsWith,
    /// `ew`: case-insensitive suffix
    EndsWith,
    /// `new`
    NotEndsWith,
    /// `in`: comma-separated membership
    In,
    /// `nin`
    NotIn,
}

/// How an operation consumes its raw value and which predicate shape it compiles to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationFamily {
    Comparison,
    Text,
    Membership,
}

impl FilterOperationKind {
    /// Every operation, in probing order.
    pub const ALL: [FilterOperationKind; 14] = [
        FilterOperationKind::Eq,
        FilterOperationKind::Ne,
        FilterOperationKind::Gt,
        FilterOperationKind::Gte,
        FilterOperationKind::Lt,
        FilterOperationKind::Lte,
        FilterOperationKind::Like,
        FilterOperationKind::NotLike,
        FilterOperationKind::StartsWith,
        FilterOperationKind::NotStartsWith,
        FilterOperationKind::EndsWith,
        FilterOperationKind::NotEndsWith,
        FilterOperationKind::In,
        FilterOperationKind::NotIn,
    ];

    /// Wire tag used inside the trailing bracket.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            FilterOperationKind::Eq => "eq",
            FilterOperationKind::Ne => "ne",
            FilterOperationKind::Gt => "gt",
            FilterOperationKind::Gte => "gte",
            FilterOperationKind::Lt => "lt",
            FilterOperationKind::Lte => "lte",
            FilterOperationKind::Like => "li",
            FilterOperationKind::NotLike => "nli",
            FilterOperationKind::StartsWith => "sw",
            FilterOperationKind::NotStartsWith => "nsw",
            FilterOperationKind::EndsWith => "ew",
            FilterOperationKind::NotEndsWith => "new",
            FilterOperationKind::In => "in",
            FilterOperationKind::NotIn => "nin",
        }
    }

    /// Resolve a wire tag, ignoring ASCII case.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.tag().eq_ignore_ascii_case(tag))
    }

    #[must_use]
    pub const fn family(self) -> OperationFamily {
        match self {
            FilterOperationKind::Eq
            | FilterOperationKind::Ne
            | FilterOperationKind::Gt
            | FilterOperationKind::Gte
            | FilterOperationKind::Lt
            | FilterOperationKind::Lte => OperationFamily::Comparison,
            FilterOperationKind::Like
            | FilterOperationKind::NotLike
            | FilterOperationKind::StartsWith
            | FilterOperationKind::NotStartsWith
            | FilterOperationKind::EndsWith
            | FilterOperationKind::NotEndsWith => OperationFamily::Text,
            FilterOperationKind::In | FilterOperationKind::NotIn => OperationFamily::Membership,
        }
    }

    /// Whether the operation carries a list of values.
    #[must_use]
    pub const fn is_multi_valued(self) -> bool {
        matches!(self.family(), OperationFamily::Membership)
    }

    /// Whether the predicate is the negation of a positive test.
    #[must_use]
    pub const fn is_negated(self) -> bool {
        matches!(
            self,
            FilterOperationKind::Ne
                | FilterOperationKind::NotLike
                | FilterOperationKind::NotStartsWith
                | FilterOperationKind::NotEndsWith
                | FilterOperationKind::NotIn
        )
    }
}

impl fmt::Display for FilterOperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
