//! Filter-request type descriptors.
//!
//! A filter-request type (the thing a handler receives, e.g. `BookFilter`)
//! describes its fields once through [`FilterRequest::shape`]. The builder walks
//! that description to decide which raw keys to probe and how to coerce them.
//!
//! # Example
//!
//! ```
//! use modkit_filter::{
//!     CompositeType, FieldKind, FilterRequest, FilterShape, FilterTreeBuilder, RawQuery, Record,
//!     RecordSchema, ValueType,
//! };
//!
//! struct Author {
//!     name: String,
//!     email: String,
//!     royalty: i64,
//!     currency: String,
//! }
//!
//! impl Record for Author {
//!     fn schema(schema: RecordSchema<Self>) -> RecordSchema<Self> {
//!         schema
//!             .value("name", ValueType::required(FieldKind::String), |a| a.name.as_str().into())
//!             .value("email", ValueType::required(FieldKind::String), |a| a.email.as_str().into())
//!             .composite("royalty", "Money", |money| {
//!                 money
//!                     .member("amount", ValueType::required(FieldKind::I64), |a| a.royalty.into())
//!                     .member("currency", ValueType::required(FieldKind::String), |a| {
//!                         a.currency.as_str().into()
//!                     })
//!             })
//!     }
//! }
//!
//! struct AuthorFilter;
//!
//! impl FilterRequest for AuthorFilter {
//!     type Target = Author;
//!
//!     fn shape() -> FilterShape {
//!         FilterShape::new("AuthorFilter")
//!             .leaf("name", ValueType::required(FieldKind::String))
//!             .leaf("email", ValueType::required(FieldKind::String))
//!             .composite(
//!                 "royalty",
//!                 CompositeType::new("Money")
//!                     .member("amount", ValueType::required(FieldKind::I64))
//!                     .member("currency", ValueType::required(FieldKind::String)),
//!             )
//!     }
//! }
//!
//! let query = RawQuery::from_pairs([("email[ew]", "@acme.io"), ("royalty[amount][gte]", "10")]);
//! let filter = FilterTreeBuilder::new().bind::<AuthorFilter>(&query).unwrap();
//! let matches = filter.compile().unwrap().unwrap();
//!
//! assert!(matches.test(&Author {
//!     name: "Ann".into(),
//!     email: "ann@acme.io".into(),
//!     royalty: 12,
//!     currency: "EUR".into(),
//! }));
//! ```

use std::fmt;
use std::sync::Arc;

use crate::kind::ValueType;
use crate::record::Record;
use crate::registry;

/// Lazily resolved shape of a nested filter type.
pub type ShapeFn = fn() -> Arc<FilterShape>;

/// A type that can be bound from bracket-notation keys.
///
/// Binding is only offered for implementors, so asking to bind anything else
/// is rejected at compile time.
pub trait FilterRequest: 'static {
    /// Record type the compiled predicate runs against.
    type Target: Record;

    /// Describe the filterable fields. Called once per type; the result is cached.
    fn shape() -> FilterShape;
}

/// Cached shape of `F`.
#[must_use]
pub fn shape_of<F: FilterRequest>() -> Arc<FilterShape> {
    registry::cached::<F, FilterShape>(F::shape)
}

/// Member of a structured leaf value (e.g. `amount` of a `Money` leaf).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberShape {
    pub name: &'static str,
    pub ty: ValueType,
}

/// A small value object used as a leaf type; filtered through its members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeType {
    pub name: &'static str,
    pub members: Vec<MemberShape>,
}

impl CompositeType {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            members: Vec::new(),
        }
    }

    #[must_use]
    pub fn member(mut self, name: &'static str, ty: ValueType) -> Self {
        self.members.push(MemberShape { name, ty });
        self
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<&MemberShape> {
        self.members
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
    }
}

/// Declared value type of a filter leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeafType {
    Primitive(ValueType),
    Composite(CompositeType),
}

/// What a field of a filter type is.
#[derive(Clone)]
pub enum FieldRole {
    /// Plain parameter bound by exact key, not a filter.
    Scalar(ValueType),
    /// Filterable field accepting operations.
    Leaf(LeafType),
    /// A single nested filter object.
    Nested(ShapeFn),
    /// A collection of nested filter objects (`items[0][..]`, `items[1][..]`).
    List(ShapeFn),
}

impl fmt::Debug for FieldRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRole::Scalar(ty) => f.debug_tuple("Scalar").field(ty).finish(),
            FieldRole::Leaf(ty) => f.debug_tuple("Leaf").field(ty).finish(),
            FieldRole::Nested(_) => f.write_str("Nested(..)"),
            FieldRole::List(_) => f.write_str("List(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldShape {
    pub name: &'static str,
    pub role: FieldRole,
}

/// Ordered field description of one filter-request type.
#[derive(Debug, Clone)]
#[must_use]
pub struct FilterShape {
    name: &'static str,
    fields: Vec<FieldShape>,
}

impl FilterShape {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
        }
    }

    fn push(mut self, name: &'static str, role: FieldRole) -> Self {
        self.fields.push(FieldShape { name, role });
        self
    }

    pub fn scalar(self, name: &'static str, ty: ValueType) -> Self {
        self.push(name, FieldRole::Scalar(ty))
    }

    pub fn leaf(self, name: &'static str, ty: ValueType) -> Self {
        self.push(name, FieldRole::Leaf(LeafType::Primitive(ty)))
    }

    pub fn composite(self, name: &'static str, ty: CompositeType) -> Self {
        self.push(name, FieldRole::Leaf(LeafType::Composite(ty)))
    }

    pub fn nested<F: FilterRequest>(self, name: &'static str) -> Self {
        self.push(name, FieldRole::Nested(shape_of::<F>))
    }

    pub fn list<F: FilterRequest>(self, name: &'static str) -> Self {
        self.push(name, FieldRole::List(shape_of::<F>))
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldShape] {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldShape> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }
}
