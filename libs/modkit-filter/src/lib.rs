#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Bracket-notation filters for `ModKit` handlers.
//!
//! Request keys such as `age[gte]=18`, `author[email][eq]=a@b.com`,
//! `tags[in]=a,b` or `items[0][sku]=ABC` are bound to a typed
//! [`FilterRequestNode`] tree for a filter type, then compiled into a
//! [`Predicate`] over the records being listed:
//!
//! ```text
//! RawQuery ──bind::<F>──▶ BoundFilter<F> ──compile──▶ Option<Predicate<F::Target>> ──▶ apply_filters
//! ```
//!
//! - `shape`: what a filter type accepts ([`FilterRequest`], [`FilterShape`])
//! - `record`: how records expose their fields ([`Record`], [`RecordSchema`])
//! - `builder`: raw keys → tree ([`FilterTreeBuilder`])
//! - `compile`: tree → predicate ([`compile()`], [`verify`])
//! - `predicate`: combining and applying predicates

pub mod builder;
pub mod coerce;
pub mod compile;
pub mod error;
pub mod key;
pub mod kind;
pub mod leaf;
pub mod limits;
pub mod op;
pub mod predicate;
pub mod query;
pub mod record;
mod registry;
pub mod shape;
pub mod tree;
pub mod value;

pub use builder::{BoundFilter, FilterTreeBuilder};
pub use coerce::{Coerce, CoercionError, DefaultCoercer};
pub use compile::{compile, compile_leaf, verify};
pub use error::{BindError, BindResult, CompileError, CompileResult};
pub use key::{QueryKey, Segment};
pub use kind::{FieldKind, ValueType};
pub use leaf::{AppliedOperation, ApplyContext, FilterOperations};
pub use limits::FilterLimits;
pub use op::{FilterOperationKind, OperationFamily};
pub use predicate::{ApplyFilterExt, Predicate, apply_filters};
pub use query::RawQuery;
pub use record::{CompositeAccess, Record, RecordSchema, schema_of};
pub use shape::{CompositeType, FieldRole, FilterRequest, FilterShape, LeafType, shape_of};
pub use tree::{FilterEntry, FilterRequestNode};
pub use value::Value;
