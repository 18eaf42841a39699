//! Recursive filter-tree builder.
//!
//! Walks the shape of a filter type and probes the raw query for the keys each
//! field can be addressed by:
//!
//! - scalar fields: the exact key `path`
//! - leaves: `path[op]` for every operation, then bare `path` as an implicit `eq`
//! - structured leaves: `path[member][op]` and bare `path[member]` per member
//! - nested filters: recurse with `path` as the prefix when some key starts with it
//! - lists: `path[0]`, `path[1]`, ... until the first index no key starts with
//!
//! Keys that match no field are ignored.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::coerce::{Coerce, DefaultCoercer};
use crate::compile;
use crate::error::{BindError, BindResult, CompileResult};
use crate::key::{QueryKey, Segment};
use crate::leaf::{ApplyContext, FilterOperations};
use crate::limits::FilterLimits;
use crate::op::FilterOperationKind;
use crate::predicate::Predicate;
use crate::query::RawQuery;
use crate::shape::{FieldRole, FieldShape, FilterRequest, FilterShape, LeafType, shape_of};
use crate::tree::{FilterEntry, FilterRequestNode};
use crate::value::Value;

/// Binds raw queries to filter-request trees.
#[derive(Clone)]
pub struct FilterTreeBuilder {
    coercer: Arc<dyn Coerce>,
    limits: FilterLimits,
}

impl Default for FilterTreeBuilder {
    fn default() -> Self {
        Self {
            coercer: Arc::new(DefaultCoercer),
            limits: FilterLimits::default(),
        }
    }
}

impl fmt::Debug for FilterTreeBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterTreeBuilder")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl FilterTreeBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_limits(mut self, limits: FilterLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Replace the string-to-value conversion used for every bound value.
    #[must_use]
    pub fn with_coercer(mut self, coercer: impl Coerce + 'static) -> Self {
        self.coercer = Arc::new(coercer);
        self
    }

    #[must_use]
    pub fn limits(&self) -> &FilterLimits {
        &self.limits
    }

    /// Bind `query` to the filter type `F`.
    ///
    /// # Errors
    /// Any coercion failure, text operation on a non-string field, or exceeded
    /// limit aborts the whole bind.
    pub fn bind<F: FilterRequest>(&self, query: &RawQuery) -> BindResult<BoundFilter<F>> {
        let node = self.build(shape_of::<F>(), query, &[])?;
        debug!(
            filter = node.shape().name(),
            raw_keys = query.len(),
            bound_fields = node.len(),
            "filter bound"
        );
        Ok(BoundFilter {
            node,
            _filter: PhantomData,
        })
    }

    /// Build a node for `shape` from the keys under `prefix`.
    ///
    /// # Errors
    /// See [`FilterTreeBuilder::bind`].
    pub fn build(
        &self,
        shape: Arc<FilterShape>,
        query: &RawQuery,
        prefix: &[Segment],
    ) -> BindResult<FilterRequestNode> {
        let mut path = prefix.to_vec();
        self.build_node(shape, query, &mut path, 0)
    }

    fn build_node(
        &self,
        shape: Arc<FilterShape>,
        query: &RawQuery,
        path: &mut Vec<Segment>,
        depth: usize,
    ) -> BindResult<FilterRequestNode> {
        let mut node = FilterRequestNode::new(Arc::clone(&shape));
        for field in shape.fields() {
            path.push(Segment::field(field.name));
            let entry = self.build_field(field, query, path, depth);
            path.pop();
            if let Some(entry) = entry? {
                node.insert(field.name, entry);
            }
        }
        Ok(node)
    }

    fn build_field(
        &self,
        field: &FieldShape,
        query: &RawQuery,
        path: &mut Vec<Segment>,
        depth: usize,
    ) -> BindResult<Option<FilterEntry>> {
        match &field.role {
            FieldRole::Scalar(ty) => {
                let Some(raw) = query.get(path, None) else {
                    return Ok(None);
                };
                let value = self
                    .coercer
                    .coerce(raw, ty.underlying())
                    .map_err(|source| BindError::Coercion {
                        field: render(path),
                        source,
                    })?;
                Ok(Some(FilterEntry::Scalar(value)))
            }

            FieldRole::Leaf(leaf_type) => {
                let name = render(path);
                let ctx = ApplyContext::new(&name, self.coercer.as_ref())
                    .with_max_in_values(self.limits.max_in_values);
                let mut ops = FilterOperations::new(leaf_type.clone());
                match leaf_type {
                    LeafType::Primitive(_) => probe(&mut ops, query, path, None, &ctx)?,
                    LeafType::Composite(composite) => {
                        for member in &composite.members {
                            path.push(Segment::field(member.name));
                            let probed = probe(&mut ops, query, path, Some(member.name), &ctx);
                            path.pop();
                            probed?;
                        }
                    }
                }
                if ops.is_empty() {
                    return Ok(None);
                }
                Ok(Some(FilterEntry::Leaf(ops)))
            }

            FieldRole::Nested(child_shape) => {
                if !query.has_prefix(path) {
                    return Ok(None);
                }
                self.check_depth(path, depth)?;
                let child = self.build_node(child_shape(), query, path, depth + 1)?;
                if child.is_empty() {
                    return Ok(None);
                }
                Ok(Some(FilterEntry::Nested(child)))
            }

            FieldRole::List(child_shape) => {
                if !query.has_prefix(path) {
                    return Ok(None);
                }
                self.check_depth(path, depth)?;
                let items = self.build_list(&child_shape(), query, path, depth + 1)?;
                if items.is_empty() {
                    return Ok(None);
                }
                Ok(Some(FilterEntry::List(items)))
            }
        }
    }

    /// Children at `path[0]`, `path[1]`, ... up to the first absent index.
    fn build_list(
        &self,
        shape: &Arc<FilterShape>,
        query: &RawQuery,
        path: &mut Vec<Segment>,
        depth: usize,
    ) -> BindResult<Vec<FilterRequestNode>> {
        let mut items = Vec::new();
        for index in 0_usize.. {
            path.push(Segment::Index(index));
            let child = if !query.has_prefix(path) {
                Ok(None)
            } else if items.len() >= self.limits.max_list_items {
                path.pop();
                return Err(BindError::LimitExceeded(format!(
                    "'{}' has more than {} entries",
                    render(path),
                    self.limits.max_list_items
                )));
            } else {
                self.build_node(Arc::clone(shape), query, path, depth).map(Some)
            };
            path.pop();
            match child? {
                Some(node) => items.push(node),
                None => break,
            }
        }
        Ok(items)
    }

    /// Keys below `path` exist; descending into them must stay within `max_depth`.
    fn check_depth(&self, path: &[Segment], depth: usize) -> BindResult<()> {
        if depth < self.limits.max_depth {
            return Ok(());
        }
        trace!(
            path = %render(path),
            max_depth = self.limits.max_depth,
            "filter nesting too deep"
        );
        Err(BindError::LimitExceeded(format!(
            "'{}' is nested deeper than {} levels",
            render(path),
            self.limits.max_depth
        )))
    }
}

/// Probe every addressable key of one leaf (or leaf member) at `path`.
fn probe(
    ops: &mut FilterOperations,
    query: &RawQuery,
    path: &[Segment],
    member: Option<&'static str>,
    ctx: &ApplyContext<'_>,
) -> BindResult<()> {
    for kind in FilterOperationKind::ALL {
        if let Some(raw) = query.get(path, Some(kind)) {
            ops.apply(kind, raw, member, ctx)?;
        }
    }
    if let Some(raw) = query.get(path, None) {
        ops.apply(FilterOperationKind::Eq, raw, member, ctx)?;
    }
    Ok(())
}

fn render(path: &[Segment]) -> String {
    QueryKey::new(path.to_vec(), None).to_string()
}

/// A filter tree bound for the filter type `F`.
pub struct BoundFilter<F> {
    node: FilterRequestNode,
    _filter: PhantomData<fn() -> F>,
}

impl<F: FilterRequest> BoundFilter<F> {
    #[must_use]
    pub fn node(&self) -> &FilterRequestNode {
        &self.node
    }

    #[must_use]
    pub fn into_node(self) -> FilterRequestNode {
        self.node
    }

    /// `true` when the request carried no applicable key.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.node.is_empty()
    }

    /// Value of a top-level scalar parameter.
    #[must_use]
    pub fn scalar(&self, field: &str) -> Option<&Value> {
        self.node.scalar(field)
    }

    /// Compile against `F`'s target record type. `None` means "no filter".
    ///
    /// # Errors
    /// Returns [`crate::CompileError`] if `F` and its target disagree.
    pub fn compile(&self) -> CompileResult<Option<Predicate<F::Target>>> {
        compile::compile::<F::Target>(&self.node)
    }
}

impl<F> Clone for BoundFilter<F> {
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
            _filter: PhantomData,
        }
    }
}

impl<F> fmt::Debug for BoundFilter<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BoundFilter").field(&self.node).finish()
    }
}
