//! Filter tree → predicate compiler.
//!
//! Every bound operation becomes a closure over the record field accessor; the
//! closures of one node are AND-ed. Nested entries require the embedded record
//! to be present. List entries each require some element of the record's
//! collection to satisfy the whole entry; several entries may be satisfied by
//! different elements.
//!
//! | op | holds when |
//! |----|------------|
//! | `eq` | field present and equal |
//! | `ne` | not `eq` (an absent field is unequal to everything) |
//! | `gt` `gte` `lt` `lte` | field present and ordered accordingly |
//! | `li` `sw` `ew` | case-insensitive substring / prefix / suffix of the field's text |
//! | `nli` `nsw` `new` | negation of the positive text test |
//! | `in` / `nin` | field equal to one of / none of the values |

use std::any::TypeId;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::{CompileError, CompileResult};
use crate::kind::ValueType;
use crate::leaf::{AppliedOperation, FilterOperations};
use crate::op::{FilterOperationKind as Op, OperationFamily};
use crate::predicate::Predicate;
use crate::record::{Access, CompositeAccess, Record, schema_of};
use crate::shape::{FieldRole, FilterRequest, FilterShape, LeafType, shape_of};
use crate::tree::{FilterEntry, FilterRequestNode};
use crate::value::Value;

/// (shape address, record type) pairs already checked by [`verify`].
pub(crate) type Visited = HashSet<(usize, TypeId)>;

/// Compile `node` against the record type `T`. `None` means "no filter".
///
/// Filter fields the record does not have are skipped. Scalar parameters do
/// not take part.
///
/// # Errors
/// [`CompileError::SchemaMismatch`] when a field's filter role or type does not
/// fit the record field of the same name.
pub fn compile<T: Record>(node: &FilterRequestNode) -> CompileResult<Option<Predicate<T>>> {
    let compiled = compile_node::<T>(node)?;
    debug!(
        filter = node.shape().name(),
        record = std::any::type_name::<T>(),
        has_predicate = compiled.is_some(),
        "filter compiled"
    );
    Ok(compiled)
}

pub(crate) fn compile_node<T: Record>(
    node: &FilterRequestNode,
) -> CompileResult<Option<Predicate<T>>> {
    let schema = schema_of::<T>();
    let mut parts = Vec::new();

    for (name, entry) in node.iter() {
        let Some(field) = schema.field(name) else {
            trace!(record = schema.name(), field = name, "no such record field, skipped");
            continue;
        };
        match (entry, &field.access) {
            (FilterEntry::Scalar(_), _) => {}

            (FilterEntry::Leaf(ops), Access::Value { ty, get }) => {
                check_primitive(name, ops, *ty, &field.access)?;
                for op in ops {
                    parts.push(operation(name, op, *get)?);
                }
            }

            (FilterEntry::Leaf(ops), Access::Values { ty, get }) => {
                check_primitive(name, ops, *ty, &field.access)?;
                for op in ops {
                    parts.push(elements_operation(name, op, *get)?);
                }
            }

            (FilterEntry::Leaf(ops), Access::Composite(access)) => {
                for op in ops {
                    parts.push(member_operation(name, op, access)?);
                }
            }

            (FilterEntry::Nested(child), Access::Nested(embedded)) => {
                parts.extend(embedded.compile(child)?);
            }

            (FilterEntry::List(items), Access::List(embedded)) => {
                for item in items {
                    parts.extend(embedded.compile(item)?);
                }
            }

            (entry, access) => {
                return Err(mismatch(name, describe_entry(entry), access.describe()));
            }
        }
    }

    Ok(Predicate::all(parts))
}

/// Compile a standalone leaf against an ad-hoc accessor.
///
/// # Errors
/// [`CompileError::SchemaMismatch`] if an operation targets a member of a
/// structured value (a single accessor cannot reach it), or
/// [`CompileError::UnsupportedOperationKind`] for malformed operations.
pub fn compile_leaf<T, A>(
    field: &str,
    ops: &FilterOperations,
    accessor: A,
) -> CompileResult<Option<Predicate<T>>>
where
    T: 'static,
    A: Fn(&T) -> Value + Send + Sync + 'static,
{
    let accessor = Arc::new(accessor);
    let mut parts = Vec::with_capacity(ops.len());
    for op in ops {
        if let Some(member) = op.field_override {
            return Err(mismatch(
                &format!("{field}.{member}"),
                "member accessor".to_owned(),
                "single value accessor".to_owned(),
            ));
        }
        let get = Arc::clone(&accessor);
        parts.push(operation(field, op, move |record: &T| get(record))?);
    }
    Ok(Predicate::all(parts))
}

/// Check, without a request, that every field of `F` fits the record field of
/// the same name on `F::Target`, recursing into nested and list filters.
///
/// Meant to run once at start-up.
///
/// # Errors
/// The first [`CompileError::SchemaMismatch`] found.
pub fn verify<F: FilterRequest>() -> CompileResult<()> {
    let shape = shape_of::<F>();
    verify_shape::<F::Target>(&shape, &mut Visited::new())
}

pub(crate) fn verify_shape<T: Record>(shape: &FilterShape, seen: &mut Visited) -> CompileResult<()> {
    if !seen.insert((std::ptr::from_ref(shape).addr(), TypeId::of::<T>())) {
        return Ok(());
    }
    let schema = schema_of::<T>();

    for field in shape.fields() {
        let Some(record_field) = schema.field(field.name) else {
            continue;
        };
        let access = &record_field.access;
        match (&field.role, access) {
            (FieldRole::Scalar(_), _) => {}

            (
                FieldRole::Leaf(LeafType::Primitive(declared)),
                Access::Value { ty, .. } | Access::Values { ty, .. },
            ) => {
                if !declared.compatible_with(*ty) {
                    return Err(mismatch(field.name, declared.to_string(), ty.to_string()));
                }
            }

            (FieldRole::Leaf(LeafType::Composite(composite)), Access::Composite(members)) => {
                for member in &composite.members {
                    let name = format!("{}.{}", field.name, member.name);
                    match members.find(member.name) {
                        Some(found) if member.ty.compatible_with(found.ty) => {}
                        Some(found) => {
                            return Err(mismatch(&name, member.ty.to_string(), found.ty.to_string()));
                        }
                        None => {
                            return Err(mismatch(&name, member.ty.to_string(), "nothing".to_owned()));
                        }
                    }
                }
            }

            (FieldRole::Nested(child), Access::Nested(embedded))
            | (FieldRole::List(child), Access::List(embedded)) => {
                embedded.verify(&child(), seen)?;
            }

            (role, access) => {
                return Err(mismatch(field.name, describe_role(role), access.describe()));
            }
        }
    }
    Ok(())
}

fn check_primitive<T>(
    field: &str,
    ops: &FilterOperations,
    ty: ValueType,
    access: &Access<T>,
) -> CompileResult<()> {
    match ops.value_type() {
        LeafType::Primitive(declared) if declared.compatible_with(ty) => Ok(()),
        other => Err(mismatch(field, describe_leaf(other), access.describe())),
    }
}

fn member_operation<T: 'static>(
    field: &str,
    op: &AppliedOperation,
    access: &CompositeAccess<T>,
) -> CompileResult<Predicate<T>> {
    let Some(member) = op.field_override else {
        return Err(mismatch(field, "primitive value".to_owned(), access.name.to_owned()));
    };
    let name = format!("{field}.{member}");
    let Some(found) = access.find(member) else {
        return Err(mismatch(&name, "member".to_owned(), "nothing".to_owned()));
    };
    if let Some(kind) = op.value().and_then(Value::kind)
        && op.kind.family() != OperationFamily::Text
        && kind != found.ty.kind
    {
        return Err(mismatch(&name, kind.to_string(), found.ty.to_string()));
    }
    operation(&name, op, found.get)
}

type ValueTest = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

fn operation<T, A>(field: &str, op: &AppliedOperation, get: A) -> CompileResult<Predicate<T>>
where
    T: 'static,
    A: Fn(&T) -> Value + Send + Sync + 'static,
{
    let test = value_test(field, op)?;
    Ok(Predicate::new(move |record: &T| test(&get(record))))
}

fn elements_operation<T: 'static>(
    field: &str,
    op: &AppliedOperation,
    get: fn(&T) -> Vec<Value>,
) -> CompileResult<Predicate<T>> {
    let test = value_test(field, op)?;
    let negated = op.kind.is_negated();
    Ok(Predicate::new(move |record: &T| {
        let elements = get(record);
        if negated {
            elements.iter().all(|v| test(v))
        } else {
            elements.iter().any(|v| test(v))
        }
    }))
}

/// Test of one field value against `op`.
fn value_test(field: &str, op: &AppliedOperation) -> CompileResult<ValueTest> {
    let kind = op.kind;
    let arity_ok = if kind.is_multi_valued() {
        op.multi_valued && !op.values.is_empty()
    } else {
        !op.multi_valued && op.values.len() == 1
    };
    if !arity_ok {
        return Err(malformed(field, kind));
    }

    match kind {
        Op::Eq => ordered(field, op, |ord| ord == Some(Ordering::Equal)),
        Op::Ne => ordered(field, op, |ord| ord != Some(Ordering::Equal)),
        Op::Gt => ordered(field, op, |ord| ord == Some(Ordering::Greater)),
        Op::Gte => ordered(field, op, |ord| {
            matches!(ord, Some(Ordering::Greater | Ordering::Equal))
        }),
        Op::Lt => ordered(field, op, |ord| ord == Some(Ordering::Less)),
        Op::Lte => ordered(field, op, |ord| {
            matches!(ord, Some(Ordering::Less | Ordering::Equal))
        }),
        Op::Like | Op::NotLike => textual(field, op, |haystack, needle| haystack.contains(needle)),
        Op::StartsWith | Op::NotStartsWith => {
            textual(field, op, |haystack, needle| haystack.starts_with(needle))
        }
        Op::EndsWith | Op::NotEndsWith => {
            textual(field, op, |haystack, needle| haystack.ends_with(needle))
        }
        Op::In | Op::NotIn => {
            let values = op.values.clone();
            let negated = kind.is_negated();
            Ok(Arc::new(move |lhs: &Value| {
                values.iter().any(|v| lhs.matches(v)) != negated
            }))
        }
    }
}

/// `lhs` ordered against the single stored value; `Null` orders as `None`.
fn ordered(
    field: &str,
    op: &AppliedOperation,
    accept: fn(Option<Ordering>) -> bool,
) -> CompileResult<ValueTest> {
    let rhs = op
        .value()
        .cloned()
        .ok_or_else(|| malformed(field, op.kind))?;
    Ok(Arc::new(move |lhs: &Value| accept(lhs.compare(&rhs))))
}

/// Case-insensitive text match; negated kinds hold when the positive test fails.
fn textual(
    field: &str,
    op: &AppliedOperation,
    hit: fn(&str, &str) -> bool,
) -> CompileResult<ValueTest> {
    let needle = op
        .value()
        .and_then(Value::to_text)
        .ok_or_else(|| malformed(field, op.kind))?
        .to_lowercase();
    let negated = op.kind.is_negated();
    Ok(Arc::new(move |lhs: &Value| {
        lhs.to_text()
            .is_some_and(|haystack| hit(&haystack.to_lowercase(), &needle))
            != negated
    }))
}

fn malformed(field: &str, op: Op) -> CompileError {
    CompileError::UnsupportedOperationKind {
        field: field.to_owned(),
        op,
    }
}

fn mismatch(field: &str, expected: String, found: String) -> CompileError {
    CompileError::SchemaMismatch {
        field: field.to_owned(),
        expected,
        found,
    }
}

fn describe_leaf(ty: &LeafType) -> String {
    match ty {
        LeafType::Primitive(ty) => ty.to_string(),
        LeafType::Composite(composite) => composite.name.to_owned(),
    }
}

fn describe_entry(entry: &FilterEntry) -> String {
    match entry {
        FilterEntry::Scalar(_) => "scalar parameter".to_owned(),
        FilterEntry::Leaf(ops) => describe_leaf(ops.value_type()),
        FilterEntry::Nested(_) => "nested filter".to_owned(),
        FilterEntry::List(_) => "filter list".to_owned(),
    }
}

fn describe_role(role: &FieldRole) -> String {
    match role {
        FieldRole::Scalar(ty) => ty.to_string(),
        FieldRole::Leaf(ty) => describe_leaf(ty),
        FieldRole::Nested(_) => "nested filter".to_owned(),
        FieldRole::List(_) => "filter list".to_owned(),
    }
}
