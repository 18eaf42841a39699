//! Operations bound to one filter leaf.

use tracing::trace;

use crate::coerce::Coerce;
use crate::error::{BindError, BindResult};
use crate::kind::ValueType;
use crate::op::{FilterOperationKind, OperationFamily};
use crate::shape::LeafType;
use crate::value::Value;

/// One parsed operation with its coerced operand(s).
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedOperation {
    pub kind: FilterOperationKind,
    pub values: Vec<Value>,
    pub multi_valued: bool,
    /// Member of a structured leaf this operation targets.
    pub field_override: Option<&'static str>,
}

impl AppliedOperation {
    /// First (for single-valued kinds: the only) operand.
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        self.values.first()
    }
}

/// Where a raw value is being applied, for coercion and error reporting.
#[derive(Clone, Copy)]
pub struct ApplyContext<'a> {
    pub field: &'a str,
    pub coercer: &'a dyn Coerce,
    pub max_in_values: usize,
}

impl<'a> ApplyContext<'a> {
    #[must_use]
    pub fn new(field: &'a str, coercer: &'a dyn Coerce) -> Self {
        Self {
            field,
            coercer,
            max_in_values: usize::MAX,
        }
    }

    #[must_use]
    pub fn with_max_in_values(mut self, max: usize) -> Self {
        self.max_in_values = max;
        self
    }

    fn field_name(&self, member: Option<&str>) -> String {
        match member {
            Some(m) => format!("{}.{m}", self.field),
            None => self.field.to_owned(),
        }
    }
}

/// The ordered operations requested for one filterable field.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOperations {
    value_type: LeafType,
    operations: Vec<AppliedOperation>,
}

impl FilterOperations {
    #[must_use]
    pub fn new(value_type: LeafType) -> Self {
        Self {
            value_type,
            operations: Vec::new(),
        }
    }

    #[must_use]
    pub fn primitive(ty: ValueType) -> Self {
        Self::new(LeafType::Primitive(ty))
    }

    #[must_use]
    pub fn value_type(&self) -> &LeafType {
        &self.value_type
    }

    #[must_use]
    pub fn operations(&self) -> &[AppliedOperation] {
        &self.operations
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AppliedOperation> {
        self.operations.iter()
    }

    /// Coerce `raw` for `kind` and append the resulting operation.
    ///
    /// `member` selects a member of a structured leaf and must be `None` for
    /// primitive leaves. Returns `Ok(false)` when nothing was appended: the
    /// member is unknown, or an `in`/`nin` list had no values.
    ///
    /// # Errors
    /// Fails when a value does not coerce to the target type, a text
    /// operation targets a non-string field, or an `in`/`nin` list is
    /// longer than allowed.
    pub fn apply(
        &mut self,
        kind: FilterOperationKind,
        raw: &str,
        member: Option<&'static str>,
        ctx: &ApplyContext<'_>,
    ) -> BindResult<bool> {
        let target = match (&self.value_type, member) {
            (LeafType::Primitive(ty), None) => *ty,
            (LeafType::Composite(composite), Some(name)) => match composite.find(name) {
                Some(m) => m.ty,
                None => {
                    trace!(field = ctx.field, member = name, "unknown member, ignored");
                    return Ok(false);
                }
            },
            _ => return Ok(false),
        };
        let expected = target.underlying();

        let coerce = |token: &str| {
            ctx.coercer
                .coerce(token, expected)
                .map_err(|source| BindError::Coercion {
                    field: ctx.field_name(member),
                    source,
                })
        };

        let (values, multi_valued) = match kind.family() {
            OperationFamily::Comparison => (vec![coerce(raw)?], false),
            OperationFamily::Text => {
                if !expected.is_text() {
                    return Err(BindError::UnsupportedOperationForType {
                        field: ctx.field_name(member),
                        op: kind,
                        kind: expected,
                    });
                }
                (vec![Value::String(raw.to_owned())], false)
            }
            OperationFamily::Membership => {
                let tokens: Vec<&str> = raw
                    .split(',')
                    .map(|token| token.trim_matches(' '))
                    .filter(|t| !t.is_empty())
                    .collect();
                if tokens.len() > ctx.max_in_values {
                    return Err(BindError::LimitExceeded(format!(
                        "'{}[{kind}]' has {} values, at most {} allowed",
                        ctx.field_name(member),
                        tokens.len(),
                        ctx.max_in_values
                    )));
                }
                if tokens.is_empty() {
                    trace!(field = ctx.field, op = %kind, "empty value list, operation dropped");
                    return Ok(false);
                }
                let values = tokens
                    .into_iter()
                    .map(coerce)
                    .collect::<BindResult<Vec<_>>>()?;
                (values, true)
            }
        };

        self.operations.push(AppliedOperation {
            kind,
            values,
            multi_valued,
            field_override: member,
        });
        Ok(true)
    }
}

impl<'a> IntoIterator for &'a FilterOperations {
    type Item = &'a AppliedOperation;
    type IntoIter = std::slice::Iter<'a, AppliedOperation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}
