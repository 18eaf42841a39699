//! Candidate record descriptors.
//!
//! A record type lists its fields together with typed accessor functions. The
//! compiler composes those accessors into predicates; nothing is synthesized
//! per request.

use std::fmt;
use std::sync::Arc;

use crate::compile::{self, Visited};
use crate::error::CompileResult;
use crate::kind::ValueType;
use crate::predicate::Predicate;
use crate::registry;
use crate::shape::FilterShape;
use crate::tree::FilterRequestNode;
use crate::value::Value;

/// A type filters can be compiled against.
///
/// ```
/// use modkit_filter::{FieldKind, Record, RecordSchema, ValueType};
///
/// struct Person {
///     name: String,
///     age: Option<i64>,
/// }
///
/// impl Record for Person {
///     fn schema(schema: RecordSchema<Self>) -> RecordSchema<Self> {
///         schema
///             .value("name", ValueType::required(FieldKind::String), |p| p.name.as_str().into())
///             .value("age", ValueType::optional(FieldKind::I64), |p| p.age.into())
///     }
/// }
/// ```
pub trait Record: Sized + 'static {
    /// Describe the fields filters may reference by extending the empty
    /// `schema`. Called once per type; the result is cached.
    fn schema(schema: RecordSchema<Self>) -> RecordSchema<Self>;
}

/// Cached schema of `T`.
#[must_use]
pub fn schema_of<T: Record>() -> Arc<RecordSchema<T>> {
    registry::cached::<T, RecordSchema<T>>(|| {
        T::schema(RecordSchema::new(short_type_name::<T>()))
    })
}

/// `Book` for `my_app::model::Book<X>`.
fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let path = full.split('<').next().unwrap_or(full);
    path.rsplit("::").next().unwrap_or(path)
}

/// Accessor for one member of a structured field value.
pub struct MemberAccess<T> {
    pub(crate) name: &'static str,
    pub(crate) ty: ValueType,
    pub(crate) get: fn(&T) -> Value,
}

/// Accessors for a structured field (e.g. `price: Money`), one per member.
#[must_use]
pub struct CompositeAccess<T> {
    pub(crate) name: &'static str,
    pub(crate) members: Vec<MemberAccess<T>>,
}

impl<T> CompositeAccess<T> {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            members: Vec::new(),
        }
    }

    pub fn member(mut self, name: &'static str, ty: ValueType, get: fn(&T) -> Value) -> Self {
        self.members.push(MemberAccess { name, ty, get });
        self
    }

    pub(crate) fn find(&self, name: &str) -> Option<&MemberAccess<T>> {
        self.members
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
    }
}

/// Compiles a child filter node against an embedded record type.
pub(crate) trait Embedded<T>: Send + Sync {
    fn compile(&self, node: &FilterRequestNode) -> CompileResult<Option<Predicate<T>>>;

    fn verify(&self, shape: &FilterShape, seen: &mut Visited) -> CompileResult<()>;
}

struct NestedAccess<T, U> {
    get: fn(&T) -> Option<&U>,
}

impl<T: 'static, U: Record> Embedded<T> for NestedAccess<T, U> {
    fn compile(&self, node: &FilterRequestNode) -> CompileResult<Option<Predicate<T>>> {
        let Some(inner) = compile::compile_node::<U>(node)? else {
            return Ok(None);
        };
        let get = self.get;
        Ok(Some(Predicate::new(move |record: &T| {
            get(record).is_some_and(|nested| inner.test(nested))
        })))
    }

    fn verify(&self, shape: &FilterShape, seen: &mut Visited) -> CompileResult<()> {
        compile::verify_shape::<U>(shape, seen)
    }
}

struct ListAccess<T, U> {
    get: fn(&T) -> &[U],
}

impl<T: 'static, U: Record> Embedded<T> for ListAccess<T, U> {
    // Existential per entry: some element satisfies all of the entry's filters.
    fn compile(&self, node: &FilterRequestNode) -> CompileResult<Option<Predicate<T>>> {
        let Some(inner) = compile::compile_node::<U>(node)? else {
            return Ok(None);
        };
        let get = self.get;
        Ok(Some(Predicate::new(move |record: &T| {
            get(record).iter().any(|element| inner.test(element))
        })))
    }

    fn verify(&self, shape: &FilterShape, seen: &mut Visited) -> CompileResult<()> {
        compile::verify_shape::<U>(shape, seen)
    }
}

pub(crate) enum Access<T> {
    Value { ty: ValueType, get: fn(&T) -> Value },
    Values { ty: ValueType, get: fn(&T) -> Vec<Value> },
    Composite(CompositeAccess<T>),
    Nested(Box<dyn Embedded<T>>),
    List(Box<dyn Embedded<T>>),
}

impl<T> Access<T> {
    pub(crate) fn describe(&self) -> String {
        match self {
            Access::Value { ty, .. } => ty.to_string(),
            Access::Values { ty, .. } => format!("[{ty}]"),
            Access::Composite(c) => c.name.to_owned(),
            Access::Nested(_) => "nested record".to_owned(),
            Access::List(_) => "record list".to_owned(),
        }
    }
}

pub(crate) struct RecordField<T> {
    pub(crate) name: &'static str,
    pub(crate) access: Access<T>,
}

/// Field name → typed accessor table of a record type.
#[must_use]
pub struct RecordSchema<T> {
    name: &'static str,
    fields: Vec<RecordField<T>>,
}

impl<T: 'static> RecordSchema<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
        }
    }

    fn push(mut self, name: &'static str, access: Access<T>) -> Self {
        self.fields.push(RecordField { name, access });
        self
    }

    /// A primitive field.
    pub fn value(self, name: &'static str, ty: ValueType, get: fn(&T) -> Value) -> Self {
        self.push(name, Access::Value { ty, get })
    }

    /// A collection of primitive values (e.g. `tags: Vec<String>`).
    ///
    /// A positive operation holds when some element satisfies it; a negated
    /// one (`ne`, `nin`, `nli`, ...) when no element satisfies its positive
    /// counterpart.
    pub fn values(self, name: &'static str, ty: ValueType, get: fn(&T) -> Vec<Value>) -> Self {
        self.push(name, Access::Values { ty, get })
    }

    /// A structured value field filtered through its members. `members`
    /// registers one accessor per member of the `type_name` value object.
    pub fn composite(
        self,
        name: &'static str,
        type_name: &'static str,
        members: impl FnOnce(CompositeAccess<T>) -> CompositeAccess<T>,
    ) -> Self {
        let access = members(CompositeAccess::new(type_name));
        self.push(name, Access::Composite(access))
    }

    /// A navigation to a single (possibly absent) embedded record.
    pub fn nested<U: Record>(self, name: &'static str, get: fn(&T) -> Option<&U>) -> Self {
        self.push(name, Access::Nested(Box::new(NestedAccess { get })))
    }

    /// A collection of embedded records.
    pub fn list<U: Record>(self, name: &'static str, get: fn(&T) -> &[U]) -> Self {
        self.push(name, Access::List(Box::new(ListAccess { get })))
    }
}

impl<T> RecordSchema<T> {
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }

    pub(crate) fn field(&self, name: &str) -> Option<&RecordField<T>> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }
}

impl<T> fmt::Debug for RecordSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordSchema")
            .field("name", &self.name)
            .field(
                "fields",
                &self.fields.iter().map(|f| f.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::kind::FieldKind;

    struct Shipment {
        code: String,
        weight: Option<i64>,
        tags: Vec<String>,
        cost: i64,
        currency: String,
    }

    impl Record for Shipment {
        fn schema(schema: RecordSchema<Self>) -> RecordSchema<Self> {
            schema
                .value("code", ValueType::required(FieldKind::String), |s| {
                    s.code.as_str().into()
                })
                .value("weight", ValueType::optional(FieldKind::I64), |s| s.weight.into())
                .values("tags", ValueType::required(FieldKind::String), |s| {
                    s.tags.iter().map(|t| Value::from(t.as_str())).collect()
                })
                .composite("cost", "Money", |money| {
                    money
                        .member("amount", ValueType::required(FieldKind::I64), |s| s.cost.into())
                        .member("currency", ValueType::required(FieldKind::String), |s| {
                            s.currency.as_str().into()
                        })
                })
        }
    }

    #[test]
    fn schema_is_named_after_the_record_type() {
        let schema = schema_of::<Shipment>();
        assert_eq!(schema.name(), "Shipment");
        assert_eq!(
            schema.field_names().collect::<Vec<_>>(),
            vec!["code", "weight", "tags", "cost"]
        );
        assert!(Arc::ptr_eq(&schema, &schema_of::<Shipment>()));
    }

    #[test]
    fn accessors_read_the_record() {
        let shipment = Shipment {
            code: "S-1".into(),
            weight: None,
            tags: vec!["cold".into()],
            cost: 40,
            currency: "EUR".into(),
        };
        let schema = schema_of::<Shipment>();

        let Some(Access::Value { get, .. }) = schema.field("WEIGHT").map(|f| &f.access) else {
            panic!("weight must be a value field");
        };
        assert_eq!(get(&shipment), Value::Null);

        let Some(Access::Composite(cost)) = schema.field("cost").map(|f| &f.access) else {
            panic!("cost must be composite");
        };
        assert_eq!(cost.name, "Money");
        let currency = cost.find("Currency").map(|m| (m.get)(&shipment));
        assert_eq!(currency, Some(Value::from("EUR")));
    }

    #[test]
    fn short_type_name_drops_path_and_generics() {
        assert_eq!(short_type_name::<Shipment>(), "Shipment");
        assert_eq!(short_type_name::<Vec<String>>(), "Vec");
    }
}
