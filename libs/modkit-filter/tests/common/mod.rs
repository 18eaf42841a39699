#![allow(clippy::unwrap_used, clippy::expect_used)]
#![allow(dead_code)]

use chrono::NaiveDate;
use modkit_filter::{
    BoundFilter, CompositeType, FieldKind, FilterRequest, FilterShape,
    FilterTreeBuilder, RawQuery, Record, RecordSchema, Value, ValueType,
};
use rust_decimal::Decimal;
use uuid::Uuid;

/* ---------- people ---------- */

#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub name: String,
    pub age: Option<i64>,
    pub email: Option<String>,
    pub tags: Vec<String>,
}

impl Person {
    pub fn new(name: &str, age: Option<i64>, tags: &[&str]) -> Self {
        Self {
            name: name.to_owned(),
            age,
            email: None,
            tags: tags.iter().map(|t| (*t).to_owned()).collect(),
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_owned());
        self
    }
}

impl Record for Person {
    fn schema(schema: RecordSchema<Self>) -> RecordSchema<Self> {
        schema
            .value("name", ValueType::required(FieldKind::String), |p| {
                p.name.as_str().into()
            })
            .value("age", ValueType::optional(FieldKind::I64), |p| p.age.into())
            .value("email", ValueType::optional(FieldKind::String), |p| {
                p.email.clone().into()
            })
            .values("tags", ValueType::required(FieldKind::String), |p| {
                p.tags.iter().map(|t| Value::from(t.as_str())).collect()
            })
    }
}

pub struct PersonFilter;

impl FilterRequest for PersonFilter {
    type Target = Person;

    fn shape() -> FilterShape {
        FilterShape::new("PersonFilter")
            .leaf("name", ValueType::required(FieldKind::String))
            .leaf("age", ValueType::optional(FieldKind::I64))
            .leaf("email", ValueType::optional(FieldKind::String))
            .leaf("tags", ValueType::required(FieldKind::String))
            .scalar("limit", ValueType::optional(FieldKind::I64))
    }
}

/// Same fields as `Person`, different type: a tree bound once compiles to both.
#[derive(Debug, Clone)]
pub struct Employee {
    pub name: String,
    pub age: i64,
}

impl Record for Employee {
    fn schema(schema: RecordSchema<Self>) -> RecordSchema<Self> {
        schema
            .value("name", ValueType::required(FieldKind::String), |e| {
                e.name.as_str().into()
            })
            .value("age", ValueType::required(FieldKind::I64), |e| e.age.into())
    }
}

/* ---------- books ---------- */

#[derive(Debug, Clone, PartialEq)]
pub struct Money {
    pub amount: Decimal,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Author {
    pub name: String,
    pub email: String,
    pub born: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    pub title: String,
    pub price: Money,
    pub author: Option<Author>,
    pub published: bool,
}

impl Record for Author {
    fn schema(schema: RecordSchema<Self>) -> RecordSchema<Self> {
        schema
            .value("name", ValueType::required(FieldKind::String), |a| {
                a.name.as_str().into()
            })
            .value("email", ValueType::required(FieldKind::String), |a| {
                a.email.as_str().into()
            })
            .value("born", ValueType::optional(FieldKind::Date), |a| a.born.into())
    }
}

impl Record for Book {
    fn schema(schema: RecordSchema<Self>) -> RecordSchema<Self> {
        schema
            .value("title", ValueType::required(FieldKind::String), |b| {
                b.title.as_str().into()
            })
            .composite("price", "Money", |money| {
                money
                    .member("amount", ValueType::required(FieldKind::Decimal), |b| {
                        b.price.amount.into()
                    })
                    .member("currency", ValueType::required(FieldKind::String), |b| {
                        b.price.currency.as_str().into()
                    })
            })
            .nested::<Author>("author", |b| b.author.as_ref())
            .value("published", ValueType::required(FieldKind::Bool), |b| {
                b.published.into()
            })
    }
}

pub fn money_type() -> CompositeType {
    CompositeType::new("Money")
        .member("amount", ValueType::required(FieldKind::Decimal))
        .member("currency", ValueType::required(FieldKind::String))
}

pub struct AuthorFilter;

impl FilterRequest for AuthorFilter {
    type Target = Author;

    fn shape() -> FilterShape {
        FilterShape::new("AuthorFilter")
            .leaf("name", ValueType::required(FieldKind::String))
            .leaf("email", ValueType::required(FieldKind::String))
            .leaf("born", ValueType::optional(FieldKind::Date))
    }
}

pub struct BookFilter;

impl FilterRequest for BookFilter {
    type Target = Book;

    fn shape() -> FilterShape {
        FilterShape::new("BookFilter")
            .leaf("title", ValueType::required(FieldKind::String))
            .composite("price", money_type())
            .nested::<AuthorFilter>("author")
            .leaf("published", ValueType::required(FieldKind::Bool))
    }
}

/// `title` declared with the wrong kind.
pub struct MistypedBookFilter;

impl FilterRequest for MistypedBookFilter {
    type Target = Book;

    fn shape() -> FilterShape {
        FilterShape::new("MistypedBookFilter").leaf("title", ValueType::required(FieldKind::I64))
    }
}

/// `author` declared as a plain leaf although the record embeds an `Author`.
pub struct FlatAuthorBookFilter;

impl FilterRequest for FlatAuthorBookFilter {
    type Target = Book;

    fn shape() -> FilterShape {
        FilterShape::new("FlatAuthorBookFilter")
            .leaf("author", ValueType::required(FieldKind::String))
    }
}

pub fn book(title: &str, amount: i64, currency: &str, author: Option<(&str, &str)>) -> Book {
    Book {
        title: title.to_owned(),
        price: Money {
            amount: Decimal::new(amount, 0),
            currency: currency.to_owned(),
        },
        author: author.map(|(name, email)| Author {
            name: name.to_owned(),
            email: email.to_owned(),
            born: None,
        }),
        published: true,
    }
}

/* ---------- orders ---------- */

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub sku: String,
    pub qty: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub items: Vec<Item>,
}

impl Record for Item {
    fn schema(schema: RecordSchema<Self>) -> RecordSchema<Self> {
        schema
            .value("sku", ValueType::required(FieldKind::String), |i| {
                i.sku.as_str().into()
            })
            .value("qty", ValueType::required(FieldKind::I64), |i| i.qty.into())
    }
}

impl Record for Order {
    fn schema(schema: RecordSchema<Self>) -> RecordSchema<Self> {
        schema
            .value("id", ValueType::required(FieldKind::Uuid), |o| o.id.into())
            .list::<Item>("items", |o| o.items.as_slice())
    }
}

pub struct ItemFilter;

impl FilterRequest for ItemFilter {
    type Target = Item;

    fn shape() -> FilterShape {
        FilterShape::new("ItemFilter")
            .leaf("sku", ValueType::required(FieldKind::String))
            .leaf("qty", ValueType::required(FieldKind::I64))
    }
}

pub struct OrderFilter;

impl FilterRequest for OrderFilter {
    type Target = Order;

    fn shape() -> FilterShape {
        FilterShape::new("OrderFilter")
            .leaf("id", ValueType::required(FieldKind::Uuid))
            .list::<ItemFilter>("items")
    }
}

pub fn order(items: &[(&str, i64)]) -> Order {
    Order {
        id: Uuid::nil(),
        items: items
            .iter()
            .map(|(sku, qty)| Item {
                sku: (*sku).to_owned(),
                qty: *qty,
            })
            .collect(),
    }
}

/* ---------- helpers ---------- */

pub fn bind<F: FilterRequest>(pairs: &[(&str, &str)]) -> BoundFilter<F> {
    FilterTreeBuilder::new()
        .bind::<F>(&RawQuery::from_pairs(pairs.iter().copied()))
        .expect("bind")
}

/// Bind, compile and evaluate `pairs` against one record.
pub fn accepts<F: FilterRequest>(pairs: &[(&str, &str)], record: &F::Target) -> bool {
    bind::<F>(pairs)
        .compile()
        .expect("compile")
        .is_none_or(|p| p.test(record))
}
