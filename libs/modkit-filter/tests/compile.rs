#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{
    Book, BookFilter, Employee, FlatAuthorBookFilter, MistypedBookFilter, OrderFilter, Person,
    PersonFilter, accepts, bind, book, order,
};
use modkit_filter::{
    CompileError, FieldKind, FilterOperations, FilterOperationKind as Op, FilterRequest,
    FilterShape, FilterTreeBuilder, RawQuery, ValueType, compile, compile_leaf, verify,
};

#[test]
fn registered_filters_verify() {
    verify::<PersonFilter>().unwrap();
    verify::<BookFilter>().unwrap();
    verify::<OrderFilter>().unwrap();
}

#[test]
fn verify_reports_type_disagreement() {
    let err = verify::<MistypedBookFilter>().unwrap_err();
    assert_eq!(
        err,
        CompileError::SchemaMismatch {
            field: "title".into(),
            expected: "I64".into(),
            found: "String".into(),
        }
    );
}

#[test]
fn verify_reports_role_disagreement() {
    let err = verify::<FlatAuthorBookFilter>().unwrap_err();
    assert!(matches!(err, CompileError::SchemaMismatch { ref field, .. } if field == "author"));
}

#[test]
fn compile_reports_role_disagreement() {
    let bound = bind::<FlatAuthorBookFilter>(&[("author", "Ann")]);
    assert!(matches!(
        bound.compile(),
        Err(CompileError::SchemaMismatch { .. })
    ));
}

#[test]
fn scalar_only_request_compiles_to_no_filter() {
    let bound = bind::<PersonFilter>(&[("limit", "10")]);
    assert!(bound.compile().unwrap().is_none());
}

#[test]
fn leaf_operations_are_and_ed() {
    let keys = [("age[gte]", "18"), ("age[lte]", "65")];
    assert!(accepts::<PersonFilter>(&keys, &Person::new("a", Some(18), &[])));
    assert!(!accepts::<PersonFilter>(&keys, &Person::new("a", Some(66), &[])));
    assert!(!accepts::<PersonFilter>(&keys, &Person::new("a", None, &[])));
}

#[test]
fn not_equal_holds_for_absent_values() {
    let keys = [("email[ne]", "a@b.com")];
    assert!(accepts::<PersonFilter>(&keys, &Person::new("a", None, &[])));
    assert!(accepts::<PersonFilter>(
        &keys,
        &Person::new("a", None, &[]).with_email("c@d.com")
    ));
    assert!(!accepts::<PersonFilter>(
        &keys,
        &Person::new("a", None, &[]).with_email("a@b.com")
    ));
}

#[test]
fn text_matching_ignores_case() {
    let ann = Person::new("Ann Lee", None, &[]);
    assert!(accepts::<PersonFilter>(&[("name[li]", "NN L")], &ann));
    assert!(accepts::<PersonFilter>(&[("name[sw]", "an")], &ann));
    assert!(accepts::<PersonFilter>(&[("name[ew]", "LEE")], &ann));
    assert!(accepts::<PersonFilter>(&[("name[nsw]", "lee")], &ann));
    assert!(!accepts::<PersonFilter>(&[("name[nli]", "lee")], &ann));
}

#[test]
fn equality_is_exact() {
    let ann = Person::new("Ann", None, &[]);
    assert!(accepts::<PersonFilter>(&[("name", "Ann")], &ann));
    assert!(!accepts::<PersonFilter>(&[("name", "ann")], &ann));
}

#[test]
fn collection_values_match_existentially() {
    let tagged = Person::new("a", None, &["x", "z"]);
    let untagged = Person::new("b", None, &[]);

    assert!(accepts::<PersonFilter>(&[("tags[in]", "x,y")], &tagged));
    assert!(!accepts::<PersonFilter>(&[("tags[in]", "x,y")], &untagged));
    assert!(accepts::<PersonFilter>(&[("tags", "z")], &tagged));

    assert!(!accepts::<PersonFilter>(&[("tags[nin]", "x,y")], &tagged));
    assert!(accepts::<PersonFilter>(&[("tags[nin]", "y")], &tagged));
    assert!(accepts::<PersonFilter>(&[("tags[nin]", "x")], &untagged));
    assert!(!accepts::<PersonFilter>(&[("tags[ne]", "x")], &tagged));
}

#[test]
fn nested_filter_requires_present_child() {
    let keys = [("author[email][eq]", "ann@x.io")];
    assert!(accepts::<BookFilter>(
        &keys,
        &book("Dune", 10, "EUR", Some(("Ann", "ann@x.io")))
    ));
    assert!(!accepts::<BookFilter>(
        &keys,
        &book("Dune", 10, "EUR", Some(("Bob", "bob@x.io")))
    ));
    assert!(!accepts::<BookFilter>(&keys, &book("Dune", 10, "EUR", None)));
}

#[test]
fn structured_leaf_filters_by_member() {
    let cheap = book("A", 5, "EUR", None);
    let pricey = book("B", 50, "USD", None);

    let keys = [("price[amount][gt]", "9.99")];
    assert!(!accepts::<BookFilter>(&keys, &cheap));
    assert!(accepts::<BookFilter>(&keys, &pricey));

    let keys = [("price[currency]", "EUR"), ("price[amount][lte]", "5")];
    assert!(accepts::<BookFilter>(&keys, &cheap));
    assert!(!accepts::<BookFilter>(&keys, &pricey));
}

#[test]
fn list_entries_are_independent_existentials() {
    let o = order(&[("A", 1), ("B", 5)]);

    // Both constraints in one entry: a single item must satisfy them together.
    assert!(!accepts::<OrderFilter>(
        &[("items[0][sku]", "A"), ("items[0][qty][gte]", "5")],
        &o
    ));
    // Split across entries: different items may satisfy each.
    assert!(accepts::<OrderFilter>(
        &[("items[0][sku]", "A"), ("items[1][qty][gte]", "5")],
        &o
    ));
    assert!(!accepts::<OrderFilter>(&[("items[0][sku]", "C")], &o));
    assert!(!accepts::<OrderFilter>(&[("items[0][sku]", "A")], &order(&[])));
}

#[test]
fn boolean_leaf() {
    let mut draft = book("Draft", 1, "EUR", None);
    draft.published = false;
    assert!(accepts::<BookFilter>(&[("published", "false")], &draft));
    assert!(!accepts::<BookFilter>(&[("published", "true")], &draft));
}

#[test]
fn tree_recompiles_against_another_record_type() {
    let bound = bind::<PersonFilter>(&[("age[gt]", "40"), ("tags[in]", "x")]);

    // `tags` has no counterpart on Employee and is skipped.
    let on_employees = compile::<Employee>(bound.node()).unwrap().unwrap();
    assert!(on_employees.test(&Employee {
        name: "e".into(),
        age: 41,
    }));
    assert!(!on_employees.test(&Employee {
        name: "e".into(),
        age: 40,
    }));
}

#[test]
fn standalone_leaf_with_custom_accessor() {
    let bound = bind::<PersonFilter>(&[("name[sw]", "jo"), ("name[nin]", "Jon")]);
    let ops: &FilterOperations = bound.node().leaf("name").unwrap();

    let by_title = compile_leaf("title", ops, |b: &Book| b.title.as_str().into())
        .unwrap()
        .unwrap();
    assert!(by_title.test(&book("Joy", 1, "EUR", None)));
    assert!(!by_title.test(&book("Jon", 1, "EUR", None)));
    assert!(!by_title.test(&book("Dune", 1, "EUR", None)));
}

#[test]
fn standalone_leaf_rejects_member_operations() {
    let bound = bind::<BookFilter>(&[("price[currency]", "EUR")]);
    let ops = bound.node().leaf("price").unwrap();
    let err = compile_leaf("price", ops, |b: &Book| b.price.currency.as_str().into()).unwrap_err();
    assert!(matches!(err, CompileError::SchemaMismatch { ref field, .. } if field == "price.currency"));
}

struct NicknameFilter;

impl FilterRequest for NicknameFilter {
    type Target = Person;

    fn shape() -> FilterShape {
        FilterShape::new("NicknameFilter")
            .leaf("nickname", ValueType::required(FieldKind::String))
            .leaf("age", ValueType::optional(FieldKind::I64))
    }
}

#[test]
fn filter_fields_missing_on_record_are_skipped() {
    verify::<NicknameFilter>().unwrap();
    let bound = FilterTreeBuilder::new()
        .bind::<NicknameFilter>(&RawQuery::from_pairs([("nickname", "x"), ("age", "3")]))
        .unwrap();
    let p = bound.compile().unwrap().unwrap();
    assert!(p.test(&Person::new("a", Some(3), &[])));

    let only_nickname = FilterTreeBuilder::new()
        .bind::<NicknameFilter>(&RawQuery::from_pairs([("nickname", "x")]))
        .unwrap();
    assert!(only_nickname.compile().unwrap().is_none());
}

#[test]
fn operation_kinds_are_exposed_on_the_tree() {
    let bound = bind::<PersonFilter>(&[("age[nin]", "1,2")]);
    let op = &bound.node().leaf("age").unwrap().operations()[0];
    assert_eq!(op.kind, Op::NotIn);
}
