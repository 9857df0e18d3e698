mod common;

use common::{attrs, names, page, pick};
use platynui_query::QueryError;
use platynui_query::simple::SimpleTree;
use rstest::rstest;

#[rstest]
#[case(0, 0, &["header"])]
#[case(1, 2, &["main", "footer"])]
#[case(2, 9, &["footer"])]
#[case(3, 5, &[])]
fn slice_of_children(#[case] from: isize, #[case] to: isize, #[case] expected: &[&str]) {
    let q = SimpleTree::query([page()]).children().slice(from, to).unwrap();
    assert_eq!(names(&q), expected);
}

#[rstest]
fn slice_from_and_eq() {
    let base = SimpleTree::query([page()]).children();
    assert_eq!(names(&base.slice_from(1).unwrap()), ["main", "footer"]);
    assert_eq!(names(&base.slice_from(3).unwrap()), Vec::<String>::new());
    assert_eq!(names(&base.eq(1).unwrap()), ["main"]);
    assert!(base.eq(7).unwrap().to_vec().unwrap().is_empty());
}

#[rstest]
fn slice_counts_result_positions_across_inputs() {
    let root = page();
    let s1 = pick(&root, "[id=s1]");
    let s2 = pick(&root, "[id=s2]");
    // s1 -> p, p ; s2 -> list
    let q = SimpleTree::query([s1, s2]).children();
    assert_eq!(names(&q.slice(1, 2).unwrap()), ["p", "list"]);
    assert_eq!(attrs(&q.eq(1).unwrap(), "class"), ["note"]);
}

#[rstest]
fn find_then_slice() {
    let q = SimpleTree::query([page()]).find().slice(3, 5).unwrap();
    assert_eq!(q.to_string(), "$([link], [link], [main])");
}

#[rstest]
#[case(-1, 2)]
#[case(-3, -1)]
fn negative_start_is_rejected(#[case] from: isize, #[case] to: isize) {
    let err = SimpleTree::query([page()]).slice(from, to).unwrap_err();
    assert!(matches!(err, QueryError::NegativeIndex(i) if i == from));
    assert!(err.is_invalid_argument());
}

#[rstest]
fn inverted_range_is_rejected() {
    let err = SimpleTree::query([page()]).slice(3, 1).unwrap_err();
    assert!(matches!(err, QueryError::InvertedRange { from: 3, to: 1 }));
    assert!(err.is_invalid_argument());
}

#[rstest]
fn negative_slice_from_and_eq_are_rejected() {
    let q = SimpleTree::query([page()]);
    assert!(matches!(q.slice_from(-2), Err(QueryError::NegativeIndex(-2))));
    assert!(matches!(q.eq(-1), Err(QueryError::NegativeIndex(-1))));
}

#[rstest]
fn first_and_last() {
    let q = SimpleTree::query([page()]).children();
    assert_eq!(names(&q.first()), ["header"]);
    assert_eq!(names(&q.last()), ["footer"]);
}

#[rstest]
fn last_over_several_inputs() {
    let root = page();
    let s1 = pick(&root, "[id=s1]");
    let s2 = pick(&root, "[id=s2]");
    let q = SimpleTree::query([s1.clone(), s2.clone()]);
    assert_eq!(names(&q.children().last()), ["list"]);
    assert_eq!(attrs(&q.find().last(), "n"), ["3"]);
    assert_eq!(attrs(&SimpleTree::query([s2, s1]).children().last(), "class"), ["note"]);
}

#[rstest]
fn first_and_last_of_nothing() {
    let q = SimpleTree::query([pick(&page(), "footer")]).children();
    assert!(q.first().to_vec().unwrap().is_empty());
    assert!(q.last().to_vec().unwrap().is_empty());
}

#[rstest]
fn last_then_slice_and_slice_then_last() {
    let q = SimpleTree::query([page()]).find_matching("item");
    assert_eq!(attrs(&q.last().eq(0).unwrap(), "n"), ["3"]);
    assert_eq!(attrs(&q.slice(0, 1).unwrap().last(), "n"), ["2"]);
}

#[rstest]
fn unique_drops_repeats_in_first_seen_order() {
    let root = page();
    let s1 = pick(&root, "[id=s1]");
    let s2 = pick(&root, "[id=s2]");
    let q = SimpleTree::query([s1.clone(), s2, s1]).children();
    assert_eq!(names(&q), ["p", "p", "list", "p", "p"]);
    assert_eq!(names(&q.unique()), ["p", "p", "list"]);
}

#[rstest]
fn unique_collapses_shared_parents_and_is_idempotent() {
    let q = SimpleTree::query([page()]).find_matching("item").parent();
    assert_eq!(names(&q), ["list", "list", "list"]);
    assert_eq!(names(&q.unique()), ["list"]);
    assert_eq!(q.unique().to_vec().unwrap(), q.unique().unique().to_vec().unwrap());
}

#[rstest]
fn unique_then_eq_counts_distinct_values() {
    let root = SimpleTree::query([page()]);
    let sections = root.find_matching("section").to_vec().unwrap();
    let q = root.find_matching("item").parent().parent().unique().add(sections).unique();
    assert_eq!(attrs(&q, "id"), ["s2", "s1"]);
    assert_eq!(attrs(&q.eq(1).unwrap(), "id"), ["s1"]);
}
