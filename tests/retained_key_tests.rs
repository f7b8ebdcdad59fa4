//! Unit tests for the original-key-retaining style.
//!
//! A retaining map looks up through the transform like any other, but
//! iteration, display, and conversion expose the original key of the
//! most recent store for each transformed key.

use keymorph::{KeyStyle, TransformMap};
use rstest::rstest;

fn retaining_map() -> TransformMap<String, i32> {
    TransformMap::retaining(|key: &String| key.to_lowercase())
}

fn key(text: &str) -> String {
    text.to_string()
}

#[rstest]
fn test_scenario_retaining_map_exposes_original_keys() {
    let mut map = retaining_map();
    map.insert(key("Foo"), 1);
    map.insert(key("BAR"), 2);

    assert_eq!(map.key_style(), KeyStyle::Retained);
    assert_eq!(map.get(&key("foo")), Some(&1));
    assert_eq!(map.get(&key("bar")), Some(&2));
    assert_eq!(
        map.keys().map(String::as_str).collect::<Vec<_>>(),
        ["Foo", "BAR"]
    );
    assert_eq!(format!("{map:?}"), r#"{"Foo": 1, "BAR": 2}"#);
}

#[rstest]
fn test_retaining_identity_keeps_keys_verbatim_and_exposes_originals() {
    let mut map: TransformMap<String, i32> = TransformMap::retaining_identity();
    map.insert(key("Foo"), 1);

    assert_eq!(map.key_style(), KeyStyle::Retained);
    assert!(map.transform().is_identity());
    assert_eq!(map.get(&key("Foo")), Some(&1));
    assert_eq!(map.get(&key("foo")), None);
    assert_eq!(map.keys().map(String::as_str).collect::<Vec<_>>(), ["Foo"]);
}

#[rstest]
fn test_retaining_from_source_keeps_given_spellings() {
    let pairs = [(key("Foo"), 1), (key("BAR"), 2), (key("FOO"), 3)];
    let map = TransformMap::retaining_from_source_with(&pairs, |key: &String| key.to_lowercase());

    assert_eq!(map.key_style(), KeyStyle::Retained);
    assert_eq!(map.len(), 2);
    assert_eq!(map.get(&key("foo")), Some(&3));
    assert_eq!(
        map.keys().map(String::as_str).collect::<Vec<_>>(),
        ["FOO", "BAR"]
    );
}

#[rstest]
fn test_retained_key_is_last_write_not_first() {
    let mut map = retaining_map();
    map.insert(key("Foo"), 1);
    map.insert(key("FOO"), 2);
    map.insert(key("foo"), 3);

    assert_eq!(map.len(), 1);
    assert_eq!(map.get(&key("FoO")), Some(&3));
    assert_eq!(map.keys().map(String::as_str).collect::<Vec<_>>(), ["foo"]);

    map.insert(key("fOO"), 4);
    assert_eq!(map.keys().map(String::as_str).collect::<Vec<_>>(), ["fOO"]);
}

#[rstest]
fn test_update_keeps_position_while_swapping_original() {
    let mut map = retaining_map();
    map.insert(key("Alpha"), 1);
    map.insert(key("Beta"), 2);
    map.insert(key("ALPHA"), 10);

    assert_eq!(
        map.keys().map(String::as_str).collect::<Vec<_>>(),
        ["ALPHA", "Beta"]
    );
    assert_eq!(map.values().copied().collect::<Vec<_>>(), [10, 2]);
}

#[rstest]
fn test_entries_pair_transformed_with_retained_original() {
    let mut map = retaining_map();
    map.insert(key("Foo"), 1);
    map.insert(key("FOO"), 2);

    let triples: Vec<(&String, &String, &i32)> = map.entries().collect();
    assert_eq!(triples.len(), 1);
    let (transformed, original, value) = triples[0];
    assert_eq!(transformed, "foo");
    assert_eq!(original, "FOO");
    assert_eq!(value, &2);
}

#[rstest]
fn test_to_index_map_uses_original_keys() {
    let mut map = retaining_map();
    map.insert(key("Foo"), 1);
    map.insert(key("BAR"), 2);

    let plain = map.to_index_map();
    assert_eq!(
        plain.keys().map(String::as_str).collect::<Vec<_>>(),
        ["Foo", "BAR"]
    );
}

#[rstest]
fn test_into_iterator_yields_original_keys() {
    let mut map = retaining_map();
    map.insert(key("Foo"), 1);

    let pairs: Vec<(String, i32)> = map.into_iter().collect();
    assert_eq!(pairs, [(key("Foo"), 1)]);
}

#[rstest]
fn test_derived_maps_keep_the_retaining_style() {
    let mut map = retaining_map();
    map.insert(key("Foo"), 1);
    map.insert(key("BAR"), 2);

    let filtered = map.filter(|_, value| *value == 1);
    assert_eq!(filtered.key_style(), KeyStyle::Retained);
    assert_eq!(
        filtered.keys().map(String::as_str).collect::<Vec<_>>(),
        ["Foo"]
    );

    let sliced = map.slice([key("bar")]);
    assert_eq!(
        sliced.keys().map(String::as_str).collect::<Vec<_>>(),
        ["BAR"]
    );
}

#[rstest]
fn test_merging_a_retaining_source_uses_its_original_keys() {
    let mut source = retaining_map();
    source.insert(key("MiXeD"), 5);

    let mut receiver: TransformMap<String, i32> = TransformMap::new();
    receiver.merge_from([&source]);

    // The identity receiver stores the source's exposed (original) key.
    assert_eq!(receiver.get(&key("MiXeD")), Some(&5));
    assert_eq!(receiver.get(&key("mixed")), None);
}

#[rstest]
fn test_merge_into_retaining_map_retains_incoming_spelling() {
    let mut receiver = retaining_map();
    receiver.insert(key("Foo"), 1);

    let incoming = vec![(key("FOO"), 10), (key("Bar"), 2)];
    receiver.merge_from([&incoming]);

    assert_eq!(
        receiver.keys().map(String::as_str).collect::<Vec<_>>(),
        ["FOO", "Bar"]
    );
    assert_eq!(receiver.get(&key("foo")), Some(&10));
}

#[rstest]
fn test_invert_uses_exposed_original_keys_as_values() {
    let mut map: TransformMap<String, String> =
        TransformMap::retaining(|key: &String| key.to_lowercase());
    map.insert(key("One"), key("First"));

    let inverted = map.invert();
    // The old value becomes the key (transformed for lookup, retained as
    // spelled for exposure); the old exposed key becomes the value.
    assert_eq!(inverted.get(&key("FIRST")), Some(&key("One")));
    assert_eq!(
        inverted.keys().map(String::as_str).collect::<Vec<_>>(),
        ["First"]
    );
}

#[rstest]
fn test_equality_between_styles_compares_transformed_contents() {
    let mut retained = retaining_map();
    retained.insert(key("Foo"), 1);

    let mut transformed = TransformMap::with_transform(|key: &String| key.to_lowercase());
    transformed.insert(key("FOO"), 1);

    assert_eq!(retained, transformed);
}
