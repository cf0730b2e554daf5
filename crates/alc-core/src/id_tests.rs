// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;

crate::define_id! {
    /// Test ID type for macro verification.
    pub struct TestId("tst-");
}

#[test]
fn new_ids_are_unique_and_prefixed() {
    let a = TestId::new();
    let b = TestId::new();
    assert_ne!(a, b);
    assert!(a.as_str().starts_with("tst-"));
    assert_eq!(a.as_str().len(), ID_MAX_LEN);
}

#[test]
fn from_string_round_trips() {
    let id = TestId::from_string("tst-abc");
    assert_eq!(id.as_str(), "tst-abc");
    assert_eq!(id.suffix(), "abc");
}

#[test]
fn hash_map_lookup_by_borrowed_str() {
    let id = TestId::from_string("tst-lookup");
    let mut map = HashMap::new();
    map.insert(id, 42);
    assert_eq!(map.get("tst-lookup"), Some(&42));
}

#[test]
fn short_truncates_suffix() {
    let id = TestId::from_string("tst-abcdefghijklmnop");
    assert_eq!(id.short(4), "abcd");
}

#[test]
fn display_matches_as_str() {
    let id = TestId::from_string("tst-x");
    assert_eq!(id.to_string(), "tst-x");
}

#[test]
fn short_fn_on_str_truncates() {
    let s = "abcdefghijklmnop";
    assert_eq!(short(s, 8), "abcdefgh");
    assert_eq!(short(s, 100), s);
    assert_eq!(short("abc", 8), "abc");
}
