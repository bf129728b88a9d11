//! Scanner and Repairer Property Tests
//!
//! Runs the structural scanner and repairer over every prefix of a few
//! realistic model payloads:
//! - Complete documents scan as balanced and repair as a no-op
//! - Every strict prefix of an object scans as truncated
//! - Repair is idempotent on its own output
//! - Cuts after a complete value repair into a parseable subset

use std::collections::BTreeSet;

use serde_json::Value;

use cmdshift_core::{repair, scan};

const DOCUMENTS: &[&str] = &[
    r#"{"index.html": "<!DOCTYPE html>\n<p class=\"x\">{hi} [there]</p>", "styles/main.css": "body { margin: 0 }", "meta": {"tags": ["a", "b", {"deep": [1, 2, {"x": null}]}], "ok": true, "n": -1.5e3}}"#,
    r#"{"a": [], "b": {}, "c": [[[[1]]]], "d": "back\\slash \"quoted\"", "e": false, "f": "ünïcödé ✓"}"#,
    r##"{
  "index.html": "<html><body><script>const o = {a: [1]};</script></body></html>",
  "README.md": "# Title\n\n```js\nfn()\n```"
}"##,
];

fn char_boundaries(text: &str) -> impl Iterator<Item = usize> + '_ {
    (1..text.len()).filter(move |&i| text.is_char_boundary(i))
}

/// Prefix ends right after a complete value (or a separating comma)
fn is_value_boundary(doc: &str, cut: usize) -> bool {
    let prefix = &doc[..cut];
    if scan(prefix).in_string {
        return false;
    }
    let last = prefix.trim_end().chars().last();
    let next = doc[cut..].trim_start().chars().next();
    match last {
        Some(',') => true,
        Some('"') | Some(']') | Some('}') | Some('e') | Some('l') => {
            matches!(next, Some(',') | Some('}') | Some(']'))
        }
        Some(c) if c.is_ascii_digit() => matches!(next, Some(',') | Some('}') | Some(']')),
        _ => false,
    }
}

#[test]
fn complete_documents_are_balanced_and_untouched() {
    for doc in DOCUMENTS {
        let result = scan(doc);
        assert!(result.is_balanced(), "{doc}");
        assert!(!result.is_truncated());

        let outcome = repair(doc);
        assert!(outcome.is_noop());
        assert_eq!(outcome.repaired_text, *doc);
        assert!(serde_json::from_str::<Value>(doc).is_ok());
    }
}

#[test]
fn every_strict_prefix_is_truncated() {
    for doc in DOCUMENTS {
        for cut in char_boundaries(doc) {
            let prefix = &doc[..cut];
            assert!(
                scan(prefix).is_truncated(),
                "prefix not flagged as truncated: {prefix:?}"
            );
        }
    }
}

#[test]
fn repair_is_idempotent_on_its_output() {
    for doc in DOCUMENTS {
        for cut in char_boundaries(doc) {
            let first = repair(&doc[..cut]);
            assert!(!first.is_noop());

            let second = repair(&first.repaired_text);
            assert!(second.is_noop(), "second pass changed {:?}", first.repaired_text);
            assert!(!scan(&first.repaired_text).is_truncated());
        }
    }
}

#[test]
fn value_boundary_cuts_repair_to_a_key_subset() {
    let mut checked = 0;
    for doc in DOCUMENTS {
        let original: Value = serde_json::from_str(doc).unwrap();
        let original_keys: BTreeSet<&String> = original.as_object().unwrap().keys().collect();

        for cut in char_boundaries(doc).filter(|&cut| is_value_boundary(doc, cut)) {
            let outcome = repair(&doc[..cut]);
            let repaired: Value = serde_json::from_str(&outcome.repaired_text)
                .unwrap_or_else(|e| panic!("{:?} did not parse: {e}", outcome.repaired_text));

            let keys: BTreeSet<&String> = repaired.as_object().unwrap().keys().collect();
            assert!(keys.is_subset(&original_keys));
            checked += 1;
        }
    }
    assert!(checked > 20);
}

#[test]
fn unmatched_closer_before_open_array_is_still_truncated() {
    let result = scan(r#"}{"a": [1"#);
    assert!(result.went_negative);
    assert_eq!(result.open_braces, 0);
    assert!(result.is_truncated());
}

#[test]
fn trailing_unmatched_closer_is_flagged_but_not_truncated() {
    let result = scan(r#"{"a": 1}]"#);
    assert!(result.went_negative);
    assert!(!result.is_truncated());
    assert!(!result.is_balanced());
}
