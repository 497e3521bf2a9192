//! Tests for [`enrich`].

use super::*;
use serde_json::{json, Value};

fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Remove the intercepted key from an enriched document for comparison.
fn without_intercepted(body: &[u8]) -> Value {
    let mut value: Value = serde_json::from_slice(body).unwrap();
    value.as_object_mut().unwrap().remove(INTERCEPTED_KEY);
    value
}

mod placement_tests {
    use super::*;

    #[test]
    fn test_key_is_appended_after_existing_members() {
        let body = br#"{"zeta":1,"alpha":{"nested":[1,2,3]},"mid":"x"}"#;

        let enriched = enrich(body, &fields(&[("short_sha", "abc123")])).unwrap();

        assert_eq!(
            &enriched[..],
            br#"{"zeta":1,"alpha":{"nested":[1,2,3]},"mid":"x","intercepted":{"short_sha":"abc123"}}"#
        );
    }

    /// Verify the push field set is written in a stable order.
    #[test]
    fn test_push_fields_are_written_in_key_order() {
        let enriched = enrich(
            b"{}",
            &fields(&[("short_sha", "abc123"), ("ref", "master")]),
        )
        .unwrap();

        assert_eq!(
            &enriched[..],
            br#"{"intercepted":{"ref":"master","short_sha":"abc123"}}"#
        );
    }

    /// Verify an existing intercepted object is replaced where it stands.
    #[test]
    fn test_existing_key_is_overwritten_in_place() {
        let body = br#"{"a":1,"intercepted":{"stale":true,"ref":"old"},"b":2}"#;

        let enriched = enrich(body, &fields(&[("short_sha", "fedcba")])).unwrap();

        assert_eq!(
            &enriched[..],
            br#"{"a":1,"intercepted":{"short_sha":"fedcba"},"b":2}"#
        );
    }

    #[test]
    fn test_duplicate_intercepted_keys_collapse() {
        let body = br#"{"intercepted":1,"a":true,"intercepted":2}"#;

        let enriched = enrich(body, &fields(&[("short_sha", "abcdef")])).unwrap();

        assert_eq!(
            &enriched[..],
            br#"{"intercepted":{"short_sha":"abcdef"},"a":true}"#
        );
    }

    #[test]
    fn test_empty_field_set_writes_empty_object() {
        let enriched = enrich(br#"{"a":1}"#, &BTreeMap::new()).unwrap();

        assert_eq!(&enriched[..], br#"{"a":1,"intercepted":{}}"#);
    }
}

mod preservation_tests {
    use super::*;

    /// Removing the added key yields a document equal to the original.
    #[test]
    fn test_round_trip_without_intercepted_is_equal() {
        let original = json!({
            "ref": "refs/heads/master",
            "before": "0000000000000000000000000000000000000000",
            "repository": { "full_name": "testing/testing", "private": false, "id": 1234 },
            "commits": [{ "id": "abc123456789", "added": [], "message": "hello \"world\"" }],
            "head_commit": null,
            "size": 1.5e3,
            "unicode": "caf\u{e9} \u{2713}"
        });
        let body = serde_json::to_vec(&original).unwrap();

        let enriched = enrich(&body, &fields(&[("ref", "master"), ("short_sha", "abc123")]))
            .unwrap();

        assert_eq!(without_intercepted(&enriched), original);
    }

    /// Values keep their exact original text, including inner whitespace.
    #[test]
    fn test_raw_values_are_copied_verbatim() {
        let body = b"{\"big\": 123456789012345678901234567890, \"obj\": { \"k\" : [ 1 ,2 ] }}";

        let enriched = enrich(body, &fields(&[("short_sha", "abc123")])).unwrap();
        let text = std::str::from_utf8(&enriched).unwrap();

        assert!(text.contains("123456789012345678901234567890"));
        assert!(text.contains(r#"{ "k" : [ 1 ,2 ] }"#));
    }

    /// Keys needing escapes survive the rewrite.
    #[test]
    fn test_escaped_keys_are_preserved() {
        let original = json!({ "we\"ird\\key": 1, "tab\tkey": 2 });
        let body = serde_json::to_vec(&original).unwrap();

        let enriched = enrich(&body, &fields(&[("short_sha", "abc123")])).unwrap();

        assert_eq!(without_intercepted(&enriched), original);
    }

    /// Key escapes are copied as written, not re-encoded.
    #[test]
    fn test_key_escapes_are_kept_byte_for_byte() {
        let body = br#"{"caf\u00e9":1,"tab\tkey":"v"}"#;

        let enriched = enrich(body, &fields(&[("short_sha", "abc123")])).unwrap();

        assert_eq!(
            &enriched[..],
            br#"{"caf\u00e9":1,"tab\tkey":"v","intercepted":{"short_sha":"abc123"}}"#
        );
    }

    /// A pretty-printed body keeps its layout around the inserted member.
    #[test]
    fn test_whitespace_between_members_is_kept() {
        let body = b"{\n  \"action\": \"opened\",\n  \"number\" : 7\n}\n";

        let enriched = enrich(body, &fields(&[("short_sha", "abc123")])).unwrap();

        assert_eq!(
            &enriched[..],
            &b"{\n  \"action\": \"opened\",\n  \"number\" : 7,\"intercepted\":{\"short_sha\":\"abc123\"}\n}\n"[..]
        );
    }

    #[test]
    fn test_overwrite_keeps_surrounding_whitespace() {
        let body = b"{ \"intercepted\" : { \"old\": 1 } , \"a\": 2 }";

        let enriched = enrich(body, &fields(&[("ref", "main")])).unwrap();

        assert_eq!(
            &enriched[..],
            &b"{ \"intercepted\" : {\"ref\":\"main\"} , \"a\": 2 }"[..]
        );
    }

    #[test]
    fn test_empty_object_with_whitespace() {
        let enriched = enrich(b" { } ", &BTreeMap::new()).unwrap();

        assert_eq!(&enriched[..], b" {\"intercepted\":{} } ");
    }

    #[test]
    fn test_field_values_are_escaped() {
        let enriched = enrich(b"{}", &fields(&[("ref", "quote\"branch")])).unwrap();
        let value: Value = serde_json::from_slice(&enriched).unwrap();

        assert_eq!(value["intercepted"]["ref"], "quote\"branch");
    }
}

mod error_tests {
    use super::*;

    #[test]
    fn test_invalid_json_is_rejected() {
        let result = enrich(b"{test", &fields(&[("short_sha", "abc123")]));

        assert!(matches!(result, Err(EnrichError::InvalidJson(_))));
    }

    #[test]
    fn test_empty_body_is_invalid_json() {
        assert!(matches!(
            enrich(b"", &BTreeMap::new()),
            Err(EnrichError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_trailing_garbage_is_invalid_json() {
        assert!(matches!(
            enrich(br#"{"a":1} extra"#, &BTreeMap::new()),
            Err(EnrichError::InvalidJson(_))
        ));
    }

    /// Valid JSON that is not an object cannot carry a top-level key.
    #[test]
    fn test_non_object_documents_are_rejected() {
        for body in [&b"[1,2,3]"[..], b"\"text\"", b"42", b"null"] {
            assert!(
                matches!(enrich(body, &BTreeMap::new()), Err(EnrichError::NotAnObject)),
                "expected NotAnObject for {}",
                String::from_utf8_lossy(body)
            );
        }
    }
}
