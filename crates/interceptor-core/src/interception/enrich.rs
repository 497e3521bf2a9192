//! Targeted patching of hook payloads.
//!
//! [`enrich`] sets the top-level `"intercepted"` key of a JSON object without
//! decoding the rest of the document into a typed model. Every other byte of
//! the body, keys and whitespace included, is copied through unchanged.

use bytes::Bytes;
use serde::de::{Deserialize, Deserializer, Error as _, MapAccess, Visitor};
use serde_json::{error::Category, value::RawValue};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

/// Top-level key that receives the derived fields.
pub const INTERCEPTED_KEY: &str = "intercepted";

/// Failure while patching a payload.
#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    #[error("body is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("body is not a JSON object")]
    NotAnObject,

    #[error("failed to encode intercepted fields: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Top-level members of a JSON object in document order, values borrowed
/// from the body.
struct TopLevelEntries<'de>(Vec<(String, &'de RawValue)>);

impl<'de> Deserialize<'de> for TopLevelEntries<'de> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = TopLevelEntries<'de>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, &'de RawValue>()? {
                    entries.push(entry);
                }
                Ok(TopLevelEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// Set `"intercepted"` on `body` to an object holding exactly `fields`.
///
/// An existing `"intercepted"` value is overwritten in place and any later
/// duplicate member is removed; otherwise the member is inserted after the
/// last one. All other bytes, including whitespace and key escapes, are kept.
///
/// # Errors
///
/// Returns [`EnrichError::InvalidJson`] if `body` is not syntactically valid
/// JSON and [`EnrichError::NotAnObject`] if it is valid JSON of another type.
///
/// # Examples
///
/// ```rust
/// use interceptor_core::interception::enrich;
/// use std::collections::BTreeMap;
///
/// let fields = BTreeMap::from([("short_sha".to_string(), "abc123".to_string())]);
/// let body = enrich(br#"{"action":"opened"}"#, &fields).unwrap();
/// assert_eq!(&body[..], br#"{"action":"opened","intercepted":{"short_sha":"abc123"}}"#);
/// ```
pub fn enrich(body: &[u8], fields: &BTreeMap<String, String>) -> Result<Bytes, EnrichError> {
    let TopLevelEntries(entries) = serde_json::from_slice(body).map_err(|e| match e.classify() {
        Category::Data => EnrichError::NotAnObject,
        _ => EnrichError::InvalidJson(e),
    })?;

    let intercepted = serde_json::to_vec(fields).map_err(EnrichError::Encode)?;

    let mut out = Vec::with_capacity(body.len() + intercepted.len() + 16);
    // `copied` is the end of the last body range written to `out`; `member_end`
    // is the end of the previous member's value, or just past the opening brace.
    let mut copied = 0;
    let mut member_end = opening_brace_end(body);
    let mut replaced = false;

    for (key, value) in &entries {
        let span = value_span(body, value)?;
        if key == INTERCEPTED_KEY {
            if replaced {
                // Drop the duplicate member along with its leading comma.
                out.extend_from_slice(&body[copied..member_end]);
                copied = span.end;
            } else {
                out.extend_from_slice(&body[copied..span.start]);
                out.extend_from_slice(&intercepted);
                copied = span.end;
                replaced = true;
            }
        }
        member_end = span.end;
    }

    if !replaced {
        out.extend_from_slice(&body[copied..member_end]);
        if !entries.is_empty() {
            out.push(b',');
        }
        serde_json::to_writer(&mut out, INTERCEPTED_KEY).map_err(EnrichError::Encode)?;
        out.push(b':');
        out.extend_from_slice(&intercepted);
        copied = member_end;
    }

    out.extend_from_slice(&body[copied..]);
    Ok(Bytes::from(out))
}

/// Offset just past the `{` that opens the top-level object.
fn opening_brace_end(body: &[u8]) -> usize {
    body.iter()
        .position(|&b| !matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
        .map_or(0, |start| start + 1)
}

/// Byte range of a borrowed raw value within `body`.
fn value_span(body: &[u8], value: &RawValue) -> Result<Range<usize>, EnrichError> {
    let raw = value.get().as_bytes();
    let start = (raw.as_ptr() as usize).wrapping_sub(body.as_ptr() as usize);
    let span = start..start.wrapping_add(raw.len());

    match body.get(span.clone()) {
        Some(slice) if std::ptr::eq(slice.as_ptr(), raw.as_ptr()) => Ok(span),
        _ => Err(EnrichError::InvalidJson(serde_json::Error::custom(
            "raw value is not borrowed from the body",
        ))),
    }
}

#[cfg(test)]
#[path = "enrich_tests.rs"]
mod tests;
