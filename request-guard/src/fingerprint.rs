use crate::request::{Body, RequestDescriptor};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;

/// Identity of a request for deduplication purposes.
///
/// Derived from method, URL, query parameters and body. Headers are left out,
/// so two calls differing only in their auth token are the same request.
/// JSON objects are serialized with their keys sorted, which makes the
/// fingerprint insensitive to the order in which the caller built them.
#[derive(Hash, Eq, PartialEq, Ord, PartialOrd, Clone, Debug)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(request: &RequestDescriptor) -> Self {
        let method: &str = request.method().as_ref();
        let mut hasher = Sha256::new();
        update_field(&mut hasher, method.as_bytes());
        update_field(&mut hasher, request.url().as_bytes());

        match request.params() {
            Some(params) => update_field(&mut hasher, canonical_json(params).as_bytes()),
            None => update_field(&mut hasher, b"~"),
        }

        match request.body() {
            Body::Empty => update_field(&mut hasher, b"~"),
            Body::Json(value) => {
                update_field(&mut hasher, b"json");
                update_field(&mut hasher, canonical_json(value).as_bytes());
            }
            Body::Text { content_type, text } => {
                update_field(&mut hasher, b"text");
                update_field(&mut hasher, content_type.as_bytes());
                update_field(&mut hasher, text.as_bytes());
            }
            Body::Bytes {
                content_type,
                bytes,
            } => {
                update_field(&mut hasher, b"bytes");
                update_field(&mut hasher, content_type.as_bytes());
                update_field(&mut hasher, bytes);
            }
        }

        Fingerprint(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Length-prefixed so adjacent fields can never run into each other.
fn update_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

/// Compact JSON with object keys sorted at every level.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(item, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
