//! Canonical CBOR encoding for deterministic serialization.
//!
//! This module implements RFC 8949 Core Deterministic Encoding:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - No floats (timestamps are i64 milliseconds, values are u64)
//!
//! The canonical encoding is critical: field-identical recipe bodies must
//! produce identical bytes (and thus identical content ids) regardless of how
//! their metadata maps were populated.

use std::collections::BTreeMap;

use ciborium::value::Value;

use crate::error::CoreError;
use crate::recipe::{Metadata, MetadataValue, RecipeBody, RECIPE_VERSION};
use crate::types::ContentId;

/// Body field keys (integer keys for compact encoding).
///
/// Keys 0-23 encode as single bytes in CBOR, so numeric order is also
/// encoded-byte order.
mod keys {
    pub const VERSION: u64 = 0;
    pub const CREATOR: u64 = 1;
    pub const CREATED_AT: u64 = 2;
    pub const UPDATED_AT: u64 = 3;
    pub const CHUNKS: u64 = 4;
    pub const METADATA: u64 = 5;
    pub const VALUE: u64 = 6;

    pub const COUNT: u64 = 7;
}

/// Encode a recipe body to canonical CBOR bytes.
pub fn canonical_bytes(body: &RecipeBody) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64 + body.chunks.len() * 66);

    encode_uint(&mut buf, 5, keys::COUNT);

    // 0: version
    encode_uint(&mut buf, 0, keys::VERSION);
    encode_uint(&mut buf, 0, body.version.into());

    // 1: creator
    encode_uint(&mut buf, 0, keys::CREATOR);
    encode_text(&mut buf, &body.creator);

    // 2: created_at
    encode_uint(&mut buf, 0, keys::CREATED_AT);
    encode_int(&mut buf, body.created_at);

    // 3: updated_at
    encode_uint(&mut buf, 0, keys::UPDATED_AT);
    encode_int(&mut buf, body.updated_at);

    // 4: chunks (array of text, order preserved)
    encode_uint(&mut buf, 0, keys::CHUNKS);
    encode_uint(&mut buf, 4, body.chunks.len() as u64);
    for chunk in &body.chunks {
        encode_text(&mut buf, chunk.as_str());
    }

    // 5: metadata
    encode_uint(&mut buf, 0, keys::METADATA);
    encode_map_canonical(&mut buf, &body.metadata);

    // 6: value
    encode_uint(&mut buf, 0, keys::VALUE);
    encode_uint(&mut buf, 0, body.value);

    buf
}

/// Recursively encode a metadata value.
fn encode_metadata_value(buf: &mut Vec<u8>, value: &MetadataValue) {
    match value {
        MetadataValue::Null => buf.push(0xf6),
        MetadataValue::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        MetadataValue::Integer(i) => encode_int(buf, *i),
        MetadataValue::Text(s) => encode_text(buf, s),
        MetadataValue::Bytes(b) => encode_bytes(buf, b),
        MetadataValue::Array(items) => {
            encode_uint(buf, 4, items.len() as u64);
            for item in items {
                encode_metadata_value(buf, item);
            }
        }
        MetadataValue::Map(map) => encode_map_canonical(buf, map),
    }
}

/// Encode a signed integer (major types 0 and 1).
fn encode_int(buf: &mut Vec<u8>, n: i64) {
    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        encode_uint(buf, 1, (-1 - n) as u64);
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffffffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a byte string (major type 2).
fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, 2, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

/// Encode a text string (major type 3).
fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

/// Encode a string-keyed map canonically (major type 5).
///
/// Keys are sorted by their encoded byte comparison, which for text keys
/// means shorter keys first, then bytewise.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &BTreeMap<String, MetadataValue>) {
    let mut pairs: Vec<(Vec<u8>, &MetadataValue)> = entries
        .iter()
        .map(|(k, v)| {
            let mut key_buf = Vec::with_capacity(k.len() + 1);
            encode_text(&mut key_buf, k);
            (key_buf, v)
        })
        .collect();

    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, pairs.len() as u64);
    for (key_bytes, value) in pairs {
        buf.extend_from_slice(&key_bytes);
        encode_metadata_value(buf, value);
    }
}

/// Decode a recipe body from canonical bytes.
///
/// Rejects trailing bytes and any encoding that does not re-encode to the
/// exact input, so a decoded body always hashes back to the id it was
/// fetched under.
pub fn decode_body(bytes: &[u8]) -> Result<RecipeBody, CoreError> {
    let mut reader = bytes;
    let value: Value =
        ciborium::from_reader(&mut reader).map_err(|e| CoreError::DecodingError(e.to_string()))?;

    if !reader.is_empty() {
        return Err(CoreError::MalformedRecipe(format!(
            "{} trailing bytes",
            reader.len()
        )));
    }

    let body = cbor_value_to_body(&value)?;

    if canonical_bytes(&body) != bytes {
        return Err(CoreError::NonCanonical);
    }

    Ok(body)
}

/// Convert a CBOR Value (map) back to a RecipeBody.
fn cbor_value_to_body(value: &Value) -> Result<RecipeBody, CoreError> {
    let map = match value {
        Value::Map(m) => m,
        _ => return Err(CoreError::MalformedRecipe("expected map".into())),
    };

    let get = |key: u64| -> Option<&Value> {
        map.iter()
            .find(|(k, _)| matches!(k, Value::Integer(i) if i128::from(*i) == key as i128))
            .map(|(_, v)| v)
    };

    let version = match get(keys::VERSION) {
        Some(Value::Integer(i)) => u8::try_from(i128::from(*i))
            .map_err(|_| CoreError::MalformedRecipe("invalid version".into()))?,
        _ => return Err(CoreError::MalformedRecipe("missing version".into())),
    };
    if version != RECIPE_VERSION {
        return Err(CoreError::UnsupportedVersion(version));
    }

    let creator = match get(keys::CREATOR) {
        Some(Value::Text(s)) => s.clone(),
        _ => return Err(CoreError::MalformedRecipe("missing creator".into())),
    };

    let created_at = get_i64(get(keys::CREATED_AT), "created_at")?;
    let updated_at = get_i64(get(keys::UPDATED_AT), "updated_at")?;

    let chunks = match get(keys::CHUNKS) {
        Some(Value::Array(arr)) => arr
            .iter()
            .map(|item| match item {
                Value::Text(s) => Ok(ContentId::new(s.clone())),
                _ => Err(CoreError::MalformedRecipe("invalid chunk id".into())),
            })
            .collect::<Result<Vec<_>, _>>()?,
        _ => return Err(CoreError::MalformedRecipe("missing chunks".into())),
    };

    let metadata = match get(keys::METADATA) {
        Some(v @ Value::Map(_)) => match cbor_value_to_metadata(v)? {
            MetadataValue::Map(m) => m,
            _ => return Err(CoreError::MalformedRecipe("invalid metadata".into())),
        },
        _ => return Err(CoreError::MalformedRecipe("missing metadata".into())),
    };

    let value = match get(keys::VALUE) {
        Some(Value::Integer(i)) => u64::try_from(i128::from(*i))
            .map_err(|_| CoreError::MalformedRecipe("value must be non-negative".into()))?,
        _ => return Err(CoreError::MalformedRecipe("missing value".into())),
    };

    Ok(RecipeBody {
        version,
        chunks,
        metadata,
        creator,
        created_at,
        updated_at,
        value,
    })
}

fn get_i64(value: Option<&Value>, field: &str) -> Result<i64, CoreError> {
    match value {
        Some(Value::Integer(i)) => i64::try_from(i128::from(*i))
            .map_err(|_| CoreError::MalformedRecipe(format!("{} out of range", field))),
        _ => Err(CoreError::MalformedRecipe(format!("missing {}", field))),
    }
}

/// Convert a decoded CBOR value to a metadata value.
fn cbor_value_to_metadata(value: &Value) -> Result<MetadataValue, CoreError> {
    Ok(match value {
        Value::Null => MetadataValue::Null,
        Value::Bool(b) => MetadataValue::Bool(*b),
        Value::Integer(i) => MetadataValue::Integer(
            i64::try_from(i128::from(*i))
                .map_err(|_| CoreError::MalformedRecipe("metadata integer out of range".into()))?,
        ),
        Value::Text(s) => MetadataValue::Text(s.clone()),
        Value::Bytes(b) => MetadataValue::Bytes(b.clone()),
        Value::Array(items) => MetadataValue::Array(
            items
                .iter()
                .map(cbor_value_to_metadata)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Value::Map(entries) => {
            let mut map = Metadata::new();
            for (k, v) in entries {
                let key = match k {
                    Value::Text(s) => s.clone(),
                    _ => return Err(CoreError::MalformedRecipe("metadata key must be text".into())),
                };
                if map.insert(key, cbor_value_to_metadata(v)?).is_some() {
                    return Err(CoreError::MalformedRecipe("duplicate metadata key".into()));
                }
            }
            MetadataValue::Map(map)
        }
        Value::Float(_) => {
            return Err(CoreError::MalformedRecipe("floats are not allowed".into()));
        }
        _ => return Err(CoreError::MalformedRecipe("unsupported CBOR value".into())),
    })
}
