//! Metadata <-> Qdrant payload conversion.

use std::collections::HashMap;

use qdrant_client::Payload;
use qdrant_client::qdrant::Value as QValue;
use qdrant_client::qdrant::value::Kind as K;

use crate::errors::IndexError;
use crate::record::ImageMetadata;

/// Serializes metadata into a Qdrant payload (flat JSON object).
pub(crate) fn to_payload(meta: &ImageMetadata) -> Result<Payload, IndexError> {
    let json = serde_json::to_value(meta)?;
    Payload::try_from(json).map_err(|e| IndexError::Backend(format!("payload conversion: {e}")))
}

/// Rebuilds metadata from a Qdrant payload.
pub(crate) fn from_payload(p: HashMap<String, QValue>) -> Result<ImageMetadata, IndexError> {
    Ok(serde_json::from_value(qpayload_to_json(p))?)
}

/// Converts a Qdrant payload (`HashMap<String, qdrant::Value>`) into JSON.
///
/// Nested objects/arrays never occur in image payloads and map to `Null`.
fn qpayload_to_json(mut p: HashMap<String, QValue>) -> serde_json::Value {
    let mut m = serde_json::Map::new();
    for (k, v) in p.drain() {
        let j = match v.kind {
            Some(K::StringValue(s)) => serde_json::Value::String(s),
            Some(K::IntegerValue(i)) => serde_json::Value::Number(i.into()),
            Some(K::DoubleValue(f)) => serde_json::json!(f),
            Some(K::BoolValue(b)) => serde_json::Value::Bool(b),
            _ => serde_json::Value::Null,
        };
        m.insert(k, j);
    }
    serde_json::Value::Object(m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_keeps_metadata_fields() {
        let mut p = HashMap::new();
        p.insert("filename".to_string(), QValue::from("a.jpg".to_string()));
        p.insert("path".to_string(), QValue::from("/img/cats/a.jpg".to_string()));
        p.insert("category".to_string(), QValue::from("cats".to_string()));
        p.insert("indexed_seq".to_string(), QValue::from(42_i64));

        let meta = from_payload(p).unwrap();
        assert_eq!(meta.filename, "a.jpg");
        assert_eq!(meta.category, "cats");
        assert_eq!(meta.indexed_seq, Some(42));
        assert_eq!(meta.content_hash, None);
    }

    #[test]
    fn payload_missing_category_is_an_error() {
        let mut p = HashMap::new();
        p.insert("filename".to_string(), QValue::from("a.jpg".to_string()));
        assert!(matches!(from_payload(p), Err(IndexError::Payload(_))));
    }
}
