//! Schema-directed JSON encoding of documents
//!
//! Omitted attributes are not written, Null is `null` and Unknown is the
//! [`UNKNOWN_SENTINEL`] string. Decoding uses the schema to pick value kinds,
//! so `decode(&encode(doc, schema)?, schema)? == doc` for any document built
//! against `schema`.

use crate::document::{AttributePath, Document};
use crate::error::{Error, Result};
use crate::schema::{AttributeType, PrimitiveKind, Schema};
use crate::value::{Known, Value, ValueKind};
use serde_json::{Map, Number, Value as Json};

/// Placeholder written for values that are not known until apply
pub const UNKNOWN_SENTINEL: &str = "74D93920-ED26-11E3-AC10-0800200C9A66";

/// Encode a document as a JSON object in schema order
pub fn encode(doc: &Document, schema: &Schema) -> Result<Json> {
    encode_object(doc, schema, &AttributePath::root())
}

/// Decode a JSON object into a document shaped by `schema`
pub fn decode(json: &Json, schema: &Schema) -> Result<Document> {
    decode_object(json, schema, &AttributePath::root())
}

fn encode_object(doc: &Document, schema: &Schema, path: &AttributePath) -> Result<Json> {
    if let Some((name, _)) = doc.iter().find(|(name, _)| schema.attribute(name).is_none()) {
        return Err(Error::violation(
            &path.child(name),
            "attribute is not defined in the schema",
        ));
    }

    let mut map = Map::new();
    for (name, attribute) in schema.attributes() {
        if let Some(value) = doc.get(name) {
            let json = encode_value(value, &attribute.ty, &path.child(name))?;
            map.insert(name.to_string(), json);
        }
    }
    Ok(Json::Object(map))
}

fn encode_value(value: &Value, ty: &AttributeType, path: &AttributePath) -> Result<Json> {
    let known = match value {
        Value::Null => return Ok(Json::Null),
        Value::Unknown => return Ok(Json::String(UNKNOWN_SENTINEL.to_string())),
        Value::Known(known) => known,
    };

    match (known, ty) {
        (Known::String(s), AttributeType::Primitive(PrimitiveKind::String)) => {
            Ok(Json::String(s.clone()))
        }
        (Known::Int64(n), AttributeType::Primitive(PrimitiveKind::Int64)) => Ok(Json::from(*n)),
        (Known::Float64(n), AttributeType::Primitive(PrimitiveKind::Float64)) => {
            Number::from_f64(*n)
                .map(Json::Number)
                .ok_or_else(|| Error::violation(path, "float is not finite"))
        }
        (Known::Bool(b), AttributeType::Primitive(PrimitiveKind::Bool)) => Ok(Json::Bool(*b)),
        (Known::List(items), AttributeType::List(element)) => items
            .iter()
            .enumerate()
            .map(|(index, item)| encode_value(item, element, &path.index(index)))
            .collect::<Result<Vec<_>>>()
            .map(Json::Array),
        (Known::Object(doc), AttributeType::Object(schema)) => encode_object(doc, schema, path),
        (known, ty) => Err(Error::TypeMismatch {
            path: path.clone(),
            expected: ty.kind(),
            found: known.kind(),
        }),
    }
}

fn decode_object(json: &Json, schema: &Schema, path: &AttributePath) -> Result<Document> {
    let Json::Object(map) = json else {
        return Err(Error::violation(path, "expected a JSON object"));
    };

    if let Some(name) = map.keys().find(|name| schema.attribute(name).is_none()) {
        return Err(Error::violation(
            &path.child(name),
            "attribute is not defined in the schema",
        ));
    }

    let mut doc = Document::new();
    for (name, attribute) in schema.attributes() {
        if let Some(json) = map.get(name) {
            doc.set(name, decode_value(json, &attribute.ty, &path.child(name))?);
        }
    }
    Ok(doc)
}

fn decode_value(json: &Json, ty: &AttributeType, path: &AttributePath) -> Result<Value> {
    match json {
        Json::Null => return Ok(Value::Null),
        Json::String(s) if s == UNKNOWN_SENTINEL => return Ok(Value::Unknown),
        _ => {}
    }

    let mismatch = || Error::TypeMismatch {
        path: path.clone(),
        expected: ty.kind(),
        found: json_kind(json),
    };

    match ty {
        AttributeType::Primitive(PrimitiveKind::String) => {
            json.as_str().map(Value::string).ok_or_else(mismatch)
        }
        AttributeType::Primitive(PrimitiveKind::Int64) => {
            json.as_i64().map(Value::int64).ok_or_else(mismatch)
        }
        AttributeType::Primitive(PrimitiveKind::Float64) => {
            json.as_f64().map(Value::float64).ok_or_else(mismatch)
        }
        AttributeType::Primitive(PrimitiveKind::Bool) => {
            json.as_bool().map(Value::bool).ok_or_else(mismatch)
        }
        AttributeType::List(element) => {
            let items = json.as_array().ok_or_else(mismatch)?;
            items
                .iter()
                .enumerate()
                .map(|(index, item)| decode_value(item, element, &path.index(index)))
                .collect::<Result<Vec<_>>>()
                .map(Value::list)
        }
        AttributeType::Object(schema) => decode_object(json, schema, path).map(Value::object),
    }
}

fn json_kind(json: &Json) -> ValueKind {
    match json {
        Json::Null => ValueKind::Null,
        Json::Bool(_) => ValueKind::Bool,
        Json::Number(n) if n.is_i64() => ValueKind::Int64,
        Json::Number(_) => ValueKind::Float64,
        Json::String(_) => ValueKind::String,
        Json::Array(_) => ValueKind::List,
        Json::Object(_) => ValueKind::Object,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Attribute;
    use serde_json::json;

    fn coffee_schema() -> Schema {
        Schema::new()
            .with_attribute("id", Attribute::required(AttributeType::int64()))
            .with_attribute("name", Attribute::computed(AttributeType::string()))
            .with_attribute("price", Attribute::computed(AttributeType::float64()))
    }

    fn order_schema() -> Schema {
        let item = Schema::new()
            .with_attribute("coffee", Attribute::required(AttributeType::object(coffee_schema())))
            .with_attribute("quantity", Attribute::required(AttributeType::int64()));
        Schema::new()
            .with_attribute("id", Attribute::computed(AttributeType::string()))
            .with_attribute("note", Attribute::optional(AttributeType::string()))
            .with_attribute("paid", Attribute::optional(AttributeType::bool()))
            .with_attribute(
                "items",
                Attribute::required(AttributeType::list(AttributeType::object(item))),
            )
    }

    fn sample_order() -> Document {
        let coffee = Document::new()
            .with("id", 3)
            .with("name", "Nomadicano")
            .with("price", 150.0);
        Document::new()
            .with("id", "12")
            .with("note", Value::Null)
            .with("paid", true)
            .with(
                "items",
                Value::list([Value::object(
                    Document::new().with("coffee", coffee).with("quantity", 2),
                )]),
            )
    }

    #[test]
    fn test_encode_then_decode_is_identity() {
        let schema = order_schema();
        let doc = sample_order();
        let json = encode(&doc, &schema).unwrap();
        assert_eq!(decode(&json, &schema).unwrap(), doc);
    }

    #[test]
    fn test_encode_layout() {
        let json = encode(&sample_order(), &order_schema()).unwrap();
        assert_eq!(
            json,
            json!({
                "id": "12",
                "note": null,
                "paid": true,
                "items": [{"coffee": {"id": 3, "name": "Nomadicano", "price": 150.0}, "quantity": 2}]
            })
        );
    }

    #[test]
    fn test_unknown_uses_sentinel() {
        let schema = order_schema();
        let doc = Document::new()
            .with("id", Value::Unknown)
            .with("items", Value::list([]));
        let json = encode(&doc, &schema).unwrap();
        assert_eq!(json["id"], json!(UNKNOWN_SENTINEL));

        let decoded = decode(&json, &schema).unwrap();
        assert!(decoded.get("id").unwrap().is_unknown());
    }

    #[test]
    fn test_omitted_stays_omitted() {
        let schema = order_schema();
        let decoded = decode(&json!({"items": []}), &schema).unwrap();
        assert!(!decoded.contains("note"));
        assert!(!decoded.contains("id"));
    }

    #[test]
    fn test_decode_rejects_unknown_keys() {
        let err = decode(&json!({"items": [], "colour": "red"}), &order_schema()).unwrap_err();
        match err {
            Error::SchemaViolation { path, .. } => assert_eq!(path.to_string(), "colour"),
            other => panic!("expected schema violation, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_type_mismatch() {
        let err = decode(
            &json!({"items": [{"coffee": {"id": "three"}, "quantity": 1}]}),
            &order_schema(),
        )
        .unwrap_err();
        match err {
            Error::TypeMismatch {
                path,
                expected,
                found,
            } => {
                assert_eq!(path.to_string(), "items[0].coffee.id");
                assert_eq!(expected, ValueKind::Int64);
                assert_eq!(found, ValueKind::String);
            }
            other => panic!("expected type mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_float_accepts_integer_json() {
        let decoded = decode(&json!({"id": 1, "price": 200}), &coffee_schema()).unwrap();
        assert_eq!(decoded.get("price"), Some(&Value::float64(200.0)));
    }
}
