//! JSON record body format.
//!
//! Document bodies are JSON objects. Field types that plain JSON cannot
//! carry are declared in an `@fieldTypes` attribute (`name=t,other=x`):
//!
//! | hint | type     | JSON form               |
//! |------|----------|-------------------------|
//! | `s`  | short    | number                  |
//! | `l`  | long     | number                  |
//! | `f`  | float    | number                  |
//! | `c`  | decimal  | string                  |
//! | `t`  | datetime | number (epoch millis)   |
//! | `x`  | link     | string `#cluster:pos`   |
//! | `b`  | binary   | hex string              |
//!
//! A hint on a list field applies to every element. Nested objects are
//! embedded documents. Byte and flat records carry a single `value` field.

use crate::document::{Decimal, Document, RecordType, Value};
use crate::error::ProtocolError;
use crate::record::{RecordHeader, RecordSerializer};
use chrono::{DateTime, Utc};
use serde_json::{Map, Number, Value as Json};

const CLASS_ATTR: &str = "@class";
const FIELD_TYPES_ATTR: &str = "@fieldTypes";
const TYPE_ATTR: &str = "@type";

/// Field holding the payload of byte and flat records.
pub const RAW_VALUE_FIELD: &str = "value";

/// Record serializer using JSON bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRecordSerializer;

impl JsonRecordSerializer {
    pub fn new() -> Self {
        Self
    }
}

impl RecordSerializer for JsonRecordSerializer {
    fn deserialize(&self, header: RecordHeader, raw: &[u8]) -> Result<Document, ProtocolError> {
        let mut doc = match header.record_type {
            RecordType::Document if raw.is_empty() => Document::new(),
            RecordType::Document => {
                let json: Json = serde_json::from_slice(raw)?;
                match json {
                    Json::Object(map) => object_to_document(map)?,
                    other => {
                        return Err(ProtocolError::Serialization(format!(
                            "document body must be a JSON object, got {}",
                            json_kind(&other)
                        )))
                    }
                }
            }
            RecordType::Bytes => Document::new().with_field(RAW_VALUE_FIELD, Value::Binary(raw.to_vec())),
            RecordType::Flat => {
                let text = std::str::from_utf8(raw)
                    .map_err(|_| ProtocolError::Serialization("flat record is not UTF-8".into()))?;
                Document::new().with_field(RAW_VALUE_FIELD, text)
            }
        };

        doc.rid = Some(header.rid);
        doc.version = header.version;
        doc.record_type = header.record_type;
        doc.class_id = header.class_id;
        Ok(doc)
    }

    fn serialize(&self, document: &Document) -> Result<Vec<u8>, ProtocolError> {
        match document.record_type {
            RecordType::Document => {
                let json = Json::Object(document_to_object(document)?);
                Ok(serde_json::to_vec(&json)?)
            }
            RecordType::Bytes => match document.get_field(RAW_VALUE_FIELD) {
                Some(Value::Binary(bytes)) => Ok(bytes.clone()),
                None | Some(Value::Null) => Ok(Vec::new()),
                Some(other) => Err(unexpected(RAW_VALUE_FIELD, "binary", other)),
            },
            RecordType::Flat => match document.get_field(RAW_VALUE_FIELD) {
                Some(Value::String(text)) => Ok(text.as_bytes().to_vec()),
                None | Some(Value::Null) => Ok(Vec::new()),
                Some(other) => Err(unexpected(RAW_VALUE_FIELD, "string", other)),
            },
        }
    }
}

fn unexpected(field: &str, expected: &str, found: &Value) -> ProtocolError {
    ProtocolError::Serialization(format!(
        "field '{}': expected {}, found {}",
        field,
        expected,
        found.type_name()
    ))
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

fn parse_field_types(spec: &str) -> Vec<(&str, char)> {
    spec.split(',')
        .filter_map(|entry| {
            let (name, hint) = entry.split_once('=')?;
            Some((name.trim(), hint.trim().chars().next()?))
        })
        .collect()
}

fn object_to_document(mut map: Map<String, Json>) -> Result<Document, ProtocolError> {
    let mut doc = Document::new();
    if let Some(Json::String(class)) = map.remove(CLASS_ATTR) {
        doc.class_name = Some(class);
    }
    let hints = match map.remove(FIELD_TYPES_ATTR) {
        Some(Json::String(spec)) => parse_field_types(&spec)
            .into_iter()
            .map(|(name, hint)| (name.to_string(), hint))
            .collect(),
        _ => Vec::new(),
    };

    for (name, json) in map {
        if name.starts_with('@') {
            continue;
        }
        let hint = hints.iter().find(|(n, _)| *n == name).map(|(_, h)| *h);
        let value = json_to_value(&name, json, hint)?;
        doc.set_field(name, value);
    }
    Ok(doc)
}

fn json_to_value(field: &str, json: Json, hint: Option<char>) -> Result<Value, ProtocolError> {
    let bad = |expected: &str, json: &Json| {
        ProtocolError::Serialization(format!(
            "field '{}': expected {}, found {}",
            field,
            expected,
            json_kind(json)
        ))
    };

    let value = match (json, hint) {
        (Json::Null, _) => Value::Null,
        (Json::Bool(b), _) => Value::Bool(b),
        (Json::Array(items), hint) => Value::List(
            items
                .into_iter()
                .map(|item| json_to_value(field, item, hint))
                .collect::<Result<_, _>>()?,
        ),
        (Json::Object(map), _) => Value::Embedded(Box::new(object_to_document(map)?)),
        (Json::Number(n), Some('s')) => n
            .as_i64()
            .and_then(|v| i16::try_from(v).ok())
            .map(Value::Short)
            .ok_or_else(|| bad("short", &Json::Number(n)))?,
        (Json::Number(n), Some('l')) => n
            .as_i64()
            .map(Value::Long)
            .ok_or_else(|| bad("long", &Json::Number(n)))?,
        (Json::Number(n), Some('f')) => n
            .as_f64()
            .map(|v| Value::Float(v as f32))
            .ok_or_else(|| bad("float", &Json::Number(n)))?,
        (Json::Number(n), Some('t')) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(Value::DateTime)
            .ok_or_else(|| bad("datetime millis", &Json::Number(n)))?,
        (Json::Number(n), _) => {
            if let Some(v) = n.as_i64() {
                match i32::try_from(v) {
                    Ok(small) => Value::Int(small),
                    Err(_) => Value::Long(v),
                }
            } else if let Some(v) = n.as_f64() {
                Value::Double(v)
            } else {
                return Err(bad("number", &Json::Number(n)));
            }
        }
        (Json::String(s), Some('x')) => s
            .parse()
            .map(Value::Link)
            .map_err(|_| bad("link", &Json::String(s.clone())))?,
        (Json::String(s), Some('c')) => s
            .parse::<Decimal>()
            .map(Value::Decimal)
            .map_err(|_| bad("decimal", &Json::String(s.clone())))?,
        (Json::String(s), Some('b')) => hex::decode(&s)
            .map(Value::Binary)
            .map_err(|_| bad("hex binary", &Json::String(s.clone())))?,
        (Json::String(s), _) => Value::String(s),
    };
    Ok(value)
}

fn document_to_object(doc: &Document) -> Result<Map<String, Json>, ProtocolError> {
    let mut map = Map::new();
    map.insert(TYPE_ATTR.to_string(), Json::String("d".to_string()));
    if let Some(class) = &doc.class_name {
        map.insert(CLASS_ATTR.to_string(), Json::String(class.clone()));
    }

    let mut hints = Vec::new();
    for (name, value) in doc.fields() {
        let (json, hint) = value_to_json(name, value)?;
        if let Some(hint) = hint {
            hints.push(format!("{}={}", name, hint));
        }
        map.insert(name.to_string(), json);
    }
    if !hints.is_empty() {
        map.insert(FIELD_TYPES_ATTR.to_string(), Json::String(hints.join(",")));
    }
    Ok(map)
}

fn value_to_json(field: &str, value: &Value) -> Result<(Json, Option<char>), ProtocolError> {
    let encoded = match value {
        Value::Null => (Json::Null, None),
        Value::Bool(b) => (Json::Bool(*b), None),
        Value::Short(v) => (Json::from(*v), Some('s')),
        Value::Int(v) => (Json::from(*v), None),
        Value::Long(v) => (Json::from(*v), Some('l')),
        Value::Float(v) => (finite(field, *v as f64)?, Some('f')),
        Value::Double(v) => (finite(field, *v)?, None),
        Value::Decimal(d) => (Json::String(d.to_string()), Some('c')),
        Value::String(s) => (Json::String(s.clone()), None),
        Value::DateTime(dt) => (Json::from(dt.timestamp_millis()), Some('t')),
        Value::Binary(bytes) => (Json::String(hex::encode(bytes)), Some('b')),
        Value::Link(rid) => (Json::String(rid.to_string()), Some('x')),
        Value::Embedded(doc) => (Json::Object(document_to_object(doc)?), None),
        Value::List(items) => {
            let mut out = Vec::with_capacity(items.len());
            let mut list_hint: Option<Option<char>> = None;
            for item in items {
                let (json, hint) = value_to_json(field, item)?;
                if !item.is_null() {
                    match list_hint {
                        None => list_hint = Some(hint),
                        Some(existing) if existing != hint => {
                            return Err(ProtocolError::Serialization(format!(
                                "field '{}': list mixes element types",
                                field
                            )))
                        }
                        Some(_) => {}
                    }
                }
                out.push(json);
            }
            (Json::Array(out), list_hint.flatten())
        }
    };
    Ok(encoded)
}

fn finite(field: &str, v: f64) -> Result<Json, ProtocolError> {
    Number::from_f64(v).map(Json::Number).ok_or_else(|| {
        ProtocolError::Serialization(format!("field '{}': non-finite number {}", field, v))
    })
}
