//! Generic document model.

use crate::error::DecodeError;
use crate::rid::Rid;
use chrono::{DateTime, Utc};
use std::fmt;

/// Class id carried by a document that was built client-side.
pub const CLASS_ID_NONE: i16 = 0;

/// Kind of record body stored on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum RecordType {
    /// Field-structured document.
    #[default]
    Document = b'd',
    /// Opaque byte record.
    Bytes = b'b',
    /// Flat (single string) record.
    Flat = b'f',
}

impl RecordType {
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for RecordType {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            b'd' => Ok(RecordType::Document),
            b'b' => Ok(RecordType::Bytes),
            b'f' => Ok(RecordType::Flat),
            _ => Err(DecodeError::UnknownRecordType {
                offset: 0,
                tag: value,
            }),
        }
    }
}

/// Fixed-point decimal: `unscaled * 10^-scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Decimal {
    pub unscaled: i128,
    pub scale: u32,
}

impl Decimal {
    pub const fn new(unscaled: i128, scale: u32) -> Self {
        Self { unscaled, scale }
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.unscaled);
        }
        let sign = if self.unscaled < 0 { "-" } else { "" };
        let digits = self.unscaled.unsigned_abs().to_string();
        let scale = self.scale as usize;
        let padded = if digits.len() <= scale {
            format!("{}{}", "0".repeat(scale - digits.len() + 1), digits)
        } else {
            digits
        };
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        write!(f, "{}{}.{}", sign, int_part, frac_part)
    }
}

impl std::str::FromStr for Decimal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (int_part, frac_part) = s.split_once('.').unwrap_or((s, ""));
        if frac_part.starts_with(['-', '+']) {
            return Err(format!("invalid decimal: {:?}", s));
        }
        let digits = format!("{}{}", int_part, frac_part);
        let unscaled = digits
            .parse::<i128>()
            .map_err(|_| format!("invalid decimal: {:?}", s))?;
        Ok(Self::new(unscaled, frac_part.len() as u32))
    }
}

/// A field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Decimal(Decimal),
    String(String),
    DateTime(DateTime<Utc>),
    Binary(Vec<u8>),
    Link(Rid),
    Embedded(Box<Document>),
    List(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Short(_) => "short",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Decimal(_) => "decimal",
            Value::String(_) => "string",
            Value::DateTime(_) => "datetime",
            Value::Binary(_) => "binary",
            Value::Link(_) => "link",
            Value::Embedded(_) => "embedded",
            Value::List(_) => "list",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Widens any integral variant to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Short(v) => Some(*v as i64),
            Value::Int(v) => Some(*v as i64),
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Widens any numeric variant to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v as f64),
            Value::Double(v) => Some(*v),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_rid(&self) -> Option<Rid> {
        match self {
            Value::Link(rid) => Some(*rid),
            Value::Embedded(doc) => doc.rid,
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Embedded(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Short(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Rid> for Value {
    fn from(v: Rid) -> Self {
        Value::Link(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::DateTime(v)
    }
}

impl From<Document> for Value {
    fn from(v: Document) -> Self {
        Value::Embedded(Box::new(v))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

/// A record as an ordered field mapping plus its identity metadata.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    /// Schema class name, if known.
    pub class_name: Option<String>,
    /// Wire class tag. Negative values are reference/null sentinels.
    pub class_id: i16,
    pub rid: Option<Rid>,
    pub version: i32,
    pub record_type: RecordType,
    fields: Vec<(String, Value)>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class(class_name: impl Into<String>) -> Self {
        Self {
            class_name: Some(class_name.into()),
            ..Self::default()
        }
    }

    /// Creates a document carrying only an identity.
    pub fn reference(rid: Rid, class_id: i16) -> Self {
        Self {
            class_id,
            rid: Some(rid),
            ..Self::default()
        }
    }

    pub fn with_rid(mut self, rid: Rid) -> Self {
        self.rid = Some(rid);
        self
    }

    pub fn with_version(mut self, version: i32) -> Self {
        self.version = version;
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_field(name, value);
        self
    }

    /// Sets a field. Replacing an existing field keeps its position.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get_field(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    /// Resolves a dotted path through embedded documents.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.get_field(parts.next()?)?;
        for part in parts {
            current = current.as_document()?.get_field(part)?;
        }
        Some(current)
    }

    /// Sets a value at a dotted path, creating embedded documents on the way.
    /// A non-document value in the middle of the path is replaced.
    pub fn set_path(&mut self, path: &str, value: impl Into<Value>) {
        let Some((head, rest)) = path.split_once('.') else {
            self.set_field(path, value);
            return;
        };
        if !matches!(self.get_field(head), Some(Value::Embedded(_))) {
            self.set_field(head, Document::new());
        }
        if let Some((_, Value::Embedded(child))) = self.fields.iter_mut().find(|(n, _)| n == head) {
            child.set_path(rest, value);
        }
    }

    pub fn remove_field(&mut self, name: &str) -> Option<Value> {
        let index = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(index).1)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.get_field(name).is_some()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
