//! Single-value conversions between field values and Rust types.

use crate::error::MappingError;
use crate::mapper::{Mapped, TypeMapper};
use chrono::{DateTime, Utc};
use ordb_protocol::{Decimal, Rid, Value};

/// How a target type is filled from a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// Scalars, text, instants, decimals and identities: used as stored.
    Passthrough,
    /// A mapped type built from an embedded document.
    Nested,
}

/// A type that one field value converts into and out of.
pub trait Element: Default + Send + Sync + 'static {
    const KIND: ElementKind;

    /// Converts a stored value. `path` is only used for error reporting.
    fn from_value(value: &Value, path: &str) -> Result<Self, MappingError>;

    fn to_value(&self) -> Result<Value, MappingError>;
}

fn integral<T: TryFrom<i64>>(value: &Value, path: &str, target: &'static str) -> Result<T, MappingError> {
    let wide = value
        .as_i64()
        .ok_or_else(|| MappingError::mismatch(path, target, value.type_name()))?;
    T::try_from(wide).map_err(|_| MappingError::OutOfRange {
        path: path.to_string(),
        value: wide.to_string(),
        target,
    })
}

impl Element for bool {
    const KIND: ElementKind = ElementKind::Passthrough;

    fn from_value(value: &Value, path: &str) -> Result<Self, MappingError> {
        value
            .as_bool()
            .ok_or_else(|| MappingError::mismatch(path, "bool", value.type_name()))
    }

    fn to_value(&self) -> Result<Value, MappingError> {
        Ok(Value::Bool(*self))
    }
}

impl Element for i16 {
    const KIND: ElementKind = ElementKind::Passthrough;

    fn from_value(value: &Value, path: &str) -> Result<Self, MappingError> {
        integral(value, path, "short")
    }

    fn to_value(&self) -> Result<Value, MappingError> {
        Ok(Value::Short(*self))
    }
}

impl Element for i32 {
    const KIND: ElementKind = ElementKind::Passthrough;

    fn from_value(value: &Value, path: &str) -> Result<Self, MappingError> {
        integral(value, path, "int")
    }

    fn to_value(&self) -> Result<Value, MappingError> {
        Ok(Value::Int(*self))
    }
}

impl Element for i64 {
    const KIND: ElementKind = ElementKind::Passthrough;

    fn from_value(value: &Value, path: &str) -> Result<Self, MappingError> {
        integral(value, path, "long")
    }

    fn to_value(&self) -> Result<Value, MappingError> {
        Ok(Value::Long(*self))
    }
}

impl Element for f32 {
    const KIND: ElementKind = ElementKind::Passthrough;

    fn from_value(value: &Value, path: &str) -> Result<Self, MappingError> {
        value
            .as_f64()
            .map(|v| v as f32)
            .ok_or_else(|| MappingError::mismatch(path, "float", value.type_name()))
    }

    fn to_value(&self) -> Result<Value, MappingError> {
        Ok(Value::Float(*self))
    }
}

impl Element for f64 {
    const KIND: ElementKind = ElementKind::Passthrough;

    fn from_value(value: &Value, path: &str) -> Result<Self, MappingError> {
        value
            .as_f64()
            .ok_or_else(|| MappingError::mismatch(path, "double", value.type_name()))
    }

    fn to_value(&self) -> Result<Value, MappingError> {
        Ok(Value::Double(*self))
    }
}

impl Element for String {
    const KIND: ElementKind = ElementKind::Passthrough;

    fn from_value(value: &Value, path: &str) -> Result<Self, MappingError> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| MappingError::mismatch(path, "string", value.type_name()))
    }

    fn to_value(&self) -> Result<Value, MappingError> {
        Ok(Value::String(self.clone()))
    }
}

impl Element for DateTime<Utc> {
    const KIND: ElementKind = ElementKind::Passthrough;

    fn from_value(value: &Value, path: &str) -> Result<Self, MappingError> {
        match value {
            Value::DateTime(dt) => Ok(*dt),
            Value::Long(millis) => DateTime::<Utc>::from_timestamp_millis(*millis).ok_or_else(|| {
                MappingError::OutOfRange {
                    path: path.to_string(),
                    value: millis.to_string(),
                    target: "datetime",
                }
            }),
            other => Err(MappingError::mismatch(path, "datetime", other.type_name())),
        }
    }

    fn to_value(&self) -> Result<Value, MappingError> {
        Ok(Value::DateTime(*self))
    }
}

impl Element for Decimal {
    const KIND: ElementKind = ElementKind::Passthrough;

    fn from_value(value: &Value, path: &str) -> Result<Self, MappingError> {
        match value {
            Value::Decimal(d) => Ok(*d),
            other => other
                .as_i64()
                .map(|v| Decimal::new(v as i128, 0))
                .ok_or_else(|| MappingError::mismatch(path, "decimal", other.type_name())),
        }
    }

    fn to_value(&self) -> Result<Value, MappingError> {
        Ok(Value::Decimal(*self))
    }
}

impl Element for Rid {
    const KIND: ElementKind = ElementKind::Passthrough;

    fn from_value(value: &Value, path: &str) -> Result<Self, MappingError> {
        value
            .as_rid()
            .ok_or_else(|| MappingError::mismatch(path, "link", value.type_name()))
    }

    fn to_value(&self) -> Result<Value, MappingError> {
        Ok(Value::Link(*self))
    }
}

impl<T: Mapped> Element for T {
    const KIND: ElementKind = ElementKind::Nested;

    fn from_value(value: &Value, path: &str) -> Result<Self, MappingError> {
        let doc = value
            .as_document()
            .ok_or_else(|| MappingError::mismatch(path, "embedded", value.type_name()))?;
        let mut target = T::default();
        TypeMapper::<T>::get()
            .to_object(doc, &mut target)
            .map_err(|e| MappingError::nested(path, e))?;
        Ok(target)
    }

    fn to_value(&self) -> Result<Value, MappingError> {
        Ok(Value::from(TypeMapper::<T>::get().to_document(self)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integral_widening_and_range() {
        assert_eq!(i64::from_value(&Value::Short(4), "n").unwrap(), 4);
        assert_eq!(i32::from_value(&Value::Long(7), "n").unwrap(), 7);
        let err = i16::from_value(&Value::Long(70_000), "n").unwrap_err();
        assert!(matches!(err, MappingError::OutOfRange { target: "short", .. }));
        let err = i32::from_value(&Value::from("7"), "n").unwrap_err();
        assert_eq!(err, MappingError::mismatch("n", "int", "string"));
    }

    #[test]
    fn test_passthrough_kinds() {
        assert_eq!(<String as Element>::KIND, ElementKind::Passthrough);
        assert_eq!(<Rid as Element>::KIND, ElementKind::Passthrough);
        assert_eq!(<Decimal as Element>::KIND, ElementKind::Passthrough);
        assert_eq!(<DateTime<Utc> as Element>::KIND, ElementKind::Passthrough);
    }

    #[test]
    fn test_datetime_from_millis() {
        let dt = DateTime::<Utc>::from_value(&Value::Long(1_000), "t").unwrap();
        assert_eq!(dt.timestamp_millis(), 1_000);
        assert_eq!(dt.to_value().unwrap(), Value::DateTime(dt));
    }

    #[test]
    fn test_rid_from_link_or_embedded() {
        let rid = Rid::new(3, 9);
        assert_eq!(Rid::from_value(&Value::Link(rid), "r").unwrap(), rid);
        let doc = ordb_protocol::Document::new().with_rid(rid);
        assert_eq!(Rid::from_value(&Value::from(doc), "r").unwrap(), rid);
    }

    #[test]
    fn test_decimal_from_integer() {
        assert_eq!(
            Decimal::from_value(&Value::Int(12), "d").unwrap(),
            Decimal::new(12, 0)
        );
    }
}
