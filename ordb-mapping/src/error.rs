//! Mapping error types.

use thiserror::Error;

/// Errors converting between documents and typed objects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("field '{path}': expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("field '{path}': value {value} out of range for {target}")]
    OutOfRange {
        path: String,
        value: String,
        target: &'static str,
    },

    #[error("field '{path}': cannot build a {shape} holding {actual} elements")]
    LengthMismatch {
        path: String,
        shape: &'static str,
        actual: usize,
    },

    #[error("field '{path}': {source}")]
    Nested {
        path: String,
        #[source]
        source: Box<MappingError>,
    },
}

impl MappingError {
    pub(crate) fn mismatch(path: &str, expected: &'static str, found: &'static str) -> Self {
        MappingError::TypeMismatch {
            path: path.to_string(),
            expected,
            found,
        }
    }

    pub(crate) fn nested(path: &str, source: MappingError) -> Self {
        MappingError::Nested {
            path: path.to_string(),
            source: Box::new(source),
        }
    }

    /// Field path the error was raised for.
    pub fn path(&self) -> &str {
        match self {
            MappingError::TypeMismatch { path, .. }
            | MappingError::OutOfRange { path, .. }
            | MappingError::LengthMismatch { path, .. }
            | MappingError::Nested { path, .. } => path,
        }
    }
}
