//! Errors that can occur while coercing a raw wire value into a destination field.
use std::fmt;

use crate::raw::SourceKind;

/// The error returned by [`set`](super::set) when a raw value can't be assigned
/// to the destination.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BindError {
    #[error(transparent)]
    /// See [`NotSupported`] for details.
    NotSupported(#[from] NotSupported),
    #[error(transparent)]
    /// See [`ConversionError`] for details.
    Conversion(#[from] ConversionError),
}

impl BindError {
    /// Attach the name of the destination field that failed to bind.
    pub(crate) fn in_field(self, field: &'static str) -> Self {
        match self {
            BindError::NotSupported(mut e) => {
                e.field = Some(field);
                BindError::NotSupported(e)
            }
            BindError::Conversion(mut e) => {
                e.field = Some(field);
                BindError::Conversion(e)
            }
        }
    }
}

#[derive(Debug)]
#[non_exhaustive]
/// The destination type can't be bound from the kind of raw value we received.
///
/// This is a programmer error: the destination type (or one of its fields) is outside
/// of the set of types supported by the decoder, e.g. a nested record or a map
/// whose keys are not strings.
pub struct NotSupported {
    pub(crate) type_name: &'static str,
    pub(crate) source_kind: SourceKind,
    pub(crate) field: Option<&'static str>,
}

impl NotSupported {
    pub(crate) fn new(type_name: &'static str, source_kind: SourceKind) -> Self {
        Self {
            type_name,
            source_kind,
            field: None,
        }
    }

    /// The name of the destination type that we failed to bind.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The kind of raw value we were trying to bind.
    pub fn source_kind(&self) -> SourceKind {
        self.source_kind
    }

    /// The destination field, if the failure happened while binding a record.
    pub fn field(&self) -> Option<&'static str> {
        self.field
    }
}

impl fmt::Display for NotSupported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.field {
            Some(field) => write!(
                f,
                "`{field}` is a `{}`, which can't be bound from {}",
                self.type_name, self.source_kind
            ),
            None => write!(
                f,
                "`{}` can't be bound from {}",
                self.type_name, self.source_kind
            ),
        }
    }
}

impl std::error::Error for NotSupported {}

#[derive(Debug)]
#[non_exhaustive]
/// A raw value couldn't be converted into the expected destination type.
///
/// E.g. `"abc"` was submitted for an `i32` field.
pub struct ConversionError {
    pub(crate) value: String,
    pub(crate) expected_type: &'static str,
    pub(crate) field: Option<&'static str>,
    pub(crate) source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ConversionError {
    pub(crate) fn new(value: impl Into<String>, expected_type: &'static str) -> Self {
        Self {
            value: value.into(),
            expected_type,
            field: None,
            source: None,
        }
    }

    pub(crate) fn with_source(
        mut self,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        self.source = Some(source.into());
        self
    }

    /// The raw value that we failed to convert.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The type we were trying to convert the raw value into.
    pub fn expected_type(&self) -> &'static str {
        self.expected_type
    }

    /// The destination field, if the failure happened while binding a record.
    pub fn field(&self) -> Option<&'static str> {
        self.field
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.field {
            Some(field) => write!(
                f,
                "`{field}` is set to `{}`, which we can't parse as a `{}`",
                self.value, self.expected_type
            ),
            None => write!(
                f,
                "We can't parse `{}` as a `{}`",
                self.value, self.expected_type
            ),
        }
    }
}

impl std::error::Error for ConversionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}
