use std::fmt;

use crate::file::{FileHandle, FileHandles};
use crate::form::Form;

#[derive(Debug)]
/// A value as extracted from the request, before it's converted into the type
/// of the destination field.
///
/// Raw values are produced by [`form::lookup`](crate::form::lookup) and by the multipart
/// file resolver, and consumed by [`coerce::set`](crate::coerce::set).
pub enum RawValue<'a> {
    /// A single form value.
    Str(&'a str),
    /// A form key that was submitted zero or more than one time.
    List(&'a [String]),
    /// The entire form, used to populate map destinations.
    Form(&'a Form),
    /// A single uploaded file.
    File(FileHandle),
    /// A set of uploaded files.
    Files(FileHandles),
}

impl RawValue<'_> {
    /// The kind of this raw value.
    pub fn kind(&self) -> SourceKind {
        match self {
            RawValue::Str(_) => SourceKind::Str,
            RawValue::List(_) => SourceKind::List,
            RawValue::Form(_) => SourceKind::Form,
            RawValue::File(_) => SourceKind::File,
            RawValue::Files(_) => SourceKind::Files,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
/// The variants of [`RawValue`], without their payload.
pub enum SourceKind {
    Str,
    List,
    Form,
    File,
    Files,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceKind::Str => "a single value",
            SourceKind::List => "a list of values",
            SourceKind::Form => "an entire form",
            SourceKind::File => "an uploaded file",
            SourceKind::Files => "a set of uploaded files",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// The value type of a `HashMap<String, FormValue>` destination.
///
/// Keys that were submitted once are stored as [`FormValue::Single`],
/// every other key is stored as [`FormValue::Multi`].
pub enum FormValue {
    Single(String),
    Multi(Vec<String>),
}

impl FormValue {
    /// Returns the value if the key was submitted exactly once.
    pub fn as_single(&self) -> Option<&str> {
        match self {
            FormValue::Single(s) => Some(s),
            FormValue::Multi(_) => None,
        }
    }

    /// All the values submitted for this key.
    pub fn as_slice(&self) -> &[String] {
        match self {
            FormValue::Single(s) => std::slice::from_ref(s),
            FormValue::Multi(values) => values,
        }
    }
}
