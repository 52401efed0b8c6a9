//! The value coercion engine.
//!
//! [`set`] takes a [`RawValue`] (a string, a list of strings, an entire form or
//! uploaded files) and a destination implementing [`Bind`], and assigns a correctly
//! typed value into the destination.
//!
//! # Supported destinations
//!
//! | Destination                                     | Accepted sources                         |
//! |-------------------------------------------------|------------------------------------------|
//! | `String`                                        | single value, list (joined on split)     |
//! | `i8`, `i16`, `i32`, `i64`, `isize`              | single value                             |
//! | `f32`, `f64`                                    | single value                             |
//! | [`Complex<f32>`], [`Complex<f64>`]              | single value                             |
//! | `bool`                                          | single value                             |
//! | `Option<T>`                                     | whatever `T` accepts                     |
//! | `FromStr` types registered via [`bind_from_str`]| single value                             |
//! | `Vec<String>`                                   | list, single value (split)               |
//! | `HashMap<String, String>`                       | entire form                              |
//! | `HashMap<String, FormValue>`                    | entire form                              |
//! | `HashMap<String, Vec<String>>`                  | entire form                              |
//! | `Option<FileHandle>`, `Option<Box<FileHandle>>` | uploaded file                            |
//! | `FileHandles`, `Vec<FileHandle>`                | uploaded files                           |
//!
//! Everything else (unsigned and 128-bit integers, nested records, maps with
//! non-string keys, sequences of non-string values) is rejected with a
//! [`NotSupported`] error at runtime.
//!
//! [`bind_from_str`]: crate::bind_from_str
//! [`FormValue`]: crate::FormValue
//! [`FileHandle`]: crate::FileHandle
//! [`FileHandles`]: crate::FileHandles
use std::borrow::Cow;
use std::collections::HashMap;
use std::error::Error;
use std::str::FromStr;

use crate::file::FileHandle;
use crate::raw::{FormValue, RawValue, SourceKind};

pub use complex::{Complex, ComplexPart, ParseComplexError};
pub use errors::{BindError, ConversionError, NotSupported};
pub use impls::{MapKey, MapValue, SeqElement};

mod complex;
mod errors;
mod impls;

/// A destination that the coercion engine can write into.
///
/// The trait exposes the runtime shape of the destination via [`Bind::slot`],
/// which is what [`set`] dispatches on.
///
/// You rarely need to implement this trait by hand:
///
/// - it's implemented for all the supported primitive and collection types;
/// - [`bind_from_str`](crate::bind_from_str) implements it for types that
///   can be parsed from a string;
/// - `#[derive(Destination)]` implements it for records, marking them as
///   unsupported when nested inside another record.
pub trait Bind {
    /// A typed, mutable view over the destination.
    fn slot(&mut self) -> Slot<'_>;

    /// Returns `true` if the destination still holds its zero value
    /// (empty string, `0`, `false`, `None`, empty collection).
    fn is_zero(&self) -> bool;
}

/// The runtime shape of a [`Bind`] destination.
#[non_exhaustive]
pub enum Slot<'a> {
    Str(&'a mut String),
    Int(IntSlot<'a>),
    Float(FloatSlot<'a>),
    Complex(ComplexSlot<'a>),
    Bool(&'a mut bool),
    /// A nullable destination, allocated on demand.
    Pointer(&'a mut dyn PointerSlot),
    /// A type that knows how to parse itself from a string.
    Text(&'a mut dyn TextSlot),
    StrSeq(&'a mut Vec<String>),
    StrMap(&'a mut HashMap<String, String>),
    ValueMap(&'a mut HashMap<String, FormValue>),
    SeqMap(&'a mut HashMap<String, Vec<String>>),
    File(FileSlot<'a>),
    Files(&'a mut Vec<FileHandle>),
    /// A type that can't be bound. It carries the type name, for error reporting.
    Unsupported(&'static str),
}

pub enum IntSlot<'a> {
    I8(&'a mut i8),
    I16(&'a mut i16),
    I32(&'a mut i32),
    I64(&'a mut i64),
    Isize(&'a mut isize),
}

pub enum FloatSlot<'a> {
    F32(&'a mut f32),
    F64(&'a mut f64),
}

pub enum ComplexSlot<'a> {
    C64(&'a mut Complex<f32>),
    C128(&'a mut Complex<f64>),
}

pub enum FileSlot<'a> {
    Direct(&'a mut Option<FileHandle>),
    Boxed(&'a mut Option<Box<FileHandle>>),
}

/// A nullable destination.
pub trait PointerSlot {
    /// Returns the pointee, allocating a zero value first if the pointer is null.
    fn pointee(&mut self) -> &mut dyn Bind;
}

/// A destination that can be parsed from a string.
///
/// It's implemented for every type that implements [`FromStr`] with an error type
/// that can be boxed.
pub trait TextSlot {
    fn type_name(&self) -> &'static str;

    fn parse_from(&mut self, text: &str) -> Result<(), Box<dyn Error + Send + Sync>>;
}

impl<T> TextSlot for T
where
    T: FromStr,
    T::Err: Into<Box<dyn Error + Send + Sync>>,
{
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn parse_from(&mut self, text: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        *self = text.parse().map_err(Into::into)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// How to convert between delimited strings and sequences.
pub struct Split {
    /// If `false`, a single value can't be bound to a sequence and a list
    /// of values can't be bound to a scalar.
    pub enabled: bool,
    /// The delimiter. Defaults to `,`.
    pub symbol: char,
}

impl Default for Split {
    fn default() -> Self {
        Self {
            enabled: true,
            symbol: ',',
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Knobs that tune the behaviour of [`set`].
pub struct SetOptions {
    pub split: Split,
}

impl SetOptions {
    fn separator<'b>(&self, buf: &'b mut [u8; 4]) -> &'b str {
        self.split.symbol.encode_utf8(buf)
    }

    fn join(&self, values: &[String]) -> String {
        let mut buf = [0; 4];
        values.join(self.separator(&mut buf))
    }
}

/// Convert `raw` into the type of `destination` and assign it.
///
/// The destination is left untouched if the conversion fails, with the exception of
/// null pointers: they are allocated before the pointee is converted.
pub fn set(
    destination: &mut dyn Bind,
    raw: RawValue<'_>,
    options: &SetOptions,
) -> Result<(), BindError> {
    let source_kind = raw.kind();
    let unsupported = |type_name: &'static str| -> BindError {
        NotSupported::new(type_name, source_kind).into()
    };

    match destination.slot() {
        Slot::Pointer(pointer) => set(pointer.pointee(), raw, options),
        Slot::Str(s) => {
            *s = scalar_text(&raw, options).ok_or_else(|| unsupported("String"))?.into_owned();
            Ok(())
        }
        Slot::Int(slot) => {
            let text = scalar_text(&raw, options);
            match slot {
                IntSlot::I8(v) => parse_into(v, text, "i8", source_kind),
                IntSlot::I16(v) => parse_into(v, text, "i16", source_kind),
                IntSlot::I32(v) => parse_into(v, text, "i32", source_kind),
                IntSlot::I64(v) => parse_into(v, text, "i64", source_kind),
                IntSlot::Isize(v) => parse_into(v, text, "isize", source_kind),
            }
        }
        Slot::Float(slot) => {
            let text = scalar_text(&raw, options);
            match slot {
                FloatSlot::F32(v) => parse_into(v, text, "f32", source_kind),
                FloatSlot::F64(v) => parse_into(v, text, "f64", source_kind),
            }
        }
        Slot::Complex(slot) => {
            let text = scalar_text(&raw, options);
            match slot {
                ComplexSlot::C64(v) => parse_into(v, text, "Complex<f32>", source_kind),
                ComplexSlot::C128(v) => parse_into(v, text, "Complex<f64>", source_kind),
            }
        }
        Slot::Bool(b) => {
            let text = scalar_text(&raw, options).ok_or_else(|| unsupported("bool"))?;
            *b = parse_bool(&text).ok_or_else(|| ConversionError::new(text, "bool"))?;
            Ok(())
        }
        Slot::Text(slot) => {
            let type_name = slot.type_name();
            let text = scalar_text(&raw, options).ok_or_else(|| unsupported(type_name))?;
            slot.parse_from(&text)
                .map_err(|e| ConversionError::new(text, type_name).with_source(e))?;
            Ok(())
        }
        Slot::StrSeq(seq) => {
            match raw {
                RawValue::List(values) => *seq = values.to_vec(),
                RawValue::Str(s) if options.split.enabled => {
                    *seq = s.split(options.split.symbol).map(str::to_owned).collect();
                }
                _ => return Err(unsupported("Vec<String>")),
            }
            Ok(())
        }
        Slot::StrMap(map) => {
            let RawValue::Form(form) = raw else {
                return Err(unsupported("HashMap<String, String>"));
            };
            for (key, values) in form.iter() {
                let value = match values {
                    [value] => value.clone(),
                    values => options.join(values),
                };
                map.insert(key.to_owned(), value);
            }
            Ok(())
        }
        Slot::ValueMap(map) => {
            let RawValue::Form(form) = raw else {
                return Err(unsupported("HashMap<String, FormValue>"));
            };
            for (key, values) in form.iter() {
                let value = match values {
                    [value] => FormValue::Single(value.clone()),
                    values => FormValue::Multi(values.to_vec()),
                };
                map.insert(key.to_owned(), value);
            }
            Ok(())
        }
        Slot::SeqMap(map) => {
            let RawValue::Form(form) = raw else {
                return Err(unsupported("HashMap<String, Vec<String>>"));
            };
            for (key, values) in form.iter() {
                map.insert(key.to_owned(), values.to_vec());
            }
            Ok(())
        }
        Slot::File(slot) => {
            let RawValue::File(file) = raw else {
                return Err(unsupported("FileHandle"));
            };
            match slot {
                FileSlot::Direct(f) => *f = Some(file),
                FileSlot::Boxed(f) => *f = Some(Box::new(file)),
            }
            Ok(())
        }
        Slot::Files(files) => {
            match raw {
                RawValue::Files(handles) => *files = handles.into_vec(),
                RawValue::File(handle) => *files = vec![handle],
                _ => return Err(unsupported("FileHandles")),
            }
            Ok(())
        }
        Slot::Unsupported(type_name) => Err(unsupported(type_name)),
    }
}

/// The textual representation of a raw value, for scalar destinations.
///
/// Lists are joined on the split symbol, if splitting is enabled.
/// Returns `None` for sources that can't be represented as a single string.
fn scalar_text<'r>(raw: &'r RawValue<'_>, options: &SetOptions) -> Option<Cow<'r, str>> {
    match raw {
        RawValue::Str(s) => Some(Cow::Borrowed(s)),
        RawValue::List(values) if options.split.enabled => Some(Cow::Owned(options.join(values))),
        _ => None,
    }
}

fn parse_into<T>(
    destination: &mut T,
    text: Option<Cow<'_, str>>,
    expected_type: &'static str,
    source_kind: SourceKind,
) -> Result<(), BindError>
where
    T: FromStr,
    T::Err: Into<Box<dyn Error + Send + Sync>>,
{
    let Some(text) = text else {
        return Err(NotSupported::new(expected_type, source_kind).into());
    };
    *destination = text
        .parse()
        .map_err(|e: T::Err| ConversionError::new(text.as_ref(), expected_type).with_source(e))?;
    Ok(())
}

/// The boolean lexemes we accept.
fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
