//! Decoders populate a [`Destination`] from an [`IncomingRequest`].
//!
//! - [`FormUrlDecoder`] binds URL-encoded form values (and query parameters),
//!   using the `form` annotations of the destination;
//! - [`MultipartDecoder`] binds multipart text values and uploaded files,
//!   using the `multipart` annotations of the destination;
//! - [`JsonDecoder`] deserializes a JSON body via `serde`.
//!
//! Picking the right decoder for an incoming request (e.g. based on its `Content-Type`)
//! is up to you: [`Decoder::content_type`] tells you what each decoder expects.
use crate::coerce::{Bind, BindError, NotSupported, SetOptions, Slot, set};
use crate::fields::{Destination, FieldMetadata};
use crate::raw::{RawValue, SourceKind};
use crate::request::IncomingRequest;

pub use errors::{
    BodyDeserializationError, ContentTypeMismatch, DecodeError, FileOpenError,
    MissingContentType, TransportParseError,
};
pub use form_url::FormUrlDecoder;
pub use json::JsonDecoder;
pub use multipart::MultipartDecoder;

mod errors;
mod form_url;
mod json;
mod multipart;

/// A strategy to populate a [`Destination`] from a request body.
pub trait Decoder {
    /// The `Content-Type` this decoder is meant for.
    fn content_type(&self) -> &str;

    /// Populate `destination` from `request`.
    ///
    /// Fields without a value in the request are left untouched.
    fn decode<D: Destination>(
        &self,
        request: &mut IncomingRequest,
        destination: &mut D,
    ) -> Result<(), DecodeError>;
}

/// Decide whether a field should be populated from a `source_kind` raw value.
///
/// Returns `Ok(None)` if the field should be left as is.
/// Unsupported destinations are rejected before the skip-filled policy is applied.
fn writable_field<'d, D: Destination>(
    destination: &'d mut D,
    field: &FieldMetadata,
    source_kind: SourceKind,
    skip_filled: bool,
) -> Result<Option<&'d mut dyn Bind>, DecodeError> {
    let Some(slot) = destination.field_mut(field.index) else {
        return Ok(None);
    };
    if let Slot::Unsupported(type_name) = slot.slot() {
        let e = BindError::from(NotSupported::new(type_name, source_kind)).in_field(field.name);
        return Err(e.into());
    }
    if skip_filled && !slot.is_zero() {
        tracing::debug!(field = field.name, "Skipping a field that already has a value");
        return Ok(None);
    }
    Ok(Some(slot))
}

/// Assign `raw` to a field, attaching the field name to failures.
fn bind_field(
    slot: &mut dyn Bind,
    field: &FieldMetadata,
    raw: RawValue<'_>,
    options: &SetOptions,
) -> Result<(), DecodeError> {
    set(slot, raw, options).map_err(|e| e.in_field(field.name))?;
    tracing::trace!(field = field.name, "Bound field");
    Ok(())
}
