//! Errors that can occur while decoding a request into a destination.
use http::StatusCode;

use crate::coerce::{BindError, ConversionError, NotSupported};
use crate::multipart::MultipartError;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
/// The error returned by a decoder when it fails to populate the destination.
///
/// Decoding stops at the first failure: fields that were bound before the failure
/// keep their new value.
pub enum DecodeError {
    #[error(transparent)]
    /// See [`NotSupported`] for details.
    NotSupported(#[from] NotSupported),
    #[error(transparent)]
    /// See [`ConversionError`] for details.
    Conversion(#[from] ConversionError),
    #[error(transparent)]
    /// See [`TransportParseError`] for details.
    TransportParse(#[from] TransportParseError),
    #[error(transparent)]
    /// See [`FileOpenError`] for details.
    FileOpen(#[from] FileOpenError),
    #[error(transparent)]
    /// See [`MissingContentType`] for details.
    MissingContentType(#[from] MissingContentType),
    #[error(transparent)]
    /// See [`ContentTypeMismatch`] for details.
    ContentTypeMismatch(#[from] ContentTypeMismatch),
    #[error(transparent)]
    /// See [`BodyDeserializationError`] for details.
    Deserialization(#[from] BodyDeserializationError),
}

impl From<BindError> for DecodeError {
    fn from(e: BindError) -> Self {
        match e {
            BindError::NotSupported(e) => DecodeError::NotSupported(e),
            BindError::Conversion(e) => DecodeError::Conversion(e),
        }
    }
}

impl From<MultipartError> for DecodeError {
    fn from(source: MultipartError) -> Self {
        DecodeError::TransportParse(TransportParseError { source })
    }
}

impl DecodeError {
    /// The status code that best describes the failure, if you want to
    /// convert it into an HTTP response.
    ///
    /// Failures caused by the shape of the destination type are programmer errors:
    /// they map to `500 Internal Server Error`.
    pub fn status_code(&self) -> StatusCode {
        match self {
            DecodeError::NotSupported(_) | DecodeError::FileOpen(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            DecodeError::MissingContentType(_) | DecodeError::ContentTypeMismatch(_) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            DecodeError::TransportParse(e) if e.source.is_content_type_error() => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            DecodeError::TransportParse(TransportParseError {
                source: MultipartError::Spill(_),
            }) => StatusCode::INTERNAL_SERVER_ERROR,
            DecodeError::TransportParse(TransportParseError {
                source: MultipartError::ValuesTooLarge { .. },
            }) => StatusCode::PAYLOAD_TOO_LARGE,
            DecodeError::TransportParse(_)
            | DecodeError::Conversion(_)
            | DecodeError::Deserialization(_) => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Failed to parse the request body as a multipart form.\n{source}")]
#[non_exhaustive]
/// The request body isn't a well-formed multipart form.
pub struct TransportParseError {
    #[source]
    pub source: MultipartError,
}

#[derive(Debug, thiserror::Error)]
#[error("Failed to open the file uploaded under `{key}`")]
#[non_exhaustive]
/// An uploaded file couldn't be opened for reading.
pub struct FileOpenError {
    /// The form field the file was uploaded under.
    pub key: String,
    #[source]
    pub source: std::io::Error,
}

#[derive(Debug, thiserror::Error)]
#[error(
    "The `Content-Type` header is missing. This endpoint expects requests with a `Content-Type` header set to {expected}"
)]
#[non_exhaustive]
/// The `Content-Type` header is missing.
pub struct MissingContentType {
    /// A description of the content types that the decoder accepts.
    pub expected: &'static str,
}

#[derive(Debug, thiserror::Error)]
#[error(
    "The `Content-Type` header was set to `{actual}`. This endpoint expects requests with a `Content-Type` header set to {expected}"
)]
#[non_exhaustive]
/// The `Content-Type` header doesn't match what the decoder accepts.
pub struct ContentTypeMismatch {
    /// The actual value of the `Content-Type` header for this request.
    pub actual: String,
    /// A description of the content types that the decoder accepts.
    pub expected: &'static str,
}

#[derive(Debug, thiserror::Error)]
#[error("Failed to deserialize the body as a JSON document.\n{source}")]
#[non_exhaustive]
/// Something went wrong when deserializing the request body into the specified type.
pub struct BodyDeserializationError {
    #[source]
    pub(super) source: serde_path_to_error::Error<serde_json::Error>,
}

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use super::{DecodeError, FileOpenError};
    use crate::coerce::{ConversionError, NotSupported};
    use crate::multipart::MultipartError;
    use crate::raw::SourceKind;

    #[test]
    fn status_codes() {
        let cases: Vec<(DecodeError, StatusCode)> = vec![
            (
                NotSupported::new("u8", SourceKind::Str).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ConversionError::new("abc", "i32").into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                FileOpenError {
                    key: "a".into(),
                    source: std::io::ErrorKind::NotFound.into(),
                }
                .into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                MultipartError::MissingContentType.into(),
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ),
            (
                MultipartError::UnexpectedEof.into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                MultipartError::ValuesTooLarge {
                    limit: ubyte::ByteUnit::Mebibyte(10),
                }
                .into(),
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(error.status_code(), expected, "{error}");
        }
    }

    #[test]
    fn transport_errors_carry_their_cause() {
        let err = DecodeError::from(MultipartError::MissingBoundary);
        insta::assert_snapshot!(err, @r###"
        Failed to parse the request body as a multipart form.
        The `Content-Type` header doesn't specify the multipart boundary
        "###);
    }
}
