//! Errors that can occur while parsing a multipart request body.
use ubyte::ByteUnit;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
/// The error returned by [`parse`](super::parse) when the request body
/// is not a well-formed `multipart/form-data` payload.
pub enum MultipartError {
    #[error(
        "The `Content-Type` header is missing. This endpoint expects requests with a `Content-Type` header set to `multipart/form-data`"
    )]
    MissingContentType,
    #[error(
        "The `Content-Type` header was set to `{actual}`. This endpoint expects requests with a `Content-Type` header set to `multipart/form-data`"
    )]
    NotMultipart {
        /// The actual value of the `Content-Type` header for this request.
        actual: String,
    },
    #[error("The `Content-Type` header doesn't specify the multipart boundary")]
    MissingBoundary,
    #[error("The multipart body is malformed: {reason}")]
    Malformed { reason: &'static str },
    #[error("The multipart body ended before the closing boundary")]
    UnexpectedEof,
    #[error("The headers of part #{part} are invalid")]
    InvalidPartHeader {
        /// The position of the offending part, starting from 0.
        part: usize,
    },
    #[error("The value of the form field `{name}` is not valid UTF-8")]
    InvalidUtf8 {
        name: String,
        #[source]
        source: std::str::Utf8Error,
    },
    #[error("The form values are larger than the maximum size limit enforced by this server ({limit})")]
    ValuesTooLarge {
        /// The maximum combined size of the non-file form values.
        limit: ByteUnit,
    },
    #[error("Failed to store an uploaded file on disk")]
    Spill(#[source] std::io::Error),
}

impl MultipartError {
    /// Returns `true` if the request doesn't declare a multipart body at all.
    pub fn is_content_type_error(&self) -> bool {
        matches!(
            self,
            MultipartError::MissingContentType | MultipartError::NotMultipart { .. }
        )
    }
}
