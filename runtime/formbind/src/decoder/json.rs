use serde::de::DeserializeOwned;

use super::{BodyDeserializationError, ContentTypeMismatch, DecodeError, MissingContentType};
use crate::request::IncomingRequest;

const EXPECTED: &str = "`application/json`, or another `application/*+json` MIME type";

#[derive(Debug, Clone)]
/// Deserialize a JSON request body via `serde`.
///
/// Unlike the form decoders, it doesn't rely on `#[bind(...)]` annotations:
/// the destination must implement [`serde::Deserialize`] and it's replaced
/// wholesale by the deserialized value.
///
/// ```rust
/// use formbind::IncomingRequest;
/// use formbind::decoder::JsonDecoder;
///
/// #[derive(serde::Deserialize, Default)]
/// struct Listing {
///     address: String,
///     price: u64,
/// }
///
/// let mut request: IncomingRequest = http::Request::builder()
///     .header("content-type", "application/json")
///     .body(r#"{"address": "Via Roma 1", "price": 100000}"#)
///     .unwrap()
///     .into();
/// let mut listing = Listing::default();
/// JsonDecoder::new().decode(&mut request, &mut listing).unwrap();
/// assert_eq!(listing.price, 100000);
/// ```
pub struct JsonDecoder {
    content_type: String,
}

impl Default for JsonDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonDecoder {
    pub fn new() -> Self {
        Self {
            content_type: "application/json".to_owned(),
        }
    }

    /// Override the content type returned by [`JsonDecoder::content_type`].
    pub fn set_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// The `Content-Type` this decoder is meant for.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Deserialize the request body into `destination`.
    ///
    /// It fails if the `Content-Type` header is not set to `application/json`
    /// (or another `application/*+json` MIME type), or if the body can't be
    /// deserialized into `T`.
    #[tracing::instrument(
        name = "Decode JSON body",
        level = "debug",
        skip_all,
        fields(destination = std::any::type_name::<T>())
    )]
    pub fn decode<T: DeserializeOwned>(
        &self,
        request: &mut IncomingRequest,
        destination: &mut T,
    ) -> Result<(), DecodeError> {
        let Some(content_type) = request.head().content_type() else {
            return Err(MissingContentType { expected: EXPECTED }.into());
        };
        if !is_json(content_type) {
            return Err(ContentTypeMismatch {
                actual: content_type.to_owned(),
                expected: EXPECTED,
            }
            .into());
        }
        let mut deserializer = serde_json::Deserializer::from_slice(request.body());
        *destination = serde_path_to_error::deserialize(&mut deserializer)
            .map_err(|source| BodyDeserializationError { source })?;
        Ok(())
    }
}

/// `application/json`, or another `application/*+json` MIME type.
fn is_json(content_type: &str) -> bool {
    content_type.parse::<mime::Mime>().is_ok_and(|mime| {
        mime.type_() == mime::APPLICATION
            && (mime.subtype() == mime::JSON
                || mime.suffix().is_some_and(|name| name == mime::JSON))
    })
}
