use std::any::type_name;
use std::sync::Arc;

use super::{Decoder, DecodeError, bind_field, writable_field};
use crate::coerce::{SetOptions, Split, set};
use crate::fields::{Annotation, Destination, FieldCache, namespace};
use crate::form;
use crate::raw::RawValue;
use crate::request::IncomingRequest;

const DEFAULT_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone)]
/// Populate a destination from URL-encoded form values.
///
/// Values are taken from the request body, if its `Content-Type` is
/// `application/x-www-form-urlencoded`, and from the query string.
/// Fields are matched using their `form` annotation:
///
/// ```rust
/// use formbind::{Destination, IncomingRequest};
/// use formbind::decoder::{Decoder, FormUrlDecoder};
///
/// #[derive(Default, Destination)]
/// pub struct Search {
///     #[bind(form = "q")]
///     pub query: String,
///     #[bind(form)]
///     pub page: Option<i32>,
/// }
///
/// let mut request: IncomingRequest = http::Request::builder()
///     .uri("/search?q=rust&page=2")
///     .body("")
///     .unwrap()
///     .into();
/// let mut search = Search::default();
/// FormUrlDecoder::new().decode(&mut request, &mut search).unwrap();
/// assert_eq!(search.query, "rust");
/// assert_eq!(search.page, Some(2));
/// ```
pub struct FormUrlDecoder {
    pub(crate) options: SetOptions,
    pub(crate) skip_filled: bool,
    content_type: String,
    cache: Arc<FieldCache>,
}

impl Default for FormUrlDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FormUrlDecoder {
    /// A decoder with the default settings.
    pub fn new() -> Self {
        Self {
            options: SetOptions::default(),
            skip_filled: true,
            content_type: DEFAULT_CONTENT_TYPE.to_owned(),
            cache: FieldCache::global(),
        }
    }

    /// Set the delimiter used to convert between single values and sequences.
    ///
    /// # Default
    ///
    /// `,`
    pub fn set_split_symbol(mut self, symbol: char) -> Self {
        self.options.split.symbol = symbol;
        self
    }

    /// Allow (or forbid) binding a single value to a sequence by splitting it,
    /// and a list of values to a scalar by joining them.
    ///
    /// # Default
    ///
    /// Enabled.
    pub fn set_split_enabled(mut self, enabled: bool) -> Self {
        self.options.split.enabled = enabled;
        self
    }

    /// Leave untouched the fields that already hold a non-zero value.
    ///
    /// # Default
    ///
    /// Enabled.
    pub fn set_skip_filled(mut self, skip_filled: bool) -> Self {
        self.skip_filled = skip_filled;
        self
    }

    /// Override the content type returned by [`Decoder::content_type`].
    pub fn set_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Use a dedicated field metadata cache rather than the process-wide one.
    pub fn set_field_cache(mut self, cache: Arc<FieldCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn get_split(&self) -> Split {
        self.options.split
    }

    pub fn get_skip_filled(&self) -> bool {
        self.skip_filled
    }
}

impl Decoder for FormUrlDecoder {
    fn content_type(&self) -> &str {
        &self.content_type
    }

    #[tracing::instrument(
        name = "Decode URL-encoded form",
        level = "debug",
        skip_all,
        fields(destination = type_name::<D>())
    )]
    fn decode<D: Destination>(
        &self,
        request: &mut IncomingRequest,
        destination: &mut D,
    ) -> Result<(), DecodeError> {
        if let Some(target) = destination.as_form_target() {
            let form = request.parse_form();
            set(target, RawValue::Form(form), &self.options)?;
            return Ok(());
        }

        let fields = self.cache.fields::<D>();
        if !fields.iter().any(|f| f.annotation(namespace::FORM).is_some()) {
            return Ok(());
        }

        let form = request.parse_form();
        for field in fields.iter() {
            let key = match field.annotation(namespace::FORM) {
                Some(Annotation::Key(key)) => key,
                Some(Annotation::AllFiles) => {
                    tracing::debug!(
                        field = field.name,
                        "URL-encoded forms carry no files, ignoring the all-files directive"
                    );
                    continue;
                }
                None => continue,
            };
            let Some(raw) = form::lookup(form, key) else {
                continue;
            };
            let Some(slot) = writable_field(destination, field, raw.kind(), self.skip_filled)?
            else {
                continue;
            };
            bind_field(slot, field, raw, &self.options)?;
        }
        Ok(())
    }
}
