use std::any::type_name;
use std::sync::Arc;

use ubyte::ByteUnit;

use super::{Decoder, DecodeError, bind_field, writable_field};
use crate::coerce::{SetOptions, Split, set};
use crate::fields::{Annotation, Destination, FieldCache, namespace};
use crate::form;
use crate::multipart::{DEFAULT_MAX_MEMORY, open_all, open_one};
use crate::raw::{RawValue, SourceKind};
use crate::request::IncomingRequest;

const DEFAULT_CONTENT_TYPE: &str = "multipart/form-data";

#[derive(Debug, Clone)]
/// Populate a destination from a `multipart/form-data` body.
///
/// Fields are matched using their `multipart` annotation. For each field:
///
/// 1. if a text value was submitted under the annotation key, the field is bound
///    to it and uploaded files are ignored;
/// 2. otherwise, if the annotation is `"*"`, the field receives the first file
///    uploaded under each form field, in upload order;
/// 3. otherwise, the field receives the first file uploaded under the annotation key,
///    if any.
///
/// ```rust
/// use formbind::{Destination, FileHandle, FileHandles};
///
/// #[derive(Default, Destination)]
/// pub struct Upload {
///     #[bind(multipart = "title")]
///     pub title: String,
///     #[bind(multipart = "cover")]
///     pub cover: Option<FileHandle>,
///     #[bind(multipart = "*")]
///     pub everything: FileHandles,
/// }
/// ```
pub struct MultipartDecoder {
    pub(crate) options: SetOptions,
    pub(crate) skip_filled: bool,
    pub(crate) max_memory: ByteUnit,
    content_type: String,
    cache: Arc<FieldCache>,
}

impl Default for MultipartDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartDecoder {
    /// A decoder with the default settings.
    pub fn new() -> Self {
        Self {
            options: SetOptions::default(),
            skip_filled: true,
            max_memory: DEFAULT_MAX_MEMORY,
            content_type: DEFAULT_CONTENT_TYPE.to_owned(),
            cache: FieldCache::global(),
        }
    }

    /// Set how much of the uploaded files can be kept in memory.
    /// Files beyond this budget are stored in temporary files.
    ///
    /// # Default
    ///
    /// 32 MiB.
    pub fn set_max_memory(mut self, max_memory: ByteUnit) -> Self {
        self.max_memory = max_memory;
        self
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

    pub fn get_max_memory(&self) -> ByteUnit {
        self.max_memory
    }

    pub fn get_split(&self) -> Split {
        self.options.split
    }

    pub fn get_skip_filled(&self) -> bool {
        self.skip_filled
    }
}

impl Decoder for MultipartDecoder {
    fn content_type(&self) -> &str {
        &self.content_type
    }

    #[tracing::instrument(
        name = "Decode multipart form",
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
            let form = request.parse_multipart_form(self.max_memory)?;
            set(target, RawValue::Form(form.values()), &self.options)?;
            return Ok(());
        }

        let fields = self.cache.fields::<D>();
        if !fields
            .iter()
            .any(|f| f.annotation(namespace::MULTIPART).is_some())
        {
            return Ok(());
        }

        let form = request.parse_multipart_form(self.max_memory)?;
        for field in fields.iter() {
            let Some(annotation) = field.annotation(namespace::MULTIPART) else {
                continue;
            };
            match annotation {
                Annotation::Key(key) => {
                    if let Some(raw) = form::lookup(form.values(), key) {
                        let Some(slot) =
                            writable_field(destination, field, raw.kind(), self.skip_filled)?
                        else {
                            continue;
                        };
                        bind_field(slot, field, raw, &self.options)?;
                        continue;
                    }
                    if form.files_for(key).is_none() {
                        continue;
                    }
                    let Some(slot) =
                        writable_field(destination, field, SourceKind::File, self.skip_filled)?
                    else {
                        continue;
                    };
                    let Some(file) = open_one(form, key) else {
                        continue;
                    };
                    bind_field(slot, field, RawValue::File(file?), &self.options)?;
                }
                Annotation::AllFiles => {
                    if form.n_file_keys() == 0 {
                        continue;
                    }
                    let Some(slot) =
                        writable_field(destination, field, SourceKind::Files, self.skip_filled)?
                    else {
                        continue;
                    };
                    let files = open_all(form)?;
                    bind_field(slot, field, RawValue::Files(files), &self.options)?;
                }
            }
        }
        Ok(())
    }
}
