use bytes::Bytes;
use ubyte::ByteUnit;

use super::RequestHead;
use crate::form::Form;
use crate::multipart::{self, MultipartError, MultipartForm};

#[derive(Debug)]
/// A request with a fully buffered body.
///
/// The form and multipart representations of the request are computed lazily,
/// the first time they're asked for, and then cached: decoding the same request
/// multiple times parses its body only once.
pub struct IncomingRequest {
    head: RequestHead,
    body: Bytes,
    form: Option<Form>,
    multipart: Option<MultipartForm>,
}

impl IncomingRequest {
    pub fn new(head: RequestHead, body: Bytes) -> Self {
        Self {
            head,
            body,
            form: None,
            multipart: None,
        }
    }

    pub fn head(&self) -> &RequestHead {
        &self.head
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The form values of the request, parsed on first access.
    ///
    /// The body is parsed if the `Content-Type` is `application/x-www-form-urlencoded`.
    /// Values from the query string come after the values from the body.
    pub fn parse_form(&mut self) -> &Form {
        let form = match self.form.take() {
            Some(form) => form,
            None => {
                let mut form = Form::new();
                if self.head.content_type().is_some_and(is_urlencoded) {
                    form.extend_urlencoded(&self.body);
                }
                if let Some(query) = self.head.query() {
                    form.extend_urlencoded(query.as_bytes());
                }
                form
            }
        };
        self.form.insert(form)
    }

    /// The multipart representation of the request, parsed on first access.
    ///
    /// Values from the query string come after the text values from the body.
    /// `max_memory` is only taken into account on the first call.
    pub fn parse_multipart_form(
        &mut self,
        max_memory: ByteUnit,
    ) -> Result<&MultipartForm, MultipartError> {
        let form = match self.multipart.take() {
            Some(form) => form,
            None => {
                let mut form = multipart::parse(self.head.content_type(), &self.body, max_memory)?;
                if let Some(query) = self.head.query() {
                    form.values.extend_urlencoded(query.as_bytes());
                }
                tracing::debug!(
                    n_values = form.values.len(),
                    n_file_keys = form.n_file_keys(),
                    "Parsed a multipart body"
                );
                form
            }
        };
        Ok(self.multipart.insert(form))
    }

    /// The form values, if [`parse_form`](Self::parse_form) has been called.
    pub fn form(&self) -> Option<&Form> {
        self.form.as_ref()
    }

    /// The multipart form, if [`parse_multipart_form`](Self::parse_multipart_form)
    /// has been called successfully.
    pub fn multipart_form(&self) -> Option<&MultipartForm> {
        self.multipart.as_ref()
    }
}

impl<B> From<http::Request<B>> for IncomingRequest
where
    B: Into<Bytes>,
{
    fn from(request: http::Request<B>) -> Self {
        let (parts, body) = request.into_parts();
        Self::new(parts.into(), body.into())
    }
}

fn is_urlencoded(content_type: &str) -> bool {
    content_type
        .parse::<mime::Mime>()
        .is_ok_and(|mime| mime.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str())
}
