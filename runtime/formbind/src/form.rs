//! Parsed form values and the lookup used to bind them.
use indexmap::IndexMap;

use crate::raw::RawValue;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// A set of form values, keyed by field name.
///
/// Keys are kept in the order they were first submitted.
/// Every key maps to one or more values, in submission order.
pub struct Form {
    values: IndexMap<String, Vec<String>>,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an `application/x-www-form-urlencoded` payload and append its pairs
    /// to the form.
    pub fn extend_urlencoded(&mut self, input: &[u8]) {
        for (key, value) in form_urlencoded::parse(input) {
            self.append(key.into_owned(), value.into_owned());
        }
    }

    /// Parse an `application/x-www-form-urlencoded` payload.
    pub fn parse_urlencoded(input: &[u8]) -> Self {
        let mut form = Self::new();
        form.extend_urlencoded(input);
        form
    }

    /// Add a value for `key`, after the values already stored for it.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.entry(key.into()).or_default().push(value.into());
    }

    /// All the values submitted for `key`.
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.values.get(key).map(Vec::as_slice)
    }

    /// The first value submitted for `key`.
    pub fn get_first(&self, key: &str) -> Option<&str> {
        self.get(key)?.first().map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// The number of distinct keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Form
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut form = Self::new();
        for (key, value) in iter {
            form.append(key, value);
        }
        form
    }
}

/// Find the values submitted for `key`.
///
/// A key submitted exactly once is returned as [`RawValue::Str`], every other key
/// as [`RawValue::List`]. Returns `None` if the key is absent, in which case the
/// destination field should be left untouched.
pub fn lookup<'f>(form: &'f Form, key: &str) -> Option<RawValue<'f>> {
    let values = form.get(key)?;
    Some(match values {
        [value] => RawValue::Str(value),
        values => RawValue::List(values),
    })
}
