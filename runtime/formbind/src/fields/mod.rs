//! Field metadata: which fields of a destination record can be bound, and from where.
//!
//! Destination records declare their fields via `#[derive(Destination)]`.
//! The raw declarations are filtered and normalized once per type by [`FieldCache`],
//! which hands out an immutable, shared view for every subsequent request.
use std::collections::HashMap;

use crate::coerce::{Bind, MapKey, MapValue};

pub use cache::FieldCache;

mod cache;

/// Well-known annotation namespaces.
pub mod namespace {
    /// Used by the URL-encoded decoder, [`FormUrlDecoder`](crate::decoder::FormUrlDecoder).
    pub const FORM: &str = "form";
    /// Used by the multipart decoder, [`MultipartDecoder`](crate::decoder::MultipartDecoder).
    pub const MULTIPART: &str = "multipart";
}

/// Bind every uploaded file.
pub const ALL_FILES_DIRECTIVE: &str = "*";
/// Never bind the field.
pub const SKIP_DIRECTIVE: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// A field, as declared on the destination record.
///
/// You won't build these by hand: `#[derive(Destination)]` takes care of it.
pub struct FieldDecl {
    /// The name of the field.
    pub name: &'static str,
    /// `true` if the field is public.
    pub visible: bool,
    /// `(namespace, directive)` pairs, as written in the `#[bind(...)]` attribute.
    ///
    /// An empty directive means "use the field name".
    pub annotations: &'static [(&'static str, &'static str)],
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// How a field should be bound, for a given namespace.
pub enum Annotation {
    /// Bind the field from the values (or files) submitted under this key.
    Key(String),
    /// Bind the field from every uploaded file.
    AllFiles,
}

impl Annotation {
    /// Interpret a raw directive for the field called `field_name`.
    ///
    /// Returns `None` for the "do not bind" directive.
    pub fn parse(directive: &str, field_name: &str) -> Option<Self> {
        match directive {
            SKIP_DIRECTIVE => None,
            ALL_FILES_DIRECTIVE => Some(Annotation::AllFiles),
            "" => Some(Annotation::Key(field_name.to_owned())),
            key => Some(Annotation::Key(key.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A bindable field of a destination record.
pub struct FieldMetadata {
    /// The position of the field in declaration order.
    ///
    /// Use it with [`Destination::field_mut`].
    pub index: usize,
    pub name: &'static str,
    /// One entry per namespace, in declaration order.
    pub annotations: Vec<(&'static str, Annotation)>,
}

impl FieldMetadata {
    /// The annotation for `namespace`, if any.
    pub fn annotation(&self, namespace: &str) -> Option<&Annotation> {
        self.annotations
            .iter()
            .find(|(ns, _)| *ns == namespace)
            .map(|(_, annotation)| annotation)
    }
}

/// Compute the bindable fields of `D`.
///
/// Private fields and fields without any binding annotation are skipped.
pub(crate) fn derive<D: Destination>() -> Vec<FieldMetadata> {
    D::declared_fields()
        .iter()
        .enumerate()
        .filter(|(_, decl)| decl.visible)
        .filter_map(|(index, decl)| {
            let annotations: Vec<_> = decl
                .annotations
                .iter()
                .filter_map(|&(namespace, directive)| {
                    Annotation::parse(directive, decl.name).map(|a| (namespace, a))
                })
                .collect();
            if annotations.is_empty() {
                return None;
            }
            Some(FieldMetadata {
                index,
                name: decl.name,
                annotations,
            })
        })
        .collect()
}

/// A type that decoders can populate.
///
/// Implement it for your records with `#[derive(Destination)]`:
///
/// ```rust
/// use formbind::Destination;
///
/// #[derive(Default, Destination)]
/// pub struct Signup {
///     #[bind(form = "user_name", multipart = "user_name")]
///     pub name: String,
///     #[bind(form)]
///     pub age: Option<i32>,
///     #[bind(multipart = "avatar")]
///     pub avatar: Option<formbind::FileHandle>,
/// }
/// ```
///
/// String-keyed maps are destinations too: they receive the entire form.
pub trait Destination: 'static {
    /// Every field of the record, in declaration order.
    fn declared_fields() -> &'static [FieldDecl];

    /// A mutable view over the field at position `index`.
    ///
    /// Returns `None` for fields that can't be bound.
    fn field_mut(&mut self, index: usize) -> Option<&mut dyn Bind>;

    /// The destination itself, if it should be populated from the entire form rather
    /// than field by field.
    fn as_form_target(&mut self) -> Option<&mut dyn Bind> {
        None
    }
}

impl<K, V> Destination for HashMap<K, V>
where
    K: MapKey + 'static,
    V: MapValue + 'static,
{
    fn declared_fields() -> &'static [FieldDecl] {
        &[]
    }

    fn field_mut(&mut self, _index: usize) -> Option<&mut dyn Bind> {
        None
    }

    fn as_form_target(&mut self) -> Option<&mut dyn Bind> {
        Some(self)
    }
}
