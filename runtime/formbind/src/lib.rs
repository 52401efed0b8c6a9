//! # formbind
//!
//! Bind the content of an HTTP request (URL-encoded forms, multipart forms,
//! uploaded files and JSON documents) into strongly-typed Rust records.
//!
//! Annotate the fields of your record with `#[bind(...)]` to specify where
//! their value should come from, then pick a [decoder](decoder):
//!
//! ```rust
//! use formbind::{Destination, FileHandle, IncomingRequest};
//! use formbind::decoder::{Decoder, FormUrlDecoder};
//!
//! #[derive(Default, Destination)]
//! pub struct Profile {
//!     #[bind(form = "display_name", multipart = "display_name")]
//!     pub name: String,
//!     #[bind(form, multipart)]
//!     pub tags: Vec<String>,
//!     #[bind(multipart = "avatar")]
//!     pub avatar: Option<FileHandle>,
//! }
//!
//! let mut request: IncomingRequest = http::Request::builder()
//!     .method("POST")
//!     .header("content-type", "application/x-www-form-urlencoded")
//!     .body("display_name=Ferris&tags=crab,rust")
//!     .unwrap()
//!     .into();
//! let mut profile = Profile::default();
//! FormUrlDecoder::new().decode(&mut request, &mut profile)?;
//! assert_eq!(profile.name, "Ferris");
//! assert_eq!(profile.tags, ["crab", "rust"]);
//! # Ok::<(), formbind::decoder::DecodeError>(())
//! ```
//!
//! The conversion from raw wire values into the types of your fields is performed by
//! the [`coerce`] module: check out its documentation for the list of supported types.

// The derive macro refers to `::formbind`, this makes it usable from within the crate.
extern crate self as formbind;

pub use coerce::{Bind, BindError, Complex, ConversionError, NotSupported};
pub use decoder::{DecodeError, Decoder};
pub use fields::{Destination, FieldCache};
pub use file::{CloseFilesError, FileHandle, FileHandles, FileHeader, FileStream};
pub use form::Form;
pub use raw::{FormValue, RawValue, SourceKind};
pub use request::{IncomingRequest, RequestHead};

/// Derive [`Destination`](trait@Destination) for a struct with named fields.
///
/// Fields are annotated with `#[bind(<namespace> = "<key>")]`, one entry per decoder:
///
/// - `#[bind(form = "email")]` binds the field to the `email` URL-encoded form value;
/// - `#[bind(multipart = "*")]` binds the field to every uploaded file;
/// - `#[bind(form = "-")]` never binds the field;
/// - `#[bind(form)]` uses the field name as key.
///
/// Private fields and fields without a `#[bind]` attribute are never bound.
pub use formbind_macros::Destination;

pub mod coerce;
pub mod config;
pub mod decoder;
pub mod fields;
mod file;
pub mod form;
pub mod multipart;
mod raw;
pub mod request;
