//! Parsing of `multipart/form-data` request bodies.
//!
//! The body is parsed in one pass into a [`MultipartForm`]: text parts end up
//! in [`MultipartForm::values`], file parts in [`MultipartForm::files`].
//! File contents are kept in memory up to a budget, larger uploads are spilled
//! to temporary files on disk.
use std::io::{self, Cursor};

use bytes::Bytes;
use indexmap::IndexMap;
use tempfile::NamedTempFile;
use tracing_log_error::log_error;

use crate::file::{FileHandle, FileHeader};
use crate::form::Form;

pub use errors::MultipartError;
pub use parse::{DEFAULT_MAX_MEMORY, parse};
pub use resolve::{open_all, open_one};

mod errors;
mod parse;
mod resolve;

#[derive(Debug, Default)]
/// A parsed `multipart/form-data` body.
pub struct MultipartForm {
    pub(crate) values: Form,
    pub(crate) files: IndexMap<String, Vec<FilePart>>,
}

impl MultipartForm {
    /// The text values of the form.
    pub fn values(&self) -> &Form {
        &self.values
    }

    /// The uploaded files, grouped by form field, in upload order.
    pub fn files(&self) -> impl Iterator<Item = (&str, &[FilePart])> {
        self.files.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// All the files uploaded under `key`.
    pub fn files_for(&self, key: &str) -> Option<&[FilePart]> {
        self.files.get(key).map(Vec::as_slice)
    }

    /// The number of distinct form fields with at least one uploaded file.
    pub fn n_file_keys(&self) -> usize {
        self.files.len()
    }
}

impl Drop for MultipartForm {
    fn drop(&mut self) {
        for part in self.files.drain(..).flat_map(|(_, parts)| parts) {
            if let Storage::Disk(file) = part.storage {
                if let Err(e) = file.close() {
                    log_error!(
                        e,
                        level: tracing::Level::WARN,
                        "Failed to remove the temporary file backing an upload"
                    );
                }
            }
        }
    }
}

#[derive(Debug)]
/// A file part of a multipart body.
pub struct FilePart {
    header: FileHeader,
    storage: Storage,
}

#[derive(Debug)]
enum Storage {
    Memory(Bytes),
    Disk(NamedTempFile),
}

impl FilePart {
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Returns `false` if the content was spilled to disk.
    pub fn is_in_memory(&self) -> bool {
        matches!(self.storage, Storage::Memory(_))
    }

    /// Open the part for reading.
    ///
    /// Every call returns an independent handle, starting at the beginning of the file.
    pub fn open(&self, key: &str) -> io::Result<FileHandle> {
        match &self.storage {
            Storage::Memory(content) => Ok(FileHandle::new(
                key,
                self.header.clone(),
                Cursor::new(content.clone()),
            )),
            Storage::Disk(file) => {
                let file = fs_err::File::open(file.path())?;
                Ok(FileHandle::new(key, self.header.clone(), file))
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn temp_path(&self) -> Option<&std::path::Path> {
        match &self.storage {
            Storage::Memory(_) => None,
            Storage::Disk(file) => Some(file.path()),
        }
    }
}
