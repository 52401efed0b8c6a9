use crate::decoder::FileOpenError;
use crate::file::{FileHandle, FileHandles};

use super::MultipartForm;

/// Open the first file uploaded under `key`.
///
/// Returns `None` if no file was uploaded under `key`.
pub fn open_one(form: &MultipartForm, key: &str) -> Option<Result<FileHandle, FileOpenError>> {
    let part = form.files_for(key)?.first()?;
    Some(part.open(key).map_err(|source| FileOpenError {
        key: key.to_owned(),
        source,
    }))
}

/// Open the first file uploaded under each form field, in upload order.
///
/// Files that were already opened are closed if one of them fails to open.
pub fn open_all(form: &MultipartForm) -> Result<FileHandles, FileOpenError> {
    form.files()
        .filter_map(|(key, _)| open_one(form, key))
        .collect::<Result<Vec<_>, _>>()
        .map(FileHandles::from)
}
