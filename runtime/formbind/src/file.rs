//! Uploaded files, as seen by the destination record.
use std::fmt;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::ops::Deref;

use bytes::Bytes;
use http::HeaderMap;
use tracing_log_error::log_error;

/// The byte stream behind a [`FileHandle`].
///
/// It's implemented for in-memory buffers (`Cursor<Bytes>`) and for files on disk
/// (`fs_err::File`).
pub trait FileStream: Read + Seek + Send {
    /// Release the resources held by the stream.
    fn close(self: Box<Self>) -> io::Result<()>;
}

impl FileStream for Cursor<Bytes> {
    fn close(self: Box<Self>) -> io::Result<()> {
        Ok(())
    }
}

impl FileStream for fs_err::File {
    fn close(self: Box<Self>) -> io::Result<()> {
        drop(self);
        Ok(())
    }
}

#[derive(Debug, Clone)]
#[non_exhaustive]
/// Metadata about an uploaded file, as sent by the client.
pub struct FileHeader {
    /// The file name, reduced to its last path component.
    pub filename: String,
    /// The `Content-Type` of the part, if the client specified one.
    pub content_type: Option<String>,
    /// The size of the file, in bytes.
    pub size: u64,
    /// All the headers of the multipart part.
    pub headers: HeaderMap,
}

impl FileHeader {
    pub fn new(filename: impl Into<String>, size: u64) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            size,
            headers: HeaderMap::new(),
        }
    }
}

/// An opened uploaded file.
///
/// A handle implements [`Read`] and [`Seek`] over the file content.
/// The handle is closed when dropped: call [`FileHandle::close`] if you want
/// to handle failures yourself.
pub struct FileHandle {
    key: String,
    header: FileHeader,
    stream: Option<Box<dyn FileStream>>,
}

impl FileHandle {
    /// Wrap a stream into a file handle.
    ///
    /// `key` is the name of the form field that the file was uploaded under.
    pub fn new(
        key: impl Into<String>,
        header: FileHeader,
        stream: impl FileStream + 'static,
    ) -> Self {
        Self {
            key: key.into(),
            header,
            stream: Some(Box::new(stream)),
        }
    }

    /// An in-memory file, mostly useful for testing.
    pub fn from_bytes(key: impl Into<String>, filename: impl Into<String>, content: Bytes) -> Self {
        let header = FileHeader::new(filename, content.len() as u64);
        Self::new(key, header, Cursor::new(content))
    }

    /// The name of the form field the file was uploaded under.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    pub fn filename(&self) -> &str {
        &self.header.filename
    }

    pub fn size(&self) -> u64 {
        self.header.size
    }

    /// Read the whole file into memory, starting from the current position.
    pub fn read_to_bytes(&mut self) -> io::Result<Bytes> {
        let mut buffer = Vec::with_capacity(self.header.size.try_into().unwrap_or(0));
        self.read_to_end(&mut buffer)?;
        Ok(buffer.into())
    }

    /// Release the underlying stream.
    ///
    /// Closing an already closed handle is a no-op.
    pub fn close(&mut self) -> io::Result<()> {
        match self.stream.take() {
            Some(stream) => stream.close(),
            None => Ok(()),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    fn stream(&mut self) -> io::Result<&mut Box<dyn FileStream>> {
        self.stream.as_mut().ok_or_else(|| {
            io::Error::other(format!(
                "the uploaded file `{}` has already been closed",
                self.key
            ))
        })
    }
}

impl Read for FileHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream()?.read(buf)
    }
}

impl Seek for FileHandle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.stream()?.seek(pos)
    }
}

impl fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileHandle")
            .field("key", &self.key)
            .field("header", &self.header)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Drop for FileHandle {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log_error!(
                e,
                level: tracing::Level::WARN,
                file.key = %self.key,
                "Failed to close an uploaded file"
            );
        }
    }
}

/// An ordered set of uploaded files.
#[derive(Debug, Default)]
pub struct FileHandles(pub(crate) Vec<FileHandle>);

impl FileHandles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, handle: FileHandle) {
        self.0.push(handle);
    }

    pub fn into_vec(self) -> Vec<FileHandle> {
        self.0
    }

    /// Close every file in the set.
    ///
    /// A failure doesn't stop the iteration: every file is closed, and the first
    /// failure is returned.
    pub fn close_all(&mut self) -> Result<(), CloseFilesError> {
        let mut first_error = None;
        for (index, handle) in self.0.iter_mut().enumerate() {
            let Err(source) = handle.close() else {
                continue;
            };
            if first_error.is_some() {
                log_error!(
                    source,
                    level: tracing::Level::WARN,
                    file.key = %handle.key,
                    file.index = index,
                    "Failed to close an uploaded file"
                );
                continue;
            }
            first_error = Some(CloseFilesError {
                index,
                key: handle.key.clone(),
                source,
            });
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Deref for FileHandles {
    type Target = [FileHandle];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<FileHandle>> for FileHandles {
    fn from(handles: Vec<FileHandle>) -> Self {
        Self(handles)
    }
}

impl FromIterator<FileHandle> for FileHandles {
    fn from_iter<I: IntoIterator<Item = FileHandle>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for FileHandles {
    type Item = FileHandle;
    type IntoIter = std::vec::IntoIter<FileHandle>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Failed to close the uploaded file `{key}` (position {index})")]
#[non_exhaustive]
/// One of the files in a [`FileHandles`] set couldn't be closed.
pub struct CloseFilesError {
    /// The position of the first file that failed to close.
    pub index: usize,
    /// The form field the file was uploaded under.
    pub key: String,
    #[source]
    pub source: io::Error,
}
