use std::io::Write;

use bytes::Bytes;
use http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue};
use memchr::memmem;
use ubyte::{ByteUnit, ToByteUnit};

use super::{FilePart, MultipartForm, MultipartError, Storage};
use crate::file::FileHeader;

/// The default in-memory budget for uploaded files.
pub const DEFAULT_MAX_MEMORY: ByteUnit = ByteUnit::Mebibyte(32);

/// Text values can exceed the file memory budget by this much.
const VALUES_ALLOWANCE: ByteUnit = ByteUnit::Mebibyte(10);

/// Parse a buffered `multipart/form-data` body.
///
/// `content_type` is the value of the `Content-Type` header, it must carry the
/// multipart boundary.
/// Uploaded files are kept in memory until their combined size exceeds `max_memory`,
/// every subsequent file is stored in a temporary file.
/// Text values can take up to `max_memory` plus 10 MiB.
///
/// Parts without a form field name are ignored.
pub fn parse(
    content_type: Option<&str>,
    body: &Bytes,
    max_memory: ByteUnit,
) -> Result<MultipartForm, MultipartError> {
    let boundary = boundary(content_type)?;
    let delimiter = format!("--{boundary}");
    let part_end = format!("\r\n{delimiter}");
    let part_end_finder = memmem::Finder::new(part_end.as_bytes());

    let values_limit = max_memory + VALUES_ALLOWANCE;
    let mut values_left = values_limit.as_u64();
    let mut memory_left = max_memory.as_u64();
    let mut form = MultipartForm::default();

    let Some(start) = memmem::find(body, delimiter.as_bytes()) else {
        return Err(if body.is_empty() {
            MultipartError::UnexpectedEof
        } else {
            MultipartError::Malformed {
                reason: "the opening boundary is missing",
            }
        });
    };
    let mut cursor = start + delimiter.len();

    for part_index in 0.. {
        let rest = &body[cursor..];
        if rest.starts_with(b"--") {
            break;
        }
        // Transport padding, allowed after a boundary.
        let padding = rest
            .iter()
            .take_while(|b| matches!(b, b' ' | b'\t'))
            .count();
        let rest = &rest[padding..];
        if rest.len() < 2 {
            return Err(MultipartError::UnexpectedEof);
        }
        if !rest.starts_with(b"\r\n") {
            return Err(MultipartError::Malformed {
                reason: "a boundary must be followed by a line break",
            });
        }
        let headers_start = cursor + padding + 2;

        let (headers, content_start) = if body[headers_start..].starts_with(b"\r\n") {
            (HeaderMap::new(), headers_start + 2)
        } else {
            let headers_len = memmem::find(&body[headers_start..], b"\r\n\r\n")
                .ok_or(MultipartError::UnexpectedEof)?;
            let raw = &body[headers_start..headers_start + headers_len];
            let headers = parse_headers(raw)
                .ok_or(MultipartError::InvalidPartHeader { part: part_index })?;
            (headers, headers_start + headers_len + 4)
        };

        let content_len = part_end_finder
            .find(&body[content_start..])
            .ok_or(MultipartError::UnexpectedEof)?;
        let content = body.slice(content_start..content_start + content_len);
        cursor = content_start + content_len + part_end.len();

        let disposition = match headers.get(CONTENT_DISPOSITION) {
            Some(value) => {
                let value = value
                    .to_str()
                    .map_err(|_| MultipartError::InvalidPartHeader { part: part_index })?;
                parse_content_disposition(value)
            }
            None => None,
        };
        let Some(ContentDisposition {
            name: Some(name),
            filename,
        }) = disposition
        else {
            tracing::debug!(part = part_index, "Skipping a multipart part without a name");
            continue;
        };

        match filename.filter(|f| !f.is_empty()) {
            None => {
                let size = content.len() as u64;
                if size > values_left {
                    return Err(MultipartError::ValuesTooLarge {
                        limit: values_limit,
                    });
                }
                values_left -= size;
                let value = std::str::from_utf8(&content)
                    .map_err(|source| MultipartError::InvalidUtf8 {
                        name: name.clone(),
                        source,
                    })?
                    .to_owned();
                form.values.append(name, value);
            }
            Some(filename) => {
                let size = content.len() as u64;
                let storage = if size <= memory_left {
                    memory_left -= size;
                    Storage::Memory(content)
                } else {
                    Storage::Disk(spill(&content)?)
                };
                let header = FileHeader {
                    filename: base_name(&filename).to_owned(),
                    content_type: headers
                        .get(CONTENT_TYPE)
                        .and_then(|v| v.to_str().ok())
                        .map(ToOwned::to_owned),
                    size,
                    headers,
                };
                form.files
                    .entry(name)
                    .or_default()
                    .push(FilePart { header, storage });
            }
        }
    }

    Ok(form)
}

fn boundary(content_type: Option<&str>) -> Result<String, MultipartError> {
    let Some(content_type) = content_type else {
        return Err(MultipartError::MissingContentType);
    };
    let not_multipart = || MultipartError::NotMultipart {
        actual: content_type.to_owned(),
    };
    let mime: mime::Mime = content_type.parse().map_err(|_| not_multipart())?;
    if mime.type_() != mime::MULTIPART || mime.subtype() != mime::FORM_DATA {
        return Err(not_multipart());
    }
    match mime.get_param(mime::BOUNDARY) {
        Some(boundary) if !boundary.as_str().is_empty() => Ok(boundary.as_str().to_owned()),
        _ => Err(MultipartError::MissingBoundary),
    }
}

fn parse_headers(raw: &[u8]) -> Option<HeaderMap> {
    let mut headers = HeaderMap::new();
    for line in raw.split(|&b| b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.is_empty() {
            continue;
        }
        let colon = memchr::memchr(b':', line)?;
        let name = HeaderName::from_bytes(line[..colon].trim_ascii()).ok()?;
        let value = HeaderValue::from_bytes(line[colon + 1..].trim_ascii()).ok()?;
        headers.append(name, value);
    }
    Some(headers)
}

fn spill(content: &[u8]) -> Result<tempfile::NamedTempFile, MultipartError> {
    let mut file = tempfile::NamedTempFile::new().map_err(MultipartError::Spill)?;
    file.write_all(content).map_err(MultipartError::Spill)?;
    file.flush().map_err(MultipartError::Spill)?;
    tracing::debug!(
        size = %content.len().bytes(),
        path = %file.path().display(),
        "Spilled an uploaded file to disk"
    );
    Ok(file)
}

/// The last component of a client-provided path.
fn base_name(filename: &str) -> &str {
    filename.rsplit(['/', '\\']).next().unwrap_or(filename)
}

#[derive(Debug, Default, PartialEq, Eq)]
struct ContentDisposition {
    name: Option<String>,
    filename: Option<String>,
}

/// Parse a `form-data` content disposition.
///
/// Returns `None` for other disposition types and for malformed parameters.
fn parse_content_disposition(value: &str) -> Option<ContentDisposition> {
    let (kind, mut rest) = value.split_once(';').unwrap_or((value, ""));
    if !kind.trim().eq_ignore_ascii_case("form-data") {
        return None;
    }
    let mut disposition = ContentDisposition::default();
    loop {
        rest = rest.trim_start_matches([' ', '\t', ';']);
        if rest.is_empty() {
            break;
        }
        let (key, after) = rest.split_once('=')?;
        let after = after.trim_start();
        let (value, remaining) = match after.strip_prefix('"') {
            Some(quoted) => unquote(quoted)?,
            None => {
                let end = after.find(';').unwrap_or(after.len());
                (after[..end].trim_end().to_owned(), &after[end..])
            }
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "name" => disposition.name = Some(value),
            "filename" => disposition.filename = Some(value),
            _ => {}
        }
        rest = remaining;
    }
    Some(disposition)
}

/// Read a quoted string, up to its closing quote.
fn unquote(input: &str) -> Option<(String, &str)> {
    let mut out = String::new();
    let mut chars = input.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Some((out, &input[i + 1..])),
            '\\' => {
                let (_, escaped) = chars.next()?;
                out.push(escaped);
            }
            c => out.push(c),
        }
    }
    None
}
