use bytes::Bytes;
use formbind::decoder::{Decoder, MultipartDecoder};
use formbind::{DecodeError, Destination, FileHandle, FileHandles, IncomingRequest};
use http::StatusCode;
use ubyte::ByteUnit;

const BOUNDARY: &str = "----formbind-boundary";

enum Part {
    Value(&'static str, &'static str),
    File(&'static str, &'static str, &'static str),
}

fn multipart(parts: &[Part]) -> IncomingRequest {
    let mut body = String::new();
    for part in parts {
        body.push_str(&format!("--{BOUNDARY}\r\n"));
        match part {
            Part::Value(name, value) => {
                body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                ));
            }
            Part::File(name, filename, content) => {
                body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                     Content-Type: text/plain\r\n\r\n{content}\r\n"
                ));
            }
        }
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    http::Request::builder()
        .method("POST")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(body)
        .unwrap()
        .into()
}

#[derive(Default, Debug, Destination)]
pub struct Upload {
    #[bind(multipart)]
    pub title: String,
    #[bind(multipart = "count")]
    pub count: Option<i32>,
    #[bind(multipart = "text_file")]
    pub text_file: Option<FileHandle>,
    #[bind(multipart = "other_text_file")]
    pub other_text_file: Option<Box<FileHandle>>,
    #[bind(multipart = "*")]
    pub everything: FileHandles,
}

#[test]
fn values_and_files() {
    let mut request = multipart(&[
        Part::Value("title", "Holiday"),
        Part::Value("count", "3"),
        Part::File("text_file", "notes.txt", "first"),
        Part::File("text_file", "notes-2.txt", "ignored"),
        Part::File("other_text_file", "other.txt", "second"),
    ]);
    let mut upload = Upload::default();
    MultipartDecoder::new()
        .decode(&mut request, &mut upload)
        .unwrap();

    assert_eq!(upload.title, "Holiday");
    assert_eq!(upload.count, Some(3));

    let mut text_file = upload.text_file.unwrap();
    assert_eq!(text_file.filename(), "notes.txt");
    assert_eq!(text_file.read_to_bytes().unwrap(), "first");

    let mut other = upload.other_text_file.unwrap();
    assert_eq!(other.header().content_type.as_deref(), Some("text/plain"));
    assert_eq!(other.read_to_bytes().unwrap(), "second");

    // One file per form field, in upload order.
    let keys: Vec<_> = upload.everything.iter().map(|f| f.key()).collect();
    assert_eq!(keys, ["text_file", "other_text_file"]);
    upload.everything.close_all().unwrap();
}

#[test]
fn text_values_take_precedence_over_files() {
    let mut request = multipart(&[
        Part::File("title", "title.txt", "from a file"),
        Part::Value("title", "from a value"),
    ]);
    let mut upload = Upload::default();
    MultipartDecoder::new()
        .decode(&mut request, &mut upload)
        .unwrap();
    assert_eq!(upload.title, "from a value");
}

#[test]
fn missing_keys_leave_fields_untouched() {
    let mut request = multipart(&[Part::Value("unrelated", "x")]);
    let mut upload = Upload {
        title: "kept".into(),
        ..Default::default()
    };
    MultipartDecoder::new()
        .decode(&mut request, &mut upload)
        .unwrap();
    assert_eq!(upload.title, "kept");
    assert!(upload.count.is_none());
    assert!(upload.text_file.is_none());
    assert!(upload.everything.is_empty());
}

#[test]
fn files_can_be_spilled_to_disk() {
    let mut request = multipart(&[
        Part::File("text_file", "small.txt", "tiny"),
        Part::File("other_text_file", "large.txt", "this one doesn't fit in memory"),
    ]);
    let mut upload = Upload::default();
    MultipartDecoder::new()
        .set_max_memory(ByteUnit::Byte(8))
        .decode(&mut request, &mut upload)
        .unwrap();

    assert_eq!(upload.text_file.unwrap().read_to_bytes().unwrap(), "tiny");
    let mut large = upload.other_text_file.unwrap();
    assert_eq!(large.size(), 30);
    assert_eq!(
        large.read_to_bytes().unwrap(),
        "this one doesn't fit in memory"
    );
    large.close().unwrap();
    assert!(large.is_closed());
}

fn prefilled_upload() -> Upload {
    Upload {
        title: "kept".into(),
        text_file: Some(FileHandle::from_bytes(
            "text_file",
            "original.txt",
            Bytes::from_static(b"original"),
        )),
        everything: vec![FileHandle::from_bytes(
            "text_file",
            "original.txt",
            Bytes::from_static(b"original"),
        )]
        .into(),
        ..Default::default()
    }
}

fn overwriting_request() -> IncomingRequest {
    multipart(&[
        Part::Value("title", "new title"),
        Part::File("text_file", "new.txt", "new"),
        Part::File("other_text_file", "other.txt", "other"),
    ])
}

#[test]
fn filled_fields_are_skipped_by_default() {
    let mut request = overwriting_request();
    let mut upload = prefilled_upload();
    MultipartDecoder::new()
        .decode(&mut request, &mut upload)
        .unwrap();

    assert_eq!(upload.title, "kept");
    assert_eq!(upload.text_file.as_ref().unwrap().filename(), "original.txt");
    assert_eq!(upload.everything.len(), 1);
    assert_eq!(upload.everything[0].filename(), "original.txt");
    // Empty fields are still populated.
    assert_eq!(upload.other_text_file.unwrap().filename(), "other.txt");
}

#[test]
fn filled_fields_can_be_overwritten() {
    let mut request = overwriting_request();
    let mut upload = prefilled_upload();
    MultipartDecoder::new()
        .set_skip_filled(false)
        .decode(&mut request, &mut upload)
        .unwrap();

    assert_eq!(upload.title, "new title");
    let mut text_file = upload.text_file.unwrap();
    assert_eq!(text_file.filename(), "new.txt");
    assert_eq!(text_file.read_to_bytes().unwrap(), "new");
    let names: Vec<_> = upload.everything.iter().map(|f| f.filename()).collect();
    assert_eq!(names, ["new.txt", "other.txt"]);
}

#[derive(Default, Debug, Destination)]
pub struct Attachments {
    #[bind(multipart = "*")]
    pub files: Vec<FileHandle>,
    #[bind(multipart = "title")]
    pub title: String,
}

#[test]
fn all_files_into_a_vec() {
    let mut request = multipart(&[
        Part::File("a", "a.txt", "a"),
        Part::File("b", "b.txt", "b"),
        Part::Value("title", "two files"),
    ]);
    let mut attachments = Attachments::default();
    MultipartDecoder::new()
        .decode(&mut request, &mut attachments)
        .unwrap();
    assert_eq!(attachments.files.len(), 2);
    assert_eq!(attachments.title, "two files");
}

#[test]
fn query_parameters_are_bound_too() {
    let mut request: IncomingRequest = http::Request::builder()
        .method("POST")
        .uri("/upload?count=9")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(format!("--{BOUNDARY}--\r\n"))
        .unwrap()
        .into();
    let mut upload = Upload::default();
    MultipartDecoder::new()
        .decode(&mut request, &mut upload)
        .unwrap();
    assert_eq!(upload.count, Some(9));
}

#[test]
fn conversion_errors() {
    let mut request = multipart(&[Part::Value("count", "many")]);
    let err = MultipartDecoder::new()
        .decode(&mut request, &mut Upload::default())
        .unwrap_err();
    insta::assert_snapshot!(err, @"`count` is set to `many`, which we can't parse as a `i32`");
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
}

#[test]
fn malformed_bodies() {
    let mut request: IncomingRequest = http::Request::builder()
        .method("POST")
        .header("content-type", "application/json")
        .body("{}")
        .unwrap()
        .into();
    let err = MultipartDecoder::new()
        .decode(&mut request, &mut Upload::default())
        .unwrap_err();
    assert!(matches!(err, DecodeError::TransportParse(_)));
    assert_eq!(err.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let mut request: IncomingRequest = http::Request::builder()
        .method("POST")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nno end"
        ))
        .unwrap()
        .into();
    let err = MultipartDecoder::new()
        .decode(&mut request, &mut Upload::default())
        .unwrap_err();
    insta::assert_snapshot!(err, @r###"
    Failed to parse the request body as a multipart form.
    The multipart body ended before the closing boundary
    "###);
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
}

#[derive(Default, Debug, Destination)]
pub struct FormOnly {
    #[bind(form)]
    pub title: String,
}

#[test]
fn destinations_without_multipart_annotations_are_left_alone() {
    let mut request: IncomingRequest = http::Request::builder()
        .method("POST")
        .header("content-type", "text/plain")
        .body("not a multipart body")
        .unwrap()
        .into();
    let mut destination = FormOnly::default();
    MultipartDecoder::new()
        .decode(&mut request, &mut destination)
        .unwrap();
    assert!(destination.title.is_empty());
}
