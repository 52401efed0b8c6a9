use std::collections::HashMap;
use std::sync::Arc;

use formbind::decoder::{Decoder, FormUrlDecoder};
use formbind::{DecodeError, Destination, FieldCache, FormValue, IncomingRequest};
use http::StatusCode;

fn urlencoded(body: &'static str) -> IncomingRequest {
    http::Request::builder()
        .method("POST")
        .uri("/submit")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(body)
        .unwrap()
        .into()
}

#[derive(Default, Debug, Destination)]
pub struct Prefilled {
    #[bind(form = "field1")]
    pub field1: String,
    #[bind(form = "field2")]
    pub field2: String,
}

#[test]
fn filled_fields_are_skipped_by_default() {
    let mut request = urlencoded("field1=value1&field2=value2");
    let mut destination = Prefilled {
        field1: "prefilled".into(),
        field2: String::new(),
    };
    FormUrlDecoder::new()
        .decode(&mut request, &mut destination)
        .unwrap();
    assert_eq!(destination.field1, "prefilled");
    assert_eq!(destination.field2, "value2");
}

#[test]
fn filled_fields_can_be_overwritten() {
    let mut request = urlencoded("field1=value1&field2=value2");
    let mut destination = Prefilled {
        field1: "prefilled".into(),
        field2: String::new(),
    };
    FormUrlDecoder::new()
        .set_skip_filled(false)
        .decode(&mut request, &mut destination)
        .unwrap();
    assert_eq!(destination.field1, "value1");
    assert_eq!(destination.field2, "value2");
}

#[derive(Default, Debug, Destination)]
pub struct Profile {
    #[bind(form)]
    pub name: String,
    #[bind(form = "years")]
    pub age: i32,
    #[bind(form)]
    pub score: f64,
    #[bind(form)]
    pub admin: bool,
    #[bind(form)]
    pub tags: Vec<String>,
    #[bind(form)]
    pub nickname: Option<String>,
    #[bind(form)]
    pub lucky: Option<i64>,
    #[bind(form = "-")]
    pub secret: String,
    #[bind(form)]
    internal: String,
    pub unannotated: String,
}

#[test]
fn scalars_pointers_and_sequences() {
    let mut request = urlencoded(
        "name=Ursula&years=42&score=9.5&admin=t&tags=a,b,c&lucky=7\
         &secret=leaked&internal=leaked&unannotated=leaked",
    );
    let mut profile = Profile::default();
    FormUrlDecoder::new()
        .decode(&mut request, &mut profile)
        .unwrap();

    assert_eq!(profile.name, "Ursula");
    assert_eq!(profile.age, 42);
    assert_eq!(profile.score, 9.5);
    assert!(profile.admin);
    assert_eq!(profile.tags, ["a", "b", "c"]);
    // Missing keys leave the field untouched.
    assert_eq!(profile.nickname, None);
    assert_eq!(profile.lucky, Some(7));
    assert!(profile.secret.is_empty());
    assert!(profile.internal.is_empty());
    assert!(profile.unannotated.is_empty());
}

#[test]
fn query_parameters_are_bound_too() {
    // A key in both the body and the query string is a list of values.
    let mut request: IncomingRequest = http::Request::builder()
        .uri("/profile?name=Ursula&years=1")
        .header("content-type", "application/x-www-form-urlencoded")
        .body("years=42")
        .unwrap()
        .into();
    let mut profile = Profile::default();
    FormUrlDecoder::new()
        .set_split_enabled(false)
        .set_skip_filled(false)
        .decode(&mut request, &mut profile)
        .unwrap_err();

    let mut request: IncomingRequest = http::Request::builder()
        .uri("/profile?name=Ursula")
        .header("content-type", "application/x-www-form-urlencoded")
        .body("years=42")
        .unwrap()
        .into();
    let mut profile = Profile::default();
    FormUrlDecoder::new()
        .decode(&mut request, &mut profile)
        .unwrap();
    assert_eq!(profile.name, "Ursula");
    assert_eq!(profile.age, 42);
}

#[test]
fn repeated_keys_and_split_settings() {
    let mut request = urlencoded("tags=a&tags=b&name=x&name=y");
    let mut profile = Profile::default();
    FormUrlDecoder::new()
        .decode(&mut request, &mut profile)
        .unwrap();
    assert_eq!(profile.tags, ["a", "b"]);
    assert_eq!(profile.name, "x,y");

    let mut request = urlencoded("tags=a;b");
    let mut profile = Profile::default();
    FormUrlDecoder::new()
        .set_split_symbol(';')
        .decode(&mut request, &mut profile)
        .unwrap();
    assert_eq!(profile.tags, ["a", "b"]);

    let mut request = urlencoded("name=x&name=y");
    let mut profile = Profile::default();
    let err = FormUrlDecoder::new()
        .set_split_enabled(false)
        .decode(&mut request, &mut profile)
        .unwrap_err();
    insta::assert_snapshot!(err, @"`name` is a `String`, which can't be bound from a list of values");
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn conversion_errors_name_the_field() {
    let mut request = urlencoded("years=old");
    let mut profile = Profile::default();
    let err = FormUrlDecoder::new()
        .decode(&mut request, &mut profile)
        .unwrap_err();
    insta::assert_snapshot!(err, @"`age` is set to `old`, which we can't parse as a `i32`");
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    assert!(matches!(err, DecodeError::Conversion(_)));
}

#[test]
fn maps_receive_the_entire_form() {
    let mut request = urlencoded("a=1&b=2&b=3");

    let mut strings: HashMap<String, String> = HashMap::new();
    FormUrlDecoder::new()
        .decode(&mut request, &mut strings)
        .unwrap();
    assert_eq!(strings["a"], "1");
    assert_eq!(strings["b"], "2,3");

    let mut values: HashMap<String, FormValue> = HashMap::new();
    FormUrlDecoder::new()
        .decode(&mut request, &mut values)
        .unwrap();
    assert_eq!(values["b"].as_slice(), ["2", "3"]);

    let mut seqs: HashMap<String, Vec<String>> = HashMap::new();
    FormUrlDecoder::new().decode(&mut request, &mut seqs).unwrap();
    assert_eq!(seqs["a"], ["1"]);
}

#[derive(Default, Debug, Destination)]
pub struct Nothing {
    pub name: String,
    #[bind(multipart)]
    pub upload_only: String,
}

#[test]
fn destinations_without_form_annotations_are_left_alone() {
    // The body is not even parsed: invalid values can't cause failures.
    let mut request = urlencoded("name=Ursula&upload_only=x");
    let mut nothing = Nothing::default();
    FormUrlDecoder::new()
        .decode(&mut request, &mut nothing)
        .unwrap();
    assert!(nothing.name.is_empty());
    assert!(nothing.upload_only.is_empty());
    assert!(request.form().is_none());
}

#[derive(Default, Debug, Destination)]
pub struct Address {
    #[bind(form)]
    pub city: String,
}

#[derive(Default, Debug, Destination)]
pub struct Nested {
    #[bind(form)]
    pub address: Address,
}

#[derive(Default, Debug, Destination)]
pub struct NumericKeys {
    #[bind(form)]
    pub lookup: HashMap<i32, String>,
}

#[derive(Default, Debug, Destination)]
pub struct Unsigned {
    #[bind(form)]
    pub count: u32,
}

#[test]
fn unsupported_field_types() {
    let mut request = urlencoded("address=Rome&lookup=1&count=1");

    let err = FormUrlDecoder::new()
        .decode(&mut request, &mut Nested::default())
        .unwrap_err();
    assert!(matches!(err, DecodeError::NotSupported(_)));
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

    let err = FormUrlDecoder::new()
        .decode(&mut request, &mut NumericKeys::default())
        .unwrap_err();
    assert!(matches!(err, DecodeError::NotSupported(_)));

    let err = FormUrlDecoder::new()
        .decode(&mut request, &mut Unsigned::default())
        .unwrap_err();
    insta::assert_snapshot!(err, @"`count` is a `u32`, which can't be bound from a single value");
}

#[test]
fn unsupported_field_types_are_rejected_even_when_filled() {
    let mut request = urlencoded("address=Rome&count=1");

    let mut nested = Nested {
        address: Address {
            city: "Milan".into(),
        },
    };
    let err = FormUrlDecoder::new()
        .decode(&mut request, &mut nested)
        .unwrap_err();
    assert!(matches!(err, DecodeError::NotSupported(_)));
    assert_eq!(nested.address.city, "Milan");

    let err = FormUrlDecoder::new()
        .decode(&mut request, &mut Unsigned { count: 5 })
        .unwrap_err();
    insta::assert_snapshot!(err, @"`count` is a `u32`, which can't be bound from a single value");
}

#[derive(Default, Debug, Destination)]
pub struct AllFilesOnForm {
    #[bind(form = "*")]
    pub everything: String,
    #[bind(form)]
    pub title: String,
}

#[test]
fn the_all_files_directive_is_ignored_by_url_encoded_forms() {
    let mut request = urlencoded("everything=x&*=y&title=Hello");
    let mut destination = AllFilesOnForm::default();
    FormUrlDecoder::new()
        .decode(&mut request, &mut destination)
        .unwrap();
    assert!(destination.everything.is_empty());
    assert_eq!(destination.title, "Hello");
}

#[test]
fn dedicated_field_caches() {
    let cache = Arc::new(FieldCache::new());
    let decoder = FormUrlDecoder::new().set_field_cache(cache.clone());
    assert!(cache.is_empty());

    let mut request = urlencoded("field2=value2");
    decoder
        .decode(&mut request, &mut Prefilled::default())
        .unwrap();
    decoder
        .decode(&mut request, &mut Prefilled::default())
        .unwrap();
    assert_eq!(cache.len(), 1);
    assert!(cache.contains::<Prefilled>());
}
