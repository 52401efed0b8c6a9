use std::collections::HashMap;

use formbind::Bind;
use formbind::fields::Destination;
use formbind::{FileHandle, FileHandles};

#[derive(Default, formbind::Destination)]
pub struct Signup {
    #[bind(form = "email")]
    pub email: String,
    #[bind(form, multipart)]
    pub age: Option<i32>,
    #[bind(form = "-")]
    pub role: String,
    #[bind(multipart = "avatar")]
    pub avatar: Option<Box<FileHandle>>,
    #[bind(multipart = "*")]
    pub attachments: FileHandles,
    #[bind(form = "created_at")]
    created_at: u64,
    pub untouched: Vec<u32>,
}

#[derive(Default, formbind::Destination)]
pub struct RawIdentifiers {
    #[bind(form)]
    pub r#type: String,
    #[bind(form = "extra")]
    pub extra: HashMap<String, String>,
}

#[derive(formbind::Destination)]
pub struct Empty {}

fn main() {
    let fields = Signup::declared_fields();
    assert_eq!(fields.len(), 7);
    assert_eq!(fields[0].name, "email");
    assert_eq!(fields[0].annotations, &[("form", "email")]);
    assert_eq!(fields[1].annotations, &[("form", ""), ("multipart", "")]);
    assert!(!fields[5].visible);
    assert!(fields[6].annotations.is_empty());

    let mut signup = Signup::default();
    assert!(signup.field_mut(0).is_some());
    // Private and unannotated fields are never handed out.
    assert!(signup.field_mut(5).is_none());
    assert!(signup.field_mut(6).is_none());
    assert_eq!(signup.created_at, 0);

    // Only bindable fields count towards the zero check.
    signup.created_at = 10;
    assert!(signup.is_zero());
    signup.email = "ursula@example.com".into();
    assert!(!signup.is_zero());

    assert_eq!(RawIdentifiers::declared_fields()[0].name, "type");
    assert!(Empty::declared_fields().is_empty());
}
