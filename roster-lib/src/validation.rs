//! Field rules for the record form.
//!
//! Every function here is pure. A [`Feedback`] is re-derived from scratch on each call so a
//! stale success message can never sit next to a fresh error.

use std::{
    collections::BTreeMap,
    fmt::{self, Display, Formatter},
    sync::LazyLock,
};

use chrono::Datelike;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::EnumIter;

use crate::repository::Image;

pub const PNG_MEDIA_TYPE: &str = "image/png";
pub const MIN_YEAR: i32 = 1900;

pub const MAX_EMAIL_LENGTH: usize = 254;
pub const MAX_LOCAL_PART_LENGTH: usize = 64;
const MAX_LABEL_LENGTH: usize = 63;

// One dot-separated piece of the local part. Non-ASCII letters are allowed.
static LOCAL_PART: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~\-\x{A1}-\x{D7FF}\x{F900}-\x{FDCF}\x{FDF0}-\x{FFEF}]+$",
    )
    .expect("local part pattern must compile")
});

static DOMAIN_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^[A-Za-z0-9\x{A1}-\x{D7FF}\x{F900}-\x{FFEF}]",
        r"(?:[A-Za-z0-9\x{A1}-\x{D7FF}\x{F900}-\x{FFEF}-]*[A-Za-z0-9\x{A1}-\x{D7FF}\x{F900}-\x{FFEF}])?$",
    ))
    .expect("domain label pattern must compile")
});

// Letters only, or an IDNA `xn--` label.
static TLD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:[A-Za-z\x{A1}-\x{A8}\x{AA}-\x{D7FF}\x{F900}-\x{FDCF}\x{FDF0}-\x{FFEF}]{2,}|xn[A-Za-z0-9-]{2,})$",
    )
    .expect("tld pattern must compile")
});

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{7,}$").expect("phone pattern must compile"));

/// A form field that can carry feedback.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
pub enum Field {
    Name,
    Email,
    Phone,
    Day,
    Month,
    Year,
    City,
    District,
    Image,
}

/// The outcome of checking one field. At most one of `error` and `success` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Feedback {
    error: Option<String>,
    success: Option<String>,
}

impl Feedback {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            success: None,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            error: None,
            success: Some(message.into()),
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn success_message(&self) -> Option<&str> {
        self.success.as_deref()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Check a single text field. Fields without rules always yield empty feedback.
pub fn validate_field(field: Field, value: &str) -> Feedback {
    match field {
        Field::Name => validate_name(value),
        Field::Email => validate_email(value),
        Field::Phone => validate_phone(value),
        Field::Day => validate_range(value, 1, 31, "Day must be between 1 and 31"),
        Field::Month => validate_range(value, 1, 12, "Month must be between 1 and 12"),
        Field::Year => {
            let current = chrono::Local::now().year();
            validate_range(
                value,
                MIN_YEAR,
                current,
                &format!("Year must be between {MIN_YEAR} and {current}"),
            )
        }
        Field::City | Field::District | Field::Image => Feedback::default(),
    }
}

pub fn validate_name(value: &str) -> Feedback {
    if value.is_empty() {
        Feedback::error("Name is required")
    } else {
        Feedback::success("Looks good!")
    }
}

pub fn validate_email(value: &str) -> Feedback {
    if value.is_empty() {
        Feedback::error("Email is required")
    } else if !is_email(value) {
        Feedback::error("Email format is invalid")
    } else {
        Feedback::success("Valid email!")
    }
}

/// Address grammar: `local@domain`, at most 254 characters, a local part of at most 64
/// characters made of non-empty dot-separated pieces, and a domain of at least two labels
/// ending in an alphabetic or `xn--` top-level label.
fn is_email(value: &str) -> bool {
    if value.chars().count() > MAX_EMAIL_LENGTH {
        return false;
    }

    let Some((local, domain)) = value.rsplit_once('@') else {
        return false;
    };

    if local.chars().count() > MAX_LOCAL_PART_LENGTH
        || !local.split('.').all(|part| LOCAL_PART.is_match(part))
    {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    let Some((tld, rest)) = labels.split_last() else {
        return false;
    };

    !rest.is_empty()
        && TLD.is_match(tld)
        && labels
            .iter()
            .all(|label| label.chars().count() <= MAX_LABEL_LENGTH && DOMAIN_LABEL.is_match(label))
}

pub fn validate_phone(value: &str) -> Feedback {
    if value.is_empty() {
        Feedback::error("Phone number is required")
    } else if !PHONE.is_match(value) {
        Feedback::error("Phone number must be at least 7 digits long")
    } else {
        Feedback::success("Valid phone number!")
    }
}

/// Only images declared as PNG are accepted.
pub fn validate_image(image: &Image) -> Feedback {
    if image.media_type() == PNG_MEDIA_TYPE {
        Feedback::success("Image uploaded successfully!")
    } else {
        Feedback::error("Only PNG images are allowed")
    }
}

// Date parts are optional, so an empty value is neither an error nor a success.
fn validate_range(value: &str, min: i32, max: i32, message: &str) -> Feedback {
    if value.is_empty() {
        return Feedback::default();
    }

    match value.trim().parse::<i32>() {
        Ok(n) if (min..=max).contains(&n) => Feedback::default(),
        _ => Feedback::error(message),
    }
}

/// Field errors collected by [`validate_form`]. Submission may only proceed when empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<Field, String>);

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(field, msg)| (*field, msg.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl Display for FormErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.values().map(String::as_str).collect();
        write!(f, "{}", messages.join(", "))
    }
}

/// Whole-form check run at submit time, independent of any incremental state.
pub fn validate_form(name: &str, email: &str, phone: &str) -> FormErrors {
    let errors = [
        (Field::Name, validate_name(name)),
        (Field::Email, validate_email(email)),
        (Field::Phone, validate_phone(phone)),
    ]
    .into_iter()
    .filter_map(|(field, feedback)| feedback.error.map(|msg| (field, msg)))
    .collect();

    FormErrors(errors)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_empty_required_fields() {
        for field in [Field::Name, Field::Email, Field::Phone] {
            let feedback = validate_field(field, "");
            assert!(feedback.is_error(), "{field} should be required");
            assert_eq!(feedback.success_message(), None);
        }

        assert_eq!(
            validate_name("").error_message(),
            Some("Name is required")
        );
    }

    #[test]
    fn test_email_format() {
        for bad in ["abc", "a@b", "a@@b.co", ".a@b.co", "a b@c.co", "a@b.c"] {
            assert_eq!(
                validate_email(bad).error_message(),
                Some("Email format is invalid"),
                "{bad}"
            );
        }

        let long_local = format!("{}@example.com", "a".repeat(65));
        let long_address = format!("a@{}.com", "b".repeat(250));
        for bad in [long_local.as_str(), long_address.as_str(), "a@-b.co", "a@b_c.co", "a@b.c0"] {
            assert!(validate_email(bad).is_error(), "{bad}");
        }

        let max_local = format!("{}@example.com", "a".repeat(64));
        for good in [
            "a@b.co",
            "x@y.com",
            "first.last+tag@mail.example.org",
            "josé@example.com",
            "a@example.xn--p1ai",
            max_local.as_str(),
        ] {
            let feedback = validate_email(good);
            assert!(!feedback.is_error(), "{good}");
            assert_eq!(feedback.success_message(), Some("Valid email!"));
        }
    }

    #[test]
    fn test_phone_format() {
        for bad in ["12345", "123456", "12-345-6789", "+9771234567", "1234567a"] {
            assert_eq!(
                validate_phone(bad).error_message(),
                Some("Phone number must be at least 7 digits long"),
                "{bad}"
            );
        }

        for good in ["1234567", "9841000000"] {
            assert!(validate_phone(good).success_message().is_some(), "{good}");
        }
    }

    #[test]
    fn test_feedback_is_rederived() {
        let first = validate_field(Field::Name, "");
        let second = validate_field(Field::Name, "Ram");

        assert!(first.is_error());
        assert_eq!(second.error_message(), None);
        assert_eq!(second.success_message(), Some("Looks good!"));
    }

    #[test]
    fn test_image_media_type() {
        let png = Image::new(PNG_MEDIA_TYPE, vec![0x89, 0x50]);
        let jpeg = Image::new("image/jpeg", vec![0xff, 0xd8]);

        assert_eq!(
            validate_image(&png).success_message(),
            Some("Image uploaded successfully!")
        );

        let feedback = validate_image(&jpeg);
        assert_eq!(feedback.error_message(), Some("Only PNG images are allowed"));
        assert_eq!(feedback.success_message(), None);
    }

    #[test]
    fn test_date_parts() {
        assert_eq!(validate_field(Field::Day, ""), Feedback::default());
        assert_eq!(validate_field(Field::Day, "31"), Feedback::default());
        assert!(validate_field(Field::Day, "32").is_error());
        assert!(validate_field(Field::Month, "0").is_error());
        assert!(validate_field(Field::Year, "1899").is_error());
        assert!(!validate_field(Field::Year, "1990").is_error());
    }

    #[test]
    fn test_validate_form_only_reports_failures() {
        let errors = validate_form("", "x@y.com", "1234567");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get(Field::Name), Some("Name is required"));
        assert_eq!(errors.get(Field::Email), None);

        assert!(validate_form("Sita", "x@y.com", "1234567").is_empty());
    }
}
