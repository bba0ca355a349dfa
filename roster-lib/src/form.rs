//! Form state for creating and editing records.
//!
//! The [`FormController`] owns the in-progress [`Draft`], re-validates each field as it
//! changes and, on submit, decides whether the draft becomes a new record or replaces the one
//! being edited.

use std::collections::BTreeMap;

use getset::Getters;
use tracing::debug;

use crate::{
    Result,
    repository::{DateOfBirth, Image, Province, Record, RecordData, RecordId, Repository},
    validation::{self, Feedback, Field, FormErrors, validate_field, validate_form},
};

/// Whether a submit will create a new record or update an existing one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Creating,
    Editing(RecordId),
}

/// The not-yet-committed contents of the form. Every field may be empty.
#[derive(Debug, Clone, Default, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct Draft {
    name: String,
    email: String,
    phone: String,
    day: String,
    month: String,
    year: String,
    city: String,
    district: String,
    province: Option<Province>,
    country: String,
    image: Option<Image>,
}

impl Draft {
    fn blank(country: &str) -> Self {
        Self {
            country: country.to_string(),
            ..Default::default()
        }
    }

    // The image is deliberately not carried over; it has to be picked again.
    fn from_record(record: &Record) -> Self {
        let text = |part: Option<String>| part.unwrap_or_default();
        let dob = record.date_of_birth;

        Self {
            name: record.name.clone(),
            email: record.email.clone(),
            phone: record.phone.clone(),
            day: text(dob.day.map(|d| d.to_string())),
            month: text(dob.month.map(|m| m.to_string())),
            year: text(dob.year.map(|y| y.to_string())),
            city: record.city.clone(),
            district: record.district.clone(),
            province: record.province,
            country: record.country.clone(),
            image: None,
        }
    }

    /// The raw text of a text field. [`Field::Image`] has no text and yields `""`.
    pub fn text(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::Phone => &self.phone,
            Field::Day => &self.day,
            Field::Month => &self.month,
            Field::Year => &self.year,
            Field::City => &self.city,
            Field::District => &self.district,
            Field::Image => "",
        }
    }

    fn text_mut(&mut self, field: Field) -> Option<&mut String> {
        match field {
            Field::Name => Some(&mut self.name),
            Field::Email => Some(&mut self.email),
            Field::Phone => Some(&mut self.phone),
            Field::Day => Some(&mut self.day),
            Field::Month => Some(&mut self.month),
            Field::Year => Some(&mut self.year),
            Field::City => Some(&mut self.city),
            Field::District => Some(&mut self.district),
            Field::Image => None,
        }
    }

    /// Date parts that were typed in but will not be stored because they don't parse or are
    /// out of range.
    pub fn dropped_date_parts(&self) -> Vec<Field> {
        let dob = DateOfBirth::parse(&self.day, &self.month, &self.year);

        [
            (Field::Day, &self.day, dob.day.is_some()),
            (Field::Month, &self.month, dob.month.is_some()),
            (Field::Year, &self.year, dob.year.is_some()),
        ]
        .into_iter()
        .filter(|(_, text, kept)| !text.trim().is_empty() && !kept)
        .map(|(field, _, _)| field)
        .collect()
    }

    fn to_data(&self) -> RecordData {
        RecordData {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            date_of_birth: DateOfBirth::parse(&self.day, &self.month, &self.year),
            city: self.city.clone(),
            district: self.district.clone(),
            province: self.province,
            country: self.country.clone(),
            image: self.image.clone(),
        }
    }
}

/// What happened on [`FormController::submit`].
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Validation failed; the draft is untouched and the errors are shown inline.
    Rejected(FormErrors),
    /// `dropped` lists the date parts that were left out of the stored record.
    Created { record: Record, dropped: Vec<Field> },
    Updated { record: Record, dropped: Vec<Field> },
}

#[derive(Debug, Clone)]
pub struct FormController {
    draft: Draft,
    mode: Mode,
    feedback: BTreeMap<Field, Feedback>,
    default_country: String,
}

impl FormController {
    pub fn new(default_country: impl Into<String>) -> Self {
        let default_country = default_country.into();

        Self {
            draft: Draft::blank(&default_country),
            mode: Mode::Creating,
            feedback: BTreeMap::new(),
            default_country,
        }
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Feedback currently shown next to `field`, if any.
    pub fn feedback(&self, field: Field) -> Option<&Feedback> {
        self.feedback.get(&field)
    }

    pub fn submit_label(&self) -> &'static str {
        match self.mode {
            Mode::Creating => "Submit",
            Mode::Editing(_) => "Update Record",
        }
    }

    /// Update a text field and immediately re-validate it.
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) -> Feedback {
        let Some(slot) = self.draft.text_mut(field) else {
            return Feedback::default();
        };
        *slot = value.into();

        let feedback = validate_field(field, self.draft.text(field));
        self.feedback.insert(field, feedback.clone());

        feedback
    }

    pub fn select_province(&mut self, province: Option<Province>) {
        self.draft.province = province;
    }

    pub fn select_country(&mut self, country: impl Into<String>) {
        self.draft.country = country.into();
    }

    /// Offer an image for the draft. Anything but a PNG is refused and the previously accepted
    /// image, if any, stays in place.
    pub fn select_image(&mut self, image: Image) -> Feedback {
        let feedback = validation::validate_image(&image);
        if !feedback.is_error() {
            self.draft.image = Some(image);
        }

        self.feedback.insert(Field::Image, feedback.clone());

        feedback
    }

    /// Load `record` into the draft and switch to editing it.
    pub fn begin_edit(&mut self, record: &Record) {
        self.draft = Draft::from_record(record);
        self.feedback.clear();
        self.mode = Mode::Editing(record.id());

        debug!("Editing record {}", record.id());
    }

    /// Discard the draft and go back to creating.
    pub fn reset(&mut self) {
        self.draft = Draft::blank(&self.default_country);
        self.feedback.clear();
        self.mode = Mode::Creating;
    }

    /// Validate the whole draft and, if it passes, write it to `repo`.
    ///
    /// A rejected submit keeps the draft and mode as they are. Errors from the repository (for
    /// example the edited record having been deleted meanwhile) are returned and also leave
    /// the form untouched.
    pub fn submit(&mut self, repo: &Repository) -> Result<Submission> {
        let errors = validate_form(&self.draft.name, &self.draft.email, &self.draft.phone);

        for field in [Field::Name, Field::Email, Field::Phone] {
            let feedback = validate_field(field, self.draft.text(field));
            self.feedback.insert(field, feedback);
        }

        if !errors.is_empty() {
            return Ok(Submission::Rejected(errors));
        }

        let data = self.draft.to_data();
        let dropped = self.draft.dropped_date_parts();
        if !dropped.is_empty() {
            debug!(?dropped, "Storing record without unusable date of birth parts");
        }

        let submission = match self.mode {
            Mode::Creating => Submission::Created {
                record: repo.add_record(data)?,
                dropped,
            },
            Mode::Editing(id) => Submission::Updated {
                record: repo.update_record(id, data)?,
                dropped,
            },
        };

        self.reset();

        Ok(submission)
    }
}
