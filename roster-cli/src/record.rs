use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use roster_lib::{
    FormController, RecordId, Repository, Submission,
    repository::{Image, Province},
    validation::{Feedback, Field},
};
use sysexits::ExitCode;

use crate::fail;

/// Record fields accepted by `add` and `edit`. Fields left out keep their current value.
#[derive(Args, Debug, Clone, Default)]
pub struct Fields {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    /// Digits only, at least 7
    #[arg(long)]
    phone: Option<String>,
    /// Day of birth (1-31)
    #[arg(long)]
    day: Option<String>,
    /// Month of birth (1-12)
    #[arg(long)]
    month: Option<String>,
    /// Year of birth
    #[arg(long)]
    year: Option<String>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    district: Option<String>,
    #[arg(long)]
    province: Option<Province>,
    #[arg(long)]
    country: Option<String>,
    /// Path to a PNG profile image
    #[arg(long)]
    image: Option<PathBuf>,
}

impl Fields {
    fn text(&self) -> [(Field, Option<&String>); 8] {
        [
            (Field::Name, self.name.as_ref()),
            (Field::Email, self.email.as_ref()),
            (Field::Phone, self.phone.as_ref()),
            (Field::Day, self.day.as_ref()),
            (Field::Month, self.month.as_ref()),
            (Field::Year, self.year.as_ref()),
            (Field::City, self.city.as_ref()),
            (Field::District, self.district.as_ref()),
        ]
    }

    /// Feed the given fields into `form`, reporting feedback as it comes. Only a refused
    /// image stops the command; other problems are left for submit to decide.
    fn apply(&self, form: &mut FormController) -> Result<(), ExitCode> {
        for (field, value) in self.text() {
            if let Some(value) = value {
                warn_on_error(field, &form.set_field(field, value.as_str()));
            }
        }

        if let Some(province) = self.province {
            form.select_province(Some(province));
        }

        if let Some(country) = &self.country {
            form.select_country(country.as_str());
        }

        if let Some(path) = &self.image {
            let image = Image::from_path(path).map_err(|e| {
                fail(
                    format!("could not read {}: {e}", path.display()),
                    ExitCode::NoInput,
                )
            })?;

            if let Some(error) = form.select_image(image).error_message() {
                return Err(fail(error, ExitCode::DataErr));
            }
        }

        Ok(())
    }
}

fn warn_on_error(field: Field, feedback: &Feedback) {
    if let Some(error) = feedback.error_message() {
        eprintln!("{} {field}: {error}", "warning:".yellow().bold());
    }
}

fn warn_dropped(dropped: &[Field]) {
    for field in dropped {
        eprintln!(
            "{} {field}: not a valid value, left out of the date of birth",
            "warning:".yellow().bold()
        );
    }
}

pub fn add(repo: &Repository, default_country: &str, fields: &Fields) -> ExitCode {
    let mut form = FormController::new(default_country);

    if let Err(code) = fields.apply(&mut form) {
        return code;
    }

    submit(repo, &mut form)
}

pub fn edit(repo: &Repository, default_country: &str, id: u64, fields: &Fields) -> ExitCode {
    let id = RecordId::from(id);
    let Some(record) = repo.record(id) else {
        return fail(format!("no record with id {id}"), ExitCode::NoInput);
    };

    let mut form = FormController::new(default_country);
    form.begin_edit(&record);

    if let Err(code) = fields.apply(&mut form) {
        return code;
    }

    submit(repo, &mut form)
}

pub fn delete(repo: &Repository, id: u64) -> ExitCode {
    match repo.remove_record(RecordId::from(id)) {
        Ok(record) => {
            println!("Deleted record {} ({})", record.id(), record.name);
            ExitCode::Ok
        }
        Err(e) => fail(e, ExitCode::NoInput),
    }
}

fn submit(repo: &Repository, form: &mut FormController) -> ExitCode {
    match form.submit(repo) {
        Ok(Submission::Created { record, dropped }) => {
            warn_dropped(&dropped);
            println!("{} record {}", "Created".green(), record.id());
            ExitCode::Ok
        }
        Ok(Submission::Updated { record, dropped }) => {
            warn_dropped(&dropped);
            println!("{} record {}", "Updated".green(), record.id());
            ExitCode::Ok
        }
        Ok(Submission::Rejected(errors)) => {
            for (field, error) in errors.iter() {
                eprintln!("{} {field}: {error}", "error:".red().bold());
            }
            ExitCode::DataErr
        }
        Err(e) => fail(e, ExitCode::IoErr),
    }
}
