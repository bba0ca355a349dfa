use std::{path::PathBuf, sync::Arc};

use iced::{
    Element, Length, Task,
    widget::{button, column, combo_box, container, row, space, text, text_input},
};
use roster_lib::{
    FormController, Repository, Submission,
    countries::{self, CatalogHandle, CountryCatalog, HttpSource},
    form::Mode,
    repository::{Image, Province, Record},
    validation::{Feedback, Field},
};
use strum::IntoEnumIterator;
use tracing::debug;

#[derive(Debug, Clone)]
pub enum Message {
    FieldChanged(Field, String),
    ProvinceSelected(Province),
    CountrySelected(String),
    CountriesLoaded(bool),
    ChooseImagePressed,
    ImagePicked(Option<Result<Image, String>>),
    SubmitPressed,
    CancelPressed,
}

/// Action used for communicating with the parent component
#[derive(Debug)]
pub enum Action {
    None,
    Run(Task<Message>),
    /// A record was created or updated
    Saved(Record),
}

pub struct RecordForm {
    repo: Repository,
    controller: FormController,
    catalog: CatalogHandle,
    error: Option<String>,

    // Widget state
    province_options: combo_box::State<Province>,
    country_options: combo_box::State<String>,
}

impl RecordForm {
    pub fn new(repo: Repository) -> (Self, Task<Message>) {
        let (default_country, url) = {
            let cfg = repo.config();
            let cfg = cfg.read();
            (
                cfg.countries().default().clone(),
                cfg.countries().url().clone(),
            )
        };

        let catalog = CountryCatalog::handle(default_country.clone());
        let country_options = combo_box::State::new(catalog.read().options());

        // The form stays usable while this runs; only the country options wait for it
        let task = Task::perform(
            countries::refresh(Arc::downgrade(&catalog), HttpSource::new(url)),
            Message::CountriesLoaded,
        );

        (
            Self {
                repo,
                controller: FormController::new(default_country),
                catalog,
                error: None,
                province_options: combo_box::State::new(Province::iter().collect()),
                country_options,
            },
            task,
        )
    }

    /// Load an existing [`Record`] for editing.
    pub fn load(&mut self, record: &Record) {
        self.controller.begin_edit(record);
        self.error = None;
    }

    pub fn update(&mut self, message: Message) -> Action {
        match message {
            Message::FieldChanged(field, value) => {
                self.controller.set_field(field, value);
                Action::None
            }
            Message::ProvinceSelected(province) => {
                self.controller.select_province(Some(province));
                Action::None
            }
            Message::CountrySelected(country) => {
                self.controller.select_country(country);
                Action::None
            }
            Message::CountriesLoaded(updated) => {
                if updated {
                    self.country_options = combo_box::State::new(self.catalog.read().options());
                }
                Action::None
            }
            Message::ChooseImagePressed => {
                Action::Run(Task::perform(pick_image(), Message::ImagePicked))
            }
            Message::ImagePicked(picked) => {
                match picked {
                    Some(Ok(image)) => {
                        self.controller.select_image(image);
                    }
                    Some(Err(e)) => self.error = Some(e),
                    None => debug!("Image selection cancelled"),
                }
                Action::None
            }
            Message::SubmitPressed => match self.controller.submit(&self.repo) {
                Ok(
                    Submission::Created { record, dropped }
                    | Submission::Updated { record, dropped },
                ) => {
                    self.error = (!dropped.is_empty()).then(|| {
                        let parts: Vec<String> = dropped.iter().map(ToString::to_string).collect();
                        format!("Saved without date of birth {}", parts.join(", "))
                    });
                    Action::Saved(record)
                }
                // Errors are already attached to their fields
                Ok(Submission::Rejected(_)) => Action::None,
                Err(e) => {
                    self.error = Some(e.to_string());
                    Action::None
                }
            },
            Message::CancelPressed => {
                self.controller.reset();
                self.error = None;
                Action::None
            }
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let draft = self.controller.draft();
        let editing = matches!(self.controller.mode(), Mode::Editing(_));

        let mut content = column![
            text("Record Information").size(24),
            self.text_field("Name *", Field::Name),
            self.text_field("Email *", Field::Email),
            self.text_field("Phone Number *", Field::Phone),
            text("Date of Birth"),
            row![
                self.text_field("Day", Field::Day),
                self.text_field("Month", Field::Month),
                self.text_field("Year", Field::Year),
            ]
            .spacing(8),
            self.text_field("City", Field::City),
            self.text_field("District", Field::District),
            text("Province"),
            combo_box(
                &self.province_options,
                "Select a province",
                draft.province().as_ref(),
                Message::ProvinceSelected
            ),
            text("Country"),
            combo_box(
                &self.country_options,
                "Select a country",
                Some(draft.country()),
                Message::CountrySelected
            ),
            row![
                button("Choose PNG image").on_press(Message::ChooseImagePressed),
                text(if draft.image().is_some() {
                    "Image selected"
                } else {
                    "No image"
                }),
            ]
            .spacing(8),
        ]
        .spacing(8);

        if let Some(feedback) = self.controller.feedback(Field::Image) {
            content = content.push(feedback_text(feedback));
        }

        if let Some(error) = &self.error {
            content = content.push(text(error).style(text::danger));
        }

        content = content.push(row![
            space::horizontal(),
            button("Cancel").on_press_maybe(editing.then_some(Message::CancelPressed)),
            button(text(self.controller.submit_label())).on_press(Message::SubmitPressed),
        ]
        .spacing(8));

        container(content)
            .padding(20)
            .width(Length::Fixed(420.0))
            .style(container::rounded_box)
            .into()
    }

    fn text_field<'a>(&'a self, label: &'a str, field: Field) -> Element<'a, Message> {
        let mut content = column![
            text(label),
            text_input(label, self.controller.draft().text(field))
                .on_input(move |value| Message::FieldChanged(field, value)),
        ]
        .spacing(4);

        if let Some(feedback) = self.controller.feedback(field) {
            content = content.push(feedback_text(feedback));
        }

        content.into()
    }
}

fn feedback_text(feedback: &Feedback) -> Element<'_, Message> {
    match (feedback.error_message(), feedback.success_message()) {
        (Some(error), _) => text(error).style(text::danger).into(),
        (None, Some(success)) => text(success).style(text::success).into(),
        (None, None) => space::vertical().height(0).into(),
    }
}

async fn pick_image() -> Option<Result<Image, String>> {
    let handle = rfd::AsyncFileDialog::new()
        .add_filter("Images", &["png", "jpg", "jpeg", "gif", "webp"])
        .pick_file()
        .await?;

    let path: PathBuf = handle.path().to_path_buf();
    Some(Image::from_path(&path).map_err(|e| format!("Could not read {}: {e}", path.display())))
}
