use iced::{
    Element,
    Length::Fill,
    Task, Theme, application,
    widget::{center, row, scrollable, text},
};
use roster_lib::Repository;
use tracing::{Level, error};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::{
    components::{
        record_form::{self, RecordForm},
        record_table::{self, RecordTable},
    },
    config::GuiConfig,
};

pub mod components;
pub mod config;

fn main() -> iced::Result {
    application(App::new, App::update, App::view)
        .theme(App::theme)
        .title(App::title)
        .run()
}

#[derive(Debug, Clone)]
enum Message {
    RecordForm(record_form::Message),
    RecordTable(record_table::Message),
}

enum State {
    /// The record store could not be opened
    Error(String),
    Ready {
        form: RecordForm,
        table: RecordTable,
    },
}

struct App {
    title: String,
    theme: Theme,
    state: State,
}

impl App {
    pub fn new() -> (Self, Task<Message>) {
        // Human friendly panicking in release mode
        human_panic::setup_panic!();

        // Logging
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::TRACE)
            .with_env_filter(EnvFilter::from_default_env())
            .finish();
        if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("Failed to set up logging: {e}");
        }

        let cfg = GuiConfig::load();
        let theme = cfg.theme();

        let (state, task) = match Repository::new() {
            Ok(repo) => {
                let (form, form_task) = RecordForm::new(repo.clone());
                let (table, table_task) = RecordTable::new(repo);

                (
                    State::Ready { form, table },
                    Task::batch([
                        form_task.map(Message::RecordForm),
                        table_task.map(Message::RecordTable),
                    ]),
                )
            }
            Err(e) => {
                error!("Failed to open the record store: {e}");
                (State::Error(e.to_string()), Task::none())
            }
        };

        (
            Self {
                title: "Roster".into(),
                theme,
                state,
            },
            task,
        )
    }

    // Update application state based on messages passed by view()
    pub fn update(&mut self, message: Message) -> Task<Message> {
        let State::Ready { form, table } = &mut self.state else {
            return Task::none();
        };

        // Redirect messages to relevant child components
        match message {
            Message::RecordForm(msg) => match form.update(msg) {
                record_form::Action::None => Task::none(),
                record_form::Action::Run(task) => task.map(Message::RecordForm),
                record_form::Action::Saved(_) => {
                    table.refresh();
                    Task::none()
                }
            },
            Message::RecordTable(msg) => match table.update(msg) {
                record_table::Action::None => Task::none(),
                record_table::Action::Edit(record) => {
                    form.load(&record);
                    Task::none()
                }
                record_table::Action::Deleted(_) => Task::none(),
            },
        }
    }

    // Render the application and pass along messages from components to update()
    pub fn view(&self) -> Element<'_, Message> {
        match &self.state {
            State::Error(e) => center(text(format!("Could not open records: {e}"))).into(),
            State::Ready { form, table } => row![
                scrollable(form.view().map(Message::RecordForm)),
                table.view().map(Message::RecordTable),
            ]
            .spacing(20)
            .padding(20)
            .height(Fill)
            .into(),
        }
    }

    pub fn title(&self) -> String {
        self.title.clone()
    }

    pub fn theme(&self) -> Theme {
        self.theme.clone()
    }
}
