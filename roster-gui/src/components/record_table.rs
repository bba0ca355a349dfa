use iced::{
    Element, Length, Task,
    widget::{button, column, row, scrollable, space, table, text, text_input},
};
use roster_lib::{
    Page, Query, Repository, SortColumn, SortDirection,
    query::Row,
    repository::{Record, RecordId},
};
use tracing::debug;

#[derive(Debug, Clone)]
pub enum Message {
    SearchChanged(String),
    SortChanged(SortColumn),
    PreviousPage,
    NextPage,
    EditPressed(RecordId),
    DeletePressed(RecordId),
}

/// Action used for communicating with the parent component
#[derive(Debug)]
pub enum Action {
    None,
    /// The user wants to edit this record in the form
    Edit(Record),
    Deleted(RecordId),
}

pub struct RecordTable {
    repo: Repository,
    query: Query,
    page: Page,
    error: Option<String>,
}

impl RecordTable {
    pub fn new(repo: Repository) -> (Self, Task<Message>) {
        let query = Query::default();
        let page = repo.page(&query);

        (
            Self {
                repo,
                query,
                page,
                error: None,
            },
            Task::none(),
        )
    }

    /// Recompute the visible page after the records changed elsewhere.
    pub fn refresh(&mut self) {
        self.page = self.repo.page(&self.query);
    }

    pub fn update(&mut self, message: Message) -> Action {
        let action = match message {
            Message::SearchChanged(search) => {
                self.query.set_search(search);
                Action::None
            }
            Message::SortChanged(column) => {
                self.query.toggle_sort(column);
                Action::None
            }
            Message::PreviousPage => {
                self.query.previous_page();
                Action::None
            }
            Message::NextPage => {
                self.query.next_page(&self.repo.records());
                Action::None
            }
            Message::EditPressed(id) => match self.repo.record(id) {
                Some(record) => Action::Edit(record),
                None => {
                    self.error = Some(format!("Record {id} no longer exists"));
                    Action::None
                }
            },
            Message::DeletePressed(id) => match self.repo.remove_from_view(id, &mut self.query) {
                Ok(record) => {
                    debug!("Deleted record {}", record.id());
                    self.error = None;
                    Action::Deleted(id)
                }
                Err(e) => {
                    self.error = Some(e.to_string());
                    Action::None
                }
            },
        };

        self.refresh();
        action
    }

    pub fn view(&self) -> Element<'_, Message> {
        let sort = self.query.sort();

        let columns = [
            table::column(
                column_header("Name", sort.indicator(SortColumn::Name), SortColumn::Name),
                |row: Row| text(row.record.name.clone()),
            ),
            table::column(
                column_header("Email", sort.indicator(SortColumn::Email), SortColumn::Email),
                |row: Row| text(row.record.email.clone()),
            ),
            table::column(
                column_header("Phone", sort.indicator(SortColumn::Phone), SortColumn::Phone),
                |row: Row| text(row.record.phone.clone()),
            ),
            table::column(
                column_header("DOB", sort.indicator(SortColumn::Day), SortColumn::Day),
                |row: Row| text(row.record.date_of_birth.to_string()),
            ),
            table::column(
                column_header("City", sort.indicator(SortColumn::City), SortColumn::City),
                |row: Row| text(row.record.city.clone()),
            ),
            table::column(
                column_header(
                    "District",
                    sort.indicator(SortColumn::District),
                    SortColumn::District,
                ),
                |row: Row| text(row.record.district.clone()),
            ),
            table::column(
                column_header(
                    "Province",
                    sort.indicator(SortColumn::Province),
                    SortColumn::Province,
                ),
                |row: Row| text(row.record.province.map(|p| p.to_string()).unwrap_or_default()),
            ),
            table::column(
                column_header(
                    "Country",
                    sort.indicator(SortColumn::Country),
                    SortColumn::Country,
                ),
                |row: Row| text(row.record.country.clone()),
            ),
            table::column(text("Image"), |row: Row| {
                text(if row.record.image.is_some() { "PNG" } else { "-" })
            }),
            table::column(text("Actions"), |row: Row| {
                let id = row.record.id();
                row![
                    button("Edit")
                        .style(button::secondary)
                        .on_press(Message::EditPressed(id)),
                    button("Delete")
                        .style(button::danger)
                        .on_press(Message::DeletePressed(id)),
                ]
                .spacing(4)
            }),
        ];

        let body: Element<'_, Message> = if self.page.is_empty() {
            text("No records found.").into()
        } else {
            scrollable(table(columns, self.page.rows().to_vec()).width(Length::Fill)).into()
        };

        let mut content = column![
            row![
                text("Records").size(24),
                space::horizontal(),
                text_input("Search by name...", self.query.search())
                    .on_input(Message::SearchChanged)
                    .width(Length::Fixed(240.0)),
            ]
            .spacing(8),
            body,
            row![
                button("Previous").on_press_maybe(
                    self.page
                        .has_previous()
                        .then_some(Message::PreviousPage)
                ),
                space::horizontal(),
                text(self.page.indicator()),
                space::horizontal(),
                button("Next").on_press_maybe(self.page.has_next().then_some(Message::NextPage)),
            ],
        ]
        .spacing(12);

        if let Some(error) = &self.error {
            content = content.push(text(error).style(text::danger));
        }

        content.width(Length::Fill).padding(20).into()
    }
}

fn column_header<'a>(
    name: &'a str,
    direction: Option<SortDirection>,
    column: SortColumn,
) -> Element<'a, Message> {
    let indicator = match direction {
        Some(SortDirection::Ascending) => "▲",
        Some(SortDirection::Descending) => "▼",
        None => "",
    };

    button(row![text(name), space::horizontal(), text(indicator)])
        .style(button::subtle)
        .width(Length::Fill)
        .on_press(Message::SortChanged(column))
        .into()
}
