//! Search, sort and pagination over the record sequence.
//!
//! A [`Page`] is always derived from scratch as `(records, query) -> page`; nothing here caches
//! results, so the view can never drift from the store.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString};

use crate::repository::Record;

pub const PAGE_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    fn flip(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, EnumIter, EnumString,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SortColumn {
    Name,
    Email,
    Phone,
    /// Day of birth, compared numerically
    Day,
    City,
    District,
    Province,
    Country,
}

impl SortColumn {
    fn compare(self, a: &Record, b: &Record) -> Ordering {
        match self {
            SortColumn::Name => a.name.cmp(&b.name),
            SortColumn::Email => a.email.cmp(&b.email),
            SortColumn::Phone => a.phone.cmp(&b.phone),
            SortColumn::Day => a.date_of_birth.day.cmp(&b.date_of_birth.day),
            SortColumn::City => a.city.cmp(&b.city),
            SortColumn::District => a.district.cmp(&b.district),
            SortColumn::Province => {
                let name = |r: &Record| r.province.map(|p| p.as_ref().to_string());
                name(a).cmp(&name(b))
            }
            SortColumn::Country => a.country.cmp(&b.country),
        }
    }
}

/// Which column the table is ordered by, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    column: Option<SortColumn>,
    direction: SortDirection,
}

impl SortState {
    pub fn by(column: SortColumn, direction: SortDirection) -> Self {
        Self {
            column: Some(column),
            direction,
        }
    }

    pub fn column(&self) -> Option<SortColumn> {
        self.column
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    pub fn toggle(&self, column: SortColumn) -> Self {
        if self.column == Some(column) {
            Self {
                column: Some(column),
                direction: self.direction.flip(),
            }
        } else {
            // A different column than the currently sorted one has been selected
            Self {
                column: Some(column),
                ..Default::default()
            }
        }
    }

    /// Direction to show next to `column`'s header, if it is the sorted one.
    pub fn indicator(&self, column: SortColumn) -> Option<SortDirection> {
        (self.column == Some(column)).then_some(self.direction)
    }

    // `sort_by` is stable, so ties keep their filtered order in both directions.
    fn sort(&self, rows: &mut [Row]) {
        let Some(column) = self.column else {
            return;
        };

        rows.sort_by(|a, b| {
            let ordering = column.compare(&a.record, &b.record);
            match self.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
    }
}

/// Search text, ordering and page cursor for a record table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    search: String,
    sort: SortState,
    page: usize,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            search: String::new(),
            sort: SortState::default(),
            page: 1,
        }
    }
}

impl Query {
    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn sort(&self) -> SortState {
        self.sort
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Changing the search text leaves the page cursor where it is.
    pub fn set_search(&mut self, text: impl Into<String>) {
        self.search = text.into();
    }

    pub fn set_sort(&mut self, sort: SortState) {
        self.sort = sort;
    }

    /// Sort by `column`, flipping the direction if it is already the sorted column.
    pub fn toggle_sort(&mut self, column: SortColumn) {
        self.sort = self.sort.toggle(column);
    }

    /// Move the cursor to `page`. Pages are 1-based; zero is treated as the first page.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    /// Advance one page. Does nothing on the last page.
    pub fn next_page(&mut self, records: &[Record]) -> bool {
        if self.page < self.apply(records).total_pages() {
            self.page = self.page.saturating_add(1);
            true
        } else {
            false
        }
    }

    /// Go back one page. Does nothing on the first page.
    pub fn previous_page(&mut self) -> bool {
        if self.page > 1 {
            self.page = self.page.saturating_sub(1);
            true
        } else {
            false
        }
    }

    /// Called after a record was deleted: if that left the current page empty and it isn't the
    /// first page, retreat by one.
    pub fn after_delete(&mut self, records: &[Record]) {
        if self.page > 1 && self.apply(records).is_empty() {
            self.page = self.page.saturating_sub(1);
        }
    }

    /// Filter, sort and paginate `records`.
    pub fn apply(&self, records: &[Record]) -> Page {
        let mut rows = filter(records, &self.search);
        self.sort.sort(&mut rows);

        let matched = rows.len();
        let total_pages = matched.div_ceil(PAGE_SIZE).max(1);
        let start = self.page.saturating_sub(1).saturating_mul(PAGE_SIZE);

        Page {
            rows: rows.into_iter().skip(start).take(PAGE_SIZE).collect(),
            page: self.page,
            total_pages,
            matched,
        }
    }
}

/// Keep records whose name contains `search`, ignoring case. Empty search keeps everything.
fn filter(records: &[Record], search: &str) -> Vec<Row> {
    let needle = search.to_lowercase();

    records
        .iter()
        .enumerate()
        .filter(|(_, record)| record.name.to_lowercase().contains(&needle))
        .map(|(position, record)| Row {
            position,
            record: record.clone(),
        })
        .collect()
}

/// A displayed record together with its position in the full sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub position: usize,
    pub record: Record,
}

/// One page of the derived view.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    rows: Vec<Row>,
    page: usize,
    total_pages: usize,
    matched: usize,
}

impl Page {
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Never less than one, even when nothing matched.
    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    /// Number of records that passed the search filter.
    pub fn matched(&self) -> usize {
        self.matched
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn indicator(&self) -> String {
        format!("Page {} of {}", self.page, self.total_pages)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::repository::{DateOfBirth, RecordData, RecordId};

    fn record(id: u64, name: &str) -> Record {
        Record::new(
            RecordId::from(id),
            RecordData {
                name: name.into(),
                email: format!("{}@example.com", name.to_lowercase()),
                phone: "1234567".into(),
                ..Default::default()
            },
        )
    }

    fn records(names: &[&str]) -> Vec<Record> {
        (0u64..)
            .zip(names)
            .map(|(id, name)| record(id, name))
            .collect()
    }

    fn names(page: &Page) -> Vec<&str> {
        page.rows().iter().map(|row| row.record.name.as_str()).collect()
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let records = records(&["John", "Joana", "Mike"]);
        let mut query = Query::default();

        query.set_search("jo");
        assert_eq!(names(&query.apply(&records)), ["John", "Joana"]);

        query.set_search("JO");
        assert_eq!(names(&query.apply(&records)), ["John", "Joana"]);

        query.set_search("");
        assert_eq!(query.apply(&records).matched(), 3);
    }

    #[test]
    fn test_rows_keep_absolute_position() {
        let records = records(&["John", "Mike", "Joana"]);
        let mut query = Query::default();
        query.set_search("jo");

        let positions: Vec<usize> = query
            .apply(&records)
            .rows()
            .iter()
            .map(|row| row.position)
            .collect();
        assert_eq!(positions, [0, 2]);
    }

    #[test]
    fn test_sort_toggle() {
        let records = records(&["Cara", "Abe", "Bea"]);
        let mut query = Query::default();

        assert_eq!(names(&query.apply(&records)), ["Cara", "Abe", "Bea"]);

        query.toggle_sort(SortColumn::Name);
        let ascending = names(&query.apply(&records))
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>();
        assert_eq!(ascending, ["Abe", "Bea", "Cara"]);

        query.toggle_sort(SortColumn::Name);
        assert_eq!(query.sort().direction(), SortDirection::Descending);
        assert_eq!(names(&query.apply(&records)), ["Cara", "Bea", "Abe"]);

        query.toggle_sort(SortColumn::Name);
        assert_eq!(names(&query.apply(&records)), ascending);
    }

    #[test]
    fn test_new_column_resets_to_ascending() {
        let mut sort = SortState::by(SortColumn::Name, SortDirection::Descending);

        sort = sort.toggle(SortColumn::City);

        assert_eq!(sort.column(), Some(SortColumn::City));
        assert_eq!(sort.direction(), SortDirection::Ascending);
        assert_eq!(sort.indicator(SortColumn::Name), None);
        assert_eq!(sort.indicator(SortColumn::City), Some(SortDirection::Ascending));
    }

    #[test]
    fn test_sort_is_stable() {
        let records: Vec<Record> = records(&["A", "B", "C"])
            .into_iter()
            .map(|r| {
                let data = RecordData {
                    city: "Pokhara".into(),
                    ..r.data().clone()
                };
                Record::new(r.id(), data)
            })
            .collect();

        let mut query = Query::default();
        query.set_sort(SortState::by(SortColumn::City, SortDirection::Descending));

        assert_eq!(names(&query.apply(&records)), ["A", "B", "C"]);
    }

    #[test]
    fn test_day_sorts_numerically() {
        let with_day = |id, name: &str, day| {
            let r = record(id, name);
            Record::new(
                r.id(),
                RecordData {
                    date_of_birth: DateOfBirth {
                        day: Some(day),
                        ..Default::default()
                    },
                    ..r.data().clone()
                },
            )
        };
        let records = vec![with_day(0, "Ten", 10), with_day(1, "Two", 2), with_day(2, "Thirty", 30)];

        let mut query = Query::default();
        query.toggle_sort(SortColumn::Day);

        assert_eq!(names(&query.apply(&records)), ["Two", "Ten", "Thirty"]);
    }

    #[test]
    fn test_pagination() {
        let records = records(&["R1", "R2", "R3", "R4", "R5", "R6"]);
        let mut query = Query::default();

        let first = query.apply(&records);
        assert_eq!(names(&first), ["R1", "R2", "R3", "R4", "R5"]);
        assert_eq!(first.total_pages(), 2);
        assert_eq!(first.indicator(), "Page 1 of 2");
        assert!(!first.has_previous());
        assert!(first.has_next());

        assert!(query.next_page(&records));
        assert_eq!(names(&query.apply(&records)), ["R6"]);

        assert!(!query.next_page(&records));
        assert_eq!(query.page(), 2);

        assert!(query.previous_page());
        assert!(!query.previous_page());
        assert_eq!(query.page(), 1);
    }

    #[test]
    fn test_empty_has_one_page() {
        let page = Query::default().apply(&[]);

        assert!(page.is_empty());
        assert_eq!(page.total_pages(), 1);
        assert_eq!(page.indicator(), "Page 1 of 1");
    }

    #[test]
    fn test_delete_last_on_page_retreats() {
        let mut records = records(&["R1", "R2", "R3", "R4", "R5", "R6"]);
        let mut query = Query::default();
        query.next_page(&records);

        records.remove(5);
        query.after_delete(&records);

        assert_eq!(query.page(), 1);
        assert_eq!(names(&query.apply(&records)), ["R1", "R2", "R3", "R4", "R5"]);
    }

    #[test]
    fn test_delete_keeps_page_when_not_empty() {
        let mut records = records(&["R1", "R2", "R3", "R4", "R5", "R6", "R7"]);
        let mut query = Query::default();
        query.next_page(&records);

        records.remove(6);
        query.after_delete(&records);

        assert_eq!(query.page(), 2);
    }

    #[test]
    fn test_search_does_not_reset_page() {
        let records = records(&["R1", "R2", "R3", "R4", "R5", "R6"]);
        let mut query = Query::default();
        query.next_page(&records);

        query.set_search("R1");
        let page = query.apply(&records);

        assert_eq!(page.page(), 2);
        assert!(page.is_empty());
        assert_eq!(page.total_pages(), 1);
    }
}
