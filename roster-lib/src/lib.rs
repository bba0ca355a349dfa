//! Record management engine for Roster.
//!
//! Holds everything with actual behaviour: field validation, the persisted record store, the
//! search/sort/paginate pipeline and the form controller that ties them together. The CLI and
//! GUI crates are thin surfaces over these types.

use thiserror::Error;

pub mod countries;
pub mod form;
pub mod fs;
pub mod query;
pub mod repository;
pub mod validation;

pub use form::{FormController, Submission};
pub use query::{Page, Query, SortColumn, SortDirection};
pub use repository::{Record, RecordData, RecordId, Repository};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Repository(#[from] repository::Error),
    #[error(transparent)]
    Config(#[from] repository::config::Error),
    #[error(transparent)]
    Countries(#[from] countries::Error),
}
