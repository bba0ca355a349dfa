//! The country reference list offered by the form's country selector.
//!
//! The list is fetched once, asynchronously, while the rest of the form stays usable. Until it
//! arrives, or if fetching fails, only the default country is offered.

use std::{
    fmt::Display,
    future::Future,
    sync::{Arc, Weak},
};

use parking_lot::RwLock;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_COUNTRY: &str = "Nepal";

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to fetch the country list: {0}")]
    Http(#[from] reqwest::Error),
}

/// Anything that can produce the list of country names.
pub trait CountrySource {
    type Error: Display;

    fn fetch(&self) -> impl Future<Output = std::result::Result<Vec<String>, Self::Error>> + Send;
}

/// Fetches country names from a REST endpoint shaped like `[{ "name": { "common": ".." } }]`.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct CountryEntry {
    name: CountryName,
}

#[derive(Debug, Deserialize)]
struct CountryName {
    common: String,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

impl CountrySource for HttpSource {
    type Error = Error;

    async fn fetch(&self) -> Result<Vec<String>> {
        let entries: Vec<CountryEntry> = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(common_names(entries))
    }
}

/// Common names in the order the endpoint returned them.
fn common_names(entries: Vec<CountryEntry>) -> Vec<String> {
    entries.into_iter().map(|e| e.name.common).collect()
}

/// Handle to a catalog shared between the form and the task filling it
pub type CatalogHandle = Arc<RwLock<CountryCatalog>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryCatalog {
    names: Vec<String>,
    default: String,
}

impl CountryCatalog {
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            names: Vec::new(),
            default: default.into(),
        }
    }

    pub fn handle(default: impl Into<String>) -> CatalogHandle {
        Arc::new(RwLock::new(Self::new(default)))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn default_country(&self) -> &str {
        &self.default
    }

    /// The selector's options: the fetched names, with the default in front if it wasn't among
    /// them.
    pub fn options(&self) -> Vec<String> {
        let mut options = Vec::with_capacity(self.names.len().saturating_add(1));
        if !self.names.contains(&self.default) {
            options.push(self.default.clone());
        }
        options.extend(self.names.iter().cloned());
        options
    }

    pub fn set_names(&mut self, names: Vec<String>) {
        self.names = names;
    }
}

/// Fill `catalog` from `source`.
///
/// Only a weak handle is held while the fetch is in flight. If the owner dropped the catalog
/// in the meantime the result is discarded instead of being written into a dead component.
/// Returns whether the catalog was updated.
pub async fn refresh<S: CountrySource>(catalog: Weak<RwLock<CountryCatalog>>, source: S) -> bool {
    let names = match source.fetch().await {
        Ok(names) => names,
        Err(e) => {
            warn!("Error fetching countries: {e}");
            return false;
        }
    };

    match catalog.upgrade() {
        Some(catalog) => {
            debug!("Loaded {} countries", names.len());
            catalog.write().set_names(names);
            true
        }
        None => {
            debug!("Country catalog dropped before the fetch finished, discarding result");
            false
        }
    }
}
