use std::{fs, io};

use roster_lib::fs::config_dir;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::theme::Theme;

pub mod theme;

const FILE_NAME: &str = "gui.toml";

/// The frontend's configuration, serialized to TOML.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct GuiConfig {
    pub theme: Theme,
}

impl GuiConfig {
    /// Load `gui.toml`, falling back to the defaults (and writing them out) when it is missing
    /// or unreadable.
    pub fn load() -> Self {
        let path = match config_dir() {
            Ok(dir) => dir.join(FILE_NAME),
            Err(e) => {
                warn!("No configuration directory, using defaults: {e}");
                return Self::default();
            }
        };

        if path.exists() {
            fs::read_to_string(&path)
                .ok()
                .and_then(|contents| toml::from_str(&contents).ok())
                .unwrap_or_else(|| {
                    warn!("Ignoring malformed {}", path.display());
                    Self::default()
                })
        } else {
            let cfg = Self::default();
            if let Err(e) = cfg.save() {
                warn!("Failed to write default GUI configuration: {e}");
            }
            cfg
        }
    }

    pub fn save(&self) -> io::Result<()> {
        let contents = toml::to_string_pretty(self).map_err(io::Error::other)?;

        fs::write(config_dir()?.join(FILE_NAME), contents)
    }

    pub fn theme(&self) -> iced::Theme {
        (&self.theme).into()
    }
}
