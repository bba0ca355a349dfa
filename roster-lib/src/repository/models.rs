use std::{
    fmt::{self, Display, Formatter},
    fs, io,
    path::Path,
};

use chrono::Datelike;
use derive_more::{Deref, From};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumString};

use crate::validation::MIN_YEAR;

/// Stable identifier of a [`Record`]. Allocated once and never reused.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    derive_more::Display,
    From,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// One stored entry. Dereferences to its [`RecordData`].
#[derive(Debug, Clone, PartialEq, Deref, Serialize, Deserialize)]
pub struct Record {
    id: RecordId,
    #[deref]
    #[serde(flatten)]
    data: RecordData,
}

impl Record {
    pub(crate) fn new(id: RecordId, data: RecordData) -> Self {
        Self { id, data }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn data(&self) -> &RecordData {
        &self.data
    }
}

/// The user supplied fields of a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordData {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub date_of_birth: DateOfBirth,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub province: Option<Province>,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub image: Option<Image>,
}

/// Date parts are independent; no calendar cross-check is made, so 31/2 is accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateOfBirth {
    pub day: Option<u8>,
    pub month: Option<u8>,
    pub year: Option<u16>,
}

impl DateOfBirth {
    /// Build from raw form text. Parts that don't parse or fall outside their range are dropped.
    pub fn parse(day: &str, month: &str, year: &str) -> Self {
        let current_year = u16::try_from(chrono::Local::now().year()).unwrap_or(u16::MAX);
        let min_year = u16::try_from(MIN_YEAR).unwrap_or_default();

        Self {
            day: parse_in(day, 1, 31),
            month: parse_in(month, 1, 12),
            year: parse_in(year, min_year, current_year),
        }
    }
}

fn parse_in<T>(value: &str, min: T, max: T) -> Option<T>
where
    T: std::str::FromStr + PartialOrd,
{
    value
        .trim()
        .parse::<T>()
        .ok()
        .filter(|n| *n >= min && *n <= max)
}

fn part<T: Display>(part: Option<T>) -> String {
    part.map(|p| p.to_string()).unwrap_or_default()
}

impl Display for DateOfBirth {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.day.is_none() && self.month.is_none() && self.year.is_none() {
            return Ok(());
        }

        write!(
            f,
            "{}-{}-{}",
            part(self.day),
            part(self.month),
            part(self.year)
        )
    }
}

/// The seven provinces a record can be filed under.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    AsRefStr,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum Province {
    Koshi,
    Madhesh,
    Bagmati,
    Gandaki,
    Lumbini,
    Karnali,
    Sudurpashchim,
}

/// An uploaded profile image. The bytes are kept so the image survives a reload of the
/// store; they are written out as base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    media_type: String,
    #[serde(with = "base64_data")]
    data: Vec<u8>,
}

impl Image {
    pub fn new(media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            media_type: media_type.into(),
            data,
        }
    }

    /// Read an image from disk. The media type is declared from the file extension, the same
    /// way a file picker reports it.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let media_type = match extension.as_deref() {
            Some("png") => "image/png",
            Some("jpg" | "jpeg") => "image/jpeg",
            Some("gif") => "image/gif",
            Some("webp") => "image/webp",
            Some("bmp") => "image/bmp",
            Some("svg") => "image/svg+xml",
            _ => "application/octet-stream",
        };

        Ok(Self::new(media_type, fs::read(path)?))
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

mod base64_data {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(D::Error::custom)
    }
}
