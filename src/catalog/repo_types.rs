use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::Date;

use crate::catalog::query::QueryParseError;

time::serde::format_description!(release_date_format, Date, "[year]-[month]-[day]");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    Movie,
    Series,
    Special,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Movie => "Movie",
            EntryType::Series => "Series",
            EntryType::Special => "Special",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = QueryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movie" => Ok(EntryType::Movie),
            "series" => Ok(EntryType::Series),
            "special" => Ok(EntryType::Special),
            _ => Err(QueryParseError::unrecognised("type", s)),
        }
    }
}

/// One movie, series or special in the seed catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: u32,
    pub chronological_order: u32,
    pub title: String,
    #[serde(with = "release_date_format")]
    pub release_date: Date,
    #[serde(rename = "type")]
    pub kind: EntryType,
    pub phase: String,
    pub description: String,
    pub plot: String,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub cast: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterStatus {
    Active,
    Retired,
    Deceased,
}

impl fmt::Display for CharacterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CharacterStatus::Active => "active",
            CharacterStatus::Retired => "retired",
            CharacterStatus::Deceased => "deceased",
        })
    }
}

impl FromStr for CharacterStatus {
    type Err = QueryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(CharacterStatus::Active),
            "retired" => Ok(CharacterStatus::Retired),
            "deceased" => Ok(CharacterStatus::Deceased),
            _ => Err(QueryParseError::unrecognised("status", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterCategory {
    Hero,
    Antihero,
    Villain,
    Supporting,
}

impl fmt::Display for CharacterCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CharacterCategory::Hero => "hero",
            CharacterCategory::Antihero => "antihero",
            CharacterCategory::Villain => "villain",
            CharacterCategory::Supporting => "supporting",
        })
    }
}

impl FromStr for CharacterCategory {
    type Err = QueryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hero" => Ok(CharacterCategory::Hero),
            "antihero" => Ok(CharacterCategory::Antihero),
            "villain" => Ok(CharacterCategory::Villain),
            "supporting" => Ok(CharacterCategory::Supporting),
            _ => Err(QueryParseError::unrecognised("category", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_name: Option<String>,
    pub description: String,
    #[serde(default)]
    pub powers: Vec<String>,
    #[serde(default)]
    pub affiliation: Vec<String>,
    pub first_appearance: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    pub status: CharacterStatus,
    pub category: CharacterCategory,
    pub phase: String,
    pub rating: u8,
}
