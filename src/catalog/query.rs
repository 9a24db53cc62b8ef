//! The query value every catalog view is derived from.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::catalog::repo_types::{CharacterCategory, CharacterStatus, EntryType};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryParseError {
    #[error("unrecognised {field} `{value}`")]
    Unrecognised { field: &'static str, value: String },
}

impl QueryParseError {
    pub fn unrecognised(field: &'static str, value: &str) -> Self {
        QueryParseError::Unrecognised {
            field,
            value: value.to_owned(),
        }
    }
}

/// A categorical filter: either the `all` sentinel or one exact value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<T> {
    All,
    Only(T),
}

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Selection::All
    }
}

impl<T> Selection<T> {
    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    /// An item without the attribute never passes an active filter.
    pub fn admits<U>(&self, value: Option<&U>) -> bool
    where
        U: ?Sized,
        T: PartialEq<U>,
    {
        match self {
            Selection::All => true,
            Selection::Only(wanted) => value.is_some_and(|v| wanted == v),
        }
    }
}

impl<T> FromStr for Selection<T>
where
    T: FromStr,
{
    type Err = T::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return Ok(Selection::All);
        }
        trimmed.parse().map(Selection::Only)
    }
}

impl<T: fmt::Display> fmt::Display for Selection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => f.write_str("all"),
            Selection::Only(value) => value.fmt(f),
        }
    }
}

impl<T: fmt::Display> Serialize for Selection<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de, T> Deserialize<'de> for Selection<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[serde(alias = "name")]
    Title,
    Phase,
    #[default]
    Release,
    /// Always descending, whatever the order says.
    Rating,
    /// Story order of the timeline.
    Chronological,
    FirstAppearance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    #[serde(alias = "ascending")]
    Asc,
    #[serde(alias = "descending")]
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Query {
    pub search: String,
    #[serde(rename = "type")]
    pub kind: Selection<EntryType>,
    pub phase: Selection<String>,
    pub year: Selection<i32>,
    pub status: Selection<CharacterStatus>,
    pub category: Selection<CharacterCategory>,
    pub sort: SortField,
    pub order: SortOrder,
    /// Group the result by phase label.
    pub grouped: bool,
    /// The view's resting sort; `release` unless the view says otherwise.
    #[serde(skip)]
    pub baseline: SortField,
}

impl Query {
    /// Cleared query for a view whose resting sort is `baseline`.
    pub fn for_view(baseline: SortField) -> Self {
        Query {
            sort: baseline,
            baseline,
            ..Query::default()
        }
    }

    /// Back to `all` filters, empty search, the view's sort ascending. Grouping is a display
    /// choice and stays.
    pub fn clear_filters(&mut self) {
        *self = Query {
            grouped: self.grouped,
            ..Query::for_view(self.baseline)
        };
    }

    pub fn has_active_filters(&self) -> bool {
        !self.search.is_empty()
            || !self.kind.is_all()
            || !self.phase.is_all()
            || !self.year.is_all()
            || !self.status.is_all()
            || !self.category.is_all()
            || self.sort != self.baseline
            || self.order != SortOrder::Asc
    }
}

#[cfg(test)]
impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = term.into();
        self
    }

    pub fn with_type(mut self, kind: EntryType) -> Self {
        self.kind = Selection::Only(kind);
        self
    }

    pub fn with_phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = Selection::Only(phase.into());
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Selection::Only(year);
        self
    }

    pub fn with_status(mut self, status: CharacterStatus) -> Self {
        self.status = Selection::Only(status);
        self
    }

    pub fn sorted_by(mut self, sort: SortField, order: SortOrder) -> Self {
        self.sort = sort;
        self.order = order;
        self
    }

    pub fn grouped(mut self) -> Self {
        self.grouped = true;
        self
    }
}
