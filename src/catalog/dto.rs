use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalog::{
    query::{Query, QueryParseError, Selection, SortField, SortOrder},
    services::{CharacterFacets, EntryFacets, PhaseGroup, TimelineItem, TimelineMode, ViewStats},
};

/// Raw query string; every filter may be omitted or `all`.
#[derive(Debug, Default, Deserialize)]
pub struct QueryParams {
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub phase: Option<String>,
    pub year: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub sort: Option<SortField>,
    pub order: Option<SortOrder>,
    #[serde(default)]
    pub grouped: bool,
    /// Drop every filter and sort, keeping only `grouped`.
    #[serde(default)]
    pub reset: bool,
}

fn selection<T: FromStr>(
    field: &'static str,
    raw: Option<&str>,
) -> Result<Selection<T>, QueryParseError> {
    raw.unwrap_or_default()
        .parse()
        .map_err(|_| QueryParseError::unrecognised(field, raw.unwrap_or_default()))
}

impl QueryParams {
    pub fn into_query(self, default_sort: SortField) -> Result<Query, QueryParseError> {
        let mut query = Query {
            search: self.search.unwrap_or_default(),
            kind: selection("type", self.kind.as_deref())?,
            phase: selection("phase", self.phase.as_deref())?,
            year: selection("year", self.year.as_deref())?,
            status: selection("status", self.status.as_deref())?,
            category: selection("category", self.category.as_deref())?,
            sort: self.sort.unwrap_or(default_sort),
            order: self.order.unwrap_or_default(),
            grouped: self.grouped,
            baseline: default_sort,
        };
        if self.reset {
            query.clear_filters();
        }
        Ok(query)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TimelineParams {
    #[serde(default)]
    pub mode: TimelineMode,
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl TimelineParams {
    pub fn into_query(self) -> Result<Query, QueryParseError> {
        Ok(Query {
            search: self.search.unwrap_or_default(),
            kind: selection("type", self.kind.as_deref())?,
            ..Query::default()
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<'a, T> {
    pub stats: ViewStats,
    pub has_active_filters: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<&'a T>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<PhaseGroup<'a, T>>>,
}

#[derive(Debug, Serialize)]
pub struct TimelineResponse<'a> {
    pub mode: TimelineMode,
    pub total: usize,
    pub items: Vec<TimelineItem<'a>>,
}

#[derive(Debug, Serialize)]
pub struct FacetsResponse {
    pub entries: EntryFacets,
    pub characters: CharacterFacets,
}
