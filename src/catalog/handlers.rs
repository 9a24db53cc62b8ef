use std::sync::Arc;

use axum::{
    extract::{Query as QueryString, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::{
    catalog::{
        dto::{FacetsResponse, ListResponse, QueryParams, TimelineParams, TimelineResponse},
        query::{Query, QueryParseError, SortField},
        repo::Catalog,
        services::{self, Searchable},
    },
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/catalog/entries", get(list_entries))
        .route("/catalog/characters", get(list_characters))
        .route("/catalog/timeline", get(timeline))
        .route("/catalog/facets", get(facets))
}

fn bad_query(err: QueryParseError) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, err.to_string())
}

fn list_view<T: Searchable + Serialize>(items: &[T], query: &Query) -> Response {
    let matched = services::filter_and_sort(items, query);
    debug!(matched = matched.len(), "catalog query");
    let stats = services::stats(&matched);
    let (items, groups) = if query.grouped {
        (None, Some(services::group_by_phase(&matched)))
    } else {
        (Some(matched), None)
    };
    Json(ListResponse {
        stats,
        has_active_filters: query.has_active_filters(),
        items,
        groups,
    })
    .into_response()
}

#[instrument(skip(catalog))]
pub async fn list_entries(
    State(catalog): State<Arc<Catalog>>,
    QueryString(params): QueryString<QueryParams>,
) -> Result<Response, (StatusCode, String)> {
    let query = params.into_query(SortField::Release).map_err(bad_query)?;
    Ok(list_view(catalog.entries(), &query))
}

#[instrument(skip(catalog))]
pub async fn list_characters(
    State(catalog): State<Arc<Catalog>>,
    QueryString(params): QueryString<QueryParams>,
) -> Result<Response, (StatusCode, String)> {
    let query = params.into_query(SortField::Title).map_err(bad_query)?;
    Ok(list_view(catalog.characters(), &query))
}

#[instrument(skip(catalog))]
pub async fn timeline(
    State(catalog): State<Arc<Catalog>>,
    QueryString(params): QueryString<TimelineParams>,
) -> Result<Response, (StatusCode, String)> {
    let mode = params.mode;
    let query = params.into_query().map_err(bad_query)?;
    let items = services::timeline(catalog.entries(), mode, &query);
    Ok(Json(TimelineResponse {
        mode,
        total: items.len(),
        items,
    })
    .into_response())
}

#[instrument(skip(catalog))]
pub async fn facets(State(catalog): State<Arc<Catalog>>) -> Json<FacetsResponse> {
    Json(FacetsResponse {
        entries: services::entry_facets(catalog.entries()),
        characters: services::character_facets(catalog.characters()),
    })
}
