//! Catalog endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{error::AppResult, models::Work};

#[derive(Debug, Deserialize, IntoParams)]
pub struct TitleQuery {
    /// Exact title, case-insensitive
    pub title: String,
}

/// List the whole catalog
#[utoipa::path(
    get,
    path = "/works",
    tag = "works",
    responses(
        (status = 200, description = "All works with availability", body = Vec<Work>)
    )
)]
pub async fn list_works(State(state): State<crate::AppState>) -> Json<Vec<Work>> {
    Json(state.services.catalog.list().await)
}

/// Find a work by title
#[utoipa::path(
    get,
    path = "/works/search",
    tag = "works",
    params(TitleQuery),
    responses(
        (status = 200, description = "First work with that title", body = Work),
        (status = 404, description = "No work with that title")
    )
)]
pub async fn search_works(
    State(state): State<crate::AppState>,
    Query(query): Query<TitleQuery>,
) -> AppResult<Json<Work>> {
    let work = state.services.catalog.find_by_title(&query.title).await?;
    Ok(Json(work))
}

/// Get a work by ID
#[utoipa::path(
    get,
    path = "/works/{id}",
    tag = "works",
    params(
        ("id" = i32, Path, description = "Work ID")
    ),
    responses(
        (status = 200, description = "Work details", body = Work),
        (status = 404, description = "Work not found")
    )
)]
pub async fn get_work(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Work>> {
    let work = state.services.catalog.find_by_id(id).await?;
    Ok(Json(work))
}
