//! Shelf views. Assigning a location lives under `/orders`.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use utoipa::IntoParams;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    core::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
    },
    workflows::storage::{self, StorageBox, StorageStats, StoredPair},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/storage",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(search_storage))
            .routes(utoipa_axum::routes!(storage_map))
            .routes(utoipa_axum::routes!(missing_locations))
            .routes(utoipa_axum::routes!(storage_stats)),
    )
}

#[derive(Deserialize, Debug, IntoParams)]
#[into_params(parameter_in = Query)]
struct StorageSearch {
    /// Part of a box name or location code
    q: String,
}

#[utoipa::path(
    get,
    path = "/search",
    tags = ["Storage"],
    params(StorageSearch),
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Matching pairs", body = StdResponse<Vec<StoredPair>, String>),
        (status = 400, description = "Empty search term")
    )
)]
async fn search_storage(
    State(state): State<AppState>,
    Query(search): Query<StorageSearch>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;
    let pairs = storage::search(conn, &search.q).await?;

    Ok(StdResponse {
        data: Some(pairs),
        message: Some("Search storage successfully"),
    })
}

#[utoipa::path(
    get,
    path = "/map",
    tags = ["Storage"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Shelved pairs of open orders by box", body = StdResponse<Vec<StorageBox>, String>)
    )
)]
async fn storage_map(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;
    let boxes = storage::occupancy_map(conn).await?;

    Ok(StdResponse {
        data: Some(boxes),
        message: Some("Get storage map successfully"),
    })
}

#[utoipa::path(
    get,
    path = "/missing",
    tags = ["Storage"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Pairs of open orders without a location", body = StdResponse<Vec<StoredPair>, String>)
    )
)]
async fn missing_locations(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;
    let pairs = storage::missing_locations(conn).await?;

    Ok(StdResponse {
        data: Some(pairs),
        message: Some("Get pairs without location successfully"),
    })
}

#[utoipa::path(
    get,
    path = "/stats",
    tags = ["Storage"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Storage statistics", body = StdResponse<StorageStats, String>)
    )
)]
async fn storage_stats(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;
    let stats = storage::stats(conn).await?;

    Ok(StdResponse {
        data: Some(stats),
        message: Some("Get storage stats successfully"),
    })
}
