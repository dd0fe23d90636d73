use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
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
    models::{AddressEntity, ClientEntity, CreateClientEntity, UpdateClientEntity},
    repos::clients::{self, NewAddress},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/clients",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(create_client, list_clients))
            .routes(utoipa_axum::routes!(get_client, update_client))
            .routes(utoipa_axum::routes!(add_address, list_addresses)),
    )
}

#[derive(Deserialize, Debug, IntoParams)]
#[into_params(parameter_in = Query)]
struct ClientSearch {
    /// Matches name, phone or email
    q: Option<String>,
}

/// Register a client.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Clients"],
    request_body = CreateClientEntity,
    security(("bearerAuth" = [])),
    responses(
        (status = 201, description = "Client created", body = StdResponse<ClientEntity, String>),
        (status = 400, description = "Missing name")
    )
)]
async fn create_client(
    State(state): State<AppState>,
    Json(body): Json<CreateClientEntity>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;
    let client = clients::create(conn, body).await?;

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(client),
            message: Some("Client created successfully"),
        },
    ))
}

/// List clients, optionally filtered.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Clients"],
    params(ClientSearch),
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Clients", body = StdResponse<Vec<ClientEntity>, String>)
    )
)]
async fn list_clients(
    State(state): State<AppState>,
    Query(search): Query<ClientSearch>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;
    let clients = clients::list(conn, search.q.as_deref()).await?;

    Ok(StdResponse {
        data: Some(clients),
        message: Some("Get clients successfully"),
    })
}

#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Clients"],
    params(("id" = i32, Path, description = "Client ID")),
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Client", body = StdResponse<ClientEntity, String>),
        (status = 404, description = "Unknown client")
    )
)]
async fn get_client(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;
    let client = clients::get(conn, id).await?;

    Ok(StdResponse {
        data: Some(client),
        message: Some("Get client successfully"),
    })
}

/// Change contact details. Only the fields present are updated.
#[utoipa::path(
    patch,
    path = "/{id}",
    tags = ["Clients"],
    params(("id" = i32, Path, description = "Client ID")),
    request_body = UpdateClientEntity,
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Client updated", body = StdResponse<ClientEntity, String>),
        (status = 404, description = "Unknown client")
    )
)]
async fn update_client(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<UpdateClientEntity>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;
    let client = clients::update(conn, id, body).await?;

    Ok(StdResponse {
        data: Some(client),
        message: Some("Client updated successfully"),
    })
}

#[utoipa::path(
    post,
    path = "/{id}/addresses",
    tags = ["Clients"],
    params(("id" = i32, Path, description = "Client ID")),
    request_body = NewAddress,
    security(("bearerAuth" = [])),
    responses(
        (status = 201, description = "Address added", body = StdResponse<AddressEntity, String>),
        (status = 404, description = "Unknown client")
    )
)]
async fn add_address(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<NewAddress>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;
    let address = clients::add_address(conn, id, body).await?;

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(address),
            message: Some("Address added successfully"),
        },
    ))
}

#[utoipa::path(
    get,
    path = "/{id}/addresses",
    tags = ["Clients"],
    params(("id" = i32, Path, description = "Client ID")),
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Addresses of the client", body = StdResponse<Vec<AddressEntity>, String>)
    )
)]
async fn list_addresses(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;
    let addresses = clients::list_addresses(conn, id).await?;

    Ok(StdResponse {
        data: Some(addresses),
        message: Some("Get addresses successfully"),
    })
}
