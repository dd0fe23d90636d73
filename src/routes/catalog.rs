//! Services, products and the status list the front desk picks from.

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
    models::{
        CreateProductEntity, CreateServiceEntity, OrderStatusEntity, ProductEntity,
        ServiceEntity, UpdateProductEntity, UpdateServiceEntity,
    },
    repos::catalog,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/catalog",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(list_services, create_service))
            .routes(utoipa_axum::routes!(update_service))
            .routes(utoipa_axum::routes!(list_products, create_product))
            .routes(utoipa_axum::routes!(update_product))
            .routes(utoipa_axum::routes!(list_statuses)),
    )
}

#[derive(Deserialize, Debug, IntoParams)]
#[into_params(parameter_in = Query)]
struct ServiceListing {
    #[serde(default)]
    include_inactive: bool,
}

#[utoipa::path(
    get,
    path = "/services",
    tags = ["Catalog"],
    params(ServiceListing),
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Services", body = StdResponse<Vec<ServiceEntity>, String>)
    )
)]
async fn list_services(
    State(state): State<AppState>,
    Query(listing): Query<ServiceListing>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;
    let services = catalog::list_services(conn, listing.include_inactive).await?;

    Ok(StdResponse {
        data: Some(services),
        message: Some("Get services successfully"),
    })
}

#[utoipa::path(
    post,
    path = "/services",
    tags = ["Catalog"],
    request_body = CreateServiceEntity,
    security(("bearerAuth" = [])),
    responses(
        (status = 201, description = "Service created", body = StdResponse<ServiceEntity, String>),
        (status = 400, description = "Invalid name or price")
    )
)]
async fn create_service(
    State(state): State<AppState>,
    Json(body): Json<CreateServiceEntity>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;
    let service = catalog::create_service(conn, body).await?;

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(service),
            message: Some("Service created successfully"),
        },
    ))
}

/// Change a service. Prices of existing order lines are not affected.
#[utoipa::path(
    patch,
    path = "/services/{id}",
    tags = ["Catalog"],
    params(("id" = i32, Path, description = "Service ID")),
    request_body = UpdateServiceEntity,
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Service updated", body = StdResponse<ServiceEntity, String>),
        (status = 404, description = "Unknown service")
    )
)]
async fn update_service(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<UpdateServiceEntity>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;
    let service = catalog::update_service(conn, id, body).await?;

    Ok(StdResponse {
        data: Some(service),
        message: Some("Service updated successfully"),
    })
}

#[utoipa::path(
    get,
    path = "/products",
    tags = ["Catalog"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Products", body = StdResponse<Vec<ProductEntity>, String>)
    )
)]
async fn list_products(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;
    let products = catalog::list_products(conn).await?;

    Ok(StdResponse {
        data: Some(products),
        message: Some("Get products successfully"),
    })
}

#[utoipa::path(
    post,
    path = "/products",
    tags = ["Catalog"],
    request_body = CreateProductEntity,
    security(("bearerAuth" = [])),
    responses(
        (status = 201, description = "Product created", body = StdResponse<ProductEntity, String>),
        (status = 400, description = "Invalid name, price or stock")
    )
)]
async fn create_product(
    State(state): State<AppState>,
    Json(body): Json<CreateProductEntity>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;
    let product = catalog::create_product(conn, body).await?;

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(product),
            message: Some("Product created successfully"),
        },
    ))
}

#[utoipa::path(
    patch,
    path = "/products/{id}",
    tags = ["Catalog"],
    params(("id" = i32, Path, description = "Product ID")),
    request_body = UpdateProductEntity,
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Product updated", body = StdResponse<ProductEntity, String>),
        (status = 404, description = "Unknown product")
    )
)]
async fn update_product(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<UpdateProductEntity>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;
    let product = catalog::update_product(conn, id, body).await?;

    Ok(StdResponse {
        data: Some(product),
        message: Some("Product updated successfully"),
    })
}

#[utoipa::path(
    get,
    path = "/statuses",
    tags = ["Catalog"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Order statuses in workflow order", body = StdResponse<Vec<OrderStatusEntity>, String>)
    )
)]
async fn list_statuses(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;
    let statuses = catalog::list_statuses(conn).await?;

    Ok(StdResponse {
        data: Some(statuses),
        message: Some("Get statuses successfully"),
    })
}
