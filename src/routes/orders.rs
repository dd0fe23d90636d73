use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    api::notifications::OrderEvent,
    core::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        middleware::SessionEmployee,
    },
    models::{MediaFileEntity, OrderEntity, StatusHistoryEntity, StorageHistoryEntity},
    repos::media::{self, NewMediaFile},
    workflows::{
        orders::{
            self, ChangeStatus, CreatedOrder, NewOrder, OrderDetail, OrderFilter,
            ProductLineAdded, ProductLineInput, ServiceLineInput, ServiceLinesAdded, StatusChange,
        },
        storage::{self, StorageAssignment, StorageInput},
    },
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/orders",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(create_order, list_orders))
            .routes(utoipa_axum::routes!(get_order))
            .routes(utoipa_axum::routes!(add_service_line))
            .routes(utoipa_axum::routes!(add_product_line))
            .routes(utoipa_axum::routes!(apply_discount))
            .routes(utoipa_axum::routes!(change_status))
            .routes(utoipa_axum::routes!(get_status_history))
            .routes(utoipa_axum::routes!(assign_storage, get_storage_history))
            .routes(utoipa_axum::routes!(add_media, list_media))
            .merge(super::payments::routes_with_openapi()),
    )
}

#[derive(Deserialize, Debug, ToSchema)]
struct DiscountBody {
    discount: Decimal,
}

/// Open a new order at the front desk, optionally with its first lines.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Orders"],
    request_body = NewOrder,
    security(("bearerAuth" = [])),
    responses(
        (status = 201, description = "Order created", body = StdResponse<CreatedOrder, String>),
        (status = 400, description = "Reservation belongs to another client"),
        (status = 404, description = "Unknown client, reservation, service or product"),
        (status = 409, description = "Inactive employee, insufficient stock or reservation already processed")
    )
)]
async fn create_order(
    State(state): State<AppState>,
    Extension(session): Extension<SessionEmployee>,
    Json(body): Json<NewOrder>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;
    let created =
        orders::create_order(conn, body, session.employee_id, state.config.tax_rate).await?;

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(created),
            message: Some("Order created successfully"),
        },
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tags = ["Orders"],
    params(OrderFilter),
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Orders, newest first", body = StdResponse<Vec<OrderEntity>, String>)
    )
)]
async fn list_orders(
    State(state): State<AppState>,
    Query(filter): Query<OrderFilter>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;
    let orders = orders::list_orders(conn, filter).await?;

    Ok(StdResponse {
        data: Some(orders),
        message: Some("Get orders successfully"),
    })
}

/// Fetch an order with its lines, history, payments and balance.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Orders"],
    params(("id" = i32, Path, description = "Order ID")),
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Order detail", body = StdResponse<OrderDetail, String>),
        (status = 404, description = "Unknown order")
    )
)]
async fn get_order(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;
    let detail = orders::order_detail(conn, id).await?;

    Ok(StdResponse {
        data: Some(detail),
        message: Some("Get order successfully"),
    })
}

#[utoipa::path(
    post,
    path = "/{id}/services",
    tags = ["Orders"],
    params(("id" = i32, Path, description = "Order ID")),
    request_body = ServiceLineInput,
    security(("bearerAuth" = [])),
    responses(
        (status = 201, description = "Service line added", body = StdResponse<ServiceLinesAdded, String>),
        (status = 404, description = "Unknown order or service"),
        (status = 409, description = "Order is closed")
    )
)]
async fn add_service_line(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<ServiceLineInput>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;
    let added = orders::add_service_line(conn, id, body, state.config.tax_rate).await?;

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(added),
            message: Some("Service line added successfully"),
        },
    ))
}

#[utoipa::path(
    post,
    path = "/{id}/products",
    tags = ["Orders"],
    params(("id" = i32, Path, description = "Order ID")),
    request_body = ProductLineInput,
    security(("bearerAuth" = [])),
    responses(
        (status = 201, description = "Product line added", body = StdResponse<ProductLineAdded, String>),
        (status = 404, description = "Unknown order or product"),
        (status = 409, description = "Order is closed or stock is insufficient")
    )
)]
async fn add_product_line(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<ProductLineInput>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;
    let added = orders::add_product_line(conn, id, body, state.config.tax_rate).await?;

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(added),
            message: Some("Product line added successfully"),
        },
    ))
}

#[utoipa::path(
    patch,
    path = "/{id}/discount",
    tags = ["Orders"],
    params(("id" = i32, Path, description = "Order ID")),
    request_body = DiscountBody,
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Discount applied", body = StdResponse<OrderEntity, String>),
        (status = 400, description = "Negative discount or larger than the order")
    )
)]
async fn apply_discount(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<DiscountBody>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;
    let order = orders::apply_discount(conn, id, body.discount, state.config.tax_rate).await?;

    Ok(StdResponse {
        data: Some(order),
        message: Some("Discount applied successfully"),
    })
}

/// Move the order to any status. The change is logged in its history.
#[utoipa::path(
    post,
    path = "/{id}/status",
    tags = ["Orders"],
    params(("id" = i32, Path, description = "Order ID")),
    request_body = ChangeStatus,
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Status changed", body = StdResponse<StatusChange, String>),
        (status = 404, description = "Unknown order or status"),
        (status = 500, description = "Order and history disagree after the write")
    )
)]
async fn change_status(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Extension(session): Extension<SessionEmployee>,
    Json(body): Json<ChangeStatus>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;
    let change = orders::change_order_status(conn, id, body, session.employee_id).await?;

    state.notifier.notify(OrderEvent::StatusChanged {
        order_id: change.order.id,
        order_code: change.order.code.clone(),
        status_id: change.order.current_status_id,
    });

    Ok(StdResponse {
        data: Some(change),
        message: Some("Order status changed successfully"),
    })
}

#[utoipa::path(
    get,
    path = "/{id}/history",
    tags = ["Orders"],
    params(("id" = i32, Path, description = "Order ID")),
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Status history, newest first", body = StdResponse<Vec<StatusHistoryEntity>, String>),
        (status = 404, description = "Unknown order")
    )
)]
async fn get_status_history(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;
    orders::get_order(conn, id).await?;
    let history = orders::status_history(conn, id).await?;

    Ok(StdResponse {
        data: Some(history),
        message: Some("Get status history successfully"),
    })
}

/// Record where a pair is shelved. The last assignment wins.
#[utoipa::path(
    post,
    path = "/{id}/services/{line_id}/storage",
    tags = ["Storage"],
    params(
        ("id" = i32, Path, description = "Order ID"),
        ("line_id" = i32, Path, description = "Service line ID")
    ),
    request_body = StorageInput,
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Location saved", body = StdResponse<StorageAssignment, String>),
        (status = 400, description = "Blank box or location"),
        (status = 404, description = "No such line on this order")
    )
)]
async fn assign_storage(
    Path((id, line_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
    Extension(session): Extension<SessionEmployee>,
    Json(body): Json<StorageInput>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;
    let assignment =
        storage::assign_storage_location(conn, id, line_id, body, session.employee_id).await?;

    let message = if assignment.audit_recorded {
        "Storage location saved successfully"
    } else {
        "Storage location saved; audit entry could not be recorded"
    };
    Ok(StdResponse {
        data: Some(assignment),
        message: Some(message),
    })
}

#[utoipa::path(
    get,
    path = "/{id}/services/{line_id}/storage",
    tags = ["Storage"],
    params(
        ("id" = i32, Path, description = "Order ID"),
        ("line_id" = i32, Path, description = "Service line ID")
    ),
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Locations given to the line, newest first", body = StdResponse<Vec<StorageHistoryEntity>, String>)
    )
)]
async fn get_storage_history(
    Path((id, line_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;
    let history = storage::history(conn, id, line_id).await?;

    Ok(StdResponse {
        data: Some(history),
        message: Some("Get storage history successfully"),
    })
}

/// Attach an already uploaded photo or document to the order.
#[utoipa::path(
    post,
    path = "/{id}/media",
    tags = ["Orders"],
    params(("id" = i32, Path, description = "Order ID")),
    request_body = NewMediaFile,
    security(("bearerAuth" = [])),
    responses(
        (status = 201, description = "Media registered", body = StdResponse<MediaFileEntity, String>),
        (status = 404, description = "Unknown order")
    )
)]
async fn add_media(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Extension(session): Extension<SessionEmployee>,
    Json(body): Json<NewMediaFile>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;
    orders::get_order(conn, id).await?;
    let media = media::register(conn, id, body, session.employee_id).await?;

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(media),
            message: Some("Media registered successfully"),
        },
    ))
}

#[utoipa::path(
    get,
    path = "/{id}/media",
    tags = ["Orders"],
    params(("id" = i32, Path, description = "Order ID")),
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Media of the order", body = StdResponse<Vec<MediaFileEntity>, String>)
    )
)]
async fn list_media(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;
    let media = media::list_by_order(conn, id).await?;

    Ok(StdResponse {
        data: Some(media),
        message: Some("Get media successfully"),
    })
}
