use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use utoipa::IntoParams;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    api::notifications::OrderEvent,
    core::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        middleware::SessionEmployee,
    },
    models::{ReservationEntity, ReservationState},
    repos::reservations::{self, NewReservation},
    workflows::bookings::{self, TransferRequest, TransferredBooking},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/reservations",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(create_reservation, list_reservations))
            .routes(utoipa_axum::routes!(get_reservation))
            .routes(utoipa_axum::routes!(cancel_reservation))
            .routes(utoipa_axum::routes!(transfer_reservation)),
    )
}

#[derive(Deserialize, Debug, IntoParams)]
#[into_params(parameter_in = Query)]
struct ReservationListing {
    state: Option<ReservationState>,
}

#[utoipa::path(
    post,
    path = "/",
    tags = ["Reservations"],
    request_body = NewReservation,
    security(("bearerAuth" = [])),
    responses(
        (status = 201, description = "Reservation created", body = StdResponse<ReservationEntity, String>),
        (status = 404, description = "Unknown client or service")
    )
)]
async fn create_reservation(
    State(state): State<AppState>,
    Json(body): Json<NewReservation>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;
    let reservation = reservations::create(conn, body).await?;

    tracing::info!(reservation_id = reservation.id, code = %reservation.code, "reservation created");
    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(reservation),
            message: Some("Reservation created successfully"),
        },
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tags = ["Reservations"],
    params(ReservationListing),
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Reservations by requested date", body = StdResponse<Vec<ReservationEntity>, String>)
    )
)]
async fn list_reservations(
    State(state): State<AppState>,
    Query(listing): Query<ReservationListing>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;
    let reservations = reservations::list(conn, listing.state).await?;

    Ok(StdResponse {
        data: Some(reservations),
        message: Some("Get reservations successfully"),
    })
}

#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Reservations"],
    params(("id" = i32, Path, description = "Reservation ID")),
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Reservation", body = StdResponse<ReservationEntity, String>),
        (status = 404, description = "Unknown reservation")
    )
)]
async fn get_reservation(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;
    let reservation = reservations::get(conn, id).await?;

    Ok(StdResponse {
        data: Some(reservation),
        message: Some("Get reservation successfully"),
    })
}

#[utoipa::path(
    post,
    path = "/{id}/cancel",
    tags = ["Reservations"],
    params(("id" = i32, Path, description = "Reservation ID")),
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Reservation cancelled", body = StdResponse<ReservationEntity, String>),
        (status = 409, description = "Reservation was already processed")
    )
)]
async fn cancel_reservation(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;
    let reservation = reservations::cancel(conn, id).await?;

    tracing::info!(reservation_id = id, "reservation cancelled");
    Ok(StdResponse {
        data: Some(reservation),
        message: Some("Reservation cancelled successfully"),
    })
}

/// Turn a pending reservation into an order at the agreed price.
#[utoipa::path(
    post,
    path = "/{id}/transfer",
    tags = ["Reservations"],
    params(("id" = i32, Path, description = "Reservation ID")),
    request_body(content = TransferRequest, description = "Extra notes for the order"),
    security(("bearerAuth" = [])),
    responses(
        (status = 201, description = "Order created from the reservation", body = StdResponse<TransferredBooking, String>),
        (status = 404, description = "Unknown reservation or employee"),
        (status = 409, description = "Reservation was already processed or employee is inactive")
    )
)]
async fn transfer_reservation(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Extension(session): Extension<SessionEmployee>,
    body: Option<Json<TransferRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let notes = body.and_then(|Json(b)| b.notes);
    let conn = &mut state.conn().await?;
    let transferred = bookings::transfer_booking_to_order(
        conn,
        id,
        session.employee_id,
        notes,
        state.config.tax_rate,
    )
    .await?;

    state.notifier.notify(OrderEvent::BookingTransferred {
        reservation_code: transferred.reservation_code.clone(),
        order_id: transferred.order_id,
        order_code: transferred.order_code.clone(),
    });

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(transferred),
            message: Some("Reservation transferred successfully"),
        },
    ))
}
