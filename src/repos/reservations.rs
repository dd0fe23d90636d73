use anyhow::Context;
use chrono::NaiveDate;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    codes,
    core::app_error::AppError,
    models::{CreateReservationEntity, ReservationEntity, ReservationState},
    repos::{catalog, clients},
    schema::reservations,
};

#[derive(Deserialize, Debug, ToSchema)]
pub struct NewReservation {
    pub client_id: i32,
    pub service_id: i32,
    pub requested_date: NaiveDate,
    /// Price agreed with the client; the catalog price when absent.
    pub service_price: Option<Decimal>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
}

pub async fn create(
    conn: &mut AsyncPgConnection,
    reservation: NewReservation,
) -> Result<ReservationEntity, AppError> {
    clients::get(conn, reservation.client_id).await?;
    let service = catalog::get_active_service(conn, reservation.service_id).await?;

    let service_price = reservation.service_price.unwrap_or(service.price);
    if service_price.is_sign_negative() {
        return Err(AppError::bad_request("Price must not be negative"));
    }

    let reservation = diesel::insert_into(reservations::table)
        .values(CreateReservationEntity {
            code: codes::new_code(codes::RESERVATION_PREFIX),
            client_id: reservation.client_id,
            service_id: service.id,
            service_price,
            brand: reservation.brand,
            model: reservation.model,
            description: reservation.description,
            requested_date: reservation.requested_date,
            state: ReservationState::Pending.to_string(),
            notes: reservation.notes,
        })
        .returning(ReservationEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to create reservation")?;

    Ok(reservation)
}

pub async fn get(conn: &mut AsyncPgConnection, id: i32) -> Result<ReservationEntity, AppError> {
    reservations::table
        .find(id)
        .select(ReservationEntity::as_select())
        .first(conn)
        .await
        .optional()?
        .ok_or_else(|| AppError::not_found(format!("Reservation #{id}")))
}

/// Same as [`get`] but holds a row lock until the surrounding transaction ends.
pub async fn get_for_update(
    conn: &mut AsyncPgConnection,
    id: i32,
) -> Result<ReservationEntity, AppError> {
    reservations::table
        .find(id)
        .select(ReservationEntity::as_select())
        .for_update()
        .first(conn)
        .await
        .optional()?
        .ok_or_else(|| AppError::not_found(format!("Reservation #{id}")))
}

pub async fn list(
    conn: &mut AsyncPgConnection,
    state: Option<ReservationState>,
) -> Result<Vec<ReservationEntity>, AppError> {
    let mut query = reservations::table
        .select(ReservationEntity::as_select())
        .order_by(reservations::requested_date.asc())
        .into_boxed();
    if let Some(state) = state {
        query = query.filter(reservations::state.eq(state.as_str()));
    }

    let reservations = query
        .load(conn)
        .await
        .context("Failed to list reservations")?;
    Ok(reservations)
}

pub fn state_of(reservation: &ReservationEntity) -> Result<ReservationState, AppError> {
    Ok(reservation
        .state
        .parse()
        .with_context(|| format!("Reservation #{} has a corrupt state", reservation.id))?)
}

/// Cancel a pending reservation. The row is locked first so a transfer
/// running at the same time is either seen as committed or waits.
pub async fn cancel(conn: &mut AsyncPgConnection, id: i32) -> Result<ReservationEntity, AppError> {
    conn.transaction(move |conn| {
        Box::pin(async move {
            let reservation = get_for_update(conn, id).await?;
            if state_of(&reservation)?.is_processed() {
                return Err(AppError::invalid_state(format!(
                    "Reservation {} was already processed",
                    reservation.code
                )));
            }

            let cancelled = diesel::update(reservations::table.find(id))
                .set((
                    reservations::state.eq(ReservationState::Cancelled.as_str()),
                    reservations::is_active.eq(false),
                    reservations::updated_at.eq(diesel::dsl::now),
                ))
                .returning(ReservationEntity::as_returning())
                .get_result(conn)
                .await
                .context("Failed to cancel reservation")?;

            Ok::<ReservationEntity, AppError>(cancelled)
        })
    })
    .await
}

pub async fn mark_transferred(
    conn: &mut AsyncPgConnection,
    id: i32,
    order_id: i32,
) -> Result<ReservationEntity, AppError> {
    let reservation = diesel::update(reservations::table.find(id))
        .set((
            reservations::state.eq(ReservationState::TransferredToOrder.as_str()),
            reservations::order_id.eq(order_id),
            reservations::updated_at.eq(diesel::dsl::now),
        ))
        .returning(ReservationEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to mark reservation as transferred")?;

    Ok(reservation)
}
