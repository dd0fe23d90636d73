//! Turning a reservation into a real order.

use diesel_async::{AsyncConnection, AsyncPgConnection};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    core::app_error::AppError,
    models::{ReservationEntity, ReservationState},
    repos::{employees, reservations},
    workflows::orders::{self, OrderShell, ServiceLineInput},
};

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct TransferRequest {
    /// Appended to the reservation notes on the new order.
    pub notes: Option<String>,
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct TransferredBooking {
    pub order_id: i32,
    pub order_code: String,
    pub reservation_code: String,
    pub total: Decimal,
}

/// A reservation can become an order once, and only while still pending.
pub fn ensure_transferable(reservation: &ReservationEntity) -> Result<(), AppError> {
    let state = reservations::state_of(reservation)?;
    if !reservation.is_active || state.is_processed() {
        return Err(AppError::invalid_state(format!(
            "Reservation {} was already processed ({state})",
            reservation.code
        )));
    }
    Ok(())
}

fn merge_notes(reservation_notes: Option<String>, extra: Option<String>) -> Option<String> {
    let parts: Vec<String> = [reservation_notes, extra]
        .into_iter()
        .flatten()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}

pub async fn transfer_booking_to_order(
    conn: &mut AsyncPgConnection,
    reservation_id: i32,
    employee_id: i32,
    extra_notes: Option<String>,
    tax_rate: Decimal,
) -> Result<TransferredBooking, AppError> {
    let transferred = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let reservation = reservations::get_for_update(conn, reservation_id).await?;
                ensure_transferable(&reservation)?;
                employees::require_active(conn, employee_id).await?;

                let order = orders::insert_order_shell(
                    conn,
                    OrderShell {
                        client_id: reservation.client_id,
                        reservation_code: Some(reservation.code.clone()),
                        estimated_delivery: Some(reservation.requested_date),
                        notes: merge_notes(reservation.notes.clone(), extra_notes),
                        requires_id: false,
                        id_on_file: false,
                    },
                    employee_id,
                )
                .await?;

                orders::insert_locked_price_line(
                    conn,
                    order.id,
                    ServiceLineInput {
                        service_id: reservation.service_id,
                        quantity: 1,
                        brand: reservation.brand.clone(),
                        model: reservation.model.clone(),
                        description: reservation.description.clone(),
                    },
                    reservation.service_price,
                )
                .await?;

                let order = orders::recompute_totals(conn, order.id, tax_rate).await?;
                reservations::mark_transferred(conn, reservation.id, order.id).await?;

                Ok::<TransferredBooking, AppError>(TransferredBooking {
                    order_id: order.id,
                    order_code: order.code,
                    reservation_code: reservation.code,
                    total: order.total,
                })
            })
        })
        .await?;

    tracing::info!(
        reservation_id,
        order_id = transferred.order_id,
        order_code = %transferred.order_code,
        state = %ReservationState::TransferredToOrder,
        "reservation transferred to order"
    );
    Ok(transferred)
}
