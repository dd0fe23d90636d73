use anyhow::Context;
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use rust_decimal::Decimal;

use crate::{core::app_error::AppError, models::PaymentEntity, schema::payments};

pub async fn list_by_order(
    conn: &mut AsyncPgConnection,
    order_id: i32,
) -> Result<Vec<PaymentEntity>, AppError> {
    let payments = payments::table
        .filter(payments::order_id.eq(order_id))
        .select(PaymentEntity::as_select())
        .order_by(payments::created_at.asc())
        .load(conn)
        .await
        .context("Failed to list payments")?;

    Ok(payments)
}

/// Sum of every payment registered against the order.
pub async fn total_paid(conn: &mut AsyncPgConnection, order_id: i32) -> Result<Decimal, AppError> {
    let paid: Option<Decimal> = payments::table
        .filter(payments::order_id.eq(order_id))
        .select(diesel::dsl::sum(payments::amount))
        .first(conn)
        .await
        .context("Failed to sum payments")?;

    Ok(paid.unwrap_or(Decimal::ZERO))
}
