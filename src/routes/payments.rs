//! Payments against an order. Mounted under `/orders/{id}/payments`.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    api::notifications::OrderEvent,
    core::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        middleware::SessionEmployee,
    },
    models::PaymentEntity,
    money::Balance,
    repos::payments,
    workflows::orders::{self, NewPayment, PaymentReceipt},
};

/// Routes relative to the `/orders` nest.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(utoipa_axum::routes!(register_payment, list_payments))
}

#[derive(Serialize, ToSchema)]
pub struct PaymentsRes {
    payments: Vec<PaymentEntity>,
    balance: Balance,
}

/// Register a payment. Paying more than the total is allowed; the excess is
/// returned as `change_due`.
#[utoipa::path(
    post,
    path = "/{id}/payments",
    tags = ["Payments"],
    params(("id" = i32, Path, description = "Order ID")),
    request_body = NewPayment,
    security(("bearerAuth" = [])),
    responses(
        (status = 201, description = "Payment registered", body = StdResponse<PaymentReceipt, String>),
        (status = 404, description = "Unknown order"),
        (status = 409, description = "Amount is zero or negative")
    )
)]
async fn register_payment(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Extension(session): Extension<SessionEmployee>,
    Json(body): Json<NewPayment>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;
    let receipt = orders::register_payment(conn, id, body, session.employee_id).await?;

    state.notifier.notify(OrderEvent::PaymentRegistered {
        order_id: id,
        amount: receipt.payment.amount,
        balance: receipt.balance.balance,
        payment_status: receipt.balance.payment_status,
    });

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(receipt),
            message: Some("Payment registered successfully"),
        },
    ))
}

#[utoipa::path(
    get,
    path = "/{id}/payments",
    tags = ["Payments"],
    params(("id" = i32, Path, description = "Order ID")),
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Payments and balance of the order", body = StdResponse<PaymentsRes, String>),
        (status = 404, description = "Unknown order")
    )
)]
async fn list_payments(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;
    let order = orders::get_order(conn, id).await?;
    let payments = payments::list_by_order(conn, id).await?;
    let paid = payments.iter().map(|p| p.amount).sum();

    Ok(StdResponse {
        data: Some(PaymentsRes {
            payments,
            balance: Balance::new(order.total, paid),
        }),
        message: Some("Get payments successfully"),
    })
}
