//! Order lifecycle: creation, line items, totals, status changes, payments.
//!
//! Every mutation runs in a single transaction. The order's
//! `current_status_id` and its newest `order_status_history` row are always
//! written together and read back before commit.

use anyhow::Context;
use chrono::NaiveDate;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    codes,
    core::app_error::AppError,
    models::{
        CreateOrderEntity, CreatePaymentEntity, CreateProductLineEntity,
        CreateServiceLineEntity, CreateStatusHistoryEntity, OrderEntity, OrderStatusEntity,
        PaymentEntity, PaymentMethod, PaymentStatus, ProductLineEntity, ServiceEntity,
        ServiceLineEntity, StatusHistoryEntity, status,
    },
    money::{self, Balance, OrderTotals},
    repos::{catalog, clients, employees, payments, reservations},
    schema::{
        order_product_lines, order_service_lines, order_status_history, orders,
        payments as payments_table,
    },
    workflows::bookings::ensure_transferable,
};

#[derive(Deserialize, Debug, ToSchema)]
pub struct NewOrder {
    pub client_id: i32,
    pub reservation_id: Option<i32>,
    pub estimated_delivery: Option<NaiveDate>,
    pub notes: Option<String>,
    #[serde(default)]
    pub requires_id: bool,
    #[serde(default)]
    pub id_on_file: bool,
    #[serde(default)]
    pub services: Vec<ServiceLineInput>,
    #[serde(default)]
    pub products: Vec<ProductLineInput>,
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct CreatedOrder {
    pub order_id: i32,
    pub order_code: String,
    pub totals: OrderTotals,
}

#[derive(Deserialize, Debug, Clone, ToSchema)]
pub struct ServiceLineInput {
    pub service_id: i32,
    #[serde(default = "one")]
    pub quantity: i32,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize, Debug, Clone, ToSchema)]
pub struct ProductLineInput {
    pub product_id: i32,
    #[serde(default = "one")]
    pub quantity: i32,
}

fn one() -> i32 {
    1
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ServiceLinesAdded {
    pub lines: Vec<ServiceLineEntity>,
    pub order: OrderEntity,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ProductLineAdded {
    pub line: ProductLineEntity,
    pub order: OrderEntity,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct ChangeStatus {
    #[serde(alias = "estadoId")]
    pub status_id: i32,
    #[serde(alias = "comentario")]
    pub comment: Option<String>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct StatusChange {
    pub history: StatusHistoryEntity,
    pub order: OrderEntity,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct NewPayment {
    #[serde(alias = "monto")]
    pub amount: Decimal,
    #[serde(alias = "metodo")]
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub terminal_id: Option<String>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct PaymentReceipt {
    pub payment: PaymentEntity,
    pub balance: Balance,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct OrderDetail {
    pub order: OrderEntity,
    pub status: OrderStatusEntity,
    pub service_lines: Vec<ServiceLineEntity>,
    pub product_lines: Vec<ProductLineEntity>,
    pub history: Vec<StatusHistoryEntity>,
    pub payments: Vec<PaymentEntity>,
    pub balance: Balance,
}

#[derive(Deserialize, Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderFilter {
    pub status_id: Option<i32>,
    pub client_id: Option<i32>,
    pub payment_status: Option<PaymentStatus>,
}

// Reads

pub async fn get_order(conn: &mut AsyncPgConnection, id: i32) -> Result<OrderEntity, AppError> {
    orders::table
        .find(id)
        .select(OrderEntity::as_select())
        .first(conn)
        .await
        .optional()?
        .ok_or_else(|| AppError::not_found(format!("Order #{id}")))
}

/// Same as [`get_order`] but holds a row lock until the surrounding
/// transaction ends, so concurrent mutations of one order run one at a time.
pub(crate) async fn get_order_for_update(
    conn: &mut AsyncPgConnection,
    id: i32,
) -> Result<OrderEntity, AppError> {
    orders::table
        .find(id)
        .select(OrderEntity::as_select())
        .for_update()
        .first(conn)
        .await
        .optional()?
        .ok_or_else(|| AppError::not_found(format!("Order #{id}")))
}

pub async fn list_orders(
    conn: &mut AsyncPgConnection,
    filter: OrderFilter,
) -> Result<Vec<OrderEntity>, AppError> {
    let mut query = orders::table
        .select(OrderEntity::as_select())
        .order_by(orders::created_at.desc())
        .into_boxed();

    if let Some(status_id) = filter.status_id {
        query = query.filter(orders::current_status_id.eq(status_id));
    }
    if let Some(client_id) = filter.client_id {
        query = query.filter(orders::client_id.eq(client_id));
    }
    if let Some(payment_status) = filter.payment_status {
        query = query.filter(orders::payment_status.eq(payment_status.as_str()));
    }

    let orders = query.load(conn).await.context("Failed to list orders")?;
    Ok(orders)
}

pub async fn order_detail(
    conn: &mut AsyncPgConnection,
    id: i32,
) -> Result<OrderDetail, AppError> {
    let order = get_order(conn, id).await?;
    let status = catalog::get_status(conn, order.current_status_id).await?;

    let service_lines = order_service_lines::table
        .filter(order_service_lines::order_id.eq(id))
        .select(ServiceLineEntity::as_select())
        .order_by(order_service_lines::id.asc())
        .load(conn)
        .await
        .context("Failed to get service lines")?;

    let product_lines = order_product_lines::table
        .filter(order_product_lines::order_id.eq(id))
        .select(ProductLineEntity::as_select())
        .order_by(order_product_lines::id.asc())
        .load(conn)
        .await
        .context("Failed to get product lines")?;

    let history = status_history(conn, id).await?;
    let payments = payments::list_by_order(conn, id).await?;
    let paid = payments.iter().map(|p| p.amount).sum();
    let balance = Balance::new(order.total, paid);

    Ok(OrderDetail {
        order,
        status,
        service_lines,
        product_lines,
        history,
        payments,
        balance,
    })
}

/// Status history of an order, newest first.
pub async fn status_history(
    conn: &mut AsyncPgConnection,
    order_id: i32,
) -> Result<Vec<StatusHistoryEntity>, AppError> {
    let history = order_status_history::table
        .filter(order_status_history::order_id.eq(order_id))
        .select(StatusHistoryEntity::as_select())
        .order_by(order_status_history::id.desc())
        .load(conn)
        .await
        .context("Failed to get status history")?;

    Ok(history)
}

async fn latest_history(
    conn: &mut AsyncPgConnection,
    order_id: i32,
) -> Result<Option<StatusHistoryEntity>, AppError> {
    let latest = order_status_history::table
        .filter(order_status_history::order_id.eq(order_id))
        .select(StatusHistoryEntity::as_select())
        .order_by(order_status_history::id.desc())
        .first(conn)
        .await
        .optional()?;

    Ok(latest)
}

// Creation

/// Fields of the order row itself; lines are added afterwards.
pub(crate) struct OrderShell {
    pub client_id: i32,
    pub reservation_code: Option<String>,
    pub estimated_delivery: Option<NaiveDate>,
    pub notes: Option<String>,
    pub requires_id: bool,
    pub id_on_file: bool,
}

/// Insert the order with zeroed money and its seed history row.
pub(crate) async fn insert_order_shell(
    conn: &mut AsyncPgConnection,
    shell: OrderShell,
    employee_id: i32,
) -> Result<OrderEntity, AppError> {
    let order = diesel::insert_into(orders::table)
        .values(CreateOrderEntity {
            code: codes::new_code(codes::ORDER_PREFIX),
            client_id: shell.client_id,
            received_by: employee_id,
            subtotal: Decimal::ZERO,
            tax: Decimal::ZERO,
            discount: Decimal::ZERO,
            total: Decimal::ZERO,
            current_status_id: status::PENDING,
            payment_status: PaymentStatus::Pending.to_string(),
            requires_id: shell.requires_id,
            id_on_file: shell.id_on_file,
            notes: shell.notes,
            reservation_code: shell.reservation_code,
            estimated_delivery: shell.estimated_delivery,
        })
        .returning(OrderEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to create order")?;

    diesel::insert_into(order_status_history::table)
        .values(CreateStatusHistoryEntity {
            order_id: order.id,
            status_id: status::PENDING,
            employee_id,
            comment: Some("Order created".into()),
        })
        .execute(conn)
        .await
        .context("Failed to record initial order status")?;

    Ok(order)
}

pub async fn create_order(
    conn: &mut AsyncPgConnection,
    new_order: NewOrder,
    employee_id: i32,
    tax_rate: Decimal,
) -> Result<CreatedOrder, AppError> {
    for line in &new_order.services {
        check_quantity(line.quantity)?;
    }
    for line in &new_order.products {
        check_quantity(line.quantity)?;
    }

    let created = conn
        .transaction(move |conn| {
            Box::pin(async move {
                clients::get(conn, new_order.client_id).await?;
                employees::require_active(conn, employee_id).await?;

                let reservation = match new_order.reservation_id {
                    Some(id) => {
                        let reservation = reservations::get_for_update(conn, id).await?;
                        ensure_transferable(&reservation)?;
                        if reservation.client_id != new_order.client_id {
                            return Err(AppError::bad_request(format!(
                                "Reservation {} belongs to another client",
                                reservation.code
                            )));
                        }
                        Some(reservation)
                    }
                    None => None,
                };

                let order = insert_order_shell(
                    conn,
                    OrderShell {
                        client_id: new_order.client_id,
                        reservation_code: reservation.as_ref().map(|r| r.code.clone()),
                        estimated_delivery: new_order.estimated_delivery,
                        notes: clean(new_order.notes),
                        requires_id: new_order.requires_id,
                        id_on_file: new_order.id_on_file,
                    },
                    employee_id,
                )
                .await?;

                for line in new_order.services {
                    insert_service_lines(conn, order.id, line).await?;
                }
                for line in new_order.products {
                    insert_product_line(conn, order.id, line).await?;
                }

                let order = recompute_totals(conn, order.id, tax_rate).await?;
                if let Some(reservation) = reservation {
                    reservations::mark_transferred(conn, reservation.id, order.id).await?;
                }

                Ok::<CreatedOrder, AppError>(CreatedOrder {
                    order_id: order.id,
                    order_code: order.code.clone(),
                    totals: totals_of(&order),
                })
            })
        })
        .await?;

    tracing::info!(
        order_id = created.order_id,
        order_code = %created.order_code,
        employee_id,
        total = %created.totals.total,
        "order created"
    );
    Ok(created)
}

// Line items

fn check_quantity(quantity: i32) -> Result<(), AppError> {
    if quantity < 1 {
        return Err(AppError::bad_request("Quantity must be at least 1"));
    }
    Ok(())
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Rows to insert for one requested service line.
///
/// A pair-tracking service with brand, model or description and quantity
/// above one becomes `quantity` rows of one pair each, so every pair can get
/// its own storage slot.
pub fn expand_service_line(
    order_id: i32,
    service: &ServiceEntity,
    input: ServiceLineInput,
) -> Vec<CreateServiceLineEntity> {
    let brand = clean(input.brand);
    let model = clean(input.model);
    let description = clean(input.description);
    let has_pair_details = brand.is_some() || model.is_some() || description.is_some();

    let (rows, quantity) = if service.tracks_pairs && has_pair_details && input.quantity > 1 {
        (input.quantity, 1)
    } else {
        (1, input.quantity)
    };

    (0..rows)
        .map(|_| CreateServiceLineEntity {
            order_id,
            service_id: service.id,
            quantity,
            unit_price: service.price,
            subtotal: money::line_subtotal(service.price, quantity),
            brand: brand.clone(),
            model: model.clone(),
            description: description.clone(),
        })
        .collect()
}

pub(crate) async fn insert_service_lines(
    conn: &mut AsyncPgConnection,
    order_id: i32,
    input: ServiceLineInput,
) -> Result<Vec<ServiceLineEntity>, AppError> {
    check_quantity(input.quantity)?;
    let service = catalog::get_active_service(conn, input.service_id).await?;
    insert_service_rows(conn, expand_service_line(order_id, &service, input)).await
}

/// Service line at a price agreed before the order existed.
pub(crate) async fn insert_locked_price_line(
    conn: &mut AsyncPgConnection,
    order_id: i32,
    input: ServiceLineInput,
    unit_price: Decimal,
) -> Result<Vec<ServiceLineEntity>, AppError> {
    check_quantity(input.quantity)?;
    let mut service = catalog::get_service(conn, input.service_id).await?;
    service.price = unit_price;
    insert_service_rows(conn, expand_service_line(order_id, &service, input)).await
}

async fn insert_service_rows(
    conn: &mut AsyncPgConnection,
    rows: Vec<CreateServiceLineEntity>,
) -> Result<Vec<ServiceLineEntity>, AppError> {
    let lines = diesel::insert_into(order_service_lines::table)
        .values(rows)
        .returning(ServiceLineEntity::as_returning())
        .get_results(conn)
        .await
        .context("Failed to insert service lines")?;

    Ok(lines)
}

pub(crate) async fn insert_product_line(
    conn: &mut AsyncPgConnection,
    order_id: i32,
    input: ProductLineInput,
) -> Result<ProductLineEntity, AppError> {
    check_quantity(input.quantity)?;
    let product = catalog::get_product(conn, input.product_id).await?;
    if !product.is_active {
        return Err(AppError::not_found(format!("Active product #{}", product.id)));
    }
    catalog::take_stock(conn, product.id, input.quantity).await?;

    let line = diesel::insert_into(order_product_lines::table)
        .values(CreateProductLineEntity {
            order_id,
            product_id: product.id,
            quantity: input.quantity,
            unit_price: product.price,
            subtotal: money::line_subtotal(product.price, input.quantity),
        })
        .returning(ProductLineEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to insert product line")?;

    Ok(line)
}

async fn require_open_order(
    conn: &mut AsyncPgConnection,
    order_id: i32,
) -> Result<OrderEntity, AppError> {
    let order = get_order_for_update(conn, order_id).await?;
    if status::TERMINAL.contains(&order.current_status_id) {
        return Err(AppError::invalid_state(format!(
            "Order {} is closed",
            order.code
        )));
    }
    Ok(order)
}

pub async fn add_service_line(
    conn: &mut AsyncPgConnection,
    order_id: i32,
    input: ServiceLineInput,
    tax_rate: Decimal,
) -> Result<ServiceLinesAdded, AppError> {
    let added = conn
        .transaction(move |conn| {
            Box::pin(async move {
                require_open_order(conn, order_id).await?;
                let lines = insert_service_lines(conn, order_id, input).await?;
                let order = recompute_totals(conn, order_id, tax_rate).await?;
                Ok::<ServiceLinesAdded, AppError>(ServiceLinesAdded { lines, order })
            })
        })
        .await?;

    tracing::info!(order_id, rows = added.lines.len(), "service line added");
    Ok(added)
}

pub async fn add_product_line(
    conn: &mut AsyncPgConnection,
    order_id: i32,
    input: ProductLineInput,
    tax_rate: Decimal,
) -> Result<ProductLineAdded, AppError> {
    let added = conn
        .transaction(move |conn| {
            Box::pin(async move {
                require_open_order(conn, order_id).await?;
                let line = insert_product_line(conn, order_id, input).await?;
                let order = recompute_totals(conn, order_id, tax_rate).await?;
                Ok::<ProductLineAdded, AppError>(ProductLineAdded { line, order })
            })
        })
        .await?;

    tracing::info!(order_id, product_id = added.line.product_id, "product line added");
    Ok(added)
}

// Totals

fn totals_of(order: &OrderEntity) -> OrderTotals {
    OrderTotals {
        subtotal: order.subtotal,
        tax: order.tax,
        discount: order.discount,
        total: order.total,
    }
}

/// Recompute subtotal, tax and total from the stored lines, keep the
/// discount, and refresh the payment status against the new total.
pub(crate) async fn recompute_totals(
    conn: &mut AsyncPgConnection,
    order_id: i32,
    tax_rate: Decimal,
) -> Result<OrderEntity, AppError> {
    let service_subtotals: Vec<Decimal> = order_service_lines::table
        .filter(order_service_lines::order_id.eq(order_id))
        .select(order_service_lines::subtotal)
        .load(conn)
        .await
        .context("Failed to load service subtotals")?;

    let product_subtotals: Vec<Decimal> = order_product_lines::table
        .filter(order_product_lines::order_id.eq(order_id))
        .select(order_product_lines::subtotal)
        .load(conn)
        .await
        .context("Failed to load product subtotals")?;

    let discount: Decimal = orders::table
        .find(order_id)
        .select(orders::discount)
        .first(conn)
        .await
        .optional()?
        .ok_or_else(|| AppError::not_found(format!("Order #{order_id}")))?;

    let totals = OrderTotals::compute(
        service_subtotals.into_iter().chain(product_subtotals),
        tax_rate,
        discount,
    );
    if totals.total < Decimal::ZERO {
        return Err(AppError::bad_request(format!(
            "Discount exceeds the order total of {}",
            totals.max_discount()
        )));
    }

    let paid = payments::total_paid(conn, order_id).await?;

    let order = diesel::update(orders::table.find(order_id))
        .set((
            orders::subtotal.eq(totals.subtotal),
            orders::tax.eq(totals.tax),
            orders::discount.eq(totals.discount),
            orders::total.eq(totals.total),
            orders::payment_status.eq(money::payment_status(totals.total, paid).as_str()),
            orders::updated_at.eq(diesel::dsl::now),
        ))
        .returning(OrderEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to update order totals")?;

    Ok(order)
}

pub async fn apply_discount(
    conn: &mut AsyncPgConnection,
    order_id: i32,
    discount: Decimal,
    tax_rate: Decimal,
) -> Result<OrderEntity, AppError> {
    if discount.is_sign_negative() {
        return Err(AppError::bad_request("Discount must not be negative"));
    }

    let order = conn
        .transaction(move |conn| {
            Box::pin(async move {
                require_open_order(conn, order_id).await?;
                diesel::update(orders::table.find(order_id))
                    .set(orders::discount.eq(money::round2(discount)))
                    .execute(conn)
                    .await
                    .context("Failed to set discount")?;
                let order = recompute_totals(conn, order_id, tax_rate).await?;
                Ok::<OrderEntity, AppError>(order)
            })
        })
        .await?;

    tracing::info!(order_id, discount = %order.discount, total = %order.total, "discount applied");
    Ok(order)
}

// Status

/// Read-back check after a status change: the newest history row and the
/// order row must both carry the requested status.
pub fn verify_transition(
    latest: Option<&StatusHistoryEntity>,
    order: &OrderEntity,
    requested_status_id: i32,
) -> Result<(), AppError> {
    let latest = latest.ok_or_else(|| {
        AppError::InconsistentState(format!("Order {} has no status history", order.code))
    })?;
    if latest.status_id != requested_status_id {
        return Err(AppError::InconsistentState(format!(
            "Latest history row of order {} has status {} instead of {}",
            order.code, latest.status_id, requested_status_id
        )));
    }
    if order.current_status_id != requested_status_id {
        return Err(AppError::InconsistentState(format!(
            "Order {} reports status {} instead of {}",
            order.code, order.current_status_id, requested_status_id
        )));
    }
    Ok(())
}

/// Apply any status to the order. There is no transition table; the only
/// guarantee is that the order row and the history log agree afterwards.
pub async fn change_order_status(
    conn: &mut AsyncPgConnection,
    order_id: i32,
    change: ChangeStatus,
    employee_id: i32,
) -> Result<StatusChange, AppError> {
    let result = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let order = get_order_for_update(conn, order_id).await?;
                let target = catalog::get_status(conn, change.status_id).await?;
                employees::get(conn, employee_id).await?;

                let delivered_by = if target.id == status::DELIVERED {
                    Some(employee_id)
                } else {
                    order.delivered_by
                };

                diesel::update(orders::table.find(order_id))
                    .set((
                        orders::current_status_id.eq(target.id),
                        orders::delivered_by.eq(delivered_by),
                        orders::updated_at.eq(diesel::dsl::now),
                    ))
                    .execute(conn)
                    .await
                    .context("Failed to update order status")?;

                diesel::insert_into(order_status_history::table)
                    .values(CreateStatusHistoryEntity {
                        order_id,
                        status_id: target.id,
                        employee_id,
                        comment: clean(change.comment),
                    })
                    .execute(conn)
                    .await
                    .context("Failed to record order status")?;

                let latest = latest_history(conn, order_id).await?;
                let order = get_order(conn, order_id).await?;
                verify_transition(latest.as_ref(), &order, target.id)?;

                let history = latest.ok_or_else(|| {
                    AppError::InconsistentState(format!("Order {} has no status history", order.code))
                })?;
                Ok::<StatusChange, AppError>(StatusChange { history, order })
            })
        })
        .await?;

    tracing::info!(
        order_id,
        status_id = result.order.current_status_id,
        employee_id,
        "order status changed"
    );
    Ok(result)
}

// Payments

/// Amount rounded to cents; anything not strictly positive is refused.
pub fn checked_payment_amount(amount: Decimal) -> Result<Decimal, AppError> {
    let amount = money::round2(amount);
    if amount <= Decimal::ZERO {
        return Err(AppError::invalid_state(
            "Payment amount must be greater than zero",
        ));
    }
    Ok(amount)
}

/// Record a payment and refresh the order's payment status.
///
/// Paying beyond the total is accepted; the excess is reported as
/// `change_due` on the receipt.
pub async fn register_payment(
    conn: &mut AsyncPgConnection,
    order_id: i32,
    payment: NewPayment,
    employee_id: i32,
) -> Result<PaymentReceipt, AppError> {
    let amount = checked_payment_amount(payment.amount)?;

    let receipt = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let order = get_order_for_update(conn, order_id).await?;
                employees::get(conn, employee_id).await?;

                let payment = diesel::insert_into(payments_table::table)
                    .values(CreatePaymentEntity {
                        order_id,
                        amount,
                        method: payment.method.to_string(),
                        reference: clean(payment.reference),
                        terminal_id: clean(payment.terminal_id),
                        employee_id,
                    })
                    .returning(PaymentEntity::as_returning())
                    .get_result(conn)
                    .await
                    .context("Failed to register payment")?;

                let paid = payments::total_paid(conn, order_id).await?;
                let balance = Balance::new(order.total, paid);

                diesel::update(orders::table.find(order_id))
                    .set((
                        orders::payment_status.eq(balance.payment_status.as_str()),
                        orders::updated_at.eq(diesel::dsl::now),
                    ))
                    .execute(conn)
                    .await
                    .context("Failed to update payment status")?;

                Ok::<PaymentReceipt, AppError>(PaymentReceipt { payment, balance })
            })
        })
        .await?;

    tracing::info!(
        order_id,
        payment_id = receipt.payment.id,
        amount = %receipt.payment.amount,
        balance = %receipt.balance.balance,
        "payment registered"
    );
    Ok(receipt)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn cleaning_service(tracks_pairs: bool) -> ServiceEntity {
        ServiceEntity {
            id: 3,
            name: "Deep clean".into(),
            description: None,
            price: d("500.00"),
            tracks_pairs,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn line(quantity: i32, brand: Option<&str>) -> ServiceLineInput {
        ServiceLineInput {
            service_id: 3,
            quantity,
            brand: brand.map(str::to_string),
            model: None,
            description: None,
        }
    }

    fn order_with_status(status_id: i32) -> OrderEntity {
        OrderEntity {
            id: 1,
            code: "ORD-20250101-ABCDEF".into(),
            client_id: 1,
            received_by: 1,
            delivered_by: None,
            subtotal: Decimal::ZERO,
            tax: Decimal::ZERO,
            discount: Decimal::ZERO,
            total: Decimal::ZERO,
            current_status_id: status_id,
            payment_status: "pending".into(),
            requires_id: false,
            id_on_file: false,
            notes: None,
            reservation_code: None,
            estimated_delivery: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn history_with_status(status_id: i32) -> StatusHistoryEntity {
        StatusHistoryEntity {
            id: 9,
            order_id: 1,
            status_id,
            employee_id: 1,
            comment: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn pairs_with_details_are_split_one_per_row() {
        let rows = expand_service_line(10, &cleaning_service(true), line(3, Some("Nike")));

        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.quantity == 1));
        assert!(rows.iter().all(|r| r.subtotal == d("500.00")));
        assert!(rows.iter().all(|r| r.brand.as_deref() == Some("Nike")));
    }

    #[test]
    fn line_without_details_stays_whole() {
        let rows = expand_service_line(10, &cleaning_service(true), line(2, None));

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].quantity, 2);
        assert_eq!(rows[0].subtotal, d("1000.00"));
    }

    #[test]
    fn blank_details_do_not_count() {
        let rows = expand_service_line(10, &cleaning_service(true), line(2, Some("  ")));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].brand, None);
    }

    #[test]
    fn services_without_pairs_are_not_split() {
        let rows = expand_service_line(10, &cleaning_service(false), line(2, Some("Nike")));
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn transition_is_verified_on_both_sides() {
        let order = order_with_status(status::RECEIVED);
        let history = history_with_status(status::RECEIVED);
        assert!(verify_transition(Some(&history), &order, status::RECEIVED).is_ok());
    }

    #[test]
    fn missing_history_is_inconsistent() {
        let order = order_with_status(status::RECEIVED);
        let err = verify_transition(None, &order, status::RECEIVED).unwrap_err();
        assert!(matches!(err, AppError::InconsistentState(_)));
    }

    #[test]
    fn drifted_order_row_is_inconsistent() {
        let order = order_with_status(status::PENDING);
        let history = history_with_status(status::RECEIVED);
        let err = verify_transition(Some(&history), &order, status::RECEIVED).unwrap_err();
        assert!(matches!(err, AppError::InconsistentState(_)));
    }

    #[test]
    fn non_positive_payments_are_refused() {
        for amount in ["0", "-10", "0.001"] {
            let err = checked_payment_amount(d(amount)).unwrap_err();
            assert!(matches!(err, AppError::InvalidState(_)), "{amount}");
        }
        assert_eq!(checked_payment_amount(d("696")).unwrap(), d("696.00"));
    }

    #[test]
    fn legacy_field_names_are_accepted() {
        let change: ChangeStatus =
            serde_json::from_str(r#"{"estadoId": 4, "comentario": "listo"}"#).unwrap();
        assert_eq!(change.status_id, 4);

        let payment: NewPayment =
            serde_json::from_str(r#"{"monto": "100.50", "metodo": "cash"}"#).unwrap();
        assert_eq!(payment.amount, d("100.50"));
        assert_eq!(payment.method, PaymentMethod::Cash);
    }

    #[test]
    fn quantity_defaults_to_one() {
        let input: ServiceLineInput = serde_json::from_str(r#"{"service_id": 1}"#).unwrap();
        assert_eq!(input.quantity, 1);
    }
}
