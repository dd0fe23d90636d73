//! Services, products and order statuses.

use anyhow::Context;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use rust_decimal::Decimal;

use crate::{
    core::app_error::AppError,
    models::{
        CreateProductEntity, CreateServiceEntity, OrderStatusEntity, ProductEntity,
        ServiceEntity, UpdateProductEntity, UpdateServiceEntity,
    },
    schema::{order_statuses, products, services},
};

fn check_price(price: Option<Decimal>) -> Result<(), AppError> {
    match price {
        Some(p) if p.is_sign_negative() => Err(AppError::bad_request("Price must not be negative")),
        _ => Ok(()),
    }
}

// Services

pub async fn create_service(
    conn: &mut AsyncPgConnection,
    new_service: CreateServiceEntity,
) -> Result<ServiceEntity, AppError> {
    if new_service.name.trim().is_empty() {
        return Err(AppError::bad_request("Service name must not be empty"));
    }
    check_price(Some(new_service.price))?;

    let service = diesel::insert_into(services::table)
        .values(new_service)
        .returning(ServiceEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to create service")?;

    Ok(service)
}

pub async fn get_service(conn: &mut AsyncPgConnection, id: i32) -> Result<ServiceEntity, AppError> {
    services::table
        .find(id)
        .select(ServiceEntity::as_select())
        .first(conn)
        .await
        .optional()?
        .ok_or_else(|| AppError::not_found(format!("Service #{id}")))
}

/// A service that can still be sold.
pub async fn get_active_service(
    conn: &mut AsyncPgConnection,
    id: i32,
) -> Result<ServiceEntity, AppError> {
    let service = get_service(conn, id).await?;
    if !service.is_active {
        return Err(AppError::not_found(format!("Active service #{id}")));
    }
    Ok(service)
}

pub async fn list_services(
    conn: &mut AsyncPgConnection,
    include_inactive: bool,
) -> Result<Vec<ServiceEntity>, AppError> {
    let mut query = services::table
        .select(ServiceEntity::as_select())
        .order_by(services::name.asc())
        .into_boxed();
    if !include_inactive {
        query = query.filter(services::is_active.eq(true));
    }

    let services = query.load(conn).await.context("Failed to list services")?;
    Ok(services)
}

pub async fn update_service(
    conn: &mut AsyncPgConnection,
    id: i32,
    changes: UpdateServiceEntity,
) -> Result<ServiceEntity, AppError> {
    if changes.name.is_none()
        && changes.description.is_none()
        && changes.price.is_none()
        && changes.tracks_pairs.is_none()
        && changes.is_active.is_none()
    {
        return Err(AppError::bad_request("Nothing to update"));
    }
    check_price(changes.price)?;

    diesel::update(services::table.find(id))
        .set(changes)
        .returning(ServiceEntity::as_returning())
        .get_result(conn)
        .await
        .optional()?
        .ok_or_else(|| AppError::not_found(format!("Service #{id}")))
}

// Products

pub async fn create_product(
    conn: &mut AsyncPgConnection,
    new_product: CreateProductEntity,
) -> Result<ProductEntity, AppError> {
    if new_product.name.trim().is_empty() {
        return Err(AppError::bad_request("Product name must not be empty"));
    }
    if new_product.stock < 0 {
        return Err(AppError::bad_request("Stock must not be negative"));
    }
    check_price(Some(new_product.price))?;

    let product = diesel::insert_into(products::table)
        .values(new_product)
        .returning(ProductEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to create product")?;

    Ok(product)
}

pub async fn get_product(conn: &mut AsyncPgConnection, id: i32) -> Result<ProductEntity, AppError> {
    products::table
        .find(id)
        .select(ProductEntity::as_select())
        .first(conn)
        .await
        .optional()?
        .ok_or_else(|| AppError::not_found(format!("Product #{id}")))
}

pub async fn list_products(conn: &mut AsyncPgConnection) -> Result<Vec<ProductEntity>, AppError> {
    let products = products::table
        .select(ProductEntity::as_select())
        .order_by(products::name.asc())
        .load(conn)
        .await
        .context("Failed to list products")?;

    Ok(products)
}

pub async fn update_product(
    conn: &mut AsyncPgConnection,
    id: i32,
    changes: UpdateProductEntity,
) -> Result<ProductEntity, AppError> {
    if changes.name.is_none()
        && changes.sku.is_none()
        && changes.price.is_none()
        && changes.stock.is_none()
        && changes.is_active.is_none()
    {
        return Err(AppError::bad_request("Nothing to update"));
    }
    if changes.stock.is_some_and(|s| s < 0) {
        return Err(AppError::bad_request("Stock must not be negative"));
    }
    check_price(changes.price)?;

    diesel::update(products::table.find(id))
        .set(changes)
        .returning(ProductEntity::as_returning())
        .get_result(conn)
        .await
        .optional()?
        .ok_or_else(|| AppError::not_found(format!("Product #{id}")))
}

/// Decrement stock by `quantity`, refusing to go below zero.
pub async fn take_stock(
    conn: &mut AsyncPgConnection,
    id: i32,
    quantity: i32,
) -> Result<ProductEntity, AppError> {
    let updated = diesel::update(
        products::table
            .find(id)
            .filter(products::stock.ge(quantity)),
    )
    .set(products::stock.eq(products::stock - quantity))
    .returning(ProductEntity::as_returning())
    .get_result(conn)
    .await
    .optional()?;

    match updated {
        Some(product) => Ok(product),
        None => {
            let product = get_product(conn, id).await?;
            Err(AppError::invalid_state(format!(
                "Insufficient stock for {}: {} left, {} requested",
                product.name, product.stock, quantity
            )))
        }
    }
}

// Statuses

pub async fn list_statuses(
    conn: &mut AsyncPgConnection,
) -> Result<Vec<OrderStatusEntity>, AppError> {
    let statuses = order_statuses::table
        .select(OrderStatusEntity::as_select())
        .order_by(order_statuses::sort_order.asc())
        .load(conn)
        .await
        .context("Failed to list order statuses")?;

    Ok(statuses)
}

pub async fn get_status(
    conn: &mut AsyncPgConnection,
    id: i32,
) -> Result<OrderStatusEntity, AppError> {
    order_statuses::table
        .find(id)
        .select(OrderStatusEntity::as_select())
        .first(conn)
        .await
        .optional()?
        .ok_or_else(|| AppError::not_found(format!("Order status #{id}")))
}
