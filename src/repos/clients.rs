use anyhow::Context;
use diesel::{
    BoolExpressionMethods, ExpressionMethods, OptionalExtension, PgTextExpressionMethods,
    QueryDsl, SelectableHelper,
};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    core::app_error::AppError,
    models::{
        AddressEntity, ClientEntity, CreateAddressEntity, CreateClientEntity, UpdateClientEntity,
    },
    schema::{addresses, clients},
};

pub async fn create(
    conn: &mut AsyncPgConnection,
    new_client: CreateClientEntity,
) -> Result<ClientEntity, AppError> {
    if new_client.name.trim().is_empty() {
        return Err(AppError::bad_request("Client name must not be empty"));
    }

    let client = diesel::insert_into(clients::table)
        .values(new_client)
        .returning(ClientEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to create client")?;

    Ok(client)
}

pub async fn get(conn: &mut AsyncPgConnection, id: i32) -> Result<ClientEntity, AppError> {
    clients::table
        .find(id)
        .select(ClientEntity::as_select())
        .first(conn)
        .await
        .optional()?
        .ok_or_else(|| AppError::not_found(format!("Client #{id}")))
}

/// Clients matching `search` on name, phone or email; all when `None`.
pub async fn list(
    conn: &mut AsyncPgConnection,
    search: Option<&str>,
) -> Result<Vec<ClientEntity>, AppError> {
    let mut query = clients::table
        .select(ClientEntity::as_select())
        .order_by(clients::name.asc())
        .into_boxed();

    if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = format!("%{term}%");
        query = query.filter(
            clients::name
                .ilike(pattern.clone())
                .or(clients::phone.ilike(pattern.clone()))
                .or(clients::email.ilike(pattern)),
        );
    }

    let clients = query.load(conn).await.context("Failed to list clients")?;
    Ok(clients)
}

pub async fn update(
    conn: &mut AsyncPgConnection,
    id: i32,
    changes: UpdateClientEntity,
) -> Result<ClientEntity, AppError> {
    if changes.name.is_none()
        && changes.phone.is_none()
        && changes.email.is_none()
        && changes.notes.is_none()
    {
        return Err(AppError::bad_request("Nothing to update"));
    }
    if changes.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::bad_request("Client name must not be empty"));
    }

    diesel::update(clients::table.find(id))
        .set((changes, clients::updated_at.eq(diesel::dsl::now)))
        .returning(ClientEntity::as_returning())
        .get_result(conn)
        .await
        .optional()?
        .ok_or_else(|| AppError::not_found(format!("Client #{id}")))
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct NewAddress {
    pub street: String,
    pub neighborhood: Option<String>,
    pub city: String,
    pub postal_code: Option<String>,
    pub reference: Option<String>,
}

pub async fn add_address(
    conn: &mut AsyncPgConnection,
    client_id: i32,
    address: NewAddress,
) -> Result<AddressEntity, AppError> {
    if address.street.trim().is_empty() || address.city.trim().is_empty() {
        return Err(AppError::bad_request("Street and city are required"));
    }
    get(conn, client_id).await?;

    let address = diesel::insert_into(addresses::table)
        .values(CreateAddressEntity {
            client_id,
            street: address.street,
            neighborhood: address.neighborhood,
            city: address.city,
            postal_code: address.postal_code,
            reference: address.reference,
        })
        .returning(AddressEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to create address")?;

    Ok(address)
}

pub async fn list_addresses(
    conn: &mut AsyncPgConnection,
    client_id: i32,
) -> Result<Vec<AddressEntity>, AppError> {
    get(conn, client_id).await?;

    let addresses = addresses::table
        .filter(addresses::client_id.eq(client_id))
        .select(AddressEntity::as_select())
        .order_by(addresses::created_at.desc())
        .load(conn)
        .await
        .context("Failed to list addresses")?;

    Ok(addresses)
}
