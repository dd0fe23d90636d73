use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use diesel::{
    Selectable,
    prelude::{AsChangeset, Identifiable, Insertable, Queryable},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Clients

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::clients)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ClientEntity {
    pub id: i32,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Deserialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::clients)]
pub struct CreateClientEntity {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
}

#[derive(AsChangeset, Deserialize, Debug, Default, ToSchema)]
#[diesel(table_name = crate::schema::clients)]
pub struct UpdateClientEntity {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::addresses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AddressEntity {
    pub id: i32,
    pub client_id: i32,
    pub street: String,
    pub neighborhood: Option<String>,
    pub city: String,
    pub postal_code: Option<String>,
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::addresses)]
pub struct CreateAddressEntity {
    pub client_id: i32,
    pub street: String,
    pub neighborhood: Option<String>,
    pub city: String,
    pub postal_code: Option<String>,
    pub reference: Option<String>,
}

// Employees

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::employees)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EmployeeEntity {
    pub id: i32,
    pub name: String,
    pub email: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Deserialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::employees)]
pub struct CreateEmployeeEntity {
    pub name: String,
    pub email: Option<String>,
    pub role: String,
}

// Catalog

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::services)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ServiceEntity {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    /// Lines of this service stand for physical pairs that get a storage slot.
    pub tracks_pairs: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Deserialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::services)]
pub struct CreateServiceEntity {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub tracks_pairs: bool,
}

#[derive(AsChangeset, Deserialize, Debug, Default, ToSchema)]
#[diesel(table_name = crate::schema::services)]
pub struct UpdateServiceEntity {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub tracks_pairs: Option<bool>,
    pub is_active: Option<bool>,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductEntity {
    pub id: i32,
    pub name: String,
    pub sku: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Deserialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::products)]
pub struct CreateProductEntity {
    pub name: String,
    pub sku: Option<String>,
    pub price: Decimal,
    pub stock: i32,
}

#[derive(AsChangeset, Deserialize, Debug, Default, ToSchema)]
#[diesel(table_name = crate::schema::products)]
pub struct UpdateProductEntity {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::order_statuses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderStatusEntity {
    pub id: i32,
    pub code: String,
    pub name: String,
    pub sort_order: i32,
    pub is_terminal: bool,
}

// Orders

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderEntity {
    pub id: i32,
    pub code: String,
    pub client_id: i32,
    pub received_by: i32,
    pub delivered_by: Option<i32>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub current_status_id: i32,
    pub payment_status: String,
    pub requires_id: bool,
    pub id_on_file: bool,
    pub notes: Option<String>,
    pub reservation_code: Option<String>,
    pub estimated_delivery: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreateOrderEntity {
    pub code: String,
    pub client_id: i32,
    pub received_by: i32,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub current_status_id: i32,
    pub payment_status: String,
    pub requires_id: bool,
    pub id_on_file: bool,
    pub notes: Option<String>,
    pub reservation_code: Option<String>,
    pub estimated_delivery: Option<NaiveDate>,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::order_service_lines)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ServiceLineEntity {
    pub id: i32,
    pub order_id: i32,
    pub service_id: i32,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub description: Option<String>,
    pub storage_box: Option<String>,
    pub storage_location: Option<String>,
    pub storage_notes: Option<String>,
    pub stored_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::order_service_lines)]
pub struct CreateServiceLineEntity {
    pub order_id: i32,
    pub service_id: i32,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub description: Option<String>,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::order_product_lines)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductLineEntity {
    pub id: i32,
    pub order_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::order_product_lines)]
pub struct CreateProductLineEntity {
    pub order_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::order_status_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StatusHistoryEntity {
    pub id: i32,
    pub order_id: i32,
    pub status_id: i32,
    pub employee_id: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::order_status_history)]
pub struct CreateStatusHistoryEntity {
    pub order_id: i32,
    pub status_id: i32,
    pub employee_id: i32,
    pub comment: Option<String>,
}

// Payments

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PaymentEntity {
    pub id: i32,
    pub order_id: i32,
    pub amount: Decimal,
    pub method: String,
    pub reference: Option<String>,
    pub terminal_id: Option<String>,
    pub employee_id: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::payments)]
pub struct CreatePaymentEntity {
    pub order_id: i32,
    pub amount: Decimal,
    pub method: String,
    pub reference: Option<String>,
    pub terminal_id: Option<String>,
    pub employee_id: i32,
}

// Media

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::media_files)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MediaFileEntity {
    pub id: i32,
    pub order_id: i32,
    pub url: String,
    pub kind: String,
    pub uploaded_by: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::media_files)]
pub struct CreateMediaFileEntity {
    pub order_id: i32,
    pub url: String,
    pub kind: String,
    pub uploaded_by: i32,
}

// Reservations

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::reservations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ReservationEntity {
    pub id: i32,
    pub code: String,
    pub client_id: i32,
    pub service_id: i32,
    pub service_price: Decimal,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub description: Option<String>,
    pub requested_date: NaiveDate,
    pub state: String,
    pub is_active: bool,
    pub order_id: Option<i32>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::reservations)]
pub struct CreateReservationEntity {
    pub code: String,
    pub client_id: i32,
    pub service_id: i32,
    pub service_price: Decimal,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub description: Option<String>,
    pub requested_date: NaiveDate,
    pub state: String,
    pub notes: Option<String>,
}

// Storage

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::storage_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StorageHistoryEntity {
    pub id: i32,
    pub service_line_id: i32,
    pub order_id: i32,
    pub storage_box: String,
    pub storage_location: String,
    pub storage_notes: Option<String>,
    pub employee_id: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::storage_history)]
pub struct CreateStorageHistoryEntity {
    pub service_line_id: i32,
    pub order_id: i32,
    pub storage_box: String,
    pub storage_location: String,
    pub storage_notes: Option<String>,
    pub employee_id: i32,
}

// Enumerations stored as text

/// Returned when a text column holds a value the enum does not know.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value `{value}`")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

text_enum!(PaymentStatus, "payment status", {
    Pending => "pending",
    Partial => "partial",
    Paid => "paid",
});

text_enum!(PaymentMethod, "payment method", {
    Cash => "cash",
    Card => "card",
    Transfer => "transfer",
});

text_enum!(ReservationState, "reservation state", {
    Pending => "pending",
    Completed => "completed",
    Cancelled => "cancelled",
    TransferredToOrder => "transferred_to_order",
});

impl ReservationState {
    /// States from which a reservation can no longer become an order.
    pub fn is_processed(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Cancelled | Self::TransferredToOrder
        )
    }
}

/// Well-known rows of `order_statuses`, seeded by the first migration.
pub mod status {
    pub const PENDING: i32 = 1;
    pub const RECEIVED: i32 = 2;
    pub const IN_PROGRESS: i32 = 3;
    pub const COMPLETED: i32 = 4;
    pub const DELIVERED: i32 = 5;
    pub const CANCELLED: i32 = 6;

    pub const TERMINAL: [i32; 2] = [DELIVERED, CANCELLED];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reservation_state_parses_stored_text() {
        assert_eq!(
            "transferred_to_order".parse::<ReservationState>(),
            Ok(ReservationState::TransferredToOrder)
        );
        assert!("transferida".parse::<ReservationState>().is_err());
    }

    #[test]
    fn processed_reservation_states() {
        assert!(!ReservationState::Pending.is_processed());
        assert!(ReservationState::Completed.is_processed());
        assert!(ReservationState::TransferredToOrder.is_processed());
    }

    #[test]
    fn payment_method_serializes_as_stored_text() {
        let json = serde_json::to_string(&PaymentMethod::Transfer).unwrap();
        assert_eq!(json, "\"transfer\"");
        assert_eq!(PaymentMethod::Card.as_str(), "card");
    }
}
