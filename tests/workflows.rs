//! End-to-end workflow tests against a real Postgres.
//!
//! Set `TEST_DATABASE_URL` to run them; they return early otherwise. Every
//! test creates its own client, employee and catalog rows.

use std::sync::Once;

use chrono::NaiveDate;
use diesel::{Connection, PgConnection};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use rust_decimal::Decimal;
use shoecare_orderservice::{
    core::app_error::AppError,
    models::{
        CreateClientEntity, CreateEmployeeEntity, CreateProductEntity, CreateServiceEntity,
        PaymentMethod, PaymentStatus, ReservationEntity, ReservationState, status,
    },
    repos::{catalog, clients, employees, payments, reservations},
    workflows::{
        bookings,
        orders::{self, ChangeStatus, NewOrder, NewPayment, ProductLineInput, ServiceLineInput},
        storage::{self, StorageInput},
    },
};
use uuid::Uuid;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");
static MIGRATED: Once = Once::new();

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

async fn connect() -> Option<AsyncPgConnection> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return None;
    };
    MIGRATED.call_once(|| {
        let mut conn = PgConnection::establish(&url).unwrap();
        conn.run_pending_migrations(MIGRATIONS).unwrap();
    });
    Some(AsyncPgConnection::establish(&url).await.unwrap())
}

struct Fixture {
    client_id: i32,
    employee_id: i32,
    service_id: i32,
    product_id: i32,
}

async fn fixture(conn: &mut AsyncPgConnection) -> Fixture {
    let tag = Uuid::new_v4().simple().to_string();
    let client = clients::create(
        conn,
        CreateClientEntity {
            name: format!("Client {tag}"),
            phone: None,
            email: None,
            notes: None,
        },
    )
    .await
    .unwrap();
    let employee = employees::create(
        conn,
        CreateEmployeeEntity {
            name: format!("Clerk {tag}"),
            email: None,
            role: employees::STAFF_ROLE.into(),
        },
    )
    .await
    .unwrap();
    let service = catalog::create_service(
        conn,
        CreateServiceEntity {
            name: format!("Deep clean {tag}"),
            description: None,
            price: d("500.00"),
            tracks_pairs: true,
        },
    )
    .await
    .unwrap();
    let product = catalog::create_product(
        conn,
        CreateProductEntity {
            name: format!("Laces {tag}"),
            sku: Some(tag),
            price: d("50.00"),
            stock: 10,
        },
    )
    .await
    .unwrap();

    Fixture {
        client_id: client.id,
        employee_id: employee.id,
        service_id: service.id,
        product_id: product.id,
    }
}

fn new_order(f: &Fixture, services: Vec<ServiceLineInput>, products: Vec<ProductLineInput>) -> NewOrder {
    NewOrder {
        client_id: f.client_id,
        reservation_id: None,
        estimated_delivery: None,
        notes: None,
        requires_id: false,
        id_on_file: false,
        services,
        products,
    }
}

fn service_line(f: &Fixture, quantity: i32, brand: Option<&str>) -> ServiceLineInput {
    ServiceLineInput {
        service_id: f.service_id,
        quantity,
        brand: brand.map(str::to_string),
        model: None,
        description: None,
    }
}

fn cash(amount: &str) -> NewPayment {
    NewPayment {
        amount: d(amount),
        method: PaymentMethod::Cash,
        reference: None,
        terminal_id: None,
    }
}

async fn book(conn: &mut AsyncPgConnection, f: &Fixture) -> ReservationEntity {
    reservations::create(
        conn,
        reservations::NewReservation {
            client_id: f.client_id,
            service_id: f.service_id,
            requested_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            service_price: Some(d("300")),
            brand: Some("Adidas".into()),
            model: None,
            description: None,
            notes: Some("white sole".into()),
        },
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn order_is_priced_changed_and_paid() {
    let Some(mut conn) = connect().await else { return };
    let f = fixture(&mut conn).await;
    let rate = d("0.16");

    let created = orders::create_order(
        &mut conn,
        new_order(
            &f,
            vec![service_line(&f, 1, None)],
            vec![ProductLineInput { product_id: f.product_id, quantity: 2 }],
        ),
        f.employee_id,
        rate,
    )
    .await
    .unwrap();

    assert!(created.order_code.starts_with("ORD-"));
    assert_eq!(created.totals.subtotal, d("600.00"));
    assert_eq!(created.totals.tax, d("96.00"));
    assert_eq!(created.totals.total, d("696.00"));

    let history = orders::status_history(&mut conn, created.order_id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status_id, status::PENDING);

    let change = orders::change_order_status(
        &mut conn,
        created.order_id,
        ChangeStatus { status_id: status::RECEIVED, comment: Some("at the counter".into()) },
        f.employee_id,
    )
    .await
    .unwrap();
    assert_eq!(change.order.current_status_id, status::RECEIVED);
    assert_eq!(change.history.status_id, status::RECEIVED);
    let history = orders::status_history(&mut conn, created.order_id).await.unwrap();
    assert_eq!(history.len(), 2);

    let refused = orders::register_payment(&mut conn, created.order_id, cash("0"), f.employee_id)
        .await
        .unwrap_err();
    assert!(matches!(refused, AppError::InvalidState(_)));
    assert_eq!(payments::total_paid(&mut conn, created.order_id).await.unwrap(), Decimal::ZERO);

    let receipt = orders::register_payment(&mut conn, created.order_id, cash("696.00"), f.employee_id)
        .await
        .unwrap();
    assert_eq!(receipt.balance.balance, d("0.00"));
    assert_eq!(receipt.balance.payment_status, PaymentStatus::Paid);

    let detail = orders::order_detail(&mut conn, created.order_id).await.unwrap();
    assert_eq!(detail.order.payment_status, "paid");
    assert_eq!(detail.product_lines[0].quantity, 2);

    let laces = catalog::get_product(&mut conn, f.product_id).await.unwrap();
    assert_eq!(laces.stock, 8);
}

#[tokio::test]
async fn unknown_status_rolls_back() {
    let Some(mut conn) = connect().await else { return };
    let f = fixture(&mut conn).await;

    let created = orders::create_order(&mut conn, new_order(&f, vec![], vec![]), f.employee_id, d("0.16"))
        .await
        .unwrap();

    let err = orders::change_order_status(
        &mut conn,
        created.order_id,
        ChangeStatus { status_id: 999, comment: None },
        f.employee_id,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
    let history = orders::status_history(&mut conn, created.order_id).await.unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn closed_orders_take_no_more_lines() {
    let Some(mut conn) = connect().await else { return };
    let f = fixture(&mut conn).await;
    let rate = d("0.16");

    let created = orders::create_order(&mut conn, new_order(&f, vec![], vec![]), f.employee_id, rate)
        .await
        .unwrap();
    orders::change_order_status(
        &mut conn,
        created.order_id,
        ChangeStatus { status_id: status::CANCELLED, comment: None },
        f.employee_id,
    )
    .await
    .unwrap();

    let err = orders::add_service_line(&mut conn, created.order_id, service_line(&f, 1, None), rate)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));
}

#[tokio::test]
async fn reservation_transfers_exactly_once() {
    let Some(mut conn) = connect().await else { return };
    let f = fixture(&mut conn).await;

    let reservation = book(&mut conn, &f).await;

    let transferred = bookings::transfer_booking_to_order(
        &mut conn,
        reservation.id,
        f.employee_id,
        None,
        d("0.16"),
    )
    .await
    .unwrap();
    assert_eq!(transferred.total, d("348.00"));

    let reservation = reservations::get(&mut conn, reservation.id).await.unwrap();
    assert_eq!(
        reservations::state_of(&reservation).unwrap(),
        ReservationState::TransferredToOrder
    );
    assert_eq!(reservation.order_id, Some(transferred.order_id));

    let detail = orders::order_detail(&mut conn, transferred.order_id).await.unwrap();
    assert_eq!(detail.order.subtotal, d("300.00"));
    assert_eq!(detail.order.tax, d("48.00"));
    assert_eq!(detail.order.reservation_code.as_deref(), Some(reservation.code.as_str()));
    assert_eq!(detail.service_lines.len(), 1);

    let again = bookings::transfer_booking_to_order(
        &mut conn,
        reservation.id,
        f.employee_id,
        None,
        d("0.16"),
    )
    .await
    .unwrap_err();
    assert!(matches!(again, AppError::InvalidState(_)));
}

#[tokio::test]
async fn storage_location_is_last_write_wins() {
    let Some(mut conn) = connect().await else { return };
    let f = fixture(&mut conn).await;

    let created = orders::create_order(
        &mut conn,
        new_order(&f, vec![service_line(&f, 2, Some("Nike"))], vec![]),
        f.employee_id,
        d("0.16"),
    )
    .await
    .unwrap();
    let detail = orders::order_detail(&mut conn, created.order_id).await.unwrap();
    assert_eq!(detail.service_lines.len(), 2);
    let line_id = detail.service_lines[0].id;

    let missing = storage::missing_locations(&mut conn).await.unwrap();
    assert!(missing.iter().any(|p| p.line_id == line_id));

    for (box_name, location_code) in [("A", "A-01"), ("B", "B-07")] {
        let assignment = storage::assign_storage_location(
            &mut conn,
            created.order_id,
            line_id,
            StorageInput {
                box_name: box_name.into(),
                location_code: location_code.into(),
                special_notes: None,
            },
            f.employee_id,
        )
        .await
        .unwrap();
        assert!(assignment.audit_recorded);
    }

    let detail = orders::order_detail(&mut conn, created.order_id).await.unwrap();
    let line = detail.service_lines.iter().find(|l| l.id == line_id).unwrap();
    assert_eq!(line.storage_box.as_deref(), Some("B"));
    assert_eq!(line.storage_location.as_deref(), Some("B-07"));

    let missing = storage::missing_locations(&mut conn).await.unwrap();
    assert!(!missing.iter().any(|p| p.line_id == line_id));

    let history = storage::history(&mut conn, created.order_id, line_id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].storage_box, "B");

    let wrong_order = storage::assign_storage_location(
        &mut conn,
        created.order_id + 1_000_000,
        line_id,
        StorageInput {
            box_name: "C".into(),
            location_code: "C-01".into(),
            special_notes: None,
        },
        f.employee_id,
    )
    .await
    .unwrap_err();
    assert!(matches!(wrong_order, AppError::NotFound(_)));
}

#[tokio::test]
async fn cancelling_a_transferred_reservation_is_refused() {
    let Some(mut conn) = connect().await else { return };
    let f = fixture(&mut conn).await;
    let reservation = book(&mut conn, &f).await;

    let transferred =
        bookings::transfer_booking_to_order(&mut conn, reservation.id, f.employee_id, None, d("0.16"))
            .await
            .unwrap();

    let err = reservations::cancel(&mut conn, reservation.id).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));

    let reservation = reservations::get(&mut conn, reservation.id).await.unwrap();
    assert_eq!(
        reservations::state_of(&reservation).unwrap(),
        ReservationState::TransferredToOrder
    );
    assert!(reservation.is_active);
    assert_eq!(reservation.order_id, Some(transferred.order_id));
}

#[tokio::test]
async fn concurrent_payments_settle_the_order() {
    let Some(mut conn) = connect().await else { return };
    let Some(mut other) = connect().await else { return };
    let f = fixture(&mut conn).await;

    let created = orders::create_order(
        &mut conn,
        new_order(
            &f,
            vec![service_line(&f, 1, None)],
            vec![ProductLineInput { product_id: f.product_id, quantity: 2 }],
        ),
        f.employee_id,
        d("0.16"),
    )
    .await
    .unwrap();
    assert_eq!(created.totals.total, d("696.00"));

    let (first, second) = tokio::join!(
        orders::register_payment(&mut conn, created.order_id, cash("348.00"), f.employee_id),
        orders::register_payment(&mut other, created.order_id, cash("348.00"), f.employee_id),
    );
    first.unwrap();
    second.unwrap();

    assert_eq!(payments::total_paid(&mut conn, created.order_id).await.unwrap(), d("696.00"));
    let order = orders::get_order(&mut conn, created.order_id).await.unwrap();
    assert_eq!(order.payment_status, "paid");
}

#[tokio::test]
async fn storage_location_survives_a_failed_audit() {
    let Some(mut conn) = connect().await else { return };
    // Everything below is rolled back when the connection drops.
    conn.begin_test_transaction().await.unwrap();
    let f = fixture(&mut conn).await;

    let created = orders::create_order(
        &mut conn,
        new_order(&f, vec![service_line(&f, 1, None)], vec![]),
        f.employee_id,
        d("0.16"),
    )
    .await
    .unwrap();
    let detail = orders::order_detail(&mut conn, created.order_id).await.unwrap();
    let line_id = detail.service_lines[0].id;

    diesel::sql_query("ALTER TABLE storage_history RENAME TO storage_history_offline")
        .execute(&mut conn)
        .await
        .unwrap();

    let assignment = storage::assign_storage_location(
        &mut conn,
        created.order_id,
        line_id,
        StorageInput {
            box_name: "D".into(),
            location_code: "D-03".into(),
            special_notes: Some("left heel loose".into()),
        },
        f.employee_id,
    )
    .await
    .unwrap();

    assert!(!assignment.audit_recorded);
    assert_eq!(assignment.line.storage_box.as_deref(), Some("D"));

    let detail = orders::order_detail(&mut conn, created.order_id).await.unwrap();
    let line = detail.service_lines.iter().find(|l| l.id == line_id).unwrap();
    assert_eq!(line.storage_location.as_deref(), Some("D-03"));
    assert!(line.stored_at.is_some());
}

#[tokio::test]
async fn order_with_a_reservation_consumes_it() {
    let Some(mut conn) = connect().await else { return };
    let f = fixture(&mut conn).await;
    let reservation = book(&mut conn, &f).await;

    let mut order = new_order(&f, vec![service_line(&f, 1, None)], vec![]);
    order.reservation_id = Some(reservation.id);
    let created = orders::create_order(&mut conn, order, f.employee_id, d("0.16"))
        .await
        .unwrap();

    let reservation = reservations::get(&mut conn, reservation.id).await.unwrap();
    assert_eq!(
        reservations::state_of(&reservation).unwrap(),
        ReservationState::TransferredToOrder
    );
    assert_eq!(reservation.order_id, Some(created.order_id));
    let detail = orders::order_detail(&mut conn, created.order_id).await.unwrap();
    assert_eq!(detail.order.reservation_code.as_deref(), Some(reservation.code.as_str()));

    let mut again = new_order(&f, vec![], vec![]);
    again.reservation_id = Some(reservation.id);
    let err = orders::create_order(&mut conn, again, f.employee_id, d("0.16"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));

    let transfer = bookings::transfer_booking_to_order(
        &mut conn,
        reservation.id,
        f.employee_id,
        None,
        d("0.16"),
    )
    .await
    .unwrap_err();
    assert!(matches!(transfer, AppError::InvalidState(_)));
}

#[tokio::test]
async fn order_cannot_take_another_clients_reservation() {
    let Some(mut conn) = connect().await else { return };
    let owner = fixture(&mut conn).await;
    let stranger = fixture(&mut conn).await;
    let reservation = book(&mut conn, &owner).await;

    let mut order = new_order(&stranger, vec![], vec![]);
    order.reservation_id = Some(reservation.id);
    let err = orders::create_order(&mut conn, order, stranger.employee_id, d("0.16"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let reservation = reservations::get(&mut conn, reservation.id).await.unwrap();
    assert_eq!(reservations::state_of(&reservation).unwrap(), ReservationState::Pending);
    assert_eq!(reservation.order_id, None);
}
