//! Where each finished pair is shelved, and the views over it.

use std::collections::BTreeMap;

use anyhow::Context;
use chrono::{DateTime, Utc};
use diesel::{
    BoolExpressionMethods, ExpressionMethods, OptionalExtension, PgTextExpressionMethods,
    QueryDsl, Queryable, SelectableHelper,
};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    core::{aliases::DieselError, app_error::AppError},
    models::{CreateStorageHistoryEntity, ServiceLineEntity, StorageHistoryEntity, status},
    repos::employees,
    schema::{order_service_lines, orders, services, storage_history},
};

const TOP_BOXES: usize = 5;

#[derive(Deserialize, Debug, ToSchema)]
pub struct StorageInput {
    pub box_name: String,
    pub location_code: String,
    pub special_notes: Option<String>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct StorageAssignment {
    pub line: ServiceLineEntity,
    /// False when the location was saved but its audit row was not.
    pub audit_recorded: bool,
}

/// A service line together with the order it belongs to.
#[derive(Queryable, Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct StoredPair {
    pub line_id: i32,
    pub order_id: i32,
    pub order_code: String,
    pub current_status_id: i32,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub description: Option<String>,
    pub storage_box: Option<String>,
    pub storage_location: Option<String>,
    pub storage_notes: Option<String>,
    pub stored_at: Option<DateTime<Utc>>,
}

type PairColumns = (
    order_service_lines::id,
    order_service_lines::order_id,
    orders::code,
    orders::current_status_id,
    order_service_lines::brand,
    order_service_lines::model,
    order_service_lines::description,
    order_service_lines::storage_box,
    order_service_lines::storage_location,
    order_service_lines::storage_notes,
    order_service_lines::stored_at,
);

const PAIR_COLUMNS: PairColumns = (
    order_service_lines::id,
    order_service_lines::order_id,
    orders::code,
    orders::current_status_id,
    order_service_lines::brand,
    order_service_lines::model,
    order_service_lines::description,
    order_service_lines::storage_box,
    order_service_lines::storage_location,
    order_service_lines::storage_notes,
    order_service_lines::stored_at,
);

#[derive(Serialize, Debug, PartialEq, ToSchema)]
pub struct StorageBox {
    pub box_name: String,
    pub pairs: Vec<StoredPair>,
}

#[derive(Serialize, Debug, PartialEq, ToSchema)]
pub struct BoxCount {
    pub box_name: String,
    pub pairs: usize,
}

#[derive(Serialize, Debug, PartialEq, ToSchema)]
pub struct StorageStats {
    pub stored_pairs: usize,
    pub boxes_in_use: usize,
    pub average_days_stored: f64,
    pub top_boxes: Vec<BoxCount>,
    pub missing_location: usize,
}

fn required(value: &str, what: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::bad_request(format!("{what} must not be empty")));
    }
    Ok(value.to_string())
}

/// Shelve a pair. The last assignment wins; every assignment is also
/// appended to `storage_history`, after the line itself is saved.
pub async fn assign_storage_location(
    conn: &mut AsyncPgConnection,
    order_id: i32,
    service_line_id: i32,
    input: StorageInput,
    employee_id: i32,
) -> Result<StorageAssignment, AppError> {
    let box_name = required(&input.box_name, "Box")?;
    let location_code = required(&input.location_code, "Location")?;
    let notes = input
        .special_notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    employees::get(conn, employee_id).await?;

    let line = diesel::update(
        order_service_lines::table
            .filter(order_service_lines::id.eq(service_line_id))
            .filter(order_service_lines::order_id.eq(order_id)),
    )
    .set((
        order_service_lines::storage_box.eq(&box_name),
        order_service_lines::storage_location.eq(&location_code),
        order_service_lines::storage_notes.eq(&notes),
        order_service_lines::stored_at.eq(diesel::dsl::now),
    ))
    .returning(ServiceLineEntity::as_returning())
    .get_result(conn)
    .await
    .optional()?
    .ok_or_else(|| {
        AppError::not_found(format!("Service line #{service_line_id} of order #{order_id}"))
    })?;

    // Runs as a savepoint when the caller already holds a transaction, so a
    // failed audit row does not abort it.
    let entry = CreateStorageHistoryEntity {
        service_line_id,
        order_id,
        storage_box: box_name,
        storage_location: location_code,
        storage_notes: notes,
        employee_id,
    };
    let audit: Result<usize, DieselError> = conn
        .transaction(move |conn| {
            Box::pin(async move {
                diesel::insert_into(storage_history::table)
                    .values(entry)
                    .execute(conn)
                    .await
            })
        })
        .await;

    let audit_recorded = match audit {
        Ok(_) => true,
        Err(err) => {
            tracing::warn!(
                order_id,
                service_line_id,
                "storage location saved but audit row failed: {err}"
            );
            false
        }
    };

    tracing::info!(
        order_id,
        service_line_id,
        storage_box = line.storage_box.as_deref().unwrap_or_default(),
        "storage location assigned"
    );
    Ok(StorageAssignment {
        line,
        audit_recorded,
    })
}

/// Pairs whose box or location contains `term`, ignoring case.
pub async fn search(conn: &mut AsyncPgConnection, term: &str) -> Result<Vec<StoredPair>, AppError> {
    let term = term.trim();
    if term.is_empty() {
        return Err(AppError::bad_request("Search term must not be empty"));
    }
    let pattern = format!("%{term}%");

    let pairs = order_service_lines::table
        .inner_join(orders::table)
        .filter(
            order_service_lines::storage_box
                .ilike(pattern.clone())
                .or(order_service_lines::storage_location.ilike(pattern)),
        )
        .select(PAIR_COLUMNS)
        .order_by(order_service_lines::storage_box.asc())
        .load::<StoredPair>(conn)
        .await
        .context("Failed to search storage locations")?;

    Ok(pairs)
}

async fn shelved_pairs(conn: &mut AsyncPgConnection) -> Result<Vec<StoredPair>, AppError> {
    let pairs = order_service_lines::table
        .inner_join(orders::table)
        .filter(order_service_lines::storage_location.is_not_null())
        .filter(orders::current_status_id.ne_all(status::TERMINAL))
        .select(PAIR_COLUMNS)
        .order_by((
            order_service_lines::storage_box.asc(),
            order_service_lines::storage_location.asc(),
        ))
        .load::<StoredPair>(conn)
        .await
        .context("Failed to load shelved pairs")?;

    Ok(pairs)
}

pub fn group_by_box(pairs: Vec<StoredPair>) -> Vec<StorageBox> {
    let mut boxes: BTreeMap<String, Vec<StoredPair>> = BTreeMap::new();
    for pair in pairs {
        let box_name = pair.storage_box.clone().unwrap_or_default();
        boxes.entry(box_name).or_default().push(pair);
    }

    boxes
        .into_iter()
        .map(|(box_name, pairs)| StorageBox { box_name, pairs })
        .collect()
}

/// Pairs on the shelves for orders still open, grouped by box.
pub async fn occupancy_map(conn: &mut AsyncPgConnection) -> Result<Vec<StorageBox>, AppError> {
    Ok(group_by_box(shelved_pairs(conn).await?))
}

/// Pairs of open orders that were never given a location.
pub async fn missing_locations(
    conn: &mut AsyncPgConnection,
) -> Result<Vec<StoredPair>, AppError> {
    let pairs = order_service_lines::table
        .inner_join(orders::table)
        .inner_join(services::table)
        .filter(order_service_lines::storage_location.is_null())
        .filter(services::tracks_pairs.eq(true))
        .filter(orders::current_status_id.ne_all(status::TERMINAL))
        .select(PAIR_COLUMNS)
        .order_by(order_service_lines::created_at.asc())
        .load::<StoredPair>(conn)
        .await
        .context("Failed to load pairs without location")?;

    Ok(pairs)
}

impl StorageStats {
    pub fn compute(shelved: &[StoredPair], missing_location: usize, now: DateTime<Utc>) -> Self {
        let mut per_box: BTreeMap<&str, usize> = BTreeMap::new();
        for pair in shelved {
            *per_box
                .entry(pair.storage_box.as_deref().unwrap_or_default())
                .or_default() += 1;
        }

        let days: Vec<f64> = shelved
            .iter()
            .filter_map(|p| p.stored_at)
            .map(|at| (now - at).num_seconds().max(0) as f64 / 86_400.0)
            .collect();
        let average_days_stored = if days.is_empty() {
            0.0
        } else {
            let mean = days.iter().sum::<f64>() / days.len() as f64;
            (mean * 10.0).round() / 10.0
        };

        let mut top_boxes: Vec<BoxCount> = per_box
            .iter()
            .map(|(name, pairs)| BoxCount {
                box_name: name.to_string(),
                pairs: *pairs,
            })
            .collect();
        // BTreeMap order keeps ties alphabetical
        top_boxes.sort_by(|a, b| b.pairs.cmp(&a.pairs));
        top_boxes.truncate(TOP_BOXES);

        Self {
            stored_pairs: shelved.len(),
            boxes_in_use: per_box.len(),
            average_days_stored,
            top_boxes,
            missing_location,
        }
    }
}

pub async fn stats(conn: &mut AsyncPgConnection) -> Result<StorageStats, AppError> {
    let shelved = shelved_pairs(conn).await?;
    let missing = missing_locations(conn).await?;
    Ok(StorageStats::compute(&shelved, missing.len(), Utc::now()))
}

/// Every location a line has been given, newest first.
pub async fn history(
    conn: &mut AsyncPgConnection,
    order_id: i32,
    service_line_id: i32,
) -> Result<Vec<StorageHistoryEntity>, AppError> {
    let history = storage_history::table
        .filter(storage_history::service_line_id.eq(service_line_id))
        .filter(storage_history::order_id.eq(order_id))
        .select(StorageHistoryEntity::as_select())
        .order_by(storage_history::id.desc())
        .load(conn)
        .await
        .context("Failed to get storage history")?;

    Ok(history)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn pair(line_id: i32, storage_box: &str, stored_days_ago: i64, now: DateTime<Utc>) -> StoredPair {
        StoredPair {
            line_id,
            order_id: 1,
            order_code: "ORD-20250110-0A1B2C".into(),
            current_status_id: status::COMPLETED,
            brand: None,
            model: None,
            description: None,
            storage_box: Some(storage_box.into()),
            storage_location: Some(format!("{storage_box}-{line_id}")),
            storage_notes: None,
            stored_at: Some(now - Duration::days(stored_days_ago)),
        }
    }

    #[test]
    fn stats_count_boxes_and_days() {
        let now = Utc::now();
        let shelved = vec![
            pair(1, "A", 2, now),
            pair(2, "A", 4, now),
            pair(3, "B", 3, now),
        ];

        let stats = StorageStats::compute(&shelved, 4, now);

        assert_eq!(stats.stored_pairs, 3);
        assert_eq!(stats.boxes_in_use, 2);
        assert_eq!(stats.average_days_stored, 3.0);
        assert_eq!(stats.missing_location, 4);
        assert_eq!(
            stats.top_boxes[0],
            BoxCount {
                box_name: "A".into(),
                pairs: 2
            }
        );
    }

    #[test]
    fn top_boxes_are_capped_and_ties_alphabetical() {
        let now = Utc::now();
        let shelved: Vec<StoredPair> = ["F", "E", "D", "C", "B", "A"]
            .iter()
            .enumerate()
            .map(|(i, b)| pair(i as i32, b, 1, now))
            .collect();

        let stats = StorageStats::compute(&shelved, 0, now);
        let names: Vec<&str> = stats.top_boxes.iter().map(|b| b.box_name.as_str()).collect();

        assert_eq!(names, ["A", "B", "C", "D", "E"]);
    }

    #[test]
    fn empty_shelves() {
        let stats = StorageStats::compute(&[], 0, Utc::now());
        assert_eq!(stats.stored_pairs, 0);
        assert_eq!(stats.average_days_stored, 0.0);
        assert!(stats.top_boxes.is_empty());
    }

    #[test]
    fn pairs_are_grouped_per_box() {
        let now = Utc::now();
        let boxes = group_by_box(vec![pair(1, "B", 1, now), pair(2, "A", 1, now), pair(3, "B", 1, now)]);

        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[0].box_name, "A");
        assert_eq!(boxes[1].pairs.len(), 2);
    }

    #[test]
    fn blank_box_is_refused() {
        assert!(matches!(required("  ", "Box"), Err(AppError::BadRequest(_))));
        assert_eq!(required(" A1 ", "Box").unwrap(), "A1");
    }
}
