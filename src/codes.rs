use chrono::NaiveDate;
use uuid::Uuid;

pub const ORDER_PREFIX: &str = "ORD";
pub const RESERVATION_PREFIX: &str = "RSV";

/// `PREFIX-YYYYMMDD-XXXXXX`, the suffix being the first six hex digits of a
/// random UUID in upper case. Uniqueness is backed by a unique index.
pub fn human_code(prefix: &str, date: NaiveDate, salt: Uuid) -> String {
    let suffix: String = salt.simple().to_string()[..6].to_ascii_uppercase();
    format!("{prefix}-{}-{suffix}", date.format("%Y%m%d"))
}

pub fn new_code(prefix: &str) -> String {
    human_code(prefix, chrono::Utc::now().date_naive(), Uuid::new_v4())
}
