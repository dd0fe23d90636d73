//! Media records attached to orders (photos of the pairs, receipts).
//! Only the object URL is kept here; uploading is done by the client.

use anyhow::Context;
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    core::app_error::AppError,
    models::{CreateMediaFileEntity, MediaFileEntity},
    schema::media_files,
};

#[derive(Deserialize, Debug, ToSchema)]
pub struct NewMediaFile {
    pub url: String,
    /// e.g. `photo_before`, `photo_after`, `receipt`
    pub kind: String,
}

pub async fn register(
    conn: &mut AsyncPgConnection,
    order_id: i32,
    file: NewMediaFile,
    employee_id: i32,
) -> Result<MediaFileEntity, AppError> {
    if file.url.trim().is_empty() || file.kind.trim().is_empty() {
        return Err(AppError::bad_request("Media url and kind are required"));
    }

    let media = diesel::insert_into(media_files::table)
        .values(CreateMediaFileEntity {
            order_id,
            url: file.url,
            kind: file.kind,
            uploaded_by: employee_id,
        })
        .returning(MediaFileEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to register media file")?;

    Ok(media)
}

pub async fn list_by_order(
    conn: &mut AsyncPgConnection,
    order_id: i32,
) -> Result<Vec<MediaFileEntity>, AppError> {
    let files = media_files::table
        .filter(media_files::order_id.eq(order_id))
        .select(MediaFileEntity::as_select())
        .order_by(media_files::created_at.asc())
        .load(conn)
        .await
        .context("Failed to list media files")?;

    Ok(files)
}
