use tokio_postgres::Row;

use crate::database::conn::{LazyConn, ResultError};

/// Blob metadata without the payload.
#[derive(Debug)]
pub struct MediaInfo {
    pub media_id: i64,
    pub content_type: String,
    pub filename: String,
    pub length: i64,
}

fn row_to_info(row: &Row) -> MediaInfo {
    MediaInfo {
        media_id: row.get("media_id"),
        content_type: row.get("content_type"),
        filename: row.get("filename"),
        length: row.get("length"),
    }
}

pub async fn store_media(
    media_id: i64,
    content_type: &str,
    filename: &str,
    data: &[u8],
    uploaded_by: i64,
    conn: &mut LazyConn,
) -> Result<(), ResultError> {
    let db = conn.get_client().await?;
    db.execute(
        "
        INSERT INTO media (media_id, content_type, filename, data, length, uploaded_by)
        VALUES ($1, $2, $3, $4, $5, $6)
        ",
        &[
            &media_id,
            &content_type,
            &filename,
            &data,
            &(data.len() as i64),
            &uploaded_by,
        ],
    )
    .await?;
    Ok(())
}

pub async fn get_media_info(
    media_id: i64,
    conn: &mut LazyConn,
) -> Result<Option<MediaInfo>, ResultError> {
    let db = conn.get_client().await?;
    let row = db
        .query_opt(
            "SELECT media_id, content_type, filename, length FROM media WHERE media_id = $1",
            &[&media_id],
        )
        .await?;
    Ok(row.as_ref().map(row_to_info))
}

pub async fn get_media_full(
    media_id: i64,
    conn: &mut LazyConn,
) -> Result<Option<(MediaInfo, Vec<u8>)>, ResultError> {
    let db = conn.get_client().await?;
    let row = db
        .query_opt(
            "SELECT media_id, content_type, filename, length, data FROM media WHERE media_id = $1",
            &[&media_id],
        )
        .await?;
    Ok(row.map(|r| {
        let info = row_to_info(&r);
        let data: Vec<u8> = r.get("data");
        (info, data)
    }))
}

/// Fetch `len` bytes starting at `start` (0-based) without pulling the whole
/// blob over the wire. Callers have already bounds-checked the span against
/// the blob length.
pub async fn get_media_range(
    media_id: i64,
    start: i32,
    len: i32,
    conn: &mut LazyConn,
) -> Result<Option<Vec<u8>>, ResultError> {
    let db = conn.get_client().await?;
    // substring() is 1-based
    let from = start + 1;
    let row = db
        .query_opt(
            "SELECT substring(data FROM $2 FOR $3) AS chunk FROM media WHERE media_id = $1",
            &[&media_id, &from, &len],
        )
        .await?;
    Ok(row.map(|r| r.get("chunk")))
}
