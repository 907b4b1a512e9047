use std::time::SystemTime;

use tokio_postgres::Row;

use crate::{
    database::conn::{LazyConn, ResultError},
    entities::{
        post::Post,
        user::{Author, UserRef},
    },
};

/// Base projection for every post read path: author enrichment is a join,
/// the like count is computed from the authoritative like set.
const POST_SQL: &str = "
    SELECT p.post_id, p.author_id, p.media_type, p.text, p.media_id,
           p.comments_count,
           EXTRACT(EPOCH FROM p.created_at)::BIGINT AS created_at,
           EXTRACT(EPOCH FROM p.updated_at)::BIGINT AS updated_at,
           (SELECT count(*) FROM post_likes pl WHERE pl.post_id = p.post_id) AS likes_count,
           u.pseudo, u.followers_count, u.following_count
    FROM posts p
    JOIN users u ON u.user_id = p.author_id
";

fn row_to_post(row: Row) -> Post {
    Post {
        post_id: row.get::<_, i64>("post_id").to_string(),
        author: Author {
            user_id: row.get::<_, i64>("author_id").to_string(),
            pseudo: row.get("pseudo"),
            followers_count: row.get("followers_count"),
            following_count: row.get("following_count"),
        },
        media_type: row.get("media_type"),
        text: row.get("text"),
        media_id: row.get::<_, i64>("media_id").to_string(),
        likes_count: row.get("likes_count"),
        comments_count: row.get("comments_count"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Get a single non-deleted post, author-enriched.
pub async fn get_post(post_id: i64, conn: &mut LazyConn) -> Result<Option<Post>, ResultError> {
    let db = conn.get_client().await?;
    let sql = format!("{POST_SQL} WHERE p.post_id = $1 AND NOT p.is_deleted");
    let row = db.query_opt(&sql, &[&post_id]).await?;
    Ok(row.map(row_to_post))
}

pub async fn create_post(
    post_id: i64,
    author_id: i64,
    media_type: &str,
    text: &str,
    media_id: i64,
    conn: &mut LazyConn,
) -> Result<(), ResultError> {
    let db = conn.get_client().await?;
    db.execute(
        "
        INSERT INTO posts (post_id, author_id, media_type, text, media_id)
        VALUES ($1, $2, $3, $4, $5)
        ",
        &[&post_id, &author_id, &media_type, &text, &media_id],
    )
    .await?;
    Ok(())
}

/// Edit the text of an own, non-deleted post. Returns false when the post
/// does not exist or the requester is not its author; callers surface both
/// as one not-found signal.
pub async fn update_post_text(
    post_id: i64,
    author_id: i64,
    text: &str,
    conn: &mut LazyConn,
) -> Result<bool, ResultError> {
    let db = conn.get_client().await?;
    let updated = db
        .execute(
            "
            UPDATE posts SET text = $3, updated_at = now()
            WHERE post_id = $1 AND author_id = $2 AND NOT is_deleted
            ",
            &[&post_id, &author_id, &text],
        )
        .await?;
    Ok(updated == 1)
}

/// Flip the soft-delete flag on an own post. Idempotent in effect, every
/// call writes.
pub async fn soft_delete_post(
    post_id: i64,
    author_id: i64,
    conn: &mut LazyConn,
) -> Result<bool, ResultError> {
    let db = conn.get_client().await?;
    let updated = db
        .execute(
            "UPDATE posts SET is_deleted = true WHERE post_id = $1 AND author_id = $2",
            &[&post_id, &author_id],
        )
        .await?;
    Ok(updated == 1)
}

/// Fetch one page worth of feed rows (callers pass `limit + 1` as `fetch`
/// and trim the probe row). `author_id = None` is the global feed.
///
/// The cursor is the id of the last seen post, resolved to its sort key and
/// compared row-wise, so posts created in the same instant are ordered
/// deterministically by descending id. An unresolvable cursor falls back to
/// the first page.
pub async fn get_feed_page(
    author_id: Option<i64>,
    cursor: Option<i64>,
    fetch: i64,
    conn: &mut LazyConn,
) -> Result<Vec<Post>, ResultError> {
    let db = conn.get_client().await?;

    let cursor_key: Option<(SystemTime, i64)> = match cursor {
        Some(id) => db
            .query_opt(
                "SELECT created_at, post_id FROM posts WHERE post_id = $1",
                &[&id],
            )
            .await?
            .map(|r| (r.get(0), r.get(1))),
        None => None,
    };
    let (cursor_ts, cursor_id) = match cursor_key {
        Some((ts, id)) => (Some(ts), Some(id)),
        None => (None, None),
    };

    let sql = format!(
        "
        {POST_SQL}
        WHERE ($1::BIGINT IS NULL OR p.author_id = $1)
          AND NOT p.is_deleted
          AND ($2::TIMESTAMPTZ IS NULL OR (p.created_at, p.post_id) < ($2, $3))
        ORDER BY p.created_at DESC, p.post_id DESC
        LIMIT $4
        "
    );
    let rows = db
        .query(&sql, &[&author_id, &cursor_ts, &cursor_id, &fetch])
        .await?;
    Ok(rows.into_iter().map(row_to_post).collect())
}

/// Toggle the caller's membership in a post's like set. Returns `None` when
/// the post is missing or deleted, otherwise the new liked state and the new
/// cardinality of the set.
pub async fn toggle_like(
    post_id: i64,
    user_id: i64,
    conn: &mut LazyConn,
) -> Result<Option<(bool, i64)>, ResultError> {
    let tx = conn.transaction().await?;

    let visible = tx
        .query_opt(
            "SELECT 1 FROM posts WHERE post_id = $1 AND NOT is_deleted",
            &[&post_id],
        )
        .await?;
    if visible.is_none() {
        return Ok(None);
    }

    let inserted = tx
        .execute(
            "
            INSERT INTO post_likes (post_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            ",
            &[&post_id, &user_id],
        )
        .await?;
    let liked = inserted == 1;

    if !liked {
        tx.execute(
            "DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2",
            &[&post_id, &user_id],
        )
        .await?;
    }

    let count: i64 = tx
        .query_one(
            "SELECT count(*) FROM post_likes WHERE post_id = $1",
            &[&post_id],
        )
        .await?
        .get(0);

    tx.commit().await?;
    Ok(Some((liked, count)))
}

/// Bounded listing of a post's likers, most recent first.
pub async fn get_likers(
    post_id: i64,
    limit: i64,
    conn: &mut LazyConn,
) -> Result<Vec<UserRef>, ResultError> {
    let db = conn.get_client().await?;
    let rows = db
        .query(
            "
            SELECT u.user_id, u.pseudo
            FROM post_likes pl
            JOIN users u ON u.user_id = pl.user_id
            WHERE pl.post_id = $1
            ORDER BY pl.liked_at DESC
            LIMIT $2
            ",
            &[&post_id, &limit],
        )
        .await?;
    Ok(rows
        .into_iter()
        .map(|r| UserRef {
            user_id: r.get::<_, i64>("user_id").to_string(),
            pseudo: r.get("pseudo"),
        })
        .collect())
}
