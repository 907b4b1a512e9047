use tokio_postgres::Row;

use crate::{
    database::conn::{LazyConn, ResultError},
    entities::{comment::Comment, user::UserRef},
};

const COMMENT_SQL: &str = "
    SELECT c.comment_id, c.post_id, c.author_id, c.text,
           EXTRACT(EPOCH FROM c.created_at)::BIGINT AS created_at,
           u.pseudo
    FROM comments c
    JOIN users u ON u.user_id = c.author_id
";

fn row_to_comment(row: Row) -> Comment {
    Comment {
        comment_id: row.get::<_, i64>("comment_id").to_string(),
        post_id: row.get::<_, i64>("post_id").to_string(),
        author: UserRef {
            user_id: row.get::<_, i64>("author_id").to_string(),
            pseudo: row.get("pseudo"),
        },
        text: row.get("text"),
        created_at: row.get("created_at"),
    }
}

/// Insert a comment and bump the parent post's denormalized counter in one
/// transaction, so the counter can't drift from the comment set.
pub async fn create_comment(
    comment_id: i64,
    post_id: i64,
    author_id: i64,
    text: &str,
    conn: &mut LazyConn,
) -> Result<(), ResultError> {
    let tx = conn.transaction().await?;
    tx.execute(
        "
        INSERT INTO comments (comment_id, post_id, author_id, text)
        VALUES ($1, $2, $3, $4)
        ",
        &[&comment_id, &post_id, &author_id, &text],
    )
    .await?;
    tx.execute(
        "UPDATE posts SET comments_count = comments_count + 1 WHERE post_id = $1",
        &[&post_id],
    )
    .await?;
    tx.commit().await?;
    Ok(())
}

pub async fn get_comment(
    comment_id: i64,
    conn: &mut LazyConn,
) -> Result<Option<Comment>, ResultError> {
    let db = conn.get_client().await?;
    let sql = format!("{COMMENT_SQL} WHERE c.comment_id = $1");
    let row = db.query_opt(&sql, &[&comment_id]).await?;
    Ok(row.map(row_to_comment))
}

/// Remove an own comment and decrement the parent counter in one
/// transaction. Returns false when the comment does not exist or belongs to
/// someone else.
pub async fn delete_comment(
    comment_id: i64,
    author_id: i64,
    conn: &mut LazyConn,
) -> Result<bool, ResultError> {
    let tx = conn.transaction().await?;
    let deleted = tx
        .query_opt(
            "
            DELETE FROM comments
            WHERE comment_id = $1 AND author_id = $2
            RETURNING post_id
            ",
            &[&comment_id, &author_id],
        )
        .await?;

    let Some(row) = deleted else {
        return Ok(false);
    };
    let post_id: i64 = row.get("post_id");

    tx.execute(
        "UPDATE posts SET comments_count = comments_count - 1 WHERE post_id = $1",
        &[&post_id],
    )
    .await?;
    tx.commit().await?;
    Ok(true)
}

/// One page of a post's comments, newest first. Comment ids are
/// time-ordered, so the cursor compares directly against the id.
pub async fn get_comment_page(
    post_id: i64,
    cursor: Option<i64>,
    fetch: i64,
    conn: &mut LazyConn,
) -> Result<Vec<Comment>, ResultError> {
    let db = conn.get_client().await?;
    let sql = format!(
        "
        {COMMENT_SQL}
        WHERE c.post_id = $1
          AND ($2::BIGINT IS NULL OR c.comment_id < $2)
        ORDER BY c.comment_id DESC
        LIMIT $3
        "
    );
    let rows = db.query(&sql, &[&post_id, &cursor, &fetch]).await?;
    Ok(rows.into_iter().map(row_to_comment).collect())
}
