use crate::{
    database::conn::{LazyConn, ResultError},
    entities::user::UserRef,
};

/// Toggle the (follower, following) edge. Edge write and both endpoints'
/// denormalized counters move in one transaction, keeping the counters equal
/// to the true edge-set cardinality even under concurrent toggles.
pub async fn toggle_follow(
    follower_id: i64,
    following_id: i64,
    conn: &mut LazyConn,
) -> Result<bool, ResultError> {
    let tx = conn.transaction().await?;

    let removed = tx
        .execute(
            "DELETE FROM follows WHERE follower_id = $1 AND following_id = $2",
            &[&follower_id, &following_id],
        )
        .await?;

    let is_following = if removed == 1 {
        tx.execute(
            "UPDATE users SET following_count = following_count - 1 WHERE user_id = $1",
            &[&follower_id],
        )
        .await?;
        tx.execute(
            "UPDATE users SET followers_count = followers_count - 1 WHERE user_id = $1",
            &[&following_id],
        )
        .await?;
        false
    } else {
        tx.execute(
            "INSERT INTO follows (follower_id, following_id) VALUES ($1, $2)",
            &[&follower_id, &following_id],
        )
        .await?;
        tx.execute(
            "UPDATE users SET following_count = following_count + 1 WHERE user_id = $1",
            &[&follower_id],
        )
        .await?;
        tx.execute(
            "UPDATE users SET followers_count = followers_count + 1 WHERE user_id = $1",
            &[&following_id],
        )
        .await?;
        true
    };

    tx.commit().await?;
    Ok(is_following)
}

/// Bounded listing of the accounts following `user_id`, newest edge first.
pub async fn list_followers(
    user_id: i64,
    limit: i64,
    conn: &mut LazyConn,
) -> Result<Vec<UserRef>, ResultError> {
    let db = conn.get_client().await?;
    let rows = db
        .query(
            "
            SELECT u.user_id, u.pseudo
            FROM follows f
            JOIN users u ON u.user_id = f.follower_id
            WHERE f.following_id = $1
            ORDER BY f.created_at DESC
            LIMIT $2
            ",
            &[&user_id, &limit],
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

/// Bounded listing of the accounts `user_id` follows, newest edge first.
pub async fn list_following(
    user_id: i64,
    limit: i64,
    conn: &mut LazyConn,
) -> Result<Vec<UserRef>, ResultError> {
    let db = conn.get_client().await?;
    let rows = db
        .query(
            "
            SELECT u.user_id, u.pseudo
            FROM follows f
            JOIN users u ON u.user_id = f.following_id
            WHERE f.follower_id = $1
            ORDER BY f.created_at DESC
            LIMIT $2
            ",
            &[&user_id, &limit],
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
