use deadpool_postgres::Transaction;
use tokio_postgres::Row;

use crate::{
    database::conn::{LazyConn, ResultError},
    entities::user::{AuthUser, User},
};

const USER_SQL: &str = "
    SELECT user_id, pseudo, email, bio, avatar_id,
           followers_count, following_count,
           EXTRACT(EPOCH FROM created_at)::BIGINT AS created_at
    FROM users
";

fn row_to_user(row: Row, include_email: bool) -> User {
    User {
        user_id: row.get::<_, i64>("user_id").to_string(),
        pseudo: row.get("pseudo"),
        email: include_email.then(|| row.get("email")),
        bio: row.get("bio"),
        avatar_id: row.get::<_, Option<i64>>("avatar_id").map(|v| v.to_string()),
        followers_count: row.get("followers_count"),
        following_count: row.get("following_count"),
        created_at: row.get("created_at"),
    }
}

fn row_to_auth_user(row: &Row) -> AuthUser {
    AuthUser {
        user_id: row.get("user_id"),
        pseudo: row.get("pseudo"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
    }
}

/// Get profile projection by id. `include_email` only for the account owner.
pub async fn get_user(
    user_id: i64,
    include_email: bool,
    conn: &mut LazyConn,
) -> Result<Option<User>, ResultError> {
    let db = conn.get_client().await?;
    let sql = format!("{USER_SQL} WHERE user_id = $1");
    let row = db.query_opt(&sql, &[&user_id]).await?;
    Ok(row.map(|r| row_to_user(r, include_email)))
}

/// Public profile lookup by unique pseudo.
pub async fn get_user_by_pseudo(
    pseudo: &str,
    conn: &mut LazyConn,
) -> Result<Option<User>, ResultError> {
    let db = conn.get_client().await?;
    let sql = format!("{USER_SQL} WHERE pseudo = $1");
    let row = db.query_opt(&sql, &[&pseudo]).await?;
    Ok(row.map(|r| row_to_user(r, false)))
}

/// Resolve a pseudo to its user id.
pub async fn resolve_pseudo(pseudo: &str, conn: &mut LazyConn) -> Result<Option<i64>, ResultError> {
    let db = conn.get_client().await?;
    let row = db
        .query_opt("SELECT user_id FROM users WHERE pseudo = $1", &[&pseudo])
        .await?;
    Ok(row.map(|r| r.get("user_id")))
}

pub async fn user_exists(user_id: i64, conn: &mut LazyConn) -> Result<bool, ResultError> {
    let db = conn.get_client().await?;
    let row = db
        .query_opt("SELECT 1 FROM users WHERE user_id = $1", &[&user_id])
        .await?;
    Ok(row.is_some())
}

pub async fn get_auth_user_by_email(
    email: &str,
    conn: &mut LazyConn,
) -> Result<Option<AuthUser>, ResultError> {
    let db = conn.get_client().await?;
    let row = db
        .query_opt(
            "SELECT user_id, pseudo, email, password_hash FROM users WHERE email = $1",
            &[&email],
        )
        .await?;
    Ok(row.map(|r| row_to_auth_user(&r)))
}

/// Insert a fresh account. Unique violations on pseudo/email bubble up as
/// `ResultError::Query` carrying the constraint name.
pub async fn create_user(
    user_id: i64,
    pseudo: &str,
    email: &str,
    password_hash: &str,
    conn: &mut LazyConn,
) -> Result<(), ResultError> {
    let db = conn.get_client().await?;
    db.execute(
        "
        INSERT INTO users (user_id, pseudo, email, password_hash)
        VALUES ($1, $2, $3, $4)
        ",
        &[&user_id, &pseudo, &email, &password_hash],
    )
    .await?;
    Ok(())
}

#[derive(Default, Debug)]
pub struct UserProfileUpdate {
    pub pseudo: Option<String>,
    pub bio: Option<String>,
    pub password_hash: Option<String>,
}

/// Apply the dirty fields of a profile update. Returns false when there was
/// nothing to write.
pub async fn update_user_profile(
    user_id: i64,
    update: UserProfileUpdate,
    tx: &mut Transaction<'_>,
) -> Result<bool, ResultError> {
    let mut set_clauses = Vec::new();
    let mut values: Vec<&(dyn tokio_postgres::types::ToSql + Sync)> = Vec::new();

    if let Some(ref pseudo) = update.pseudo {
        values.push(pseudo);
        set_clauses.push(format!("pseudo = ${}", values.len() + 1));
    }
    if let Some(ref bio) = update.bio {
        values.push(bio);
        set_clauses.push(format!("bio = ${}", values.len() + 1));
    }
    if let Some(ref hash) = update.password_hash {
        values.push(hash);
        set_clauses.push(format!("password_hash = ${}", values.len() + 1));
    }

    if set_clauses.is_empty() {
        return Ok(false);
    }

    let query = format!(
        "UPDATE users SET {} WHERE user_id = $1",
        set_clauses.join(", ")
    );

    let mut params: Vec<&(dyn tokio_postgres::types::ToSql + Sync)> = vec![&user_id];
    params.extend(values);

    tx.execute(query.as_str(), &params).await?;
    Ok(true)
}
