use serde::Serialize;
use serde_with::skip_serializing_none;

/// Full account row used by the auth paths. Never serialized to clients.
#[derive(Debug)]
pub struct AuthUser {
    pub user_id: i64,
    pub pseudo: String,
    pub email: String,
    pub password_hash: String,
}

/// Profile projection given to the frontend. `email` is populated only when
/// the profile belongs to the caller.
#[skip_serializing_none]
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    pub pseudo: String,
    pub email: Option<String>,
    pub bio: String,
    pub avatar_id: Option<String>,
    pub followers_count: i64,
    pub following_count: i64,
    pub created_at: i64,
}

/// Author projection embedded in enriched posts.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub user_id: String,
    pub pseudo: String,
    pub followers_count: i64,
    pub following_count: i64,
}

/// Pseudo-only reference for likers and follower/following listings.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub user_id: String,
    pub pseudo: String,
}
