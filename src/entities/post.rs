use serde::Serialize;

use crate::entities::user::Author;

/// Enriched post as returned by every read path: the author projection is
/// joined in at read time, `likes_count` is computed from the like set.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub post_id: String,
    pub author: Author,
    #[serde(rename = "type")]
    pub media_type: String,
    pub text: String,
    pub media_id: String,
    pub likes_count: i64,
    pub comments_count: i64,
    pub created_at: i64,
    pub updated_at: i64,
}
