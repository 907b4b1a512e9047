use serde::Serialize;

use crate::entities::user::UserRef;

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub comment_id: String,
    pub post_id: String,
    pub author: UserRef,
    pub text: String,
    pub created_at: i64,
}
