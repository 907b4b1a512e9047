pub mod comments;
pub mod conn;
pub mod follows;
pub mod media;
pub mod posts;
pub mod users;
