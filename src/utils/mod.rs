pub mod macros;
pub mod pagination;
pub mod response;
pub mod security;
pub mod snowflake;
pub mod state;
pub mod thread_state;
pub mod validate;
