use deadpool_postgres::{Object, Pool, PoolError, Transaction};
use tracing::error;

use crate::utils::response::AppError;

#[derive(Debug)]
pub enum ResultError {
    Pool(deadpool_postgres::PoolError),
    Query(tokio_postgres::Error),
}

impl From<ResultError> for AppError {
    fn from(err: ResultError) -> Self {
        error!("Database error: {:?}", err);
        AppError::Internal
    }
}

impl From<deadpool_postgres::PoolError> for ResultError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err)
    }
}

impl From<tokio_postgres::Error> for ResultError {
    fn from(err: tokio_postgres::Error) -> Self {
        Self::Query(err)
    }
}

/// Name of the violated constraint when `err` is a unique-key violation,
/// so endpoints can map duplicate keys to a 409 with the offending field.
pub fn unique_violation(err: &ResultError) -> Option<&str> {
    if let ResultError::Query(e) = err
        && let Some(db) = e.as_db_error()
        && *db.code() == tokio_postgres::error::SqlState::UNIQUE_VIOLATION
    {
        return db.constraint();
    }
    None
}

/// Connection checked out of the pool on first use, so handlers that
/// error out early never touch the pool.
pub struct LazyConn {
    pool: Pool,
    client: Option<Object>,
}

impl LazyConn {
    pub fn new(pool: Pool) -> Self {
        Self { pool, client: None }
    }

    pub async fn get_client(&mut self) -> Result<&mut Object, PoolError> {
        if self.client.is_none() {
            let conn = self.pool.get().await?;
            self.client = Some(conn);
        }
        Ok(self.client.as_mut().unwrap())
    }

    pub async fn transaction(&mut self) -> Result<Transaction<'_>, PoolError> {
        let client = self.get_client().await?;
        Ok(client.transaction().await?)
    }
}
