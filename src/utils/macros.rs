/// Lazy per-request connection from the app state's pool.
#[macro_export]
macro_rules! get_conn {
    ($state:expr) => {
        $crate::database::conn::LazyConn::new($state.db_pool.clone())
    };
}

/// Open a transaction on a `LazyConn`, propagating pool errors.
#[macro_export]
macro_rules! create_tx {
    ($conn:expr) => {
        $conn.transaction().await?
    };
}
