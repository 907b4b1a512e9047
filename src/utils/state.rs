use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_postgres::{Config as PgConfig, NoTls};
use tracing::{error, info};

const CONNECT_RETRIES: u32 = 5;
const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    host: String,
    user: String,
    database: String,
    connections: u32,
    password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub signature_key: String,
    pub url: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            signature_key: env::var("SIGNATURE_KEY").expect("$SIGNATURE_KEY missing"),
            url: env::var("URL").unwrap_or("localhost:3000".to_string()),
        }
    }
}

impl PostgresConfig {
    pub fn from_env() -> Self {
        Self {
            host: env::var("POSTGRES_HOST").expect("POSTGRES_HOST missing"),
            user: env::var("POSTGRES_USER").expect("POSTGRES_USER missing"),
            database: env::var("POSTGRES_DATABASE").expect("POSTGRES_DATABASE missing"),
            password: env::var("POSTGRES_PASSWORD").expect("POSTGRES_PASSWORD missing"),
            connections: env::var("POSTGRES_CONNECTIONS")
                .unwrap_or("16".to_string())
                .parse()
                .expect("POSTGRES_CONNECTIONS wrong type"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub db_pool: Pool,
    pub config: Arc<Config>,
}

#[derive(Error, Debug)]
pub enum AppStateError {
    #[error("SQL error: {0}")]
    Sql(#[from] tokio_postgres::Error),

    #[error("pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error("could not reach postgres after {0} attempts")]
    ConnectExhausted(u32),
}

impl AppState {
    pub async fn create_from_env() -> Result<AppState, AppStateError> {
        let config = Config::from_env();
        let postgres_config = PostgresConfig::from_env();

        let mut pg_config = PgConfig::new();
        pg_config.host(&postgres_config.host);
        pg_config.user(&postgres_config.user);
        pg_config.password(&postgres_config.password);
        pg_config.dbname(&postgres_config.database);

        let mgr = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );
        let db_pool = Pool::builder(mgr)
            .max_size(postgres_config.connections as usize)
            .build()
            .unwrap();

        let state = AppState {
            db_pool,
            config: Arc::new(config),
        };
        state.wait_for_database().await?;

        Ok(state)
    }

    /// Bootstrap connectivity probe: bounded retries with a fixed delay,
    /// fatal (error return) on exhaustion.
    async fn wait_for_database(&self) -> Result<(), AppStateError> {
        for attempt in 1..=CONNECT_RETRIES {
            match self.db_pool.get().await {
                Ok(client) => {
                    client.simple_query("SELECT 1").await?;
                    info!("Postgres connected (attempt {})", attempt);
                    return Ok(());
                }
                Err(err) => {
                    error!(
                        "Postgres connection failed ({}/{}): {:?}",
                        attempt, CONNECT_RETRIES, err
                    );
                    if attempt < CONNECT_RETRIES {
                        tokio::time::sleep(CONNECT_RETRY_DELAY).await;
                    }
                }
            }
        }
        Err(AppStateError::ConnectExhausted(CONNECT_RETRIES))
    }
}

pub type ArcAppState = Arc<AppState>;
