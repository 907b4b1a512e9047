use std::{any, sync::Arc, time::Duration};

use crate::utils::state::AppState;
use axum::Router;
use dotenvy::dotenv;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
};
use tracing::{error, info};
use tracing_subscriber;

use axum::http::Response;
use bytes::Bytes;
use http_body_util::Full;

mod database;
mod endpoints;
mod entities;
mod extractors;
mod utils;

/// Last-resort handler: a panicking request must still answer with the
/// standard error envelope instead of a dropped connection.
fn panic_handler(err: Box<dyn any::Any + Send + 'static>) -> Response<Full<Bytes>> {
    let msg = err
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| err.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    error!("Handler panicked: {}", msg);

    let body = serde_json::json!({
        "success": false,
        "error": "INTERNAL_SERVER_ERROR",
    });

    Response::builder()
        .status(500)
        .header("content-type", "application/json")
        .body(Full::from(body.to_string()))
        .unwrap()
}

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    dotenv().ok();

    tracing_subscriber::fmt::fmt()
        .with_writer(std::io::stderr)
        .init();

    let state = match AppState::create_from_env().await {
        Ok(state) => Arc::new(state),
        Err(err) => {
            error!("Startup aborted: {:?}", err);
            return;
        }
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    let api_router: Router<()> = endpoints::create_router().with_state(state.clone());
    let router = Router::new().nest("/api", api_router).layer(
        tower::ServiceBuilder::new()
            .layer(cors)
            .layer(CatchPanicLayer::custom(panic_handler)),
    );

    let listener = tokio::net::TcpListener::bind(state.config.url.as_str())
        .await
        .unwrap();
    info!("Listening on {}", state.config.url);
    axum::serve(listener, router).await.unwrap();
}
