use axum::{
    Router,
    routing::get,
};
use tracing::info;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
}

async fn index() -> &'static str {
    info!("GET / - Liveness check");
    "The app is running!"
}
