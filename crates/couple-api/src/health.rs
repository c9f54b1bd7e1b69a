use axum::{Json, extract::State};
use serde_json::{Value, json};
use tracing::warn;

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let database = match state.with_db(|db| db.ping()).await {
        Ok(()) => "ok",
        Err(e) => {
            warn!("Health check database ping failed: {}", e);
            "error"
        }
    };

    Json(json!({
        "status": "ok",
        "database": database,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
