use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::AppState;

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "diarylog",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let dir_ok = state.store.base_dir().is_dir();

    if dir_ok {
        (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "checks": { "diary_dir": "ok" },
            })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "not_ready",
                "checks": { "diary_dir": "missing" },
            })),
        )
    }
}
