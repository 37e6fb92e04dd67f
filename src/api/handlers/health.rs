/*
 * Responsibility
 * - GET /health (疎通用)
 * - 認可ゲートを通さない唯一のルート
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}
