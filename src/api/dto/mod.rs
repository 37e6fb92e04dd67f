/*
 * Responsibility
 * - request/response DTO
 * - 成功レスポンスは `{"success": true, ...}` の形で返す
 */
use serde::Serialize;

pub mod actors;
pub mod movies;

pub const MISSING_REQUIRED_FIELDS: &str = "Missing required fields";

/// DELETE の成功レスポンス: `{"success": true, "delete": <id>}`
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub delete: i32,
}

impl DeleteResponse {
    pub fn new(id: i32) -> Self {
        Self {
            success: true,
            delete: id,
        }
    }
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}
