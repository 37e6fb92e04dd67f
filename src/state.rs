/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - db: PgPool, auth: AuthService (JWKS キャッシュを内包)
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use sqlx::PgPool;

use crate::services::auth::AuthService;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: PgPool,
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub fn new(db: PgPool, auth: Arc<AuthService>) -> Self {
        Self { db, auth }
    }
}
