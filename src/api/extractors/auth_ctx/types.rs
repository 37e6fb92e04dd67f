/*
 * Responsibility
 * - Handler から見える「認可済みコンテキスト」の型
 * - middleware が検証して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - JWT の検証や permission の判定は middleware/services 側の責務
 */

use crate::services::auth::Claims;

/// 認可ゲートを通過したリクエストに付与されるコンテキスト
///
/// - `claims` は検証済みの access token の中身（sub / permissions など）
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub claims: Claims,
}

impl AuthCtx {
    pub fn new(claims: Claims) -> Self {
        Self { claims }
    }

    /// ログ相関用。Auth0 の client credentials では sub が無いこともある
    pub fn subject(&self) -> &str {
        self.claims.sub.as_deref().unwrap_or("-")
    }
}
