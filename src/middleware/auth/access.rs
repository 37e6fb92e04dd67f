//! 認可ゲート: Bearer 抽出 → JWT 検証 → permission 判定 → AuthCtx を extensions に入れる
//!
//! - ルートごとの必要 permission は `RoutePermissions` (method + route template) で引く
//! - `route_layer` で掛けるので、マッチしたルートにだけ走る (404 はゲートを通らない)
//! - 失敗したら handler は呼ばれない。401/403 の JSON をそのまま返す
//! - 表に無い保護ルートは設定ミスとして 500 (fail closed)

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{MatchedPath, State},
    http::{Method, Request},
    middleware::{self, Next},
    response::Response,
};
use tracing::{debug, error, warn};

use crate::api::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::auth::AuthService;
use crate::services::auth::permissions::RoutePermissions;

#[derive(Clone, Debug)]
pub struct AccessGate {
    auth: Arc<AuthService>,
    permissions: Arc<RoutePermissions>,
}

impl AccessGate {
    pub fn new(auth: Arc<AuthService>, permissions: RoutePermissions) -> Self {
        Self {
            auth,
            permissions: Arc::new(permissions),
        }
    }
}

/// router に登録済みの全ルートへゲートを掛ける。
///
/// 例：
/// ```ignore
/// let protected = Router::new().route("/movies", get(list_movies));
/// let protected = middleware::auth::access::apply(protected, gate);
/// ```
pub fn apply<S>(router: Router<S>, gate: AccessGate) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.route_layer(middleware::from_fn_with_state(gate, access_middleware))
}

async fn access_middleware(
    State(gate): State<AccessGate>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    // HEAD は GET ハンドラで処理されるので同じ permission を要求する
    let method = if req.method() == Method::HEAD {
        Method::GET
    } else {
        req.method().clone()
    };

    let Some(path) = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
    else {
        error!(%method, uri = %req.uri(), "authorization gate applied outside a matched route");
        return Err(AppError::Internal);
    };

    let Some(required) = gate.permissions.lookup(&method, &path) else {
        error!(%method, %path, "protected route has no required permission");
        return Err(AppError::Internal);
    };

    let claims = match gate.auth.authorize(req.headers(), required).await {
        Ok(claims) => claims,
        Err(err) => {
            warn!(
                kind = err.code(),
                error = %err,
                %method,
                %path,
                required,
                "request rejected by authorization gate"
            );
            return Err(err.into());
        }
    };

    debug!(sub = ?claims.sub, %method, %path, required, "request authorized");

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(AuthCtx::new(claims));

    Ok(next.run(req).await)
}
