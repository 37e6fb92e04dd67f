/*
 * Responsibility
 * - URL 構造を定義 (/health, /actors, /movies)
 * - ルートごとの必要 permission をここで宣言し、保護ルートに認可ゲートを route_layer で掛ける
 * - /health はゲートの外
 */
use axum::{
    Router,
    http::Method,
    routing::{get, patch},
};

use crate::api::handlers::{
    actors::{create_actor, delete_actor, list_actors, update_actor},
    health::health,
    movies::{create_movie, delete_movie, list_movies, update_movie},
};
use crate::middleware::auth::access::{self, AccessGate};
use crate::services::auth::permissions::{
    DELETE_ACTORS, DELETE_MOVIES, GET_ACTORS, GET_MOVIES, PATCH_ACTORS, PATCH_MOVIES,
    POST_ACTORS, POST_MOVIES, RoutePermissions,
};
use crate::state::AppState;

/// method + route template → required permission
pub fn route_permissions() -> RoutePermissions {
    RoutePermissions::new()
        .require(Method::GET, "/actors", GET_ACTORS)
        .require(Method::POST, "/actors", POST_ACTORS)
        .require(Method::PATCH, "/actors/{actor_id}", PATCH_ACTORS)
        .require(Method::DELETE, "/actors/{actor_id}", DELETE_ACTORS)
        .require(Method::GET, "/movies", GET_MOVIES)
        .require(Method::POST, "/movies", POST_MOVIES)
        .require(Method::PATCH, "/movies/{movie_id}", PATCH_MOVIES)
        .require(Method::DELETE, "/movies/{movie_id}", DELETE_MOVIES)
}

pub fn routes(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/actors", get(list_actors).post(create_actor))
        .route(
            "/actors/{actor_id}",
            patch(update_actor).delete(delete_actor),
        )
        .route("/movies", get(list_movies).post(create_movie))
        .route(
            "/movies/{movie_id}",
            patch(update_movie).delete(delete_movie),
        );

    let permissions = route_permissions();
    for (method, path, permission) in permissions.iter() {
        tracing::debug!(%method, path, permission, "protected route");
    }
    let gate = AccessGate::new(state.auth.clone(), permissions);

    Router::new()
        .route("/health", get(health))
        .merge(access::apply(protected, gate))
}
