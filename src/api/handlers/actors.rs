/*
 * Responsibility
 * - /actors 系 handler
 * - 認可は route_layer のゲートで完了済み (AuthCtx はログ相関にだけ使う)
 * - Path / Json の rejection も AppError に寄せて JSON で返す
 */
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};
use tracing::info;

use crate::{
    api::{
        dto::{
            DeleteResponse, MISSING_REQUIRED_FIELDS,
            actors::{
                ActorEnvelope, ActorResponse, ActorsEnvelope, CreateActorRequest,
                UpdateActorRequest,
            },
        },
        extractors::AuthCtxExtractor,
    },
    error::AppError,
    repos::actor_repo,
    state::AppState,
};

pub async fn list_actors(
    AuthCtxExtractor(_ctx): AuthCtxExtractor,
    State(state): State<AppState>,
) -> Result<Json<ActorsEnvelope>, AppError> {
    let rows = actor_repo::list(&state.db).await?;

    Ok(Json(ActorsEnvelope {
        success: true,
        actors: rows.into_iter().map(ActorResponse::from).collect(),
    }))
}

pub async fn create_actor(
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    State(state): State<AppState>,
    body: Result<Json<CreateActorRequest>, JsonRejection>,
) -> Result<Json<ActorEnvelope>, AppError> {
    let Json(req) = body?;
    req.validate().map_err(AppError::bad_request)?;

    let (Some(name), Some(age), Some(gender)) = (req.name, req.age, req.gender) else {
        return Err(AppError::bad_request(MISSING_REQUIRED_FIELDS));
    };

    let row = actor_repo::create(&state.db, name.trim(), age, gender.trim()).await?;
    info!(sub = ctx.subject(), actor_id = row.id, "actor created");

    Ok(Json(row.into()))
}

pub async fn update_actor(
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    State(state): State<AppState>,
    actor_id: Result<Path<i32>, PathRejection>,
    body: Result<Json<UpdateActorRequest>, JsonRejection>,
) -> Result<Json<ActorEnvelope>, AppError> {
    let Path(actor_id) = actor_id?;
    let Json(req) = body?;
    req.validate().map_err(AppError::bad_request)?;

    let row = actor_repo::update(
        &state.db,
        actor_id,
        req.name.as_deref().map(str::trim),
        req.age,
        req.gender.as_deref().map(str::trim),
    )
    .await?
    .ok_or(AppError::NotFound)?;
    info!(sub = ctx.subject(), actor_id, "actor updated");

    Ok(Json(row.into()))
}

pub async fn delete_actor(
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    State(state): State<AppState>,
    actor_id: Result<Path<i32>, PathRejection>,
) -> Result<Json<DeleteResponse>, AppError> {
    let Path(actor_id) = actor_id?;

    if !actor_repo::delete(&state.db, actor_id).await? {
        return Err(AppError::NotFound);
    }
    info!(sub = ctx.subject(), actor_id, "actor deleted");

    Ok(Json(DeleteResponse::new(actor_id)))
}
