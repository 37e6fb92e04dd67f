/*
 * Responsibility
 * - /movies 系 handler
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
            movies::{
                CreateMovieRequest, MovieEnvelope, MovieResponse, MoviesEnvelope,
                UpdateMovieRequest,
            },
        },
        extractors::AuthCtxExtractor,
    },
    error::AppError,
    repos::movie_repo,
    state::AppState,
};

pub async fn list_movies(
    AuthCtxExtractor(_ctx): AuthCtxExtractor,
    State(state): State<AppState>,
) -> Result<Json<MoviesEnvelope>, AppError> {
    let rows = movie_repo::list(&state.db).await?;

    Ok(Json(MoviesEnvelope {
        success: true,
        movies: rows.into_iter().map(MovieResponse::from).collect(),
    }))
}

pub async fn create_movie(
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    State(state): State<AppState>,
    body: Result<Json<CreateMovieRequest>, JsonRejection>,
) -> Result<Json<MovieEnvelope>, AppError> {
    let Json(req) = body?;
    req.validate().map_err(AppError::bad_request)?;

    let (Some(title), Some(release_date)) = (req.title, req.release_date) else {
        return Err(AppError::bad_request(MISSING_REQUIRED_FIELDS));
    };

    let row = movie_repo::create(&state.db, title.trim(), release_date).await?;
    info!(sub = ctx.subject(), movie_id = row.id, "movie created");

    Ok(Json(row.into()))
}

pub async fn update_movie(
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    State(state): State<AppState>,
    movie_id: Result<Path<i32>, PathRejection>,
    body: Result<Json<UpdateMovieRequest>, JsonRejection>,
) -> Result<Json<MovieEnvelope>, AppError> {
    let Path(movie_id) = movie_id?;
    let Json(req) = body?;
    req.validate().map_err(AppError::bad_request)?;

    let row = movie_repo::update(
        &state.db,
        movie_id,
        req.title.as_deref().map(str::trim),
        req.release_date,
    )
    .await?
    .ok_or(AppError::NotFound)?;
    info!(sub = ctx.subject(), movie_id, "movie updated");

    Ok(Json(row.into()))
}

pub async fn delete_movie(
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    State(state): State<AppState>,
    movie_id: Result<Path<i32>, PathRejection>,
) -> Result<Json<DeleteResponse>, AppError> {
    let Path(movie_id) = movie_id?;

    if !movie_repo::delete(&state.db, movie_id).await? {
        return Err(AppError::NotFound);
    }
    info!(sub = ctx.subject(), movie_id, "movie deleted");

    Ok(Json(DeleteResponse::new(movie_id)))
}
