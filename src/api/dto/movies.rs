/*
 * Responsibility
 * - Movies の request/response DTO
 */
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{MISSING_REQUIRED_FIELDS, blank};
use crate::repos::movie_repo::MovieRow;

/// `release_date` は `YYYY-MM-DD`
#[derive(Debug, Deserialize)]
pub struct CreateMovieRequest {
    pub title: Option<String>,
    pub release_date: Option<NaiveDate>,
}

impl CreateMovieRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if blank(&self.title) || self.release_date.is_none() {
            return Err(MISSING_REQUIRED_FIELDS);
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateMovieRequest {
    pub title: Option<String>,
    pub release_date: Option<NaiveDate>,
}

impl UpdateMovieRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if let Some(title) = &self.title
            && title.trim().is_empty()
        {
            return Err("title cannot be empty");
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct MovieResponse {
    pub id: i32,
    pub title: String,
    pub release_date: NaiveDate,
}

impl From<MovieRow> for MovieResponse {
    fn from(row: MovieRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            release_date: row.release_date,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MoviesEnvelope {
    pub success: bool,
    pub movies: Vec<MovieResponse>,
}

#[derive(Debug, Serialize)]
pub struct MovieEnvelope {
    pub success: bool,
    pub movie: MovieResponse,
}

impl From<MovieRow> for MovieEnvelope {
    fn from(row: MovieRow) -> Self {
        Self {
            success: true,
            movie: row.into(),
        }
    }
}
