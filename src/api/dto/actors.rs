/*
 * Responsibility
 * - Actors の request/response DTO
 * - validate() で形式チェック (不足なら 400)
 */
use serde::{Deserialize, Serialize};

use super::{MISSING_REQUIRED_FIELDS, blank};
use crate::repos::actor_repo::ActorRow;

#[derive(Debug, Deserialize)]
pub struct CreateActorRequest {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
}

impl CreateActorRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if blank(&self.name) || blank(&self.gender) {
            return Err(MISSING_REQUIRED_FIELDS);
        }
        if !self.age.is_some_and(|age| age > 0) {
            return Err(MISSING_REQUIRED_FIELDS);
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateActorRequest {
    // None: field missing (do not update)
    pub name: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
}

impl UpdateActorRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if let Some(name) = &self.name
            && name.trim().is_empty()
        {
            return Err("name cannot be empty");
        }
        if let Some(gender) = &self.gender
            && gender.trim().is_empty()
        {
            return Err("gender cannot be empty");
        }
        if let Some(age) = self.age
            && age <= 0
        {
            return Err("age must be positive");
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct ActorResponse {
    pub id: i32,
    pub name: String,
    pub age: i32,
    pub gender: String,
}

impl From<ActorRow> for ActorResponse {
    fn from(row: ActorRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            age: row.age,
            gender: row.gender,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ActorsEnvelope {
    pub success: bool,
    pub actors: Vec<ActorResponse>,
}

#[derive(Debug, Serialize)]
pub struct ActorEnvelope {
    pub success: bool,
    pub actor: ActorResponse,
}

impl From<ActorRow> for ActorEnvelope {
    fn from(row: ActorRow) -> Self {
        Self {
            success: true,
            actor: row.into(),
        }
    }
}
