/*
 * Responsibility
 * - actors テーブル向け SQLx 操作
 * - PgPool を受け取り CRUD を提供
 * - DB エラーは RepoError に包んで返す (handler 側で 500 に変換)
 */
use sqlx::{FromRow, PgPool};

use crate::repos::error::RepoError;

#[derive(Debug, Clone, FromRow)]
pub struct ActorRow {
    pub id: i32,
    pub name: String,
    pub age: i32,
    pub gender: String,
}

pub async fn list(db: &PgPool) -> Result<Vec<ActorRow>, RepoError> {
    let rows = sqlx::query_as::<_, ActorRow>(
        r#"
        SELECT id, name, age, gender
        FROM actors
        ORDER BY id
        "#,
    )
    .fetch_all(db)
    .await?;

    Ok(rows)
}

pub async fn create(db: &PgPool, name: &str, age: i32, gender: &str) -> Result<ActorRow, RepoError> {
    let row = sqlx::query_as::<_, ActorRow>(
        r#"
        INSERT INTO actors (name, age, gender)
        VALUES ($1, $2, $3)
        RETURNING id, name, age, gender
        "#,
    )
    .bind(name)
    .bind(age)
    .bind(gender)
    .fetch_one(db)
    .await?;

    Ok(row)
}

pub async fn update(
    db: &PgPool,
    actor_id: i32,
    name: Option<&str>,
    age: Option<i32>,
    gender: Option<&str>,
) -> Result<Option<ActorRow>, RepoError> {
    // None: do not update
    let row = sqlx::query_as::<_, ActorRow>(
        r#"
        UPDATE actors
        SET
            name = COALESCE($2, name),
            age = COALESCE($3, age),
            gender = COALESCE($4, gender)
        WHERE id = $1
        RETURNING id, name, age, gender
        "#,
    )
    .bind(actor_id)
    .bind(name)
    .bind(age)
    .bind(gender)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

pub async fn delete(db: &PgPool, actor_id: i32) -> Result<bool, RepoError> {
    let result = sqlx::query(
        r#"
        DELETE FROM actors
        WHERE id = $1
        "#,
    )
    .bind(actor_id)
    .execute(db)
    .await?;

    Ok(result.rows_affected() > 0)
}
