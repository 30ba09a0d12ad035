use async_trait::async_trait;
use chrono::Utc;
use sqlx::{FromRow, SqlitePool};

use crate::{
    domain::Badge,
    error::{AppError, Result},
    repository::{parse_uuid, BadgeRepository},
};

#[derive(FromRow)]
struct BadgeRow {
    id: String,
    name: String,
}

pub struct SqliteBadgeRepository {
    pool: SqlitePool,
}

impl SqliteBadgeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BadgeRepository for SqliteBadgeRepository {
    async fn upsert(&self, badge: Badge) -> Result<Badge> {
        sqlx::query(
            r#"
            INSERT INTO badges (id, name, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET name = excluded.name
            "#,
        )
        .bind(badge.id.to_string())
        .bind(&badge.name)
        .bind(Utc::now().naive_utc())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(badge)
    }

    async fn list(&self) -> Result<Vec<Badge>> {
        let rows = sqlx::query_as::<_, BadgeRow>("SELECT id, name FROM badges ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(|r| Ok(Badge { id: parse_uuid(&r.id)?, name: r.name }))
            .collect()
    }
}
