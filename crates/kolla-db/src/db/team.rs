use chrono::Utc;
use kolla_core::{models::Team, AppError};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;

fn team_from_row(row: &SqliteRow) -> Result<Team, sqlx::Error> {
    Ok(Team {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Teams are created by operators; the API only reads them.
#[derive(Clone)]
pub struct TeamRepository {
    pool: SqlitePool,
}

impl TeamRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "teams", db.operation = "insert"))]
    pub async fn create(&self, name: &str) -> Result<Team, AppError> {
        let row = sqlx::query(
            "INSERT INTO teams (name, created_at) VALUES (?, ?) RETURNING id, name, created_at",
        )
        .bind(name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(team_from_row(&row)?)
    }

    pub async fn get(&self, id: i64) -> Result<Option<Team>, AppError> {
        let row = sqlx::query("SELECT id, name, created_at FROM teams WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(team_from_row).transpose()?)
    }

    pub async fn list(&self) -> Result<Vec<Team>, AppError> {
        let rows = sqlx::query("SELECT id, name, created_at FROM teams ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(team_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }
}
