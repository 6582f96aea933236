use chrono::Utc;
use kolla_core::{models::Comment, AppError};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

use super::rows;

const COMMENT_COLUMNS: &str =
    "id, team_id, clip_id, segment_id, parent_id, author_id, body, created_at";

fn comment_from_row(row: &SqliteRow) -> Result<Comment, sqlx::Error> {
    Ok(Comment {
        id: row.try_get("id")?,
        team_id: row.try_get("team_id")?,
        clip_id: row.try_get("clip_id")?,
        segment_id: row.try_get("segment_id")?,
        parent_id: row.try_get("parent_id")?,
        author_id: rows::uuid(row, "author_id")?,
        body: row.try_get("body")?,
        created_at: row.try_get("created_at")?,
    })
}

#[derive(Clone)]
pub struct CommentRepository {
    pool: SqlitePool,
}

impl CommentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self, body), fields(db.table = "comments", db.operation = "insert"))]
    pub async fn create(
        &self,
        team_id: i64,
        clip_id: i64,
        segment_id: Option<i64>,
        parent_id: Option<i64>,
        author_id: Uuid,
        body: &str,
    ) -> Result<Comment, AppError> {
        let sql = format!(
            "INSERT INTO comments (team_id, clip_id, segment_id, parent_id, author_id, body, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING {}",
            COMMENT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(team_id)
            .bind(clip_id)
            .bind(segment_id)
            .bind(parent_id)
            .bind(author_id.to_string())
            .bind(body)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;

        Ok(comment_from_row(&row)?)
    }

    pub async fn get(&self, team_id: i64, id: i64) -> Result<Option<Comment>, AppError> {
        let sql = format!(
            "SELECT {} FROM comments WHERE id = ? AND team_id = ?",
            COMMENT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(team_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(comment_from_row).transpose()?)
    }

    /// Flat list in creation order.
    pub async fn list_by_clip(&self, team_id: i64, clip_id: i64) -> Result<Vec<Comment>, AppError> {
        let sql = format!(
            "SELECT {} FROM comments WHERE team_id = ? AND clip_id = ? ORDER BY created_at, id",
            COMMENT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(team_id)
            .bind(clip_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(comment_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    /// Replies cascade with their parent.
    pub async fn delete(&self, team_id: i64, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ? AND team_id = ?")
            .bind(id)
            .bind(team_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
