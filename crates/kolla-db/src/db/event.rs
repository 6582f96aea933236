use chrono::{DateTime, Utc};
use kolla_core::{
    models::{Event, EventKind},
    AppError,
};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;

use super::rows;

const EVENT_COLUMNS: &str = "id, team_id, name, kind, occurs_at, created_at";

fn event_from_row(row: &SqliteRow) -> Result<Event, sqlx::Error> {
    Ok(Event {
        id: row.try_get("id")?,
        team_id: row.try_get("team_id")?,
        name: row.try_get("name")?,
        kind: rows::parse_text(row, "kind")?,
        occurs_at: row.try_get("occurs_at")?,
        created_at: row.try_get("created_at")?,
    })
}

#[derive(Clone)]
pub struct EventRepository {
    pool: SqlitePool,
}

impl EventRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "events", db.operation = "insert"))]
    pub async fn create(
        &self,
        team_id: i64,
        name: &str,
        kind: EventKind,
        occurs_at: Option<DateTime<Utc>>,
    ) -> Result<Event, AppError> {
        let sql = format!(
            "INSERT INTO events (team_id, name, kind, occurs_at, created_at) \
             VALUES (?, ?, ?, ?, ?) RETURNING {}",
            EVENT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(team_id)
            .bind(name)
            .bind(kind.as_str())
            .bind(occurs_at)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;

        Ok(event_from_row(&row)?)
    }

    pub async fn get(&self, team_id: i64, id: i64) -> Result<Option<Event>, AppError> {
        let sql = format!(
            "SELECT {} FROM events WHERE id = ? AND team_id = ?",
            EVENT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(team_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(event_from_row).transpose()?)
    }

    /// Newest first; events without a date sort by creation time.
    pub async fn list(&self, team_id: i64) -> Result<Vec<Event>, AppError> {
        let sql = format!(
            "SELECT {} FROM events WHERE team_id = ? \
             ORDER BY COALESCE(occurs_at, created_at) DESC, id DESC",
            EVENT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(team_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(event_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    /// Clips, segments, links and comments go with the event through cascades.
    #[tracing::instrument(skip(self), fields(db.table = "events", db.operation = "delete"))]
    pub async fn delete(&self, team_id: i64, id: i64) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let playlist_ids: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT pi.playlist_id
            FROM playlist_items pi
            LEFT JOIN clips c ON c.id = pi.clip_id
            LEFT JOIN segments s ON s.id = pi.segment_id
            LEFT JOIN clips sc ON sc.id = s.clip_id
            WHERE c.event_id = ? OR sc.event_id = ?
            "#,
        )
        .bind(id)
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let rows_affected = sqlx::query("DELETE FROM events WHERE id = ? AND team_id = ?")
            .bind(id)
            .bind(team_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if rows_affected == 0 {
            return Ok(false);
        }

        for playlist_id in playlist_ids {
            super::playlist::compact_positions(&mut *tx, playlist_id).await?;
        }

        tx.commit().await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{memory_pool, TeamRepository};

    #[tokio::test]
    async fn events_are_team_scoped() {
        let pool = memory_pool().await.unwrap();
        let teams = TeamRepository::new(pool.clone());
        let a = teams.create("A").await.unwrap();
        let b = teams.create("B").await.unwrap();

        let repo = EventRepository::new(pool);
        let event = repo
            .create(a.id, "Derby", EventKind::Game, None)
            .await
            .unwrap();
        assert_eq!(event.kind, EventKind::Game);

        assert!(repo.get(a.id, event.id).await.unwrap().is_some());
        assert!(repo.get(b.id, event.id).await.unwrap().is_none());
        assert!(!repo.delete(b.id, event.id).await.unwrap());
        assert!(repo.delete(a.id, event.id).await.unwrap());
        assert!(repo.list(a.id).await.unwrap().is_empty());
    }
}
