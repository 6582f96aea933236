//! Upload links and share links.
//!
//! Share links live in two tables, one per target kind. Tokens are random
//! enough that a lookup can try both tables in turn.

use chrono::{DateTime, Utc};
use kolla_core::{
    models::{ShareLink, ShareTarget, UploadLink},
    AppError,
};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

use super::rows;

const UPLOAD_LINK_COLUMNS: &str = "id, team_id, event_id, token, expires_at, created_by, created_at";

fn upload_link_from_row(row: &SqliteRow) -> Result<UploadLink, sqlx::Error> {
    Ok(UploadLink {
        id: row.try_get("id")?,
        team_id: row.try_get("team_id")?,
        event_id: row.try_get("event_id")?,
        token: row.try_get("token")?,
        expires_at: row.try_get("expires_at")?,
        created_by: rows::uuid(row, "created_by")?,
        created_at: row.try_get("created_at")?,
    })
}

#[derive(Clone)]
pub struct UploadLinkRepository {
    pool: SqlitePool,
}

impl UploadLinkRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self, token), fields(db.table = "upload_links", db.operation = "insert"))]
    pub async fn create(
        &self,
        team_id: i64,
        event_id: i64,
        token: &str,
        expires_at: DateTime<Utc>,
        created_by: Uuid,
    ) -> Result<UploadLink, AppError> {
        let sql = format!(
            "INSERT INTO upload_links (team_id, event_id, token, expires_at, created_by, created_at) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING {}",
            UPLOAD_LINK_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(team_id)
            .bind(event_id)
            .bind(token)
            .bind(expires_at)
            .bind(created_by.to_string())
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;

        Ok(upload_link_from_row(&row)?)
    }

    pub async fn find_by_token(&self, token: &str) -> Result<Option<UploadLink>, AppError> {
        let sql = format!(
            "SELECT {} FROM upload_links WHERE token = ?",
            UPLOAD_LINK_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(upload_link_from_row).transpose()?)
    }

    pub async fn list_by_event(
        &self,
        team_id: i64,
        event_id: i64,
    ) -> Result<Vec<UploadLink>, AppError> {
        let sql = format!(
            "SELECT {} FROM upload_links WHERE team_id = ? AND event_id = ? ORDER BY created_at DESC",
            UPLOAD_LINK_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(team_id)
            .bind(event_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(upload_link_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    pub async fn delete(&self, team_id: i64, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM upload_links WHERE id = ? AND team_id = ?")
            .bind(id)
            .bind(team_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete links that expired at or before `now`. Clips keep their rows.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM upload_links WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

fn share_link_from_row(row: &SqliteRow, target: ShareTarget) -> Result<ShareLink, sqlx::Error> {
    Ok(ShareLink {
        id: row.try_get("id")?,
        team_id: row.try_get("team_id")?,
        target,
        token: row.try_get("token")?,
        expires_at: row.try_get("expires_at")?,
        created_by: rows::uuid(row, "created_by")?,
        created_at: row.try_get("created_at")?,
    })
}

fn event_share_from_row(row: &SqliteRow) -> Result<ShareLink, sqlx::Error> {
    let event_id: i64 = row.try_get("event_id")?;
    share_link_from_row(row, ShareTarget::Event(event_id))
}

fn playlist_share_from_row(row: &SqliteRow) -> Result<ShareLink, sqlx::Error> {
    let playlist_id: i64 = row.try_get("playlist_id")?;
    share_link_from_row(row, ShareTarget::Playlist(playlist_id))
}

/// `(table, owner column)` for a share target.
fn share_table(target: &ShareTarget) -> (&'static str, &'static str) {
    match target {
        ShareTarget::Event(_) => ("share_links", "event_id"),
        ShareTarget::Playlist(_) => ("playlist_share_links", "playlist_id"),
    }
}

fn target_id(target: &ShareTarget) -> i64 {
    match target {
        ShareTarget::Event(id) | ShareTarget::Playlist(id) => *id,
    }
}

fn share_from_row_for(target: &ShareTarget, row: &SqliteRow) -> Result<ShareLink, sqlx::Error> {
    match target {
        ShareTarget::Event(_) => event_share_from_row(row),
        ShareTarget::Playlist(_) => playlist_share_from_row(row),
    }
}

#[derive(Clone)]
pub struct ShareLinkRepository {
    pool: SqlitePool,
}

impl ShareLinkRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self, token), fields(db.operation = "insert"))]
    pub async fn create(
        &self,
        team_id: i64,
        target: ShareTarget,
        token: &str,
        expires_at: Option<DateTime<Utc>>,
        created_by: Uuid,
    ) -> Result<ShareLink, AppError> {
        let (table, owner) = share_table(&target);
        let sql = format!(
            "INSERT INTO {table} (team_id, {owner}, token, expires_at, created_by, created_at) \
             VALUES (?, ?, ?, ?, ?, ?) \
             RETURNING id, team_id, {owner}, token, expires_at, created_by, created_at"
        );
        let row = sqlx::query(&sql)
            .bind(team_id)
            .bind(target_id(&target))
            .bind(token)
            .bind(expires_at)
            .bind(created_by.to_string())
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;

        Ok(share_from_row_for(&target, &row)?)
    }

    /// Resolve a token against event shares, then playlist shares.
    pub async fn find_by_token(&self, token: &str) -> Result<Option<ShareLink>, AppError> {
        let row = sqlx::query(
            "SELECT id, team_id, event_id, token, expires_at, created_by, created_at \
             FROM share_links WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        if let Some(row) = row {
            return Ok(Some(event_share_from_row(&row)?));
        }

        let row = sqlx::query(
            "SELECT id, team_id, playlist_id, token, expires_at, created_by, created_at \
             FROM playlist_share_links WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(playlist_share_from_row).transpose()?)
    }

    pub async fn list_for(&self, team_id: i64, target: ShareTarget) -> Result<Vec<ShareLink>, AppError> {
        let (table, owner) = share_table(&target);
        let sql = format!(
            "SELECT id, team_id, {owner}, token, expires_at, created_by, created_at \
             FROM {table} WHERE team_id = ? AND {owner} = ? ORDER BY created_at DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(team_id)
            .bind(target_id(&target))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| share_from_row_for(&target, row))
            .collect::<Result<Vec<_>, _>>()?)
    }

    /// Revoke by link id. `kind` picks the table; its id is ignored.
    pub async fn delete(&self, team_id: i64, kind: ShareTarget, id: i64) -> Result<bool, AppError> {
        let (table, _) = share_table(&kind);
        let sql = format!("DELETE FROM {table} WHERE id = ? AND team_id = ?");
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(team_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut purged = 0;
        for table in ["share_links", "playlist_share_links"] {
            let sql = format!("DELETE FROM {table} WHERE expires_at IS NOT NULL AND expires_at <= ?");
            purged += sqlx::query(&sql)
                .bind(now)
                .execute(&self.pool)
                .await?
                .rows_affected();
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{memory_pool, EventRepository, PlaylistRepository, TeamRepository};
    use chrono::Duration;
    use kolla_core::models::EventKind;

    #[tokio::test]
    async fn tokens_resolve_across_both_share_tables() {
        let pool = memory_pool().await.unwrap();
        let team = TeamRepository::new(pool.clone()).create("T").await.unwrap();
        let event = EventRepository::new(pool.clone())
            .create(team.id, "E", EventKind::Game, None)
            .await
            .unwrap();
        let playlist = PlaylistRepository::new(pool.clone())
            .create(team.id, "P")
            .await
            .unwrap();

        let repo = ShareLinkRepository::new(pool);
        let creator = Uuid::new_v4();
        repo.create(team.id, ShareTarget::Event(event.id), "ev-token", None, creator)
            .await
            .unwrap();
        let expired = repo
            .create(
                team.id,
                ShareTarget::Playlist(playlist.id),
                "pl-token",
                Some(Utc::now() - Duration::hours(1)),
                creator,
            )
            .await
            .unwrap();

        let found = repo.find_by_token("ev-token").await.unwrap().unwrap();
        assert_eq!(found.target, ShareTarget::Event(event.id));
        assert_eq!(found.created_by, creator);
        let found = repo.find_by_token("pl-token").await.unwrap().unwrap();
        assert_eq!(found.target, ShareTarget::Playlist(playlist.id));
        assert!(repo.find_by_token("nope").await.unwrap().is_none());

        assert_eq!(repo.purge_expired(Utc::now()).await.unwrap(), 1);
        assert!(!repo
            .delete(team.id, ShareTarget::Playlist(0), expired.id)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn upload_links_purge_after_expiry() {
        let pool = memory_pool().await.unwrap();
        let team = TeamRepository::new(pool.clone()).create("T").await.unwrap();
        let event = EventRepository::new(pool.clone())
            .create(team.id, "E", EventKind::Practice, None)
            .await
            .unwrap();

        let repo = UploadLinkRepository::new(pool);
        let now = Utc::now();
        repo.create(team.id, event.id, "old", now - Duration::minutes(1), Uuid::nil())
            .await
            .unwrap();
        repo.create(team.id, event.id, "fresh", now + Duration::hours(72), Uuid::nil())
            .await
            .unwrap();

        assert_eq!(repo.purge_expired(now).await.unwrap(), 1);
        let remaining = repo.list_by_event(team.id, event.id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].token, "fresh");
    }
}
