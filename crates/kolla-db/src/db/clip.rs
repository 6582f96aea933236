use chrono::{DateTime, Utc};
use kolla_core::{
    models::{ApprovalStatus, Clip, ClipMetadata, ClipStatus, NewClip},
    validation, AppError,
};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;

use super::rows;

const CLIP_COLUMNS: &str = "id, team_id, event_id, uploader_id, uploader_name, name, \
    storage_key, content_type, file_size, hls_prefix, duration_s, width, height, status, \
    fail_reason, approval_status, idx, transcoding_job_id, upload_link_id, tags, \
    created_at, updated_at";

fn clip_from_row(row: &SqliteRow) -> Result<Clip, sqlx::Error> {
    Ok(Clip {
        id: row.try_get("id")?,
        team_id: row.try_get("team_id")?,
        event_id: row.try_get("event_id")?,
        uploader_id: rows::optional_uuid(row, "uploader_id")?,
        uploader_name: row.try_get("uploader_name")?,
        name: row.try_get("name")?,
        storage_key: row.try_get("storage_key")?,
        content_type: row.try_get("content_type")?,
        file_size: row.try_get("file_size")?,
        hls_prefix: row.try_get("hls_prefix")?,
        duration_s: row.try_get("duration_s")?,
        width: row.try_get("width")?,
        height: row.try_get("height")?,
        status: rows::parse_text(row, "status")?,
        fail_reason: row.try_get("fail_reason")?,
        approval_status: rows::parse_text(row, "approval_status")?,
        index: row.try_get("idx")?,
        transcoding_job_id: row.try_get("transcoding_job_id")?,
        upload_link_id: row.try_get("upload_link_id")?,
        tags: rows::string_list(row, "tags")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn clips_from_rows(rows: &[SqliteRow]) -> Result<Vec<Clip>, sqlx::Error> {
    rows.iter().map(clip_from_row).collect()
}

/// Clip registry
///
/// Owns the `clips` table. Status changes go through the `mark_*` methods, each
/// of which only moves a row out of its legal predecessor state and returns
/// `false` when no row matched.
#[derive(Clone)]
pub struct ClipRepository {
    pool: SqlitePool,
}

impl ClipRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a clip in `uploading` state. The caller assigns `index`.
    #[tracing::instrument(skip(self, new), fields(db.table = "clips", db.operation = "insert", event_id = new.event_id))]
    pub async fn create(&self, new: &NewClip) -> Result<Clip, AppError> {
        let now = Utc::now();
        let sql = format!(
            r#"
            INSERT INTO clips (
                team_id, event_id, uploader_id, uploader_name, name, storage_key,
                content_type, file_size, status, approval_status, idx, upload_link_id,
                tags, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, '[]', ?, ?)
            RETURNING {}
            "#,
            CLIP_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(new.team_id)
            .bind(new.event_id)
            .bind(new.uploader_id.map(|id| id.to_string()))
            .bind(&new.uploader_name)
            .bind(&new.name)
            .bind(&new.storage_key)
            .bind(&new.content_type)
            .bind(new.file_size)
            .bind(ClipStatus::Uploading.as_str())
            .bind(new.approval_status.as_str())
            .bind(new.index)
            .bind(new.upload_link_id)
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        // Keep an already-seeded counter ahead of caller-assigned indices.
        sqlx::query(
            r#"
            UPDATE events SET next_clip_index = MAX(next_clip_index, ? + 1)
            WHERE id = ? AND next_clip_index IS NOT NULL
            "#,
        )
        .bind(new.index)
        .bind(new.event_id)
        .execute(&self.pool)
        .await?;

        Ok(clip_from_row(&row)?)
    }

    pub async fn get(&self, team_id: i64, id: i64) -> Result<Option<Clip>, AppError> {
        let sql = format!(
            "SELECT {} FROM clips WHERE id = ? AND team_id = ?",
            CLIP_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(team_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(clip_from_row).transpose()?)
    }

    /// Unscoped lookup for machine callers (processing callback).
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Clip>, AppError> {
        let sql = format!("SELECT {} FROM clips WHERE id = ?", CLIP_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(clip_from_row).transpose()?)
    }

    pub async fn find_by_job_id(&self, job_id: &str) -> Result<Option<Clip>, AppError> {
        let sql = format!(
            "SELECT {} FROM clips WHERE transcoding_job_id = ?",
            CLIP_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(clip_from_row).transpose()?)
    }

    /// Clips of an event in display order.
    pub async fn list_by_event(
        &self,
        team_id: i64,
        event_id: i64,
        approved_only: bool,
    ) -> Result<Vec<Clip>, AppError> {
        let sql = format!(
            "SELECT {} FROM clips WHERE team_id = ? AND event_id = ? \
             AND (? = 0 OR approval_status = 'approved') ORDER BY idx, id",
            CLIP_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(team_id)
            .bind(event_id)
            .bind(approved_only)
            .fetch_all(&self.pool)
            .await?;

        Ok(clips_from_rows(&rows)?)
    }

    pub async fn list_pending(&self, team_id: i64, event_id: i64) -> Result<Vec<Clip>, AppError> {
        let sql = format!(
            "SELECT {} FROM clips WHERE team_id = ? AND event_id = ? \
             AND approval_status = 'pending' ORDER BY idx, id",
            CLIP_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(team_id)
            .bind(event_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(clips_from_rows(&rows)?)
    }

    /// Clips stuck in `processing` without a job id since before `older_than`.
    pub async fn list_stranded(&self, older_than: DateTime<Utc>) -> Result<Vec<Clip>, AppError> {
        let sql = format!(
            "SELECT {} FROM clips WHERE status = 'processing' \
             AND transcoding_job_id IS NULL AND updated_at <= ? ORDER BY updated_at",
            CLIP_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(older_than)
            .fetch_all(&self.pool)
            .await?;

        Ok(clips_from_rows(&rows)?)
    }

    pub async fn rename(&self, team_id: i64, id: i64, name: &str) -> Result<bool, AppError> {
        let result =
            sqlx::query("UPDATE clips SET name = ?, updated_at = ? WHERE id = ? AND team_id = ?")
                .bind(name)
                .bind(Utc::now())
                .bind(id)
                .bind(team_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn set_tags(&self, team_id: i64, id: i64, tags: &[String]) -> Result<bool, AppError> {
        let result =
            sqlx::query("UPDATE clips SET tags = ?, updated_at = ? WHERE id = ? AND team_id = ?")
                .bind(rows::encode_list(tags))
                .bind(Utc::now())
                .bind(id)
                .bind(team_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Fill in media metadata. A field that already has a value keeps it.
    #[tracing::instrument(skip(self), fields(db.table = "clips", db.operation = "update"))]
    pub async fn update_metadata(&self, id: i64, metadata: ClipMetadata) -> Result<bool, AppError> {
        if metadata.is_empty() {
            return Ok(false);
        }

        let result = sqlx::query(
            r#"
            UPDATE clips SET
                duration_s = COALESCE(duration_s, ?),
                width = COALESCE(width, ?),
                height = COALESCE(height, ?),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(metadata.duration_s)
        .bind(metadata.width)
        .bind(metadata.height)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn transition(&self, id: i64, to: ClipStatus) -> Result<bool, AppError> {
        let Some(from) = to.predecessor() else {
            return Ok(false);
        };

        let result =
            sqlx::query("UPDATE clips SET status = ?, updated_at = ? WHERE id = ? AND status = ?")
                .bind(to.as_str())
                .bind(Utc::now())
                .bind(id)
                .bind(from.as_str())
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "clips", db.operation = "update"))]
    pub async fn mark_uploaded(&self, id: i64) -> Result<bool, AppError> {
        self.transition(id, ClipStatus::Uploaded).await
    }

    #[tracing::instrument(skip(self), fields(db.table = "clips", db.operation = "update"))]
    pub async fn mark_processing(&self, id: i64) -> Result<bool, AppError> {
        self.transition(id, ClipStatus::Processing).await
    }

    /// Record the provider job id. Only a processing clip without a job accepts one.
    #[tracing::instrument(skip(self), fields(db.table = "clips", db.operation = "update"))]
    pub async fn set_job_id(&self, id: i64, job_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE clips SET transcoding_job_id = ?, updated_at = ?
            WHERE id = ? AND status = 'processing' AND transcoding_job_id IS NULL
            "#,
        )
        .bind(job_id)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "clips", db.operation = "update"))]
    pub async fn mark_ready(&self, id: i64, hls_prefix: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE clips SET status = 'ready', hls_prefix = ?, updated_at = ?
            WHERE id = ? AND status = 'processing'
            "#,
        )
        .bind(hls_prefix)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "clips", db.operation = "update"))]
    pub async fn mark_failed(&self, id: i64, reason: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE clips SET status = 'failed', fail_reason = ?, updated_at = ?
            WHERE id = ? AND status = 'processing'
            "#,
        )
        .bind(reason)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Approve a batch. Every id must belong to the team or nothing is written.
    #[tracing::instrument(skip(self, ids), fields(db.table = "clips", db.operation = "update", count = ids.len()))]
    pub async fn approve(&self, team_id: i64, ids: &[i64]) -> Result<Vec<i64>, AppError> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        for id in ids {
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM clips WHERE id = ? AND team_id = ?)",
            )
            .bind(id)
            .bind(team_id)
            .fetch_one(&mut *tx)
            .await?;
            if !exists {
                return Err(AppError::not_found("Clip", *id));
            }
        }

        for id in ids {
            sqlx::query(
                "UPDATE clips SET approval_status = ?, updated_at = ? WHERE id = ? AND team_id = ?",
            )
            .bind(ApprovalStatus::Approved.as_str())
            .bind(now)
            .bind(id)
            .bind(team_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(ids.to_vec())
    }

    /// Atomically reserve `count` consecutive indices for an event.
    ///
    /// Returns the first index of the batch, or `None` when the event is not in the team.
    #[tracing::instrument(skip(self), fields(db.table = "events", db.operation = "update"))]
    pub async fn reserve_indices(
        &self,
        team_id: i64,
        event_id: i64,
        count: i64,
    ) -> Result<Option<i64>, AppError> {
        if count < 1 {
            return Err(AppError::InvalidInput(
                "count must be at least 1".to_string(),
            ));
        }

        let next: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE events SET next_clip_index = COALESCE(
                next_clip_index,
                (SELECT COALESCE(MAX(idx), 0) + 1 FROM clips WHERE clips.event_id = events.id)
            ) + ?
            WHERE id = ? AND team_id = ?
            RETURNING next_clip_index
            "#,
        )
        .bind(count)
        .bind(event_id)
        .bind(team_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(next.map(|end| end - count))
    }

    /// Reassign indices `1..=n` in the given order. `ids` must be a permutation
    /// of the event's clips.
    #[tracing::instrument(skip(self, ids), fields(db.table = "clips", db.operation = "update"))]
    pub async fn reorder(&self, team_id: i64, event_id: i64, ids: &[i64]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let current: Vec<i64> =
            sqlx::query_scalar("SELECT id FROM clips WHERE team_id = ? AND event_id = ?")
                .bind(team_id)
                .bind(event_id)
                .fetch_all(&mut *tx)
                .await?;
        validation::validate_permutation(&current, ids)?;

        let now = Utc::now();
        for (position, id) in ids.iter().enumerate() {
            sqlx::query("UPDATE clips SET idx = ?, updated_at = ? WHERE id = ?")
                .bind(position as i64 + 1)
                .bind(now)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            "UPDATE events SET next_clip_index = MAX(COALESCE(next_clip_index, 0), ?) WHERE id = ?",
        )
        .bind(ids.len() as i64 + 1)
        .bind(event_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Remove the row. Segments, comments and playlist items cascade, and every
    /// playlist that lost an item is compacted in the same transaction.
    #[tracing::instrument(skip(self), fields(db.table = "clips", db.operation = "delete"))]
    pub async fn delete(&self, team_id: i64, id: i64) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let playlist_ids: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT playlist_id FROM playlist_items
            WHERE clip_id = ? OR segment_id IN (SELECT id FROM segments WHERE clip_id = ?)
            "#,
        )
        .bind(id)
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let rows_affected = sqlx::query("DELETE FROM clips WHERE id = ? AND team_id = ?")
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
    use crate::{memory_pool, EventRepository, TeamRepository};
    use kolla_core::models::EventKind;

    struct Fixture {
        repo: ClipRepository,
        team_id: i64,
        event_id: i64,
    }

    async fn fixture() -> Fixture {
        let pool = memory_pool().await.unwrap();
        let team = TeamRepository::new(pool.clone()).create("Hawks").await.unwrap();
        let event = EventRepository::new(pool.clone())
            .create(team.id, "Saturday game", EventKind::Game, None)
            .await
            .unwrap();
        Fixture {
            repo: ClipRepository::new(pool),
            team_id: team.id,
            event_id: event.id,
        }
    }

    fn new_clip(f: &Fixture, key: &str, index: i64) -> NewClip {
        NewClip {
            team_id: f.team_id,
            event_id: f.event_id,
            uploader_id: Some(uuid::Uuid::new_v4()),
            uploader_name: None,
            name: key.to_string(),
            storage_key: format!("originals/{}/{}/{}.mp4", f.team_id, f.event_id, key),
            content_type: "video/mp4".to_string(),
            file_size: Some(1024),
            approval_status: ApprovalStatus::Approved,
            index,
            upload_link_id: None,
        }
    }

    #[tokio::test]
    async fn status_moves_only_forward() {
        let f = fixture().await;
        let clip = f.repo.create(&new_clip(&f, "a", 1)).await.unwrap();
        assert_eq!(clip.status, ClipStatus::Uploading);

        // Skipping a step matches nothing.
        assert!(!f.repo.mark_processing(clip.id).await.unwrap());
        assert!(!f.repo.mark_ready(clip.id, "hls/x/").await.unwrap());

        assert!(f.repo.mark_uploaded(clip.id).await.unwrap());
        assert!(f.repo.mark_processing(clip.id).await.unwrap());
        assert!(f.repo.set_job_id(clip.id, "job-1").await.unwrap());
        assert!(!f.repo.set_job_id(clip.id, "job-2").await.unwrap());
        assert!(f.repo.mark_ready(clip.id, "hls/1/1/1/").await.unwrap());

        // A late failure cannot regress a ready clip.
        assert!(!f.repo.mark_failed(clip.id, "late").await.unwrap());

        let stored = f.repo.get(f.team_id, clip.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ClipStatus::Ready);
        assert_eq!(stored.hls_prefix.as_deref(), Some("hls/1/1/1/"));
        assert_eq!(stored.fail_reason, None);
        assert_eq!(
            f.repo.find_by_job_id("job-1").await.unwrap().map(|c| c.id),
            Some(clip.id)
        );
    }

    #[tokio::test]
    async fn metadata_is_first_write_wins() {
        let f = fixture().await;
        let clip = f.repo.create(&new_clip(&f, "a", 1)).await.unwrap();

        f.repo
            .update_metadata(
                clip.id,
                ClipMetadata {
                    duration_s: Some(42.0),
                    width: None,
                    height: None,
                },
            )
            .await
            .unwrap();
        f.repo
            .update_metadata(
                clip.id,
                ClipMetadata {
                    duration_s: Some(10.0),
                    width: Some(1920),
                    height: Some(1080),
                },
            )
            .await
            .unwrap();

        let stored = f.repo.get_by_id(clip.id).await.unwrap().unwrap();
        assert_eq!(stored.duration_s, Some(42.0));
        assert_eq!(stored.width, Some(1920));
        assert_eq!(stored.height, Some(1080));
    }

    #[tokio::test]
    async fn reserved_ranges_never_overlap() {
        let f = fixture().await;
        f.repo.create(&new_clip(&f, "a", 1)).await.unwrap();
        f.repo.create(&new_clip(&f, "b", 2)).await.unwrap();

        let first = f.repo.reserve_indices(f.team_id, f.event_id, 3).await.unwrap();
        let second = f.repo.reserve_indices(f.team_id, f.event_id, 2).await.unwrap();
        assert_eq!(first, Some(3));
        assert_eq!(second, Some(6));

        // A caller-assigned index past the counter pushes it forward.
        f.repo.create(&new_clip(&f, "c", 20)).await.unwrap();
        let third = f.repo.reserve_indices(f.team_id, f.event_id, 1).await.unwrap();
        assert_eq!(third, Some(21));

        assert_eq!(f.repo.reserve_indices(f.team_id + 1, f.event_id, 1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn approve_is_all_or_nothing() {
        let f = fixture().await;
        let mut pending = new_clip(&f, "a", 1);
        pending.approval_status = ApprovalStatus::Pending;
        let clip = f.repo.create(&pending).await.unwrap();

        let err = f.repo.approve(f.team_id, &[clip.id, 9999]).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        let stored = f.repo.get(f.team_id, clip.id).await.unwrap().unwrap();
        assert_eq!(stored.approval_status, ApprovalStatus::Pending);

        f.repo.approve(f.team_id, &[clip.id]).await.unwrap();
        let approved = f.repo.list_by_event(f.team_id, f.event_id, true).await.unwrap();
        assert_eq!(approved.len(), 1);
    }

    #[tokio::test]
    async fn reorder_requires_permutation() {
        let f = fixture().await;
        let a = f.repo.create(&new_clip(&f, "a", 1)).await.unwrap();
        let b = f.repo.create(&new_clip(&f, "b", 2)).await.unwrap();

        assert!(f.repo.reorder(f.team_id, f.event_id, &[a.id]).await.is_err());
        f.repo.reorder(f.team_id, f.event_id, &[b.id, a.id]).await.unwrap();

        let ids: Vec<i64> = f
            .repo
            .list_by_event(f.team_id, f.event_id, false)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[tokio::test]
    async fn stranded_clips_have_no_job() {
        let f = fixture().await;
        let a = f.repo.create(&new_clip(&f, "a", 1)).await.unwrap();
        let b = f.repo.create(&new_clip(&f, "b", 2)).await.unwrap();
        for id in [a.id, b.id] {
            f.repo.mark_uploaded(id).await.unwrap();
            f.repo.mark_processing(id).await.unwrap();
        }
        f.repo.set_job_id(b.id, "job-b").await.unwrap();

        let stranded = f
            .repo
            .list_stranded(Utc::now() + chrono::Duration::seconds(1))
            .await
            .unwrap();
        assert_eq!(stranded.iter().map(|c| c.id).collect::<Vec<_>>(), vec![a.id]);
    }
}
