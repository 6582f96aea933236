use chrono::Utc;
use kolla_core::{models::Segment, validation, AppError};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;

use super::rows;

const SEGMENT_COLUMNS: &str =
    "id, team_id, clip_id, name, start_s, end_s, idx, tags, player_ids, created_at, updated_at";

fn segment_from_row(row: &SqliteRow) -> Result<Segment, sqlx::Error> {
    Ok(Segment {
        id: row.try_get("id")?,
        team_id: row.try_get("team_id")?,
        clip_id: row.try_get("clip_id")?,
        name: row.try_get("name")?,
        start_s: row.try_get("start_s")?,
        end_s: row.try_get("end_s")?,
        index: row.try_get("idx")?,
        tags: rows::string_list(row, "tags")?,
        player_ids: rows::string_list(row, "player_ids")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Validated segment fields, ready to write.
#[derive(Debug, Clone)]
pub struct SegmentFields {
    pub name: String,
    pub start_s: f64,
    pub end_s: f64,
    pub tags: Vec<String>,
    pub player_ids: Vec<String>,
}

#[derive(Clone)]
pub struct SegmentRepository {
    pool: SqlitePool,
}

impl SegmentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert at the end of the clip's segment order.
    #[tracing::instrument(skip(self, fields), fields(db.table = "segments", db.operation = "insert"))]
    pub async fn create(
        &self,
        team_id: i64,
        clip_id: i64,
        fields: &SegmentFields,
    ) -> Result<Segment, AppError> {
        let now = Utc::now();
        let sql = format!(
            r#"
            INSERT INTO segments (
                team_id, clip_id, name, start_s, end_s, idx, tags, player_ids,
                created_at, updated_at
            )
            VALUES (
                ?, ?, ?, ?, ?,
                (SELECT COALESCE(MAX(idx), 0) + 1 FROM segments WHERE clip_id = ?),
                ?, ?, ?, ?
            )
            RETURNING {}
            "#,
            SEGMENT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(team_id)
            .bind(clip_id)
            .bind(&fields.name)
            .bind(fields.start_s)
            .bind(fields.end_s)
            .bind(clip_id)
            .bind(rows::encode_list(&fields.tags))
            .bind(rows::encode_list(&fields.player_ids))
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        Ok(segment_from_row(&row)?)
    }

    pub async fn get(&self, team_id: i64, id: i64) -> Result<Option<Segment>, AppError> {
        let sql = format!(
            "SELECT {} FROM segments WHERE id = ? AND team_id = ?",
            SEGMENT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(team_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(segment_from_row).transpose()?)
    }

    pub async fn list_by_clip(&self, team_id: i64, clip_id: i64) -> Result<Vec<Segment>, AppError> {
        let sql = format!(
            "SELECT {} FROM segments WHERE team_id = ? AND clip_id = ? ORDER BY idx, id",
            SEGMENT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(team_id)
            .bind(clip_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(segment_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    /// Segments referenced by `ids`, team-scoped, in no particular order.
    pub async fn get_many(&self, team_id: i64, ids: &[i64]) -> Result<Vec<Segment>, AppError> {
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(segment) = self.get(team_id, *id).await? {
                out.push(segment);
            }
        }
        Ok(out)
    }

    #[tracing::instrument(skip(self, fields), fields(db.table = "segments", db.operation = "update"))]
    pub async fn update(
        &self,
        team_id: i64,
        id: i64,
        fields: &SegmentFields,
    ) -> Result<Option<Segment>, AppError> {
        let sql = format!(
            r#"
            UPDATE segments
            SET name = ?, start_s = ?, end_s = ?, tags = ?, player_ids = ?, updated_at = ?
            WHERE id = ? AND team_id = ?
            RETURNING {}
            "#,
            SEGMENT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(&fields.name)
            .bind(fields.start_s)
            .bind(fields.end_s)
            .bind(rows::encode_list(&fields.tags))
            .bind(rows::encode_list(&fields.player_ids))
            .bind(Utc::now())
            .bind(id)
            .bind(team_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(segment_from_row).transpose()?)
    }

    /// Delete a segment and compact any playlist that referenced it.
    #[tracing::instrument(skip(self), fields(db.table = "segments", db.operation = "delete"))]
    pub async fn delete(&self, team_id: i64, id: i64) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let playlist_ids: Vec<i64> =
            sqlx::query_scalar("SELECT DISTINCT playlist_id FROM playlist_items WHERE segment_id = ?")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;

        let rows_affected = sqlx::query("DELETE FROM segments WHERE id = ? AND team_id = ?")
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

    /// Reassign indices `1..=n` for a clip's segments.
    #[tracing::instrument(skip(self, ids), fields(db.table = "segments", db.operation = "update"))]
    pub async fn reorder(&self, team_id: i64, clip_id: i64, ids: &[i64]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let current: Vec<i64> =
            sqlx::query_scalar("SELECT id FROM segments WHERE team_id = ? AND clip_id = ?")
                .bind(team_id)
                .bind(clip_id)
                .fetch_all(&mut *tx)
                .await?;
        validation::validate_permutation(&current, ids)?;

        let now = Utc::now();
        for (position, id) in ids.iter().enumerate() {
            sqlx::query("UPDATE segments SET idx = ?, updated_at = ? WHERE id = ?")
                .bind(position as i64 + 1)
                .bind(now)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{memory_pool, ClipRepository, EventRepository, TeamRepository};
    use kolla_core::models::{ApprovalStatus, EventKind, NewClip};

    fn fields(name: &str, start_s: f64, end_s: f64) -> SegmentFields {
        SegmentFields {
            name: name.to_string(),
            start_s,
            end_s,
            tags: vec!["press".to_string()],
            player_ids: vec!["p7".to_string()],
        }
    }

    #[tokio::test]
    async fn segments_append_and_reorder() {
        let pool = memory_pool().await.unwrap();
        let team = TeamRepository::new(pool.clone()).create("T").await.unwrap();
        let event = EventRepository::new(pool.clone())
            .create(team.id, "E", EventKind::Game, None)
            .await
            .unwrap();
        let clip = ClipRepository::new(pool.clone())
            .create(&NewClip {
                team_id: team.id,
                event_id: event.id,
                uploader_id: None,
                uploader_name: None,
                name: "clip".to_string(),
                storage_key: "originals/x.mp4".to_string(),
                content_type: "video/mp4".to_string(),
                file_size: None,
                approval_status: ApprovalStatus::Approved,
                index: 1,
                upload_link_id: None,
            })
            .await
            .unwrap();

        let repo = SegmentRepository::new(pool);
        let a = repo.create(team.id, clip.id, &fields("a", 0.0, 4.0)).await.unwrap();
        let b = repo.create(team.id, clip.id, &fields("b", 4.0, 9.5)).await.unwrap();
        assert_eq!((a.index, b.index), (1, 2));
        assert_eq!(a.player_ids, vec!["p7"]);

        repo.reorder(team.id, clip.id, &[b.id, a.id]).await.unwrap();
        let listed = repo.list_by_clip(team.id, clip.id).await.unwrap();
        assert_eq!(listed.iter().map(|s| s.id).collect::<Vec<_>>(), vec![b.id, a.id]);

        let updated = repo
            .update(team.id, a.id, &fields("renamed", 1.0, 2.0))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "renamed");
        assert!(repo.update(team.id + 1, a.id, &fields("x", 1.0, 2.0)).await.unwrap().is_none());

        assert!(repo.delete(team.id, a.id).await.unwrap());
        assert!(repo.get(team.id, a.id).await.unwrap().is_none());
    }
}
