use chrono::Utc;
use kolla_core::{
    models::{Playlist, PlaylistItem, PlaylistItemRef},
    validation, AppError,
};
use sqlx::sqlite::{SqliteConnection, SqlitePool, SqliteRow};
use sqlx::Row;

const PLAYLIST_COLUMNS: &str = "id, team_id, name, created_at, updated_at";
const ITEM_COLUMNS: &str = "id, playlist_id, clip_id, segment_id, position, created_at";

fn playlist_from_row(row: &SqliteRow) -> Result<Playlist, sqlx::Error> {
    Ok(Playlist {
        id: row.try_get("id")?,
        team_id: row.try_get("team_id")?,
        name: row.try_get("name")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn item_from_row(row: &SqliteRow) -> Result<PlaylistItem, sqlx::Error> {
    let item = PlaylistItemRef::from_parts(row.try_get("clip_id")?, row.try_get("segment_id")?)
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
    Ok(PlaylistItem {
        id: row.try_get("id")?,
        playlist_id: row.try_get("playlist_id")?,
        item,
        position: row.try_get("position")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Renumber a playlist's items `0..n`, keeping their relative order.
pub(crate) async fn compact_positions(
    conn: &mut SqliteConnection,
    playlist_id: i64,
) -> Result<(), sqlx::Error> {
    let ids: Vec<i64> = sqlx::query_scalar(
        "SELECT id FROM playlist_items WHERE playlist_id = ? ORDER BY position, id",
    )
    .bind(playlist_id)
    .fetch_all(&mut *conn)
    .await?;

    for (position, id) in ids.iter().enumerate() {
        sqlx::query("UPDATE playlist_items SET position = ? WHERE id = ?")
            .bind(position as i64)
            .bind(id)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

#[derive(Clone)]
pub struct PlaylistRepository {
    pool: SqlitePool,
}

impl PlaylistRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "playlists", db.operation = "insert"))]
    pub async fn create(&self, team_id: i64, name: &str) -> Result<Playlist, AppError> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO playlists (team_id, name, created_at, updated_at) \
             VALUES (?, ?, ?, ?) RETURNING {}",
            PLAYLIST_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(team_id)
            .bind(name)
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        Ok(playlist_from_row(&row)?)
    }

    pub async fn get(&self, team_id: i64, id: i64) -> Result<Option<Playlist>, AppError> {
        let sql = format!(
            "SELECT {} FROM playlists WHERE id = ? AND team_id = ?",
            PLAYLIST_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(team_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(playlist_from_row).transpose()?)
    }

    pub async fn list(&self, team_id: i64) -> Result<Vec<Playlist>, AppError> {
        let sql = format!(
            "SELECT {} FROM playlists WHERE team_id = ? ORDER BY updated_at DESC, id DESC",
            PLAYLIST_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(team_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(playlist_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    pub async fn rename(&self, team_id: i64, id: i64, name: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE playlists SET name = ?, updated_at = ? WHERE id = ? AND team_id = ?",
        )
        .bind(name)
        .bind(Utc::now())
        .bind(id)
        .bind(team_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, team_id: i64, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM playlists WHERE id = ? AND team_id = ?")
            .bind(id)
            .bind(team_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Items in playback order. Callers check playlist ownership first.
    pub async fn list_items(&self, playlist_id: i64) -> Result<Vec<PlaylistItem>, AppError> {
        let sql = format!(
            "SELECT {} FROM playlist_items WHERE playlist_id = ? ORDER BY position, id",
            ITEM_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(playlist_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(item_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    /// Append an item at `max(position) + 1`.
    #[tracing::instrument(skip(self), fields(db.table = "playlist_items", db.operation = "insert"))]
    pub async fn add_item(
        &self,
        playlist_id: i64,
        item: PlaylistItemRef,
    ) -> Result<PlaylistItem, AppError> {
        let now = Utc::now();
        let sql = format!(
            r#"
            INSERT INTO playlist_items (playlist_id, clip_id, segment_id, position, created_at)
            VALUES (
                ?, ?, ?,
                (SELECT COALESCE(MAX(position) + 1, 0) FROM playlist_items WHERE playlist_id = ?),
                ?
            )
            RETURNING {}
            "#,
            ITEM_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(playlist_id)
            .bind(item.clip_id())
            .bind(item.segment_id())
            .bind(playlist_id)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        sqlx::query("UPDATE playlists SET updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(playlist_id)
            .execute(&self.pool)
            .await?;

        Ok(item_from_row(&row)?)
    }

    /// Remove one item and close the gap it leaves.
    #[tracing::instrument(skip(self), fields(db.table = "playlist_items", db.operation = "delete"))]
    pub async fn remove_item(&self, playlist_id: i64, item_id: i64) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let rows_affected =
            sqlx::query("DELETE FROM playlist_items WHERE id = ? AND playlist_id = ?")
                .bind(item_id)
                .bind(playlist_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

        if rows_affected == 0 {
            return Ok(false);
        }

        compact_positions(&mut *tx, playlist_id).await?;
        sqlx::query("UPDATE playlists SET updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(playlist_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Set positions `0..n` from `item_ids`, which must be a permutation of the items.
    #[tracing::instrument(skip(self, item_ids), fields(db.table = "playlist_items", db.operation = "update"))]
    pub async fn reorder(&self, playlist_id: i64, item_ids: &[i64]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let current: Vec<i64> =
            sqlx::query_scalar("SELECT id FROM playlist_items WHERE playlist_id = ?")
                .bind(playlist_id)
                .fetch_all(&mut *tx)
                .await?;
        validation::validate_permutation(&current, item_ids)?;

        for (position, id) in item_ids.iter().enumerate() {
            sqlx::query("UPDATE playlist_items SET position = ? WHERE id = ?")
                .bind(position as i64)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("UPDATE playlists SET updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(playlist_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
