//! Operator commands that work directly against the database.

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use kolla_api::auth::JwtService;
use kolla_core::{Actor, TeamRole};
use kolla_db::{ClipRepository, ShareLinkRepository, SqlitePool, TeamRepository, UploadLinkRepository};
use serde::Serialize;
use uuid::Uuid;

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MintedToken {
    pub token: String,
    pub team_id: i64,
    pub user_id: Uuid,
    pub role: TeamRole,
    pub expires_at: DateTime<Utc>,
}

/// Sign a bearer token for a member of an existing team.
pub async fn mint_token(
    pool: &SqlitePool,
    jwt_secret: &str,
    team_id: i64,
    user_id: Option<Uuid>,
    role: TeamRole,
    ttl_hours: i64,
) -> anyhow::Result<MintedToken> {
    if ttl_hours < 1 {
        anyhow::bail!("--ttl-hours must be at least 1");
    }
    TeamRepository::new(pool.clone())
        .get(team_id)
        .await?
        .with_context(|| format!("Team {} does not exist", team_id))?;

    let actor = Actor {
        team_id,
        user_id: user_id.unwrap_or_else(Uuid::new_v4),
        role,
    };
    let ttl = Duration::hours(ttl_hours);
    let token = JwtService::new(jwt_secret).issue(&actor, ttl)?;

    Ok(MintedToken {
        token,
        team_id,
        user_id: actor.user_id,
        role,
        expires_at: Utc::now() + ttl,
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrandedClip {
    pub id: i64,
    pub team_id: i64,
    pub event_id: i64,
    pub name: String,
    pub stuck_since: DateTime<Utc>,
}

/// Clips sitting in `processing` with no job id for at least `older_than_minutes`.
pub async fn stranded_clips(
    pool: &SqlitePool,
    older_than_minutes: i64,
) -> anyhow::Result<Vec<StrandedClip>> {
    let cutoff = Utc::now() - Duration::minutes(older_than_minutes.max(0));
    let clips = ClipRepository::new(pool.clone())
        .list_stranded(cutoff)
        .await?;

    Ok(clips
        .into_iter()
        .map(|clip| StrandedClip {
            id: clip.id,
            team_id: clip.team_id,
            event_id: clip.event_id,
            name: clip.name,
            stuck_since: clip.updated_at,
        })
        .collect())
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeReport {
    pub upload_links: u64,
    pub share_links: u64,
}

/// Delete every upload link and share link that expired before now.
pub async fn purge_expired_links(pool: &SqlitePool) -> anyhow::Result<PurgeReport> {
    let now = Utc::now();
    let upload_links = UploadLinkRepository::new(pool.clone())
        .purge_expired(now)
        .await?;
    let share_links = ShareLinkRepository::new(pool.clone())
        .purge_expired(now)
        .await?;
    tracing::info!(upload_links, share_links, "Purged expired links");
    Ok(PurgeReport {
        upload_links,
        share_links,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kolla_core::models::{ApprovalStatus, EventKind, NewClip};
    use kolla_db::{memory_pool, EventRepository};

    const SECRET: &str = "cli-test-secret-at-least-32-characters";

    #[tokio::test]
    async fn minted_tokens_verify_with_the_same_secret() {
        let pool = memory_pool().await.unwrap();
        let team = TeamRepository::new(pool.clone()).create("Kolla FC").await.unwrap();

        let minted = mint_token(&pool, SECRET, team.id, None, TeamRole::Coach, 24)
            .await
            .unwrap();
        let claims = JwtService::new(SECRET).verify(&minted.token).unwrap();
        assert_eq!(claims.team_id, team.id);
        assert_eq!(claims.sub, minted.user_id);
        assert_eq!(claims.role, TeamRole::Coach);

        assert!(mint_token(&pool, SECRET, team.id + 1, None, TeamRole::Player, 1)
            .await
            .is_err());
        assert!(mint_token(&pool, SECRET, team.id, None, TeamRole::Player, 0)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn stranded_report_lists_processing_clips_without_job() {
        let pool = memory_pool().await.unwrap();
        let team = TeamRepository::new(pool.clone()).create("Kolla FC").await.unwrap();
        let event = EventRepository::new(pool.clone())
            .create(team.id, "Cup final", EventKind::Game, None)
            .await
            .unwrap();
        let clips = ClipRepository::new(pool.clone());
        let clip = clips
            .create(&NewClip {
                team_id: team.id,
                event_id: event.id,
                uploader_id: None,
                uploader_name: None,
                name: "stuck".to_string(),
                storage_key: "originals/1/1/stuck.mp4".to_string(),
                content_type: "video/mp4".to_string(),
                file_size: None,
                approval_status: ApprovalStatus::Approved,
                index: 1,
                upload_link_id: None,
            })
            .await
            .unwrap();
        assert!(clips.mark_uploaded(clip.id).await.unwrap());
        assert!(clips.mark_processing(clip.id).await.unwrap());

        let report = stranded_clips(&pool, 0).await.unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].id, clip.id);

        assert!(stranded_clips(&pool, 60).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn purge_on_empty_database_reports_zero() {
        let pool = memory_pool().await.unwrap();
        let report = purge_expired_links(&pool).await.unwrap();
        assert_eq!((report.upload_links, report.share_links), (0, 0));
    }
}
