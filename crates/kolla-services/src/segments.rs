use kolla_core::{
    models::{Clip, CreateSegmentRequest, Segment, UpdateSegmentRequest},
    validation, Actor, AppError,
};
use kolla_db::{ClipRepository, SegmentFields, SegmentRepository};

#[derive(Clone)]
pub struct SegmentService {
    segments: SegmentRepository,
    clips: ClipRepository,
}

impl SegmentService {
    pub fn new(segments: SegmentRepository, clips: ClipRepository) -> Self {
        Self { segments, clips }
    }

    /// The parent clip. Foreign clips, and pending ones for players, are not found.
    async fn visible_clip(&self, actor: &Actor, clip_id: i64) -> Result<Clip, AppError> {
        self.clips
            .get(actor.team_id, clip_id)
            .await?
            .filter(|clip| clip.visible_to(actor))
            .ok_or_else(|| AppError::not_found("Clip", clip_id))
    }

    #[tracing::instrument(skip(self, actor, request), fields(team_id = actor.team_id))]
    pub async fn create(
        &self,
        actor: &Actor,
        clip_id: i64,
        request: CreateSegmentRequest,
    ) -> Result<Segment, AppError> {
        let duration = self.visible_clip(actor, clip_id).await?.duration_s;
        let fields = SegmentFields {
            name: validation::validate_name("name", &request.name)?,
            start_s: request.start_s,
            end_s: request.end_s,
            tags: validation::normalize_tags(&request.tags)?,
            player_ids: validation::normalize_tags(&request.player_ids)?,
        };
        validation::validate_segment_range(fields.start_s, fields.end_s, duration)?;

        self.segments.create(actor.team_id, clip_id, &fields).await
    }

    pub async fn list(&self, actor: &Actor, clip_id: i64) -> Result<Vec<Segment>, AppError> {
        self.visible_clip(actor, clip_id).await?;
        self.segments.list_by_clip(actor.team_id, clip_id).await
    }

    pub async fn get(&self, actor: &Actor, segment_id: i64) -> Result<Segment, AppError> {
        Ok(self.get_with_clip(actor, segment_id).await?.0)
    }

    async fn get_with_clip(
        &self,
        actor: &Actor,
        segment_id: i64,
    ) -> Result<(Segment, Clip), AppError> {
        let segment = self
            .segments
            .get(actor.team_id, segment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Segment", segment_id))?;
        match self.visible_clip(actor, segment.clip_id).await {
            Ok(clip) => Ok((segment, clip)),
            Err(AppError::NotFound(_)) => Err(AppError::not_found("Segment", segment_id)),
            Err(e) => Err(e),
        }
    }

    /// Partial update. The merged range is validated as a whole.
    pub async fn update(
        &self,
        actor: &Actor,
        segment_id: i64,
        request: UpdateSegmentRequest,
    ) -> Result<Segment, AppError> {
        let (current, clip) = self.get_with_clip(actor, segment_id).await?;
        let duration = clip.duration_s;

        let fields = SegmentFields {
            name: match request.name.as_deref() {
                Some(name) => validation::validate_name("name", name)?,
                None => current.name,
            },
            start_s: request.start_s.unwrap_or(current.start_s),
            end_s: request.end_s.unwrap_or(current.end_s),
            tags: match request.tags.as_deref() {
                Some(tags) => validation::normalize_tags(tags)?,
                None => current.tags,
            },
            player_ids: match request.player_ids.as_deref() {
                Some(ids) => validation::normalize_tags(ids)?,
                None => current.player_ids,
            },
        };
        validation::validate_segment_range(fields.start_s, fields.end_s, duration)?;

        self.segments
            .update(actor.team_id, segment_id, &fields)
            .await?
            .ok_or_else(|| AppError::not_found("Segment", segment_id))
    }

    pub async fn delete(&self, actor: &Actor, segment_id: i64) -> Result<(), AppError> {
        self.get_with_clip(actor, segment_id).await?;
        if !self.segments.delete(actor.team_id, segment_id).await? {
            return Err(AppError::not_found("Segment", segment_id));
        }
        Ok(())
    }

    pub async fn reorder(&self, actor: &Actor, clip_id: i64, ids: &[i64]) -> Result<(), AppError> {
        actor.require_coach("reorder segments")?;
        self.visible_clip(actor, clip_id).await?;
        self.segments.reorder(actor.team_id, clip_id, ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;
    use kolla_core::models::ClipMetadata;
    use kolla_core::TeamRole;
    use uuid::Uuid;

    fn request(name: &str, start_s: f64, end_s: f64) -> CreateSegmentRequest {
        CreateSegmentRequest {
            name: name.to_string(),
            start_s,
            end_s,
            tags: vec![],
            player_ids: vec![],
        }
    }

    async fn setup() -> (Fixture, SegmentService, Actor, i64) {
        let fixture = Fixture::new().await.unwrap();
        let clips = ClipRepository::new(fixture.pool.clone());
        let clip_id = fixture.clip("match").await.unwrap();
        clips
            .update_metadata(
                clip_id,
                ClipMetadata {
                    duration_s: Some(60.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let service = SegmentService::new(SegmentRepository::new(fixture.pool.clone()), clips);
        let actor = Actor {
            team_id: fixture.team_id,
            user_id: Uuid::new_v4(),
            role: TeamRole::Coach,
        };
        (fixture, service, actor, clip_id)
    }

    #[tokio::test]
    async fn ranges_are_checked_against_duration() {
        let (_fixture, service, actor, clip_id) = setup().await;

        for (start, end) in [(5.0, 5.0), (10.0, 4.0), (-1.0, 3.0), (50.0, 61.0)] {
            let err = service
                .create(&actor, clip_id, request("bad", start, end))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::InvalidInput(_)), "{start}..{end}");
        }
        assert!(service.list(&actor, clip_id).await.unwrap().is_empty());

        let segment = service
            .create(&actor, clip_id, request("Press", 12.0, 60.0))
            .await
            .unwrap();
        assert_eq!(segment.index, 1);
    }

    #[tokio::test]
    async fn update_merges_then_validates() {
        let (_fixture, service, actor, clip_id) = setup().await;
        let segment = service
            .create(&actor, clip_id, request("Press", 10.0, 20.0))
            .await
            .unwrap();

        let err = service
            .update(
                &actor,
                segment.id,
                UpdateSegmentRequest {
                    start_s: Some(25.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let updated = service
            .update(
                &actor,
                segment.id,
                UpdateSegmentRequest {
                    end_s: Some(30.0),
                    player_ids: Some(vec!["p9".to_string()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!((updated.start_s, updated.end_s), (10.0, 30.0));
        assert_eq!(updated.name, "Press");
        assert_eq!(updated.player_ids, vec!["p9"]);
    }

    #[tokio::test]
    async fn reorder_is_coach_only() {
        let (_fixture, service, actor, clip_id) = setup().await;
        let a = service.create(&actor, clip_id, request("a", 0.0, 1.0)).await.unwrap();
        let b = service.create(&actor, clip_id, request("b", 1.0, 2.0)).await.unwrap();

        let player = Actor {
            role: TeamRole::Player,
            ..actor
        };
        assert!(matches!(
            service.reorder(&player, clip_id, &[b.id, a.id]).await.unwrap_err(),
            AppError::Forbidden(_)
        ));

        service.reorder(&actor, clip_id, &[b.id, a.id]).await.unwrap();
        let listed = service.list(&actor, clip_id).await.unwrap();
        assert_eq!(listed[0].id, b.id);
        assert_eq!(listed[0].index, 1);

        service.delete(&actor, b.id).await.unwrap();
        assert!(service.delete(&actor, b.id).await.is_err());
    }

    #[tokio::test]
    async fn segments_of_pending_clips_are_hidden_from_players() {
        let (fixture, service, coach, _) = setup().await;
        let pending = fixture.pending_clip("from-parent").await.unwrap();
        let segment = service
            .create(&coach, pending, request("Run", 0.0, 4.0))
            .await
            .unwrap();

        let player = Actor {
            role: TeamRole::Player,
            ..coach
        };
        for err in [
            service.list(&player, pending).await.unwrap_err(),
            service.get(&player, segment.id).await.unwrap_err(),
            service.delete(&player, segment.id).await.unwrap_err(),
            service
                .create(&player, pending, request("Mine", 0.0, 1.0))
                .await
                .unwrap_err(),
        ] {
            assert!(matches!(err, AppError::NotFound(_)), "{err:?}");
        }

        assert_eq!(service.list(&coach, pending).await.unwrap().len(), 1);
    }
}
