use kolla_core::{
    models::{build_threads, Comment, CommentNode, CreateCommentRequest},
    validation, Actor, AppError,
};
use kolla_db::{ClipRepository, CommentRepository, SegmentRepository};

#[derive(Clone)]
pub struct CommentService {
    comments: CommentRepository,
    clips: ClipRepository,
    segments: SegmentRepository,
}

impl CommentService {
    pub fn new(
        comments: CommentRepository,
        clips: ClipRepository,
        segments: SegmentRepository,
    ) -> Self {
        Self {
            comments,
            clips,
            segments,
        }
    }

    /// Comments on a pending clip are as hidden as the clip itself.
    async fn require_clip(&self, actor: &Actor, clip_id: i64) -> Result<(), AppError> {
        match self.clips.get(actor.team_id, clip_id).await? {
            Some(clip) if clip.visible_to(actor) => Ok(()),
            _ => Err(AppError::not_found("Clip", clip_id)),
        }
    }

    /// Segment and parent, when given, must hang off the same clip.
    #[tracing::instrument(skip(self, actor, request), fields(team_id = actor.team_id))]
    pub async fn add(
        &self,
        actor: &Actor,
        clip_id: i64,
        request: CreateCommentRequest,
    ) -> Result<Comment, AppError> {
        self.require_clip(actor, clip_id).await?;
        let body = validation::validate_comment_body(&request.body)?;

        if let Some(segment_id) = request.segment_id {
            let segment = self.segments.get(actor.team_id, segment_id).await?;
            if segment.map(|s| s.clip_id) != Some(clip_id) {
                return Err(AppError::InvalidInput(format!(
                    "Segment {} does not belong to clip {}",
                    segment_id, clip_id
                )));
            }
        }
        if let Some(parent_id) = request.parent_id {
            let parent = self.comments.get(actor.team_id, parent_id).await?;
            if parent.map(|c| c.clip_id) != Some(clip_id) {
                return Err(AppError::InvalidInput(format!(
                    "Comment {} is not on clip {}",
                    parent_id, clip_id
                )));
            }
        }

        self.comments
            .create(
                actor.team_id,
                clip_id,
                request.segment_id,
                request.parent_id,
                actor.user_id,
                &body,
            )
            .await
    }

    pub async fn list(&self, actor: &Actor, clip_id: i64) -> Result<Vec<CommentNode>, AppError> {
        self.require_clip(actor, clip_id).await?;
        let comments = self.comments.list_by_clip(actor.team_id, clip_id).await?;
        Ok(build_threads(comments))
    }

    /// Authors delete their own comments; coaches delete any.
    pub async fn delete(&self, actor: &Actor, comment_id: i64) -> Result<(), AppError> {
        let comment = self
            .comments
            .get(actor.team_id, comment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment", comment_id))?;
        if self.require_clip(actor, comment.clip_id).await.is_err() {
            return Err(AppError::not_found("Comment", comment_id));
        }
        if !actor.is_coach() && comment.author_id != actor.user_id {
            return Err(AppError::Forbidden(
                "Only the author or a coach can delete a comment".to_string(),
            ));
        }
        self.comments.delete(actor.team_id, comment_id).await?;
        Ok(())
    }
}
