use kolla_core::{
    models::{CreateEventRequest, Event},
    validation, Actor, AppError,
};
use kolla_db::{ClipRepository, EventRepository};

use crate::lifecycle::ClipLifecycle;

#[derive(Clone)]
pub struct EventService {
    events: EventRepository,
    clips: ClipRepository,
    lifecycle: ClipLifecycle,
}

impl EventService {
    pub fn new(events: EventRepository, clips: ClipRepository, lifecycle: ClipLifecycle) -> Self {
        Self {
            events,
            clips,
            lifecycle,
        }
    }

    pub async fn create(&self, actor: &Actor, request: CreateEventRequest) -> Result<Event, AppError> {
        actor.require_coach("create events")?;
        let name = validation::validate_name("name", &request.name)?;
        let event = self
            .events
            .create(actor.team_id, &name, request.kind, request.occurs_at)
            .await?;
        tracing::info!(event_id = event.id, team_id = actor.team_id, kind = %event.kind, "Event created");
        Ok(event)
    }

    pub async fn list(&self, actor: &Actor) -> Result<Vec<Event>, AppError> {
        self.events.list(actor.team_id).await
    }

    pub async fn get(&self, actor: &Actor, event_id: i64) -> Result<Event, AppError> {
        self.events
            .get(actor.team_id, event_id)
            .await?
            .ok_or_else(|| AppError::not_found("Event", event_id))
    }

    /// Removes every clip's stored objects, then the event and everything under it.
    #[tracing::instrument(skip(self, actor), fields(team_id = actor.team_id))]
    pub async fn delete(&self, actor: &Actor, event_id: i64) -> Result<(), AppError> {
        actor.require_coach("delete events")?;
        self.get(actor, event_id).await?;

        let clips = self
            .clips
            .list_by_event(actor.team_id, event_id, false)
            .await?;
        self.lifecycle.delete_artifacts_many(&clips).await;

        if !self.events.delete(actor.team_id, event_id).await? {
            return Err(AppError::not_found("Event", event_id));
        }
        tracing::info!(event_id, clips = clips.len(), "Event deleted");
        Ok(())
    }
}
