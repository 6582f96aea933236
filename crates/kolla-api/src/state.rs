use std::sync::Arc;

use kolla_core::Config;
use kolla_db::SqlitePool;
use kolla_services::{
    ApprovalService, ClipService, CommentService, EventService, PlaylistService, SegmentService,
    ShareLinkService, UploadLinkService, UploadService, WebhookReceiver,
};

use crate::auth::AuthState;

/// Everything a handler can reach. Services are cheap to clone but are
/// shared behind one `Arc` anyway.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub pool: SqlitePool,
    pub auth: Arc<AuthState>,
    pub clips: ClipService,
    pub uploads: UploadService,
    pub approval: ApprovalService,
    pub webhooks: WebhookReceiver,
    pub events: EventService,
    pub segments: SegmentService,
    pub playlists: PlaylistService,
    pub upload_links: UploadLinkService,
    pub share_links: ShareLinkService,
    pub comments: CommentService,
}
