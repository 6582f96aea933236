pub mod clip;
pub mod comment;
pub mod event;
pub mod links;
pub mod playlist;
pub mod segment;
pub mod team;
pub mod upload;

pub use clip::{
    ApprovalStatus, ApproveClipsRequest, ApproveClipsResponse, Clip, ClipMetadata, ClipResponse,
    ClipStatus, NewClip, ReorderRequest, ReserveIndicesRequest, ReserveIndicesResponse,
    UpdateClipRequest,
};
pub use comment::{build_threads, Comment, CommentNode, CreateCommentRequest};
pub use event::{CreateEventRequest, Event, EventKind};
pub use links::{CreateLinkRequest, ShareLink, ShareTarget, UploadLink};
pub use playlist::{
    AddPlaylistItemRequest, CreatePlaylistRequest, Playlist, PlaylistItem, PlaylistItemRef,
    PlaylistWithItems,
};
pub use segment::{CreateSegmentRequest, Segment, UpdateSegmentRequest};
pub use team::{Actor, Team, TeamRole};
pub use upload::{
    CallbackAck, PresignUploadRequest, PresignUploadResponse, ProcessingCallback,
    PublicPresignRequest,
};
