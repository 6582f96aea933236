pub mod callbacks;
pub mod clips;
pub mod comments;
pub mod events;
pub mod health;
pub mod links;
pub mod playlists;
pub mod public;
pub mod segments;
pub mod uploads;
