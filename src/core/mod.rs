pub mod account;
pub mod announcements;
pub mod feed;
pub mod live_stream;
pub mod registration;
pub mod session;
pub mod transform;

pub use crate::utils::error::Result;
pub use feed::{FeedOptions, FeedState, LiveFeed, LobbyBoard, LobbyFeed, MatchFeed};
pub use live_stream::{LiveStream, StreamEvent, StreamOptions};
pub use session::SessionStore;
