pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::ClientConfig;

pub use adapters::{ApiClient, FileStorage, MemoryStorage, WebSocketConnector};
pub use app::{AdminConsole, AdminDashboard};
pub use core::{FeedOptions, FeedState, LiveStream, LobbyFeed, MatchFeed, SessionStore, StreamOptions};
pub use utils::error::{ClientError, Result};
