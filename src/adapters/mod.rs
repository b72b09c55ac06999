// Adapters layer: implementaciones concretas de los ports (HTTP, WebSocket, almacenamiento local)

pub mod http;
pub mod storage;
pub mod websocket;

pub use http::ApiClient;
pub use storage::{FileStorage, MemoryStorage};
pub use websocket::WebSocketConnector;
