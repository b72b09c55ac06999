use crate::domain::model::{StatsResponse, UserData};
use crate::utils::error::Result;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// Frames de texto recibidos por el canal en tiempo real
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

#[async_trait]
pub trait StatsSource: Send + Sync {
    async fn fetch_stats(&self) -> Result<StatsResponse>;
}

#[async_trait]
pub trait StreamConnector: Send + Sync {
    /// Abre la conexión; el stream termina cuando el servidor la cierra.
    async fn connect(&self, url: &str) -> Result<FrameStream>;
}

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn verify_admin(&self, token: &str) -> Result<()>;
    async fn fetch_account(&self, token: &str) -> Result<UserData>;
    async fn lookup_country(&self) -> Result<Option<String>>;
}

/// Almacenamiento clave/valor persistente con la semántica de `localStorage`.
pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
}
