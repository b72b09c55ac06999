use crate::domain::ports::{FrameStream, StreamConnector};
use crate::utils::error::{ClientError, Result};
use async_trait::async_trait;
use futures::{future, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, Message};

/// Conector real de `/api/ws/stats`. Solo entrega frames de texto;
/// ping/pong los responde tungstenite.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    pub fn new() -> Self {
        Self
    }
}

fn frame_text(message: std::result::Result<Message, tungstenite::Error>) -> Option<Result<String>> {
    match message {
        Ok(Message::Text(text)) => Some(Ok(text)),
        Ok(Message::Binary(bytes)) => Some(String::from_utf8(bytes).map_err(|e| {
            ClientError::ConfigError {
                message: format!("binary frame is not UTF-8: {}", e),
            }
        })),
        Ok(_) => None,
        Err(e) => Some(Err(ClientError::from(e))),
    }
}

#[async_trait]
impl StreamConnector for WebSocketConnector {
    async fn connect(&self, url: &str) -> Result<FrameStream> {
        let (socket, response) = connect_async(url).await?;
        tracing::debug!("🔌 WebSocket handshake with {}: {}", url, response.status());

        let (_sink, frames) = socket.split();
        Ok(Box::pin(
            frames.filter_map(|message| future::ready(frame_text(message))),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_and_binary_frames() {
        assert_eq!(
            frame_text(Ok(Message::Text("{}".to_string()))).unwrap().unwrap(),
            "{}"
        );
        assert_eq!(
            frame_text(Ok(Message::Binary(b"{\"type\":\"x\"}".to_vec())))
                .unwrap()
                .unwrap(),
            "{\"type\":\"x\"}"
        );
        assert!(frame_text(Ok(Message::Binary(vec![0xff, 0xfe]))).unwrap().is_err());
    }

    #[test]
    fn test_control_frames_are_skipped() {
        assert!(frame_text(Ok(Message::Ping(Vec::new()))).is_none());
        assert!(frame_text(Ok(Message::Pong(Vec::new()))).is_none());
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let result = WebSocketConnector::new()
            .connect("ws://127.0.0.1:1/api/ws/stats")
            .await;
        assert!(result.is_err());
    }
}
