//! Canal en tiempo real de `/api/ws/stats` con reconexión acotada.
//!
//! El stream vive en su propia tarea de tokio. El handle [`LiveStream`]
//! recibe los eventos y el estado de conexión; al soltarlo (o con
//! [`LiveStream::shutdown`]) se cancela el temporizador de reconexión y se
//! cierra el socket.

use crate::domain::ports::StreamConnector;
use futures::{FutureExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Notify};
use tokio::task::JoinHandle;

pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_millis(3000);
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamOptions {
    pub url: String,
    pub reconnect_interval: Duration,
    pub max_reconnect_attempts: u32,
}

impl StreamOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
        }
    }

    pub fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    MatchUpdate,
    LobbyUpdate,
    StatsUpdate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamMessage {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Connected,
    Message(StreamMessage),
    Disconnected,
}

pub struct LiveStream {
    events: mpsc::UnboundedReceiver<StreamEvent>,
    connected: watch::Receiver<bool>,
    shutdown: watch::Sender<bool>,
    reconnect: Arc<Notify>,
    task: Option<JoinHandle<()>>,
}

impl LiveStream {
    /// Abre la conexión en segundo plano. Requiere un runtime de tokio.
    pub fn spawn(connector: Arc<dyn StreamConnector>, options: StreamOptions) -> Self {
        let (events_tx, events) = mpsc::unbounded_channel();
        let (connected_tx, connected) = watch::channel(false);
        let (shutdown, shutdown_rx) = watch::channel(false);
        let reconnect = Arc::new(Notify::new());

        let task = tokio::spawn(run(
            connector,
            options,
            events_tx,
            connected_tx,
            shutdown_rx,
            reconnect.clone(),
        ));

        Self {
            events,
            connected,
            shutdown,
            reconnect,
            task: Some(task),
        }
    }

    pub fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    pub fn subscribe_connected(&self) -> watch::Receiver<bool> {
        self.connected.clone()
    }

    /// `None` cuando la tarea del stream ya terminó.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        self.events.recv().await
    }

    /// Intenta conectar ya, sin esperar el intervalo. También rearma el
    /// contador si se había llegado al máximo de intentos. Llamado con el
    /// socket abierto no tiene efecto.
    pub fn reconnect(&self) {
        self.reconnect.notify_one();
    }

    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for LiveStream {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run(
    connector: Arc<dyn StreamConnector>,
    options: StreamOptions,
    events: mpsc::UnboundedSender<StreamEvent>,
    connected: watch::Sender<bool>,
    mut shutdown: watch::Receiver<bool>,
    reconnect: Arc<Notify>,
) {
    let max = options.max_reconnect_attempts;
    let mut attempts: u32 = 0;

    loop {
        let opened = tokio::select! {
            result = connector.connect(&options.url) => result,
            _ = shutdown.changed() => return,
        };

        match opened {
            Ok(mut frames) => {
                tracing::info!("🔌 WebSocket connected: {}", options.url);
                attempts = 0;
                connected.send_replace(true);
                let _ = events.send(StreamEvent::Connected);

                loop {
                    tokio::select! {
                        frame = frames.next() => match frame {
                            Some(Ok(text)) => match serde_json::from_str::<StreamMessage>(&text) {
                                Ok(message) => {
                                    let _ = events.send(StreamEvent::Message(message));
                                }
                                Err(e) => {
                                    tracing::error!("Error parsing WebSocket message: {}", e);
                                }
                            },
                            Some(Err(e)) => {
                                tracing::error!("WebSocket error: {}", e);
                                break;
                            }
                            None => break,
                        },
                        _ = shutdown.changed() => return,
                    }
                }
                // un reconnect() pedido mientras estaba conectado no adelanta el próximo intento
                let _ = reconnect.notified().now_or_never();
            }
            Err(e) => {
                tracing::error!("Error creating WebSocket: {}", e);
            }
        }

        tracing::info!("WebSocket disconnected");
        connected.send_replace(false);
        let _ = events.send(StreamEvent::Disconnected);

        if attempts >= max {
            tracing::warn!("Max reconnect attempts reached ({})", max);
            // sin más intentos hasta un reconnect() manual
            tokio::select! {
                _ = reconnect.notified() => {
                    attempts = 0;
                    continue;
                }
                _ = shutdown.changed() => return,
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(options.reconnect_interval) => {}
            _ = reconnect.notified() => {}
            _ = shutdown.changed() => return,
        }
        attempts += 1;
        tracing::info!("Reconnecting... (attempt {}/{})", attempts, max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::FrameStream;
    use crate::utils::error::{ClientError, Result};
    use async_trait::async_trait;
    use futures::stream;
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Guión de conexiones: cada llamada consume un paso; sin pasos, falla.
    #[derive(Clone, Default)]
    struct ScriptedConnector {
        script: Arc<Mutex<Vec<Step>>>,
        calls: Arc<Mutex<Vec<Instant>>>,
    }

    #[derive(Clone)]
    enum Step {
        /// Conecta, envía los frames y cierra
        Frames(Vec<String>),
        /// Conecta, envía los frames y queda abierto
        FramesThenHold(Vec<String>),
        /// Conecta y cierra pasado el tiempo indicado
        CloseAfter(Duration),
    }

    impl ScriptedConnector {
        fn with_steps(steps: Vec<Step>) -> Self {
            Self {
                script: Arc::new(Mutex::new(steps.into_iter().rev().collect())),
                calls: Arc::default(),
            }
        }

        fn call_times(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StreamConnector for ScriptedConnector {
        async fn connect(&self, _url: &str) -> Result<FrameStream> {
            self.calls.lock().unwrap().push(Instant::now());
            let step = self.script.lock().unwrap().pop();
            match step {
                Some(Step::Frames(frames)) => {
                    Ok(Box::pin(stream::iter(frames.into_iter().map(Ok::<String, ClientError>))))
                }
                Some(Step::FramesThenHold(frames)) => Ok(Box::pin(
                    stream::iter(frames.into_iter().map(Ok::<String, ClientError>))
                        .chain(stream::pending()),
                )),
                Some(Step::CloseAfter(after)) => Ok(Box::pin(
                    stream::once(tokio::time::sleep(after))
                        .filter_map(|_| async { None::<Result<String>> }),
                )),
                None => Err(ClientError::ConfigError {
                    message: "connection refused".to_string(),
                }),
            }
        }
    }

    fn options(max_attempts: u32) -> StreamOptions {
        StreamOptions::new("ws://castolo.test/api/ws/stats")
            .with_reconnect_interval(Duration::from_millis(3000))
            .with_max_reconnect_attempts(max_attempts)
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_attempts_are_bounded() {
        let connector = ScriptedConnector::default();
        let stream = LiveStream::spawn(Arc::new(connector.clone()), options(3));

        tokio::time::sleep(Duration::from_secs(60)).await;

        let calls = connector.call_times();
        // conexión inicial + 3 reintentos, ni uno más
        assert_eq!(calls.len(), 4);
        for pair in calls.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(gap >= Duration::from_millis(3000) && gap < Duration::from_millis(3010));
        }
        assert!(!stream.is_connected());
        stream.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_open_resets_attempts() {
        // abre, cierra, falla, abre, cierra, y a partir de ahí todo falla
        let connector = ScriptedConnector::with_steps(vec![
            Step::Frames(vec![]),
            Step::Frames(vec![]),
        ]);
        let stream = LiveStream::spawn(Arc::new(connector.clone()), options(2));

        tokio::time::sleep(Duration::from_secs(60)).await;

        // 2 aperturas (cada una reinicia el contador) + 2 reintentos fallidos
        assert_eq!(connector.call_times().len(), 4);
        stream.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_frames_are_dropped_without_disconnect() {
        let valid = r#"{"type":"stats_update","data":{"playerCount":3,"lobbies":[]}}"#;
        let connector = ScriptedConnector::with_steps(vec![Step::FramesThenHold(vec![
            "not json".to_string(),
            r#"{"type":"ping"}"#.to_string(),
            valid.to_string(),
        ])]);
        let mut stream = LiveStream::spawn(Arc::new(connector.clone()), options(0));

        assert_eq!(stream.next_event().await, Some(StreamEvent::Connected));
        match stream.next_event().await {
            Some(StreamEvent::Message(message)) => {
                assert_eq!(message.kind, MessageKind::StatsUpdate);
                assert_eq!(message.data["playerCount"], 3);
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(stream.is_connected());
        assert_eq!(connector.call_times().len(), 1);
        stream.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_emits_disconnected_and_flag() {
        let connector = ScriptedConnector::with_steps(vec![Step::Frames(vec![])]);
        let mut stream = LiveStream::spawn(Arc::new(connector), options(0));

        assert_eq!(stream.next_event().await, Some(StreamEvent::Connected));
        assert_eq!(stream.next_event().await, Some(StreamEvent::Disconnected));
        tokio::task::yield_now().await;
        assert!(!stream.is_connected());
        stream.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_reconnect_after_bound() {
        let connector = ScriptedConnector::default();
        let stream = LiveStream::spawn(Arc::new(connector.clone()), options(1));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(connector.call_times().len(), 2);

        stream.reconnect();
        tokio::time::sleep(Duration::from_secs(30)).await;
        // intento inmediato + 1 reintento
        assert_eq!(connector.call_times().len(), 4);
        stream.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_while_connected_keeps_interval() {
        let connector =
            ScriptedConnector::with_steps(vec![Step::CloseAfter(Duration::from_secs(10))]);
        let stream = LiveStream::spawn(Arc::new(connector.clone()), options(5));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(stream.is_connected());
        stream.reconnect();

        tokio::time::sleep(Duration::from_secs(14)).await;
        let calls = connector.call_times();
        assert_eq!(calls.len(), 2);
        // cierre a los 10 s + intervalo de 3 s
        assert!(calls[1] - calls[0] >= Duration::from_secs(13));
        stream.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_pending_reconnect() {
        let connector = ScriptedConnector::default();
        let stream = LiveStream::spawn(Arc::new(connector.clone()), options(10));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(connector.call_times().len(), 1);

        stream.shutdown().await;
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(connector.call_times().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_the_stream_task() {
        let connector = ScriptedConnector::default();
        let stream = LiveStream::spawn(Arc::new(connector.clone()), options(10));
        tokio::time::sleep(Duration::from_millis(100)).await;

        drop(stream);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(connector.call_times().len(), 1);
    }
}
