//! Feeds del Vestuario: snapshot inicial de `/api/stats`, actualizaciones por
//! WebSocket y polling de respaldo mientras el WebSocket no está conectado.
//!
//! El estado se publica en un canal `watch`; el último en escribir gana,
//! venga del stream o del polling.

use crate::core::live_stream::{LiveStream, MessageKind, StreamEvent, StreamMessage, StreamOptions};
use crate::core::transform::{
    transform_stats_to_lobbies, transform_stats_to_matches, transform_stats_to_waiting_rooms,
    TelemetryMode,
};
use crate::domain::model::{Lobby, Match, StatsResponse, WaitingRoom};
use crate::domain::ports::{StatsSource, StreamConnector};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// Convierte un snapshot en la vista que consume la pantalla.
pub trait Projection: Send + Sync + 'static {
    type View: Clone + Default + Send + Sync + 'static;

    fn label(&self) -> &'static str;
    /// Mensaje para el usuario cuando falla la carga
    fn error_message(&self) -> &'static str;
    fn project(&self, stats: &StatsResponse) -> Self::View;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LobbyBoard {
    pub lobbies: Vec<Lobby>,
    pub waiting_rooms: Vec<WaitingRoom>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LobbyProjection;

impl Projection for LobbyProjection {
    type View = LobbyBoard;

    fn label(&self) -> &'static str {
        "lobbies"
    }

    fn error_message(&self) -> &'static str {
        "Error al cargar los lobbies"
    }

    fn project(&self, stats: &StatsResponse) -> LobbyBoard {
        LobbyBoard {
            lobbies: transform_stats_to_lobbies(stats),
            waiting_rooms: transform_stats_to_waiting_rooms(stats),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MatchProjection {
    pub telemetry: TelemetryMode,
}

impl Projection for MatchProjection {
    type View = Vec<Match>;

    fn label(&self) -> &'static str {
        "matches"
    }

    fn error_message(&self) -> &'static str {
        "Error al cargar los partidos"
    }

    fn project(&self, stats: &StatsResponse) -> Vec<Match> {
        transform_stats_to_matches(stats, self.telemetry)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedState<V> {
    pub view: V,
    pub loading: bool,
    pub error: Option<String>,
    pub is_connected: bool,
    pub last_updated: Option<DateTime<Utc>>,
}

impl<V: Default> Default for FeedState<V> {
    fn default() -> Self {
        Self {
            view: V::default(),
            loading: true,
            error: None,
            is_connected: false,
            last_updated: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeedOptions {
    pub poll_interval: Duration,
    pub stream: StreamOptions,
}

impl FeedOptions {
    pub fn new(stream: StreamOptions) -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            stream,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

enum FeedCommand {
    Refetch(oneshot::Sender<()>),
    Shutdown,
}

pub struct LiveFeed<V> {
    state: watch::Receiver<FeedState<V>>,
    commands: mpsc::UnboundedSender<FeedCommand>,
    driver: Option<JoinHandle<()>>,
}

pub type LobbyFeed = LiveFeed<LobbyBoard>;
pub type MatchFeed = LiveFeed<Vec<Match>>;

impl<V: Clone + Default + Send + Sync + 'static> LiveFeed<V> {
    pub fn spawn<P>(
        projection: P,
        source: Arc<dyn StatsSource>,
        connector: Arc<dyn StreamConnector>,
        options: FeedOptions,
    ) -> Self
    where
        P: Projection<View = V>,
    {
        let (state_tx, state) = watch::channel(FeedState::default());
        let (commands, commands_rx) = mpsc::unbounded_channel();
        let stream = LiveStream::spawn(connector, options.stream.clone());

        let driver = tokio::spawn(drive(
            projection,
            source,
            stream,
            commands_rx,
            state_tx,
            options.poll_interval,
        ));

        Self {
            state,
            commands,
            driver: Some(driver),
        }
    }

    pub fn state(&self) -> FeedState<V> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedState<V>> {
        self.state.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.state.borrow().is_connected
    }

    /// Vuelve a pedir el snapshot y espera a que termine.
    pub async fn refetch(&self) {
        let (ack, done) = oneshot::channel();
        if self.commands.send(FeedCommand::Refetch(ack)).is_ok() {
            let _ = done.await;
        }
    }

    pub async fn shutdown(mut self) {
        let _ = self.commands.send(FeedCommand::Shutdown);
        if let Some(driver) = self.driver.take() {
            let _ = driver.await;
        }
    }
}

impl LobbyFeed {
    pub fn lobbies(
        source: Arc<dyn StatsSource>,
        connector: Arc<dyn StreamConnector>,
        options: FeedOptions,
    ) -> Self {
        Self::spawn(LobbyProjection, source, connector, options)
    }
}

impl MatchFeed {
    pub fn matches(
        source: Arc<dyn StatsSource>,
        connector: Arc<dyn StreamConnector>,
        options: FeedOptions,
        telemetry: TelemetryMode,
    ) -> Self {
        Self::spawn(MatchProjection { telemetry }, source, connector, options)
    }
}

impl<V> Drop for LiveFeed<V> {
    fn drop(&mut self) {
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
    }
}

async fn drive<P: Projection>(
    projection: P,
    source: Arc<dyn StatsSource>,
    mut stream: LiveStream,
    mut commands: mpsc::UnboundedReceiver<FeedCommand>,
    state: watch::Sender<FeedState<P::View>>,
    poll_interval: Duration,
) {
    // fetch inicial
    refresh(&projection, source.as_ref(), &state).await;

    let mut poller = Some(fallback_poller(poll_interval));
    let mut stream_open = true;

    loop {
        tokio::select! {
            event = stream.next_event(), if stream_open => match event {
                Some(StreamEvent::Connected) => {
                    tracing::info!("WebSocket connected for {}", projection.label());
                    poller = None;
                    state.send_modify(|s| s.is_connected = true);
                }
                Some(StreamEvent::Disconnected) => {
                    tracing::info!("WebSocket disconnected for {}", projection.label());
                    if poller.is_none() {
                        poller = Some(fallback_poller(poll_interval));
                    }
                    state.send_modify(|s| s.is_connected = false);
                }
                Some(StreamEvent::Message(message)) => apply_message(&projection, message, &state),
                None => stream_open = false,
            },
            _ = tick(&mut poller) => {
                tracing::debug!("Fallback polling for {}", projection.label());
                refresh(&projection, source.as_ref(), &state).await;
            }
            command = commands.recv() => match command {
                Some(FeedCommand::Refetch(ack)) => {
                    refresh(&projection, source.as_ref(), &state).await;
                    let _ = ack.send(());
                }
                Some(FeedCommand::Shutdown) | None => break,
            },
        }
    }

    stream.shutdown().await;
    tracing::debug!("Feed for {} stopped", projection.label());
}

/// El primer tick llega un intervalo completo después de crearlo.
fn fallback_poller(period: Duration) -> Interval {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn tick(poller: &mut Option<Interval>) {
    match poller {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

async fn refresh<P: Projection>(
    projection: &P,
    source: &dyn StatsSource,
    state: &watch::Sender<FeedState<P::View>>,
) {
    state.send_modify(|s| {
        s.loading = true;
        s.error = None;
    });

    match source.fetch_stats().await {
        Ok(stats) => {
            let view = projection.project(&stats);
            state.send_modify(|s| {
                s.view = view;
                s.loading = false;
                s.last_updated = Some(Utc::now());
            });
        }
        Err(e) => {
            tracing::error!("Error fetching {}: {}", projection.label(), e);
            state.send_modify(|s| {
                s.error = Some(projection.error_message().to_string());
                s.loading = false;
            });
        }
    }
}

fn apply_message<P: Projection>(
    projection: &P,
    message: StreamMessage,
    state: &watch::Sender<FeedState<P::View>>,
) {
    if message.kind != MessageKind::StatsUpdate || message.data.is_null() {
        tracing::debug!("Ignoring {:?} message for {}", message.kind, projection.label());
        return;
    }

    match serde_json::from_value::<StatsResponse>(message.data) {
        Ok(stats) => {
            let view = projection.project(&stats);
            state.send_modify(|s| {
                s.view = view;
                s.last_updated = Some(Utc::now());
            });
        }
        Err(e) => {
            tracing::warn!("Dropping stats_update for {}: {}", projection.label(), e);
        }
    }
}
