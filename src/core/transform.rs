//! Transformadores de `/api/stats` al formato del Vestuario.
//!
//! Todas las funciones son puras: reciben el snapshot tal como lo envía el
//! servidor y devuelven vistas nuevas, sin estado compartido.

use crate::domain::model::{
    LiveMatch, Lobby, LobbyStats, LobbyStatus, Match, MatchEvent, MatchEventKind,
    MatchTelemetry, Region, Score, ServerSummary, Side, SidePair, StatsResponse, WaitingRoom,
};
use serde::{Deserialize, Serialize};

pub const LOBBY_MAX_PLAYERS: u32 = 100;
/// Las salas son 1v1 casi siempre
pub const ROOM_MAX_PLAYERS: u32 = 2;

const DEFAULT_HOME_PLAYER: &str = "Jugador 1";
const DEFAULT_AWAY_PLAYER: &str = "Jugador 2";
/// Tope de goles sintetizados por equipo.
pub const MAX_SYNTHESIZED_GOALS: u32 = 20;

/// Qué hacer con la telemetría que el backend todavía no envía
/// (eventos, posesión, tiros, faltas, córners, fueras de juego).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TelemetryMode {
    /// Estructuras a cero, sin eventos
    #[default]
    Empty,
    /// Derivada de forma determinista del marcador
    Synthesized,
}

/// "2-1" (o "2:1", como lo serializa el servidor) → {home: 2, away: 1}
pub fn parse_score(score: &str) -> Score {
    let mut parts = score.split(['-', ':']);
    Score {
        home: parts.next().map(leading_number).unwrap_or(0),
        away: parts.next().map(leading_number).unwrap_or(0),
    }
}

/// Número directo, o el primer grupo de dígitos de un texto como "45'".
pub fn parse_minute(clock: Option<&serde_json::Value>) -> u32 {
    match clock {
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .and_then(|m| u32::try_from(m).ok())
            .unwrap_or(0),
        Some(serde_json::Value::String(text)) => first_digit_run(text),
        _ => 0,
    }
}

/// Heurística por nombre; no es un dato autoritativo del servidor.
pub fn detect_region(lobby_name: &str) -> Region {
    let name = lobby_name.to_lowercase();
    if name.contains("argentina") || name.contains("arg") {
        Region::Argentina
    } else if name.contains("brasil") || name.contains("bra") {
        Region::Brasil
    } else if name.contains("chile") || name.contains("chi") {
        Region::Chile
    } else {
        Region::General
    }
}

/// Un lobby está "en juego" si tiene jugadores conectados.
pub fn lobby_status(lobby: &LobbyStats) -> LobbyStatus {
    if lobby.player_count > 0 {
        LobbyStatus::InGame
    } else {
        LobbyStatus::Waiting
    }
}

pub fn transform_stats_to_lobbies(stats: &StatsResponse) -> Vec<Lobby> {
    stats
        .lobbies
        .iter()
        .enumerate()
        .map(|(index, lobby)| Lobby {
            id: format!("lobby-{}", index),
            name: lobby.name.clone(),
            region: detect_region(&lobby.name),
            status: lobby_status(lobby),
            players: lobby.player_count,
            max_players: LOBBY_MAX_PLAYERS,
            ping: None,
        })
        .collect()
}

pub fn transform_stats_to_waiting_rooms(stats: &StatsResponse) -> Vec<WaitingRoom> {
    stats
        .lobbies
        .iter()
        .flat_map(|lobby| {
            lobby.rooms.iter().map(move |room| WaitingRoom {
                id: format!("{}-{}", lobby.name, room.id),
                name: room.name.clone(),
                lobby_name: lobby.name.clone(),
                players: room.players.clone(),
                max_players: ROOM_MAX_PLAYERS,
                is_private: room.is_private,
                status: room.status.clone(),
                owner: room.owner.clone(),
            })
        })
        .collect()
}

pub fn transform_stats_to_matches(stats: &StatsResponse, telemetry: TelemetryMode) -> Vec<Match> {
    stats
        .lobbies
        .iter()
        .flat_map(|lobby| {
            lobby
                .matches
                .iter()
                .enumerate()
                .map(move |(index, live)| build_match(&lobby.name, index, live, telemetry))
        })
        .collect()
}

fn build_match(lobby_name: &str, index: usize, live: &LiveMatch, telemetry: TelemetryMode) -> Match {
    let score = parse_score(live.score.as_deref().unwrap_or("0-0"));
    let minute = parse_minute(live.clock.as_ref());

    // homeTeam/awayTeam son listas de nombres de jugadores; el capitán va primero
    let home_player = first_name(live.home_team.as_deref())
        .or(live.home_profile.as_deref())
        .unwrap_or(DEFAULT_HOME_PLAYER)
        .to_string();
    let away_player = first_name(live.away_team.as_deref())
        .or(live.away_profile.as_deref())
        .unwrap_or(DEFAULT_AWAY_PLAYER)
        .to_string();

    // Todavía no hay nombres de equipo: se usa el perfil o el jugador
    let home_team = live.home_profile.clone().unwrap_or_else(|| home_player.clone());
    let away_team = live.away_profile.clone().unwrap_or_else(|| away_player.clone());

    let (events, stats) = match telemetry {
        TelemetryMode::Empty => (Vec::new(), MatchTelemetry::default()),
        TelemetryMode::Synthesized => (
            synthesize_events(score, minute, &home_player, &away_player),
            synthesize_telemetry(score),
        ),
    };

    Match {
        id: format!("{}-{}", lobby_name, index),
        home_team,
        away_team,
        home_player,
        away_player,
        score,
        minute,
        room_name: live.room_name.clone(),
        lobby_name: lobby_name.to_string(),
        events,
        stats,
    }
}

/// Estadísticas derivadas del marcador; el mismo marcador da siempre
/// los mismos valores.
pub fn synthesize_telemetry(score: Score) -> MatchTelemetry {
    let diff = score.differential();
    let home_lead = diff.max(0) as u32;
    let away_lead = (-diff).max(0) as u32;

    let home_possession = (50 + 5 * diff).clamp(30, 70) as u32;

    MatchTelemetry {
        possession: SidePair {
            home: home_possession,
            away: 100 - home_possession,
        },
        shots: SidePair {
            home: score.home.saturating_mul(3).saturating_add(2).saturating_add(home_lead),
            away: score.away.saturating_mul(3).saturating_add(2).saturating_add(away_lead),
        },
        fouls: SidePair {
            home: away_lead.saturating_add(8),
            away: home_lead.saturating_add(8),
        },
        corners: SidePair {
            home: score.home.saturating_add(2),
            away: score.away.saturating_add(2),
        },
        offsides: SidePair {
            home: 1 + score.home / 2,
            away: 1 + score.away / 2,
        },
    }
}

/// Un gol por tanto del marcador (hasta [`MAX_SYNTHESIZED_GOALS`] por
/// equipo), repartidos de forma uniforme hasta el minuto actual.
pub fn synthesize_events(
    score: Score,
    minute: u32,
    home_player: &str,
    away_player: &str,
) -> Vec<MatchEvent> {
    let mut events: Vec<MatchEvent> = Vec::new();
    for (team, goals, player) in [
        (Side::Home, score.home, home_player),
        (Side::Away, score.away, away_player),
    ] {
        let goals = goals.min(MAX_SYNTHESIZED_GOALS);
        for i in 0..goals {
            let at = u64::from(i + 1) * u64::from(minute) / u64::from(goals + 1);
            events.push(MatchEvent {
                minute: at as u32,
                kind: MatchEventKind::Goal,
                team,
                player: player.to_string(),
                description: format!("Gol de {}", player),
            });
        }
    }
    events.sort_by_key(|e| e.minute);
    events
}

pub fn summarize(stats: &StatsResponse) -> ServerSummary {
    ServerSummary {
        players_online: stats.player_count,
        active_lobbies: stats.lobbies.iter().filter(|l| l.player_count > 0).count(),
        matches_in_progress: stats.lobbies.iter().map(|l| l.matches_in_progress).sum(),
    }
}

fn first_name(team: Option<&[String]>) -> Option<&str> {
    team.and_then(|players| players.first())
        .map(String::as_str)
        .filter(|name| !name.is_empty())
}

/// parseInt: dígitos iniciales tras espacios, 0 si no hay
fn leading_number(segment: &str) -> u32 {
    let digits: String = segment
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

fn first_digit_run(text: &str) -> u32 {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}
