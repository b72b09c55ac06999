use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Snapshot de /api/stats (formato del wire)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsResponse {
    pub player_count: u32,
    pub lobbies: Vec<LobbyStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LobbyStats {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub lobby_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_matches: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_roster_hash: Option<bool>,
    pub player_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_count: Option<u32>,
    pub matches_in_progress: u32,
    pub users: Vec<LobbyUser>,
    pub matches: Vec<LiveMatch>,
    pub rooms: Vec<Room>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LobbyUser {
    pub profile: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LiveMatch {
    pub room_name: String,
    pub score: Option<String>,
    pub home_profile: Option<String>,
    pub away_profile: Option<String>,
    pub home_team: Option<Vec<String>>,
    pub away_team: Option<Vec<String>>,
    /// PES6 envía un número, otras versiones un texto como "45'"
    pub clock: Option<serde_json::Value>,
    pub state: Option<String>,
    pub match_time: Option<serde_json::Value>,
    pub home_team_id: Option<u32>,
    pub away_team_id: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Room {
    pub id: u32,
    pub name: String,
    pub is_private: bool,
    pub phase: u32,
    pub status: String,
    pub players: Vec<String>,
    pub owner: Option<String>,
}

// ---------------------------------------------------------------------------
// Vestuario view models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "AR")]
    Argentina,
    #[serde(rename = "BR")]
    Brasil,
    #[serde(rename = "CL")]
    Chile,
    General,
}

impl Region {
    pub fn code(&self) -> &'static str {
        match self {
            Region::Argentina => "AR",
            Region::Brasil => "BR",
            Region::Chile => "CL",
            Region::General => "General",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LobbyStatus {
    Waiting,
    InGame,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lobby {
    pub id: String,
    pub name: String,
    pub region: Region,
    pub status: LobbyStatus,
    pub players: u32,
    pub max_players: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ping: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub home: u32,
    pub away: u32,
}

impl Score {
    pub fn differential(&self) -> i64 {
        i64::from(self.home) - i64::from(self.away)
    }
}

/// Par de valores local/visitante (posesión, tiros...)
pub type SidePair = Score;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchEventKind {
    Goal,
    YellowCard,
    RedCard,
    Substitution,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Home,
    Away,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchEvent {
    pub minute: u32,
    #[serde(rename = "type")]
    pub kind: MatchEventKind,
    pub team: Side,
    pub player: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchTelemetry {
    pub possession: SidePair,
    pub shots: SidePair,
    pub fouls: SidePair,
    pub corners: SidePair,
    pub offsides: SidePair,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: String,
    pub home_team: String,
    pub away_team: String,
    pub home_player: String,
    pub away_player: String,
    pub score: Score,
    pub minute: u32,
    pub room_name: String,
    pub lobby_name: String,
    pub events: Vec<MatchEvent>,
    pub stats: MatchTelemetry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitingRoom {
    pub id: String,
    pub name: String,
    pub lobby_name: String,
    pub players: Vec<String>,
    pub max_players: u32,
    pub is_private: bool,
    pub status: String,
    pub owner: Option<String>,
}

/// Contadores de la portada
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ServerSummary {
    pub players_online: u32,
    pub active_lobbies: usize,
    pub matches_in_progress: u32,
}

// ---------------------------------------------------------------------------
// Anuncios
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum AnnouncementKind {
    Warning,
    Urgent,
    #[default]
    #[serde(other)]
    Info,
}

impl AnnouncementKind {
    pub fn icon(&self) -> &'static str {
        match self {
            AnnouncementKind::Urgent => "🚫",
            AnnouncementKind::Warning => "⚠️",
            AnnouncementKind::Info => "✓",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: AnnouncementKind,
    #[serde(default)]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl Announcement {
    pub fn is_active(&self) -> bool {
        self.active.unwrap_or(true)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAnnouncement {
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: AnnouncementKind,
}

// ---------------------------------------------------------------------------
// Cuenta de jugador (/api/my-account)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserData {
    pub username: String,
    pub serial: String,
    pub profiles: Vec<Profile>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub name: String,
    pub id: u64,
    pub rank: i64,
    pub points: i64,
    pub rating: i64,
    pub disconnects: u32,
    pub seconds_played: u64,
    pub stats: ProfileStats,
    pub streaks: Streaks,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileStats {
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub goals_for: u32,
    pub goals_against: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Streaks {
    pub current: u32,
    pub best: u32,
}

// ---------------------------------------------------------------------------
// Historial de partidos
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub id: u64,
    pub home_player: String,
    pub away_player: String,
    pub score_home: u32,
    pub score_away: u32,
    #[serde(default)]
    pub played_on: Option<String>,
    #[serde(default)]
    pub home_team_id: Option<u32>,
    #[serde(default)]
    pub away_team_id: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchWinner {
    Home,
    Away,
    Draw,
}

impl MatchRecord {
    pub fn winner(&self) -> MatchWinner {
        if self.score_home > self.score_away {
            MatchWinner::Home
        } else if self.score_away > self.score_home {
            MatchWinner::Away
        } else {
            MatchWinner::Draw
        }
    }

    /// dd/mm/yyyy HH:MM, como en la web
    pub fn played_on_display(&self) -> Option<String> {
        let raw = self.played_on.as_deref()?;
        chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| chrono::DateTime::parse_from_rfc3339(raw).map(|d| d.naive_local()))
            .ok()
            .map(|d| d.format("%d/%m/%Y %H:%M").to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchHistory {
    pub matches: Vec<MatchRecord>,
    pub total: usize,
}

// ---------------------------------------------------------------------------
// Panel de administración
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminHome {
    pub server: ServerInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerInfo {
    pub version: String,
    pub ip: String,
    pub max_users: u32,
    pub debug: bool,
    pub store_settings: bool,
}

impl ServerInfo {
    pub fn settings(&self) -> ServerSettings {
        ServerSettings {
            max_users: self.max_users,
            debug: self.debug,
            store_settings: self.store_settings,
        }
    }
}

/// Valores editables de la sección de configuración
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerSettings {
    pub max_users: u32,
    pub debug: bool,
    pub store_settings: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserAccount {
    pub username: String,
    pub locked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsersPage {
    pub total: u32,
    pub offset: u32,
    pub limit: u32,
    pub users: Vec<UserAccount>,
}

impl UsersPage {
    pub fn total_pages(&self, per_page: u32) -> u32 {
        if per_page == 0 {
            return 0;
        }
        self.total.div_ceil(per_page)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnlineUser {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lobby: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OnlineUsers {
    pub count: u32,
    pub users: Vec<OnlineUser>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BannedList {
    pub count: u32,
    pub banned: Vec<String>,
}

impl BannedList {
    pub fn filter(&self, term: &str) -> Vec<&str> {
        let term = term.to_lowercase();
        self.banned
            .iter()
            .filter(|entry| entry.to_lowercase().contains(&term))
            .map(String::as_str)
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessInfo {
    pub pid: u32,
    pub uptime: Uptime,
    pub stats: ProcessStats,
    pub cmdline: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Uptime {
    pub since: String,
    pub up: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessStats {
    pub cpu: f64,
    pub mem: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Greeting {
    pub server_name: String,
    pub greeting_text: String,
}

/// Configuración de un lobby tal como la guarda el servidor.
///
/// El backend acepta tanto `"Nombre"` como un objeto
/// `{name, type, showMatches, checkRosterHash}`; la conversión se hace aquí
/// una sola vez y el resto del código trabaja con el enum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "LobbyConfigWire", into = "LobbyConfigWire")]
pub enum LobbyConfig {
    Simple {
        name: String,
    },
    Custom {
        name: String,
        types: Vec<String>,
        show_matches: Option<bool>,
        check_roster_hash: Option<bool>,
    },
}

impl LobbyConfig {
    pub fn name(&self) -> &str {
        match self {
            LobbyConfig::Simple { name } | LobbyConfig::Custom { name, .. } => name,
        }
    }

    pub fn types(&self) -> &[String] {
        match self {
            LobbyConfig::Simple { .. } => &[],
            LobbyConfig::Custom { types, .. } => types,
        }
    }

    pub fn shows_matches(&self) -> bool {
        match self {
            LobbyConfig::Simple { .. } => true,
            LobbyConfig::Custom { show_matches, .. } => show_matches.unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum LobbyConfigWire {
    Name(String),
    Detailed {
        name: String,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        kind: Option<LobbyTypeWire>,
        #[serde(rename = "showMatches", default, skip_serializing_if = "Option::is_none")]
        show_matches: Option<bool>,
        #[serde(rename = "checkRosterHash", default, skip_serializing_if = "Option::is_none")]
        check_roster_hash: Option<bool>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum LobbyTypeWire {
    One(String),
    Many(Vec<String>),
}

impl From<LobbyConfigWire> for LobbyConfig {
    fn from(wire: LobbyConfigWire) -> Self {
        match wire {
            LobbyConfigWire::Name(name) => LobbyConfig::Simple { name },
            LobbyConfigWire::Detailed {
                name,
                kind,
                show_matches,
                check_roster_hash,
            } => LobbyConfig::Custom {
                name,
                types: match kind {
                    Some(LobbyTypeWire::One(t)) => vec![t],
                    Some(LobbyTypeWire::Many(ts)) => ts,
                    None => Vec::new(),
                },
                show_matches,
                check_roster_hash,
            },
        }
    }
}

impl From<LobbyConfig> for LobbyConfigWire {
    fn from(config: LobbyConfig) -> Self {
        match config {
            LobbyConfig::Simple { name } => LobbyConfigWire::Name(name),
            LobbyConfig::Custom {
                name,
                mut types,
                show_matches,
                check_roster_hash,
            } => LobbyConfigWire::Detailed {
                name,
                kind: match types.len() {
                    0 => None,
                    1 => types.pop().map(LobbyTypeWire::One),
                    _ => Some(LobbyTypeWire::Many(types)),
                },
                show_matches,
                check_roster_hash,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_lobby_config_normalizes_both_shapes() {
        let raw = json!([
            "Russia",
            {"name": "Argentina", "type": "open", "showMatches": false},
            {"name": "Copa", "type": ["A", "B"], "checkRosterHash": true}
        ]);

        let lobbies: Vec<LobbyConfig> = serde_json::from_value(raw).unwrap();

        assert_eq!(lobbies[0], LobbyConfig::Simple { name: "Russia".to_string() });
        assert_eq!(lobbies[1].name(), "Argentina");
        assert_eq!(lobbies[1].types(), ["open".to_string()]);
        assert!(!lobbies[1].shows_matches());
        assert_eq!(lobbies[2].types().len(), 2);
        assert!(lobbies[2].shows_matches());
    }

    #[test]
    fn test_lobby_config_serializes_back_to_wire_shape() {
        let lobbies = vec![
            LobbyConfig::Simple { name: "Russia".to_string() },
            LobbyConfig::Custom {
                name: "Argentina".to_string(),
                types: vec!["open".to_string()],
                show_matches: Some(true),
                check_roster_hash: None,
            },
        ];

        let value = serde_json::to_value(&lobbies).unwrap();

        assert_eq!(
            value,
            json!(["Russia", {"name": "Argentina", "type": "open", "showMatches": true}])
        );
    }

    #[test]
    fn test_unknown_announcement_type_falls_back_to_info() {
        let ann: Announcement = serde_json::from_value(json!({
            "id": "1", "title": "t", "message": "m", "type": "celebration"
        }))
        .unwrap();
        assert_eq!(ann.kind, AnnouncementKind::Info);
        assert!(ann.is_active());

        let urgent: AnnouncementKind = serde_json::from_value(json!("urgent")).unwrap();
        assert_eq!(urgent, AnnouncementKind::Urgent);
        assert_eq!(
            serde_json::to_value(AnnouncementKind::Warning).unwrap(),
            json!("warning")
        );
    }

    #[test]
    fn test_match_record_winner_and_date() {
        let record: MatchRecord = serde_json::from_value(json!({
            "id": 7, "homePlayer": "juce", "awayPlayer": "reddwarf",
            "scoreHome": 1, "scoreAway": 3, "playedOn": "2024-05-01T21:15:00.123456"
        }))
        .unwrap();
        assert_eq!(record.winner(), MatchWinner::Away);
        assert_eq!(record.played_on_display().as_deref(), Some("01/05/2024 21:15"));
    }

    #[test]
    fn test_banned_filter_is_case_insensitive() {
        let list = BannedList {
            count: 2,
            banned: vec!["75.120.4".to_string(), "Cheater99".to_string()],
        };
        assert_eq!(list.filter("cheat"), vec!["Cheater99"]);
        assert_eq!(list.filter("").len(), 2);
    }
}
