//! Renderizado de texto para la terminal.
//!
//! Cada función devuelve un `String` listo para imprimir; no escriben
//! directamente en stdout para poder testearlas.

use crate::app::admin::AdminDashboard;
use crate::core::account::{masked_serial, AccountSummary};
use crate::core::feed::LobbyBoard;
use crate::domain::model::{
    Announcement, BannedList, LobbyStatus, Match, MatchEventKind, MatchHistory, MatchWinner,
    ProcessInfo, ServerSummary, Side, UsersPage,
};
use std::fmt::Write;

pub fn render_summary(summary: &ServerSummary) -> String {
    format!(
        "👥 {} jugadores online · 🏟️ {} lobbies activos · ⚽ {} partidos en curso\n",
        summary.players_online, summary.active_lobbies, summary.matches_in_progress
    )
}

pub fn render_lobbies(board: &LobbyBoard) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "LOBBIES");
    if board.lobbies.is_empty() {
        let _ = writeln!(out, "  (sin lobbies)");
    }
    for lobby in &board.lobbies {
        let status = match lobby.status {
            LobbyStatus::InGame => "en juego",
            LobbyStatus::Waiting => "esperando",
        };
        let _ = writeln!(
            out,
            "  [{:<7}] {:<24} {:>3}/{:<3} {}",
            lobby.region.code(),
            lobby.name,
            lobby.players,
            lobby.max_players,
            status
        );
    }

    if !board.waiting_rooms.is_empty() {
        let _ = writeln!(out, "SALAS DE ESPERA");
        for room in &board.waiting_rooms {
            let lock = if room.is_private { "🔒" } else { "  " };
            let _ = writeln!(
                out,
                "  {} {:<20} {:<16} {}/{} {} ({})",
                lock,
                room.name,
                room.lobby_name,
                room.players.len(),
                room.max_players,
                room.players.join(", "),
                room.status
            );
        }
    }
    out
}

pub fn render_matches(matches: &[Match]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "PARTIDOS EN VIVO");
    if matches.is_empty() {
        let _ = writeln!(out, "  (no hay partidos en curso)");
    }
    for m in matches {
        let _ = writeln!(
            out,
            "  {:>3}' {} {} - {} {}  [{} · {}]",
            m.minute, m.home_player, m.score.home, m.score.away, m.away_player, m.lobby_name, m.room_name
        );
        for event in &m.events {
            let icon = match event.kind {
                MatchEventKind::Goal => "⚽",
                MatchEventKind::YellowCard => "🟨",
                MatchEventKind::RedCard => "🟥",
                MatchEventKind::Substitution => "🔁",
            };
            let side = match event.team {
                Side::Home => "L",
                Side::Away => "V",
            };
            let _ = writeln!(out, "        {:>3}' {} {} {}", event.minute, icon, side, event.player);
        }
    }
    out
}

pub fn render_account(summary: &AccountSummary, serial: &str, reveal_serial: bool) -> String {
    let mut out = String::new();
    let badge = if summary.is_admin { " [ADMIN]" } else { "" };
    let _ = writeln!(out, "👤 {}{}", summary.username, badge);
    let _ = writeln!(out, "   Serial: {}", masked_serial(serial, reveal_serial));

    if summary.profiles.is_empty() {
        let _ = writeln!(out, "   Todavía no tienes perfiles creados.");
    }
    for profile in &summary.profiles {
        let s = &profile.stats;
        let _ = writeln!(
            out,
            "\n   {} · rank {} · {} pts · rating {}",
            profile.name, profile.rank, profile.points, profile.rating
        );
        let _ = writeln!(
            out,
            "     PJ {} · G {} · E {} · P {} · GF {} · GC {}",
            s.played, s.won, s.drawn, s.lost, s.goals_for, s.goals_against
        );
        let _ = writeln!(
            out,
            "     Victorias {}% · Goles/partido {} · Horas jugadas {} · Racha {} (mejor {}) · Desconexiones {}",
            profile.win_rate,
            profile.avg_goals_per_match,
            profile.hours_played,
            profile.streaks.current,
            profile.streaks.best,
            profile.disconnects
        );
    }
    out
}

pub fn render_announcements(announcements: &[&Announcement]) -> String {
    let mut out = String::new();
    for a in announcements {
        let _ = writeln!(out, "{} [{}] {}\n   {}", a.kind.icon(), a.id, a.title, a.message);
    }
    if out.is_empty() {
        out.push_str("Sin anuncios.\n");
    }
    out
}

pub fn render_history(history: &MatchHistory) -> String {
    let mut out = String::new();
    if history.matches.is_empty() {
        return "No hay partidos registrados.\n".to_string();
    }
    for record in &history.matches {
        let marker = match record.winner() {
            MatchWinner::Home => "◀",
            MatchWinner::Away => "▶",
            MatchWinner::Draw => "=",
        };
        let _ = writeln!(
            out,
            "  {:<16} {:>16} {} - {} {:<16} {}",
            record.played_on_display().unwrap_or_default(),
            record.home_player,
            record.score_home,
            record.score_away,
            record.away_player,
            marker
        );
    }
    out
}

pub fn render_users(page: &UsersPage, per_page: u32, current: u32) -> String {
    let mut out = String::new();
    for user in &page.users {
        let lock = if user.locked { "🔒" } else { "  " };
        let _ = writeln!(out, "  {} {}", lock, user.username);
    }
    let _ = writeln!(
        out,
        "Página {}/{} · {} usuarios",
        current + 1,
        page.total_pages(per_page).max(1),
        page.total
    );
    out
}

pub fn render_banned(banned: &BannedList, search: Option<&str>) -> String {
    let entries: Vec<&str> = match search {
        Some(term) => banned.filter(term),
        None => banned.banned.iter().map(String::as_str).collect(),
    };
    let mut out = format!("🚫 {} baneados\n", banned.count);
    for entry in entries {
        let _ = writeln!(out, "  {}", entry);
    }
    out
}

pub fn render_process(process: &ProcessInfo) -> String {
    format!(
        "PID {} · up {} (desde {}) · CPU {:.1}% · MEM {:.1}%\n  {}\n",
        process.pid,
        process.uptime.up,
        process.uptime.since,
        process.stats.cpu,
        process.stats.mem,
        process.cmdline
    )
}

pub fn render_dashboard(dashboard: &AdminDashboard) -> String {
    let mut out = String::new();
    let server = &dashboard.home.server;
    let _ = writeln!(
        out,
        "🖥️ {} · v{} · {}",
        dashboard.greeting.server_name, server.version, server.ip
    );
    let _ = writeln!(
        out,
        "   maxusers {} · debug {} · store settings {}",
        server.max_users, server.debug, server.store_settings
    );
    let _ = writeln!(out, "👥 {} usuarios online", dashboard.online.count);
    for user in &dashboard.online.users {
        let _ = writeln!(
            out,
            "   {} {} {}",
            user.username.as_deref().or(user.profile.as_deref()).unwrap_or("?"),
            user.lobby.as_deref().unwrap_or(""),
            user.ip.as_deref().unwrap_or("")
        );
    }
    let _ = writeln!(
        out,
        "🚫 {} baneados · 📢 {} anuncios · 🏟️ {} lobbies",
        dashboard.banned.count,
        dashboard.announcements.len(),
        dashboard.lobbies.len()
    );
    out.push_str(&render_process(&dashboard.process));

    let alerts = dashboard.alerts(10);
    let _ = writeln!(out, "⚠️ {} alertas", alerts.len());
    for line in alerts {
        let _ = writeln!(out, "   {}", line);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::account::ProfileSummary;
    use crate::domain::model::{
        Lobby, Profile, ProfileStats, Region, Score, UserAccount, WaitingRoom,
    };

    #[test]
    fn test_render_lobbies_and_rooms() {
        let board = LobbyBoard {
            lobbies: vec![Lobby {
                id: "lobby-0".to_string(),
                name: "Argentina".to_string(),
                region: Region::Argentina,
                status: LobbyStatus::InGame,
                players: 12,
                max_players: 100,
                ping: None,
            }],
            waiting_rooms: vec![WaitingRoom {
                id: "Argentina-1".to_string(),
                name: "Sala 1".to_string(),
                lobby_name: "Argentina".to_string(),
                players: vec!["juan".to_string()],
                max_players: 2,
                is_private: true,
                status: "waiting".to_string(),
                owner: Some("juan".to_string()),
            }],
        };

        let text = render_lobbies(&board);
        assert!(text.contains("AR"));
        assert!(text.contains("12/100"));
        assert!(text.contains("en juego"));
        assert!(text.contains("🔒 Sala 1"));
    }

    #[test]
    fn test_render_matches() {
        let m = Match {
            id: "Chile-0".to_string(),
            home_team: "juan".to_string(),
            away_team: "pedro".to_string(),
            home_player: "juan".to_string(),
            away_player: "pedro".to_string(),
            score: Score { home: 2, away: 1 },
            minute: 67,
            room_name: "R1".to_string(),
            lobby_name: "Chile".to_string(),
            events: Vec::new(),
            stats: Default::default(),
        };
        let text = render_matches(&[m]);
        assert!(text.contains(" 67' juan 2 - 1 pedro"));
        assert!(render_matches(&[]).contains("no hay partidos"));
    }

    #[test]
    fn test_render_account_masks_serial() {
        let profile = Profile {
            name: "Juan".to_string(),
            stats: ProfileStats {
                played: 4,
                won: 2,
                goals_for: 6,
                ..Default::default()
            },
            ..Default::default()
        };
        let summary = AccountSummary {
            username: "juce".to_string(),
            is_admin: true,
            profiles: vec![ProfileSummary::from_profile(&profile)],
        };

        let text = render_account(&summary, "ABCDEFGHIJKL12345678", false);
        assert!(text.contains("[ADMIN]"));
        assert!(!text.contains("ABCDEFGHIJKL12345678"));
        assert!(text.contains("Victorias 50%"));
        assert!(text.contains("Goles/partido 1.50"));
    }

    #[test]
    fn test_render_users_paging() {
        let page = UsersPage {
            total: 45,
            offset: 20,
            limit: 20,
            users: vec![UserAccount {
                username: "pedro".to_string(),
                locked: true,
                nonce: None,
            }],
        };
        let text = render_users(&page, 20, 1);
        assert!(text.contains("🔒 pedro"));
        assert!(text.contains("Página 2/3"));
    }
}
