//! Resumen de la página "Mi cuenta".

use crate::domain::model::{Profile, ProfileStats, Streaks, UserData};

pub const DEFAULT_ADMIN_USERNAMES: [&str; 3] = ["admin", "juce", "reddwarf"];
pub const SERIAL_MASK: &str = "••••-••••-••••-••••";

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSummary {
    pub name: String,
    pub rank: i64,
    pub points: i64,
    pub rating: i64,
    pub disconnects: u32,
    pub stats: ProfileStats,
    pub streaks: Streaks,
    /// Porcentaje redondeado, 0 sin partidos
    pub win_rate: u32,
    /// Con dos decimales: "1.50"
    pub avg_goals_per_match: String,
    pub hours_played: u64,
}

impl ProfileSummary {
    pub fn from_profile(profile: &Profile) -> Self {
        let stats = profile.stats;
        let played = stats.played;

        let (win_rate, avg_goals_per_match) = if played > 0 {
            (
                (stats.won as f64 / played as f64 * 100.0).round() as u32,
                format!("{:.2}", stats.goals_for as f64 / played as f64),
            )
        } else {
            (0, "0.00".to_string())
        };

        Self {
            name: profile.name.clone(),
            rank: profile.rank,
            points: profile.points,
            rating: profile.rating,
            disconnects: profile.disconnects,
            stats,
            streaks: profile.streaks,
            win_rate,
            avg_goals_per_match,
            hours_played: profile.seconds_played / 3600,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccountSummary {
    pub username: String,
    pub is_admin: bool,
    pub profiles: Vec<ProfileSummary>,
}

impl AccountSummary {
    pub fn new<S: AsRef<str>>(user: &UserData, admin_usernames: &[S]) -> Self {
        Self {
            username: user.username.clone(),
            is_admin: is_admin(&user.username, admin_usernames),
            profiles: user.profiles.iter().map(ProfileSummary::from_profile).collect(),
        }
    }
}

pub fn is_admin<S: AsRef<str>>(username: &str, admin_usernames: &[S]) -> bool {
    admin_usernames
        .iter()
        .any(|admin| admin.as_ref().eq_ignore_ascii_case(username))
}

pub fn masked_serial(serial: &str, reveal: bool) -> String {
    if reveal {
        serial.to_string()
    } else {
        SERIAL_MASK.to_string()
    }
}
