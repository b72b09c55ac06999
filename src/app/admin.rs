//! Panel de administración. Todas las peticiones llevan el token de admin
//! en `Authorization`; un 401 se propaga como `ClientError::Unauthorized`
//! para que quien llama cierre la sesión.

use crate::adapters::http::ApiClient;
use crate::domain::model::{
    AdminHome, Announcement, BannedList, Greeting, LobbyConfig, NewAnnouncement, OnlineUser,
    OnlineUsers, ProcessInfo, ServerSettings, UsersPage,
};
use crate::utils::error::Result;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_USERS_PER_PAGE: u32 = 20;
pub const DEFAULT_DASHBOARD_INTERVAL: Duration = Duration::from_secs(10);
pub const LOG_TAIL_LINES: usize = 50;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdminDashboard {
    pub home: AdminHome,
    pub online: OnlineUsers,
    pub banned: BannedList,
    /// Más reciente primero
    pub logs: Vec<String>,
    pub process: ProcessInfo,
    pub announcements: Vec<Announcement>,
    pub lobbies: Vec<LobbyConfig>,
    pub greeting: Greeting,
}

impl AdminDashboard {
    pub fn settings(&self) -> ServerSettings {
        self.home.server.settings()
    }

    /// Líneas con ERROR o WARN, como máximo `limit`
    pub fn alerts(&self, limit: usize) -> Vec<&str> {
        self.logs
            .iter()
            .filter(|line| line.contains("ERROR") || line.contains("WARN"))
            .take(limit)
            .map(String::as_str)
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OnlineUsersWire {
    total: u32,
    users: Vec<OnlineUser>,
}

/// `/api/admin/log` puede devolver texto plano o `{logs: [...]}` / `{lines: [...]}`.
pub fn parse_log_payload(body: &str) -> Vec<String> {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => map
            .get("logs")
            .or_else(|| map.get("lines"))
            .and_then(|v| v.as_array())
            .map(|lines| {
                lines
                    .iter()
                    .filter_map(|l| l.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default(),
        Ok(serde_json::Value::String(text)) => tail_reversed(&text),
        _ => tail_reversed(body),
    }
}

fn tail_reversed(text: &str) -> Vec<String> {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(LOG_TAIL_LINES);
    lines[start..].iter().rev().map(|l| l.to_string()).collect()
}

pub struct AdminConsole {
    api: ApiClient,
    token: String,
    users_per_page: u32,
}

impl AdminConsole {
    pub fn new(api: ApiClient, token: impl Into<String>) -> Self {
        Self {
            api,
            token: token.into(),
            users_per_page: DEFAULT_USERS_PER_PAGE,
        }
    }

    pub fn with_users_per_page(mut self, per_page: u32) -> Self {
        self.users_per_page = per_page.max(1);
        self
    }

    pub fn users_per_page(&self) -> u32 {
        self.users_per_page
    }

    fn token(&self) -> Option<&str> {
        Some(self.token.as_str())
    }

    pub async fn home(&self) -> Result<AdminHome> {
        self.api.get_json("/api/admin", self.token()).await
    }

    pub async fn online_users(&self) -> Result<OnlineUsers> {
        let wire: OnlineUsersWire = self.api.get_json("/api/admin/users", self.token()).await?;
        Ok(OnlineUsers {
            count: wire.total,
            users: wire.users,
        })
    }

    pub async fn banned(&self) -> Result<BannedList> {
        self.api.get_json("/api/admin/banned", self.token()).await
    }

    pub async fn logs(&self) -> Result<Vec<String>> {
        let body = self.api.get_text("/api/admin/log", self.token()).await?;
        Ok(parse_log_payload(&body))
    }

    pub async fn process_info(&self) -> Result<ProcessInfo> {
        self.api.get_json("/api/ps", None).await
    }

    pub async fn announcements(&self) -> Result<Vec<Announcement>> {
        self.api
            .get_json("/api/admin/announcements", self.token())
            .await
    }

    pub async fn lobbies(&self) -> Result<Vec<LobbyConfig>> {
        self.api.get_json("/api/admin/lobbies", self.token()).await
    }

    pub async fn greeting(&self) -> Result<Greeting> {
        self.api.get_json("/api/admin/greeting", self.token()).await
    }

    /// Las ocho secciones del panel en paralelo; falla si falla cualquiera.
    pub async fn dashboard(&self) -> Result<AdminDashboard> {
        let (home, online, banned, logs, process, announcements, lobbies, greeting) = tokio::try_join!(
            self.home(),
            self.online_users(),
            self.banned(),
            self.logs(),
            self.process_info(),
            self.announcements(),
            self.lobbies(),
            self.greeting(),
        )?;

        Ok(AdminDashboard {
            home,
            online,
            banned,
            logs,
            process,
            announcements,
            lobbies,
            greeting,
        })
    }

    /// Refresca el panel cada `period` hasta un 401.
    /// Los demás errores se registran y el polling sigue.
    pub async fn poll_dashboard<F>(&self, period: Duration, mut on_update: F) -> Result<()>
    where
        F: FnMut(&AdminDashboard),
    {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match self.dashboard().await {
                Ok(dashboard) => on_update(&dashboard),
                Err(e) if e.is_unauthorized() => {
                    tracing::warn!("🔒 Admin token rejected, stopping dashboard polling");
                    return Err(e);
                }
                Err(e) => tracing::error!("Error fetching data: {}", e),
            }
        }
    }

    /// Página `page` (desde 0) filtrada por nombre sin distinguir mayúsculas.
    pub async fn users(&self, page: u32, filter: Option<&str>) -> Result<UsersPage> {
        let offset = page * self.users_per_page;
        let path = format!(
            "/api/admin/users?offset={}&limit={}",
            offset, self.users_per_page
        );
        let mut result: UsersPage = self.api.get_json(&path, self.token()).await?;

        if let Some(term) = filter.map(str::to_lowercase).filter(|t| !t.is_empty()) {
            result
                .users
                .retain(|u| u.username.to_lowercase().contains(&term));
        }
        Ok(result)
    }

    pub async fn add_ban(&self, entry: &str) -> Result<BannedList> {
        self.api
            .post_form("/api/admin/ban-add", self.token(), &[("entry", entry)])
            .await?;
        tracing::info!("🚫 Ban added: {}", entry);
        self.banned().await
    }

    pub async fn remove_ban(&self, entry: &str) -> Result<BannedList> {
        self.api
            .post_form("/api/admin/ban-remove", self.token(), &[("entry", entry)])
            .await?;
        tracing::info!("Ban removed: {}", entry);
        self.banned().await
    }

    /// Tres formularios, en orden: maxusers, debug, settings.
    pub async fn save_config(&self, settings: ServerSettings) -> Result<()> {
        let max_users = settings.max_users.to_string();
        self.api
            .post_form(
                "/api/admin/maxusers",
                self.token(),
                &[("maxusers", max_users.as_str())],
            )
            .await?;
        self.api
            .post_form(
                "/api/admin/debug",
                self.token(),
                &[("debug", flag(settings.debug))],
            )
            .await?;
        self.api
            .post_form(
                "/api/admin/settings",
                self.token(),
                &[("store", flag(settings.store_settings))],
            )
            .await?;

        tracing::info!("⚙️ Server settings saved: {:?}", settings);
        Ok(())
    }

    pub async fn lock_user(&self, username: &str) -> Result<()> {
        self.api
            .post_form("/api/admin/userlock", self.token(), &[("username", username)])
            .await?;
        tracing::info!("🔒 User locked: {}", username);
        Ok(())
    }

    pub async fn delete_user(&self, username: &str) -> Result<()> {
        self.api
            .post_form("/api/admin/userkill", self.token(), &[("username", username)])
            .await?;
        tracing::warn!("🗑️ User deleted: {}", username);
        Ok(())
    }

    pub async fn create_announcement(&self, announcement: &NewAnnouncement) -> Result<Vec<Announcement>> {
        self.api
            .post_json("/api/admin/announcements", self.token(), announcement)
            .await?;
        self.announcements().await
    }

    pub async fn delete_announcement(&self, id: &str) -> Result<()> {
        self.api
            .delete(&format!("/api/admin/announcements/{}", id), self.token())
            .await
    }

    pub async fn save_lobbies(&self, lobbies: &[LobbyConfig]) -> Result<()> {
        self.api
            .post_json("/api/admin/lobbies", self.token(), lobbies)
            .await?;
        tracing::info!("Lobbies saved ({})", lobbies.len());
        Ok(())
    }

    pub async fn save_greeting(&self, greeting: &Greeting) -> Result<()> {
        self.api
            .post_json("/api/admin/greeting", self.token(), greeting)
            .await?;
        Ok(())
    }
}

fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}
