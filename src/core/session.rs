//! Sesión del cliente: token de administrador y token de jugador.
//!
//! Los dos slots son independientes y se guardan en el `KeyValueStore`
//! con las mismas claves que usa el sitio web.

use crate::domain::model::UserData;
use crate::domain::ports::{AuthApi, KeyValueStore};
use crate::utils::error::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::sync::Arc;

pub const AUTH_TOKEN_KEY: &str = "auth_token";
pub const USER_TOKEN_KEY: &str = "user_token";
pub const USER_COUNTRY_KEY: &str = "user_country";

/// `Basic base64(usuario:contraseña)`
pub fn basic_auth(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
}

pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    api: Arc<dyn AuthApi>,
    admin_token: Option<String>,
    user_token: Option<String>,
    user: Option<UserData>,
    user_country: Option<String>,
}

impl SessionStore {
    /// Restaura ambos slots. El token de jugador se valida contra
    /// `/api/my-account`; el de admin se valida con la primera petición.
    pub async fn init(storage: Arc<dyn KeyValueStore>, api: Arc<dyn AuthApi>) -> Result<Self> {
        let admin_token = storage.get_item(AUTH_TOKEN_KEY)?;
        let user_token = storage.get_item(USER_TOKEN_KEY)?;
        let user_country = storage.get_item(USER_COUNTRY_KEY)?;

        let mut session = Self {
            storage,
            api,
            admin_token,
            user_token: None,
            user: None,
            user_country,
        };

        if let Some(token) = user_token {
            match session.api.fetch_account(&token).await {
                Ok(user) => {
                    tracing::debug!("🔑 Restored player session for {}", user.username);
                    session.user_token = Some(token);
                    session.user = Some(user);
                }
                Err(e) => {
                    tracing::debug!("Stored player token rejected: {}", e);
                    session.logout_user()?;
                }
            }
        }

        Ok(session)
    }

    /// Login de administrador. `Ok(false)` si el servidor rechaza las credenciales.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<bool> {
        let token = basic_auth(username, password);
        match self.api.verify_admin(&token).await {
            Ok(()) => {
                self.storage.set_item(AUTH_TOKEN_KEY, &token)?;
                self.admin_token = Some(token);
                tracing::info!("🔐 Admin login ok for {}", username);
                Ok(true)
            }
            Err(e) => {
                tracing::error!("Login error: {}", e);
                Ok(false)
            }
        }
    }

    /// Login de jugador; además consulta el país una sola vez.
    pub async fn login_user(&mut self, username: &str, password: &str) -> Result<bool> {
        let token = basic_auth(username, password);
        let user = match self.api.fetch_account(&token).await {
            Ok(user) => user,
            Err(e) => {
                tracing::error!("User login error: {}", e);
                return Ok(false);
            }
        };

        self.storage.set_item(USER_TOKEN_KEY, &token)?;
        self.user_token = Some(token);
        self.user = Some(user);
        tracing::info!("👤 Player login ok for {}", username);

        match self.api.lookup_country().await {
            Ok(Some(country)) => {
                self.storage.set_item(USER_COUNTRY_KEY, &country)?;
                self.user_country = Some(country);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Could not detect country: {}", e),
        }

        Ok(true)
    }

    pub fn logout_user(&mut self) -> Result<()> {
        self.user_token = None;
        self.user = None;
        self.user_country = None;
        self.storage.remove_item(USER_TOKEN_KEY)?;
        self.storage.remove_item(USER_COUNTRY_KEY)?;
        Ok(())
    }

    /// Cierra ambas sesiones
    pub fn logout(&mut self) -> Result<()> {
        self.admin_token = None;
        self.storage.remove_item(AUTH_TOKEN_KEY)?;
        self.logout_user()
    }

    pub fn is_authenticated(&self) -> bool {
        self.admin_token.is_some()
    }

    pub fn is_user_authenticated(&self) -> bool {
        self.user_token.is_some()
    }

    pub fn admin_token(&self) -> Option<&str> {
        self.admin_token.as_deref()
    }

    pub fn user_token(&self) -> Option<&str> {
        self.user_token.as_deref()
    }

    pub fn user(&self) -> Option<&UserData> {
        self.user.as_ref()
    }

    pub fn user_country(&self) -> Option<&str> {
        self.user_country.as_deref()
    }

    /// Vuelve a pedir la cuenta del jugador (p. ej. tras jugar un partido).
    pub async fn refresh_user(&mut self) -> Result<Option<&UserData>> {
        if let Some(token) = self.user_token.clone() {
            self.user = Some(self.api.fetch_account(&token).await?);
        }
        Ok(self.user.as_ref())
    }

    /// Fin del ciclo de vida; lo persistido queda en el almacenamiento.
    pub fn close(mut self) {
        self.admin_token = None;
        self.user_token = None;
        self.user = None;
        tracing::debug!("Session closed");
    }
}
