use thiserror::Error;

use crate::core::registration::FormError;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("WebSocket error: {0}")]
    WebSocketError(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Unexpected HTTP status {status} from {endpoint}")]
    HttpStatusError { status: u16, endpoint: String },

    #[error("Unauthorized request to {endpoint}")]
    Unauthorized { endpoint: String },

    #[error("Not logged in: {message}")]
    NotAuthenticated { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error(transparent)]
    FormError(#[from] FormError),
}

impl ClientError {
    /// HTTP 401 desde el backend
    pub fn is_unauthorized(&self) -> bool {
        match self {
            ClientError::Unauthorized { .. } => true,
            ClientError::ApiError(e) => e.status().map(|s| s.as_u16() == 401).unwrap_or(false),
            _ => false,
        }
    }

    /// Mensaje para mostrar al usuario final
    pub fn user_friendly_message(&self) -> String {
        match self {
            ClientError::ApiError(e) if e.is_timeout() => {
                "El servidor tardó demasiado en responder.".to_string()
            }
            ClientError::ApiError(e) => format!("Error de conexión: {}", e),
            ClientError::WebSocketError(_) => {
                "Se perdió la conexión en tiempo real con el servidor.".to_string()
            }
            ClientError::IoError(e) => format!("Error al acceder al almacenamiento local: {}", e),
            ClientError::SerializationError(_) => {
                "El servidor respondió con datos inesperados.".to_string()
            }
            ClientError::UrlError(e) => format!("La dirección del servidor es inválida: {}", e),
            ClientError::HttpStatusError { status, .. } => {
                format!("Error del servidor: {}", status)
            }
            ClientError::Unauthorized { .. } => {
                "Sesión expirada o credenciales inválidas.".to_string()
            }
            ClientError::NotAuthenticated { message } => message.clone(),
            ClientError::ConfigError { message } => format!("Configuración inválida: {}", message),
            ClientError::InvalidConfigValueError { field, reason, .. } => {
                format!("Configuración inválida en {}: {}", field, reason)
            }
            ClientError::MissingConfigError { field } => {
                format!("Falta el valor de configuración {}", field)
            }
            ClientError::ConfigValidationError { field, message } => {
                format!("Configuración inválida en {}: {}", field, message)
            }
            ClientError::FormError(e) => e.to_string(),
        }
    }

    /// Código de salida del CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            ClientError::FormError(_) => 2,
            ClientError::Unauthorized { .. } | ClientError::NotAuthenticated { .. } => 3,
            ClientError::ConfigError { .. }
            | ClientError::InvalidConfigValueError { .. }
            | ClientError::MissingConfigError { .. }
            | ClientError::ConfigValidationError { .. } => 4,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
