//! Alta de jugadores: validación del formulario, hash y envío a `/register`.

use crate::adapters::http::ApiClient;
use crate::utils::error::Result;
use md5::{Digest, Md5};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

pub const SERIAL_LENGTH: usize = 20;
pub const DEFAULT_REGISTER_ENDPOINT: &str = "/register";

static NONCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"name="nonce"[^>]*value="([^"]+)""#).expect("valid nonce regex")
});

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("El serial es inválido. Debe tener 20 caracteres alfanuméricos.")]
    InvalidSerial,

    #[error("El usuario debe tener mínimo 3 caracteres (solo letras y números).")]
    InvalidUsername,

    #[error("La contraseña debe tener mínimo 3 caracteres.")]
    PasswordTooShort,

    #[error("Las contraseñas no coinciden.")]
    PasswordMismatch,
}

/// Quita espacios y guiones y pasa a mayúsculas: "abcd-1234 ..." → "ABCD1234..."
pub fn normalize_serial(serial: &str) -> String {
    serial
        .trim()
        .chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

pub fn is_valid_serial(serial: &str) -> bool {
    serial.len() == SERIAL_LENGTH
        && serial
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// Filtro aplicado mientras se escribe el serial
pub fn sanitize_serial_input(input: &str) -> String {
    input
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .take(SERIAL_LENGTH)
        .collect()
}

/// md5(serial + usuario + "-" + contraseña) en hex minúscula
pub fn registration_hash(serial: &str, username: &str, password: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(serial.as_bytes());
    hasher.update(username.as_bytes());
    hasher.update(b"-");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn extract_nonce(html: &str) -> Option<String> {
    NONCE_PATTERN
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub serial: String,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRegistration {
    pub serial: String,
    pub username: String,
    pub hash: String,
}

impl RegistrationForm {
    /// Si hay un serial oficial configurado, reemplaza al escrito.
    pub fn with_official_serial(mut self, official: Option<&str>) -> Self {
        if let Some(serial) = official.filter(|s| !s.trim().is_empty()) {
            self.serial = serial.to_string();
        }
        self
    }

    pub fn validate(&self) -> std::result::Result<ValidatedRegistration, FormError> {
        let serial = normalize_serial(&self.serial);
        if !is_valid_serial(&serial) {
            return Err(FormError::InvalidSerial);
        }

        let username = self.username.trim();
        if username.chars().count() < 3 || !username.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(FormError::InvalidUsername);
        }

        if self.password.chars().count() < 3 {
            return Err(FormError::PasswordTooShort);
        }

        if self.password != self.confirm_password {
            return Err(FormError::PasswordMismatch);
        }

        Ok(ValidatedRegistration {
            hash: registration_hash(&serial, username, &self.password),
            serial,
            username: username.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Registered,
    AlreadyRegistered,
    Invalid,
    Failed,
}

impl RegistrationOutcome {
    /// Interpreta la página HTML que devuelve el servidor.
    pub fn classify(status: u16, body: &str) -> Self {
        if body.contains("Success")
            || body.contains("Usuario registrado")
            || (status == 200 && !body.contains("409") && !body.contains("400"))
        {
            RegistrationOutcome::Registered
        } else if body.contains("409") || body.contains("ya existe") || body.contains("Conflict") {
            RegistrationOutcome::AlreadyRegistered
        } else if body.contains("400") || body.contains("Invalid") {
            RegistrationOutcome::Invalid
        } else {
            RegistrationOutcome::Failed
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RegistrationOutcome::Registered)
    }

    pub fn message(&self) -> &'static str {
        match self {
            RegistrationOutcome::Registered => "¡Registro exitoso! Tu cuenta ha sido creada correctamente.",
            RegistrationOutcome::AlreadyRegistered => "Este usuario o serial ya está registrado.",
            RegistrationOutcome::Invalid => "Datos inválidos. Por favor verifica los campos.",
            RegistrationOutcome::Failed => "Error al registrar. Por favor intenta de nuevo.",
        }
    }
}

/// GET del formulario para obtener el nonce y POST con los datos.
pub async fn register(
    api: &ApiClient,
    endpoint: &str,
    registration: &ValidatedRegistration,
) -> Result<RegistrationOutcome> {
    let nonce = match api.registration_page(endpoint).await {
        Ok(html) => extract_nonce(&html).unwrap_or_default(),
        Err(e) => {
            // cuenta nueva: nonce vacío
            tracing::debug!("Could not load registration page: {}", e);
            String::new()
        }
    };

    let form = [
        ("nonce", nonce.as_str()),
        ("hash", registration.hash.as_str()),
        ("serial", registration.serial.as_str()),
        ("user", registration.username.as_str()),
        ("format", "html"),
    ];
    let (status, body) = api.submit_registration(endpoint, &form).await?;

    let outcome = RegistrationOutcome::classify(status, &body);
    tracing::info!("📝 Registration for {}: {:?}", registration.username, outcome);
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(serial: &str, user: &str, pass: &str, confirm: &str) -> RegistrationForm {
        RegistrationForm {
            serial: serial.to_string(),
            username: user.to_string(),
            password: pass.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    #[test]
    fn test_normalize_serial() {
        assert_eq!(
            normalize_serial("  abcd-efgh-ijkl-1234-5678 "),
            "ABCDEFGHIJKL12345678"
        );
        assert_eq!(normalize_serial("ab cd\tef"), "ABCDEF");
    }

    #[test]
    fn test_serial_validity() {
        assert!(is_valid_serial("ABCDEFGHIJKL12345678"));
        assert!(!is_valid_serial("ABCDEFGHIJKL1234567"));
        assert!(!is_valid_serial("ABCDEFGHIJKL1234567!"));
        assert!(!is_valid_serial("abcdefghijkl12345678"));
    }

    #[test]
    fn test_sanitize_serial_input() {
        assert_eq!(sanitize_serial_input("ab-cd_12"), "ABCD12");
        assert_eq!(sanitize_serial_input(&"x".repeat(30)).len(), 20);
    }

    #[test]
    fn test_registration_hash() {
        // md5("") sirve de ancla para el formato
        assert_eq!(hex::encode(Md5::digest(b"")), "d41d8cd98f00b204e9800998ecf8427e");

        let hash = registration_hash("ABCDEFGHIJKL12345678", "juan", "pes6");
        assert_eq!(hash.len(), 32);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(
            hash,
            hex::encode(Md5::digest(b"ABCDEFGHIJKL12345678juan-pes6"))
        );
    }

    #[test]
    fn test_validation_order() {
        assert_eq!(
            form("short", "x", "1", "2").validate(),
            Err(FormError::InvalidSerial)
        );
        assert_eq!(
            form("ABCDEFGHIJKL12345678", "ju", "1", "2").validate(),
            Err(FormError::InvalidUsername)
        );
        assert_eq!(
            form("ABCDEFGHIJKL12345678", "juan_p", "123", "123").validate(),
            Err(FormError::InvalidUsername)
        );
        assert_eq!(
            form("ABCDEFGHIJKL12345678", "juan", "12", "13").validate(),
            Err(FormError::PasswordTooShort)
        );
        assert_eq!(
            form("ABCDEFGHIJKL12345678", "juan", "123", "124").validate(),
            Err(FormError::PasswordMismatch)
        );
    }

    #[test]
    fn test_valid_form() {
        let validated = form("abcd-efgh-ijkl-1234-5678", " juan ", "pes6", "pes6")
            .validate()
            .unwrap();
        assert_eq!(validated.serial, "ABCDEFGHIJKL12345678");
        assert_eq!(validated.username, "juan");
        assert_eq!(
            validated.hash,
            registration_hash("ABCDEFGHIJKL12345678", "juan", "pes6")
        );
    }

    #[test]
    fn test_official_serial_overrides_input() {
        let validated = form("garbage", "juan", "pes6", "pes6")
            .with_official_serial(Some("ZZZZYYYYXXXX11112222"))
            .validate()
            .unwrap();
        assert_eq!(validated.serial, "ZZZZYYYYXXXX11112222");

        let untouched = form("garbage", "juan", "pes6", "pes6").with_official_serial(None);
        assert_eq!(untouched.serial, "garbage");
    }

    #[test]
    fn test_extract_nonce() {
        let html = r#"<form><input type="hidden" name="nonce" value="abc123" /></form>"#;
        assert_eq!(extract_nonce(html).as_deref(), Some("abc123"));
        assert_eq!(extract_nonce(r#"<input name="nonce" value="" />"#), None);
        assert_eq!(extract_nonce("<html></html>"), None);
    }

    #[test]
    fn test_outcome_classification() {
        assert_eq!(
            RegistrationOutcome::classify(200, "<p>Usuario registrado</p>"),
            RegistrationOutcome::Registered
        );
        assert_eq!(
            RegistrationOutcome::classify(200, "<html>ok</html>"),
            RegistrationOutcome::Registered
        );
        assert_eq!(
            RegistrationOutcome::classify(200, "Error 409: el usuario ya existe"),
            RegistrationOutcome::AlreadyRegistered
        );
        assert_eq!(
            RegistrationOutcome::classify(201, "Invalid serial"),
            RegistrationOutcome::Invalid
        );
        assert_eq!(
            RegistrationOutcome::classify(202, "hmm"),
            RegistrationOutcome::Failed
        );
        assert_eq!(
            RegistrationOutcome::AlreadyRegistered.message(),
            "Este usuario o serial ya está registrado."
        );
    }
}
