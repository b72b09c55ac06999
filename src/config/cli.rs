use crate::config::toml_config::ClientConfig;
use crate::domain::model::AnnouncementKind;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_FILE: &str = "castolo.toml";

#[derive(Debug, Clone, Parser)]
#[command(name = "castolo")]
#[command(about = "Cliente de terminal para el servidor de PES6 de la comunidad")]
pub struct CliConfig {
    /// Archivo TOML (por defecto ./castolo.toml si existe)
    #[arg(long, global = true, env = "CASTOLO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Reemplaza server.base_url
    #[arg(long, global = true, env = "CASTOLO_URL")]
    pub base_url: Option<String>,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Resumen del servidor, lobbies, salas y partidos en curso
    Stats,
    /// Vestuario en vivo (WebSocket con polling de respaldo)
    Watch,
    /// Inicia sesión como jugador, o como admin con --admin
    Login(LoginArgs),
    /// Cierra ambas sesiones
    Logout,
    /// Mi cuenta: perfiles y estadísticas
    Account(AccountArgs),
    /// Registra un usuario nuevo
    Register(RegisterArgs),
    /// Anuncios del servidor
    Announcements(AnnouncementsArgs),
    /// Historial de partidos
    History(HistoryArgs),
    /// Panel de administración
    #[command(subcommand)]
    Admin(AdminCommand),
}

#[derive(Debug, Clone, Args)]
pub struct LoginArgs {
    #[arg(short, long)]
    pub username: String,
    #[arg(short, long, env = "CASTOLO_PASSWORD", hide_env_values = true)]
    pub password: String,
    #[arg(long)]
    pub admin: bool,
}

#[derive(Debug, Clone, Args)]
pub struct AccountArgs {
    #[arg(long, help = "Show the full serial")]
    pub show_serial: bool,
}

#[derive(Debug, Clone, Args)]
pub struct RegisterArgs {
    #[arg(long, default_value = "")]
    pub serial: String,
    #[arg(short, long)]
    pub username: String,
    #[arg(short, long)]
    pub password: String,
    #[arg(long)]
    pub confirm_password: String,
}

#[derive(Debug, Clone, Args)]
pub struct AnnouncementsArgs {
    /// Oculta un anuncio para siempre
    #[arg(long)]
    pub dismiss: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct HistoryArgs {
    #[arg(long, default_value = "20")]
    pub limit: u32,
}

#[derive(Debug, Clone, Subcommand)]
pub enum AdminCommand {
    /// Todas las secciones del panel
    Dashboard,
    /// Refresca el panel periódicamente
    Watch,
    Users {
        #[arg(long, default_value = "0")]
        page: u32,
        #[arg(long)]
        search: Option<String>,
    },
    Banned {
        #[arg(long)]
        search: Option<String>,
    },
    BanAdd {
        entry: String,
    },
    BanRemove {
        entry: String,
    },
    /// Guarda maxusers, debug y store settings
    Config {
        #[arg(long)]
        max_users: Option<u32>,
        #[arg(long)]
        debug: Option<bool>,
        #[arg(long)]
        store_settings: Option<bool>,
    },
    Lock {
        username: String,
    },
    Kill {
        username: String,
        /// Confirmación obligatoria
        #[arg(long)]
        yes: bool,
    },
    Announce {
        #[arg(long)]
        title: String,
        #[arg(long)]
        message: String,
        #[arg(long, value_enum, default_value_t = AnnouncementKind::Info)]
        kind: AnnouncementKind,
    },
    Unannounce {
        id: String,
    },
    Lobbies,
    /// Reemplaza la lista de lobbies con un archivo JSON
    SaveLobbies {
        file: PathBuf,
        #[arg(long)]
        yes: bool,
    },
    Greeting {
        #[arg(long)]
        server_name: Option<String>,
        #[arg(long)]
        text: Option<String>,
    },
    Log,
    Ps,
}

impl CliConfig {
    /// TOML (si existe) con los overrides de la línea de comandos encima.
    pub fn resolve(&self) -> Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::from_file(path)?,
            None if std::path::Path::new(DEFAULT_CONFIG_FILE).exists() => {
                ClientConfig::from_file(DEFAULT_CONFIG_FILE)?
            }
            None => ClientConfig::default(),
        };

        if let Some(base_url) = &self.base_url {
            config.server.base_url = base_url.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(base_url) = &self.base_url {
            validation::validate_url("base_url", base_url)?;
        }
        if let Some(path) = &self.config {
            validation::validate_path("config", &path.to_string_lossy())?;
        }
        if let Command::History(args) = &self.command {
            validation::validate_range("limit", args.limit, 1, 500)?;
        }
        Ok(())
    }
}
