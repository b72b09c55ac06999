use castolo_client::adapters::{ApiClient, FileStorage, WebSocketConnector};
use castolo_client::app::admin::AdminConsole;
use castolo_client::app::vestuario;
use castolo_client::config::{AdminCommand, CliConfig, ClientConfig, Command};
use castolo_client::core::account::AccountSummary;
use castolo_client::core::announcements::AnnouncementBoard;
use castolo_client::core::feed::{LobbyFeed, MatchFeed};
use castolo_client::core::registration::{self, RegistrationForm};
use castolo_client::core::session::SessionStore;
use castolo_client::core::transform;
use castolo_client::domain::model::{LobbyConfig, NewAnnouncement};
use castolo_client::utils::error::{ClientError, Result};
use castolo_client::utils::{logger, validation::Validate};
use clap::Parser;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // Inicializa el logger
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::debug!("CLI config: {:?}", cli);

    // Valida la configuración
    let config = match cli.validate().and_then(|_| cli.resolve()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(e.exit_code());
        }
    };

    if let Err(e) = run(&cli, &config).await {
        tracing::error!("❌ {} failed: {}", command_name(&cli.command), e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code());
    }
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Stats => "stats",
        Command::Watch => "watch",
        Command::Login(_) => "login",
        Command::Logout => "logout",
        Command::Account(_) => "account",
        Command::Register(_) => "register",
        Command::Announcements(_) => "announcements",
        Command::History(_) => "history",
        Command::Admin(_) => "admin",
    }
}

fn api_client(config: &ClientConfig) -> Result<ApiClient> {
    let mut api = ApiClient::new(&config.server.base_url)?
        .with_geo_lookup_url(config.geo.lookup_url.clone());
    if let Some(timeout) = config.timeout() {
        api = api.with_timeout(timeout);
    }
    Ok(api)
}

async fn open_session(config: &ClientConfig, api: &ApiClient) -> Result<SessionStore> {
    let storage = Arc::new(FileStorage::open(&config.storage.path)?);
    SessionStore::init(storage, Arc::new(api.clone())).await
}

async fn run(cli: &CliConfig, config: &ClientConfig) -> Result<()> {
    let api = api_client(config)?;
    tracing::info!("Using server {}", api.base_url());

    match &cli.command {
        Command::Stats => {
            let stats = api.stats().await?;
            let board = castolo_client::core::feed::LobbyBoard {
                lobbies: transform::transform_stats_to_lobbies(&stats),
                waiting_rooms: transform::transform_stats_to_waiting_rooms(&stats),
            };
            let matches = transform::transform_stats_to_matches(&stats, config.view.telemetry);

            print!("{}", vestuario::render_summary(&transform::summarize(&stats)));
            print!("{}", vestuario::render_lobbies(&board));
            print!("{}", vestuario::render_matches(&matches));
        }
        Command::Watch => watch(config, &api).await?,
        Command::Login(args) => {
            let mut session = open_session(config, &api).await?;
            let ok = if args.admin {
                session.login(&args.username, &args.password).await?
            } else {
                session.login_user(&args.username, &args.password).await?
            };

            if !ok {
                return Err(ClientError::NotAuthenticated {
                    message: "Usuario o contraseña incorrectos".to_string(),
                });
            }
            println!("✅ Sesión iniciada como {}", args.username);
            session.close();
        }
        Command::Logout => {
            let mut session = open_session(config, &api).await?;
            session.logout()?;
            println!("👋 Sesión cerrada");
        }
        Command::Account(args) => {
            let session = open_session(config, &api).await?;
            let user = session.user().ok_or_else(|| ClientError::NotAuthenticated {
                message: "Inicia sesión con `castolo login` para ver tu cuenta.".to_string(),
            })?;
            let summary = AccountSummary::new(user, &config.admin.admin_usernames);
            print!(
                "{}",
                vestuario::render_account(&summary, &user.serial, args.show_serial)
            );
            if let Some(country) = session.user_country() {
                println!("   País: {}", country);
            }
        }
        Command::Register(args) => {
            let form = RegistrationForm {
                serial: args.serial.clone(),
                username: args.username.clone(),
                password: args.password.clone(),
                confirm_password: args.confirm_password.clone(),
            }
            .with_official_serial(config.registration.official_serial.as_deref());

            let validated = form.validate()?;
            let outcome =
                registration::register(&api, &config.registration.endpoint, &validated).await?;

            if outcome.is_success() {
                println!("✅ {}", outcome.message());
            } else {
                eprintln!("❌ {}", outcome.message());
                std::process::exit(2);
            }
        }
        Command::Announcements(args) => {
            let storage = Arc::new(FileStorage::open(&config.storage.path)?);
            let mut board = AnnouncementBoard::load(storage)?;
            board.refresh(&api).await;

            if let Some(id) = &args.dismiss {
                board.dismiss(id)?;
                println!("Anuncio {} ocultado", id);
            }
            print!("{}", vestuario::render_announcements(&board.visible()));
        }
        Command::History(args) => {
            let history = api.match_history(args.limit).await?;
            print!("{}", vestuario::render_history(&history));
        }
        Command::Admin(command) => {
            let mut session = open_session(config, &api).await?;
            let token = session
                .admin_token()
                .ok_or_else(|| ClientError::NotAuthenticated {
                    message: "Inicia sesión con `castolo login --admin` primero.".to_string(),
                })?
                .to_string();
            let console = AdminConsole::new(api.clone(), token)
                .with_users_per_page(config.admin.users_per_page);

            let result = admin(command, &console, config).await;
            if let Err(e) = &result {
                if e.is_unauthorized() {
                    tracing::warn!("🔒 Admin session rejected by server, logging out");
                    session.logout()?;
                }
            }
            result?;
        }
    }

    Ok(())
}

async fn watch(config: &ClientConfig, api: &ApiClient) -> Result<()> {
    let url = api.stats_stream_url()?;
    let source = Arc::new(api.clone());
    let connector = Arc::new(WebSocketConnector::new());

    let lobbies = LobbyFeed::lobbies(source.clone(), connector.clone(), config.feed_options(&url));
    let matches = MatchFeed::matches(
        source,
        connector,
        config.feed_options(&url),
        config.view.telemetry,
    );
    let mut lobby_rx = lobbies.subscribe();
    let mut match_rx = matches.subscribe();

    tracing::info!("📺 Watching {}", url);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = lobby_rx.changed() => if changed.is_err() { break },
            changed = match_rx.changed() => if changed.is_err() { break },
        }

        let lobby_state = lobby_rx.borrow_and_update().clone();
        let match_state = match_rx.borrow_and_update().clone();

        let status = if lobby_state.is_connected { "🟢 en vivo" } else { "🟡 polling" };
        println!("\n── {} · {} ──", status, chrono::Local::now().format("%H:%M:%S"));
        if let Some(error) = lobby_state.error.as_ref().or(match_state.error.as_ref()) {
            println!("⚠️ {}", error);
        }
        print!("{}", vestuario::render_lobbies(&lobby_state.view));
        print!("{}", vestuario::render_matches(&match_state.view));
    }

    lobbies.shutdown().await;
    matches.shutdown().await;
    Ok(())
}

async fn admin(command: &AdminCommand, console: &AdminConsole, config: &ClientConfig) -> Result<()> {
    match command {
        AdminCommand::Dashboard => {
            let dashboard = console.dashboard().await?;
            print!("{}", vestuario::render_dashboard(&dashboard));
        }
        AdminCommand::Watch => {
            let polling = console.poll_dashboard(config.admin_poll_interval(), |dashboard| {
                println!("\n── {} ──", chrono::Local::now().format("%H:%M:%S"));
                print!("{}", vestuario::render_dashboard(dashboard));
            });
            tokio::select! {
                result = polling => result?,
                _ = tokio::signal::ctrl_c() => {}
            }
        }
        AdminCommand::Users { page, search } => {
            let users = console.users(*page, search.as_deref()).await?;
            print!(
                "{}",
                vestuario::render_users(&users, console.users_per_page(), *page)
            );
        }
        AdminCommand::Banned { search } => {
            let banned = console.banned().await?;
            print!("{}", vestuario::render_banned(&banned, search.as_deref()));
        }
        AdminCommand::BanAdd { entry } => {
            let banned = console.add_ban(entry).await?;
            print!("{}", vestuario::render_banned(&banned, None));
        }
        AdminCommand::BanRemove { entry } => {
            let banned = console.remove_ban(entry).await?;
            print!("{}", vestuario::render_banned(&banned, None));
        }
        AdminCommand::Config {
            max_users,
            debug,
            store_settings,
        } => {
            let mut settings = console.home().await?.server.settings();
            if let Some(max_users) = max_users {
                settings.max_users = *max_users;
            }
            if let Some(debug) = debug {
                settings.debug = *debug;
            }
            if let Some(store) = store_settings {
                settings.store_settings = *store;
            }
            console.save_config(settings).await?;
            println!("✅ Configuración guardada exitosamente");
        }
        AdminCommand::Lock { username } => {
            console.lock_user(username).await?;
            println!("✅ Usuario bloqueado exitosamente");
        }
        AdminCommand::Kill { username, yes } => {
            if !yes {
                return Err(ClientError::ConfigValidationError {
                    field: "yes".to_string(),
                    message: format!("eliminar a {} requiere --yes", username),
                });
            }
            console.delete_user(username).await?;
            println!("Usuario eliminado");
        }
        AdminCommand::Announce {
            title,
            message,
            kind,
        } => {
            let list = console
                .create_announcement(&NewAnnouncement {
                    title: title.clone(),
                    message: message.clone(),
                    kind: *kind,
                })
                .await?;
            let visible: Vec<_> = list.iter().collect();
            print!("{}", vestuario::render_announcements(&visible));
        }
        AdminCommand::Unannounce { id } => {
            console.delete_announcement(id).await?;
            println!("Anuncio {} eliminado", id);
        }
        AdminCommand::Lobbies => {
            let lobbies = console.lobbies().await?;
            println!("{}", serde_json::to_string_pretty(&lobbies)?);
        }
        AdminCommand::SaveLobbies { file, yes } => {
            let content = std::fs::read_to_string(file)?;
            let lobbies: Vec<LobbyConfig> = serde_json::from_str(&content)?;
            if !yes {
                return Err(ClientError::ConfigValidationError {
                    field: "yes".to_string(),
                    message: format!(
                        "reemplazar {} lobbies requiere --yes (requiere reiniciar el servidor)",
                        lobbies.len()
                    ),
                });
            }
            console.save_lobbies(&lobbies).await?;
            println!("✅ {} lobbies guardados. Reinicia el servidor para aplicarlos.", lobbies.len());
        }
        AdminCommand::Greeting { server_name, text } => {
            let mut greeting = console.greeting().await?;
            if server_name.is_none() && text.is_none() {
                println!("{}\n{}", greeting.server_name, greeting.greeting_text);
                return Ok(());
            }
            if let Some(name) = server_name {
                greeting.server_name = name.clone();
            }
            if let Some(text) = text {
                greeting.greeting_text = text.clone();
            }
            console.save_greeting(&greeting).await?;
            println!("✅ Saludo de {} guardado", greeting.server_name);
        }
        AdminCommand::Log => {
            for line in console.logs().await? {
                println!("{}", line);
            }
        }
        AdminCommand::Ps => {
            print!("{}", vestuario::render_process(&console.process_info().await?));
        }
    }
    Ok(())
}
