//! LMS service binary
//!
//! ```sh
//! # Run with default config (~/.config/lms-service/config.toml)
//! lms-service
//!
//! # Custom config path and port
//! lms-service --config /etc/lms-service/config.toml serve --port 8081
//!
//! # Rewrite the role default table and exit
//! lms-service seed-permissions
//!
//! # Validate config without starting
//! lms-service check
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use lms_core::config::{default_config_path, AppConfig, ConfigError};
use lms_core::server::{init_tracing, seed_permissions, BoxError, ServerHandle, ServerOptions};

/// Learning-management backend: permissions and stage progress.
#[derive(Parser, Debug)]
#[command(
    name = "lms-service",
    version,
    about = "Role/permission resolution and stage progress tracking",
    long_about = "REST API for a learning platform: role and permission \
                  administration, content, and learner stage progress.\n\n\
                  Default config: ~/.config/lms-service/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "LMS_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server (default).
    Serve {
        /// Override the listen port.
        #[arg(long)]
        port: Option<u16>,

        /// Skip database migrations on startup.
        #[arg(long)]
        no_migrate: bool,

        /// Keep the stored role defaults instead of reseeding them.
        #[arg(long)]
        no_reseed: bool,
    },
    /// Migrate the database, rewrite the role default table and exit.
    SeedPermissions,
    /// Validate the configuration file and exit.
    Check,
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(default_config_path);

    // ── Load configuration ─────────────────────────────────────
    let loaded = AppConfig::load(&config_path);

    if let Some(Command::Check) = cli.command {
        return check(&config_path, loaded);
    }

    let (mut config, load_error) = match loaded {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }

    init_tracing(&config);
    match load_error {
        None => info!("Configuration loaded from {}", config_path.display()),
        Some(e) => warn!(
            "Failed to load config from {}: {}. Using defaults.",
            config_path.display(),
            e
        ),
    }

    match cli.command.unwrap_or(Command::Serve {
        port: None,
        no_migrate: false,
        no_reseed: false,
    }) {
        Command::Serve {
            port,
            no_migrate,
            no_reseed,
        } => {
            if let Some(port) = port {
                info!("CLI override: port = {}", port);
                config.server.port = port;
            }
            if no_reseed {
                config.permissions.reseed_on_boot = false;
            }
            serve(config, !no_migrate).await
        }
        Command::SeedPermissions => {
            seed_permissions(&config).await?;
            info!("Role permissions reseeded");
            Ok(())
        }
        Command::Check => Ok(()),
    }
}

async fn serve(config: AppConfig, auto_migrate: bool) -> Result<(), BoxError> {
    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate,
    })
    .await?;

    handle.install_signal_handler();
    info!("Press Ctrl+C to shutdown gracefully.");

    handle.shutdown_signal().wait().await;
    handle.wait().await;
    Ok(())
}

fn check(path: &std::path::Path, loaded: Result<AppConfig, ConfigError>) -> Result<(), BoxError> {
    let config = loaded?;
    println!("Configuration is valid");
    println!("   Config file : {}", path.display());
    println!("   Address     : {}", config.listen_address());
    println!("   Database    : {}", config.database.connection_url());
    println!("   Log level   : {}", config.logging.level);
    println!("   Reseed      : {}", config.permissions.reseed_on_boot);
    if config.uses_default_secret() {
        println!("   Warning     : security.jwt_secret is the built-in placeholder");
    }
    Ok(())
}
