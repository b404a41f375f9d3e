//! Admin Dashboard server
//!
//! ```sh
//! # Run with the default config (~/.config/admin-dashboard/config.toml)
//! PLATFORM_API_KEY=... PLATFORM_PROJECT_ID=... admin-dashboard
//!
//! # Custom config path and port
//! admin-dashboard --config /etc/admin-dashboard/config.toml --port 9000
//!
//! # Validate config and environment without starting
//! admin-dashboard --check
//!
//! # Write a config file with every default filled in
//! admin-dashboard --init-config
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use admin_dashboard::config::{AppConfig, LogFormat, PlatformConfig};
use admin_dashboard::server::{init_tracing, ServerHandle, ServerOptions};

#[derive(Parser, Debug)]
#[command(
    name = "admin-dashboard",
    version,
    about = "Live admin dashboard: users, login performance, errors and alerts",
    long_about = "REST + WebSocket server for the administrative dashboard.\n\n\
                  Default config: ~/.config/admin-dashboard/config.toml\n\
                  Requires PLATFORM_API_KEY and PLATFORM_PROJECT_ID in the environment."
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "DASHBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listen host.
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Log as JSON lines instead of human-readable text.
    #[arg(long)]
    json_logs: bool,

    /// Validate the configuration and environment, then exit.
    #[arg(long)]
    check: bool,

    /// Write the effective configuration to the config path and exit.
    #[arg(long)]
    init_config: bool,

    /// Skip creating the configured admin account.
    #[arg(long)]
    no_admin: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if self.json_logs {
            config.logging.format = LogFormat::Json;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(admin_dashboard::default_config_path);

    let (mut config, load_error) = match AppConfig::load(&config_path) {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    cli.apply_overrides(&mut config);
    init_tracing(&config);

    match load_error {
        None => info!("Configuration loaded from {}", config_path.display()),
        Some(e) => {
            error!("Failed to load config from {}: {}", config_path.display(), e);
            if cli.check {
                return Err(e.into());
            }
            error!("Using default configuration.");
        }
    }

    if cli.init_config {
        config.save(&config_path)?;
        println!("Configuration written to {}", config_path.display());
        return Ok(());
    }

    // ── Config validation mode ─────────────────────────────────
    if cli.check {
        let platform = PlatformConfig::from_env()?;
        println!("Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   Address     : {}", config.server.address());
        println!("   Project     : {}", platform.project_id);
        println!("   Admin       : {}", config.admin.email);
        println!("   Log level   : {}", config.logging.level);
        return Ok(());
    }

    // ── Start server ───────────────────────────────────────────
    let handle = ServerHandle::start(ServerOptions {
        config,
        platform: None,
        bootstrap_admin: !cli.no_admin,
    })
    .await?;

    handle.install_signal_handler();
    info!("Press Ctrl+C to shutdown gracefully.");

    handle.wait().await;
    Ok(())
}
