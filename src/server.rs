//! Dashboard server runtime.
//!
//! [`ServerHandle`] owns the whole lifecycle: metrics recorder, store
//! connection, bootstrap admin, live dashboard session, REST API and
//! graceful shutdown.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{error, info, warn};

use crate::application::alerts::{AlertRuleBook, AlertSettingsService};
use crate::application::assistant::{ChatService, StatsReplyGenerator};
use crate::application::dashboard::DashboardSession;
use crate::application::{AccessGuard, AuthService, LiveCollectionBinder, LoginMetricsRecorder};
use crate::config::{AppConfig, LogFormat, PlatformConfig};
use crate::domain::{CredentialProvider, DocumentStore};
use crate::infrastructure::crypto::JwtConfig;
use crate::infrastructure::identity::LocalCredentialProvider;
use crate::infrastructure::storage::InMemoryDocumentStore;
use crate::interfaces::http::{create_api_router, AppState};
use crate::shared::{DomainError, ShutdownCoordinator, ShutdownSignal};

// ── Options ────────────────────────────────────────────────────────

pub struct ServerOptions {
    pub config: AppConfig,
    /// Platform credentials; read from the environment when `None`.
    pub platform: Option<PlatformConfig>,
    /// Create or refresh the configured admin account (default: true).
    pub bootstrap_admin: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            platform: None,
            bootstrap_admin: true,
        }
    }
}

// ── ServerHandle ───────────────────────────────────────────────────

/// Handle to a running dashboard server.
///
/// ```rust,no_run
/// use admin_dashboard::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     handle.install_signal_handler();
///     handle.wait().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    pub store: Arc<dyn DocumentStore>,
    pub dashboard: Arc<DashboardSession>,
    pub config: AppConfig,
    /// Address the API is bound to; the port is resolved when 0 was configured.
    pub local_addr: SocketAddr,

    shutdown: ShutdownCoordinator,
    api_task: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let app_cfg = opts.config;
        info!("Starting admin dashboard...");

        let prometheus_handle = prometheus_handle()?;

        // ── Store ──────────────────────────────────────────────
        let platform = match opts.platform {
            Some(platform) => {
                platform.validate()?;
                platform
            }
            None => PlatformConfig::from_env()?,
        };
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::connect(&platform)?);
        info!(project_id = %platform.project_id, "Document store connected");

        // ── Identity ───────────────────────────────────────────
        let jwt_config = JwtConfig {
            secret: app_cfg.security.jwt_secret.clone(),
            expiration_hours: app_cfg.security.jwt_expiration_hours,
            ..JwtConfig::default()
        };
        info!(
            expiration_hours = jwt_config.expiration_hours,
            "JWT sessions configured"
        );
        let provider = Arc::new(LocalCredentialProvider::new(store.clone(), jwt_config));
        if opts.bootstrap_admin {
            bootstrap_admin(&provider, &app_cfg).await?;
        }
        let credentials: Arc<dyn CredentialProvider> = provider;

        // ── Live dashboard ─────────────────────────────────────
        let binder = LiveCollectionBinder::new(store.clone());
        let dashboard = Arc::new(
            DashboardSession::open(&binder, &app_cfg.subscriptions.retry_config()).await?,
        );

        let state = AppState {
            auth: Arc::new(AuthService::new(
                credentials.clone(),
                LoginMetricsRecorder::new(store.clone()),
            )),
            guard: Arc::new(AccessGuard::new(credentials, store.clone())),
            dashboard: dashboard.clone(),
            alert_settings: Arc::new(AlertSettingsService::new(store.clone())),
            alert_rules: Arc::new(AlertRuleBook::new()),
            chat: Arc::new(ChatService::new(Arc::new(StatsReplyGenerator))),
            metrics: Some(prometheus_handle),
            started_at: Instant::now(),
        };
        let api_router = create_api_router(state, &app_cfg.cors);

        // ── HTTP ───────────────────────────────────────────────
        let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
        let listener = tokio::net::TcpListener::bind(app_cfg.server.address()).await?;
        let local_addr = listener.local_addr()?;
        info!("REST API listening on http://{}", local_addr);
        info!("Swagger UI available at http://{}/docs/", local_addr);

        let api_shutdown = shutdown.signal();
        let api_server = axum::serve(
            listener,
            api_router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            api_shutdown.wait().await;
            info!("REST API received shutdown signal");
        });

        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("REST API server error: {}", e);
            }
        });

        Ok(Self {
            store,
            dashboard,
            config: app_cfg,
            local_addr,
            shutdown,
            api_task,
        })
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Trigger shutdown on SIGINT / SIGTERM.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait for the shutdown signal, then for the API to drain within the
    /// configured timeout. Live subscriptions are cancelled last.
    pub async fn wait(self) {
        let Self {
            dashboard,
            shutdown,
            mut api_task,
            ..
        } = self;

        let task = &mut api_task;
        let drained = shutdown
            .shutdown_with_cleanup(move || async move {
                match task.await {
                    Ok(()) => info!("REST API stopped"),
                    Err(e) => error!("REST API task panicked: {}", e),
                }
            })
            .await;
        if !drained {
            warn!("Aborting REST API after shutdown timeout");
            api_task.abort();
        }

        dashboard.cancel();
        info!("Admin dashboard shutdown complete");
    }

    pub async fn shutdown(self) {
        info!("Shutting down admin dashboard...");
        self.trigger_shutdown();
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

// ── Helpers ────────────────────────────────────────────────────────

/// The global recorder can be installed once per process; later starts
/// reuse the first handle.
fn prometheus_handle() -> Result<PrometheusHandle, DomainError> {
    static PROM_HANDLE: Mutex<Option<PrometheusHandle>> = Mutex::new(None);

    let mut slot = PROM_HANDLE
        .lock()
        .map_err(|_| DomainError::Internal("metrics recorder lock poisoned".into()))?;
    if let Some(handle) = slot.as_ref() {
        return Ok(handle.clone());
    }
    let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
        DomainError::Configuration(format!("failed to install metrics recorder: {}", e))
    })?;
    info!("Prometheus metrics recorder installed");
    *slot = Some(handle.clone());
    Ok(handle)
}

async fn bootstrap_admin(
    provider: &LocalCredentialProvider,
    app_cfg: &AppConfig,
) -> Result<(), DomainError> {
    let admin = &app_cfg.admin;
    let display_name = Some(admin.display_name.as_str()).filter(|n| !n.trim().is_empty());
    provider
        .ensure_admin(&admin.email, &admin.password, display_name)
        .await?;
    if admin.password == crate::config::AdminConfig::default().password {
        warn!(email = %admin.email, "Admin account uses the default password; change it in the config file");
    }
    Ok(())
}

/// Initialize tracing from the logging config. `RUST_LOG` overrides the
/// configured level. Call once, before [`ServerHandle::start`].
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}
