pub mod dashboard;
pub mod db;
pub mod editor;
pub mod errors;
pub mod models;
pub mod render;
pub mod service;
pub mod settings;

pub use crate::dashboard::defaults::default_dashboard_config;
pub use crate::dashboard::merge::{merge_config, resolve_stored_config, PartialDashboardConfig};
pub use crate::dashboard::visibility::{is_visible, set_visibility, WidgetVisibility};
pub use crate::dashboard::widgets::{is_widget_visible, set_widget_visibility, Widget};
pub use crate::errors::{AppError, AppResult};
pub use crate::models::DashboardConfig;
pub use crate::service::DashboardService;

use crate::settings::ServiceSettings;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

/// Opens the store described by `settings` after installing the global
/// subscriber.
pub fn start(settings: &ServiceSettings) -> AppResult<DashboardService> {
    init_tracing(settings.log_dir.as_deref(), &settings.log_filter, settings.json_logs)
        .map_err(AppError::Internal)?;
    let service = DashboardService::open(settings)?;
    tracing::info!(
        database = %settings.database_path().to_string_lossy(),
        "dashboard service ready"
    );
    Ok(service)
}

/// Logs go to a daily rolling file under `log_dir` when given, stderr otherwise.
/// `RUST_LOG` takes precedence over `default_filter`.
pub fn init_tracing(log_dir: Option<&Path>, default_filter: &str, json: bool) -> Result<(), String> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    let Some(log_dir) = log_dir else {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr);
        let result = if json {
            builder.json().try_init()
        } else {
            builder.try_init()
        };
        return result.map_err(|error| error.to_string());
    };

    std::fs::create_dir_all(log_dir).map_err(|error| error.to_string())?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "dashboard.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|error| error.to_string())
}
