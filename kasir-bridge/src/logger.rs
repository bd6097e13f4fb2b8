//! Logging setup
//!
//! Console output plus, when a log directory is given, two daily-rolling
//! files:
//! - `app/app.YYYY-MM-DD`: everything except the `security` target
//! - `security/security.YYYY-MM-DD`: trust handshake events only

use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Target used for trust / session security events
pub const SECURITY_TARGET: &str = "security";

/// Initialize logging
///
/// `RUST_LOG` overrides `level` when set.
///
/// # Examples
/// ```no_run
/// // Development (console only)
/// kasir_bridge::init_logger_with_file("debug", false, None)?;
///
/// // Till install (console + files)
/// kasir_bridge::init_logger_with_file("info", true, Some(std::path::Path::new("./logs")))?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn init_logger_with_file(
    level: &str,
    json_format: bool,
    log_dir: Option<&Path>,
) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (app_log, security_log) = match log_dir {
        Some(dir) => {
            let app_dir = dir.join("app");
            let security_dir = dir.join("security");
            fs::create_dir_all(&app_dir)?;
            fs::create_dir_all(&security_dir)?;
            (
                Some(RollingFileAppender::new(Rotation::DAILY, app_dir, "app")),
                Some(RollingFileAppender::new(
                    Rotation::DAILY,
                    security_dir,
                    SECURITY_TARGET,
                )),
            )
        }
        None => (None, None),
    };

    let app_layer = app_log.map(|appender| {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .with_writer(Mutex::new(appender))
            .with_filter(filter_fn(|meta| meta.target() != SECURITY_TARGET))
    });
    let security_layer = security_log.map(|appender| {
        fmt::layer()
            .with_target(true)
            .with_ansi(false)
            .with_writer(Mutex::new(appender))
            .with_filter(filter_fn(|meta| meta.target() == SECURITY_TARGET))
    });

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(app_layer)
        .with(security_layer);

    if json_format {
        subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init()?;
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init()?;
    }

    Ok(())
}

/// Console-only logging
pub fn init_logger(level: &str, json_format: bool) -> anyhow::Result<()> {
    init_logger_with_file(level, json_format, None)
}
