//! Subscriber setup for hosts embedding the engine. The engine itself only
//! emits `tracing` events and never installs a subscriber on its own.

use std::path::PathBuf;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

/// Directory for daily rotated log files. Unset means stdout.
pub const LOG_DIR_ENV: &str = "QM_LOG_DIR";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

fn log_dir() -> Option<PathBuf> {
    std::env::var_os(LOG_DIR_ENV)
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
}

fn rotating_file_writer(app_name: &'static str, dir: PathBuf) -> Option<BoxMakeWriter> {
    if let Err(err) = std::fs::create_dir_all(&dir) {
        tracing::warn!(error = %err, dir = %dir.display(), "failed to create log dir; falling back to stdout");
        return None;
    }

    let appender = tracing_appender::rolling::daily(dir, format!("{app_name}.log"));
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);
    Some(BoxMakeWriter::new(non_blocking))
}

/// `RUST_LOG` でフィルタ（既定 info）。`QM_LOG_DIR` があれば `<dir>/<app>.log` に日次ローテーション。
///
/// Calling this more than once is harmless; only the first subscriber sticks.
pub fn init_tracing_subscriber(app_name: &'static str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter);

    match log_dir().and_then(|dir| rotating_file_writer(app_name, dir)) {
        Some(writer) => {
            let _ = builder.with_writer(writer).try_init();
        }
        None => {
            let _ = builder.try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_tracing_subscriber("qm-engine-test");
        init_tracing_subscriber("qm-engine-test");

        tracing::info!("subscriber initialised twice without panicking");
    }
}
