use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

static INITIALISED: OnceLock<()> = OnceLock::new();
static CHROME_GUARD: OnceLock<Mutex<Option<tracing_chrome::FlushGuard>>> = OnceLock::new();

/// Configures the global tracing subscriber.
///
/// Filtering follows `RUST_LOG` when set, otherwise `info`. When
/// `ADVBRIDGE_TRACE_CHROME` names a file, a chrome trace is written there in
/// addition to the fmt output; the flush guard lives for the rest of the
/// process.
pub fn init_tracing() -> Result<(), InitError> {
    INITIALISED
        .set(())
        .map_err(|_| InitError::AlreadyInitialised)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(std::io::stdout().is_terminal());
    let registry = Registry::default().with(filter).with(fmt_layer);

    match chrome_trace_path()? {
        Some(path) => {
            let (chrome_layer, guard) = tracing_chrome::ChromeLayerBuilder::new()
                .file(path)
                .include_args(true)
                .build();
            if let Ok(mut slot) = CHROME_GUARD.get_or_init(|| Mutex::new(None)).lock() {
                *slot = Some(guard);
            }
            registry.with(chrome_layer).init();
        }
        None => registry.init(),
    }

    Ok(())
}

fn chrome_trace_path() -> Result<Option<PathBuf>, InitError> {
    match std::env::var("ADVBRIDGE_TRACE_CHROME") {
        Ok(raw) if !raw.trim().is_empty() => Ok(Some(PathBuf::from(raw))),
        Ok(_) => Ok(None),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(InitError::Env(err)),
    }
}

/// Errors emitted when configuring the tracing subscriber.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("tracing has already been initialised")]
    AlreadyInitialised,
    #[error("failed to read ADVBRIDGE_TRACE_CHROME: {0}")]
    Env(std::env::VarError),
}
