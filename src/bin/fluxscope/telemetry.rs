use std::{
    fs::{self, OpenOptions},
    path::Path,
    sync::{Mutex, OnceLock},
};
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

static TELEMETRY_INIT: OnceLock<()> = OnceLock::new();

const LOG_ENV: &str = "FLUXSCOPE_LOG";
const LOG_FILE: &str = "fluxscope.log";

/// Log to `<dir>/fluxscope.log`; the terminal belongs to the UI.
pub fn init(dir: &Path) {
    TELEMETRY_INIT.get_or_init(|| {
        let env_filter = EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_new("fluxscope=info"))
            .unwrap_or_else(|_| EnvFilter::default().add_directive(Level::INFO.into()));

        let file = match fs::create_dir_all(dir).and_then(|_| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join(LOG_FILE))
        }) {
            Ok(file) => file,
            Err(err) => {
                eprintln!("[telemetry] failed to open log file in {}: {err}", dir.display());
                return;
            }
        };

        if let Err(err) = fmt()
            .with_env_filter(env_filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(false)
            .try_init()
        {
            eprintln!("[telemetry] failed to initialise tracing subscriber: {err}");
        }
    });
}
