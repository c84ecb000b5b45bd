//! fluxscope - terminal oscilloscope for the default audio input
//!
//! Run with: cargo run --release

mod app;
mod telemetry;
mod ui;

use app::ScopeApp;
use fluxscope::settings::{SettingsStore, CONFIG_DIR_NAME, CONFIG_FILE_NAME};
use std::path::PathBuf;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    // Without $HOME, keep settings and logs next to the working directory.
    let store = SettingsStore::default_location().unwrap_or_else(|_| {
        SettingsStore::new(PathBuf::from(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    });
    if let Some(dir) = store.path().parent() {
        telemetry::init(dir);
    }

    ScopeApp::new(store).run()
}
