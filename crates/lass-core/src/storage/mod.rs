mod config;
pub mod database;
pub mod live;
pub mod migrations;
pub mod notebook;

pub use config::{Config, CountdownConfig, StopwatchConfig, UiConfig};
pub use database::{Database, DayStats, KindTotals, Stats};
pub use live::LiveStore;
pub use notebook::{NewQuestion, NewReminder, Question, Reminder};

use std::path::PathBuf;

/// Returns the data directory, creating it if needed.
///
/// `LASS_DATA_DIR` wins when set. Otherwise `~/.config/lass[-dev]/`, with
/// `LASS_ENV=dev` selecting the development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("LASS_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("LASS_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("lass-dev")
            } else {
                base_dir.join("lass")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
