pub mod config;
pub mod countdown;
pub mod question;
pub mod records;
pub mod reminder;
pub mod stopwatch;

use std::io::Write;

use lass_core::storage::Database;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

pub fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Load an engine kept in the kv table between invocations.
///
/// A missing or unreadable entry yields `fallback()`.
pub fn load_state<T: DeserializeOwned>(db: &Database, key: &str, fallback: impl FnOnce() -> T) -> T {
    match db.kv_get(key) {
        Ok(Some(json)) => match serde_json::from_str(&json) {
            Ok(state) => return state,
            Err(e) => warn!(key, error = %e, "discarding unreadable session state"),
        },
        Ok(None) => {}
        Err(e) => warn!(key, error = %e, "failed to read session state"),
    }
    fallback()
}

pub fn save_state<T: Serialize>(db: &Database, key: &str, state: &T) -> CliResult {
    db.kv_set(key, &serde_json::to_string(state)?)?;
    Ok(())
}

/// Rewrite the current terminal line.
///
/// A broken terminal only costs the display: the session keeps running and
/// its state is still saved, so write errors are logged, not returned.
pub fn redraw(line: &str) {
    let mut out = std::io::stdout().lock();
    if let Err(e) = write!(out, "\r{line}\x1b[K").and_then(|()| out.flush()) {
        debug!(error = %e, "terminal redraw failed");
    }
}
