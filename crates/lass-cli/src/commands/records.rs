use chrono::Local;
use clap::Subcommand;
use lass_core::storage::Database;
use lass_core::{format, SessionKind};
use serde_json::json;

use super::{print_json, CliResult};

#[derive(Subcommand)]
pub enum RecordsAction {
    /// List study records, most recent first
    List {
        /// Only "timer"/"countdown" or "stopwatch" records
        #[arg(long)]
        kind: Option<String>,
    },
    /// Delete a record by id
    Delete { id: i64 },
    /// Total, count and average for today
    Today,
    /// All-time totals per session kind
    Stats,
}

pub fn run(action: RecordsAction) -> CliResult {
    let db = Database::open()?;

    match action {
        RecordsAction::List { kind } => {
            let kind = kind
                .map(|k| parse_kind(&k).ok_or_else(|| format!("unknown record kind: {k}")))
                .transpose()?;
            let records: Vec<_> = db
                .list_study_records()?
                .into_iter()
                .filter(|r| kind.map_or(true, |k| r.kind == k))
                .collect();
            print_json(&records)?;
        }
        RecordsAction::Delete { id } => {
            db.delete_study_record(id)?;
            println!("deleted record {id}");
        }
        RecordsAction::Today => {
            let day = db.day_stats(Local::now().date_naive())?;
            print_json(&json!({
                "stats": day,
                "total": format::duration(day.total_ms),
                "average": format::duration(day.average_ms),
            }))?;
        }
        RecordsAction::Stats => {
            print_json(&db.stats(Local::now().date_naive())?)?;
        }
    }
    Ok(())
}

/// Accepts the stored names plus "timer" for countdown records.
fn parse_kind(s: &str) -> Option<SessionKind> {
    match s {
        "timer" => Some(SessionKind::Countdown),
        other => SessionKind::parse(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_is_an_alias_for_countdown() {
        assert_eq!(parse_kind("timer"), Some(SessionKind::Countdown));
        assert_eq!(parse_kind("stopwatch"), Some(SessionKind::Stopwatch));
        assert_eq!(parse_kind("lap"), None);
    }
}
