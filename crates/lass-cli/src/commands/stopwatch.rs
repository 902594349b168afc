use std::sync::Arc;

use chrono::Utc;
use clap::Subcommand;
use lass_core::storage::{Config, Database, LiveStore};
use lass_core::timer::StopwatchSnapshot;
use lass_core::{format, RecordEmitter, SessionRunner, StopwatchEngine, SystemClock};
use serde_json::json;

use super::{load_state, print_json, redraw, save_state, CliResult};

const ENGINE_KEY: &str = "stopwatch_engine";

#[derive(Subcommand)]
pub enum StopwatchAction {
    /// Start or continue the stopwatch
    Start,
    /// Stop and record the run
    Stop,
    /// Mark a lap
    Lap,
    /// Clear elapsed time and laps without recording
    Reset,
    /// Print current state and laps as JSON
    Status,
    /// Start if needed and show the running time (Ctrl-C detaches)
    Watch,
}

pub fn run(action: StopwatchAction) -> CliResult {
    let config = Config::load()?;
    let db = Database::open()?;
    let mut engine = load_state(&db, ENGINE_KEY, StopwatchEngine::new);
    let now = Utc::now();
    engine.tick(now);

    let watch = matches!(action, StopwatchAction::Watch);
    let event = match action {
        StopwatchAction::Start | StopwatchAction::Watch => engine.start(now),
        StopwatchAction::Stop => engine.stop(now),
        StopwatchAction::Lap => engine.lap(now),
        StopwatchAction::Reset => engine.reset(),
        StopwatchAction::Status => None,
    };

    if let Some(event) = &event {
        RecordEmitter::new(&db).handle(event);
    }
    save_state(&db, ENGINE_KEY, &engine)?;

    if watch {
        return watch_foreground(db, engine, &config);
    }

    print_json(&json!({
        "event": event,
        "snapshot": engine.snapshot(),
        "display": format::stopwatch(engine.elapsed_ms()),
        "laps": lap_lines(&engine.snapshot(), config.ui.highlight_shortest_lap),
    }))
}

/// One display line per lap, newest first.
fn lap_lines(snapshot: &StopwatchSnapshot, highlight: bool) -> Vec<String> {
    snapshot
        .laps
        .iter()
        .zip(&snapshot.splits)
        .enumerate()
        .rev()
        .map(|(i, (&total, &split))| {
            let marker = if highlight
                && snapshot.laps.len() > 1
                && snapshot.shortest_split_ms == Some(split)
            {
                " *"
            } else {
                ""
            };
            format!(
                "#{:<3} {}  {}{marker}",
                i + 1,
                format::stopwatch(split),
                format::stopwatch(total)
            )
        })
        .collect()
}

fn watch_foreground(db: Database, engine: StopwatchEngine, config: &Config) -> CliResult {
    let store = Arc::new(LiveStore::new(db)?);
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let engine = rt.block_on(async {
        let mut runner = SessionRunner::new(engine, Arc::new(SystemClock), config.stopwatch_tick());
        runner.add_observer(Arc::new(RecordEmitter::new(Arc::clone(&store))));
        let mut rx = runner.subscribe();
        runner.start_ticking();

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        loop {
            let snapshot = rx.borrow_and_update().clone();
            redraw(&format!(
                "{}  laps: {}",
                format::stopwatch(snapshot.elapsed_ms),
                snapshot.laps.len()
            ));
            if !snapshot.running {
                break;
            }
            tokio::select! {
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = &mut ctrl_c => break,
            }
        }
        runner.stop_ticking();
        runner.inspect(StopwatchEngine::clone)
    });
    println!();

    store.with_database(|db| save_state(db, ENGINE_KEY, &engine))?;
    if engine.is_running() {
        println!("detached; stopwatch keeps running (`lass stopwatch stop` records it)");
    }
    Ok(())
}
