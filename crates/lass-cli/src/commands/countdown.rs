use std::sync::Arc;

use chrono::Utc;
use clap::Subcommand;
use lass_core::storage::{Config, Database, LiveStore};
use lass_core::timer::{parse_custom_minutes, CountdownEngine, CountdownState};
use lass_core::{format, Event, RecordEmitter, SessionRunner, SystemClock};
use serde_json::json;

use super::{load_state, print_json, redraw, save_state, CliResult};

const ENGINE_KEY: &str = "countdown_engine";

#[derive(Subcommand)]
pub enum CountdownAction {
    /// Pick a preset length; adds the minutes while running
    Preset {
        /// One of the configured presets (countdown.presets)
        minutes: u32,
    },
    /// Set a custom length in minutes (1-300000)
    Custom {
        minutes: String,
    },
    /// Start the countdown
    Start,
    /// Pause; the interrupted run is not recorded
    Pause,
    /// Resume a paused countdown
    Resume,
    /// Back to the selected length
    Reset,
    /// Print current state as JSON
    Status,
    /// Start if needed and show the countdown until it finishes (Ctrl-C detaches)
    Watch,
}

pub fn run(action: CountdownAction) -> CliResult {
    let config = Config::load()?;
    let db = Database::open()?;
    let mut engine = load_state(&db, ENGINE_KEY, || {
        CountdownEngine::new(config.countdown.default_minutes)
    });
    let now = Utc::now();

    // A countdown that ran out between invocations is completed (and
    // recorded) before the requested action applies.
    let mut events: Vec<Event> = engine.tick(now).into_iter().collect();

    let watch = matches!(action, CountdownAction::Watch);
    let event = match action {
        CountdownAction::Preset { minutes } => {
            if !config.countdown.presets.contains(&minutes) {
                return Err(format!(
                    "{minutes} is not a configured preset {:?}; use `countdown custom`",
                    config.countdown.presets
                )
                .into());
            }
            engine.select_preset(minutes)
        }
        CountdownAction::Custom { minutes } => {
            let minutes = parse_custom_minutes(&minutes)?;
            engine.set_custom(u64::from(minutes))?
        }
        CountdownAction::Start | CountdownAction::Watch => engine.start(now),
        CountdownAction::Pause => engine.pause(now),
        CountdownAction::Resume => engine.resume(now),
        CountdownAction::Reset => engine.reset(),
        CountdownAction::Status => None,
    };
    events.extend(event);

    let emitter = RecordEmitter::new(&db);
    for event in &events {
        emitter.handle(event);
    }
    save_state(&db, ENGINE_KEY, &engine)?;

    if watch {
        return watch_foreground(db, engine, &config);
    }

    print_json(&json!({
        "events": events,
        "snapshot": engine.snapshot(),
        "display": format::countdown(engine.remaining_ms()),
    }))
}

fn watch_foreground(db: Database, engine: CountdownEngine, config: &Config) -> CliResult {
    let store = Arc::new(LiveStore::new(db)?);
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let (engine, ran, detached) = rt.block_on(async {
        let mut runner = SessionRunner::new(engine, Arc::new(SystemClock), config.countdown_tick());
        runner.add_observer(Arc::new(RecordEmitter::new(Arc::clone(&store))));
        let mut rx = runner.subscribe();
        runner.start_ticking();

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        let mut ran = false;
        let mut detached = false;
        loop {
            let snapshot = rx.borrow_and_update().clone();
            redraw(&format!(
                "{}  {:>4.0}%",
                format::countdown(snapshot.remaining_ms),
                snapshot.progress * 100.0
            ));
            if snapshot.state != CountdownState::Running {
                break;
            }
            ran = true;
            tokio::select! {
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = &mut ctrl_c => {
                    detached = true;
                    break;
                }
            }
        }
        runner.stop_ticking();
        (runner.inspect(CountdownEngine::clone), ran, detached)
    });
    println!();

    store.with_database(|db| save_state(db, ENGINE_KEY, &engine))?;
    if detached {
        println!("detached; countdown keeps running (`lass countdown status`)");
    } else if ran && engine.remaining_ms() == 0 {
        println!("done, session recorded");
    }
    Ok(())
}
