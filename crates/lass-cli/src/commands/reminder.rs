use chrono::Utc;
use clap::Subcommand;
use lass_core::storage::{Config, Database, NewReminder};

use super::{print_json, CliResult};

#[derive(Subcommand)]
pub enum ReminderAction {
    /// Add a reminder
    Add {
        title: String,
        #[arg(long, short, default_value = "")]
        description: String,
        /// Mark as a study goal rather than a plain reminder
        #[arg(long)]
        goal: bool,
    },
    /// List reminders, newest first
    List {
        /// Include completed reminders (default: ui.show_completed_reminders)
        #[arg(long)]
        all: bool,
    },
    /// Flip a reminder between open and completed
    Toggle { id: i64 },
    /// Delete a reminder
    Delete { id: i64 },
}

pub fn run(action: ReminderAction) -> CliResult {
    let db = Database::open()?;

    match action {
        ReminderAction::Add {
            title,
            description,
            goal,
        } => {
            let reminder = db.insert_reminder(
                &NewReminder {
                    title,
                    description,
                    is_goal: goal,
                },
                Utc::now(),
            )?;
            print_json(&reminder)?;
        }
        ReminderAction::List { all } => {
            let include_completed = all || Config::load()?.ui.show_completed_reminders;
            print_json(&db.list_reminders(include_completed)?)?;
        }
        ReminderAction::Toggle { id } => {
            let completed = db.toggle_reminder(id)?;
            println!(
                "reminder {id} {}",
                if completed { "completed" } else { "reopened" }
            );
        }
        ReminderAction::Delete { id } => {
            db.delete_reminder(id)?;
            println!("deleted reminder {id}");
        }
    }
    Ok(())
}
