use chrono::Utc;
use clap::Subcommand;
use lass_core::storage::{Database, NewQuestion};

use super::{print_json, CliResult};

#[derive(Subcommand)]
pub enum QuestionAction {
    /// Log a missed question with its answer
    Add {
        question: String,
        answer: String,
        #[arg(long, short, default_value = "")]
        subject: String,
    },
    /// List logged questions, latest first
    List,
    /// Delete a question
    Delete { id: i64 },
}

pub fn run(action: QuestionAction) -> CliResult {
    let db = Database::open()?;

    match action {
        QuestionAction::Add {
            question,
            answer,
            subject,
        } => {
            let saved = db.insert_question(
                &NewQuestion {
                    subject,
                    question,
                    answer,
                },
                Utc::now(),
            )?;
            print_json(&saved)?;
        }
        QuestionAction::List => print_json(&db.list_questions()?)?,
        QuestionAction::Delete { id } => {
            db.delete_question(id)?;
            println!("deleted question {id}");
        }
    }
    Ok(())
}
