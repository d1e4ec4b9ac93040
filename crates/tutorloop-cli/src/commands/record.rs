//! The `tutorloop record` command.

use std::path::PathBuf;

use anyhow::Result;

use tutorloop_core::adapters::{adapt_qa_result, adapt_quiz_result};
use tutorloop_core::payload::read_payload;

use super::{percent, Session};
use crate::GlobalArgs;

pub fn execute(global: &GlobalArgs, quiz_path: PathBuf, qa_path: Option<PathBuf>, json: bool) -> Result<()> {
    let session = Session::open(global)?;

    let raw_quiz = read_payload(&quiz_path)?;
    let raw_qa = qa_path.as_deref().map(read_payload).transpose()?;

    let quiz = adapt_quiz_result(&raw_quiz)?;
    let qa = adapt_qa_result(raw_qa.as_ref())?;

    if let Some(user) = &global.user {
        anyhow::ensure!(
            *user == quiz.user_id,
            "quiz belongs to user {:?}, not {:?}",
            quiz.user_id,
            user
        );
    }

    let outcome = session.pipeline.submit_adapted(&quiz, qa.as_ref())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    println!(
        "Recorded {} / {} ({} of {} correct) to {}",
        quiz.user_id,
        quiz.topic_id,
        quiz.num_correct(),
        quiz.num_questions(),
        session.config.store_path.display()
    );
    println!("  quiz score:    {}", percent(outcome.quiz_score));
    if qa.is_some() {
        println!("  sample score:  {}", percent(outcome.sample.score()));
    }
    println!("  topic mastery: {}", percent(outcome.topic_mastery));
    println!(
        "  next quiz:     level {} ({})",
        outcome.next_difficulty,
        outcome.next_difficulty.label()
    );

    Ok(())
}
