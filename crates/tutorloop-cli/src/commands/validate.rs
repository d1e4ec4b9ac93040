//! The `tutorloop validate` command.

use std::path::PathBuf;

use anyhow::Result;

use tutorloop_core::payload::check_quiz_payloads;

pub fn execute(quiz_path: PathBuf) -> Result<()> {
    let checks = check_quiz_payloads(&quiz_path)?;

    let mut invalid = 0;
    for check in &checks {
        match &check.result {
            Ok(quiz) => println!(
                "{}: {} / {} ({} questions, {})",
                check.path.display(),
                quiz.user_id,
                quiz.topic_id,
                quiz.num_questions(),
                quiz.difficulty
            ),
            Err(e) => {
                println!("{}: INVALID: {e}", check.path.display());
                invalid += 1;
            }
        }
    }

    if invalid == 0 {
        println!("All {} quiz file(s) valid.", checks.len());
        Ok(())
    } else {
        anyhow::bail!("{invalid} of {} quiz file(s) invalid", checks.len())
    }
}
