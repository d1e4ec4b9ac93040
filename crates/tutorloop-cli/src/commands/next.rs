//! The `tutorloop next` command.

use anyhow::Result;

use tutorloop_core::adaptive::NextStep;

use super::{percent, Session};
use crate::GlobalArgs;

pub fn execute(global: &GlobalArgs, json: bool) -> Result<()> {
    let session = Session::open(global)?;
    let step = session.pipeline.next_step(&session.user);

    if json {
        println!("{}", serde_json::to_string_pretty(&step)?);
        return Ok(());
    }

    match step {
        NextStep::Recommend(rec) => {
            println!(
                "Next: {} on {} at {} difficulty (mastery {})",
                rec.action_type,
                rec.next_topic_id,
                rec.difficulty,
                percent(rec.mastery)
            );
            if let Some(reason) = rec.reason {
                println!("  {reason}");
            }
        }
        NextStep::NothingToRecommend => {
            println!("Nothing to recommend yet: no quizzes recorded for {}.", session.user);
        }
    }
    Ok(())
}
