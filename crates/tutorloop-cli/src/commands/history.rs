//! The `tutorloop history` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use tutorloop_core::storage::MasteryStore;

use super::{percent, Session};
use crate::GlobalArgs;

pub fn execute(global: &GlobalArgs, topic: &str, by_time: bool) -> Result<()> {
    let session = Session::open(global)?;
    let store = session.pipeline.tracker().store();
    let samples = if by_time {
        store.get_samples_by_time(&session.user, topic)
    } else {
        store.get_samples(&session.user, topic)
    };

    if samples.is_empty() {
        println!("No quizzes recorded for {} / {}.", session.user, topic);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "Timestamp", "Score", "Questions", "Difficulty"]);
    for (i, sample) in samples.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(sample.timestamp().format("%Y-%m-%d %H:%M:%S")),
            Cell::new(percent(sample.score())),
            Cell::new(
                sample
                    .num_questions()
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "-".into()),
            ),
            Cell::new(
                sample
                    .difficulty()
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "-".into()),
            ),
        ]);
    }

    println!("{table}");
    Ok(())
}
