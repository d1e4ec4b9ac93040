//! The `tutorloop progress` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use tutorloop_core::storage::MasteryStore;

use super::{percent, Session};
use crate::GlobalArgs;

pub fn execute(global: &GlobalArgs, topic: Option<String>) -> Result<()> {
    let session = Session::open(global)?;
    let tracker = session.pipeline.tracker();
    let thresholds = session.pipeline.engine().thresholds();

    if let Some(topic) = topic {
        let mastery = tracker.compute_topic_mastery(&session.user, &topic);
        let samples = tracker.store().get_samples(&session.user, &topic).len();
        println!(
            "{} / {}: {} over {} sample(s) ({})",
            session.user,
            topic,
            percent(mastery),
            samples,
            thresholds.band(mastery)
        );
        return Ok(());
    }

    let summary = session.pipeline.progress(&session.user);
    if summary.topics.is_empty() {
        println!("No quizzes recorded for {}.", session.user);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Topic", "Mastery", "Band", "Samples", "Next level"]);
    for (topic, mastery) in &summary.topics {
        let samples = tracker.store().get_samples(&session.user, topic).len();
        let level = session
            .pipeline
            .engine()
            .get_adaptive_difficulty(&session.user, topic);
        table.add_row(vec![
            Cell::new(topic),
            Cell::new(percent(*mastery)),
            Cell::new(thresholds.band(*mastery)),
            Cell::new(samples),
            Cell::new(format!("{} ({})", level, level.label())),
        ]);
    }

    println!("{table}");
    println!(
        "Overall mastery for {}: {}",
        session.user,
        percent(summary.overall_mastery)
    );
    Ok(())
}
