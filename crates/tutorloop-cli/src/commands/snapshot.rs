//! The `tutorloop snapshot` command.

use std::path::PathBuf;

use anyhow::Result;

use tutorloop_core::snapshot::ProgressSnapshot;
use tutorloop_report::html::write_html_report;
use tutorloop_report::markdown::generate_markdown;

use super::{percent, Session};
use crate::GlobalArgs;

pub fn execute(
    global: &GlobalArgs,
    output: PathBuf,
    html: Option<PathBuf>,
    markdown: bool,
) -> Result<()> {
    let session = Session::open(global)?;
    let snapshot = ProgressSnapshot::capture(
        session.pipeline.tracker(),
        session.pipeline.engine(),
        &session.user,
    );

    snapshot.save_json(&output)?;
    tracing::info!(path = %output.display(), topics = snapshot.topics.len(), "wrote snapshot");
    println!(
        "Snapshot of {} ({} topics, overall {}) written to {}",
        snapshot.user_id,
        snapshot.topics.len(),
        percent(snapshot.overall_mastery),
        output.display()
    );

    if let Some(html_path) = html {
        write_html_report(&snapshot, &html_path)?;
        println!("HTML report written to {}", html_path.display());
    }

    if markdown {
        println!("\n{}", generate_markdown(&snapshot));
    }

    Ok(())
}
