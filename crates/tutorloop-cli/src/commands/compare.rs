//! The `tutorloop compare` command.

use std::path::PathBuf;

use anyhow::Result;

use tutorloop_core::snapshot::ProgressSnapshot;

use super::percent;

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    threshold: f64,
    fail_on_regression: bool,
    format: String,
) -> Result<()> {
    let baseline = ProgressSnapshot::load_json(&baseline_path)?;
    let current = ProgressSnapshot::load_json(&current_path)?;

    if baseline.user_id != current.user_id {
        tracing::warn!(
            baseline = %baseline.user_id,
            current = %current.user_id,
            "comparing snapshots of different users"
        );
    }

    let delta = current.compare(&baseline, threshold);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", delta.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&delta)?);
        }
        _ => {
            println!(
                "Comparison for {}: overall {} -> {}; {} regressions, {} improvements, {} unchanged",
                delta.user_id,
                percent(delta.baseline_overall),
                percent(delta.current_overall),
                delta.regressions.len(),
                delta.improvements.len(),
                delta.unchanged
            );

            if !delta.regressions.is_empty() {
                println!("\nRegressions:");
                for r in &delta.regressions {
                    println!(
                        "  {} {} -> {} ({:+.1}%)",
                        r.topic_id,
                        percent(r.baseline_mastery),
                        percent(r.current_mastery),
                        r.delta * 100.0
                    );
                }
            }

            if !delta.improvements.is_empty() {
                println!("\nImprovements:");
                for i in &delta.improvements {
                    println!(
                        "  {} {} -> {} ({:+.1}%)",
                        i.topic_id,
                        percent(i.baseline_mastery),
                        percent(i.current_mastery),
                        i.delta * 100.0
                    );
                }
            }

            if !delta.new_topics.is_empty() {
                println!("\nNew topic(s): {}", delta.new_topics.join(", "));
            }
            if !delta.dropped_topics.is_empty() {
                println!("Dropped topic(s): {}", delta.dropped_topics.join(", "));
            }
        }
    }

    if fail_on_regression && delta.has_regressions() {
        std::process::exit(1);
    }

    Ok(())
}
