//! Markdown progress summary, for pasting into course notes or PR comments.

use tutorloop_core::adaptive::NextStep;
use tutorloop_core::snapshot::{escape_cell, ProgressSnapshot};

/// Render a snapshot as a markdown summary.
pub fn generate_markdown(snapshot: &ProgressSnapshot) -> String {
    let mut md = String::new();

    md.push_str(&format!("## Progress for {}\n\n", snapshot.user_id));
    md.push_str(&format!(
        "**Overall mastery:** {:.1}% across {} topics ({})\n\n",
        snapshot.overall_mastery * 100.0,
        snapshot.topics.len(),
        snapshot.created_at.format("%Y-%m-%d %H:%M UTC")
    ));

    if !snapshot.topics.is_empty() {
        md.push_str("| Topic | Mastery | Samples | Trend |\n");
        md.push_str("|-------|---------|---------|-------|\n");
        for topic in &snapshot.topics {
            md.push_str(&format!(
                "| {} | {:.1}% | {} | {} |\n",
                escape_cell(&topic.topic_id),
                topic.mastery * 100.0,
                topic.samples,
                trend(topic.curve.iter().map(|p| p.mastery))
            ));
        }
        md.push('\n');
    }

    match &snapshot.next_step {
        NextStep::Recommend(rec) => {
            md.push_str(&format!(
                "**Next:** `{}` on **{}** ({} difficulty)\n",
                rec.action_type, rec.next_topic_id, rec.difficulty
            ));
        }
        NextStep::NothingToRecommend => md.push_str("**Next:** no quizzes recorded yet\n"),
    }

    md
}

/// Arrow describing the last step of a learning curve.
fn trend(mut curve: impl DoubleEndedIterator<Item = f64>) -> &'static str {
    let Some(last) = curve.next_back() else {
        return "-";
    };
    match curve.next_back() {
        Some(prev) if last > prev + 1e-9 => "↑",
        Some(prev) if last < prev - 1e-9 => "↓",
        Some(_) => "→",
        None => "-",
    }
}
