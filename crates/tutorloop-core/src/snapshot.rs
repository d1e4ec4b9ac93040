//! Progress snapshots with JSON persistence and mastery comparison.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::adaptive::{AdaptiveEngine, NextStep, Thresholds};
use crate::tracker::{CurvePoint, ProgressTracker};

/// A point-in-time view of one user's progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Unique snapshot identifier.
    pub id: Uuid,
    /// When the snapshot was taken.
    pub created_at: DateTime<Utc>,
    pub user_id: String,
    /// Mean of the per-topic masteries.
    pub overall_mastery: f64,
    /// Per-topic progress, ordered by topic id.
    pub topics: Vec<TopicProgress>,
    /// Recommendation at the time of the snapshot.
    pub next_step: NextStep,
    /// Band thresholds the recommendation was made with.
    #[serde(default)]
    pub thresholds: Thresholds,
}

/// Progress on a single topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicProgress {
    pub topic_id: String,
    pub mastery: f64,
    /// Number of recorded samples.
    pub samples: usize,
    pub curve: Vec<CurvePoint>,
}

impl ProgressSnapshot {
    /// Capture the current progress of `user_id`.
    ///
    /// Each topic's history is read once; mastery, overall mastery and the
    /// recommendation are all derived from those reads.
    pub fn capture(tracker: &ProgressTracker, engine: &AdaptiveEngine, user_id: &str) -> Self {
        let topics: Vec<TopicProgress> = tracker
            .store()
            .get_topics(user_id)
            .into_iter()
            .map(|topic_id| {
                let samples = tracker.store().get_samples(user_id, &topic_id);
                let curve = tracker.curve_of(&samples);
                TopicProgress {
                    mastery: curve.last().map_or(0.0, |p| p.mastery),
                    samples: curve.len(),
                    topic_id,
                    curve,
                }
            })
            .collect();

        let masteries: BTreeMap<String, f64> = topics
            .iter()
            .map(|t| (t.topic_id.clone(), t.mastery))
            .collect();
        let overall_mastery = if topics.is_empty() {
            0.0
        } else {
            masteries.values().sum::<f64>() / topics.len() as f64
        };

        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            user_id: user_id.to_string(),
            overall_mastery,
            topics,
            next_step: engine.recommend(&masteries),
            thresholds: engine.thresholds(),
        }
    }

    /// Save the snapshot as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize snapshot")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write snapshot to {}", path.display()))?;
        Ok(())
    }

    /// Load a snapshot from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot from {}", path.display()))?;
        let snapshot: ProgressSnapshot =
            serde_json::from_str(&content).context("failed to parse snapshot JSON")?;
        Ok(snapshot)
    }

    /// Compare this snapshot against an earlier baseline.
    ///
    /// A topic regresses when its mastery dropped by more than `threshold`
    /// and improves when it rose by more than `threshold`.
    pub fn compare(&self, baseline: &ProgressSnapshot, threshold: f64) -> MasteryDelta {
        let mastery_map = |snapshot: &ProgressSnapshot| -> HashMap<String, f64> {
            snapshot
                .topics
                .iter()
                .map(|t| (t.topic_id.clone(), t.mastery))
                .collect()
        };

        let baseline_mastery = mastery_map(baseline);
        let current_mastery = mastery_map(self);

        let mut regressions = Vec::new();
        let mut improvements = Vec::new();
        let mut unchanged = 0usize;
        let mut new_topics = Vec::new();

        for topic in &self.topics {
            let current = topic.mastery;
            match baseline_mastery.get(&topic.topic_id) {
                Some(&baseline_val) => {
                    let change = TopicChange {
                        topic_id: topic.topic_id.clone(),
                        baseline_mastery: baseline_val,
                        current_mastery: current,
                        delta: current - baseline_val,
                    };
                    if change.delta < -threshold {
                        regressions.push(change);
                    } else if change.delta > threshold {
                        improvements.push(change);
                    } else {
                        unchanged += 1;
                    }
                }
                None => new_topics.push(topic.topic_id.clone()),
            }
        }

        let dropped_topics = baseline
            .topics
            .iter()
            .filter(|t| !current_mastery.contains_key(&t.topic_id))
            .map(|t| t.topic_id.clone())
            .collect();

        MasteryDelta {
            user_id: self.user_id.clone(),
            baseline_overall: baseline.overall_mastery,
            current_overall: self.overall_mastery,
            regressions,
            improvements,
            unchanged,
            new_topics,
            dropped_topics,
        }
    }
}

/// Result of comparing two snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasteryDelta {
    pub user_id: String,
    pub baseline_overall: f64,
    pub current_overall: f64,
    /// Topics whose mastery fell by more than the threshold.
    pub regressions: Vec<TopicChange>,
    /// Topics whose mastery rose by more than the threshold.
    pub improvements: Vec<TopicChange>,
    /// Topics within the threshold.
    pub unchanged: usize,
    /// Topics only present in the current snapshot.
    pub new_topics: Vec<String>,
    /// Topics only present in the baseline.
    pub dropped_topics: Vec<String>,
}

/// Mastery movement of one topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicChange {
    pub topic_id: String,
    pub baseline_mastery: f64,
    pub current_mastery: f64,
    pub delta: f64,
}

impl MasteryDelta {
    /// Format the comparison as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Overall:** {:.1}% -> {:.1}% ({} regressions, {} improvements, {} unchanged)\n\n",
            self.baseline_overall * 100.0,
            self.current_overall * 100.0,
            self.regressions.len(),
            self.improvements.len(),
            self.unchanged
        ));

        for (title, changes) in [
            ("Regressions", &self.regressions),
            ("Improvements", &self.improvements),
        ] {
            if changes.is_empty() {
                continue;
            }
            md.push_str(&format!("### {title}\n\n"));
            md.push_str("| Topic | Baseline | Current | Delta |\n");
            md.push_str("|-------|----------|---------|-------|\n");
            for c in changes {
                md.push_str(&format!(
                    "| {} | {:.1}% | {:.1}% | {:+.1}% |\n",
                    escape_cell(&c.topic_id),
                    c.baseline_mastery * 100.0,
                    c.current_mastery * 100.0,
                    c.delta * 100.0
                ));
            }
            md.push('\n');
        }

        if !self.new_topics.is_empty() {
            md.push_str(&format!("New topics: {}\n", self.new_topics.join(", ")));
        }
        if !self.dropped_topics.is_empty() {
            md.push_str(&format!("Dropped topics: {}\n", self.dropped_topics.join(", ")));
        }

        md
    }

    /// Returns true if any topic regressed.
    pub fn has_regressions(&self) -> bool {
        !self.regressions.is_empty()
    }
}

/// Escape a value for use inside a markdown table cell.
pub fn escape_cell(s: &str) -> String {
    s.replace('|', "\\|")
}
