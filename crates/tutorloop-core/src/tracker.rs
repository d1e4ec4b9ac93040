//! Mastery tracking with an exponential moving average.
//!
//! Mastery is always re-derived from the full sample log on read; no running
//! EMA is cached, so the log stays the single source of truth.
//!
//! ```text
//! ema[0] = score[0]
//! ema[i] = alpha * score[i] + (1 - alpha) * ema[i - 1]
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EvalError, StoreError};
use crate::model::MasterySample;
use crate::storage::MasteryStore;

/// Default smoothing coefficient.
pub const DEFAULT_ALPHA: f64 = 0.6;

/// Fold a score sequence into its final EMA. `None` for an empty sequence.
pub fn ema<I>(scores: I, alpha: f64) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    scores.into_iter().fold(None, |acc, score| {
        Some(match acc {
            None => score,
            Some(prev) => alpha * score + (1.0 - alpha) * prev,
        })
    })
}

/// Every intermediate EMA value of a score sequence.
///
/// Element `i` equals `ema(&scores[..=i], alpha)`.
pub fn ema_trace<I>(scores: I, alpha: f64) -> Vec<f64>
where
    I: IntoIterator<Item = f64>,
{
    let mut trace = Vec::new();
    let mut acc = None;
    for score in scores {
        let next = match acc {
            None => score,
            Some(prev) => alpha * score + (1.0 - alpha) * prev,
        };
        trace.push(next);
        acc = Some(next);
    }
    trace
}

/// One point of a learning curve: the smoothed mastery right after the
/// sample recorded at `timestamp` was incorporated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub timestamp: DateTime<Utc>,
    pub mastery: f64,
}

/// Overall and per-topic mastery for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub user_id: String,
    pub overall_mastery: f64,
    /// Mastery per topic, ordered by topic id.
    pub topics: BTreeMap<String, f64>,
}

/// Records samples and computes smoothed mastery from the store.
#[derive(Clone)]
pub struct ProgressTracker {
    store: Arc<dyn MasteryStore>,
    alpha: f64,
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("alpha", &self.alpha)
            .finish_non_exhaustive()
    }
}

impl ProgressTracker {
    /// Create a tracker. `alpha` must lie in `(0, 1]`.
    pub fn new(store: Arc<dyn MasteryStore>, alpha: f64) -> Result<Self, EvalError> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(EvalError::InvariantViolation(format!(
                "EMA alpha {alpha} is outside (0, 1]"
            )));
        }
        Ok(Self { store, alpha })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn store(&self) -> &Arc<dyn MasteryStore> {
        &self.store
    }

    /// Append a sample to the log.
    pub fn record_mastery_sample(&self, sample: MasterySample) -> Result<(), StoreError> {
        self.store.append_mastery_sample(sample)
    }

    /// Smoothed mastery for a topic, `0.0` if it has never been studied.
    pub fn compute_topic_mastery(&self, user_id: &str, topic_id: &str) -> f64 {
        let samples = self.store.get_samples(user_id, topic_id);
        let mastery = ema(samples.iter().map(MasterySample::score), self.alpha).unwrap_or(0.0);
        tracing::debug!(
            user = user_id,
            topic = topic_id,
            samples = samples.len(),
            mastery,
            "recomputed topic mastery"
        );
        mastery
    }

    /// Mastery of every topic the user has studied.
    pub fn topic_masteries(&self, user_id: &str) -> BTreeMap<String, f64> {
        self.store
            .get_topics(user_id)
            .into_iter()
            .map(|topic| {
                let mastery = self.compute_topic_mastery(user_id, &topic);
                (topic, mastery)
            })
            .collect()
    }

    /// Mean topic mastery, `0.0` if the user has no topics.
    pub fn compute_overall_mastery(&self, user_id: &str) -> f64 {
        mean(self.topic_masteries(user_id).values().copied())
    }

    /// Cumulative EMA after each recorded sample, in log order.
    pub fn get_learning_curve(&self, user_id: &str, topic_id: &str) -> Vec<CurvePoint> {
        self.curve_of(&self.store.get_samples(user_id, topic_id))
    }

    /// Learning curve of an already-read sample history.
    pub fn curve_of(&self, samples: &[MasterySample]) -> Vec<CurvePoint> {
        let trace = ema_trace(samples.iter().map(MasterySample::score), self.alpha);
        samples
            .iter()
            .zip(trace)
            .map(|(sample, mastery)| CurvePoint {
                timestamp: sample.timestamp(),
                mastery,
            })
            .collect()
    }

    /// Overall mastery together with the per-topic breakdown.
    pub fn summarize(&self, user_id: &str) -> ProgressSummary {
        let topics = self.topic_masteries(user_id);
        ProgressSummary {
            user_id: user_id.to_string(),
            overall_mastery: mean(topics.values().copied()),
            topics,
        }
    }
}

fn mean<I: Iterator<Item = f64>>(values: I) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;
    use chrono::TimeZone;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, minute, 0).unwrap()
    }

    fn tracker(alpha: f64) -> ProgressTracker {
        ProgressTracker::new(Arc::new(InMemoryStore::new()), alpha).unwrap()
    }

    fn record(tracker: &ProgressTracker, user: &str, topic: &str, scores: &[f64]) {
        for (i, &score) in scores.iter().enumerate() {
            let sample = MasterySample::new(user, topic, at(i as u32), score).unwrap();
            tracker.record_mastery_sample(sample).unwrap();
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn ema_fold_matches_recurrence() {
        assert_eq!(ema(Vec::<f64>::new(), 0.5), None);
        assert_eq!(ema([0.3], 0.5), Some(0.3));
        let value = ema([0.2, 0.6, 1.0], 0.5).unwrap();
        assert!(close(value, 0.7));
    }

    #[test]
    fn scenario_a_algebra_curve() {
        let tracker = tracker(0.5);
        record(&tracker, "u1", "algebra", &[0.2, 0.6, 1.0]);

        let curve = tracker.get_learning_curve("u1", "algebra");
        let expected = [0.2, 0.4, 0.7];
        assert_eq!(curve.len(), 3);
        for (i, (point, want)) in curve.iter().zip(expected).enumerate() {
            assert_eq!(point.timestamp, at(i as u32));
            assert!(close(point.mastery, want), "point {i}: {}", point.mastery);
        }
        assert!(close(tracker.compute_topic_mastery("u1", "algebra"), 0.7));
    }

    #[test]
    fn scenario_b_unstudied_topic() {
        let tracker = tracker(0.5);
        assert_eq!(tracker.compute_topic_mastery("u1", "algebra"), 0.0);
        assert!(tracker.get_learning_curve("u1", "algebra").is_empty());
    }

    #[test]
    fn late_arriving_sample_folds_in_log_order() {
        let tracker = tracker(0.3);
        for (minute, score) in [(5, 0.2), (1, 1.0)] {
            let sample = MasterySample::new("u1", "algebra", at(minute), score).unwrap();
            tracker.record_mastery_sample(sample).unwrap();
        }

        // 0.3 * 1.0 + 0.7 * 0.2; timestamp order would give 0.76
        assert!(close(tracker.compute_topic_mastery("u1", "algebra"), 0.44));

        let curve = tracker.get_learning_curve("u1", "algebra");
        let timestamps: Vec<_> = curve.iter().map(|p| p.timestamp).collect();
        assert_eq!(timestamps, vec![at(5), at(1)]);
        assert!(close(curve[0].mastery, 0.2));
        assert!(close(curve[1].mastery, 0.44));

        let by_time = tracker.store().get_samples_by_time("u1", "algebra");
        assert_eq!(by_time[0].timestamp(), at(1));
        assert!(close(tracker.compute_topic_mastery("u1", "algebra"), 0.44));
    }

    #[test]
    fn alpha_one_tracks_latest() {
        let tracker = tracker(1.0);
        record(&tracker, "u1", "t", &[0.1, 0.9, 0.4]);
        assert_eq!(tracker.compute_topic_mastery("u1", "t"), 0.4);
    }

    #[test]
    fn tiny_alpha_stays_near_first() {
        let tracker = tracker(1e-9);
        record(&tracker, "u1", "t", &[0.25, 1.0, 1.0, 0.0, 1.0]);
        assert!((tracker.compute_topic_mastery("u1", "t") - 0.25).abs() < 1e-6);
    }

    #[test]
    fn curve_tail_equals_topic_mastery() {
        let tracker = tracker(0.6);
        let scores = [0.9, 0.1, 0.55, 0.3, 0.8, 0.0];
        record(&tracker, "u1", "t", &scores);

        let curve = tracker.get_learning_curve("u1", "t");
        assert_eq!(curve.len(), scores.len());
        assert_eq!(
            curve.last().unwrap().mastery,
            tracker.compute_topic_mastery("u1", "t")
        );
        for (i, point) in curve.iter().enumerate() {
            let prefix = ema(scores[..=i].iter().copied(), 0.6).unwrap();
            assert_eq!(point.mastery, prefix);
        }
    }

    #[test]
    fn overall_is_mean_of_topics() {
        let tracker = tracker(0.5);
        assert_eq!(tracker.compute_overall_mastery("u1"), 0.0);

        record(&tracker, "u1", "a", &[0.3]);
        record(&tracker, "u1", "b", &[0.8]);
        record(&tracker, "u1", "c", &[0.2, 0.6, 1.0]);
        let overall = tracker.compute_overall_mastery("u1");
        assert!(close(overall, (0.3 + 0.8 + 0.7) / 3.0));

        let summary = tracker.summarize("u1");
        assert_eq!(summary.topics.len(), 3);
        assert_eq!(summary.overall_mastery, overall);
    }

    #[test]
    fn users_are_isolated() {
        let tracker = tracker(0.5);
        record(&tracker, "u1", "a", &[1.0]);
        record(&tracker, "u2", "a", &[0.0]);
        assert_eq!(tracker.compute_topic_mastery("u1", "a"), 1.0);
        assert_eq!(tracker.compute_topic_mastery("u2", "a"), 0.0);
    }

    #[test]
    fn rejects_alpha_outside_range() {
        let store: Arc<dyn MasteryStore> = Arc::new(InMemoryStore::new());
        assert!(ProgressTracker::new(Arc::clone(&store), 0.0).is_err());
        assert!(ProgressTracker::new(Arc::clone(&store), 1.5).is_err());
        assert!(ProgressTracker::new(Arc::clone(&store), f64::NAN).is_err());
        assert!(ProgressTracker::new(store, DEFAULT_ALPHA).is_ok());
    }
}
