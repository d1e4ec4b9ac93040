//! Adaptive policy: difficulty selection and next-step recommendations.
//!
//! Two thresholds split mastery into three bands:
//!
//! | mastery            | band       | level | action           |
//! |--------------------|------------|-------|------------------|
//! | `< low`            | weak       | 2     | `review_basics`  |
//! | `low ..< mid`      | developing | 3     | `practice_quiz`  |
//! | `>= mid`           | strong     | 4     | `challenge_quiz` |
//!
//! Decisions follow the latest computed mastery with no hysteresis.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::EvalError;
use crate::model::{Difficulty, DifficultyLevel};
use crate::storage::MasteryStore;
use crate::tracker::ProgressTracker;

pub const DEFAULT_LOW_THRESHOLD: f64 = 0.4;
pub const DEFAULT_MID_THRESHOLD: f64 = 0.7;

/// Mastery band a topic currently falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MasteryBand {
    Weak,
    Developing,
    Strong,
}

impl MasteryBand {
    pub fn level(self) -> DifficultyLevel {
        match self {
            MasteryBand::Weak => DifficultyLevel::Easy,
            MasteryBand::Developing => DifficultyLevel::Medium,
            MasteryBand::Strong => DifficultyLevel::Hard,
        }
    }

    pub fn action(self) -> ActionType {
        match self {
            MasteryBand::Weak => ActionType::ReviewBasics,
            MasteryBand::Developing => ActionType::PracticeQuiz,
            MasteryBand::Strong => ActionType::ChallengeQuiz,
        }
    }
}

impl fmt::Display for MasteryBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MasteryBand::Weak => write!(f, "weak"),
            MasteryBand::Developing => write!(f, "developing"),
            MasteryBand::Strong => write!(f, "strong"),
        }
    }
}

/// Kind of activity the orchestrator should schedule next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    ReviewBasics,
    PracticeQuiz,
    ChallengeQuiz,
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionType::ReviewBasics => write!(f, "review_basics"),
            ActionType::PracticeQuiz => write!(f, "practice_quiz"),
            ActionType::ChallengeQuiz => write!(f, "challenge_quiz"),
        }
    }
}

/// What to study next and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub next_topic_id: String,
    pub difficulty: Difficulty,
    pub action_type: ActionType,
    pub mastery: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Result of [`AdaptiveEngine::suggest_next_step`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NextStep {
    Recommend(Recommendation),
    /// The user has no recorded samples yet.
    NothingToRecommend,
}

impl NextStep {
    pub fn recommendation(&self) -> Option<&Recommendation> {
        match self {
            NextStep::Recommend(r) => Some(r),
            NextStep::NothingToRecommend => None,
        }
    }
}

/// Band thresholds. Invariant: `0 <= low < mid <= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    low: f64,
    mid: f64,
}

impl Thresholds {
    pub fn new(low: f64, mid: f64) -> Result<Self, EvalError> {
        if !(0.0..=1.0).contains(&low) || !(0.0..=1.0).contains(&mid) || low >= mid {
            return Err(EvalError::InvariantViolation(format!(
                "thresholds must satisfy 0 <= low < mid <= 1, got low={low} mid={mid}"
            )));
        }
        Ok(Self { low, mid })
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn mid(&self) -> f64 {
        self.mid
    }

    pub fn band(&self, mastery: f64) -> MasteryBand {
        if mastery < self.low {
            MasteryBand::Weak
        } else if mastery < self.mid {
            MasteryBand::Developing
        } else {
            MasteryBand::Strong
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            low: DEFAULT_LOW_THRESHOLD,
            mid: DEFAULT_MID_THRESHOLD,
        }
    }
}

/// Turns tracker output into difficulty levels and recommendations.
#[derive(Debug, Clone)]
pub struct AdaptiveEngine {
    tracker: ProgressTracker,
    thresholds: Thresholds,
}

impl AdaptiveEngine {
    pub fn new(tracker: ProgressTracker, thresholds: Thresholds) -> Self {
        Self {
            tracker,
            thresholds,
        }
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    fn store(&self) -> &Arc<dyn MasteryStore> {
        self.tracker.store()
    }

    /// Difficulty for the next quiz on `topic_id`.
    ///
    /// A topic the user has never studied gets [`DifficultyLevel::DEFAULT`]
    /// without computing mastery.
    pub fn get_adaptive_difficulty(&self, user_id: &str, topic_id: &str) -> DifficultyLevel {
        if !self.store().get_topics(user_id).contains(topic_id) {
            return DifficultyLevel::DEFAULT;
        }
        let mastery = self.tracker.compute_topic_mastery(user_id, topic_id);
        self.thresholds.band(mastery).level()
    }

    /// Recommend work on the user's weakest topic.
    ///
    /// Ties on mastery go to the lexicographically smallest topic id.
    pub fn suggest_next_step(&self, user_id: &str) -> NextStep {
        let masteries = self.tracker.topic_masteries(user_id);
        if masteries.is_empty() {
            tracing::debug!(user = user_id, "no topics recorded, nothing to recommend");
        }
        self.recommend(&masteries)
    }

    /// Recommendation for an already-computed set of topic masteries.
    pub fn recommend(&self, masteries: &BTreeMap<String, f64>) -> NextStep {
        // BTreeMap iterates in topic order, and only a strictly lower mastery
        // replaces the current pick.
        let weakest = masteries
            .iter()
            .fold(None::<(&String, f64)>, |best, (topic, &mastery)| match best {
                Some((_, best_mastery)) if best_mastery <= mastery => best,
                _ => Some((topic, mastery)),
            });

        let Some((topic, mastery)) = weakest else {
            return NextStep::NothingToRecommend;
        };

        let band = self.thresholds.band(mastery);
        let reason = match band {
            MasteryBand::Weak => format!(
                "weakest topic; mastery {:.2} is below {:.2}",
                mastery, self.thresholds.low
            ),
            MasteryBand::Developing => format!(
                "weakest topic; mastery {:.2} is between {:.2} and {:.2}",
                mastery, self.thresholds.low, self.thresholds.mid
            ),
            MasteryBand::Strong => format!(
                "all topics strong; mastery {:.2} is at least {:.2}",
                mastery, self.thresholds.mid
            ),
        };

        NextStep::Recommend(Recommendation {
            next_topic_id: topic.clone(),
            difficulty: band.level().label(),
            action_type: band.action(),
            mastery,
            reason: Some(reason),
        })
    }
}
