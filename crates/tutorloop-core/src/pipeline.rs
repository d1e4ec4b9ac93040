//! Submission pipeline: adapt → evaluate → record → recompute.
//!
//! Wires the adapters, [`Evaluator`], [`ProgressTracker`] and
//! [`AdaptiveEngine`] together over one shared store. Each submission runs to
//! completion before returning; a failed adaptation or evaluation records
//! nothing. Submissions through one pipeline (and its clones) are
//! serialized, so the mastery reported for a submission always includes it.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::adapters::{adapt_qa_result, adapt_quiz_result};
use crate::adaptive::{AdaptiveEngine, NextStep, Thresholds};
use crate::config::TutorConfig;
use crate::error::{AdapterError, EvalError, TutorError};
use crate::evaluator::Evaluator;
use crate::model::{DifficultyLevel, MasterySample, QAAdapterOutput, QuizAdapterOutput};
use crate::storage::MasteryStore;
use crate::tracker::{ProgressSummary, ProgressTracker};

/// What a recorded submission produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    /// The sample appended to the log.
    pub sample: MasterySample,
    /// Raw quiz accuracy, before any QA fusion.
    pub quiz_score: f64,
    /// Smoothed topic mastery after this submission.
    pub topic_mastery: f64,
    /// Difficulty to use for the next quiz on this topic.
    pub next_difficulty: DifficultyLevel,
}

#[derive(Debug, Clone)]
pub struct TutorPipeline {
    evaluator: Evaluator,
    tracker: ProgressTracker,
    engine: AdaptiveEngine,
    // Held from append until the outcome is computed; shared by clones.
    submit_lock: Arc<Mutex<()>>,
}

impl TutorPipeline {
    pub fn new(evaluator: Evaluator, tracker: ProgressTracker, thresholds: Thresholds) -> Self {
        let engine = AdaptiveEngine::new(tracker.clone(), thresholds);
        Self {
            evaluator,
            tracker,
            engine,
            submit_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Build a pipeline over `store` using the weights, alpha and thresholds
    /// from `config`.
    pub fn from_config(store: Arc<dyn MasteryStore>, config: &TutorConfig) -> Result<Self, EvalError> {
        let tracker = ProgressTracker::new(store, config.alpha)?;
        let thresholds = Thresholds::new(config.low_threshold, config.mid_threshold)?;
        let evaluator = Evaluator::new(config.quiz_weight, config.qa_weight);
        Ok(Self::new(evaluator, tracker, thresholds))
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    pub fn engine(&self) -> &AdaptiveEngine {
        &self.engine
    }

    /// Adapt, score and record a raw quiz result with an optional raw QA
    /// result.
    pub fn submit(
        &self,
        raw_quiz: &Value,
        raw_qa: Option<&Value>,
    ) -> Result<SubmissionOutcome, TutorError> {
        let quiz = adapt_quiz_result(raw_quiz)?;
        let qa = adapt_qa_result(raw_qa)?;
        self.submit_adapted(&quiz, qa.as_ref())
    }

    /// Score and record already-adapted results.
    pub fn submit_adapted(
        &self,
        quiz: &QuizAdapterOutput,
        qa: Option<&QAAdapterOutput>,
    ) -> Result<SubmissionOutcome, TutorError> {
        if let Some(qa) = qa {
            if qa.user_id != quiz.user_id {
                return Err(AdapterError::Malformed {
                    field: "qa.user_id".into(),
                    reason: format!("{:?} does not match quiz user {:?}", qa.user_id, quiz.user_id),
                }
                .into());
            }
            if qa.topic_id != quiz.topic_id {
                return Err(AdapterError::Malformed {
                    field: "qa.topic_id".into(),
                    reason: format!("{:?} does not match quiz topic {:?}", qa.topic_id, quiz.topic_id),
                }
                .into());
            }
        }

        let quiz_score = self.evaluator.evaluate_quiz(quiz)?;
        let sample = self.evaluator.build_mastery_sample(quiz, qa)?;

        let topic_mastery = {
            let _guard = self
                .submit_lock
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            self.tracker.record_mastery_sample(sample.clone())?;
            self.tracker
                .compute_topic_mastery(&quiz.user_id, &quiz.topic_id)
        };
        // The topic now has at least one sample, so its level follows the band.
        let next_difficulty = self.engine.thresholds().band(topic_mastery).level();

        tracing::info!(
            user = %quiz.user_id,
            topic = %quiz.topic_id,
            score = sample.score(),
            topic_mastery,
            next_difficulty = next_difficulty.as_u8(),
            "recorded submission"
        );

        Ok(SubmissionOutcome {
            sample,
            quiz_score,
            topic_mastery,
            next_difficulty,
        })
    }

    pub fn progress(&self, user_id: &str) -> ProgressSummary {
        self.tracker.summarize(user_id)
    }

    pub fn next_step(&self, user_id: &str) -> NextStep {
        self.engine.suggest_next_step(user_id)
    }
}
