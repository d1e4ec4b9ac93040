//! Scoring of adapted quiz/QA results into mastery samples.

use serde::{Deserialize, Serialize};

use crate::error::EvalError;
use crate::model::{MasterySample, QAAdapterOutput, QuizAdapterOutput};

/// Weights used to fuse the quiz and QA signals.
///
/// By convention `quiz_weight + qa_weight ≈ 1`; this is not enforced, but the
/// combined score is always clamped into `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluator {
    pub quiz_weight: f64,
    pub qa_weight: f64,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self {
            quiz_weight: 0.7,
            qa_weight: 0.3,
        }
    }
}

impl Evaluator {
    pub fn new(quiz_weight: f64, qa_weight: f64) -> Self {
        Self {
            quiz_weight,
            qa_weight,
        }
    }

    /// Fraction of correctly answered questions.
    ///
    /// A quiz with no questions is an [`EvalError::EmptyQuiz`]; the adapter is
    /// responsible for never producing one.
    pub fn evaluate_quiz(&self, quiz: &QuizAdapterOutput) -> Result<f64, EvalError> {
        let total = quiz.num_questions();
        if total == 0 {
            return Err(EvalError::EmptyQuiz);
        }
        Ok(quiz.num_correct() as f64 / total as f64)
    }

    /// Score of a graded open-ended answer.
    pub fn evaluate_qa(&self, qa: &QAAdapterOutput) -> f64 {
        qa.correctness.clamp(0.0, 1.0)
    }

    /// Fuse a quiz (and optional QA result) into a [`MasterySample`].
    ///
    /// Identity, timestamp, difficulty and question count are copied from the
    /// quiz. Pure; nothing is written to storage.
    pub fn build_mastery_sample(
        &self,
        quiz: &QuizAdapterOutput,
        qa: Option<&QAAdapterOutput>,
    ) -> Result<MasterySample, EvalError> {
        let quiz_score = self.evaluate_quiz(quiz)?;
        let score = match qa {
            Some(qa) => self.quiz_weight * quiz_score + self.qa_weight * self.evaluate_qa(qa),
            None => quiz_score,
        };
        if !score.is_finite() {
            return Err(EvalError::InvariantViolation(format!(
                "combined score is not finite (weights {} / {})",
                self.quiz_weight, self.qa_weight
            )));
        }

        let num_questions = u32::try_from(quiz.num_questions()).map_err(|_| {
            EvalError::InvariantViolation("question count does not fit in u32".into())
        })?;

        Ok(MasterySample::new(
            quiz.user_id.clone(),
            quiz.topic_id.clone(),
            quiz.timestamp,
            score.clamp(0.0, 1.0),
        )?
        .with_num_questions(num_questions)
        .with_difficulty(quiz.difficulty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Difficulty, QuestionOutcome};
    use chrono::{TimeZone, Utc};

    fn quiz(correct: usize, total: usize) -> QuizAdapterOutput {
        QuizAdapterOutput {
            user_id: "u1".into(),
            topic_id: "topicA".into(),
            timestamp: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            difficulty: Difficulty::Hard,
            outcomes: (0..total).map(|i| QuestionOutcome::from_flag(i < correct)).collect(),
        }
    }

    fn qa(correctness: f64) -> QAAdapterOutput {
        QAAdapterOutput {
            user_id: "u1".into(),
            topic_id: "topicA".into(),
            timestamp: Utc.with_ymd_and_hms(2025, 1, 1, 0, 5, 0).unwrap(),
            question: String::new(),
            answer: String::new(),
            correctness,
        }
    }

    #[test]
    fn quiz_score_is_exact_fraction() {
        let evaluator = Evaluator::default();
        for (k, n) in [(0, 5), (5, 5), (3, 5), (1, 3), (7, 9)] {
            let score = evaluator.evaluate_quiz(&quiz(k, n)).unwrap();
            assert_eq!(score, k as f64 / n as f64);
        }
    }

    #[test]
    fn empty_quiz_is_invariant_violation() {
        let err = Evaluator::default().evaluate_quiz(&quiz(0, 0)).unwrap_err();
        assert_eq!(err, EvalError::EmptyQuiz);
        assert!(Evaluator::default().build_mastery_sample(&quiz(0, 0), None).is_err());
    }

    #[test]
    fn sample_without_qa_uses_quiz_score() {
        let sample = Evaluator::default().build_mastery_sample(&quiz(3, 4), None).unwrap();
        assert_eq!(sample.score(), 0.75);
        assert_eq!(sample.user_id(), "u1");
        assert_eq!(sample.topic_id(), "topicA");
        assert_eq!(sample.num_questions(), Some(4));
        assert_eq!(sample.difficulty(), Some(Difficulty::Hard));
    }

    #[test]
    fn sample_with_qa_is_weighted() {
        let evaluator = Evaluator::new(0.5, 0.5);
        let with_qa = evaluator.build_mastery_sample(&quiz(3, 5), Some(&qa(0.9))).unwrap();
        let without = evaluator.build_mastery_sample(&quiz(3, 5), None).unwrap();
        assert!((with_qa.score() - 0.75).abs() < 1e-12);
        assert!(with_qa.score() >= without.score());
    }

    #[test]
    fn combined_score_is_clamped() {
        let evaluator = Evaluator::new(1.0, 1.0);
        let sample = evaluator.build_mastery_sample(&quiz(5, 5), Some(&qa(1.0))).unwrap();
        assert_eq!(sample.score(), 1.0);

        let evaluator = Evaluator::new(1.0, -2.0);
        let sample = evaluator.build_mastery_sample(&quiz(1, 5), Some(&qa(1.0))).unwrap();
        assert_eq!(sample.score(), 0.0);
    }
}
