//! Canonical data model for tutorloop.
//!
//! Every producer's output is normalized into these types by
//! [`crate::adapters`] before it reaches the evaluator, the tracker or the
//! adaptive engine.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EvalError;

/// Difficulty label attached to a quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Position of this label on the integer difficulty scale.
    pub fn level(self) -> DifficultyLevel {
        match self {
            Difficulty::Easy => DifficultyLevel::Easy,
            Difficulty::Medium => DifficultyLevel::Medium,
            Difficulty::Hard => DifficultyLevel::Hard,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// Integer difficulty scale consumed by the question generator.
///
/// The scale has five levels, but the adaptive engine only ever produces
/// `Easy`, `Medium` and `Hard`. The extremes exist for callers that want
/// to request them explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum DifficultyLevel {
    VeryEasy = 1,
    Easy = 2,
    Medium = 3,
    Hard = 4,
    VeryHard = 5,
}

impl DifficultyLevel {
    /// Level used when a topic has never been studied.
    pub const DEFAULT: DifficultyLevel = DifficultyLevel::Medium;

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Collapse the five-level scale onto the three quiz labels.
    pub fn label(self) -> Difficulty {
        match self {
            DifficultyLevel::VeryEasy | DifficultyLevel::Easy => Difficulty::Easy,
            DifficultyLevel::Medium => Difficulty::Medium,
            DifficultyLevel::Hard | DifficultyLevel::VeryHard => Difficulty::Hard,
        }
    }
}

impl Default for DifficultyLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<DifficultyLevel> for u8 {
    fn from(level: DifficultyLevel) -> Self {
        level.as_u8()
    }
}

impl TryFrom<u8> for DifficultyLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(DifficultyLevel::VeryEasy),
            2 => Ok(DifficultyLevel::Easy),
            3 => Ok(DifficultyLevel::Medium),
            4 => Ok(DifficultyLevel::Hard),
            5 => Ok(DifficultyLevel::VeryHard),
            other => Err(format!("difficulty level out of range 1..=5: {other}")),
        }
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Parse a producer timestamp.
///
/// Accepts RFC 3339 as well as the naive `YYYY-MM-DDTHH:MM:SS[.fff]` form and a
/// bare date; naive values are taken to be UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// One scored learning event for a (user, topic) pair.
///
/// Samples are immutable: fields are private and only readable through
/// accessors, and [`MasterySample::new`] rejects scores outside `[0, 1]`.
/// Deserialization goes through the same validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SampleRecord")]
pub struct MasterySample {
    user_id: String,
    topic_id: String,
    timestamp: DateTime<Utc>,
    score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_questions: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    difficulty: Option<Difficulty>,
}

impl MasterySample {
    pub fn new(
        user_id: impl Into<String>,
        topic_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        score: f64,
    ) -> Result<Self, EvalError> {
        let user_id = user_id.into();
        let topic_id = topic_id.into();
        if user_id.trim().is_empty() {
            return Err(EvalError::InvariantViolation("user_id is empty".into()));
        }
        if topic_id.trim().is_empty() {
            return Err(EvalError::InvariantViolation("topic_id is empty".into()));
        }
        if !(0.0..=1.0).contains(&score) {
            return Err(EvalError::InvariantViolation(format!(
                "score {score} is outside [0, 1]"
            )));
        }
        Ok(Self {
            user_id,
            topic_id,
            timestamp,
            score,
            num_questions: None,
            difficulty: None,
        })
    }

    /// Attach the number of questions the score was derived from.
    pub fn with_num_questions(mut self, num_questions: u32) -> Self {
        self.num_questions = Some(num_questions);
        self
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn topic_id(&self) -> &str {
        &self.topic_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Observed mastery in `[0, 1]`.
    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn num_questions(&self) -> Option<u32> {
        self.num_questions
    }

    pub fn difficulty(&self) -> Option<Difficulty> {
        self.difficulty
    }
}

/// Wire shape of a persisted sample, validated into [`MasterySample`].
#[derive(Deserialize)]
struct SampleRecord {
    user_id: String,
    topic_id: String,
    timestamp: DateTime<Utc>,
    #[serde(alias = "mastery_observation")]
    score: f64,
    #[serde(default)]
    num_questions: Option<u32>,
    #[serde(default)]
    difficulty: Option<Difficulty>,
}

impl TryFrom<SampleRecord> for MasterySample {
    type Error = EvalError;

    fn try_from(r: SampleRecord) -> Result<Self, Self::Error> {
        let mut sample = MasterySample::new(r.user_id, r.topic_id, r.timestamp, r.score)?;
        sample.num_questions = r.num_questions;
        sample.difficulty = r.difficulty;
        Ok(sample)
    }
}

/// Outcome of a single quiz question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub is_correct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub concept_tags: Vec<String>,
}

impl QuestionOutcome {
    pub fn correct() -> Self {
        Self::from_flag(true)
    }

    pub fn incorrect() -> Self {
        Self::from_flag(false)
    }

    pub fn from_flag(is_correct: bool) -> Self {
        Self {
            is_correct,
            question_id: None,
            concept_tags: Vec::new(),
        }
    }
}

/// Normalized quiz attempt, as produced by [`crate::adapters::adapt_quiz_result`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizAdapterOutput {
    pub user_id: String,
    pub topic_id: String,
    pub timestamp: DateTime<Utc>,
    pub difficulty: Difficulty,
    /// Per-question outcomes in the order they were asked.
    pub outcomes: Vec<QuestionOutcome>,
}

impl QuizAdapterOutput {
    pub fn num_questions(&self) -> usize {
        self.outcomes.len()
    }

    pub fn num_correct(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_correct).count()
    }
}

/// Normalized, graded open-ended answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QAAdapterOutput {
    pub user_id: String,
    pub topic_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
    /// Grader's correctness estimate in `[0, 1]`.
    pub correctness: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn difficulty_display_and_parse() {
        assert_eq!(Difficulty::Medium.to_string(), "medium");
        assert_eq!("HARD".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert_eq!(" easy ".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert!("extreme".parse::<Difficulty>().is_err());
    }

    #[test]
    fn level_label_conversion() {
        assert_eq!(DifficultyLevel::VeryEasy.label(), Difficulty::Easy);
        assert_eq!(DifficultyLevel::Easy.label(), Difficulty::Easy);
        assert_eq!(DifficultyLevel::Medium.label(), Difficulty::Medium);
        assert_eq!(DifficultyLevel::Hard.label(), Difficulty::Hard);
        assert_eq!(DifficultyLevel::VeryHard.label(), Difficulty::Hard);
        assert_eq!(Difficulty::Hard.level().as_u8(), 4);
        assert_eq!(DifficultyLevel::default().as_u8(), 3);
        assert!(DifficultyLevel::try_from(0).is_err());
        assert!(DifficultyLevel::try_from(6).is_err());
    }

    #[test]
    fn level_serializes_as_integer() {
        let json = serde_json::to_string(&DifficultyLevel::Hard).unwrap();
        assert_eq!(json, "4");
        let level: DifficultyLevel = serde_json::from_str("2").unwrap();
        assert_eq!(level, DifficultyLevel::Easy);
    }

    #[test]
    fn parse_timestamp_formats() {
        assert_eq!(parse_timestamp("2025-01-01T00:00:00Z"), Some(ts()));
        assert_eq!(parse_timestamp("2025-01-01T02:00:00+02:00"), Some(ts()));
        assert_eq!(parse_timestamp("2025-01-01T00:00:00"), Some(ts()));
        assert_eq!(parse_timestamp("2025-01-01T00:00:00.000000"), Some(ts()));
        assert_eq!(parse_timestamp("2025-01-01"), Some(ts()));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn sample_rejects_out_of_range_score() {
        assert!(MasterySample::new("u1", "algebra", ts(), 1.01).is_err());
        assert!(MasterySample::new("u1", "algebra", ts(), -0.1).is_err());
        assert!(MasterySample::new("u1", "algebra", ts(), f64::NAN).is_err());
        assert!(MasterySample::new("u1", "algebra", ts(), 0.0).is_ok());
        assert!(MasterySample::new("u1", "algebra", ts(), 1.0).is_ok());
    }

    #[test]
    fn sample_rejects_empty_ids() {
        assert!(matches!(
            MasterySample::new("", "algebra", ts(), 0.5),
            Err(EvalError::InvariantViolation(_))
        ));
        assert!(MasterySample::new("u1", "  ", ts(), 0.5).is_err());
    }

    #[test]
    fn sample_deserialization_is_validated() {
        let good = r#"{"user_id":"u1","topic_id":"t","timestamp":"2025-01-01T00:00:00Z","mastery_observation":0.4,"difficulty":"easy"}"#;
        let sample: MasterySample = serde_json::from_str(good).unwrap();
        assert_eq!(sample.score(), 0.4);
        assert_eq!(sample.difficulty(), Some(Difficulty::Easy));
        assert_eq!(sample.num_questions(), None);

        let bad = r#"{"user_id":"u1","topic_id":"t","timestamp":"2025-01-01T00:00:00Z","score":3.0}"#;
        assert!(serde_json::from_str::<MasterySample>(bad).is_err());
    }

    #[test]
    fn quiz_counts() {
        let quiz = QuizAdapterOutput {
            user_id: "u1".into(),
            topic_id: "algebra".into(),
            timestamp: ts(),
            difficulty: Difficulty::Medium,
            outcomes: vec![
                QuestionOutcome::correct(),
                QuestionOutcome::incorrect(),
                QuestionOutcome::correct(),
            ],
        };
        assert_eq!(quiz.num_questions(), 3);
        assert_eq!(quiz.num_correct(), 2);
    }
}
