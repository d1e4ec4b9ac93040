//! Result adapters.
//!
//! The only code that knows the upstream producer's quiz/QA payload shape.
//! When the question generator changes its output format, this module is
//! the single place that changes; the evaluator only ever sees
//! [`QuizAdapterOutput`] and [`QAAdapterOutput`].
//!
//! Expected quiz payload:
//!
//! ```json
//! {
//!   "user_id": "u1",
//!   "topic_id": "algebra",
//!   "timestamp": "2025-01-01T00:00:00",
//!   "difficulty": "medium",
//!   "questions": [{"is_correct": true}, {"is_correct": false}]
//! }
//! ```
//!
//! `user_id` may also be given as `{"user": {"id": "u1"}}`, and `difficulty`
//! may be an integer on the 1-5 scale.

use serde::Deserialize;
use serde_json::Value;

use crate::error::AdapterError;
use crate::model::{
    parse_timestamp, Difficulty, DifficultyLevel, QAAdapterOutput, QuestionOutcome,
    QuizAdapterOutput,
};

#[derive(Debug, Deserialize)]
struct RawQuiz {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    user: Option<RawUser>,
    #[serde(default)]
    topic_id: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    difficulty: Option<Value>,
    #[serde(default)]
    questions: Option<Vec<RawQuestion>>,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    #[serde(default)]
    is_correct: Option<bool>,
    #[serde(default)]
    question_id: Option<String>,
    #[serde(default)]
    concept_tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawQa {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    topic_id: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    answer: Option<String>,
    #[serde(default, alias = "llm_score")]
    correctness: Option<f64>,
}

/// Translate a raw quiz payload into a [`QuizAdapterOutput`].
///
/// Fails with [`AdapterError::Malformed`] when `user_id`, `topic_id`,
/// `timestamp` or `difficulty` is missing or mistyped, when `questions` is
/// missing or empty, or when any question lacks a boolean `is_correct`.
pub fn adapt_quiz_result(raw: &Value) -> Result<QuizAdapterOutput, AdapterError> {
    if !raw.is_object() {
        return Err(AdapterError::malformed("quiz", "must be a JSON object"));
    }
    let quiz = RawQuiz::deserialize(raw)
        .map_err(|e| AdapterError::malformed("quiz", format!("has an invalid shape: {e}")))?;

    let user_id = quiz
        .user_id
        .or_else(|| quiz.user.and_then(|u| u.id))
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AdapterError::malformed("user_id", "is missing"))?;
    let topic_id = non_empty(quiz.topic_id, "topic_id")?;
    let timestamp = required_timestamp(quiz.timestamp)?;
    let difficulty = quiz
        .difficulty
        .as_ref()
        .ok_or_else(|| AdapterError::malformed("difficulty", "is missing"))
        .and_then(parse_difficulty)?;

    let questions = quiz
        .questions
        .ok_or_else(|| AdapterError::malformed("questions", "is missing"))?;
    if questions.is_empty() {
        return Err(AdapterError::malformed("questions", "must not be empty"));
    }

    let outcomes = questions
        .into_iter()
        .enumerate()
        .map(|(i, q)| {
            let is_correct = q.is_correct.ok_or_else(|| {
                AdapterError::malformed(format!("questions[{i}].is_correct"), "is missing")
            })?;
            Ok(QuestionOutcome {
                is_correct,
                question_id: q.question_id,
                concept_tags: q.concept_tags,
            })
        })
        .collect::<Result<Vec<_>, AdapterError>>()?;

    Ok(QuizAdapterOutput {
        user_id,
        topic_id,
        timestamp,
        difficulty,
        outcomes,
    })
}

/// Translate an optional raw QA payload into a [`QAAdapterOutput`].
///
/// QA grading is optional, so an absent payload (or JSON `null`) yields
/// `Ok(None)`. A payload that is present but incomplete is rejected.
/// `correctness` (also accepted as `llm_score`) is clamped into `[0, 1]`.
pub fn adapt_qa_result(raw: Option<&Value>) -> Result<Option<QAAdapterOutput>, AdapterError> {
    let raw = match raw {
        None | Some(Value::Null) => return Ok(None),
        Some(v) => v,
    };
    if !raw.is_object() {
        return Err(AdapterError::malformed("qa", "must be a JSON object"));
    }
    let qa = RawQa::deserialize(raw)
        .map_err(|e| AdapterError::malformed("qa", format!("has an invalid shape: {e}")))?;

    let user_id = non_empty(qa.user_id, "user_id")?;
    let topic_id = non_empty(qa.topic_id, "topic_id")?;
    let timestamp = required_timestamp(qa.timestamp)?;
    let correctness = qa
        .correctness
        .ok_or_else(|| AdapterError::malformed("correctness", "is missing"))?;
    if !correctness.is_finite() {
        return Err(AdapterError::malformed("correctness", "must be a finite number"));
    }

    Ok(Some(QAAdapterOutput {
        user_id,
        topic_id,
        timestamp,
        question: qa.question.unwrap_or_default(),
        answer: qa.answer.unwrap_or_default(),
        correctness: correctness.clamp(0.0, 1.0),
    }))
}

/// Grade multiple-choice answers against an answer key.
///
/// Letters are compared case-insensitively after trimming and must be one of
/// `A`-`D`. The two slices must have the same length.
pub fn grade_choices<A, K>(answers: &[A], key: &[K]) -> Result<Vec<QuestionOutcome>, AdapterError>
where
    A: AsRef<str>,
    K: AsRef<str>,
{
    if answers.len() != key.len() {
        return Err(AdapterError::malformed(
            "answers",
            format!("expected {} answers, got {}", key.len(), answers.len()),
        ));
    }

    answers
        .iter()
        .zip(key)
        .enumerate()
        .map(|(i, (given, expected))| {
            let given = choice_letter(given.as_ref())
                .ok_or_else(|| AdapterError::malformed(format!("answers[{i}]"), "must be A, B, C or D"))?;
            let expected = choice_letter(expected.as_ref())
                .ok_or_else(|| AdapterError::malformed(format!("key[{i}]"), "must be A, B, C or D"))?;
            Ok(QuestionOutcome {
                is_correct: given == expected,
                question_id: Some(format!("q{}", i + 1)),
                concept_tags: Vec::new(),
            })
        })
        .collect()
}

fn choice_letter(s: &str) -> Option<char> {
    let s = s.trim().to_ascii_uppercase();
    match s.as_str() {
        "A" | "B" | "C" | "D" => s.chars().next(),
        _ => None,
    }
}

fn non_empty(value: Option<String>, field: &str) -> Result<String, AdapterError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        Some(_) => Err(AdapterError::malformed(field, "must not be empty")),
        None => Err(AdapterError::malformed(field, "is missing")),
    }
}

fn required_timestamp(value: Option<String>) -> Result<chrono::DateTime<chrono::Utc>, AdapterError> {
    let raw = value.ok_or_else(|| AdapterError::malformed("timestamp", "is missing"))?;
    parse_timestamp(&raw).ok_or_else(|| {
        AdapterError::malformed("timestamp", format!("is not an ISO-8601 timestamp: {raw:?}"))
    })
}

fn parse_difficulty(value: &Value) -> Result<Difficulty, AdapterError> {
    match value {
        Value::String(s) => s
            .parse()
            .map_err(|e: String| AdapterError::malformed("difficulty", e)),
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u8::try_from(n).ok())
            .and_then(|n| DifficultyLevel::try_from(n).ok())
            .map(DifficultyLevel::label)
            .ok_or_else(|| AdapterError::malformed("difficulty", format!("level {n} is not in 1..=5"))),
        _ => Err(AdapterError::malformed(
            "difficulty",
            "must be \"easy\", \"medium\", \"hard\" or a level 1-5",
        )),
    }
}
