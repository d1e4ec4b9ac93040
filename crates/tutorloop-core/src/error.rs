//! Error types for the evaluation pipeline.
//!
//! Adapter failures and evaluator invariant violations are kept as separate
//! enums so callers can tell a bad upstream payload apart from a programming
//! error. [`TutorError`] unifies them for the submission pipeline.

use thiserror::Error;

/// A raw quiz/QA payload could not be translated into a canonical record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdapterError {
    /// A required field is missing or has the wrong shape.
    #[error("malformed input: field `{field}` {reason}")]
    Malformed { field: String, reason: String },
}

impl AdapterError {
    pub(crate) fn malformed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AdapterError::Malformed {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            AdapterError::Malformed { field, .. } => field,
        }
    }
}

/// Conditions that should never occur in a correctly wired pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// A quiz with zero questions reached the evaluator.
    #[error("quiz has no questions; empty submissions must be rejected by the adapter")]
    EmptyQuiz,

    /// A canonical value was constructed outside its valid domain.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

/// Failures of a durable mastery store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted record could not be decoded.
    #[error("corrupt record at line {line}: {message}")]
    Corrupt { line: usize, message: String },

    /// A record could not be encoded for persistence.
    #[error("failed to encode sample: {0}")]
    Encode(String),
}

/// Any failure surfaced by [`crate::pipeline::TutorPipeline`].
#[derive(Debug, Error)]
pub enum TutorError {
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TutorError {
    /// Returns `true` if the failure was caused by the caller's payload
    /// rather than by the pipeline itself.
    pub fn is_input_error(&self) -> bool {
        matches!(self, TutorError::Adapter(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_message_names_field() {
        let err = AdapterError::malformed("questions", "must not be empty");
        assert_eq!(err.field(), "questions");
        assert_eq!(
            err.to_string(),
            "malformed input: field `questions` must not be empty"
        );
    }

    #[test]
    fn tutor_error_classification() {
        let input: TutorError = AdapterError::malformed("user_id", "is missing").into();
        assert!(input.is_input_error());

        let fatal: TutorError = EvalError::EmptyQuiz.into();
        assert!(!fatal.is_input_error());
    }
}
