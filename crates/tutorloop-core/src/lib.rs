//! tutorloop-core: quiz evaluation, mastery tracking and adaptive tutoring.
//!
//! Raw quiz/QA results are normalized by [`adapters`], scored by
//! [`evaluator`] into [`model::MasterySample`]s, appended to a
//! [`storage::MasteryStore`] through [`tracker::ProgressTracker`], and turned
//! into difficulty levels and recommendations by [`adaptive::AdaptiveEngine`].

pub mod adapters;
pub mod adaptive;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod jsonl;
pub mod model;
pub mod payload;
pub mod pipeline;
pub mod snapshot;
pub mod storage;
pub mod tracker;
