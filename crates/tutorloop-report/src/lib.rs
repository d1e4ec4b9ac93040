//! tutorloop-report: HTML and markdown renderings of progress snapshots.

pub mod html;
pub mod markdown;
