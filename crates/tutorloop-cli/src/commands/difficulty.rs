//! The `tutorloop difficulty` command.

use anyhow::Result;

use super::Session;
use crate::GlobalArgs;

pub fn execute(global: &GlobalArgs, topic: &str) -> Result<()> {
    let session = Session::open(global)?;
    let level = session
        .pipeline
        .engine()
        .get_adaptive_difficulty(&session.user, topic);
    println!("{} ({})", level, level.label());
    Ok(())
}
