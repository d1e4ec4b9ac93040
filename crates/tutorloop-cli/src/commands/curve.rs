//! The `tutorloop curve` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use super::{percent, Session};
use crate::GlobalArgs;

pub fn execute(global: &GlobalArgs, topic: &str) -> Result<()> {
    let session = Session::open(global)?;
    let curve = session
        .pipeline
        .tracker()
        .get_learning_curve(&session.user, topic);

    if curve.is_empty() {
        println!("No quizzes recorded for {} / {}.", session.user, topic);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "Timestamp", "Mastery"]);
    for (i, point) in curve.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(point.timestamp.format("%Y-%m-%d %H:%M:%S")),
            Cell::new(percent(point.mastery)),
        ]);
    }

    println!("{table}");
    Ok(())
}
