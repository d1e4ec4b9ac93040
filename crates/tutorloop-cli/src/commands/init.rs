//! The `tutorloop init` command.

use std::path::Path;

use anyhow::Result;
use serde_json::json;

use tutorloop_core::config::TutorConfig;

pub fn execute() -> Result<()> {
    // Create tutorloop.toml
    if Path::new("tutorloop.toml").exists() {
        println!("tutorloop.toml already exists, skipping.");
    } else {
        let body = toml::to_string_pretty(&TutorConfig::default())?;
        std::fs::write("tutorloop.toml", format!("{CONFIG_HEADER}{body}"))?;
        println!("Created tutorloop.toml");
    }

    // Create example quiz result
    std::fs::create_dir_all("quizzes")?;
    let example_path = Path::new("quizzes/example.json");
    if example_path.exists() {
        println!("quizzes/example.json already exists, skipping.");
    } else {
        std::fs::write(example_path, serde_json::to_string_pretty(&example_quiz())?)?;
        println!("Created quizzes/example.json");
    }

    println!("\nNext steps:");
    println!("  1. Run: tutorloop validate --quiz quizzes/example.json");
    println!("  2. Run: tutorloop record --quiz quizzes/example.json");
    println!("  3. Run: tutorloop progress --user student-1");

    Ok(())
}

fn example_quiz() -> serde_json::Value {
    json!({
        "user_id": "student-1",
        "topic_id": "fractions",
        "timestamp": chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
        "difficulty": "medium",
        "questions": [
            { "question_id": "q1", "is_correct": true, "concept_tags": ["equivalence"] },
            { "question_id": "q2", "is_correct": true, "concept_tags": ["addition"] },
            { "question_id": "q3", "is_correct": false, "concept_tags": ["addition"] },
            { "question_id": "q4", "is_correct": true, "concept_tags": ["simplification"] }
        ]
    })
}

const CONFIG_HEADER: &str = "# tutorloop configuration
#
# alpha: EMA smoothing in (0, 1]; higher favours recent quizzes.
# low_threshold / mid_threshold: mastery bands for easy / medium / hard.
# store_path may reference environment variables, e.g. \"${HOME}/tutorloop/samples.jsonl\".

";
