//! tutorloop CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "tutorloop",
    version,
    about = "Quiz mastery tracker and adaptive tutor"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every subcommand.
#[derive(Args, Clone, Debug)]
struct GlobalArgs {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// User id (defaults to `default_user` from the config)
    #[arg(long, global = true)]
    user: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a quiz result (and optional QA result) and record it
    Record {
        /// Quiz result JSON file
        #[arg(long)]
        quiz: PathBuf,

        /// Graded QA result JSON file
        #[arg(long)]
        qa: Option<PathBuf>,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show overall and per-topic mastery
    Progress {
        /// Show a single topic
        #[arg(long)]
        topic: Option<String>,
    },

    /// Show the learning curve of a topic
    Curve {
        #[arg(long)]
        topic: String,
    },

    /// List recorded samples for a topic
    History {
        #[arg(long)]
        topic: String,

        /// Order by timestamp instead of insertion order
        #[arg(long)]
        by_time: bool,
    },

    /// Print the difficulty level for the next quiz on a topic
    Difficulty {
        #[arg(long)]
        topic: String,
    },

    /// Recommend what to study next
    Next {
        /// Print the recommendation as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate quiz result JSON files
    Validate {
        /// Path to a quiz file or directory
        #[arg(long)]
        quiz: PathBuf,
    },

    /// Save a progress snapshot
    Snapshot {
        /// Snapshot JSON output path
        #[arg(long)]
        output: PathBuf,

        /// Also write an HTML report
        #[arg(long)]
        html: Option<PathBuf>,

        /// Print a markdown summary
        #[arg(long)]
        markdown: bool,
    },

    /// Compare two progress snapshots
    Compare {
        /// Baseline snapshot JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current snapshot JSON
        #[arg(long)]
        current: PathBuf,

        /// Mastery change treated as noise
        #[arg(long, default_value = "0.05")]
        threshold: f64,

        /// Exit code 1 if any topic regressed
        #[arg(long)]
        fail_on_regression: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Create a starter config and example quiz
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tutorloop=info")),
        )
        .init();

    let cli = Cli::parse();
    let global = cli.global;

    let result = match cli.command {
        Commands::Record { quiz, qa, json } => commands::record::execute(&global, quiz, qa, json),
        Commands::Progress { topic } => commands::progress::execute(&global, topic),
        Commands::Curve { topic } => commands::curve::execute(&global, &topic),
        Commands::History { topic, by_time } => commands::history::execute(&global, &topic, by_time),
        Commands::Difficulty { topic } => commands::difficulty::execute(&global, &topic),
        Commands::Next { json } => commands::next::execute(&global, json),
        Commands::Validate { quiz } => commands::validate::execute(quiz),
        Commands::Snapshot {
            output,
            html,
            markdown,
        } => commands::snapshot::execute(&global, output, html, markdown),
        Commands::Compare {
            baseline,
            current,
            threshold,
            fail_on_regression,
            format,
        } => commands::compare::execute(baseline, current, threshold, fail_on_regression, format),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
