//! Configuration loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::adaptive::{DEFAULT_LOW_THRESHOLD, DEFAULT_MID_THRESHOLD};
use crate::tracker::DEFAULT_ALPHA;

/// Top-level tutorloop configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorConfig {
    /// EMA smoothing coefficient in `(0, 1]`; higher favours recent quizzes.
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    /// Weight of the quiz score when a QA result is present.
    #[serde(default = "default_quiz_weight")]
    pub quiz_weight: f64,
    /// Weight of the QA score when a QA result is present.
    #[serde(default = "default_qa_weight")]
    pub qa_weight: f64,
    /// Mastery below this is "weak".
    #[serde(default = "default_low_threshold")]
    pub low_threshold: f64,
    /// Mastery at or above this is "strong".
    #[serde(default = "default_mid_threshold")]
    pub mid_threshold: f64,
    /// JSON-lines file holding the sample log.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    /// User id used when none is given on the command line.
    #[serde(default = "default_user")]
    pub default_user: String,
}

fn default_alpha() -> f64 {
    DEFAULT_ALPHA
}
fn default_quiz_weight() -> f64 {
    0.7
}
fn default_qa_weight() -> f64 {
    0.3
}
fn default_low_threshold() -> f64 {
    DEFAULT_LOW_THRESHOLD
}
fn default_mid_threshold() -> f64 {
    DEFAULT_MID_THRESHOLD
}
fn default_store_path() -> PathBuf {
    PathBuf::from("./tutorloop-data/samples.jsonl")
}
fn default_user() -> String {
    "default".to_string()
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            quiz_weight: default_quiz_weight(),
            qa_weight: default_qa_weight(),
            low_threshold: default_low_threshold(),
            mid_threshold: default_mid_threshold(),
            store_path: default_store_path(),
            default_user: default_user(),
        }
    }
}

impl TutorConfig {
    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.alpha > 0.0 && self.alpha <= 1.0,
            "alpha must be in (0, 1], got {}",
            self.alpha
        );
        anyhow::ensure!(
            self.quiz_weight >= 0.0 && self.qa_weight >= 0.0,
            "weights must be non-negative, got quiz={} qa={}",
            self.quiz_weight,
            self.qa_weight
        );
        if (self.quiz_weight + self.qa_weight - 1.0).abs() > 0.01 {
            tracing::warn!(
                quiz_weight = self.quiz_weight,
                qa_weight = self.qa_weight,
                "quiz and QA weights do not sum to 1; combined scores will be clamped"
            );
        }
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.low_threshold)
                && (0.0..=1.0).contains(&self.mid_threshold)
                && self.low_threshold < self.mid_threshold,
            "thresholds must satisfy 0 <= low < mid <= 1, got low={} mid={}",
            self.low_threshold,
            self.mid_threshold
        );
        anyhow::ensure!(
            !self.default_user.trim().is_empty(),
            "default_user must not be empty"
        );
        Ok(())
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `tutorloop.toml` in the current directory
/// 2. `~/.config/tutorloop/config.toml`
///
/// Environment variable overrides: `TUTORLOOP_ALPHA`, `TUTORLOOP_STORE`,
/// `TUTORLOOP_USER`.
pub fn load_config() -> Result<TutorConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<TutorConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("tutorloop.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<TutorConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config");
            config
        }
        None => TutorConfig::default(),
    };

    apply_env_overrides(&mut config)?;
    config.store_path = PathBuf::from(resolve_env_vars(&config.store_path.to_string_lossy()));
    config.validate()?;
    Ok(config)
}

fn apply_env_overrides(config: &mut TutorConfig) -> Result<()> {
    if let Ok(alpha) = std::env::var("TUTORLOOP_ALPHA") {
        config.alpha = alpha
            .trim()
            .parse()
            .with_context(|| format!("invalid TUTORLOOP_ALPHA: {alpha:?}"))?;
    }
    if let Ok(store) = std::env::var("TUTORLOOP_STORE") {
        config.store_path = PathBuf::from(store);
    }
    if let Ok(user) = std::env::var("TUTORLOOP_USER") {
        config.default_user = user;
    }
    Ok(())
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("tutorloop"))
}
