pub mod compare;
pub mod curve;
pub mod difficulty;
pub mod history;
pub mod init;
pub mod next;
pub mod progress;
pub mod record;
pub mod snapshot;
pub mod validate;

use std::sync::Arc;

use anyhow::{Context, Result};

use tutorloop_core::config::{load_config_from, TutorConfig};
use tutorloop_core::jsonl::JsonlStore;
use tutorloop_core::pipeline::TutorPipeline;

use crate::GlobalArgs;

/// Loaded config, resolved user and a pipeline over the configured store.
pub struct Session {
    pub config: TutorConfig,
    pub user: String,
    pub pipeline: TutorPipeline,
}

impl Session {
    pub fn open(global: &GlobalArgs) -> Result<Self> {
        let config = load_config_from(global.config.as_deref())?;
        let user = global
            .user
            .clone()
            .unwrap_or_else(|| config.default_user.clone());

        let store = JsonlStore::open(&config.store_path)
            .with_context(|| format!("failed to open store: {}", config.store_path.display()))?;
        tracing::debug!(path = %config.store_path.display(), samples = store.len(), "opened store");

        let pipeline = TutorPipeline::from_config(Arc::new(store), &config)?;
        Ok(Self {
            config,
            user,
            pipeline,
        })
    }
}

pub fn percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}
