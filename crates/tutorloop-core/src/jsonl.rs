//! Durable JSON-lines backend for the mastery log.
//!
//! Each sample is one line. Opening a store replays the file into an
//! [`InMemoryStore`] index; appends write and flush the line before the
//! sample becomes visible to readers.

use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::error::StoreError;
use crate::model::MasterySample;
use crate::storage::{InMemoryStore, MasteryStore};

#[derive(Debug)]
pub struct JsonlStore {
    path: PathBuf,
    writer: Mutex<LogWriter>,
    index: InMemoryStore,
}

#[derive(Debug)]
struct LogWriter {
    file: File,
    /// The file does not end in a newline, e.g. after a crash mid-write or
    /// a hand edit. The next record starts on a fresh line.
    needs_newline: bool,
}

impl JsonlStore {
    /// Open (or create) the log at `path`, loading any existing samples.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let index = InMemoryStore::new();
        let mut needs_newline = false;
        if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            for (i, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let sample: MasterySample =
                    serde_json::from_str(&line).map_err(|e| StoreError::Corrupt {
                        line: i + 1,
                        message: e.to_string(),
                    })?;
                index.append_mastery_sample(sample)?;
            }
            tracing::debug!(path = %path.display(), samples = index.len(), "loaded mastery log");
            needs_newline = ends_without_newline(&path)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: Mutex::new(LogWriter {
                file,
                needs_newline,
            }),
            index,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of samples currently in the log.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl MasteryStore for JsonlStore {
    fn append_mastery_sample(&self, sample: MasterySample) -> Result<(), StoreError> {
        let line = serde_json::to_string(&sample).map_err(|e| StoreError::Encode(e.to_string()))?;
        // Held across the index update so file order matches index order.
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if writer.needs_newline {
            writer.file.write_all(b"\n")?;
        }
        // Stays set if the write below fails partway.
        writer.needs_newline = true;
        writeln!(writer.file, "{line}")?;
        writer.file.flush()?;
        writer.needs_newline = false;
        self.index.append_mastery_sample(sample)
    }

    fn get_samples(&self, user_id: &str, topic_id: &str) -> Vec<MasterySample> {
        self.index.get_samples(user_id, topic_id)
    }

    fn get_topics(&self, user_id: &str) -> BTreeSet<String> {
        self.index.get_topics(user_id)
    }
}

fn ends_without_newline(path: &Path) -> Result<bool, StoreError> {
    let mut file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}
