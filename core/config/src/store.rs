//! File-backed configuration store.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use blobswitch_common::{Error, Result};

use crate::document::ConfigDocument;
use crate::env::{EnvSource, ProcessEnv};

/// Loads and persists the configuration document at a fixed path.
///
/// Nothing is cached: every call goes back to disk, so a provider switch
/// made by one caller is visible to the next operation of any other.
/// The read-modify-write in [`ConfigStore::set_active_provider`] is not
/// locked; two concurrent switches race and the last write wins. Each write
/// goes through its own uniquely named temporary file in the same directory
/// and is renamed over the document, so readers never observe a partially
/// written document.
pub struct ConfigStore {
    path: PathBuf,
    env: Box<dyn EnvSource>,
}

impl ConfigStore {
    /// Create a store reading overrides from the process environment.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_env(path, ProcessEnv)
    }

    /// Create a store with an explicit environment source.
    pub fn with_env(path: impl Into<PathBuf>, env: impl EnvSource + 'static) -> Self {
        Self {
            path: path.into(),
            env: Box::new(env),
        }
    }

    /// Read the persisted document and overlay environment values.
    ///
    /// # Errors
    /// - `ConfigUnavailable` if the file is missing, unreadable or not a
    ///   well-formed document
    pub fn load(&self) -> Result<ConfigDocument> {
        let json = fs::read_to_string(&self.path).map_err(|e| {
            Error::ConfigUnavailable(format!("{}: {}", self.path.display(), e))
        })?;

        let mut doc = ConfigDocument::from_json(&json).map_err(|e| match e {
            Error::ConfigUnavailable(msg) => {
                Error::ConfigUnavailable(format!("{}: {}", self.path.display(), msg))
            }
            other => other,
        })?;
        doc.apply_env(self.env.as_ref());

        debug!(path = %self.path.display(), active = %doc.active_provider, "Loaded configuration");
        Ok(doc)
    }

    /// Persist a document, replacing the file atomically.
    pub fn save(&self, doc: &ConfigDocument) -> Result<()> {
        let json = doc.to_json()?;
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        // Dropped (and removed) on any error before persist.
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        debug!(path = %self.path.display(), "Saved configuration");
        Ok(())
    }

    /// Name of the currently active provider.
    pub fn active_provider(&self) -> Result<String> {
        Ok(self.load()?.active_provider)
    }

    /// Switch the active provider.
    ///
    /// The whole merged document is written back, so environment-sourced
    /// credentials end up in the file. The name is not validated here; an
    /// unknown provider is only rejected when a client is built for it.
    pub fn set_active_provider(&self, id: &str) -> Result<()> {
        let mut doc = self.load()?;
        let previous = std::mem::replace(&mut doc.active_provider, id.to_string());
        self.save(&doc)?;

        info!(from = %previous, to = %id, "Switched active provider");
        Ok(())
    }
}

impl fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
