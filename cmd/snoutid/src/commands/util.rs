//! Shared helpers for commands.

use std::path::Path;
use std::sync::Arc;

use snoutid_capture::{Camera, CaptureError, RawFrame};
use snoutid_noseprint::{Extractor, ModelRegistry};
use snoutid_profile::{ProfileStore, RedbProfileStore};
use tracing::debug;

use crate::config::Config;

/// Loads the configured noseprint model.
pub fn open_extractor(cfg: &Config) -> anyhow::Result<Extractor> {
    let registry = ModelRegistry::with_builtin();
    let extractor = Extractor::new(&registry, &cfg.model)?;
    debug!(model = extractor.model_id(), "model loaded");
    Ok(extractor)
}

/// Opens the configured profile database, creating it if needed.
pub fn open_store(cfg: &Config) -> anyhow::Result<Arc<dyn ProfileStore>> {
    let path = cfg.database_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(Arc::new(RedbProfileStore::open(&path)?))
}

/// Reads an image file into a frame.
pub fn read_frame(path: &Path) -> Result<RawFrame, CaptureError> {
    let data = std::fs::read(path)
        .map_err(|e| CaptureError::Camera(format!("read {}: {e}", path.display())))?;
    Ok(RawFrame::encoded(data)?)
}

/// Camera that "captures" the image file it currently points at.
pub struct FileCamera<'a> {
    path: &'a Path,
}

impl<'a> FileCamera<'a> {
    pub fn new(path: &'a Path) -> Self {
        Self { path }
    }
}

impl Camera for FileCamera<'_> {
    fn capture(&mut self) -> Result<RawFrame, CaptureError> {
        read_frame(self.path)
    }
}

/// Prints a value as pretty JSON.
pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
