//! Model bundle persistence.
//!
//! The bundle is JSON written to a uniquely named temporary file in the target
//! directory, flushed to disk and renamed over the target, so a reader never
//! observes a half-written file and concurrent writers never share a
//! temporary file.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anomaly_api::EngineConfig;
use anomaly_spi::{AnomalyError, Result};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::state::EngineState;

/// Bundle layout version written by this build.
pub const BUNDLE_FORMAT_VERSION: u32 = 1;

/// Configuration and trained state saved as one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBundle {
    pub format_version: u32,
    pub config: EngineConfig,
    pub state: EngineState,
}

impl ModelBundle {
    pub fn new(config: EngineConfig, state: EngineState) -> Self {
        Self {
            format_version: BUNDLE_FORMAT_VERSION,
            config,
            state,
        }
    }
}

/// Write `bundle` to `path` atomically, creating parent directories.
pub fn write_bundle(path: &Path, bundle: &ModelBundle) -> Result<()> {
    if path.file_name().is_none() {
        return Err(AnomalyError::persistence(
            path.display().to_string(),
            "path has no file name",
        ));
    }
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            fs::create_dir_all(parent)?;
            parent
        }
        None => Path::new("."),
    };

    // Dropping the temporary file on an early return removes it.
    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer(&mut writer, bundle)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| AnomalyError::from(e.error))?;
    Ok(())
}

/// Read and validate a bundle. Every failure is reported as
/// [`AnomalyError::Persistence`] naming `path`.
pub fn read_bundle(path: &Path) -> Result<ModelBundle> {
    let display = path.display().to_string();
    let file = File::open(path).map_err(|e| AnomalyError::persistence(&display, e))?;
    let bundle: ModelBundle = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AnomalyError::persistence(&display, e))?;

    if bundle.format_version != BUNDLE_FORMAT_VERSION {
        return Err(AnomalyError::persistence(
            &display,
            format!(
                "unsupported bundle format version {} (expected {})",
                bundle.format_version, BUNDLE_FORMAT_VERSION
            ),
        ));
    }
    bundle
        .config
        .validate()
        .and_then(|()| bundle.state.validate())
        .map_err(|e| AnomalyError::persistence(&display, e))?;
    Ok(bundle)
}
