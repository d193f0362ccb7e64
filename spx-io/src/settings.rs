use std::fs;
use std::path::Path;

use spx_core::sensor::ProcessingSettings;
use tracing::debug;

use crate::error::{IoError, Result};

/// Read processing settings from a TOML file; missing keys keep their defaults
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<ProcessingSettings> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| IoError::read(path, e))?;
    let settings: ProcessingSettings = toml::from_str(&text)?;
    settings.validate()?;
    debug!(path = %path.display(), ?settings, "loaded settings");
    Ok(settings)
}
