//! Environment variable handling and .env file management

use crate::error::{AppError, Result};
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load `.env` from the working directory if it exists.
    ///
    /// Variables already set in the process environment win.
    pub fn load_env_file(verbose: bool) -> Result<bool> {
        Self::load_env_file_from(Path::new(".env"), verbose)
    }

    /// Load a specific env file, returning whether it existed
    pub fn load_env_file_from(path: &Path, verbose: bool) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }

        dotenv::from_path(path)
            .map_err(|e| AppError::config(format!("Failed to load {}: {}", path.display(), e)))?;

        if verbose {
            eprintln!("Loaded configuration from {}", path.display());
        }
        Ok(true)
    }
}
