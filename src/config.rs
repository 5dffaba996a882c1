use std::env;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::StudyError;

/// Resolve the studytrack home directory: `STUDYTRACK_HOME` wins, then
/// `$HOME/.studytrack`.
pub fn home_dir() -> Result<PathBuf, StudyError> {
    if let Some(path) = env::var_os("STUDYTRACK_HOME") {
        return Ok(PathBuf::from(path));
    }
    match env::var_os("HOME") {
        Some(home) => Ok(PathBuf::from(home).join(".studytrack")),
        None => Err(StudyError::io(
            "cannot resolve home directory (set STUDYTRACK_HOME)",
        )),
    }
}

pub fn config_path() -> Result<PathBuf, StudyError> {
    Ok(home_dir()?.join("config.json"))
}

pub fn cache_dir() -> Result<PathBuf, StudyError> {
    Ok(home_dir()?.join("cache"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_url: String,
}

impl Config {
    /// Load the config, honoring the `STUDYTRACK_API_URL` override.
    pub fn load() -> Result<Self, StudyError> {
        if let Ok(url) = env::var("STUDYTRACK_API_URL") {
            return Ok(Self { api_url: url });
        }
        let path = config_path()?;
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(StudyError::not_configured());
            }
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write the config file, creating the home directory as needed.
    pub fn save(&self) -> Result<PathBuf, StudyError> {
        let path = config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serde_json::to_vec_pretty(self)?)?;
        Ok(path)
    }
}
