//! Points the teams-for-linux client at this server.
//!
//! The client reads its custom background settings from
//! `<config dir>/teams-for-linux/config.json`. Only the three keys below are
//! managed; everything else in the file is left alone.

use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::{Config, config_base_dir};

const CLIENT_DIR: &str = "teams-for-linux";
const CLIENT_CONFIG_FILE: &str = "config.json";

#[derive(Debug, Error)]
pub enum TeamsConfigError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} does not contain a JSON object")]
    NotAnObject(PathBuf),
}

/// Default location of the client's config file.
pub fn client_config_path() -> PathBuf {
    config_base_dir().join(CLIENT_DIR).join(CLIENT_CONFIG_FILE)
}

/// Settings this server wants in the client config.
pub fn desired_settings(config: &Config) -> Map<String, Value> {
    let mut settings = Map::new();
    settings.insert(
        "customBGServiceBaseUrl".to_string(),
        Value::String(format!("http://localhost:{}", config.port)),
    );
    settings.insert(
        "customBGServiceIgnoreMSDefaults".to_string(),
        Value::Bool(config.ignore_teams_images),
    );
    settings.insert(
        "customBGServiceConfigFetchInterval".to_string(),
        Value::from(config.fetch_interval),
    );
    settings
}

/// Merges [`desired_settings`] into the client config at `path`.
///
/// The file is only rewritten when something changed. Returns `true` when it
/// was written, in which case the client has to be restarted.
pub fn update_client_config(path: &Path, config: &Config) -> Result<bool, TeamsConfigError> {
    let io_err = |source| TeamsConfigError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let current = match fs::read_to_string(path) {
        Ok(text) => parse_object(path, &text)?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => Map::new(),
        Err(err) => return Err(io_err(err)),
    };

    let mut merged = current.clone();
    merged.extend(desired_settings(config));
    if merged == current {
        tracing::debug!(path = %path.display(), "Client config already up to date");
        return Ok(false);
    }

    let text = serde_json::to_string_pretty(&Value::Object(merged)).map_err(|source| {
        TeamsConfigError::Json {
            path: path.to_path_buf(),
            source,
        }
    })?;
    fs::write(path, text).map_err(io_err)?;

    tracing::warn!(
        path = %path.display(),
        "Client config updated, please restart the Teams app"
    );
    Ok(true)
}

fn parse_object(path: &Path, text: &str) -> Result<Map<String, Value>, TeamsConfigError> {
    match serde_json::from_str(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(TeamsConfigError::NotAnObject(path.to_path_buf())),
        Err(source) => Err(TeamsConfigError::Json {
            path: path.to_path_buf(),
            source,
        }),
    }
}
