//! Client configuration, read from a RON file.
//!
//! The file is optional: a missing file yields the defaults. Every field may
//! be omitted.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use paste_core::{Environment, TargetEnvironment, UserAgentEnvironment};
use paste_engine::{ClientSettings, EngineConfig, PushSettings};
use paste_logging::LogDestination;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_FILENAME: &str = "just_paste.ron";
pub const CONFIG_ENV_VAR: &str = "JUST_PASTE_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not parse {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server_url: String,
    /// Where files handed out by the server are stored.
    pub save_dir: PathBuf,
    /// Decides mobile behaviour; the build target decides when unset.
    pub user_agent: Option<String>,
    pub system_notifications: bool,
    pub log_destination: LogDestination,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub reconnect_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000".to_string(),
            save_dir: PathBuf::from("downloads"),
            user_agent: None,
            system_notifications: true,
            log_destination: LogDestination::File,
            connect_timeout_ms: 10_000,
            request_timeout_ms: 30_000,
            reconnect_delay_ms: 2_000,
        }
    }
}

impl ClientConfig {
    pub fn engine_config(&self) -> EngineConfig {
        let connect_timeout = Duration::from_millis(self.connect_timeout_ms);
        EngineConfig {
            client: ClientSettings {
                base_url: self.server_url.clone(),
                connect_timeout,
                request_timeout: Duration::from_millis(self.request_timeout_ms),
                ..ClientSettings::default()
            },
            push: PushSettings {
                connect_timeout,
                reconnect_delay: Duration::from_millis(self.reconnect_delay_ms),
                ..PushSettings::default()
            },
            save_dir: self.save_dir.clone(),
            push_enabled: true,
        }
    }

    pub fn environment(&self) -> Box<dyn Environment> {
        match &self.user_agent {
            Some(user_agent) => Box::new(UserAgentEnvironment::new(user_agent.clone())),
            None => Box::new(TargetEnvironment),
        }
    }
}

/// `$JUST_PASTE_CONFIG`, or `just_paste.ron` in the working directory.
pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME))
}

pub fn load(path: &Path) -> Result<ClientConfig, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(ClientConfig::default()),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    ron::from_str(&content).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}
