use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use grabber_engine::{ClientSettings, EngineSettings, PollSettings};
use serde::{Deserialize, Serialize};

use crate::logging::LogDestination;

/// Contents of `grabber.ron`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub output_dir: PathBuf,
    pub stall_timeout_secs: Option<u64>,
    pub log: LogDestination,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: ClientSettings::default().base_url,
            output_dir: PathBuf::from("./downloads"),
            stall_timeout_secs: None,
            log: LogDestination::default(),
        }
    }
}

impl AppConfig {
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            client: ClientSettings {
                base_url: self.base_url.clone(),
                ..ClientSettings::default()
            },
            poll: PollSettings {
                stall_timeout: self
                    .stall_timeout_secs
                    .filter(|secs| *secs > 0)
                    .map(Duration::from_secs),
            },
            output_dir: self.output_dir.clone(),
            ..EngineSettings::default()
        }
    }
}

/// Reads the configuration at `path`. A missing file yields the defaults.
pub fn load(path: &Path) -> anyhow::Result<AppConfig> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(AppConfig::default()),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read config {:?}", path));
        }
    };
    ron::from_str(&content).with_context(|| format!("failed to parse config {:?}", path))
}
