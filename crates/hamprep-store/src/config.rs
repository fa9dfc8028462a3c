//! hamprep configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use hamprep_core::model::Level;

/// Top-level hamprep configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HamprepConfig {
    /// Directory holding the record snapshot and the logbook.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Question bank file or directory, relative to `data_dir` unless absolute.
    #[serde(default = "default_question_bank")]
    pub question_bank: PathBuf,
    /// Level used when a command does not name one.
    #[serde(default = "default_level")]
    pub default_level: Level,
    /// Rows shown by `exam history`.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./hamprep-data")
}
fn default_question_bank() -> PathBuf {
    PathBuf::from("questions.json")
}
fn default_level() -> Level {
    Level::A
}
fn default_history_limit() -> usize {
    20
}

impl Default for HamprepConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            question_bank: default_question_bank(),
            default_level: default_level(),
            history_limit: default_history_limit(),
        }
    }
}

impl HamprepConfig {
    /// Resolved path of the question bank.
    pub fn question_bank_path(&self) -> PathBuf {
        if self.question_bank.is_absolute() {
            self.question_bank.clone()
        } else {
            self.data_dir.join(&self.question_bank)
        }
    }

    /// Path of the study/exam record snapshot.
    pub fn records_path(&self) -> PathBuf {
        self.data_dir.join("records.json")
    }

    /// Path of the stored contact logbook.
    pub fn logbook_path(&self) -> PathBuf {
        self.data_dir.join("contacts.json")
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are not expanded again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        let var_name = &rest[start + 2..start + end];
        result.push_str(&rest[..start]);
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `hamprep.toml` in the current directory
/// 2. `~/.config/hamprep/config.toml`
///
/// Environment variable overrides: `HAMPREP_DATA_DIR`, `HAMPREP_QUESTION_BANK`.
pub fn load_config() -> Result<HamprepConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<HamprepConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("hamprep.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match &config_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<HamprepConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => HamprepConfig::default(),
    };

    if let Ok(dir) = std::env::var("HAMPREP_DATA_DIR") {
        config.data_dir = PathBuf::from(dir);
    }
    if let Ok(bank) = std::env::var("HAMPREP_QUESTION_BANK") {
        config.question_bank = PathBuf::from(bank);
    }

    config.data_dir = resolve_path(&config.data_dir);
    config.question_bank = resolve_path(&config.question_bank);

    tracing::debug!(
        source = ?config_path,
        data_dir = %config.data_dir.display(),
        "loaded configuration"
    );
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("hamprep"))
}
