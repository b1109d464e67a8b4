use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::Calendar;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Unable to resolve home directory; set VESPER_HOME to an absolute path")]
    NoHome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VesperConfig {
    /// Offset used to decide where a day starts. Unset means the host's local offset.
    pub utc_offset_minutes: Option<i32>,
    /// Where snapshots live. Relative paths resolve against the vesper home.
    pub data_dir: Option<String>,
}

pub fn resolve_user_home_dir() -> Option<PathBuf> {
    for var in ["HOME", "USERPROFILE"] {
        if let Ok(value) = std::env::var(var) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
    }
    None
}

pub fn resolve_vesper_home() -> Result<PathBuf, ConfigError> {
    if let Ok(value) = std::env::var("VESPER_HOME") {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed));
        }
    }
    resolve_user_home_dir()
        .map(|home| home.join(".vesper"))
        .ok_or(ConfigError::NoHome)
}

pub fn config_path(home: &Path) -> PathBuf {
    home.join("config.toml")
}

pub fn load_config(home: &Path) -> Option<VesperConfig> {
    let path = config_path(home);
    if !path.is_file() {
        return None;
    }
    let text = fs::read_to_string(&path).ok()?;
    toml::from_str::<VesperConfig>(&text).ok()
}

pub fn write_config(home: &Path, config: &VesperConfig) -> Result<PathBuf, ConfigError> {
    fs::create_dir_all(home)?;
    let path = config_path(home);
    let body = toml::to_string_pretty(config)?;
    fs::write(&path, body)?;
    Ok(path)
}

pub fn resolve_data_dir(home: &Path, config: &VesperConfig) -> PathBuf {
    match config.data_dir.as_deref().map(str::trim) {
        Some(dir) if !dir.is_empty() => {
            let dir = PathBuf::from(dir);
            if dir.is_absolute() {
                dir
            } else {
                home.join(dir)
            }
        }
        _ => home.join("data"),
    }
}

/// Calendar for the configured offset, falling back to the host's.
pub fn resolve_calendar(config: &VesperConfig) -> Calendar {
    config
        .utc_offset_minutes
        .and_then(Calendar::with_offset_minutes)
        .unwrap_or_else(Calendar::local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_and_load_round_trip() {
        let temp = TempDir::new().expect("tempdir");
        let config = VesperConfig {
            utc_offset_minutes: Some(-300),
            data_dir: Some("state".to_string()),
        };
        let path = write_config(temp.path(), &config).expect("write");
        assert!(path.ends_with("config.toml"));
        assert_eq!(load_config(temp.path()), Some(config));
    }

    #[test]
    fn load_config_ignores_missing_and_invalid_files() {
        let temp = TempDir::new().expect("tempdir");
        assert!(load_config(temp.path()).is_none());
        fs::write(config_path(temp.path()), "utc_offset_minutes = \"east\"").expect("write");
        assert!(load_config(temp.path()).is_none());
    }

    #[test]
    fn data_dir_defaults_under_home() {
        let home = Path::new("/srv/vesper");
        assert_eq!(
            resolve_data_dir(home, &VesperConfig::default()),
            home.join("data")
        );
        let relative = VesperConfig {
            data_dir: Some("snapshots".to_string()),
            ..VesperConfig::default()
        };
        assert_eq!(resolve_data_dir(home, &relative), home.join("snapshots"));
        let absolute = VesperConfig {
            data_dir: Some("/var/lib/vesper".to_string()),
            ..VesperConfig::default()
        };
        assert_eq!(
            resolve_data_dir(home, &absolute),
            PathBuf::from("/var/lib/vesper")
        );
    }

    #[test]
    fn calendar_uses_configured_offset() {
        let config = VesperConfig {
            utc_offset_minutes: Some(120),
            ..VesperConfig::default()
        };
        assert_eq!(
            resolve_calendar(&config),
            Calendar::with_offset_minutes(120).expect("offset")
        );
    }
}
