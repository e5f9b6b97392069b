use crate::error::Result;
use crate::probe;
use directories::ProjectDirs;
use serde::Deserialize;
use std::fs;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://aosc.io";
const DEFAULT_DEADLINE_SECS: u64 = 10;
const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 3;

/// Optional user overrides, read from config.toml in the platform
/// config directory (~/.config/mirrorrank/config.toml on Linux).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    api_base: Option<String>,
    reference_path: Option<String>,
    deadline_secs: Option<u64>,
    probe_timeout_secs: Option<u64>,
}

/// Effective run configuration after merging built-ins with the user's
/// config file. CLI flags are applied on top by the caller.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: String,
    pub reference_path: String,
    pub deadline: Duration,
    pub probe_timeout: Duration,
}

impl Config {
    /// Load configuration.
    /// Strategy:
    /// 1. Start from built-in defaults
    /// 2. Overlay ~/.config/mirrorrank/config.toml if present
    pub fn load() -> Self {
        let file = ProjectDirs::from("", "", "mirrorrank")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .filter(|path| path.exists())
            .and_then(|path| match fs::read_to_string(&path) {
                Ok(content) => match parse(&content) {
                    Ok(parsed) => Some(parsed),
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "ignoring bad config file");
                        None
                    }
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config file");
                    None
                }
            })
            .unwrap_or_default();

        Self::from_file(file)
    }

    fn from_file(file: FileConfig) -> Self {
        Self {
            api_base: file
                .api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            reference_path: file
                .reference_path
                .unwrap_or_else(|| probe::REFERENCE_PATH.to_string()),
            deadline: Duration::from_secs(file.deadline_secs.unwrap_or(DEFAULT_DEADLINE_SECS)),
            probe_timeout: Duration::from_secs(
                file.probe_timeout_secs.unwrap_or(DEFAULT_PROBE_TIMEOUT_SECS),
            ),
        }
    }
}

fn parse(content: &str) -> Result<FileConfig> {
    Ok(toml::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_defaults_when_file_is_empty() {
        let cfg = Config::from_file(FileConfig::default());
        assert_eq!(cfg.api_base, "https://aosc.io");
        assert_eq!(cfg.reference_path, probe::REFERENCE_PATH);
        assert_eq!(cfg.deadline, Duration::from_secs(10));
        assert_eq!(cfg.probe_timeout, Duration::from_secs(3));
    }

    #[test]
    fn partial_file_overrides_only_named_keys() {
        let file = parse("api_base = \"https://mirrors.example.org\"\ndeadline_secs = 5\n").unwrap();
        let cfg = Config::from_file(file);
        assert_eq!(cfg.api_base, "https://mirrors.example.org");
        assert_eq!(cfg.deadline, Duration::from_secs(5));
        // untouched keys keep their defaults
        assert_eq!(cfg.probe_timeout, Duration::from_secs(3));
        assert_eq!(cfg.reference_path, probe::REFERENCE_PATH);
    }

    #[test]
    fn bad_toml_is_an_error() {
        assert!(parse("deadline_secs = \"soon\"").is_err());
    }
}
