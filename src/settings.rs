//! Runtime settings and the persisted display preference.

use crate::fetch::FetchError;
use crate::tmdb::TmdbConfig;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

pub const ENV_API_KEY: &str = "TMDB_API_KEY";
pub const ENV_LANGUAGE: &str = "TMDB_LANGUAGE";
pub const ENV_BASE_URL: &str = "TMDB_API_BASE_URL";
pub const ENV_TIMEOUT: &str = "TMDB_TIMEOUT_SECS";

const PREFERENCES_FILE: &str = "preferences.json";

/// Light/dark display preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggle(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

/// Preferences persisted between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub theme: Theme,
}

impl Preferences {
    /// Load from `path`. A missing file gives defaults; an unreadable or
    /// corrupt one is logged and also gives defaults.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not read preferences");
                return Self::default();
            }
        };
        match serde_json::from_str(&content) {
            Ok(prefs) => prefs,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring corrupt preferences file");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "movie-explorer", "movie-explorer")
}

pub fn default_preferences_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(PREFERENCES_FILE))
}

pub fn default_log_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(std::env::temp_dir)
        .join("movie-explorer.log")
}

/// Values given on the command line; each one beats its environment
/// counterpart.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_key: Option<String>,
    pub language: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub theme: Option<Theme>,
    pub preferences_path: Option<PathBuf>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub tmdb: TmdbConfig,
    pub theme: Theme,
    /// Where theme changes are saved. `None` disables saving.
    pub preferences_path: Option<PathBuf>,
}

impl Settings {
    /// Merge command-line overrides over environment values read through
    /// `env`. Fails with a configuration error when no credential is set.
    pub fn resolve(
        overrides: &Overrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, FetchError> {
        let timeout_secs = match overrides.timeout_secs {
            Some(secs) => Some(secs),
            None => match env(ENV_TIMEOUT) {
                Some(raw) => Some(raw.trim().parse::<u64>().map_err(|_| {
                    FetchError::Configuration(format!("{} must be a number of seconds", ENV_TIMEOUT))
                })?),
                None => None,
            },
        };

        let tmdb = TmdbConfig::new(
            overrides.api_key.clone().or_else(|| env(ENV_API_KEY)),
            overrides.language.clone().or_else(|| env(ENV_LANGUAGE)),
            overrides.base_url.clone().or_else(|| env(ENV_BASE_URL)),
            timeout_secs.filter(|s| *s > 0).map(Duration::from_secs),
        )?;

        let preferences_path = overrides
            .preferences_path
            .clone()
            .or_else(default_preferences_path);
        let stored = preferences_path
            .as_deref()
            .map(Preferences::load)
            .unwrap_or_default();

        Ok(Self {
            tmdb,
            theme: overrides.theme.unwrap_or(stored.theme),
            preferences_path,
        })
    }
}
