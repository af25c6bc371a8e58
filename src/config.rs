//! Configuration primitives for the CourseBase advisory core.
//!
//! Stored in a machine-readable TOML file located at:
//!   %APPDATA%/CourseBase/config.toml on Windows
//!   $XDG_CONFIG_HOME/coursebase/config.toml on Linux
//!   ~/Library/Application Support/CourseBase/config.toml on macOS
//!
//! The config tracks where reference data (curriculum charts, semester
//! offerings, general-education rules) lives and the knobs applied to the
//! language-model pass. The embedding bot process loads it once at startup
//! and hands the values to [`crate::curriculum::ReferenceStore`].

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Root configuration persisted per installation.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Overrides the reference-data directory. When absent the platform
    /// data dir is used (see [`default_data_dir`]).
    pub data_dir: Option<PathBuf>,
    /// Language-model pass preferences.
    #[serde(default)]
    pub llm: LlmSettings,
    /// Recommendation sizing knobs.
    #[serde(default)]
    pub recommendation: RecommendationSettings,
}

/// Preferences for the advisory language-model call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Model identifier forwarded to the completion transport.
    #[serde(default = "default_model")]
    pub model: String,
    /// Maximum number of annotated courses rendered into the prompt.
    #[serde(default = "default_prompt_course_limit")]
    pub prompt_course_limit: usize,
    /// Maximum number of known courses listed in the grade-parsing prompt.
    #[serde(default = "default_grade_course_limit")]
    pub grade_course_limit: usize,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            prompt_course_limit: default_prompt_course_limit(),
            grade_course_limit: default_grade_course_limit(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

const fn default_prompt_course_limit() -> usize {
    20
}

const fn default_grade_course_limit() -> usize {
    30
}

/// Sizing knobs for the merged recommendation list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationSettings {
    /// Hard cap on the merged recommendation list.
    #[serde(default = "default_max_recommendations")]
    pub max_recommendations: usize,
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self {
            max_recommendations: default_max_recommendations(),
        }
    }
}

const fn default_max_recommendations() -> usize {
    10
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "CourseBase").context("Could not resolve platform directories")
}

/// Platform path of the persisted config file.
pub fn config_file_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("config.toml"))
}

/// Platform reference-data directory used when the config has no override.
pub fn default_data_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().join("reference"))
}

/// Loads the persisted config, falling back to defaults when the file does
/// not exist yet.
pub fn load_or_default() -> Result<AppConfig> {
    let path = config_file_path()?;
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config at {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("Failed to parse config at {}", path.display()))
}

/// Persists the config, creating the parent directory on first save.
pub fn save(config: &AppConfig) -> Result<()> {
    let path = config_file_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let raw = toml::to_string_pretty(config).context("Failed to serialize config")?;
    fs::write(&path, raw).with_context(|| format!("Failed to write config at {}", path.display()))
}
