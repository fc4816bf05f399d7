use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub chooser: ChooserConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub launch: LaunchConfig,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ChooserConfig {
    #[serde(default = "default_chooser_command")]
    pub command: String,
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
}

fn default_chooser_command() -> String { "dmenu -i".to_string() }
fn default_max_response_bytes() -> usize { 4096 }

impl Default for ChooserConfig {
    fn default() -> Self {
        Self {
            command: default_chooser_command(),
            max_response_bytes: default_max_response_bytes(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_true")]
    pub sort_entries: bool,
    #[serde(default = "default_true")]
    pub skip_hidden: bool,
    /// Regexes matched against display names; matches are never offered.
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_true() -> bool { true }

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            sort_entries: true,
            skip_hidden: true,
            exclude: Vec::new(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldCodeMode {
    #[default]
    Strip,
    Keep,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct LaunchConfig {
    #[serde(default)]
    pub field_codes: FieldCodeMode,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "deskrun", "deskrun")
}

pub fn default_config_path() -> PathBuf {
    match project_dirs() {
        Some(dirs) => dirs.config_dir().join("config.toml"),
        None => PathBuf::from("config.toml"),
    }
}

/// Load the config at `path`, or the default location. A missing file yields defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config_path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);

    if !config_path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("failed to read config file {}", config_path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("failed to parse config file {}", config_path.display()))?;
    Ok(config)
}
