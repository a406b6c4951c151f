use clap::{Parser, Subcommand};
use config::{Config as ConfigBuilder, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_MAX_UNDO: usize = 200;
const DEFAULT_AUTO_SAVE: bool = true;
const DEFAULT_AUTO_SAVE_DEBOUNCE_MS: u64 = 1500;
const DEFAULT_MODEL_ID: &str = "gpt-4o-mini";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file error: {0}")]
    ConfigFile(#[from] config::ConfigError),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Serde struct for the optional config file. All fields optional so the
/// sources can layer: defaults -> file -> environment -> CLI.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
struct FileConfig {
    store_dir: Option<PathBuf>,
    max_undo_steps: Option<usize>,
    auto_save: Option<bool>,
    auto_save_debounce_ms: Option<u64>,
    model_id: Option<String>,
    persona: Option<String>,
    constraints: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the project's document files.
    pub store_dir: PathBuf,
    pub max_undo_steps: usize,
    pub auto_save: bool,
    pub auto_save_debounce_ms: u64,
    pub model_id: String,
    /// Optional persona block prepended to every expansion instruction.
    pub persona: Option<String>,
    /// Optional constraints block appended to every expansion instruction.
    pub constraints: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from("."),
            max_undo_steps: DEFAULT_MAX_UNDO,
            auto_save: DEFAULT_AUTO_SAVE,
            auto_save_debounce_ms: DEFAULT_AUTO_SAVE_DEBOUNCE_MS,
            model_id: DEFAULT_MODEL_ID.to_string(),
            persona: None,
            constraints: None,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "inkmap", about = "Outline mind-map document inspector")]
pub struct CliArgs {
    /// Directory holding the project's document files
    #[arg(short, long)]
    pub store_dir: Option<PathBuf>,

    /// Print the merged configuration and exit
    #[arg(long)]
    pub debug_config: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the documents in the store
    List,
    /// Print a document's outline
    Show { doc_id: String },
}

fn config_file_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "inkmap").map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Layers configuration sources: hard defaults, then the config file (if
/// present), then `INKMAP_*` environment variables, then CLI arguments.
pub fn load_config(args: &CliArgs) -> Result<AppConfig, ConfigError> {
    let mut builder = ConfigBuilder::builder();
    if let Some(path) = config_file_path() {
        builder = builder.add_source(File::from(path).required(false));
    }
    let file_config: FileConfig = builder
        .add_source(Environment::with_prefix("INKMAP"))
        .build()?
        .try_deserialize()?;

    let defaults = AppConfig::default();
    let config = AppConfig {
        store_dir: args
            .store_dir
            .clone()
            .or(file_config.store_dir)
            .unwrap_or(defaults.store_dir),
        max_undo_steps: file_config.max_undo_steps.unwrap_or(defaults.max_undo_steps),
        auto_save: file_config.auto_save.unwrap_or(defaults.auto_save),
        auto_save_debounce_ms: file_config
            .auto_save_debounce_ms
            .unwrap_or(defaults.auto_save_debounce_ms),
        model_id: file_config.model_id.unwrap_or(defaults.model_id),
        persona: file_config.persona,
        constraints: file_config.constraints,
    };

    if config.max_undo_steps == 0 {
        return Err(ConfigError::ValidationError(
            "max_undo_steps must be at least 1".to_string(),
        ));
    }
    Ok(config)
}
