//! TOML-based configuration for quarry.
//!
//! Supports a config file (quarry.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [compiler]
//! dialect = "postgres"
//! max_expression_depth = 32
//!
//! [questions]
//! date_indicators = ["date", "time", "day", "week", "month", "quarter", "year"]
//!
//! [store]
//! directory = "${HOME}/.quarry/models"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::compile::{CompileOptions, DEFAULT_DATE_INDICATORS, DEFAULT_MAX_EXPRESSION_DEPTH};
use crate::sql::Dialect;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub compiler: CompilerSettings,
    pub questions: QuestionSettings,
    pub store: StoreSettings,
}

/// SQL generation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompilerSettings {
    pub dialect: Dialect,

    /// Cap on nested calculated-metric references.
    pub max_expression_depth: usize,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            max_expression_depth: DEFAULT_MAX_EXPRESSION_DEPTH,
        }
    }
}

/// Question matching settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QuestionSettings {
    /// Substrings that mark a dimension as date-like.
    pub date_indicators: Vec<String>,
}

impl Default for QuestionSettings {
    fn default() -> Self {
        Self {
            date_indicators: DEFAULT_DATE_INDICATORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Where saved model documents live.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Directory of model files (supports ${ENV_VAR} expansion).
    pub directory: Option<String>,
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        if settings.compiler.max_expression_depth == 0 {
            return Err(SettingsError::InvalidConfig(
                "compiler.max_expression_depth must be at least 1".into(),
            ));
        }
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `QUARRY_CONFIG`
    /// 2. `./quarry.toml`
    /// 3. `~/.config/quarry/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("QUARRY_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("quarry.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("quarry").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Compile options seeded from these settings.
    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions::default()
            .with_dialect(self.compiler.dialect)
            .with_max_expression_depth(self.compiler.max_expression_depth)
            .with_date_indicators(self.questions.date_indicators.clone())
    }

    /// The model directory with environment variables expanded.
    pub fn store_directory(&self) -> Result<Option<PathBuf>, SettingsError> {
        self.store
            .directory
            .as_deref()
            .map(|dir| expand_env_vars(dir).map(PathBuf::from))
            .transpose()
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let mut var_name = String::new();
        if chars.peek() == Some(&'{') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
        } else {
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                var_name.push(ch);
            }
            if var_name.is_empty() {
                // Just a lone $, keep it
                result.push('$');
                continue;
            }
        }

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
