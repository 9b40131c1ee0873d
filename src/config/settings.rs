/// Configuration loading from <cache_dir>/config.json
use crate::config::types::{EvalError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the cache directory
pub const CACHE_DIR_ENV: &str = "AOCGEN_HOME";

/// File name of the optional configuration file inside the cache dir
pub const CONFIG_FILE: &str = "config.json";

/// Language runtime override from config.json
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageConfig {
    /// Source file extension, without the dot
    pub extension: String,
    /// Executable to launch; omitted for generation-only languages
    #[serde(default)]
    pub program: Option<String>,
    /// Arguments; `{source}` is replaced by the solution path
    #[serde(default)]
    pub args: Vec<String>,
}

/// Output capture limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub stdout_limit: usize,
    pub stderr_limit: usize,
    pub combined_limit: usize,
    /// How long collectors may keep draining pipes after the child is reaped
    pub collection_grace_ms: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            stdout_limit: 8 * 1024 * 1024,
            stderr_limit: 2 * 1024 * 1024,
            combined_limit: 10 * 1024 * 1024,
            collection_grace_ms: 2000,
        }
    }
}

/// Outcome judge settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeConfig {
    /// Try glyph and numeric fallbacks after the substring rule
    pub fallbacks: bool,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self { fallbacks: true }
    }
}

/// Full config.json structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AocgenConfig {
    /// Where challenges.json and config.json live
    pub cache_dir: PathBuf,
    /// Default evaluation timeout
    pub timeout_secs: u64,
    pub output: OutputConfig,
    pub judge: JudgeConfig,
    /// Default model endpoint for `generate`
    pub model_api: Option<String>,
    /// Puzzle site base URL
    pub puzzle_base_url: String,
    /// Extra or replacement language runtimes
    pub languages: HashMap<String, LanguageConfig>,
}

impl Default for AocgenConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            timeout_secs: 20,
            output: OutputConfig::default(),
            judge: JudgeConfig::default(),
            model_api: None,
            puzzle_base_url: "https://adventofcode.com".to_string(),
            languages: HashMap::new(),
        }
    }
}

/// `$AOCGEN_HOME`, else `~/.aocgen`.
pub fn default_cache_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(CACHE_DIR_ENV) {
        return PathBuf::from(dir);
    }
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".aocgen")
}

impl AocgenConfig {
    /// Defaults rooted at an explicit cache directory
    pub fn with_cache_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Load configuration from a config.json file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| EvalError::Config(format!("Failed to read config file: {}", e)))?;

        let config: AocgenConfig = serde_json::from_str(&config_content)
            .map_err(|e| EvalError::Config(format!("Failed to parse config JSON: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load `<cache_dir>/config.json` if present, defaults otherwise.
    /// The cache dir itself is never taken from the file it lives in.
    pub fn load(cache_dir: Option<PathBuf>) -> Result<Self> {
        let cache_dir = cache_dir.unwrap_or_else(default_cache_dir);
        let config_path = cache_dir.join(CONFIG_FILE);

        let mut config = if config_path.exists() {
            log::info!("Loading configuration from {}", config_path.display());
            Self::load_from_file(&config_path)?
        } else {
            log::debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            Self::default()
        };
        config.cache_dir = cache_dir;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(EvalError::Config(
                "timeout_secs must be positive".to_string(),
            ));
        }
        for (language, runtime) in &self.languages {
            if runtime.extension.trim().is_empty() {
                return Err(EvalError::Config(format!(
                    "language '{}' needs an extension",
                    language
                )));
            }
            if runtime.program.is_some() && !runtime.args.iter().any(|a| a.contains("{source}")) {
                return Err(EvalError::Config(format!(
                    "language '{}' args must reference {{source}}",
                    language
                )));
            }
        }
        Ok(())
    }
}
