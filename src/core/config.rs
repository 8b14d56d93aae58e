//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.leetbot/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::controller::{
    DEFAULT_FALLBACK_REPLY, DEFAULT_GREETING, DEFAULT_REPLY_TIMEOUT, DEFAULT_RESET_GREETING,
    TurnOptions,
};
use crate::core::format::DEFAULT_CODE_LANGUAGE;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LeetbotConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct BackendConfig {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ChatConfig {
    pub assistant_name: Option<String>,
    pub greeting: Option<String>,
    pub reset_greeting: Option<String>,
    pub fallback_reply: Option<String>,
    pub code_language: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_BASE_URL: &str = "https://leetbot-b7uw.onrender.com";
pub const DEFAULT_ASSISTANT_NAME: &str = "Leet";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub assistant_name: String,
    pub greeting: String,
    pub reset_greeting: String,
    pub fallback_reply: String,
    pub code_language: String,
}

impl ResolvedConfig {
    pub fn turn_options(&self) -> TurnOptions {
        TurnOptions {
            greeting: self.greeting.clone(),
            reset_greeting: self.reset_greeting.clone(),
            fallback_reply: self.fallback_reply.clone(),
            timeout: self.timeout,
        }
    }
}

/// Overrides taken from command-line flags (None = not given).
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.leetbot/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".leetbot").join("config.toml"))
}

/// Load config from `~/.leetbot/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `LeetbotConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<LeetbotConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(LeetbotConfig::default());
        }
    };
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<LeetbotConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(LeetbotConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: LeetbotConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# Leetbot Configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [backend]
# base_url = "https://leetbot-b7uw.onrender.com"   # Or LEETBOT_BASE_URL / --base-url
# timeout_secs = 30                                # Or LEETBOT_TIMEOUT_SECS / --timeout

# [chat]
# assistant_name = "Leet"                          # Or LEETBOT_ASSISTANT_NAME
# greeting = "Hello! I'm Leet, your coding assistant."
# reset_greeting = "I'm ready to help with a new problem!"
# fallback_reply = "Sorry, I couldn't process your request at the moment. Please try again."
# code_language = "python"                         # Shown on code blocks with no language
"#;

    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &LeetbotConfig, cli: &CliOverrides) -> ResolvedConfig {
    resolve_with_env(config, cli, |key| std::env::var(key).ok())
}

/// Same as [`resolve`], with the environment lookup injected.
fn resolve_with_env(
    config: &LeetbotConfig,
    cli: &CliOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    // Base URL: CLI → env → config → default
    let base_url = cli
        .base_url
        .clone()
        .or_else(|| env("LEETBOT_BASE_URL"))
        .or_else(|| config.backend.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    // Timeout: CLI → env → config → default; unparsable env values are skipped
    let timeout_secs = cli
        .timeout_secs
        .or_else(|| {
            env("LEETBOT_TIMEOUT_SECS").and_then(|raw| match raw.trim().parse::<u64>() {
                Ok(secs) => Some(secs),
                Err(_) => {
                    warn!("Ignoring LEETBOT_TIMEOUT_SECS={:?}: not a number", raw);
                    None
                }
            })
        })
        .or(config.backend.timeout_secs);
    let timeout = match timeout_secs {
        Some(0) => {
            warn!("A timeout of 0s would fail every request, using the default");
            DEFAULT_REPLY_TIMEOUT
        }
        Some(secs) => Duration::from_secs(secs),
        None => DEFAULT_REPLY_TIMEOUT,
    };

    // Assistant name: env → config → default
    let assistant_name = env("LEETBOT_ASSISTANT_NAME")
        .or_else(|| config.chat.assistant_name.clone())
        .unwrap_or_else(|| DEFAULT_ASSISTANT_NAME.to_string());

    let chat = &config.chat;
    ResolvedConfig {
        base_url,
        timeout,
        assistant_name,
        greeting: chat
            .greeting
            .clone()
            .unwrap_or_else(|| DEFAULT_GREETING.to_string()),
        reset_greeting: chat
            .reset_greeting
            .clone()
            .unwrap_or_else(|| DEFAULT_RESET_GREETING.to_string()),
        fallback_reply: chat
            .fallback_reply
            .clone()
            .unwrap_or_else(|| DEFAULT_FALLBACK_REPLY.to_string()),
        code_language: chat
            .code_language
            .clone()
            .filter(|lang| !lang.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CODE_LANGUAGE.to_string()),
    }
}
