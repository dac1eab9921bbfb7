//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.neuro-harness/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;

use crate::PageKind;
use crate::client::CounterpartConfig;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct HarnessConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub counterpart: CounterpartSection,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub server_url: Option<String>,
    pub game_name: Option<String>,
    pub page: Option<String>,
    pub log_level: Option<String>,
    pub log_file: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ChatConfig {
    pub user_name: Option<String>,
    pub user_color: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CounterpartSection {
    pub auto_answer: Option<bool>,
    pub ignore_forces: Option<bool>,
    pub latency_ms: Option<u64>,
    pub name: Option<String>,
    pub color: Option<String>,
    /// Parameters sent when auto-answering, keyed by action name.
    #[serde(default)]
    pub params: HashMap<String, Value>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_SERVER_URL: &str = "ws://localhost:8000";
pub const DEFAULT_GAME_NAME: &str = "Chat";
pub const DEFAULT_LOG_LEVEL: &str = "debug";
pub const DEFAULT_LOG_FILE: &str = "neuro-harness.log";
pub const DEFAULT_USER_COLOR: &str = "#00c000";
pub const DEFAULT_COUNTERPART_NAME: &str = "Tony";
pub const DEFAULT_COUNTERPART_COLOR: &str = "#ff77cc";
pub const DEFAULT_LATENCY_MS: u64 = 50;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub page: PageKind,
    pub server_url: String,
    pub game_name: String,
    pub log_level: String,
    pub log_file: String,
    /// Prefill for the username field.
    pub user_name: String,
    pub user_color: String,
    pub counterpart: CounterpartConfig,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        resolve_with(&HarnessConfig::default(), &CliOverrides::default(), |_| None)
    }
}

/// Values given on the command line. `None` = flag not passed.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub page: Option<PageKind>,
    pub server_url: Option<String>,
    pub game_name: Option<String>,
    pub log_level: Option<String>,
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

/// Returns the path to `~/.neuro-harness/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".neuro-harness").join("config.toml"))
}

/// Load config from `~/.neuro-harness/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `HarnessConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<HarnessConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(HarnessConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(HarnessConfig::default());
    }

    load_from(&path)
}

pub fn load_from(path: &Path) -> Result<HarnessConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: HarnessConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

const DEFAULT_CONFIG_TEMPLATE: &str = r##"# neuro-harness configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# server_url = "ws://localhost:8000"   # Or NEURO_SERVER_URL
# game_name = "Chat"                   # Or NEURO_GAME_NAME
# page = "chat"                        # "chat", "playground" or "tester"; or NEURO_HARNESS_PAGE
# log_level = "debug"                  # "error", "warn", "info", "debug", "trace"
# log_file = "neuro-harness.log"

# [chat]
# user_name = "Alice"
# user_color = "#00c000"

# [counterpart]
# auto_answer = true                   # Answer forced actions right away
# ignore_forces = false
# latency_ms = 50
# name = "Tony"                        # Sent as set_name parameters
# color = "#ff77cc"

# [counterpart.params]
# send_chat_message = { message = "Hello from the other side!" }
"##;

/// Generates a commented-out default config file at the given path.
pub fn generate_default_config(path: &Path) {
    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, DEFAULT_CONFIG_TEMPLATE) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &HarnessConfig, cli: &CliOverrides) -> ResolvedConfig {
    resolve_with(config, cli, |key| std::env::var(key).ok())
}

/// [`resolve`] with an injectable environment lookup.
pub fn resolve_with(
    config: &HarnessConfig,
    cli: &CliOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    // Page: CLI → env → config → default
    let page = cli
        .page
        .or_else(|| env("NEURO_HARNESS_PAGE").and_then(|s| parse_page(&s)))
        .or_else(|| config.general.page.as_deref().and_then(parse_page))
        .unwrap_or_default();

    let server_url = cli
        .server_url
        .clone()
        .or_else(|| env("NEURO_SERVER_URL"))
        .or_else(|| config.general.server_url.clone())
        .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());

    let game_name = cli
        .game_name
        .clone()
        .or_else(|| env("NEURO_GAME_NAME"))
        .or_else(|| config.general.game_name.clone())
        .unwrap_or_else(|| DEFAULT_GAME_NAME.to_string());

    let log_level = cli
        .log_level
        .clone()
        .or_else(|| config.general.log_level.clone())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

    ResolvedConfig {
        page,
        server_url,
        game_name,
        log_level,
        log_file: config
            .general
            .log_file
            .clone()
            .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string()),
        user_name: config.chat.user_name.clone().unwrap_or_default(),
        user_color: config
            .chat
            .user_color
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_COLOR.to_string()),
        counterpart: resolve_counterpart(&config.counterpart),
    }
}

fn parse_page(value: &str) -> Option<PageKind> {
    match PageKind::from_str(value, true) {
        Ok(page) => Some(page),
        Err(e) => {
            warn!("Ignoring unknown page {:?}: {}", value, e);
            None
        }
    }
}

/// The counterpart answers `set_name` with its configured identity unless
/// the params table says otherwise.
fn resolve_counterpart(section: &CounterpartSection) -> CounterpartConfig {
    let mut canned_params = section.params.clone();
    canned_params.entry("set_name".to_string()).or_insert_with(|| {
        json!({
            "name": section.name.as_deref().unwrap_or(DEFAULT_COUNTERPART_NAME),
            "color": section.color.as_deref().unwrap_or(DEFAULT_COUNTERPART_COLOR),
        })
    });

    CounterpartConfig {
        auto_answer: section.auto_answer.unwrap_or(true),
        ignore_forces: section.ignore_forces.unwrap_or(false),
        latency: Duration::from_millis(section.latency_ms.unwrap_or(DEFAULT_LATENCY_MS)),
        canned_params,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_resolve_uses_defaults_when_empty() {
        let resolved = resolve_with(&HarnessConfig::default(), &CliOverrides::default(), no_env);
        assert_eq!(resolved.page, PageKind::Chat);
        assert_eq!(resolved.server_url, DEFAULT_SERVER_URL);
        assert_eq!(resolved.game_name, "Chat");
        assert_eq!(resolved.log_level, "debug");
        assert_eq!(resolved.log_file, "neuro-harness.log");
        assert!(resolved.counterpart.auto_answer);
        assert_eq!(resolved.counterpart.latency, Duration::from_millis(50));
        assert_eq!(
            resolved.counterpart.canned_params["set_name"],
            json!({ "name": "Tony", "color": "#ff77cc" })
        );
    }

    #[test]
    fn test_resolve_config_values_override_defaults() {
        let config = HarnessConfig {
            general: GeneralConfig {
                server_url: Some("ws://example:9000".to_string()),
                game_name: Some("Tester".to_string()),
                page: Some("playground".to_string()),
                log_level: Some("info".to_string()),
                log_file: Some("other.log".to_string()),
            },
            ..Default::default()
        };
        let resolved = resolve_with(&config, &CliOverrides::default(), no_env);
        assert_eq!(resolved.page, PageKind::Playground);
        assert_eq!(resolved.server_url, "ws://example:9000");
        assert_eq!(resolved.game_name, "Tester");
        assert_eq!(resolved.log_level, "info");
        assert_eq!(resolved.log_file, "other.log");
    }

    #[test]
    fn test_env_beats_config_and_cli_beats_env() {
        let config = HarnessConfig {
            general: GeneralConfig {
                server_url: Some("ws://from-config".to_string()),
                page: Some("chat".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let env = |key: &str| match key {
            "NEURO_SERVER_URL" => Some("ws://from-env".to_string()),
            "NEURO_HARNESS_PAGE" => Some("Tester".to_string()),
            _ => None,
        };
        let resolved = resolve_with(&config, &CliOverrides::default(), env);
        assert_eq!(resolved.server_url, "ws://from-env");
        assert_eq!(resolved.page, PageKind::Tester);

        let cli = CliOverrides {
            server_url: Some("ws://from-cli".to_string()),
            page: Some(PageKind::Playground),
            ..Default::default()
        };
        let resolved = resolve_with(&config, &cli, env);
        assert_eq!(resolved.server_url, "ws://from-cli");
        assert_eq!(resolved.page, PageKind::Playground);
    }

    #[test]
    fn test_unknown_page_falls_through() {
        let config = HarnessConfig {
            general: GeneralConfig {
                page: Some("lobby".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let resolved = resolve_with(&config, &CliOverrides::default(), no_env);
        assert_eq!(resolved.page, PageKind::Chat);
    }

    #[test]
    fn test_toml_with_counterpart_params() {
        let toml_str = r##"
[general]
game_name = "Chat"

[chat]
user_name = "Alice"
user_color = "#112233"

[counterpart]
auto_answer = false
latency_ms = 0
name = "Bob"
color = "#445566"

[counterpart.params]
send_chat_message = { message = "hi" }
"##;
        let config: HarnessConfig = toml::from_str(toml_str).unwrap();
        let resolved = resolve_with(&config, &CliOverrides::default(), no_env);
        assert_eq!(resolved.user_name, "Alice");
        assert_eq!(resolved.user_color, "#112233");
        assert!(!resolved.counterpart.auto_answer);
        assert_eq!(resolved.counterpart.latency, Duration::ZERO);
        assert_eq!(
            resolved.counterpart.canned_params["send_chat_message"],
            json!({ "message": "hi" })
        );
        assert_eq!(
            resolved.counterpart.canned_params["set_name"],
            json!({ "name": "Bob", "color": "#445566" })
        );
    }

    #[test]
    fn test_sparse_toml_parses() {
        let config: HarnessConfig = toml::from_str("[chat]\nuser_name = \"Alice\"\n").unwrap();
        assert_eq!(config.chat.user_name.as_deref(), Some("Alice"));
        assert!(config.general.server_url.is_none());
        assert!(config.counterpart.params.is_empty());
    }

    #[test]
    fn test_template_parses_as_empty_config() {
        let config: HarnessConfig = toml::from_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
        assert!(config.general.page.is_none());
        assert!(config.counterpart.name.is_none());
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = std::env::temp_dir().join(format!("neuro-harness-test-{}", uuid::Uuid::new_v4()));
        let path = dir.join("config.toml");
        generate_default_config(&path);
        assert!(load_from(&path).is_ok());

        fs::write(&path, "[general\nserver_url = 1").unwrap();
        assert!(matches!(load_from(&path), Err(ConfigError::Parse(_))));
        let _ = fs::remove_dir_all(&dir);
    }
}
