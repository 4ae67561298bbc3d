//! Configuration for the `discover` binary.
//!
//! Layered, lowest precedence first:
//! - built-in defaults
//! - an optional TOML file (`--config`)
//! - command-line flags
//!
//! Secrets never live here; `OPENAI_API_KEY` comes from the environment.
//!
//! ```toml
//! [discovery]
//! max_rounds = 3
//! max_concurrency = 4
//! call_timeout_ms = 60000
//!
//! [discovery.retry]
//! max_attempts = 3
//! base_delay_ms = 1000
//!
//! [openai]
//! model = "gpt-4o"
//!
//! [probe]
//! enabled = true
//! requests_per_second = 2
//!
//! [table]
//! delimiter = ";"
//! ```

use anyhow::{bail, Context, Result};
use discovery::DiscoveryConfig;
use serde::Deserialize;
use std::path::Path;

/// Everything the binary can read from a config file.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub discovery: DiscoveryConfig,
    pub openai: OpenAiConfig,
    pub probe: ProbeConfig,
    pub table: TableConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct OpenAiConfig {
    /// Overrides `OPENAI_MODEL`
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Crawl company websites to seed prompts and check links
    pub enabled: bool,
    pub requests_per_second: u32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_second: 2,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub delimiter: char,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self { delimiter: ';' }
    }
}

impl FileConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}

/// Convert a delimiter character to the single byte the table reader wants.
pub fn delimiter_byte(delimiter: char) -> Result<u8> {
    if !delimiter.is_ascii() {
        bail!("Delimiter must be a single ASCII character, got {:?}", delimiter);
    }
    Ok(delimiter as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: FileConfig = toml::from_str(
            r#"
            [discovery]
            max_rounds = 5

            [probe]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.discovery.max_rounds, 5);
        assert_eq!(config.discovery.max_concurrency, 4);
        assert_eq!(config.discovery.call_timeout, Duration::from_secs(60));
        assert!(!config.probe.enabled);
        assert_eq!(config.probe.requests_per_second, 2);
        assert_eq!(config.table.delimiter, ';');
        assert!(config.openai.model.is_none());
    }

    #[test]
    fn test_durations_in_milliseconds() {
        let config: FileConfig = toml::from_str(
            r#"
            [discovery]
            call_timeout_ms = 1500

            [discovery.retry]
            max_attempts = 2
            base_delay_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.discovery.call_timeout, Duration::from_millis(1500));
        assert_eq!(config.discovery.retry.max_attempts, 2);
        assert_eq!(config.discovery.retry.base_delay, Duration::from_millis(250));
    }

    #[test]
    fn test_delimiter_must_be_ascii() {
        assert_eq!(delimiter_byte(',').unwrap(), b',');
        assert!(delimiter_byte('§').is_err());
    }
}
