//! Configuration for the host contract.
//!
//! The selectors below are the entire coupling surface to the host page. When
//! the host changes its markup, these are the values to update (in code, or
//! through a TOML file loaded with [`BridgeConfig::load`]).

use host_dom::{Selector, SelectorError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Locations containing this substring are in scope.
pub const SCOPE_PATTERN: &str = "messaging/thread";
/// The host's native composer, hidden while the overlay is mounted.
pub const NATIVE_COMPOSER_SELECTOR: &str = ".msg-form__contenteditable";
/// The editable region that receives submitted text.
pub const TEXT_CONTAINER_SELECTOR: &str = ".msg-form__contenteditable";
/// The host's send button.
pub const SEND_CONTROL_SELECTOR: &str = ".msg-form__send-button";
/// `id` of the overlay mount node inserted before the native composer.
pub const OVERLAY_ROOT_ID: &str = "linkedin-template-root";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid selector for `{field}`")]
    Selector {
        field: &'static str,
        #[source]
        source: SelectorError,
    },
    #[error("`{0}` must not be empty")]
    Empty(&'static str),
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    pub scope_pattern: String,
    pub composer_selector: String,
    pub text_container_selector: String,
    pub send_control_selector: String,
    pub overlay_root_id: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            scope_pattern: SCOPE_PATTERN.to_string(),
            composer_selector: NATIVE_COMPOSER_SELECTOR.to_string(),
            text_container_selector: TEXT_CONTAINER_SELECTOR.to_string(),
            send_control_selector: SEND_CONTROL_SELECTOR.to_string(),
            overlay_root_id: OVERLAY_ROOT_ID.to_string(),
        }
    }
}

/// Parsed selectors, validated once at startup.
#[derive(Clone, Debug)]
pub struct HostSelectors {
    pub composer: Selector,
    pub text_container: Selector,
    pub send_control: Selector,
}

impl BridgeConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: BridgeConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        log::debug!(target: "bridge.config", "loaded {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scope_pattern.trim().is_empty() {
            return Err(ConfigError::Empty("scope_pattern"));
        }
        if self.overlay_root_id.trim().is_empty() {
            return Err(ConfigError::Empty("overlay_root_id"));
        }
        self.selectors().map(|_| ())
    }

    pub fn selectors(&self) -> Result<HostSelectors, ConfigError> {
        fn parse(field: &'static str, value: &str) -> Result<Selector, ConfigError> {
            Selector::parse(value).map_err(|source| ConfigError::Selector { field, source })
        }
        Ok(HostSelectors {
            composer: parse("composer_selector", &self.composer_selector)?,
            text_container: parse("text_container_selector", &self.text_container_selector)?,
            send_control: parse("send_control_selector", &self.send_control_selector)?,
        })
    }
}
