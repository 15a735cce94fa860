use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, ConfigResult},
    magic::{CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_MAX_DEPTH, ENV_CONFIG_PATH},
};

/// What to do with native byte strings when encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteStringPolicy {
    /// Decode as UTF-8, replacing invalid sequences, and intern as a symbol.
    #[default]
    Symbol,
    /// Refuse byte strings with an unsupported-type error.
    Reject,
}

/// Tunables of a [`crate::Converter`].
///
/// ```toml
/// byte_strings = "reject"
/// max_uniform_len = 1048576
/// max_depth = 64
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    pub byte_strings: ByteStringPolicy,
    /// Longest uniform vector converted in either direction, unbounded if unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_uniform_len: Option<usize>,
    pub max_depth: usize,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            byte_strings: ByteStringPolicy::default(),
            max_uniform_len: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ConverterConfig {
    /// Configuration file location: `$PMT_CONFIG_PATH` if set, otherwise
    /// `pmt/convert.toml` under the per-user configuration directory.
    pub fn default_path() -> PathBuf {
        resolve_config_path(|name| std::env::var_os(name))
    }

    pub fn from_toml_str(toml_str: &str, origin: &str) -> ConfigResult<Self> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            source: e,
            file: origin.to_string(),
        })
    }

    /// Load a configuration from a TOML file.
    pub fn load_from_toml(path: &Path) -> ConfigResult<Self> {
        let toml_str = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&toml_str, &path.display().to_string())?;
        info!("Loaded converter configuration from `{}`", path.display());
        Ok(config)
    }

    /// Load the file at [`Self::default_path`], or the defaults if there is none.
    pub fn load_default() -> ConfigResult<Self> {
        let path = Self::default_path();
        if !path.exists() {
            debug!(
                "No converter configuration at `{}`, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_toml(&path)
    }

    /// Save the configuration to a TOML file.
    pub fn save_to_toml(&self, path: &Path) -> ConfigResult<()> {
        let toml_str = toml::to_string(self).map_err(|e| ConfigError::SerializeError {
            source: e,
            file: path.display().to_string(),
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, toml_str)?;
        Ok(())
    }
}

fn resolve_config_path(var: impl Fn(&str) -> Option<OsString>) -> PathBuf {
    let set = |name: &str| var(name).filter(|value| !value.is_empty());
    if let Some(explicit) = set(ENV_CONFIG_PATH) {
        return explicit.into();
    }

    let root = if cfg!(target_os = "windows") {
        set("APPDATA").map(PathBuf::from)
    } else {
        set("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| set("HOME").map(|home| PathBuf::from(home).join(".config")))
    };
    root.unwrap_or_default()
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let config = ConverterConfig::from_toml_str("byte_strings = \"reject\"\n", "inline").unwrap();
        assert_eq!(config.byte_strings, ByteStringPolicy::Reject);
        assert_eq!(config.max_uniform_len, None);
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn bad_policy_is_a_parse_error() {
        let err = ConverterConfig::from_toml_str("byte_strings = \"latin1\"\n", "inline").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { ref file, .. } if file == "inline"));
    }

    #[test]
    fn default_path_ends_with_file_name() {
        let path = ConverterConfig::default_path();
        assert!(path.ends_with(CONFIG_FILE_NAME) || std::env::var(ENV_CONFIG_PATH).is_ok());
    }

    fn fake_env<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<OsString> + 'a {
        move |name: &str| {
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| OsString::from(value))
        }
    }

    #[test]
    fn explicit_path_overrides_the_user_directory() {
        let path = resolve_config_path(fake_env(&[
            (ENV_CONFIG_PATH, "/etc/pmt.toml"),
            ("XDG_CONFIG_HOME", "/home/ada/.cfg"),
        ]));
        assert_eq!(path, PathBuf::from("/etc/pmt.toml"));
    }

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn user_directory_falls_back_to_home() {
        let xdg = resolve_config_path(fake_env(&[("XDG_CONFIG_HOME", "/cfg"), ("HOME", "/home/ada")]));
        assert_eq!(xdg, Path::new("/cfg").join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));

        let home = resolve_config_path(fake_env(&[("XDG_CONFIG_HOME", ""), ("HOME", "/home/ada")]));
        assert_eq!(
            home,
            Path::new("/home/ada/.config").join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME)
        );

        let bare = resolve_config_path(fake_env(&[]));
        assert_eq!(bare, Path::new(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));
    }
}
