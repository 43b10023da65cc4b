use std::{
    fs,
    path::{Path, PathBuf},
};

use color_eyre::Result;
use credseal_core::options::ProviderOptions;
use dirs::config_dir;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;

pub const DEFAULT_KEYRING_SERVICE: &str = "credseal";
pub const DEFAULT_KEYRING_ACCOUNT: &str = "data-key";

/// User-level configuration loaded from `~/.config/credseal/config.toml` (platform-specific).
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Credential file to load.
    pub file: Option<PathBuf>,
    /// Protection purpose scoping the key material.
    pub purpose: Option<String>,
    /// Marker seed; the library default applies when unset.
    pub marker: Option<String>,
    /// Where the master key lives in the OS keyring.
    pub keyring: Option<KeyringConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct KeyringConfig {
    pub service: Option<String>,
    pub account: Option<String>,
}

impl Config {
    pub fn keyring_service(&self) -> &str {
        self.keyring
            .as_ref()
            .and_then(|k| k.service.as_deref())
            .unwrap_or(DEFAULT_KEYRING_SERVICE)
    }

    pub fn keyring_account(&self) -> &str {
        self.keyring
            .as_ref()
            .and_then(|k| k.account.as_deref())
            .unwrap_or(DEFAULT_KEYRING_ACCOUNT)
    }
}

/// Load config from the default path; if missing, return defaults.
pub fn load() -> Result<Config> {
    let path = default_path()?;
    load_from_path(path)
}

/// Load config from a given path; if missing or empty, return defaults.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    let cfg: Config = toml::from_str(&contents)?;
    Ok(cfg)
}

/// Resolve the default config path (platform aware).
pub fn default_path() -> Result<PathBuf> {
    let base = config_dir().ok_or_else(|| color_eyre::eyre::eyre!("no config dir available"))?;
    Ok(base.join("credseal").join("config.toml"))
}

/// Write the given config unless a file already exists, to avoid clobbering user edits.
pub fn write_default_if_missing(config: &Config) -> Result<PathBuf> {
    let path = default_path()?;
    write_if_missing(config, &path)?;
    Ok(path)
}

fn write_if_missing(config: &Config, path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let body = toml::to_string_pretty(config)?;
    fs::write(path, body)?;
    Ok(())
}

/// Purpose from the command line, falling back to the config file.
pub fn resolve_purpose(config: &Config, cli: &Cli) -> Result<String> {
    cli.purpose
        .clone()
        .or_else(|| config.purpose.clone())
        .ok_or_else(|| color_eyre::eyre::eyre!("no purpose configured; pass --purpose"))
}

/// Build provider options, command-line flags taking precedence over the config file.
pub fn resolve_options(config: &Config, cli: &Cli) -> Result<ProviderOptions> {
    let file = cli
        .file
        .clone()
        .or_else(|| config.file.clone())
        .ok_or_else(|| color_eyre::eyre::eyre!("no credential file configured; pass --file"))?;
    let mut options = ProviderOptions::new(file, resolve_purpose(config, cli)?);
    options.marker_seed = cli.marker.clone().or_else(|| config.marker.clone());
    Ok(options)
}
