//! Layered application configuration.
//!
//! Configuration merges three layers, lowest priority first: built-in
//! defaults, a TOML file, and `NOTEDUPE_`-prefixed environment variables.
//! Environment variables use a double underscore to reach into sections,
//! so `NOTEDUPE_HOST__BASE_URL` overrides `[host] base_url`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::dedupe::RetentionPolicy;

/// Connection settings for the note server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Base URL of the kernel API.
    pub base_url: String,
    /// API token; empty means unauthenticated.
    pub token: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:6806".to_string(),
            token: String::new(),
            timeout_secs: 30,
        }
    }
}

/// Scan behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Title that freshly created documents carry.
    pub placeholder_title: String,
    /// Skip duplicate groups made entirely of placeholder titles.
    pub exclude_placeholder: bool,
    /// Hide empty documents that other documents still reference.
    pub hide_referenced: bool,
    /// Ignore files smaller than this many bytes when scanning folders.
    pub min_file_size: u64,
    /// File extensions to ignore, without the leading dot.
    pub ignore_extensions: Vec<String>,
    /// Descend into subfolders.
    pub recursive: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            placeholder_title: "Untitled".to_string(),
            exclude_placeholder: true,
            hide_referenced: true,
            min_file_size: 0,
            ignore_extensions: Vec::new(),
            recursive: true,
        }
    }
}

/// Cleanup behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    /// Which copy survives a cleanup.
    pub keep: RetentionPolicy,
    /// Ask before deleting anything.
    pub confirm_before_delete: bool,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            keep: RetentionPolicy::Newest,
            confirm_before_delete: true,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: HostConfig,
    pub scan: ScanConfig,
    pub cleanup: CleanupConfig,
}

/// Commented starter configuration, matching the built-in defaults.
const STARTER: &str = r#"# notedupe configuration.
# Values here override the built-in defaults; NOTEDUPE_-prefixed environment
# variables override both (double underscore nests into sections, for example
# NOTEDUPE_HOST__BASE_URL).

[host]
# Base URL of the note server's kernel API.
base_url = "http://127.0.0.1:6806"
# API token, found in the server's settings. Leave empty if auth is off.
token = ""
# Request timeout in seconds.
timeout_secs = 30

[scan]
# Title that freshly created documents carry.
placeholder_title = "Untitled"
# Skip duplicate groups made entirely of placeholder titles.
exclude_placeholder = true
# Hide empty documents that other documents still reference.
hide_referenced = true
# Ignore files smaller than this many bytes when scanning folders.
min_file_size = 0
# File extensions to ignore, without the leading dot.
ignore_extensions = []
# Descend into subfolders.
recursive = true

[cleanup]
# Which copy survives a cleanup: newest, oldest, largest or smallest.
keep = "newest"
# Ask before deleting anything.
confirm_before_delete = true
"#;

impl Config {
    /// Load configuration from defaults, file, and environment.
    ///
    /// With no override the platform configuration directory is consulted
    /// and a missing file is fine. An explicitly given path must exist.
    pub fn load(path_override: Option<&Path>) -> Result<Self> {
        let path = match path_override {
            Some(path) => {
                if !path.exists() {
                    bail!("configuration file {} does not exist", path.display());
                }
                path.to_path_buf()
            }
            None => Self::default_path()?,
        };
        log::debug!("Loading configuration from {}", path.display());

        let figment = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(&path))
            .merge(Env::prefixed("NOTEDUPE_").split("__"));

        let mut config: Self = figment
            .extract()
            .with_context(|| format!("invalid configuration (checked {})", path.display()))?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// The platform-specific default configuration file path.
    pub fn default_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "notedupe", "notedupe")
            .ok_or_else(|| anyhow::anyhow!("could not determine the configuration directory"))?;
        Ok(project_dirs.config_dir().join("config.toml"))
    }

    /// Write the commented starter configuration to `path`.
    pub fn write_starter(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            bail!(
                "{} already exists (use --force to overwrite)",
                path.display()
            );
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("could not create {}", parent.display()))?;
        }
        fs::write(path, STARTER)
            .with_context(|| format!("could not write {}", path.display()))?;
        log::info!("Wrote starter configuration to {}", path.display());
        Ok(())
    }

    /// Check the merged configuration for values no command can work with.
    pub fn validate(&self) -> Result<()> {
        if self.host.base_url.trim().is_empty() {
            bail!("host.base_url must not be empty");
        }
        if self.host.timeout_secs == 0 {
            bail!("host.timeout_secs must be at least 1");
        }
        if self.scan.exclude_placeholder && self.scan.placeholder_title.trim().is_empty() {
            bail!("scan.placeholder_title must not be empty while exclude_placeholder is on");
        }
        Ok(())
    }

    fn normalize(&mut self) {
        self.scan.ignore_extensions = self
            .scan
            .ignore_extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
    }
}
