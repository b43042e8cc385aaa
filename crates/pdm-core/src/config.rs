use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::pipeline::ExecutableResolver;

fn default_max_per_domain() -> usize {
    2
}

/// `[server]` section of config.toml.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Working directory for every downloader process.
    pub download_path: PathBuf,
    /// Active (preparing or downloading) jobs allowed per domain. 0 = unlimited.
    #[serde(default = "default_max_per_domain")]
    pub maximum_active_downloads_per_domain: usize,
    /// Finished jobs older than this are dropped from the registry. None keeps them forever.
    #[serde(default)]
    pub finished_retention_secs: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            download_path: PathBuf::from("./downloads"),
            maximum_active_downloads_per_domain: default_max_per_domain(),
            finished_retention_secs: None,
        }
    }
}

/// A named downloader command line. The job URL is appended after `args`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DownloadProfile {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Extra arguments spliced in after a profile's own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DownloadOption {
    pub name: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Directory finished files are moved to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Destination {
    pub name: String,
    pub path: PathBuf,
}

/// Global configuration loaded from `~/.config/pdm/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PdmConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub profiles: Vec<DownloadProfile>,
    #[serde(default)]
    pub download_options: Vec<DownloadOption>,
    #[serde(default)]
    pub destinations: Vec<Destination>,
}

impl Default for PdmConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            profiles: vec![
                DownloadProfile {
                    name: "standard video".into(),
                    command: "yt-dlp".into(),
                    args: vec![
                        "--newline".into(),
                        "--write-info-json".into(),
                        "-f".into(),
                        "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best".into(),
                    ],
                },
                DownloadProfile {
                    name: "standard mp3".into(),
                    command: "yt-dlp".into(),
                    args: vec![
                        "--newline".into(),
                        "--write-info-json".into(),
                        "--extract-audio".into(),
                        "--audio-format".into(),
                        "mp3".into(),
                    ],
                },
            ],
            download_options: Vec::new(),
            destinations: Vec::new(),
        }
    }
}

impl PdmConfig {
    pub fn profile_called(&self, name: &str) -> Option<&DownloadProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    pub fn option_called(&self, name: &str) -> Option<&DownloadOption> {
        self.download_options.iter().find(|o| o.name == name)
    }

    pub fn destination_called(&self, name: &str) -> Option<&Destination> {
        self.destinations.iter().find(|d| d.name == name)
    }

    /// Reject configs the manager cannot run with. The download path must already exist.
    pub fn validate(&self, resolver: &dyn ExecutableResolver) -> Result<()> {
        let dl = &self.server.download_path;
        let meta = fs::metadata(dl)
            .with_context(|| format!("download path {} is not accessible", dl.display()))?;
        if !meta.is_dir() {
            bail!("download path {} is not a directory", dl.display());
        }

        let mut seen = HashSet::new();
        for profile in &self.profiles {
            let name = profile.name.trim();
            if name.is_empty() {
                bail!("profile names cannot be empty");
            }
            if !seen.insert(name) {
                bail!("duplicate profile name '{name}'");
            }
            if profile.command.trim().is_empty() {
                bail!("profile '{name}' has an empty command");
            }
            if profile.args.iter().any(|a| a.trim().is_empty()) {
                bail!("profile '{name}' has an empty argument");
            }
            resolver
                .resolve(&profile.command)
                .with_context(|| format!("profile '{name}'"))?;
        }

        let mut seen = HashSet::new();
        for option in &self.download_options {
            let name = option.name.trim();
            if name.is_empty() {
                bail!("download option names cannot be empty");
            }
            if !seen.insert(name) {
                bail!("duplicate download option name '{name}'");
            }
            if option.args.iter().any(|a| a.trim().is_empty()) {
                bail!("download option '{name}' has an empty argument");
            }
        }

        let mut seen = HashSet::new();
        for dest in &self.destinations {
            let name = dest.name.trim();
            if name.is_empty() {
                bail!("destination names cannot be empty");
            }
            if !seen.insert(name) {
                bail!("duplicate destination name '{name}'");
            }
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("pdm")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Parse a config file without touching the XDG location.
pub fn load_from_path(path: &Path) -> Result<PdmConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg: PdmConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<PdmConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = PdmConfig::default();
        fs::write(&path, toml::to_string_pretty(&default_cfg)?)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}
