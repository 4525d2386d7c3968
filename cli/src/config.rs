//! Service configuration.
//!
//! Configuration is stored in ~/.voxclone/config.yaml unless a path is
//! given explicitly. Missing fields take their defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use voxclone_pipeline::{DeviceSelection, PipelineConfig};

use crate::paths::Paths;

/// Default listen address; a leading `:` binds all interfaces.
pub const DEFAULT_LISTEN: &str = ":8000";

/// voxclone configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP listen address. The `PORT` environment variable overrides the port.
    pub listen: String,

    /// Directory for final artifacts.
    pub output_dir: PathBuf,

    /// Directory for per-request working files.
    pub work_dir: PathBuf,

    /// Directory holding base speaker and converter checkpoints.
    pub checkpoint_dir: PathBuf,

    /// `auto`, `cpu`, `cuda`, `cuda:N` or `metal`.
    pub device: DeviceSelection,

    /// Concurrent conversions (optional, defaults to the device capacity).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrent_conversions: Option<usize>,

    /// How long a conversion waits for a free device slot.
    pub slot_timeout_ms: u64,

    /// Where the uploaded reference sample is kept. Clone outputs never
    /// replace this file.
    pub reference_audio_path: PathBuf,

    /// Default log filter when `RUST_LOG` is unset (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Path to the config file (not serialized).
    #[serde(skip)]
    config_path: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
            output_dir: PathBuf::from("outputs"),
            work_dir: std::env::temp_dir().join("voxclone"),
            checkpoint_dir: PathBuf::from("checkpoints"),
            device: DeviceSelection::Auto,
            max_concurrent_conversions: None,
            slot_timeout_ms: 30_000,
            reference_audio_path: PathBuf::from("reference").join("reference_audio.wav"),
            log_level: None,
            config_path: PathBuf::new(),
        }
    }
}

impl ServiceConfig {
    /// Returns the config file path.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Saves the configuration to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&self.config_path, content)?;
        Ok(())
    }

    /// Replaces the port of `listen` with `port`, keeping the host.
    pub fn override_port(&mut self, port: &str) -> anyhow::Result<()> {
        let port: u16 = port
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid PORT value: {port}"))?;
        let host = self
            .listen
            .rsplit_once(':')
            .map(|(host, _)| host)
            .unwrap_or(self.listen.as_str());
        self.listen = format!("{host}:{port}");
        Ok(())
    }

    /// Applies environment overrides (`PORT`).
    pub fn apply_env(&mut self) -> anyhow::Result<()> {
        if let Ok(port) = std::env::var("PORT") {
            self.override_port(&port)?;
        }
        Ok(())
    }

    /// Sets one field by its YAML key. `none` clears optional fields.
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        let optional = |v: &str| (!v.eq_ignore_ascii_case("none")).then(|| v.to_string());
        match key.replace('-', "_").as_str() {
            "listen" => self.listen = value.to_string(),
            "output_dir" => self.output_dir = PathBuf::from(value),
            "work_dir" => self.work_dir = PathBuf::from(value),
            "checkpoint_dir" => self.checkpoint_dir = PathBuf::from(value),
            "device" => self.device = value.parse().map_err(anyhow::Error::msg)?,
            "max_concurrent_conversions" => {
                self.max_concurrent_conversions = optional(value).map(|v| v.parse::<usize>()).transpose()?
            }
            "slot_timeout_ms" => self.slot_timeout_ms = value.parse()?,
            "reference_audio_path" => self.reference_audio_path = PathBuf::from(value),
            "log_level" => self.log_level = optional(value),
            other => anyhow::bail!("unknown config key: {other}"),
        }
        Ok(())
    }

    pub fn slot_timeout(&self) -> Duration {
        Duration::from_millis(self.slot_timeout_ms)
    }

    /// Returns the settings the pipeline needs.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            output_dir: self.output_dir.clone(),
            work_dir: self.work_dir.clone(),
            checkpoint_dir: self.checkpoint_dir.clone(),
            device: self.device,
            max_concurrent_conversions: self.max_concurrent_conversions,
            slot_timeout: self.slot_timeout(),
            protected_paths: vec![self.reference_audio_path.clone()],
        }
    }
}

/// Loads configuration from `custom_path`, or ~/.voxclone/config.yaml.
///
/// A missing file is created with the defaults.
pub fn load_config(custom_path: Option<&str>) -> anyhow::Result<ServiceConfig> {
    let config_path = match custom_path {
        Some(p) => PathBuf::from(p),
        None => Paths::new()?.config_file(),
    };

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut cfg = if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        if content.trim().is_empty() {
            ServiceConfig::default()
        } else {
            serde_yaml::from_str(&content)?
        }
    } else {
        let cfg = ServiceConfig::default();
        std::fs::write(&config_path, serde_yaml::to_string(&cfg)?)?;
        cfg
    };

    cfg.config_path = config_path;
    Ok(cfg)
}
