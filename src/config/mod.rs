use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use log::{debug, info, LevelFilter};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "asmem.ini";
pub const DEFAULT_SOURCE: &str = "/proc/meminfo";
pub const DEFAULT_INTERVAL_SECS: u64 = 1;
const MAX_PATH_LEN: usize = 4096;

fn default_source() -> PathBuf {
    PathBuf::from(DEFAULT_SOURCE)
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_SECS
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    #[serde(default = "default_source")]
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SamplingConfig {
    /// Seconds between samples.
    #[serde(default = "default_interval")]
    pub interval: u64,
    /// Terminate on the first failed sample instead of skipping the tick.
    #[serde(default)]
    pub fail_fast: bool,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct DisplayConfig {
    /// Always display megabytes.
    #[serde(default)]
    pub mb: bool,
    /// Show used memory instead of free.
    #[serde(default)]
    pub show_used: bool,
    /// Use MemFree as-is instead of free + buffers + cached.
    #[serde(default)]
    pub standard_free: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: default_source(),
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL_SECS,
            fail_fast: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl SamplingConfig {
    pub fn interval_duration(&self) -> Duration {
        Duration::from_secs(self.interval.max(1))
    }
}

impl AppConfig {
    pub fn new() -> Result<Self> {
        Self::from_file(DEFAULT_CONFIG_FILE)
    }

    pub fn get_log_level(&self) -> LevelFilter {
        match self.logging.level.to_lowercase().as_str() {
            "trace" => LevelFilter::Trace,
            "debug" => LevelFilter::Debug,
            "info" => LevelFilter::Info,
            "warn" => LevelFilter::Warn,
            "error" => LevelFilter::Error,
            "off" => LevelFilter::Off,
            _ => LevelFilter::Info, // Default to Info if invalid
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_path = path.as_ref();
        debug!("Loading configuration from {}", config_path.display());

        let config = Config::builder()
            .add_source(File::from(config_path).format(config::FileFormat::Ini))
            .add_source(
                Environment::with_prefix("ASMEM")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context(format!("Failed to load config from {}", config_path.display()))?;

        let mut app_config: AppConfig = config.try_deserialize()
            .context("Failed to deserialize config")?;
        app_config.validate()?;

        Ok(app_config)
    }

    /// Rejects values that cannot be used and repairs ones that have a sane fallback.
    pub fn validate(&mut self) -> Result<()> {
        let path_len = self.source.path.as_os_str().len();
        if path_len == 0 {
            bail!("source path is empty");
        }
        if path_len > MAX_PATH_LEN {
            bail!("source path is {} bytes long, the limit is {}", path_len, MAX_PATH_LEN);
        }

        if self.sampling.interval < 1 {
            debug!("Sampling interval {} is below 1s, using {}s", self.sampling.interval, DEFAULT_INTERVAL_SECS);
            self.sampling.interval = DEFAULT_INTERVAL_SECS;
        }
        Ok(())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let config_path = path.as_ref();

        let mut config_str = String::new();

        config_str.push_str(&format!("[source]\npath = {}\n\n", self.source.path.display()));

        config_str.push_str(&format!(
            "[sampling]\ninterval = {}\nfail_fast = {}\n\n",
            self.sampling.interval, self.sampling.fail_fast
        ));

        config_str.push_str(&format!(
            "[display]\nmb = {}\nshow_used = {}\nstandard_free = {}\n\n",
            self.display.mb, self.display.show_used, self.display.standard_free
        ));

        config_str.push_str(&format!("[logging]\nlevel = {}\n", self.logging.level));

        fs::write(config_path, config_str)
            .context(format!("Failed to save config to {}", config_path.display()))?;

        info!("Configuration saved to {}", config_path.display());
        Ok(())
    }
}
