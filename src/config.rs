use std::path::PathBuf;
use std::time::Duration;

use log::{debug, info};
use serde::Deserialize;

use crate::source::Order;

// ---------------------------------------------------------------------------
// ConfigFile: deserialized from TOML (all fields optional)
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub spacing: Option<f64>,
    pub backward_margin: Option<f64>,
    pub shuffle: Option<bool>,
    pub seed: Option<u64>,
    #[serde(default)]
    pub render: RenderConfigFile,
    #[serde(default)]
    pub viewer: ViewerConfigFile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RenderConfigFile {
    pub line_height: Option<f64>,
    pub image_art: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ViewerConfigFile {
    pub scroll_step: Option<u32>,
    pub frame_budget_ms: Option<u64>,
    pub watch_interval_ms: Option<u64>,
}

// ---------------------------------------------------------------------------
// Config: resolved (all fields concrete)
// ---------------------------------------------------------------------------

pub struct Config {
    pub spacing: f64,
    pub backward_margin: f64,
    pub shuffle: bool,
    pub seed: Option<u64>,
    pub render: RenderConfig,
    pub viewer: ViewerConfig,
}

pub struct RenderConfig {
    pub line_height: f64,
    pub image_art: Option<PathBuf>,
}

pub struct ViewerConfig {
    pub scroll_step: u32,
    pub frame_budget: Duration,
    pub watch_interval: Duration,
}

impl Config {
    /// Entry order the data source should apply.
    pub fn order(&self) -> Order {
        if self.shuffle {
            Order::Shuffled(self.seed)
        } else {
            Order::AsStored
        }
    }
}

/// CLI values that take precedence over the config file.
#[derive(Default, Clone)]
pub struct CliOverrides {
    pub spacing: Option<f64>,
    pub backward_margin: Option<f64>,
    pub shuffle: bool,
    pub seed: Option<u64>,
}

impl ConfigFile {
    /// Merge CLI values (overwrites non-None fields).
    pub fn merge_cli(&mut self, cli: &CliOverrides) {
        if let Some(v) = cli.spacing {
            debug!("config: CLI override spacing={v}");
            self.spacing = Some(v);
        }
        if let Some(v) = cli.backward_margin {
            debug!("config: CLI override backward_margin={v}");
            self.backward_margin = Some(v);
        }
        if cli.shuffle {
            debug!("config: CLI override shuffle=true");
            self.shuffle = Some(true);
        }
        if let Some(v) = cli.seed {
            debug!("config: CLI override seed={v}");
            self.seed = Some(v);
        }
    }

    /// Resolve to a Config by applying defaults to missing fields.
    pub fn resolve(self) -> Config {
        let config = Config {
            spacing: self.spacing.unwrap_or(1.0).max(0.0),
            backward_margin: self.backward_margin.unwrap_or(1.0).max(0.0),
            shuffle: self.shuffle.unwrap_or(false),
            seed: self.seed,
            render: RenderConfig {
                line_height: self
                    .render
                    .line_height
                    .filter(|h| h.is_finite() && *h > 0.0)
                    .unwrap_or(1.0),
                image_art: self.render.image_art,
            },
            viewer: ViewerConfig {
                scroll_step: self.viewer.scroll_step.unwrap_or(3),
                frame_budget: Duration::from_millis(self.viewer.frame_budget_ms.unwrap_or(32)),
                watch_interval: Duration::from_millis(
                    self.viewer.watch_interval_ms.unwrap_or(200),
                ),
            },
        };
        info!(
            "config: resolved spacing={}, backward_margin={}, shuffle={}, seed={:?}, \
             line_height={}, image_art={:?}, scroll_step={}, frame_budget={}ms, \
             watch_interval={}ms",
            config.spacing,
            config.backward_margin,
            config.shuffle,
            config.seed,
            config.render.line_height,
            config.render.image_art,
            config.viewer.scroll_step,
            config.viewer.frame_budget.as_millis(),
            config.viewer.watch_interval.as_millis(),
        );
        config
    }
}

/// Resolve the XDG config path for scrollpool.
fn config_path() -> Option<PathBuf> {
    let config_dir = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
    Some(config_dir.join("scrollpool").join("config.toml"))
}

/// Load config file. Returns `ConfigFile::default()` if no file exists.
/// Returns an error if the file exists but cannot be parsed.
pub fn load_config() -> anyhow::Result<ConfigFile> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            info!("config: no HOME or XDG_CONFIG_HOME set, using defaults");
            return Ok(ConfigFile::default());
        }
    };
    load_config_from(&path)
}

fn load_config_from(path: &std::path::Path) -> anyhow::Result<ConfigFile> {
    debug!("config: looking for {}", path.display());
    match std::fs::read_to_string(path) {
        Ok(text) => {
            info!("config: loaded from {}", path.display());
            let cfg: ConfigFile = toml::from_str(&text)
                .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("config: {} not found, using defaults", path.display());
            Ok(ConfigFile::default())
        }
        Err(e) => Err(anyhow::anyhow!("failed to read {}: {e}", path.display())),
    }
}
