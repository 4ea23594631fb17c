//! Configuration management for the cardflow host.
//!
//! Every value has a compile-time default matching the library constants.
//! A TOML file can override them; it is looked up in the following
//! locations (in order):
//! 1. The path given with `--config`
//! 2. The platform config dir, e.g. `~/.config/cardflow/config.toml` on Linux
//!    or `%APPDATA%/cardflow/config.toml` on Windows
//! 3. `~/.config/cardflow/config.toml` (Unix-style fallback)
//! 4. `./cardflow.toml` (current directory, for development)

use anyhow::{Context, Result};
use cardflow_core_layout::{
    CardLayout, Size, TransitionGeometry, DEFAULT_PAGE_COUNT, DEFAULT_SOURCE_Y_OFFSET,
    DEFAULT_TOP_CHROME_HEIGHT,
};
use cardflow_transition::{
    CardToDetailAnimator, DEFAULT_DAMPING_RATIO, DEFAULT_DURATION, DEFAULT_INITIAL_VELOCITY,
};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::Level;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Card and viewport geometry.
    pub layout: LayoutConfig,
    /// Spring parameters for the card-to-detail transition.
    pub transition: TransitionConfig,
    /// Chrome above the card grid.
    pub chrome: ChromeConfig,
    /// Host behavior.
    pub behavior: BehaviorConfig,
}

/// Layout-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Width of the window in points.
    #[serde(default = "default_viewport_width")]
    pub viewport_width: f64,

    /// Height of the window in points.
    #[serde(default = "default_viewport_height")]
    pub viewport_height: f64,

    /// Width of every card in points.
    #[serde(default = "default_item_width")]
    pub item_width: f64,

    /// Height of every card in points.
    #[serde(default = "default_item_height")]
    pub item_height: f64,

    /// Gap between neighbouring cards. Pages are one card plus one gap.
    #[serde(default)]
    pub item_spacing: f64,

    /// Number of cards in the carousel.
    #[serde(default = "default_item_count")]
    pub item_count: usize,

    /// Number of card-width pages on the paging surface.
    #[serde(default = "default_page_count")]
    pub page_count: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            item_width: default_item_width(),
            item_height: default_item_height(),
            item_spacing: 0.0,
            item_count: default_item_count(),
            page_count: default_page_count(),
        }
    }
}

impl LayoutConfig {
    pub fn window_size(&self) -> Size {
        Size::new(self.viewport_width, self.viewport_height)
    }

    pub fn card_layout(&self) -> CardLayout {
        CardLayout::new(Size::new(self.item_width, self.item_height), self.item_count)
            .with_spacing(self.item_spacing)
    }
}

/// Transition spring configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    /// Transition length in milliseconds.
    #[serde(default = "default_duration_ms")]
    pub duration_ms: u64,

    /// Spring damping ratio (1.0 = critically damped).
    #[serde(default = "default_damping_ratio")]
    pub damping_ratio: f64,

    /// Initial spring velocity in distances per second.
    #[serde(default = "default_initial_velocity")]
    pub initial_velocity: f64,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            duration_ms: default_duration_ms(),
            damping_ratio: default_damping_ratio(),
            initial_velocity: default_initial_velocity(),
        }
    }
}

impl TransitionConfig {
    pub fn animator(&self) -> CardToDetailAnimator {
        CardToDetailAnimator::new(
            Duration::from_millis(self.duration_ms),
            self.damping_ratio,
            self.initial_velocity,
        )
    }
}

/// Chrome configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChromeConfig {
    /// Height of the status/navigation bar above the grid.
    #[serde(default = "default_top_chrome_height")]
    pub top_chrome_height: f64,

    /// Vertical offset of the cards inside the grid.
    #[serde(default = "default_source_y_offset")]
    pub source_y_offset: f64,
}

impl Default for ChromeConfig {
    fn default() -> Self {
        Self {
            top_chrome_height: default_top_chrome_height(),
            source_y_offset: default_source_y_offset(),
        }
    }
}

impl ChromeConfig {
    pub fn geometry(&self) -> TransitionGeometry {
        TransitionGeometry::new(self.top_chrome_height, self.source_y_offset)
    }
}

/// Behavior-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Interval between animation frames in milliseconds.
    #[serde(default = "default_frame_interval")]
    pub frame_interval_ms: u64,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            frame_interval_ms: default_frame_interval(),
        }
    }
}

// Default value functions for serde
fn default_viewport_width() -> f64 {
    375.0
}

fn default_viewport_height() -> f64 {
    667.0
}

fn default_item_width() -> f64 {
    300.0
}

fn default_item_height() -> f64 {
    520.0
}

fn default_item_count() -> usize {
    8
}

fn default_page_count() -> usize {
    DEFAULT_PAGE_COUNT
}

fn default_duration_ms() -> u64 {
    DEFAULT_DURATION.as_millis() as u64
}

fn default_damping_ratio() -> f64 {
    DEFAULT_DAMPING_RATIO
}

fn default_initial_velocity() -> f64 {
    DEFAULT_INITIAL_VELOCITY
}

fn default_top_chrome_height() -> f64 {
    DEFAULT_TOP_CHROME_HEIGHT
}

fn default_source_y_offset() -> f64 {
    DEFAULT_SOURCE_Y_OFFSET
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_frame_interval() -> u64 {
    16
}

/// A config value that was out of range and has been replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigWarning {
    pub field: &'static str,
    pub message: String,
}

impl ConfigWarning {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Parse a log level name, falling back to INFO.
pub fn parse_log_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

impl Config {
    /// Load configuration from an explicit path or the standard locations.
    ///
    /// Returns default config if no file is found.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_path(path);
        }

        for path in &config_paths() {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Height of the grid's viewport: the window minus the top chrome.
    pub fn grid_height(&self) -> f64 {
        self.layout.viewport_height - self.chrome.top_chrome_height
    }

    /// Replace out-of-range values so the layout can always be built.
    pub fn validate(&mut self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let defaults = LayoutConfig::default();

        if self.layout.viewport_width <= 0.0 || self.layout.viewport_height <= 0.0 {
            warnings.push(ConfigWarning::new(
                "layout.viewport",
                format!(
                    "{}x{} is not a valid viewport, using {}x{}",
                    self.layout.viewport_width,
                    self.layout.viewport_height,
                    defaults.viewport_width,
                    defaults.viewport_height
                ),
            ));
            self.layout.viewport_width = defaults.viewport_width;
            self.layout.viewport_height = defaults.viewport_height;
        }

        if self.chrome.top_chrome_height < 0.0
            || self.chrome.top_chrome_height >= self.layout.viewport_height
        {
            warnings.push(ConfigWarning::new(
                "chrome.top_chrome_height",
                format!(
                    "{} does not fit the viewport, using {}",
                    self.chrome.top_chrome_height, DEFAULT_TOP_CHROME_HEIGHT
                ),
            ));
            self.chrome.top_chrome_height = DEFAULT_TOP_CHROME_HEIGHT;
        }

        if self.layout.item_width <= 0.0 || self.layout.item_width > self.layout.viewport_width {
            let width = defaults.item_width.min(self.layout.viewport_width);
            warnings.push(ConfigWarning::new(
                "layout.item_width",
                format!(
                    "{} must be in (0, {}], using {}",
                    self.layout.item_width, self.layout.viewport_width, width
                ),
            ));
            self.layout.item_width = width;
        }

        // The card must cover the grid's vertical middle or nothing can be
        // centered.
        let grid_height = self.grid_height();
        if self.layout.item_height < grid_height / 2.0 || self.layout.item_height > grid_height {
            let height = defaults.item_height.clamp(grid_height / 2.0, grid_height);
            warnings.push(ConfigWarning::new(
                "layout.item_height",
                format!(
                    "{} must be in [{}, {}], using {}",
                    self.layout.item_height,
                    grid_height / 2.0,
                    grid_height,
                    height
                ),
            ));
            self.layout.item_height = height;
        }

        if self.layout.item_spacing < 0.0 {
            warnings.push(ConfigWarning::new(
                "layout.item_spacing",
                format!("{} is negative, using 0", self.layout.item_spacing),
            ));
            self.layout.item_spacing = 0.0;
        }

        if self.layout.page_count == 0 {
            warnings.push(ConfigWarning::new(
                "layout.page_count",
                format!("must be at least 1, using {}", DEFAULT_PAGE_COUNT),
            ));
            self.layout.page_count = DEFAULT_PAGE_COUNT;
        }

        if self.transition.damping_ratio <= 0.0 {
            warnings.push(ConfigWarning::new(
                "transition.damping_ratio",
                format!("must be positive, using {}", DEFAULT_DAMPING_RATIO),
            ));
            self.transition.damping_ratio = DEFAULT_DAMPING_RATIO;
        }

        if self.behavior.frame_interval_ms == 0 {
            warnings.push(ConfigWarning::new(
                "behavior.frame_interval_ms",
                format!("must be positive, using {}", default_frame_interval()),
            ));
            self.behavior.frame_interval_ms = default_frame_interval();
        }

        let level = self.behavior.log_level.to_lowercase();
        if !matches!(level.as_str(), "trace" | "debug" | "info" | "warn" | "error") {
            warnings.push(ConfigWarning::new(
                "behavior.log_level",
                format!("unknown level '{}', using info", self.behavior.log_level),
            ));
            self.behavior.log_level = default_log_level();
        }

        warnings
    }
}

/// Get all possible config file paths in priority order.
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(proj_dirs) = ProjectDirs::from("com", "cardflow", "cardflow") {
        paths.push(proj_dirs.config_dir().join("config.toml"));
    }

    if let Some(home) = dirs_home() {
        paths.push(home.join(".config").join("cardflow").join("config.toml"));
    }

    paths.push(PathBuf::from("cardflow.toml"));

    paths
}

/// Get the user's home directory.
fn dirs_home() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}
