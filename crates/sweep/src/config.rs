//! Sweep configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use storysweep_common::{Error, Result};

/// When to write screenshots of audited entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenshotMode {
    #[default]
    None,
    /// `failed-<name>.png` for entries with violations left after filtering
    Failures,
    /// `screenshot-<name>.png` for every entry
    All,
}

impl std::fmt::Display for ScreenshotMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScreenshotMode::None => write!(f, "none"),
            ScreenshotMode::Failures => write!(f, "failures"),
            ScreenshotMode::All => write!(f, "all"),
        }
    }
}

/// Headless browser settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub device_scale_factor: f64,

    /// Chrome/Chromium binary (None = auto-detect)
    pub executable: Option<PathBuf>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1920,
            viewport_height: 1080,
            device_scale_factor: 1.0,
            executable: None,
        }
    }
}

/// Explorer DOM selectors
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    /// Selected node inside the tree; its `offsetTop` is the position
    pub selected_tree_item: String,

    /// Selected node inside the menu; its `id` names the entry
    pub selected_menu_item: String,

    /// Present once the tree has rendered at least one component
    pub tree_ready: String,

    /// Clicked to focus the tree before the first keyboard command
    pub first_item: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            selected_tree_item: r#"#storybook-explorer-tree [data-selected="true"]"#.to_string(),
            selected_menu_item: r#"#storybook-explorer-menu [data-selected="true"]"#.to_string(),
            tree_ready: r#"#storybook-explorer-tree [data-nodetype="component"]"#.to_string(),
            first_item: "#storybook-explorer-tree .sidebar-item".to_string(),
        }
    }
}

/// Sweep configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Built catalog directory
    pub catalog_dir: PathBuf,

    /// Local server port
    pub port: u16,

    /// Rule engine script to serve when the catalog does not ship one
    pub engine_script: Option<PathBuf>,

    /// Engine URL relative to the server root
    pub engine_path: String,

    /// Regex matched against frame URLs to find the story frame
    pub content_frame_pattern: String,

    pub screenshots: ScreenshotMode,

    /// Directory screenshots are written to
    pub output_dir: PathBuf,

    /// Delay between key down and key up
    pub key_delay_ms: u64,

    /// Quiescence after advancing, before the next audit
    pub settle_ms: u64,

    /// Upper bound on the console rendezvous with the rule engine
    pub report_timeout_secs: u64,

    /// How long to wait for the tree to render on load
    pub ready_timeout_secs: u64,

    /// Descend/sibling rounds per advance
    pub advance_attempts: usize,

    /// Consecutive stalled advances before the sweep is considered finished
    pub stall_limit: usize,

    /// Entries audited without wrapping before the sweep is aborted
    pub max_entries: usize,

    pub browser: BrowserSettings,
    pub selectors: Selectors,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            catalog_dir: PathBuf::from("storybook-static"),
            port: storysweep_common::DEFAULT_PORT,
            engine_script: None,
            engine_path: "/axe.min.js".to_string(),
            content_frame_pattern: "iframe".to_string(),
            screenshots: ScreenshotMode::None,
            output_dir: PathBuf::from("."),
            key_delay_ms: 150,
            settle_ms: 1000,
            report_timeout_secs: 120,
            ready_timeout_secs: 30,
            advance_attempts: 3,
            stall_limit: 2,
            max_entries: 10_000,
            browser: BrowserSettings::default(),
            selectors: Selectors::default(),
        }
    }
}

impl SweepConfig {
    /// Load configuration from file, or defaults if it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)
                .map_err(|e| Error::InvalidConfig(format!("{}: {}", path.display(), e)))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.advance_attempts == 0 {
            return Err(Error::InvalidConfig("advance_attempts must be at least 1".into()));
        }
        if self.stall_limit == 0 {
            return Err(Error::InvalidConfig("stall_limit must be at least 1".into()));
        }
        if self.max_entries == 0 {
            return Err(Error::InvalidConfig("max_entries must be at least 1".into()));
        }
        regex::Regex::new(&self.content_frame_pattern).map_err(|e| {
            Error::InvalidConfig(format!("content_frame_pattern: {}", e))
        })?;
        Ok(())
    }

    /// Absolute engine URL for a server base URL
    pub fn engine_url(&self, base_url: &str) -> String {
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            self.engine_path.trim_start_matches('/')
        )
    }

    pub fn key_delay(&self) -> Duration {
        Duration::from_millis(self.key_delay_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn report_timeout(&self) -> Duration {
        Duration::from_secs(self.report_timeout_secs)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_secs)
    }
}
