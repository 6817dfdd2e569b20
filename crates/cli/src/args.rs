//! Command-line arguments and their merge into [`SweepConfig`]

use std::path::PathBuf;

use clap::Parser;

use storysweep_sweep::{ScreenshotMode, SweepConfig};
use storysweep_web::ENGINE_SCRIPT_PATH;

use crate::output::OutputFormat;

/// storysweep - accessibility sweep of a built Storybook
#[derive(Parser, Debug)]
#[command(name = "storysweep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to your compiled Storybook directory (create with build-storybook)
    #[arg(long, env = "STORYSWEEP_STORYBOOK", required_unless_present = "config")]
    pub storybook: Option<PathBuf>,

    /// The port of the local internal HTTP server [default: 9876]
    #[arg(long)]
    pub port: Option<u16>,

    /// Dump screenshots of components that fail
    #[arg(long, conflicts_with = "screenshot_all")]
    pub screenshot: bool,

    /// Dump screenshots of all components
    #[arg(long)]
    pub screenshot_all: bool,

    /// TOML configuration file; flags override its values
    #[arg(short, long, env = "STORYSWEEP_CONFIG")]
    pub config: Option<PathBuf>,

    /// axe-core script to serve when the Storybook build does not include one
    #[arg(long)]
    pub axe_script: Option<PathBuf>,

    /// Directory screenshots are written to [default: .]
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Wait after each advance so animations settle (ms) [default: 1000]
    #[arg(long)]
    pub settle_ms: Option<u64>,

    /// Key hold time (ms) [default: 150]
    #[arg(long)]
    pub key_delay_ms: Option<u64>,

    /// Give up on an audit report after this many seconds [default: 120]
    #[arg(long)]
    pub report_timeout_secs: Option<u64>,

    /// Show the browser window
    #[arg(long)]
    pub headful: bool,

    /// Chrome/Chromium executable
    #[arg(long, env = "CHROME")]
    pub chrome: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Load the config file (if any) and apply flag overrides.
    pub fn to_config(&self) -> anyhow::Result<SweepConfig> {
        let mut config = match &self.config {
            Some(path) => SweepConfig::load(path)?,
            None => SweepConfig::default(),
        };

        if let Some(dir) = &self.storybook {
            config.catalog_dir = dir.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if self.screenshot_all {
            config.screenshots = ScreenshotMode::All;
        } else if self.screenshot {
            config.screenshots = ScreenshotMode::Failures;
        }
        if let Some(script) = &self.axe_script {
            config.engine_script = Some(script.clone());
        }
        if config.engine_script.is_some() {
            config.engine_path = ENGINE_SCRIPT_PATH.to_string();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(ms) = self.settle_ms {
            config.settle_ms = ms;
        }
        if let Some(ms) = self.key_delay_ms {
            config.key_delay_ms = ms;
        }
        if let Some(secs) = self.report_timeout_secs {
            config.report_timeout_secs = secs;
        }
        if self.headful {
            config.browser.headless = false;
        }
        if let Some(chrome) = &self.chrome {
            config.browser.executable = Some(chrome.clone());
        }

        config.catalog_dir = std::path::absolute(&config.catalog_dir)?;
        config.validate()?;
        Ok(config)
    }
}
