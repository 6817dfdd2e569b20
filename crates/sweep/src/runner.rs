//! The sweep loop: audit, report, advance, settle, check for wrap-around

use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use storysweep_common::{
    filter_violations, format_entry, EntryReport, Error, Result, SweepSummary,
    TreeSelectionPosition,
};

use crate::audit::{AuditRunner, RawAudit};
use crate::config::{ScreenshotMode, SweepConfig};
use crate::selection::SelectionTracker;
use crate::session::BrowserSession;
use crate::traversal::{AdvanceOutcome, TraversalDriver, WrapCheck};

/// Screenshot taken when a sweep aborts mid-entry
pub const FAILURE_SCREENSHOT: &str = "failed.png";

/// Drives one sweep over a catalog through a [`BrowserSession`].
///
/// Entry reports are written to `out` as soon as each entry is audited, so a
/// crash mid-sweep keeps everything printed so far.
pub struct SweepRunner<S, W> {
    session: S,
    out: W,
    config: SweepConfig,
    driver: TraversalDriver,
    auditor: AuditRunner,
}

impl<S: BrowserSession, W: Write + Send> SweepRunner<S, W> {
    /// `base_url` is where the catalog is served; the engine URL hangs off it.
    pub fn new(session: S, out: W, config: SweepConfig, base_url: &str) -> Result<Self> {
        config.validate()?;

        let tracker = SelectionTracker::new(&config.selectors);
        let driver = TraversalDriver::new(tracker.clone(), config.key_delay(), config.advance_attempts);
        let auditor = AuditRunner::new(
            &config.content_frame_pattern,
            config.engine_url(base_url),
            config.report_timeout(),
            tracker,
        )?;

        Ok(Self {
            session,
            out,
            config,
            driver,
            auditor,
        })
    }

    /// Give the session and writer back, e.g. to close the browser
    pub fn into_parts(self) -> (S, W) {
        (self.session, self.out)
    }

    /// Open the explorer and select the first entry.
    pub async fn navigate_to_first_entry(&mut self, base_url: &str) -> Result<()> {
        debug!("Navigating to {}", base_url);
        self.session.navigate(base_url).await?;

        let ready = self.config.selectors.tree_ready.clone();
        match self
            .session
            .wait_for_selector(&ready, self.config.ready_timeout())
            .await
        {
            Ok(()) => {}
            Err(Error::Timeout(_)) => {
                return Err(Error::EmptyCatalog(format!(
                    "no component appeared in the explorer within {}s",
                    self.config.ready_timeout_secs
                )))
            }
            Err(e) => return Err(e),
        }

        let first = self.config.selectors.first_item.clone();
        self.session.click(&first).await?;

        if let AdvanceOutcome::Exhausted = self.driver.position_on_first_entry(&mut self.session).await? {
            warn!("Could not move past the first tree item; auditing whatever is selected");
        }

        if self.driver.tracker().current_position(&mut self.session).await?.is_none() {
            return Err(Error::EmptyCatalog("no tree item could be selected".into()));
        }
        Ok(())
    }

    /// Run a full sweep: position on the first entry and loop until wrap-around.
    pub async fn run(&mut self, base_url: &str) -> Result<SweepSummary> {
        let started = Instant::now();
        let mut summary = SweepSummary::new();

        self.navigate_to_first_entry(base_url).await?;

        info!("Starting checks");
        let mut stalls = 0usize;
        let mut audits = 0usize;

        loop {
            if audits >= self.config.max_entries {
                return Err(Error::TraversalRunaway { entries: audits });
            }

            let before = self.driver.tracker().require_position(&mut self.session).await?;

            let raw = match self.auditor.audit(&mut self.session).await {
                Ok(raw) => raw,
                Err(e) => {
                    self.capture_failure().await;
                    return Err(e);
                }
            };
            audits += 1;

            let mut report = self.reduce(&raw);
            report.screenshot = self.take_screenshot(&report).await?;

            let repeat = stalls > 0
                && summary.entries.last().map(|e| e.name == report.name).unwrap_or(false);
            if repeat {
                info!("{} audited again after a stalled advance", report.name);
                if let Some(last) = summary.entries.last_mut() {
                    *last = report;
                }
            } else {
                self.emit(&report)?;
                summary.entries.push(report);
            }

            let (outcome, after) = match self.step_forward().await {
                Ok(step) => step,
                Err(e) => {
                    self.capture_failure().await;
                    return Err(e);
                }
            };

            if !outcome.advanced() && after == before {
                stalls += 1;
                if stalls >= self.config.stall_limit {
                    // A lone entry has nowhere to go; anything longer stuck
                    // mid-catalog is an incomplete sweep.
                    if summary.entries.len() > 1 {
                        let entry = summary
                            .entries
                            .last()
                            .map(|e| e.name.clone())
                            .unwrap_or_default();
                        self.capture_failure().await;
                        return Err(Error::TraversalStalled {
                            entry,
                            entries: summary.entries.len(),
                        });
                    }
                    warn!(
                        "Selection stopped moving at offset {} on the only entry; ending the sweep",
                        after
                    );
                    break;
                }
            } else {
                stalls = 0;
            }

            if self.driver.check_wrap(after) == WrapCheck::Complete {
                break;
            }
        }

        summary.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            "Checked {} entries: {} with violations, {} unparsed ({} ms)",
            summary.entries.len(),
            summary.failing_entries(),
            summary.unparsed_entries(),
            summary.duration_ms
        );
        Ok(summary)
    }

    /// Advance, let transitions finish so contrast checks see final colors,
    /// then read where the selection landed.
    async fn step_forward(&mut self) -> Result<(AdvanceOutcome, TreeSelectionPosition)> {
        let outcome = self.driver.advance(&mut self.session).await?;
        tokio::time::sleep(self.config.settle()).await;
        let after = self.driver.tracker().require_position(&mut self.session).await?;
        Ok((outcome, after))
    }

    /// Parse and filter one raw report. A bad payload becomes zero violations.
    fn reduce(&self, raw: &RawAudit) -> EntryReport {
        match raw.parse() {
            Ok(result) => {
                let violations = filter_violations(result.violations);
                if !violations.is_empty() {
                    debug!(
                        "{}",
                        serde_json::to_string_pretty(&violations).unwrap_or_default()
                    );
                }
                EntryReport {
                    name: raw.name.clone(),
                    violations,
                    parse_error: None,
                    screenshot: None,
                }
            }
            Err(e) => {
                warn!("{}: {}", raw.name, e);
                EntryReport {
                    name: raw.name.clone(),
                    violations: Vec::new(),
                    parse_error: Some(format!("Couldn't parse! {}", raw.payload)),
                    screenshot: None,
                }
            }
        }
    }

    fn emit(&mut self, report: &EntryReport) -> Result<()> {
        if let Some(msg) = &report.parse_error {
            writeln!(self.out, "{}", msg)?;
        }
        let text = format_entry(&report.name, &report.violations);
        if !text.is_empty() {
            self.out.write_all(text.as_bytes())?;
        }
        self.out.flush()?;
        Ok(())
    }

    async fn take_screenshot(&mut self, report: &EntryReport) -> Result<Option<PathBuf>> {
        let file = match self.config.screenshots {
            ScreenshotMode::None => return Ok(None),
            ScreenshotMode::All => format!("screenshot-{}.png", report.name),
            ScreenshotMode::Failures if !report.violations.is_empty() => {
                format!("failed-{}.png", report.name)
            }
            ScreenshotMode::Failures => return Ok(None),
        };

        std::fs::create_dir_all(&self.config.output_dir)?;
        let path = self.config.output_dir.join(file);
        self.session.screenshot(&path).await?;
        debug!("Saved {}", path.display());
        Ok(Some(path))
    }

    /// Best effort: the original error matters more than a failed capture.
    async fn capture_failure(&mut self) {
        let path = self.config.output_dir.join(FAILURE_SCREENSHOT);
        if let Err(e) = std::fs::create_dir_all(&self.config.output_dir) {
            error!("Could not create {}: {}", self.config.output_dir.display(), e);
            return;
        }
        if let Err(e) = self.session.screenshot(&path).await {
            error!("Could not save {}: {}", path.display(), e);
        }
    }
}
