//! Runs the accessibility rule engine against the selected story

use std::time::Duration;

use futures::StreamExt;
use regex::Regex;
use tracing::{debug, info};

use storysweep_common::{AuditResult, Error, Result};

use crate::selection::SelectionTracker;
use crate::session::{BrowserSession, FrameRef};

/// Inline script that runs the engine and reports on the console as one line
pub const INVOKE_ENGINE_JS: &str = "window.axe.run().then(x => console.log(JSON.stringify(x)))";

/// Unparsed engine output for one entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAudit {
    pub name: String,
    pub payload: String,
}

impl RawAudit {
    /// Decode the payload. Failure is recoverable: see [`Error::ReportParse`].
    pub fn parse(&self) -> Result<AuditResult> {
        parse_report(&self.payload)
    }
}

/// Decode one console payload into an [`AuditResult`]
pub fn parse_report(payload: &str) -> Result<AuditResult> {
    serde_json::from_str(payload).map_err(|e| Error::ReportParse(e.to_string()))
}

/// Injects the engine into the story frame and awaits its report
#[derive(Debug, Clone)]
pub struct AuditRunner {
    frame_pattern: Regex,
    engine_url: String,
    report_timeout: Duration,
    tracker: SelectionTracker,
}

impl AuditRunner {
    pub fn new(
        frame_pattern: &str,
        engine_url: impl Into<String>,
        report_timeout: Duration,
        tracker: SelectionTracker,
    ) -> Result<Self> {
        let frame_pattern = Regex::new(frame_pattern)
            .map_err(|e| Error::InvalidConfig(format!("content frame pattern: {}", e)))?;
        Ok(Self {
            frame_pattern,
            engine_url: engine_url.into(),
            report_timeout,
            tracker,
        })
    }

    pub fn engine_url(&self) -> &str {
        &self.engine_url
    }

    /// Find the frame hosting the rendered story
    pub async fn content_frame<S: BrowserSession + ?Sized>(
        &self,
        session: &mut S,
    ) -> Result<FrameRef> {
        session
            .frames()
            .await?
            .into_iter()
            .find(|f| self.frame_pattern.is_match(&f.url))
            .ok_or_else(|| Error::ContentFrameMissing {
                pattern: self.frame_pattern.as_str().to_string(),
            })
    }

    /// Audit the selected entry: one engine run, one console line back.
    pub async fn audit<S: BrowserSession + ?Sized>(&self, session: &mut S) -> Result<RawAudit> {
        let frame = self.content_frame(session).await?;
        debug!("Auditing frame {}", frame.url);

        session.add_script_url(&frame, &self.engine_url).await?;

        // Subscribe before the invocation so the report cannot be missed.
        let mut console = session.console().await?;
        session.add_script_content(&frame, INVOKE_ENGINE_JS).await?;

        let payload = match tokio::time::timeout(self.report_timeout, console.next()).await {
            Ok(Some(line)) => line,
            Ok(None) => {
                return Err(Error::Browser(
                    "console closed before the audit report arrived".into(),
                ))
            }
            Err(_) => {
                return Err(Error::ReportTimeout {
                    seconds: self.report_timeout.as_secs(),
                })
            }
        };

        let name = self.tracker.current_entry_name(session).await?;
        info!("Audited {}", name);

        Ok(RawAudit { name, payload })
    }
}
