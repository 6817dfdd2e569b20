//! Browser session capabilities the sweep needs

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;

use storysweep_common::Result;

/// Keys used to walk the explorer tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Expand / move into children
    ArrowRight,
    /// Move to the next visible item
    ArrowDown,
    /// Select the focused item
    Enter,
}

impl Key {
    /// DOM `key` value
    pub fn key(&self) -> &'static str {
        match self {
            Key::ArrowRight => "ArrowRight",
            Key::ArrowDown => "ArrowDown",
            Key::Enter => "Enter",
        }
    }

    /// DOM `code` value
    pub fn code(&self) -> &'static str {
        self.key()
    }

    /// Windows virtual key code, which Chrome needs for non-printing keys
    pub fn virtual_key_code(&self) -> i64 {
        match self {
            Key::ArrowRight => 39,
            Key::ArrowDown => 40,
            Key::Enter => 13,
        }
    }

    /// Text produced by the key, if any
    pub fn text(&self) -> Option<&'static str> {
        match self {
            Key::Enter => Some("\r"),
            _ => None,
        }
    }
}

/// A frame of the page, identified by whatever the session uses internally
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRef {
    pub id: String,
    pub url: String,
}

/// Console messages emitted by the page, in order, as text
pub type ConsoleStream = BoxStream<'static, String>;

/// One controllable page.
///
/// The sweep owns its session exclusively and never issues two calls at once.
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigate the top-level page and wait for the load to finish
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Wait until `selector` matches in the top-level document
    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> Result<()>;

    /// Click the first element matching `selector`
    async fn click(&mut self, selector: &str) -> Result<()>;

    /// Evaluate an expression in the top-level document and return its JSON value
    async fn evaluate(&mut self, expression: &str) -> Result<Value>;

    /// Key down, hold for `delay`, key up
    async fn press_key(&mut self, key: Key, delay: Duration) -> Result<()>;

    /// All frames currently attached to the page, main frame included
    async fn frames(&mut self) -> Result<Vec<FrameRef>>;

    /// Append a `<script src=url>` to the frame and wait for it to load
    async fn add_script_url(&mut self, frame: &FrameRef, url: &str) -> Result<()>;

    /// Append an inline `<script>` to the frame
    async fn add_script_content(&mut self, frame: &FrameRef, content: &str) -> Result<()>;

    /// Subscribe to console messages emitted from now on
    async fn console(&mut self) -> Result<ConsoleStream>;

    /// Write a full-page PNG to `path`
    async fn screenshot(&mut self, path: &Path) -> Result<()>;
}
