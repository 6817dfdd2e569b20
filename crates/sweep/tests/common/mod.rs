//! Scripted in-memory explorer used by the integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::channel::mpsc;
use futures::StreamExt;
use serde_json::{json, Value};

use storysweep_common::{Error, Result};
use storysweep_sweep::{BrowserSession, ConsoleStream, FrameRef, Key, SweepConfig, INVOKE_ENGINE_JS};

pub const BASE_URL: &str = "http://localhost:9876";

/// Which directional commands move the selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Moves {
    Both,
    DescendOnly,
    SiblingOnly,
    /// Descend works out of even entries, sibling out of odd ones
    Alternating,
    Neither,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selected {
    Nothing,
    Header,
    Entry(usize),
}

pub struct FakeEntry {
    pub name: String,
    /// None = the engine never reports
    pub payload: Option<String>,
}

pub struct FakeState {
    entries: Vec<FakeEntry>,
    selected: Selected,
    pending: Option<Key>,
    pub moves: Moves,
    pub content_frame: bool,
    /// Selection disappears on the first Enter after this many audits
    pub lose_selection_after: Option<usize>,
    /// Directional keys stop moving the selection after this many audits
    pub freeze_after: Option<usize>,
    /// Key presses fail after this many audits
    pub fail_keys_after: Option<usize>,
    console: Option<mpsc::UnboundedSender<String>>,

    pub audits: usize,
    pub audited: Vec<String>,
    pub keys: Vec<Key>,
    pub scripts: Vec<String>,
    pub screenshots: Vec<PathBuf>,
    pub navigated: Vec<String>,
}

impl FakeState {
    fn offset(&self) -> Value {
        match self.selected {
            Selected::Nothing => Value::Null,
            Selected::Header => json!(0),
            Selected::Entry(i) => json!((i as f64 + 1.0) * 25.0),
        }
    }

    fn name(&self) -> Value {
        match self.selected {
            Selected::Entry(i) => json!(self.entries[i].name),
            Selected::Header => json!("components"),
            Selected::Nothing => Value::Null,
        }
    }

    fn moves_with(&self, key: Key) -> bool {
        let from = match self.selected {
            Selected::Entry(i) => i,
            Selected::Header => 0,
            Selected::Nothing => return false,
        };
        if self.freeze_after.is_some_and(|limit| self.audits >= limit) {
            return false;
        }
        match (self.moves, key) {
            (Moves::Both, _) => true,
            (Moves::DescendOnly, Key::ArrowRight) => true,
            (Moves::SiblingOnly, Key::ArrowDown) => true,
            (Moves::Alternating, Key::ArrowRight) => from % 2 == 0,
            (Moves::Alternating, Key::ArrowDown) => from % 2 == 1,
            _ => false,
        }
    }

    fn step(&mut self) {
        let n = self.entries.len();
        self.selected = match self.selected {
            Selected::Header if n > 0 => Selected::Entry(0),
            Selected::Entry(i) => Selected::Entry((i + 1) % n),
            other => other,
        };
    }

    fn confirm(&mut self) {
        if let Some(limit) = self.lose_selection_after {
            if self.audits >= limit {
                self.selected = Selected::Nothing;
                return;
            }
        }
        if let Some(key) = self.pending.take() {
            if self.moves_with(key) {
                self.step();
            }
        }
    }
}

/// Cheap handle; the runner owns one clone, the test keeps another.
#[derive(Clone)]
pub struct FakeExplorer {
    pub state: Arc<Mutex<FakeState>>,
}

impl FakeExplorer {
    pub fn new(entries: Vec<FakeEntry>) -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                entries,
                selected: Selected::Nothing,
                pending: None,
                moves: Moves::Both,
                content_frame: true,
                lose_selection_after: None,
                freeze_after: None,
                fail_keys_after: None,
                console: None,
                audits: 0,
                audited: Vec::new(),
                keys: Vec::new(),
                scripts: Vec::new(),
                screenshots: Vec::new(),
                navigated: Vec::new(),
            })),
        }
    }

    /// `n` entries named `entry-1..=n`, each reporting no violations
    pub fn clean(n: usize) -> Self {
        Self::new((1..=n).map(|i| entry(&format!("entry-{}", i), report(&[]))).collect())
    }

    pub fn with_moves(self, moves: Moves) -> Self {
        self.state.lock().unwrap().moves = moves;
        self
    }

    pub fn without_content_frame(self) -> Self {
        self.state.lock().unwrap().content_frame = false;
        self
    }

    pub fn losing_selection_after(self, audits: usize) -> Self {
        self.state.lock().unwrap().lose_selection_after = Some(audits);
        self
    }

    pub fn freezing_after(self, audits: usize) -> Self {
        self.state.lock().unwrap().freeze_after = Some(audits);
        self
    }

    pub fn failing_keys_after(self, audits: usize) -> Self {
        self.state.lock().unwrap().fail_keys_after = Some(audits);
        self
    }

    /// Put the selection on the first entry directly
    pub fn select_first_entry(&self) {
        self.state.lock().unwrap().selected = Selected::Entry(0);
    }

    pub fn audited(&self) -> Vec<String> {
        self.state.lock().unwrap().audited.clone()
    }

    pub fn audits(&self) -> usize {
        self.state.lock().unwrap().audits
    }

    pub fn screenshots(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().screenshots.clone()
    }

    pub fn keys(&self) -> Vec<Key> {
        self.state.lock().unwrap().keys.clone()
    }
}

pub fn entry(name: &str, payload: String) -> FakeEntry {
    FakeEntry {
        name: name.to_string(),
        payload: Some(payload),
    }
}

pub fn silent_entry(name: &str) -> FakeEntry {
    FakeEntry {
        name: name.to_string(),
        payload: None,
    }
}

/// Engine JSON with one violation per description, each on one node
pub fn report(descriptions: &[&str]) -> String {
    let violations: Vec<Value> = descriptions
        .iter()
        .map(|d| {
            json!({
                "id": "rule",
                "impact": "serious",
                "description": d,
                "nodes": [{ "failureSummary": format!("Fix: {}", d), "html": "<div class=\"x\"></div>" }]
            })
        })
        .collect();
    json!({ "violations": violations, "passes": [] }).to_string()
}

/// Test config: no key delay, no settle delay
pub fn fast_config(output_dir: &Path) -> SweepConfig {
    SweepConfig {
        key_delay_ms: 0,
        settle_ms: 0,
        report_timeout_secs: 5,
        ready_timeout_secs: 1,
        output_dir: output_dir.to_path_buf(),
        ..SweepConfig::default()
    }
}

#[async_trait]
impl BrowserSession for FakeExplorer {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.state.lock().unwrap().navigated.push(url.to_string());
        Ok(())
    }

    async fn wait_for_selector(&mut self, selector: &str, _timeout: Duration) -> Result<()> {
        if self.state.lock().unwrap().entries.is_empty() {
            return Err(Error::Timeout(selector.to_string()));
        }
        Ok(())
    }

    async fn click(&mut self, _selector: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if !state.entries.is_empty() {
            state.selected = Selected::Header;
        }
        Ok(())
    }

    async fn evaluate(&mut self, expression: &str) -> Result<Value> {
        let state = self.state.lock().unwrap();
        if expression.contains("offsetTop") {
            Ok(state.offset())
        } else if expression.contains("?.id") {
            Ok(state.name())
        } else {
            Err(Error::Browser(format!("unexpected expression: {}", expression)))
        }
    }

    async fn press_key(&mut self, key: Key, _delay: Duration) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_keys_after.is_some_and(|limit| state.audits >= limit) {
            return Err(Error::Browser(format!("Input.dispatchKeyEvent {} failed", key.key())));
        }
        state.keys.push(key);
        match key {
            Key::Enter => state.confirm(),
            other => state.pending = Some(other),
        }
        Ok(())
    }

    async fn frames(&mut self) -> Result<Vec<FrameRef>> {
        let state = self.state.lock().unwrap();
        let mut frames = vec![FrameRef {
            id: "main".into(),
            url: format!("{}/", BASE_URL),
        }];
        if state.content_frame {
            frames.push(FrameRef {
                id: "preview".into(),
                url: format!("{}/iframe.html?viewMode=story", BASE_URL),
            });
        }
        Ok(frames)
    }

    async fn add_script_url(&mut self, frame: &FrameRef, url: &str) -> Result<()> {
        assert_eq!(frame.id, "preview", "engine injected into the host page");
        self.state.lock().unwrap().scripts.push(url.to_string());
        Ok(())
    }

    async fn add_script_content(&mut self, frame: &FrameRef, content: &str) -> Result<()> {
        assert_eq!(frame.id, "preview");
        let mut state = self.state.lock().unwrap();
        state.scripts.push(content.to_string());
        if content != INVOKE_ENGINE_JS {
            return Ok(());
        }

        let index = match state.selected {
            Selected::Entry(i) => i,
            _ => return Err(Error::Browser("audited without a selected entry".into())),
        };
        state.audits += 1;
        let name = state.entries[index].name.clone();
        state.audited.push(name);

        if let Some(payload) = state.entries[index].payload.clone() {
            if let Some(tx) = &state.console {
                let _ = tx.unbounded_send(payload);
            }
        }
        Ok(())
    }

    async fn console(&mut self) -> Result<ConsoleStream> {
        let (tx, rx) = mpsc::unbounded();
        self.state.lock().unwrap().console = Some(tx);
        Ok(rx.boxed())
    }

    async fn screenshot(&mut self, path: &Path) -> Result<()> {
        self.state.lock().unwrap().screenshots.push(path.to_path_buf());
        Ok(())
    }
}
