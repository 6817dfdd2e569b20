//! [`BrowserSession`] backed by headless Chrome over CDP (chromiumoxide)

use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::input::{DispatchKeyEventParams, DispatchKeyEventType};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CreateIsolatedWorldParams, FrameId, FrameTree, GetFrameTreeParams,
};
use chromiumoxide::cdp::js_protocol::runtime::{
    EvaluateParams, EventConsoleApiCalled, ExecutionContextId, RemoteObject,
};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use storysweep_common::{Error, Result};

use crate::config::BrowserSettings;
use crate::session::{BrowserSession, ConsoleStream, FrameRef, Key};

const WORLD_NAME: &str = "storysweep";
const POLL_INTERVAL: Duration = Duration::from_millis(100);

fn cdp(e: impl std::fmt::Display) -> Error {
    Error::Browser(e.to_string())
}

/// A single Chrome page owned by the sweep
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

impl ChromiumSession {
    /// Launch Chrome and open a blank page
    pub async fn launch(settings: &BrowserSettings) -> Result<Self> {
        info!("Initializing browser");

        let mut builder = BrowserConfig::builder()
            .window_size(settings.viewport_width, settings.viewport_height)
            .viewport(Viewport {
                width: settings.viewport_width,
                height: settings.viewport_height,
                device_scale_factor: Some(settings.device_scale_factor),
                emulating_mobile: false,
                is_landscape: false,
                has_touch: false,
            });
        if !settings.headless {
            builder = builder.with_head();
        }
        if let Some(exe) = &settings.executable {
            builder = builder.chrome_executable(exe);
        }
        let config = builder.build().map_err(Error::Browser)?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(cdp)?;

        // Handler must be polled for the connection to make progress.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("browser handler: {}", e);
                }
            }
        });

        debug!("new page!");
        let page = browser.new_page("about:blank").await.map_err(cdp)?;

        Ok(Self {
            browser,
            page,
            handler_task,
        })
    }

    /// Close the page and the browser process
    pub async fn close(mut self) -> Result<()> {
        if let Err(e) = self.page.clone().close().await {
            warn!("Closing page: {}", e);
        }
        self.browser.close().await.map_err(cdp)?;
        let _ = self.browser.wait().await;
        self.handler_task.abort();
        Ok(())
    }

    async fn frame_context(&self, frame: &FrameRef) -> Result<ExecutionContextId> {
        let params = CreateIsolatedWorldParams::builder()
            .frame_id(FrameId::new(frame.id.clone()))
            .world_name(WORLD_NAME)
            .build()
            .map_err(Error::Browser)?;
        let resp = self.page.execute(params).await.map_err(cdp)?;
        Ok(resp.result.execution_context_id)
    }

    /// Evaluate in a frame, awaiting a returned promise
    async fn evaluate_in_frame(&self, frame: &FrameRef, expression: String) -> Result<()> {
        let context = self.frame_context(frame).await?;
        let params = EvaluateParams::builder()
            .expression(expression)
            .context_id(context)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(Error::Browser)?;

        let resp = self.page.execute(params).await.map_err(cdp)?;
        if let Some(details) = &resp.result.exception_details {
            return Err(Error::Browser(format!(
                "script in frame {} threw: {}",
                frame.url,
                details
                    .exception
                    .as_ref()
                    .and_then(|e| e.description.clone())
                    .unwrap_or_else(|| details.text.clone())
            )));
        }
        Ok(())
    }

    fn key_event(key: Key, kind: DispatchKeyEventType) -> Result<DispatchKeyEventParams> {
        let mut builder = DispatchKeyEventParams::builder()
            .r#type(kind)
            .key(key.key())
            .code(key.code())
            .windows_virtual_key_code(key.virtual_key_code())
            .native_virtual_key_code(key.virtual_key_code());
        if let Some(text) = key.text() {
            builder = builder.text(text);
        }
        builder.build().map_err(Error::Browser)
    }
}

fn flatten_frames(tree: &FrameTree, out: &mut Vec<FrameRef>) {
    out.push(FrameRef {
        id: tree.frame.id.inner().clone(),
        url: tree.frame.url.clone(),
    });
    if let Some(children) = &tree.child_frames {
        for child in children {
            flatten_frames(child, out);
        }
    }
}

fn console_text(args: &[RemoteObject]) -> String {
    args.iter()
        .map(|arg| match &arg.value {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => arg.description.clone().unwrap_or_default(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// JS that appends `<script src=url>` and resolves once it has loaded
fn script_url_js(url: &str) -> String {
    let url = serde_json::to_string(url).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        "new Promise((resolve, reject) => {{\
           const s = document.createElement('script');\
           s.src = {url};\
           s.onload = () => resolve(true);\
           s.onerror = () => reject(new Error('failed to load ' + {url}));\
           (document.head || document.documentElement).appendChild(s);\
         }})"
    )
}

fn script_content_js(content: &str) -> String {
    let content = serde_json::to_string(content).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        "(() => {{\
           const s = document.createElement('script');\
           s.textContent = {content};\
           (document.head || document.documentElement).appendChild(s);\
           return true;\
         }})()"
    )
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.page.goto(url).await.map_err(cdp)?;
        Ok(())
    }

    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> Result<()> {
        let start = Instant::now();
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(Error::Timeout(selector.to_string()));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn click(&mut self, selector: &str) -> Result<()> {
        self.page
            .find_element(selector)
            .await
            .map_err(cdp)?
            .click()
            .await
            .map_err(cdp)?;
        Ok(())
    }

    async fn evaluate(&mut self, expression: &str) -> Result<Value> {
        let result = self.page.evaluate(expression).await.map_err(cdp)?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn press_key(&mut self, key: Key, delay: Duration) -> Result<()> {
        let down = if key.text().is_some() {
            DispatchKeyEventType::KeyDown
        } else {
            DispatchKeyEventType::RawKeyDown
        };
        self.page
            .execute(Self::key_event(key, down)?)
            .await
            .map_err(cdp)?;
        tokio::time::sleep(delay).await;
        self.page
            .execute(Self::key_event(key, DispatchKeyEventType::KeyUp)?)
            .await
            .map_err(cdp)?;
        Ok(())
    }

    async fn frames(&mut self) -> Result<Vec<FrameRef>> {
        let resp = self
            .page
            .execute(GetFrameTreeParams::default())
            .await
            .map_err(cdp)?;
        let mut frames = Vec::new();
        flatten_frames(&resp.result.frame_tree, &mut frames);
        Ok(frames)
    }

    async fn add_script_url(&mut self, frame: &FrameRef, url: &str) -> Result<()> {
        self.evaluate_in_frame(frame, script_url_js(url)).await
    }

    async fn add_script_content(&mut self, frame: &FrameRef, content: &str) -> Result<()> {
        self.evaluate_in_frame(frame, script_content_js(content)).await
    }

    async fn console(&mut self) -> Result<ConsoleStream> {
        let events = self
            .page
            .event_listener::<EventConsoleApiCalled>()
            .await
            .map_err(cdp)?;
        Ok(events.map(|ev| console_text(&ev.args)).boxed())
    }

    async fn screenshot(&mut self, path: &Path) -> Result<()> {
        self.page
            .save_screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .full_page(true)
                    .build(),
                path,
            )
            .await
            .map_err(cdp)?;
        Ok(())
    }
}
