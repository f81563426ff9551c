//! Session manager: owns exactly one headless-browser process and its
//! private scratch directory per lookup attempt.
//!
//! The browser engine is consumed as a black-box service behind the
//! [`PageSession`] seam so the lookup driver (and its fault-injection tests)
//! never touch CDP types directly.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::FetchConfig;
use crate::error::{FetchError, Result};

/// How often the content-ready wait re-queries for the readiness marker.
const READINESS_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Flags for the tuned, minimal-footprint launch profile. Rendering for
/// text extraction needs none of the background machinery.
const TUNED_FLAGS: &[&str] = &[
    "--disable-gpu",
    "--disable-dev-shm-usage",
    "--disable-extensions",
    "--disable-background-networking",
    "--disable-background-timer-throttling",
    "--disable-backgrounding-occluded-windows",
    "--disable-renderer-backgrounding",
    "--memory-pressure-off",
    "--mute-audio",
    "--no-first-run",
    "--no-default-browser-check",
];

/// Lifecycle of one session, entered at `Ready`: launch either yields a
/// ready session or no session at all. Any state may jump directly to
/// `Closed`; `Closed` is terminal and idempotent to re-enter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Ready,
    Navigating,
    WaitingForContent,
    SnapshotTaken,
    Closed,
}

/// One short-lived page session. Implementations must tolerate `close`
/// being the only call that is guaranteed to happen.
#[async_trait]
pub trait PageSession: Send {
    /// Load the target URL, bounded independently of the watchdog deadline.
    async fn navigate(&mut self, url: &Url, limit: Duration) -> Result<()>;

    /// Block until the readiness marker appears in the rendered document.
    /// An elapsed wait is reported as an error but is not fatal upstream.
    async fn await_content_ready(&mut self, selector: &str, limit: Duration) -> Result<()>;

    /// The fully rendered document markup at the current instant.
    async fn snapshot(&mut self) -> Result<String>;

    /// Quit the engine and delete the scratch directory. Invoked exactly
    /// once per opened session on every exit path; errors are logged, never
    /// escalated, so cleanup cannot mask the primary outcome.
    async fn close(&mut self);
}

/// Seam for creating sessions; the lookup driver also uses it to recreate
/// a session after a memory-ceiling breach.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self, config: &FetchConfig) -> Result<Box<dyn PageSession>>;
}

/// Production factory launching headless Chromium.
pub struct ChromiumFactory;

#[async_trait]
impl SessionFactory for ChromiumFactory {
    async fn open(&self, config: &FetchConfig) -> Result<Box<dyn PageSession>> {
        let session = ChromiumSession::launch(config).await?;
        Ok(Box::new(session))
    }
}

pub struct ChromiumSession {
    browser: Option<Browser>,
    page: Option<Page>,
    handler_task: JoinHandle<()>,
    scratch: Option<TempDir>,
    state: SessionState,
}

impl ChromiumSession {
    /// Launch with the tuned profile; on failure retry once with a reduced
    /// configuration before surfacing `DriverInit`.
    pub async fn launch(config: &FetchConfig) -> Result<Self> {
        let scratch = TempDir::with_prefix("classfetch-").map_err(|e| {
            FetchError::DriverInit(format!("failed to create scratch directory: {e}"))
        })?;
        debug!(stage = "open", scratch = %scratch.path().display(), "created session scratch directory");

        let tuned = tuned_config(config, scratch.path())?;
        let (mut browser, handler) = match Browser::launch(tuned).await {
            Ok(pair) => pair,
            Err(primary) => {
                warn!(
                    stage = "open",
                    error = %primary,
                    "tuned launch failed, retrying with reduced configuration"
                );
                let reduced = reduced_config(config, scratch.path())?;
                Browser::launch(reduced).await.map_err(|fallback| {
                    FetchError::DriverInit(format!(
                        "browser launch failed (tuned: {primary}; reduced: {fallback})"
                    ))
                })?
            }
        };

        let handler_task = tokio::spawn(async move {
            let mut handler = handler;
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    debug!(stage = "session", error = %err, "browser event error");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(err) => {
                let _ = browser.close().await;
                handler_task.abort();
                return Err(FetchError::DriverInit(format!(
                    "failed to open a browser page: {err}"
                )));
            }
        };

        info!(stage = "open", "browser session ready");
        Ok(Self {
            browser: Some(browser),
            page: Some(page),
            handler_task,
            scratch: Some(scratch),
            state: SessionState::Ready,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn page(&self) -> Result<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| FetchError::Config("session is already closed".into()))
    }
}

#[async_trait]
impl PageSession for ChromiumSession {
    async fn navigate(&mut self, url: &Url, limit: Duration) -> Result<()> {
        self.state = SessionState::Navigating;
        info!(stage = "navigate", url = %url, "loading catalog page");
        let page = self.page()?;
        let load = async {
            page.goto(url.as_str()).await?;
            page.wait_for_navigation().await?;
            Ok::<_, chromiumoxide::error::CdpError>(())
        };
        match timeout(limit, load).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(FetchError::Navigation(err.to_string())),
            Err(_) => Err(FetchError::NavigationTimeout(limit)),
        }
    }

    async fn await_content_ready(&mut self, selector: &str, limit: Duration) -> Result<()> {
        self.state = SessionState::WaitingForContent;
        debug!(stage = "wait", selector, "waiting for readiness marker");
        let page = self.page()?;
        let deadline = Instant::now() + limit;
        loop {
            if page.find_element(selector).await.is_ok() {
                debug!(stage = "wait", "readiness marker present");
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(FetchError::ContentWaitTimeout(limit));
            }
            sleep(READINESS_POLL_INTERVAL).await;
        }
    }

    async fn snapshot(&mut self) -> Result<String> {
        let page = self.page()?;
        let markup = page
            .content()
            .await
            .map_err(|e| FetchError::Extraction(format!("failed to capture rendered markup: {e}")))?;
        self.state = SessionState::SnapshotTaken;
        debug!(stage = "snapshot", bytes = markup.len(), "captured markup");
        Ok(markup)
    }

    async fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.state = SessionState::Closed;
        self.page = None;

        if let Some(mut browser) = self.browser.take() {
            if let Err(err) = browser.close().await {
                warn!(stage = "close", error = %err, "browser close reported an error");
            }
            if let Err(err) = browser.wait().await {
                debug!(stage = "close", error = %err, "browser process wait failed");
            }
        }
        self.handler_task.abort();

        if let Some(scratch) = self.scratch.take() {
            let path = scratch.path().to_path_buf();
            if let Err(err) = scratch.close() {
                warn!(
                    stage = "close",
                    scratch = %path.display(),
                    error = %err,
                    "failed to remove scratch directory"
                );
            }
        }
        info!(stage = "close", "browser session closed");
    }
}

fn tuned_config(config: &FetchConfig, scratch: &Path) -> Result<BrowserConfig> {
    let mut builder = BrowserConfig::builder()
        .user_data_dir(scratch)
        .args(TUNED_FLAGS.to_vec());
    if config.block_images {
        builder = builder.arg("--blink-settings=imagesEnabled=false");
    }
    if !config.sandbox {
        builder = builder.no_sandbox();
    }
    if !config.headless {
        builder = builder.with_head();
    }
    builder.build().map_err(FetchError::DriverInit)
}

/// Fallback profile: drop the tuned flags, keep only what the deployment
/// cannot run without.
fn reduced_config(config: &FetchConfig, scratch: &Path) -> Result<BrowserConfig> {
    let mut builder = BrowserConfig::builder().user_data_dir(scratch);
    if !config.sandbox {
        builder = builder.no_sandbox();
    }
    if !config.headless {
        builder = builder.with_head();
    }
    builder.build().map_err(FetchError::DriverInit)
}
