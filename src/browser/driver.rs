//! Browser engine lifecycle and session acquisition
//!
//! One Chrome instance serves the whole run; each visit gets its own CDP
//! browser context (fresh cookies and storage) with a single page inside it.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig, HeadlessMode};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::BrowserError;

/// Global counter for sequential session naming (session-1, session-2, ...)
static SESSION_COUNTER: AtomicU32 = AtomicU32::new(1);

/// Find Chrome/Chromium executable on the system
fn find_chrome() -> Option<std::path::PathBuf> {
    let candidates: Vec<std::path::PathBuf> = if cfg!(target_os = "windows") {
        let mut paths = vec![
            std::path::PathBuf::from(r"C:\Program Files\Google\Chrome\Application\chrome.exe"),
            std::path::PathBuf::from(r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe"),
        ];
        if let Ok(local) = std::env::var("LOCALAPPDATA") {
            paths.push(std::path::PathBuf::from(format!(
                r"{}\Google\Chrome\Application\chrome.exe",
                local
            )));
        }
        paths
    } else if cfg!(target_os = "macos") {
        vec![std::path::PathBuf::from(
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        )]
    } else {
        vec![
            std::path::PathBuf::from("/usr/bin/google-chrome"),
            std::path::PathBuf::from("/usr/bin/google-chrome-stable"),
            std::path::PathBuf::from("/usr/bin/chromium"),
            std::path::PathBuf::from("/usr/bin/chromium-browser"),
        ]
    };

    candidates.into_iter().find(|p| p.exists())
}

/// An isolated browsing session: one dedicated browser context (independent
/// cookie/storage state) plus one page inside it.
///
/// Owned exclusively by the worker that acquired it; lives for exactly one
/// URL visit and must be returned to the provider on every exit path.
pub struct BrowserSession {
    /// Display name, e.g. "session-3"
    pub id: String,
    /// The active page
    pub page: Page,
    /// CDP browser context backing this session
    context_id: BrowserContextId,
}

/// Hands out isolated browsing sessions from a shared engine instance.
///
/// Release never fails outward: a leaked or half-dead session must not crash
/// the worker that held it.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    type Session: Send + 'static;

    /// Acquire a fresh isolated session.
    async fn new_session(&self) -> Result<Self::Session, BrowserError>;

    /// Release a session's resources. Safe to call on a session that already
    /// failed internally; release errors are logged and swallowed.
    async fn close_session(&self, session: Self::Session);
}

/// Owns the Chrome process for the duration of a run
pub struct BrowserDriver {
    headless: bool,
    browser: RwLock<Option<Browser>>,
    handler_task: RwLock<Option<tokio::task::JoinHandle<()>>>,
}

impl BrowserDriver {
    /// Create a driver. The engine is not launched until [`start`](Self::start).
    pub fn new(headless: bool) -> Self {
        Self {
            headless,
            browser: RwLock::new(None),
            handler_task: RwLock::new(None),
        }
    }

    /// Launch the Chrome process and spawn the CDP event handler task.
    ///
    /// Failure here is fatal to the whole run.
    pub async fn start(&self) -> Result<(), BrowserError> {
        let mut builder = BrowserConfig::builder();

        if self.headless {
            builder = builder.headless_mode(HeadlessMode::New);
        } else {
            builder = builder.with_head();
        }

        if let Some(chrome_path) = find_chrome() {
            info!("Auto-detected Chrome at: {}", chrome_path.display());
            builder = builder.chrome_executable(chrome_path);
        } else {
            return Err(BrowserError::EngineStart(
                "Chrome/Chromium executable not found on this system".to_string(),
            ));
        }

        builder = builder
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--no-default-browser-check")
            .arg("--disable-notifications")
            // Required when running as root (e.g., in Docker or on a VPS)
            .arg("--no-sandbox")
            .window_size(1920, 1080);

        let config = builder.build().map_err(BrowserError::EngineStart)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::EngineStart(e.to_string()))?;

        // The handler drives all CDP traffic; when it ends, Chrome is gone.
        let task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler event error (continuing): {}", e);
                }
            }
            warn!("Browser engine disconnected (event handler ended)");
        });

        *self.browser.write().await = Some(browser);
        *self.handler_task.write().await = Some(task);

        info!("Browser engine started (headless: {})", self.headless);
        Ok(())
    }

    /// Shut down the Chrome process. Idempotent; errors are logged and
    /// swallowed so teardown can run on both success and failure paths.
    pub async fn stop(&self) {
        let browser = self.browser.write().await.take();
        if let Some(mut browser) = browser {
            if let Err(e) = browser.close().await {
                warn!("Browser close failed: {}", e);
            }
            let _ = browser.wait().await;
        }

        if let Some(task) = self.handler_task.write().await.take() {
            task.abort();
        }

        info!("Browser engine stopped");
    }
}

#[async_trait]
impl SessionProvider for BrowserDriver {
    type Session = BrowserSession;

    async fn new_session(&self) -> Result<BrowserSession, BrowserError> {
        let guard = self.browser.read().await;
        let browser = guard.as_ref().ok_or(BrowserError::NotStarted)?;

        let context = browser
            .execute(CreateBrowserContextParams::default())
            .await
            .map_err(|e| BrowserError::SessionCreation(e.to_string()))?;
        let context_id = context.result.browser_context_id.clone();

        let params = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context_id.clone())
            .build()
            .map_err(BrowserError::SessionCreation)?;

        let page = match browser.new_page(params).await {
            Ok(page) => page,
            Err(e) => {
                // Don't leak the context when page creation fails
                let _ = browser
                    .execute(DisposeBrowserContextParams::new(context_id))
                    .await;
                return Err(BrowserError::SessionCreation(e.to_string()));
            }
        };

        let id = format!("session-{}", SESSION_COUNTER.fetch_add(1, Ordering::Relaxed));
        debug!("Created {} in isolated context", id);

        Ok(BrowserSession {
            id,
            page,
            context_id,
        })
    }

    async fn close_session(&self, session: BrowserSession) {
        let BrowserSession {
            id,
            page,
            context_id,
        } = session;

        if let Err(e) = page.close().await {
            warn!("Session {}: page close failed: {}", id, e);
        }

        let guard = self.browser.read().await;
        if let Some(browser) = guard.as_ref() {
            if let Err(e) = browser
                .execute(DisposeBrowserContextParams::new(context_id))
                .await
            {
                warn!("Session {}: context dispose failed: {}", id, e);
            }
        }

        debug!("Session {} released", id);
    }
}
