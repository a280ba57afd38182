use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::Path;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{AutomationError, AutomationResult};

pub const VIEWPORT_WIDTH: u32 = 1280;
pub const VIEWPORT_HEIGHT: u32 = 720;

/// Fixed argv for every launch: headless automation inside containers
/// requires the sandbox and GPU off
pub const BROWSER_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-gpu",
    "--disable-dev-shm-usage",
    "--disable-blink-features=AutomationControlled",
];

/// One persistent browser context rooted at an account's profile
/// directory, plus its CDP event pump
///
/// A profile directory must be owned by at most one session at a time.
pub struct BrowserSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

impl BrowserSession {
    /// Launch headless Chromium over a persistent profile directory
    pub async fn launch(profile_dir: &Path, user_agent: Option<&str>) -> AutomationResult<Self> {
        tokio::fs::create_dir_all(profile_dir)
            .await
            .map_err(|e| AutomationError::Browser(format!("profile dir unavailable: {}", e)))?;

        let mut builder = BrowserConfig::builder()
            .user_data_dir(profile_dir)
            .window_size(VIEWPORT_WIDTH, VIEWPORT_HEIGHT);

        for arg in BROWSER_ARGS {
            builder = builder.arg(*arg);
        }
        if let Some(ua) = user_agent {
            builder = builder.arg(format!("--user-agent={}", ua));
        }

        let config = builder.build().map_err(AutomationError::Browser)?;

        let (browser, mut handler) = Browser::launch(config).await?;

        // The handler must be pumped for the lifetime of the browser
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser.new_page("about:blank").await?;

        debug!(profile_dir = %profile_dir.display(), "Browser session launched");
        Ok(Self {
            browser,
            page,
            handler_task,
        })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Close the context, swallowing errors; safe to call on a wedged
    /// browser
    pub async fn close(mut self) {
        if let Err(e) = self.page.clone().close().await {
            debug!(error = %e, "Page close failed");
        }
        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "Browser close failed");
        }
        if let Err(e) = self.browser.wait().await {
            debug!(error = %e, "Browser process wait failed");
        }
        self.handler_task.abort();
    }
}

/// Navigate and wait for the load to settle, bounded by `timeout`
pub async fn goto_with_timeout(page: &Page, url: &str, timeout: Duration) -> AutomationResult<()> {
    let navigation = async {
        page.goto(url).await?;
        page.wait_for_navigation().await?;
        Ok::<_, AutomationError>(())
    };

    match tokio::time::timeout(timeout, navigation).await {
        Ok(result) => result.map_err(|e| AutomationError::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Err(AutomationError::Navigation {
            url: url.to_string(),
            reason: format!("timed out after {:?}", timeout),
        }),
    }
}

/// The page's current URL, empty when unavailable
pub async fn current_url(page: &Page) -> String {
    match page.url().await {
        Ok(url) => url.unwrap_or_default(),
        Err(_) => String::new(),
    }
}
