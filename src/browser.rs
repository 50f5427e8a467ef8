use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{EventLifecycleEvent, SetLifecycleEventsEnabledParams};
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::BrowserSettings;
use crate::page::{is_disabled, NetworkSettle, ResultsPage};
use crate::parser::normalize_text;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Headless Chrome with one isolated browsing context and one tab.
///
/// `close` must be awaited on every path; dropping the session without it
/// still kills the Chrome child process but skips the orderly shutdown.
pub struct BrowserSession {
    browser: Browser,
    context: BrowserContextId,
    page: ChromePage,
    handler: JoinHandle<()>,
}

impl BrowserSession {
    pub async fn launch(settings: &BrowserSettings) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .window_size(settings.width, settings.height)
            .viewport(Viewport {
                width: settings.width,
                height: settings.height,
                ..Default::default()
            });
        if !settings.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(|e| anyhow!("Invalid browser config: {}", e))?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch Chrome")?;

        // CDP events must be pumped for any command to complete
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler: {}", e);
                }
            }
        });

        let context = match open_context(&browser).await {
            Ok(ctx) => ctx,
            Err(e) => {
                let _ = browser.close().await;
                handler.abort();
                return Err(e);
            }
        };

        let page = match open_page(&browser, &context, settings).await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser
                    .execute(DisposeBrowserContextParams::new(context.clone()))
                    .await;
                let _ = browser.close().await;
                handler.abort();
                return Err(e);
            }
        };

        info!(
            "Browser ready ({}x{}, headless: {})",
            settings.width, settings.height, settings.headless
        );
        Ok(Self {
            browser,
            context,
            page: ChromePage { page },
            handler,
        })
    }

    pub fn page(&self) -> &ChromePage {
        &self.page
    }

    /// Close the tab, dispose the context, then shut the browser down.
    /// Every step runs even if an earlier one fails; the first error wins.
    pub async fn close(self) -> Result<()> {
        let Self {
            mut browser,
            context,
            page,
            handler,
        } = self;

        let page_closed = page.page.close().await.context("Failed to close tab");
        let context_closed = browser
            .execute(DisposeBrowserContextParams::new(context))
            .await
            .map(|_| ())
            .context("Failed to dispose browser context");
        let browser_closed = browser.close().await.map(|_| ()).context("Failed to close browser");
        if let Err(e) = browser.wait().await {
            warn!("Chrome did not exit cleanly: {}", e);
        }
        if let Err(e) = handler.await {
            warn!("CDP handler task ended abnormally: {}", e);
        }

        info!("Browser closed");
        page_closed.and(context_closed).and(browser_closed)
    }
}

async fn open_context(browser: &Browser) -> Result<BrowserContextId> {
    let created = browser
        .execute(CreateBrowserContextParams::default())
        .await
        .context("Failed to create browser context")?;
    Ok(created.result.browser_context_id)
}

async fn open_page(
    browser: &Browser,
    context: &BrowserContextId,
    settings: &BrowserSettings,
) -> Result<Page> {
    let target = CreateTargetParams::builder()
        .url("about:blank")
        .browser_context_id(context.clone())
        .build()
        .map_err(|e| anyhow!("Invalid target params: {}", e))?;
    let page = browser.new_page(target).await.context("Failed to open tab")?;
    page.set_user_agent(SetUserAgentOverrideParams::new(settings.user_agent.clone()))
        .await
        .context("Failed to set user agent")?;
    Ok(page)
}

/// A live Chrome tab.
pub struct ChromePage {
    page: Page,
}

impl ChromePage {
    /// Navigate, then wait for the main frame's `networkIdle` lifecycle event
    /// of the new document.
    async fn navigate_settled(&self, url: &str) -> Result<()> {
        self.page
            .execute(SetLifecycleEventsEnabledParams::new(true))
            .await
            .context("Failed to enable lifecycle events")?;
        // subscribe before navigating so no event of the new document is missed
        let mut lifecycle = self
            .page
            .event_listener::<EventLifecycleEvent>()
            .await
            .context("Failed to listen for lifecycle events")?;

        self.page
            .goto(url)
            .await
            .with_context(|| format!("Navigation to {} failed", url))?;
        let frame = self.page.mainframe().await?;

        let mut settle = NetworkSettle::default();
        while let Some(event) = lifecycle.next().await {
            if frame.as_ref().is_some_and(|f| *f != event.frame_id) {
                continue;
            }
            if settle.observe(&event.name) {
                debug!("{} settled", url);
                return Ok(());
            }
        }
        Err(anyhow!("Lifecycle events stopped before {} settled", url))
    }
}

impl ResultsPage for ChromePage {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<()> {
        tokio::time::timeout(timeout, self.navigate_settled(url))
            .await
            .map_err(|_| anyhow!("Navigation to {} timed out after {:?}", url, timeout))?
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()> {
        tokio::time::timeout(timeout, async {
            loop {
                if self.page.find_element(selector).await.is_ok() {
                    return;
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        })
        .await
        .map_err(|_| anyhow!("Timed out after {:?} waiting for `{}`", timeout, selector))
    }

    async fn text_of(&self, selector: &str) -> Result<Option<String>> {
        let Ok(element) = self.page.find_element(selector).await else {
            return Ok(None);
        };
        let text = element
            .inner_text()
            .await
            .with_context(|| format!("Failed to read text of `{}`", selector))?;
        Ok(text.map(|t| normalize_text(&t)))
    }

    async fn html(&self) -> Result<String> {
        self.page.content().await.context("Failed to read page content")
    }

    async fn click_enabled(&self, selector: &str) -> Result<bool> {
        let Ok(element) = self.page.find_element(selector).await else {
            return Ok(false);
        };
        let disabled = element.attribute("disabled").await?;
        let aria = element.attribute("aria-disabled").await?;
        let class = element.attribute("class").await?;
        if is_disabled(disabled.as_deref(), aria.as_deref(), class.as_deref()) {
            return Ok(false);
        }
        element
            .click()
            .await
            .with_context(|| format!("Failed to click `{}`", selector))?;
        Ok(true)
    }
}
