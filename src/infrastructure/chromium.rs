//! Chromium engine for the browser seam, driven over CDP by `chromiumoxide`

#![allow(clippy::uninlined_format_args)]

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use chromiumoxide::{Browser, Page};
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::browser::{
    BrowserError, BrowserResult, BrowserSession, PageSession, QuiescenceOutcome, QuiescencePolicy,
    QuiescenceTracker,
};
use super::config::BrowserConfig;

const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(200);
const OUTER_HTML_SCRIPT: &str = "document.documentElement.outerHTML";
const SCROLL_TO_BOTTOM_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight)";

pub struct ChromiumBrowser {
    browser: Browser,
    handler_task: JoinHandle<()>,
    navigation_timeout: Duration,
    closed: bool,
}

impl ChromiumBrowser {
    /// Launch Chrome/Chromium. Failure here is fatal to the run.
    pub async fn launch(config: &BrowserConfig) -> BrowserResult<Self> {
        let mut builder = chromiumoxide::BrowserConfig::builder()
            .request_timeout(Duration::from_millis(config.navigation_timeout_ms));
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &config.executable {
            builder = builder.chrome_executable(executable);
        }
        let browser_config = builder.build().map_err(BrowserError::LaunchFailed)?;

        info!("Launching browser (headless: {})", config.headless);
        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler error: {}", e);
                }
            }
        });

        Ok(Self {
            browser,
            handler_task,
            navigation_timeout: Duration::from_millis(config.navigation_timeout_ms),
            closed: false,
        })
    }
}

#[async_trait]
impl BrowserSession for ChromiumBrowser {
    async fn new_page(&self) -> BrowserResult<Box<dyn PageSession>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::EvaluationFailed(format!("new_page failed: {}", e)))?;
        Ok(Box::new(ChromiumPage {
            page: Some(page),
            navigation_timeout: self.navigation_timeout,
        }))
    }

    async fn close(&mut self) -> BrowserResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let result = self
            .browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| BrowserError::EvaluationFailed(format!("browser close failed: {}", e)));
        if let Err(e) = self.browser.wait().await {
            warn!("Browser process did not exit cleanly: {}", e);
        }
        self.handler_task.abort();
        result
    }
}

/// Requests a page has started and not yet finished, keyed by CDP request id.
/// Redirects reuse their request id, so a redirect chain counts once.
#[derive(Debug, Default)]
struct RequestLedger {
    open: HashSet<String>,
}

impl RequestLedger {
    fn started(&mut self, request_id: &str) {
        self.open.insert(request_id.to_string());
    }

    fn finished(&mut self, request_id: &str) {
        self.open.remove(request_id);
    }

    fn inflight(&self) -> usize {
        self.open.len()
    }
}

enum NetworkEvent {
    Started(String),
    Done(String),
}

/// Feeds the page's network events into a shared ledger until aborted
struct NetworkMonitor {
    ledger: Arc<Mutex<RequestLedger>>,
    task: JoinHandle<()>,
}

impl NetworkMonitor {
    async fn attach(page: &Page) -> BrowserResult<Self> {
        let listen_failed = |e: chromiumoxide::error::CdpError| {
            BrowserError::EvaluationFailed(format!("network listener failed: {}", e))
        };

        page.execute(EnableParams::default())
            .await
            .map_err(listen_failed)?;

        let started: BoxStream<'static, NetworkEvent> = page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(listen_failed)?
            .map(|e| NetworkEvent::Started(e.request_id.inner().clone()))
            .boxed();
        let finished: BoxStream<'static, NetworkEvent> = page
            .event_listener::<EventLoadingFinished>()
            .await
            .map_err(listen_failed)?
            .map(|e| NetworkEvent::Done(e.request_id.inner().clone()))
            .boxed();
        let failed: BoxStream<'static, NetworkEvent> = page
            .event_listener::<EventLoadingFailed>()
            .await
            .map_err(listen_failed)?
            .map(|e| NetworkEvent::Done(e.request_id.inner().clone()))
            .boxed();

        let ledger = Arc::new(Mutex::new(RequestLedger::default()));
        let sink = Arc::clone(&ledger);
        let mut events = stream::select_all(vec![started, finished, failed]);
        let task = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                let Ok(mut ledger) = sink.lock() else {
                    break;
                };
                match event {
                    NetworkEvent::Started(id) => ledger.started(&id),
                    NetworkEvent::Done(id) => ledger.finished(&id),
                }
            }
        });

        Ok(Self { ledger, task })
    }

    fn inflight(&self) -> usize {
        self.ledger.lock().map_or(0, |ledger| ledger.inflight())
    }

    async fn wait_for_quiescence(&self, policy: &QuiescencePolicy) -> QuiescenceOutcome {
        let mut tracker = QuiescenceTracker::new(policy.clone(), Instant::now());
        loop {
            if let Some(outcome) = tracker.observe(self.inflight(), Instant::now()) {
                return outcome;
            }
            tokio::time::sleep(tracker.poll_interval()).await;
        }
    }
}

impl Drop for NetworkMonitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct ChromiumPage {
    page: Option<Page>,
    navigation_timeout: Duration,
}

impl ChromiumPage {
    fn page(&self) -> BrowserResult<&Page> {
        self.page.as_ref().ok_or(BrowserError::PageClosed)
    }
}

#[async_trait]
impl PageSession for ChromiumPage {
    async fn navigate(&mut self, url: &str, policy: &QuiescencePolicy) -> BrowserResult<()> {
        let page = self.page()?;
        // subscribe before navigating so the document's own requests are seen
        let monitor = NetworkMonitor::attach(page).await?;

        tokio::time::timeout(self.navigation_timeout, page.goto(url))
            .await
            .map_err(|_| BrowserError::navigation(url, "navigation timed out"))?
            .map_err(|e| BrowserError::navigation(url, e))?;

        match monitor.wait_for_quiescence(policy).await {
            QuiescenceOutcome::Settled => debug!("Network settled for {}", url),
            QuiescenceOutcome::TimedOut => warn!(
                "Network still busy after {}ms on {}, continuing",
                policy.max_wait_ms, url
            ),
        }
        Ok(())
    }

    async fn document_html(&mut self) -> BrowserResult<String> {
        self.page()?
            .evaluate(OUTER_HTML_SCRIPT)
            .await
            .map_err(|e| BrowserError::EvaluationFailed(e.to_string()))?
            .into_value::<String>()
            .map_err(|e| BrowserError::EvaluationFailed(e.to_string()))
    }

    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> BrowserResult<()> {
        let page = self.page()?;
        let appear = async {
            while page.find_element(selector).await.is_err() {
                tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
            }
        };

        tokio::time::timeout(timeout, appear)
            .await
            .map_err(|_| BrowserError::SelectorTimeout {
                selector: selector.to_string(),
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            })
    }

    async fn scroll_to_bottom(&mut self) -> BrowserResult<()> {
        self.page()?
            .evaluate(SCROLL_TO_BOTTOM_SCRIPT)
            .await
            .map(|_| ())
            .map_err(|e| BrowserError::EvaluationFailed(e.to_string()))
    }

    async fn close(&mut self) -> BrowserResult<()> {
        match self.page.take() {
            Some(page) => page
                .close()
                .await
                .map_err(|e| BrowserError::EvaluationFailed(format!("page close failed: {}", e))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_counts_open_requests() {
        let mut ledger = RequestLedger::default();
        ledger.started("1");
        ledger.started("2");
        ledger.started("3");
        ledger.finished("2");
        assert_eq!(ledger.inflight(), 2);

        ledger.finished("1");
        ledger.finished("3");
        assert_eq!(ledger.inflight(), 0);
    }

    #[test]
    fn test_redirect_reusing_request_id_counts_once() {
        let mut ledger = RequestLedger::default();
        ledger.started("7");
        ledger.started("7");
        assert_eq!(ledger.inflight(), 1);

        ledger.finished("7");
        assert_eq!(ledger.inflight(), 0);
    }

    #[test]
    fn test_unknown_completion_is_ignored() {
        let mut ledger = RequestLedger::default();
        ledger.finished("cached");
        ledger.started("a");
        ledger.finished("b");
        assert_eq!(ledger.inflight(), 1);
    }

    #[test]
    fn test_ledger_never_saturates() {
        let mut ledger = RequestLedger::default();
        for id in 0..1000 {
            ledger.started(&id.to_string());
            ledger.finished(&id.to_string());
        }
        ledger.started("late");
        assert_eq!(ledger.inflight(), 1);
    }
}
