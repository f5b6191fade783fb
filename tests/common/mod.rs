//! In-memory browser and notifier shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use scraper::{Html, Selector};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fire_label_audit::infrastructure::browser::{
    BrowserError, BrowserResult, BrowserSession, PageSession, QuiescencePolicy,
};
use fire_label_audit::infrastructure::config::AppConfig;
use fire_label_audit::infrastructure::notifier::{Notification, Notifier, NotifyError};

pub const CATEGORY_URL: &str = "https://shop.example/c/heaters";

/// Canned rendered documents keyed by URL
#[derive(Default)]
pub struct FakeSite {
    pages: HashMap<String, String>,
    broken: HashSet<String>,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), html.into());
        self
    }

    /// Navigation to `url` fails
    pub fn broken(mut self, url: &str) -> Self {
        self.broken.insert(url.to_string());
        self
    }
}

/// Counters shared between a fake browser and the test body
#[derive(Default)]
pub struct BrowserStats {
    pub pages_opened: AtomicUsize,
    pub pages_closed: AtomicUsize,
    pub browser_closed: AtomicUsize,
    pub visited: Mutex<Vec<String>>,
    pub scrolled: Mutex<Vec<String>>,
}

impl BrowserStats {
    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }

    /// URL of the loaded document at each scroll
    pub fn scrolled(&self) -> Vec<String> {
        self.scrolled.lock().unwrap().clone()
    }
}

pub struct FakeBrowser {
    site: Arc<FakeSite>,
    pub stats: Arc<BrowserStats>,
}

impl FakeBrowser {
    pub fn new(site: FakeSite) -> Self {
        Self {
            site: Arc::new(site),
            stats: Arc::new(BrowserStats::default()),
        }
    }

    pub fn open_page(&self) -> FakePage {
        self.stats.pages_opened.fetch_add(1, Ordering::SeqCst);
        FakePage {
            site: Arc::clone(&self.site),
            stats: Arc::clone(&self.stats),
            current: None,
            current_url: None,
            closed: false,
        }
    }
}

#[async_trait]
impl BrowserSession for FakeBrowser {
    async fn new_page(&self) -> BrowserResult<Box<dyn PageSession>> {
        Ok(Box::new(self.open_page()))
    }

    async fn close(&mut self) -> BrowserResult<()> {
        self.stats.browser_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct FakePage {
    site: Arc<FakeSite>,
    stats: Arc<BrowserStats>,
    current: Option<String>,
    current_url: Option<String>,
    closed: bool,
}

fn selector_matches(html: &str, selector: &str) -> bool {
    let Ok(selector) = Selector::parse(selector) else {
        return false;
    };
    Html::parse_document(html).select(&selector).next().is_some()
}

#[async_trait]
impl PageSession for FakePage {
    async fn navigate(&mut self, url: &str, _policy: &QuiescencePolicy) -> BrowserResult<()> {
        if self.closed {
            return Err(BrowserError::PageClosed);
        }
        self.stats.visited.lock().unwrap().push(url.to_string());

        if self.site.broken.contains(url) {
            return Err(BrowserError::navigation(url, "net::ERR_CONNECTION_RESET"));
        }
        match self.site.pages.get(url) {
            Some(html) => {
                self.current = Some(html.clone());
                self.current_url = Some(url.to_string());
                Ok(())
            }
            None => Err(BrowserError::navigation(url, "404")),
        }
    }

    async fn document_html(&mut self) -> BrowserResult<String> {
        self.current
            .clone()
            .ok_or_else(|| BrowserError::EvaluationFailed("nothing loaded".to_string()))
    }

    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> BrowserResult<()> {
        let found = self
            .current
            .as_deref()
            .is_some_and(|html| selector_matches(html, selector));
        if found {
            Ok(())
        } else {
            Err(BrowserError::SelectorTimeout {
                selector: selector.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })
        }
    }

    async fn scroll_to_bottom(&mut self) -> BrowserResult<()> {
        if self.closed {
            return Err(BrowserError::PageClosed);
        }
        let url = self
            .current_url
            .clone()
            .ok_or_else(|| BrowserError::EvaluationFailed("nothing loaded".to_string()))?;
        self.stats.scrolled.lock().unwrap().push(url);
        Ok(())
    }

    async fn close(&mut self) -> BrowserResult<()> {
        if !self.closed {
            self.closed = true;
            self.stats.pages_closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// Records notifications instead of sending them
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub sent: Arc<Mutex<Vec<Notification>>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(notification.clone());
        if self.fail {
            return Err(NotifyError::Rejected {
                status: 401,
                body: "invalid API key".to_string(),
            });
        }
        Ok(())
    }
}

/// Defaults with no settle delays, reporting into `report_dir`
pub fn test_config(report_dir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.crawl.category_url = CATEGORY_URL.to_string();
    config.crawl.settle_delay_ms = 0;
    config.audit.settle_delay_ms = 0;
    config.audit.carousel_timeout_ms = 50;
    config.report.directory = report_dir.to_path_buf();
    config
}

pub fn category_page(pagination: &str, product_paths: &[&str]) -> String {
    let links: String = product_paths
        .iter()
        .map(|path| format!(r#"<a href="{path}">product</a>"#))
        .collect();
    format!(
        r#"<html><body><nav><a href="/c/heaters">Heaters</a></nav>{pagination}<div class="grid">{links}</div></body></html>"#
    )
}

pub fn product_page<S: AsRef<str>>(images: &[S]) -> String {
    let imgs: String = images
        .iter()
        .map(|src| format!(r#"<img src="{}">"#, src.as_ref()))
        .collect();
    format!(r#"<html><body><div class="scrollable">{imgs}</div></body></html>"#)
}

pub fn product_page_without_carousel() -> String {
    r#"<html><body><div class="scrollable"></div><img src="/logo.png"></body></html>"#.to_string()
}

pub fn pagination(labels: &[&str]) -> String {
    let links: String = labels.iter().map(|label| format!("<a>{label}</a>")).collect();
    format!(r#"<div class="pagination">{links}</div>"#)
}
