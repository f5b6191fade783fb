//! Browser automation seam
//!
//! The crawler and the auditor only talk to these traits. The Chromium
//! implementation lives in [`crate::infrastructure::chromium`]; tests drive
//! the same code with an in-memory fake.

#![allow(clippy::uninlined_format_args)]

use async_trait::async_trait;
use std::time::{Duration, Instant};
use thiserror::Error;

pub use crate::infrastructure::config::QuiescencePolicy;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrowserError {
    #[error("Browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("Navigation to {url} failed: {reason}")]
    NavigationFailed { url: String, reason: String },

    #[error("Selector '{selector}' did not appear within {timeout_ms}ms")]
    SelectorTimeout { selector: String, timeout_ms: u64 },

    #[error("Page evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("Page is already closed")]
    PageClosed,
}

impl BrowserError {
    /// Only a browser that never started is fatal to a run
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::LaunchFailed(_))
    }

    pub fn navigation(url: &str, reason: impl ToString) -> Self {
        Self::NavigationFailed {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type BrowserResult<T> = Result<T, BrowserError>;

/// A running browser that can open isolated pages
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Open a fresh page (tab)
    async fn new_page(&self) -> BrowserResult<Box<dyn PageSession>>;

    /// Shut the browser down
    async fn close(&mut self) -> BrowserResult<()>;
}

/// One open page
#[async_trait]
pub trait PageSession: Send {
    /// Load `url` and wait for network quiescence under `policy`
    async fn navigate(&mut self, url: &str, policy: &QuiescencePolicy) -> BrowserResult<()>;

    /// Snapshot of the rendered DOM, for extraction
    async fn document_html(&mut self) -> BrowserResult<String>;

    /// Wait until `selector` matches, failing after `timeout`
    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> BrowserResult<()>;

    /// Scroll to the end of the document to trigger lazy loading
    async fn scroll_to_bottom(&mut self) -> BrowserResult<()>;

    /// Close the page. Closing twice is not an error.
    async fn close(&mut self) -> BrowserResult<()>;
}

/// How a quiescence wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuiescenceOutcome {
    Settled,
    TimedOut,
}

/// Tracks in-flight request samples against a [`QuiescencePolicy`].
///
/// Each sample is the number of requests the page has started but not yet
/// finished. The page settles once that number has stayed at or below
/// `max_inflight` for `idle_window_ms`; it gives up after `max_wait_ms`.
#[derive(Debug)]
pub struct QuiescenceTracker {
    policy: QuiescencePolicy,
    started: Instant,
    quiet_since: Instant,
}

impl QuiescenceTracker {
    pub fn new(policy: QuiescencePolicy, now: Instant) -> Self {
        Self {
            policy,
            started: now,
            quiet_since: now,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.policy.poll_interval_ms)
    }

    /// Feed one sample; `Some` once the wait is over.
    pub fn observe(&mut self, inflight: usize, now: Instant) -> Option<QuiescenceOutcome> {
        if inflight > self.policy.max_inflight as usize {
            self.quiet_since = now;
        } else if now.duration_since(self.quiet_since)
            >= Duration::from_millis(self.policy.idle_window_ms)
        {
            return Some(QuiescenceOutcome::Settled);
        }

        if now.duration_since(self.started) >= self.policy.max_wait() {
            return Some(QuiescenceOutcome::TimedOut);
        }

        None
    }
}
