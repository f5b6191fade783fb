//! The batch job: crawl, audit, write the report, notify.

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use std::path::PathBuf;
use tracing::{error, info, warn};
use url::Url;

use super::catalog_crawler::CatalogCrawler;
use super::product_auditor::{AuditReport, ProductAuditor};
use crate::domain::{AuditSummary, FlaggedProduct, ProductUrl};
use crate::infrastructure::browser::BrowserSession;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::notifier::{Notification, Notifier};
use crate::infrastructure::parsing::PageParsers;
use crate::infrastructure::report_writer::ReportWriter;

/// What a completed run produced
#[derive(Debug)]
pub struct RunOutcome {
    pub report_path: PathBuf,
    pub flagged: Vec<FlaggedProduct>,
    pub summary: AuditSummary,
    /// True only when a notification was delivered
    pub notified: bool,
}

pub struct AuditRun {
    category_url: Url,
    crawler: CatalogCrawler,
    auditor: ProductAuditor,
    writer: ReportWriter,
    notifier: Option<Box<dyn Notifier>>,
}

impl AuditRun {
    /// Wire the run from configuration. Fails on an invalid category URL or
    /// an invalid configured selector.
    pub fn new(config: &AppConfig, notifier: Option<Box<dyn Notifier>>) -> Result<Self> {
        let category_url = Url::parse(&config.crawl.category_url)
            .with_context(|| format!("Invalid category URL '{}'", config.crawl.category_url))?;

        let PageParsers {
            product_list,
            pagination,
            product_images,
        } = PageParsers::new(&config.parsing).context("Invalid parsing configuration")?;

        let quiescence = config.browser.quiescence.clone();
        Ok(Self {
            category_url,
            crawler: CatalogCrawler::new(product_list, pagination, &config.crawl, quiescence.clone()),
            auditor: ProductAuditor::new(
                product_images,
                config.parsing.carousel_image.clone(),
                &config.audit,
                quiescence,
            ),
            writer: ReportWriter::new(config.report.clone()),
            notifier,
        })
    }

    /// Run against `browser`, dating the report with today's UTC date.
    pub async fn execute(&self, browser: &mut dyn BrowserSession) -> Result<RunOutcome> {
        self.execute_on(browser, Utc::now().date_naive()).await
    }

    /// Run against `browser` and date the report `date`.
    ///
    /// The browser is closed once the audit is done, before the report is
    /// written. Notification failures are logged and do not fail the run.
    pub async fn execute_on(&self, browser: &mut dyn BrowserSession, date: NaiveDate) -> Result<RunOutcome> {
        let urls = match self.crawl(browser).await {
            Ok(urls) => urls,
            Err(e) => {
                Self::close_browser(browser).await;
                return Err(e);
            }
        };

        let AuditReport { flagged, summary } = self.auditor.audit(browser, &urls).await;
        Self::close_browser(browser).await;

        let report_path = self
            .writer
            .write(&flagged, date)
            .context("Failed to write the report")?;

        let notified = self.notify(&flagged, &summary, &report_path).await;

        Ok(RunOutcome {
            report_path,
            flagged,
            summary,
            notified,
        })
    }

    async fn crawl(&self, browser: &dyn BrowserSession) -> Result<Vec<ProductUrl>> {
        let mut page = browser
            .new_page()
            .await
            .context("Failed to open a page for the category crawl")?;

        let urls = self
            .crawler
            .collect_product_urls(page.as_mut(), &self.category_url)
            .await
            .with_context(|| format!("Failed to crawl category {}", self.category_url));

        if let Err(e) = page.close().await {
            warn!("Closing the category page failed: {}", e);
        }
        urls
    }

    async fn close_browser(browser: &mut dyn BrowserSession) {
        if let Err(e) = browser.close().await {
            warn!("Browser did not close cleanly: {}", e);
        }
    }

    async fn notify(&self, flagged: &[FlaggedProduct], summary: &AuditSummary, report_path: &std::path::Path) -> bool {
        if flagged.is_empty() {
            info!("No flagged products, no notification sent");
            return false;
        }

        let Some(notifier) = &self.notifier else {
            warn!(
                "{} products flagged but notifications are disabled (no API key or recipient)",
                flagged.len()
            );
            return false;
        };

        let notification = Notification {
            flagged_count: flagged.len(),
            summary: summary.breakdown(),
            report_path: report_path.to_path_buf(),
        };

        match notifier.notify(&notification).await {
            Ok(()) => true,
            Err(e) => {
                error!("❌ Failed to send notification: {}", e);
                false
            }
        }
    }
}
