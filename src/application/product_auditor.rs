//! Per-product image audit
//!
//! Products are visited one at a time, each on its own page. Whatever goes
//! wrong on a single product (navigation error, carousel never appearing,
//! evaluation failure) is treated as "no images observed" and the audit
//! moves on to the next URL.

#![allow(clippy::uninlined_format_args)]

use scraper::Html;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::domain::{AuditSummary, FlaggedProduct, ProductUrl, Verdict, classify};
use crate::infrastructure::browser::{BrowserResult, BrowserSession, PageSession, QuiescencePolicy};
use crate::infrastructure::config::AuditConfig;
use crate::infrastructure::parsing::{ContextualParser, DetailParseContext, ProductImageParser};

/// Result of auditing a list of products
#[derive(Debug, Default)]
pub struct AuditReport {
    /// Flagged products, in audit order
    pub flagged: Vec<FlaggedProduct>,
    pub summary: AuditSummary,
}

pub struct ProductAuditor {
    image_parser: ProductImageParser,
    carousel_selector: String,
    quiescence: QuiescencePolicy,
    carousel_timeout: Duration,
    settle_delay: Duration,
}

impl ProductAuditor {
    pub fn new(
        image_parser: ProductImageParser,
        carousel_selector: impl Into<String>,
        audit: &AuditConfig,
        quiescence: QuiescencePolicy,
    ) -> Self {
        Self {
            image_parser,
            carousel_selector: carousel_selector.into(),
            quiescence,
            carousel_timeout: audit.carousel_timeout(),
            settle_delay: audit.settle_delay(),
        }
    }

    pub async fn audit(&self, browser: &dyn BrowserSession, urls: &[ProductUrl]) -> AuditReport {
        let mut report = AuditReport::default();

        for (position, url) in urls.iter().enumerate() {
            info!("Checking product {}/{}: {}", position + 1, urls.len(), url);

            let images = match self.observe_images(browser, url).await {
                Ok(images) => images,
                Err(e) => {
                    warn!("⚠️ Scrollable images not found on product page {}: {}", url, e);
                    report.summary.fallbacks += 1;
                    Vec::new()
                }
            };
            info!("Carousel images for {}: {:?}", url, images);

            let verdict = classify(&images);
            Self::log_verdict(url, &verdict);

            report.summary.record(verdict.label);
            if let Some(label) = verdict.label {
                report.flagged.push(FlaggedProduct::new(url.clone(), label));
            }
        }

        info!(
            "🏁 Audited {} products: {} flagged, {} healthy, {} fallbacks",
            report.summary.audited,
            report.summary.flagged(),
            report.summary.healthy(),
            report.summary.fallbacks
        );
        report
    }

    /// Open a page for one product, read its carousel and close the page
    /// again whatever happened in between.
    async fn observe_images(&self, browser: &dyn BrowserSession, url: &ProductUrl) -> BrowserResult<Vec<String>> {
        let mut page = browser.new_page().await?;
        let images = self.read_carousel(page.as_mut(), url).await;

        if let Err(e) = page.close().await {
            debug!("Closing page for {} failed: {}", url, e);
        }
        images
    }

    async fn read_carousel(&self, page: &mut dyn PageSession, url: &ProductUrl) -> BrowserResult<Vec<String>> {
        page.navigate(url.as_str(), &self.quiescence).await?;
        page.wait_for_selector(&self.carousel_selector, self.carousel_timeout)
            .await?;
        tokio::time::sleep(self.settle_delay).await;

        let snapshot = page.document_html().await?;
        Ok(self.extract_images(&snapshot, url))
    }

    fn extract_images(&self, snapshot: &str, url: &ProductUrl) -> Vec<String> {
        let Ok(base) = Url::parse(url.as_str()) else {
            warn!("Product URL {} is not absolute, skipping image extraction", url);
            return Vec::new();
        };

        self.image_parser
            .parse_with_context(&Html::parse_document(snapshot), &DetailParseContext::new(base))
            .unwrap_or_else(|e| {
                warn!("Could not extract images from {}: {}", url, e);
                Vec::new()
            })
    }

    fn log_verdict(url: &ProductUrl, verdict: &Verdict) {
        if !verdict.fire_label_images.is_empty() {
            debug!("Valid fire label images for {}: {:?}", url, verdict.fire_label_images);
        }
        match verdict.label {
            Some(label) => info!("🚩 {} -> {} ({})", url, label, verdict.reason),
            None => info!("✅ {} ({})", url, verdict.reason),
        }
    }
}
