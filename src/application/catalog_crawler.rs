//! Category crawl: page count discovery, then product links from every page

#![allow(clippy::uninlined_format_args)]

use scraper::Html;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::domain::{PaginationCalculator, ProductUrl, dedup_preserving_order};
use crate::infrastructure::browser::{BrowserResult, PageSession, QuiescencePolicy};
use crate::infrastructure::config::CrawlConfig;
use crate::infrastructure::parsing::{ContextualParser, PaginationParser, ParseContext, ProductListParser};

pub struct CatalogCrawler {
    list_parser: ProductListParser,
    pagination_parser: PaginationParser,
    pages: PaginationCalculator,
    quiescence: QuiescencePolicy,
    settle_delay: Duration,
}

impl CatalogCrawler {
    pub fn new(
        list_parser: ProductListParser,
        pagination_parser: PaginationParser,
        crawl: &CrawlConfig,
        quiescence: QuiescencePolicy,
    ) -> Self {
        Self {
            list_parser,
            pagination_parser,
            pages: PaginationCalculator::new(crawl.page_size, crawl.offset_param.clone()),
            quiescence,
            settle_delay: crawl.settle_delay(),
        }
    }

    /// Every product URL in the category, first-seen order, no duplicates.
    ///
    /// Only a failure on the base category page is returned as an error.
    /// A later page that fails to load contributes no products.
    pub async fn collect_product_urls(
        &self,
        page: &mut dyn PageSession,
        base: &Url,
    ) -> BrowserResult<Vec<ProductUrl>> {
        let page_count = self.discover_page_count(page, base).await?;
        info!("📄 Detected {} pages in the category", page_count);

        let mut collected = Vec::new();
        for page_index in 0..page_count {
            let page_url = self.pages.page_url(base, page_index);
            match self.crawl_page(page, &page_url, page_index).await {
                Ok(products) => {
                    info!("Page {}: Found {} products", page_index + 1, products.len());
                    collected.extend(products);
                }
                Err(e) => warn!("⚠️ Page {} ({}) skipped: {}", page_index + 1, page_url, e),
            }
        }

        let found = collected.len();
        let unique = dedup_preserving_order(collected);
        info!(
            "✅ Total products collected: {} ({} duplicates dropped)",
            unique.len(),
            found - unique.len()
        );
        Ok(unique)
    }

    /// Load the base page and read the highest page label, clamped to at least 1
    pub async fn discover_page_count(&self, page: &mut dyn PageSession, base: &Url) -> BrowserResult<u32> {
        info!("🔍 Navigating to category landing page: {}", base);
        page.navigate(base.as_str(), &self.quiescence).await?;
        tokio::time::sleep(self.settle_delay).await;

        let snapshot = page.document_html().await?;
        let detected = self.pagination_parser.find_max_page(&Html::parse_document(&snapshot));
        if detected < 1 {
            warn!("Pagination reported {} pages, crawling the base page only", detected);
        }
        Ok(PaginationCalculator::clamp_page_count(detected))
    }

    async fn crawl_page(
        &self,
        page: &mut dyn PageSession,
        page_url: &Url,
        page_index: u32,
    ) -> BrowserResult<Vec<ProductUrl>> {
        debug!("Navigating to category page: {}", page_url);
        page.navigate(page_url.as_str(), &self.quiescence).await?;
        page.scroll_to_bottom().await?;
        tokio::time::sleep(self.settle_delay).await;

        let snapshot = page.document_html().await?;
        Ok(self.extract_products(&snapshot, page_url, page_index))
    }

    fn extract_products(&self, snapshot: &str, page_url: &Url, page_index: u32) -> Vec<ProductUrl> {
        let context = ParseContext::new(page_index, page_url.clone());
        self.list_parser
            .parse_with_context(&Html::parse_document(snapshot), &context)
            .unwrap_or_else(|e| {
                warn!("Could not extract products from page {}: {}", page_index + 1, e);
                Vec::new()
            })
    }
}
