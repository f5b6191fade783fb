//! Product link extraction for category listing pages
//!
//! Every anchor whose resolved href contains the product path marker counts
//! as a product link. Duplicates within a page are kept here; the crawler
//! deduplicates across the whole category.

#![allow(clippy::uninlined_format_args)]

use super::{ContextualParser, ParseContext, ParsingConfig, ParsingError, ParsingResult, compile_selector};
use crate::domain::ProductUrl;
use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;

/// Parser for extracting product URLs from listing pages
pub struct ProductListParser {
    link_selector: Selector,
    path_marker: String,
}

impl ProductListParser {
    /// Create a new product list parser with default selectors
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(&ParsingConfig::default())
    }

    /// Create parser with custom selector configuration
    pub fn with_config(config: &ParsingConfig) -> ParsingResult<Self> {
        Ok(Self {
            link_selector: compile_selector("product_link", &config.product_link)?,
            path_marker: config.product_path_marker.clone(),
        })
    }

    /// Resolve an href against the page URL. Fragments are dropped so that
    /// `/p/123#reviews` and `/p/123` are the same product.
    fn resolve_url(&self, href: &str, base_url: &Url) -> ParsingResult<Url> {
        let mut resolved = base_url
            .join(href.trim())
            .map_err(|e| ParsingError::UrlResolutionFailed {
                url: href.to_string(),
                reason: format!("Failed to join URL: {}", e),
                base_url: Some(base_url.to_string()),
            })?;
        resolved.set_fragment(None);
        Ok(resolved)
    }

    fn is_product_url(&self, url: &Url) -> bool {
        matches!(url.scheme(), "http" | "https") && url.as_str().contains(&self.path_marker)
    }
}

impl ContextualParser for ProductListParser {
    type Output = Vec<ProductUrl>;
    type Context = ParseContext;

    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> ParsingResult<Self::Output> {
        let mut products = Vec::new();

        for element in html.select(&self.link_selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };

            match self.resolve_url(href, &context.page_url) {
                Ok(url) if self.is_product_url(&url) => {
                    let index = u32::try_from(products.len()).unwrap_or(u32::MAX);
                    products.push(ProductUrl::new(url.to_string(), context.page_index, index));
                }
                Ok(_) => {}
                Err(e) => warn!("Skipping link on page {}: {}", context.page_index + 1, e),
            }
        }

        debug!(
            "Extracted {} product links from page {}",
            products.len(),
            context.page_index + 1
        );
        Ok(products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> ParseContext {
        ParseContext::new(0, Url::parse("https://shop.example/c/heaters?sort=new").unwrap())
    }

    #[test]
    fn test_parser_creation() {
        assert!(ProductListParser::new().is_ok());
    }

    #[test]
    fn test_invalid_selector_is_rejected() {
        let config = ParsingConfig {
            product_link: "a[[href".to_string(),
            ..ParsingConfig::default()
        };
        let err = ProductListParser::with_config(&config).err().unwrap();
        assert!(matches!(err, ParsingError::InvalidSelector { ref field, .. } if field == "product_link"));
    }

    #[test]
    fn test_extracts_only_product_links_in_document_order() {
        let parser = ProductListParser::new().unwrap();
        let html = Html::parse_document(
            r#"
            <nav><a href="/c/heaters">Heaters</a></nav>
            <div class="grid">
                <a href="/p/oil-heater/R100">Oil heater</a>
                <a href="https://shop.example/p/fan-heater/R200#reviews">Fan heater</a>
                <a href="mailto:help@shop.example">Help</a>
                <a href="/p/oil-heater/R100">Oil heater (image)</a>
                <a>no href</a>
            </div>
            "#,
        );

        let products = parser.parse_with_context(&html, &context()).unwrap();
        let urls: Vec<&str> = products.iter().map(ProductUrl::as_str).collect();
        assert_eq!(
            urls,
            vec![
                "https://shop.example/p/oil-heater/R100",
                "https://shop.example/p/fan-heater/R200",
                "https://shop.example/p/oil-heater/R100",
            ]
        );
        assert_eq!(products[1].position(), (0, 1));
    }

    #[test]
    fn test_page_without_products_is_empty_not_error() {
        let parser = ProductListParser::new().unwrap();
        let html = Html::parse_document("<p>No results</p>");
        assert!(parser.parse_with_context(&html, &context()).unwrap().is_empty());
    }

    #[test]
    fn test_url_resolution() {
        let parser = ProductListParser::new().unwrap();
        let base = Url::parse("https://shop.example/c/heaters/").unwrap();

        assert_eq!(
            parser.resolve_url("/p/123", &base).unwrap().as_str(),
            "https://shop.example/p/123"
        );
        assert_eq!(
            parser.resolve_url("https://other.example/p/1", &base).unwrap().as_str(),
            "https://other.example/p/1"
        );
        assert_eq!(
            parser.resolve_url("p/relative", &base).unwrap().as_str(),
            "https://shop.example/c/heaters/p/relative"
        );
    }
}
