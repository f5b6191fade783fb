//! Page count discovery from the pagination widget

use super::{ParsingConfig, ParsingResult, compile_selector};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;

// Leading integer of a label, the way a browser's parseInt reads it
static LEADING_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([+-]?\d+)").expect("valid page label regex"));

pub struct PaginationParser {
    container_selector: Selector,
    link_selector: Selector,
}

impl PaginationParser {
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(&ParsingConfig::default())
    }

    pub fn with_config(config: &ParsingConfig) -> ParsingResult<Self> {
        Ok(Self {
            container_selector: compile_selector("pagination_container", &config.pagination_container)?,
            link_selector: compile_selector("pagination_link", &config.pagination_link)?,
        })
    }

    /// Highest numeric page label inside the pagination container.
    ///
    /// Returns 1 when there is no container or no numeric label. The raw
    /// value is returned otherwise, so a label like "0" comes back as 0 and
    /// the caller decides how to clamp it.
    pub fn find_max_page(&self, html: &Html) -> i64 {
        let Some(container) = html.select(&self.container_selector).next() else {
            debug!("No pagination container found, assuming a single page");
            return 1;
        };

        let max_page = container
            .select(&self.link_selector)
            .filter_map(|link| Self::parse_page_label(&link.text().collect::<String>()))
            .max();

        max_page.unwrap_or_else(|| {
            debug!("Pagination container has no numeric labels, assuming a single page");
            1
        })
    }

    fn parse_page_label(label: &str) -> Option<i64> {
        LEADING_NUMBER
            .captures(label)
            .and_then(|captures| captures.get(1))
            .and_then(|number| number.as_str().parse().ok())
    }
}
