//! Parsing context for HTML extraction

use url::Url;

/// Context for a category listing page
#[derive(Debug, Clone)]
pub struct ParseContext {
    /// Zero-based category page being parsed
    pub page_index: u32,

    /// URL the page was loaded from, used to resolve relative links
    pub page_url: Url,
}

impl ParseContext {
    pub fn new(page_index: u32, page_url: Url) -> Self {
        Self { page_index, page_url }
    }
}

/// Context for a product detail page
#[derive(Debug, Clone)]
pub struct DetailParseContext {
    /// Product URL being parsed; image sources resolve against it
    pub url: Url,
}

impl DetailParseContext {
    pub fn new(url: Url) -> Self {
        Self { url }
    }
}
