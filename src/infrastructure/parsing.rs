//! HTML parsing for rendered storefront pages
//!
//! The browser hands back a snapshot of the rendered DOM; everything that
//! reads structure out of it (product links, pagination labels, carousel
//! images) lives here so it can be tested against plain HTML strings.

pub mod config;
pub mod context;
pub mod error;
pub mod pagination_parser;
pub mod product_image_parser;
pub mod product_list_parser;

// Re-export public types
pub use config::ParsingConfig;
pub use context::{DetailParseContext, ParseContext};
pub use error::{ParsingError, ParsingResult};
pub use pagination_parser::PaginationParser;
pub use product_image_parser::ProductImageParser;
pub use product_list_parser::ProductListParser;

use scraper::{Html, Selector};

/// Parser trait with context support
pub trait ContextualParser {
    type Output;
    type Context;

    /// Parse HTML with contextual information
    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> ParsingResult<Self::Output>;
}

/// Compile a configured CSS selector, naming the offending field on failure
pub(crate) fn compile_selector(field: &str, selector: &str) -> ParsingResult<Selector> {
    Selector::parse(selector).map_err(|e| ParsingError::invalid_selector(field, selector, &e.to_string()))
}

/// All parsers built from one configuration
pub struct PageParsers {
    pub product_list: ProductListParser,
    pub pagination: PaginationParser,
    pub product_images: ProductImageParser,
}

impl PageParsers {
    pub fn new(config: &ParsingConfig) -> ParsingResult<Self> {
        Ok(Self {
            product_list: ProductListParser::with_config(config)?,
            pagination: PaginationParser::with_config(config)?,
            product_images: ProductImageParser::with_config(config)?,
        })
    }
}
