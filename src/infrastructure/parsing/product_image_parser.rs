//! Carousel image extraction for product detail pages

#![allow(clippy::uninlined_format_args)]

use super::{ContextualParser, DetailParseContext, ParsingConfig, ParsingResult, compile_selector};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// Reads the ordered list of carousel image sources from a product page.
pub struct ProductImageParser {
    image_selector: Selector,
    source_attributes: Vec<String>,
}

impl ProductImageParser {
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(&ParsingConfig::default())
    }

    pub fn with_config(config: &ParsingConfig) -> ParsingResult<Self> {
        Ok(Self {
            image_selector: compile_selector("carousel_image", &config.carousel_image)?,
            source_attributes: config.image_source_attributes.clone(),
        })
    }

    /// Source of one image, resolved to an absolute URL when possible.
    ///
    /// An image with no source at all still yields an empty entry; the
    /// browser reports such images with an empty `src`, and they count
    /// toward the total number of images.
    fn image_source(&self, image: &ElementRef, context: &DetailParseContext) -> String {
        let raw = self
            .source_attributes
            .iter()
            .filter_map(|attr| image.value().attr(attr))
            .map(str::trim)
            .find(|src| !src.is_empty());

        match raw {
            Some(src) => context
                .url
                .join(src)
                .map_or_else(|_| src.to_string(), |resolved| resolved.to_string()),
            None => String::new(),
        }
    }
}

impl ContextualParser for ProductImageParser {
    type Output = Vec<String>;
    type Context = DetailParseContext;

    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> ParsingResult<Self::Output> {
        let images: Vec<String> = html
            .select(&self.image_selector)
            .map(|image| self.image_source(&image, context))
            .collect();

        debug!("Found {} carousel images on {}", images.len(), context.url);
        Ok(images)
    }
}
