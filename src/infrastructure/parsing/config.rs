//! Parsing configuration for HTML extraction
//!
//! Centralized CSS selectors and URL conventions for the storefront.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsingConfig {
    /// Container holding the numbered page links
    pub pagination_container: String,

    /// Page links inside the pagination container
    pub pagination_link: String,

    /// Anchors considered when looking for product links
    pub product_link: String,

    /// Path fragment that identifies a product detail URL
    pub product_path_marker: String,

    /// Images inside the product image carousel
    pub carousel_image: String,

    /// Attributes checked, in order, for an image's source
    pub image_source_attributes: Vec<String>,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            pagination_container: ".pagination".to_string(),
            pagination_link: "a".to_string(),
            product_link: "a[href]".to_string(),
            product_path_marker: "/p/".to_string(),
            carousel_image: "div.scrollable img".to_string(),
            image_source_attributes: vec!["src".to_string(), "data-src".to_string()],
        }
    }
}
