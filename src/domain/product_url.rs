use serde::{Deserialize, Serialize};
use std::fmt;

/// Absolute product detail page URL together with where it was discovered.
/// Equality and hashing only consider the URL itself, so the same product
/// found on two category pages collapses to a single entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductUrl {
    /// Product detail page URL
    pub url: String,
    /// Zero-based category page the product was first seen on
    pub page_index: u32,
    /// Position within that page (0-based)
    pub index_in_page: u32,
}

impl ProductUrl {
    pub fn new(url: impl Into<String>, page_index: u32, index_in_page: u32) -> Self {
        Self {
            url: url.into(),
            page_index,
            index_in_page,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// (page, index) pair, useful in log lines
    pub fn position(&self) -> (u32, u32) {
        (self.page_index, self.index_in_page)
    }
}

impl PartialEq for ProductUrl {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl Eq for ProductUrl {}

impl std::hash::Hash for ProductUrl {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.url.hash(state);
    }
}

impl From<ProductUrl> for String {
    fn from(product_url: ProductUrl) -> Self {
        product_url.url
    }
}

impl AsRef<str> for ProductUrl {
    fn as_ref(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for ProductUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (page: {}, index: {})",
            self.url, self.page_index, self.index_in_page
        )
    }
}

/// Deduplicate product URLs keeping the first occurrence of each.
pub fn dedup_preserving_order(urls: Vec<ProductUrl>) -> Vec<ProductUrl> {
    let mut seen = std::collections::HashSet::with_capacity(urls.len());
    urls.into_iter()
        .filter(|product| seen.insert(product.url.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_equality_ignores_position() {
        let a = ProductUrl::new("https://shop.example/p/1", 0, 3);
        let b = ProductUrl::new("https://shop.example/p/1", 2, 0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_dedup_keeps_first_seen() {
        let urls = vec![
            ProductUrl::new("https://shop.example/p/a", 0, 0),
            ProductUrl::new("https://shop.example/p/b", 0, 1),
            ProductUrl::new("https://shop.example/p/a", 1, 0),
            ProductUrl::new("https://shop.example/p/c", 1, 1),
        ];

        let deduped = dedup_preserving_order(urls);
        let as_str: Vec<&str> = deduped.iter().map(ProductUrl::as_str).collect();
        assert_eq!(
            as_str,
            vec![
                "https://shop.example/p/a",
                "https://shop.example/p/b",
                "https://shop.example/p/c"
            ]
        );
        // first sighting wins
        assert_eq!(deduped[0].position(), (0, 0));
    }

    proptest! {
        #[test]
        fn dedup_has_no_duplicates_and_keeps_order(ids in prop::collection::vec(0u8..20, 0..60)) {
            let urls: Vec<ProductUrl> = ids
                .iter()
                .enumerate()
                .map(|(i, id)| ProductUrl::new(format!("https://shop.example/p/{id}"), 0, i as u32))
                .collect();

            let deduped = dedup_preserving_order(urls);

            let mut expected: Vec<String> = Vec::new();
            for id in &ids {
                let url = format!("https://shop.example/p/{id}");
                if !expected.contains(&url) {
                    expected.push(url);
                }
            }
            let actual: Vec<String> = deduped.into_iter().map(String::from).collect();
            prop_assert_eq!(actual, expected);
        }
    }
}
