//! Category crawl against canned category pages
mod common;

use common::{CATEGORY_URL, FakeBrowser, FakeSite, category_page, pagination};
use fire_label_audit::application::CatalogCrawler;
use fire_label_audit::domain::ProductUrl;
use fire_label_audit::infrastructure::browser::QuiescencePolicy;
use fire_label_audit::infrastructure::config::CrawlConfig;
use fire_label_audit::infrastructure::parsing::{PaginationParser, ProductListParser};
use url::Url;

fn crawler() -> CatalogCrawler {
    let crawl = CrawlConfig {
        settle_delay_ms: 0,
        ..CrawlConfig::default()
    };
    CatalogCrawler::new(
        ProductListParser::new().unwrap(),
        PaginationParser::new().unwrap(),
        &crawl,
        QuiescencePolicy::default(),
    )
}

fn base() -> Url {
    Url::parse(CATEGORY_URL).unwrap()
}

fn page_url(start: u32) -> String {
    format!("{CATEGORY_URL}?start={start}")
}

fn urls(products: &[ProductUrl]) -> Vec<&str> {
    products.iter().map(ProductUrl::as_str).collect()
}

#[tokio::test]
async fn duplicates_across_pages_keep_first_seen_order() {
    let site = FakeSite::new()
        .page(
            CATEGORY_URL,
            category_page(&pagination(&["1", "2", "Next"]), &["/p/a", "/p/b", "/p/a"]),
        )
        .page(
            &page_url(32),
            category_page(&pagination(&["1", "2"]), &["/p/c", "/p/b", "/p/a#reviews"]),
        );
    let browser = FakeBrowser::new(site);
    let mut page = browser.open_page();

    let products = crawler()
        .collect_product_urls(&mut page, &base())
        .await
        .unwrap();

    assert_eq!(
        urls(&products),
        vec![
            "https://shop.example/p/a",
            "https://shop.example/p/b",
            "https://shop.example/p/c",
        ]
    );
    assert_eq!(products[2].position(), (1, 0));
    assert_eq!(
        browser.stats.visited(),
        vec![CATEGORY_URL.to_string(), CATEGORY_URL.to_string(), page_url(32)]
    );
}

#[tokio::test]
async fn each_category_page_is_scrolled_once_before_extraction() {
    let site = FakeSite::new()
        .page(CATEGORY_URL, category_page(&pagination(&["1", "2", "3"]), &["/p/a"]))
        .page(&page_url(32), category_page("", &["/p/b"]))
        .page(&page_url(64), category_page("", &["/p/c"]));
    let browser = FakeBrowser::new(site);
    let mut page = browser.open_page();

    crawler()
        .collect_product_urls(&mut page, &base())
        .await
        .unwrap();

    // page-count discovery reads the first page without scrolling
    assert_eq!(
        browser.stats.scrolled(),
        vec![CATEGORY_URL.to_string(), page_url(32), page_url(64)]
    );
}

#[tokio::test]
async fn empty_page_does_not_stop_iteration() {
    let site = FakeSite::new()
        .page(CATEGORY_URL, category_page(&pagination(&["1", "2", "3"]), &["/p/a"]))
        .page(&page_url(32), category_page("", &[]))
        .page(&page_url(64), category_page("", &["/p/z"]));
    let browser = FakeBrowser::new(site);
    let mut page = browser.open_page();

    let products = crawler()
        .collect_product_urls(&mut page, &base())
        .await
        .unwrap();

    assert_eq!(
        urls(&products),
        vec!["https://shop.example/p/a", "https://shop.example/p/z"]
    );
}

#[tokio::test]
async fn no_pagination_crawls_base_page_once() {
    let site = FakeSite::new().page(CATEGORY_URL, category_page("", &["/p/a", "/p/b"]));
    let browser = FakeBrowser::new(site);
    let mut page = browser.open_page();

    let products = crawler()
        .collect_product_urls(&mut page, &base())
        .await
        .unwrap();

    assert_eq!(products.len(), 2);
    assert_eq!(browser.stats.visited().len(), 2);
}

#[tokio::test]
async fn zero_page_count_is_clamped_to_one() {
    let site = FakeSite::new().page(CATEGORY_URL, category_page(&pagination(&["0"]), &["/p/a"]));
    let browser = FakeBrowser::new(site);
    let mut page = browser.open_page();

    let crawler = crawler();
    assert_eq!(crawler.discover_page_count(&mut page, &base()).await.unwrap(), 1);

    let products = crawler.collect_product_urls(&mut page, &base()).await.unwrap();
    assert_eq!(urls(&products), vec!["https://shop.example/p/a"]);
}

#[tokio::test]
async fn failing_category_page_is_skipped() {
    let site = FakeSite::new()
        .page(CATEGORY_URL, category_page(&pagination(&["1", "2", "3"]), &["/p/a"]))
        .broken(&page_url(32))
        .page(&page_url(64), category_page("", &["/p/c"]));
    let browser = FakeBrowser::new(site);
    let mut page = browser.open_page();

    let products = crawler()
        .collect_product_urls(&mut page, &base())
        .await
        .unwrap();

    assert_eq!(
        urls(&products),
        vec!["https://shop.example/p/a", "https://shop.example/p/c"]
    );
}

#[tokio::test]
async fn failing_base_page_is_an_error() {
    let browser = FakeBrowser::new(FakeSite::new().broken(CATEGORY_URL));
    let mut page = browser.open_page();

    let result = crawler().collect_product_urls(&mut page, &base()).await;
    assert!(result.is_err());
}
