//! Fire Label Audit - storefront image compliance crawler
//!
//! Crawls a paginated category listing in a headless browser, visits every
//! product page, checks the image carousel for a fire label image and writes
//! a dated CSV report of the products that need attention. When anything is
//! flagged, a summary is emailed through SendGrid.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

// Re-export the entry points used by the binary
pub use application::{AuditRun, RunOutcome};
pub use infrastructure::config::AppConfig;
