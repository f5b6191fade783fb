//! Domain module - product URLs, the fire label rule and audit results
//!
//! Nothing in here touches the network or the filesystem.

pub mod classification;
pub mod flagged_product;
pub mod pagination;
pub mod product_url;

// Re-export commonly used items
pub use classification::{ClassificationLabel, Verdict, classify};
pub use flagged_product::{AuditSummary, FlaggedProduct};
pub use pagination::PaginationCalculator;
pub use product_url::{ProductUrl, dedup_preserving_order};
