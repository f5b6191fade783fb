//! Application layer
//!
//! Orchestrates the domain rules and the infrastructure collaborators into
//! the audit run.

pub mod audit_run;
pub mod catalog_crawler;
pub mod product_auditor;

pub use audit_run::{AuditRun, RunOutcome};
pub use catalog_crawler::CatalogCrawler;
pub use product_auditor::{AuditReport, ProductAuditor};
