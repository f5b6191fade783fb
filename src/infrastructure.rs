//! Infrastructure layer: configuration, logging, HTML parsing, browser
//! automation, the report file and outbound notification.

pub mod browser; // Browser/page traits and the quiescence policy
pub mod chromium; // chromiumoxide engine
pub mod config;
pub mod logging;
pub mod notifier;
pub mod parsing;
pub mod report_writer;

// Re-export commonly used items
pub use browser::{BrowserError, BrowserResult, BrowserSession, PageSession, QuiescencePolicy};
pub use chromium::ChromiumBrowser;
pub use config::{AppConfig, ConfigError};
pub use logging::{init_logging, log_system_info};
pub use notifier::{Notification, Notifier, NotifyError, SendGridNotifier};
pub use parsing::{PageParsers, ParsingConfig, ParsingError, ParsingResult};
pub use report_writer::{ReportError, ReportWriter};
