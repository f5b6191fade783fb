//! Configuration infrastructure
//!
//! Settings are layered, lowest precedence first:
//! 1. Compiled defaults (see [`defaults`])
//! 2. Optional `fire_label_audit.{toml,json,yaml}` in the working directory
//! 3. `FIRE_LABEL__SECTION__KEY` environment variables
//! 4. The deployment variables `CATEGORY_URL`, `HEADLESS_MODE`,
//!    `SENDGRID_API_KEY` and `REPORT_RECIPIENT`
//!
//! Everything is read once at start-up.

#![allow(clippy::uninlined_format_args)]

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {source}")]
    Load {
        #[from]
        source: config::ConfigError,
    },

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },
}

/// Environment variable names used by deployments (CI jobs, cron wrappers)
pub mod env_vars {
    pub const CATEGORY_URL: &str = "CATEGORY_URL";
    pub const HEADLESS_MODE: &str = "HEADLESS_MODE";
    pub const SENDGRID_API_KEY: &str = "SENDGRID_API_KEY";
    pub const REPORT_RECIPIENT: &str = "REPORT_RECIPIENT";

    /// Prefix for structured overrides, e.g. `FIRE_LABEL__CRAWL__PAGE_SIZE=24`
    pub const PREFIX: &str = "FIRE_LABEL";
    pub const SEPARATOR: &str = "__";
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub crawl: CrawlConfig,
    pub audit: AuditConfig,
    pub browser: BrowserConfig,
    pub parsing: crate::infrastructure::parsing::ParsingConfig,
    pub report: ReportConfig,
    pub notify: NotifyConfig,
    pub logging: LoggingConfig,
}

/// Category crawl settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Base category listing URL
    pub category_url: String,

    /// Products per category page; the offset step
    pub page_size: u32,

    /// Query parameter carrying the offset
    pub offset_param: String,

    /// Pause after scrolling a category page so lazy content renders
    pub settle_delay_ms: u64,
}

/// Product audit settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Upper bound on waiting for the carousel to appear
    pub carousel_timeout_ms: u64,

    /// Pause after the carousel appears, before reading image sources
    pub settle_delay_ms: u64,
}

/// Browser automation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    pub headless: bool,

    /// Explicit Chrome/Chromium binary; auto-detected when unset
    pub executable: Option<PathBuf>,

    pub navigation_timeout_ms: u64,

    pub quiescence: QuiescencePolicy,
}

/// "Network idle" policy used after every navigation.
///
/// The page counts as settled once no more than `max_inflight` requests have
/// been outstanding for `idle_window_ms`, or after `max_wait_ms` regardless.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuiescencePolicy {
    pub max_inflight: u32,
    pub idle_window_ms: u64,
    pub max_wait_ms: u64,
    pub poll_interval_ms: u64,
}

/// Report artifact settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub directory: PathBuf,
    pub file_prefix: String,
    pub extension: String,
}

/// Email notification settings
#[derive(Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// SendGrid API key; notifications are disabled without it
    pub api_key: Option<String>,
    pub from: String,
    pub to: Option<String>,
    pub subject: String,
    pub endpoint: String,
    pub attach_report: bool,
    pub timeout_seconds: u64,
}

// Keep the API key out of debug logs
impl std::fmt::Debug for NotifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("from", &self.from)
            .field("to", &self.to)
            .field("subject", &self.subject)
            .field("endpoint", &self.endpoint)
            .field("attach_report", &self.attach_report)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted file logs
    pub json_format: bool,

    /// Also write logs to `directory`
    pub file_output: bool,

    pub directory: PathBuf,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            category_url: defaults::CATEGORY_URL.to_string(),
            page_size: defaults::PAGE_SIZE,
            offset_param: defaults::OFFSET_PARAM.to_string(),
            settle_delay_ms: defaults::SETTLE_DELAY_MS,
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            carousel_timeout_ms: defaults::CAROUSEL_TIMEOUT_MS,
            settle_delay_ms: defaults::SETTLE_DELAY_MS,
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            navigation_timeout_ms: defaults::NAVIGATION_TIMEOUT_MS,
            quiescence: QuiescencePolicy::default(),
        }
    }
}

impl Default for QuiescencePolicy {
    fn default() -> Self {
        Self {
            max_inflight: defaults::QUIESCENCE_MAX_INFLIGHT,
            idle_window_ms: defaults::QUIESCENCE_IDLE_WINDOW_MS,
            max_wait_ms: defaults::QUIESCENCE_MAX_WAIT_MS,
            poll_interval_ms: defaults::QUIESCENCE_POLL_INTERVAL_MS,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(defaults::REPORT_DIRECTORY),
            file_prefix: defaults::REPORT_FILE_PREFIX.to_string(),
            extension: defaults::REPORT_EXTENSION.to_string(),
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            from: defaults::MAIL_FROM.to_string(),
            to: None,
            subject: defaults::MAIL_SUBJECT.to_string(),
            endpoint: defaults::SENDGRID_ENDPOINT.to_string(),
            attach_report: true,
            timeout_seconds: defaults::MAIL_TIMEOUT_SECONDS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            file_output: defaults::LOG_FILE_OUTPUT,
            directory: PathBuf::from(defaults::LOG_DIRECTORY),
        }
    }
}

impl CrawlConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl AuditConfig {
    pub fn carousel_timeout(&self) -> Duration {
        Duration::from_millis(self.carousel_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl QuiescencePolicy {
    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }
}

impl AppConfig {
    /// Load configuration from the process environment and the optional
    /// config file in the working directory.
    pub fn load() -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::load_from(&vars, Some(Path::new(defaults::CONFIG_FILE_STEM)))
    }

    /// Load configuration from an explicit variable map.
    ///
    /// `config_file` is a path without extension; a missing file is fine.
    pub fn load_from(
        vars: &HashMap<String, String>,
        config_file: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&AppConfig::default())?);

        if let Some(path) = config_file {
            builder = builder.add_source(
                config::File::with_name(&path.to_string_lossy()).required(false),
            );
        }

        let prefixed: HashMap<String, String> = vars
            .iter()
            .filter(|(key, _)| key.starts_with(env_vars::PREFIX))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        builder = builder
            .add_source(
                config::Environment::with_prefix(env_vars::PREFIX)
                    .separator(env_vars::SEPARATOR)
                    .try_parsing(true)
                    .source(Some(prefixed)),
            )
            .set_override_option(
                "crawl.category_url",
                non_empty(vars, env_vars::CATEGORY_URL).map(str::to_string),
            )?
            .set_override_option(
                "browser.headless",
                non_empty(vars, env_vars::HEADLESS_MODE)
                    .map(|mode| mode.eq_ignore_ascii_case("yes")),
            )?
            .set_override_option(
                "notify.api_key",
                non_empty(vars, env_vars::SENDGRID_API_KEY).map(str::to_string),
            )?
            .set_override_option(
                "notify.to",
                non_empty(vars, env_vars::REPORT_RECIPIENT).map(str::to_string),
            )?;

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make the run meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.crawl.page_size == 0 {
            return Err(ConfigError::Validation {
                message: "crawl.page_size must be greater than 0".to_string(),
            });
        }

        if let Err(e) = url::Url::parse(&self.crawl.category_url) {
            return Err(ConfigError::Validation {
                message: format!(
                    "crawl.category_url '{}' is not a valid URL: {}",
                    self.crawl.category_url, e
                ),
            });
        }

        if self.audit.carousel_timeout_ms == 0 {
            return Err(ConfigError::Validation {
                message: "audit.carousel_timeout_ms must be greater than 0".to_string(),
            });
        }

        if self.browser.quiescence.poll_interval_ms == 0 {
            return Err(ConfigError::Validation {
                message: "browser.quiescence.poll_interval_ms must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Log the effective settings (secrets redacted)
    pub fn log_summary(&self) {
        info!("Category URL: {}", self.crawl.category_url);
        info!(
            "Page size: {} (offset param '{}'), settle delay: {}ms",
            self.crawl.page_size, self.crawl.offset_param, self.crawl.settle_delay_ms
        );
        info!(
            "Carousel selector: '{}', timeout: {}ms",
            self.parsing.carousel_image, self.audit.carousel_timeout_ms
        );
        info!("Headless browser: {}", self.browser.headless);
        info!("Report directory: {:?}", self.report.directory);
        info!(
            "Notifications: {}",
            if self.notify.api_key.is_some() { "enabled" } else { "disabled (no API key)" }
        );
    }
}

/// Default configuration values
pub mod defaults {
    /// Placeholder category used when CATEGORY_URL is not set
    pub const CATEGORY_URL: &str = "https://example.com/category";

    /// Products per category page on the storefront
    pub const PAGE_SIZE: u32 = 32;

    pub const OFFSET_PARAM: &str = "start";

    /// Pause for lazy-loaded content, in milliseconds
    pub const SETTLE_DELAY_MS: u64 = 2000;

    pub const CAROUSEL_TIMEOUT_MS: u64 = 10_000;

    pub const NAVIGATION_TIMEOUT_MS: u64 = 60_000;

    // Roughly puppeteer's "networkidle2"
    pub const QUIESCENCE_MAX_INFLIGHT: u32 = 2;
    pub const QUIESCENCE_IDLE_WINDOW_MS: u64 = 500;
    pub const QUIESCENCE_MAX_WAIT_MS: u64 = 30_000;
    pub const QUIESCENCE_POLL_INTERVAL_MS: u64 = 100;

    pub const REPORT_DIRECTORY: &str = "fire_label_report";
    pub const REPORT_FILE_PREFIX: &str = "missing_fire_labels_";
    pub const REPORT_EXTENSION: &str = "csv";

    pub const MAIL_FROM: &str = "your_email@example.com";
    pub const MAIL_SUBJECT: &str = "Missing Fire Labels Report";
    pub const SENDGRID_ENDPOINT: &str = "https://api.sendgrid.com/v3/mail/send";
    pub const MAIL_TIMEOUT_SECONDS: u64 = 30;

    pub const LOG_LEVEL: &str = "info";
    pub const LOG_JSON_FORMAT: bool = false;
    pub const LOG_FILE_OUTPUT: bool = false;
    pub const LOG_DIRECTORY: &str = "logs";

    /// Config file looked up in the working directory (extension optional)
    pub const CONFIG_FILE_STEM: &str = "fire_label_audit";
}

/// A legacy variable set to an empty string counts as unset
fn non_empty<'a>(vars: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    vars.get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}
