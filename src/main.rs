#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use tracing::{info, warn};

use fire_label_audit::AuditRun;
use fire_label_audit::infrastructure::{
    AppConfig, ChromiumBrowser, Notifier, SendGridNotifier, init_logging, log_system_info,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;

    init_logging(&config.logging)?;
    log_system_info();
    config.log_summary();

    let notifier: Option<Box<dyn Notifier>> = match SendGridNotifier::from_config(&config.notify) {
        Some(Ok(notifier)) => Some(Box::new(notifier)),
        Some(Err(e)) => {
            warn!("Notifications disabled: {}", e);
            None
        }
        None => None,
    };

    let run = AuditRun::new(&config, notifier)?;
    let mut browser = ChromiumBrowser::launch(&config.browser)
        .await
        .context("Failed to launch the browser")?;

    let outcome = run.execute(&mut browser).await?;

    info!(
        "📊 Report {:?}: {} of {} products flagged",
        outcome.report_path,
        outcome.flagged.len(),
        outcome.summary.audited
    );
    for line in outcome.summary.breakdown().lines() {
        info!("  {}", line);
    }
    Ok(())
}
