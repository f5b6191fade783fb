//! Dated CSV report of flagged products

#![allow(clippy::uninlined_format_args)]

use chrono::NaiveDate;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use super::config::ReportConfig;
use crate::domain::FlaggedProduct;

pub const REPORT_HEADER: &str = "Product URL,Missing Type";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to create report directory {path:?}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write report {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode report row: {0}")]
    Csv(#[from] csv::Error),
}

pub struct ReportWriter {
    config: ReportConfig,
}

impl ReportWriter {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    /// `missing_fire_labels_2024-05-01.csv` under the report directory
    pub fn report_path(&self, date: NaiveDate) -> PathBuf {
        self.config.directory.join(format!(
            "{}{}.{}",
            self.config.file_prefix,
            date.format("%Y-%m-%d"),
            self.config.extension
        ))
    }

    /// Write the report for `date`, replacing any report already written that day.
    pub fn write(&self, flagged: &[FlaggedProduct], date: NaiveDate) -> Result<PathBuf, ReportError> {
        fs::create_dir_all(&self.config.directory).map_err(|source| ReportError::CreateDirectory {
            path: self.config.directory.clone(),
            source,
        })?;

        let path = self.report_path(date);
        let file = File::create(&path).map_err(|source| ReportError::Io {
            path: path.clone(),
            source,
        })?;

        Self::write_rows(BufWriter::new(file), flagged, &path)?;

        info!("Report written to {:?} ({} rows)", path, flagged.len());
        Ok(path)
    }

    fn write_rows<W: Write>(mut out: W, flagged: &[FlaggedProduct], path: &Path) -> Result<(), ReportError> {
        let io_error = |source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        };

        // The header is unquoted; every data field is quoted
        writeln!(out, "{}", REPORT_HEADER).map_err(io_error)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .quote_style(csv::QuoteStyle::Always)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(out);

        for product in flagged {
            writer.write_record([product.url.as_str(), product.label.as_report_text()])?;
        }

        writer.flush().map_err(io_error)?;
        Ok(())
    }
}
