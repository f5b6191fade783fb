use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::classification::ClassificationLabel;
use super::product_url::ProductUrl;

/// A product whose images need attention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlaggedProduct {
    pub url: ProductUrl,
    pub label: ClassificationLabel,
}

impl FlaggedProduct {
    pub fn new(url: ProductUrl, label: ClassificationLabel) -> Self {
        Self { url, label }
    }
}

/// Counters for one audit pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditSummary {
    pub audited: usize,
    /// Products whose page never produced a carousel (timeout or navigation failure)
    pub fallbacks: usize,
    pub by_label: BTreeMap<String, usize>,
}

impl AuditSummary {
    pub fn record(&mut self, label: Option<ClassificationLabel>) {
        self.audited += 1;
        if let Some(label) = label {
            *self.by_label.entry(label.to_string()).or_insert(0) += 1;
        }
    }

    pub fn flagged(&self) -> usize {
        self.by_label.values().sum()
    }

    pub fn healthy(&self) -> usize {
        self.audited - self.flagged()
    }

    /// One line per label, e.g. "Missing Image: 3"
    pub fn breakdown(&self) -> String {
        self.by_label
            .iter()
            .map(|(label, count)| format!("{label}: {count}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let mut summary = AuditSummary::default();
        summary.record(Some(ClassificationLabel::MissingImage));
        summary.record(Some(ClassificationLabel::MissingImage));
        summary.record(Some(ClassificationLabel::MultipleFireLabels));
        summary.record(None);

        assert_eq!(summary.audited, 4);
        assert_eq!(summary.flagged(), 3);
        assert_eq!(summary.healthy(), 1);
        assert_eq!(
            summary.breakdown(),
            "Missing Image: 2\nMultiple Fire Labels: 1"
        );
    }
}
