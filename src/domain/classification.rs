//! Fire label classification rule
//!
//! Decides, from the ordered list of carousel image URLs of one product,
//! whether the product has an image issue. The checks run in a fixed
//! precedence order; see [`classify`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder shown by the storefront when a product has no photography yet
pub const COMING_SOON_MARKER: &str = "image-coming-soon.svg";

/// Fire label images end in `_50`..`_59` or `_70`..`_99` followed by `.jpg`
/// and an optional query string.
static FIRE_LABEL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_(5[0-9]|[7-9][0-9])\.jpg(\?.*)?$").expect("valid fire label regex"));

/// Image issue reported for a product. A healthy product has no label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassificationLabel {
    MissingImage,
    MissingFireLabel,
    MultipleFireLabels,
    SingleFireLabelFound,
}

impl ClassificationLabel {
    /// Text written to the report's "Missing Type" column
    pub fn as_report_text(&self) -> &'static str {
        match self {
            Self::MissingImage => "Missing Image",
            Self::MissingFireLabel => "Missing Fire Label",
            Self::MultipleFireLabels => "Multiple Fire Labels",
            Self::SingleFireLabelFound => "Single Fire Label Found",
        }
    }
}

impl fmt::Display for ClassificationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_report_text())
    }
}

/// Outcome of classifying one product, with enough detail to log why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub label: Option<ClassificationLabel>,
    pub fire_label_images: Vec<String>,
    pub reason: &'static str,
}

/// True when the URL looks like a fire label image.
pub fn is_fire_label_image(url: &str) -> bool {
    FIRE_LABEL_PATTERN.is_match(url)
}

/// Classify a product's carousel images.
///
/// Precedence:
/// 1. no images → `MissingImage`
/// 2. any "coming soon" placeholder → `MissingImage`
/// 3. no fire label image → `MissingFireLabel`
/// 4. more than one fire label image → `MultipleFireLabels`
/// 5. the fire label is the only image → `SingleFireLabelFound`
/// 6. one fire label among other images → not flagged
pub fn classify<S: AsRef<str>>(images: &[S]) -> Verdict {
    if images.is_empty() {
        return Verdict {
            label: Some(ClassificationLabel::MissingImage),
            fire_label_images: Vec::new(),
            reason: "no images found on the product page",
        };
    }

    if images
        .iter()
        .any(|src| src.as_ref().contains(COMING_SOON_MARKER))
    {
        return Verdict {
            label: Some(ClassificationLabel::MissingImage),
            fire_label_images: Vec::new(),
            reason: "found \"coming soon\" placeholder image",
        };
    }

    let fire_label_images: Vec<String> = images
        .iter()
        .map(AsRef::as_ref)
        .filter(|src| is_fire_label_image(src))
        .map(str::to_string)
        .collect();

    let (label, reason) = match (fire_label_images.len(), images.len()) {
        (0, _) => (
            Some(ClassificationLabel::MissingFireLabel),
            "no valid fire label image found",
        ),
        (1, 1) => (
            Some(ClassificationLabel::SingleFireLabelFound),
            "fire label is the only image",
        ),
        (1, _) => (None, "valid fire label image found"),
        _ => (
            Some(ClassificationLabel::MultipleFireLabels),
            "multiple valid fire label images found",
        ),
    };

    Verdict {
        label,
        fire_label_images,
        reason,
    }
}
