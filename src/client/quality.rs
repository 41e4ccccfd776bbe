// Quality Populator: turns the server's quality lists into selector state
//
// Handles:
// - Human-readable labels for known tiers
// - Largest-first ordering with the largest preselected
// - Short-video sentinel option
// - Estimated size of the current selection

use serde::Serialize;

use super::models::{FormatType, QualityOption, SHORT_QUALITY, SHORT_QUALITY_LABEL};
use super::utils::format_bytes;

/// Display names for known tiers; unknown tiers show their raw label
const QUALITY_DISPLAY_MAP: [(&str, &str); 16] = [
    ("4320p", "Best (8K)"),
    ("2880p", "High (5K)"),
    ("2160p", "Best (4K)"),
    ("1440p", "High (2K)"),
    ("1080p", "Full HD (1080p)"),
    ("720p", "HD (720p)"),
    ("480p", "SD (480p)"),
    ("360p", "Low (360p)"),
    ("240p", "Very Low (240p)"),
    ("144p", "Very Low (144p)"),
    ("320kbps", "Best (320kbps)"),
    ("256kbps", "High (256kbps)"),
    ("192kbps", "Medium (192kbps)"),
    ("128kbps", "Standard (128kbps)"),
    ("96kbps", "Low (96kbps)"),
    ("64kbps", "Very Low (64kbps)"),
];

/// Label shown for a quality tier
pub fn display_label(quality: &str) -> &str {
    QUALITY_DISPLAY_MAP
        .iter()
        .find(|(key, _)| *key == quality)
        .map(|(_, label)| *label)
        .unwrap_or(quality)
}

/// One entry of the quality selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub size_bytes: Option<u64>,
}

/// Quality selector state: options, selection, enabled/visible flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualitySelector {
    /// Text of the empty-value entry, shown when nothing real is selected
    pub placeholder: Option<String>,
    pub options: Vec<SelectOption>,
    pub selected: Option<String>,
    pub enabled: bool,
    /// Whether the whole selector group is shown
    pub visible: bool,
}

impl Default for QualitySelector {
    fn default() -> Self {
        Self::placeholder("Enter URL to load qualities")
    }
}

/// Outcome of populating the selector for a format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Populated {
    /// Options rendered, largest preselected
    Options,
    /// Format has no qualities; selector disabled
    Empty,
}

impl QualitySelector {
    /// Disabled selector holding only a placeholder entry
    pub fn placeholder(text: &str) -> Self {
        Self {
            placeholder: Some(text.to_string()),
            options: Vec::new(),
            selected: None,
            enabled: false,
            visible: true,
        }
    }

    /// Hidden, disabled selector holding the short-video sentinel
    pub fn short_video() -> Self {
        Self {
            placeholder: None,
            options: vec![SelectOption {
                value: SHORT_QUALITY.to_string(),
                label: SHORT_QUALITY_LABEL.to_string(),
                size_bytes: None,
            }],
            selected: Some(SHORT_QUALITY.to_string()),
            enabled: false,
            visible: false,
        }
    }

    /// Render `qualities` largest-first and preselect the largest
    pub fn populate(&mut self, qualities: &[QualityOption]) -> Populated {
        if qualities.is_empty() {
            *self = Self::placeholder("No qualities available");
            return Populated::Empty;
        }

        let mut sorted = qualities.to_vec();
        // stable: equal sizes keep server order
        sorted.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes));

        self.placeholder = Some("Select quality...".to_string());
        self.options = sorted
            .iter()
            .map(|q| SelectOption {
                value: q.quality.clone(),
                label: display_label(&q.quality).to_string(),
                size_bytes: Some(q.size_bytes),
            })
            .collect();
        self.selected = self.options.first().map(|o| o.value.clone());
        self.enabled = true;
        self.visible = true;
        Populated::Options
    }

    /// Select `value`; empty string clears the selection. Returns false if unknown.
    pub fn select(&mut self, value: &str) -> bool {
        if value.is_empty() {
            self.selected = None;
            return true;
        }
        if self.options.iter().any(|o| o.value == value) {
            self.selected = Some(value.to_string());
            true
        } else {
            false
        }
    }

    pub fn selected_value(&self) -> Option<&str> {
        self.selected.as_deref().filter(|v| !v.is_empty())
    }

    pub fn selected_option(&self) -> Option<&SelectOption> {
        let value = self.selected_value()?;
        self.options.iter().find(|o| o.value == value)
    }

    /// Formatted size of the selection, if it carries one
    pub fn estimated_size(&self) -> Option<String> {
        self.selected_option()
            .and_then(|o| o.size_bytes)
            .map(format_bytes)
    }
}

/// Message shown when a format has nothing to offer
pub fn no_qualities_message(format: FormatType) -> String {
    format!(
        "No {} qualities found for this video. Try the other format or another video.",
        format.as_str().to_uppercase()
    )
}

/// Download is allowed iff a URL is present and either the video is a short
/// or an enabled selector has a non-empty selection.
pub fn download_enabled(url: &str, is_short: bool, selector: &QualitySelector) -> bool {
    !url.trim().is_empty() && (is_short || (selector.enabled && selector.selected_value().is_some()))
}
