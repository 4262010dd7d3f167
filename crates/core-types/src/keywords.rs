//! Vocabulary tables used to recognise vendor UI elements.
//!
//! Vendor apps change copy between releases and locales, so the lists live in
//! one versioned table instead of inline literals. User configuration can
//! extend any list through [`KeywordTables::extended_with`].

use serde::{Deserialize, Serialize};

/// Version of the built-in tables. Bump whenever a default list changes.
pub const BUILTIN_KEYWORDS_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordTables {
    pub version: u32,
    /// Placeholder fragments meaning "destination" (lowercase).
    pub hint_keywords: Vec<String>,
    /// Reduced set matched against a field's current text (lowercase).
    pub text_keywords: Vec<String>,
    /// Class-name fragments that mark an edit field.
    pub edit_class_markers: Vec<String>,
    /// Exact button labels that dismiss interstitial screens, in priority order.
    pub interstitial_labels: Vec<String>,
    /// Button labels that submit the destination search, in priority order.
    pub trigger_labels: Vec<String>,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for KeywordTables {
    fn default() -> Self {
        Self {
            version: BUILTIN_KEYWORDS_VERSION,
            hint_keywords: owned(&[
                "where to",
                "destination",
                "drop off",
                "going to",
                "to",
                "enter destination",
                "search destination",
                "drop location",
                "where do you want to go",
                "choose destination",
            ]),
            text_keywords: owned(&["where to", "destination", "search", "to", "drop off"]),
            edit_class_markers: owned(&["EditText", "TextInputEditText"]),
            interstitial_labels: owned(&[
                "Skip",
                "Maybe Later",
                "Not Now",
                "Continue",
                "Allow",
                "Continue as Guest",
                "Book Now",
                "Get Started",
                "Grant",
                "OK",
            ]),
            trigger_labels: owned(&[
                "Search",
                "Find rides",
                "Book",
                "Continue",
                "Go",
                "Submit",
                "Next",
                "Done",
            ]),
        }
    }
}

impl KeywordTables {
    /// Appends entries from `extra` that are not already present. Ordering of
    /// the built-in entries is preserved so priority lists keep their meaning.
    pub fn extended_with(mut self, extra: &KeywordTables) -> Self {
        extend_unique(&mut self.hint_keywords, &extra.hint_keywords, true);
        extend_unique(&mut self.text_keywords, &extra.text_keywords, true);
        extend_unique(&mut self.edit_class_markers, &extra.edit_class_markers, false);
        extend_unique(&mut self.interstitial_labels, &extra.interstitial_labels, false);
        extend_unique(&mut self.trigger_labels, &extra.trigger_labels, false);
        self.version = self.version.max(extra.version);
        self
    }

    pub fn hint_matches(&self, hint: &str) -> bool {
        contains_any(hint, &self.hint_keywords)
    }

    pub fn text_matches(&self, text: &str) -> bool {
        contains_any(text, &self.text_keywords)
    }

    pub fn is_edit_class(&self, class_name: &str) -> bool {
        self.edit_class_markers
            .iter()
            .any(|marker| class_name.contains(marker.as_str()))
    }
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    if haystack.is_empty() {
        return false;
    }
    let lower = haystack.to_lowercase();
    needles.iter().any(|n| lower.contains(n.as_str()))
}

fn extend_unique(target: &mut Vec<String>, extra: &[String], lowercase: bool) {
    for item in extra {
        let item = if lowercase {
            item.to_lowercase()
        } else {
            item.clone()
        };
        if !item.is_empty() && !target.contains(&item) {
            target.push(item);
        }
    }
}
