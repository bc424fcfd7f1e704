//! Search expressions produced by filter controls.

use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};
use crate::model::ColumnSearch;
use crate::selectors::sentinels;

/// Keys that match blank cells and are passed through unescaped.
fn is_empty_key(key: &str) -> bool {
    key.is_empty() || key == sentinels::EMPTY_OPTION
}

/// Whole-value match of any of `keys`: `^k1$|^k2$`.
pub fn multi_select(keys: &[String]) -> Option<ColumnSearch> {
    if keys.is_empty() {
        return None;
    }
    let parts: Vec<String> = keys
        .iter()
        .map(|key| {
            if is_empty_key(key) {
                String::new()
            } else {
                regex::escape(key)
            }
        })
        .collect();
    Some(ColumnSearch::regex(format!("^{}$", parts.join("$|^"))))
}

/// Fragment match of any of `keys` against tag-stripped text.
pub fn html_escaped(keys: &[String]) -> Option<ColumnSearch> {
    if keys.is_empty() {
        return None;
    }
    let parts: Vec<String> = keys
        .iter()
        .map(|key| {
            if is_empty_key(key) {
                sentinels::EMPTY_OPTION.to_string()
            } else {
                format!("({})", regex::escape(key))
            }
        })
        .collect();
    Some(ColumnSearch::regex(parts.join("|")))
}

/// The value an icon option submits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconEnvelope {
    pub search_value: String,
    pub display_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
}

impl IconEnvelope {
    /// Envelope matching cells whose text is exactly `text`, surrounding
    /// whitespace allowed.
    pub fn for_icon(text: &str, tooltip: Option<String>) -> Self {
        Self {
            search_value: format!(r"^\s*{}\s*$", regex::escape(text)),
            display_text: text.to_string(),
            tooltip,
        }
    }

    /// Envelope matching blank cells.
    pub fn empty(tooltip: Option<String>) -> Self {
        Self {
            search_value: sentinels::EMPTY_OPTION.to_string(),
            display_text: sentinels::EMPTY_ICON.to_string(),
            tooltip,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(GridError::Options)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(GridError::Options)
    }
}

/// Alternation of the envelopes' search values.
pub fn icon(envelopes: &[IconEnvelope]) -> Option<ColumnSearch> {
    let values: Vec<&str> = envelopes
        .iter()
        .map(|e| e.search_value.as_str())
        .filter(|v| !v.is_empty())
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(ColumnSearch::regex(values.join("|")))
    }
}

/// Whole-value match of a checkbox key; unset clears the search.
pub fn checkbox(key: &str) -> Option<ColumnSearch> {
    if key.is_empty() {
        None
    } else {
        Some(ColumnSearch::regex(format!("^{key}$")))
    }
}

/// Smart text search; blank clears the search.
pub fn text(input: &str) -> Option<ColumnSearch> {
    if input.is_empty() {
        None
    } else {
        Some(ColumnSearch::text(input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_multi_select_anchors_and_escapes() {
        let search = multi_select(&keys(&["a.b", "c"])).unwrap();
        assert_eq!(search.pattern, r"^a\.b$|^c$");
        assert!(search.regex);
        assert_eq!(multi_select(&keys(&["^$"])).unwrap().pattern, "^$");
        assert_eq!(multi_select(&keys(&["x", ""])).unwrap().pattern, "^x$|^$");
        assert!(multi_select(&[]).is_none());
    }

    #[test]
    fn test_html_escaped_is_unanchored() {
        assert_eq!(
            html_escaped(&keys(&["C++", "^$"])).unwrap().pattern,
            r"(C\+\+)|^$"
        );
    }

    #[test]
    fn test_icon_envelopes() {
        let envelope = IconEnvelope::for_icon("check", Some("Done".into()));
        assert_eq!(envelope.search_value, r"^\s*check\s*$");
        let json = envelope.to_json().unwrap();
        assert!(json.contains("\"searchValue\""));
        assert!(json.contains("\"displayText\":\"check\""));
        assert_eq!(IconEnvelope::from_json(&json).unwrap(), envelope);

        let search = icon(&[envelope, IconEnvelope::empty(None)]).unwrap();
        assert_eq!(search.pattern, r"^\s*check\s*$|^$");
        assert!(IconEnvelope::from_json("not json").is_err());
    }

    #[test]
    fn test_checkbox_and_text() {
        assert_eq!(checkbox("check").unwrap().pattern, "^check$");
        assert!(checkbox("").is_none());
        assert!(!text("abc").unwrap().regex);
        assert!(text("").is_none());
    }
}
