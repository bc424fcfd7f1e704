//! Filter values and their persisted string form.

use crate::model::FilterKind;
use crate::selectors::sentinels;

/// State of a tri-state checkbox filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckboxState {
    #[default]
    Unset,
    Unchecked,
    Checked,
}

impl CheckboxState {
    /// The icon key the state is stored and searched as.
    pub fn as_key(self) -> &'static str {
        match self {
            CheckboxState::Unset => "",
            CheckboxState::Unchecked => sentinels::CHECKBOX_UNCHECKED,
            CheckboxState::Checked => sentinels::CHECKBOX_CHECKED,
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim() {
            "" => Some(CheckboxState::Unset),
            sentinels::CHECKBOX_UNCHECKED => Some(CheckboxState::Unchecked),
            sentinels::CHECKBOX_CHECKED => Some(CheckboxState::Checked),
            _ => None,
        }
    }
}

/// The value of one column filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    /// Free text.
    Text(String),
    /// Selected option keys, in selection order.
    Selection(Vec<String>),
    Checkbox(CheckboxState),
}

impl FilterValue {
    /// The unset value for a filter kind.
    pub fn empty_for(kind: FilterKind) -> Self {
        match kind {
            FilterKind::BooleanCheckbox => FilterValue::Checkbox(CheckboxState::Unset),
            k if k.is_multi_select() => FilterValue::Selection(Vec::new()),
            _ => FilterValue::Text(String::new()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FilterValue::Text(text) => text.is_empty(),
            FilterValue::Selection(keys) => keys.is_empty(),
            FilterValue::Checkbox(state) => *state == CheckboxState::Unset,
        }
    }

    /// The single-string form stored in the view state.
    ///
    /// Selections are joined with `", "`; keys containing a comma do not
    /// survive a round trip.
    pub fn serialize(&self) -> String {
        match self {
            FilterValue::Text(text) => text.trim().to_string(),
            FilterValue::Selection(keys) => keys.join(", "),
            FilterValue::Checkbox(state) => state.as_key().to_string(),
        }
    }

    /// Parse a stored value for a filter of `kind`.
    ///
    /// Selections are split at `,` and trimmed. Unknown checkbox keys read as
    /// unset.
    pub fn parse(kind: FilterKind, stored: &str) -> Self {
        match kind {
            FilterKind::BooleanCheckbox => {
                FilterValue::Checkbox(CheckboxState::from_key(stored).unwrap_or_default())
            }
            k if k.is_multi_select() => {
                if stored.trim().is_empty() {
                    FilterValue::Selection(Vec::new())
                } else {
                    FilterValue::Selection(stored.split(',').map(|s| s.trim().to_string()).collect())
                }
            }
            _ => FilterValue::Text(stored.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_joins_selection() {
        let value = FilterValue::Selection(vec!["Berlin".into(), "^$".into()]);
        assert_eq!(value.serialize(), "Berlin, ^$");
        assert_eq!(
            FilterValue::parse(FilterKind::MultiSelect, "Berlin,^$ "),
            value
        );
    }

    #[test]
    fn test_parse_empty_selection() {
        assert!(FilterValue::parse(FilterKind::MultiSelectIcon, "  ").is_empty());
        assert_eq!(
            FilterValue::parse(FilterKind::Text, " abc"),
            FilterValue::Text(" abc".into())
        );
    }

    #[test]
    fn test_checkbox_keys() {
        assert_eq!(
            FilterValue::parse(FilterKind::BooleanCheckbox, "check"),
            FilterValue::Checkbox(CheckboxState::Checked)
        );
        assert_eq!(
            FilterValue::parse(FilterKind::BooleanCheckbox, "bogus"),
            FilterValue::Checkbox(CheckboxState::Unset)
        );
        assert_eq!(
            FilterValue::Checkbox(CheckboxState::Unchecked).serialize(),
            "check_box_outline_blank"
        );
    }

    #[test]
    fn test_empty_for_kind() {
        assert_eq!(
            FilterValue::empty_for(FilterKind::MultiSelectHtmlEscaped),
            FilterValue::Selection(vec![])
        );
        assert!(FilterValue::empty_for(FilterKind::BooleanCheckbox).is_empty());
    }
}
