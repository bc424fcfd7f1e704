//! Text normalization shared by sorting, searching and filter option building.
//!
//! Cells hold rendered HTML fragments. Everything that compares or searches
//! cell content goes through these helpers so that markup never leaks into a
//! comparison.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<.+?>").expect("static regex"));

static HTML_TAG_WITH_CONTENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]+?>.*?<[^>]+?>").expect("static regex"));

static ICON_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<i [^>]+>.*?</i>").expect("static regex"));

static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r\n|\n|\r").expect("static regex"));

static FLOAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[+-]?((\d+(\.\d*)?)|\.\d+)([eE][+-]?[0-9]+)?").expect("static regex")
});

static TOOLTIP_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"data-tooltip\s*=\s*"([^"]*)""#).expect("static regex"));

/// Remove HTML tags, keeping their text content.
pub fn strip_tags(value: &str) -> String {
    decode_entities(&HTML_TAG.replace_all(value, ""))
}

/// Remove HTML elements together with their content.
pub fn strip_tags_with_content(value: &str) -> String {
    HTML_TAG_WITH_CONTENT.replace_all(value, "").into_owned()
}

/// Replace every HTML tag with `separator`.
pub fn replace_tags(value: &str, separator: &str) -> String {
    decode_entities(&HTML_TAG.replace_all(value, separator))
}

/// Remove `<i …>…</i>` icon elements.
pub fn strip_icon_tags(value: &str) -> String {
    ICON_TAG.replace_all(value, "").into_owned()
}

/// Remove line breaks.
pub fn strip_line_breaks(value: &str) -> String {
    LINE_BREAK.replace_all(value, "").into_owned()
}

/// Split a fragment at every HTML tag.
pub fn split_at_tags(value: &str) -> Vec<String> {
    HTML_TAG
        .split(value)
        .map(decode_entities)
        .collect()
}

/// Extract the `data-tooltip` attribute of the first element that has one.
pub fn tooltip_of(value: &str) -> Option<String> {
    TOOLTIP_ATTR
        .captures(value)
        .and_then(|caps| caps.get(1))
        .map(|m| decode_entities(m.as_str()))
}

/// Decode the handful of entities that server-rendered cells use.
pub fn decode_entities(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }
    value
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Lowercase and fold German special characters for ordering.
///
/// `ä→ae`, `ö→oe`, `ü→ue`, `ß→sz`.
pub fn fold_umlauts(value: &str) -> String {
    let lower = value.to_lowercase();
    let mut folded = String::with_capacity(lower.len() + 4);
    for ch in lower.chars() {
        match ch {
            'ä' => folded.push_str("ae"),
            'ö' => folded.push_str("oe"),
            'ü' => folded.push_str("ue"),
            'ß' => folded.push_str("sz"),
            other => folded.push(other),
        }
    }
    folded
}

/// Parse the first number in a German-formatted cell.
///
/// Tags are stripped, thousands separators (`.`) removed and the first `,`
/// read as the decimal point. Cells without a number sort as `-inf`.
pub fn parse_any_number(value: &str) -> f64 {
    let prepared = strip_tags(value).to_lowercase().replace('.', "").replacen(',', ".", 1);
    FLOAT
        .find(&prepared)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(f64::NEG_INFINITY)
}

/// Reduce a formatted amount (`1.234,50 €`) to its value, `0.0` if empty.
pub fn pure_decimal(value: &str) -> f64 {
    let prepared = value
        .replace('.', "")
        .replace('€', "")
        .replace("&nbsp;", "")
        .replace(',', ".");
    let digits: String = prepared
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if digits.is_empty() {
        0.0
    } else {
        digits.parse().unwrap_or(0.0)
    }
}

/// Compare two numbers, treating incomparable values as equal.
pub fn compare_numbers(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Compare two cells with the any-number parse.
pub fn compare_any_number(a: &str, b: &str) -> Ordering {
    compare_numbers(parse_any_number(a), parse_any_number(b))
}

fn as_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

#[derive(Debug, Clone, PartialEq, PartialOrd)]
enum CellKey {
    Empty,
    Number(f64),
    Text(String),
}

impl CellKey {
    fn of(value: &str) -> Self {
        let folded = fold_umlauts(&strip_tags(value));
        if folded.is_empty() {
            CellKey::Empty
        } else if let Some(number) = as_number(&folded) {
            CellKey::Number(number)
        } else {
            CellKey::Text(folded)
        }
    }
}

/// Compare two cells as text, numerically when both are non-empty numbers.
///
/// Both sides are tag-stripped and folded with [`fold_umlauts`]. Empty cells
/// sort first, then numbers, then text, so mixed columns still get a total
/// order.
pub fn compare_cell_values(a: &str, b: &str) -> Ordering {
    match (CellKey::of(a), CellKey::of(b)) {
        (CellKey::Number(x), CellKey::Number(y)) => x.total_cmp(&y),
        (CellKey::Text(x), CellKey::Text(y)) => x.cmp(&y),
        (x, y) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
    }
}

/// Case-insensitive "smart" match: every whitespace-separated word (or
/// double-quoted phrase) of `needle` must occur somewhere in `haystack`.
pub fn smart_match(haystack: &str, needle: &str) -> bool {
    let haystack = haystack.to_lowercase();
    smart_terms(needle)
        .iter()
        .all(|term| haystack.contains(&term.to_lowercase()))
}

fn smart_terms(needle: &str) -> Vec<String> {
    let mut terms = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for ch in needle.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                if !quoted && !current.is_empty() {
                    terms.push(std::mem::take(&mut current));
                }
            }
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    terms.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        terms.push(current);
    }
    terms
}

/// Format a number with German separators: `1234.5` → `1.234,50`.
pub fn format_german(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (formatted.clone(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let mut out = String::new();
    if value < 0.0 && value.abs() >= 0.5 * 10f64.powi(-(decimals as i32)) {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push(',');
        out.push_str(&frac);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<b>Hello</b> <i class=\"x\">World</i>"), "Hello World");
        assert_eq!(strip_tags("Fish &amp; Chips"), "Fish & Chips");
        assert_eq!(strip_tags(""), "");
    }

    #[test]
    fn test_replace_and_split_tags() {
        assert_eq!(replace_tags("<p>a</p><p>b</p>", "|"), "|a||b|");
        let parts: Vec<_> = split_at_tags("<p>a</p><p>b</p>")
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect();
        assert_eq!(parts, vec!["a", "b"]);
    }

    #[test]
    fn test_icon_and_tooltip() {
        let cell = r#"<i class="material-icons" data-tooltip="Erledigt">check</i> done"#;
        assert_eq!(strip_icon_tags(cell), " done");
        assert_eq!(tooltip_of(cell).as_deref(), Some("Erledigt"));
        assert_eq!(tooltip_of("plain"), None);
    }

    #[test]
    fn test_fold_umlauts() {
        assert_eq!(fold_umlauts("Übel"), "uebel");
        assert_eq!(fold_umlauts("Straße"), "strasze");
        assert_eq!(fold_umlauts("Öl"), "oel");
    }

    #[test]
    fn test_german_order() {
        let mut words = vec!["Übel", "Apfel", "öl"];
        words.sort_by(|a, b| compare_cell_values(a, b));
        assert_eq!(words, vec!["Apfel", "öl", "Übel"]);
    }

    #[test]
    fn test_parse_any_number() {
        assert_eq!(parse_any_number("1.234,5"), 1234.5);
        assert_eq!(parse_any_number("<span>-12</span>"), -12.0);
        assert_eq!(parse_any_number("ca. 3 Stück"), 3.0);
        assert_eq!(parse_any_number("n/a"), f64::NEG_INFINITY);
    }

    #[test]
    fn test_compare_cell_values_numeric() {
        assert_eq!(compare_cell_values("9", "10"), Ordering::Less);
        assert_eq!(compare_cell_values("b", "a"), Ordering::Greater);
        assert_eq!(compare_cell_values("", "1"), Ordering::Less);
        assert_eq!(compare_cell_values("A", "a"), Ordering::Equal);
    }

    #[test]
    fn test_compare_cell_values_mixed_column_is_transitive() {
        // "9" < "10" numerically; text cells must not slip between them.
        assert_eq!(compare_cell_values("10", "1a"), Ordering::Less);
        assert_eq!(compare_cell_values("9", "1a"), Ordering::Less);
        assert_eq!(compare_cell_values("x", "100"), Ordering::Greater);
        assert_eq!(compare_cell_values("", "1a"), Ordering::Less);

        let mut values = vec!["10", "9", "1a", "2b", "", "100", "3", "x", "20", "5c", "7"];
        values.sort_by(|a, b| compare_cell_values(a, b));
        assert_eq!(values, vec!["", "3", "7", "9", "10", "20", "100", "1a", "2b", "5c", "x"]);

        for a in &values {
            for b in &values {
                for c in &values {
                    if compare_cell_values(a, b).is_le() && compare_cell_values(b, c).is_le() {
                        assert!(compare_cell_values(a, c).is_le(), "{a} <= {b} <= {c}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_pure_decimal() {
        assert_eq!(pure_decimal("1.234,50 €"), 1234.5);
        assert_eq!(pure_decimal(""), 0.0);
        assert_eq!(pure_decimal("-7"), -7.0);
    }

    #[test]
    fn test_smart_match() {
        assert!(smart_match("Berlin Mitte", "mitte"));
        assert!(smart_match("Berlin Mitte", "mitte berl"));
        assert!(!smart_match("Berlin Mitte", "\"berlin m\" x"));
        assert!(smart_match("Berlin Mitte", "\"berlin m\""));
        assert!(smart_match("anything", "   "));
    }

    #[test]
    fn test_format_german() {
        assert_eq!(format_german(1234.5, 2), "1.234,50");
        assert_eq!(format_german(0.0, 2), "0,00");
        assert_eq!(format_german(-1234567.891, 2), "-1.234.567,89");
        assert_eq!(format_german(999.0, 0), "999");
    }
}
