use crate::models::Theme;
use once_cell::sync::Lazy;
use regex::Regex;

static HEX_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").expect("valid regex")
});

static FUNCTIONAL_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i)(rgb|rgba|hsl|hsla)\(\s*[-0-9.%]+\s*(,\s*[-0-9.%]+\s*){2,3}\)$").expect("valid regex")
});

static NAMED_COLORS: &[&str] = &[
    "transparent", "black", "white", "gray", "grey", "silver", "red", "maroon", "orange", "yellow",
    "olive", "lime", "green", "teal", "aqua", "cyan", "blue", "navy", "fuchsia", "magenta", "purple",
    "pink", "brown", "indigo", "violet", "gold", "coral", "salmon", "crimson", "turquoise",
];

pub fn is_valid_color(raw: &str) -> bool {
    let value = raw.trim();
    if value.is_empty() {
        return false;
    }
    HEX_COLOR.is_match(value)
        || FUNCTIONAL_COLOR.is_match(value)
        || NAMED_COLORS
            .iter()
            .any(|name| name.eq_ignore_ascii_case(value))
}

/// One message per field that is not a usable CSS color.
pub fn validate_theme(theme: &Theme) -> Vec<String> {
    [
        ("primaryColor", &theme.primary_color),
        ("backgroundColor", &theme.background_color),
        ("textColor", &theme.text_color),
    ]
    .into_iter()
    .filter(|(_, value)| !is_valid_color(value))
    .map(|(field, value)| format!("{}: '{}' is not a valid color", field, value))
    .collect()
}
