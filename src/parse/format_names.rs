use std::{borrow::Cow, sync::OnceLock};

use regex::{Captures, Regex};

/// Trims and turns every whitespace run (newlines and tabs included) into one space.
pub fn collapse_whitespace(s: &str) -> Cow<'_, str> {
    static RUNS: OnceLock<Regex> = OnceLock::new();
    let runs = RUNS.get_or_init(|| Regex::new(r"\s{2,}|[\t\r\n]").expect("regex should be valid"));
    runs.replace_all(s.trim(), " ")
}

/// Sentence-cases a dish name from the menu page, keeping restaurant
/// abbreviations (RA, RS, RU, HC) upper case.
pub fn format_names(text: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE
        .get_or_init(|| Regex::new(r"(?i)\b(?:ra|rs|ru|hc)\b").expect("regex should be valid"));

    let text = collapse_whitespace(text);
    let mut chars = text.chars();
    let capitalized: String = match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    };

    re.replace_all(&capitalized, |caps: &Captures| caps[0].to_uppercase())
        .into_owned()
}
