use super::Error;
use scraper::{ElementRef, Selector};

/// First element matching `selector` below `element`, or a parse error naming
/// what was missing.
pub fn select_first<'a>(
    selector: &Selector,
    element: ElementRef<'a>,
    parent_label: &str,
    child_label: &str,
) -> Result<ElementRef<'a>, Error> {
    element.select(selector).next().ok_or_else(|| {
        Error::HtmlParse(format!(
            "Every {parent_label} element should have a {child_label}."
        ))
    })
}

/// Concatenated text of every text node inside the element.
pub fn inner_text(element: ElementRef<'_>, text_label: &str) -> Result<String, Error> {
    let text: String = element.text().collect();
    if text.trim().is_empty() {
        return Err(Error::text_node_parse_error(&format!(
            "{text_label} should have text inside."
        )));
    }
    Ok(text)
}

/// Text of the element split into trimmed, non-empty lines. Each text node
/// starts a new line, so `<br>`-separated items come out one per entry.
pub fn text_lines(element: ElementRef<'_>) -> Vec<&str> {
    element
        .text()
        .flat_map(|node| node.split('\n'))
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}
