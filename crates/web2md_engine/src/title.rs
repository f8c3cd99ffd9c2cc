use crate::dom::Dom;

pub const UNTITLED: &str = "Untitled Page";

const MAX_TITLE_CHARS: usize = 150;
const GARBAGE_MARKERS: &[&str] = &["Navigation", "Dropdown", "Search"];
const MIN_HEADING_CHARS: usize = 5;

/// Pick a display title for the document.
///
/// `<title>` is preferred. A title that looks like scraped UI chrome gives way to the
/// first `<h1>` when that heading is long enough. Whatever remains is cut at the first
/// site-name separator.
pub fn extract_title(dom: &Dom) -> String {
    let title = dom
        .first_named("title")
        .map(|id| dom.text_content(id).trim().to_string())
        .unwrap_or_default();
    let heading = dom
        .first_named("h1")
        .map(|id| collapse_whitespace(&dom.text_content(id)))
        .unwrap_or_default();

    if is_garbage(&title) && heading.chars().count() > MIN_HEADING_CHARS {
        return heading;
    }

    let title = first_segment(&title);
    if title.is_empty() {
        UNTITLED.to_string()
    } else {
        title.to_string()
    }
}

fn is_garbage(title: &str) -> bool {
    title.chars().count() > MAX_TITLE_CHARS
        || GARBAGE_MARKERS.iter().any(|marker| title.contains(marker))
}

/// Text before the first `|`, `–`, `—`, or a hyphen with whitespace on both sides.
/// Hyphens inside words ("Node-RED") are not separators.
fn first_segment(title: &str) -> &str {
    let chars: Vec<(usize, char)> = title.char_indices().collect();
    for (pos, &(offset, ch)) in chars.iter().enumerate() {
        let is_separator = match ch {
            '|' | '–' | '—' => true,
            '-' => {
                let before = pos.checked_sub(1).map(|p| chars[p].1);
                let after = chars.get(pos + 1).map(|&(_, c)| c);
                before.is_some_and(char::is_whitespace) && after.is_some_and(char::is_whitespace)
            }
            _ => false,
        };
        if is_separator {
            return title[..offset].trim();
        }
    }
    title.trim()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::{extract_title, first_segment, UNTITLED};
    use crate::dom::Dom;

    fn title_of(html: &str) -> String {
        extract_title(&Dom::parse_document(html))
    }

    #[test]
    fn separators_cut_site_name() {
        assert_eq!(first_segment("Example Domain — Home | Example"), "Example Domain");
        assert_eq!(first_segment("Docs | Site"), "Docs");
        assert_eq!(first_segment("Release notes - Product"), "Release notes");
        assert_eq!(first_segment("Node-RED guide"), "Node-RED guide");
        assert_eq!(first_segment("2020–2021 report"), "2020");
    }

    #[test]
    fn garbage_title_falls_back_to_heading() {
        let html = "<title>Main Navigation Dropdown</title><h1>Real  Article\nHeading</h1>";
        assert_eq!(title_of(html), "Real Article Heading");
    }

    #[test]
    fn garbage_title_with_short_heading_is_split() {
        let html = "<title>Search results | Site</title><h1>Hi</h1>";
        assert_eq!(title_of(html), "Search results");
    }

    #[test]
    fn missing_title_is_untitled() {
        assert_eq!(title_of("<p>no title</p>"), UNTITLED);
        assert_eq!(title_of("<title> | Site</title>"), UNTITLED);
    }
}
