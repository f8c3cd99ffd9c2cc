use std::sync::LazyLock;

use ego_tree::iter::Edge;
use regex::Regex;

use web2md_core::ScrapeOptions;

use crate::dom::Dom;
use crate::error::ConversionError;

/// htmd walks the tree recursively; deeper documents are refused up front.
const MAX_DEPTH: usize = 512;

const SKIPPED: &[&str] = &[
    "head", "title", "script", "style", "noscript", "template", "iframe", "svg", "canvas",
];

static TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>?").expect("valid regex"));
static BLANK_LINE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// HTML to Markdown with ATX headings, fenced code and inline links. Text that would
/// read as Markdown syntax is escaped.
///
/// Images are dropped when `include_images` is off. With `include_links` off anchors
/// become plain text. Anchors without a target or without text are dropped.
pub fn html_to_markdown(html: &str, options: &ScrapeOptions) -> Result<String, ConversionError> {
    let mut dom = Dom::parse_document(html);
    check_depth(&dom)?;
    prepare(&mut dom, options);

    let body = match dom.first_named("body") {
        Some(body) => dom.inner_html(body),
        None => dom.inner_html(dom.root().id()),
    };
    let converter = htmd::HtmlToMarkdown::builder()
        .options(htmd::options::Options {
            heading_style: htmd::options::HeadingStyle::Atx,
            code_block_style: htmd::options::CodeBlockStyle::Fenced,
            link_style: htmd::options::LinkStyle::Inlined,
            ..Default::default()
        })
        .build();
    let markdown = converter
        .convert(&body)
        .map_err(|err| ConversionError::Local(err.to_string()))?;

    Ok(BLANK_LINE_RUNS
        .replace_all(&markdown, "\n\n")
        .trim()
        .to_string())
}

/// Last resort when conversion fails: drop anything tag-shaped and keep the text.
pub fn strip_tags(html: &str) -> String {
    TAGS.replace_all(html, "").trim().to_string()
}

fn check_depth(dom: &Dom) -> Result<(), ConversionError> {
    let mut depth = 0usize;
    for edge in dom.root().traverse() {
        match edge {
            Edge::Open(_) => {
                depth += 1;
                if depth > MAX_DEPTH {
                    return Err(ConversionError::TooDeep { limit: MAX_DEPTH });
                }
            }
            Edge::Close(_) => depth = depth.saturating_sub(1),
        }
    }
    Ok(())
}

fn prepare(dom: &mut Dom, options: &ScrapeOptions) {
    for id in dom.elements() {
        if !dom.is_attached(id) {
            continue;
        }
        match dom.tag(id) {
            Some(tag) if SKIPPED.contains(&tag) => dom.remove(id),
            Some("img") if !options.include_images => dom.remove(id),
            Some("a") if !options.include_links => dom.unwrap(id),
            Some("a") => {
                let has_href = dom
                    .element(id)
                    .and_then(|el| el.attr("href"))
                    .is_some_and(|href| !href.trim().is_empty());
                let has_text = !dom.text_content(id).trim().is_empty()
                    || !dom.descendants_named(id, "img").is_empty();
                if !has_href || !has_text {
                    dom.remove(id);
                }
            }
            _ => {}
        }
    }
}
