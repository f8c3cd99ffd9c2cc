//! Heuristic cleaning of scraped pages into compact, attribute-free article HTML.
//!
//! The cleaner is a fixed list of passes over an owned [`Dom`]. Each pass takes the
//! tree and returns it, so passes can be run and tested one at a time. Order matters:
//! noise deletion runs before the density and symbol filters, those run before
//! wrappers are unwrapped, and anchors are only flattened in the final element pass.
use std::collections::HashSet;
use std::sync::LazyLock;

use ego_tree::{NodeId, NodeRef};
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use engine_logging::{engine_debug, engine_trace, engine_warn};
use web2md_core::ScrapeOptions;

use crate::dom::{escape_text, Dom, DomNode, ElementData};
use crate::pretty::pretty_print;
use crate::title::extract_title;
use crate::CleanedDocument;

/// Everything matching one of these selectors is deleted with its subtree.
const NOISE_SELECTORS: &[&str] = &[
    "script, style, link, meta, noscript, template, head",
    "button, input, select, textarea, option, optgroup, dialog",
    "svg, canvas, map, iframe, embed, object, video, audio, frame, frameset",
    "nav, footer, aside",
    "[role='img']:not(img)",
    ".nav, .navbar, .footer, .meta, .metadata, .post-meta, .entry-meta, .properties-table",
    ".notion-collection-header, .notion-property-list, .notion-topbar, .notion-sidebar-container",
    "[class*='ad-'], [class*='ads-'], [class*='share'], [class*='social'], [class*='subscribe']",
    "[class*='cookie'], [class*='popup'], [class*='modal'], [class*='comment'], [class*='sidebar']",
    "[id*='ad-']",
];

static NOISE: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    NOISE_SELECTORS
        .iter()
        .filter_map(|selector| Selector::parse(selector).ok())
        .collect()
});

const GUTTER_CLASS_FRAGMENTS: &[&str] = &["line-numbers", "lineno", "gutter"];
const GUTTER_CANDIDATES: &[&str] = &["code", "span", "div", "td"];

const DENSITY_BLOCKS: &[&str] = &["p", "div", "li", "ul", "ol"];
const DENSITY_MIN_CHARS: usize = 5;
const DENSITY_MAX_CHARS: usize = 500;
const MAX_LINK_DENSITY: f64 = 0.6;

const SYMBOL_BLOCKS: &[&str] = &["p", "div", "span"];
const SYMBOL_MAX_CHARS: usize = 20;

const BLOCK_WRAPPERS: &[&str] = &[
    "div", "section", "article", "main", "header", "fieldset", "form", "hgroup", "figure",
    "figcaption",
];
/// Parents in which an unwrapped block only gets a trailing space.
const INLINE_CONTEXTS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6", "a", "li", "button"];
const INLINE_WRAPPERS: &[&str] = &[
    "span", "font", "center", "big", "small", "u", "ins", "slot", "label", "legend", "picture",
];

const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

static BLANK_LINE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n\s*\n").expect("valid regex"));
static WHITESPACE_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s+$").expect("valid regex"));
static EMPTY_PARAGRAPHS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<p>\s*</p>").expect("valid regex"));

/// Per-run inputs shared by every pass.
#[derive(Debug, Clone)]
pub struct CleanContext {
    base_url: Option<Url>,
    include_images: bool,
    include_links: bool,
}

impl CleanContext {
    pub fn new(base_url: Option<&str>, options: &ScrapeOptions) -> Self {
        Self {
            base_url: base_url.and_then(|base| Url::parse(base).ok()),
            include_images: options.include_images,
            include_links: options.include_links,
        }
    }

    /// Absolute form of `reference`, or `None` when there is no base or it does not join.
    fn resolve(&self, reference: &str) -> Option<String> {
        self.base_url
            .as_ref()
            .and_then(|base| base.join(reference.trim()).ok())
            .map(String::from)
    }
}

pub type Pass = fn(Dom, &CleanContext) -> Dom;

pub const PASSES: &[(&str, Pass)] = &[
    ("remove noise", remove_noise),
    ("strip code gutters", strip_code_gutters),
    ("drop link-dense blocks", drop_link_dense_blocks),
    ("drop symbol noise", drop_symbol_noise),
    ("unwrap wrappers", unwrap_wrappers),
    ("process elements", process_elements),
    ("trim headings", trim_headings),
];

/// Clean a raw page. Never fails: unparseable input yields a near-empty body, and a
/// formatter failure returns the unformatted document.
pub fn clean_html(raw_html: &str, base_url: Option<&str>, options: &ScrapeOptions) -> CleanedDocument {
    let dom = Dom::parse_document(raw_html);
    let title = extract_title(&dom);
    let ctx = CleanContext::new(base_url, options);

    let dom = PASSES.iter().fold(dom, |dom, (name, pass)| {
        engine_trace!("Clean pass: {name}");
        pass(dom, &ctx)
    });

    let body = match dom.first_named("body") {
        Some(body) => dom.inner_html(body),
        None => dom.inner_html(dom.root().id()),
    };
    let shell = wrap_document(&title, &polish(&body));

    let html = match pretty_print(&shell) {
        Ok(pretty) => pretty,
        Err(err) => {
            engine_warn!("Formatting cleaned HTML failed, returning it unformatted: {err}");
            shell
        }
    };
    engine_debug!("Cleaned HTML: title={title} chars={}", html.chars().count());

    CleanedDocument { title, html }
}

fn wrap_document(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}\n</body>\n</html>",
        escape_text(title),
        body.trim()
    )
}

fn polish(body: &str) -> String {
    let body = BLANK_LINE_RUNS.replace_all(body, "\n\n");
    let body = WHITESPACE_LINES.replace_all(&body, "");
    EMPTY_PARAGRAPHS.replace_all(&body, "").into_owned()
}

pub(crate) fn remove_noise(dom: Dom, _ctx: &CleanContext) -> Dom {
    let parsed = Html::parse_document(&dom.inner_html(dom.root().id()));
    let noise: HashSet<_> = NOISE
        .iter()
        .flat_map(|selector| parsed.select(selector).map(|element| element.id()))
        .collect();
    engine_trace!("Noise elements: {}", noise.len());
    Dom::from_html(&parsed, |id| noise.contains(&id))
}

fn is_gutter_class(element: &ElementData) -> bool {
    element.has_class("ln")
        || element
            .attr("class")
            .is_some_and(|class| GUTTER_CLASS_FRAGMENTS.iter().any(|f| class.contains(f)))
}

/// Digits and whitespace only, with at least one digit.
fn is_numeric(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
        && text.chars().all(|c| c.is_ascii_digit() || c.is_whitespace())
}

pub(crate) fn strip_code_gutters(mut dom: Dom, _ctx: &CleanContext) -> Dom {
    for block in dom.elements_named(&["pre", "code"]) {
        if !dom.is_attached(block) {
            continue;
        }

        for id in descendant_elements(&dom, block) {
            if dom.is_attached(id) && dom.element(id).is_some_and(is_gutter_class) {
                dom.remove(id);
            }
        }

        for id in descendant_elements(&dom, block) {
            let is_candidate = dom
                .tag(id)
                .is_some_and(|tag| GUTTER_CANDIDATES.contains(&tag));
            if !is_candidate || !dom.is_attached(id) {
                continue;
            }
            let text = dom.text_content(id);
            if !is_numeric(&text) {
                continue;
            }
            let lines = text.lines().filter(|line| !line.trim().is_empty()).count();
            let first_child = dom
                .node(block)
                .and_then(|node| node.first_child())
                .map(|node| node.id());
            if lines > 1 || (first_child == Some(id) && text.trim().chars().count() < 4) {
                dom.remove(id);
            }
        }

        strip_leading_number_column(&mut dom, block);
    }
    dom
}

/// A block whose text starts with two or more lines holding only a number has a
/// flattened gutter; drop those lines and keep the code after them.
fn strip_leading_number_column(dom: &mut Dom, block: NodeId) {
    let Some((text_id, text)) = dom.node(block).and_then(|node| {
        let first = node.first_child()?;
        match first.value() {
            DomNode::Text(text) => Some((first.id(), text.clone())),
            _ => None,
        }
    }) else {
        return;
    };

    let mut offset = 0;
    let mut numbered = 0;
    for line in text.split_inclusive('\n') {
        if !line.ends_with('\n') || !is_numeric(line) {
            break;
        }
        offset += line.len();
        numbered += 1;
    }
    let rest = &text[offset..];
    if numbered >= 2 && !rest.trim().is_empty() {
        dom.set_text(text_id, rest.to_string());
    }
}

fn descendant_elements(dom: &Dom, id: NodeId) -> Vec<NodeId> {
    dom.node(id)
        .map(|node| {
            node.descendants()
                .skip(1)
                .filter(|node| matches!(node.value(), DomNode::Element(_)))
                .map(|node| node.id())
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn drop_link_dense_blocks(mut dom: Dom, _ctx: &CleanContext) -> Dom {
    for id in dom.elements_named(DENSITY_BLOCKS) {
        if !dom.is_attached(id) {
            continue;
        }
        let text_len = dom.text_content(id).trim().chars().count();
        if text_len <= DENSITY_MIN_CHARS || text_len > DENSITY_MAX_CHARS {
            continue;
        }
        let link_len: usize = dom
            .descendants_named(id, "a")
            .into_iter()
            .map(|anchor| dom.text_content(anchor).chars().count())
            .sum();
        if link_len as f64 / text_len as f64 > MAX_LINK_DENSITY {
            dom.remove(id);
        }
    }
    dom
}

pub(crate) fn drop_symbol_noise(mut dom: Dom, _ctx: &CleanContext) -> Dom {
    for id in dom.elements_named(SYMBOL_BLOCKS) {
        if !dom.is_attached(id) || !dom.descendants_named(id, "img").is_empty() {
            continue;
        }
        let text = dom.text_content(id);
        let text = text.trim();
        let decorative = text.chars().count() < SYMBOL_MAX_CHARS
            && text.chars().all(|c| !c.is_alphanumeric());
        if text.is_empty() || decorative {
            dom.remove(id);
        }
    }
    dom
}

pub(crate) fn unwrap_wrappers(mut dom: Dom, _ctx: &CleanContext) -> Dom {
    for id in dom.elements_named(BLOCK_WRAPPERS) {
        if !dom.is_attached(id) {
            continue;
        }
        let inline_parent = dom
            .parent_tag(id)
            .is_some_and(|tag| INLINE_CONTEXTS.contains(&tag));
        if inline_parent {
            dom.insert_text_after(id, " ");
        } else {
            dom.insert_text_before(id, "\n");
            dom.insert_text_after(id, "\n");
        }
        dom.unwrap(id);
    }

    for id in dom.elements_named(INLINE_WRAPPERS) {
        if dom.is_attached(id) {
            dom.unwrap(id);
        }
    }
    dom
}

pub(crate) fn process_elements(mut dom: Dom, ctx: &CleanContext) -> Dom {
    for id in dom.elements() {
        if !dom.is_attached(id) {
            continue;
        }
        let kept = match dom.tag(id) {
            Some("a") => process_anchor(&mut dom, id, ctx),
            Some("img") => process_image(&mut dom, id, ctx),
            _ => true,
        };
        if kept {
            dom.retain_attrs(id, is_allowed_attr);
        }
    }
    dom
}

fn is_allowed_attr(tag: &str, attr: &str) -> bool {
    match attr {
        "colspan" | "rowspan" => true,
        "href" | "title" if tag == "a" => true,
        "src" | "alt" | "title" if tag == "img" => true,
        "id" => HEADINGS.contains(&tag),
        _ => false,
    }
}

/// Returns whether the anchor element is still in the tree.
fn process_anchor(dom: &mut Dom, id: NodeId, ctx: &CleanContext) -> bool {
    if !ctx.include_links {
        dom.unwrap(id);
        return false;
    }

    let has_text = !dom.text_content(id).trim().is_empty();
    let images = dom.descendants_named(id, "img");
    if !has_text && images.is_empty() {
        dom.remove(id);
        return false;
    }

    let href = dom
        .element(id)
        .and_then(|element| element.attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string);
    let Some(href) = href else {
        dom.unwrap(id);
        return false;
    };

    if let [image] = images.as_slice() {
        let src = dom.element(*image).and_then(image_source);
        if !has_text && src.is_some_and(|src| links_to_image(&href, &src, ctx)) {
            dom.unwrap(id);
            return false;
        }
    }

    if let Some(resolved) = ctx.resolve(&href) {
        dom.set_attr(id, "href", resolved);
    }
    true
}

/// An image wrapped in a link to itself (or to a size variant of itself).
fn links_to_image(href: &str, src: &str, ctx: &CleanContext) -> bool {
    let related = |a: &str, b: &str| a == b || a.contains(b) || b.contains(a);
    if related(href, src) {
        return true;
    }
    match (ctx.resolve(href), ctx.resolve(src)) {
        (Some(href), Some(src)) => related(&href, &src),
        _ => false,
    }
}

/// Returns whether the image element is still in the tree.
fn process_image(dom: &mut Dom, id: NodeId, ctx: &CleanContext) -> bool {
    if !ctx.include_images {
        dom.remove(id);
        return false;
    }
    let Some(src) = dom.element(id).and_then(image_source) else {
        dom.remove(id);
        return false;
    };
    let src = ctx.resolve(&src).unwrap_or(src);
    dom.set_attr(id, "src", src);
    true
}

/// Lazy-load attribute first, then `src`, then the first `srcset` candidate.
fn image_source(element: &ElementData) -> Option<String> {
    ["data-src", "src", "srcset"].iter().find_map(|attr| {
        let value = element.attr(attr)?;
        let candidate = value.split(',').next()?.split_whitespace().next()?;
        Some(candidate.to_string())
    })
}

pub(crate) fn trim_headings(mut dom: Dom, _ctx: &CleanContext) -> Dom {
    for id in dom.elements_named(HEADINGS) {
        let edges = dom
            .node(id)
            .map(|node| (text_child(node.first_child()), text_child(node.last_child())));
        let Some((first, last)) = edges else {
            continue;
        };
        if let Some((text_id, text)) = first {
            dom.set_text(text_id, text.trim_start().to_string());
        }
        if let Some((text_id, _)) = last {
            // Re-read: first and last may be the same node.
            let current = dom.node(text_id).and_then(|node| match node.value() {
                DomNode::Text(text) => Some(text.trim_end().to_string()),
                _ => None,
            });
            if let Some(text) = current {
                dom.set_text(text_id, text);
            }
        }
    }
    dom
}

fn text_child(node: Option<NodeRef<'_, DomNode>>) -> Option<(NodeId, String)> {
    let node = node?;
    match node.value() {
        DomNode::Text(text) => Some((node.id(), text.clone())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> CleanContext {
        CleanContext::new(Some("https://example.com/docs/"), &ScrapeOptions::default())
    }

    fn body_after(pass: Pass, html: &str) -> String {
        let dom = pass(Dom::parse_document(html), &ctx());
        let body = dom.first_named("body").unwrap();
        dom.inner_html(body)
    }

    #[test]
    fn noise_classes_match_tokens_and_fragments() {
        let html = r#"<p class="nav-title">keep</p><p class="nav">drop</p><div class="top-ad-slot">drop</div><p id="head-ad-1">drop</p><span role="img">drop</span>"#;
        assert_eq!(body_after(remove_noise, html), r#"<p class="nav-title">keep</p>"#);
    }

    #[test]
    fn every_noise_selector_parses() {
        assert_eq!(NOISE.len(), NOISE_SELECTORS.len());
    }

    #[test]
    fn noise_nested_in_content_is_cut_out() {
        let html = r#"<article><p>Intro <button>Copy</button>text</p><aside>related</aside><svg><title>icon</title></svg><p>End</p></article>"#;
        assert_eq!(
            body_after(remove_noise, html),
            "<article><p>Intro text</p><p>End</p></article>"
        );
    }

    #[test]
    fn gutter_column_is_removed_but_code_numbers_stay() {
        let html = "<pre><code><span class=\"lineno\">1</span>let a = 1;</code></pre><pre><code>1\n2\n3\nconst x = 1;</code></pre>";
        assert_eq!(
            body_after(strip_code_gutters, html),
            "<pre><code>let a = 1;</code></pre><pre><code>const x = 1;</code></pre>"
        );
    }

    #[test]
    fn numeric_first_child_is_removed_only_when_short() {
        let html = "<pre><code><span>12</span>x = 3</code></pre><pre><code><span>12345</span>x</code></pre>";
        assert_eq!(
            body_after(strip_code_gutters, html),
            "<pre><code>x = 3</code></pre><pre><code><span>12345</span>x</code></pre>"
        );
    }

    #[test]
    fn link_density_uses_trimmed_text_length() {
        let html = r#"<p><a href="/x">12345678</a>90</p><p>plain text with a <a href="/y">link</a></p>"#;
        assert_eq!(
            body_after(drop_link_dense_blocks, html),
            r#"<p>plain text with a <a href="/y">link</a></p>"#
        );
    }

    #[test]
    fn symbol_noise_keeps_images_and_words() {
        let html = r#"<p>* * *</p><div><img src="a.png"></div><span>   </span><p>ok</p><p>你好</p>"#;
        assert_eq!(
            body_after(drop_symbol_noise, html),
            r#"<div><img src="a.png"></div><p>ok</p><p>你好</p>"#
        );
    }

    #[test]
    fn wrappers_unwrap_with_context_spacing() {
        let html = "<section><p>a</p></section><h2><div>b</div>c</h2><p><span>d</span></p>";
        assert_eq!(
            body_after(unwrap_wrappers, html),
            "\n<p>a</p>\n<h2>b c</h2><p>d</p>"
        );
    }

    #[test]
    fn elements_keep_only_allowed_attributes() {
        let html = r#"<h2 id="s" class="x">T</h2><td colspan="2" style="c">v</td><a href="a/b" class="k" title="t">go</a><img data-src="/lazy.png" src="data:," alt="A" width="3">"#;
        assert_eq!(
            body_after(process_elements, html),
            r#"<h2 id="s">T</h2>v<a href="https://example.com/docs/a/b" title="t">go</a><img src="https://example.com/lazy.png" alt="A">"#
        );
    }

    #[test]
    fn self_linking_image_is_unwrapped() {
        let html = r#"<a href="/full/pic.png"><img src="/full/pic.png?w=200"></a><a href="/page"><img src="/pic.png"></a>"#;
        assert_eq!(
            body_after(process_elements, html),
            r#"<img src="https://example.com/full/pic.png?w=200"><a href="https://example.com/page"><img src="https://example.com/pic.png"></a>"#
        );
    }

    #[test]
    fn empty_and_hrefless_anchors_are_flattened() {
        let html = r#"<p><a href="/x"> </a><a>text</a><a href="">more</a></p>"#;
        assert_eq!(body_after(process_elements, html), "<p>textmore</p>");
    }

    #[test]
    fn heading_whitespace_is_trimmed() {
        assert_eq!(
            body_after(trim_headings, "<h1>  Title  </h1><h2>\n<b>x</b> y </h2>"),
            "<h1>Title</h1><h2><b>x</b> y</h2>"
        );
    }
}
