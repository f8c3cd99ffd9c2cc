use pretty_assertions::assert_eq;
use web2md_core::ScrapeOptions;
use web2md_engine::{clean_html, CleanContext, Dom, PASSES, UNTITLED};

fn body_of(dom: &Dom) -> String {
    let body = dom.first_named("body").expect("body element");
    dom.inner_html(body)
}

#[test]
fn page_is_reduced_to_titled_article() {
    let raw = "<html><head><title>Example Domain</title></head><body><nav>Menu</nav><div><p>Hello world</p></div></body></html>";
    let cleaned = clean_html(raw, Some("https://example.com/"), &ScrapeOptions::default());

    assert_eq!(cleaned.title, "Example Domain");
    assert!(cleaned.html.starts_with("<!DOCTYPE html>\n"));
    assert!(cleaned.html.contains("<title>Example Domain</title>"));
    assert!(cleaned.html.contains("<p>Hello world</p>"));
    assert!(!cleaned.html.contains("Menu"));
    assert!(!cleaned.html.contains("<div"));
}

#[test]
fn title_falls_back_to_heading_and_placeholder() {
    let garbage = "<title>Site Navigation</title><h1>Release notes for 2.0</h1>";
    let cleaned = clean_html(garbage, None, &ScrapeOptions::default());
    assert_eq!(cleaned.title, "Release notes for 2.0");

    let cleaned = clean_html("<p>no title anywhere</p>", None, &ScrapeOptions::default());
    assert_eq!(cleaned.title, UNTITLED);

    let cleaned = clean_html(
        "<title>Getting Started | Docs</title>",
        None,
        &ScrapeOptions::default(),
    );
    assert_eq!(cleaned.title, "Getting Started");
}

#[test]
fn ad_and_social_blocks_are_removed() {
    let raw = r#"<body><div class="ad-banner">Buy now</div><ul class="social-links"><li>Follow</li></ul><p>Article text stays.</p></body>"#;
    let cleaned = clean_html(raw, None, &ScrapeOptions::default());
    assert!(!cleaned.html.contains("Buy now"));
    assert!(!cleaned.html.contains("Follow"));
    assert!(cleaned.html.contains("<p>Article text stays.</p>"));
}

#[test]
fn link_heavy_paragraph_is_dropped() {
    // 14 of 17 characters are link text.
    let raw = r#"<body><p><a href="/a">Link text here</a> ab</p><p>Prose with one <a href="/b">link</a> inside it.</p></body>"#;
    let cleaned = clean_html(raw, Some("https://example.com/"), &ScrapeOptions::default());
    assert!(!cleaned.html.contains("Link text here"));
    assert!(cleaned
        .html
        .contains(r#"<p>Prose with one <a href="https://example.com/b">link</a> inside it.</p>"#));
}

#[test]
fn code_gutter_is_stripped() {
    let raw = "<body><pre><code><span class=\"line-numbers\">1\n2</span>fn main() {}\nrun();</code></pre></body>";
    let cleaned = clean_html(raw, None, &ScrapeOptions::default());
    assert!(cleaned.html.contains("<pre><code>fn main() {}\nrun();</code></pre>"));
}

#[test]
fn options_drop_images_and_flatten_links() {
    let raw = r#"<body><p>See <a href="/docs">the docs</a> and <img src="/pic.png" alt="pic"> here.</p></body>"#;
    let options = ScrapeOptions {
        include_images: false,
        include_links: false,
        ..ScrapeOptions::default()
    };
    let cleaned = clean_html(raw, Some("https://example.com/"), &options);
    assert!(!cleaned.html.contains("<img"));
    assert!(!cleaned.html.contains("<a"));
    assert!(cleaned.html.contains("the docs"));
}

#[test]
fn kept_images_and_links_are_absolute() {
    let raw = r#"<body><p>Read <a href="guide/intro" class="x">the intro</a> before you start.</p><img data-src="img/lazy.png" src="data:," alt="Lazy"></body>"#;
    let cleaned = clean_html(raw, Some("https://example.com/docs/"), &ScrapeOptions::default());
    assert!(cleaned
        .html
        .contains(r#"<a href="https://example.com/docs/guide/intro">the intro</a>"#));
    assert!(cleaned
        .html
        .contains(r#"<img src="https://example.com/docs/img/lazy.png" alt="Lazy">"#));
}

#[test]
fn deletion_and_attribute_passes_are_idempotent() {
    let raw = r#"<body><nav>n</nav><div class="post-meta">by x</div><h2 id="s" class="c">T</h2><p style="x">text <a href="/a" rel="r">a</a></p><img src="/i.png" width="1"></body>"#;
    let ctx = CleanContext::new(Some("https://example.com/"), &ScrapeOptions::default());

    for (name, pass) in PASSES
        .iter()
        .filter(|(name, _)| matches!(*name, "remove noise" | "process elements"))
    {
        let once = body_of(&pass(Dom::parse_document(raw), &ctx));
        let twice = body_of(&pass(Dom::parse_document(&once), &ctx));
        assert_eq!(once, twice, "pass {name} changed its own output");
    }
}

#[test]
fn cleaning_never_fails_on_fragments() {
    let cleaned = clean_html("<<<>>> plain", None, &ScrapeOptions::default());
    assert!(cleaned.html.contains("<body>"));
    assert_eq!(cleaned.title, UNTITLED);
}

#[test]
fn formatter_failure_returns_unformatted_document() {
    let depth = 600;
    let raw = format!(
        "<title>Deep</title><body>{}deep text{}</body>",
        "<blockquote>".repeat(depth),
        "</blockquote>".repeat(depth)
    );
    let cleaned = clean_html(&raw, None, &ScrapeOptions::default());

    assert_eq!(cleaned.title, "Deep");
    assert!(cleaned.html.contains("deep text"));
    assert!(cleaned
        .html
        .contains("<head>\n<meta charset=\"utf-8\">\n<title>Deep</title>\n</head>"));
    assert!(cleaned.html.contains(&"<blockquote>".repeat(depth)));
}

#[test]
fn inline_code_keeps_its_spacing() {
    let raw = "<body><p>Run <code>a    b</code> now</p></body>";
    let cleaned = clean_html(raw, None, &ScrapeOptions::default());
    assert!(cleaned.html.contains("<p>Run <code>a    b</code> now</p>"));
}
