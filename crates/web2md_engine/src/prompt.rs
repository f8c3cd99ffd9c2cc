use std::sync::LazyLock;

use regex::Regex;

use web2md_core::ScrapeOptions;

/// Longest HTML input sent to a model, in characters.
pub const MAX_PROMPT_HTML_CHARS: usize = 150_000;
const TRUNCATED_MARKER: &str = "...[content truncated]";

pub const SYSTEM_INSTRUCTION: &str = "You are an expert HTML-to-Markdown converter specialized in content extraction. \
Your sole purpose is to identify the main article content within HTML and convert it to clean, professional Markdown. \
You distinguish actual content from web UI noise such as navigation, ads and social widgets. \
You never add explanations or wrap output in code blocks; you return pure Markdown only.";

static OPENING_MARKDOWN_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^```markdown\n?").expect("valid regex"));
static OPENING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```\n?").expect("valid regex"));
static CLOSING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n?```$").expect("valid regex"));

/// Cut `html` to [`MAX_PROMPT_HTML_CHARS`] on a char boundary, marking the cut.
pub fn truncate_html(html: &str) -> String {
    match html.char_indices().nth(MAX_PROMPT_HTML_CHARS) {
        Some((end, _)) => format!("{}{TRUNCATED_MARKER}", &html[..end]),
        None => html.to_string(),
    }
}

/// Transpile prompt: faithful conversion of the main content, never a summary.
pub fn build_prompt(html: &str, options: &ScrapeOptions) -> String {
    let image_rule = if options.include_images {
        "Include images using ![alt text](url) syntax. Extract meaningful alt text from the HTML or describe the image context. If inside <figure>, use the <figcaption> as alt text or caption."
    } else {
        "Remove all images and image references completely."
    };
    let link_rule = if options.include_links {
        "Preserve meaningful hyperlinks using [text](url) syntax. Keep links that add value (references, sources, related content)."
    } else {
        "Remove all hyperlinks but preserve the link text inline."
    };

    format!(
        "Extract and convert the main content from this HTML into clean, well-structured Markdown. \
Don't rephrase, summarize, or modify the original content.

== PRIMARY OBJECTIVES ==
1. Extract ONLY the main article/content body
2. Remove all navigation, UI elements, and promotional content
3. Preserve the content's logical structure and hierarchy
4. Produce professional, readable Markdown

== REMOVAL RULES (Apply Strictly) ==
Remove these elements completely:
- Navigation menus, headers, footers, sidebars
- Social sharing buttons (\"Share on...\", \"Follow us\", \"Tweet this\")
- Call-to-action buttons (\"Subscribe\", \"Sign up\", \"Download\")
- Advertisement placeholders and promotional boxes
- \"Related Articles\", \"You May Also Like\", \"Trending Now\" sections
- Article metadata (publish date, author byline, read time, view counts)
- Comment sections and user interaction prompts
- Cookie notices, newsletter popups, modal overlays
- Breadcrumb trails and pagination (\"Page 1 of 3\", \"Next article\")
- Image carousel counters (\"1/10\", \"Slide 2 of 5\")
- Copyright footers and legal disclaimers (unless part of main content)

== MARKDOWN FORMATTING ==
Structure:
- Use # for the main title (H1); it should appear only once
- Use ## for major sections (H2)
- Use ### for subsections (H3)

Content:
- {image_rule}
- {link_rule}
- Preserve code blocks with proper language tags: ```language
- Use > for blockquotes, replacing the quotes \"\"
- Format tables using proper Markdown table syntax
- Use - or * for unordered lists, 1. 2. 3. for ordered lists
- Use **bold** for emphasis, *italic* for subtle emphasis
- Preserve line breaks between paragraphs

== QUALITY CHECKS ==
Before outputting, ensure:
- The title is clear and appears once at the top
- Headers follow a logical hierarchy (no jumping from # to ###)
- Lists are properly formatted and not broken
- No UI fragments remain (\"Click here\", \"Read more\", etc.)
- The text flows naturally as a standalone document
- No code block markers or artifact syntax in output

== HTML INPUT ==
{html}

== OUTPUT INSTRUCTIONS ==
Return ONLY the Markdown content. Start immediately with the title. \
No preamble, no explanations, no wrapping in code blocks.",
        html = truncate_html(html),
    )
}

/// Remove a code fence the model wrapped around its whole answer.
pub fn strip_code_fence(markdown: &str) -> String {
    let markdown = OPENING_MARKDOWN_FENCE.replace(markdown.trim(), "");
    let markdown = OPENING_FENCE.replace(&markdown, "");
    let markdown = CLOSING_FENCE.replace(&markdown, "");
    markdown.trim().to_string()
}
