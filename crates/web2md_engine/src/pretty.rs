use ego_tree::NodeRef;

use crate::dom::{is_void_element, node_html, push_collapsed_html, start_tag, Dom, DomNode};

const INDENT: &str = "  ";
const MAX_DEPTH: usize = 512;

const BLOCK_ELEMENTS: &[&str] = &[
    "html", "head", "body", "title", "meta", "link", "p", "h1", "h2", "h3", "h4", "h5", "h6",
    "ul", "ol", "li", "dl", "dt", "dd", "table", "thead", "tbody", "tfoot", "tr", "td", "th",
    "caption", "blockquote", "pre", "hr", "figure", "details", "summary", "div", "section",
    "article", "main", "header", "footer", "nav", "aside", "address",
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrettyError {
    #[error("document nesting exceeds {0} levels")]
    TooDeep(usize),
}

/// Re-indent an HTML document: one block element per line, two spaces per level,
/// inline runs collapsed onto a single line. `<pre>` blocks and inline code keep
/// their whitespace.
pub fn pretty_print(html: &str) -> Result<String, PrettyError> {
    let dom = Dom::parse_document(html);
    let mut out = String::from("<!DOCTYPE html>\n");
    print_children(dom.root(), 0, &mut out)?;
    Ok(out)
}

fn is_block(node: NodeRef<'_, DomNode>) -> bool {
    matches!(node.value(), DomNode::Element(el) if BLOCK_ELEMENTS.contains(&el.name.as_str()))
}

fn print_children(
    parent: NodeRef<'_, DomNode>,
    depth: usize,
    out: &mut String,
) -> Result<(), PrettyError> {
    let mut inline = Vec::new();
    for child in parent.children() {
        if is_block(child) {
            flush_inline(&mut inline, depth, out);
            print_block(child, depth, out)?;
        } else {
            inline.push(child);
        }
    }
    flush_inline(&mut inline, depth, out);
    Ok(())
}

fn print_block(
    node: NodeRef<'_, DomNode>,
    depth: usize,
    out: &mut String,
) -> Result<(), PrettyError> {
    if depth > MAX_DEPTH {
        return Err(PrettyError::TooDeep(MAX_DEPTH));
    }
    let DomNode::Element(element) = node.value() else {
        return Ok(());
    };
    let indent = INDENT.repeat(depth);

    if element.name == "pre" {
        out.push_str(&indent);
        out.push_str(&node_html(node));
        out.push('\n');
        return Ok(());
    }

    let open = start_tag(element);
    if is_void_element(&element.name) {
        out.push_str(&indent);
        out.push_str(&open);
        out.push('\n');
        return Ok(());
    }
    let close = format!("</{}>", element.name);

    if node.children().any(is_block) {
        out.push_str(&indent);
        out.push_str(&open);
        out.push('\n');
        print_children(node, depth + 1, out)?;
        out.push_str(&indent);
        out.push_str(&close);
        out.push('\n');
    } else {
        out.push_str(&indent);
        out.push_str(&open);
        out.push_str(&inline_line(node.children()));
        out.push_str(&close);
        out.push('\n');
    }
    Ok(())
}

fn flush_inline(inline: &mut Vec<NodeRef<'_, DomNode>>, depth: usize, out: &mut String) {
    let line = inline_line(inline.drain(..));
    if !line.is_empty() {
        out.push_str(&INDENT.repeat(depth));
        out.push_str(&line);
        out.push('\n');
    }
}

fn inline_line<'a>(nodes: impl IntoIterator<Item = NodeRef<'a, DomNode>>) -> String {
    let mut line = String::new();
    for node in nodes {
        push_collapsed_html(node, &mut line);
    }
    line.trim().to_string()
}
