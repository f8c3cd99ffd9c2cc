//! Owned document tree the cleaner and the local converter transform in place.
//!
//! Parsed once from html5ever output (via scraper) into an `ego_tree` arena. Removal
//! detaches a subtree; detached nodes stay in the arena, so node id snapshots taken
//! before a pass must be checked with [`Dom::is_attached`].
use ego_tree::iter::Edge;
use ego_tree::{NodeId, NodeRef, Tree};
use scraper::{Html, Node};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose text keeps its whitespace when inline content is collapsed.
const VERBATIM_ELEMENTS: &[&str] = &["pre", "textarea", "code", "kbd", "samp", "script", "style"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomNode {
    Document,
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    /// Lowercase local name.
    pub name: String,
    pub attrs: Vec<(String, String)>,
}

impl ElementData {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
    }
}

pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

#[derive(Debug, Clone)]
pub struct Dom {
    tree: Tree<DomNode>,
}

impl Dom {
    /// Parse a full document. Comments, doctypes and processing instructions are dropped.
    pub fn parse_document(html: &str) -> Self {
        Self::from_html(&Html::parse_document(html), |_| false)
    }

    /// Copy a parsed scraper document, leaving out every node for which `skip` holds
    /// together with its subtree.
    pub fn from_html(parsed: &Html, skip: impl Fn(NodeId) -> bool) -> Self {
        let mut tree = Tree::new(DomNode::Document);
        let source_root = parsed.tree.root().id();
        // Parent for each open source node; skipped nodes reuse their parent's slot.
        let mut stack = vec![tree.root().id()];
        let mut skipping: Option<NodeId> = None;

        for edge in parsed.tree.root().traverse() {
            if let Some(skipped) = skipping {
                if matches!(edge, Edge::Close(node) if node.id() == skipped) {
                    skipping = None;
                }
                continue;
            }
            match edge {
                Edge::Open(node) if skip(node.id()) => skipping = Some(node.id()),
                Edge::Open(node) if node.id() != source_root => {
                    let parent = stack.last().copied().unwrap_or_else(|| tree.root().id());
                    let value = match node.value() {
                        Node::Element(element) => Some(DomNode::Element(ElementData {
                            name: element.name().to_ascii_lowercase(),
                            attrs: element
                                .attrs()
                                .map(|(key, value)| (key.to_string(), value.to_string()))
                                .collect(),
                        })),
                        Node::Text(text) => {
                            let text: &str = text;
                            Some(DomNode::Text(text.to_owned()))
                        }
                        _ => None,
                    };
                    let slot = match (value, tree.get_mut(parent)) {
                        (Some(value), Some(mut parent_node)) => parent_node.append(value).id(),
                        _ => parent,
                    };
                    stack.push(slot);
                }
                Edge::Close(node) if node.id() != source_root => {
                    stack.pop();
                }
                _ => {}
            }
        }

        Self { tree }
    }

    pub fn root(&self) -> NodeRef<'_, DomNode> {
        self.tree.root()
    }

    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_, DomNode>> {
        self.tree.get(id)
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.tree.get(id)?.value() {
            DomNode::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|element| element.name.as_str())
    }

    /// Element ids in document order, snapshotted now.
    pub fn elements(&self) -> Vec<NodeId> {
        self.tree
            .root()
            .descendants()
            .filter(|node| matches!(node.value(), DomNode::Element(_)))
            .map(|node| node.id())
            .collect()
    }

    /// Attached elements with one of the given tag names, in document order.
    pub fn elements_named(&self, names: &[&str]) -> Vec<NodeId> {
        self.elements()
            .into_iter()
            .filter(|id| self.tag(*id).is_some_and(|tag| names.contains(&tag)))
            .collect()
    }

    pub fn first_named(&self, name: &str) -> Option<NodeId> {
        self.tree.root().descendants().find_map(|node| match node.value() {
            DomNode::Element(element) if element.name == name => Some(node.id()),
            _ => None,
        })
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        let root = self.tree.root().id();
        match self.tree.get(id) {
            Some(node) if node.id() == root => true,
            Some(node) => node.ancestors().last().is_some_and(|top| top.id() == root),
            None => false,
        }
    }

    pub fn parent_tag(&self, id: NodeId) -> Option<&str> {
        let parent = self.tree.get(id)?.parent()?.id();
        self.tag(parent)
    }

    pub fn text_content(&self, id: NodeId) -> String {
        let Some(node) = self.tree.get(id) else {
            return String::new();
        };
        node.descendants()
            .filter_map(|node| match node.value() {
                DomNode::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Descendant elements (excluding `id`) with the given tag name.
    pub fn descendants_named(&self, id: NodeId, name: &str) -> Vec<NodeId> {
        let Some(node) = self.tree.get(id) else {
            return Vec::new();
        };
        node.descendants()
            .skip(1)
            .filter(|node| matches!(node.value(), DomNode::Element(el) if el.name == name))
            .map(|node| node.id())
            .collect()
    }

    pub fn remove(&mut self, id: NodeId) {
        if let Some(mut node) = self.tree.get_mut(id) {
            node.detach();
        }
    }

    /// Replace the element with its children.
    pub fn unwrap(&mut self, id: NodeId) {
        let children: Vec<NodeId> = match self.tree.get(id) {
            Some(node) if node.parent().is_some() => node.children().map(|c| c.id()).collect(),
            _ => return,
        };
        if let Some(mut node) = self.tree.get_mut(id) {
            for child in children {
                node.insert_id_before(child);
            }
            node.detach();
        }
    }

    pub fn insert_text_before(&mut self, id: NodeId, text: &str) {
        if self.has_parent(id) {
            if let Some(mut node) = self.tree.get_mut(id) {
                node.insert_before(DomNode::Text(text.to_string()));
            }
        }
    }

    pub fn insert_text_after(&mut self, id: NodeId, text: &str) {
        if self.has_parent(id) {
            if let Some(mut node) = self.tree.get_mut(id) {
                node.insert_after(DomNode::Text(text.to_string()));
            }
        }
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: String) {
        self.with_element_mut(id, |element| {
            match element.attrs.iter_mut().find(|(key, _)| key == name) {
                Some(slot) => slot.1 = value,
                None => element.attrs.push((name.to_string(), value)),
            }
        });
    }

    pub fn retain_attrs(&mut self, id: NodeId, mut keep: impl FnMut(&str, &str) -> bool) {
        self.with_element_mut(id, |element| {
            let name = element.name.clone();
            element.attrs.retain(|(key, _)| keep(&name, key));
        });
    }

    pub fn set_text(&mut self, id: NodeId, text: String) {
        if let Some(mut node) = self.tree.get_mut(id) {
            if let DomNode::Text(slot) = node.value() {
                *slot = text;
            }
        }
    }

    fn with_element_mut(&mut self, id: NodeId, f: impl FnOnce(&mut ElementData)) {
        if let Some(mut node) = self.tree.get_mut(id) {
            if let DomNode::Element(element) = node.value() {
                f(element);
            }
        }
    }

    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(node) = self.tree.get(id) {
            for child in node.children() {
                serialize_into(child, &mut out, Whitespace::Keep);
            }
        }
        out
    }

    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(node) = self.tree.get(id) {
            serialize_into(node, &mut out, Whitespace::Keep);
        }
        out
    }

    fn has_parent(&self, id: NodeId) -> bool {
        self.tree.get(id).is_some_and(|node| node.parent().is_some())
    }
}

/// Serialized HTML of a node and its subtree.
pub fn node_html(node: NodeRef<'_, DomNode>) -> String {
    let mut out = String::new();
    serialize_into(node, &mut out, Whitespace::Keep);
    out
}

/// Append the HTML of `node` with whitespace runs collapsed to one space, except
/// inside elements whose text is whitespace-sensitive.
pub fn push_collapsed_html(node: NodeRef<'_, DomNode>, out: &mut String) {
    serialize_into(node, out, Whitespace::Collapse);
}

pub fn start_tag(element: &ElementData) -> String {
    let mut out = String::new();
    push_start_tag(element, &mut out);
    out
}

fn push_start_tag(element: &ElementData, out: &mut String) {
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in &element.attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape_attr(value));
        out.push('"');
    }
    out.push('>');
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Whitespace {
    Keep,
    Collapse,
}

/// Iterative serializer, so deeply nested input cannot overflow the stack.
fn serialize_into(node: NodeRef<'_, DomNode>, out: &mut String, whitespace: Whitespace) {
    let mut verbatim = node
        .ancestors()
        .filter(|ancestor| is_verbatim(ancestor.value()))
        .count();
    for edge in node.traverse() {
        match edge {
            Edge::Open(node) => match node.value() {
                DomNode::Document => {}
                DomNode::Element(element) => {
                    push_start_tag(element, out);
                    if is_verbatim(node.value()) {
                        verbatim += 1;
                    }
                    if element.name == "pre" || element.name == "textarea" {
                        if let Some(DomNode::Text(text)) = node.first_child().map(|c| c.value()) {
                            if text.starts_with('\n') {
                                out.push('\n');
                            }
                        }
                    }
                }
                DomNode::Text(text) => {
                    let raw = node
                        .parent()
                        .and_then(|parent| match parent.value() {
                            DomNode::Element(el) => Some(el.name == "script" || el.name == "style"),
                            _ => None,
                        })
                        .unwrap_or(false);
                    if raw {
                        out.push_str(text);
                    } else if whitespace == Whitespace::Collapse && verbatim == 0 {
                        push_collapsed_text(text, out);
                    } else {
                        out.push_str(&escape_text(text));
                    }
                }
            },
            Edge::Close(node) => {
                if let DomNode::Element(element) = node.value() {
                    if is_verbatim(node.value()) {
                        verbatim -= 1;
                    }
                    if !is_void_element(&element.name) {
                        out.push_str("</");
                        out.push_str(&element.name);
                        out.push('>');
                    }
                }
            }
        }
    }
}

fn is_verbatim(node: &DomNode) -> bool {
    matches!(node, DomNode::Element(el) if VERBATIM_ELEMENTS.contains(&el.name.as_str()))
}

fn push_collapsed_text(text: &str, out: &mut String) {
    for (index, word) in text.split(char::is_whitespace).enumerate() {
        if index > 0 && !out.is_empty() && !out.ends_with(' ') {
            out.push(' ');
        }
        out.push_str(&escape_text(word));
    }
}

pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::Dom;

    #[test]
    fn parse_and_serialize_body() {
        let dom = Dom::parse_document(
            "<!-- hi --><p class=\"x\">a &amp; b<br>c</p><img src=\"/i.png\">",
        );
        let body = dom.first_named("body").unwrap();
        assert_eq!(
            dom.inner_html(body),
            "<p class=\"x\">a &amp; b<br>c</p><img src=\"/i.png\">"
        );
    }

    #[test]
    fn unwrap_keeps_children_in_place() {
        let mut dom = Dom::parse_document("<p>a<span>b<i>c</i></span>d</p>");
        let span = dom.first_named("span").unwrap();
        dom.unwrap(span);
        let p = dom.first_named("p").unwrap();
        assert_eq!(dom.inner_html(p), "ab<i>c</i>d");
        assert!(!dom.is_attached(span));
    }

    #[test]
    fn removed_subtree_is_detached() {
        let mut dom = Dom::parse_document("<div><p><a>x</a></p></div>");
        let div = dom.first_named("div").unwrap();
        let anchor = dom.first_named("a").unwrap();
        dom.remove(div);
        assert!(!dom.is_attached(anchor));
        assert!(dom.first_named("a").is_none());
    }

    #[test]
    fn deep_nesting_serializes_without_recursion() {
        let depth = 2_000;
        let html = format!("{}x{}", "<div>".repeat(depth), "</div>".repeat(depth));
        let dom = Dom::parse_document(&html);
        let body = dom.first_named("body").unwrap();
        assert!(dom.inner_html(body).contains('x'));
    }
}
