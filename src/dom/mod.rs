//! In-memory page document: an arena of elements the app reads and mutates
//! the way page script would mutate the browser DOM.

mod selector;

pub use selector::{Selector, SelectorError};

use std::collections::BTreeMap;
use std::fmt::Write as _;

use storefront_http_manager::FormBody;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Element {
    tag: String,
    classes: Vec<String>,
    attrs: BTreeMap<String, String>,
    // Live form value; starts as the `value` attribute.
    value: String,
    text: String,
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    element: Element,
}

const VOID_TAGS: &[&str] = &["img", "input", "br", "hr", "meta", "link"];
const FIELD_TAGS: &[&str] = &["input", "select", "textarea"];

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    body: NodeId,
    url: String,
    cookie: String,
}

impl Document {
    /// Empty document with a `<body>` at `url`.
    pub fn new(url: impl Into<String>) -> Self {
        let body = Node {
            parent: None,
            children: Vec::new(),
            element: Element {
                tag: "body".to_string(),
                classes: Vec::new(),
                attrs: BTreeMap::new(),
                value: String::new(),
                text: String::new(),
            },
        };
        Self {
            nodes: vec![body],
            body: NodeId(0),
            url: url.into(),
            cookie: String::new(),
        }
    }

    /// Document whose body holds `children`.
    pub fn with_body(url: impl Into<String>, children: impl IntoIterator<Item = ElementBuilder>) -> Self {
        let mut doc = Self::new(url);
        let body = doc.body();
        for child in children {
            doc.append(body, child);
        }
        doc
    }

    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = cookie.into();
        self
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// The raw `document.cookie` string.
    pub fn cookie(&self) -> &str {
        &self.cookie
    }

    // === tree ===

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            element: Element {
                tag: tag.to_ascii_lowercase(),
                classes: Vec::new(),
                attrs: BTreeMap::new(),
                value: String::new(),
                text: String::new(),
            },
        });
        id
    }

    /// Build `builder` and append it under `parent`.
    pub fn append(&mut self, parent: NodeId, builder: ElementBuilder) -> NodeId {
        let node = self.create_element(&builder.tag);
        for class in &builder.classes {
            self.add_class(node, class);
        }
        for (name, value) in builder.attrs {
            self.set_attr(node, &name, value);
        }
        if let Some(text) = builder.text {
            self.set_text(node, text);
        }
        self.append_child(parent, node);
        for child in builder.children {
            self.append(node, child);
        }
        node
    }

    /// Move `child` to the end of `parent`'s children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if parent == child || self.is_ancestor(child, parent) {
            tracing::warn!(?parent, ?child, "refusing to create a cycle");
            return;
        }
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Detach `node` (and its subtree) from the document.
    pub fn remove(&mut self, node: NodeId) {
        if node == self.body {
            return;
        }
        self.detach(node);
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != node);
        }
    }

    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = self.parent(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|n| n.parent)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
    }

    /// Whether `node` is reachable from the body.
    pub fn is_connected(&self, node: NodeId) -> bool {
        node == self.body || self.is_ancestor(self.body, node)
    }

    /// `node` followed by its ancestors, innermost first.
    pub fn ancestors_inclusive(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(node), move |n| self.parent(*n))
    }

    /// Descendants of `node` in document order, excluding `node`.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    // === element data ===

    pub fn tag(&self, node: NodeId) -> &str {
        &self.nodes[node.0].element.tag
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes[node.0].element.attrs.get(name).map(String::as_str)
    }

    /// Set an attribute. `class` replaces the class list and `value`
    /// also resets the live value.
    pub fn set_attr(&mut self, node: NodeId, name: &str, value: impl Into<String>) {
        let value = value.into();
        let element = &mut self.nodes[node.0].element;
        match name {
            "class" => {
                element.classes = value.split_whitespace().map(str::to_string).collect();
            }
            "value" => {
                element.value = value.clone();
                element.attrs.insert(name.to_string(), value);
            }
            _ => {
                element.attrs.insert(name.to_string(), value);
            }
        }
    }

    /// `data-*` lookup by its dataset key, e.g. `ajax` for `data-ajax`.
    pub fn data(&self, node: NodeId, key: &str) -> Option<&str> {
        self.attr(node, &format!("data-{key}"))
    }

    pub fn classes(&self, node: NodeId) -> &[String] {
        &self.nodes[node.0].element.classes
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.classes(node).iter().any(|c| c == class)
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if !self.has_class(node, class) {
            self.nodes[node.0].element.classes.push(class.to_string());
        }
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        self.nodes[node.0].element.classes.retain(|c| c != class);
    }

    pub fn value(&self, node: NodeId) -> &str {
        &self.nodes[node.0].element.value
    }

    pub fn set_value(&mut self, node: NodeId, value: impl Into<String>) {
        self.nodes[node.0].element.value = value.into();
    }

    /// Replace the node's content with plain text.
    pub fn set_text(&mut self, node: NodeId, text: impl Into<String>) {
        for child in self.children(node).to_vec() {
            self.detach(child);
        }
        self.nodes[node.0].element.text = text.into();
    }

    /// Own text followed by every descendant's text.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = self.nodes[node.0].element.text.clone();
        for child in self.descendants(node) {
            out.push_str(&self.nodes[child.0].element.text);
        }
        out
    }

    // === queries ===

    /// First element under `scope` (exclusive) matching `selector`.
    pub fn query(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|n| selector.matches(self, *n))
    }

    pub fn query_all(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|n| selector.matches(self, *n))
            .collect()
    }

    /// `document.querySelector`.
    pub fn select(&self, selector: &Selector) -> Option<NodeId> {
        self.query(self.body, selector)
    }

    pub fn select_all(&self, selector: &Selector) -> Vec<NodeId> {
        self.query_all(self.body, selector)
    }

    /// Nearest inclusive ancestor matching `selector`.
    pub fn closest(&self, node: NodeId, selector: &Selector) -> Option<NodeId> {
        self.ancestors_inclusive(node)
            .find(|n| selector.matches(self, *n))
    }

    /// Nearest inclusive ancestor with the given tag.
    pub fn closest_tag(&self, node: NodeId, tag: &str) -> Option<NodeId> {
        self.ancestors_inclusive(node)
            .find(|n| self.tag(*n).eq_ignore_ascii_case(tag))
    }

    /// First connected element whose `id` attribute equals `id`.
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.body)
            .into_iter()
            .find(|n| self.attr(*n, "id") == Some(id))
    }

    // === forms ===

    /// Successful controls of `form`, in document order.
    pub fn form_data(&self, form: NodeId) -> FormBody {
        let mut body = FormBody::new();
        for node in self.descendants(form) {
            if !FIELD_TAGS.contains(&self.tag(node)) {
                continue;
            }
            let Some(name) = self.attr(node, "name").filter(|n| !n.is_empty()) else {
                continue;
            };
            if self.attr(node, "disabled").is_some() {
                continue;
            }
            let kind = self.attr(node, "type").unwrap_or("text");
            if matches!(kind, "checkbox" | "radio") && self.attr(node, "checked").is_none() {
                continue;
            }
            if matches!(kind, "submit" | "button" | "reset" | "file") {
                continue;
            }
            body.append(name, self.value(node));
        }
        body
    }

    /// Where `form` submits: its `action`, or the document URL.
    pub fn form_action(&self, form: NodeId) -> String {
        match self.attr(form, "action") {
            Some(action) if !action.is_empty() => action.to_string(),
            _ => self.url.clone(),
        }
    }

    // === rendering ===

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.render(self.body, &mut out);
        out
    }

    fn render(&self, node: NodeId, out: &mut String) {
        let element = &self.nodes[node.0].element;
        let tag = element.tag.as_str();
        // `input` and `textarea` show their live value in place of the attribute.
        let live_value = matches!(tag, "input" | "textarea");
        let selected = self.selected_option(node);
        let _ = write!(out, "<{}", element.tag);
        if let Some(id) = element.attrs.get("id") {
            let _ = write!(out, " id=\"{}\"", escape(id));
        }
        if !element.classes.is_empty() {
            let _ = write!(out, " class=\"{}\"", escape(&element.classes.join(" ")));
        }
        for (name, value) in &element.attrs {
            if name == "id" || (live_value && name == "value") || (selected.is_some() && name == "selected") {
                continue;
            }
            let _ = write!(out, " {}=\"{}\"", name, escape(value));
        }
        if tag == "input" {
            let _ = write!(out, " value=\"{}\"", escape(&element.value));
        }
        if selected == Some(true) {
            out.push_str(" selected");
        }
        out.push('>');
        if VOID_TAGS.contains(&tag) {
            return;
        }
        if tag == "textarea" {
            out.push_str(&escape(&element.value));
        } else {
            out.push_str(&escape(&element.text));
        }
        for child in &self.nodes[node.0].children {
            self.render(*child, out);
        }
        let _ = write!(out, "</{}>", element.tag);
    }

    /// For an `<option>` under a `<select>` with a live value: whether it is
    /// the chosen one. `None` when selection is left to the markup.
    fn selected_option(&self, node: NodeId) -> Option<bool> {
        if self.tag(node) != "option" {
            return None;
        }
        let select = self.parent(node).filter(|p| self.tag(*p) == "select")?;
        let chosen = self.value(select);
        if chosen.is_empty() {
            return None;
        }
        let own = match self.attr(node, "value") {
            Some(value) => value.to_string(),
            None => self.text_content(node),
        };
        Some(own == chosen)
    }
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Declarative element description used to populate a [`Document`].
#[derive(Debug, Clone)]
pub struct ElementBuilder {
    tag: String,
    classes: Vec<String>,
    attrs: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<ElementBuilder>,
}

pub fn el(tag: &str) -> ElementBuilder {
    ElementBuilder {
        tag: tag.to_string(),
        classes: Vec::new(),
        attrs: Vec::new(),
        text: None,
        children: Vec::new(),
    }
}

impl ElementBuilder {
    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    /// Space-separated class list.
    pub fn class(mut self, classes: &str) -> Self {
        self.classes
            .extend(classes.split_whitespace().map(str::to_string));
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.push((name.to_string(), value.to_string()));
        self
    }

    pub fn value(self, value: &str) -> Self {
        self.attr("value", value)
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn child(mut self, child: ElementBuilder) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = ElementBuilder>) -> Self {
        self.children.extend(children);
        self
    }
}
