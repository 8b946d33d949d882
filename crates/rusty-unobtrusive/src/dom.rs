// File: src/dom.rs
// Purpose: Headless document model with live form state and mutation records

use indexmap::IndexMap;
use scraper::{ElementRef, Html, Node as HtmlNode};

use crate::error::DomError;

/// Handle to a node in a [`Document`]. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// An element with its attributes and live form state
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attrs: IndexMap<String, String>,
    /// Current value (what the user typed), seeded from markup
    pub value: String,
    /// Current checked state for checkboxes and radios
    pub checked: bool,
}

impl Element {
    pub fn new(tag: &str, attrs: IndexMap<String, String>) -> Self {
        let value = attrs.get("value").cloned().unwrap_or_default();
        let checked = attrs.contains_key("checked");
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs,
            value,
            checked,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// The `name` attribute, if present and non-empty
    pub fn name(&self) -> Option<&str> {
        self.attr("name").filter(|n| !n.is_empty())
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id").filter(|n| !n.is_empty())
    }

    /// Lower-case `type` of an input (`text` when absent)
    pub fn input_type(&self) -> String {
        match self.tag.as_str() {
            "input" => self
                .attr("type")
                .map(str::to_ascii_lowercase)
                .unwrap_or_else(|| "text".to_string()),
            "select" => "select".to_string(),
            "textarea" => "textarea".to_string(),
            _ => String::new(),
        }
    }

    /// Elements that carry a form value
    pub fn is_input_capable(&self) -> bool {
        matches!(self.tag.as_str(), "input" | "select" | "textarea")
    }

    pub fn is_checkbox(&self) -> bool {
        self.tag == "input" && self.input_type() == "checkbox"
    }

    pub fn is_radio(&self) -> bool {
        self.tag == "input" && self.input_type() == "radio"
    }

    pub fn is_checkable(&self) -> bool {
        self.is_checkbox() || self.is_radio()
    }

    pub fn classes(&self) -> Vec<&str> {
        self.attr("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    detached: bool,
}

/// Structural change record, drained by observers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Inserted { parent: NodeId, nodes: Vec<NodeId> },
    Removed { parent: Option<NodeId>, node: NodeId },
}

/// Arena-backed document.
///
/// Only `insert_html` and `remove` are recorded as mutations; attribute,
/// class, value and rendering changes are not observed.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    mutations: Vec<Mutation>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Empty document holding only the root node
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
                detached: false,
            }],
            mutations: Vec::new(),
        }
    }

    /// Parse a full HTML document
    pub fn parse(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        let mut doc = Self::new();
        let root = doc.root();
        doc.import_element(root, parsed.root_element());
        doc
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn data(&self, id: NodeId) -> Result<&NodeData, DomError> {
        self.nodes.get(id.0).ok_or(DomError::UnknownNode(id))
    }

    fn push(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: Some(parent),
            children: Vec::new(),
            detached: false,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    fn import_element(&mut self, parent: NodeId, element: ElementRef<'_>) -> NodeId {
        let source = element.value();
        let attrs = source
            .attrs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let id = self.push(parent, NodeKind::Element(Element::new(source.name(), attrs)));

        for child in element.children() {
            if let Some(child_element) = ElementRef::wrap(child) {
                self.import_element(id, child_element);
            } else if let HtmlNode::Text(text) = child.value() {
                let text: &str = text;
                self.push(id, NodeKind::Text(text.to_string()));
            }
        }

        self.seed_live_state(id);
        id
    }

    /// Textareas take their text as value, selects their selected option
    fn seed_live_state(&mut self, id: NodeId) {
        let tag = match self.element(id) {
            Some(el) => el.tag.clone(),
            None => return,
        };
        let seeded = match tag.as_str() {
            "textarea" => Some(self.text(id)),
            "select" => {
                let options: Vec<NodeId> = self
                    .descendants(id)
                    .into_iter()
                    .filter(|n| self.element(*n).is_some_and(|e| e.tag == "option"))
                    .collect();
                let chosen = options
                    .iter()
                    .find(|n| self.element(**n).is_some_and(|e| e.attrs.contains_key("selected")))
                    .or_else(|| options.first())
                    .copied();
                chosen.map(|opt| self.option_value(opt))
            }
            _ => None,
        };
        if let (Some(value), Some(NodeKind::Element(el))) =
            (seeded, self.nodes.get_mut(id.0).map(|n| &mut n.kind))
        {
            el.value = value;
        }
    }

    fn option_value(&self, option: NodeId) -> String {
        match self.element(option).and_then(|e| e.attr("value")) {
            Some(v) => v.to_string(),
            None => self.text(option).trim().to_string(),
        }
    }

    /// Parse an HTML fragment and append it under `parent`.
    ///
    /// Recorded as [`Mutation::Inserted`].
    pub fn insert_html(&mut self, parent: NodeId, html: &str) -> Result<Vec<NodeId>, DomError> {
        let data = self.data(parent)?;
        if data.detached {
            return Err(DomError::Detached(parent));
        }
        if matches!(data.kind, NodeKind::Text(_)) {
            return Err(DomError::NotAnElement(parent));
        }

        let fragment = Html::parse_fragment(html);
        let mut inserted = Vec::new();
        for child in fragment.root_element().children() {
            if let Some(child_element) = ElementRef::wrap(child) {
                inserted.push(self.import_element(parent, child_element));
            } else if let HtmlNode::Text(text) = child.value() {
                let text: &str = text;
                inserted.push(self.push(parent, NodeKind::Text(text.to_string())));
            }
        }

        if !inserted.is_empty() {
            self.mutations.push(Mutation::Inserted {
                parent,
                nodes: inserted.clone(),
            });
        }
        Ok(inserted)
    }

    /// Detach a node and its subtree. Recorded as [`Mutation::Removed`].
    pub fn remove(&mut self, node: NodeId) -> Result<(), DomError> {
        let data = self.data(node)?;
        if data.detached {
            return Err(DomError::Detached(node));
        }
        let parent = data.parent.ok_or(DomError::NotAnElement(node))?;
        self.nodes[parent.0].children.retain(|c| *c != node);

        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            self.nodes[current.0].detached = true;
            stack.extend(self.nodes[current.0].children.iter().copied());
        }

        self.mutations.push(Mutation::Removed {
            parent: Some(parent),
            node,
        });
        Ok(())
    }

    /// Drain recorded structural mutations
    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.mutations)
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id.0).map(|n| &n.kind)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.kind(id) {
            Some(NodeKind::Element(el)) => Some(el),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut Element, DomError> {
        match self.nodes.get_mut(id.0).map(|n| &mut n.kind) {
            Some(NodeKind::Element(el)) => Ok(el),
            Some(_) => Err(DomError::NotAnElement(id)),
            None => Err(DomError::UnknownNode(id)),
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        self.nodes.get(id.0).is_some_and(|n| !n.detached)
    }

    /// Descendants of `id` in document order, excluding `id`
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Whether `node` is `ancestor` or lies inside it
    pub fn is_within(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Attached `<form>` elements in document order
    pub fn forms(&self) -> Vec<NodeId> {
        self.forms_within(self.root())
    }

    /// `<form>` elements at or below `scope`
    pub fn forms_within(&self, scope: NodeId) -> Vec<NodeId> {
        std::iter::once(scope)
            .chain(self.descendants(scope))
            .filter(|id| self.is_attached(*id))
            .filter(|id| self.element(*id).is_some_and(|e| e.tag == "form"))
            .collect()
    }

    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|n| self.element(*n).and_then(Element::id) == Some(id))
    }

    /// Nearest element with `tag`, starting at `id` itself
    pub fn closest(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.element(node).is_some_and(|e| e.tag == tag) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    pub fn closest_form(&self, id: NodeId) -> Option<NodeId> {
        self.closest(id, "form")
    }

    /// Input-capable elements below `scope` carrying `name`
    pub fn elements_named(&self, scope: NodeId, name: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|n| {
                self.element(*n)
                    .is_some_and(|e| e.is_input_capable() && e.name() == Some(name))
            })
            .collect()
    }

    /// Elements below `scope` whose `attr` equals `value`
    pub fn find_by_attr(&self, scope: NodeId, attr: &str, value: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|n| self.element(*n).and_then(|e| e.attr(attr)) == Some(value))
            .collect()
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.attr(name))
    }

    /// Concatenated text of the subtree
    pub fn text(&self, id: NodeId) -> String {
        self.descendants(id)
            .into_iter()
            .filter_map(|n| match self.kind(n) {
                Some(NodeKind::Text(t)) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Hidden inputs, `hidden` attributes, or inline `display:none` up the tree
    pub fn is_hidden(&self, id: NodeId) -> bool {
        if self
            .element(id)
            .is_some_and(|e| e.tag == "input" && e.input_type() == "hidden")
        {
            return true;
        }
        let mut current = Some(id);
        while let Some(node) = current {
            if let Some(el) = self.element(node) {
                if el.attrs.contains_key("hidden") {
                    return true;
                }
                if let Some(style) = el.attr("style") {
                    let compact: String = style.chars().filter(|c| !c.is_whitespace()).collect();
                    if compact.to_ascii_lowercase().contains("display:none") {
                        return true;
                    }
                }
            }
            current = self.parent(node);
        }
        false
    }

    pub fn set_value(&mut self, id: NodeId, value: &str) -> Result<(), DomError> {
        self.element_mut(id)?.value = value.to_string();
        Ok(())
    }

    /// Check or uncheck; checking a radio unchecks the rest of its group
    pub fn set_checked(&mut self, id: NodeId, checked: bool) -> Result<(), DomError> {
        let (is_radio, name) = {
            let el = self.element_mut(id)?;
            el.checked = checked;
            (el.is_radio(), el.name().map(str::to_string))
        };
        if is_radio && checked {
            if let Some(name) = name {
                let scope = self.closest_form(id).unwrap_or(self.root());
                for other in self.elements_named(scope, &name) {
                    if other != id {
                        self.element_mut(other)?.checked = false;
                    }
                }
            }
        }
        Ok(())
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.element_mut(id)?
            .attrs
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id).is_some_and(|e| e.classes().contains(&class))
    }

    /// The raw `class` attribute (empty when absent)
    pub fn class_name(&self, id: NodeId) -> String {
        self.attr(id, "class").unwrap_or_default().to_string()
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) -> Result<(), DomError> {
        let el = self.element_mut(id)?;
        let mut classes: Vec<String> = el.classes().iter().map(|c| c.to_string()).collect();
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
        }
        el.attrs.insert("class".to_string(), classes.join(" "));
        Ok(())
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) -> Result<(), DomError> {
        let el = self.element_mut(id)?;
        if !el.attrs.contains_key("class") {
            return Ok(());
        }
        let classes: Vec<String> = el
            .classes()
            .into_iter()
            .filter(|c| *c != class)
            .map(str::to_string)
            .collect();
        el.attrs.insert("class".to_string(), classes.join(" "));
        Ok(())
    }

    /// Detach every child of `id` without recording mutations
    pub fn clear_children(&mut self, id: NodeId) -> Result<(), DomError> {
        self.element_mut(id)?;
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for child in children {
            let mut stack = vec![child];
            while let Some(current) = stack.pop() {
                self.nodes[current.0].detached = true;
                stack.extend(self.nodes[current.0].children.iter().copied());
            }
        }
        Ok(())
    }

    /// Append a new element, optionally with text content
    pub fn append_element(
        &mut self,
        parent: NodeId,
        tag: &str,
        attrs: &[(&str, &str)],
        text: Option<&str>,
    ) -> Result<NodeId, DomError> {
        if !self.is_attached(parent) {
            return Err(DomError::Detached(parent));
        }
        self.element_mut(parent)?;
        let attrs = attrs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let id = self.push(parent, NodeKind::Element(Element::new(tag, attrs)));
        if let Some(text) = text {
            self.push(id, NodeKind::Text(text.to_string()));
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"
        <html><body>
          <form id="f">
            <input id="a" name="A" value="one" class="form-control">
            <textarea id="t" name="T">hello</textarea>
            <select id="s" name="S"><option value="x">X</option><option value="y" selected>Y</option></select>
            <input type="radio" id="r1" name="R" value="1" checked>
            <input type="radio" id="r2" name="R" value="2">
            <div style="display: none"><input id="h" name="H"></div>
          </form>
        </body></html>
    "#;

    #[test]
    fn test_parse_seeds_live_state() {
        let doc = Document::parse(PAGE);
        let value = |id: &str| doc.element(doc.element_by_id(id).unwrap()).unwrap().value.clone();
        assert_eq!(value("a"), "one");
        assert_eq!(value("t"), "hello");
        assert_eq!(value("s"), "y");
        assert!(doc.element(doc.element_by_id("r1").unwrap()).unwrap().checked);
    }

    #[test]
    fn test_radio_group_is_exclusive() {
        let mut doc = Document::parse(PAGE);
        let r1 = doc.element_by_id("r1").unwrap();
        let r2 = doc.element_by_id("r2").unwrap();
        doc.set_checked(r2, true).unwrap();
        assert!(!doc.element(r1).unwrap().checked);
        assert!(doc.element(r2).unwrap().checked);
    }

    #[test]
    fn test_hidden_detection() {
        let doc = Document::parse(PAGE);
        assert!(doc.is_hidden(doc.element_by_id("h").unwrap()));
        assert!(!doc.is_hidden(doc.element_by_id("a").unwrap()));
    }

    #[test]
    fn test_class_manipulation() {
        let mut doc = Document::parse(PAGE);
        let a = doc.element_by_id("a").unwrap();
        doc.add_class(a, "input-validation-error").unwrap();
        doc.add_class(a, "input-validation-error").unwrap();
        assert_eq!(doc.class_name(a), "form-control input-validation-error");
        doc.remove_class(a, "form-control").unwrap();
        assert_eq!(doc.class_name(a), "input-validation-error");
    }

    #[test]
    fn test_insert_and_remove_record_mutations() {
        let mut doc = Document::parse(PAGE);
        let form = doc.element_by_id("f").unwrap();
        let nodes = doc.insert_html(form, r#"<input id="n" name="N">"#).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(doc.closest_form(nodes[0]), Some(form));

        doc.remove(form).unwrap();
        assert!(!doc.is_attached(nodes[0]));
        assert!(doc.forms().is_empty());

        let mutations = doc.take_mutations();
        assert_eq!(mutations.len(), 2);
        assert!(matches!(mutations[1], Mutation::Removed { node, .. } if node == form));
        assert!(doc.take_mutations().is_empty());
    }

    #[test]
    fn test_append_element_is_not_observed() {
        let mut doc = Document::parse(PAGE);
        let form = doc.element_by_id("f").unwrap();
        let span = doc
            .append_element(form, "span", &[("id", "A-error")], Some("Oops"))
            .unwrap();
        assert_eq!(doc.text(span), "Oops");
        assert!(doc.take_mutations().is_empty());

        doc.clear_children(form).unwrap();
        assert!(doc.element_by_id("A-error").is_none());
    }
}
