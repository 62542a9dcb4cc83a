pub mod skeleton;
pub mod view;

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::lock;
use crate::render::escape_html;

pub use skeleton::site_skeleton;
pub use view::DomView;

/// Window side effects retained for inspection, oldest dropped first
pub const HISTORY_LIMIT: usize = 32;

/// Handle to an element inside a [`Document`]
///
/// Handles to discarded elements go stale: reads return nothing and writes
/// are ignored, even after the slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

#[derive(Debug, Clone, Default)]
struct Element {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    style: BTreeMap<String, String>,
    attrs: BTreeMap<String, String>,
    text: Option<String>,
    inner_html: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    element: Option<Element>,
}

#[derive(Debug)]
struct Tree {
    slots: Vec<Slot>,
    free: Vec<usize>,
    head: NodeId,
    body: NodeId,
    scroll_y: f64,
    scrolled_into_view: VecDeque<NodeId>,
    opened_windows: VecDeque<String>,
    alerts: VecDeque<String>,
}

const ROOT: NodeId = NodeId {
    index: 0,
    generation: 0,
};

fn record<T>(log: &mut VecDeque<T>, entry: T) {
    if log.len() == HISTORY_LIMIT {
        log.pop_front();
    }
    log.push_back(entry);
}

impl Tree {
    fn new() -> Self {
        let mut tree = Self {
            slots: vec![Slot {
                generation: 0,
                element: Some(Element {
                    tag: "html".to_string(),
                    ..Default::default()
                }),
            }],
            free: Vec::new(),
            head: ROOT,
            body: ROOT,
            scroll_y: 0.0,
            scrolled_into_view: VecDeque::new(),
            opened_windows: VecDeque::new(),
            alerts: VecDeque::new(),
        };
        tree.head = tree.create("head");
        tree.append(ROOT, tree.head);
        tree.body = tree.create("body");
        tree.append(ROOT, tree.body);
        tree
    }

    fn create(&mut self, tag: &str) -> NodeId {
        let element = Some(Element {
            tag: tag.to_string(),
            ..Default::default()
        });

        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.element = element;
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    element,
                });
                NodeId {
                    index: self.slots.len() - 1,
                    generation: 0,
                }
            }
        }
    }

    fn node(&self, id: NodeId) -> Option<&Element> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.element.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.element.as_mut())
    }

    fn live_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.node_mut(child).and_then(|el| el.parent.take()) else {
            return;
        };
        if let Some(parent) = self.node_mut(parent) {
            parent.children.retain(|c| *c != child);
        }
    }

    /// Whether `child` can be placed under `parent` without forming a cycle
    fn can_adopt(&self, parent: NodeId, child: NodeId) -> bool {
        self.node(parent).is_some() && self.node(child).is_some() && !self.contains(child, parent)
    }

    fn append(&mut self, parent: NodeId, child: NodeId) {
        if !self.can_adopt(parent, child) {
            return;
        }
        self.detach(child);
        if let Some(el) = self.node_mut(child) {
            el.parent = Some(parent);
        }
        if let Some(el) = self.node_mut(parent) {
            el.children.push(child);
        }
    }

    fn insert_first(&mut self, parent: NodeId, child: NodeId) {
        if !self.can_adopt(parent, child) {
            return;
        }
        self.detach(child);
        if let Some(el) = self.node_mut(child) {
            el.parent = Some(parent);
        }
        if let Some(el) = self.node_mut(parent) {
            el.children.insert(0, child);
        }
    }

    /// Detach `root` and free its whole subtree for reuse
    fn discard(&mut self, root: NodeId) {
        if root == ROOT || root == self.head || root == self.body {
            return;
        }
        self.detach(root);
        for id in self.walk(root) {
            let slot = &mut self.slots[id.index];
            slot.element = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(id.index);
        }
    }

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            let Some(el) = self.node(id) else {
                return false;
            };
            if id == ancestor {
                return true;
            }
            current = el.parent;
        }
        false
    }

    fn is_connected(&self, node: NodeId) -> bool {
        self.contains(ROOT, node)
    }

    /// Live descendants of `root` (inclusive) in document order
    fn walk(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(el) = self.node(id) else {
                continue;
            };
            out.push(id);
            stack.extend(el.children.iter().rev().copied());
        }
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let Some(el) = self.node(id) else {
            return;
        };
        out.push('<');
        out.push_str(&el.tag);
        if let Some(ref element_id) = el.id {
            out.push_str(&format!(r#" id="{}""#, escape_html(element_id)));
        }
        if !el.classes.is_empty() {
            out.push_str(&format!(r#" class="{}""#, escape_html(&el.classes.join(" "))));
        }
        if !el.style.is_empty() {
            let style: Vec<String> = el.style.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
            out.push_str(&format!(r#" style="{}""#, escape_html(&style.join("; "))));
        }
        for (name, value) in &el.attrs {
            out.push_str(&format!(r#" {}="{}""#, name, escape_html(value)));
        }
        out.push('>');

        if let Some(ref html) = el.inner_html {
            out.push_str(html);
        } else if let Some(ref text) = el.text {
            out.push_str(&escape_html(text));
        }
        for child in &el.children {
            self.write_html(*child, out);
        }

        out.push_str(&format!("</{}>", el.tag));
    }
}

/// Minimal in-memory document the page controllers operate on.
///
/// Only what the widget touches is modeled: element ids, classes, inline
/// style, attributes, text or raw markup content, the scroll offset, and the
/// side effects of `window.open` and `alert`. Clones refer to the same tree.
#[derive(Debug, Clone)]
pub struct Document {
    tree: Arc<Mutex<Tree>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            tree: Arc::new(Mutex::new(Tree::new())),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut Tree) -> R) -> R {
        f(&mut lock(&self.tree))
    }

    /// Read from a live element, falling back to the default for stale handles
    fn read<R: Default>(&self, node: NodeId, f: impl FnOnce(&Element) -> R) -> R {
        self.with(|t| t.node(node).map(f).unwrap_or_default())
    }

    /// Mutate a live element; stale handles are ignored
    fn write(&self, node: NodeId, f: impl FnOnce(&mut Element)) {
        self.with(|t| {
            if let Some(el) = t.node_mut(node) {
                f(el);
            }
        });
    }

    pub fn head(&self) -> NodeId {
        self.with(|t| t.head)
    }

    pub fn body(&self) -> NodeId {
        self.with(|t| t.body)
    }

    /// Number of live elements, attached or not
    pub fn node_count(&self) -> usize {
        self.with(|t| t.live_count())
    }

    pub fn create_element(&self, tag: &str) -> NodeId {
        self.with(|t| t.create(tag))
    }

    /// Create an element with optional id and classes and append it to `parent`
    pub fn append_new(&self, parent: NodeId, tag: &str, id: Option<&str>, classes: &[&str]) -> NodeId {
        self.with(|t| {
            let node = t.create(tag);
            if let Some(el) = t.node_mut(node) {
                el.id = id.map(str::to_string);
                el.classes = classes.iter().map(|c| c.to_string()).collect();
            }
            t.append(parent, node);
            node
        })
    }

    pub fn append_child(&self, parent: NodeId, child: NodeId) {
        self.with(|t| t.append(parent, child));
    }

    pub fn insert_first_child(&self, parent: NodeId, child: NodeId) {
        self.with(|t| t.insert_first(parent, child));
    }

    /// Remove an element and everything under it from the document
    pub fn remove(&self, node: NodeId) {
        self.with(|t| t.discard(node));
    }

    /// Remove all children and any raw content
    pub fn clear(&self, node: NodeId) {
        self.with(|t| {
            let children = t.node(node).map(|el| el.children.clone()).unwrap_or_default();
            for child in children {
                t.discard(child);
            }
            if let Some(el) = t.node_mut(node) {
                el.inner_html = None;
                el.text = None;
            }
        });
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.read(node, |el| el.children.clone())
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.read(node, |el| el.parent)
    }

    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.with(|t| t.contains(ancestor, node))
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        self.with(|t| t.is_connected(node))
    }

    pub fn tag(&self, node: NodeId) -> String {
        self.read(node, |el| el.tag.clone())
    }

    pub fn set_id(&self, node: NodeId, id: &str) {
        self.write(node, |el| el.id = Some(id.to_string()));
    }

    /// First connected element carrying `id`
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.with(|t| {
            t.walk(ROOT)
                .into_iter()
                .find(|n| t.node(*n).and_then(|el| el.id.as_deref()) == Some(id))
        })
    }

    /// Connected elements carrying `class`, in document order
    pub fn query_class(&self, class: &str) -> Vec<NodeId> {
        self.query_class_within(ROOT, class)
    }

    /// Descendants of `root` (inclusive) carrying `class`, in document order
    pub fn query_class_within(&self, root: NodeId, class: &str) -> Vec<NodeId> {
        self.with(|t| {
            t.walk(root)
                .into_iter()
                .filter(|n| t.node(*n).is_some_and(|el| el.classes.iter().any(|c| c == class)))
                .collect()
        })
    }

    /// Descendants of `root` (inclusive) with the given tag, in document order
    pub fn query_tag_within(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        self.with(|t| {
            t.walk(root)
                .into_iter()
                .filter(|n| t.node(*n).is_some_and(|el| el.tag == tag))
                .collect()
        })
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.read(node, |el| el.classes.iter().any(|c| c == class))
    }

    pub fn add_class(&self, node: NodeId, class: &str) {
        self.write(node, |el| {
            if !el.classes.iter().any(|c| c == class) {
                el.classes.push(class.to_string());
            }
        });
    }

    pub fn remove_class(&self, node: NodeId, class: &str) {
        self.write(node, |el| el.classes.retain(|c| c != class));
    }

    /// Replace the whole class list from a space-separated string
    pub fn set_class_name(&self, node: NodeId, class_name: &str) {
        self.write(node, |el| {
            el.classes = class_name.split_whitespace().map(str::to_string).collect();
        });
    }

    pub fn class_name(&self, node: NodeId) -> String {
        self.read(node, |el| el.classes.join(" "))
    }

    pub fn set_style(&self, node: NodeId, property: &str, value: &str) {
        self.write(node, |el| {
            el.style.insert(property.to_string(), value.to_string());
        });
    }

    pub fn style(&self, node: NodeId, property: &str) -> Option<String> {
        self.read(node, |el| el.style.get(property).cloned())
    }

    pub fn set_attr(&self, node: NodeId, name: &str, value: &str) {
        self.write(node, |el| {
            el.attrs.insert(name.to_string(), value.to_string());
        });
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        self.read(node, |el| el.attrs.get(name).cloned())
    }

    pub fn set_text(&self, node: NodeId, text: &str) {
        self.write(node, |el| {
            el.inner_html = None;
            el.text = Some(text.to_string());
        });
    }

    pub fn text(&self, node: NodeId) -> Option<String> {
        self.read(node, |el| el.text.clone())
    }

    /// Set raw markup content. The caller is responsible for escaping.
    pub fn set_inner_html(&self, node: NodeId, html: &str) {
        self.write(node, |el| {
            el.text = None;
            el.inner_html = Some(html.to_string());
        });
    }

    pub fn inner_html(&self, node: NodeId) -> Option<String> {
        self.read(node, |el| el.inner_html.clone())
    }

    pub fn outer_html(&self, node: NodeId) -> String {
        self.with(|t| {
            let mut out = String::new();
            t.write_html(node, &mut out);
            out
        })
    }

    pub fn scroll_y(&self) -> f64 {
        self.with(|t| t.scroll_y)
    }

    pub fn scroll_to(&self, y: f64) {
        self.with(|t| t.scroll_y = y);
    }

    pub fn scroll_into_view(&self, node: NodeId) {
        self.with(|t| record(&mut t.scrolled_into_view, node));
    }

    /// Most recent scroll-into-view targets, oldest first
    pub fn scrolled_into_view(&self) -> Vec<NodeId> {
        self.with(|t| t.scrolled_into_view.iter().copied().collect())
    }

    pub fn open_window(&self, url: &str) {
        self.with(|t| record(&mut t.opened_windows, url.to_string()));
    }

    pub fn opened_windows(&self) -> Vec<String> {
        self.with(|t| t.opened_windows.iter().cloned().collect())
    }

    pub fn alert(&self, message: &str) {
        self.with(|t| record(&mut t.alerts, message.to_string()));
    }

    pub fn alerts(&self) -> Vec<String> {
        self.with(|t| t.alerts.iter().cloned().collect())
    }
}
