//! In-memory element tree standing in for the host document view.
//!
//! Nodes carry the DOM-like properties the viewport engine reads and writes:
//! tag, classes, attributes, inline styles, text and measured sizes. Child-list
//! changes inside observed subtrees are queued as [`MutationRecord`]s and
//! handed out by [`DocumentTree::take_records`], the same shape of signal a
//! browser mutation observer delivers.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use log::trace;

use crate::geometry::Size;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Element {
    tag: String,
    classes: BTreeSet<String>,
    attributes: BTreeMap<String, String>,
    styles: BTreeMap<String, String>,
    text: String,
    /// Natural size of the content, zero until the host has laid it out.
    scroll_size: Size,
    /// Size of the element's own box as laid out by the host.
    client_size: Size,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }

    pub fn styles(&self) -> impl Iterator<Item = (&str, &str)> {
        self.styles.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// One child-list change: `added` and `removed` children of `target`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MutationRecord {
    pub target: NodeId,
    pub added: Vec<NodeId>,
    pub removed: Vec<NodeId>,
}

#[derive(Debug)]
pub struct DocumentTree {
    nodes: HashMap<NodeId, Element>,
    root: NodeId,
    next_id: u64,
    observed: Vec<NodeId>,
    records: Vec<MutationRecord>,
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentTree {
    pub fn new() -> Self {
        let root = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(root, Element::new("body"));
        Self {
            nodes,
            root,
            next_id: 1,
            observed: Vec::new(),
            records: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Creates a detached element. It joins the tree once appended somewhere.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, Element::new(tag));
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Element> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(&id).map(|n| n.tag.as_str())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(&id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Whether `id` is reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.is_inclusive_ancestor(self.root, id)
    }

    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return self.nodes.contains_key(&id);
            }
            current = self.parent(id);
        }
        false
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) -> bool {
        self.nodes
            .get_mut(&id)
            .is_some_and(|n| n.classes.insert(class.to_string()))
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) -> bool {
        self.nodes
            .get_mut(&id)
            .is_some_and(|n| n.classes.remove(class))
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.nodes.get(&id).is_some_and(|n| n.classes.contains(class))
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let Some(n) = self.nodes.get_mut(&id) {
            n.attributes.insert(name.to_string(), value.into());
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes
            .get(&id)
            .and_then(|n| n.attributes.get(name))
            .map(String::as_str)
    }

    pub fn set_style(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let Some(n) = self.nodes.get_mut(&id) {
            n.styles.insert(name.to_string(), value.into());
        }
    }

    pub fn set_styles(&mut self, id: NodeId, styles: &[(&str, &str)]) {
        if let Some(n) = self.nodes.get_mut(&id) {
            for (name, value) in styles {
                n.styles.insert((*name).to_string(), (*value).to_string());
            }
        }
    }

    pub fn remove_style(&mut self, id: NodeId, name: &str) {
        if let Some(n) = self.nodes.get_mut(&id) {
            n.styles.remove(name);
        }
    }

    pub fn style(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes
            .get(&id)
            .and_then(|n| n.styles.get(name))
            .map(String::as_str)
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        if let Some(n) = self.nodes.get_mut(&id) {
            n.text = text.into();
        }
    }

    pub fn text(&self, id: NodeId) -> &str {
        self.nodes.get(&id).map(|n| n.text.as_str()).unwrap_or("")
    }

    pub fn set_scroll_size(&mut self, id: NodeId, size: Size) {
        if let Some(n) = self.nodes.get_mut(&id) {
            n.scroll_size = size;
        }
    }

    pub fn scroll_size(&self, id: NodeId) -> Size {
        self.nodes.get(&id).map(|n| n.scroll_size).unwrap_or(Size::ZERO)
    }

    pub fn set_client_size(&mut self, id: NodeId, size: Size) {
        if let Some(n) = self.nodes.get_mut(&id) {
            n.client_size = size;
        }
    }

    pub fn client_size(&self, id: NodeId) -> Size {
        self.nodes.get(&id).map(|n| n.client_size).unwrap_or(Size::ZERO)
    }

    /// Appends `child` to `parent`, moving it out of its previous parent.
    ///
    /// Returns `false` if either node is missing or the move would create a cycle.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if !self.can_adopt(parent, child) {
            return false;
        }
        self.detach(child);
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(child);
        }
        if let Some(c) = self.nodes.get_mut(&child) {
            c.parent = Some(parent);
        }
        self.record(parent, vec![child], Vec::new());
        true
    }

    /// Inserts `child` into `parent` right before `reference`, or at the end if
    /// `reference` is not a child of `parent`.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) -> bool {
        if child == reference || !self.can_adopt(parent, child) {
            return false;
        }
        self.detach(child);
        if let Some(p) = self.nodes.get_mut(&parent) {
            match p.children.iter().position(|c| *c == reference) {
                Some(idx) => p.children.insert(idx, child),
                None => p.children.push(child),
            }
        }
        if let Some(c) = self.nodes.get_mut(&child) {
            c.parent = Some(parent);
        }
        self.record(parent, vec![child], Vec::new());
        true
    }

    /// Puts `new` in the place of `old` and drops `old` with its subtree.
    pub fn replace_with(&mut self, old: NodeId, new: NodeId) -> bool {
        let Some(parent) = self.parent(old) else {
            return false;
        };
        if old == new || !self.can_adopt(parent, new) || self.is_inclusive_ancestor(new, old) {
            return false;
        }
        self.detach(new);
        if let Some(p) = self.nodes.get_mut(&parent) {
            if let Some(idx) = p.children.iter().position(|c| *c == old) {
                p.children[idx] = new;
            }
        }
        if let Some(n) = self.nodes.get_mut(&new) {
            n.parent = Some(parent);
        }
        self.record(parent, vec![new], vec![old]);
        self.drop_subtree(old);
        true
    }

    /// Detaches `id` from the tree and drops it with its subtree.
    pub fn remove(&mut self, id: NodeId) -> bool {
        if id == self.root || !self.contains(id) {
            return false;
        }
        self.detach(id);
        self.drop_subtree(id);
        true
    }

    pub fn clear_children(&mut self, parent: NodeId) {
        let children = self.children(parent).to_vec();
        if children.is_empty() {
            return;
        }
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.clear();
        }
        self.record(parent, Vec::new(), children.clone());
        for child in children {
            self.drop_subtree(child);
        }
    }

    /// Pre-order walk of `id` and everything below it.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.contains(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            for child in self.children(current).iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    /// Descendants of `root` (excluding `root`) carrying `class`, in document order.
    pub fn descendants_with_class(&self, root: NodeId, class: &str) -> Vec<NodeId> {
        self.subtree(root)
            .into_iter()
            .skip(1)
            .filter(|id| self.has_class(*id, class))
            .collect()
    }

    pub fn first_descendant_with_class(&self, root: NodeId, class: &str) -> Option<NodeId> {
        self.subtree(root)
            .into_iter()
            .skip(1)
            .find(|id| self.has_class(*id, class))
    }

    pub fn children_with_class(&self, id: NodeId, class: &str) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|c| self.has_class(*c, class))
            .collect()
    }

    /// First node in `root`'s subtree whose `id` attribute equals `value`.
    pub fn element_by_id(&self, root: NodeId, value: &str) -> Option<NodeId> {
        self.subtree(root)
            .into_iter()
            .find(|id| self.attribute(*id, "id") == Some(value))
    }

    /// Starts recording child-list changes anywhere inside `root`.
    pub fn observe(&mut self, root: NodeId) {
        if !self.observed.contains(&root) {
            trace!(root = root.to_string(); "Observing subtree");
            self.observed.push(root);
        }
    }

    pub fn disconnect(&mut self, root: NodeId) {
        self.observed.retain(|r| *r != root);
    }

    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.records)
    }

    pub fn has_pending_records(&self) -> bool {
        !self.records.is_empty()
    }

    fn can_adopt(&self, parent: NodeId, child: NodeId) -> bool {
        self.contains(parent)
            && self.contains(child)
            && child != self.root
            && !self.is_inclusive_ancestor(child, parent)
    }

    fn detach(&mut self, id: NodeId) {
        let Some(old_parent) = self.parent(id) else {
            return;
        };
        if let Some(p) = self.nodes.get_mut(&old_parent) {
            p.children.retain(|c| *c != id);
        }
        if let Some(n) = self.nodes.get_mut(&id) {
            n.parent = None;
        }
        self.record(old_parent, Vec::new(), vec![id]);
    }

    fn drop_subtree(&mut self, id: NodeId) {
        for node in self.subtree(id) {
            self.nodes.remove(&node);
        }
    }

    fn record(&mut self, target: NodeId, added: Vec<NodeId>, removed: Vec<NodeId>) {
        let observed = self
            .observed
            .iter()
            .any(|root| self.is_inclusive_ancestor(*root, target));
        if observed {
            self.records.push(MutationRecord {
                target,
                added,
                removed,
            });
        }
    }
}
