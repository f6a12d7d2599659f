//! # Document tree
//! Arena-backed element tree standing in for the host document: every mutation
//! the pipeline performs (tagging, purging, inserting) targets this structure.
//! Handles are plain indices; freed slots are recycled through a free pool so
//! long-lived documents with frequent re-renders do not grow unbounded.

use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Copyable handle to a node slot. Stale handles (after `remove_subtree`)
/// resolve to nothing; reads return defaults and writes are no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
struct Node {
    tag: String,
    attrs: BTreeMap<String, String>,
    text: String,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl Node {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: BTreeMap::new(),
            text: String::new(),
            children: Vec::new(),
            parent: None,
        }
    }
}

#[derive(Debug)]
pub struct Document {
    slots: Vec<Option<Node>>,
    free: Vec<usize>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Fresh document with a single `body` root.
    pub fn new() -> Self {
        let mut doc = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId(0),
        };
        doc.root = doc.alloc(Node::new("body"));
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        if let Some(i) = self.free.pop() {
            self.slots[i] = Some(node);
            NodeId(i)
        } else {
            self.slots.push(Some(node));
            NodeId(self.slots.len() - 1)
        }
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.0).and_then(|s| s.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots.get_mut(id.0).and_then(|s| s.as_mut())
    }

    /// Allocate a detached element; it joins the tree via `append_child`
    /// or `insert_after`.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(Node::new(tag))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn tag(&self, id: NodeId) -> &str {
        self.node(id).map(|n| n.tag.as_str()).unwrap_or("")
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(n) = self.node_mut(id) {
            n.attrs.insert(name.to_string(), value.to_string());
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id).and_then(|n| n.attrs.get(name)).map(|s| s.as_str())
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(n) = self.node_mut(id) {
            n.attrs.remove(name);
        }
    }

    pub fn set_text(&mut self, id: NodeId, text: &str) {
        if let Some(n) = self.node_mut(id) {
            n.text = text.to_string();
        }
    }

    pub fn text(&self, id: NodeId) -> &str {
        self.node(id).map(|n| n.text.as_str()).unwrap_or("")
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Append `child` as the last child of `parent`, detaching it from any
    /// previous position first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if self.node(parent).is_none() || self.node(child).is_none() {
            return;
        }
        self.detach(child);
        if let Some(p) = self.node_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.node_mut(child) {
            c.parent = Some(parent);
        }
    }

    /// Insert `node` as the next sibling of `anchor`. The anchor must be
    /// attached; otherwise this is a no-op.
    pub fn insert_after(&mut self, anchor: NodeId, node: NodeId) {
        let Some(parent) = self.parent(anchor) else {
            return;
        };
        if self.node(node).is_none() {
            return;
        }
        self.detach(node);
        if let Some(p) = self.node_mut(parent) {
            let pos = p.children.iter().position(|&c| c == anchor);
            match pos {
                Some(i) => p.children.insert(i + 1, node),
                None => p.children.push(node),
            }
        }
        if let Some(n) = self.node_mut(node) {
            n.parent = Some(parent);
        }
    }

    /// Insert `nodes` directly after `anchor`, preserving slice order.
    /// Equivalent to building a fragment and inserting it once.
    pub fn insert_fragment_after(&mut self, anchor: NodeId, nodes: &[NodeId]) {
        let mut cursor = anchor;
        for &n in nodes {
            self.insert_after(cursor, n);
            cursor = n;
        }
    }

    fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|&c| c != id);
        }
        if let Some(n) = self.node_mut(id) {
            n.parent = None;
        }
    }

    /// Remove a node and everything below it, recycling their slots.
    /// Calling with a stale handle is a no-op.
    pub fn remove_subtree(&mut self, id: NodeId) {
        if self.node(id).is_none() {
            return;
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            if let Some(node) = self.slots[cur.0].take() {
                stack.extend(node.children);
                self.free.push(cur.0);
            }
        }
    }

    /// Walk the tree from the root collecting nodes whose attribute `name`
    /// equals `value`, in document order. Consumers of rendered output may
    /// locate a batch this way; the pipeline itself goes through the tracker
    /// index instead.
    pub fn find_by_attr(&self, name: &str, value: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(cur) = stack.pop() {
            if self.attr(cur, name) == Some(value) {
                out.push(cur);
            }
            // push in reverse so document order pops first
            for &c in self.children(cur).iter().rev() {
                stack.push(c);
            }
        }
        out
    }

    /// Serialize the subtree as HTML. Text and attribute values are
    /// entity-escaped; an empty attribute value renders as a bare name
    /// (`hidden` rather than `hidden=""`).
    pub fn to_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let Some(n) = self.node(id) else {
            return;
        };
        out.push('<');
        out.push_str(&n.tag);
        for (name, value) in &n.attrs {
            if value.is_empty() {
                let _ = write!(out, " {name}");
            } else {
                let _ = write!(
                    out,
                    " {name}=\"{}\"",
                    html_escape::encode_double_quoted_attribute(value)
                );
            }
        }
        out.push('>');
        out.push_str(&html_escape::encode_text(&n.text));
        for &c in &n.children {
            self.write_html(c, out);
        }
        let _ = write!(out, "</{}>", n.tag);
    }
}
