// src/tracker.rs
//! Content-addressed tracking of rendered batches. Every output node is
//! stamped with its origin id and position, and the tracker keeps its own
//! origin → nodes index so purging a batch is O(batch size) instead of a
//! tree scan.

use std::collections::HashMap;

use uuid::Uuid;

use crate::document::{Document, NodeId};

/// Attribute carrying the origin id of the declaration site that produced
/// a node. Consumers may query the document by this attribute to locate a
/// batch atomically.
pub const ORIGIN_ATTR: &str = "data-from_uuid";
/// Attribute carrying the node's zero-based ordinal within its batch.
pub const INDEX_ATTR: &str = "data-from_index";

#[derive(Debug, Default)]
pub struct RenderTracker {
    owned: HashMap<Uuid, Vec<NodeId>>,
}

impl RenderTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp `node` with the origin id and position index and record it in
    /// the index. Call before insertion.
    pub fn tag(&mut self, doc: &mut Document, node: NodeId, origin: Uuid, index: usize) {
        doc.set_attr(node, ORIGIN_ATTR, &origin.to_string());
        doc.set_attr(node, INDEX_ATTR, &index.to_string());
        self.owned.entry(origin).or_default().push(node);
    }

    /// Remove every node owned by `origin` from the document and forget the
    /// batch. Safe to call when the origin owns nothing.
    pub fn purge(&mut self, doc: &mut Document, origin: Uuid) -> usize {
        let Some(nodes) = self.owned.remove(&origin) else {
            return 0;
        };
        let mut removed = 0;
        for node in nodes {
            if doc.contains(node) {
                doc.remove_subtree(node);
                removed += 1;
            }
        }
        removed
    }

    /// Number of nodes currently recorded for `origin`.
    pub fn owned_count(&self, origin: Uuid) -> usize {
        self.owned.get(&origin).map(Vec::len).unwrap_or(0)
    }
}
