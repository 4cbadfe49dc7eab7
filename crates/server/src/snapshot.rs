//! JSON snapshots of the object store and the index shape.
//!
//! Debug tooling and external dumps consume these; the object half of a
//! snapshot can rebuild an [`ObjectManager`] that keeps allocating ids where
//! the source left off.

use serde::{Deserialize, Serialize};

use geom::Volume;

use crate::object::{Object, ObjectId, ObjectManager};
use crate::spatial::{NodeContent, Quadtree};
use crate::tree::{NodeId, Tree};

/// Snapshot of one quadtree node and its subtree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub region: Volume,
    pub ids: Vec<ObjectId>,
    pub depth: usize,
    pub children: Vec<NodeSnapshot>,
}

/// Point-in-time copy of everything the index tracks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub objects: Vec<(ObjectId, Object)>,
    pub tree: NodeSnapshot,
}

impl Snapshot {
    /// Capture the live state of `quadtree`. Objects are sorted by id.
    pub fn capture(quadtree: &Quadtree) -> Self {
        let mut objects: Vec<(ObjectId, Object)> = quadtree
            .objects()
            .iter()
            .map(|(id, obj)| (id, *obj))
            .collect();
        objects.sort_unstable_by_key(|(id, _)| *id);
        Self {
            objects,
            tree: dump_node(quadtree.tree(), quadtree.root()),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Rebuild an object store from the snapshotted records.
    pub fn restore_objects(&self) -> ObjectManager {
        ObjectManager::from_entries(self.objects.iter().copied())
    }
}

fn dump_node(tree: &Tree<NodeContent>, node: NodeId) -> NodeSnapshot {
    let content = tree.data(node);
    NodeSnapshot {
        region: content.region,
        ids: content.ids.clone(),
        depth: content.depth,
        children: tree
            .children(node)
            .iter()
            .map(|&child| dump_node(tree, child))
            .collect(),
    }
}
