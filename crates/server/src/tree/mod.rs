//! Generic owning n-ary tree backed by a slab arena.
//!
//! Nodes are addressed through stable [`NodeId`] handles; parent and sibling
//! links are plain handles rewired on every structural mutation, so growing
//! the arena never invalidates anything and nodes cannot be copied out from
//! under their links.

mod leaves;

pub use leaves::Leaves;

/// Stable handle to a node in a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
struct NodeData<T> {
    data: T,
    parent: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    next_sibling: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug)]
enum Slot<T> {
    Occupied(NodeData<T>),
    Vacant { next_free: Option<usize> },
}

/// Owning n-ary tree with leaf-order iteration.
///
/// A node is a leaf while it has no children and internal otherwise. Handles
/// of removed nodes are stale; using one is a programmer error and panics.
#[derive(Debug)]
pub struct Tree<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<usize>,
    root: NodeId,
}

impl<T> Tree<T> {
    /// Create a tree holding a single root node.
    pub fn new(data: T) -> Self {
        Self {
            slots: vec![Slot::Occupied(NodeData {
                data,
                parent: None,
                prev_sibling: None,
                next_sibling: None,
                children: Vec::new(),
            })],
            free_head: None,
            root: NodeId(0),
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    fn node(&self, id: NodeId) -> &NodeData<T> {
        match &self.slots[id.0] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => panic!("stale node id {:?}", id),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData<T> {
        match &mut self.slots[id.0] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => panic!("stale node id {:?}", id),
        }
    }

    /// Payload of `id`.
    #[inline]
    pub fn data(&self, id: NodeId) -> &T {
        &self.node(id).data
    }

    /// Mutable payload of `id`.
    #[inline]
    pub fn data_mut(&mut self, id: NodeId) -> &mut T {
        &mut self.node_mut(id).data
    }

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    #[inline]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next_sibling
    }

    #[inline]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prev_sibling
    }

    /// Flat view of the direct children of `id`.
    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    #[inline]
    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.node(id).children.is_empty()
    }

    fn alloc(&mut self, node: NodeData<T>) -> NodeId {
        match self.free_head {
            Some(index) => {
                let next_free = match self.slots[index] {
                    Slot::Vacant { next_free } => next_free,
                    Slot::Occupied(_) => panic!("free list points at an occupied slot"),
                };
                self.free_head = next_free;
                self.slots[index] = Slot::Occupied(node);
                NodeId(index)
            }
            None => {
                self.slots.push(Slot::Occupied(node));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    fn release(&mut self, id: NodeId) {
        self.slots[id.0] = Slot::Vacant {
            next_free: self.free_head,
        };
        self.free_head = Some(id.0);
    }

    /// Append a new child under `parent`, wired after the current last
    /// child. Returns the handle of the new node.
    pub fn push_child(&mut self, parent: NodeId, data: T) -> NodeId {
        let prev_sibling = self.node(parent).children.last().copied();
        let id = self.alloc(NodeData {
            data,
            parent: Some(parent),
            prev_sibling,
            next_sibling: None,
            children: Vec::new(),
        });
        if let Some(prev) = prev_sibling {
            self.node_mut(prev).next_sibling = Some(id);
        }
        self.node_mut(parent).children.push(id);
        id
    }

    /// Remove `child` and its whole subtree from `parent`, by identity.
    ///
    /// The sibling links of the surviving children are rewired. Returns
    /// `false` when `child` is not a direct child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let Some(index) = self.node(parent).children.iter().position(|&c| c == child) else {
            return false;
        };
        self.node_mut(parent).children.remove(index);

        let (prev, next) = {
            let node = self.node(child);
            (node.prev_sibling, node.next_sibling)
        };
        if let Some(prev) = prev {
            self.node_mut(prev).next_sibling = next;
        }
        if let Some(next) = next {
            self.node_mut(next).prev_sibling = prev;
        }

        self.release_subtree(child);
        true
    }

    fn release_subtree(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.node_mut(id).children);
        for child in children {
            self.release_subtree(child);
        }
        self.release(id);
    }

    /// First leaf reachable by descending into first children.
    pub fn first_leaf(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(&first) = self.node(current).children.first() {
            current = first;
        }
        current
    }

    /// Last leaf reachable by descending into last children.
    pub fn last_leaf(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(&last) = self.node(current).children.last() {
            current = last;
        }
        current
    }

    /// Iterate the leaf nodes of the subtree rooted at `id`, left to right.
    ///
    /// Internal nodes are never yielded. A leaf subtree root yields exactly
    /// itself.
    pub fn leaves(&self, id: NodeId) -> Leaves<'_, T> {
        Leaves::new(self, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// root {a {a1, a2}, b, c {c1}}
    fn sample() -> (Tree<&'static str>, [NodeId; 7]) {
        let mut tree = Tree::new("root");
        let root = tree.root();
        let a = tree.push_child(root, "a");
        let a1 = tree.push_child(a, "a1");
        let a2 = tree.push_child(a, "a2");
        let b = tree.push_child(root, "b");
        let c = tree.push_child(root, "c");
        let c1 = tree.push_child(c, "c1");
        (tree, [root, a, a1, a2, b, c, c1])
    }

    #[test]
    fn test_push_child_wires_siblings() {
        let (tree, [root, a, a1, a2, b, c, _]) = sample();

        assert_eq!(&[a, b, c], tree.children(root));
        assert_eq!(None, tree.prev_sibling(a));
        assert_eq!(Some(b), tree.next_sibling(a));
        assert_eq!(Some(a), tree.prev_sibling(b));
        assert_eq!(Some(c), tree.next_sibling(b));
        assert_eq!(None, tree.next_sibling(c));

        assert_eq!(Some(root), tree.parent(a));
        assert_eq!(Some(a), tree.parent(a1));
        assert_eq!(Some(a2), tree.next_sibling(a1));
    }

    #[test]
    fn test_leaf_iteration_order() {
        let (tree, [root, a, a1, a2, b, _, c1]) = sample();

        let forward: Vec<NodeId> = tree.leaves(root).collect();
        assert_eq!(vec![a1, a2, b, c1], forward);

        let backward: Vec<NodeId> = tree.leaves(root).rev().collect();
        assert_eq!(vec![c1, b, a2, a1], backward);

        // Subtree iteration stays inside the subtree.
        let under_a: Vec<NodeId> = tree.leaves(a).collect();
        assert_eq!(vec![a1, a2], under_a);
    }

    #[test]
    fn test_leaf_iteration_single_node() {
        let (tree, [_, _, a1, ..]) = sample();
        // A leaf subtree root yields exactly itself, not its outer siblings.
        assert_eq!(vec![a1], tree.leaves(a1).collect::<Vec<_>>());

        let lone = Tree::new(0);
        assert_eq!(vec![lone.root()], lone.leaves(lone.root()).collect::<Vec<_>>());
    }

    #[test]
    fn test_remove_child_rewires_siblings() {
        let (mut tree, [root, a, a1, a2, b, c, c1]) = sample();

        assert!(tree.remove_child(root, b));
        assert_eq!(&[a, c], tree.children(root));
        assert_eq!(Some(c), tree.next_sibling(a));
        assert_eq!(Some(a), tree.prev_sibling(c));
        assert_eq!(vec![a1, a2, c1], tree.leaves(root).collect::<Vec<_>>());

        // Not a direct child anymore.
        assert!(!tree.remove_child(root, b));
        assert!(!tree.remove_child(root, a1));
    }

    #[test]
    fn test_remove_child_frees_subtree() {
        let (mut tree, [root, a, _, _, b, c, _]) = sample();

        assert!(tree.remove_child(root, a));
        assert_eq!(vec![b, c], tree.children(root).to_vec());
        assert_eq!(b, tree.first_leaf(root));
    }

    #[test]
    #[should_panic(expected = "stale node id")]
    fn test_stale_id_panics() {
        let (mut tree, [root, _, _, _, b, _, _]) = sample();
        tree.remove_child(root, b);
        tree.data(b);
    }

    #[test]
    fn test_data_mut() {
        let (mut tree, [_, _, a1, ..]) = sample();
        *tree.data_mut(a1) = "renamed";
        assert_eq!("renamed", *tree.data(a1));
    }
}
