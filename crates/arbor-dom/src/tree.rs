//! DOM Tree (arena-based allocation)
//!
//! The tree owns every node of every document created in it. Nodes are
//! never freed one by one; dropping the tree drops the whole arena.
//!
//! The link primitives here only repair pointer fields. Ranges and
//! observers are handled by the mutation algorithms built on top.

use std::fmt;

use crate::microtask::{FifoTaskQueue, TaskQueue};
use crate::node::{Node, NodeData, NodeType};
use crate::observer::{CallbackError, MutationObserver, ObserverId};
use crate::range::Range;
use crate::{Atom, Config, NodeId, StringInterner};

/// Arena-based DOM tree and the context its observers run in
pub struct DomTree {
    nodes: Vec<Node>,
    /// Range slots; `None` once detached
    pub(crate) ranges: Vec<Option<Range>>,
    /// Observer slots; `None` once dropped
    pub(crate) observers: Vec<Option<MutationObserver>>,
    /// Observers with records waiting for the next notification pass
    pub(crate) pending_observers: Vec<ObserverId>,
    /// A notification pass is already queued
    pub(crate) notify_scheduled: bool,
    pub(crate) performing_checkpoint: bool,
    pub(crate) tasks: Box<dyn TaskQueue>,
    pub(crate) callback_errors: Vec<CallbackError>,
    interner: StringInterner,
    pub(crate) config: Config,
}

impl DomTree {
    /// Create a new empty DOM tree
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a tree with the given configuration
    pub fn with_config(config: Config) -> Self {
        Self::with_task_queue(config, Box::new(FifoTaskQueue::new()))
    }

    /// Create a tree whose deferred work goes through `tasks`
    pub fn with_task_queue(config: Config, tasks: Box<dyn TaskQueue>) -> Self {
        Self {
            nodes: Vec::new(),
            ranges: Vec::new(),
            observers: Vec::new(),
            pending_observers: Vec::new(),
            notify_scheduled: false,
            performing_checkpoint: false,
            tasks,
            callback_errors: Vec::new(),
            interner: StringInterner::new(),
            config,
        }
    }

    /// Configuration in effect
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Node by ID. Panics if `id` was not created by this tree.
    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Number of nodes in the arena
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the arena is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Store a node; `owner` of `None` makes the node its own document
    pub(crate) fn push_node(&mut self, owner: Option<NodeId>, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(owner.unwrap_or(id), data));
        id
    }

    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    pub(crate) fn intern(&mut self, s: &str) -> Atom {
        self.interner.intern(s)
    }

    #[inline]
    pub fn resolve(&self, atom: Atom) -> &str {
        self.interner.resolve(atom)
    }

    // --- Navigation ---

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    #[inline]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_child
    }

    #[inline]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).last_child
    }

    #[inline]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next_sibling
    }

    #[inline]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prev_sibling
    }

    #[inline]
    pub fn node_type(&self, id: NodeId) -> NodeType {
        self.node(id).node_type()
    }

    #[inline]
    pub fn owner_document(&self, id: NodeId) -> NodeId {
        self.node(id).owner_document
    }

    /// Node length as used by range offsets
    #[inline]
    pub fn length(&self, id: NodeId) -> usize {
        self.node(id).length()
    }

    /// Iterate over the children of a node
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.get(id).and_then(|n| n.first_child),
        }
    }

    /// Iterate from a node up to its root, the node included
    pub fn inclusive_ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: Some(id),
        }
    }

    /// Descendants of `root` in tree order, `root` excluded
    pub fn descendants(&self, root: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            root,
            next: self.first_child(root),
        }
    }

    /// Root of the tree containing `id`
    pub fn root(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    /// Position of a node among its siblings
    pub fn index(&self, id: NodeId) -> usize {
        let mut index = 0;
        let mut current = self.prev_sibling(id);
        while let Some(prev) = current {
            index += 1;
            current = self.prev_sibling(prev);
        }
        index
    }

    /// True if `ancestor` is `node` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.inclusive_ancestors(node).any(|id| id == ancestor)
    }

    /// Node following `id` in tree order, staying within `root`
    pub(crate) fn following(&self, id: NodeId, root: NodeId) -> Option<NodeId> {
        if let Some(child) = self.first_child(id) {
            return Some(child);
        }
        let mut current = id;
        loop {
            if current == root {
                return None;
            }
            if let Some(next) = self.next_sibling(current) {
                return Some(next);
            }
            current = self.parent(current)?;
        }
    }

    pub fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.prev_sibling(id);
        while let Some(prev) = current {
            if self.node(prev).is_element() {
                return Some(prev);
            }
            current = self.prev_sibling(prev);
        }
        None
    }

    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.next_sibling(id);
        while let Some(next) = current {
            if self.node(next).is_element() {
                return Some(next);
            }
            current = self.next_sibling(next);
        }
        None
    }

    // --- Primitives ---

    /// Link `node` into `parent` before `before` (or last).
    ///
    /// `node` must be parentless and `before` a child of `parent`.
    pub(crate) fn link_child(&mut self, parent: NodeId, node: NodeId, before: Option<NodeId>) {
        debug_assert!(self.parent(node).is_none());
        let prev = match before {
            Some(before) => self.prev_sibling(before),
            None => self.last_child(parent),
        };

        {
            let n = self.node_mut(node);
            n.parent = Some(parent);
            n.prev_sibling = prev;
            n.next_sibling = before;
        }
        match prev {
            Some(prev) => self.node_mut(prev).next_sibling = Some(node),
            None => self.node_mut(parent).first_child = Some(node),
        }
        match before {
            Some(before) => self.node_mut(before).prev_sibling = Some(node),
            None => self.node_mut(parent).last_child = Some(node),
        }
        self.node_mut(parent).child_count += 1;

        if self.node(node).is_element() {
            let first = self.previous_element_sibling(node).is_none();
            let last = self.next_element_sibling(node).is_none();
            let p = self.node_mut(parent);
            p.child_element_count += 1;
            if first {
                p.first_element_child = Some(node);
            }
            if last {
                p.last_element_child = Some(node);
            }
        }
    }

    /// Unlink `node` from `parent`, leaving it a parentless root
    pub(crate) fn unlink_child(&mut self, parent: NodeId, node: NodeId) {
        debug_assert_eq!(self.parent(node), Some(parent));

        if self.node(node).is_element() {
            let next_element = self.next_element_sibling(node);
            let prev_element = self.previous_element_sibling(node);
            let p = self.node_mut(parent);
            if p.first_element_child == Some(node) {
                p.first_element_child = next_element;
            }
            if p.last_element_child == Some(node) {
                p.last_element_child = prev_element;
            }
            p.child_element_count -= 1;
        }

        let (prev, next) = {
            let n = self.node(node);
            (n.prev_sibling, n.next_sibling)
        };
        match prev {
            Some(prev) => self.node_mut(prev).next_sibling = next,
            None => self.node_mut(parent).first_child = next,
        }
        match next {
            Some(next) => self.node_mut(next).prev_sibling = prev,
            None => self.node_mut(parent).last_child = prev,
        }
        self.node_mut(parent).child_count -= 1;

        let n = self.node_mut(node);
        n.parent = None;
        n.prev_sibling = None;
        n.next_sibling = None;
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DomTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomTree")
            .field("nodes", &self.nodes.len())
            .field("ranges", &self.ranges.iter().flatten().count())
            .field("observers", &self.observers.iter().flatten().count())
            .field("pending_observers", &self.pending_observers)
            .field("notify_scheduled", &self.notify_scheduled)
            .field("tasks", &self.tasks.len())
            .finish()
    }
}

/// Iterator over a node's children
pub struct Children<'a> {
    tree: &'a DomTree,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.tree.next_sibling(id);
        Some(id)
    }
}

/// Iterator from a node up to its root
pub struct Ancestors<'a> {
    tree: &'a DomTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.tree.get(id).and_then(|n| n.parent);
        Some(id)
    }
}

/// Tree-order iterator over a subtree
pub struct Descendants<'a> {
    tree: &'a DomTree,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.tree.following(id, self.root);
        Some(id)
    }
}
