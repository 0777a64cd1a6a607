//! Mutation Algorithms
//!
//! Every structural edit of the tree goes through `insert` and `remove`.
//! Both repair the live ranges of the affected document with a
//! constant-time patch per boundary point, queue the childList record
//! and update transient observer registrations. The public entry points
//! validate first and only then touch the tree, so a failed call leaves
//! nodes, ranges and observer queues as they were.

use crate::node::NodeType;
use crate::range::BoundaryPoint;
use crate::{DomError, DomResult, DomTree, MutationRecord, NodeId};

impl DomTree {
    // --- Validity ---

    /// Checks shared by pre-insert and replace.
    ///
    /// `child` must already be a child of `parent`; a node replacing
    /// `child` is checked with `replacing` set so that `child` itself does
    /// not count against the document rules.
    pub(crate) fn ensure_insertion_validity(
        &self,
        node: NodeId,
        parent: NodeId,
        child: Option<NodeId>,
        replacing: bool,
    ) -> DomResult<()> {
        let parent_type = self.node_type(parent);
        if !parent_type.is_parent_kind() {
            return Err(DomError::HierarchyRequest);
        }
        if self.is_inclusive_ancestor(node, parent) {
            return Err(DomError::HierarchyRequest);
        }
        if let Some(child) = child {
            if self.parent(child) != Some(parent) {
                return Err(DomError::NotFound);
            }
        }

        let node_type = self.node_type(node);
        if !node_type.is_insertable() {
            return Err(DomError::HierarchyRequest);
        }
        if node_type.is_text() && parent_type == NodeType::Document {
            return Err(DomError::HierarchyRequest);
        }
        if node_type == NodeType::DocumentType && parent_type != NodeType::Document {
            return Err(DomError::HierarchyRequest);
        }

        if parent_type == NodeType::Document {
            self.ensure_document_child_rules(node, parent, child, replacing)?;
        }
        Ok(())
    }

    /// At most one doctype, at most one element, doctype before element
    fn ensure_document_child_rules(
        &self,
        node: NodeId,
        parent: NodeId,
        child: Option<NodeId>,
        replacing: bool,
    ) -> DomResult<()> {
        let ignored = if replacing { child } else { None };
        let is_doctype = |id: NodeId| self.node_type(id) == NodeType::DocumentType;
        let is_element = |id: NodeId| self.node(id).is_element();

        let has_element_child = self
            .children(parent)
            .any(|c| Some(c) != ignored && is_element(c));
        let has_doctype_child = self
            .children(parent)
            .any(|c| Some(c) != ignored && is_doctype(c));
        let doctype_following = child.is_some_and(|c| {
            std::iter::successors(self.next_sibling(c), |&n| self.next_sibling(n)).any(is_doctype)
        });
        let element_preceding = child.is_some_and(|c| {
            std::iter::successors(self.prev_sibling(c), |&n| self.prev_sibling(n)).any(is_element)
        });
        let child_is_doctype = !replacing && child.is_some_and(is_doctype);

        let violation = match self.node_type(node) {
            NodeType::DocumentFragment => {
                let elements = self.children(node).filter(|&c| is_element(c)).count();
                let has_text = self.children(node).any(|c| self.node(c).is_text());
                elements > 1
                    || has_text
                    || (elements == 1
                        && (has_element_child || child_is_doctype || doctype_following))
            }
            NodeType::Element => has_element_child || child_is_doctype || doctype_following,
            NodeType::DocumentType => {
                has_doctype_child
                    || element_preceding
                    || (!replacing && child.is_none() && has_element_child)
            }
            _ => false,
        };

        if violation {
            return Err(DomError::HierarchyRequest);
        }
        Ok(())
    }

    // --- Entry points ---

    /// Insert `node` into `parent` before `child` (or last).
    ///
    /// A fragment is replaced by its children. Returns `node`.
    pub fn pre_insert(
        &mut self,
        node: NodeId,
        parent: NodeId,
        child: Option<NodeId>,
    ) -> DomResult<NodeId> {
        self.ensure_insertion_validity(node, parent, child, false)?;

        let mut reference = child;
        if reference == Some(node) {
            reference = self.next_sibling(node);
        }

        let document = self.owner_document(parent);
        self.adopt_into(node, document);
        self.insert(node, parent, reference, false);
        Ok(node)
    }

    /// Append `node` as the last child of `parent`
    pub fn append(&mut self, node: NodeId, parent: NodeId) -> DomResult<NodeId> {
        self.pre_insert(node, parent, None)
    }

    /// Replace `child` of `parent` with `node`. Returns `child`.
    pub fn replace(&mut self, child: NodeId, node: NodeId, parent: NodeId) -> DomResult<NodeId> {
        self.ensure_insertion_validity(node, parent, Some(child), true)?;

        let mut reference = self.next_sibling(child);
        if reference == Some(node) {
            reference = self.next_sibling(node);
        }
        let mut previous_sibling = self.prev_sibling(child);
        if previous_sibling == Some(node) {
            previous_sibling = self.prev_sibling(node);
        }

        let document = self.owner_document(parent);
        self.adopt_into(node, document);

        let mut removed_nodes = Vec::new();
        if self.parent(child) == Some(parent) {
            removed_nodes.push(child);
            self.remove(child, true);
        }

        let added_nodes = if self.node_type(node) == NodeType::DocumentFragment {
            self.children(node).collect()
        } else {
            vec![node]
        };
        self.insert(node, parent, reference, true);

        self.queue_mutation_record(MutationRecord::child_list(
            parent,
            added_nodes,
            removed_nodes,
            previous_sibling,
            reference,
        ));
        Ok(child)
    }

    /// Remove `child` from `parent`. Returns `child`.
    pub fn pre_remove(&mut self, child: NodeId, parent: NodeId) -> DomResult<NodeId> {
        if self.parent(child) != Some(parent) {
            return Err(DomError::NotFound);
        }
        self.remove(child, false);
        Ok(child)
    }

    /// Move `node` (and its subtree) into `document`, detaching it first.
    /// Returns `node`.
    pub fn adopt(&mut self, node: NodeId, document: NodeId) -> DomResult<NodeId> {
        match self.node_type(node) {
            NodeType::Document => return Err(DomError::NotSupported),
            NodeType::Attribute => {
                if let Some(owner) = self.node(node).as_attr().and_then(|a| a.owner_element) {
                    self.remove_attribute_node(owner, node);
                }
            }
            _ => {}
        }
        let document = self.owner_document(document);
        self.adopt_into(node, document);
        Ok(node)
    }

    // --- Algorithms ---

    pub(crate) fn adopt_into(&mut self, node: NodeId, document: NodeId) {
        let old_document = self.owner_document(node);
        if self.parent(node).is_some() {
            self.remove(node, false);
        }
        if old_document == document {
            return;
        }

        tracing::debug!("Adopting {:?} from {:?} into {:?}", node, old_document, document);
        let mut next = Some(node);
        while let Some(current) = next {
            self.node_mut(current).owner_document = document;
            let attributes = self
                .node(current)
                .as_element()
                .map(|e| e.attributes.clone())
                .unwrap_or_default();
            for attr in attributes {
                self.node_mut(attr).owner_document = document;
            }
            next = self.following(current, node);
        }

        self.migrate_ranges(old_document, document);
    }

    /// Insert without validation.
    ///
    /// With `suppress` set the caller queues the record itself.
    pub(crate) fn insert(
        &mut self,
        node: NodeId,
        parent: NodeId,
        child: Option<NodeId>,
        suppress: bool,
    ) {
        let is_fragment = self.node_type(node) == NodeType::DocumentFragment;
        let nodes: Vec<NodeId> = if is_fragment {
            self.children(node).collect()
        } else {
            vec![node]
        };
        let count = nodes.len();
        if count == 0 {
            return;
        }

        if let Some(child) = child {
            let index = self.index(child);
            self.patch_live_ranges(parent, |_, point| {
                (point.node == parent && point.offset > index)
                    .then(|| BoundaryPoint::new(parent, point.offset + count))
            });
        }

        if is_fragment {
            for &fragment_child in &nodes {
                self.remove(fragment_child, false);
            }
        }

        let previous_sibling = match child {
            Some(child) => self.prev_sibling(child),
            None => self.last_child(parent),
        };

        tracing::debug!("Inserting {} node(s) into {:?} before {:?}", count, parent, child);
        for &new_node in &nodes {
            self.link_child(parent, new_node, child);
        }

        if !suppress {
            self.queue_mutation_record(MutationRecord::child_list(
                parent,
                nodes,
                Vec::new(),
                previous_sibling,
                child,
            ));
        }
    }

    /// Remove without validation; a parentless node is left alone
    pub(crate) fn remove(&mut self, node: NodeId, suppress: bool) {
        let Some(parent) = self.parent(node) else {
            return;
        };
        let index = self.index(node);
        tracing::debug!("Removing {:?} from {:?} at {}", node, parent, index);

        self.patch_live_ranges(node, |tree, point| {
            if tree.is_inclusive_ancestor(node, point.node) {
                Some(BoundaryPoint::new(parent, index))
            } else if point.node == parent && point.offset > index {
                Some(BoundaryPoint::new(parent, point.offset - 1))
            } else {
                None
            }
        });

        let previous_sibling = self.prev_sibling(node);
        let next_sibling = self.next_sibling(node);
        self.unlink_child(parent, node);
        self.add_transient_observers(parent, node);

        if !suppress {
            self.queue_mutation_record(MutationRecord::child_list(
                parent,
                Vec::new(),
                vec![node],
                previous_sibling,
                next_sibling,
            ));
        }
    }
}
