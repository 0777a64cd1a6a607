//! DOM Node Operations
//!
//! Convenience node manipulation built on the mutation algorithms:
//! appendChild, insertBefore, replaceChild, removeChild, the ParentNode
//! and ChildNode helpers, cloneNode and textContent.

use crate::node::{NodeData, NodeType};
use crate::{DomResult, DomTree, MutationRecord, NodeId};

impl DomTree {
    /// Append a child node
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.append(child, parent)
    }

    /// Insert before a reference node
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        ref_child: Option<NodeId>,
    ) -> DomResult<NodeId> {
        self.pre_insert(new_child, parent, ref_child)
    }

    /// Replace a child with another node. Returns the old child.
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> DomResult<NodeId> {
        self.replace(old_child, new_child, parent)
    }

    /// Remove a child node
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.pre_remove(child, parent)
    }

    pub fn has_child_nodes(&self, node: NodeId) -> bool {
        self.first_child(node).is_some()
    }

    /// True if `other` is `node` or one of its descendants
    pub fn contains(&self, node: NodeId, other: NodeId) -> bool {
        self.is_inclusive_ancestor(node, other)
    }

    // --- ParentNode / ChildNode ---

    /// One node stays as it is; several are moved into a new fragment
    fn convert_nodes_into_node(&mut self, document: NodeId, nodes: &[NodeId]) -> DomResult<NodeId> {
        if let [single] = nodes {
            return Ok(*single);
        }
        let fragment = self.create_document_fragment(document);
        for &node in nodes {
            self.append(node, fragment)?;
        }
        Ok(fragment)
    }

    /// Insert `nodes` after the last child of `parent`
    pub fn append_nodes(&mut self, parent: NodeId, nodes: &[NodeId]) -> DomResult<()> {
        let document = self.owner_document(parent);
        let node = self.convert_nodes_into_node(document, nodes)?;
        self.pre_insert(node, parent, None)?;
        Ok(())
    }

    /// Insert `nodes` before the first child of `parent`
    pub fn prepend(&mut self, parent: NodeId, nodes: &[NodeId]) -> DomResult<()> {
        let document = self.owner_document(parent);
        let node = self.convert_nodes_into_node(document, nodes)?;
        let first = self.first_child(parent);
        self.pre_insert(node, parent, first)?;
        Ok(())
    }

    /// Replace all children of `parent` with `nodes`, as one record
    pub fn replace_children(&mut self, parent: NodeId, nodes: &[NodeId]) -> DomResult<()> {
        let document = self.owner_document(parent);
        let node = self.convert_nodes_into_node(document, nodes)?;
        self.ensure_insertion_validity(node, parent, None, false)?;
        self.replace_all(Some(node), parent);
        Ok(())
    }

    pub(crate) fn replace_all(&mut self, node: Option<NodeId>, parent: NodeId) {
        if let Some(node) = node {
            let document = self.owner_document(parent);
            self.adopt_into(node, document);
        }
        let removed_nodes: Vec<NodeId> = self.children(parent).collect();
        let added_nodes: Vec<NodeId> = match node {
            Some(node) if self.node_type(node) == NodeType::DocumentFragment => {
                self.children(node).collect()
            }
            Some(node) => vec![node],
            None => Vec::new(),
        };

        for &child in &removed_nodes {
            self.remove(child, true);
        }
        if let Some(node) = node {
            self.insert(node, parent, None, true);
        }

        if !added_nodes.is_empty() || !removed_nodes.is_empty() {
            self.queue_mutation_record(MutationRecord::child_list(
                parent,
                added_nodes,
                removed_nodes,
                None,
                None,
            ));
        }
    }

    /// Insert `nodes` just before `node`
    pub fn before(&mut self, node: NodeId, nodes: &[NodeId]) -> DomResult<()> {
        let Some(parent) = self.parent(node) else {
            return Ok(());
        };
        let viable_previous =
            std::iter::successors(self.prev_sibling(node), |&n| self.prev_sibling(n))
                .find(|n| !nodes.contains(n));
        let document = self.owner_document(parent);
        let new_node = self.convert_nodes_into_node(document, nodes)?;
        let reference = match viable_previous {
            Some(previous) => self.next_sibling(previous),
            None => self.first_child(parent),
        };
        self.pre_insert(new_node, parent, reference)?;
        Ok(())
    }

    /// Insert `nodes` just after `node`
    pub fn after(&mut self, node: NodeId, nodes: &[NodeId]) -> DomResult<()> {
        let Some(parent) = self.parent(node) else {
            return Ok(());
        };
        let viable_next = self.viable_next_sibling(node, nodes);
        let document = self.owner_document(parent);
        let new_node = self.convert_nodes_into_node(document, nodes)?;
        self.pre_insert(new_node, parent, viable_next)?;
        Ok(())
    }

    /// Replace `node` with `nodes`
    pub fn replace_with(&mut self, node: NodeId, nodes: &[NodeId]) -> DomResult<()> {
        let Some(parent) = self.parent(node) else {
            return Ok(());
        };
        let viable_next = self.viable_next_sibling(node, nodes);
        let document = self.owner_document(parent);
        let new_node = self.convert_nodes_into_node(document, nodes)?;
        if self.parent(node) == Some(parent) {
            self.replace(node, new_node, parent)?;
        } else {
            self.pre_insert(new_node, parent, viable_next)?;
        }
        Ok(())
    }

    /// Remove `node` from its parent, if any
    pub fn remove_from_parent(&mut self, node: NodeId) {
        if self.parent(node).is_some() {
            self.remove(node, false);
        }
    }

    fn viable_next_sibling(&self, node: NodeId, nodes: &[NodeId]) -> Option<NodeId> {
        std::iter::successors(self.next_sibling(node), |&n| self.next_sibling(n))
            .find(|n| !nodes.contains(n))
    }

    // --- Cloning ---

    /// Copy a node (and its subtree if `deep`) into its own document
    pub fn clone_node(&mut self, node: NodeId, deep: bool) -> NodeId {
        let document = self.owner_document(node);
        self.clone_into(node, document, deep)
    }

    /// Parentless copy owned by `document`; cloning a document yields a
    /// new document
    pub(crate) fn clone_into(&mut self, node: NodeId, document: NodeId, deep: bool) -> NodeId {
        let data = self.node(node).data.shallow_copy();
        let is_document = matches!(data, NodeData::Document(_));
        let copy = self.push_node((!is_document).then_some(document), data);
        let document = if is_document { copy } else { document };

        let attributes = self
            .node(node)
            .as_element()
            .map(|e| e.attributes.clone())
            .unwrap_or_default();
        for attr in attributes {
            let attr_copy = self.clone_into(attr, document, false);
            if let Some(e) = self.node_mut(copy).as_element_mut() {
                e.attributes.push(attr_copy);
            }
            if let Some(a) = self.node_mut(attr_copy).as_attr_mut() {
                a.owner_element = Some(copy);
            }
        }

        if deep {
            let children: Vec<NodeId> = self.children(node).collect();
            for child in children {
                let child_copy = self.clone_into(child, document, true);
                self.link_child(copy, child_copy, None);
            }
        }
        copy
    }

    // --- Names and text ---

    /// DOM nodeName
    pub fn node_name(&self, node: NodeId) -> String {
        match &self.node(node).data {
            NodeData::Element(e) => {
                let local = self.resolve(e.local_name);
                match e.prefix {
                    Some(prefix) => format!("{}:{}", self.resolve(prefix), local),
                    None => local.to_string(),
                }
            }
            NodeData::Attr(a) => self.attribute_name(a),
            NodeData::Text(_) => "#text".to_string(),
            NodeData::CDataSection(_) => "#cdata-section".to_string(),
            NodeData::Comment(_) => "#comment".to_string(),
            NodeData::ProcessingInstruction(pi) => pi.target.clone(),
            NodeData::Document(_) => "#document".to_string(),
            NodeData::Doctype(d) => d.name.clone(),
            NodeData::DocumentFragment => "#document-fragment".to_string(),
        }
    }

    /// DOM textContent; `None` for documents and doctypes
    pub fn text_content(&self, node: NodeId) -> Option<String> {
        match &self.node(node).data {
            NodeData::Document(_) | NodeData::Doctype(_) => None,
            NodeData::Attr(a) => Some(a.value.clone()),
            NodeData::Element(_) | NodeData::DocumentFragment => Some(
                self.descendants(node)
                    .filter_map(|id| {
                        let n = self.node(id);
                        if n.is_text() { n.character_data() } else { None }
                    })
                    .collect(),
            ),
            _ => self.node(node).character_data().map(str::to_string),
        }
    }

    /// Set textContent: children are replaced by one text node (none for
    /// an empty string)
    pub fn set_text_content(&mut self, node: NodeId, value: &str) -> DomResult<()> {
        match self.node_type(node) {
            NodeType::Element | NodeType::DocumentFragment => {
                let text = if value.is_empty() {
                    None
                } else {
                    Some(self.create_text_node(node, value))
                };
                self.replace_all(text, node);
                Ok(())
            }
            NodeType::Attribute => {
                self.change_attribute(node, value);
                Ok(())
            }
            NodeType::Document | NodeType::DocumentType => Ok(()),
            _ => self.set_data(node, value),
        }
    }
}
