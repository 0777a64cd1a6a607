//! DOM Node
//!
//! A node is a slot in the [`DomTree`](crate::DomTree) arena. Links to
//! parent, siblings, children and owning document are [`NodeId`] handles,
//! never owning pointers. The parent-level derived fields (child count,
//! first/last element child, element count) are kept in sync by the tree
//! primitives on every link and unlink.

use crate::range::RangeId;
use crate::{Atom, NodeId, RegisteredObserver};

/// DOM node type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Element,
    Attribute,
    Text,
    CDataSection,
    ProcessingInstruction,
    Comment,
    Document,
    DocumentType,
    DocumentFragment,
}

impl NodeType {
    /// Text or CDATA section
    #[inline]
    pub fn is_text(self) -> bool {
        matches!(self, NodeType::Text | NodeType::CDataSection)
    }

    /// Kinds that may be inserted as a child
    #[inline]
    pub fn is_insertable(self) -> bool {
        match self {
            NodeType::DocumentFragment
            | NodeType::DocumentType
            | NodeType::Element
            | NodeType::Text
            | NodeType::CDataSection
            | NodeType::ProcessingInstruction
            | NodeType::Comment => true,
            NodeType::Document | NodeType::Attribute => false,
        }
    }

    /// Kinds that may have children
    #[inline]
    pub fn is_parent_kind(self) -> bool {
        matches!(
            self,
            NodeType::Document | NodeType::DocumentFragment | NodeType::Element
        )
    }
}

/// DOM Node - Core structure
#[derive(Debug)]
pub struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) first_child: Option<NodeId>,
    pub(crate) last_child: Option<NodeId>,
    pub(crate) prev_sibling: Option<NodeId>,
    pub(crate) next_sibling: Option<NodeId>,
    pub(crate) child_count: usize,
    pub(crate) first_element_child: Option<NodeId>,
    pub(crate) last_element_child: Option<NodeId>,
    pub(crate) child_element_count: usize,
    /// Owning document; a document owns itself
    pub(crate) owner_document: NodeId,
    /// Observers registered on this node, transient ones included
    pub(crate) registered_observers: Vec<RegisteredObserver>,
    pub(crate) data: NodeData,
}

impl Node {
    pub(crate) fn new(owner_document: NodeId, data: NodeData) -> Self {
        Self {
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            child_count: 0,
            first_element_child: None,
            last_element_child: None,
            child_element_count: 0,
            owner_document,
            registered_observers: Vec::new(),
            data,
        }
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    pub fn first_child(&self) -> Option<NodeId> {
        self.first_child
    }

    #[inline]
    pub fn last_child(&self) -> Option<NodeId> {
        self.last_child
    }

    #[inline]
    pub fn prev_sibling(&self) -> Option<NodeId> {
        self.prev_sibling
    }

    #[inline]
    pub fn next_sibling(&self) -> Option<NodeId> {
        self.next_sibling
    }

    #[inline]
    pub fn child_count(&self) -> usize {
        self.child_count
    }

    #[inline]
    pub fn first_element_child(&self) -> Option<NodeId> {
        self.first_element_child
    }

    #[inline]
    pub fn last_element_child(&self) -> Option<NodeId> {
        self.last_element_child
    }

    #[inline]
    pub fn child_element_count(&self) -> usize {
        self.child_element_count
    }

    #[inline]
    pub fn owner_document(&self) -> NodeId {
        self.owner_document
    }

    /// Observers registered on this node
    pub fn registered_observers(&self) -> &[RegisteredObserver] {
        &self.registered_observers
    }

    #[inline]
    pub fn data(&self) -> &NodeData {
        &self.data
    }

    pub fn node_type(&self) -> NodeType {
        match &self.data {
            NodeData::Document(_) => NodeType::Document,
            NodeData::Doctype(_) => NodeType::DocumentType,
            NodeData::Element(_) => NodeType::Element,
            NodeData::Attr(_) => NodeType::Attribute,
            NodeData::Text(_) => NodeType::Text,
            NodeData::CDataSection(_) => NodeType::CDataSection,
            NodeData::Comment(_) => NodeType::Comment,
            NodeData::ProcessingInstruction(_) => NodeType::ProcessingInstruction,
            NodeData::DocumentFragment => NodeType::DocumentFragment,
        }
    }

    /// Check if this is an element
    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    /// Text or CDATA section
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.data, NodeData::Text(_) | NodeData::CDataSection(_))
    }

    /// Text node that is not a CDATA section
    #[inline]
    pub fn is_exclusive_text(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    #[inline]
    pub fn as_attr(&self) -> Option<&AttrData> {
        match &self.data {
            NodeData::Attr(a) => Some(a),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn as_attr_mut(&mut self) -> Option<&mut AttrData> {
        match &mut self.data {
            NodeData::Attr(a) => Some(a),
            _ => None,
        }
    }

    #[inline]
    pub fn as_doctype(&self) -> Option<&DoctypeData> {
        match &self.data {
            NodeData::Doctype(d) => Some(d),
            _ => None,
        }
    }

    /// Character data of text, CDATA, comment and processing instruction nodes
    pub fn character_data(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(s) | NodeData::CDataSection(s) | NodeData::Comment(s) => {
                Some(s.as_str())
            }
            NodeData::ProcessingInstruction(pi) => Some(pi.data.as_str()),
            _ => None,
        }
    }

    pub(crate) fn character_data_mut(&mut self) -> Option<&mut String> {
        match &mut self.data {
            NodeData::Text(s) | NodeData::CDataSection(s) | NodeData::Comment(s) => Some(s),
            NodeData::ProcessingInstruction(pi) => Some(&mut pi.data),
            _ => None,
        }
    }

    /// Node length: characters for character data, zero for a doctype,
    /// child count otherwise
    pub fn length(&self) -> usize {
        match &self.data {
            NodeData::Doctype(_) => 0,
            NodeData::Text(s) | NodeData::CDataSection(s) | NodeData::Comment(s) => {
                s.chars().count()
            }
            NodeData::ProcessingInstruction(pi) => pi.data.chars().count(),
            NodeData::Document(_)
            | NodeData::Element(_)
            | NodeData::Attr(_)
            | NodeData::DocumentFragment => self.child_count,
        }
    }
}

/// Node-specific data
#[derive(Debug)]
pub enum NodeData {
    /// Document root, owner of its live ranges
    Document(DocumentData),
    /// DOCTYPE
    Doctype(DoctypeData),
    /// Element
    Element(ElementData),
    /// Attribute
    Attr(AttrData),
    /// Text content
    Text(String),
    /// CDATA section
    CDataSection(String),
    /// Comment
    Comment(String),
    /// Processing instruction
    ProcessingInstruction(ProcessingInstructionData),
    /// Document fragment
    DocumentFragment,
}

impl NodeData {
    /// Copy of this payload for cloning: no ranges, no attributes
    pub(crate) fn shallow_copy(&self) -> NodeData {
        match self {
            NodeData::Document(_) => NodeData::Document(DocumentData::default()),
            NodeData::Doctype(d) => NodeData::Doctype(d.clone()),
            NodeData::Element(e) => NodeData::Element(ElementData {
                namespace: e.namespace,
                prefix: e.prefix,
                local_name: e.local_name,
                attributes: Vec::new(),
            }),
            NodeData::Attr(a) => NodeData::Attr(AttrData {
                owner_element: None,
                ..a.clone()
            }),
            NodeData::Text(s) => NodeData::Text(s.clone()),
            NodeData::CDataSection(s) => NodeData::CDataSection(s.clone()),
            NodeData::Comment(s) => NodeData::Comment(s.clone()),
            NodeData::ProcessingInstruction(pi) => NodeData::ProcessingInstruction(pi.clone()),
            NodeData::DocumentFragment => NodeData::DocumentFragment,
        }
    }
}

/// Document-specific data
#[derive(Debug, Default)]
pub struct DocumentData {
    /// Ranges currently live on this document
    pub(crate) ranges: Vec<RangeId>,
}

impl DocumentData {
    /// Live ranges registered with this document
    pub fn ranges(&self) -> &[RangeId] {
        &self.ranges
    }
}

/// DOCTYPE data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctypeData {
    pub name: String,
    pub public_id: String,
    pub system_id: String,
}

/// Element-specific data
#[derive(Debug)]
pub struct ElementData {
    pub namespace: Option<Atom>,
    pub prefix: Option<Atom>,
    pub local_name: Atom,
    /// Attribute nodes, in insertion order
    pub(crate) attributes: Vec<NodeId>,
}

impl ElementData {
    pub fn attributes(&self) -> &[NodeId] {
        &self.attributes
    }
}

/// Attribute data
#[derive(Debug, Clone)]
pub struct AttrData {
    pub namespace: Option<Atom>,
    pub prefix: Option<Atom>,
    pub local_name: Atom,
    pub(crate) value: String,
    pub(crate) owner_element: Option<NodeId>,
}

impl AttrData {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn owner_element(&self) -> Option<NodeId> {
        self.owner_element
    }
}

/// Processing instruction data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingInstructionData {
    pub target: String,
    pub data: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_counts_chars() {
        let doc = NodeId(0);
        let text = Node::new(doc, NodeData::Text("héllo".to_string()));
        assert_eq!(text.length(), 5);

        let doctype = Node::new(
            doc,
            NodeData::Doctype(DoctypeData {
                name: "root".into(),
                public_id: String::new(),
                system_id: String::new(),
            }),
        );
        assert_eq!(doctype.length(), 0);
    }

    #[test]
    fn test_insertable_kinds() {
        assert!(NodeType::Comment.is_insertable());
        assert!(!NodeType::Document.is_insertable());
        assert!(!NodeType::Attribute.is_insertable());
        assert!(NodeType::Element.is_parent_kind());
        assert!(!NodeType::Text.is_parent_kind());
    }
}
