//! Document - node factories and document-level queries
//!
//! Several documents can live in one [`DomTree`]. Factories take any node
//! of the target document (usually the document itself) and return a
//! parentless node owned by that document.

use crate::node::{
    DoctypeData, DocumentData, ElementData, NodeData, NodeType, ProcessingInstructionData,
};
use crate::{DomError, DomResult, DomTree, NodeId};

impl DomTree {
    /// Create a new empty document
    pub fn create_document(&mut self) -> NodeId {
        let id = self.push_node(None, NodeData::Document(DocumentData::default()));
        tracing::debug!("Created document {:?}", id);
        id
    }

    pub(crate) fn document_data_mut(&mut self, document: NodeId) -> Option<&mut DocumentData> {
        match &mut self.node_mut(document).data {
            NodeData::Document(data) => Some(data),
            _ => None,
        }
    }

    /// Root element of a document
    pub fn document_element(&self, document: NodeId) -> Option<NodeId> {
        self.node(document).first_element_child
    }

    /// DOCTYPE child of a document
    pub fn doctype(&self, document: NodeId) -> Option<NodeId> {
        self.children(document)
            .find(|&c| self.node_type(c) == NodeType::DocumentType)
    }

    /// Create an element with no namespace
    pub fn create_element(&mut self, document: NodeId, local_name: &str) -> NodeId {
        self.create_element_ns(document, None, local_name)
    }

    /// Create an element; a `prefix:local` name is split
    pub fn create_element_ns(
        &mut self,
        document: NodeId,
        namespace: Option<&str>,
        qualified_name: &str,
    ) -> NodeId {
        let (prefix, local_name) = match qualified_name.split_once(':') {
            Some((prefix, local)) => (Some(self.intern(prefix)), local),
            None => (None, qualified_name),
        };
        let data = ElementData {
            namespace: namespace.filter(|ns| !ns.is_empty()).map(|ns| self.intern(ns)),
            prefix,
            local_name: self.intern(local_name),
            attributes: Vec::new(),
        };
        let document = self.owner_document(document);
        self.push_node(Some(document), NodeData::Element(data))
    }

    pub fn create_text_node(&mut self, document: NodeId, data: &str) -> NodeId {
        let document = self.owner_document(document);
        self.push_node(Some(document), NodeData::Text(data.to_string()))
    }

    pub fn create_cdata_section(&mut self, document: NodeId, data: &str) -> NodeId {
        let document = self.owner_document(document);
        self.push_node(Some(document), NodeData::CDataSection(data.to_string()))
    }

    pub fn create_comment(&mut self, document: NodeId, data: &str) -> NodeId {
        let document = self.owner_document(document);
        self.push_node(Some(document), NodeData::Comment(data.to_string()))
    }

    pub fn create_processing_instruction(
        &mut self,
        document: NodeId,
        target: &str,
        data: &str,
    ) -> NodeId {
        let document = self.owner_document(document);
        self.push_node(
            Some(document),
            NodeData::ProcessingInstruction(ProcessingInstructionData {
                target: target.to_string(),
                data: data.to_string(),
            }),
        )
    }

    pub fn create_document_fragment(&mut self, document: NodeId) -> NodeId {
        let document = self.owner_document(document);
        self.push_node(Some(document), NodeData::DocumentFragment)
    }

    pub fn create_document_type(
        &mut self,
        document: NodeId,
        name: &str,
        public_id: &str,
        system_id: &str,
    ) -> NodeId {
        let document = self.owner_document(document);
        self.push_node(
            Some(document),
            NodeData::Doctype(DoctypeData {
                name: name.to_string(),
                public_id: public_id.to_string(),
                system_id: system_id.to_string(),
            }),
        )
    }

    /// Create a detached attribute node
    pub fn create_attribute(&mut self, document: NodeId, local_name: &str) -> NodeId {
        let document = self.owner_document(document);
        self.new_attribute(document, None, None, local_name, "")
    }

    pub fn create_attribute_ns(
        &mut self,
        document: NodeId,
        namespace: Option<&str>,
        qualified_name: &str,
    ) -> DomResult<NodeId> {
        let namespace = namespace.filter(|ns| !ns.is_empty());
        let (prefix, local_name) = match qualified_name.split_once(':') {
            Some((prefix, local)) => (Some(prefix), local),
            None => (None, qualified_name),
        };
        if prefix.is_some() && namespace.is_none() {
            return Err(DomError::Type(format!(
                "prefixed attribute {qualified_name} needs a namespace"
            )));
        }
        let document = self.owner_document(document);
        Ok(self.new_attribute(document, namespace, prefix, local_name, ""))
    }

    /// Move `node` into `document`
    pub fn adopt_node(&mut self, document: NodeId, node: NodeId) -> DomResult<NodeId> {
        self.adopt(node, document)
    }

    /// Copy `node` (and its subtree if `deep`) into `document`
    pub fn import_node(&mut self, document: NodeId, node: NodeId, deep: bool) -> DomResult<NodeId> {
        if self.node_type(node) == NodeType::Document {
            return Err(DomError::NotSupported);
        }
        let document = self.owner_document(document);
        Ok(self.clone_into(node, document, deep))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factories_set_owner() {
        let mut tree = DomTree::new();
        let doc = tree.create_document();
        let element = tree.create_element(doc, "root");
        // Any node of the document works as the factory argument
        let text = tree.create_text_node(element, "hi");

        assert_eq!(tree.owner_document(doc), doc);
        assert_eq!(tree.owner_document(element), doc);
        assert_eq!(tree.owner_document(text), doc);
        assert_eq!(tree.parent(element), None);
    }

    #[test]
    fn test_element_ns_split() {
        let mut tree = DomTree::new();
        let doc = tree.create_document();
        let svg = tree.create_element_ns(doc, Some("http://www.w3.org/2000/svg"), "svg:rect");
        let data = tree.node(svg).as_element().unwrap();

        assert_eq!(tree.resolve(data.local_name), "rect");
        assert_eq!(data.prefix.map(|p| tree.resolve(p)), Some("svg"));
        assert_eq!(
            data.namespace.map(|ns| tree.resolve(ns)),
            Some("http://www.w3.org/2000/svg")
        );
    }

    #[test]
    fn test_document_element_and_doctype() {
        let mut tree = DomTree::new();
        let doc = tree.create_document();
        let doctype = tree.create_document_type(doc, "note", "", "note.dtd");
        let root = tree.create_element(doc, "note");
        tree.append(doctype, doc).unwrap();
        tree.append(root, doc).unwrap();

        assert_eq!(tree.document_element(doc), Some(root));
        assert_eq!(tree.doctype(doc), Some(doctype));
        assert_eq!(tree.node(doctype).as_doctype().unwrap().system_id, "note.dtd");
    }

    #[test]
    fn test_import_node_copies_into_other_document() {
        let mut tree = DomTree::new();
        let source = tree.create_document();
        let target = tree.create_document();
        let element = tree.create_element(source, "item");
        let text = tree.create_text_node(source, "body");
        tree.append(text, element).unwrap();

        let copy = tree.import_node(target, element, true).unwrap();
        assert_ne!(copy, element);
        assert_eq!(tree.owner_document(copy), target);
        let child = tree.first_child(copy).unwrap();
        assert_eq!(tree.owner_document(child), target);
        assert_eq!(tree.data(child), Ok("body"));
        // The original is untouched
        assert_eq!(tree.owner_document(element), source);

        assert_eq!(tree.import_node(target, source, false), Err(DomError::NotSupported));
    }

    #[test]
    fn test_attribute_factories() {
        let mut tree = DomTree::new();
        let doc = tree.create_document();
        let attr = tree.create_attribute(doc, "lang");
        assert_eq!(tree.node(attr).node_type(), NodeType::Attribute);
        assert!(tree.create_attribute_ns(doc, None, "x:lang").is_err());
    }
}
