//! Element Attributes
//!
//! Attribute manipulation: get, set, remove, has, toggle. Attributes are
//! `Attr` nodes in the arena, listed on their element in insertion order.
//! Every change queues an attributes record on the element.

use crate::node::{AttrData, NodeData};
use crate::{DomError, DomResult, DomTree, MutationRecord, NodeId};

fn non_empty(namespace: Option<&str>) -> Option<&str> {
    namespace.filter(|ns| !ns.is_empty())
}

impl DomTree {
    /// Attribute nodes of an element
    pub fn attributes(&self, element: NodeId) -> DomResult<&[NodeId]> {
        self.node(element)
            .as_element()
            .map(|e| e.attributes())
            .ok_or(DomError::InvalidNodeType)
    }

    /// Qualified name of an attribute node
    pub fn attribute_name(&self, attr: &AttrData) -> String {
        let local = self.resolve(attr.local_name);
        match attr.prefix {
            Some(prefix) => format!("{}:{}", self.resolve(prefix), local),
            None => local.to_string(),
        }
    }

    fn matches_qualified_name(&self, attr: &AttrData, name: &str) -> bool {
        let local = self.resolve(attr.local_name);
        match attr.prefix {
            Some(prefix) => name.split_once(':') == Some((self.resolve(prefix), local)),
            None => local == name,
        }
    }

    fn find_attribute(&self, element: NodeId, name: &str) -> DomResult<Option<NodeId>> {
        Ok(self.attributes(element)?.iter().copied().find(|&attr| {
            self.node(attr)
                .as_attr()
                .is_some_and(|a| self.matches_qualified_name(a, name))
        }))
    }

    fn find_attribute_ns(
        &self,
        element: NodeId,
        namespace: Option<&str>,
        local_name: &str,
    ) -> DomResult<Option<NodeId>> {
        let namespace = non_empty(namespace);
        Ok(self.attributes(element)?.iter().copied().find(|&attr| {
            self.node(attr).as_attr().is_some_and(|a| {
                a.namespace.map(|ns| self.resolve(ns)) == namespace
                    && self.resolve(a.local_name) == local_name
            })
        }))
    }

    fn attribute_value(&self, attr: Option<NodeId>) -> Option<&str> {
        attr.and_then(|a| self.node(a).as_attr()).map(AttrData::value)
    }

    /// Get attribute value by qualified name
    pub fn get_attribute(&self, element: NodeId, name: &str) -> DomResult<Option<&str>> {
        let attr = self.find_attribute(element, name)?;
        Ok(self.attribute_value(attr))
    }

    /// Get attribute value by namespace and local name
    pub fn get_attribute_ns(
        &self,
        element: NodeId,
        namespace: Option<&str>,
        local_name: &str,
    ) -> DomResult<Option<&str>> {
        let attr = self.find_attribute_ns(element, namespace, local_name)?;
        Ok(self.attribute_value(attr))
    }

    pub fn has_attribute(&self, element: NodeId, name: &str) -> DomResult<bool> {
        Ok(self.find_attribute(element, name)?.is_some())
    }

    /// Qualified names of all attributes
    pub fn attribute_names(&self, element: NodeId) -> DomResult<Vec<String>> {
        Ok(self
            .attributes(element)?
            .iter()
            .filter_map(|&attr| self.node(attr).as_attr())
            .map(|a| self.attribute_name(a))
            .collect())
    }

    /// Set attribute by qualified name, creating it if needed
    pub fn set_attribute(&mut self, element: NodeId, name: &str, value: &str) -> DomResult<()> {
        if let Some(attr) = self.find_attribute(element, name)? {
            self.change_attribute(attr, value);
            return Ok(());
        }
        let document = self.owner_document(element);
        let attr = self.new_attribute(document, None, None, name, value);
        self.append_attribute(element, attr);
        Ok(())
    }

    /// Set attribute by namespace and qualified name, creating it if needed
    pub fn set_attribute_ns(
        &mut self,
        element: NodeId,
        namespace: Option<&str>,
        qualified_name: &str,
        value: &str,
    ) -> DomResult<()> {
        let namespace = non_empty(namespace);
        let (prefix, local_name) = match qualified_name.split_once(':') {
            Some((prefix, local)) => (Some(prefix), local),
            None => (None, qualified_name),
        };
        if prefix.is_some() && namespace.is_none() {
            return Err(DomError::Type(format!(
                "prefixed attribute {qualified_name} needs a namespace"
            )));
        }

        if let Some(attr) = self.find_attribute_ns(element, namespace, local_name)? {
            self.change_attribute(attr, value);
            return Ok(());
        }
        let document = self.owner_document(element);
        let attr = self.new_attribute(document, namespace, prefix, local_name, value);
        self.append_attribute(element, attr);
        Ok(())
    }

    /// Remove attribute by qualified name. Returns whether one was removed.
    pub fn remove_attribute(&mut self, element: NodeId, name: &str) -> DomResult<bool> {
        match self.find_attribute(element, name)? {
            Some(attr) => {
                self.remove_attribute_node(element, attr);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove attribute by namespace and local name
    pub fn remove_attribute_ns(
        &mut self,
        element: NodeId,
        namespace: Option<&str>,
        local_name: &str,
    ) -> DomResult<bool> {
        match self.find_attribute_ns(element, namespace, local_name)? {
            Some(attr) => {
                self.remove_attribute_node(element, attr);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Toggle a boolean attribute. Returns whether it is now present.
    pub fn toggle_attribute(
        &mut self,
        element: NodeId,
        name: &str,
        force: Option<bool>,
    ) -> DomResult<bool> {
        let present = self.has_attribute(element, name)?;
        match (present, force) {
            (true, None | Some(false)) => {
                self.remove_attribute(element, name)?;
                Ok(false)
            }
            (false, None | Some(true)) => {
                self.set_attribute(element, name, "")?;
                Ok(true)
            }
            (present, _) => Ok(present),
        }
    }

    // --- Primitives ---

    pub(crate) fn new_attribute(
        &mut self,
        document: NodeId,
        namespace: Option<&str>,
        prefix: Option<&str>,
        local_name: &str,
        value: &str,
    ) -> NodeId {
        let data = AttrData {
            namespace: namespace.map(|ns| self.intern(ns)),
            prefix: prefix.map(|p| self.intern(p)),
            local_name: self.intern(local_name),
            value: value.to_string(),
            owner_element: None,
        };
        self.push_node(Some(document), NodeData::Attr(data))
    }

    fn attribute_record(
        &self,
        element: NodeId,
        attr: &AttrData,
        old_value: Option<String>,
    ) -> MutationRecord {
        MutationRecord::attributes(
            element,
            self.resolve(attr.local_name),
            attr.namespace.map(|ns| self.resolve(ns)),
            old_value,
        )
    }

    /// Set the value of an attribute node, recording the change if it is
    /// attached to an element
    pub(crate) fn change_attribute(&mut self, attr: NodeId, value: &str) {
        let Some(data) = self.node(attr).as_attr() else {
            return;
        };
        let record = data
            .owner_element
            .map(|element| self.attribute_record(element, data, Some(data.value.clone())));
        if let Some(record) = record {
            self.queue_mutation_record(record);
        }
        if let Some(data) = self.node_mut(attr).as_attr_mut() {
            data.value = value.to_string();
        }
    }

    /// Attach a parentless attribute node to `element`
    pub(crate) fn append_attribute(&mut self, element: NodeId, attr: NodeId) {
        let Some(data) = self.node(attr).as_attr() else {
            return;
        };
        let record = self.attribute_record(element, data, None);
        self.queue_mutation_record(record);

        if let Some(e) = self.node_mut(element).as_element_mut() {
            e.attributes.push(attr);
        }
        if let Some(data) = self.node_mut(attr).as_attr_mut() {
            data.owner_element = Some(element);
        }
    }

    pub(crate) fn remove_attribute_node(&mut self, element: NodeId, attr: NodeId) {
        let Some(data) = self.node(attr).as_attr() else {
            return;
        };
        let record = self.attribute_record(element, data, Some(data.value.clone()));
        self.queue_mutation_record(record);

        if let Some(e) = self.node_mut(element).as_element_mut() {
            e.attributes.retain(|&a| a != attr);
        }
        if let Some(data) = self.node_mut(attr).as_attr_mut() {
            data.owner_element = None;
        }
    }
}
