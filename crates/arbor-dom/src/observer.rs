//! Mutation Observers
//!
//! Registration lives on the observed node, records are built synchronously
//! by the mutation algorithms, and delivery is batched into one callback per
//! observer per notification pass.

use std::collections::VecDeque;
use std::fmt;

use crate::microtask::Microtask;
use crate::{DomError, DomResult, DomTree, NodeId};

/// Observer handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(crate) u32);

impl ObserverId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Observer callback: receives the tree, the drained records and its own id
pub type MutationCallback =
    Box<dyn FnMut(&mut DomTree, &[MutationRecord], ObserverId) -> anyhow::Result<()>>;

/// Error returned by an observer callback, reported instead of propagated
#[derive(Debug)]
pub struct CallbackError {
    pub observer: ObserverId,
    pub error: anyhow::Error,
}

/// Mutation observer options
///
/// `attributes` and `character_data` are tri-state: `None` means "not
/// specified", which lets the old-value flags and the filter imply them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationObserverInit {
    pub child_list: bool,
    pub attributes: Option<bool>,
    pub character_data: Option<bool>,
    pub subtree: bool,
    pub attribute_old_value: bool,
    pub character_data_old_value: bool,
    pub attribute_filter: Option<Vec<String>>,
}

impl MutationObserverInit {
    /// Fill in implied flags and reject contradictory options
    fn normalize(mut self) -> DomResult<Self> {
        if (self.attribute_old_value || self.attribute_filter.is_some())
            && self.attributes.is_none()
        {
            self.attributes = Some(true);
        }
        if self.character_data_old_value && self.character_data.is_none() {
            self.character_data = Some(true);
        }
        if !self.child_list && !self.wants_attributes() && !self.wants_character_data() {
            return Err(DomError::Type(
                "options must enable at least one of childList, attributes or characterData".into(),
            ));
        }
        if self.attribute_old_value && !self.wants_attributes() {
            return Err(DomError::Type(
                "attributeOldValue requires attributes".into(),
            ));
        }
        if self.attribute_filter.is_some() && !self.wants_attributes() {
            return Err(DomError::Type("attributeFilter requires attributes".into()));
        }
        if self.character_data_old_value && !self.wants_character_data() {
            return Err(DomError::Type(
                "characterDataOldValue requires characterData".into(),
            ));
        }
        Ok(self)
    }

    #[inline]
    pub fn wants_attributes(&self) -> bool {
        self.attributes == Some(true)
    }

    #[inline]
    pub fn wants_character_data(&self) -> bool {
        self.character_data == Some(true)
    }

    /// Whether a record of this shape is of interest
    fn accepts(&self, record: &MutationRecord) -> bool {
        match record.mutation_type {
            MutationType::ChildList => self.child_list,
            MutationType::CharacterData => self.wants_character_data(),
            MutationType::Attributes => {
                if !self.wants_attributes() {
                    return false;
                }
                match &self.attribute_filter {
                    None => true,
                    Some(filter) => {
                        record.attribute_namespace.is_none()
                            && record
                                .attribute_name
                                .as_deref()
                                .is_some_and(|name| filter.iter().any(|f| f == name))
                    }
                }
            }
        }
    }

    fn wants_old_value(&self, kind: MutationType) -> bool {
        match kind {
            MutationType::Attributes => self.attribute_old_value,
            MutationType::CharacterData => self.character_data_old_value,
            MutationType::ChildList => false,
        }
    }
}

/// Mutation record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub mutation_type: MutationType,
    pub target: NodeId,
    pub added_nodes: Vec<NodeId>,
    pub removed_nodes: Vec<NodeId>,
    pub previous_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    pub attribute_name: Option<String>,
    pub attribute_namespace: Option<String>,
    pub old_value: Option<String>,
}

impl MutationRecord {
    pub(crate) fn child_list(
        target: NodeId,
        added_nodes: Vec<NodeId>,
        removed_nodes: Vec<NodeId>,
        previous_sibling: Option<NodeId>,
        next_sibling: Option<NodeId>,
    ) -> Self {
        Self {
            mutation_type: MutationType::ChildList,
            target,
            added_nodes,
            removed_nodes,
            previous_sibling,
            next_sibling,
            attribute_name: None,
            attribute_namespace: None,
            old_value: None,
        }
    }

    pub(crate) fn attributes(
        target: NodeId,
        name: &str,
        namespace: Option<&str>,
        old_value: Option<String>,
    ) -> Self {
        Self {
            mutation_type: MutationType::Attributes,
            target,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            previous_sibling: None,
            next_sibling: None,
            attribute_name: Some(name.to_string()),
            attribute_namespace: namespace.map(str::to_string),
            old_value,
        }
    }

    pub(crate) fn character_data(target: NodeId, old_value: String) -> Self {
        Self {
            mutation_type: MutationType::CharacterData,
            target,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            previous_sibling: None,
            next_sibling: None,
            attribute_name: None,
            attribute_namespace: None,
            old_value: Some(old_value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationType {
    Attributes,
    CharacterData,
    ChildList,
}

/// Registration of an observer on a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredObserver {
    pub observer: ObserverId,
    pub options: MutationObserverInit,
    /// For transient registrations: the node holding the registration it
    /// was derived from
    pub source: Option<NodeId>,
}

impl RegisteredObserver {
    #[inline]
    pub fn is_transient(&self) -> bool {
        self.source.is_some()
    }
}

/// Mutation observer state, owned by the tree
pub(crate) struct MutationObserver {
    /// Taken out while the callback runs
    callback: Option<MutationCallback>,
    record_queue: VecDeque<MutationRecord>,
    /// Nodes holding a (non-transient) registration for this observer
    node_list: Vec<NodeId>,
    /// Nodes holding transient registrations for this observer
    transients: Vec<NodeId>,
}

impl fmt::Debug for MutationObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationObserver")
            .field("records", &self.record_queue.len())
            .field("node_list", &self.node_list)
            .field("transients", &self.transients)
            .finish()
    }
}

impl DomTree {
    /// Create a mutation observer
    pub fn create_mutation_observer(
        &mut self,
        callback: impl FnMut(&mut DomTree, &[MutationRecord], ObserverId) -> anyhow::Result<()>
        + 'static,
    ) -> ObserverId {
        let id = ObserverId(self.observers.len() as u32);
        self.observers.push(Some(MutationObserver {
            callback: Some(Box::new(callback)),
            record_queue: VecDeque::new(),
            node_list: Vec::new(),
            transients: Vec::new(),
        }));
        id
    }

    fn observer_mut(&mut self, id: ObserverId) -> Option<&mut MutationObserver> {
        self.observers.get_mut(id.index()).and_then(Option::as_mut)
    }

    fn observer_ref(&self, id: ObserverId) -> Option<&MutationObserver> {
        self.observers.get(id.index()).and_then(Option::as_ref)
    }

    /// Observe `target` with `options`.
    ///
    /// Observing the same target again replaces the options of the existing
    /// registration and drops the transient registrations derived from it.
    pub fn observe(
        &mut self,
        observer: ObserverId,
        target: NodeId,
        options: MutationObserverInit,
    ) -> DomResult<()> {
        if self.observer_ref(observer).is_none() {
            return Err(DomError::InvalidState);
        }
        let options = options.normalize().inspect_err(|e| {
            tracing::warn!("Rejected observer options for {:?}: {}", observer, e);
        })?;

        let existing = self
            .node(target)
            .registered_observers
            .iter()
            .position(|r| r.observer == observer && !r.is_transient());

        match existing {
            Some(position) => {
                self.remove_transient_observers(observer, Some(target));
                self.node_mut(target).registered_observers[position].options = options;
            }
            None => {
                self.node_mut(target).registered_observers.push(RegisteredObserver {
                    observer,
                    options,
                    source: None,
                });
                if let Some(slot) = self.observer_mut(observer) {
                    slot.node_list.push(target);
                }
            }
        }
        Ok(())
    }

    /// Remove every registration of `observer` and discard its queue
    pub fn disconnect(&mut self, observer: ObserverId) -> DomResult<()> {
        let slot = self.observer_mut(observer).ok_or(DomError::InvalidState)?;
        let mut nodes = std::mem::take(&mut slot.node_list);
        nodes.append(&mut slot.transients);
        slot.record_queue.clear();

        for node in nodes {
            self.node_mut(node)
                .registered_observers
                .retain(|r| r.observer != observer);
        }
        Ok(())
    }

    /// Drain the observer's record queue
    pub fn take_records(&mut self, observer: ObserverId) -> DomResult<Vec<MutationRecord>> {
        let slot = self.observer_mut(observer).ok_or(DomError::InvalidState)?;
        Ok(slot.record_queue.drain(..).collect())
    }

    /// Disconnect and free an observer; its handle becomes invalid
    pub fn drop_mutation_observer(&mut self, observer: ObserverId) -> DomResult<()> {
        self.disconnect(observer)?;
        self.pending_observers.retain(|&o| o != observer);
        self.observers[observer.index()] = None;
        Ok(())
    }

    /// Errors returned by observer callbacks since the last call.
    ///
    /// Only filled when `Config::retain_callback_errors` is set; the list
    /// grows until drained here.
    pub fn take_callback_errors(&mut self) -> Vec<CallbackError> {
        std::mem::take(&mut self.callback_errors)
    }

    /// Drop transient registrations of `observer`; all of them, or only the
    /// ones derived from the registration on `source`
    fn remove_transient_observers(&mut self, observer: ObserverId, source: Option<NodeId>) {
        let Some(slot) = self.observer_mut(observer) else {
            return;
        };
        let nodes = std::mem::take(&mut slot.transients);
        let mut still_held = Vec::new();

        for node in nodes {
            let list = &mut self.node_mut(node).registered_observers;
            list.retain(|r| {
                !(r.observer == observer
                    && r.is_transient()
                    && source.is_none_or(|s| r.source == Some(s)))
            });
            if list.iter().any(|r| r.observer == observer && r.is_transient()) {
                still_held.push(node);
            }
        }

        if let Some(slot) = self.observer_mut(observer) {
            slot.transients = still_held;
        }
    }

    /// Keep a removed node observable by its former ancestors' subtree
    /// observers until the next notification pass
    pub(crate) fn add_transient_observers(&mut self, parent: NodeId, node: NodeId) {
        let mut transients = Vec::new();
        for ancestor in self.inclusive_ancestors(parent) {
            for registered in &self.node(ancestor).registered_observers {
                if registered.options.subtree {
                    transients.push(RegisteredObserver {
                        observer: registered.observer,
                        options: registered.options.clone(),
                        source: Some(registered.source.unwrap_or(ancestor)),
                    });
                }
            }
        }

        for registered in transients {
            let observer = registered.observer;
            self.node_mut(node).registered_observers.push(registered);
            if let Some(slot) = self.observer_mut(observer) {
                if !slot.transients.contains(&node) {
                    slot.transients.push(node);
                }
            }
        }
    }

    /// Queue `record` on every interested observer of its target.
    ///
    /// Each observer gets at most one copy; the old value is kept only for
    /// observers that asked for it.
    pub(crate) fn queue_mutation_record(&mut self, record: MutationRecord) {
        let target = record.target;
        let mut interested: Vec<(ObserverId, Option<String>)> = Vec::new();

        for node in self.inclusive_ancestors(target) {
            for registered in &self.node(node).registered_observers {
                let options = &registered.options;
                if node != target && !options.subtree {
                    continue;
                }
                if !options.accepts(&record) {
                    continue;
                }
                let slot = match interested.iter().position(|(o, _)| *o == registered.observer) {
                    Some(i) => i,
                    None => {
                        interested.push((registered.observer, None));
                        interested.len() - 1
                    }
                };
                if options.wants_old_value(record.mutation_type) {
                    interested[slot].1 = record.old_value.clone();
                }
            }
        }

        if interested.is_empty() {
            return;
        }

        tracing::trace!(
            "Queued {:?} record on {:?} for {} observer(s)",
            record.mutation_type,
            target,
            interested.len()
        );

        for (observer, old_value) in interested {
            let Some(slot) = self.observer_mut(observer) else {
                continue;
            };
            let mut copy = record.clone();
            copy.old_value = old_value;
            slot.record_queue.push_back(copy);
            if !self.pending_observers.contains(&observer) {
                self.pending_observers.push(observer);
            }
        }
        self.queue_mutation_observer_microtask();
    }

    fn queue_mutation_observer_microtask(&mut self) {
        if self.notify_scheduled {
            return;
        }
        self.notify_scheduled = true;
        self.tasks.push(Microtask::NotifyMutationObservers);
    }

    /// One notification pass
    pub(crate) fn notify_mutation_observers(&mut self) {
        self.notify_scheduled = false;
        let pending = std::mem::take(&mut self.pending_observers);

        for observer in pending {
            let Some(slot) = self.observer_mut(observer) else {
                continue;
            };
            let records: Vec<MutationRecord> = slot.record_queue.drain(..).collect();
            self.remove_transient_observers(observer, None);
            if !records.is_empty() {
                self.tasks.push(Microtask::DeliverRecords { observer, records });
            }
        }
    }

    /// Invoke an observer's callback; errors are reported, not propagated
    pub(crate) fn deliver_records(&mut self, observer: ObserverId, records: Vec<MutationRecord>) {
        let Some(mut callback) = self.observer_mut(observer).and_then(|o| o.callback.take()) else {
            return;
        };

        let result = callback(self, &records, observer);

        // The callback may have dropped its own observer
        if let Some(slot) = self.observer_mut(observer) {
            slot.callback = Some(callback);
        }

        if let Err(error) = result {
            tracing::error!("Mutation observer {:?} callback failed: {:#}", observer, error);
            if self.config.retain_callback_errors {
                self.callback_errors.push(CallbackError { observer, error });
            }
        }
    }
}
