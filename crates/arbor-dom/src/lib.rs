//! arbor DOM - live XML document tree
//!
//! Arena-based node tree that keeps three structures consistent across
//! every edit:
//! - the mutation algorithms (insert, remove, replace, adopt)
//! - live ranges registered with their document
//! - mutation observers and their deferred notification pass
//!
//! Everything lives in a [`DomTree`] context; several documents can share
//! one context and nodes can be adopted between them.

mod attributes;
mod character_data;
mod config;
mod document;
mod interner;
mod microtask;
mod mutation;
mod node;
mod observer;
mod operations;
mod range;
mod tree;

pub use config::Config;
pub use interner::{Atom, StringInterner};
pub use microtask::{FifoTaskQueue, Microtask, TaskQueue};
pub use node::{
    AttrData, DoctypeData, DocumentData, ElementData, Node, NodeData, NodeType,
    ProcessingInstructionData,
};
pub use observer::{
    CallbackError, MutationCallback, MutationObserverInit, MutationRecord, MutationType,
    ObserverId, RegisteredObserver,
};
pub use range::{BoundaryPoint, Range, RangeCompare, RangeId};
pub use tree::{Ancestors, Children, Descendants, DomTree};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Node identifier (index into the arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    /// Raw arena slot
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
///
/// Every error is raised before the tree, any range or any observer queue
/// has been touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Illegal structural edit: wrong parent kind, cycle, disallowed child
    /// kind or document child ordering violation
    #[error("Hierarchy request error")]
    HierarchyRequest,

    /// Reference node is not a child of the given parent
    #[error("Node not found")]
    NotFound,

    /// Offset beyond a node's length
    #[error("Index size error: offset {offset} exceeds length {length}")]
    IndexSize { offset: usize, length: usize },

    /// Node kind not usable here (doctype boundary, parentless node, ...)
    #[error("Invalid node type")]
    InvalidNodeType,

    /// Comparison across different trees
    #[error("Wrong document")]
    WrongDocument,

    /// Operation not supported for this node (adopting a document, ...)
    #[error("Not supported")]
    NotSupported,

    /// Handle refers to a detached range or a dropped observer
    #[error("Invalid state")]
    InvalidState,

    /// Malformed argument, e.g. observer options
    #[error("Type error: {0}")]
    Type(String),
}
