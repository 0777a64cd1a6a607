//! Microtask Queue
//!
//! Deferred work for the observer pipeline. Mutations only ever push onto
//! the queue; the host drains it at an idle point with
//! [`DomTree::perform_microtask_checkpoint`], so callbacks never run in the
//! middle of a mutation algorithm.

use std::collections::VecDeque;
use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::{DomTree, MutationRecord, ObserverId};

/// Unit of deferred work
pub enum Microtask {
    /// Drain every pending observer and schedule its delivery
    NotifyMutationObservers,
    /// Invoke one observer's callback with drained records
    DeliverRecords {
        observer: ObserverId,
        records: Vec<MutationRecord>,
    },
    /// Host-supplied work
    Callback(Box<dyn FnOnce(&mut DomTree)>),
}

impl Microtask {
    /// Task name (for debugging)
    pub fn name(&self) -> &'static str {
        match self {
            Self::NotifyMutationObservers => "notify-mutation-observers",
            Self::DeliverRecords { .. } => "deliver-records",
            Self::Callback(_) => "callback",
        }
    }
}

impl fmt::Debug for Microtask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeliverRecords { observer, records } => f
                .debug_struct("DeliverRecords")
                .field("observer", observer)
                .field("records", &records.len())
                .finish(),
            other => f.write_str(other.name()),
        }
    }
}

/// Cooperative single-threaded executor interface.
///
/// Any run-to-completion queue works; tasks must come back out of `pop`
/// in the order they were pushed.
pub trait TaskQueue: fmt::Debug {
    /// Schedule a task
    fn push(&mut self, task: Microtask);

    /// Next task to run
    fn pop(&mut self) -> Option<Microtask>;

    /// Number of queued tasks
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Default FIFO queue
#[derive(Debug, Default)]
pub struct FifoTaskQueue {
    tasks: VecDeque<Microtask>,
}

impl FifoTaskQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskQueue for FifoTaskQueue {
    fn push(&mut self, task: Microtask) {
        self.tasks.push_back(task);
    }

    fn pop(&mut self) -> Option<Microtask> {
        self.tasks.pop_front()
    }

    fn len(&self) -> usize {
        self.tasks.len()
    }
}

/// Marks a checkpoint as running; the flag is cleared on drop, also when a
/// task panics
struct CheckpointGuard<'a> {
    tree: &'a mut DomTree,
}

impl<'a> CheckpointGuard<'a> {
    fn enter(tree: &'a mut DomTree) -> Self {
        tree.performing_checkpoint = true;
        Self { tree }
    }
}

impl Deref for CheckpointGuard<'_> {
    type Target = DomTree;

    fn deref(&self) -> &DomTree {
        self.tree
    }
}

impl DerefMut for CheckpointGuard<'_> {
    fn deref_mut(&mut self) -> &mut DomTree {
        self.tree
    }
}

impl Drop for CheckpointGuard<'_> {
    fn drop(&mut self) {
        self.tree.performing_checkpoint = false;
    }
}

impl DomTree {
    /// Schedule host work to run at the next checkpoint
    pub fn queue_microtask(&mut self, task: impl FnOnce(&mut DomTree) + 'static) {
        self.tasks.push(Microtask::Callback(Box::new(task)));
    }

    /// True if deferred work is waiting
    pub fn has_pending_microtasks(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Run queued microtasks until the queue is empty (or the configured
    /// cap is reached). Returns the number of tasks run.
    ///
    /// Calls made from inside a running task return 0 immediately.
    pub fn perform_microtask_checkpoint(&mut self) -> usize {
        if self.performing_checkpoint {
            return 0;
        }
        let mut tree = CheckpointGuard::enter(self);

        let limit = tree.config.max_microtasks_per_checkpoint;
        let mut ran = 0;
        while limit.is_none_or(|max| ran < max) {
            let Some(task) = tree.tasks.pop() else {
                break;
            };
            tracing::trace!("Running microtask {}", task.name());
            tree.run_microtask(task);
            ran += 1;
        }
        ran
    }

    fn run_microtask(&mut self, task: Microtask) {
        match task {
            Microtask::NotifyMutationObservers => self.notify_mutation_observers(),
            Microtask::DeliverRecords { observer, records } => {
                self.deliver_records(observer, records)
            }
            Microtask::Callback(callback) => callback(self),
        }
    }
}
