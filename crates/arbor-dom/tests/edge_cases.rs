//! Edge case tests for arbor-dom
//!
//! Boundary conditions of the mutation algorithms, ranges and the observer
//! pipeline.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::rc::Rc;

use arbor_dom::{
    BoundaryPoint, Config, DomError, DomTree, Microtask, MutationObserverInit, MutationType,
    NodeId, RangeCompare, TaskQueue,
};

fn document_with_root(tree: &mut DomTree) -> (NodeId, NodeId) {
    let doc = tree.create_document();
    let root = tree.create_element(doc, "root");
    tree.append_child(doc, root).unwrap();
    (doc, root)
}

fn child_list() -> MutationObserverInit {
    MutationObserverInit {
        child_list: true,
        ..Default::default()
    }
}

// ============================================================================
// MUTATION EDGE CASES
// ============================================================================

#[test]
fn test_replace_child_with_itself() {
    let mut tree = DomTree::new();
    let (doc, root) = document_with_root(&mut tree);
    let a = tree.create_element(doc, "a");
    let b = tree.create_element(doc, "b");
    tree.append_nodes(root, &[a, b]).unwrap();

    assert_eq!(tree.replace_child(root, a, a), Ok(a));
    assert_eq!(tree.children(root).collect::<Vec<_>>(), vec![a, b]);
}

#[test]
fn test_replace_with_previous_sibling_record() {
    let mut tree = DomTree::new();
    let (doc, root) = document_with_root(&mut tree);
    let a = tree.create_element(doc, "a");
    let b = tree.create_element(doc, "b");
    let c = tree.create_element(doc, "c");
    tree.append_nodes(root, &[a, b, c]).unwrap();

    let observer = tree.create_mutation_observer(|_, _, _| Ok(()));
    tree.observe(observer, root, child_list()).unwrap();

    // b takes the place of c; b was c's previous sibling
    tree.replace_child(root, b, c).unwrap();
    assert_eq!(tree.children(root).collect::<Vec<_>>(), vec![a, b]);

    let records = tree.take_records(observer).unwrap();
    // Removal of b from its old spot, then the combined replace record
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].removed_nodes, vec![b]);
    assert_eq!(records[1].removed_nodes, vec![c]);
    assert_eq!(records[1].added_nodes, vec![b]);
    assert_eq!(records[1].previous_sibling, Some(a));
    assert_eq!(records[1].next_sibling, None);
}

#[test]
fn test_fragment_children_removals_recorded_on_fragment() {
    let mut tree = DomTree::new();
    let (doc, root) = document_with_root(&mut tree);
    let fragment = tree.create_document_fragment(doc);
    let x = tree.create_element(doc, "x");
    let y = tree.create_element(doc, "y");
    tree.append_nodes(fragment, &[x, y]).unwrap();

    let observer = tree.create_mutation_observer(|_, _, _| Ok(()));
    tree.observe(observer, fragment, child_list()).unwrap();
    tree.observe(observer, root, child_list()).unwrap();

    tree.append_child(root, fragment).unwrap();

    let records = tree.take_records(observer).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].target, fragment);
    assert_eq!(records[0].removed_nodes, vec![x]);
    assert_eq!(records[1].removed_nodes, vec![y]);
    assert_eq!(records[2].target, root);
    assert_eq!(records[2].added_nodes, vec![x, y]);
}

#[test]
fn test_empty_fragment_insert_is_noop() {
    let mut tree = DomTree::new();
    let (doc, root) = document_with_root(&mut tree);
    let observer = tree.create_mutation_observer(|_, _, _| Ok(()));
    tree.observe(observer, root, child_list()).unwrap();

    let fragment = tree.create_document_fragment(doc);
    tree.append_child(root, fragment).unwrap();
    assert!(!tree.has_child_nodes(root));
    assert!(tree.take_records(observer).unwrap().is_empty());
}

#[test]
fn test_remove_child_of_other_parent() {
    let mut tree = DomTree::new();
    let (doc, root) = document_with_root(&mut tree);
    let a = tree.create_element(doc, "a");
    let b = tree.create_element(doc, "b");
    tree.append_child(root, a).unwrap();
    tree.append_child(a, b).unwrap();

    assert_eq!(tree.remove_child(root, b), Err(DomError::NotFound));
    assert_eq!(tree.parent(b), Some(a));
}

#[test]
fn test_adopting_attribute_detaches_it() {
    let mut tree = DomTree::new();
    let (doc, root) = document_with_root(&mut tree);
    tree.set_attribute(root, "id", "x").unwrap();
    let attr = tree.attributes(root).unwrap()[0];
    let other = tree.create_document();

    tree.adopt_node(other, attr).unwrap();
    assert!(tree.attributes(root).unwrap().is_empty());
    assert_eq!(tree.owner_document(attr), other);
    assert_ne!(tree.owner_document(attr), doc);
}

// ============================================================================
// RANGE EDGE CASES
// ============================================================================

#[test]
fn test_set_start_in_other_tree_collapses() {
    let mut tree = DomTree::new();
    let (doc, root) = document_with_root(&mut tree);
    let loose = tree.create_element(doc, "loose");

    let range = tree.create_range(doc);
    tree.select_node_contents(range, root).unwrap();
    tree.set_start(range, loose, 0).unwrap();

    let r = tree.range(range).unwrap();
    assert!(r.collapsed());
    assert_eq!(r.end(), BoundaryPoint::new(loose, 0));
}

#[test]
fn test_compare_boundary_points_how() {
    let mut tree = DomTree::new();
    let (doc, root) = document_with_root(&mut tree);
    let text = tree.create_text_node(doc, "0123456789");
    tree.append_child(root, text).unwrap();

    let left = tree.create_range(doc);
    tree.set_start(left, text, 0).unwrap();
    tree.set_end(left, text, 4).unwrap();
    let right = tree.create_range(doc);
    tree.set_start(right, text, 4).unwrap();
    tree.set_end(right, text, 8).unwrap();

    // left.end vs right.start
    assert_eq!(
        tree.compare_boundary_points(left, RangeCompare::StartToEnd, right),
        Ok(Ordering::Equal)
    );
    // left.start vs right.end
    assert_eq!(
        tree.compare_boundary_points(left, RangeCompare::EndToStart, right),
        Ok(Ordering::Less)
    );
    assert_eq!(
        tree.compare_boundary_points(right, RangeCompare::EndToEnd, left),
        Ok(Ordering::Greater)
    );
}

#[test]
fn test_detached_range_rejects_use() {
    let mut tree = DomTree::new();
    let (doc, root) = document_with_root(&mut tree);
    let range = tree.create_range(doc);
    tree.detach_range(range).unwrap();

    assert_eq!(tree.set_start(range, root, 0), Err(DomError::InvalidState));
    assert_eq!(tree.is_point_in_range(range, root, 0), Err(DomError::InvalidState));
    assert!(tree.live_ranges(doc).is_empty());

    // Later edits do not touch it
    let a = tree.create_element(doc, "a");
    tree.append_child(root, a).unwrap();
    assert!(tree.range(range).is_none());
}

#[test]
fn test_unicode_offsets() {
    let mut tree = DomTree::new();
    let (doc, root) = document_with_root(&mut tree);
    let text = tree.create_text_node(doc, "añb🚀c");
    tree.append_child(root, text).unwrap();
    assert_eq!(tree.get(text).unwrap().length(), 5);

    let range = tree.create_range(doc);
    tree.set_start(range, text, 4).unwrap();

    let tail = tree.split_text(text, 3).unwrap();
    assert_eq!(tree.data(text), Ok("añb"));
    assert_eq!(tree.data(tail), Ok("🚀c"));
    assert_eq!(tree.range(range).unwrap().start(), BoundaryPoint::new(tail, 1));

    tree.replace_data(tail, 0, 1, "é").unwrap();
    assert_eq!(tree.data(tail), Ok("éc"));
}

#[test]
fn test_split_at_end_and_beyond() {
    let mut tree = DomTree::new();
    let (doc, root) = document_with_root(&mut tree);
    let text = tree.create_text_node(doc, "abc");
    tree.append_child(root, text).unwrap();

    assert_eq!(
        tree.split_text(text, 4),
        Err(DomError::IndexSize { offset: 4, length: 3 })
    );
    let tail = tree.split_text(text, 3).unwrap();
    assert_eq!(tree.data(tail), Ok(""));
    assert_eq!(tree.last_child(root), Some(tail));
}

#[test]
fn test_range_at_parent_after_split() {
    let mut tree = DomTree::new();
    let (doc, root) = document_with_root(&mut tree);
    let text = tree.create_text_node(doc, "abcd");
    let tail_element = tree.create_element(doc, "after");
    tree.append_nodes(root, &[text, tail_element]).unwrap();

    // (root, 1) sits between the text and the element
    let range = tree.create_range(doc);
    tree.set_start(range, root, 1).unwrap();

    let tail = tree.split_text(text, 2).unwrap();
    assert_eq!(tree.index(tail), 1);
    assert_eq!(tree.range(range).unwrap().start(), BoundaryPoint::new(root, 2));
}

// ============================================================================
// OBSERVER EDGE CASES
// ============================================================================

#[test]
fn test_invalid_observer_options() {
    let mut tree = DomTree::new();
    let (_, root) = document_with_root(&mut tree);
    let observer = tree.create_mutation_observer(|_, _, _| Ok(()));

    let nothing = MutationObserverInit::default();
    assert!(matches!(tree.observe(observer, root, nothing), Err(DomError::Type(_))));

    let contradiction = MutationObserverInit {
        attributes: Some(false),
        attribute_old_value: true,
        ..Default::default()
    };
    assert!(matches!(tree.observe(observer, root, contradiction), Err(DomError::Type(_))));

    let filter_without_attributes = MutationObserverInit {
        child_list: true,
        attributes: Some(false),
        attribute_filter: Some(vec!["id".into()]),
        ..Default::default()
    };
    assert!(matches!(
        tree.observe(observer, root, filter_without_attributes),
        Err(DomError::Type(_))
    ));
    assert!(tree.get(root).unwrap().registered_observers().is_empty());
}

#[test]
fn test_attribute_filter_ignores_namespaced() {
    let mut tree = DomTree::new();
    let (_, root) = document_with_root(&mut tree);
    let observer = tree.create_mutation_observer(|_, _, _| Ok(()));
    tree.observe(
        observer,
        root,
        MutationObserverInit {
            attribute_filter: Some(vec!["href".into()]),
            ..Default::default()
        },
    )
    .unwrap();

    tree.set_attribute(root, "href", "a").unwrap();
    tree.set_attribute(root, "title", "t").unwrap();
    tree.set_attribute_ns(root, Some("http://www.w3.org/1999/xlink"), "xlink:href", "b")
        .unwrap();

    let records = tree.take_records(observer).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].attribute_name.as_deref(), Some("href"));
    assert_eq!(records[0].attribute_namespace, None);
}

#[test]
fn test_disconnect_discards_pending_records() {
    let mut tree = DomTree::new();
    let (doc, root) = document_with_root(&mut tree);
    let calls = Rc::new(RefCell::new(0));
    let seen = calls.clone();
    let observer = tree.create_mutation_observer(move |_, _, _| {
        *seen.borrow_mut() += 1;
        Ok(())
    });
    tree.observe(observer, root, child_list()).unwrap();

    let a = tree.create_element(doc, "a");
    tree.append_child(root, a).unwrap();
    tree.disconnect(observer).unwrap();
    tree.perform_microtask_checkpoint();

    assert_eq!(*calls.borrow(), 0);
    assert!(tree.get(root).unwrap().registered_observers().is_empty());
}

#[test]
fn test_take_records_empties_before_pass() {
    let mut tree = DomTree::new();
    let (doc, root) = document_with_root(&mut tree);
    let calls = Rc::new(RefCell::new(0));
    let seen = calls.clone();
    let observer = tree.create_mutation_observer(move |_, _, _| {
        *seen.borrow_mut() += 1;
        Ok(())
    });
    tree.observe(observer, root, child_list()).unwrap();

    let a = tree.create_element(doc, "a");
    tree.append_child(root, a).unwrap();
    assert_eq!(tree.take_records(observer).unwrap().len(), 1);
    tree.perform_microtask_checkpoint();
    assert_eq!(*calls.borrow(), 0);
}

#[test]
fn test_dropped_observer_handle_is_invalid() {
    let mut tree = DomTree::new();
    let (_, root) = document_with_root(&mut tree);
    let observer = tree.create_mutation_observer(|_, _, _| Ok(()));
    tree.observe(observer, root, child_list()).unwrap();
    tree.drop_mutation_observer(observer).unwrap();

    assert_eq!(tree.observe(observer, root, child_list()), Err(DomError::InvalidState));
    assert!(matches!(tree.take_records(observer), Err(DomError::InvalidState)));
    assert!(tree.get(root).unwrap().registered_observers().is_empty());
}

#[test]
fn test_observer_dropping_itself_in_callback() {
    let mut tree = DomTree::new();
    let (doc, root) = document_with_root(&mut tree);
    let calls = Rc::new(RefCell::new(0));
    let seen = calls.clone();
    let observer = tree.create_mutation_observer(move |tree, _, me| {
        *seen.borrow_mut() += 1;
        tree.drop_mutation_observer(me)?;
        Ok(())
    });
    tree.observe(observer, root, child_list()).unwrap();

    let a = tree.create_element(doc, "a");
    tree.append_child(root, a).unwrap();
    tree.perform_microtask_checkpoint();
    let b = tree.create_element(doc, "b");
    tree.append_child(root, b).unwrap();
    tree.perform_microtask_checkpoint();

    assert_eq!(*calls.borrow(), 1);
    assert!(tree.take_callback_errors().is_empty());
}

#[test]
fn test_one_record_per_observer_across_registrations() {
    let mut tree = DomTree::new();
    let (doc, root) = document_with_root(&mut tree);
    let inner = tree.create_element(doc, "inner");
    tree.append_child(root, inner).unwrap();

    let observer = tree.create_mutation_observer(|_, _, _| Ok(()));
    let subtree = MutationObserverInit {
        attributes: Some(true),
        subtree: true,
        ..Default::default()
    };
    tree.observe(observer, root, subtree.clone()).unwrap();
    tree.observe(observer, inner, subtree).unwrap();

    tree.set_attribute(inner, "x", "1").unwrap();
    let records = tree.take_records(observer).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].mutation_type, MutationType::Attributes);
    assert_eq!(records[0].old_value, None);
}

#[test]
fn test_normalize_without_siblings_records_nothing() {
    let mut tree = DomTree::new();
    let (doc, root) = document_with_root(&mut tree);
    let text = tree.create_text_node(doc, "alone");
    tree.append_child(root, text).unwrap();

    let observer = tree.create_mutation_observer(|_, _, _| Ok(()));
    tree.observe(
        observer,
        root,
        MutationObserverInit {
            child_list: true,
            character_data: Some(true),
            subtree: true,
            ..Default::default()
        },
    )
    .unwrap();

    tree.normalize(root);
    assert!(tree.take_records(observer).unwrap().is_empty());
    assert_eq!(tree.data(text), Ok("alone"));
}

// ============================================================================
// SCHEDULING
// ============================================================================

#[test]
fn test_reentrant_observer_bounded_by_config() {
    let config = Config {
        max_microtasks_per_checkpoint: Some(10),
        ..Config::default()
    };
    let mut tree = DomTree::with_config(config);
    let (doc, root) = document_with_root(&mut tree);

    // Every delivery triggers another mutation
    let observer = tree.create_mutation_observer(move |tree, records, _| {
        let target = records[0].target;
        let node = tree.create_comment(doc, "again");
        tree.append_child(target, node)?;
        Ok(())
    });
    tree.observe(observer, root, child_list()).unwrap();

    let seed = tree.create_comment(doc, "seed");
    tree.append_child(root, seed).unwrap();

    assert_eq!(tree.perform_microtask_checkpoint(), 10);
    assert!(tree.has_pending_microtasks());
    // Notify and deliver alternate: five deliveries, five new children
    assert_eq!(tree.get(root).unwrap().child_count(), 6);
}

/// FIFO queue that counts scheduled tasks
#[derive(Debug, Default)]
struct CountingQueue {
    tasks: VecDeque<Microtask>,
    pushed: Rc<RefCell<usize>>,
}

impl TaskQueue for CountingQueue {
    fn push(&mut self, task: Microtask) {
        *self.pushed.borrow_mut() += 1;
        self.tasks.push_back(task);
    }

    fn pop(&mut self) -> Option<Microtask> {
        self.tasks.pop_front()
    }

    fn len(&self) -> usize {
        self.tasks.len()
    }
}

#[test]
fn test_custom_task_queue() {
    let pushed = Rc::new(RefCell::new(0));
    let queue = CountingQueue {
        tasks: VecDeque::new(),
        pushed: pushed.clone(),
    };
    let mut tree = DomTree::with_task_queue(Config::default(), Box::new(queue));
    let (doc, root) = document_with_root(&mut tree);
    let observer = tree.create_mutation_observer(|_, _, _| Ok(()));
    tree.observe(observer, root, child_list()).unwrap();

    // Three mutations, one notification pass
    for name in ["a", "b", "c"] {
        let node = tree.create_element(doc, name);
        tree.append_child(root, node).unwrap();
    }
    assert_eq!(*pushed.borrow(), 1);

    tree.perform_microtask_checkpoint();
    // The pass plus one delivery
    assert_eq!(*pushed.borrow(), 2);
}
