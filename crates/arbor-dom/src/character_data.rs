//! Character Data
//!
//! Edits on text, CDATA, comment and processing instruction data, plus
//! the two text-structural operations (split and normalize). Offsets and
//! counts are in characters; the stored `String` is spliced at the
//! matching byte positions.

use crate::node::NodeData;
use crate::range::BoundaryPoint;
use crate::{DomError, DomResult, DomTree, MutationRecord, NodeId};

/// Byte position of the `chars`-th character of `s`
fn byte_offset(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map_or(s.len(), |(i, _)| i)
}

impl DomTree {
    /// Character data of a node
    pub fn data(&self, node: NodeId) -> DomResult<&str> {
        self.node(node)
            .character_data()
            .ok_or(DomError::InvalidNodeType)
    }

    fn checked_data_range(&self, node: NodeId, offset: usize) -> DomResult<usize> {
        let data = self.data(node)?;
        let length = data.chars().count();
        if offset > length {
            return Err(DomError::IndexSize { offset, length });
        }
        Ok(length)
    }

    /// Replace `count` characters at `offset` with `data`
    pub fn replace_data(
        &mut self,
        node: NodeId,
        offset: usize,
        count: usize,
        data: &str,
    ) -> DomResult<()> {
        let length = self.checked_data_range(node, offset)?;
        let count = count.min(length - offset);
        self.replace_data_unchecked(node, offset, count, data);
        Ok(())
    }

    /// `offset + count` must lie within the node's data
    pub(crate) fn replace_data_unchecked(
        &mut self,
        node: NodeId,
        offset: usize,
        count: usize,
        data: &str,
    ) {
        let Some(old_value) = self.node(node).character_data().map(str::to_string) else {
            return;
        };
        self.queue_mutation_record(MutationRecord::character_data(node, old_value));

        if let Some(s) = self.node_mut(node).character_data_mut() {
            let start = byte_offset(s, offset);
            let end = byte_offset(s, offset + count);
            s.replace_range(start..end, data);
        }

        let inserted = data.chars().count();
        self.patch_live_ranges(node, |_, point| {
            if point.node != node || point.offset <= offset {
                None
            } else if point.offset <= offset + count {
                Some(BoundaryPoint::new(node, offset))
            } else {
                Some(BoundaryPoint::new(node, point.offset - count + inserted))
            }
        });
    }

    /// Up to `count` characters starting at `offset`
    pub fn substring_data(&self, node: NodeId, offset: usize, count: usize) -> DomResult<String> {
        self.checked_data_range(node, offset)?;
        Ok(self.data(node)?.chars().skip(offset).take(count).collect())
    }

    pub fn append_data(&mut self, node: NodeId, data: &str) -> DomResult<()> {
        let length = self.checked_data_range(node, 0)?;
        self.replace_data(node, length, 0, data)
    }

    pub fn insert_data(&mut self, node: NodeId, offset: usize, data: &str) -> DomResult<()> {
        self.replace_data(node, offset, 0, data)
    }

    pub fn delete_data(&mut self, node: NodeId, offset: usize, count: usize) -> DomResult<()> {
        self.replace_data(node, offset, count, "")
    }

    /// Replace the whole data
    pub fn set_data(&mut self, node: NodeId, data: &str) -> DomResult<()> {
        let length = self.checked_data_range(node, 0)?;
        self.replace_data(node, 0, length, data)
    }

    /// Split a text or CDATA node at `offset`; the tail becomes the next
    /// sibling. Returns the new node.
    pub fn split_text(&mut self, node: NodeId, offset: usize) -> DomResult<NodeId> {
        if !self.node(node).is_text() {
            return Err(DomError::InvalidNodeType);
        }
        let length = self.checked_data_range(node, offset)?;
        let count = length - offset;
        let tail = self.substring_data(node, offset, count)?;

        let data = match self.node(node).data {
            NodeData::CDataSection(_) => NodeData::CDataSection(tail),
            _ => NodeData::Text(tail),
        };
        let document = self.owner_document(node);
        let new_node = self.push_node(Some(document), data);

        if let Some(parent) = self.parent(node) {
            let next = self.next_sibling(node);
            self.insert(new_node, parent, next, false);

            self.patch_live_ranges(node, |_, point| {
                (point.node == node && point.offset > offset)
                    .then(|| BoundaryPoint::new(new_node, point.offset - offset))
            });
            let index = self.index(node);
            self.patch_live_ranges(node, |_, point| {
                (point.node == parent && point.offset == index + 1)
                    .then(|| BoundaryPoint::new(parent, index + 2))
            });
        }

        self.replace_data_unchecked(node, offset, count, "");
        Ok(new_node)
    }

    /// Remove empty text nodes under `root` and merge adjacent ones
    pub fn normalize(&mut self, root: NodeId) {
        let texts: Vec<NodeId> = self
            .descendants(root)
            .filter(|&id| self.node(id).is_exclusive_text())
            .collect();

        for node in texts {
            // Absorbed by an earlier sibling
            if node == root || !self.is_inclusive_ancestor(root, node) {
                continue;
            }

            let length = self.length(node);
            if length == 0 {
                self.remove(node, false);
                continue;
            }

            let absorbed: Vec<NodeId> =
                std::iter::successors(self.next_sibling(node), |&n| self.next_sibling(n))
                    .take_while(|&n| self.node(n).is_exclusive_text())
                    .collect();
            if absorbed.is_empty() {
                continue;
            }

            let data: String = absorbed
                .iter()
                .filter_map(|&n| self.node(n).character_data())
                .collect();
            self.replace_data_unchecked(node, length, 0, &data);

            let mut current_length = length;
            for &sibling in &absorbed {
                let Some(parent) = self.parent(sibling) else {
                    continue;
                };
                let index = self.index(sibling);
                self.patch_live_ranges(node, |_, point| {
                    if point.node == sibling {
                        Some(BoundaryPoint::new(node, point.offset + current_length))
                    } else if point.node == parent && point.offset == index {
                        Some(BoundaryPoint::new(node, current_length))
                    } else {
                        None
                    }
                });
                current_length += self.length(sibling);
            }

            for sibling in absorbed {
                self.remove(sibling, false);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(text: &str) -> (DomTree, NodeId, NodeId, NodeId) {
        let mut tree = DomTree::new();
        let doc = tree.create_document();
        let root = tree.create_element(doc, "root");
        let node = tree.create_text_node(doc, text);
        tree.append(root, doc).unwrap();
        tree.append(node, root).unwrap();
        (tree, doc, root, node)
    }

    #[test]
    fn test_byte_offset() {
        assert_eq!(byte_offset("héllo", 2), 3);
        assert_eq!(byte_offset("héllo", 5), 6);
        assert_eq!(byte_offset("", 0), 0);
    }

    #[test]
    fn test_replace_data() {
        let (mut tree, _, _, node) = setup("hello world");
        tree.replace_data(node, 6, 5, "there").unwrap();
        assert_eq!(tree.data(node), Ok("hello there"));

        // Count is clamped
        tree.replace_data(node, 5, 100, "!").unwrap();
        assert_eq!(tree.data(node), Ok("hello!"));

        assert_eq!(
            tree.replace_data(node, 7, 0, "x"),
            Err(DomError::IndexSize { offset: 7, length: 6 })
        );
    }

    #[test]
    fn test_data_helpers() {
        let (mut tree, _, root, node) = setup("héllo");
        assert_eq!(tree.substring_data(node, 1, 3).unwrap(), "éll");
        tree.append_data(node, "!").unwrap();
        tree.insert_data(node, 0, ">").unwrap();
        tree.delete_data(node, 1, 1).unwrap();
        assert_eq!(tree.data(node), Ok(">éllo!"));
        tree.set_data(node, "bye").unwrap();
        assert_eq!(tree.data(node), Ok("bye"));
        assert_eq!(tree.data(root), Err(DomError::InvalidNodeType));
    }

    #[test]
    fn test_replace_data_patches_ranges() {
        let (mut tree, doc, _, node) = setup("abcdefgh");
        let inside = tree.create_range(doc);
        tree.set_start(inside, node, 3).unwrap();
        tree.set_end(inside, node, 3).unwrap();
        let beyond = tree.create_range(doc);
        tree.set_start(beyond, node, 7).unwrap();
        tree.set_end(beyond, node, 7).unwrap();

        // Replace "cde" with "X"
        tree.replace_data(node, 2, 3, "X").unwrap();
        assert_eq!(tree.range(inside).unwrap().start_offset(), 2);
        assert_eq!(tree.range(beyond).unwrap().start_offset(), 5);
    }

    #[test]
    fn test_split_text() {
        let (mut tree, doc, root, node) = setup("text");
        let range = tree.create_range(doc);
        tree.set_start(range, node, 3).unwrap();
        tree.set_end(range, root, 1).unwrap();

        let tail = tree.split_text(node, 2).unwrap();
        assert_eq!(tree.data(node), Ok("te"));
        assert_eq!(tree.data(tail), Ok("xt"));
        assert_eq!(tree.next_sibling(node), Some(tail));

        let r = tree.range(range).unwrap();
        assert_eq!(r.start(), BoundaryPoint::new(tail, 1));
        assert_eq!(r.end(), BoundaryPoint::new(root, 2));
    }

    #[test]
    fn test_split_detached_text() {
        let mut tree = DomTree::new();
        let doc = tree.create_document();
        let cdata = tree.create_cdata_section(doc, "abc");
        let tail = tree.split_text(cdata, 1).unwrap();

        assert_eq!(tree.data(cdata), Ok("a"));
        assert_eq!(tree.data(tail), Ok("bc"));
        assert!(tree.node(tail).is_text());
        assert!(!tree.node(tail).is_exclusive_text());
        assert_eq!(tree.parent(tail), None);

        let comment = tree.create_comment(doc, "c");
        assert_eq!(tree.split_text(comment, 0), Err(DomError::InvalidNodeType));
    }

    #[test]
    fn test_normalize_merges_and_drops_empty() {
        let (mut tree, doc, root, first) = setup("ab");
        let empty = tree.create_text_node(doc, "");
        let second = tree.create_text_node(doc, "cd");
        let element = tree.create_element(doc, "br");
        let third = tree.create_text_node(doc, "ef");
        tree.append(empty, root).unwrap();
        tree.append(second, root).unwrap();
        tree.append(element, root).unwrap();
        tree.append(third, root).unwrap();

        let range = tree.create_range(doc);
        tree.set_start(range, second, 1).unwrap();
        tree.set_end(range, root, 3).unwrap();

        tree.normalize(root);

        assert_eq!(tree.children(root).collect::<Vec<_>>(), vec![first, element, third]);
        assert_eq!(tree.data(first), Ok("abcd"));
        let r = tree.range(range).unwrap();
        assert_eq!(r.start(), BoundaryPoint::new(first, 3));
        assert_eq!(r.end(), BoundaryPoint::new(root, 1));
    }
}
