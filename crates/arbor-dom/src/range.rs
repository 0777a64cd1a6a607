//! Live Ranges
//!
//! A range is a pair of boundary points registered with the document that
//! owns its containers. The mutation algorithms and the character data
//! operations walk that document's registry and patch each affected
//! boundary in place; a range never recomputes itself.
//!
//! The position comparator below is only used by the query operations.

use std::cmp::Ordering;

use crate::node::{NodeData, NodeType};
use crate::{DomError, DomResult, DomTree, NodeId};

/// Range handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RangeId(pub(crate) u32);

impl RangeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Range boundary point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundaryPoint {
    /// The container node
    pub node: NodeId,
    /// Offset within the container (characters for character data, child
    /// index otherwise)
    pub offset: usize,
}

impl BoundaryPoint {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// Range comparison types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeCompare {
    StartToStart,
    StartToEnd,
    EndToEnd,
    EndToStart,
}

/// Range - a contiguous part of a tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    start: BoundaryPoint,
    end: BoundaryPoint,
    /// Document whose registry holds this range
    document: NodeId,
}

impl Range {
    pub fn start(&self) -> BoundaryPoint {
        self.start
    }

    pub fn end(&self) -> BoundaryPoint {
        self.end
    }

    pub fn start_container(&self) -> NodeId {
        self.start.node
    }

    pub fn start_offset(&self) -> usize {
        self.start.offset
    }

    pub fn end_container(&self) -> NodeId {
        self.end.node
    }

    pub fn end_offset(&self) -> usize {
        self.end.offset
    }

    /// Check if the range is collapsed
    pub fn collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Document the range is registered with
    pub fn document(&self) -> NodeId {
        self.document
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Start,
    End,
}

impl DomTree {
    /// Create a collapsed range at (document, 0), registered with `document`
    pub fn create_range(&mut self, document: NodeId) -> RangeId {
        let document = self.owner_document(document);
        let point = BoundaryPoint::new(document, 0);
        let id = RangeId(self.ranges.len() as u32);
        self.ranges.push(Some(Range {
            start: point,
            end: point,
            document,
        }));
        self.track_range(document, id);
        id
    }

    /// Get a live range
    pub fn range(&self, id: RangeId) -> Option<&Range> {
        self.ranges.get(id.index()).and_then(Option::as_ref)
    }

    fn live_range(&self, id: RangeId) -> DomResult<&Range> {
        self.range(id).ok_or(DomError::InvalidState)
    }

    /// Live ranges registered with `document`
    pub fn live_ranges(&self, document: NodeId) -> &[RangeId] {
        match &self.node(self.owner_document(document)).data {
            NodeData::Document(data) => &data.ranges,
            _ => &[],
        }
    }

    /// Patch both boundary points of every range live in `node`'s document.
    ///
    /// `patch` returns the replacement point, or `None` to leave it alone.
    pub(crate) fn patch_live_ranges<F>(&mut self, node: NodeId, mut patch: F)
    where
        F: FnMut(&DomTree, BoundaryPoint) -> Option<BoundaryPoint>,
    {
        let ids = self.live_ranges(node).to_vec();
        for id in ids {
            let Some(range) = self.range(id) else {
                continue;
            };
            let (start, end) = (range.start, range.end);
            let new_start = patch(&*self, start);
            let new_end = patch(&*self, end);
            if new_start.is_none() && new_end.is_none() {
                continue;
            }
            if let Some(range) = self.ranges[id.index()].as_mut() {
                tracing::trace!("Repairing {:?}", id);
                if let Some(point) = new_start {
                    range.start = point;
                }
                if let Some(point) = new_end {
                    range.end = point;
                }
            }
        }
    }

    /// Move range registrations whose containers now belong to `to`
    pub(crate) fn migrate_ranges(&mut self, from: NodeId, to: NodeId) {
        let moved: Vec<RangeId> = self
            .live_ranges(from)
            .iter()
            .copied()
            .filter(|&id| {
                self.range(id)
                    .is_some_and(|r| self.owner_document(r.start.node) == to)
            })
            .collect();
        for id in moved {
            self.register_range(id, to);
        }
    }

    fn track_range(&mut self, document: NodeId, id: RangeId) {
        if let Some(data) = self.document_data_mut(document) {
            data.ranges.push(id);
        }
    }

    fn untrack_range(&mut self, document: NodeId, id: RangeId) {
        if let Some(data) = self.document_data_mut(document) {
            data.ranges.retain(|&r| r != id);
        }
    }

    fn register_range(&mut self, id: RangeId, document: NodeId) {
        let Some(old) = self.range(id).map(|r| r.document) else {
            return;
        };
        if old == document {
            return;
        }
        self.untrack_range(old, id);
        self.track_range(document, id);
        if let Some(range) = self.ranges[id.index()].as_mut() {
            range.document = document;
        }
    }

    // --- Boundary setters ---

    fn set_boundary(
        &mut self,
        id: RangeId,
        edge: Edge,
        node: NodeId,
        offset: usize,
    ) -> DomResult<()> {
        let range = self.live_range(id)?.clone();
        if self.node_type(node) == NodeType::DocumentType {
            return Err(DomError::InvalidNodeType);
        }
        let length = self.length(node);
        if offset > length {
            return Err(DomError::IndexSize { offset, length });
        }

        let point = BoundaryPoint::new(node, offset);
        let foreign = self.root(range.start.node) != self.root(node);
        let (start, end) = match edge {
            Edge::Start => {
                let end = if foreign || self.compare_points(point, range.end) == Ordering::Greater {
                    point
                } else {
                    range.end
                };
                (point, end)
            }
            Edge::End => {
                let start = if foreign
                    || self.compare_points(point, range.start) == Ordering::Less
                {
                    point
                } else {
                    range.start
                };
                (start, point)
            }
        };

        if let Some(range) = self.ranges[id.index()].as_mut() {
            range.start = start;
            range.end = end;
        }
        let document = self.owner_document(node);
        self.register_range(id, document);
        Ok(())
    }

    /// Set the start position
    pub fn set_start(&mut self, id: RangeId, node: NodeId, offset: usize) -> DomResult<()> {
        self.set_boundary(id, Edge::Start, node, offset)
    }

    /// Set the end position
    pub fn set_end(&mut self, id: RangeId, node: NodeId, offset: usize) -> DomResult<()> {
        self.set_boundary(id, Edge::End, node, offset)
    }

    fn parent_and_index(&self, node: NodeId) -> DomResult<(NodeId, usize)> {
        let parent = self.parent(node).ok_or(DomError::InvalidNodeType)?;
        Ok((parent, self.index(node)))
    }

    /// Set start before a node
    pub fn set_start_before(&mut self, id: RangeId, node: NodeId) -> DomResult<()> {
        let (parent, index) = self.parent_and_index(node)?;
        self.set_start(id, parent, index)
    }

    /// Set start after a node
    pub fn set_start_after(&mut self, id: RangeId, node: NodeId) -> DomResult<()> {
        let (parent, index) = self.parent_and_index(node)?;
        self.set_start(id, parent, index + 1)
    }

    /// Set end before a node
    pub fn set_end_before(&mut self, id: RangeId, node: NodeId) -> DomResult<()> {
        let (parent, index) = self.parent_and_index(node)?;
        self.set_end(id, parent, index)
    }

    /// Set end after a node
    pub fn set_end_after(&mut self, id: RangeId, node: NodeId) -> DomResult<()> {
        let (parent, index) = self.parent_and_index(node)?;
        self.set_end(id, parent, index + 1)
    }

    /// Collapse the range to one of its boundaries
    pub fn collapse(&mut self, id: RangeId, to_start: bool) -> DomResult<()> {
        let range = self.live_range(id)?;
        let point = if to_start { range.start } else { range.end };
        if to_start {
            self.set_end(id, point.node, point.offset)
        } else {
            self.set_start(id, point.node, point.offset)
        }
    }

    /// Select a node
    pub fn select_node(&mut self, id: RangeId, node: NodeId) -> DomResult<()> {
        self.live_range(id)?;
        let (parent, index) = self.parent_and_index(node)?;
        self.set_start(id, parent, index)?;
        self.set_end(id, parent, index + 1)
    }

    /// Select the contents of a node
    pub fn select_node_contents(&mut self, id: RangeId, node: NodeId) -> DomResult<()> {
        self.live_range(id)?;
        if self.node_type(node) == NodeType::DocumentType {
            return Err(DomError::InvalidNodeType);
        }
        let length = self.length(node);
        self.set_start(id, node, 0)?;
        self.set_end(id, node, length)
    }

    /// Clone this range as a new live range
    pub fn clone_range(&mut self, id: RangeId) -> DomResult<RangeId> {
        let range = self.live_range(id)?.clone();
        let clone = RangeId(self.ranges.len() as u32);
        let document = range.document;
        self.ranges.push(Some(range));
        self.track_range(document, clone);
        Ok(clone)
    }

    /// Stop tracking the range; its handle becomes invalid
    pub fn detach_range(&mut self, id: RangeId) -> DomResult<()> {
        let document = self.live_range(id)?.document;
        self.untrack_range(document, id);
        self.ranges[id.index()] = None;
        Ok(())
    }

    // --- Comparison ---

    /// Tree-order comparison of two boundary points sharing a root.
    ///
    /// Walks both ancestor chains down from the root to the last common
    /// ancestor. A point inside child `i` of that ancestor ranks at
    /// `2i + 1`, a point at offset `i` in the ancestor itself at `2i`.
    pub(crate) fn compare_points(&self, a: BoundaryPoint, b: BoundaryPoint) -> Ordering {
        if a.node == b.node {
            return a.offset.cmp(&b.offset);
        }

        let path_a: Vec<NodeId> = self.inclusive_ancestors(a.node).collect();
        let path_b: Vec<NodeId> = self.inclusive_ancestors(b.node).collect();
        let (mut depth_a, mut depth_b) = (path_a.len(), path_b.len());
        while depth_a > 1 && depth_b > 1 && path_a[depth_a - 2] == path_b[depth_b - 2] {
            depth_a -= 1;
            depth_b -= 1;
        }
        // path_x[depth_x - 1] is now the common ancestor
        let rank = |point: BoundaryPoint, path: &[NodeId], depth: usize| -> usize {
            if depth == 1 {
                2 * point.offset
            } else {
                2 * self.index(path[depth - 2]) + 1
            }
        };
        rank(a, &path_a, depth_a).cmp(&rank(b, &path_b, depth_b))
    }

    fn range_root(&self, range: &Range) -> NodeId {
        self.root(range.start.node)
    }

    fn check_point(&self, node: NodeId, offset: usize) -> DomResult<()> {
        if self.node_type(node) == NodeType::DocumentType {
            return Err(DomError::InvalidNodeType);
        }
        let length = self.length(node);
        if offset > length {
            return Err(DomError::IndexSize { offset, length });
        }
        Ok(())
    }

    /// Compare boundary points of two ranges
    pub fn compare_boundary_points(
        &self,
        id: RangeId,
        how: RangeCompare,
        source: RangeId,
    ) -> DomResult<Ordering> {
        let this = self.live_range(id)?;
        let other = self.live_range(source)?;
        if self.range_root(this) != self.range_root(other) {
            return Err(DomError::WrongDocument);
        }
        let (this_point, other_point) = match how {
            RangeCompare::StartToStart => (this.start, other.start),
            RangeCompare::StartToEnd => (this.end, other.start),
            RangeCompare::EndToEnd => (this.end, other.end),
            RangeCompare::EndToStart => (this.start, other.end),
        };
        Ok(self.compare_points(this_point, other_point))
    }

    /// Check if a point is in the range
    pub fn is_point_in_range(&self, id: RangeId, node: NodeId, offset: usize) -> DomResult<bool> {
        let range = self.live_range(id)?;
        if self.root(node) != self.range_root(range) {
            return Ok(false);
        }
        self.check_point(node, offset)?;
        let point = BoundaryPoint::new(node, offset);
        Ok(self.compare_points(point, range.start) != Ordering::Less
            && self.compare_points(point, range.end) != Ordering::Greater)
    }

    /// Compare point to range: `Less` before start, `Greater` after end
    pub fn compare_point(&self, id: RangeId, node: NodeId, offset: usize) -> DomResult<Ordering> {
        let range = self.live_range(id)?;
        if self.root(node) != self.range_root(range) {
            return Err(DomError::WrongDocument);
        }
        self.check_point(node, offset)?;
        let point = BoundaryPoint::new(node, offset);
        if self.compare_points(point, range.start) == Ordering::Less {
            return Ok(Ordering::Less);
        }
        if self.compare_points(point, range.end) == Ordering::Greater {
            return Ok(Ordering::Greater);
        }
        Ok(Ordering::Equal)
    }

    /// Check if the range intersects a node
    pub fn intersects_node(&self, id: RangeId, node: NodeId) -> DomResult<bool> {
        let range = self.live_range(id)?;
        if self.root(node) != self.range_root(range) {
            return Ok(false);
        }
        let Some(parent) = self.parent(node) else {
            return Ok(true);
        };
        let offset = self.index(node);
        Ok(
            self.compare_points(BoundaryPoint::new(parent, offset), range.end) == Ordering::Less
                && self.compare_points(BoundaryPoint::new(parent, offset + 1), range.start)
                    == Ordering::Greater,
        )
    }

    /// Deepest node containing both boundary points
    pub fn common_ancestor_container(&self, id: RangeId) -> DomResult<NodeId> {
        let range = self.live_range(id)?;
        let mut container = range.start.node;
        while !self.is_inclusive_ancestor(container, range.end.node) {
            container = self.parent(container).ok_or(DomError::WrongDocument)?;
        }
        Ok(container)
    }
}
