use crate::{DocId, Result};

/// How a cell's bounding box relates to the current state of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxRelation {
    /// The box may still hold a competitive point; its points must be
    /// examined one by one. There is deliberately no "fully inside" answer,
    /// containment says nothing about the individual distances.
    Crosses,
    /// No point of the box can improve the current results; the whole cell
    /// may be skipped.
    Outside,
}

/// Receives the points of a leaf cell during traversal.
pub trait PointVisitor {
    /// Called once per stored point of a leaf with the segment-local doc id
    /// and the packed point bytes.
    fn visit(&mut self, doc_id: DocId, packed_point: &[u8]);

    /// Consulted before a cell's points are enumerated; answering
    /// [`BoxRelation::Outside`] lets the cursor skip the cell entirely.
    fn compare(&mut self, min_packed: &[u8], max_packed: &[u8]) -> BoxRelation;
}

/// A stateful cursor walking one segment's block k-d tree.
///
/// Navigation mutates the cursor in place. `Clone` must produce a deep,
/// independent copy positioned on the same node, duplicating any underlying
/// I/O handles, so that both children of an interior node can be explored
/// without one traversal corrupting the other. The buffers returned by
/// `min_packed`/`max_packed` may be overwritten by later navigation calls;
/// callers who keep them must copy them first.
pub trait TreeCursor: Clone {
    /// Packed lower corner of the current node's bounding box.
    fn min_packed(&self) -> &[u8];

    /// Packed upper corner of the current node's bounding box.
    fn max_packed(&self) -> &[u8];

    /// Descends into the first child of the current node. Returns `false`
    /// when the node is a leaf, leaving the cursor where it was.
    fn move_to_child(&mut self) -> Result<bool>;

    /// After a successful `move_to_child`, repositions the cursor from the
    /// current child onto its next sibling, returning `false` when there is
    /// none. Trees built by binary subdivision have exactly one sibling and
    /// the search driver relies on nothing more.
    fn move_to_sibling(&mut self) -> Result<bool>;

    /// Streams every point stored under the current leaf into `visitor`,
    /// after giving [`PointVisitor::compare`] a chance to skip the leaf.
    fn visit_leaf_values(&mut self, visitor: &mut dyn PointVisitor) -> Result<()>;
}
