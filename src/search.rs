use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;
use roaring::RoaringBitmap;
use tracing::debug;

use crate::cursor::TreeCursor;
use crate::distance::packed_box_distance_sq;
use crate::sortable::BYTES_PER_DIM;
use crate::visitor::NearestVisitor;
use crate::{DocId, Error, Result};

/// One searchable slice of the document space: a rooted cursor over its
/// block k-d tree plus the segment-level metadata the traversal needs.
#[derive(Debug, Clone)]
pub struct Segment<C> {
    /// Cursor positioned on the root of the segment's tree.
    pub cursor: C,
    /// Packed lower corner of the whole segment.
    pub min_packed: Vec<u8>,
    /// Packed upper corner of the whole segment.
    pub max_packed: Vec<u8>,
    /// Number of dimensions per stored point.
    pub num_dims: usize,
    /// Offset turning this segment's doc ids into global doc ids.
    pub doc_base: DocId,
    /// Live documents; unset bits are deleted. `None` keeps every doc.
    pub live_docs: Option<RoaringBitmap>,
}

/// One result of [`nearest`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    /// Global doc id of the matching point.
    pub doc_id: DocId,
    /// Euclidean distance to the origin, narrowed to `f32`.
    pub distance: f32,
    /// Exact squared Euclidean distance the search ranked by.
    pub distance_sq: f64,
}

/// An unexpanded subtree waiting in the frontier, keyed by the squared
/// distance from the origin to its bounding box.
struct Cell<C> {
    lower_bound_sq: OrderedFloat<f64>,
    reader_index: usize,
    min_packed: Vec<u8>,
    max_packed: Vec<u8>,
    cursor: C,
}

impl<C: TreeCursor> Cell<C> {
    /// Snapshots the cursor's current bounds into the cell. The cursor keeps
    /// moving after the cell is enqueued, so aliasing its buffers would
    /// corrupt the frontier.
    fn new(reader_index: usize, cursor: C, origin: &[f32]) -> Cell<C> {
        let min_packed = cursor.min_packed().to_vec();
        let max_packed = cursor.max_packed().to_vec();
        Cell::with_bounds(reader_index, cursor, min_packed, max_packed, origin)
    }

    fn with_bounds(
        reader_index: usize,
        cursor: C,
        min_packed: Vec<u8>,
        max_packed: Vec<u8>,
        origin: &[f32],
    ) -> Cell<C> {
        assert_eq!(min_packed.len(), max_packed.len(), "packed corners of unequal length");
        assert_eq!(min_packed.len(), origin.len() * BYTES_PER_DIM, "corrupted packed corner size");
        for (min, max) in min_packed
            .chunks_exact(BYTES_PER_DIM)
            .zip(max_packed.chunks_exact(BYTES_PER_DIM))
        {
            assert!(min <= max, "inverted bounding box in the index");
        }

        let lower_bound_sq = packed_box_distance_sq(&min_packed, &max_packed, origin);
        Cell {
            lower_bound_sq: OrderedFloat(lower_bound_sq),
            reader_index,
            min_packed,
            max_packed,
            cursor,
        }
    }

    /// A child's box must stay inside its parent's, dimension by dimension.
    fn contains_box(&self, min_packed: &[u8], max_packed: &[u8]) -> bool {
        self.min_packed
            .chunks_exact(BYTES_PER_DIM)
            .zip(min_packed.chunks_exact(BYTES_PER_DIM))
            .all(|(parent, child)| parent <= child)
            && self
                .max_packed
                .chunks_exact(BYTES_PER_DIM)
                .zip(max_packed.chunks_exact(BYTES_PER_DIM))
                .all(|(parent, child)| parent >= child)
    }
}

impl<C> PartialEq for Cell<C> {
    fn eq(&self, other: &Self) -> bool {
        self.lower_bound_sq == other.lower_bound_sq
    }
}

impl<C> Eq for Cell<C> {}

impl<C> PartialOrd for Cell<C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<C> Ord for Cell<C> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.lower_bound_sq.cmp(&other.lower_bound_sq)
    }
}

/// Returns the `count` closest stored points to `origin` across `segments`,
/// sorted ascending by `(distance, doc id)`.
///
/// The traversal is best-first across every segment at once: a single
/// frontier of unexpanded cells ordered by their lower-bound distance is
/// popped against the worst distance of the hits accepted so far, so the
/// pruning radius tightens as fast as the index allows. Fewer than `count`
/// hits come back when fewer live points exist.
pub fn nearest<C: TreeCursor>(
    segments: Vec<Segment<C>>,
    count: usize,
    origin: &[f32],
) -> Result<Vec<SearchHit>> {
    if count < 1 {
        return Err(Error::InvalidNearestCount);
    }
    if let Some(dim) = origin.iter().position(|coord| coord.is_nan()) {
        return Err(Error::NanOriginCoordinate { dim });
    }
    for segment in &segments {
        if segment.num_dims != origin.len() {
            return Err(Error::InvalidOriginDimension {
                expected: segment.num_dims,
                received: origin.len(),
            });
        }
    }

    let mut visitor = NearestVisitor::new(origin, count);
    let mut frontier = BinaryHeap::with_capacity(segments.len());
    for (reader_index, segment) in segments.iter().enumerate() {
        frontier.push(Reverse(Cell::with_bounds(
            reader_index,
            segment.cursor.clone(),
            segment.min_packed.clone(),
            segment.max_packed.clone(),
            origin,
        )));
    }

    let mut pushed_cells = frontier.len();
    let mut popped_cells = 0usize;
    let mut visited_leaves = 0usize;

    while let Some(Reverse(mut cell)) = frontier.pop() {
        popped_cells += 1;

        // Every remaining cell is at least this far away: once the nearest
        // one cannot strictly beat the worst accepted hit, nothing can.
        if cell.lower_bound_sq.into_inner() > visitor.bottom_distance_sq() {
            break;
        }

        if cell.cursor.move_to_child()? {
            // Interior node, the cursor now sits on the first child. That
            // child goes through a clone: advancing to its sibling below
            // repositions the cursor irrevocably.
            debug_assert!(
                cell.contains_box(cell.cursor.min_packed(), cell.cursor.max_packed()),
                "child cell escapes its parent's bounding box"
            );
            let left = Cell::new(cell.reader_index, cell.cursor.clone(), origin);
            if left.lower_bound_sq.into_inner() <= visitor.bottom_distance_sq() {
                frontier.push(Reverse(left));
                pushed_cells += 1;
            }
            if cell.cursor.move_to_sibling()? {
                debug_assert!(
                    cell.contains_box(cell.cursor.min_packed(), cell.cursor.max_packed()),
                    "sibling cell escapes its parent's bounding box"
                );
                let right = Cell::new(cell.reader_index, cell.cursor, origin);
                if right.lower_bound_sq.into_inner() <= visitor.bottom_distance_sq() {
                    frontier.push(Reverse(right));
                    pushed_cells += 1;
                }
            }
        } else {
            let segment = &segments[cell.reader_index];
            visitor.enter_segment(segment.doc_base, segment.live_docs.as_ref());
            cell.cursor.visit_leaf_values(&mut visitor)?;
            visited_leaves += 1;
        }
    }

    let hits = visitor.into_hits().into_sorted_hits();
    debug!(
        count,
        hits = hits.len(),
        popped_cells,
        visited_leaves,
        pushed_cells,
        "nearest neighbors search done"
    );

    Ok(hits
        .into_iter()
        .map(|hit| SearchHit {
            doc_id: hit.doc_id(),
            distance: hit.distance_sq().sqrt() as f32,
            distance_sq: hit.distance_sq(),
        })
        .collect())
}
