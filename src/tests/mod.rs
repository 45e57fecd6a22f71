use std::fmt;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use roaring::RoaringBitmap;

use crate::cursor::{BoxRelation, PointVisitor, TreeCursor};
use crate::sortable::{decode_dim, encode_point, BYTES_PER_DIM};
use crate::{DocId, Result, SearchHit, Segment};


/// The index producer is not part of this crate, so the tests bring their
/// own: a small in-memory block k-d tree split on the widest dimension at
/// the median, with a cursor over it.
#[derive(Debug)]
enum MemNode {
    Leaf { min_packed: Vec<u8>, max_packed: Vec<u8>, points: Vec<(DocId, Vec<u8>)> },
    Inner { min_packed: Vec<u8>, max_packed: Vec<u8>, left: Rc<MemNode>, right: Rc<MemNode> },
}

impl MemNode {
    fn min_packed(&self) -> &[u8] {
        match self {
            MemNode::Leaf { min_packed, .. } | MemNode::Inner { min_packed, .. } => min_packed,
        }
    }

    fn max_packed(&self) -> &[u8] {
        match self {
            MemNode::Leaf { max_packed, .. } | MemNode::Inner { max_packed, .. } => max_packed,
        }
    }
}

fn bounds_of(num_dims: usize, points: &[(DocId, Vec<u8>)]) -> (Vec<u8>, Vec<u8>) {
    let mut min = points[0].1.clone();
    let mut max = points[0].1.clone();
    for (_, packed) in &points[1..] {
        for dim in 0..num_dims {
            let range = dim * BYTES_PER_DIM..(dim + 1) * BYTES_PER_DIM;
            if packed[range.clone()] < min[range.clone()] {
                min[range.clone()].copy_from_slice(&packed[range.clone()]);
            }
            if packed[range.clone()] > max[range.clone()] {
                max[range.clone()].copy_from_slice(&packed[range]);
            }
        }
    }
    (min, max)
}

fn widest_dim(num_dims: usize, min_packed: &[u8], max_packed: &[u8]) -> usize {
    (0..num_dims)
        .max_by(|&a, &b| {
            let span = |dim: usize| {
                let offset = dim * BYTES_PER_DIM;
                f64::from(decode_dim(max_packed, offset)) - f64::from(decode_dim(min_packed, offset))
            };
            span(a).total_cmp(&span(b))
        })
        .unwrap_or(0)
}

fn build_node(num_dims: usize, leaf_size: usize, mut points: Vec<(DocId, Vec<u8>)>) -> Rc<MemNode> {
    assert!(!points.is_empty(), "a tree node needs at least one point");
    let (min_packed, max_packed) = bounds_of(num_dims, &points);
    if points.len() <= leaf_size {
        return Rc::new(MemNode::Leaf { min_packed, max_packed, points });
    }

    let split_dim = widest_dim(num_dims, &min_packed, &max_packed);
    let range = split_dim * BYTES_PER_DIM..(split_dim + 1) * BYTES_PER_DIM;
    points.sort_by(|(left_doc, left), (right_doc, right)| {
        left[range.clone()].cmp(&right[range.clone()]).then(left_doc.cmp(right_doc))
    });
    let right = points.split_off(points.len() / 2);

    Rc::new(MemNode::Inner {
        min_packed,
        max_packed,
        left: build_node(num_dims, leaf_size, points),
        right: build_node(num_dims, leaf_size, right),
    })
}

#[derive(Debug, Clone)]
pub struct MemCursor {
    node: Rc<MemNode>,
    parents: Vec<Rc<MemNode>>,
}

impl TreeCursor for MemCursor {
    fn min_packed(&self) -> &[u8] {
        self.node.min_packed()
    }

    fn max_packed(&self) -> &[u8] {
        self.node.max_packed()
    }

    fn move_to_child(&mut self) -> Result<bool> {
        match &*self.node {
            MemNode::Leaf { .. } => Ok(false),
            MemNode::Inner { left, .. } => {
                let left = Rc::clone(left);
                self.parents.push(Rc::clone(&self.node));
                self.node = left;
                Ok(true)
            }
        }
    }

    fn move_to_sibling(&mut self) -> Result<bool> {
        let Some(parent) = self.parents.last() else {
            return Ok(false);
        };
        match &**parent {
            MemNode::Inner { left, right, .. } if Rc::ptr_eq(&self.node, left) => {
                self.node = Rc::clone(right);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn visit_leaf_values(&mut self, visitor: &mut dyn PointVisitor) -> Result<()> {
        if visitor.compare(self.node.min_packed(), self.node.max_packed()) == BoxRelation::Outside {
            return Ok(());
        }
        match &*self.node {
            MemNode::Leaf { points, .. } => {
                for (doc_id, packed) in points {
                    visitor.visit(*doc_id, packed);
                }
                Ok(())
            }
            MemNode::Inner { .. } => panic!("visit_leaf_values called on an interior node"),
        }
    }
}

pub struct SegmentBuilder {
    doc_base: DocId,
    num_dims: usize,
    leaf_size: usize,
    points: Vec<(DocId, Vec<u8>)>,
    deleted: RoaringBitmap,
}

impl SegmentBuilder {
    pub fn new(doc_base: DocId, num_dims: usize) -> SegmentBuilder {
        SegmentBuilder {
            doc_base,
            num_dims,
            leaf_size: 4,
            points: Vec::new(),
            deleted: RoaringBitmap::new(),
        }
    }

    pub fn leaf_size(mut self, leaf_size: usize) -> SegmentBuilder {
        self.leaf_size = leaf_size;
        self
    }

    pub fn add(&mut self, doc_id: DocId, point: &[f32]) {
        assert_eq!(point.len(), self.num_dims);
        self.points.push((doc_id, encode_point(point)));
    }

    pub fn delete(&mut self, doc_id: DocId) {
        self.deleted.insert(doc_id);
    }

    pub fn build(self) -> Segment<MemCursor> {
        assert!(!self.points.is_empty(), "a segment needs at least one point");
        let live_docs = if self.deleted.is_empty() {
            None
        } else {
            let all: RoaringBitmap = self.points.iter().map(|(doc_id, _)| *doc_id).collect();
            Some(all - self.deleted)
        };
        let root = build_node(self.num_dims, self.leaf_size, self.points);

        Segment {
            min_packed: root.min_packed().to_vec(),
            max_packed: root.max_packed().to_vec(),
            cursor: MemCursor { node: root, parents: Vec::new() },
            num_dims: self.num_dims,
            doc_base: self.doc_base,
            live_docs,
        }
    }
}

pub struct SearchRes(pub Vec<SearchHit>);

impl fmt::Display for SearchRes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("No results found");
        }
        for hit in &self.0 {
            writeln!(f, "id({}): distance({})", hit.doc_id, hit.distance)?;
        }
        Ok(())
    }
}

pub fn rng() -> StdRng {
    StdRng::from_seed(std::array::from_fn(|_| 42))
}
