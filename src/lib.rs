//! Exact k-nearest-neighbor search over block k-d tree point indexes.
//!
//! The index itself lives elsewhere: every searched segment hands the core a
//! [`TreeCursor`] over its tree together with its packed bounds, its doc id
//! offset, and an optional live-docs bitmap. [`nearest`] then runs a
//! best-first branch-and-bound traversal: a frontier of unexpanded cells
//! ordered by the lower-bound distance from the query origin to their
//! bounding box, played against a bounded queue of the best hits seen so
//! far, whose worst accepted distance prunes both cells and points.
//!
//! Points are stored packed, one sortably-encoded big-endian `f32` per
//! dimension, so bounding boxes compare bytewise and decode on demand. All
//! distance arithmetic happens on `f64` after promotion.

mod cursor;
mod distance;
mod error;
mod hits;
mod search;
mod sortable;
mod visitor;

#[cfg(test)]
mod tests;

pub use cursor::{BoxRelation, PointVisitor, TreeCursor};
pub use distance::packed_box_distance_sq;
pub use error::Error;
pub use hits::{Hit, HitQueue};
pub use search::{nearest, SearchHit, Segment};
pub use sortable::{decode_dim, encode_dim_into, encode_point, BYTES_PER_DIM};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A global document id.
pub type DocId = u32;
