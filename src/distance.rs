use crate::sortable::{decode_dim, BYTES_PER_DIM};

/// The squared Euclidean distance from `origin` to the closest point of the
/// closed axis-aligned box described by two packed corners.
///
/// This is a provable lower bound on the distance to any point stored inside
/// the box: dimensions where the origin falls between the corners contribute
/// nothing, the others contribute the squared gap to the nearest corner.
/// Every subtraction happens on `f64` operands, the decoded `f32` coordinates
/// are promoted first.
pub fn packed_box_distance_sq(min_packed: &[u8], max_packed: &[u8], origin: &[f32]) -> f64 {
    debug_assert_eq!(min_packed.len(), max_packed.len());
    debug_assert_eq!(min_packed.len(), origin.len() * BYTES_PER_DIM);

    let mut distance_sq = 0.0;
    for (dim, &coord) in origin.iter().enumerate() {
        let offset = dim * BYTES_PER_DIM;
        let coord = f64::from(coord);
        let min = f64::from(decode_dim(min_packed, offset));
        let max = f64::from(decode_dim(max_packed, offset));
        if coord < min {
            let diff = min - coord;
            distance_sq += diff * diff;
        } else if coord > max {
            let diff = max - coord;
            distance_sq += diff * diff;
        }
    }

    distance_sq
}
