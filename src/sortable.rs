use std::mem::size_of;

use byteorder::{BigEndian, ByteOrder};

/// The number of bytes one encoded dimension occupies in a packed point.
pub const BYTES_PER_DIM: usize = size_of::<u32>();

const SIGN_BIT: u32 = 0x8000_0000;

/// Encodes one `f32` dimension into the first [`BYTES_PER_DIM`] bytes of `out`
/// so that lexicographic byte order matches numeric order: the sign bit is
/// flipped for non-negative values, every bit is flipped for negative ones,
/// written big-endian.
pub fn encode_dim_into(value: f32, out: &mut [u8]) {
    let bits = value.to_bits();
    let sortable = if bits & SIGN_BIT == 0 { bits ^ SIGN_BIT } else { !bits };
    BigEndian::write_u32(out, sortable);
}

/// Decodes the dimension starting at `offset` back into the original `f32`.
pub fn decode_dim(packed: &[u8], offset: usize) -> f32 {
    let sortable = BigEndian::read_u32(&packed[offset..]);
    let bits = if sortable & SIGN_BIT != 0 { sortable ^ SIGN_BIT } else { !sortable };
    f32::from_bits(bits)
}

/// Packs a whole point, one encoded dimension after another.
pub fn encode_point(point: &[f32]) -> Vec<u8> {
    let mut packed = vec![0; point.len() * BYTES_PER_DIM];
    for (dim, &coord) in point.iter().enumerate() {
        encode_dim_into(coord, &mut packed[dim * BYTES_PER_DIM..]);
    }
    packed
}
