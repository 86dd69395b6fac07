//! Little-endian packing primitives for ZIP records.

use byteorder::{ByteOrder, LittleEndian};

/// Encode a 16-bit value in little-endian byte order.
pub fn u16_le(value: u16) -> [u8; 2] {
    let mut buf = [0u8; 2];
    LittleEndian::write_u16(&mut buf, value);
    buf
}

/// Encode a 32-bit value in little-endian byte order.
pub fn u32_le(value: u32) -> [u8; 4] {
    let mut buf = [0u8; 4];
    LittleEndian::write_u32(&mut buf, value);
    buf
}

/// Concatenate buffers into one contiguous buffer, preserving order.
pub fn concat<B: AsRef<[u8]>>(chunks: &[B]) -> Vec<u8> {
    let total = chunks.iter().map(|c| c.as_ref().len()).sum();
    let mut out = Vec::with_capacity(total);
    for chunk in chunks {
        out.extend_from_slice(chunk.as_ref());
    }
    out
}
