//! Table-driven CRC-32 as used by PKZIP (ISO 3309, reflected polynomial).

/// Reflected form of the 0x04C11DB7 generator polynomial
const POLYNOMIAL: u32 = 0xEDB8_8320;

/// Lookup table, one entry per possible byte value, built at compile time.
const TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut c = i as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 != 0 { POLYNOMIAL ^ (c >> 1) } else { c >> 1 };
            k += 1;
        }
        table[i] = c;
        i += 1;
    }
    table
}

/// Compute the CRC-32 checksum of `bytes`.
///
/// Initial value and final XOR are both `0xFFFFFFFF`, matching the value
/// stored in ZIP local and central directory headers.
pub fn crc32(bytes: &[u8]) -> u32 {
    let mut c = 0xFFFF_FFFFu32;
    for &b in bytes {
        c = TABLE[((c ^ b as u32) & 0xFF) as usize] ^ (c >> 8);
    }
    c ^ 0xFFFF_FFFF
}
