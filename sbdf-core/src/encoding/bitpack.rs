//! MSB-first packed bit arrays.
//!
//! The first logical bool of each byte occupies bit 7, the next bit 6, and so
//! on. A final partial byte is left-shifted so its first bool still sits in
//! bit 7; the padding bits are undefined and ignored on read.

/// The number of payload bytes needed for `count` booleans.
pub(crate) fn packed_byte_len(count: usize) -> usize {
    count / 8 + usize::from(count % 8 != 0)
}

/// Packs booleans into bytes, MSB-first within each byte.
pub(crate) fn pack_bits(values: &[bool]) -> Vec<u8> {
    let mut packed = vec![0u8; packed_byte_len(values.len())];
    for (i, &value) in values.iter().enumerate() {
        if value {
            packed[i / 8] |= 1 << (7 - i % 8);
        }
    }
    packed
}

/// Unpacks `count` booleans from MSB-first packed bytes.
pub(crate) fn unpack_bits(count: usize, packed: &[u8]) -> Vec<bool> {
    (0..count)
        .map(|i| packed[i / 8] >> (7 - i % 8) & 1 != 0)
        .collect()
}
