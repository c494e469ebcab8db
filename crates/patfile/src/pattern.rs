//! The offset→block function behind every pattern file.
//!
//! A pattern file of `size` bytes consists of:
//! - **Header (8 bytes)**: `size` as a big-endian u64
//! - **Payload**: 8-byte blocks starting at offset 8; the block starting at
//!   absolute file offset `o` holds `(0x0807060504030201 + o) mod 2^64` as a
//!   big-endian u64
//!
//! If `size` is not a multiple of 8 the final block is truncated. Big-endian
//! keeps the layout legible in `hexdump -C`.
//!
//! Everything here is pure: the bytes for any range depend only on the
//! absolute offset, never on prior file content or on how the range was split
//! into chunks.

// ============================================================================
// Constants
// ============================================================================

/// Size of the size header in bytes. Also the minimal pattern file size.
pub const HEADER_SIZE: u64 = 8;

/// Length of one payload block in bytes.
pub const BLOCK_LEN: usize = 8;

/// Value added to a block's absolute offset to produce its content.
pub const PATTERN_BASE: u64 = 0x0807060504030201;

// ============================================================================
// Encoding Helpers
// ============================================================================

/// Value of the block starting at absolute file offset `offset`.
#[inline]
pub fn block_value(offset: u64) -> u64 {
    PATTERN_BASE.wrapping_add(offset)
}

/// Encode the size header of a file of `size` bytes.
#[inline]
pub fn encode_header(size: u64) -> [u8; 8] {
    size.to_be_bytes()
}

/// Decode a size header.
#[inline]
pub fn decode_header(header: &[u8; 8]) -> u64 {
    u64::from_be_bytes(*header)
}

// ============================================================================
// Alignment Helpers
// ============================================================================

/// Round `offset` down to the start of the block containing it.
#[inline]
pub fn align_down(offset: u64) -> u64 {
    offset - offset % BLOCK_LEN as u64
}

/// Whether a range starting at `offset` with `len` bytes falls exactly on
/// block boundaries.
#[inline]
pub fn is_aligned(offset: u64, len: usize) -> bool {
    offset % BLOCK_LEN as u64 == 0 && len % BLOCK_LEN == 0
}

/// Length of the next streaming chunk given the bytes left to process.
#[inline]
pub fn chunk_len(remaining: u64, block_size: usize) -> usize {
    usize::try_from(remaining).map_or(block_size, |remaining| remaining.min(block_size))
}

// ============================================================================
// Buffer Filling
// ============================================================================

/// Fill a block-aligned buffer with the pattern for absolute offset `offset`.
///
/// # Panics
///
/// Panics if `offset` or `buf.len()` is not a multiple of [`BLOCK_LEN`].
pub fn fill_aligned(buf: &mut [u8], offset: u64) {
    assert!(
        is_aligned(offset, buf.len()),
        "unaligned fill: offset {offset}, length {}",
        buf.len()
    );

    let mut block_offset = offset;
    for block in buf.chunks_exact_mut(BLOCK_LEN) {
        block.copy_from_slice(&block_value(block_offset).to_be_bytes());
        block_offset = block_offset.wrapping_add(BLOCK_LEN as u64);
    }
}

/// Fill `buf` with the pattern bytes for the range starting at `offset`.
///
/// Unaligned ranges are served from an aligned superset starting at the
/// enclosing block boundary, so partial blocks need no special casing.
pub fn fill_pattern(buf: &mut [u8], offset: u64) {
    if is_aligned(offset, buf.len()) {
        fill_aligned(buf, offset);
        return;
    }

    let aligned_offset = align_down(offset);
    // Safe cast: the distance to the enclosing block start is always < 8
    #[allow(clippy::cast_possible_truncation)]
    let lead = (offset - aligned_offset) as usize;
    let mut aligned = vec![0u8; (lead + buf.len()).next_multiple_of(BLOCK_LEN)];
    fill_aligned(&mut aligned, aligned_offset);
    buf.copy_from_slice(&aligned[lead..lead + buf.len()]);
}

/// Pattern bytes for `len` bytes starting at absolute offset `offset`.
pub fn expected_bytes(offset: u64, len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    fill_pattern(&mut buf, offset);
    buf
}

/// Index of the first byte where `actual` and `expected` differ.
///
/// Only the common prefix is compared.
pub fn first_mismatch(actual: &[u8], expected: &[u8]) -> Option<usize> {
    actual.iter().zip(expected).position(|(a, e)| a != e)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_value_includes_header_offset() {
        assert_eq!(block_value(0), PATTERN_BASE);
        assert_eq!(block_value(8), 0x0807060504030209);
        assert_eq!(block_value(16), 0x0807060504030211);
    }

    #[test]
    fn test_block_value_wraps() {
        assert_eq!(block_value(u64::MAX), PATTERN_BASE - 1);
    }

    #[test]
    fn test_header_codec() {
        assert_eq!(encode_header(24), [0, 0, 0, 0, 0, 0, 0, 0x18]);
        assert_eq!(decode_header(&encode_header(0xDEAD_BEEF)), 0xDEAD_BEEF);
    }

    #[test]
    fn test_align_down() {
        assert_eq!(align_down(0), 0);
        assert_eq!(align_down(7), 0);
        assert_eq!(align_down(8), 8);
        assert_eq!(align_down(13), 8);
    }

    #[test]
    fn test_is_aligned() {
        assert!(is_aligned(8, 16));
        assert!(is_aligned(0, 0));
        assert!(!is_aligned(9, 16));
        assert!(!is_aligned(8, 5));
    }

    #[test]
    fn test_chunk_len() {
        assert_eq!(chunk_len(100, 32), 32);
        assert_eq!(chunk_len(5, 32), 5);
        assert_eq!(chunk_len(u64::MAX, 4096), 4096);
    }

    #[test]
    fn test_fill_aligned_payload_blocks() {
        let mut buf = [0u8; 16];
        fill_aligned(&mut buf, 8);
        assert_eq!(
            buf,
            [
                0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x09, //
                0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x11,
            ]
        );
    }

    #[test]
    #[should_panic(expected = "unaligned fill")]
    fn test_fill_aligned_rejects_unaligned_offset() {
        let mut buf = [0u8; 8];
        fill_aligned(&mut buf, 3);
    }

    #[test]
    fn test_fill_pattern_unaligned_start() {
        // Offset 13 is byte 5 of the block starting at 8
        let bytes = expected_bytes(13, 5);
        assert_eq!(bytes, [0x03, 0x02, 0x09, 0x08, 0x07]);
    }

    #[test]
    fn test_truncated_tail_is_block_prefix() {
        // A 13-byte file ends with 5 bytes of the block at offset 8
        let tail = expected_bytes(8, 5);
        let full = block_value(8).to_be_bytes();
        assert_eq!(tail, full[..5]);
    }

    #[test]
    fn test_fill_pattern_empty() {
        assert!(expected_bytes(11, 0).is_empty());
    }

    #[test]
    fn test_first_mismatch() {
        assert_eq!(first_mismatch(&[1, 2, 3], &[1, 2, 3]), None);
        assert_eq!(first_mismatch(&[1, 9, 3], &[1, 2, 3]), Some(1));
        assert_eq!(first_mismatch(&[], &[]), None);
    }
}
