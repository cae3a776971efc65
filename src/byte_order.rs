//! Network byte-order handling for frame length prefixes.
//!
//! Every key and value frame is preceded by a 2-byte big-endian length. These
//! helpers keep the Clippy expectations scoped to the conversion points.

/// Width of a frame length prefix in bytes.
pub const LENGTH_PREFIX_SIZE: usize = 2;

/// Encode a frame length as its on-wire prefix.
///
/// # Examples
///
/// ```
/// use ampframe::byte_order::write_frame_len;
///
/// assert_eq!(write_frame_len(0x0104), [0x01, 0x04]);
/// ```
#[must_use]
pub fn write_frame_len(len: u16) -> [u8; LENGTH_PREFIX_SIZE] {
    #[expect(
        clippy::big_endian_bytes,
        reason = "AMP frame lengths are big-endian on the wire."
    )]
    len.to_be_bytes()
}

/// Decode an on-wire length prefix.
///
/// # Examples
///
/// ```
/// use ampframe::byte_order::read_frame_len;
///
/// assert_eq!(read_frame_len([0x00, 0x08]), 8);
/// ```
#[must_use]
pub fn read_frame_len(prefix: [u8; LENGTH_PREFIX_SIZE]) -> u16 {
    #[expect(
        clippy::big_endian_bytes,
        reason = "AMP frame lengths are big-endian on the wire."
    )]
    u16::from_be_bytes(prefix)
}

/// Read the length prefix starting at `offset`, if the buffer holds it.
#[must_use]
pub fn peek_frame_len(src: &[u8], offset: usize) -> Option<u16> {
    let end = offset.checked_add(LENGTH_PREFIX_SIZE)?;
    let prefix = src.get(offset..end)?;
    <[u8; LENGTH_PREFIX_SIZE]>::try_from(prefix)
        .ok()
        .map(read_frame_len)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::zero(0, [0x00, 0x00])]
    #[case::short_key(4, [0x00, 0x04])]
    #[case::max_key(255, [0x00, 0xFF])]
    #[case::max_value(65_535, [0xFF, 0xFF])]
    fn frame_length_uses_network_order(#[case] len: u16, #[case] wire: [u8; 2]) {
        assert_eq!(write_frame_len(len), wire);
        assert_eq!(read_frame_len(wire), len);
    }

    #[test]
    fn peek_reads_prefix_at_offset() {
        let src = [0xAA, 0x00, 0x08, 0xBB];
        assert_eq!(peek_frame_len(&src, 1), Some(8));
    }

    #[rstest]
    #[case::empty(&[], 0)]
    #[case::one_byte(&[0x00], 0)]
    #[case::past_end(&[0x00, 0x01], 1)]
    #[case::overflow(&[0x00, 0x01], usize::MAX)]
    fn peek_reports_incomplete_prefix(#[case] src: &[u8], #[case] offset: usize) {
        assert_eq!(peek_frame_len(src, offset), None);
    }
}
