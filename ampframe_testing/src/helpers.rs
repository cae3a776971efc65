//! Wire and stream helpers.

use std::{io, sync::Arc};

use ampframe::{AmpBox, ErrorRegistry, RequestCorrelator, codec};
use tokio::io::{AsyncRead, DuplexStream, duplex};

/// Duplex buffer size used by [`correlator_pair`].
pub const DEFAULT_CAPACITY: usize = 4096;

/// Assemble the wire form of a box from `pairs`, in the order given.
///
/// No reserved-key reordering or validation is applied.
///
/// # Panics
///
/// Panics if a key or value is longer than `u16::MAX` bytes.
#[must_use]
pub fn box_bytes(pairs: &[(&str, &str)]) -> Vec<u8> {
    let mut wire = Vec::new();
    for (key, value) in pairs {
        push_frame(&mut wire, key.as_bytes());
        push_frame(&mut wire, value.as_bytes());
    }
    wire.extend_from_slice(&[0, 0]);
    wire
}

#[expect(
    clippy::big_endian_bytes,
    reason = "AMP length prefixes are big-endian on the wire"
)]
fn push_frame(wire: &mut Vec<u8>, frame: &[u8]) {
    let len = u16::try_from(frame.len()).expect("frame longer than u16::MAX");
    wire.extend_from_slice(&len.to_be_bytes());
    wire.extend_from_slice(frame);
}

/// Decode boxes from `reader` until the stream closes cleanly.
///
/// # Errors
///
/// Returns any codec failure other than a clean close, converted to
/// [`io::Error`].
pub async fn read_boxes<R>(reader: &mut R) -> io::Result<Vec<AmpBox>>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut boxes = Vec::new();
    loop {
        match codec::decode(reader).await {
            Ok(ampbox) => boxes.push(ampbox),
            Err(err) if err.is_clean_close() => return Ok(boxes),
            Err(err) => return Err(err.into()),
        }
    }
}

/// Create a correlator over one end of an in-memory pipe.
///
/// The returned [`DuplexStream`] plays the peer.
#[must_use]
pub fn correlator_pair(
    registry: ErrorRegistry,
) -> (RequestCorrelator<DuplexStream>, DuplexStream) {
    let (local, peer) = duplex(DEFAULT_CAPACITY);
    (RequestCorrelator::new(local, Arc::new(registry)), peer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_bytes_keeps_pair_order() {
        assert_eq!(
            box_bytes(&[("b", "1"), ("a", "")]),
            b"\x00\x01b\x00\x011\x00\x01a\x00\x00\x00\x00"
        );
    }

    #[tokio::test]
    async fn read_boxes_stops_at_clean_close() {
        let mut wire = box_bytes(&[("k", "v")]);
        wire.extend(box_bytes(&[]));
        let mut reader = wire.as_slice();
        let boxes = read_boxes(&mut reader).await.expect("read boxes");
        assert_eq!(boxes, [AmpBox::from([("k", "v")]), AmpBox::new()]);
    }

    #[tokio::test]
    async fn read_boxes_surfaces_truncation() {
        let wire = box_bytes(&[("k", "v")]);
        let mut reader = &wire[..wire.len() - 1];
        let err = read_boxes(&mut reader).await.expect_err("truncated");
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
