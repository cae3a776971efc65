//! Wire codec for AMP boxes.
//!
//! A box is a sequence of key/value frame pairs followed by a terminator:
//!
//! ```text
//! ┌──────────┬─────┬────────────┬───────┐       ┌──────────┐
//! │ klen (2) │ key │ vlen (2)   │ value │  ...  │ 0x00 0x00│
//! └──────────┴─────┴────────────┴───────┘       └──────────┘
//! ```
//!
//! Lengths are big-endian `u16`. Boxes concatenate with no outer envelope.
//! When present, `_ask` (or failing that `_answer`) is written first and
//! `_command` next; the remaining keys follow in key order.
//!
//! Three entry points cover the common cases:
//!
//! - [`serialize`] / [`deserialize`] for in-memory buffers.
//! - [`decode`] to read exactly one box from an unbuffered [`AsyncRead`].
//! - [`BoxCodec`], a `tokio_util` [`Decoder`]/[`Encoder`] for framed streams.

use bytes::{Buf, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

use crate::{
    ampbox::{ANSWER, ASK, AmpBox, COMMAND},
    byte_order::{LENGTH_PREFIX_SIZE, peek_frame_len, read_frame_len, write_frame_len},
    config::BoxLimits,
};

pub mod error;

pub use error::{CodecError, EncodingError, EofError, FramePart, FramingError};

/// Bytes marking the end of a box.
pub const TERMINATOR: [u8; LENGTH_PREFIX_SIZE] = [0x00, 0x00];

/// Serialize a box using the protocol limits.
///
/// # Errors
///
/// Returns an [`EncodingError`] if a key is empty or a key or value exceeds
/// its length limit.
///
/// # Examples
///
/// ```
/// use ampframe::{ampbox::AmpBox, codec::serialize};
///
/// let wire = serialize(&AmpBox::from([("_ask", "1")])).expect("box is encodable");
/// assert_eq!(&wire[..], b"\x00\x04_ask\x00\x011\x00\x00");
/// ```
pub fn serialize(ampbox: &AmpBox) -> Result<Bytes, EncodingError> {
    serialize_with(ampbox, BoxLimits::default())
}

/// Serialize a box using custom limits.
///
/// # Errors
///
/// Returns an [`EncodingError`] if a key is empty or a key or value exceeds
/// its length limit.
pub fn serialize_with(ampbox: &AmpBox, limits: BoxLimits) -> Result<Bytes, EncodingError> {
    let mut dst = BytesMut::new();
    encode_into(ampbox, limits, &mut dst)?;
    Ok(dst.freeze())
}

/// Deserialize the first box in `src` using the protocol limits.
///
/// Bytes following the terminator are ignored.
///
/// # Errors
///
/// Returns [`FramingError::BufferTooShort`] for buffers under two bytes,
/// another [`FramingError`] for malformed frames, or [`EofError::MidBox`] if
/// the buffer ends before the terminator.
pub fn deserialize(src: &[u8]) -> Result<AmpBox, CodecError> {
    deserialize_with(src, BoxLimits::default())
}

/// Deserialize the first box in `src` using custom limits.
///
/// # Errors
///
/// See [`deserialize`].
pub fn deserialize_with(src: &[u8], limits: BoxLimits) -> Result<AmpBox, CodecError> {
    if src.len() < LENGTH_PREFIX_SIZE {
        return Err(FramingError::BufferTooShort { len: src.len() }.into());
    }
    match parse_box(src, limits, &mut PartialBox::default())? {
        Some((ampbox, _)) => Ok(ampbox),
        None => Err(EofError::MidBox {
            bytes_received: src.len(),
        }
        .into()),
    }
}

/// Read exactly one box from `reader` using the protocol limits.
///
/// The reader is never advanced past the box terminator, so further boxes can
/// be read from the same stream.
///
/// # Errors
///
/// Returns [`EofError::CleanClose`] if the stream ends before the first byte,
/// [`EofError::MidBox`] if it ends inside a box, a [`FramingError`] for
/// malformed frames, or [`CodecError::Io`] on transport failure.
pub async fn decode<R>(reader: &mut R) -> Result<AmpBox, CodecError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    decode_with(reader, BoxLimits::default()).await
}

/// Read exactly one box from `reader` using custom limits.
///
/// # Errors
///
/// See [`decode`].
pub async fn decode_with<R>(reader: &mut R, limits: BoxLimits) -> Result<AmpBox, CodecError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut source = CountingReader {
        reader,
        received: 0,
    };
    let mut ampbox = AmpBox::new();
    loop {
        let key_len = source.read_len().await?;
        if key_len == 0 {
            return Ok(ampbox);
        }
        check_len(FramePart::Key, key_len, limits.max_key_len())?;
        let key = source.read_frame(FramePart::Key, key_len).await?;

        let value_len = source.read_len().await?;
        check_len(FramePart::Value, value_len, limits.max_value_len())?;
        let value = source.read_frame(FramePart::Value, value_len).await?;

        ampbox.insert(key, value);
    }
}

/// Tracks how much of the current box has been read so EOF can be classified.
struct CountingReader<'a, R: ?Sized> {
    reader: &'a mut R,
    received: usize,
}

impl<R> CountingReader<'_, R>
where
    R: AsyncRead + Unpin + ?Sized,
{
    async fn fill(&mut self, buf: &mut [u8]) -> Result<(), CodecError> {
        let mut filled = 0;
        while let Some(rest) = buf.get_mut(filled..).filter(|rest| !rest.is_empty()) {
            let n = self.reader.read(rest).await?;
            if n == 0 {
                return Err(if self.received == 0 {
                    EofError::CleanClose
                } else {
                    EofError::MidBox {
                        bytes_received: self.received,
                    }
                }
                .into());
            }
            filled += n;
            self.received += n;
        }
        Ok(())
    }

    async fn read_len(&mut self) -> Result<usize, CodecError> {
        let mut prefix = [0_u8; LENGTH_PREFIX_SIZE];
        self.fill(&mut prefix).await?;
        Ok(usize::from(read_frame_len(prefix)))
    }

    async fn read_frame(&mut self, part: FramePart, len: usize) -> Result<String, CodecError> {
        let mut frame = vec![0_u8; len];
        self.fill(&mut frame).await?;
        String::from_utf8(frame).map_err(|_| FramingError::InvalidUtf8 { part }.into())
    }
}

/// `tokio_util` codec reading and writing whole boxes.
///
/// Decoding consumes nothing until a complete box, terminator included, is
/// buffered. Pairs already parsed from the buffered prefix are kept between
/// calls, so a decoder must be fed a single growing buffer. At end of stream
/// an empty buffer is a clean close; leftover bytes produce
/// [`EofError::MidBox`].
#[derive(Clone, Debug, Default)]
pub struct BoxCodec {
    limits: BoxLimits,
    partial: PartialBox,
}

/// Pairs decoded so far from the front of an incomplete box.
#[derive(Clone, Debug, Default)]
struct PartialBox {
    /// Offset just past the last complete pair.
    parsed: usize,
    pairs: AmpBox,
}

impl BoxCodec {
    /// Create a codec enforcing the protocol limits.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Create a codec enforcing custom limits.
    #[must_use]
    pub fn with_limits(limits: BoxLimits) -> Self {
        Self {
            limits,
            partial: PartialBox::default(),
        }
    }

    /// Limits enforced by this codec.
    #[must_use]
    pub fn limits(&self) -> BoxLimits { self.limits }
}

impl Decoder for BoxCodec {
    type Item = AmpBox;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let parsed = parse_box(src, self.limits, &mut self.partial);
        if parsed.is_err() {
            self.partial = PartialBox::default();
        }
        let Some((ampbox, consumed)) = parsed? else {
            return Ok(None);
        };
        src.advance(consumed);
        trace!(pairs = ampbox.len(), consumed, "decoded box");
        Ok(Some(ampbox))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(ampbox) => Ok(Some(ampbox)),
            None if src.is_empty() => Ok(None),
            None => Err(EofError::MidBox {
                bytes_received: src.len(),
            }
            .into()),
        }
    }
}

impl Encoder<AmpBox> for BoxCodec {
    type Error = CodecError;

    fn encode(&mut self, item: AmpBox, dst: &mut BytesMut) -> Result<(), Self::Error> {
        encode_into(&item, self.limits, dst)?;
        Ok(())
    }
}

/// Pairs in wire order: `_ask` or `_answer`, then `_command`, then the rest.
fn wire_order(ampbox: &AmpBox) -> Vec<(&str, &str)> {
    let lead = [ASK, ANSWER].into_iter().find(|key| ampbox.contains_key(key));
    let mut ordered = Vec::with_capacity(ampbox.len());
    for key in lead.into_iter().chain([COMMAND]) {
        if let Some(value) = ampbox.get(key) {
            ordered.push((key, value));
        }
    }
    ordered.extend(
        ampbox
            .iter()
            .filter(|(key, _)| Some(*key) != lead && *key != COMMAND),
    );
    ordered
}

fn encode_into(ampbox: &AmpBox, limits: BoxLimits, dst: &mut BytesMut) -> Result<(), EncodingError> {
    let ordered = wire_order(ampbox);
    let mut frames = Vec::with_capacity(ordered.len());
    let mut total = LENGTH_PREFIX_SIZE;
    for (key, value) in ordered {
        let key_len = key_frame_len(key, limits)?;
        let value_len = value_frame_len(key, value, limits)?;
        total += 2 * LENGTH_PREFIX_SIZE + key.len() + value.len();
        frames.push((key_len, key, value_len, value));
    }

    dst.reserve(total);
    for (key_len, key, value_len, value) in frames {
        dst.extend_from_slice(&write_frame_len(key_len));
        dst.extend_from_slice(key.as_bytes());
        dst.extend_from_slice(&write_frame_len(value_len));
        dst.extend_from_slice(value.as_bytes());
    }
    dst.extend_from_slice(&TERMINATOR);
    trace!(pairs = ampbox.len(), bytes = total, "encoded box");
    Ok(())
}

fn key_frame_len(key: &str, limits: BoxLimits) -> Result<u16, EncodingError> {
    let too_long = || EncodingError::KeyTooLong {
        key: key.to_owned(),
        len: key.len(),
        max: limits.max_key_len(),
    };
    if key.is_empty() {
        return Err(EncodingError::EmptyKey);
    }
    if key.len() > limits.max_key_len() {
        return Err(too_long());
    }
    u16::try_from(key.len()).map_err(|_| too_long())
}

fn value_frame_len(key: &str, value: &str, limits: BoxLimits) -> Result<u16, EncodingError> {
    let too_long = || EncodingError::ValueTooLong {
        key: key.to_owned(),
        len: value.len(),
        max: limits.max_value_len(),
    };
    if value.len() > limits.max_value_len() {
        return Err(too_long());
    }
    u16::try_from(value.len()).map_err(|_| too_long())
}

fn check_len(part: FramePart, len: usize, max: usize) -> Result<(), FramingError> {
    if len > max {
        return Err(FramingError::Oversized { part, len, max });
    }
    Ok(())
}

/// Scan `src` for one complete box, resuming after the pairs in `partial`.
///
/// Returns the box and the number of bytes it occupies, or `None` if the
/// buffer ends before the terminator. `partial` is reset once a box is
/// returned.
fn parse_box(
    src: &[u8],
    limits: BoxLimits,
    partial: &mut PartialBox,
) -> Result<Option<(AmpBox, usize)>, FramingError> {
    loop {
        let mut cursor = partial.parsed;
        let Some(key_len) = peek_frame_len(src, cursor) else {
            return Ok(None);
        };
        cursor += LENGTH_PREFIX_SIZE;
        if key_len == 0 {
            let ampbox = std::mem::take(&mut partial.pairs);
            partial.parsed = 0;
            return Ok(Some((ampbox, cursor)));
        }
        let key_len = usize::from(key_len);
        check_len(FramePart::Key, key_len, limits.max_key_len())?;
        let Some(key) = src.get(cursor..cursor + key_len) else {
            return Ok(None);
        };
        cursor += key_len;

        let Some(value_len) = peek_frame_len(src, cursor) else {
            return Ok(None);
        };
        cursor += LENGTH_PREFIX_SIZE;
        let value_len = usize::from(value_len);
        check_len(FramePart::Value, value_len, limits.max_value_len())?;
        let Some(value) = src.get(cursor..cursor + value_len) else {
            return Ok(None);
        };
        cursor += value_len;

        partial
            .pairs
            .insert(utf8(FramePart::Key, key)?, utf8(FramePart::Value, value)?);
        partial.parsed = cursor;
    }
}

fn utf8(part: FramePart, bytes: &[u8]) -> Result<&str, FramingError> {
    std::str::from_utf8(bytes).map_err(|_| FramingError::InvalidUtf8 { part })
}

#[cfg(test)]
mod tests;
