//! Unit tests for the box codec.
//!
//! Covers reserved-key ordering, byte-exact framing, encode-time validation,
//! incremental decoding, and EOF classification.

use bytes::BytesMut;
use rstest::rstest;
use tokio::io::AsyncWriteExt;

use super::*;

const PYTHON_GENERATED_WIRE: &[u8] = b"\x00\x04_ask\x00\x011\x00\x08_command\x00\x08listpeer\x00\x00";

fn listpeer_request() -> AmpBox {
    AmpBox::from([
        ("_ask", "1"),
        ("_command", "listpeer"),
        ("payload", "{\"key\":\"value\"}"),
    ])
}

/// Split serialized bytes into the sequence of frame strings they carry.
fn frames(wire: &[u8]) -> Vec<String> {
    let mut out = Vec::new();
    let mut cursor = 0;
    while let Some(len) = peek_frame_len(wire, cursor) {
        cursor += LENGTH_PREFIX_SIZE;
        let len = usize::from(len);
        let frame = wire.get(cursor..cursor + len).expect("frame within buffer");
        out.push(String::from_utf8(frame.to_vec()).expect("utf-8 frame"));
        cursor += len;
    }
    out
}

#[test]
fn request_round_trips_through_wire_form() {
    let request = listpeer_request();
    let wire = serialize(&request).expect("serialize");
    assert_eq!(deserialize(&wire).expect("deserialize"), request);
}

#[test]
fn decodes_bytes_produced_by_python_peer() {
    let decoded = deserialize(PYTHON_GENERATED_WIRE).expect("deserialize");
    assert_eq!(decoded, AmpBox::from([("_ask", "1"), ("_command", "listpeer")]));
}

#[test]
fn serializes_to_python_compatible_bytes() {
    let request = AmpBox::from([("_command", "listpeer"), ("_ask", "1")]);
    let wire = serialize(&request).expect("serialize");
    assert_eq!(&wire[..], PYTHON_GENERATED_WIRE);
}

#[test]
fn ask_then_command_lead_the_box() {
    let request = AmpBox::from([
        ("aardvark", "sorts before every reserved key"),
        ("_command", "sum"),
        ("_ask", "17"),
        ("_answer", "ignored"),
    ]);
    let wire = serialize(&request).expect("serialize");
    let frames = frames(&wire);
    assert_eq!(&frames[..4], ["_ask", "17", "_command", "sum"]);
}

#[test]
fn answer_leads_when_ask_is_absent() {
    let response = AmpBox::from([("_answer", "4"), ("_command", "sum"), ("_a", "x")]);
    let wire = serialize(&response).expect("serialize");
    let frames = frames(&wire);
    assert_eq!(&frames[..4], ["_answer", "4", "_command", "sum"]);
}

#[test]
fn empty_box_is_just_the_terminator() {
    let wire = serialize(&AmpBox::new()).expect("serialize");
    assert_eq!(&wire[..], &TERMINATOR);
    assert_eq!(deserialize(&wire).expect("deserialize"), AmpBox::new());
}

#[test]
fn empty_value_is_permitted() {
    let ampbox = AmpBox::from([("flag", "")]);
    let wire = serialize(&ampbox).expect("serialize");
    assert_eq!(&wire[..], b"\x00\x04flag\x00\x00\x00\x00");
    assert_eq!(deserialize(&wire).expect("deserialize"), ampbox);
}

#[test]
fn empty_key_is_rejected() {
    let err = serialize(&AmpBox::from([("", "value")])).expect_err("empty key");
    assert_eq!(err, EncodingError::EmptyKey);
}

#[test]
fn key_at_limit_is_accepted_and_one_past_is_rejected() {
    let at_limit = "k".repeat(255);
    serialize(&AmpBox::from([(at_limit.as_str(), "v")])).expect("255-byte key");

    let too_long = "k".repeat(256);
    let err = serialize(&AmpBox::from([(too_long.as_str(), "v")])).expect_err("256-byte key");
    assert!(matches!(err, EncodingError::KeyTooLong { len: 256, max: 255, .. }));
}

#[test]
fn oversized_value_is_rejected() {
    let value = "v".repeat(65_536);
    let err = serialize(&AmpBox::from([("blob", value.as_str())])).expect_err("oversized value");
    assert!(matches!(
        err,
        EncodingError::ValueTooLong { ref key, len: 65_536, max: 65_535 } if key == "blob"
    ));
}

#[test]
fn encode_failure_writes_nothing() {
    let mut codec = BoxCodec::with_limits(BoxLimits::default().with_max_value_len(4));
    let mut dst = BytesMut::new();
    let ampbox = AmpBox::from([("a", "ok"), ("b", "too long")]);
    let err = codec.encode(ampbox, &mut dst).expect_err("value over limit");
    assert!(matches!(err, CodecError::Encoding(EncodingError::ValueTooLong { .. })));
    assert!(dst.is_empty());
}

#[test]
fn concatenated_boxes_decode_in_order() {
    let first = AmpBox::from([("_ask", "1"), ("_command", "a")]);
    let second = AmpBox::from([("_ask", "2"), ("_command", "b")]);
    let mut codec = BoxCodec::new();
    let mut buf = BytesMut::new();
    codec.encode(first.clone(), &mut buf).expect("encode first");
    codec.encode(second.clone(), &mut buf).expect("encode second");

    assert_eq!(codec.decode(&mut buf).expect("decode"), Some(first));
    assert_eq!(codec.decode(&mut buf).expect("decode"), Some(second));
    assert!(buf.is_empty());
}

#[test]
fn partial_box_is_not_consumed() {
    let mut codec = BoxCodec::new();
    let mut buf = BytesMut::new();
    for chunk in PYTHON_GENERATED_WIRE.chunks(3) {
        assert_eq!(buf.len() % 3, 0);
        assert_eq!(codec.decode(&mut buf).expect("decode"), None);
        buf.extend_from_slice(chunk);
    }
    let decoded = codec.decode(&mut buf).expect("decode").expect("complete box");
    assert_eq!(decoded.command(), Some("listpeer"));
    assert!(buf.is_empty());
}

#[test]
fn decoder_resumes_after_last_complete_pair() {
    let mut codec = BoxCodec::new();
    // `_ask` pair (9 bytes) plus half of the `_command` key frame.
    let mut buf = BytesMut::from(&PYTHON_GENERATED_WIRE[..14]);
    assert_eq!(codec.decode(&mut buf).expect("decode"), None);
    assert_eq!(codec.partial.parsed, 9);
    assert_eq!(codec.partial.pairs, AmpBox::from([("_ask", "1")]));

    buf.extend_from_slice(&PYTHON_GENERATED_WIRE[14..]);
    let decoded = codec.decode(&mut buf).expect("decode").expect("complete box");
    assert_eq!(decoded, AmpBox::from([("_ask", "1"), ("_command", "listpeer")]));
    assert_eq!(codec.partial.parsed, 0);
    assert!(codec.partial.pairs.is_empty());
}

#[test]
fn decoder_forgets_partial_box_after_framing_error() {
    let mut codec = BoxCodec::new();
    let mut buf = BytesMut::from(&b"\x00\x01k\x00\x01v\x00\x01\xff\x00\x01v"[..]);
    codec.decode(&mut buf).expect_err("invalid utf-8 key");
    assert_eq!(codec.partial.parsed, 0);
    assert!(codec.partial.pairs.is_empty());
}

#[rstest]
#[case::empty(&[], 0)]
#[case::one_byte(&[0x00], 1)]
fn short_buffers_are_rejected(#[case] wire: &[u8], #[case] len: usize) {
    let err = deserialize(wire).expect_err("too short");
    assert!(matches!(
        err,
        CodecError::Framing(FramingError::BufferTooShort { len: got }) if got == len
    ));
}

#[rstest]
#[case::mid_key(b"\x00\x04_as".as_slice())]
#[case::mid_value_prefix(b"\x00\x04_ask\x00".as_slice())]
#[case::missing_terminator(b"\x00\x04_ask\x00\x011".as_slice())]
fn truncated_buffers_report_mid_box_eof(#[case] wire: &[u8]) {
    let err = deserialize(wire).expect_err("truncated");
    assert!(matches!(
        err,
        CodecError::Eof(EofError::MidBox { bytes_received }) if bytes_received == wire.len()
    ));
}

#[rstest]
#[case::key(b"\x00\x02\xff\xfe\x00\x01v\x00\x00".as_slice(), FramePart::Key)]
#[case::value(b"\x00\x01k\x00\x02\xc3\x28\x00\x00".as_slice(), FramePart::Value)]
fn invalid_utf8_is_a_framing_error(#[case] wire: &[u8], #[case] part: FramePart) {
    let err = deserialize(wire).expect_err("invalid utf-8");
    assert!(matches!(
        err,
        CodecError::Framing(FramingError::InvalidUtf8 { part: got }) if got == part
    ));
}

#[test]
fn trailing_bytes_after_terminator_are_ignored() {
    let mut wire = PYTHON_GENERATED_WIRE.to_vec();
    wire.extend_from_slice(b"\x00\x03abc");
    let decoded = deserialize(&wire).expect("deserialize");
    assert_eq!(decoded.ask(), Some("1"));
}

#[test]
fn tightened_key_limit_rejects_long_keys_on_decode() {
    let limits = BoxLimits::default().with_max_key_len(4);
    let err = deserialize_with(PYTHON_GENERATED_WIRE, limits).expect_err("_command is 8 bytes");
    assert!(matches!(
        err,
        CodecError::Framing(FramingError::Oversized {
            part: FramePart::Key,
            len: 8,
            max: 4
        })
    ));
}

#[test]
fn decode_eof_on_empty_buffer_is_clean() {
    let mut codec = BoxCodec::new();
    let mut buf = BytesMut::new();
    assert!(matches!(codec.decode_eof(&mut buf), Ok(None)));
}

#[test]
fn decode_eof_with_partial_box_reports_bytes_received() {
    let mut codec = BoxCodec::new();
    let mut buf = BytesMut::from(&PYTHON_GENERATED_WIRE[..7]);
    let err = codec.decode_eof(&mut buf).expect_err("partial box");
    assert!(matches!(
        err,
        CodecError::Eof(EofError::MidBox { bytes_received: 7 })
    ));
}

#[tokio::test]
async fn async_decode_reads_one_box_at_a_time() {
    let (mut client, mut server) = tokio::io::duplex(8);
    let writer = tokio::spawn(async move {
        client
            .write_all(PYTHON_GENERATED_WIRE)
            .await
            .expect("write first");
        client
            .write_all(b"\x00\x01k\x00\x01v\x00\x00")
            .await
            .expect("write second");
    });

    let first = decode(&mut server).await.expect("first box");
    assert_eq!(first.command(), Some("listpeer"));
    let second = decode(&mut server).await.expect("second box");
    assert_eq!(second, AmpBox::from([("k", "v")]));

    writer.await.expect("writer task");
    let err = decode(&mut server).await.expect_err("stream ended");
    assert!(err.is_clean_close());
}

#[tokio::test]
async fn async_decode_reports_stream_closed_mid_box() {
    let (mut client, mut server) = tokio::io::duplex(64);
    client
        .write_all(b"\x00\x04_ask\x00\x01")
        .await
        .expect("write partial box");
    drop(client);

    let err = decode(&mut server).await.expect_err("truncated");
    assert!(matches!(
        err,
        CodecError::Eof(EofError::MidBox { bytes_received: 8 })
    ));
}

#[tokio::test]
async fn async_decode_rejects_invalid_utf8() {
    let wire: &[u8] = b"\x00\x01k\x00\x01\xff\x00\x00";
    let mut reader = wire;
    let err = decode(&mut reader).await.expect_err("invalid utf-8");
    assert!(matches!(
        err,
        CodecError::Framing(FramingError::InvalidUtf8 {
            part: FramePart::Value
        })
    ));
}
