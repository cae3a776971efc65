//! Request correlation over a single connection.
//!
//! [`RequestCorrelator`] is driven by a dispatch layer that, per request, calls
//! [`read_request_header`](RequestCorrelator::read_request_header), then
//! [`read_request_body`](RequestCorrelator::read_request_body), runs the
//! handler, and finally calls
//! [`write_response`](RequestCorrelator::write_response).
//!
//! Reads happen on one sequential path. Responses may be written concurrently
//! and in any order; each is routed back to its request through a
//! connection-local sequence number. Frames from concurrent writers never
//! interleave because writes go through their own lock.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::{
    io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf},
    sync::Mutex as AsyncMutex,
};
use tokio_util::{
    codec::{FramedRead, FramedWrite},
    sync::CancellationToken,
};
use tracing::{debug, warn};

use crate::{
    ampbox::{ANSWER, AmpBox, ERROR, ERROR_CODE, ERROR_DESCRIPTION},
    binder::{BindBox, BindError, unmarshal},
    codec::{BoxCodec, CodecError, EofError},
    config::BoxLimits,
    metrics::{self, Direction},
    naming::normalize_command,
    registry::{ErrorRegistry, UNKNOWN_ERROR_CODE, UNKNOWN_ERROR_DESCRIPTION},
};

/// Failures raised by [`RequestCorrelator`].
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Reading or writing a box failed. Fatal to the connection unless
    /// [`CodecError::is_clean_close`] holds.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The `_ask` value is not a decimal correlation id.
    #[error("malformed _ask {value:?}: expected a decimal correlation id")]
    MalformedAsk {
        /// Offending value.
        value: String,
    },

    /// No pending request carries this sequence number. This is a defect in
    /// the caller's bookkeeping, not a peer error.
    #[error("invalid sequence number {seq}")]
    InvalidSequence {
        /// Sequence number passed to `write_response`.
        seq: u64,
    },

    /// The correlator was closed, or a response was written after
    /// [`RequestCorrelator::close`].
    #[error("correlator closed")]
    Closed,
}

impl ProtocolError {
    /// Returns `true` if the peer closed the stream between requests.
    #[must_use]
    pub fn is_clean_close(&self) -> bool {
        matches!(self, Self::Codec(err) if err.is_clean_close())
    }
}

/// Handler failure carrying a symbolic error code.
///
/// The code is looked up in the [`ErrorRegistry`] when the response is
/// written; unregistered codes are sent as `UNKNOWN`.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("command failed with {code}")]
pub struct CommandError {
    code: String,
}

impl CommandError {
    /// Create a failure with the given symbolic code.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self { Self { code: code.into() } }

    /// The symbolic code.
    #[must_use]
    pub fn code(&self) -> &str { &self.code }
}

/// Result of reading a request header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestHeader {
    /// Connection-local sequence number to pass to `write_response`.
    pub seq: u64,
    /// Normalized dispatch identifier derived from `_command`. Empty when the
    /// box carries no `_command`; the dispatch layer answers such requests
    /// with an error through `write_response`.
    pub method: String,
}

/// Sequence counter and the correlation id stored per sequence.
#[derive(Debug, Default)]
struct PendingRequests {
    seq: u64,
    asks: HashMap<u64, Option<u64>>,
}

impl PendingRequests {
    fn admit(&mut self, ask: Option<u64>) -> u64 {
        self.seq += 1;
        self.asks.insert(self.seq, ask);
        self.seq
    }

    fn resolve(&mut self, seq: u64) -> Option<Option<u64>> { self.asks.remove(&seq) }
}

struct ReadSide<S> {
    frames: Option<FramedRead<ReadHalf<S>, BoxCodec>>,
    current: AmpBox,
}

/// Adapter turning a byte stream of boxes into correlated requests.
///
/// Share it between the reader path and handler tasks with an [`Arc`].
pub struct RequestCorrelator<S> {
    reader: AsyncMutex<ReadSide<S>>,
    writer: AsyncMutex<Option<FramedWrite<WriteHalf<S>, BoxCodec>>>,
    pending: Mutex<PendingRequests>,
    registry: Arc<ErrorRegistry>,
    shutdown: CancellationToken,
}

impl<S> RequestCorrelator<S>
where
    S: AsyncRead + AsyncWrite,
{
    /// Wrap an open stream using the protocol box limits.
    #[must_use]
    pub fn new(stream: S, registry: Arc<ErrorRegistry>) -> Self {
        Self::with_limits(stream, registry, BoxLimits::default())
    }

    /// Wrap an open stream using custom box limits.
    #[must_use]
    pub fn with_limits(stream: S, registry: Arc<ErrorRegistry>, limits: BoxLimits) -> Self {
        let (read_half, write_half) = tokio::io::split(stream);
        Self {
            reader: AsyncMutex::new(ReadSide {
                frames: Some(FramedRead::new(read_half, BoxCodec::with_limits(limits))),
                current: AmpBox::new(),
            }),
            writer: AsyncMutex::new(Some(FramedWrite::new(
                write_half,
                BoxCodec::with_limits(limits),
            ))),
            pending: Mutex::new(PendingRequests::default()),
            registry,
            shutdown: CancellationToken::new(),
        }
    }

    /// Read the next request box and register it as pending.
    ///
    /// The decoded box is retained for
    /// [`read_request_body`](Self::read_request_body) even when its `_ask` is
    /// rejected. A box without `_command` is admitted with an empty method.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::Codec`] if the box cannot be decoded. A peer that
    ///   closes between boxes yields [`EofError::CleanClose`].
    /// - [`ProtocolError::MalformedAsk`] if `_ask` is not decimal.
    /// - [`ProtocolError::Closed`] after [`close`](Self::close).
    pub async fn read_request_header(&self) -> Result<RequestHeader, ProtocolError> {
        let result = self.read_header_inner().await;
        if let Err(err) = &result
            && !err.is_clean_close()
        {
            metrics::inc_errors();
        }
        result
    }

    async fn read_header_inner(&self) -> Result<RequestHeader, ProtocolError> {
        let mut reader = self.reader.lock().await;
        let ReadSide { frames, current } = &mut *reader;
        let Some(frames) = frames.as_mut() else {
            return Err(ProtocolError::Closed);
        };
        let next = tokio::select! {
            biased;
            () = self.shutdown.cancelled() => return Err(ProtocolError::Closed),
            next = frames.next() => next,
        };
        *current = next.unwrap_or_else(|| Err(EofError::CleanClose.into()))?;
        metrics::inc_boxes(Direction::Inbound);

        let ask = current.ask().map(parse_ask).transpose()?;
        let method = normalize_command(current.command().unwrap_or_default());
        if method.is_empty() {
            debug!(?ask, "request has no _command");
        }

        let seq = self.lock_pending().admit(ask);
        metrics::add_pending(1.0);
        debug!(seq, method = %method, ?ask, "request admitted");
        Ok(RequestHeader { seq, method })
    }

    /// Bind the most recently read request box onto `target`.
    ///
    /// # Errors
    ///
    /// Returns the first [`BindError`]; see [`crate::binder`].
    pub async fn read_request_body<T: BindBox>(&self, target: &mut T) -> Result<(), BindError> {
        let reader = self.reader.lock().await;
        unmarshal(&reader.current, target)
    }

    /// Send the outcome of request `seq` to the peer.
    ///
    /// One-way requests (no `_ask`) produce no output. Successful outcomes are
    /// sent with `_answer` set; failures as an `_error` box whose code and
    /// description come from the registry.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::InvalidSequence`] if `seq` is not pending, including
    ///   when it was already answered.
    /// - [`ProtocolError::Codec`] if the reply cannot be encoded or written.
    /// - [`ProtocolError::Closed`] if the correlator was closed.
    pub async fn write_response(
        &self,
        seq: u64,
        result: Result<AmpBox, CommandError>,
    ) -> Result<(), ProtocolError> {
        let Some(entry) = self.lock_pending().resolve(seq) else {
            warn!(seq, "response for unknown sequence number");
            metrics::inc_errors();
            return Err(ProtocolError::InvalidSequence { seq });
        };
        metrics::add_pending(-1.0);
        let Some(ask) = entry else {
            debug!(seq, "one-way request completed; no response sent");
            return Ok(());
        };

        let reply = match result {
            Ok(answer) => answer_box(answer, ask),
            Err(failure) => self.error_box(&failure, ask),
        };
        let mut writer = self.writer.lock().await;
        let Some(writer) = writer.as_mut() else {
            return Err(ProtocolError::Closed);
        };
        if let Err(err) = writer.send(reply).await {
            metrics::inc_errors();
            return Err(err.into());
        }
        metrics::inc_boxes(Direction::Outbound);
        debug!(seq, ask, "response written");
        Ok(())
    }

    /// Flush pending output and close the underlying stream.
    ///
    /// A pending [`read_request_header`](Self::read_request_header) returns
    /// [`ProtocolError::Closed`], as do later reads and writes. Both halves of
    /// the stream are dropped, so the peer sees end of stream and its writes
    /// fail. Closing twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Codec`] if flushing or shutting down fails.
    /// The stream is released either way.
    pub async fn close(&self) -> Result<(), ProtocolError> {
        self.shutdown.cancel();
        let frames = self.reader.lock().await.frames.take();
        let writer = self.writer.lock().await.take();
        let flushed = match writer {
            Some(mut writer) => writer.close().await,
            None => Ok(()),
        };
        drop(frames);
        flushed?;
        debug!("correlator closed");
        Ok(())
    }

    /// Number of requests read but not yet answered.
    #[must_use]
    pub fn pending_len(&self) -> usize { self.lock_pending().asks.len() }

    fn lock_pending(&self) -> MutexGuard<'_, PendingRequests> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn error_box(&self, failure: &CommandError, ask: u64) -> AmpBox {
        let (code, description) = match self.registry.lookup(failure.code()) {
            Some(description) => (failure.code(), description),
            None => {
                warn!(code = failure.code(), "unregistered error code; replying UNKNOWN");
                (UNKNOWN_ERROR_CODE, UNKNOWN_ERROR_DESCRIPTION)
            }
        };
        AmpBox::from([
            (ERROR, ask.to_string()),
            (ERROR_CODE, code.to_owned()),
            (ERROR_DESCRIPTION, description.to_owned()),
        ])
    }
}

/// Stamp `_answer` on a handler's reply, dropping any reserved keys it set.
fn answer_box(mut answer: AmpBox, ask: u64) -> AmpBox {
    answer.strip_reserved();
    answer.insert(ANSWER, ask.to_string());
    answer
}

fn parse_ask(raw: &str) -> Result<u64, ProtocolError> {
    let malformed = || ProtocolError::MalformedAsk {
        value: raw.to_owned(),
    };
    if raw.is_empty() || !raw.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(malformed());
    }
    raw.parse().map_err(|_| malformed())
}
