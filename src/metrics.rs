//! Metric helpers for `ampframe`.
//!
//! Thin wrappers over the [`metrics`](https://docs.rs/metrics) crate. With the
//! `metrics` feature disabled every helper is a no-op.

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

/// Name of the counter tracking boxes read and written by correlators.
pub const BOXES_PROCESSED: &str = "ampframe_boxes_total";
/// Name of the counter tracking correlator errors.
pub const ERRORS_TOTAL: &str = "ampframe_errors_total";
/// Name of the gauge tracking requests awaiting a response.
pub const PENDING_REQUESTS: &str = "ampframe_pending_requests";

/// Direction of box processing.
#[derive(Clone, Copy, Debug)]
pub enum Direction {
    /// Boxes received from the peer.
    Inbound,
    /// Boxes sent to the peer.
    Outbound,
}

impl Direction {
    /// Label value recorded for this direction.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// Record a processed box for the given direction.
#[cfg(feature = "metrics")]
pub fn inc_boxes(direction: Direction) {
    counter!(BOXES_PROCESSED, "direction" => direction.as_str()).increment(1);
}

/// Record a processed box for the given direction.
#[cfg(not(feature = "metrics"))]
pub fn inc_boxes(_direction: Direction) {}

/// Record a correlator error.
#[cfg(feature = "metrics")]
pub fn inc_errors() { counter!(ERRORS_TOTAL).increment(1); }

/// Record a correlator error.
#[cfg(not(feature = "metrics"))]
pub fn inc_errors() {}

/// Adjust the pending-request gauge by `delta`.
#[cfg(feature = "metrics")]
pub fn add_pending(delta: f64) { gauge!(PENDING_REQUESTS).increment(delta); }

/// Adjust the pending-request gauge by `delta`.
#[cfg(not(feature = "metrics"))]
pub fn add_pending(_delta: f64) {}
