//! Utilities for exercising `ampframe` codecs and correlators in tests.
//!
//! [`box_bytes`] hand-assembles wire bytes without going through the
//! library encoder, so tests can feed peers' output (including frames in an
//! order the encoder would never produce). [`correlator_pair`] wires a
//! [`RequestCorrelator`](ampframe::RequestCorrelator) to an in-memory peer.
//!
//! ```rust
//! use ampframe::AmpBox;
//! use ampframe_testing::box_bytes;
//!
//! let wire = box_bytes(&[("_command", "ping")]);
//! let decoded = ampframe::deserialize(&wire).unwrap();
//! assert_eq!(decoded, AmpBox::from([("_command", "ping")]));
//! ```

pub mod helpers;
mod logging;

pub use helpers::{DEFAULT_CAPACITY, box_bytes, correlator_pair, read_boxes};
pub use logging::{LoggerHandle, logger};
