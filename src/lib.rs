#![doc(html_root_url = "https://docs.rs/ampframe/latest")]
//! Public API for the `ampframe` library.
//!
//! This crate implements the AMP box wire format (a length-prefixed key/value
//! message) and an adapter that turns a byte stream of boxes into correlated
//! request/response exchanges for a host dispatch layer.

pub mod ampbox;
pub mod binder;
pub mod byte_order;
pub mod codec;
pub mod config;
pub mod correlator;
pub mod metrics;
pub mod naming;
pub mod registry;

pub use ampbox::AmpBox;
pub use binder::{BindBox, BindError};
pub use codec::{BoxCodec, CodecError, decode, deserialize, serialize};
pub use config::BoxLimits;
pub use correlator::{CommandError, ProtocolError, RequestCorrelator, RequestHeader};
pub use registry::ErrorRegistry;
