//! The connectivity probe consulted before any submission is persisted.
//!
//! The probe is checked synchronously before touching the store. When it
//! reports offline, handlers wait a short configured delay before reporting
//! the failure so the client sees the usual round-trip rather than an
//! instant rejection followed by a hung retry.

use std::fmt::Debug;

/// Answers whether the backing store is reachable right now.
pub trait ConnectivityProbe: Send + Sync + Debug {
    /// Returns `true` if submissions should be attempted.
    fn is_online(&self) -> bool;
}

/// A probe that always reports the device as online.
///
/// The server has no equivalent of a browser's connectivity API, so this is
/// the production default; tests substitute their own probes.
#[derive(Debug, Clone, Copy)]
pub struct AlwaysOnline;

impl ConnectivityProbe for AlwaysOnline {
    fn is_online(&self) -> bool {
        true
    }
}
