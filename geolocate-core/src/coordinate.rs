use serde::{Deserialize, Serialize};
use std::fmt;

/// A resolved latitude/longitude pair
///
/// Serialized as `{"lat": .., "lng": ..}`, which is the shape stored in the
/// cache file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lng)
    }
}

/// Why a name could not be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Every attempt ran into the per-request timeout
    Timeout,
    /// Connection could not be established
    Network,
    /// Remote service kept answering with a non-success status
    Status(u16),
    /// Any other request-level failure (TLS, redirect loop, body read)
    Transport,
    /// Batch was shut down before this name finished
    Cancelled,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Status(code) => write!(f, "HTTP status {}", code),
            FailureKind::Transport => write!(f, "transport error"),
            FailureKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Terminal state of a single name's resolution
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    /// Found in the cache, no network traffic
    Cached(Coordinate),
    /// Looked up remotely and written through to the cache
    Resolved(Coordinate),
    /// Service answered but had no candidate (or the body was unusable)
    Miss,
    /// Lookup could not be completed
    Failed(FailureKind),
}

impl Outcome {
    /// Coordinate for this name, if any
    pub fn coordinate(&self) -> Option<Coordinate> {
        match self {
            Outcome::Cached(c) | Outcome::Resolved(c) => Some(*c),
            Outcome::Miss | Outcome::Failed(_) => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.coordinate().is_some()
    }
}
