use std::time::Duration;

// Internal modules (private)
mod concurrency_gate;
mod coordinate;
mod coordinate_cache;
mod error;
mod places;
mod rate_limiter;
mod resolver;
mod retry;

// Re-export public types
pub use concurrency_gate::{ConcurrencyGate, GatePermit};
pub use coordinate::{Coordinate, FailureKind, Outcome};
pub use coordinate_cache::CoordinateCache;
pub use error::{CacheError, ConfigError, GeocodeError};
pub use places::{
    normalize_query, parse_text_search, GeocodingClient, ParsedLocation, PlaceSearch, PlacesApi,
    SearchFuture, FIELD_MASK,
};
pub use rate_limiter::RateLimiter;
pub use resolver::{BatchReport, BatchSummary, Resolver};
pub use retry::RetryPolicy;

/// Highest admission rate a resolver accepts
pub const MAX_REQUESTS_PER_SECOND: usize = 100_000;

/// Configuration options for the resolver
///
/// The two bounds are independent: `max_in_flight` caps simultaneous
/// requests, `requests_per_second` caps how many may start in any trailing
/// second.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Admission rate ceiling for outgoing requests
    pub requests_per_second: usize,
    /// Maximum number of requests on the wire at once
    pub max_in_flight: usize,
    /// Timeout applied to each individual request attempt
    pub request_timeout: Duration,
    /// Backoff schedule around each request
    pub retry: RetryPolicy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 30,
            max_in_flight: 30,
            request_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

impl ResolverConfig {
    /// Reject zero-valued and oversized bounds
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.requests_per_second == 0 {
            return Err(ConfigError::Zero("requests_per_second"));
        }
        if self.requests_per_second > MAX_REQUESTS_PER_SECOND {
            return Err(ConfigError::TooLarge {
                field: "requests_per_second",
                max: MAX_REQUESTS_PER_SECOND,
            });
        }
        if self.max_in_flight == 0 {
            return Err(ConfigError::Zero("max_in_flight"));
        }
        if self.max_in_flight > tokio::sync::Semaphore::MAX_PERMITS {
            return Err(ConfigError::TooLarge {
                field: "max_in_flight",
                max: tokio::sync::Semaphore::MAX_PERMITS,
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Zero("request_timeout"));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Zero("retry.max_attempts"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ResolverConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.requests_per_second, 30);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_zero_bounds_rejected() {
        let config = ResolverConfig {
            max_in_flight: 0,
            ..ResolverConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Zero("max_in_flight"))
        ));
    }

    #[test]
    fn test_oversized_bounds_rejected() {
        let config = ResolverConfig {
            max_in_flight: usize::MAX,
            ..ResolverConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TooLarge {
                field: "max_in_flight",
                ..
            })
        ));

        let config = ResolverConfig {
            requests_per_second: usize::MAX,
            ..ResolverConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TooLarge {
                field: "requests_per_second",
                max: MAX_REQUESTS_PER_SECOND
            })
        ));

        let config = ResolverConfig {
            requests_per_second: MAX_REQUESTS_PER_SECOND,
            max_in_flight: tokio::sync::Semaphore::MAX_PERMITS,
            ..ResolverConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
