use crate::concurrency_gate::ConcurrencyGate;
use crate::coordinate::Coordinate;
use crate::error::{ConfigError, GeocodeError};
use crate::rate_limiter::RateLimiter;
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Response fields requested from the text-search endpoint
pub const FIELD_MASK: &str = "places.location";

/// Boxed future returned by [`PlaceSearch`]
pub type SearchFuture<'a> = Pin<Box<dyn Future<Output = Result<String, GeocodeError>> + Send + 'a>>;

/// A single text-search request against the geocoding service
///
/// Implementations issue exactly one request, check the status, and hand
/// back the raw body. Retries, admission control and parsing live in
/// [`GeocodingClient`].
pub trait PlaceSearch: Send + Sync {
    fn search<'a>(&'a self, query: &'a str) -> SearchFuture<'a>;
}

#[derive(Debug, Serialize)]
struct TextSearchRequest<'a> {
    #[serde(rename = "textQuery")]
    text_query: &'a str,
}

/// Text-search endpoint reached over HTTPS with an API key
#[derive(Clone)]
pub struct PlacesApi {
    client: reqwest::Client,
    url: String,
    api_key: String,
    timeout: Duration,
}

impl PlacesApi {
    pub fn new(url: String, api_key: String, timeout: Duration) -> Result<Self, ConfigError> {
        let user_agent = format!("geolocate/{}", env!("CARGO_PKG_VERSION"));
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;

        Ok(Self {
            client,
            url,
            api_key,
            timeout,
        })
    }

    async fn post_text_query(&self, query: &str) -> Result<String, GeocodeError> {
        log::debug!(
            "Sending request to {} (X-Goog-FieldMask: {}, X-Goog-Api-Key: <redacted>) textQuery={:?}",
            self.url,
            FIELD_MASK,
            query
        );

        let response = self
            .client
            .post(&self.url)
            .header("X-Goog-Api-Key", &self.api_key)
            .header("X-Goog-FieldMask", FIELD_MASK)
            .json(&TextSearchRequest { text_query: query })
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeocodeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response.text().await.map_err(|e| self.classify(e))
    }

    fn classify(&self, e: reqwest::Error) -> GeocodeError {
        if e.is_timeout() {
            GeocodeError::Timeout(self.timeout)
        } else if e.is_connect() {
            GeocodeError::Connect(e.to_string())
        } else {
            GeocodeError::Transport(e.to_string())
        }
    }
}

impl std::fmt::Debug for PlacesApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlacesApi")
            .field("url", &self.url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl PlaceSearch for PlacesApi {
    fn search<'a>(&'a self, query: &'a str) -> SearchFuture<'a> {
        Box::pin(self.post_text_query(query))
    }
}

/// Clean a name before sending it: swap non-breaking spaces for plain ones,
/// drop zero-width spaces, trim the ends.
pub fn normalize_query(name: &str) -> String {
    name.replace('\u{a0}', " ")
        .replace('\u{200b}', "")
        .trim()
        .to_string()
}

#[derive(Debug, Deserialize)]
struct TextSearchResponse {
    #[serde(default)]
    places: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Place {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    latitude: f64,
    longitude: f64,
}

/// Result of reading a text-search body
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLocation {
    /// First candidate's location
    Found(Coordinate),
    /// Service found nothing for the query
    NoResult,
    /// Body or first candidate did not have the expected shape
    Malformed(String),
}

/// Extract the first candidate's coordinate from a response body
pub fn parse_text_search(body: &str) -> ParsedLocation {
    let response: TextSearchResponse = match serde_json::from_str(body) {
        Ok(r) => r,
        Err(e) => return ParsedLocation::Malformed(e.to_string()),
    };

    let Some(first) = response.places.into_iter().next() else {
        return ParsedLocation::NoResult;
    };

    match serde_json::from_value::<Place>(first) {
        Ok(place) => ParsedLocation::Found(Coordinate::new(
            place.location.latitude,
            place.location.longitude,
        )),
        Err(e) => ParsedLocation::Malformed(e.to_string()),
    }
}

/// Geocoding client with admission control and retries around each request
///
/// Every attempt takes a concurrency slot and a rate-limiter admission before
/// touching the network; the backoff sleep between attempts holds neither.
pub struct GeocodingClient<S> {
    search: S,
    gate: ConcurrencyGate,
    limiter: RateLimiter,
    retry: RetryPolicy,
}

impl<S: PlaceSearch> GeocodingClient<S> {
    pub fn new(search: S, gate: ConcurrencyGate, limiter: RateLimiter, retry: RetryPolicy) -> Self {
        Self {
            search,
            gate,
            limiter,
            retry,
        }
    }

    pub fn search(&self) -> &S {
        &self.search
    }

    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Look up one name
    ///
    /// `Ok(None)` covers both an empty candidate list and an unusable body;
    /// the latter is logged here and never surfaces as an error. `Err` is the
    /// last request failure once the retry budget is spent.
    pub async fn request(&self, name: &str) -> Result<Option<Coordinate>, GeocodeError> {
        let query = normalize_query(name);
        let label = format!("geocode {:?}", query);

        let body = self
            .retry
            .run(&label, |_attempt| self.attempt(&query))
            .await?;

        match parse_text_search(&body) {
            ParsedLocation::Found(coordinate) => Ok(Some(coordinate)),
            ParsedLocation::NoResult => {
                log::warn!("No results for: {}. Response: {}", name, body.trim());
                Ok(None)
            }
            ParsedLocation::Malformed(reason) => {
                log::error!("Invalid response for {}: {}", name, reason);
                Ok(None)
            }
        }
    }

    async fn attempt(&self, query: &str) -> Result<String, GeocodeError> {
        let _permit = self.gate.acquire().await?;
        self.limiter.wait().await;
        self.search.search(query).await
    }
}
