use crate::concurrency_gate::ConcurrencyGate;
use crate::coordinate::{Coordinate, FailureKind, Outcome};
use crate::coordinate_cache::CoordinateCache;
use crate::error::ConfigError;
use crate::places::{normalize_query, GeocodingClient, PlaceSearch, PlacesApi};
use crate::rate_limiter::RateLimiter;
use crate::ResolverConfig;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::{HashMap, HashSet};
use std::future::Future;

/// Outcome of every distinct input name, in input order
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    names: Vec<String>,
    outcomes: HashMap<String, Outcome>,
}

/// Counts per terminal state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub cached: usize,
    pub resolved: usize,
    pub missed: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn outcome(&self, name: &str) -> Option<&Outcome> {
        self.outcomes.get(name)
    }

    /// Names and outcomes in the order the names were first given
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Outcome)> {
        self.names
            .iter()
            .filter_map(|name| self.outcomes.get(name).map(|o| (name.as_str(), o)))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name to coordinate mapping, `None` for misses and failures
    pub fn coordinates(&self) -> HashMap<String, Option<Coordinate>> {
        self.outcomes
            .iter()
            .map(|(name, outcome)| (name.clone(), outcome.coordinate()))
            .collect()
    }

    /// Names that ended without a coordinate, in input order
    pub fn unresolved(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, outcome)| !outcome.is_resolved())
            .map(|(name, _)| name)
            .collect()
    }

    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary {
            total: self.names.len(),
            ..BatchSummary::default()
        };
        for outcome in self.outcomes.values() {
            match outcome {
                Outcome::Cached(_) => summary.cached += 1,
                Outcome::Resolved(_) => summary.resolved += 1,
                Outcome::Miss => summary.missed += 1,
                Outcome::Failed(_) => summary.failed += 1,
            }
        }
        summary
    }
}

/// Resolves batches of names to coordinates
///
/// Names already in the cache never reach the network. Everything else goes
/// through the geocoding client (gate, rate limiter, retries) and successful
/// lookups are written through to the cache. Misses and failures are left out
/// of the cache so the next run asks again.
pub struct Resolver<S = PlacesApi> {
    client: GeocodingClient<S>,
    cache: CoordinateCache,
}

impl Resolver<PlacesApi> {
    /// Resolver talking to the real text-search endpoint
    pub fn with_places_api(
        url: String,
        api_key: String,
        cache: CoordinateCache,
        config: &ResolverConfig,
    ) -> Result<Self, ConfigError> {
        let api = PlacesApi::new(url, api_key, config.request_timeout)?;
        Self::new(api, cache, config)
    }
}

impl<S: PlaceSearch> Resolver<S> {
    pub fn new(search: S, cache: CoordinateCache, config: &ResolverConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let client = GeocodingClient::new(
            search,
            ConcurrencyGate::new(config.max_in_flight),
            RateLimiter::new(config.requests_per_second),
            config.retry,
        );
        Ok(Self { client, cache })
    }

    pub fn cache(&self) -> &CoordinateCache {
        &self.cache
    }

    pub fn client(&self) -> &GeocodingClient<S> {
        &self.client
    }

    /// Resolve every name and wait for all of them
    pub async fn resolve<I, N>(&self, names: I) -> BatchReport
    where
        I: IntoIterator<Item = N>,
        N: AsRef<str>,
    {
        self.resolve_until(names, std::future::pending::<()>()).await
    }

    /// Resolve every name, stopping early when `shutdown` completes
    ///
    /// Names still outstanding at shutdown are reported as
    /// `Failed(Cancelled)` unless their coordinate made it into the cache
    /// before the lookup was dropped; finished ones keep their outcome.
    pub async fn resolve_until<I, N, F>(&self, names: I, shutdown: F) -> BatchReport
    where
        I: IntoIterator<Item = N>,
        N: AsRef<str>,
        F: Future,
    {
        let names = distinct_names(names);
        log::info!(
            "Resolving {} names (max in flight: {}, {} requests/s)",
            names.len(),
            self.client.gate().max(),
            self.client.limiter().qps()
        );

        let mut pending: FuturesUnordered<_> = names
            .iter()
            .map(|name| async move { (name.as_str(), self.resolve_one(name).await) })
            .collect();

        let mut outcomes = HashMap::with_capacity(names.len());
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                next = pending.next() => match next {
                    Some((name, outcome)) => {
                        outcomes.insert(name.to_string(), outcome);
                    }
                    None => break,
                },
                _ = &mut shutdown => {
                    log::warn!(
                        "Shutdown requested, cancelling {} outstanding lookups",
                        pending.len()
                    );
                    break;
                }
            }
        }
        drop(pending);
        self.settle_outstanding(&names, &mut outcomes).await;

        let report = BatchReport { names, outcomes };
        log_summary(&report);
        report
    }

    /// Fill in names that never reached an outcome
    ///
    /// A lookup dropped mid-persist may still have landed in the cache; such
    /// names are reported from the cache, everything else as cancelled.
    async fn settle_outstanding(&self, names: &[String], outcomes: &mut HashMap<String, Outcome>) {
        for name in names {
            if outcomes.contains_key(name) {
                continue;
            }
            let outcome = match self.cache.get(name).await {
                Some(coordinate) => Outcome::Cached(coordinate),
                None => Outcome::Failed(FailureKind::Cancelled),
            };
            outcomes.insert(name.clone(), outcome);
        }
    }

    /// Resolve a single name to its terminal outcome
    pub async fn resolve_one(&self, name: &str) -> Outcome {
        if let Some(coordinate) = self.cache.get(name).await {
            log::debug!("Cache hit for {:?}", name);
            return Outcome::Cached(coordinate);
        }

        if normalize_query(name).is_empty() {
            log::warn!("Skipping blank name {:?}", name);
            return Outcome::Miss;
        }

        match self.client.request(name).await {
            Ok(Some(coordinate)) => {
                if let Err(e) = self.cache.set(name, coordinate).await {
                    log::error!("Failed to persist coordinate for {:?}: {}", name, e);
                }
                Outcome::Resolved(coordinate)
            }
            Ok(None) => Outcome::Miss,
            Err(e) => {
                log::error!(
                    "Request for {:?} (textQuery {:?}) failed: {}",
                    name,
                    normalize_query(name),
                    e
                );
                Outcome::Failed(e.kind())
            }
        }
    }
}

/// Distinct names in first-seen order
fn distinct_names<I, N>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = N>,
    N: AsRef<str>,
{
    let mut seen = HashSet::new();
    names
        .into_iter()
        .map(|name| name.as_ref().to_string())
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

fn log_summary(report: &BatchReport) {
    let summary = report.summary();
    log::info!(
        "Resolved {}/{} names ({} from cache, {} looked up, {} no result, {} failed)",
        summary.cached + summary.resolved,
        summary.total,
        summary.cached,
        summary.resolved,
        summary.missed,
        summary.failed
    );

    let unresolved = report.unresolved();
    if !unresolved.is_empty() {
        log::info!(
            "Failed to get coordinates for {} names: {:?}",
            unresolved.len(),
            unresolved
        );
    }
}
