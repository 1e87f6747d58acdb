use geolocate_core::{
    Coordinate, CoordinateCache, Outcome, PlaceSearch, Resolver, ResolverConfig, SearchFuture,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// Answers from a fixed table of response bodies, empty result otherwise
struct TableSearch {
    bodies: HashMap<&'static str, &'static str>,
    calls: AtomicUsize,
}

impl TableSearch {
    fn new(bodies: &[(&'static str, &'static str)]) -> Self {
        Self {
            bodies: bodies.iter().copied().collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

impl PlaceSearch for TableSearch {
    fn search<'a>(&'a self, query: &'a str) -> SearchFuture<'a> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let body = self.bodies.get(query).copied().unwrap_or(r#"{"places": []}"#);
        Box::pin(async move { Ok(body.to_string()) })
    }
}

const ACME: &str = r#"{"places":[{"location":{"latitude":42.3601,"longitude":-71.0942}}]}"#;

#[tokio::test]
async fn test_acme_and_ghost() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let cache_path = temp_dir.path().join("cache").join("coordinates.json");

    let resolver = Resolver::new(
        TableSearch::new(&[("Acme University", ACME)]),
        CoordinateCache::new(cache_path.clone()),
        &ResolverConfig::default(),
    )?;

    let report = resolver.resolve(["Acme University", "Ghost College"]).await;
    let coordinates = report.coordinates();

    assert_eq!(coordinates.len(), 2);
    assert_eq!(
        coordinates["Acme University"],
        Some(Coordinate::new(42.3601, -71.0942))
    );
    assert_eq!(coordinates["Ghost College"], None);
    assert_eq!(report.unresolved(), vec!["Ghost College"]);

    // Only the successful lookup is persisted
    let on_disk: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&cache_path)?)?;
    assert_eq!(
        on_disk,
        serde_json::json!({"Acme University": {"lat": 42.3601, "lng": -71.0942}})
    );
    Ok(())
}

#[tokio::test]
async fn test_second_run_only_requeries_misses() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let cache_path = temp_dir.path().join("coordinates.json");
    let names = ["Acme University", "Ghost College"];

    let first = Resolver::new(
        TableSearch::new(&[("Acme University", ACME)]),
        CoordinateCache::new(cache_path.clone()),
        &ResolverConfig::default(),
    )?;
    first.resolve(names).await;

    let second = Resolver::new(
        TableSearch::new(&[("Acme University", ACME)]),
        CoordinateCache::new(cache_path),
        &ResolverConfig::default(),
    )?;
    let report = second.resolve(names).await;

    assert!(matches!(
        report.outcome("Acme University"),
        Some(Outcome::Cached(_))
    ));
    assert_eq!(report.outcome("Ghost College"), Some(&Outcome::Miss));
    // Ghost College is asked again, Acme University is not
    assert_eq!(second.client().search().calls.load(Ordering::SeqCst), 1);
    assert_eq!(second.cache().len().await, 1);
    Ok(())
}
