use crate::coordinate::Coordinate;
use crate::error::CacheError;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::{Mutex, MutexGuard};

/// In-memory view of the cache file
#[derive(Debug, Default)]
struct CacheState {
    /// Map from the input name (exactly as given) to its coordinate
    entries: BTreeMap<String, Coordinate>,
    loaded: bool,
}

/// Write-through coordinate cache backed by a JSON file
///
/// The file is read lazily on first access and rewritten in full on every
/// `set`. All access goes through one lock, so the load-check-populate and
/// mutate-persist sequences never interleave between tasks. Only successful
/// resolutions are ever stored; misses and failures are looked up again on
/// the next run.
#[derive(Debug)]
pub struct CoordinateCache {
    cache_path: PathBuf,
    state: Mutex<CacheState>,
}

impl CoordinateCache {
    /// Create a cache backed by the given file. Nothing is read until first use.
    pub fn new(cache_path: PathBuf) -> Self {
        Self {
            cache_path,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Cached coordinate for `name`, or `None` on a cache miss
    pub async fn get(&self, name: &str) -> Option<Coordinate> {
        let state = self.lock_loaded().await;
        state.entries.get(name).copied()
    }

    pub async fn contains(&self, name: &str) -> bool {
        let state = self.lock_loaded().await;
        state.entries.contains_key(name)
    }

    /// Store a coordinate and persist the whole map before returning
    ///
    /// The in-memory entry is kept even when the write fails, so the rest of
    /// the batch still sees it.
    pub async fn set(&self, name: &str, coordinate: Coordinate) -> Result<(), CacheError> {
        let mut state = self.lock_loaded().await;
        state.entries.insert(name.to_string(), coordinate);
        self.save(&state.entries).await
    }

    /// Number of cached names
    pub async fn len(&self) -> usize {
        self.lock_loaded().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn lock_loaded(&self) -> MutexGuard<'_, CacheState> {
        let mut state = self.state.lock().await;
        if !state.loaded {
            state.entries = match self.load().await {
                Ok(entries) => {
                    log::debug!(
                        "Loaded {} cached coordinates from {}",
                        entries.len(),
                        self.cache_path.display()
                    );
                    entries
                }
                Err(e) => {
                    log::error!("Cache load error, starting empty: {}", e);
                    BTreeMap::new()
                }
            };
            state.loaded = true;
        }
        state
    }

    async fn load(&self) -> Result<BTreeMap<String, Coordinate>, CacheError> {
        let content = match fs::read_to_string(&self.cache_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(CacheError::Io {
                    path: self.cache_path.display().to_string(),
                    source,
                })
            }
        };

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).map_err(|source| CacheError::Json {
            path: self.cache_path.display().to_string(),
            source,
        })
    }

    async fn save(&self, entries: &BTreeMap<String, Coordinate>) -> Result<(), CacheError> {
        let io_err = |source: std::io::Error| CacheError::Io {
            path: self.cache_path.display().to_string(),
            source,
        };

        // Create parent directory if needed
        if let Some(parent) = self.cache_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(io_err)?;
            }
        }

        let data = serde_json::to_string_pretty(entries).map_err(|source| CacheError::Json {
            path: self.cache_path.display().to_string(),
            source,
        })?;
        fs::write(&self.cache_path, data).await.map_err(io_err)
    }
}
