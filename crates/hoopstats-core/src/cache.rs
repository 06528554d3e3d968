// Shared dataset handle with atomic reload, and a report memo keyed by the
// dataset fingerprint.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::analytics::{EngineOptions, SeasonReport, StatsEngine};
use crate::dataset::{self, DatasetError};
use crate::model::SeasonDataset;
use crate::roster::{self, Roster};

/// One immutable load of the season files.
#[derive(Debug)]
pub struct LoadedDataset {
    pub dataset: SeasonDataset,
    pub roster: Roster,
    /// Hex SHA-256 of the stats file bytes.
    pub fingerprint: String,
    pub loaded_at: DateTime<Utc>,
}

impl LoadedDataset {
    pub fn new(dataset: SeasonDataset, roster: Roster, fingerprint: String) -> Self {
        Self {
            dataset,
            roster,
            fingerprint,
            loaded_at: Utc::now(),
        }
    }

    pub fn engine<'a>(&'a self, options: &'a EngineOptions) -> StatsEngine<'a> {
        StatsEngine::new(&self.dataset, options)
    }
}

/// Leading characters of a fingerprint, for log lines.
fn short(fingerprint: &str) -> &str {
    fingerprint.get(..12).unwrap_or(fingerprint)
}

fn load_files(stats_path: &Path, roster_path: Option<&Path>) -> Result<LoadedDataset, DatasetError> {
    let (dataset, fingerprint) = dataset::load_dataset_with_fingerprint(stats_path)?;
    let roster = match roster_path {
        Some(path) => roster::load_roster(path)?,
        None => Roster::default(),
    };
    Ok(LoadedDataset::new(dataset, roster, fingerprint))
}

// ---------------------------------------------------------------------------
// DatasetStore
// ---------------------------------------------------------------------------

/// Holds the current dataset. Readers clone the `Arc` and keep a consistent
/// snapshot; a reload builds a fresh value and swaps it in whole.
#[derive(Debug)]
pub struct DatasetStore {
    stats_path: PathBuf,
    roster_path: Option<PathBuf>,
    current: RwLock<Arc<LoadedDataset>>,
}

impl DatasetStore {
    /// Load both files and build a store around them.
    pub fn open(stats_path: &Path, roster_path: Option<&Path>) -> Result<Self, DatasetError> {
        let loaded = load_files(stats_path, roster_path)?;
        info!("dataset fingerprint {}", short(&loaded.fingerprint));
        Ok(Self {
            stats_path: stats_path.to_path_buf(),
            roster_path: roster_path.map(Path::to_path_buf),
            current: RwLock::new(Arc::new(loaded)),
        })
    }

    /// Current snapshot.
    pub fn current(&self) -> Arc<LoadedDataset> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Re-read the files and swap the new dataset in. On failure the previous
    /// dataset stays current and the error is returned.
    pub fn reload(&self) -> Result<Arc<LoadedDataset>, DatasetError> {
        let loaded = match load_files(&self.stats_path, self.roster_path.as_deref()) {
            Ok(l) => Arc::new(l),
            Err(e) => {
                warn!("reload failed, keeping previous dataset: {}", e);
                return Err(e);
            }
        };
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if guard.fingerprint == loaded.fingerprint {
            debug!("reload found unchanged dataset");
        } else {
            info!(
                "dataset changed: {} -> {}",
                short(&guard.fingerprint),
                short(&loaded.fingerprint)
            );
        }
        *guard = Arc::clone(&loaded);
        Ok(loaded)
    }
}

// ---------------------------------------------------------------------------
// ReportCache
// ---------------------------------------------------------------------------

struct CachedReport {
    fingerprint: String,
    options: EngineOptions,
    report: Arc<SeasonReport>,
}

/// Memoizes the full season report for one (fingerprint, options) pair. A
/// different fingerprint, as after a reload that changed the file, replaces
/// the entry.
#[derive(Default)]
pub struct ReportCache {
    slot: Mutex<Option<CachedReport>>,
}

impl ReportCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Option<CachedReport>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get_or_compute(&self, loaded: &LoadedDataset, options: &EngineOptions) -> Arc<SeasonReport> {
        let mut slot = self.slot();
        if let Some(cached) = slot.as_ref() {
            if cached.fingerprint == loaded.fingerprint && &cached.options == options {
                debug!("season report cache hit");
                return Arc::clone(&cached.report);
            }
        }
        debug!("season report cache miss, computing");
        let report = Arc::new(loaded.engine(options).report());
        *slot = Some(CachedReport {
            fingerprint: loaded.fingerprint.clone(),
            options: options.clone(),
            report: Arc::clone(&report),
        });
        report
    }

    /// Drop any cached report.
    pub fn invalidate(&self) {
        *self.slot() = None;
    }

    pub fn is_cached_for(&self, fingerprint: &str) -> bool {
        self.slot()
            .as_ref()
            .map(|c| c.fingerprint == fingerprint)
            .unwrap_or(false)
    }
}
