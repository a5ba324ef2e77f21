use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;

use super::loader::{self, TimestampPolicy};
use super::model::CrashDataset;
use crate::error::LoadError;

// ---------------------------------------------------------------------------
// DatasetCache – memoized loads keyed by the row-limit parameter
// ---------------------------------------------------------------------------

/// An explicit load cache: `max_rows` → loaded dataset.
///
/// Owned by whatever composes the loader and the UI, with an explicit
/// lifecycle (no module-level singleton). The first `load` for a given
/// `max_rows` reads the source; later calls hand out a clone of the same
/// `Arc`. Memoization is a performance detail only: callers rely on
/// value equality, never on pointer identity. The `Arc` makes read-only
/// sharing across sessions free.
pub struct DatasetCache {
    path: PathBuf,
    policy: TimestampPolicy,
    entries: BTreeMap<usize, Arc<CrashDataset>>,
}

impl DatasetCache {
    /// Cache for the given source file, with the default timestamp policy.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_policy(path, TimestampPolicy::default())
    }

    pub fn with_policy(path: impl Into<PathBuf>, policy: TimestampPolicy) -> Self {
        Self {
            path: path.into(),
            policy,
            entries: BTreeMap::new(),
        }
    }

    /// The backing source file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load at most `max_rows` raw rows, reusing a previous load with the
    /// same cap when one exists.
    pub fn load(&mut self, max_rows: usize) -> Result<Arc<CrashDataset>, LoadError> {
        if let Some(dataset) = self.entries.get(&max_rows) {
            debug!("cache hit for max_rows={max_rows}");
            return Ok(Arc::clone(dataset));
        }

        let dataset = Arc::new(loader::load_file_with(&self.path, max_rows, self.policy)?);
        debug!(
            "loaded {} records from {} (max_rows={max_rows})",
            dataset.len(),
            self.path.display()
        );
        self.entries.insert(max_rows, Arc::clone(&dataset));
        Ok(dataset)
    }
}
