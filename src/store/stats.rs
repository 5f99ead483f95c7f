//! Persisted running counts by class and by color.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::StatsError;

/// Colors tracked in `by_color`. Placeholder or undetermined colors count
/// toward the total only, so the map never grows unbounded keys.
const TRACKED_COLORS: [&str; 2] = ["Light", "Dark"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total_classifications: u64,
    pub by_class: IndexMap<String, u64>,
    pub by_color: IndexMap<String, u64>,
}

impl Default for Stats {
    fn default() -> Self {
        let by_color = TRACKED_COLORS
            .iter()
            .map(|c| ((*c).to_string(), 0))
            .collect();
        Self {
            total_classifications: 0,
            by_class: IndexMap::new(),
            by_color,
        }
    }
}

pub struct StatsAggregator {
    path: PathBuf,
    stats: Stats,
}

impl StatsAggregator {
    /// Loads persisted stats; a missing or corrupt file yields the zero
    /// state without raising.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let stats = match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<Stats>(&bytes) {
                Ok(stats) => Self::with_tracked_colors(stats),
                Err(e) => {
                    tracing::warn!(
                        "Stats file at {} is corrupt ({e}), starting from zero",
                        path.display()
                    );
                    Stats::default()
                }
            },
            Err(_) => Stats::default(),
        };
        Self { path, stats }
    }

    /// Older stats files may predate a tracked color; keep the fixed keys
    /// present so zero counts are visible in the file and on screen.
    fn with_tracked_colors(mut stats: Stats) -> Stats {
        for color in TRACKED_COLORS {
            stats.by_color.entry(color.to_string()).or_insert(0);
        }
        stats
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Counts one completed classification and persists immediately.
    pub fn record(&mut self, class_label: &str, color_label: &str) -> Result<(), StatsError> {
        self.stats.total_classifications += 1;
        *self
            .stats
            .by_class
            .entry(class_label.to_string())
            .or_insert(0) += 1;
        if let Some(count) = self.stats.by_color.get_mut(color_label) {
            *count += 1;
        }
        self.persist()
    }

    pub fn reset(&mut self) -> Result<(), StatsError> {
        self.stats = Stats::default();
        self.persist()
    }

    pub fn persist(&self) -> Result<(), StatsError> {
        let json = serde_json::to_string_pretty(&self.stats)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}
