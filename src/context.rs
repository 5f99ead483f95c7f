//! Process-wide shared state, passed explicitly to every component.

use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::classifier::PieceClassifier;
use crate::config::Settings;
use crate::labels::LabelSet;
use crate::store::{HistoryStore, StatsAggregator};

/// No ambient globals: the model handle, the stores, and the settings all
/// live here and are handed to constructors. The classifier slot is `None`
/// when the model failed to load; the session then degrades to
/// display-only and color detection keeps working.
#[derive(Clone)]
pub struct AppContext {
    pub settings: Settings,
    pub labels: LabelSet,
    pub classifier: Arc<Mutex<Option<PieceClassifier>>>,
    pub history: Arc<Mutex<HistoryStore>>,
    pub stats: Arc<Mutex<StatsAggregator>>,
}

impl AppContext {
    pub fn initialize(settings: Settings) -> Self {
        let labels = LabelSet::chess_pieces();
        let classifier = match PieceClassifier::load(Path::new(&settings.model_path), labels.clone())
        {
            Ok(classifier) => Some(classifier),
            Err(e) => {
                tracing::error!("Classification disabled for this session: {e}");
                None
            }
        };
        let history = HistoryStore::new(&settings.history_path);
        let stats = StatsAggregator::load(&settings.stats_path);
        Self {
            settings,
            labels,
            classifier: Arc::new(Mutex::new(classifier)),
            history: Arc::new(Mutex::new(history)),
            stats: Arc::new(Mutex::new(stats)),
        }
    }

    pub fn model_available(&self) -> bool {
        lock_unpoisoned(&self.classifier).is_some()
    }
}

/// Locks, recovering the guard when a previous holder panicked.
pub fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
