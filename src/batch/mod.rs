//! Background batch runner.
//!
//! One worker task processes images strictly sequentially in submission
//! order (the classifier is not reentrant) and publishes progress, per-item
//! results, and a final summary over a channel. The interactive thread
//! drains that channel on its own schedule; no state is mutated across
//! threads directly. A per-image failure becomes a placeholder record and
//! the batch keeps going.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::classifier::PieceClassifier;
use crate::color::ColorResult;
use crate::context::{lock_unpoisoned, AppContext};
use crate::labels::LabelSet;
use crate::pipeline::assembler;
use crate::pipeline::steps::{ClassifyStep, ColorStep, LoadStep};
use crate::pipeline::types::{Classification, Record};
use crate::pipeline::{ImageContext, ProcessingPipeline};
use crate::store::{HistoryStore, Stats, StatsAggregator};

#[derive(Debug)]
pub enum BatchEvent {
    Progress {
        processed: usize,
        total: usize,
    },
    ItemFinished {
        path: PathBuf,
        record: Record,
        classification: Option<Classification>,
        color: ColorResult,
        stats: Stats,
    },
    Completed(BatchSummary),
}

#[derive(Debug, Clone)]
pub struct ItemOutcome {
    pub file_name: String,
    pub class_label: String,
    pub color_label: String,
    pub confidence: String,
    /// Present when the item produced a placeholder record.
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub job_id: Uuid,
    pub total: usize,
    pub failures: usize,
    pub outcomes: Vec<ItemOutcome>,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub cancelled: bool,
}

#[derive(Clone)]
pub struct BatchOrchestrator {
    classifier: Arc<Mutex<Option<PieceClassifier>>>,
    history: Arc<Mutex<HistoryStore>>,
    stats: Arc<Mutex<StatsAggregator>>,
    labels: LabelSet,
    events: mpsc::Sender<BatchEvent>,
}

impl BatchOrchestrator {
    pub fn new(context: &AppContext, events: mpsc::Sender<BatchEvent>) -> Self {
        Self {
            classifier: context.classifier.clone(),
            history: context.history.clone(),
            stats: context.stats.clone(),
            labels: context.labels.clone(),
            events,
        }
    }

    /// Starts the single worker for this batch. The token is polled between
    /// images only, so the item in flight always finishes.
    pub fn spawn(&self, paths: Vec<PathBuf>) -> (JoinHandle<()>, CancellationToken) {
        let token = CancellationToken::new();
        let worker = self.clone();
        let worker_token = token.clone();
        let handle = tokio::spawn(async move {
            worker.run(paths, worker_token).await;
        });
        (handle, token)
    }

    async fn run(self, paths: Vec<PathBuf>, token: CancellationToken) {
        let job_id = Uuid::new_v4();
        let started_at = Utc::now();
        let started = std::time::Instant::now();
        let total = paths.len();
        tracing::info!("Batch {job_id} started: {total} image(s)");

        let mut pipeline = ProcessingPipeline::new()
            .add_step(Box::new(LoadStep))
            .add_step(Box::new(ClassifyStep::new(self.classifier.clone())))
            .add_step(Box::new(ColorStep));

        let mut outcomes: Vec<ItemOutcome> = Vec::with_capacity(total);
        let mut processed = 0usize;
        let mut cancelled = false;

        for path in paths {
            if token.is_cancelled() {
                tracing::info!("Batch {job_id} cancelled after {processed}/{total}");
                cancelled = true;
                break;
            }

            let mut context = ImageContext::new(path);
            if let Err(e) = pipeline.process(&mut context).await {
                // Steps capture item-level failures themselves; anything
                // surfacing here is unexpected but still must not halt the
                // batch.
                tracing::error!("Pipeline error on {}: {e}", context.file_name);
            }

            let record = assembler::assemble(
                &context.file_name,
                context.classification.as_ref(),
                context.color,
                &self.labels,
            );

            if let Err(e) = lock_unpoisoned(&self.history).append(&record) {
                tracing::error!("History append failed for {}: {e}", record.file_name);
            }
            let stats_snapshot = {
                let mut stats = lock_unpoisoned(&self.stats);
                if let Err(e) = stats.record(&record.class_label, &record.color_label) {
                    tracing::error!("Stats persist failed: {e}");
                }
                stats.stats().clone()
            };

            processed += 1;
            outcomes.push(ItemOutcome {
                file_name: record.file_name.clone(),
                class_label: record.class_label.clone(),
                color_label: record.color_label.clone(),
                confidence: record.confidence.clone(),
                error: context.failure.as_ref().map(|e| e.to_string()),
            });

            let _ = self
                .events
                .send(BatchEvent::Progress { processed, total })
                .await;
            let _ = self
                .events
                .send(BatchEvent::ItemFinished {
                    path: context.path,
                    record,
                    classification: context.classification,
                    color: context.color,
                    stats: stats_snapshot,
                })
                .await;
        }

        let failures = outcomes.iter().filter(|o| o.error.is_some()).count();
        let summary = BatchSummary {
            job_id,
            total,
            failures,
            outcomes,
            started_at,
            elapsed: started.elapsed(),
            cancelled,
        };
        tracing::info!(
            "Batch {job_id} finished: {processed}/{total} processed, {failures} failure(s) in {:?}",
            summary.elapsed
        );
        let _ = self.events.send(BatchEvent::Completed(summary)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::testing::StubModel;
    use crate::config::Settings;

    fn context_with_model(
        dir: &tempfile::TempDir,
        model: Option<Box<dyn crate::classifier::Model>>,
    ) -> AppContext {
        let labels = LabelSet::chess_pieces();
        let classifier = model.map(|m| PieceClassifier::with_model(m, labels.clone()));
        let settings = Settings {
            history_path: dir
                .path()
                .join("predictions_log.csv")
                .to_string_lossy()
                .into_owned(),
            stats_path: dir
                .path()
                .join("classification_stats.json")
                .to_string_lossy()
                .into_owned(),
            ..Settings::default()
        };
        AppContext {
            labels,
            classifier: Arc::new(Mutex::new(classifier)),
            history: Arc::new(Mutex::new(HistoryStore::new(&settings.history_path))),
            stats: Arc::new(Mutex::new(StatsAggregator::load(&settings.stats_path))),
            settings,
        }
    }

    fn write_piece(dir: &std::path::Path, name: &str, brightness: u8) -> PathBuf {
        let path = dir.join(name);
        image::ImageBuffer::from_pixel(48, 48, image::Rgb([brightness; 3]))
            .save(&path)
            .unwrap();
        path
    }

    async fn drain_until_complete(
        rx: &mut mpsc::Receiver<BatchEvent>,
    ) -> (Vec<usize>, Vec<Record>, BatchSummary) {
        let mut progress = Vec::new();
        let mut records = Vec::new();
        loop {
            match rx.recv().await.expect("event channel closed early") {
                BatchEvent::Progress { processed, .. } => progress.push(processed),
                BatchEvent::ItemFinished { record, .. } => records.push(record),
                BatchEvent::Completed(summary) => return (progress, records, summary),
            }
        }
    }

    #[tokio::test]
    async fn batch_with_one_corrupt_image_completes_with_five_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        let stub = StubModel {
            distribution: vec![0.1, 0.1, 0.6, 0.1, 0.1],
        };
        let context = context_with_model(&dir, Some(Box::new(stub)));

        let mut paths: Vec<PathBuf> = Vec::new();
        for n in 0..5 {
            if n == 2 {
                let broken = dir.path().join("img_2.png");
                std::fs::write(&broken, b"garbage").unwrap();
                paths.push(broken);
            } else {
                paths.push(write_piece(dir.path(), &format!("img_{n}.png"), 50));
            }
        }

        let (tx, mut rx) = mpsc::channel(100);
        let orchestrator = BatchOrchestrator::new(&context, tx);
        let (handle, _token) = orchestrator.spawn(paths);

        let (progress, records, summary) = drain_until_complete(&mut rx).await;
        handle.await.unwrap();

        // Monotone progress that reaches the total exactly once.
        assert_eq!(progress, vec![1, 2, 3, 4, 5]);
        assert_eq!(records.len(), 5);
        assert_eq!(summary.total, 5);
        assert_eq!(summary.outcomes.len(), 5);
        assert_eq!(summary.failures, 1);
        assert!(summary.outcomes[2].error.is_some());
        assert_eq!(summary.outcomes[2].class_label, "Error");
        assert!(!summary.cancelled);

        // Submission order is preserved in the log, failures included.
        let logged = lock_unpoisoned(&context.history).load().unwrap();
        assert_eq!(logged.len(), 5);
        assert_eq!(logged[2].file_name, "img_2.png");
        assert_eq!(logged[2].class_label, "Error");
        assert_eq!(logged[0].class_label, "Pawn");

        let stats = lock_unpoisoned(&context.stats).stats().clone();
        assert_eq!(stats.total_classifications, 5);
        assert_eq!(stats.by_class.get("Pawn"), Some(&4));
        assert_eq!(stats.by_class.get("Error"), Some(&1));
        assert_eq!(stats.by_color.get("Dark"), Some(&4));
    }

    #[tokio::test]
    async fn unavailable_model_degrades_to_color_only() {
        let dir = tempfile::tempdir().unwrap();
        let context = context_with_model(&dir, None);
        let paths = vec![write_piece(dir.path(), "light.png", 200)];

        let (tx, mut rx) = mpsc::channel(100);
        let orchestrator = BatchOrchestrator::new(&context, tx);
        let (handle, _token) = orchestrator.spawn(paths);

        let (_, records, summary) = drain_until_complete(&mut rx).await;
        handle.await.unwrap();

        assert_eq!(summary.failures, 1);
        assert_eq!(records[0].class_label, "Error");
        assert_eq!(records[0].color_label, "Light");
        assert_eq!(records[0].confidence, "0.00%");
        assert!(summary.outcomes[0]
            .error
            .as_deref()
            .unwrap()
            .contains("unavailable"));
    }

    #[tokio::test]
    async fn cancellation_stops_between_images() {
        let dir = tempfile::tempdir().unwrap();
        let stub = StubModel {
            distribution: vec![0.2; 5],
        };
        let context = context_with_model(&dir, Some(Box::new(stub)));
        let paths = (0..3)
            .map(|n| write_piece(dir.path(), &format!("p{n}.png"), 50))
            .collect();

        let (tx, mut rx) = mpsc::channel(100);
        let orchestrator = BatchOrchestrator::new(&context, tx);
        let (handle, token) = orchestrator.spawn(paths);
        token.cancel();

        let (_, _, summary) = drain_until_complete(&mut rx).await;
        handle.await.unwrap();

        assert!(summary.cancelled);
        assert!(summary.outcomes.len() < 3);
    }
}
