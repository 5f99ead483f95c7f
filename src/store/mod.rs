pub mod history;
pub mod stats;

pub use history::HistoryStore;
pub use stats::{Stats, StatsAggregator};
