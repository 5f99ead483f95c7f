use serde::{Deserialize, Serialize};

/// Output of one inference call. Immutable after creation; the distribution
/// is aligned index-for-index with the process-wide label set.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Index into the label set, argmax of the distribution.
    pub predicted: usize,
    /// Max of the distribution, in [0, 1].
    pub confidence: f32,
    pub distribution: Vec<f32>,
}

impl Classification {
    pub fn confidence_percent(&self) -> f32 {
        self.confidence * 100.0
    }

    /// Top-k label indices by score, a derived view over the stored
    /// distribution. Ties keep the lower index first.
    pub fn top_k(&self, k: usize) -> Vec<(usize, f32)> {
        let mut ranked: Vec<(usize, f32)> = self
            .distribution
            .iter()
            .copied()
            .enumerate()
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(k);
        ranked
    }
}

/// One row of the history log. Field names double as the canonical CSV
/// header and the JSON export keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "File")]
    pub file_name: String,
    #[serde(rename = "Class")]
    pub class_label: String,
    #[serde(rename = "Color")]
    pub color_label: String,
    #[serde(rename = "Confidence")]
    pub confidence: String,
}
