//! Combines classifier and color outputs into one history record.

use crate::color::ColorResult;
use crate::labels::LabelSet;
use crate::pipeline::types::{Classification, Record};

/// Class placeholder when classification failed upstream.
pub const ERROR_CLASS: &str = "Error";

/// Pure, synchronous assembly; never fails. Class and color fields are
/// always populated, with placeholders standing in for upstream failures.
/// Confidence is rendered as a two-decimal percentage string.
pub fn assemble(
    file_name: &str,
    classification: Option<&Classification>,
    color: ColorResult,
    labels: &LabelSet,
) -> Record {
    let (class_label, confidence) = match classification {
        Some(c) => {
            let display = labels
                .get(c.predicted)
                .map(|label| label.display.clone())
                .unwrap_or_else(|| ERROR_CLASS.to_string());
            (display, format!("{:.2}%", c.confidence_percent()))
        }
        None => (ERROR_CLASS.to_string(), "0.00%".to_string()),
    };
    Record {
        file_name: file_name.to_string(),
        class_label,
        color_label: color.color.to_string(),
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::PieceColor;

    #[test]
    fn renders_confidence_with_two_decimals() {
        let classification = Classification {
            predicted: 4,
            confidence: 0.97254,
            distribution: vec![0.0, 0.0, 0.01, 0.01746, 0.97254],
        };
        let record = assemble(
            "rook.jpg",
            Some(&classification),
            ColorResult {
                color: PieceColor::Dark,
                metric: 60.0,
            },
            &LabelSet::chess_pieces(),
        );
        assert_eq!(record.class_label, "Rook");
        assert_eq!(record.color_label, "Dark");
        assert_eq!(record.confidence, "97.25%");
    }

    #[test]
    fn upstream_failure_yields_placeholders() {
        let record = assemble(
            "broken.png",
            None,
            ColorResult::undetermined(),
            &LabelSet::chess_pieces(),
        );
        assert_eq!(record.class_label, ERROR_CLASS);
        assert_eq!(record.color_label, "Undetermined");
        assert_eq!(record.confidence, "0.00%");
    }

    #[test]
    fn out_of_range_index_falls_back_to_error_class() {
        let classification = Classification {
            predicted: 99,
            confidence: 1.0,
            distribution: vec![1.0],
        };
        let record = assemble(
            "odd.png",
            Some(&classification),
            ColorResult {
                color: PieceColor::Light,
                metric: 200.0,
            },
            &LabelSet::chess_pieces(),
        );
        assert_eq!(record.class_label, ERROR_CLASS);
        assert_eq!(record.color_label, "Light");
    }
}
