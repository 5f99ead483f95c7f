//! Rule-based figure color detection.
//!
//! Grayscale variant: mean brightness of the central crop after background
//! exclusion. Constants are fixed for reproducibility: background pixels are
//! those at brightness >= 240 on the 8-bit channel, and the light/dark
//! decision boundary is a mean of 127.

use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// Brightness at or above this is treated as white background.
const BACKGROUND_THRESHOLD: u8 = 240;
/// Mean brightness below this classifies the figure as dark.
const DARK_BOUNDARY: f32 = 127.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PieceColor {
    Light,
    Dark,
    Undetermined,
}

impl std::fmt::Display for PieceColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PieceColor::Light => "Light",
            PieceColor::Dark => "Dark",
            PieceColor::Undetermined => "Undetermined",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorResult {
    pub color: PieceColor,
    /// Mean brightness of the sampled pixels, 0 when undetermined.
    pub metric: f32,
}

impl ColorResult {
    pub fn undetermined() -> Self {
        Self {
            color: PieceColor::Undetermined,
            metric: 0.0,
        }
    }
}

/// Classifies the figure color from the central square region of side
/// `min(width, height) / 2`. A fully background-colored crop yields
/// `Undetermined` with metric 0; that is a normal outcome for blank or
/// overexposed crops, not an error.
pub fn detect_color(image: &DynamicImage) -> ColorResult {
    let gray = image.to_luma8();
    let (w, h) = gray.dimensions();
    let (cx, cy) = (w / 2, h / 2);
    let half = w.min(h) / 2 / 2;

    let mut sum: u64 = 0;
    let mut count: u64 = 0;
    for y in cy.saturating_sub(half)..(cy + half).min(h) {
        for x in cx.saturating_sub(half)..(cx + half).min(w) {
            let v = gray.get_pixel(x, y).0[0];
            if v < BACKGROUND_THRESHOLD {
                sum += u64::from(v);
                count += 1;
            }
        }
    }

    if count == 0 {
        return ColorResult::undetermined();
    }

    let mean = sum as f32 / count as f32;
    let color = if mean < DARK_BOUNDARY {
        PieceColor::Dark
    } else {
        PieceColor::Light
    };
    ColorResult { color, metric: mean }
}
