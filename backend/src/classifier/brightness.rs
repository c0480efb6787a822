use image::RgbImage;
use serde::{Deserialize, Serialize};
use shared::{ClassificationResult, ClassificationSource, SkinType};

use super::{Classify, ClassifyError};

/// Decision rule over mean luminance (and optionally its spread).
///
/// Bright, matte images read as dry; dark, shiny ones as oily. Variants of
/// the rule disagree on cut points, so every value is configurable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrightnessThresholds {
    /// Mean luminance above this is Dry.
    pub dry_above: f32,
    /// Mean luminance below this is Oily.
    pub oily_below: f32,
    /// Treat a value equal to a threshold as crossing it.
    pub inclusive: bool,
    /// In the middle band, a luminance std-dev above this is Combination.
    pub combination_contrast_above: Option<f32>,
}

impl Default for BrightnessThresholds {
    fn default() -> Self {
        Self {
            dry_above: 170.0,
            oily_below: 100.0,
            inclusive: false,
            combination_contrast_above: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LuminanceStats {
    pub mean: f32,
    pub std_dev: f32,
}

impl LuminanceStats {
    pub fn of(image: &RgbImage) -> Result<Self, ClassifyError> {
        let pixel_count = u64::from(image.width()) * u64::from(image.height());
        if pixel_count == 0 {
            return Err(ClassifyError::InvalidInput(
                "image has no pixels".to_string(),
            ));
        }

        let (sum, sum_sq) = image.pixels().fold((0.0f64, 0.0f64), |(sum, sum_sq), pixel| {
            let [r, g, b] = pixel.0;
            let y = 0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b);
            (sum + y, sum_sq + y * y)
        });

        let n = pixel_count as f64;
        let mean = sum / n;
        let variance = (sum_sq / n - mean * mean).max(0.0);
        Ok(Self {
            mean: mean as f32,
            std_dev: variance.sqrt() as f32,
        })
    }
}

fn crosses_above(value: f32, threshold: f32, inclusive: bool) -> bool {
    if inclusive { value >= threshold } else { value > threshold }
}

fn crosses_below(value: f32, threshold: f32, inclusive: bool) -> bool {
    if inclusive { value <= threshold } else { value < threshold }
}

pub fn classify_by_brightness(
    mean: f32,
    std_dev: f32,
    thresholds: &BrightnessThresholds,
) -> SkinType {
    if crosses_above(mean, thresholds.dry_above, thresholds.inclusive) {
        SkinType::Dry
    } else if crosses_below(mean, thresholds.oily_below, thresholds.inclusive) {
        SkinType::Oily
    } else {
        match thresholds.combination_contrast_above {
            Some(limit) if std_dev > limit => SkinType::Combination,
            _ => SkinType::Normal,
        }
    }
}

/// Normalized distance of `mean` from the nearest boundary of the band it
/// fell in, in [0, 1]. A value sitting on a cut point scores 0.
pub fn boundary_confidence(mean: f32, label: SkinType, thresholds: &BrightnessThresholds) -> f32 {
    let confidence = match label {
        SkinType::Dry => {
            let span = 255.0 - thresholds.dry_above;
            if span > 0.0 { (mean - thresholds.dry_above) / span } else { 1.0 }
        }
        SkinType::Oily => {
            if thresholds.oily_below > 0.0 {
                (thresholds.oily_below - mean) / thresholds.oily_below
            } else {
                1.0
            }
        }
        _ => {
            let half_band = (thresholds.dry_above - thresholds.oily_below) / 2.0;
            if half_band > 0.0 {
                (mean - thresholds.oily_below).min(thresholds.dry_above - mean) / half_band
            } else {
                0.0
            }
        }
    };
    confidence.clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Default)]
pub struct BrightnessClassifier {
    thresholds: BrightnessThresholds,
}

impl BrightnessClassifier {
    pub fn new(thresholds: BrightnessThresholds) -> Self {
        Self { thresholds }
    }
}

impl Classify for BrightnessClassifier {
    type Input = RgbImage;

    fn classify(&self, image: &RgbImage) -> Result<ClassificationResult, ClassifyError> {
        let stats = LuminanceStats::of(image)?;
        let label = classify_by_brightness(stats.mean, stats.std_dev, &self.thresholds);
        let confidence = boundary_confidence(stats.mean, label, &self.thresholds);
        log::debug!(
            "Brightness mean={:.1} std={:.1} -> {} ({:.2})",
            stats.mean,
            stats.std_dev,
            label,
            confidence
        );
        Ok(ClassificationResult::new(
            label,
            Some(confidence),
            ClassificationSource::Heuristic,
        ))
    }
}
