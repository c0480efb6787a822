use image::RgbImage;
use image::imageops::{self, FilterType};
use ndarray::{Array1, Array2, Array3, s};
use serde::{Deserialize, Serialize};
use shared::{ClassificationResult, ClassificationSource, PredictResponse, SkinType};
use std::io::Read;

use super::{Classify, ClassifyError};

pub const INPUT_SIDE: usize = 64;
pub const CHANNELS: usize = 3;
pub const KERNEL_SIDE: usize = 3;
pub const FILTERS: usize = 16;
pub const POOL_SIDE: usize = 2;
pub const HIDDEN_UNITS: usize = 32;

const CONV_SIDE: usize = INPUT_SIDE - KERNEL_SIDE + 1;
const POOLED_SIDE: usize = CONV_SIDE / POOL_SIDE;
const FLAT_LEN: usize = POOLED_SIDE * POOLED_SIDE * FILTERS;
const PATCH_LEN: usize = KERNEL_SIDE * KERNEL_SIDE * CHANNELS;

#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("Malformed weights file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Weight shape mismatch: {0}")]
    Shape(String),
}

impl From<ndarray::ShapeError> for NetworkError {
    fn from(err: ndarray::ShapeError) -> Self {
        NetworkError::Shape(err.to_string())
    }
}

/// Trained parameters, flattened row-major: conv kernel
/// `(row, column, channel, filter)` = `(3, 3, 3, 16)`, dense kernels
/// `(inputs, units)`. The flatten step feeding the hidden layer walks
/// `(row, column, filter)`. Channel order is whatever the weights were
/// trained on, see [`ChannelOrder`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkWeights {
    pub conv_kernel: Vec<f32>,
    pub conv_bias: Vec<f32>,
    pub hidden_kernel: Vec<f32>,
    pub hidden_bias: Vec<f32>,
    pub output_kernel: Vec<f32>,
    pub output_bias: Vec<f32>,
}

impl NetworkWeights {
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, NetworkError> {
        Ok(serde_json::from_reader(reader)?)
    }
}

/// Order of the colour planes fed to the network. Weights trained on
/// OpenCV-decoded images expect BGR.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    #[default]
    Bgr,
    Rgb,
}

impl ChannelOrder {
    fn source_channel(self, c: usize) -> usize {
        match self {
            ChannelOrder::Rgb => c,
            ChannelOrder::Bgr => CHANNELS - 1 - c,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub class_index: usize,
    pub confidence: f32,
    pub probabilities: Vec<f32>,
}

impl From<&Prediction> for PredictResponse {
    fn from(prediction: &Prediction) -> Self {
        PredictResponse {
            class_index: prediction.class_index,
            confidence: prediction.confidence,
        }
    }
}

/// Small fixed CNN: conv 3x3x16 + relu, 2x2 max-pool, dense 32 + relu,
/// dense softmax over the skin-type classes.
#[derive(Debug, Clone)]
pub struct SkinNetwork {
    conv: Array2<f32>,
    conv_bias: Array1<f32>,
    hidden: Array2<f32>,
    hidden_bias: Array1<f32>,
    output: Array2<f32>,
    output_bias: Array1<f32>,
    labels: Vec<SkinType>,
    channel_order: ChannelOrder,
}

impl SkinNetwork {
    pub fn new(weights: NetworkWeights, labels: Vec<SkinType>) -> Result<Self, NetworkError> {
        let classes = weights.output_bias.len();
        if classes == 0 {
            return Err(NetworkError::Shape("output layer has no units".to_string()));
        }
        if labels.len() != classes {
            return Err(NetworkError::Shape(format!(
                "{} labels configured for {} output classes",
                labels.len(),
                classes
            )));
        }
        if weights.conv_bias.len() != FILTERS || weights.hidden_bias.len() != HIDDEN_UNITS {
            return Err(NetworkError::Shape(format!(
                "expected {} conv biases and {} hidden biases, got {} and {}",
                FILTERS,
                HIDDEN_UNITS,
                weights.conv_bias.len(),
                weights.hidden_bias.len()
            )));
        }

        Ok(Self {
            conv: Array2::from_shape_vec((PATCH_LEN, FILTERS), weights.conv_kernel)?,
            conv_bias: Array1::from(weights.conv_bias),
            hidden: Array2::from_shape_vec((FLAT_LEN, HIDDEN_UNITS), weights.hidden_kernel)?,
            hidden_bias: Array1::from(weights.hidden_bias),
            output: Array2::from_shape_vec((HIDDEN_UNITS, classes), weights.output_kernel)?,
            output_bias: Array1::from(weights.output_bias),
            labels,
            channel_order: ChannelOrder::default(),
        })
    }

    pub fn with_channel_order(mut self, channel_order: ChannelOrder) -> Self {
        self.channel_order = channel_order;
        self
    }

    pub fn classes(&self) -> usize {
        self.labels.len()
    }

    pub fn predict(&self, image: &RgbImage) -> Result<Prediction, ClassifyError> {
        let input = preprocess(image, self.channel_order)?;
        let probabilities = self.forward(&input);

        // first maximum wins on ties
        let (class_index, confidence) = probabilities.iter().enumerate().fold(
            (0, f32::NEG_INFINITY),
            |(best, best_p), (i, &p)| if p > best_p { (i, p) } else { (best, best_p) },
        );

        Ok(Prediction {
            class_index,
            confidence,
            probabilities: probabilities.to_vec(),
        })
    }

    fn forward(&self, input: &Array3<f32>) -> Array1<f32> {
        let mut conv = Array3::<f32>::zeros((CONV_SIDE, CONV_SIDE, FILTERS));
        for y in 0..CONV_SIDE {
            for x in 0..CONV_SIDE {
                let patch: Array1<f32> = input
                    .slice(s![y..y + KERNEL_SIDE, x..x + KERNEL_SIDE, ..])
                    .iter()
                    .copied()
                    .collect();
                let activation = (patch.dot(&self.conv) + &self.conv_bias).mapv(relu);
                conv.slice_mut(s![y, x, ..]).assign(&activation);
            }
        }

        let mut pooled = Array3::<f32>::zeros((POOLED_SIDE, POOLED_SIDE, FILTERS));
        for y in 0..POOLED_SIDE {
            for x in 0..POOLED_SIDE {
                for f in 0..FILTERS {
                    let window = conv.slice(s![
                        y * POOL_SIDE..(y + 1) * POOL_SIDE,
                        x * POOL_SIDE..(x + 1) * POOL_SIDE,
                        f
                    ]);
                    pooled[[y, x, f]] = window.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
                }
            }
        }

        let flat: Array1<f32> = pooled.iter().copied().collect();
        let hidden = (flat.dot(&self.hidden) + &self.hidden_bias).mapv(relu);
        let logits = hidden.dot(&self.output) + &self.output_bias;
        softmax(&logits)
    }
}

impl Classify for SkinNetwork {
    type Input = RgbImage;

    fn classify(&self, image: &RgbImage) -> Result<ClassificationResult, ClassifyError> {
        let prediction = self.predict(image)?;
        let label = self.labels[prediction.class_index];
        log::debug!(
            "Network class {} -> {} ({:.2})",
            prediction.class_index,
            label,
            prediction.confidence
        );
        Ok(ClassificationResult::new(
            label,
            Some(prediction.confidence),
            ClassificationSource::Model,
        ))
    }
}

/// Resizes to the network input and scales channels to [0, 1], laid out
/// `(row, column, channel)` with channels in `order`.
pub fn preprocess(image: &RgbImage, order: ChannelOrder) -> Result<Array3<f32>, ClassifyError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(ClassifyError::InvalidInput(
            "image has no pixels".to_string(),
        ));
    }
    let side = INPUT_SIDE as u32;
    let resized = imageops::resize(image, side, side, FilterType::Triangle);
    Ok(Array3::from_shape_fn(
        (INPUT_SIDE, INPUT_SIDE, CHANNELS),
        |(y, x, c)| {
            f32::from(resized.get_pixel(x as u32, y as u32)[order.source_channel(c)]) / 255.0
        },
    ))
}

fn relu(v: f32) -> f32 {
    v.max(0.0)
}

fn softmax(logits: &Array1<f32>) -> Array1<f32> {
    let max = logits.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
    let exp = logits.mapv(|v| (v - max).exp());
    let total = exp.sum();
    exp / total
}
