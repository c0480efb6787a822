use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

pub mod quiz;
pub mod wizard;

pub use quiz::{QUIZ_LEN, QUIZ_QUESTIONS, QuizAnswer, QuizScore};
pub use wizard::{WizardAction, WizardStep};

/// Cosmetic skin-type label. Parsing ignores ASCII case.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum SkinType {
    Dry,
    Normal,
    Oily,
    Sensitive,
    Combination,
}

impl SkinType {
    /// Case-insensitive equality-or-substring match against a catalog tag.
    /// Compound tags such as `"oily, combination"` match both labels.
    pub fn matches_tag(&self, tag: &str) -> bool {
        let tag = tag.trim().to_ascii_lowercase();
        if tag.is_empty() {
            return false;
        }
        tag.contains(&self.as_ref().to_ascii_lowercase())
    }

    /// Bucket rank used by the quiz (Dry < Normal < Oily). Labels the quiz
    /// never yields have no rank.
    pub fn quiz_rank(&self) -> Option<u8> {
        match self {
            SkinType::Dry => Some(0),
            SkinType::Normal => Some(1),
            SkinType::Oily => Some(2),
            SkinType::Sensitive | SkinType::Combination => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationSource {
    /// Brightness/contrast rule over the image.
    #[strum(serialize = "heuristic")]
    Heuristic,
    /// Caller-supplied network weights run over the image.
    #[strum(serialize = "model")]
    Model,
    #[strum(serialize = "quiz")]
    Quiz,
    #[strum(serialize = "manual")]
    Manual,
}

impl ClassificationSource {
    /// Image-derived results outrank the quiz, which outranks manual selection.
    pub fn priority(&self) -> u8 {
        match self {
            ClassificationSource::Heuristic | ClassificationSource::Model => 2,
            ClassificationSource::Quiz => 1,
            ClassificationSource::Manual => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: SkinType,
    pub confidence: Option<f32>,
    pub source: ClassificationSource,
}

impl ClassificationResult {
    pub fn new(label: SkinType, confidence: Option<f32>, source: ClassificationSource) -> Self {
        Self {
            label,
            confidence: confidence.map(|c| c.clamp(0.0, 1.0)),
            source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub code: String,
    pub name: String,
    pub brand: String,
    pub price: Option<f64>,
    pub rating: Option<f64>,
    pub skin_type_tags: String,
    pub website_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub label: SkinType,
    /// Rows that matched before truncation.
    pub matched: usize,
    pub products: Vec<ProductRecord>,
}

impl RecommendationResult {
    pub fn empty(label: SkinType) -> Self {
        Self {
            label,
            matched: 0,
            products: Vec::new(),
        }
    }

    /// True when no catalog row matched; render "no products found".
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PredictResponse {
    pub class_index: usize,
    pub confidence: f32,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct QuizRequest {
    pub answers: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct WizardTransitionRequest {
    pub step: WizardStep,
    pub action: WizardAction,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct WizardTransitionResponse {
    pub step: WizardStep,
}
