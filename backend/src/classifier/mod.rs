pub mod brightness;
pub mod manual;
pub mod network;
pub mod quiz;

use shared::ClassificationResult;

pub use brightness::BrightnessClassifier;
pub use manual::ManualClassifier;
pub use network::SkinNetwork;
pub use quiz::QuizClassifier;

#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// One way of turning caller input into a skin-type label.
pub trait Classify {
    type Input: ?Sized;

    fn classify(&self, input: &Self::Input) -> Result<ClassificationResult, ClassifyError>;
}

/// Picks the highest-priority result: image, then quiz, then manual.
/// Equal priorities keep the earliest candidate.
pub fn combine<I>(candidates: I) -> Option<ClassificationResult>
where
    I: IntoIterator<Item = ClassificationResult>,
{
    candidates.into_iter().fold(None, |best, candidate| match best {
        Some(current) if current.source.priority() >= candidate.source.priority() => Some(current),
        _ => Some(candidate),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{ClassificationSource, SkinType};

    fn result(label: SkinType, source: ClassificationSource) -> ClassificationResult {
        ClassificationResult::new(label, None, source)
    }

    #[test]
    fn test_combine_prefers_image() {
        let combined = combine(vec![
            result(SkinType::Sensitive, ClassificationSource::Manual),
            result(SkinType::Normal, ClassificationSource::Quiz),
            result(SkinType::Dry, ClassificationSource::Heuristic),
        ])
        .unwrap();
        assert_eq!(combined.label, SkinType::Dry);
        assert_eq!(combined.source, ClassificationSource::Heuristic);
    }

    #[test]
    fn test_combine_quiz_over_manual() {
        let combined = combine(vec![
            result(SkinType::Sensitive, ClassificationSource::Manual),
            result(SkinType::Oily, ClassificationSource::Quiz),
        ])
        .unwrap();
        assert_eq!(combined.label, SkinType::Oily);
    }

    #[test]
    fn test_combine_tie_keeps_first() {
        let combined = combine(vec![
            result(SkinType::Combination, ClassificationSource::Model),
            result(SkinType::Dry, ClassificationSource::Heuristic),
        ])
        .unwrap();
        assert_eq!(combined.label, SkinType::Combination);
    }

    #[test]
    fn test_combine_empty() {
        assert!(combine(Vec::new()).is_none());
    }
}
