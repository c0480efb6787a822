use shared::{ClassificationResult, ClassificationSource, SkinType};

use super::{Classify, ClassifyError};

/// The label the user picked themselves, passed through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualClassifier;

impl Classify for ManualClassifier {
    type Input = SkinType;

    fn classify(&self, label: &SkinType) -> Result<ClassificationResult, ClassifyError> {
        Ok(ClassificationResult::new(*label, None, ClassificationSource::Manual))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let result = ManualClassifier.classify(&SkinType::Sensitive).unwrap();
        assert_eq!(result.label, SkinType::Sensitive);
        assert_eq!(result.source, ClassificationSource::Manual);
        assert!(result.confidence.is_none());
    }
}
