use serde::{Deserialize, Serialize};
use shared::{ClassificationResult, ClassificationSource, QUIZ_LEN, QuizAnswer, QuizScore, SkinType};
use std::str::FromStr;

use super::{Classify, ClassifyError};

/// Cut points over the summed answer weights (8..=24).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizThresholds {
    pub dry_max: u16,
    pub normal_max: u16,
}

impl Default for QuizThresholds {
    fn default() -> Self {
        Self {
            dry_max: 10,
            normal_max: 16,
        }
    }
}

pub fn bucket(score: QuizScore, thresholds: &QuizThresholds) -> SkinType {
    if score.0 <= thresholds.dry_max {
        SkinType::Dry
    } else if score.0 <= thresholds.normal_max {
        SkinType::Normal
    } else {
        SkinType::Oily
    }
}

pub fn parse_answers<S: AsRef<str>>(raw: &[S]) -> Result<Vec<QuizAnswer>, ClassifyError> {
    raw.iter()
        .enumerate()
        .map(|(i, answer)| {
            let answer = answer.as_ref().trim();
            QuizAnswer::from_str(answer).map_err(|_| {
                ClassifyError::InvalidInput(format!(
                    "answer {} is not a recognised tier: {:?}",
                    i + 1,
                    answer
                ))
            })
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct QuizClassifier {
    thresholds: QuizThresholds,
}

impl QuizClassifier {
    pub fn new(thresholds: QuizThresholds) -> Self {
        Self { thresholds }
    }

    pub fn score(&self, answers: &[QuizAnswer]) -> Result<QuizScore, ClassifyError> {
        if answers.len() != QUIZ_LEN {
            return Err(ClassifyError::InvalidInput(format!(
                "expected {} quiz answers, got {}",
                QUIZ_LEN,
                answers.len()
            )));
        }
        Ok(QuizScore::of(answers))
    }

    /// Parses textual tiers and classifies them in one step.
    pub fn classify_text<S: AsRef<str>>(
        &self,
        raw: &[S],
    ) -> Result<ClassificationResult, ClassifyError> {
        let answers = parse_answers(raw)?;
        self.classify(answers.as_slice())
    }
}

impl Classify for QuizClassifier {
    type Input = [QuizAnswer];

    fn classify(&self, answers: &[QuizAnswer]) -> Result<ClassificationResult, ClassifyError> {
        let score = self.score(answers)?;
        let label = bucket(score, &self.thresholds);
        log::debug!("Quiz score {} -> {}", score, label);
        Ok(ClassificationResult::new(label, None, ClassificationSource::Quiz))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_high_is_oily() {
        let classifier = QuizClassifier::default();
        let answers = [QuizAnswer::High; QUIZ_LEN];
        assert_eq!(classifier.score(&answers).unwrap(), QuizScore(24));
        let result = classifier.classify(&answers[..]).unwrap();
        assert_eq!(result.label, SkinType::Oily);
        assert_eq!(result.source, ClassificationSource::Quiz);
        assert!(result.confidence.is_none());
    }

    #[test]
    fn test_bucket_edges() {
        let thresholds = QuizThresholds::default();
        assert_eq!(bucket(QuizScore(8), &thresholds), SkinType::Dry);
        assert_eq!(bucket(QuizScore(10), &thresholds), SkinType::Dry);
        assert_eq!(bucket(QuizScore(11), &thresholds), SkinType::Normal);
        assert_eq!(bucket(QuizScore(16), &thresholds), SkinType::Normal);
        assert_eq!(bucket(QuizScore(17), &thresholds), SkinType::Oily);
    }

    #[test]
    fn test_score_in_range_and_monotonic() {
        let classifier = QuizClassifier::default();
        let tiers = [QuizAnswer::Low, QuizAnswer::Medium, QuizAnswer::High];

        // exhaustive over all 3^8 answer sets
        for seed in 0..3usize.pow(QUIZ_LEN as u32) {
            let mut answers = [QuizAnswer::Low; QUIZ_LEN];
            let mut rest = seed;
            for slot in answers.iter_mut() {
                *slot = tiers[rest % 3];
                rest /= 3;
            }

            let score = classifier.score(&answers).unwrap();
            assert!((8..=24).contains(&score.0));
            let rank = classifier
                .classify(&answers[..])
                .unwrap()
                .label
                .quiz_rank()
                .unwrap();

            for i in 0..QUIZ_LEN {
                if answers[i] == QuizAnswer::High {
                    continue;
                }
                let mut raised = answers;
                raised[i] = if answers[i] == QuizAnswer::Low {
                    QuizAnswer::Medium
                } else {
                    QuizAnswer::High
                };
                let raised_rank = classifier
                    .classify(&raised[..])
                    .unwrap()
                    .label
                    .quiz_rank()
                    .unwrap();
                assert!(raised_rank >= rank);
            }
        }
    }

    #[test]
    fn test_wrong_length_rejected() {
        let classifier = QuizClassifier::default();
        let err = classifier.classify(&[QuizAnswer::Low; 7][..]);
        assert!(matches!(err, Err(ClassifyError::InvalidInput(_))));
        let err = classifier.classify(&[QuizAnswer::Low; 9][..]);
        assert!(matches!(err, Err(ClassifyError::InvalidInput(_))));
    }

    #[test]
    fn test_classify_text() {
        let classifier = QuizClassifier::default();
        let raw = ["tight", "rare", "low", "low", "Sometimes", "low", "rare", "tight"];
        let result = classifier.classify_text(&raw).unwrap();
        assert_eq!(result.label, SkinType::Dry);

        let raw = ["tight", "rare", "low", "low", "maybe", "low", "rare", "tight"];
        match classifier.classify_text(&raw) {
            Err(ClassifyError::InvalidInput(msg)) => assert!(msg.contains("answer 5")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
