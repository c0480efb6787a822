use serde::{Deserialize, Serialize};

/// Steps of the capture → quiz → recommend flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    #[default]
    Capture,
    Quiz,
    Recommend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardAction {
    ImageSubmitted,
    SkipCapture,
    QuizSubmitted,
    Back,
    Restart,
}

impl WizardStep {
    /// Next step for `action`. Actions that do not apply to the current
    /// step leave it unchanged.
    pub fn transition(self, action: WizardAction) -> WizardStep {
        use WizardAction::*;
        use WizardStep::*;

        match (self, action) {
            (_, Restart) => Capture,
            (Capture, ImageSubmitted | SkipCapture) => Quiz,
            (Quiz, QuizSubmitted) => Recommend,
            (Quiz, Back) => Capture,
            (Recommend, Back) => Quiz,
            (step, _) => step,
        }
    }
}
