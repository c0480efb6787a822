use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use strum_macros::{Display as StrumDisplay, EnumIter, EnumString};

pub const QUIZ_LEN: usize = 8;

pub const QUIZ_QUESTIONS: [&str; QUIZ_LEN] = [
    "How does your skin feel a few hours after washing?",
    "How shiny does your T-zone look by midday?",
    "How often do you get breakouts?",
    "How visible are your pores?",
    "How often does your skin flake or peel?",
    "How often do you need to blot excess oil?",
    "How does your skin react to heavy moisturizers?",
    "How oily is your skin when you wake up?",
];

/// Likert tier for one quiz question. Weight rises with oiliness.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, StrumDisplay, EnumString, EnumIter,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum QuizAnswer {
    #[strum(to_string = "low", serialize = "tight", serialize = "rare")]
    Low = 1,
    #[strum(to_string = "medium", serialize = "sometimes")]
    Medium = 2,
    #[strum(to_string = "high", serialize = "oily", serialize = "often")]
    High = 3,
}

impl QuizAnswer {
    pub fn weight(self) -> u8 {
        self as u8
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Serialize, Deserialize,
)]
pub struct QuizScore(pub u16);

impl QuizScore {
    pub fn of(answers: &[QuizAnswer]) -> Self {
        QuizScore(answers.iter().map(|a| u16::from(a.weight())).sum())
    }
}
