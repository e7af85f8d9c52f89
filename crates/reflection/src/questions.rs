//! Reflection questions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ReflectionError;

/// Lowest slider value
pub const SCALE_MIN: i64 = 1;
/// Highest slider value
pub const SCALE_MAX: i64 = 10;

/// Question identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuestionId {
    SocialEnergy,
    MentalClarity,
    EmotionalStability,
    Resilience,
    RoutineMaintenance,
    WorstCaseScenario,
    FeltUnderstood,
    EnjoyMoments,
    ManageableResponsibilities,
    Hopeful,
    ConflictStyle,
    MistakeResponse,
    CommonPhrase,
}

/// How a question is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    /// Integer in [`SCALE_MIN`, `SCALE_MAX`]
    Slider,
    /// Free text
    Text,
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionKind::Slider => f.write_str("slider"),
            QuestionKind::Text => f.write_str("text"),
        }
    }
}

impl QuestionId {
    /// Slider questions in the order they are asked
    pub const SLIDERS: [QuestionId; 10] = [
        QuestionId::SocialEnergy,
        QuestionId::MentalClarity,
        QuestionId::EmotionalStability,
        QuestionId::Resilience,
        QuestionId::RoutineMaintenance,
        QuestionId::WorstCaseScenario,
        QuestionId::FeltUnderstood,
        QuestionId::EnjoyMoments,
        QuestionId::ManageableResponsibilities,
        QuestionId::Hopeful,
    ];

    /// Optional free-text answers
    pub const TEXT: [QuestionId; 3] = [
        QuestionId::ConflictStyle,
        QuestionId::MistakeResponse,
        QuestionId::CommonPhrase,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionId::SocialEnergy => "socialEnergy",
            QuestionId::MentalClarity => "mentalClarity",
            QuestionId::EmotionalStability => "emotionalStability",
            QuestionId::Resilience => "resilience",
            QuestionId::RoutineMaintenance => "routineMaintenance",
            QuestionId::WorstCaseScenario => "worstCaseScenario",
            QuestionId::FeltUnderstood => "feltUnderstood",
            QuestionId::EnjoyMoments => "enjoyMoments",
            QuestionId::ManageableResponsibilities => "manageableResponsibilities",
            QuestionId::Hopeful => "hopeful",
            QuestionId::ConflictStyle => "conflictStyle",
            QuestionId::MistakeResponse => "mistakeResponse",
            QuestionId::CommonPhrase => "commonPhrase",
        }
    }

    pub fn kind(&self) -> QuestionKind {
        match self {
            QuestionId::ConflictStyle | QuestionId::MistakeResponse | QuestionId::CommonPhrase => {
                QuestionKind::Text
            }
            _ => QuestionKind::Slider,
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            QuestionId::SocialEnergy => "Being around people lately gives me energy.",
            QuestionId::MentalClarity => "My thoughts feel clear and organized most days.",
            QuestionId::EmotionalStability => {
                "My emotions have felt steady and manageable recently."
            }
            QuestionId::Resilience => {
                "Even when things go wrong, I can bounce back without spiraling."
            }
            QuestionId::RoutineMaintenance => {
                "Having a plan or routine right now feels easy to maintain."
            }
            QuestionId::WorstCaseScenario => {
                "When you imagine a worst-case scenario, does it feel like it is actually happening in the room?"
            }
            QuestionId::FeltUnderstood => "I feel understood by the people around me.",
            QuestionId::EnjoyMoments => "I've been able to enjoy small moments in my day.",
            QuestionId::ManageableResponsibilities => {
                "My responsibilities feel manageable right now."
            }
            QuestionId::Hopeful => "I feel hopeful about the near future.",
            QuestionId::ConflictStyle => "How do you usually respond when conflict comes up?",
            QuestionId::MistakeResponse => "What happens inside you when you make a mistake?",
            QuestionId::CommonPhrase => "What is a phrase you heard often growing up?",
        }
    }

    pub fn question(&self) -> Question {
        Question {
            id: *self,
            text: self.text(),
            kind: self.kind(),
        }
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionId {
    type Err = ReflectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QuestionId::SLIDERS
            .into_iter()
            .chain(QuestionId::TEXT)
            .find(|q| q.as_str() == s)
            .ok_or_else(|| ReflectionError::UnknownQuestion(s.to_string()))
    }
}

/// A question as presented to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    pub id: QuestionId,
    pub text: &'static str,
    pub kind: QuestionKind,
}
