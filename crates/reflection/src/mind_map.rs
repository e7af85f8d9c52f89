//! Behavioral mind map
//!
//! Connects the chosen pattern to the triggers suggested by the slider
//! answers and to the reactions typical for that pattern.

use serde::Serialize;

use crate::answers::ReflectionAnswers;
use crate::behavior::Behavior;
use crate::questions::QuestionId;

/// Most triggers shown on one map
pub const MAX_TRIGGERS: usize = 3;

/// Shown when no answer points at a trigger
pub const DEFAULT_TRIGGERS: [&str; 2] = ["Stress Response", "Protective Pattern"];

/// Answers at or below this on a positively worded slider count as a trigger
const LOW_SCORE: i64 = 4;
/// Answers at or above this on a negatively worded slider count as a trigger
const HIGH_SCORE: i64 = 7;

/// Slider checks in display order
const TRIGGERS: [(QuestionId, Direction, &str); 7] = [
    (QuestionId::SocialEnergy, Direction::Low, "Social Exhaustion"),
    (QuestionId::MentalClarity, Direction::Low, "Mental Fog"),
    (QuestionId::EmotionalStability, Direction::Low, "Emotional Volatility"),
    (QuestionId::Resilience, Direction::Low, "Low Resilience"),
    (QuestionId::WorstCaseScenario, Direction::High, "Catastrophic Thinking"),
    (QuestionId::FeltUnderstood, Direction::Low, "Feeling Unseen"),
    (QuestionId::ManageableResponsibilities, Direction::Low, "Overwhelm"),
];

#[derive(Debug, Clone, Copy)]
enum Direction {
    Low,
    High,
}

impl Direction {
    fn triggered(self, value: i64) -> bool {
        match self {
            Direction::Low => value <= LOW_SCORE,
            Direction::High => value >= HIGH_SCORE,
        }
    }
}

/// Center, trigger and reaction nodes for one reflection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MindMap {
    pub center: String,
    pub triggers: Vec<String>,
    pub reactions: Vec<String>,
}

/// Name of the pattern at the center of the map
pub fn center_label(behavior: Behavior) -> &'static str {
    match behavior {
        Behavior::Shutdown => "Emotional Shutdown",
        Behavior::AvoidConflict => "Conflict Avoidance",
        Behavior::OverApologize => "Over-Apologizing",
        Behavior::ResponsibleForOthers => "Caretaking",
        Behavior::StruggleToAsk => "Self-Reliance",
        Behavior::SolidFoundation => "Solid Foundation",
    }
}

/// Reactions the pattern tends to produce
pub fn reactions(behavior: Behavior) -> &'static [&'static str] {
    match behavior {
        Behavior::Shutdown => &["Going Numb", "Disconnecting", "Emotional Walls"],
        Behavior::AvoidConflict => &["People-Pleasing", "Saying Yes", "Silent Resentment"],
        Behavior::OverApologize => &["Taking Blame", "Diminishing Self", "Hyper-Responsibility"],
        Behavior::ResponsibleForOthers => {
            &["Managing Emotions", "Caretaking", "Ignoring Own Needs"]
        }
        Behavior::StruggleToAsk => &["Self-Isolation", "Pushing Through", "Refusing Help"],
        Behavior::SolidFoundation => &[],
    }
}

/// Triggers read off the slider answers, at most [`MAX_TRIGGERS`]
pub fn triggers(answers: &ReflectionAnswers) -> Vec<String> {
    let mut found: Vec<&str> = TRIGGERS
        .iter()
        .filter(|(question, direction, _)| {
            answers
                .scale(*question)
                .is_some_and(|value| direction.triggered(value))
        })
        .map(|(_, _, label)| *label)
        .collect();

    if found.is_empty() {
        found.extend(DEFAULT_TRIGGERS);
    }
    found.truncate(MAX_TRIGGERS);
    found.into_iter().map(String::from).collect()
}

pub fn mind_map(behavior: Behavior, answers: &ReflectionAnswers) -> MindMap {
    MindMap {
        center: center_label(behavior).to_string(),
        triggers: triggers(answers),
        reactions: reactions(behavior).iter().map(|r| r.to_string()).collect(),
    }
}
