//! Insight generation

use serde::{Deserialize, Serialize};

use crate::answers::ReflectionAnswers;
use crate::behavior::Behavior;
use crate::questions::QuestionId;

/// Insight shown after the questions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub learned_pattern: String,
    pub helped_before: String,
    pub shows_up_now: String,
    pub journal_prompt: String,
}

impl Insight {
    fn new(learned: &str, helped: &str, now: &str, prompt: impl Into<String>) -> Self {
        Self {
            learned_pattern: learned.to_string(),
            helped_before: helped.to_string(),
            shows_up_now: now.to_string(),
            journal_prompt: prompt.into(),
        }
    }
}

/// Turns a behavior and its answers into an insight
pub trait InsightGenerator: Send + Sync {
    fn generate(&self, behavior: Behavior, answers: &ReflectionAnswers) -> Insight;
}

/// Fixed per-pattern insights
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticInsights;

impl InsightGenerator for StaticInsights {
    fn generate(&self, behavior: Behavior, answers: &ReflectionAnswers) -> Insight {
        generate_insight(behavior, answers)
    }
}

/// Insight for `behavior`. Total over every pattern.
pub fn generate_insight(behavior: Behavior, answers: &ReflectionAnswers) -> Insight {
    match behavior {
        Behavior::Shutdown => {
            let prompt = match answers.text(QuestionId::CommonPhrase) {
                Some(phrase) => format!(
                    "When you heard \"{}\" growing up, what did you learn about showing emotions?",
                    phrase
                ),
                None => "What would it feel like to stay present with an uncomfortable emotion for one more minute?".to_string(),
            };
            Insight::new(
                "Emotional withdrawal as protection",
                "Shutting down may have helped you avoid overwhelming emotions or unpredictable reactions from others.",
                "You might find yourself going numb during difficult conversations, making resolution challenging.",
                prompt,
            )
        }
        Behavior::AvoidConflict => Insight::new(
            "Conflict avoidance as peacekeeping",
            "Avoiding conflict maintained stability in unpredictable environments.",
            "You might say \"yes\" when you mean \"no,\" letting resentment build.",
            "What might become possible if disagreement didn't mean disconnection?",
        ),
        Behavior::OverApologize => Insight::new(
            "Hyper-responsibility",
            "Over-apologizing helped you avoid blame from adults who lacked accountability.",
            "You might apologize for having needs, which diminishes your presence.",
            "Am I actually responsible for this, or am I apologizing to keep others comfortable?",
        ),
        Behavior::ResponsibleForOthers => Insight::new(
            "Caretaking and emotional management",
            "Managing others' emotions stabilized your world as a survival skill.",
            "Your own feelings take a backseat to keeping everyone else comfortable.",
            "What would it mean to let others hold their own discomfort today?",
        ),
        Behavior::SolidFoundation => Insight::new(
            "Self-reliance as survival",
            "Not asking for help protected you from disappointment or rejection.",
            "You might push yourself to exhaustion rather than reaching out.",
            "What makes asking for help feel like a risk to you?",
        ),
        Behavior::StruggleToAsk => Insight::new(
            "Self-reliance as survival",
            "Not asking for help protected you from disappointment.",
            "You might push yourself to exhaustion rather than reach out.",
            "What story are you telling yourself about what it means to need support?",
        ),
    }
}
