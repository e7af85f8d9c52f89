//! Reflection Flow
//!
//! The guided self-reflection journey: pick a behavior pattern, answer
//! slider questions, read a generated insight and journal against its prompt.
//! Everything lives in memory for the lifetime of the process.

pub mod answers;
pub mod behavior;
pub mod flow;
pub mod insight;
pub mod mind_map;
pub mod questions;
pub mod theme;

pub use answers::{AnswerValue, ReflectionAnswers};
pub use behavior::Behavior;
pub use flow::{all_questions, FlowSnapshot, FlowStep, ReflectionFlow};
pub use insight::{generate_insight, Insight, InsightGenerator, StaticInsights};
pub use mind_map::{mind_map, MindMap};
pub use questions::{Question, QuestionId, QuestionKind, SCALE_MAX, SCALE_MIN};
pub use theme::{SharedTheme, ThemeVariant};

use thiserror::Error;

/// Reflection error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReflectionError {
    #[error("Unknown behavior pattern: {0}")]
    UnknownBehavior(String),

    #[error("Behavior pattern {0} cannot be selected")]
    NotSelectable(Behavior),

    #[error("Unknown question: {0}")]
    UnknownQuestion(String),

    #[error("Answer for {question} must be between 1 and 10, got {value}")]
    OutOfRange { question: QuestionId, value: i64 },

    #[error("Answer for {question} has the wrong kind (expected {expected})")]
    WrongKind {
        question: QuestionId,
        expected: QuestionKind,
    },

    #[error("Question {0} must be answered before continuing")]
    Unanswered(QuestionId),

    #[error("Cannot {action} from the {step} step")]
    InvalidTransition { step: FlowStep, action: &'static str },

    #[error("Theme is locked while safe mode is active")]
    ThemeLocked,
}
