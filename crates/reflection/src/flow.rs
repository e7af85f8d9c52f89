//! Step-by-step reflection flow

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::answers::{AnswerValue, ReflectionAnswers};
use crate::behavior::Behavior;
use crate::insight::{generate_insight, Insight};
use crate::mind_map::{mind_map, MindMap};
use crate::questions::{Question, QuestionId};
use crate::ReflectionError;

/// Flow step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowStep {
    #[default]
    Welcome,
    Behavior,
    Questions,
    Insight,
    Journal,
}

impl FlowStep {
    /// Overall progress shown in the navigation bar
    pub fn progress(&self) -> u8 {
        match self {
            FlowStep::Welcome => 0,
            FlowStep::Behavior => 20,
            FlowStep::Questions => 40,
            FlowStep::Insight => 70,
            FlowStep::Journal => 100,
        }
    }

    /// Step reached by "back", if any
    pub fn previous(&self) -> Option<FlowStep> {
        match self {
            FlowStep::Welcome => None,
            FlowStep::Behavior => Some(FlowStep::Welcome),
            FlowStep::Questions => Some(FlowStep::Behavior),
            FlowStep::Insight => Some(FlowStep::Questions),
            FlowStep::Journal => Some(FlowStep::Insight),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FlowStep::Welcome => "welcome",
            FlowStep::Behavior => "behavior",
            FlowStep::Questions => "questions",
            FlowStep::Insight => "insight",
            FlowStep::Journal => "journal",
        }
    }
}

impl fmt::Display for FlowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serializable view of the flow
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowSnapshot {
    pub step: FlowStep,
    pub progress: u8,
    pub behavior: Option<Behavior>,
    /// Current slider question while on the questions step
    pub question: Option<Question>,
    pub question_index: usize,
    pub question_count: usize,
    pub answers: ReflectionAnswers,
    pub insight: Option<Insight>,
    /// Present alongside the insight
    pub mind_map: Option<MindMap>,
    pub journal: String,
}

/// One user's pass through the reflection journey
#[derive(Debug, Clone, Default)]
pub struct ReflectionFlow {
    step: FlowStep,
    behavior: Option<Behavior>,
    answers: ReflectionAnswers,
    question_index: usize,
    insight: Option<Insight>,
    journal: String,
}

impl ReflectionFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> FlowStep {
        self.step
    }

    pub fn progress(&self) -> u8 {
        self.step.progress()
    }

    pub fn behavior(&self) -> Option<Behavior> {
        self.behavior
    }

    pub fn answers(&self) -> &ReflectionAnswers {
        &self.answers
    }

    pub fn insight(&self) -> Option<&Insight> {
        self.insight.as_ref()
    }

    pub fn journal(&self) -> &str {
        &self.journal
    }

    /// Mind map for the current behavior, once the insight is shown
    pub fn mind_map(&self) -> Option<MindMap> {
        if !matches!(self.step, FlowStep::Insight | FlowStep::Journal) {
            return None;
        }
        self.behavior.map(|behavior| mind_map(behavior, &self.answers))
    }

    /// Slider question currently asked, on the questions step
    pub fn current_question(&self) -> Option<QuestionId> {
        if self.step != FlowStep::Questions {
            return None;
        }
        QuestionId::SLIDERS.get(self.question_index).copied()
    }

    fn require(&self, step: FlowStep, action: &'static str) -> Result<(), ReflectionError> {
        if self.step != step {
            return Err(ReflectionError::InvalidTransition {
                step: self.step,
                action,
            });
        }
        Ok(())
    }

    /// Welcome → Behavior
    pub fn start(&mut self) -> Result<(), ReflectionError> {
        self.require(FlowStep::Welcome, "start")?;
        self.step = FlowStep::Behavior;
        Ok(())
    }

    /// Pick a pattern and move on to the questions
    pub fn select_behavior(&mut self, behavior: Behavior) -> Result<(), ReflectionError> {
        self.require(FlowStep::Behavior, "select a behavior")?;
        if !behavior.is_selectable() {
            return Err(ReflectionError::NotSelectable(behavior));
        }
        info!(behavior = %behavior, "Behavior selected");
        self.behavior = Some(behavior);
        self.question_index = 0;
        self.step = FlowStep::Questions;
        Ok(())
    }

    /// Record an answer while on the questions step
    pub fn answer(&mut self, question: QuestionId, value: AnswerValue) -> Result<(), ReflectionError> {
        self.require(FlowStep::Questions, "answer")?;
        self.answers.record(question, value)?;
        debug!(question = %question, "Answer recorded");
        Ok(())
    }

    /// Advance. On the questions step this moves one question forward, and
    /// past the last one generates the insight.
    pub fn next(&mut self) -> Result<FlowStep, ReflectionError> {
        match self.step {
            FlowStep::Welcome => self.start()?,
            FlowStep::Behavior => match self.behavior {
                Some(behavior) => self.select_behavior(behavior)?,
                None => {
                    return Err(ReflectionError::InvalidTransition {
                        step: self.step,
                        action: "continue without a behavior",
                    })
                }
            },
            FlowStep::Questions => self.next_question()?,
            FlowStep::Insight => self.step = FlowStep::Journal,
            FlowStep::Journal => {
                return Err(ReflectionError::InvalidTransition {
                    step: self.step,
                    action: "continue",
                })
            }
        }
        Ok(self.step)
    }

    fn next_question(&mut self) -> Result<(), ReflectionError> {
        let Some(current) = self.current_question() else {
            return Err(ReflectionError::InvalidTransition {
                step: self.step,
                action: "continue",
            });
        };
        if !self.answers.is_answered(current) {
            return Err(ReflectionError::Unanswered(current));
        }

        if self.question_index + 1 < QuestionId::SLIDERS.len() {
            self.question_index += 1;
            return Ok(());
        }

        let behavior = self.behavior.ok_or(ReflectionError::InvalidTransition {
            step: self.step,
            action: "generate an insight without a behavior",
        })?;
        self.insight = Some(generate_insight(behavior, &self.answers));
        self.step = FlowStep::Insight;
        info!(behavior = %behavior, "Insight generated");
        Ok(())
    }

    /// Go back one question or one step
    pub fn back(&mut self) -> Result<FlowStep, ReflectionError> {
        if self.step == FlowStep::Questions && self.question_index > 0 {
            self.question_index -= 1;
            return Ok(self.step);
        }
        let previous = self.step.previous().ok_or(ReflectionError::InvalidTransition {
            step: self.step,
            action: "go back",
        })?;
        if previous == FlowStep::Questions {
            self.question_index = QuestionId::SLIDERS.len() - 1;
        }
        self.step = previous;
        Ok(self.step)
    }

    /// Replace the insight's journal prompt (e.g. with a generated one)
    pub fn set_journal_prompt(&mut self, prompt: impl Into<String>) -> Result<(), ReflectionError> {
        let insight = self
            .insight
            .as_mut()
            .ok_or(ReflectionError::InvalidTransition {
                step: self.step,
                action: "set a journal prompt",
            })?;
        insight.journal_prompt = prompt.into();
        Ok(())
    }

    /// Journal prompt of the current insight
    pub fn journal_prompt(&self) -> Option<&str> {
        self.insight.as_ref().map(|i| i.journal_prompt.as_str())
    }

    pub fn write_journal(&mut self, text: impl Into<String>) -> Result<(), ReflectionError> {
        self.require(FlowStep::Journal, "write the journal")?;
        self.journal = text.into();
        Ok(())
    }

    /// Back to welcome with everything cleared
    pub fn start_over(&mut self) {
        *self = Self::default();
        info!("Reflection flow reset");
    }

    pub fn snapshot(&self) -> FlowSnapshot {
        FlowSnapshot {
            step: self.step,
            progress: self.progress(),
            behavior: self.behavior,
            question: self.current_question().map(|q| q.question()),
            question_index: self.question_index,
            question_count: QuestionId::SLIDERS.len(),
            answers: self.answers.clone(),
            insight: self.insight.clone(),
            mind_map: self.mind_map(),
            journal: self.journal.clone(),
        }
    }
}

/// All questions, sliders first
pub fn all_questions() -> Vec<Question> {
    QuestionId::SLIDERS
        .into_iter()
        .chain(QuestionId::TEXT)
        .map(|q| q.question())
        .collect()
}
