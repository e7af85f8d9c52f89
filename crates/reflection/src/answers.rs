//! Reflection answers

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::questions::{QuestionId, QuestionKind, SCALE_MAX, SCALE_MIN};
use crate::ReflectionError;

/// One answer value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Scale(i64),
    Text(String),
}

/// Question id to answer. Slider values are always within range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReflectionAnswers {
    values: BTreeMap<QuestionId, AnswerValue>,
}

impl ReflectionAnswers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store an answer. Blank text removes the answer.
    pub fn record(&mut self, question: QuestionId, value: AnswerValue) -> Result<(), ReflectionError> {
        match (question.kind(), value) {
            (QuestionKind::Slider, AnswerValue::Scale(v)) => {
                if !(SCALE_MIN..=SCALE_MAX).contains(&v) {
                    return Err(ReflectionError::OutOfRange { question, value: v });
                }
                self.values.insert(question, AnswerValue::Scale(v));
            }
            (QuestionKind::Text, AnswerValue::Text(text)) => {
                let text = text.trim();
                if text.is_empty() {
                    self.values.remove(&question);
                } else {
                    self.values
                        .insert(question, AnswerValue::Text(text.to_string()));
                }
            }
            (expected, _) => return Err(ReflectionError::WrongKind { question, expected }),
        }
        Ok(())
    }

    pub fn get(&self, question: QuestionId) -> Option<&AnswerValue> {
        self.values.get(&question)
    }

    pub fn scale(&self, question: QuestionId) -> Option<i64> {
        match self.values.get(&question) {
            Some(AnswerValue::Scale(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn text(&self, question: QuestionId) -> Option<&str> {
        match self.values.get(&question) {
            Some(AnswerValue::Text(t)) => Some(t.as_str()),
            _ => None,
        }
    }

    pub fn is_answered(&self, question: QuestionId) -> bool {
        self.values.contains_key(&question)
    }

    /// First slider question still without an answer
    pub fn first_unanswered(&self) -> Option<QuestionId> {
        QuestionId::SLIDERS
            .into_iter()
            .find(|q| !self.is_answered(*q))
    }

    pub fn is_complete(&self) -> bool {
        self.first_unanswered().is_none()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}
