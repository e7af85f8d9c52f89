//! Behavior patterns

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ReflectionError;

/// Behavior pattern the user reflects on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Behavior {
    Shutdown,
    AvoidConflict,
    OverApologize,
    ResponsibleForOthers,
    StruggleToAsk,
    /// Has an insight but is never offered for selection
    SolidFoundation,
}

impl Behavior {
    pub const ALL: [Behavior; 6] = [
        Behavior::Shutdown,
        Behavior::AvoidConflict,
        Behavior::OverApologize,
        Behavior::ResponsibleForOthers,
        Behavior::StruggleToAsk,
        Behavior::SolidFoundation,
    ];

    /// Patterns offered on the selection step, in display order
    pub const SELECTABLE: [Behavior; 5] = [
        Behavior::Shutdown,
        Behavior::AvoidConflict,
        Behavior::OverApologize,
        Behavior::ResponsibleForOthers,
        Behavior::StruggleToAsk,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Behavior::Shutdown => "shutdown",
            Behavior::AvoidConflict => "avoid-conflict",
            Behavior::OverApologize => "over-apologize",
            Behavior::ResponsibleForOthers => "responsible-for-others",
            Behavior::StruggleToAsk => "struggle-to-ask",
            Behavior::SolidFoundation => "solid-foundation",
        }
    }

    /// First-person label shown on the selection step
    pub fn label(&self) -> &'static str {
        match self {
            Behavior::Shutdown => "I shut down emotionally",
            Behavior::AvoidConflict => "I avoid conflict",
            Behavior::OverApologize => "I over-apologize",
            Behavior::ResponsibleForOthers => "I feel responsible for others' emotions",
            Behavior::StruggleToAsk => "I struggle to ask for help",
            Behavior::SolidFoundation => "I have a solid foundation",
        }
    }

    pub fn is_selectable(&self) -> bool {
        !matches!(self, Behavior::SolidFoundation)
    }
}

impl fmt::Display for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Behavior {
    type Err = ReflectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Behavior::ALL
            .into_iter()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| ReflectionError::UnknownBehavior(s.to_string()))
    }
}
