//! Visual themes

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ReflectionError;

/// Host theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeVariant {
    /// Dark and gritty
    Rift,
    /// Ethereal and calm
    #[default]
    Horizon,
    /// Safe mode, used while an intervention is showing
    Neutral,
}

impl ThemeVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeVariant::Rift => "rift",
            ThemeVariant::Horizon => "horizon",
            ThemeVariant::Neutral => "neutral",
        }
    }

    /// Aesthetic handed to prompt generation
    pub fn aesthetic(&self) -> &'static str {
        match self {
            ThemeVariant::Rift => "dark/gritty",
            ThemeVariant::Horizon | ThemeVariant::Neutral => "ethereal/calm",
        }
    }

    /// Whether the user can switch to this theme directly
    pub fn is_user_selectable(&self) -> bool {
        !matches!(self, ThemeVariant::Neutral)
    }
}

impl fmt::Display for ThemeVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current theme shared by the flow, the intervention and the HTTP layer
#[derive(Debug, Clone, Default)]
pub struct SharedTheme {
    current: Arc<Mutex<ThemeVariant>>,
}

impl SharedTheme {
    pub fn new(initial: ThemeVariant) -> Self {
        Self {
            current: Arc::new(Mutex::new(initial)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ThemeVariant> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self) -> ThemeVariant {
        *self.lock()
    }

    /// User theme switch. Refused while safe mode is active.
    pub fn select(&self, theme: ThemeVariant) -> Result<(), ReflectionError> {
        let mut current = self.lock();
        if *current == ThemeVariant::Neutral || !theme.is_user_selectable() {
            return Err(ReflectionError::ThemeLocked);
        }
        *current = theme;
        info!(theme = %theme, "Theme selected");
        Ok(())
    }

    /// Switch to safe mode; returns the theme to restore afterwards
    pub fn enter_safe_mode(&self) -> ThemeVariant {
        let mut current = self.lock();
        let previous = std::mem::replace(&mut *current, ThemeVariant::Neutral);
        info!(previous = %previous, "Safe mode on");
        previous
    }

    /// Leave safe mode, restoring `previous`
    pub fn restore(&self, previous: ThemeVariant) {
        let mut current = self.lock();
        *current = previous;
        info!(theme = %previous, "Safe mode off");
    }
}
