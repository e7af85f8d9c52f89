//! Intervention gate implementation

use std::sync::{Mutex, MutexGuard, PoisonError};

use reflection::{SharedTheme, ThemeVariant};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::InterventionConfig;
use crate::InterventionError;

/// What the open intervention shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterventionView {
    /// Breathing circle with "I'm okay now"
    #[default]
    Breathing,
    /// 5-4-3-2-1 exercise
    Grounding,
}

/// Gate state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GateState {
    #[default]
    Closed,
    Open { view: InterventionView },
}

/// Why the gate opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenReason {
    /// Raised by the emotional monitor
    Distress,
    /// User asked for it from the journal
    Manual,
}

/// Gate snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterventionStatus {
    #[serde(flatten)]
    pub state: GateState,
    pub reason: Option<OpenReason>,
    /// Times the gate opened
    pub opened_total: u64,
    /// Distress events dropped because the gate was open or cooling down
    pub dropped_total: u64,
}

#[derive(Debug, Default)]
struct GateInner {
    state: GateState,
    reason: Option<OpenReason>,
    restore_theme: Option<ThemeVariant>,
    closed_at: Option<Instant>,
    opened_total: u64,
    dropped_total: u64,
}

/// Opens the intervention exactly once per episode.
///
/// Safe to call from any thread, including from inside the monitor's
/// distress callback.
pub struct InterventionGate {
    config: InterventionConfig,
    theme: SharedTheme,
    inner: Mutex<GateInner>,
}

impl InterventionGate {
    pub fn new(config: InterventionConfig, theme: SharedTheme) -> Self {
        info!("Creating intervention gate with config: {:?}", config);
        Self {
            config,
            theme,
            inner: Mutex::new(GateInner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Distress callback. Returns whether this event opened the gate.
    pub fn on_distress(&self) -> bool {
        self.open(OpenReason::Distress)
    }

    /// Open the gate. No-op (and counted as dropped) if already open.
    pub fn open(&self, reason: OpenReason) -> bool {
        let mut inner = self.lock();

        if matches!(inner.state, GateState::Open { .. }) {
            inner.dropped_total += 1;
            debug!(?reason, "Intervention already open, event dropped");
            return false;
        }

        if reason == OpenReason::Distress {
            if let (Some(cooldown), Some(closed_at)) = (self.config.reopen_cooldown(), inner.closed_at) {
                if closed_at.elapsed() < cooldown {
                    inner.dropped_total += 1;
                    debug!("Intervention in reopen cooldown, event dropped");
                    return false;
                }
            }
        }

        inner.state = GateState::Open {
            view: InterventionView::Breathing,
        };
        inner.reason = Some(reason);
        inner.opened_total += 1;
        if self.config.safe_mode_theme {
            inner.restore_theme = Some(self.theme.enter_safe_mode());
        }
        metrics::counter!("intervention_opened_total").increment(1);
        info!(?reason, count = inner.opened_total, "Intervention opened");
        true
    }

    /// Close the gate and restore the theme. Returns `false` if already closed.
    pub fn close(&self) -> bool {
        let mut inner = self.lock();
        if inner.state == GateState::Closed {
            return false;
        }
        inner.state = GateState::Closed;
        inner.reason = None;
        inner.closed_at = Some(Instant::now());
        if let Some(previous) = inner.restore_theme.take() {
            self.theme.restore(previous);
        }
        info!("Intervention closed");
        true
    }

    pub fn show_grounding(&self) -> Result<(), InterventionError> {
        self.set_view(InterventionView::Grounding)
    }

    pub fn back_to_breathing(&self) -> Result<(), InterventionError> {
        self.set_view(InterventionView::Breathing)
    }

    fn set_view(&self, view: InterventionView) -> Result<(), InterventionError> {
        let mut inner = self.lock();
        match &mut inner.state {
            GateState::Open { view: current } => {
                *current = view;
                debug!(?view, "Intervention view changed");
                Ok(())
            }
            GateState::Closed => Err(InterventionError::NotOpen),
        }
    }

    pub fn state(&self) -> GateState {
        self.lock().state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state(), GateState::Open { .. })
    }

    pub fn status(&self) -> InterventionStatus {
        let inner = self.lock();
        InterventionStatus {
            state: inner.state,
            reason: inner.reason,
            opened_total: inner.opened_total,
            dropped_total: inner.dropped_total,
        }
    }

    pub fn theme(&self) -> &SharedTheme {
        &self.theme
    }
}
