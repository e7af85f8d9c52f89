//! Distress notification seam

/// Receives distress events from a [`crate::MonitorController`].
///
/// Called from the session task with no controller lock held, so an
/// observer may query or disable the controller.
pub trait DistressObserver: Send + Sync {
    fn on_distress_detected(&self);
}

impl<F> DistressObserver for F
where
    F: Fn() + Send + Sync,
{
    fn on_distress_detected(&self) {
        self()
    }
}
