//! Log subscriber setup

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::settings::LogSettings;
use crate::ApiError;

/// Install the global subscriber. Call once, before anything logs.
pub fn init_logging(settings: &LogSettings) -> Result<(), ApiError> {
    let level: Level = settings
        .level
        .parse()
        .map_err(|_| ApiError::LogLevel(settings.level.clone()))?;

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    let installed = if settings.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    installed.map_err(|e| ApiError::Logging(e.to_string()))
}
