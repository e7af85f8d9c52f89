//! Process-wide, memoized model loading

use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::{debug, error, info};

use crate::model::{ExpressionModel, ModelSource};
use crate::ExpressionError;

/// Model lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelState {
    Uninitialized,
    Loading,
    Loaded,
    /// Last attempt failed; the next caller retries
    Failed,
}

static GLOBAL: OnceLock<Arc<ModelLoader>> = OnceLock::new();

/// Loads the expression models at most once.
///
/// Concurrent callers share a single in-flight load. A failed load leaves the
/// loader retryable; a successful one is never repeated.
pub struct ModelLoader {
    source: Arc<dyn ModelSource>,
    models: OnceCell<Arc<dyn ExpressionModel>>,
    state: Mutex<ModelState>,
}

impl ModelLoader {
    pub fn new(source: Arc<dyn ModelSource>) -> Self {
        Self {
            source,
            models: OnceCell::new(),
            state: Mutex::new(ModelState::Uninitialized),
        }
    }

    /// Install the process-wide loader. Later calls return the loader that
    /// was installed first and ignore `source`.
    pub fn install_global(source: Arc<dyn ModelSource>) -> Arc<ModelLoader> {
        let mut installed = false;
        let loader = GLOBAL
            .get_or_init(|| {
                installed = true;
                Arc::new(ModelLoader::new(source.clone()))
            })
            .clone();
        if !installed {
            debug!(
                requested = %source.describe(),
                "Global model loader already installed"
            );
        }
        loader
    }

    /// The process-wide loader, if installed
    pub fn global() -> Option<Arc<ModelLoader>> {
        GLOBAL.get().cloned()
    }

    pub fn state(&self) -> ModelState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: ModelState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    pub fn is_loaded(&self) -> bool {
        self.models.initialized()
    }

    /// Loaded models, without triggering a load
    pub fn models(&self) -> Option<Arc<dyn ExpressionModel>> {
        self.models.get().cloned()
    }

    /// Load the models if needed and return them.
    pub async fn ensure_loaded(&self) -> Result<Arc<dyn ExpressionModel>, ExpressionError> {
        if let Some(models) = self.models.get() {
            return Ok(models.clone());
        }

        let models = self
            .models
            .get_or_try_init(|| async {
                let mut guard = LoadingGuard::new(self);
                info!(source = %self.source.describe(), "Loading expression models");

                match self.source.load().await {
                    Ok(models) => {
                        guard.finish(ModelState::Loaded);
                        info!("Expression models loaded successfully");
                        Ok(models)
                    }
                    Err(e) => {
                        guard.finish(ModelState::Failed);
                        error!("Error loading expression models: {}", e);
                        Err(e)
                    }
                }
            })
            .await?;

        Ok(models.clone())
    }
}

/// Marks the loader `Loading` and rolls back to `Uninitialized` if the load
/// future is dropped before it settles.
struct LoadingGuard<'a> {
    loader: &'a ModelLoader,
    settled: bool,
}

impl<'a> LoadingGuard<'a> {
    fn new(loader: &'a ModelLoader) -> Self {
        loader.set_state(ModelState::Loading);
        Self {
            loader,
            settled: false,
        }
    }

    fn finish(&mut self, state: ModelState) {
        self.loader.set_state(state);
        self.settled = true;
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            debug!("Model load abandoned before completion");
            self.loader.set_state(ModelState::Uninitialized);
        }
    }
}
