//! Model registry: register and load noseprint models by id.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::ExtractError;
use crate::grid::LumaGridModel;
use crate::model::NoseprintModel;

/// Identifies a built-in model.
pub struct ModelId;

impl ModelId {
    /// Training-free 16x8 luma grid descriptor.
    /// Input: 224x224 RGB in [0, 1]
    /// Output: 128 float32, mean-centered, unit length
    pub const LUMA_GRID_128: &'static str = "luma-grid-128";
}

/// Loads a model. Called once per [`ModelRegistry::load`].
pub type ModelLoader =
    Box<dyn Fn() -> Result<Arc<dyn NoseprintModel>, String> + Send + Sync>;

/// Maps model ids to loaders.
///
/// Construct one at startup, register the available models, and load the
/// chosen one into a long-lived [`crate::Extractor`].
#[derive(Default)]
pub struct ModelRegistry {
    loaders: HashMap<String, ModelLoader>,
}

impl ModelRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with every built-in model registered.
    pub fn with_builtin() -> Self {
        let mut reg = Self::new();
        reg.register(ModelId::LUMA_GRID_128, || {
            Ok(Arc::new(LumaGridModel::new()) as Arc<dyn NoseprintModel>)
        });
        reg
    }

    /// Registers a loader under `id`, replacing any previous one.
    pub fn register<F>(&mut self, id: &str, loader: F)
    where
        F: Fn() -> Result<Arc<dyn NoseprintModel>, String> + Send + Sync + 'static,
    {
        self.loaders.insert(id.to_string(), Box::new(loader));
    }

    /// Loads the model registered under `id`.
    pub fn load(&self, id: &str) -> Result<Arc<dyn NoseprintModel>, ExtractError> {
        let loader = self
            .loaders
            .get(id)
            .ok_or_else(|| ExtractError::ModelUnavailable(format!("model {id:?} not registered")))?;
        match loader() {
            Ok(model) => {
                info!(model = id, dim = model.dimension(), "noseprint: model loaded");
                Ok(model)
            }
            Err(e) => {
                warn!(model = id, error = %e, "noseprint: model failed to load");
                Err(ExtractError::ModelUnavailable(format!("{id}: {e}")))
            }
        }
    }

    /// Returns the registered ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.loaders.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_models_load() {
        let reg = ModelRegistry::with_builtin();
        assert_eq!(reg.ids(), vec![ModelId::LUMA_GRID_128.to_string()]);
        let model = reg.load(ModelId::LUMA_GRID_128).unwrap();
        assert_eq!(model.dimension(), 128);
        assert_eq!(model.input_size(), 224);
    }

    #[test]
    fn unknown_model_is_unavailable() {
        let reg = ModelRegistry::new();
        let err = reg.load("dog-nose-v1").err().unwrap();
        assert!(matches!(err, ExtractError::ModelUnavailable(_)));
        assert!(err.to_string().contains("dog-nose-v1"));
    }

    #[test]
    fn failing_loader_is_unavailable() {
        let mut reg = ModelRegistry::new();
        reg.register("broken", || Err("weights file truncated".into()));
        let err = reg.load("broken").err().unwrap();
        assert!(matches!(err, ExtractError::ModelUnavailable(ref m) if m.contains("truncated")));
    }
}
