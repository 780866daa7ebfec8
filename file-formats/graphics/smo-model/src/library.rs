//! Named model registry owning its backend

use std::collections::HashMap;
use std::path::Path;

use crate::backend::RenderBackend;
use crate::error::{ModelError, Result};
use crate::instance::ModelInstance;
use crate::model::{LoadOptions, Model};

/// Models by name, uploaded to one backend
///
/// Every model in the library is uploaded; removing a model or dropping the
/// library releases its backend resources.
pub struct ModelLibrary<B: RenderBackend> {
    backend: B,
    models: HashMap<String, Model>,
}

impl<B: RenderBackend> ModelLibrary<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            models: HashMap::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Load a model under `name`, replacing any model already registered there
    pub fn load(
        &mut self,
        name: &str,
        path: impl AsRef<Path>,
        options: &LoadOptions,
    ) -> Result<&Model> {
        let options = options.clone().name(name);
        let model = Model::load(path, &options)?;
        Ok(self.insert(model))
    }

    /// Upload and register an already loaded model under its own name
    pub fn insert(&mut self, mut model: Model) -> &Model {
        model.upload(&mut self.backend);
        let name = model.name().to_string();
        if let Some(mut previous) = self.models.remove(&name) {
            log::warn!("Replacing model '{}'", name);
            previous.release(&mut self.backend);
        }
        self.models.entry(name).or_insert(model)
    }

    pub fn get(&self, name: &str) -> Option<&Model> {
        self.models.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Model> {
        self.models.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.models.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Draw `instance` of the model registered as `name`
    pub fn draw(&mut self, name: &str, instance: &ModelInstance, skip_animation: bool) -> Result<()> {
        let model = self
            .models
            .get(name)
            .ok_or_else(|| ModelError::Reference(format!("no model named '{name}'")))?;
        instance.draw(model, &mut self.backend, skip_animation)
    }

    /// Release and remove one model; false if no model had that name
    pub fn destroy(&mut self, name: &str) -> bool {
        match self.models.remove(name) {
            Some(mut model) => {
                model.release(&mut self.backend);
                log::debug!("Destroyed model '{}'", name);
                true
            }
            None => false,
        }
    }

    pub fn destroy_all(&mut self) {
        for (_, mut model) in self.models.drain() {
            model.release(&mut self.backend);
        }
    }
}

impl<B: RenderBackend> Drop for ModelLibrary<B> {
    fn drop(&mut self) {
        self.destroy_all();
    }
}
