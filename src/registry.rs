//! Shared asset storage
//!
//! Models and images are loaded once, then handed out as `Arc` clones so
//! render jobs on other threads can hold them without copying pixel data.

use std::collections::HashMap;
use std::sync::Arc;

use crate::model::{Image, Model};

#[derive(Default)]
pub struct ResourceRegistry {
    models: HashMap<String, Arc<Model>>,
    images: HashMap<String, Arc<Image>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model under a name, replacing any previous entry.
    pub fn insert_model(&mut self, name: impl Into<String>, model: Model) -> Arc<Model> {
        let model = Arc::new(model);
        self.models.insert(name.into(), model.clone());
        model
    }

    pub fn insert_image(&mut self, name: impl Into<String>, image: Image) -> Arc<Image> {
        let image = Arc::new(image);
        self.images.insert(name.into(), image.clone());
        image
    }

    pub fn model(&self, name: &str) -> Option<Arc<Model>> {
        self.models.get(name).cloned()
    }

    pub fn image(&self, name: &str) -> Option<Arc<Image>> {
        self.images.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use glam::ivec2;

    #[test]
    fn test_lookup_shares_storage() {
        let mut registry = ResourceRegistry::new();
        registry.insert_image("checker", Image::solid(ivec2(2, 2), Color::WHITE));

        let a = registry.image("checker").unwrap();
        let b = registry.image("checker").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(registry.image("missing").is_none());
    }

    #[test]
    fn test_insert_replaces() {
        let mut registry = ResourceRegistry::new();
        registry.insert_model("cube", Model::default());
        let replacement = registry.insert_model(
            "cube",
            Model {
                name: "cube2".into(),
                ..Model::default()
            },
        );
        assert_eq!(registry.model("cube").unwrap().name, replacement.name);
    }
}
