use std::collections::HashMap;

use super::error::ComponentKindsError;
use super::ObjectComponent;

type ComponentFactory = Box<dyn Fn() -> Box<dyn ObjectComponent> + Send + Sync>;

/// Explicit registry mapping a component-kind name to a factory, populated
/// at startup. Prefab building and reflection unlock instantiate components
/// through it instead of reflecting over type names.
#[derive(Default)]
pub struct ComponentKinds {
    factories: HashMap<String, ComponentFactory>,
}

impl ComponentKinds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<F>(&mut self, kind: &str, factory: F) -> Result<(), ComponentKindsError>
    where
        F: Fn() -> Box<dyn ObjectComponent> + Send + Sync + 'static,
    {
        if self.factories.contains_key(kind) {
            return Err(ComponentKindsError::DuplicateKind { kind: kind.to_string() });
        }
        self.factories.insert(kind.to_string(), Box::new(factory));
        Ok(())
    }

    pub fn build(&self, kind: &str) -> Result<Box<dyn ObjectComponent>, ComponentKindsError> {
        let factory = self
            .factories
            .get(kind)
            .ok_or_else(|| ComponentKindsError::UnknownKind { kind: kind.to_string() })?;
        Ok(factory())
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
