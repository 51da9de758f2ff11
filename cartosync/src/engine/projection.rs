use cartosync_types::ProjectionDefinition;

use crate::view::BUILTIN_PROJECTIONS;

/// Registry of custom coordinate systems known to the rendering engine.
pub trait ProjectionRegistry {
    /// Registers a coordinate system. A definition with the same code replaces the old one.
    fn register(&mut self, definition: ProjectionDefinition);

    /// All registered coordinate systems in registration order.
    fn list(&self) -> Vec<ProjectionDefinition>;

    /// Returns true if the coordinate system can be used by a view: it is either built in or
    /// registered.
    fn is_known(&self, code: &str) -> bool {
        BUILTIN_PROJECTIONS.contains(&code) || self.list().iter().any(|p| p.code == code)
    }
}

/// In-memory coordinate system registry.
#[derive(Debug, Clone, Default)]
pub struct ProjectionStore {
    definitions: Vec<ProjectionDefinition>,
}

impl ProjectionStore {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the definition registered with the code.
    pub fn get(&self, code: &str) -> Option<&ProjectionDefinition> {
        self.definitions.iter().find(|p| p.code == code)
    }

    /// Number of registered coordinate systems.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl ProjectionRegistry for ProjectionStore {
    fn register(&mut self, definition: ProjectionDefinition) {
        match self
            .definitions
            .iter_mut()
            .find(|p| p.code == definition.code)
        {
            Some(existing) => {
                log::debug!("Replacing definition of projection {}", definition.code);
                *existing = definition;
            }
            None => self.definitions.push(definition),
        }
    }

    fn list(&self) -> Vec<ProjectionDefinition> {
        self.definitions.clone()
    }

    fn is_known(&self, code: &str) -> bool {
        BUILTIN_PROJECTIONS.contains(&code) || self.get(code).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_definition_wins() {
        let mut store = ProjectionStore::new();
        store.register(ProjectionDefinition::new("EPSG:2154", "old"));
        store.register(ProjectionDefinition::new("EPSG:27700", "bng"));
        store.register(ProjectionDefinition::new("EPSG:2154", "new").with_name("Lambert-93"));

        let list = store.list();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].code, "EPSG:2154");
        assert_eq!(list[0].wkt_definition, "new");
        assert_eq!(list[0].name.as_deref(), Some("Lambert-93"));
        assert_eq!(list[1].code, "EPSG:27700");
    }

    #[test]
    fn builtin_projections_are_known() {
        let mut store = ProjectionStore::new();
        assert!(store.is_known("EPSG:3857"));
        assert!(store.is_known("EPSG:4326"));
        assert!(!store.is_known("EPSG:2154"));
        assert!(store.is_empty());

        store.register(ProjectionDefinition::new("EPSG:2154", "wkt"));
        assert!(store.is_known("EPSG:2154"));
        assert_eq!(store.len(), 1);
    }
}
