use std::sync::Arc;

use ahash::{HashMap, HashMapExt};
use serde_json::Value;

use super::local_vector::LOCAL_VECTOR;
use super::{LocalVectorSource, RemoteKind, RemoteSource, SourceRef};
use crate::error::SyncError;
use crate::layer::LayerKind;

type Constructor = Box<dyn Fn(&Value) -> Result<SourceRef, SyncError>>;

struct FactoryEntry {
    layer_kind: LayerKind,
    constructor: Constructor,
}

/// Mapping from source type names to source constructors.
///
/// The map uses the factory to rebuild sources described in a snapshot and to create
/// layers from a type name and options. [`SourceFactory::default`] knows all well-known source
/// types; custom types can be added with [`SourceFactory::register`].
pub struct SourceFactory {
    entries: HashMap<String, FactoryEntry>,
}

impl SourceFactory {
    /// Creates a factory that knows no source types.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Creates a factory for all the well-known source types: every [`RemoteKind`] and
    /// `LocalVector`.
    pub fn well_known() -> Self {
        let mut factory = Self::empty();
        for kind in RemoteKind::ALL {
            factory.register(kind.type_name(), kind.layer_kind(), move |options| {
                let source: SourceRef = Arc::new(RemoteSource::new(kind, options)?);
                Ok(source)
            });
        }

        factory.register(LOCAL_VECTOR, LayerKind::Vector, |options| {
            let source: SourceRef = Arc::new(LocalVectorSource::from_options(options)?);
            Ok(source)
        });

        factory
    }

    /// Adds a source type. Replaces the constructor registered for the same name before.
    pub fn register(
        &mut self,
        type_name: impl Into<String>,
        layer_kind: LayerKind,
        constructor: impl Fn(&Value) -> Result<SourceRef, SyncError> + 'static,
    ) {
        self.entries.insert(
            type_name.into(),
            FactoryEntry {
                layer_kind,
                constructor: Box::new(constructor),
            },
        );
    }

    /// Returns true if the factory can construct sources of this type.
    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.contains_key(type_name)
    }

    /// Kind of the layer used to draw sources of this type.
    pub fn layer_kind(&self, type_name: &str) -> Option<LayerKind> {
        self.entries.get(type_name).map(|entry| entry.layer_kind)
    }

    /// Constructs a source of the given type. Returns the source and the kind of layer that
    /// should draw it.
    pub fn create(
        &self,
        type_name: &str,
        options: &Value,
    ) -> Result<(SourceRef, LayerKind), SyncError> {
        let entry = self
            .entries
            .get(type_name)
            .ok_or_else(|| SyncError::UnknownSourceType(type_name.to_string()))?;

        let source = (entry.constructor)(options)?;
        Ok((source, entry.layer_kind))
    }
}

impl Default for SourceFactory {
    fn default() -> Self {
        Self::well_known()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::source::probe;
    use crate::tests::PrivateSource;

    #[test]
    fn well_known_types() {
        let factory = SourceFactory::default();
        for name in [
            "Xyz",
            "TileWms",
            "TileArcGISRest",
            "ImageWms",
            "ImageStatic",
            "ImageArcGISRest",
            "ExternalVector",
            "Wfs",
            "QueryArcGISRest",
            "LocalVector",
        ] {
            assert!(factory.contains(name), "{name} is not registered");
        }

        assert_eq!(factory.layer_kind("TileWms"), Some(LayerKind::Tile));
        assert_eq!(factory.layer_kind("ImageArcGISRest"), Some(LayerKind::Image));
        assert_eq!(factory.layer_kind("LocalVector"), Some(LayerKind::Vector));
        assert_eq!(factory.layer_kind("Unknown"), None);
    }

    #[test]
    fn create_remote_source() {
        let factory = SourceFactory::default();
        let options = json!({"url": "https://tile.openstreetmap.org/{z}/{x}/{y}.png"});
        let (source, kind) = factory.create("Xyz", &options).expect("known type");

        assert_eq!(kind, LayerKind::Tile);
        let descriptor = probe(Some(&source)).into_descriptor().expect("serializable");
        assert_eq!(descriptor.type_name, "Xyz");
        assert_eq!(descriptor.options, options);
        assert!(source.as_any().downcast_ref::<RemoteSource>().is_some());
    }

    #[test]
    fn unknown_type() {
        let factory = SourceFactory::default();
        assert_matches!(
            factory.create("Bing", &json!({})),
            Err(SyncError::UnknownSourceType(name)) if name == "Bing"
        );
    }

    #[test]
    fn invalid_options() {
        let factory = SourceFactory::default();
        assert_matches!(
            factory.create("Wfs", &json!({"url": "https://wfs"})),
            Err(SyncError::InvalidSourceOptions { .. })
        );
    }

    #[test]
    fn custom_types() {
        let mut factory = SourceFactory::empty();
        assert!(!factory.contains("Xyz"));

        factory.register("Private", LayerKind::Image, |_| {
            let source: SourceRef = Arc::new(PrivateSource);
            Ok(source)
        });
        let (source, kind) = factory.create("Private", &Value::Null).expect("registered");
        assert_eq!(kind, LayerKind::Image);
        assert_eq!(source.label(), "private");
    }
}
