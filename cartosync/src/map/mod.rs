//! [`Map`] ties a layer registry to the rendering engine it is synchronized with.

use cartosync_types::{LayerId, Props};

use crate::engine::{NativeHandle, ProjectionRegistry, ProjectionStore, RenderEngine};
use crate::messenger::Messenger;
use crate::source::SourceFactory;
use crate::view::MapView;

mod binder;
mod builder;
mod identify;
mod layer_registry;
mod reconcile;
mod snapshot;

pub use binder::PendingHandle;
pub use builder::MapBuilder;
pub use layer_registry::{EntryStatus, LayerEntry, LayerRegistry, UpsertOutcome};
pub use reconcile::ReconcileReport;
pub use snapshot::RestoreReport;

/// Map instance: the layer registry, the rendering engine drawing the layers, the registry of
/// custom coordinate systems and the factory used to reconstruct layer sources.
///
/// The registry lives exactly as long as the map.
pub struct Map<E: RenderEngine, P: ProjectionRegistry = ProjectionStore> {
    id: String,
    engine: E,
    projections: P,
    registry: LayerRegistry,
    factory: SourceFactory,
}

impl<E: RenderEngine, P: ProjectionRegistry> Map<E, P> {
    /// Creates a new map. Use [`MapBuilder`] for default values.
    pub fn new(
        id: impl Into<String>,
        engine: E,
        projections: P,
        factory: SourceFactory,
        messenger: Option<Box<dyn Messenger>>,
    ) -> Self {
        Self {
            id: id.into(),
            engine,
            projections,
            registry: LayerRegistry::new(messenger),
            factory,
        }
    }

    /// Id of the map instance.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Rendering engine of the map.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Mutable reference to the rendering engine.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Custom coordinate systems registry.
    pub fn projections(&self) -> &P {
        &self.projections
    }

    /// Mutable reference to the custom coordinate systems registry.
    pub fn projections_mut(&mut self) -> &mut P {
        &mut self.projections
    }

    /// Factory used to construct layer sources from their type name and options.
    pub fn source_factory(&self) -> &SourceFactory {
        &self.factory
    }

    /// Mutable reference to the source factory, e.g. to register custom source types.
    pub fn source_factory_mut(&mut self) -> &mut SourceFactory {
        &mut self.factory
    }

    /// Layer registry of the map.
    pub fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    /// Sets the messenger notified when the host tree should be evaluated again.
    pub fn set_messenger(&mut self, messenger: Option<impl Messenger + 'static>) {
        let messenger: Option<Box<dyn Messenger>> = match messenger {
            Some(m) => Some(Box::new(m)),
            None => None,
        };

        self.registry.set_messenger(messenger);
    }

    /// Current view of the map.
    pub fn view(&self) -> &MapView {
        self.engine.view()
    }

    /// Changes the view of the map.
    pub fn set_view(&mut self, view: MapView) {
        self.engine.set_view(view);
        self.refresh();
    }

    /// Asks the host to evaluate its tree again.
    pub fn refresh(&self) {
        self.registry.request_refresh();
    }

    /// Layers of the map in insertion order, without the ones pending removal.
    pub fn layers(&self) -> Vec<&LayerEntry> {
        self.registry.iter().collect()
    }

    /// Layers satisfying the predicate.
    pub fn layers_by<F>(&self, predicate: F) -> Vec<&LayerEntry>
    where
        F: FnMut(&LayerEntry) -> bool,
    {
        self.registry.list_by(predicate)
    }

    /// Returns the layer with the given id.
    pub fn layer(&self, id: &LayerId) -> Option<&LayerEntry> {
        self.registry.get(id)
    }

    /// Overrides properties of a layer. The new values survive all following reconciliations,
    /// even if the host tree keeps declaring other values.
    pub fn update_layer_props(&mut self, id: &LayerId, patch: &Props) {
        self.update_layer_props_with(id, patch, true);
    }

    /// Like [`Map::update_layer_props`], but the host is only notified if `notify_on_change`
    /// is set.
    pub fn update_layer_props_with(&mut self, id: &LayerId, patch: &Props, notify_on_change: bool) {
        let outcome = self.registry.update_overlay(id, patch, notify_on_change);
        self.release_stale(&outcome);
    }

    /// Scene object bound to the layer, if any. Does not look into the scene graph, see
    /// [`Map::resolve`] for that.
    pub fn layer_handle(&self, id: &LayerId) -> Option<NativeHandle> {
        self.registry.handle(id)
    }

    /// Binds the scene object to the layer and tags the object with the layer id.
    ///
    /// Returns false (and logs an error) if there is no such layer.
    pub fn set_layer_handle(&mut self, id: &LayerId, handle: NativeHandle) -> bool {
        if !self.registry.bind_handle(id, handle) {
            return false;
        }

        self.engine.set_tag(handle, id);
        true
    }

    /// Merges the entry into the registry, see [`LayerRegistry::upsert`]. A scene object left
    /// without entry by the operation is released.
    pub fn upsert_layer(&mut self, entry: LayerEntry, notify_on_change: bool) -> UpsertOutcome {
        self.upsert(entry, notify_on_change)
    }

    /// Removes a layer. An injected layer is deleted together with its scene object. A layer of
    /// the host tree is marked for removal and purged by the next [`Map::reconcile`].
    pub fn remove_layer(&mut self, id: &LayerId) -> UpsertOutcome {
        let removal = match self.registry.lookup(id) {
            Ok(entry) => entry.to_removal(),
            Err(err) => {
                log::error!("Map {}: {err}", self.id);
                return UpsertOutcome::Ignored;
            }
        };

        self.upsert(removal, true)
    }

    fn upsert(&mut self, entry: LayerEntry, notify_on_change: bool) -> UpsertOutcome {
        let outcome = self.registry.upsert(entry, notify_on_change);
        self.release_stale(&outcome);
        outcome
    }

    fn release_stale(&mut self, outcome: &UpsertOutcome) {
        if let Some(handle) = outcome.released_handle() {
            log::debug!("Map {}: releasing scene object {handle:?}", self.id);
            self.engine.release(handle);
        }
    }
}
