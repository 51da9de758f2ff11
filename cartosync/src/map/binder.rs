use ahash::{HashMap, HashMapExt, HashSet};
use cartosync_types::{LayerId, Props};
use serde_json::Value;

use super::{EntryStatus, LayerEntry, Map};
use crate::engine::{NativeHandle, ProjectionRegistry, RenderEngine};
use crate::error::SyncError;
use crate::layer::{DeclaredNode, LayerKind};
use crate::source::SourceRef;

/// Token returned when a layer is added programmatically.
///
/// The scene object of the layer is created by the rendering engine later. Pass the token to
/// [`Map::resolve_pending`] to get the handle once the object exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PendingHandle {
    id: LayerId,
}

impl PendingHandle {
    /// Id of the layer the token was issued for.
    pub fn id(&self) -> &LayerId {
        &self.id
    }
}

impl<E: RenderEngine, P: ProjectionRegistry> Map<E, P> {
    /// Returns the scene object drawing the layer.
    ///
    /// If no object is bound to the layer yet, looks for an object tagged with the layer id in
    /// the scene graph and binds it. Returns `None` if there is no such object (yet); the
    /// registry is not modified in that case.
    pub fn resolve(&mut self, id: &LayerId) -> Option<NativeHandle> {
        let entry = match self.registry.lookup(id) {
            Ok(entry) => entry,
            Err(err) => {
                log::error!("Map {}: {err}", self.id);
                return None;
            }
        };

        if let Some(handle) = entry.handle() {
            return Some(handle);
        }

        let handle = find_tagged(&self.engine, id)?;
        log::trace!("Map {}: layer {id} resolved to {handle:?}", self.id);
        self.registry.bind_handle(id, handle);
        Some(handle)
    }

    /// Resolves every listed layer that has no scene object bound, with a single traversal of
    /// the scene graph. Returns the number of layers that got bound.
    pub fn resolve_all(&mut self) -> usize {
        let unbound: HashSet<LayerId> = self
            .registry
            .iter()
            .filter(|entry| entry.handle().is_none())
            .map(|entry| entry.id().clone())
            .collect();

        if unbound.is_empty() {
            return 0;
        }

        let mut found: HashMap<LayerId, NativeHandle> = HashMap::new();
        let engine = &self.engine;
        engine.walk(&mut |handle| {
            if let Some(tag) = engine.tag(handle) {
                if unbound.contains(&tag) {
                    found.entry(tag).or_insert(handle);
                }
            }

            found.len() < unbound.len()
        });

        for (id, handle) in &found {
            self.registry.bind_handle(id, *handle);
        }

        log::trace!(
            "Map {}: resolved {} of {} unbound layers",
            self.id,
            found.len(),
            unbound.len()
        );
        found.len()
    }

    /// Converts the token into the scene object handle, once the engine has created the object.
    pub fn resolve_pending(&mut self, token: &PendingHandle) -> Option<NativeHandle> {
        self.resolve(&token.id)
    }

    /// Adds a layer that is not part of the host tree. The layer id is taken from the `uid`
    /// property.
    ///
    /// Programmatically added layers are never removed by [`Map::reconcile`]. They are
    /// removed by [`Map::restore`] only.
    pub fn create_and_add_layer(
        &mut self,
        kind: LayerKind,
        props: Props,
        source: Option<SourceRef>,
    ) -> Result<PendingHandle, SyncError> {
        let id = props.uid().ok_or(SyncError::MissingId)?;

        let mut node = DeclaredNode::layer(kind).with_props(props);
        node.source = source;

        if self.registry.get(&id).is_some() {
            log::debug!("Map {}: replacing layer {id} with an injected one", self.id);
        }

        self.upsert(LayerEntry::injected(id.clone(), node), true);
        Ok(PendingHandle { id })
    }

    /// Constructs a source with the source factory and adds a layer drawing it. The layer
    /// id is taken from the `uid` property and the layer kind from the source type.
    ///
    /// If a layer with this id already exists, no new layer is created: the source of the
    /// existing layer is returned instead, taken from its scene object if one can be
    /// resolved, or from the layer node otherwise.
    pub fn create_and_add_layer_from_source(
        &mut self,
        type_name: &str,
        options: &Value,
        props: Props,
    ) -> Result<Option<SourceRef>, SyncError> {
        let id = props.uid().ok_or(SyncError::MissingId)?;

        if self.registry.get(&id).is_some() {
            let from_scene = self
                .resolve(&id)
                .and_then(|handle| self.engine.source(handle));

            return Ok(from_scene.or_else(|| {
                self.registry
                    .get(&id)
                    .and_then(|entry| entry.source().cloned())
            }));
        }

        self.add_layer_from_source(EntryStatus::Injected, id, type_name, options, props, true)
            .map(Some)
    }

    pub(super) fn add_layer_from_source(
        &mut self,
        status: EntryStatus,
        id: LayerId,
        type_name: &str,
        options: &Value,
        props: Props,
        notify_on_change: bool,
    ) -> Result<SourceRef, SyncError> {
        let (source, kind) = self.factory.create(type_name, options)?;
        let node = DeclaredNode::layer(kind)
            .with_props(props)
            .with_source(source.clone());

        let entry = match status {
            EntryStatus::Injected => LayerEntry::injected(id, node),
            _ => LayerEntry::declared(id, node, Props::new()),
        };

        self.upsert(entry, notify_on_change);
        Ok(source)
    }
}

fn find_tagged(engine: &impl RenderEngine, id: &LayerId) -> Option<NativeHandle> {
    let mut found = None;
    engine.walk(&mut |handle| {
        if engine.tag(handle).as_ref() == Some(id) {
            found = Some(handle);
            return false;
        }

        true
    });

    found
}
