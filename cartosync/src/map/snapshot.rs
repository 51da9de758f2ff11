use cartosync_types::props::{UID_KEY, VOLATILE_KEYS};
use cartosync_types::{LayerId, Snapshot, SnapshotLayer, SnapshotView};

use super::{EntryStatus, LayerEntry, Map};
use crate::engine::{ProjectionRegistry, RenderEngine};
use crate::error::SyncError;
use crate::source::{probe, Capability};
use crate::view::MapView;

/// Result of a successful [`Map::restore`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    /// Number of layers removed before restoring.
    pub removed: usize,
    /// Number of coordinate systems registered.
    pub projections: usize,
    /// Ids of the restored layers in snapshot order.
    pub restored: Vec<LayerId>,
    /// Number of snapshot layers that could not be restored.
    pub skipped: usize,
}

impl<E: RenderEngine, P: ProjectionRegistry> Map<E, P> {
    /// Describes the current view, custom coordinate systems and layers of the map.
    ///
    /// Layers without a source, or with a source that cannot describe itself or refuses to be
    /// serialized, are left out. Layer properties are stored without `source` and `children`
    /// and with the layer id as `uid`.
    ///
    /// Capturing never modifies the map.
    pub fn capture(&self) -> Snapshot {
        let view = self.engine.view();
        let view = SnapshotView {
            center: view.center(),
            zoom: view.zoom(),
            projection_code: view.projection_code().to_string(),
        };

        let layers = self
            .registry
            .iter()
            .filter_map(|entry| self.capture_layer(entry))
            .collect();

        Snapshot {
            view,
            projections: self.projections.list(),
            layers,
        }
    }

    fn capture_layer(&self, entry: &LayerEntry) -> Option<SnapshotLayer> {
        let descriptor = match probe(entry.source()) {
            Capability::Serializable(descriptor) => descriptor,
            capability => {
                log::trace!(
                    "Map {}: layer {} is not captured: {capability:?}",
                    self.id,
                    entry.id()
                );
                return None;
            }
        };

        let mut props = entry.props().without(&VOLATILE_KEYS);
        props.insert(UID_KEY, entry.id().as_str());

        Some(SnapshotLayer {
            source_type_name: descriptor.type_name,
            source_options: descriptor.options,
            props,
        })
    }

    /// Replaces the content of the map with the snapshot.
    ///
    /// 1. All layers are removed: layers of the host tree are marked for removal, injected
    ///    layers are deleted.
    /// 2. Coordinate systems of the snapshot are registered in order, replacing the existing
    ///    definitions with the same code.
    /// 3. The view is replaced.
    /// 4. Layers are reconstructed with the source factory and added as host tree layers. A
    ///    layer with an unknown source type, invalid options or without `uid` is skipped.
    /// 5. The messenger is called once.
    ///
    /// If the view uses a coordinate system that is neither built in nor registered, the
    /// restore stops with [`SyncError::PartialRestore`] after step 2. Removed layers are not
    /// brought back in this case.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<RestoreReport, SyncError> {
        let mut report = RestoreReport::default();

        let removals: Vec<LayerEntry> = self.registry.iter().map(LayerEntry::to_removal).collect();
        for removal in removals {
            if self.upsert(removal, false).is_change() {
                report.removed += 1;
            }
        }

        for definition in &snapshot.projections {
            log::trace!("Map {}: registering projection {}", self.id, definition.code);
            self.projections.register(definition.clone());
            report.projections += 1;
        }

        let view = &snapshot.view;
        if !self.projections.is_known(&view.projection_code) {
            return Err(SyncError::PartialRestore {
                stage: "resetting the view",
                source: Box::new(SyncError::UnknownProjection(view.projection_code.clone())),
            });
        }

        self.engine.set_view(MapView::new(
            view.center,
            view.zoom,
            view.projection_code.as_str(),
        ));

        for layer in &snapshot.layers {
            match self.restore_layer(layer) {
                Ok(id) => report.restored.push(id),
                Err(err) => {
                    log::warn!(
                        "Map {}: layer with source '{}' is not restored: {err}",
                        self.id,
                        layer.source_type_name
                    );
                    report.skipped += 1;
                }
            }
        }

        log::debug!("Map {}: restored snapshot {report:?}", self.id);
        self.refresh();

        Ok(report)
    }

    fn restore_layer(&mut self, layer: &SnapshotLayer) -> Result<LayerId, SyncError> {
        let id = layer.props.uid().ok_or(SyncError::MissingId)?;
        self.add_layer_from_source(
            EntryStatus::Declared,
            id.clone(),
            &layer.source_type_name,
            &layer.source_options,
            layer.props.clone(),
            false,
        )?;

        Ok(id)
    }
}
