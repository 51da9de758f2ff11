use ahash::{HashSet, HashSetExt};
use cartosync_types::{LayerId, Props};

use super::{EntryStatus, LayerEntry, Map, UpsertOutcome};
use crate::engine::{ProjectionRegistry, RenderEngine};
use crate::error::SyncError;
use crate::layer::DeclaredNode;

/// Counts of what a reconciliation pass did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Entries removed for good because they were pending removal since the previous pass.
    pub purged: usize,
    /// New entries.
    pub inserted: usize,
    /// Existing entries whose effective properties changed.
    pub updated: usize,
    /// Existing entries that did not change.
    pub unchanged: usize,
    /// Entries marked for removal.
    pub removed: usize,
    /// Layer nodes that were not applied (missing id or id of an injected layer).
    pub skipped: usize,
}

impl ReconcileReport {
    /// Returns true if the pass changed the layer set or any layer properties.
    pub fn has_changes(&self) -> bool {
        self.inserted + self.updated + self.removed > 0
    }
}

impl<E: RenderEngine, P: ProjectionRegistry> Map<E, P> {
    /// Brings the registry in sync with the latest list of nodes of the host tree.
    ///
    /// * Entries marked for removal in the previous pass are purged first and their scene
    ///   objects released, so an id coming back in this pass creates a fresh entry.
    /// * A layer node without id is logged and skipped.
    /// * A node with a known id updates the entry. Properties set with
    ///   [`Map::update_layer_props`] override the declared values.
    /// * Declared entries whose ids are not in the list are marked for removal.
    /// * Injected entries are never touched.
    ///
    /// Non-layer nodes are ignored. The messenger is called for every entry that changed.
    pub fn reconcile(&mut self, children: &[DeclaredNode]) -> ReconcileReport {
        let mut report = ReconcileReport {
            purged: self.purge_pending_removals(),
            ..Default::default()
        };

        let mut to_delete: HashSet<LayerId> = HashSet::new();
        for entry in self.registry.iter() {
            if entry.status() == EntryStatus::Declared {
                to_delete.insert(entry.id().clone());
            }
        }

        for node in children {
            if node.layer_kind().is_none() {
                log::trace!("Map {}: skipping {:?} node", self.id, node.kind);
                continue;
            }

            let Some(id) = node.id.clone().or_else(|| node.props.uid()) else {
                log::error!("Map {}: {}", self.id, SyncError::MissingId);
                report.skipped += 1;
                continue;
            };

            to_delete.remove(&id);

            let overlay = match self.registry.get(&id) {
                Some(existing) if existing.status() == EntryStatus::Injected => {
                    log::warn!(
                        "Map {}: layer {id} was added programmatically, declared node is ignored",
                        self.id
                    );
                    report.skipped += 1;
                    continue;
                }
                Some(existing) => {
                    if !existing.node().same_source(node) {
                        log::debug!("Map {}: source of layer {id} was replaced", self.id);
                    }
                    existing.overlay().clone()
                }
                None => Props::new(),
            };

            match self.upsert(LayerEntry::declared(id, node.clone(), overlay), true) {
                UpsertOutcome::Inserted => report.inserted += 1,
                UpsertOutcome::Replaced { changed: true, .. } => report.updated += 1,
                UpsertOutcome::Replaced { changed: false, .. } => report.unchanged += 1,
                _ => {}
            }
        }

        let removals: Vec<LayerEntry> = self
            .registry
            .iter()
            .filter(|entry| to_delete.contains(entry.id()))
            .map(LayerEntry::to_removal)
            .collect();

        for removal in removals {
            if let UpsertOutcome::SoftDeleted = self.upsert(removal, true) {
                report.removed += 1;
            }
        }

        log::debug!("Map {}: reconciled layers {report:?}", self.id);
        report
    }

    fn purge_pending_removals(&mut self) -> usize {
        let purged = self.registry.take_pending_removals();
        for entry in &purged {
            log::trace!("Map {}: purging layer {}", self.id, entry.id());
            if let Some(handle) = entry.handle() {
                self.engine.release(handle);
            }
        }

        purged.len()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::engine::MemoryEngine;
    use crate::layer::{LayerKind, NodeKind};
    use crate::tests::{osm_source, props, test_map, tile_node};

    #[test]
    fn first_pass_creates_declared_entries() {
        let (mut map, counter) = test_map();
        let report = map.reconcile(&[tile_node("A", json!({"visible": true}))]);

        assert_eq!(report.inserted, 1);
        assert_eq!(counter.count(), 1);

        let layers = map.layers();
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].id().as_str(), "A");
        assert_eq!(layers[0].status(), EntryStatus::Declared);
        assert!(layers[0].overlay().is_empty());
    }

    #[test]
    fn overlay_wins_over_declared_props() {
        let (mut map, _) = test_map();
        let children = [tile_node("A", json!({"visible": true}))];
        map.reconcile(&children);

        map.update_layer_props(&"A".into(), &props(json!({"visible": false})));
        map.reconcile(&children);

        let entry = map.layer(&"A".into()).expect("exists");
        assert_eq!(entry.props().get("visible"), Some(&json!(false)));
        assert_eq!(entry.overlay().get("visible"), Some(&json!(false)));
    }

    #[test]
    fn overlay_survives_many_passes() {
        let (mut map, _) = test_map();
        map.reconcile(&[tile_node("A", json!({"opacity": 1.0, "title": "a"}))]);
        map.update_layer_props(&"A".into(), &props(json!({"opacity": 0.3})));

        for i in 0..5 {
            map.reconcile(&[tile_node("A", json!({"opacity": 1.0, "title": i}))]);
            let entry = map.layer(&"A".into()).expect("exists");
            assert_eq!(entry.props().get("opacity"), Some(&json!(0.3)));
            assert_eq!(entry.props().get("title"), Some(&json!(i)));
        }
    }

    #[test]
    fn unchanged_children_do_not_notify() {
        let (mut map, counter) = test_map();
        let children = [
            tile_node("A", json!({"visible": true})),
            tile_node("B", json!({"visible": false})),
        ];
        map.reconcile(&children);
        counter.reset();

        let report = map.reconcile(&children);
        assert!(!report.has_changes());
        assert_eq!(report.unchanged, 2);
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn replaced_source_alone_does_not_notify() {
        let (mut map, counter) = test_map();
        map.reconcile(&[tile_node("A", json!({})).with_source(osm_source())]);
        counter.reset();

        map.reconcile(&[tile_node("A", json!({})).with_source(osm_source())]);
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn removed_child_is_pending_then_purged() {
        let (mut map, counter) = test_map();
        map.reconcile(&[tile_node("A", json!({})), tile_node("B", json!({}))]);
        let handle = map.engine_mut().mount_layer("A", LayerKind::Tile, None);
        assert_eq!(map.resolve(&"A".into()), Some(handle));
        counter.reset();

        let report = map.reconcile(&[tile_node("B", json!({}))]);
        assert_eq!(report.removed, 1);
        assert_eq!(counter.count(), 1);
        assert!(map.layer(&"A".into()).is_none());
        assert_eq!(map.registry().pending_removals().count(), 1);
        assert!(map.engine().contains(handle));

        let report = map.reconcile(&[tile_node("B", json!({}))]);
        assert_eq!(report.purged, 1);
        assert_eq!(map.registry().pending_removals().count(), 0);
        assert!(!map.engine().contains(handle));
    }

    #[test]
    fn resurrected_id_starts_fresh() {
        let (mut map, _) = test_map();
        map.reconcile(&[tile_node("A", json!({"visible": true}))]);
        map.update_layer_props(&"A".into(), &props(json!({"visible": false})));

        map.reconcile(&[]);
        let report = map.reconcile(&[tile_node("A", json!({"visible": true}))]);

        assert_eq!(report.purged, 1);
        assert_eq!(report.inserted, 1);
        let entry = map.layer(&"A".into()).expect("exists");
        assert_eq!(entry.props().get("visible"), Some(&json!(true)));
        assert!(entry.overlay().is_empty());
    }

    #[test]
    fn injected_layers_are_never_removed() {
        let (mut map, _) = test_map();
        map.create_and_add_layer(
            LayerKind::Vector,
            props(json!({"uid": "drawing"})),
            None,
        )
        .expect("has uid");

        for children in [vec![], vec![tile_node("A", json!({}))], vec![]] {
            map.reconcile(&children);
            let entry = map.layer(&"drawing".into()).expect("still there");
            assert_eq!(entry.status(), EntryStatus::Injected);
        }
    }

    #[test]
    fn declared_node_with_injected_id_is_skipped() {
        let (mut map, _) = test_map();
        map.create_and_add_layer(LayerKind::Vector, props(json!({"uid": "A", "z": 1})), None)
            .expect("has uid");

        let report = map.reconcile(&[tile_node("A", json!({"z": 2}))]);
        assert_eq!(report.skipped, 1);
        let entry = map.layer(&"A".into()).expect("exists");
        assert_eq!(entry.props().get("z"), Some(&json!(1)));
        assert_eq!(entry.kind(), Some(LayerKind::Vector));
    }

    #[test]
    fn nodes_without_id_are_skipped() {
        let (mut map, _) = test_map();
        let report = map.reconcile(&[
            DeclaredNode::layer(LayerKind::Tile).with_prop("visible", true),
            tile_node("A", json!({})),
        ]);

        assert_eq!(report.skipped, 1);
        assert_eq!(report.inserted, 1);
        assert_eq!(map.layers().len(), 1);
    }

    #[test]
    fn uid_prop_is_used_as_id() {
        let (mut map, _) = test_map();
        map.reconcile(&[DeclaredNode::layer(LayerKind::Image).with_prop("uid", 42)]);
        assert!(map.layer(&"42".into()).is_some());
    }

    #[test]
    fn non_layer_nodes_are_ignored() {
        let (mut map, _) = test_map();
        let report = map.reconcile(&[
            DeclaredNode::new(NodeKind::Tool).with_id("toolbar"),
            DeclaredNode::new(NodeKind::Container),
            DeclaredNode::new(NodeKind::Projection).with_id("EPSG:2154"),
        ]);

        assert_eq!(report, ReconcileReport::default());
        assert!(map.layers().is_empty());
    }

    #[test]
    fn keeps_children_order_for_new_entries() {
        let mut map = crate::MapBuilder::new(MemoryEngine::new()).build();
        map.reconcile(&[
            tile_node("C", json!({})),
            tile_node("A", json!({})),
            tile_node("B", json!({})),
        ]);

        let ids: Vec<_> = map.layers().iter().map(|e| e.id().to_string()).collect();
        assert_eq!(ids, vec!["C", "A", "B"]);
    }
}
