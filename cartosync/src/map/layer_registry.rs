use cartosync_types::props::VOLATILE_KEYS;
use cartosync_types::{LayerId, Props};

use crate::engine::NativeHandle;
use crate::error::SyncError;
use crate::layer::{DeclaredNode, LayerKind};
use crate::messenger::Messenger;
use crate::source::SourceRef;

/// Origin and lifecycle state of a [`LayerEntry`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EntryStatus {
    /// The layer is present in the current pass of the host tree.
    Declared,
    /// The layer was added programmatically and is not part of the host tree.
    Injected,
    /// The layer disappeared from the host tree and will be purged on the next reconciliation.
    PendingRemoval,
}

/// One layer known to the map.
#[derive(Clone, Debug)]
pub struct LayerEntry {
    id: LayerId,
    node: DeclaredNode,
    overlay: Props,
    status: EntryStatus,
    handle: Option<NativeHandle>,
}

impl LayerEntry {
    /// Creates an entry for a layer coming from the host tree. The properties of the entry are
    /// the node properties with `overlay` on top of them.
    pub fn declared(id: LayerId, node: DeclaredNode, overlay: Props) -> Self {
        Self::new(id, node, overlay, EntryStatus::Declared)
    }

    /// Creates an entry for a programmatically added layer.
    pub fn injected(id: LayerId, node: DeclaredNode) -> Self {
        Self::new(id, node, Props::new(), EntryStatus::Injected)
    }

    fn new(id: LayerId, mut node: DeclaredNode, overlay: Props, status: EntryStatus) -> Self {
        node.id = Some(id.clone());
        node.props.merge(&overlay);

        Self {
            id,
            node,
            overlay,
            status,
            handle: None,
        }
    }

    /// Id of the layer.
    pub fn id(&self) -> &LayerId {
        &self.id
    }

    /// Last node of the layer, with the effective properties.
    pub fn node(&self) -> &DeclaredNode {
        &self.node
    }

    /// Effective properties: declared properties overridden by the overlay properties.
    pub fn props(&self) -> &Props {
        &self.node.props
    }

    /// Properties set programmatically after the entry was created.
    pub fn overlay(&self) -> &Props {
        &self.overlay
    }

    /// Status of the entry.
    pub fn status(&self) -> EntryStatus {
        self.status
    }

    /// Scene graph object bound to the entry.
    pub fn handle(&self) -> Option<NativeHandle> {
        self.handle
    }

    /// Source of the layer.
    pub fn source(&self) -> Option<&SourceRef> {
        self.node.source.as_ref()
    }

    /// Kind of the layer.
    pub fn kind(&self) -> Option<LayerKind> {
        self.node.layer_kind()
    }

    /// Returns a copy of the entry marked for removal.
    pub fn to_removal(&self) -> Self {
        Self {
            status: EntryStatus::PendingRemoval,
            ..self.clone()
        }
    }

    /// Returns a copy of the entry with `patch` applied to both effective and overlay properties.
    pub fn with_overlay_patch(&self, patch: &Props) -> Self {
        let mut entry = self.clone();
        entry.node.props.merge(patch);
        entry.overlay.merge(patch);
        entry
    }

    /// Sets the scene graph object of the entry.
    pub fn with_handle(mut self, handle: NativeHandle) -> Self {
        self.handle = Some(handle);
        self
    }

    fn is_listed(&self) -> bool {
        self.status != EntryStatus::PendingRemoval
    }
}

/// Result of [`LayerRegistry::upsert`].
#[derive(Debug)]
pub enum UpsertOutcome {
    /// A new entry was added.
    Inserted,
    /// An existing entry was replaced.
    Replaced {
        /// Whether the effective properties changed.
        changed: bool,
        /// Handle of a pending removal entry that was replaced by a new one. The scene object
        /// belongs to the old layer and should be released.
        stale_handle: Option<NativeHandle>,
    },
    /// A declared entry was marked for removal.
    SoftDeleted,
    /// An injected entry was removed. Contains the removed entry.
    Removed(LayerEntry),
    /// Nothing was done.
    Ignored,
}

impl UpsertOutcome {
    /// Returns true if the operation changed the visible set of layers or their properties.
    pub fn is_change(&self) -> bool {
        match self {
            UpsertOutcome::Inserted | UpsertOutcome::SoftDeleted | UpsertOutcome::Removed(_) => {
                true
            }
            UpsertOutcome::Replaced { changed, .. } => *changed,
            UpsertOutcome::Ignored => false,
        }
    }

    /// Scene object that has no entry anymore and should be released.
    pub fn released_handle(&self) -> Option<NativeHandle> {
        match self {
            UpsertOutcome::Removed(entry) => entry.handle(),
            UpsertOutcome::Replaced { stale_handle, .. } => *stale_handle,
            _ => None,
        }
    }
}

/// Layers of one map, keyed by layer id.
///
/// Entries are kept in insertion order. Entries marked for removal stay in the registry until
/// [`LayerRegistry::take_pending_removals`] is called, so their scene objects can be released,
/// but they are not visible through [`LayerRegistry::iter`] and the lookup methods.
///
/// ```ignore
/// use cartosync::map::{LayerEntry, LayerRegistry};
/// use cartosync::{DeclaredNode, LayerKind, Props};
///
/// let mut registry = LayerRegistry::new(None);
/// let node = DeclaredNode::layer(LayerKind::Tile).with_prop("visible", true);
/// registry.upsert(LayerEntry::declared("OSM".into(), node, Props::new()), true);
///
/// assert_eq!(registry.len(), 1);
/// ```
#[derive(Default)]
pub struct LayerRegistry {
    entries: Vec<LayerEntry>,
    messenger: Option<Box<dyn Messenger>>,
}

impl LayerRegistry {
    /// Creates an empty registry. The `messenger` is notified about changes of the layer set.
    pub fn new(messenger: Option<Box<dyn Messenger>>) -> Self {
        Self {
            entries: vec![],
            messenger,
        }
    }

    /// Sets the messenger notified about changes of the layer set.
    pub fn set_messenger(&mut self, messenger: Option<Box<dyn Messenger>>) {
        self.messenger = messenger;
    }

    /// Asks the host to evaluate its tree again.
    pub fn request_refresh(&self) {
        if let Some(messenger) = &self.messenger {
            messenger.request_refresh();
        }
    }

    /// Iterates over all entries that are not marked for removal, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &LayerEntry> + '_ {
        self.entries.iter().filter(|entry| entry.is_listed())
    }

    /// Entries that are not marked for removal and satisfy the predicate.
    pub fn list_by<F>(&self, mut predicate: F) -> Vec<&LayerEntry>
    where
        F: FnMut(&LayerEntry) -> bool,
    {
        self.iter().filter(|entry| predicate(entry)).collect()
    }

    /// Number of entries not marked for removal.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Returns true if there are no entries besides the ones marked for removal.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the entry with the given id unless it is marked for removal.
    pub fn get(&self, id: &LayerId) -> Option<&LayerEntry> {
        self.iter().find(|entry| &entry.id == id)
    }

    /// Like [`LayerRegistry::get`], but reports a missing entry as an error.
    pub fn lookup(&self, id: &LayerId) -> Result<&LayerEntry, SyncError> {
        self.get(id).ok_or_else(|| SyncError::NotFound(id.clone()))
    }

    /// Entries marked for removal.
    pub fn pending_removals(&self) -> impl Iterator<Item = &LayerEntry> + '_ {
        self.entries.iter().filter(|entry| !entry.is_listed())
    }

    /// Removes all entries marked for removal and returns them.
    pub fn take_pending_removals(&mut self) -> Vec<LayerEntry> {
        let (pending, listed) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|entry| !entry.is_listed());
        self.entries = listed;
        pending
    }

    /// Merges the entry into the registry.
    ///
    /// * A new id is inserted at the end, unless the entry is marked for removal.
    /// * Marking a declared entry for removal keeps it in the registry until it is purged;
    ///   marking an injected entry for removal deletes it at once.
    /// * In all other cases the entry replaces the existing one. A scene object bound to the
    ///   existing entry is kept if the new entry has none.
    ///
    /// If `notify_on_change` is set and the operation changed the layer set or the layer
    /// properties (ignoring `source` and `children`), the messenger is called once.
    pub fn upsert(&mut self, entry: LayerEntry, notify_on_change: bool) -> UpsertOutcome {
        let position = self.entries.iter().position(|e| e.id == entry.id);

        let outcome = match (position, entry.status) {
            (None, EntryStatus::PendingRemoval) => UpsertOutcome::Ignored,
            (None, _) => {
                log::trace!("Adding layer {} as {:?}", entry.id, entry.status);
                self.entries.push(entry);
                UpsertOutcome::Inserted
            }
            (Some(index), EntryStatus::PendingRemoval) => match self.entries[index].status() {
                EntryStatus::Declared => {
                    log::trace!("Layer {} is pending removal", entry.id);
                    self.entries[index].status = EntryStatus::PendingRemoval;
                    UpsertOutcome::SoftDeleted
                }
                EntryStatus::Injected => {
                    log::trace!("Removing injected layer {}", entry.id);
                    UpsertOutcome::Removed(self.entries.remove(index))
                }
                EntryStatus::PendingRemoval => UpsertOutcome::Ignored,
            },
            (Some(index), _) => {
                let mut entry = entry;
                let previous = &mut self.entries[index];

                let outcome = if previous.status == EntryStatus::PendingRemoval {
                    UpsertOutcome::Replaced {
                        changed: true,
                        stale_handle: previous.handle.filter(|h| Some(*h) != entry.handle),
                    }
                } else {
                    if entry.handle.is_none() {
                        entry.handle = previous.handle;
                    }

                    UpsertOutcome::Replaced {
                        changed: !previous.props().eq_except(entry.props(), &VOLATILE_KEYS),
                        stale_handle: None,
                    }
                };

                *previous = entry;
                outcome
            }
        };

        if notify_on_change && outcome.is_change() {
            self.request_refresh();
        }

        outcome
    }

    /// Binds the scene object to the entry. Logs an error if there is no such entry.
    pub fn bind_handle(&mut self, id: &LayerId, handle: NativeHandle) -> bool {
        match self
            .entries
            .iter_mut()
            .find(|entry| entry.is_listed() && &entry.id == id)
        {
            Some(entry) => {
                if entry.handle.is_some_and(|bound| bound != handle) {
                    log::debug!("Rebinding layer {id} to {handle:?}");
                }
                entry.handle = Some(handle);
                true
            }
            None => {
                log::error!("{}", SyncError::NotFound(id.clone()));
                false
            }
        }
    }

    /// Scene object bound to the entry. Logs an error if there is no such entry.
    pub fn handle(&self, id: &LayerId) -> Option<NativeHandle> {
        match self.lookup(id) {
            Ok(entry) => entry.handle,
            Err(err) => {
                log::error!("{err}");
                None
            }
        }
    }

    /// Applies the patch to the effective and the overlay properties of the entry. Overlay
    /// properties take precedence over the declared ones in all subsequent reconciliations.
    pub fn update_overlay(
        &mut self,
        id: &LayerId,
        patch: &Props,
        notify_on_change: bool,
    ) -> UpsertOutcome {
        let entry = match self.lookup(id) {
            Ok(entry) => entry.with_overlay_patch(patch),
            Err(err) => {
                log::error!("{err}");
                return UpsertOutcome::Ignored;
            }
        };

        self.upsert(entry, notify_on_change)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::tests::{props, RefreshCounter};

    fn declared(id: &str, value: serde_json::Value) -> LayerEntry {
        LayerEntry::declared(
            id.into(),
            DeclaredNode::layer(LayerKind::Tile).with_props(props(value)),
            Props::new(),
        )
    }

    fn injected(id: &str) -> LayerEntry {
        LayerEntry::injected(id.into(), DeclaredNode::layer(LayerKind::Vector))
    }

    fn registry() -> (LayerRegistry, RefreshCounter) {
        let counter = RefreshCounter::default();
        (LayerRegistry::new(Some(Box::new(counter.clone()))), counter)
    }

    #[test]
    fn insert_and_list_in_order() {
        let (mut registry, counter) = registry();
        assert_matches!(registry.upsert(declared("B", json!({})), true), UpsertOutcome::Inserted);
        assert_matches!(registry.upsert(injected("A"), true), UpsertOutcome::Inserted);

        let ids: Vec<_> = registry.iter().map(|e| e.id().as_str()).collect();
        assert_eq!(ids, vec!["B", "A"]);
        assert_eq!(counter.count(), 2);

        let injected: Vec<_> = registry.list_by(|e| e.status() == EntryStatus::Injected);
        assert_eq!(injected.len(), 1);
        assert_eq!(injected[0].id().as_str(), "A");
    }

    #[test]
    fn removal_of_unknown_entry_is_ignored() {
        let (mut registry, counter) = registry();
        let outcome = registry.upsert(declared("A", json!({})).to_removal(), true);
        assert_matches!(outcome, UpsertOutcome::Ignored);
        assert!(registry.is_empty());
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn declared_entry_is_soft_deleted() {
        let (mut registry, _) = registry();
        registry.upsert(declared("A", json!({})), false);
        let removal = registry.get(&"A".into()).expect("exists").to_removal();

        assert_matches!(registry.upsert(removal, false), UpsertOutcome::SoftDeleted);
        assert!(registry.get(&"A".into()).is_none());
        assert_eq!(registry.pending_removals().count(), 1);

        let purged = registry.take_pending_removals();
        assert_eq!(purged.len(), 1);
        assert_eq!(registry.pending_removals().count(), 0);
    }

    #[test]
    fn injected_entry_is_hard_deleted() {
        let (mut registry, _) = registry();
        registry.upsert(injected("A").with_handle(NativeHandle::new(5)), false);
        let removal = registry.get(&"A".into()).expect("exists").to_removal();

        let outcome = registry.upsert(removal, false);
        assert_eq!(outcome.released_handle(), Some(NativeHandle::new(5)));
        assert_matches!(outcome, UpsertOutcome::Removed(entry) if entry.id().as_str() == "A");
        assert_eq!(registry.pending_removals().count(), 0);
    }

    #[test]
    fn replace_detects_changes_ignoring_volatile_props() {
        let (mut registry, counter) = registry();
        registry.upsert(declared("A", json!({"visible": true, "children": 1})), true);
        assert_eq!(counter.count(), 1);

        let outcome = registry.upsert(declared("A", json!({"visible": true, "children": 2})), true);
        assert_matches!(outcome, UpsertOutcome::Replaced { changed: false, .. });
        assert_eq!(counter.count(), 1);

        let outcome = registry.upsert(declared("A", json!({"visible": false})), true);
        assert_matches!(outcome, UpsertOutcome::Replaced { changed: true, .. });
        assert_eq!(counter.count(), 2);
    }

    #[test]
    fn no_notification_without_flag() {
        let (mut registry, counter) = registry();
        registry.upsert(declared("A", json!({})), false);
        registry.upsert(declared("A", json!({"visible": false})), false);
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn replace_keeps_bound_handle() {
        let (mut registry, _) = registry();
        registry.upsert(declared("A", json!({})), false);
        assert!(registry.bind_handle(&"A".into(), NativeHandle::new(1)));

        registry.upsert(declared("A", json!({"opacity": 0.5})), false);
        assert_eq!(registry.handle(&"A".into()), Some(NativeHandle::new(1)));
    }

    #[test]
    fn replacing_pending_removal_reports_stale_handle() {
        let (mut registry, _) = registry();
        registry.upsert(declared("A", json!({})).with_handle(NativeHandle::new(3)), false);
        let removal = registry.get(&"A".into()).expect("exists").to_removal();
        registry.upsert(removal, false);

        let outcome = registry.upsert(declared("A", json!({})), false);
        assert!(outcome.is_change());
        assert_eq!(outcome.released_handle(), Some(NativeHandle::new(3)));
        assert_eq!(registry.handle(&"A".into()), None);
    }

    #[test]
    fn handle_lookup_of_missing_entry() {
        let (mut registry, _) = registry();
        assert!(!registry.bind_handle(&"missing".into(), NativeHandle::new(1)));
        assert_eq!(registry.handle(&"missing".into()), None);
        assert_matches!(registry.lookup(&"missing".into()), Err(SyncError::NotFound(_)));
    }

    #[test]
    fn overlay_update() {
        let (mut registry, counter) = registry();
        registry.upsert(declared("A", json!({"visible": true, "name": "a"})), false);

        let outcome = registry.update_overlay(&"A".into(), &props(json!({"visible": false})), true);
        assert!(outcome.is_change());
        assert_eq!(counter.count(), 1);

        let entry = registry.get(&"A".into()).expect("exists");
        assert_eq!(entry.props().get("visible"), Some(&json!(false)));
        assert_eq!(entry.props().get("name"), Some(&json!("a")));
        assert_eq!(entry.overlay().get("visible"), Some(&json!(false)));
        assert_eq!(entry.overlay().len(), 1);

        // Same value again changes nothing.
        registry.update_overlay(&"A".into(), &props(json!({"visible": false})), true);
        assert_eq!(counter.count(), 1);

        assert_matches!(
            registry.update_overlay(&"B".into(), &props(json!({"visible": false})), true),
            UpsertOutcome::Ignored
        );
    }

    #[test]
    fn declared_overlay_is_applied_on_creation() {
        let entry = LayerEntry::declared(
            "A".into(),
            DeclaredNode::layer(LayerKind::Tile).with_prop("visible", true),
            props(json!({"visible": false})),
        );
        assert_eq!(entry.props().get("visible"), Some(&json!(false)));
        assert_eq!(entry.node().id, Some(LayerId::from("A")));
        assert_eq!(entry.kind(), Some(LayerKind::Tile));
    }
}
