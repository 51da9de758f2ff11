use ahash::{HashMap, HashMapExt};
use cartosync_types::LayerId;

use super::{NativeHandle, RenderEngine};
use crate::layer::LayerKind;
use crate::source::SourceRef;
use crate::view::MapView;

/// Kind of an object in the [`MemoryEngine`] scene graph.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ObjectKind {
    /// Group of other objects.
    Group,
    /// A layer.
    Layer(LayerKind),
}

struct SceneObject {
    kind: ObjectKind,
    tag: Option<LayerId>,
    source: Option<SourceRef>,
    parent: Option<NativeHandle>,
    children: Vec<NativeHandle>,
}

/// Rendering engine that keeps its scene graph in memory and draws nothing.
///
/// Useful for headless applications and tests: it behaves like a real engine with respect to
/// view handling, scene traversal, correlation tags and object lifetime.
pub struct MemoryEngine {
    view: MapView,
    objects: HashMap<NativeHandle, SceneObject>,
    root: Vec<NativeHandle>,
    next_id: u64,
}

impl MemoryEngine {
    /// Creates an engine with an empty scene and the default view.
    pub fn new() -> Self {
        Self {
            view: MapView::default(),
            objects: HashMap::new(),
            root: vec![],
            next_id: 1,
        }
    }

    /// Creates an engine with the given view.
    pub fn with_view(view: MapView) -> Self {
        Self {
            view,
            ..Self::new()
        }
    }

    /// Adds an untagged layer to the top level of the scene.
    pub fn add_layer(&mut self, kind: LayerKind, source: Option<SourceRef>) -> NativeHandle {
        self.insert(None, ObjectKind::Layer(kind), source)
    }

    /// Adds a layer tagged with the layer id, as the host does when it mounts a layer node.
    pub fn mount_layer(
        &mut self,
        id: impl Into<LayerId>,
        kind: LayerKind,
        source: Option<SourceRef>,
    ) -> NativeHandle {
        let handle = self.add_layer(kind, source);
        self.set_tag(handle, &id.into());
        handle
    }

    /// Adds an empty group to the top level of the scene.
    pub fn add_group(&mut self) -> NativeHandle {
        self.insert(None, ObjectKind::Group, None)
    }

    /// Adds a layer into a group. Returns `None` if `group` is not a group of this engine.
    pub fn add_layer_to(
        &mut self,
        group: NativeHandle,
        kind: LayerKind,
        source: Option<SourceRef>,
    ) -> Option<NativeHandle> {
        match self.objects.get(&group) {
            Some(object) if object.kind == ObjectKind::Group => {
                Some(self.insert(Some(group), ObjectKind::Layer(kind), source))
            }
            _ => None,
        }
    }

    /// Returns true if the object is part of the scene.
    pub fn contains(&self, handle: NativeHandle) -> bool {
        self.objects.contains_key(&handle)
    }

    /// Kind of the scene object.
    pub fn kind(&self, handle: NativeHandle) -> Option<ObjectKind> {
        self.objects.get(&handle).map(|object| object.kind)
    }

    /// Number of objects in the scene, groups included.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns true if the scene is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn insert(
        &mut self,
        parent: Option<NativeHandle>,
        kind: ObjectKind,
        source: Option<SourceRef>,
    ) -> NativeHandle {
        let handle = NativeHandle::new(self.next_id);
        self.next_id += 1;

        self.objects.insert(
            handle,
            SceneObject {
                kind,
                tag: None,
                source,
                parent,
                children: vec![],
            },
        );

        match parent.and_then(|parent| self.objects.get_mut(&parent)) {
            Some(parent) => parent.children.push(handle),
            None => self.root.push(handle),
        }

        handle
    }

    fn walk_from(
        &self,
        handles: &[NativeHandle],
        visitor: &mut dyn FnMut(NativeHandle) -> bool,
    ) -> bool {
        for handle in handles {
            if !visitor(*handle) {
                return false;
            }

            if let Some(object) = self.objects.get(handle) {
                if !self.walk_from(&object.children, visitor) {
                    return false;
                }
            }
        }

        true
    }

    fn remove_subtree(&mut self, handle: NativeHandle) {
        if let Some(object) = self.objects.remove(&handle) {
            for child in object.children {
                self.remove_subtree(child);
            }
        }
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderEngine for MemoryEngine {
    fn view(&self) -> &MapView {
        &self.view
    }

    fn set_view(&mut self, view: MapView) {
        self.view = view;
    }

    fn walk(&self, visitor: &mut dyn FnMut(NativeHandle) -> bool) {
        self.walk_from(&self.root, visitor);
    }

    fn tag(&self, handle: NativeHandle) -> Option<LayerId> {
        self.objects.get(&handle)?.tag.clone()
    }

    fn set_tag(&mut self, handle: NativeHandle, id: &LayerId) {
        match self.objects.get_mut(&handle) {
            Some(object) => object.tag = Some(id.clone()),
            None => log::warn!("Cannot tag object {handle:?}: it is not in the scene"),
        }
    }

    fn source(&self, handle: NativeHandle) -> Option<SourceRef> {
        self.objects.get(&handle)?.source.clone()
    }

    fn release(&mut self, handle: NativeHandle) {
        let parent = match self.objects.get(&handle) {
            Some(object) => object.parent,
            None => {
                log::warn!("Cannot release object {handle:?}: it is not in the scene");
                return;
            }
        };

        match parent {
            Some(parent) => {
                if let Some(parent) = self.objects.get_mut(&parent) {
                    parent.children.retain(|child| *child != handle);
                }
            }
            None => self.root.retain(|child| *child != handle),
        }

        self.remove_subtree(handle);
    }
}
