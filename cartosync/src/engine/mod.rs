//! Interfaces of the external collaborators the map is synchronized with: the rendering engine
//! that owns the scene graph and the registry of custom coordinate systems.

use cartosync_types::LayerId;

use crate::source::SourceRef;
use crate::view::MapView;

mod memory;
mod projection;

pub use memory::{MemoryEngine, ObjectKind};
pub use projection::{ProjectionRegistry, ProjectionStore};

/// Opaque reference to an object in the scene graph of a rendering engine.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeHandle(u64);

impl NativeHandle {
    /// Wraps a raw engine object id.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw engine object id.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Rendering engine owning the scene graph the layers are drawn with.
///
/// Scene objects are created by the engine (or by the host UI when it mounts a layer node), not
/// by the map. The map finds them by the correlation tag carrying the layer id.
pub trait RenderEngine {
    /// Current view of the engine.
    fn view(&self) -> &MapView;

    /// Replaces the view of the engine.
    fn set_view(&mut self, view: MapView);

    /// Visits every object of the scene graph, descending into groups, until `visitor` returns
    /// `false`.
    fn walk(&self, visitor: &mut dyn FnMut(NativeHandle) -> bool);

    /// Correlation tag of the scene object.
    fn tag(&self, handle: NativeHandle) -> Option<LayerId>;

    /// Attaches a correlation tag to the scene object.
    fn set_tag(&mut self, handle: NativeHandle, id: &LayerId);

    /// Source the scene object draws, if it is a layer.
    fn source(&self, handle: NativeHandle) -> Option<SourceRef>;

    /// Removes the scene object from the scene graph.
    fn release(&mut self, handle: NativeHandle);
}
