//! Cartosync keeps a declarative list of map layers in sync with the mutable scene graph of a
//! map rendering engine, and captures the whole visible scene into a portable [`Snapshot`].
//!
//! # Main components
//!
//! * [`Map`] owns one [`LayerRegistry`](map::LayerRegistry) together with the rendering
//!   [`engine`](engine::RenderEngine), the [coordinate system registry](engine::ProjectionRegistry)
//!   and a [`SourceFactory`](source::SourceFactory). It is configured with a [`MapBuilder`].
//! * On every pass of the UI tree the host calls [`Map::reconcile`] with the latest list of
//!   [`DeclaredNode`]s. The reconciler creates, updates and removes registry entries, while
//!   keeping property overrides applied with [`Map::update_layer_props`] and layers injected
//!   with [`Map::create_and_add_layer`].
//! * [`Map::resolve`] attaches a registry entry to the scene object the rendering engine created
//!   for it, found by its correlation tag.
//! * [`Map::capture`] and [`Map::restore`] turn the scene into a [`Snapshot`] and back.
//!
//! Everything runs synchronously in the caller's context. The only feedback channel is the
//! [`Messenger`], which asks the host to re-evaluate its tree. A messenger must not call back into
//! the map synchronously.

pub mod engine;
pub mod error;
pub mod layer;
pub mod map;
mod messenger;
pub mod source;
mod view;

#[cfg(test)]
pub(crate) mod tests;

pub use layer::{DeclaredNode, LayerKind, NodeKind};
pub use map::{Map, MapBuilder};
pub use messenger::Messenger;
pub use view::{MapView, BUILTIN_PROJECTIONS, WEB_MERCATOR, WGS84};

// Reexport cartosync_types
pub use cartosync_types;
pub use cartosync_types::{LayerId, Props, Snapshot};
