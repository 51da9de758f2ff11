//! Plain value types shared by the `cartosync` crate: layer properties, layer ids, coordinate
//! system definitions and scene snapshots.
//!
//! Nothing here references live map objects, so every type can be freely cloned, compared and
//! serialized.

pub mod cartesian;
pub mod error;
mod layer_id;
pub mod projection;
pub mod props;
pub mod snapshot;

pub use layer_id::LayerId;
pub use projection::ProjectionDefinition;
pub use props::Props;
pub use snapshot::{Snapshot, SnapshotLayer, SnapshotView};
