//! Error types used by the crate.

use cartosync_types::error::TypesError;
use cartosync_types::LayerId;
use thiserror::Error;

/// Cartosync error type.
///
/// Most of these errors are not returned to the caller of the map operations. Reconciliation
/// and registry updates log them and skip the offending item, so that one bad layer never
/// prevents the rest of the map from being updated.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No registry entry with the given id.
    #[error("element not found for id {0}")]
    NotFound(LayerId),
    /// A layer node or layer properties do not carry an id.
    #[error("unique id is mandatory")]
    MissingId,
    /// Source type name is not known to the source factory.
    #[error("unknown source type '{0}'")]
    UnknownSourceType(String),
    /// Source options cannot be used to construct a source.
    #[error("invalid options for source '{type_name}': {reason}")]
    InvalidSourceOptions {
        /// Source type name.
        type_name: String,
        /// What is wrong with the options.
        reason: String,
    },
    /// Coordinate system code is neither built in nor registered.
    #[error("unknown projection '{0}'")]
    UnknownProjection(String),
    /// Snapshot restore stopped before completion. Layers removed before the failure are not
    /// brought back.
    #[error("restore aborted while {stage}: {source}")]
    PartialRestore {
        /// Restore step that failed.
        stage: &'static str,
        /// Cause of the failure.
        #[source]
        source: Box<SyncError>,
    },
    /// Value type error.
    #[error(transparent)]
    Types(#[from] TypesError),
}
