//! Portable description of a whole map scene.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::TypesError;
use crate::projection::ProjectionDefinition;
use crate::props::Props;

/// Serializable description of a map: its view, custom coordinate systems and layers.
///
/// A snapshot holds no references to live objects. Order of `projections` and `layers` is
/// significant and is preserved through serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Map view.
    pub view: SnapshotView,
    /// Custom coordinate systems in registration order.
    #[serde(default, deserialize_with = "skip_invalid")]
    pub projections: Vec<ProjectionDefinition>,
    /// Layers in map order.
    #[serde(default, deserialize_with = "skip_invalid")]
    pub layers: Vec<SnapshotLayer>,
}

/// View part of a [`Snapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotView {
    /// Center of the view in the view coordinate system.
    pub center: [f64; 2],
    /// Zoom level.
    pub zoom: f64,
    /// Code of the view coordinate system.
    pub projection_code: String,
}

/// Layer part of a [`Snapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotLayer {
    /// Name of the source type used to reconstruct the layer source.
    pub source_type_name: String,
    /// Options the source is constructed with.
    pub source_options: Value,
    /// Layer properties without the `source` and `children` entries.
    #[serde(default)]
    pub props: Props,
}

impl Snapshot {
    /// Serializes the snapshot into a JSON string.
    pub fn to_json(&self) -> Result<String, TypesError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a snapshot from a JSON string.
    ///
    /// Coordinate systems and layers that cannot be parsed are logged and left out; only a
    /// malformed document or view is an error.
    pub fn from_json(json: &str) -> Result<Self, TypesError> {
        Ok(serde_json::from_str(json)?)
    }
}

fn skip_invalid<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = Vec::<Value>::deserialize(deserializer)?
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match T::deserialize(value) {
            Ok(item) => Some(item),
            Err(err) => {
                log::warn!("Skipping snapshot item {index}: {err}");
                None
            }
        })
        .collect();

    Ok(items)
}
