use std::any::Any;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{DescribeSource, Feature, QueryRequest, QueryResponse, QuerySource, Source};
use crate::error::SyncError;

pub(super) const LOCAL_VECTOR: &str = "LocalVector";

#[derive(Default, Serialize, Deserialize)]
struct LocalVectorOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(default)]
    features: Vec<Feature>,
}

/// Vector source keeping its features in memory.
///
/// Features can be added and removed while the source is in use by a layer. The source
/// describes itself with its current feature set, so a snapshot always contains the features the
/// source had at capture time.
pub struct LocalVectorSource {
    label: Option<String>,
    features: RwLock<Vec<Feature>>,
}

impl LocalVectorSource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self {
            label: None,
            features: RwLock::new(vec![]),
        }
    }

    /// Creates a source from JSON options: optional `label` and `features` list.
    pub fn from_options(options: &Value) -> Result<Self, SyncError> {
        let options = if options.is_null() {
            LocalVectorOptions::default()
        } else {
            LocalVectorOptions::deserialize(options).map_err(|err| {
                SyncError::InvalidSourceOptions {
                    type_name: LOCAL_VECTOR.to_string(),
                    reason: err.to_string(),
                }
            })?
        };

        Ok(Self {
            label: options.label,
            features: RwLock::new(options.features),
        })
    }

    /// Sets the label of the source.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Adds a feature to the source.
    pub fn add_feature(&self, feature: Feature) {
        self.features.write().push(feature);
    }

    /// Removes all features with the given id. Returns the number of removed features.
    pub fn remove_feature(&self, id: &str) -> usize {
        let mut features = self.features.write();
        let count = features.len();
        features.retain(|feature| feature.id.as_deref() != Some(id));
        count - features.len()
    }

    /// Removes all features.
    pub fn clear(&self) {
        self.features.write().clear();
    }

    /// Copy of the current feature set.
    pub fn features(&self) -> Vec<Feature> {
        self.features.read().clone()
    }
}

impl Default for LocalVectorSource {
    fn default() -> Self {
        Self::new()
    }
}

impl Source for LocalVectorSource {
    fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(LOCAL_VECTOR)
    }

    fn describe(&self) -> Option<&dyn DescribeSource> {
        Some(self)
    }

    fn queryable(&self) -> Option<&dyn QuerySource> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl DescribeSource for LocalVectorSource {
    fn type_name(&self) -> &str {
        LOCAL_VECTOR
    }

    fn options(&self) -> Value {
        let options = LocalVectorOptions {
            label: self.label.clone(),
            features: self.features(),
        };

        serde_json::to_value(options).unwrap_or_else(|err| {
            log::error!("Failed to serialize features of {}: {err}", self.label());
            Value::Null
        })
    }
}

impl QuerySource for LocalVectorSource {
    fn query(&self, request: &QueryRequest) -> QueryResponse {
        let features = self.features.read();
        let found = features
            .iter()
            .filter(|feature| request.extent.contains(&feature.position))
            .take(request.limit.unwrap_or(usize::MAX))
            .cloned();

        QueryResponse::from_features(found)
    }
}
