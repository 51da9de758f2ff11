use cartosync_types::cartesian::Rect;
use cartosync_types::Props;
use serde::{Deserialize, Serialize};

use crate::view::MapView;

/// Feature type id used for features whose source does not report a type.
pub const UNKNOWN_FEATURE_TYPE: &str = "unknown";

/// A point feature returned by a source query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    /// Feature id, if known.
    #[serde(default)]
    pub id: Option<String>,
    /// Id of the feature type (layer name of a WMS/WFS service, for example).
    #[serde(default)]
    pub type_id: Option<String>,
    /// Position in the coordinate system of the source.
    pub position: [f64; 2],
    /// Feature attributes.
    #[serde(default)]
    pub props: Props,
}

impl Feature {
    /// Creates a feature without id, type and attributes.
    pub fn new(position: [f64; 2]) -> Self {
        Self {
            id: None,
            type_id: None,
            position,
            props: Props::new(),
        }
    }

    /// Sets the feature id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the feature type id.
    pub fn with_type(mut self, type_id: impl Into<String>) -> Self {
        self.type_id = Some(type_id.into());
        self
    }

    /// Sets the feature attributes.
    pub fn with_props(mut self, props: Props) -> Self {
        self.props = props;
        self
    }
}

/// Area to look for features in.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    /// Search extent in the request coordinate system.
    pub extent: Rect,
    /// Code of the coordinate system of the extent.
    pub projection_code: String,
    /// Maximum number of features per source.
    pub limit: Option<usize>,
}

impl QueryRequest {
    /// Creates a request for the given extent.
    pub fn new(extent: Rect, projection_code: impl Into<String>) -> Self {
        Self {
            extent,
            projection_code: projection_code.into(),
            limit: None,
        }
    }

    /// Creates a request around a map coordinate, e.g. a clicked point.
    ///
    /// The search area extends `tolerance_px` screen pixels to every side of the `position`,
    /// converted to map units with the view resolution.
    pub fn around(view: &MapView, position: [f64; 2], tolerance_px: f64) -> Self {
        Self::new(
            Rect::around(&position, tolerance_px * view.resolution()),
            view.projection_code(),
        )
    }

    /// Limits the number of features every source returns.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Features of one type returned by a query.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTypeResponse {
    /// Feature type id.
    pub type_id: Option<String>,
    /// Found features.
    pub features: Vec<Feature>,
}

/// Result of a source query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryResponse {
    /// Found features grouped by feature type.
    pub feature_type_responses: Vec<FeatureTypeResponse>,
}

impl QueryResponse {
    /// Response with no features.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Groups features by their type, keeping the order in which the types first appear.
    pub fn from_features(features: impl IntoIterator<Item = Feature>) -> Self {
        let mut feature_type_responses: Vec<FeatureTypeResponse> = vec![];
        for feature in features {
            match feature_type_responses
                .iter_mut()
                .find(|response| response.type_id == feature.type_id)
            {
                Some(response) => response.features.push(feature),
                None => feature_type_responses.push(FeatureTypeResponse {
                    type_id: feature.type_id.clone(),
                    features: vec![feature],
                }),
            }
        }

        Self {
            feature_type_responses,
        }
    }

    /// Total number of features in the response.
    pub fn feature_count(&self) -> usize {
        self.feature_type_responses
            .iter()
            .map(|response| response.features.len())
            .sum()
    }
}
