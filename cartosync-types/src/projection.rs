use serde::{Deserialize, Serialize};

use crate::cartesian::Rect;

/// Definition of a custom coordinate system, as registered by its code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionDefinition {
    /// Code of the coordinate system, e.g. `EPSG:2154`.
    pub code: String,
    /// Human readable name.
    #[serde(default)]
    pub name: Option<String>,
    /// Well-known-text definition of the coordinate system.
    pub wkt_definition: String,
    /// Area of validity in longitude/latitude degrees.
    #[serde(default)]
    pub valid_bounds: Option<Rect>,
    /// Free form remarks.
    #[serde(default)]
    pub remarks: Option<String>,
}

impl ProjectionDefinition {
    /// Creates a definition with only a code and a WKT string.
    pub fn new(code: impl Into<String>, wkt_definition: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: None,
            wkt_definition: wkt_definition.into(),
            valid_bounds: None,
            remarks: None,
        }
    }

    /// Sets the name of the coordinate system.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the area of validity.
    pub fn with_valid_bounds(mut self, bounds: Rect) -> Self {
        self.valid_bounds = Some(bounds);
        self
    }

    /// Sets the remarks.
    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = Some(remarks.into());
        self
    }
}
