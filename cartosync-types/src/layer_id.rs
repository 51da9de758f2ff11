use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Stable identifier of a logical layer.
///
/// Ids are supplied by whoever declares or injects the layer and must be unique within one map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(String);

impl LayerId {
    /// Creates a new id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// String representation of the id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for LayerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LayerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for LayerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for LayerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
