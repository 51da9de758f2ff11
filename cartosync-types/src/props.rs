//! Layer properties.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TypesError;
use crate::LayerId;

/// Property holding the layer source. Sources are live objects and never stored in [`Props`].
pub const SOURCE_KEY: &str = "source";
/// Property holding nested declarative content.
pub const CHILDREN_KEY: &str = "children";
/// Property holding the layer id.
pub const UID_KEY: &str = "uid";
/// Property controlling layer visibility.
pub const VISIBLE_KEY: &str = "visible";

/// Keys that never take part in property comparison and are not stored in snapshots.
pub const VOLATILE_KEYS: [&str; 2] = [SOURCE_KEY, CHILDREN_KEY];

/// A set of named layer properties.
///
/// Values are plain JSON data, so two property sets can be compared structurally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Props(Map<String, Value>);

impl Props {
    /// Creates an empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value of the property.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Sets the property, returning the previous value if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Removes the property.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Builder-style version of [`Props::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Returns true if the property is set.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no properties are set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over property names and values.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> + '_ {
        self.0.iter()
    }

    /// Copies every property of `patch` into this set. Properties of `patch` replace existing ones.
    pub fn merge(&mut self, patch: &Props) {
        for (key, value) in &patch.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Returns a copy of this set with `overlay` merged on top of it.
    pub fn merged(&self, overlay: &Props) -> Props {
        let mut result = self.clone();
        result.merge(overlay);
        result
    }

    /// Returns a copy of this set without the given properties.
    pub fn without(&self, keys: &[&str]) -> Props {
        let mut result = self.clone();
        for key in keys {
            result.0.remove(*key);
        }
        result
    }

    /// Deep comparison of two property sets skipping the given keys.
    pub fn eq_except(&self, other: &Props, ignored: &[&str]) -> bool {
        let relevant = |key: &str| !ignored.contains(&key);

        self.0
            .iter()
            .filter(|(key, _)| relevant(key.as_str()))
            .all(|(key, value)| other.0.get(key) == Some(value))
            && other
                .0
                .keys()
                .filter(|key| relevant(key.as_str()))
                .all(|key| self.0.contains_key(key))
    }

    /// Value of the `uid` property, if it is a string or a number.
    pub fn uid(&self) -> Option<LayerId> {
        match self.0.get(UID_KEY)? {
            Value::String(s) => Some(LayerId::new(s.as_str())),
            Value::Number(n) => Some(LayerId::new(n.to_string())),
            _ => None,
        }
    }

    /// A layer is visible unless its `visible` property is explicitly `false`.
    pub fn is_visible(&self) -> bool {
        !matches!(self.0.get(VISIBLE_KEY), Some(Value::Bool(false)))
    }
}

impl TryFrom<Value> for Props {
    type Error = TypesError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::default()),
            other => Err(TypesError::NotAnObject(other.to_string())),
        }
    }
}

impl From<Props> for Value {
    fn from(value: Props) -> Self {
        Value::Object(value.0)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Props {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}
