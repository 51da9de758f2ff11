//! Layer data sources and the probing of their optional capabilities.
//!
//! A source is an opaque object as far as the map is concerned. Some sources can describe
//! themselves (type name and construction options), which makes the layers using them part of a
//! [`Snapshot`](cartosync_types::Snapshot); some can answer feature queries. The map discovers
//! these capabilities at runtime with [`probe`] and [`Source::queryable`].

use std::any::Any;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use maybe_sync::{MaybeSend, MaybeSync};
use serde_json::Value;

mod factory;
mod local_vector;
mod query;
mod remote;

pub use factory::SourceFactory;
pub use local_vector::LocalVectorSource;
pub use query::{Feature, FeatureTypeResponse, QueryRequest, QueryResponse, UNKNOWN_FEATURE_TYPE};
pub use remote::{RemoteKind, RemoteSource};

/// Shared reference to a source. Layers, registry entries and scene objects all point to the
/// same source object.
pub type SourceRef = Arc<dyn Source>;

/// Data source of a layer.
pub trait Source: MaybeSend + MaybeSync {
    /// Human readable name of the source.
    fn label(&self) -> &str;

    /// Returns the description interface if the source supports it.
    fn describe(&self) -> Option<&dyn DescribeSource> {
        None
    }

    /// Returns the query interface if the source supports it.
    fn queryable(&self) -> Option<&dyn QuerySource> {
        None
    }

    /// Sources are stored as trait objects. This method can be used to convert the trait object
    /// into the concrete type.
    fn as_any(&self) -> &dyn Any;
}

impl Debug for dyn Source {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Source")
            .field("label", &self.label())
            .field(
                "type_name",
                &self.describe().map(|description| description.type_name()),
            )
            .finish()
    }
}

/// A source that can tell how to construct an equal source again.
pub trait DescribeSource {
    /// Name of the source type, as known to the [`SourceFactory`].
    fn type_name(&self) -> &str;
    /// Options to pass to the source type constructor.
    fn options(&self) -> Value;
    /// Whether the description is complete enough to store the source in a snapshot.
    fn is_serializable(&self) -> bool {
        true
    }
}

/// A source that can look up features.
pub trait QuerySource {
    /// Returns the features matching the request.
    fn query(&self, request: &QueryRequest) -> QueryResponse;
}

/// Result of [`probe`].
#[derive(Debug, Clone, PartialEq)]
pub enum Capability {
    /// The layer has no source.
    Absent,
    /// The source cannot describe itself.
    Opaque,
    /// The source describes itself but refuses to be serialized.
    NotSerializable {
        /// Source type name.
        type_name: String,
    },
    /// The source can be stored in a snapshot.
    Serializable(SourceDescriptor),
}

/// Type name and options of a serializable source.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDescriptor {
    /// Source type name.
    pub type_name: String,
    /// Construction options.
    pub options: Value,
}

impl Capability {
    /// Returns the descriptor if the source is serializable.
    pub fn into_descriptor(self) -> Option<SourceDescriptor> {
        match self {
            Capability::Serializable(descriptor) => Some(descriptor),
            _ => None,
        }
    }
}

/// Checks whether the source exposes its type name and options and is serializable.
pub fn probe(source: Option<&SourceRef>) -> Capability {
    let Some(source) = source else {
        return Capability::Absent;
    };

    let Some(description) = source.describe() else {
        return Capability::Opaque;
    };

    if !description.is_serializable() {
        return Capability::NotSerializable {
            type_name: description.type_name().to_string(),
        };
    }

    Capability::Serializable(SourceDescriptor {
        type_name: description.type_name().to_string(),
        options: description.options(),
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::tests::{OpaqueSource, PrivateSource};

    #[test]
    fn probe_capabilities() {
        assert_eq!(probe(None), Capability::Absent);

        let opaque: SourceRef = Arc::new(OpaqueSource);
        assert_eq!(probe(Some(&opaque)), Capability::Opaque);

        let private: SourceRef = Arc::new(PrivateSource);
        assert_matches!(
            probe(Some(&private)),
            Capability::NotSerializable { type_name } if type_name == "Private"
        );

        let remote: SourceRef = Arc::new(
            RemoteSource::new(RemoteKind::Xyz, &json!({"url": "https://tiles/{z}/{x}/{y}.png"}))
                .expect("valid options"),
        );
        let descriptor = probe(Some(&remote)).into_descriptor().expect("serializable");
        assert_eq!(descriptor.type_name, "Xyz");
        assert_eq!(descriptor.options, json!({"url": "https://tiles/{z}/{x}/{y}.png"}));
    }

    #[test]
    fn debug_shows_label_and_type() {
        let opaque: SourceRef = Arc::new(OpaqueSource);
        assert_eq!(
            format!("{opaque:?}"),
            r#"Source { label: "opaque", type_name: None }"#
        );

        let private: SourceRef = Arc::new(PrivateSource);
        assert_eq!(
            format!("{private:?}"),
            r#"Source { label: "private", type_name: Some("Private") }"#
        );

        let result: Result<SourceRef, ()> = Ok(private);
        assert_matches!(result, Ok(source) if source.label() == "private");
    }

    #[test]
    fn only_serializable_sources_have_descriptors() {
        let private: SourceRef = Arc::new(PrivateSource);
        assert!(probe(Some(&private)).into_descriptor().is_none());
        assert!(probe(None).into_descriptor().is_none());
    }
}
