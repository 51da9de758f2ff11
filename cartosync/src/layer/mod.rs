//! Declarative description of map layers, as produced by the host UI tree on every pass.

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use cartosync_types::{LayerId, Props};
use serde_json::Value;

use crate::source::SourceRef;

/// Kind of a map layer. Determines how the rendering engine draws the layer source.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LayerKind {
    /// Layer drawing tiled images.
    Tile,
    /// Layer drawing single images covering the view.
    Image,
    /// Layer drawing vector features.
    Vector,
}

/// Discriminant of a node in the host tree.
///
/// Only [`NodeKind::Layer`] nodes are handled by the layer reconciler. Other nodes are managed
/// elsewhere and are skipped.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A map layer.
    Layer(LayerKind),
    /// A tool (toolbar button, scale line, popup...).
    Tool,
    /// A container grouping other nodes.
    Container,
    /// A custom coordinate system declaration.
    Projection,
}

/// One node of the host tree as seen by the map.
///
/// The node is regenerated on every evaluation pass of the host tree. The map never modifies the
/// nodes it receives; it stores clones of them in its registry.
#[derive(Clone)]
pub struct DeclaredNode {
    /// Layer id. Mandatory for layer nodes.
    pub id: Option<LayerId>,
    /// Node discriminant.
    pub kind: NodeKind,
    /// Render-time properties of the node.
    pub props: Props,
    /// Data source of the layer. Sources are compared by identity, never by value.
    pub source: Option<SourceRef>,
}

impl DeclaredNode {
    /// Creates a layer node of the given kind without id and properties.
    pub fn layer(kind: LayerKind) -> Self {
        Self::new(NodeKind::Layer(kind))
    }

    /// Creates a node of any kind.
    pub fn new(kind: NodeKind) -> Self {
        Self {
            id: None,
            kind,
            props: Props::new(),
            source: None,
        }
    }

    /// Sets the id of the node.
    pub fn with_id(mut self, id: impl Into<LayerId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets one property of the node.
    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key, value);
        self
    }

    /// Replaces all properties of the node.
    pub fn with_props(mut self, props: Props) -> Self {
        self.props = props;
        self
    }

    /// Sets the data source of the node.
    pub fn with_source(mut self, source: SourceRef) -> Self {
        self.source = Some(source);
        self
    }

    /// Layer kind, if this is a layer node.
    pub fn layer_kind(&self) -> Option<LayerKind> {
        match self.kind {
            NodeKind::Layer(kind) => Some(kind),
            _ => None,
        }
    }

    /// Returns true if both nodes reference the very same source object, or both have none.
    pub fn same_source(&self, other: &DeclaredNode) -> bool {
        match (&self.source, &other.source) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl Debug for DeclaredNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeclaredNode")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("props", &self.props)
            .field("source", &self.source.as_ref().map(|source| source.label()))
            .finish()
    }
}
