use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cartosync_types::Props;
use serde_json::{json, Value};

use crate::engine::MemoryEngine;
use crate::messenger::Messenger;
use crate::source::{DescribeSource, RemoteKind, RemoteSource, Source, SourceRef};
use crate::{DeclaredNode, LayerKind, Map, MapBuilder};

pub const OSM_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Source without any optional capability.
pub struct OpaqueSource;

impl Source for OpaqueSource {
    fn label(&self) -> &str {
        "opaque"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Source that describes itself but cannot be stored in a snapshot.
pub struct PrivateSource;

impl Source for PrivateSource {
    fn label(&self) -> &str {
        "private"
    }

    fn describe(&self) -> Option<&dyn DescribeSource> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl DescribeSource for PrivateSource {
    fn type_name(&self) -> &str {
        "Private"
    }

    fn options(&self) -> Value {
        Value::Null
    }

    fn is_serializable(&self) -> bool {
        false
    }
}

#[derive(Clone, Default)]
pub struct RefreshCounter(Arc<AtomicUsize>);

impl RefreshCounter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.0.store(0, Ordering::Relaxed);
    }
}

impl Messenger for RefreshCounter {
    fn request_refresh(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }
}

pub fn props(value: Value) -> Props {
    Props::try_from(value).expect("fixture props must be an object")
}

pub fn osm_source() -> SourceRef {
    Arc::new(RemoteSource::new(RemoteKind::Xyz, &json!({"url": OSM_URL})).expect("valid options"))
}

pub fn tile_node(id: &str, value: Value) -> DeclaredNode {
    DeclaredNode::layer(LayerKind::Tile)
        .with_id(id)
        .with_props(props(value))
}

pub fn test_map() -> (Map<MemoryEngine>, RefreshCounter) {
    let _ = env_logger::builder().is_test(true).try_init();

    let counter = RefreshCounter::default();
    let map = MapBuilder::new(MemoryEngine::new())
        .with_messenger(counter.clone())
        .build();
    (map, counter)
}
