use super::Map;
use crate::engine::{ProjectionRegistry, ProjectionStore, RenderEngine};
use crate::messenger::Messenger;
use crate::source::SourceFactory;
use crate::view::MapView;

const DEFAULT_MAP_ID: &str = "map";

/// Convenience type to initialize a [Map].
///
/// ```ignore
/// use cartosync::engine::MemoryEngine;
/// use cartosync::MapBuilder;
///
/// let map = MapBuilder::new(MemoryEngine::new())
///     .with_id("main")
///     .with_center([260000.0, 6250000.0])
///     .with_zoom(8.0)
///     .build();
///
/// assert_eq!(map.view().zoom(), 8.0);
/// ```
pub struct MapBuilder<E: RenderEngine, P: ProjectionRegistry = ProjectionStore> {
    id: Option<String>,
    engine: E,
    projections: P,
    center: Option<[f64; 2]>,
    zoom: Option<f64>,
    projection_code: Option<String>,
    factory: Option<SourceFactory>,
    messenger: Option<Box<dyn Messenger>>,
}

impl<E: RenderEngine> MapBuilder<E> {
    /// Starts building a map drawn by the given engine, with an in-memory coordinate system
    /// registry.
    pub fn new(engine: E) -> Self {
        Self {
            id: None,
            engine,
            projections: ProjectionStore::new(),
            center: None,
            zoom: None,
            projection_code: None,
            factory: None,
            messenger: None,
        }
    }
}

impl<E: RenderEngine, P: ProjectionRegistry> MapBuilder<E, P> {
    /// Sets the id of the map instance. It is used to tell maps apart in the log output.
    ///
    /// Defaults to `map`.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the messenger notified when the host tree should be evaluated again.
    pub fn with_messenger(mut self, messenger: impl Messenger + 'static) -> Self {
        self.messenger = Some(Box::new(messenger));
        self
    }

    /// Sets the center of the view, in the view coordinate system.
    ///
    /// Defaults to the center of the engine view.
    pub fn with_center(mut self, center: [f64; 2]) -> Self {
        self.center = Some(center);
        self
    }

    /// Sets the zoom level of the view.
    ///
    /// Defaults to the zoom level of the engine view.
    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = Some(zoom);
        self
    }

    /// Sets the coordinate system of the view.
    ///
    /// Defaults to the coordinate system of the engine view.
    pub fn with_projection_code(mut self, code: impl Into<String>) -> Self {
        self.projection_code = Some(code.into());
        self
    }

    /// Sets center, zoom and coordinate system at once.
    pub fn with_view(self, view: &MapView) -> Self {
        self.with_center(view.center())
            .with_zoom(view.zoom())
            .with_projection_code(view.projection_code())
    }

    /// Replaces the custom coordinate system registry.
    pub fn with_projection_registry<Q: ProjectionRegistry>(self, projections: Q) -> MapBuilder<E, Q> {
        MapBuilder {
            id: self.id,
            engine: self.engine,
            projections,
            center: self.center,
            zoom: self.zoom,
            projection_code: self.projection_code,
            factory: self.factory,
            messenger: self.messenger,
        }
    }

    /// Sets the factory used to construct layer sources. Defaults to
    /// [`SourceFactory::well_known`].
    pub fn with_source_factory(mut self, factory: SourceFactory) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Consumes the builder and creates the map.
    pub fn build(self) -> Map<E, P> {
        let Self {
            id,
            mut engine,
            projections,
            center,
            zoom,
            projection_code,
            factory,
            messenger,
        } = self;

        if center.is_some() || zoom.is_some() || projection_code.is_some() {
            let current = engine.view();
            let view = MapView::new(
                center.unwrap_or_else(|| current.center()),
                zoom.unwrap_or_else(|| current.zoom()),
                projection_code.unwrap_or_else(|| current.projection_code().to_string()),
            );

            if !projections.is_known(view.projection_code()) {
                log::warn!(
                    "Map view uses projection {} that is not registered",
                    view.projection_code()
                );
            }

            engine.set_view(view);
        }

        let id = id.unwrap_or_else(|| DEFAULT_MAP_ID.to_string());
        log::debug!("Creating map {id}");

        Map::new(
            id,
            engine,
            projections,
            factory.unwrap_or_default(),
            messenger,
        )
    }
}
