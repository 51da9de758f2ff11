use std::any::Any;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use cartosync_types::cartesian::Rect;
use serde::Deserialize;
use serde_json::Value;

use super::{DescribeSource, QueryRequest, QueryResponse, QuerySource, Source};
use crate::error::SyncError;
use crate::layer::LayerKind;

/// Well-known types of sources that load their data from a remote service.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RemoteKind {
    /// XYZ tile service.
    Xyz,
    /// Tiled WMS service.
    TileWms,
    /// Tiled ArcGIS REST map service.
    TileArcGisRest,
    /// Single image WMS service.
    ImageWms,
    /// A static georeferenced image.
    ImageStatic,
    /// Single image ArcGIS REST map service.
    ImageArcGisRest,
    /// Vector features loaded from a URL.
    ExternalVector,
    /// WFS feature service.
    Wfs,
    /// ArcGIS REST feature query service.
    QueryArcGisRest,
}

impl RemoteKind {
    /// All remote kinds.
    pub const ALL: [RemoteKind; 9] = [
        RemoteKind::Xyz,
        RemoteKind::TileWms,
        RemoteKind::TileArcGisRest,
        RemoteKind::ImageWms,
        RemoteKind::ImageStatic,
        RemoteKind::ImageArcGisRest,
        RemoteKind::ExternalVector,
        RemoteKind::Wfs,
        RemoteKind::QueryArcGisRest,
    ];

    /// Source type name as stored in snapshots.
    pub fn type_name(&self) -> &'static str {
        match self {
            RemoteKind::Xyz => "Xyz",
            RemoteKind::TileWms => "TileWms",
            RemoteKind::TileArcGisRest => "TileArcGISRest",
            RemoteKind::ImageWms => "ImageWms",
            RemoteKind::ImageStatic => "ImageStatic",
            RemoteKind::ImageArcGisRest => "ImageArcGISRest",
            RemoteKind::ExternalVector => "ExternalVector",
            RemoteKind::Wfs => "Wfs",
            RemoteKind::QueryArcGisRest => "QueryArcGISRest",
        }
    }

    /// Kind of the layer drawing this source.
    pub fn layer_kind(&self) -> LayerKind {
        match self {
            RemoteKind::Xyz | RemoteKind::TileWms | RemoteKind::TileArcGisRest => LayerKind::Tile,
            RemoteKind::ImageWms | RemoteKind::ImageStatic | RemoteKind::ImageArcGisRest => {
                LayerKind::Image
            }
            RemoteKind::ExternalVector | RemoteKind::Wfs | RemoteKind::QueryArcGisRest => {
                LayerKind::Vector
            }
        }
    }
}

impl Display for RemoteKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name())
    }
}

impl FromStr for RemoteKind {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.type_name() == s)
            .ok_or_else(|| SyncError::UnknownSourceType(s.to_string()))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteOptions {
    url: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    typename: Option<String>,
    #[serde(default)]
    image_extent: Option<Rect>,
}

/// Source reading its data from a remote service.
///
/// The source only keeps the service parameters; fetching the data is up to the rendering
/// engine. Construction options are stored verbatim, so the source can always be described and
/// rebuilt from a snapshot.
#[derive(Debug, Clone)]
pub struct RemoteSource {
    kind: RemoteKind,
    url: String,
    label: String,
    typename: Option<String>,
    image_extent: Option<Rect>,
    options: Value,
}

impl RemoteSource {
    /// Creates a new source from JSON options.
    ///
    /// Every remote source needs a `url`. `Wfs` sources also need a `typename`, and
    /// `ImageStatic` sources an `imageExtent`. The optional `label` defaults to the type name.
    pub fn new(kind: RemoteKind, options: &Value) -> Result<Self, SyncError> {
        let invalid = |reason: String| SyncError::InvalidSourceOptions {
            type_name: kind.type_name().to_string(),
            reason,
        };

        let parsed = RemoteOptions::deserialize(options).map_err(|err| invalid(err.to_string()))?;

        if kind == RemoteKind::Wfs && parsed.typename.is_none() {
            return Err(invalid("missing field `typename`".into()));
        }

        if kind == RemoteKind::ImageStatic && parsed.image_extent.is_none() {
            return Err(invalid("missing field `imageExtent`".into()));
        }

        Ok(Self {
            kind,
            url: parsed.url,
            label: parsed
                .label
                .unwrap_or_else(|| kind.type_name().to_string()),
            typename: parsed.typename,
            image_extent: parsed.image_extent,
            options: options.clone(),
        })
    }

    /// Type of the source.
    pub fn kind(&self) -> RemoteKind {
        self.kind
    }

    /// Service url.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Extent of a static image source.
    pub fn image_extent(&self) -> Option<Rect> {
        self.image_extent
    }

    /// Builds the GetFeature url of a WFS source for the given extent. Returns `None` for other
    /// source types.
    pub fn feature_url(&self, extent: &Rect, projection_code: &str) -> Option<String> {
        if self.kind != RemoteKind::Wfs {
            return None;
        }

        let typename = self.typename.as_deref()?;
        let bbox = extent
            .to_array()
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",");

        Some(format!(
            "{}?service=WFS&version=1.1.0&request=GetFeature&typename={typename}&outputFormat=application/json&srsname={projection_code}&bbox={bbox},{projection_code}",
            self.url
        ))
    }
}

impl Source for RemoteSource {
    fn label(&self) -> &str {
        &self.label
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

impl DescribeSource for RemoteSource {
    fn type_name(&self) -> &str {
        self.kind.type_name()
    }

    fn options(&self) -> Value {
        self.options.clone()
    }
}

impl QuerySource for RemoteSource {
    fn query(&self, request: &QueryRequest) -> QueryResponse {
        // Remote services are not contacted from here.
        log::trace!(
            "Source {} has no local features for {:?}",
            self.label,
            request.extent
        );
        QueryResponse::empty()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn type_names_round_trip() {
        for kind in RemoteKind::ALL {
            assert_eq!(kind.type_name().parse::<RemoteKind>().ok(), Some(kind));
        }
        assert_matches!(
            "Bing".parse::<RemoteKind>(),
            Err(SyncError::UnknownSourceType(name)) if name == "Bing"
        );
    }

    #[test]
    fn layer_kinds() {
        assert_eq!(RemoteKind::Xyz.layer_kind(), LayerKind::Tile);
        assert_eq!(RemoteKind::ImageStatic.layer_kind(), LayerKind::Image);
        assert_eq!(RemoteKind::Wfs.layer_kind(), LayerKind::Vector);
    }

    #[test]
    fn label_defaults_to_type_name() {
        let source = RemoteSource::new(RemoteKind::TileWms, &json!({"url": "https://wms"}))
            .expect("valid options");
        assert_eq!(source.label(), "TileWms");

        let source = RemoteSource::new(
            RemoteKind::TileWms,
            &json!({"url": "https://wms", "label": "States"}),
        )
        .expect("valid options");
        assert_eq!(source.label(), "States");
    }

    #[test]
    fn url_is_required() {
        assert_matches!(
            RemoteSource::new(RemoteKind::Xyz, &json!({"projection": "EPSG:3857"})),
            Err(SyncError::InvalidSourceOptions { type_name, .. }) if type_name == "Xyz"
        );
    }

    #[test]
    fn type_specific_options_are_required() {
        assert!(RemoteSource::new(RemoteKind::Wfs, &json!({"url": "https://wfs"})).is_err());
        assert!(RemoteSource::new(RemoteKind::ImageStatic, &json!({"url": "https://img"})).is_err());

        let image = RemoteSource::new(
            RemoteKind::ImageStatic,
            &json!({"url": "https://img", "imageExtent": [0, 0, 700000, 1300000]}),
        )
        .expect("valid options");
        assert_eq!(
            image.image_extent(),
            Some(Rect::new(0.0, 0.0, 700000.0, 1300000.0))
        );
    }

    #[test]
    fn options_are_kept_verbatim() {
        let options = json!({"url": "https://tiles", "projection": "EPSG:3857", "extra": [1, 2]});
        let source = RemoteSource::new(RemoteKind::Xyz, &options).expect("valid options");
        assert_eq!(source.options(), options);
        assert_eq!(source.type_name(), "Xyz");
        assert!(source.is_serializable());
    }

    #[test]
    fn wfs_feature_url() {
        let source = RemoteSource::new(
            RemoteKind::Wfs,
            &json!({"url": "https://ahocevar.com/geoserver/wfs", "typename": "topp:states"}),
        )
        .expect("valid options");

        let url = source
            .feature_url(&Rect::new(0.0, 1.0, 2.5, 3.0), "EPSG:3857")
            .expect("wfs source");
        assert_eq!(
            url,
            "https://ahocevar.com/geoserver/wfs?service=WFS&version=1.1.0&request=GetFeature&typename=topp:states&outputFormat=application/json&srsname=EPSG:3857&bbox=0,1,2.5,3,EPSG:3857"
        );

        let xyz = RemoteSource::new(RemoteKind::Xyz, &json!({"url": "https://tiles"}))
            .expect("valid options");
        assert!(xyz
            .feature_url(&Rect::new(0.0, 0.0, 1.0, 1.0), "EPSG:3857")
            .is_none());
    }

    #[test]
    fn query_has_no_local_features() {
        let source = RemoteSource::new(RemoteKind::ImageWms, &json!({"url": "https://wms"}))
            .expect("valid options");
        let response = source.query(&QueryRequest::new(
            Rect::new(0.0, 0.0, 1.0, 1.0),
            "EPSG:3857",
        ));
        assert_eq!(response.feature_count(), 0);
    }
}
