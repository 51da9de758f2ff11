use std::collections::BTreeMap;

use super::Map;
use crate::engine::{ProjectionRegistry, RenderEngine};
use crate::source::{Feature, QueryRequest, UNKNOWN_FEATURE_TYPE};

impl<E: RenderEngine, P: ProjectionRegistry> Map<E, P> {
    /// Looks up features of all visible layers whose sources can be queried, and groups them by
    /// feature type id. Features without type are grouped under [`UNKNOWN_FEATURE_TYPE`].
    pub fn identify(&self, request: &QueryRequest) -> BTreeMap<String, Vec<Feature>> {
        let mut features: BTreeMap<String, Vec<Feature>> = BTreeMap::new();

        for entry in self.registry.iter() {
            if !entry.props().is_visible() {
                continue;
            }

            let Some(source) = entry.source() else {
                continue;
            };
            let Some(queryable) = source.queryable() else {
                continue;
            };

            let response = queryable.query(request);
            log::trace!(
                "Map {}: layer {} returned {} features",
                self.id,
                entry.id(),
                response.feature_count()
            );

            for type_response in response.feature_type_responses {
                let type_id = type_response
                    .type_id
                    .unwrap_or_else(|| UNKNOWN_FEATURE_TYPE.to_string());
                features
                    .entry(type_id)
                    .or_default()
                    .extend(type_response.features);
            }
        }

        features
    }
}
