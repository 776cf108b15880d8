//! Feature selection and highlight geometry

use std::collections::BTreeSet;

use mapquery_core::models::{Crs, Feature, FeatureId, Geometry};
use mapquery_geo::reproject_geometry;
use tracing::warn;

/// Identifiers of the selected features of the displayed layer.
///
/// Ids that do not match a feature on the shown page are kept but resolve
/// to nothing, so they highlight again when their page comes back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: BTreeSet<FeatureId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or remove a single id
    pub fn select_one(&mut self, id: FeatureId, selected: bool) {
        if selected {
            self.ids.insert(id);
        } else {
            self.ids.remove(&id);
        }
    }

    /// Replace the whole set with `ids`, or empty it when `selected` is false
    pub fn select_many(&mut self, ids: impl IntoIterator<Item = FeatureId>, selected: bool) {
        self.ids.clear();
        if selected {
            self.ids.extend(ids);
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: &FeatureId) -> bool {
        self.ids.contains(id)
    }

    pub fn ids(&self) -> Vec<FeatureId> {
        self.ids.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Selected features among `displayed`, in display order
    pub fn resolve<'a>(&self, displayed: &'a [Feature]) -> Vec<&'a Feature> {
        if self.ids.is_empty() {
            return Vec::new();
        }
        displayed
            .iter()
            .filter(|feature| feature.key().is_some_and(|key| self.ids.contains(&key)))
            .collect()
    }

    /// Highlight geometries for the selected features, in view coordinates.
    ///
    /// Features without a readable geometry, or whose geometry cannot be
    /// reprojected, are skipped.
    pub fn highlight_geometries(
        &self,
        displayed: &[Feature],
        data_crs: &Crs,
        view_crs: &Crs,
    ) -> Vec<Geometry> {
        self.resolve(displayed)
            .into_iter()
            .filter_map(|feature| {
                let geometry = feature.parsed_geometry()?;
                match reproject_geometry(&geometry, data_crs, view_crs) {
                    Ok(projected) => Some(projected),
                    Err(e) => {
                        warn!(feature = ?feature.key(), error = %e, "Cannot highlight feature");
                        None
                    }
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn feature(id: i64) -> Feature {
        Feature::new(Some(id.into()), Some(Geometry::point(id as f64, 0.0)), BTreeMap::new())
    }

    #[test]
    fn test_select_one_toggles() {
        let mut selection = SelectionSet::new();
        selection.select_one(FeatureId::Number(1), true);
        selection.select_one(FeatureId::Number(2), true);
        selection.select_one(FeatureId::Number(1), false);

        assert_eq!(selection.ids(), vec![FeatureId::Number(2)]);
    }

    #[test]
    fn test_select_many_replaces_and_clears() {
        let mut selection = SelectionSet::new();
        selection.select_one(FeatureId::Number(9), true);
        selection.select_many(vec![FeatureId::Number(1), FeatureId::Number(2)], true);
        assert_eq!(selection.len(), 2);
        assert!(!selection.contains(&FeatureId::Number(9)));

        selection.select_many(vec![FeatureId::Number(1)], false);
        assert!(selection.is_empty());
    }

    #[test]
    fn test_stale_ids_resolve_to_nothing() {
        let mut selection = SelectionSet::new();
        selection.select_many(vec![FeatureId::Number(1), FeatureId::Number(42)], true);
        let displayed = vec![feature(1), feature(2)];

        let resolved = selection.resolve(&displayed);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].key(), Some(FeatureId::Number(1)));
    }

    #[test]
    fn test_resolve_uses_property_id_fallback() {
        let mut properties = BTreeMap::new();
        properties.insert("id".to_string(), json!("parcel-7"));
        let displayed = vec![Feature::new(None, None, properties)];

        let mut selection = SelectionSet::new();
        selection.select_one("parcel-7".into(), true);
        assert_eq!(selection.resolve(&displayed).len(), 1);
    }

    #[test]
    fn test_highlight_geometries_are_reprojected() {
        let mut selection = SelectionSet::new();
        selection.select_one(FeatureId::Number(1), true);
        let displayed = vec![feature(1), Feature::new(Some(FeatureId::Number(2)), None, BTreeMap::new())];

        let geometries =
            selection.highlight_geometries(&displayed, &Crs::wgs84(), &Crs::web_mercator());
        assert_eq!(geometries.len(), 1);
        match &geometries[0] {
            Geometry::Point { coordinates } => assert!(coordinates[0] > 111_000.0),
            other => panic!("Expected Point, got {:?}", other),
        }
    }
}
