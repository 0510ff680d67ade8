use geojson::FeatureCollection;
use std::sync::Arc;

use crate::data::{Cell, CellPoints, DataIndex, Record};
use crate::diagnostics::DiagnosticSink;
use crate::encoding::EncodingResolver;
use crate::map::{self, BBox, SingleSlotCache, ViewportReducer};
use crate::overrides::OverrideLayer;
use crate::scale::ScaleSet;
use crate::source::{GridOptions, Source};

/// All state binding sources to one cell grid.
///
/// Calls are synchronous and unlocked: writers (data rebuilds, override
/// edits) must not run concurrently with a renderer reading from here.
pub struct GeoGrid {
    options: GridOptions,
    sources: Vec<Source>,
    index: DataIndex,
    scales: ScaleSet,
    overrides: OverrideLayer,
    cells: Vec<Cell>,
    geojson: Option<FeatureCollection>,
    viewport: Box<dyn ViewportReducer>,
}

impl GeoGrid {
    pub fn new(options: GridOptions, sources: Vec<Source>) -> Self {
        Self::with_reducer(options, sources, Box::new(SingleSlotCache::new()))
    }

    /// Use a custom viewport memo instead of the single-slot default
    pub fn with_reducer(options: GridOptions, sources: Vec<Source>, viewport: Box<dyn ViewportReducer>) -> Self {
        Self {
            options,
            sources,
            index: DataIndex::default(),
            scales: ScaleSet::default(),
            overrides: OverrideLayer::default(),
            cells: Vec::new(),
            geojson: None,
            viewport,
        }
    }

    pub fn options(&self) -> &GridOptions {
        &self.options
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// Replace the sources; call [`GeoGrid::cache_data`] afterwards
    pub fn set_sources(&mut self, sources: Vec<Source>) {
        self.sources = sources;
    }

    /// Rebuild the record index from the current sources. Overrides survive.
    /// Returns the cells found in the data for grid generation.
    pub fn cache_data(&mut self, sink: &mut dyn DiagnosticSink) -> Option<CellPoints> {
        let (index, points) = DataIndex::index(&self.sources, sink);
        self.index = index;
        points
    }

    pub fn set_cells(&mut self, cells: Vec<Cell>) {
        self.cells = cells;
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Recompute scales and rebuild the feature collection
    pub fn produce_geojson(&mut self) -> &FeatureCollection {
        let (scales, collection) = map::build(&self.cells, &self.sources, &self.index);
        self.scales = scales;
        // The memo refers to the previous collection
        self.viewport.invalidate();
        self.geojson.insert(collection)
    }

    pub fn geojson(&self) -> Option<&FeatureCollection> {
        self.geojson.as_ref()
    }

    /// Features intersecting `bbox`; `None` until a collection was produced
    pub fn reduce_geojson(&mut self, bbox: BBox) -> Option<Arc<FeatureCollection>> {
        let collection = self.geojson.as_ref()?;
        Some(self.viewport.reduce(collection, bbox))
    }

    pub fn scales(&self) -> &ScaleSet {
        &self.scales
    }

    /// Recompute scales without rebuilding the feature collection
    pub fn recompute_scales(&mut self) -> &ScaleSet {
        self.scales = ScaleSet::recompute(&self.sources, &self.index);
        &self.scales
    }

    pub fn overrides(&self) -> &OverrideLayer {
        &self.overrides
    }

    pub fn overrides_mut(&mut self) -> &mut OverrideLayer {
        &mut self.overrides
    }

    /// Draw-time accessors for colors, sizes and contours
    pub fn resolver(&self) -> EncodingResolver<'_> {
        EncodingResolver::new(&self.sources, &self.scales, &self.overrides, &self.options)
    }

    pub fn index(&self) -> &DataIndex {
        &self.index
    }

    pub fn keys_for(&self, source_index: usize) -> &[String] {
        self.index.keys_for(source_index)
    }

    pub fn properties_for(&self, source_index: usize, id: &str) -> Record {
        self.index.properties_for(source_index, id)
    }

    pub fn raw_record_for(&self, source_index: usize, id: &str) -> Option<&Record> {
        self.index.raw_record_for(source_index, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::data::{records, Payload};
    use crate::diagnostics::Diagnostic;
    use crate::map::{feature_id, feature_source};
    use serde_json::json;

    fn grid() -> GeoGrid {
        let source = Source::new(Payload::new(records(json!([
            {"id": "a", "v": 0},
            {"id": "b", "v": 10},
        ]))))
        .with_color_key("v");
        let mut grid = GeoGrid::new(GridOptions::default(), vec![source]);
        let mut sink: Vec<Diagnostic> = Vec::new();
        grid.cache_data(&mut sink);
        grid.set_cells(vec![
            Cell::new("a", vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]),
            Cell::new("b", vec![(20.0, 20.0), (21.0, 20.0), (21.0, 21.0), (20.0, 21.0)]),
        ]);
        grid
    }

    #[test]
    fn test_reduce_before_produce_is_none() {
        let mut grid = grid();
        assert!(grid.reduce_geojson(BBox::new(0.0, 0.0, 1.0, 1.0)).is_none());
    }

    #[test]
    fn test_produce_then_style_features() {
        let mut grid = grid();
        assert_eq!(grid.produce_geojson().features.len(), 2);

        let fc = grid.geojson().unwrap().clone();
        let resolver = grid.resolver();
        let colors: Vec<Color> = fc
            .features
            .iter()
            .map(|f| {
                let id = feature_id(f).unwrap();
                let props = f.properties.clone().unwrap_or_default();
                resolver.color(feature_source(f).unwrap(), id.as_str(), &props)
            })
            .collect();
        assert_eq!(colors, vec![Color::WHITE, Color::RED]);
    }

    #[test]
    fn test_overrides_survive_data_rebuild() {
        let mut grid = grid();
        grid.overrides_mut().set_color("a", Some(Color::rgb(1, 2, 3)));
        let mut sink: Vec<Diagnostic> = Vec::new();
        grid.cache_data(&mut sink);
        grid.produce_geojson();

        let props = grid.properties_for(0, "a");
        assert_eq!(grid.resolver().color(0, "a", &props), Color::rgb(1, 2, 3));

        grid.overrides_mut().reset_all();
        assert_eq!(grid.resolver().color(0, "a", &props), Color::WHITE);
    }

    #[test]
    fn test_viewport_memo_follows_bbox_and_rebuilds() {
        let mut grid = grid();
        grid.produce_geojson();
        let bbox = BBox::new(-1.0, -1.0, 2.0, 2.0);

        let first = grid.reduce_geojson(bbox).unwrap();
        let again = grid.reduce_geojson(bbox).unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(first.features.len(), 1);

        grid.produce_geojson();
        let rebuilt = grid.reduce_geojson(bbox).unwrap();
        assert!(!Arc::ptr_eq(&first, &rebuilt));
    }

    #[test]
    fn test_accessors_delegate_to_index() {
        let grid = grid();
        assert_eq!(grid.keys_for(0).len(), 2);
        assert_eq!(grid.raw_record_for(0, "b").unwrap().get("v"), Some(&json!(10)));
        assert!(grid.properties_for(0, "zzz").is_empty());
    }
}
