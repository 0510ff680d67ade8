use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};
use rayon::prelude::*;

use crate::data::{Cell, CellId, DataIndex, Record, Ring};
use crate::scale::ScaleSet;
use crate::source::Source;

/// Foreign member holding the index of the source a feature belongs to
pub const SOURCE_MEMBER: &str = "source";

fn make_feature(id: &CellId, ring: &[(f64, f64)], source_index: usize, properties: Record) -> Feature {
    let mut props = JsonObject::new();
    props.insert("id".to_string(), JsonValue::String(id.to_string()));
    props.extend(properties);

    let mut foreign = JsonObject::new();
    foreign.insert(SOURCE_MEMBER.to_string(), JsonValue::from(source_index));

    let exterior = ring.iter().map(|&(lon, lat)| vec![lon, lat]).collect();
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Polygon(vec![exterior]))),
        id: None,
        properties: Some(props),
        foreign_members: Some(foreign),
    }
}

/// Recompute scales, then emit one feature per (cell with vertices, source)
/// in cell order, then source order. Rings are copied unscaled: sizes are
/// applied at draw time so the collection never holds a stale scale.
pub fn build(cells: &[Cell], sources: &[Source], index: &DataIndex) -> (ScaleSet, FeatureCollection) {
    let scales = ScaleSet::recompute(sources, index);
    let source_count = sources.len();

    let features: Vec<Feature> = cells
        .par_iter()
        .filter_map(|cell| cell.vertices.as_ref().map(|ring| (&cell.id, ring)))
        .flat_map_iter(|(id, ring)| {
            (0..source_count).map(move |source_index| {
                make_feature(id, ring, source_index, index.properties_for(source_index, id.as_str()))
            })
        })
        .collect();

    log::debug!(
        "built {} features from {} cells x {} sources",
        features.len(),
        cells.len(),
        source_count
    );

    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };
    (scales, collection)
}

/// Source index stored on a feature by [`build`]
pub fn feature_source(feature: &Feature) -> Option<usize> {
    feature
        .foreign_members
        .as_ref()?
        .get(SOURCE_MEMBER)?
        .as_u64()
        .map(|n| n as usize)
}

/// Cell id of a feature, read from its `id` property
pub fn feature_id(feature: &Feature) -> Option<CellId> {
    feature.property("id").and_then(CellId::from_json)
}

/// Exterior ring of a polygon feature
pub fn feature_ring(feature: &Feature) -> Option<Ring> {
    match &feature.geometry.as_ref()?.value {
        Value::Polygon(rings) => rings
            .first()
            .map(|exterior| exterior.iter().map(|c| (c[0], c[1])).collect()),
        _ => None,
    }
}
