use geojson::{Feature, FeatureCollection};
use rayon::prelude::*;
use std::sync::Arc;

use super::builder::feature_ring;

/// Geographic bounding box in degrees
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BBox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Bounds of a ring; `None` for an empty ring
    pub fn of_ring(ring: &[(f64, f64)]) -> Option<Self> {
        let (&(lon, lat), rest) = ring.split_first()?;
        Some(rest.iter().fold(Self::new(lon, lat, lon, lat), |b, &(lon, lat)| {
            Self::new(
                b.min_lon.min(lon),
                b.min_lat.min(lat),
                b.max_lon.max(lon),
                b.max_lat.max(lat),
            )
        }))
    }

    /// Bounds of a feature's exterior ring, if it is a polygon
    pub fn of_feature(feature: &Feature) -> Option<Self> {
        feature_ring(feature).as_deref().and_then(Self::of_ring)
    }

    /// Overlap test; touching edges count as intersecting
    #[inline(always)]
    pub fn intersects(&self, other: &BBox) -> bool {
        self.min_lon <= other.max_lon
            && other.min_lon <= self.max_lon
            && self.min_lat <= other.max_lat
            && other.min_lat <= self.max_lat
    }

    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }
}

/// Features of `collection` whose bounds intersect `bbox`, in input order
pub fn filter_features(collection: &FeatureCollection, bbox: &BBox) -> FeatureCollection {
    let features: Vec<Feature> = collection
        .features
        .par_iter()
        .filter(|f| BBox::of_feature(f).is_some_and(|b| bbox.intersects(&b)))
        .cloned()
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Viewport-scoped view of a feature collection.
/// Implementations may memoize; a repeated query for an unchanged
/// collection must yield the same result.
pub trait ViewportReducer: Send {
    fn reduce(&mut self, collection: &FeatureCollection, bbox: BBox) -> Arc<FeatureCollection>;

    /// Drop memoized results, e.g. after the collection was rebuilt
    fn invalidate(&mut self);
}

/// Memo of the most recent query only, keyed by exact bbox equality
#[derive(Default)]
pub struct SingleSlotCache {
    slot: Option<(BBox, Arc<FeatureCollection>)>,
}

impl SingleSlotCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached_bbox(&self) -> Option<BBox> {
        self.slot.as_ref().map(|(bbox, _)| *bbox)
    }
}

impl ViewportReducer for SingleSlotCache {
    fn reduce(&mut self, collection: &FeatureCollection, bbox: BBox) -> Arc<FeatureCollection> {
        if let Some((cached, reduced)) = &self.slot {
            if *cached == bbox {
                return Arc::clone(reduced);
            }
        }

        let reduced = Arc::new(filter_features(collection, &bbox));
        log::debug!(
            "viewport {:?}: {} of {} features",
            bbox,
            reduced.features.len(),
            collection.features.len()
        );
        self.slot = Some((bbox, Arc::clone(&reduced)));
        reduced
    }

    fn invalidate(&mut self) {
        self.slot = None;
    }
}
