//! Terminal preview of bound cells.
//!
//! A small renderer over the draw-time accessors: each feature's ring is
//! resized by its relative size and stroked onto a braille canvas. Cells
//! with a contour width override above the shared default get a thick
//! stroke. Fill colors are not shown.

use geojson::FeatureCollection;

use crate::braille::BrailleCanvas;
use crate::data::Record;
use crate::grid::GeoGrid;
use crate::map::geometry::draw_ring;
use crate::map::{feature_id, feature_ring, feature_source, BBox};

/// Render `features` (usually a viewport reduction) framed by `bbox` onto a
/// `width` x `height` character canvas
pub fn render(grid: &GeoGrid, features: &FeatureCollection, bbox: &BBox, width: usize, height: usize) -> String {
    let mut canvas = BrailleCanvas::new(width, height);
    let resolver = grid.resolver();
    let default_width = resolver.options().contour_width;
    let empty = Record::new();

    let frame = padded(bbox);
    let sx = (canvas.pixel_width().saturating_sub(1)) as f64 / frame.width();
    let sy = (canvas.pixel_height().saturating_sub(1)) as f64 / frame.height();
    let to_dots = |(lon, lat): (f64, f64)| ((lon - frame.min_lon) * sx, (frame.max_lat - lat) * sy);

    for feature in &features.features {
        let (Some(id), Some(ring)) = (feature_id(feature), feature_ring(feature)) else {
            continue;
        };
        let source_index = feature_source(feature).unwrap_or(0);
        let properties = feature.properties.as_ref().unwrap_or(&empty);

        let sized = resolver.sized_ring(source_index, id.as_str(), properties, &ring);
        let dots: Vec<(f64, f64)> = sized.iter().copied().map(to_dots).collect();
        let thick = resolver
            .contour_width(id.as_str(), false)
            .is_some_and(|w| w > default_width);
        draw_ring(&mut canvas, &dots, thick);
    }

    canvas.to_string()
}

/// Widen a zero-width or zero-height frame to a unit span about its center
fn padded(bbox: &BBox) -> BBox {
    let widen = |lo: f64, hi: f64| {
        if hi - lo > 0.0 {
            (lo, hi)
        } else {
            let mid = (lo + hi) / 2.0;
            (mid - 0.5, mid + 0.5)
        }
    };
    let (min_lon, max_lon) = widen(bbox.min_lon, bbox.max_lon);
    let (min_lat, max_lat) = widen(bbox.min_lat, bbox.max_lat);
    BBox::new(min_lon, min_lat, max_lon, max_lat)
}
