//! Per-cell visual values resolved at draw time.
//!
//! Every axis follows the same chain: override, then "no key" fallback when
//! the source has no key, then "no data" fallback when the record lacks the
//! value, then "no key" again when no scale could be built, and finally the
//! scale itself.

use glam::DVec2;
use std::borrow::Cow;

use crate::color::Color;
use crate::data::Record;
use crate::overrides::OverrideLayer;
use crate::scale::{ScaleFn, ScaleSet};
use crate::source::{Axis, GridOptions, Source};

/// Read-only view combining overrides, scales and source configuration
#[derive(Clone, Copy)]
pub struct EncodingResolver<'a> {
    sources: &'a [Source],
    scales: &'a ScaleSet,
    overrides: &'a OverrideLayer,
    options: &'a GridOptions,
}

fn resolve_axis<T: Clone>(
    overridden: Option<&T>,
    axis: &Axis<T>,
    scale: Option<&ScaleFn<T>>,
    properties: &Record,
) -> T {
    if let Some(value) = overridden {
        return value.clone();
    }
    let Some(key) = axis.key.as_deref() else {
        return axis.no_key.clone();
    };
    // Null, missing and non-numeric values all count as no data
    let Some(value) = properties.get(key).and_then(|v| v.as_f64()) else {
        return axis.no_data.clone();
    };
    match scale {
        Some(scale) => scale(value),
        None => axis.no_key.clone(),
    }
}

impl<'a> EncodingResolver<'a> {
    pub fn new(
        sources: &'a [Source],
        scales: &'a ScaleSet,
        overrides: &'a OverrideLayer,
        options: &'a GridOptions,
    ) -> Self {
        Self {
            sources,
            scales,
            overrides,
            options,
        }
    }

    /// Fill color of cell `id` for a source
    pub fn color(&self, source_index: usize, id: &str, properties: &Record) -> Color {
        let overridden = self.overrides.color.get(id);
        match self.sources.get(source_index) {
            Some(source) => resolve_axis(overridden, &source.color, self.scales.color(source_index), properties),
            None => resolve_axis(overridden, &Axis::<Color>::default(), None, properties),
        }
    }

    /// Size multiplier of cell `id` for a source
    pub fn relative_size(&self, source_index: usize, id: &str, properties: &Record) -> f64 {
        let overridden = self.overrides.size.get(id);
        match self.sources.get(source_index) {
            Some(source) => resolve_axis(overridden, &source.size, self.scales.size(source_index), properties),
            None => resolve_axis(overridden, &Axis::<f64>::default(), None, properties),
        }
    }

    /// Cell ring scaled by its relative size
    pub fn sized_ring<'r>(
        &self,
        source_index: usize,
        id: &str,
        properties: &Record,
        ring: &'r [(f64, f64)],
    ) -> Cow<'r, [(f64, f64)]> {
        resize_geometry(ring, self.relative_size(source_index, id, properties))
    }

    /// Contour color override for `id`. Without one, the shared default when
    /// `default_if_absent` is set, otherwise `None` so the caller can keep
    /// its baseline stroke.
    pub fn contour_color(&self, id: &str, default_if_absent: bool) -> Option<Color> {
        match self.overrides.contour_color.get(id) {
            Some(&color) => Some(color),
            None if default_if_absent => Some(self.options.contour_color),
            None => None,
        }
    }

    /// Contour width override for `id`, same fallback rules as `contour_color`
    pub fn contour_width(&self, id: &str, default_if_absent: bool) -> Option<f64> {
        match self.overrides.contour_width.get(id) {
            Some(&width) => Some(width),
            None if default_if_absent => Some(self.options.contour_width),
            None => None,
        }
    }

    pub fn options(&self) -> &GridOptions {
        self.options
    }
}

/// Scale a ring about the mean of its vertices.
/// A factor of exactly 1 returns the input untouched.
pub fn resize_geometry(ring: &[(f64, f64)], relative_size: f64) -> Cow<'_, [(f64, f64)]> {
    if relative_size == 1.0 || ring.is_empty() {
        return Cow::Borrowed(ring);
    }
    let centroid = ring
        .iter()
        .fold(DVec2::ZERO, |sum, &(x, y)| sum + DVec2::new(x, y))
        / ring.len() as f64;

    ring.iter()
        .map(|&(x, y)| {
            let p = centroid + relative_size * (DVec2::new(x, y) - centroid);
            (p.x, p.y)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{records, DataIndex, Payload};
    use crate::diagnostics::Diagnostic;
    use crate::scale::Scale;
    use serde_json::json;

    struct Fixture {
        sources: Vec<Source>,
        index: DataIndex,
        scales: ScaleSet,
        overrides: OverrideLayer,
        options: GridOptions,
    }

    impl Fixture {
        fn new(sources: Vec<Source>) -> Self {
            let mut sink: Vec<Diagnostic> = Vec::new();
            let (index, _) = DataIndex::index(&sources, &mut sink);
            let scales = ScaleSet::recompute(&sources, &index);
            Self {
                sources,
                index,
                scales,
                overrides: OverrideLayer::default(),
                options: GridOptions::default(),
            }
        }

        fn resolver(&self) -> EncodingResolver<'_> {
            EncodingResolver::new(&self.sources, &self.scales, &self.overrides, &self.options)
        }

        fn color(&self, id: &str) -> Color {
            self.resolver().color(0, id, &self.index.properties_for(0, id))
        }

        fn size(&self, id: &str) -> f64 {
            self.resolver().relative_size(0, id, &self.index.properties_for(0, id))
        }
    }

    const NO_KEY: Color = Color::rgb(1, 1, 1);
    const NO_DATA: Color = Color::rgb(2, 2, 2);

    fn keyed_source() -> Source {
        Source::new(Payload::new(records(json!([
            {"id": "lo", "v": 0},
            {"id": "hi", "v": 10},
            {"id": "empty", "v": null},
            {"id": "text", "v": "n/a"},
        ]))))
        .with_color_key("v")
        .with_color_scale(Scale::color_ramp(Color::WHITE, Color::RED))
        .with_color_fallbacks(NO_KEY, NO_DATA)
        .with_size_key("v")
        .with_size_scale(Scale::size_range(0.5, 1.5))
        .with_size_fallbacks(1.0, 0.25)
    }

    #[test]
    fn test_scale_applies_to_values() {
        let fx = Fixture::new(vec![keyed_source()]);
        assert_eq!(fx.color("lo"), Color::WHITE);
        assert_eq!(fx.color("hi"), Color::RED);
        assert_eq!(fx.size("lo"), 0.5);
        assert_eq!(fx.size("hi"), 1.5);
    }

    #[test]
    fn test_missing_value_uses_no_data() {
        let fx = Fixture::new(vec![keyed_source()]);
        assert_eq!(fx.color("empty"), NO_DATA);
        assert_eq!(fx.color("text"), NO_DATA);
        // Unknown id has no properties at all
        assert_eq!(fx.color("unknown"), NO_DATA);
        assert_eq!(fx.size("empty"), 0.25);
    }

    #[test]
    fn test_no_key_uses_no_key_fallback() {
        let source = Source::new(Payload::new(records(json!([{"id": "a", "v": 3}]))))
            .with_color_fallbacks(NO_KEY, NO_DATA)
            .with_size_fallbacks(0.75, 0.25);
        let fx = Fixture::new(vec![source]);
        assert_eq!(fx.color("a"), NO_KEY);
        assert_eq!(fx.size("a"), 0.75);
    }

    #[test]
    fn test_missing_scale_uses_no_key_fallback() {
        // Every value is null, so the ramp factory rejects the infinite range
        let source = Source::new(Payload::new(records(json!([{"id": "a", "v": null}]))))
            .with_color_key("v")
            .with_color_fallbacks(NO_KEY, NO_DATA);
        let fx = Fixture::new(vec![source]);
        assert!(fx.scales.color(0).is_none());

        let mut props = Record::new();
        props.insert("v".into(), json!(4));
        assert_eq!(fx.resolver().color(0, "a", &props), NO_KEY);
    }

    #[test]
    fn test_override_wins_on_every_axis() {
        let mut fx = Fixture::new(vec![keyed_source()]);
        fx.overrides.set_color("hi", Some(Color::rgb(9, 9, 9)));
        fx.overrides.set_size("empty", Some(3.0));
        fx.overrides.set_contour_color("hi", Some(Color::RED));
        fx.overrides.set_contour_width("hi", Some(4.0));

        assert_eq!(fx.color("hi"), Color::rgb(9, 9, 9));
        assert_eq!(fx.size("empty"), 3.0);
        assert_eq!(fx.resolver().contour_color("hi", false), Some(Color::RED));
        assert_eq!(fx.resolver().contour_width("hi", true), Some(4.0));
    }

    #[test]
    fn test_clearing_override_falls_through() {
        let mut fx = Fixture::new(vec![keyed_source()]);
        fx.overrides.set_color("hi", Some(Color::rgb(9, 9, 9)));
        fx.overrides.set_color("hi", None);
        assert_eq!(fx.color("hi"), Color::RED);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let fx = Fixture::new(vec![keyed_source()]);
        for id in ["lo", "hi", "empty", "text", "unknown"] {
            assert_eq!(fx.color(id), fx.color(id));
            assert_eq!(fx.size(id), fx.size(id));
        }
    }

    #[test]
    fn test_unknown_source_uses_defaults() {
        let fx = Fixture::new(vec![keyed_source()]);
        let props = Record::new();
        assert_eq!(fx.resolver().color(9, "lo", &props), Axis::<Color>::default().no_key);
        assert_eq!(fx.resolver().relative_size(9, "lo", &props), 1.0);
    }

    #[test]
    fn test_contour_defaults() {
        let fx = Fixture::new(vec![keyed_source()]);
        let resolver = fx.resolver();
        assert_eq!(resolver.contour_color("lo", false), None);
        assert_eq!(resolver.contour_width("lo", false), None);
        assert_eq!(resolver.contour_color("lo", true), Some(fx.options.contour_color));
        assert_eq!(resolver.contour_width("lo", true), Some(fx.options.contour_width));
    }

    #[test]
    fn test_neutral_resize_borrows_input() {
        let ring = vec![(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)];
        let resized = resize_geometry(&ring, 1.0);
        assert!(matches!(resized, Cow::Borrowed(_)));
        assert_eq!(resized.as_ptr(), ring.as_ptr());
    }

    #[test]
    fn test_resize_about_centroid() {
        let ring = vec![(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)];
        let resized = resize_geometry(&ring, 2.0);
        assert_eq!(
            &*resized,
            &[(-1.0, -1.0), (3.0, -1.0), (3.0, 3.0), (-1.0, 3.0)]
        );
        // Input untouched
        assert_eq!(ring[0], (0.0, 0.0));
    }

    #[test]
    fn test_resize_to_half() {
        let ring = vec![(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)];
        let resized = resize_geometry(&ring, 0.5);
        assert_eq!(&*resized, &[(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0)]);
    }

    #[test]
    fn test_sized_ring_uses_override() {
        let mut fx = Fixture::new(vec![keyed_source()]);
        fx.overrides.set_size("lo", Some(2.0));
        let ring = vec![(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)];
        let props = fx.index.properties_for(0, "lo");
        let sized = fx.resolver().sized_ring(0, "lo", &props, &ring);
        assert_eq!(sized[0], (-1.0, -1.0));
    }
}
