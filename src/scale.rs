use std::sync::Arc;

use crate::color::Color;
use crate::data::DataIndex;
use crate::source::{Axis, Source};

/// Resolved scale: numeric value to visual value
pub type ScaleFn<T> = Arc<dyn Fn(f64) -> T + Send + Sync>;

/// Factory turning a `(min, max)` range into a scale. `None` means no
/// usable scale for that range; resolution then falls back to "no key".
pub type ScaleFactory<T> = Arc<dyn Fn(f64, f64) -> Option<ScaleFn<T>> + Send + Sync>;

/// A configured scale: either already resolved or built from the value range
#[derive(Clone)]
pub enum Scale<T> {
    Resolved(ScaleFn<T>),
    Factory(ScaleFactory<T>),
}

impl<T> Scale<T> {
    pub fn resolved(f: impl Fn(f64) -> T + Send + Sync + 'static) -> Self {
        Scale::Resolved(Arc::new(f))
    }

    pub fn factory(f: impl Fn(f64, f64) -> Option<ScaleFn<T>> + Send + Sync + 'static) -> Self {
        Scale::Factory(Arc::new(f))
    }

    /// Resolve against a range. The range is only computed for factories.
    fn resolve(&self, range: impl FnOnce() -> (f64, f64)) -> Option<ScaleFn<T>> {
        match self {
            Scale::Resolved(f) => Some(Arc::clone(f)),
            Scale::Factory(factory) => {
                let (min, max) = range();
                factory(min, max)
            }
        }
    }
}

/// Position of `value` inside `[min, max]`, clamped to [0, 1].
/// Empty ranges (`min == max`) map everything to 0.
/// Non-finite or inverted ranges have no position at all.
fn normalize_range(min: f64, max: f64) -> Option<impl Fn(f64) -> f64 + Send + Sync> {
    if !min.is_finite() || !max.is_finite() || min > max {
        return None;
    }
    let span = max - min;
    Some(move |value: f64| {
        if span == 0.0 {
            0.0
        } else {
            ((value - min) / span).clamp(0.0, 1.0)
        }
    })
}

impl Scale<Color> {
    /// Linear RGB ramp from `from` (at min) to `to` (at max)
    pub fn color_ramp(from: Color, to: Color) -> Self {
        Scale::factory(move |min, max| {
            let t = normalize_range(min, max)?;
            Some(Arc::new(move |value| from.lerp(to, t(value))) as ScaleFn<Color>)
        })
    }
}

impl Scale<f64> {
    /// Linear size multiplier from `lo` (at min) to `hi` (at max)
    pub fn size_range(lo: f64, hi: f64) -> Self {
        Scale::factory(move |min, max| {
            let t = normalize_range(min, max)?;
            Some(Arc::new(move |value| lo + (hi - lo) * t(value)) as ScaleFn<f64>)
        })
    }
}

/// Min and max of the transformed `key` values of a source.
/// Nulls and non-numeric values are skipped; an empty scan yields `(+inf, -inf)`.
pub fn value_range(index: &DataIndex, source_index: usize, key: &str) -> (f64, f64) {
    index
        .mapped_records(source_index)
        .filter_map(|record| record.get(key).and_then(|v| v.as_f64()))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| {
            (min.min(v), max.max(v))
        })
}

/// Scales for one axis of one source, or `None` when the axis has no key
pub fn compute_scale<T>(
    axis: &Axis<T>,
    index: &DataIndex,
    source_index: usize,
) -> Option<ScaleFn<T>> {
    let key = axis.key.as_deref()?;
    axis.scale.resolve(|| {
        // Only scan when a bound is actually missing
        let (min, max) = match (axis.min, axis.max) {
            (Some(min), Some(max)) => return (min, max),
            _ => value_range(index, source_index, key),
        };
        (axis.min.unwrap_or(min), axis.max.unwrap_or(max))
    })
}

/// Color and size scales per source, rebuilt as a whole on every recompute
#[derive(Clone, Default)]
pub struct ScaleSet {
    color: Vec<Option<ScaleFn<Color>>>,
    size: Vec<Option<ScaleFn<f64>>>,
}

impl ScaleSet {
    /// Compute every source's scales from the current records and configuration
    pub fn recompute(sources: &[Source], index: &DataIndex) -> Self {
        let mut scales = Self::default();
        for (source_index, source) in sources.iter().enumerate() {
            scales.color.push(compute_scale(&source.color, index, source_index));
            scales.size.push(compute_scale(&source.size, index, source_index));
        }
        log::debug!("recomputed scales for {} sources", sources.len());
        scales
    }

    #[inline(always)]
    pub fn color(&self, source_index: usize) -> Option<&ScaleFn<Color>> {
        self.color.get(source_index).and_then(Option::as_ref)
    }

    #[inline(always)]
    pub fn size(&self, source_index: usize) -> Option<&ScaleFn<f64>> {
        self.size.get(source_index).and_then(Option::as_ref)
    }
}
