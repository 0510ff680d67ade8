use std::sync::Arc;

use crate::color::Color;
use crate::data::{Payload, Record};
use crate::scale::Scale;

/// Maps a raw record to the record used for scales and properties
pub type RecordTransform = Arc<dyn Fn(&Record) -> Record + Send + Sync>;

/// Encoding rules for one visual axis (color or size) of a source
#[derive(Clone)]
pub struct Axis<T> {
    /// Record field driving this axis; `None` paints every cell with `no_key`
    pub key: Option<String>,
    pub scale: Scale<T>,
    /// Explicit range bounds; missing ones are inferred from the data
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Used when there is no key or no usable scale
    pub no_key: T,
    /// Used when the keyed value is absent on a record
    pub no_data: T,
}

impl Default for Axis<Color> {
    fn default() -> Self {
        Self {
            key: None,
            scale: Scale::color_ramp(Color::WHITE, Color::RED),
            min: None,
            max: None,
            no_key: Color::RED,
            no_data: Color::rgb(0xee, 0xee, 0xee),
        }
    }
}

impl Default for Axis<f64> {
    fn default() -> Self {
        Self {
            key: None,
            scale: Scale::size_range(0.0, 1.0),
            min: None,
            max: None,
            no_key: 1.0,
            no_data: 1.0,
        }
    }
}

/// One dataset bound to the grid with its own encoding rules
#[derive(Clone, Default)]
pub struct Source {
    pub payload: Option<Payload>,
    pub color: Axis<Color>,
    pub size: Axis<f64>,
    pub transform: Option<RecordTransform>,
    /// Explicit property keys; inferred from a sample record when `None`
    pub keys: Option<Vec<String>>,
}

impl Source {
    pub fn new(payload: Payload) -> Self {
        Self {
            payload: Some(payload),
            ..Self::default()
        }
    }

    pub fn with_color_key(mut self, key: impl Into<String>) -> Self {
        self.color.key = Some(key.into());
        self
    }

    pub fn with_color_scale(mut self, scale: Scale<Color>) -> Self {
        self.color.scale = scale;
        self
    }

    pub fn with_color_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.color.min = min;
        self.color.max = max;
        self
    }

    pub fn with_color_fallbacks(mut self, no_key: Color, no_data: Color) -> Self {
        self.color.no_key = no_key;
        self.color.no_data = no_data;
        self
    }

    pub fn with_size_key(mut self, key: impl Into<String>) -> Self {
        self.size.key = Some(key.into());
        self
    }

    pub fn with_size_scale(mut self, scale: Scale<f64>) -> Self {
        self.size.scale = scale;
        self
    }

    pub fn with_size_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.size.min = min;
        self.size.max = max;
        self
    }

    pub fn with_size_fallbacks(mut self, no_key: f64, no_data: f64) -> Self {
        self.size.no_key = no_key;
        self.size.no_data = no_data;
        self
    }

    pub fn with_transform(mut self, transform: impl Fn(&Record) -> Record + Send + Sync + 'static) -> Self {
        self.transform = Some(Arc::new(transform));
        self
    }

    pub fn with_keys(mut self, keys: Vec<String>) -> Self {
        self.keys = Some(keys);
        self
    }
}

/// Styling shared by every source
#[derive(Clone, Debug, PartialEq)]
pub struct GridOptions {
    pub contour_color: Color,
    pub contour_width: f64,
    pub contour_opacity: f64,
    pub fill_opacity: f64,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            contour_color: Color::rgb(0x55, 0x55, 0x55),
            contour_width: 1.0,
            contour_opacity: 1.0,
            fill_opacity: 0.5,
        }
    }
}
