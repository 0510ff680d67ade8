//! Bind tabular datasets to a fixed geospatial cell grid.
//!
//! Records are indexed per source, value ranges are turned into color and
//! size scales, per-cell overrides take precedence over computed values, and
//! the whole grid is emitted as a GeoJSON feature collection that a renderer
//! can filter by viewport and style at draw time.

pub mod braille;
pub mod color;
pub mod data;
pub mod diagnostics;
pub mod encoding;
pub mod error;
pub mod grid;
pub mod map;
pub mod overrides;
pub mod preview;
pub mod scale;
pub mod source;

pub use color::Color;
pub use data::{Cell, CellId, CellPoint, CellPoints, DataIndex, Payload, Record, Ring};
pub use diagnostics::{Diagnostic, DiagnosticSink, LogSink};
pub use encoding::{resize_geometry, EncodingResolver};
pub use error::{Error, Result};
pub use grid::GeoGrid;
pub use map::{BBox, SingleSlotCache, ViewportReducer};
pub use overrides::{OverrideLayer, OverrideTable};
pub use scale::{Scale, ScaleFn, ScaleSet};
pub use source::{Axis, GridOptions, RecordTransform, Source};
