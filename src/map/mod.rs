pub mod builder;
pub mod geometry;
mod viewport;

pub use builder::{build, feature_id, feature_ring, feature_source};
pub use viewport::{filter_features, BBox, SingleSlotCache, ViewportReducer};
