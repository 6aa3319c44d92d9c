pub mod config;
pub mod data;
pub mod pipeline;
pub mod properties;
pub mod scoring;
pub mod units;

pub use config::MeasureConfig;
pub use data::{MeasureData, MeasureItem};
pub use pipeline::{detect_frame, measure_frame, prepare_frame, Detection};
pub use properties::{
    deviation_normalize, sort_items, MeasureProperties, MeasureProperty, SortingProperty,
};
pub use scoring::{image_stats, score, score_fits, star_weights, ImageStats, StarMetrics};
pub use units::{FwhmUnit, MeasureUnits, RangeUnit};
