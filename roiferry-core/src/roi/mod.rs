mod encode;
mod extract;
mod model;

pub use encode::encode_roi;
pub use extract::{
    Extraction, RoiOutcome, SkipReason, SkippedRoi, extract_rois, normalize_region,
    rectangle_corners,
};
pub use model::{Length, LengthUnit, NormalizedRoi, Shape, ShapeKind, StrokeWidth};
