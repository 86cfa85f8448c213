// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use serde_json::Value;

use crate::codec::points_to_string;
use crate::roi::model::{Length, NormalizedRoi, Shape, StrokeWidth};

/// Build a native polygon from a normalized ROI
///
/// Colors, dash pattern and label are copied as-is. Only a bare numeric
/// stroke width is kept (in pixels). Any other width is replaced by
/// `default_stroke_width` pixels.
///
/// # Arguments
///
/// * `roi` - A normalized ROI
/// * `default_stroke_width` - Stroke width in pixels used when none is known
///
/// # Examples
///
/// ```
/// use roiferry_core::roi::{NormalizedRoi, encode_roi};
///
/// let roi = NormalizedRoi {
///     name: "Tumor".to_string(),
///     points: vec![[1., 1.], [2., 1.], [2., 2.]],
///     stroke_color: -65281,
///     fill_color: 255,
///     stroke_width: None,
///     stroke_dash: None,
/// };
///
/// let shape = encode_roi(&roi, 10.0);
/// assert_eq!(shape.points.as_deref(), Some("1,1 2,1 2,2 "));
/// assert_eq!(shape.text.as_deref(), Some("Tumor"));
/// ```
pub fn encode_roi(roi: &NormalizedRoi, default_stroke_width: f64) -> Shape {
    let stroke_width = match &roi.stroke_width {
        Some(StrokeWidth::Magnitude(value)) => Length::pixels(*value),
        Some(StrokeWidth::Length(_)) | None => Length::pixels(default_stroke_width),
    };

    Shape {
        fill_color: Some(Value::from(roi.fill_color)),
        stroke_color: Some(Value::from(roi.stroke_color)),
        stroke_width: Some(stroke_width.to_value()),
        stroke_dash: roi.stroke_dash.clone(),
        ..Shape::polygon(&points_to_string(&roi.points)).with_text(&roi.name)
    }
}
