// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::constant::{LENGTH_TYPE, POLYGON_TYPE, RECTANGLE_TYPE};

/// A server-agnostic ROI ready to be re-encoded on another server
///
/// The points are stored as ordered xy pairs and are never empty. Whether
/// the ROI originated from a polygon or a rectangle is not retained.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRoi {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub stroke_color: i32,
    pub fill_color: i32,
    pub stroke_width: Option<StrokeWidth>,
    pub stroke_dash: Option<Value>,
}

/// Stroke width as stored on the source shape
#[derive(Debug, Clone, PartialEq)]
pub enum StrokeWidth {
    Magnitude(f64),
    Length(Length),
}

impl StrokeWidth {
    /// Read a stroke width from a serialized shape field
    ///
    /// Bare numbers become a magnitude and `LengthI` objects with a numeric
    /// value become a length. Anything else is treated as malformed.
    ///
    /// # Examples
    ///
    /// ```
    /// use serde_json::json;
    /// use roiferry_core::roi::{Length, LengthUnit, StrokeWidth};
    ///
    /// let width = StrokeWidth::from_value(&json!(2.5));
    /// assert_eq!(width, Some(StrokeWidth::Magnitude(2.5)));
    ///
    /// let width = StrokeWidth::from_value(&json!({"Unit": "MICROMETER", "Value": 1.0}));
    /// assert_eq!(width, Some(StrokeWidth::Length(Length::new(1.0, LengthUnit::Micrometer))));
    ///
    /// assert_eq!(StrokeWidth::from_value(&json!("wide")), None);
    /// ```
    pub fn from_value(value: &Value) -> Option<StrokeWidth> {
        match value {
            Value::Number(n) => n.as_f64().map(StrokeWidth::Magnitude),
            Value::Object(map) => {
                let magnitude = map.get("Value").and_then(Value::as_f64)?;
                let unit = map
                    .get("Unit")
                    .and_then(Value::as_str)
                    .map(LengthUnit::from_name)
                    .unwrap_or_default();

                Some(StrokeWidth::Length(Length::new(magnitude, unit)))
            }
            _ => None,
        }
    }
}

/// A magnitude with a unit of length
#[derive(Debug, Clone, PartialEq)]
pub struct Length {
    pub value: f64,
    pub unit: LengthUnit,
}

impl Length {
    pub fn new(value: f64, unit: LengthUnit) -> Self {
        Self { value, unit }
    }

    pub fn pixels(value: f64) -> Self {
        Self::new(value, LengthUnit::Pixel)
    }

    /// Serialize as an OMERO `LengthI` object
    pub fn to_value(&self) -> Value {
        json!({
            "@type": LENGTH_TYPE,
            "Unit": self.unit.name(),
            "Symbol": self.unit.symbol(),
            "Value": self.value,
        })
    }
}

/// Units of length understood by OMERO
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LengthUnit {
    #[default]
    Pixel,
    Point,
    Nanometer,
    Micrometer,
    Millimeter,
    Other(String),
}

impl LengthUnit {
    pub fn from_name(name: &str) -> Self {
        match name.to_uppercase().as_str() {
            "PIXEL" => LengthUnit::Pixel,
            "POINT" => LengthUnit::Point,
            "NANOMETER" => LengthUnit::Nanometer,
            "MICROMETER" => LengthUnit::Micrometer,
            "MILLIMETER" => LengthUnit::Millimeter,
            other => LengthUnit::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            LengthUnit::Pixel => "PIXEL",
            LengthUnit::Point => "POINT",
            LengthUnit::Nanometer => "NANOMETER",
            LengthUnit::Micrometer => "MICROMETER",
            LengthUnit::Millimeter => "MILLIMETER",
            LengthUnit::Other(name) => name,
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            LengthUnit::Pixel => "pixel",
            LengthUnit::Point => "pt",
            LengthUnit::Nanometer => "nm",
            LengthUnit::Micrometer => "µm",
            LengthUnit::Millimeter => "mm",
            LengthUnit::Other(name) => name,
        }
    }
}

/// The kind of a shape, resolved from its declared type
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
    Polygon,
    Rectangle,
    Other(String),
}

impl ShapeKind {
    /// Resolve a kind from an OMERO type identifier
    ///
    /// # Examples
    ///
    /// ```
    /// use roiferry_core::roi::ShapeKind;
    ///
    /// let kind = ShapeKind::from_type("http://www.openmicroscopy.org/Schemas/OME/2016-06#Rectangle");
    /// assert_eq!(kind, ShapeKind::Rectangle);
    /// ```
    pub fn from_type(shape_type: &str) -> Self {
        let name = shape_type.rsplit('#').next().unwrap_or(shape_type);

        match name {
            "Polygon" => ShapeKind::Polygon,
            "Rectangle" => ShapeKind::Rectangle,
            other => ShapeKind::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ShapeKind::Polygon => write!(f, "Polygon"),
            ShapeKind::Rectangle => write!(f, "Rectangle"),
            ShapeKind::Other(name) => write!(f, "{}", name),
        }
    }
}

/// A shape in the OMERO JSON layout
///
/// Style fields are kept as raw json values so malformed source data can
/// be detected and replaced rather than failing the whole region.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    #[serde(rename = "@type")]
    pub shape_type: String,

    #[serde(rename = "Text", default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(rename = "Points", default, skip_serializing_if = "Option::is_none")]
    pub points: Option<String>,

    #[serde(rename = "X", default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,

    #[serde(rename = "Y", default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,

    #[serde(rename = "Width", default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,

    #[serde(rename = "Height", default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,

    #[serde(rename = "StrokeColor", default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<Value>,

    #[serde(rename = "FillColor", default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<Value>,

    #[serde(rename = "StrokeWidth", default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<Value>,

    #[serde(rename = "StrokeDashArray", default, skip_serializing_if = "Option::is_none")]
    pub stroke_dash: Option<Value>,
}

impl Shape {
    /// Create a polygon from an OMERO point string
    pub fn polygon(points: &str) -> Self {
        Self {
            shape_type: POLYGON_TYPE.to_string(),
            points: Some(points.to_string()),
            ..Default::default()
        }
    }

    /// Create a rectangle from its top-left corner and extent
    pub fn rectangle(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            shape_type: RECTANGLE_TYPE.to_string(),
            x: Some(x),
            y: Some(y),
            width: Some(width),
            height: Some(height),
            ..Default::default()
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn kind(&self) -> ShapeKind {
        ShapeKind::from_type(&self.shape_type)
    }

    /// Stroke color if present and within the signed 32-bit range
    pub fn stroke_color(&self) -> Option<i32> {
        self.stroke_color.as_ref().and_then(as_color)
    }

    /// Fill color if present and within the signed 32-bit range
    pub fn fill_color(&self) -> Option<i32> {
        self.fill_color.as_ref().and_then(as_color)
    }

    pub fn stroke_width(&self) -> Option<StrokeWidth> {
        self.stroke_width.as_ref().and_then(StrokeWidth::from_value)
    }
}

fn as_color(value: &Value) -> Option<i32> {
    value.as_i64().and_then(|color| i32::try_from(color).ok())
}
