// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::fmt;

use image::DynamicImage;

use crate::codec::parse_points;
use crate::constant::{ALL_GROUPS, DEFAULT_FILL_COLOR, DEFAULT_STROKE_COLOR};
use crate::error::RoiFerryError;
use crate::roi::model::{NormalizedRoi, Shape, ShapeKind};
use crate::session::{Image, Region, Session};
use crate::ut::track::{Verbosity, debug_log, progress_log};

/// All regions read from one source image
#[derive(Debug)]
pub struct Extraction {
    pub image: Image,
    pub outcomes: Vec<RoiOutcome>,
    pub thumbnail: Option<DynamicImage>,
}

impl Extraction {
    /// Iterate over the successfully normalized ROIs in region order
    pub fn rois(&self) -> impl Iterator<Item = &NormalizedRoi> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            RoiOutcome::Extracted(roi) => Some(roi),
            RoiOutcome::Skipped(_) => None,
        })
    }

    /// Iterate over the regions that could not be normalized
    pub fn skipped(&self) -> impl Iterator<Item = &SkippedRoi> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            RoiOutcome::Extracted(_) => None,
            RoiOutcome::Skipped(skipped) => Some(skipped),
        })
    }

    /// Split into the normalized ROIs and the image they were read from
    pub fn into_rois(self) -> (Vec<NormalizedRoi>, Image) {
        let rois = self
            .outcomes
            .into_iter()
            .filter_map(|outcome| match outcome {
                RoiOutcome::Extracted(roi) => Some(roi),
                RoiOutcome::Skipped(_) => None,
            })
            .collect();

        (rois, self.image)
    }
}

/// Result of normalizing a single region
#[derive(Debug, Clone, PartialEq)]
pub enum RoiOutcome {
    Extracted(NormalizedRoi),
    Skipped(SkippedRoi),
}

/// A region that was dropped along with why
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRoi {
    pub region_id: i64,
    pub name: String,
    pub kind: Option<ShapeKind>,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The region holds no shapes
    NoShape,
    /// Points could not be parsed and the shape is not a rectangle
    UnsupportedShape(String),
    /// Points could not be parsed and the rectangle has no usable geometry
    IncompleteRectangle,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SkipReason::NoShape => write!(f, "region has no shapes"),
            SkipReason::UnsupportedShape(message) => {
                write!(f, "points unreadable and shape is not a rectangle ({})", message)
            }
            SkipReason::IncompleteRectangle => {
                write!(f, "points unreadable and rectangle geometry is incomplete")
            }
        }
    }
}

/// Corners of a rectangle, clockwise from the top-left
///
/// # Examples
///
/// ```
/// use roiferry_core::roi::rectangle_corners;
///
/// let corners = rectangle_corners(10., 20., 5., 7.);
/// assert_eq!(corners, vec![[10., 20.], [15., 20.], [15., 27.], [10., 27.]]);
/// ```
pub fn rectangle_corners(x: f64, y: f64, width: f64, height: f64) -> Vec<[f64; 2]> {
    vec![
        [x, y],
        [x + width, y],
        [x + width, y + height],
        [x, y + height],
    ]
}

fn shape_corners(shape: &Shape) -> Result<Vec<[f64; 2]>, RoiFerryError> {
    match (shape.x, shape.y, shape.width, shape.height) {
        (Some(x), Some(y), Some(width), Some(height)) => Ok(rectangle_corners(x, y, width, height)),
        _ => Err(RoiFerryError::RectangleError),
    }
}

/// Normalize the primary shape of a region
///
/// Points are read from the shape's point string first. When that fails a
/// rectangle falls back to its corners and every other shape is skipped.
pub fn normalize_region(region: &Region) -> RoiOutcome {
    let Some(shape) = region.primary_shape() else {
        return RoiOutcome::Skipped(SkippedRoi {
            region_id: region.id,
            name: String::new(),
            kind: None,
            reason: SkipReason::NoShape,
        });
    };

    let name = shape.text.clone().unwrap_or_default();
    let kind = shape.kind();

    let parsed = shape
        .points
        .as_deref()
        .ok_or(RoiFerryError::PointsEmptyError)
        .and_then(parse_points);

    let points = match parsed {
        Ok(points) => points,
        Err(_) if kind == ShapeKind::Rectangle => match shape_corners(shape) {
            Ok(points) => points,
            Err(_) => {
                return RoiOutcome::Skipped(SkippedRoi {
                    region_id: region.id,
                    name,
                    kind: Some(kind),
                    reason: SkipReason::IncompleteRectangle,
                });
            }
        },
        Err(err) => {
            return RoiOutcome::Skipped(SkippedRoi {
                region_id: region.id,
                name,
                kind: Some(kind),
                reason: SkipReason::UnsupportedShape(err.to_string()),
            });
        }
    };

    RoiOutcome::Extracted(NormalizedRoi {
        name,
        points,
        stroke_color: shape.stroke_color().unwrap_or(DEFAULT_STROKE_COLOR),
        fill_color: shape.fill_color().unwrap_or(DEFAULT_FILL_COLOR),
        stroke_width: shape.stroke_width(),
        stroke_dash: shape.stroke_dash.clone(),
    })
}

fn load_thumbnail<S: Session + ?Sized>(
    session: &mut S,
    image_id: i64,
) -> Result<DynamicImage, RoiFerryError> {
    let bytes = session.get_thumbnail(image_id)?;
    image::load_from_memory(&bytes).map_err(|err| RoiFerryError::ThumbnailError(err.to_string()))
}

/// Read and normalize every region attached to an image
///
/// The session is widened to all groups to locate the image and then
/// narrowed to the image's group before regions are queried. A thumbnail
/// is loaded for quality control but failing to do so does not abort.
///
/// # Arguments
///
/// * `session` - An open session on the source server
/// * `image_id` - Source image identifier
/// * `verbosity` - Console output level
pub fn extract_rois<S: Session + ?Sized>(
    session: &mut S,
    image_id: i64,
    verbosity: Verbosity,
) -> Result<Extraction, RoiFerryError> {
    progress_log(
        &format!("Looking for image id={}", image_id),
        verbosity.info(),
    );

    session.set_active_group(ALL_GROUPS)?;
    let image = session.get_image(image_id)?;

    progress_log(
        &format!(
            "Found image id={} name='{}' in group id={} name='{}'",
            image.id, image.name, image.group_id, image.group_name
        ),
        verbosity.info(),
    );

    let thumbnail = match load_thumbnail(session, image.id) {
        Ok(thumbnail) => {
            debug_log(
                &format!(
                    "Stored {}x{} thumbnail in memory for QC",
                    thumbnail.width(),
                    thumbnail.height()
                ),
                verbosity.debug(),
            );
            Some(thumbnail)
        }
        Err(err) => {
            debug_log(&format!("Skipping thumbnail. {}", err), verbosity.debug());
            None
        }
    };

    session.set_active_group(image.group_id)?;

    progress_log("Retrieving ROIs", verbosity.info());
    let regions = session.get_regions(image.id)?;

    let outcomes: Vec<RoiOutcome> = regions
        .iter()
        .map(|region| {
            let outcome = normalize_region(region);

            match &outcome {
                RoiOutcome::Extracted(roi) => debug_log(
                    &format!(
                        "Found ROI id={} name='{}' points={}",
                        region.id,
                        roi.name,
                        roi.points.len()
                    ),
                    verbosity.debug(),
                ),
                RoiOutcome::Skipped(skipped) => debug_log(
                    &format!(
                        "Dropped ROI id={} name='{}' type={}: {}",
                        skipped.region_id,
                        skipped.name,
                        skipped
                            .kind
                            .as_ref()
                            .map(|kind| kind.to_string())
                            .unwrap_or("none".to_string()),
                        skipped.reason
                    ),
                    verbosity.debug(),
                ),
            }

            outcome
        })
        .collect();

    let extraction = Extraction {
        image,
        outcomes,
        thumbnail,
    };

    progress_log(
        &format!("Found {} ROIs in total", extraction.rois().count()),
        verbosity.info(),
    );

    Ok(extraction)
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::codec::rgba_to_int;
    use crate::roi::model::{Length, StrokeWidth};
    use crate::session::memory::{MemoryConnector, MemoryServer};
    use crate::session::Connect;
    use serde_json::json;

    fn region(id: i64, shape: Shape) -> Region {
        Region {
            id,
            shapes: vec![shape],
        }
    }

    #[test]
    fn test_normalize_polygon_style() {
        let mut shape = Shape::polygon("10,10 20,10 20,20").with_text("Stroma");
        shape.stroke_color = Some(json!(rgba_to_int(0, 255, 0, 255)));
        shape.fill_color = Some(json!(rgba_to_int(0, 0, 255, 40)));
        shape.stroke_width = Some(json!({"Unit": "PIXEL", "Value": 2.0}));
        shape.stroke_dash = Some(json!("4,2"));

        let RoiOutcome::Extracted(roi) = normalize_region(&region(1, shape)) else {
            panic!("polygon should be extracted");
        };

        assert_eq!(roi.name, "Stroma");
        assert_eq!(roi.points, vec![[10., 10.], [20., 10.], [20., 20.]]);
        assert_eq!(roi.stroke_color, rgba_to_int(0, 255, 0, 255));
        assert_eq!(roi.fill_color, rgba_to_int(0, 0, 255, 40));
        assert_eq!(roi.stroke_width, Some(StrokeWidth::Length(Length::pixels(2.0))));
        assert_eq!(roi.stroke_dash, Some(json!("4,2")));
    }

    #[test]
    fn test_normalize_missing_style_uses_defaults() {
        let mut shape = Shape::polygon("10,10 20,10 20,20");
        shape.stroke_width = Some(json!("thick"));

        let RoiOutcome::Extracted(roi) = normalize_region(&region(1, shape)) else {
            panic!("polygon should be extracted");
        };

        assert_eq!(roi.name, "");
        assert_eq!(roi.stroke_color, DEFAULT_STROKE_COLOR);
        assert_eq!(roi.fill_color, DEFAULT_FILL_COLOR);
        assert_eq!(roi.stroke_width, None);
        assert_eq!(roi.stroke_dash, None);
    }

    #[test]
    fn test_normalize_rectangle_fallback() {
        let shape = Shape::rectangle(10., 20., 5., 7.).with_text("Box");

        let RoiOutcome::Extracted(roi) = normalize_region(&region(1, shape)) else {
            panic!("rectangle should fall back to corners");
        };

        assert_eq!(roi.points, vec![[10., 20.], [15., 20.], [15., 27.], [10., 27.]]);
    }

    #[test]
    fn test_normalize_incomplete_rectangle() {
        let mut shape = Shape::rectangle(10., 20., 5., 7.);
        shape.height = None;

        let outcome = normalize_region(&region(3, shape));
        assert!(matches!(
            outcome,
            RoiOutcome::Skipped(SkippedRoi {
                region_id: 3,
                reason: SkipReason::IncompleteRectangle,
                ..
            })
        ));
    }

    #[test]
    fn test_normalize_other_shape_skipped() {
        let shape = Shape {
            shape_type: "http://www.openmicroscopy.org/Schemas/OME/2016-06#Ellipse".to_string(),
            x: Some(5.),
            y: Some(5.),
            ..Default::default()
        };

        let RoiOutcome::Skipped(skipped) = normalize_region(&region(4, shape)) else {
            panic!("ellipse should be skipped");
        };

        assert_eq!(skipped.kind, Some(ShapeKind::Other("Ellipse".to_string())));
        assert!(matches!(skipped.reason, SkipReason::UnsupportedShape(_)));
    }

    #[test]
    fn test_normalize_empty_region() {
        let outcome = normalize_region(&Region {
            id: 9,
            shapes: vec![],
        });

        assert!(matches!(
            outcome,
            RoiOutcome::Skipped(SkippedRoi {
                reason: SkipReason::NoShape,
                ..
            })
        ));
    }

    #[test]
    fn test_normalize_uses_primary_shape() {
        let outcome = normalize_region(&Region {
            id: 2,
            shapes: vec![
                Shape::polygon("1000,1000 2000,1000 2000,2000").with_text("first"),
                Shape::polygon("5000,5000 6000,5000 6000,6000").with_text("second"),
            ],
        });

        let RoiOutcome::Extracted(roi) = outcome else {
            panic!("primary shape should be extracted");
        };

        assert_eq!(roi.name, "first");
    }

    #[test]
    fn test_extract_continues_past_unreadable_region() {
        let server = MemoryServer::new();
        server.add_image(7, "slide.svs", 3);
        server.add_region(7, Shape::polygon("10,10 20,10 20,20").with_text("first"));
        server.add_region(
            7,
            Shape {
                shape_type: "http://www.openmicroscopy.org/Schemas/OME/2016-06#Polygon".to_string(),
                points: Some("10;10 20;20".to_string()),
                text: Some("broken".to_string()),
                ..Default::default()
            },
        );
        server.add_region(7, Shape::polygon("30,30 40,30 40,40").with_text("third"));

        let connector = MemoryConnector::new(&server, "source");
        let mut session = connector.open().unwrap();
        let extraction = extract_rois(&mut *session, 7, Verbosity::Silent).unwrap();

        assert_eq!(extraction.skipped().count(), 1);

        let (rois, image) = extraction.into_rois();
        let names: Vec<&str> = rois.iter().map(|roi| roi.name.as_str()).collect();

        assert_eq!(names, vec!["first", "third"]);
        assert_eq!(image.id, 7);
        assert_eq!(image.group_id, 3);
    }

    #[test]
    fn test_extract_tolerates_invalid_thumbnail() {
        let server = MemoryServer::new();
        server.add_image(7, "slide.svs", 3);
        server.set_thumbnail(7, vec![0, 1, 2, 3]);
        server.add_region(7, Shape::rectangle(0., 0., 4., 4.));

        let mut session = MemoryConnector::new(&server, "source").open().unwrap();
        let extraction = extract_rois(&mut *session, 7, Verbosity::Silent).unwrap();

        assert!(extraction.thumbnail.is_none());
        assert_eq!(extraction.rois().count(), 1);
    }

    #[test]
    fn test_extract_decodes_thumbnail() {
        let mut bytes: Vec<u8> = Vec::new();
        DynamicImage::new_rgb8(8, 6)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();

        let server = MemoryServer::new();
        server.add_image(7, "slide.svs", 3);
        server.set_thumbnail(7, bytes);

        let mut session = MemoryConnector::new(&server, "source").open().unwrap();
        let extraction = extract_rois(&mut *session, 7, Verbosity::Silent).unwrap();

        let thumbnail = extraction.thumbnail.unwrap();
        assert_eq!((thumbnail.width(), thumbnail.height()), (8, 6));
        assert!(extraction.outcomes.is_empty());
    }

    #[test]
    fn test_extract_missing_image() {
        let server = MemoryServer::new();
        let mut session = MemoryConnector::new(&server, "source").open().unwrap();

        assert!(matches!(
            extract_rois(&mut *session, 404, Verbosity::Silent),
            Err(RoiFerryError::ImageNotFoundError(404))
        ));
    }
}
