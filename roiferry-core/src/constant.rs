// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use crate::codec::color::{rgba, rgba_to_int};

// Group id that widens session visibility to every group of the user
pub const ALL_GROUPS: i64 = -1;

// Target group id meaning "write with the session's own context"
pub const UNSCOPED_GROUP: i64 = -1;

// Point tokens of this length or shorter are treated as delimiter artifacts
pub const MIN_POINT_TOKEN_LEN: usize = 3;

// Style applied when the source shape carries no color or width
pub const DEFAULT_FILL_COLOR: i32 = rgba_to_int(255, 0, 255, 50);
pub const DEFAULT_STROKE_COLOR: i32 = rgba(255, 255, 0);
pub const DEFAULT_STROKE_WIDTH: f64 = 10.0;

// Default column names of the image pair table
pub const SOURCE_ID_COLUMN: &str = "omero_id_1";
pub const TARGET_ID_COLUMN: &str = "omero_id_2";

// Supported image pair table formats
pub const SUPPORTED_TABLE_FORMATS: [&str; 5] = ["csv", "tsv", "txt", "parquet", "pq"];

// OMERO model type identifiers used in serialized objects
pub const POLYGON_TYPE: &str = "http://www.openmicroscopy.org/Schemas/OME/2016-06#Polygon";
pub const RECTANGLE_TYPE: &str = "http://www.openmicroscopy.org/Schemas/OME/2016-06#Rectangle";
pub const ROI_TYPE: &str = "http://www.openmicroscopy.org/Schemas/OME/2016-06#ROI";
pub const IMAGE_TYPE: &str = "http://www.openmicroscopy.org/Schemas/OME/2016-06#Image";
pub const EXPERIMENTER_TYPE: &str =
    "http://www.openmicroscopy.org/Schemas/OME/2016-06#Experimenter";
pub const LENGTH_TYPE: &str = "TBD#LengthI";

// Default OMERO.web port
pub const OMERO_WEB_PORT: u16 = 443;
