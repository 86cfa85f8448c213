// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::fmt::Write;

use crate::constant::MIN_POINT_TOKEN_LEN;
use crate::error::RoiFerryError;

/// Parse an OMERO point string into ordered xy pairs
///
/// Pairs are separated by spaces and coordinates by a comma. Tokens that
/// are not longer than three characters are dropped before parsing so
/// trailing delimiters do not produce empty pairs. Note that this also
/// drops short but valid pairs such as `1,1`.
///
/// # Arguments
///
/// * `text` - A point string (e.g. "10,20 30,40 50,60 ")
///
/// # Examples
///
/// ```
/// use roiferry_core::codec::parse_points;
///
/// let points = parse_points("10,20 30.5,40 ").unwrap();
/// assert_eq!(points, vec![[10., 20.], [30.5, 40.]]);
///
/// let points = parse_points("1,1 12,34 ").unwrap();
/// assert_eq!(points, vec![[12., 34.]]);
///
/// assert!(parse_points("10;20 30;40").is_err());
/// ```
pub fn parse_points(text: &str) -> Result<Vec<[f64; 2]>, RoiFerryError> {
    let points = text
        .split(' ')
        .filter(|token| token.len() > MIN_POINT_TOKEN_LEN)
        .map(parse_pair)
        .collect::<Result<Vec<[f64; 2]>, RoiFerryError>>()?;

    if points.is_empty() {
        return Err(RoiFerryError::PointsEmptyError);
    }

    Ok(points)
}

fn parse_pair(token: &str) -> Result<[f64; 2], RoiFerryError> {
    let invalid = || RoiFerryError::PointsParseError(token.to_string());

    let (x, y) = token.split_once(',').ok_or_else(invalid)?;
    let x = x.parse::<f64>().map_err(|_| invalid())?;
    let y = y.parse::<f64>().map_err(|_| invalid())?;

    Ok([x, y])
}

/// Serialize xy pairs into an OMERO point string
///
/// Coordinates are truncated toward zero and every pair, including the
/// last one, is followed by a single space.
///
/// # Examples
///
/// ```
/// use roiferry_core::codec::points_to_string;
///
/// let text = points_to_string(&[[1.9, 2.2], [-3.7, 4.0]]);
/// assert_eq!(text, "1,2 -3,4 ");
/// ```
pub fn points_to_string(points: &[[f64; 2]]) -> String {
    points
        .iter()
        .fold(String::with_capacity(points.len() * 8), |mut text, [x, y]| {
            let _ = write!(text, "{},{} ", x.trunc() as i64, y.trunc() as i64);
            text
        })
}
