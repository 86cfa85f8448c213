// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use std::fmt;

#[derive(Debug, Clone)]
pub enum RoiFerryError {
    PointsParseError(String),
    PointsEmptyError,
    RectangleError,
    ImageNotFoundError(i64),
    ThumbnailError(String),
    SessionError(String),
    PersistError(String),
    TableReadError(String),
    TableColumnError(String),
    ConfigError(String),
    NoFileError(String),
}

impl fmt::Display for RoiFerryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RoiFerryError::PointsParseError(token) => {
                write!(
                    f,
                    "[roiferry::PointsParseError] Point token '{}' is not a valid x,y pair.",
                    token
                )
            }
            RoiFerryError::PointsEmptyError => {
                write!(
                    f,
                    "[roiferry::PointsEmptyError] No points were detected in the point string."
                )
            }
            RoiFerryError::RectangleError => {
                write!(
                    f,
                    "[roiferry::RectangleError] Rectangle is missing one of x, y, width or height."
                )
            }
            RoiFerryError::ImageNotFoundError(id) => {
                write!(
                    f,
                    "[roiferry::ImageNotFoundError] Image {} could not be found.",
                    id
                )
            }
            RoiFerryError::ThumbnailError(message) => {
                write!(
                    f,
                    "[roiferry::ThumbnailError] Failed to load thumbnail. {}",
                    message
                )
            }
            RoiFerryError::SessionError(message) => {
                write!(f, "[roiferry::SessionError] Session failed. {}", message)
            }
            RoiFerryError::PersistError(message) => {
                write!(f, "[roiferry::PersistError] Failed to save ROI. {}", message)
            }
            RoiFerryError::TableReadError(message) => {
                write!(
                    f,
                    "[roiferry::TableReadError] Image pairs could not be read. {}",
                    message
                )
            }
            RoiFerryError::TableColumnError(message) => {
                write!(
                    f,
                    "[roiferry::TableColumnError] Invalid image id column. {}",
                    message
                )
            }
            RoiFerryError::ConfigError(message) => {
                write!(f, "[roiferry::ConfigError] Invalid configuration. {}", message)
            }
            RoiFerryError::NoFileError(message) => {
                write!(
                    f,
                    "[roiferry::NoFileError] File could not be found. {}.",
                    message
                )
            }
        }
    }
}

impl std::error::Error for RoiFerryError {}
