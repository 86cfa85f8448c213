// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::batch::BatchOptions;
use crate::constant::{
    DEFAULT_STROKE_WIDTH, OMERO_WEB_PORT, SOURCE_ID_COLUMN, TARGET_ID_COLUMN, UNSCOPED_GROUP,
};
use crate::error::RoiFerryError;
use crate::ut::track::Verbosity;

/// Connection details and credentials for one server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub secure: bool,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: OMERO_WEB_PORT,
            secure: true,
            username: None,
            password: None,
        }
    }
}

impl ServerConfig {
    /// Base url of the server web interface
    ///
    /// # Examples
    ///
    /// ```
    /// use roiferry_core::config::ServerConfig;
    ///
    /// let server = ServerConfig {
    ///     host: "omero.example.org".to_string(),
    ///     port: 8080,
    ///     secure: false,
    ///     ..Default::default()
    /// };
    ///
    /// assert_eq!(server.base_url(), "http://omero.example.org:8080");
    /// ```
    pub fn base_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }
}

/// Everything a transfer run needs, loaded once at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    pub source: ServerConfig,
    pub target: ServerConfig,
    pub default_stroke_width: f64,
    pub target_group: i64,
    pub target_user: Option<i64>,
    pub source_column: String,
    pub target_column: String,
    pub verbosity: Verbosity,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            source: ServerConfig::default(),
            target: ServerConfig::default(),
            default_stroke_width: DEFAULT_STROKE_WIDTH,
            target_group: UNSCOPED_GROUP,
            target_user: None,
            source_column: SOURCE_ID_COLUMN.to_string(),
            target_column: TARGET_ID_COLUMN.to_string(),
            verbosity: Verbosity::Info,
        }
    }
}

impl TransferConfig {
    /// Load a configuration from a json file
    ///
    /// Missing keys take their default values.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use roiferry_core::config::TransferConfig;
    /// let config = TransferConfig::open("config.json").unwrap();
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RoiFerryError> {
        let contents = std::fs::read_to_string(&path)
            .map_err(|err| RoiFerryError::NoFileError(err.to_string()))?;

        serde_json::from_str(&contents).map_err(|err| RoiFerryError::ConfigError(err.to_string()))
    }

    /// Check settings that would otherwise only fail mid-batch
    pub fn validate(&self) -> Result<(), RoiFerryError> {
        if self.default_stroke_width.is_nan() || self.default_stroke_width <= 0.0 {
            return Err(RoiFerryError::ConfigError(
                "default_stroke_width must be positive".to_string(),
            ));
        }

        if self.target_group != UNSCOPED_GROUP && self.target_user.is_none() {
            return Err(RoiFerryError::ConfigError(
                "target_user must be set when writing into target_group".to_string(),
            ));
        }

        if self.source.host.is_empty() || self.target.host.is_empty() {
            return Err(RoiFerryError::ConfigError(
                "source and target hosts must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn batch_options(&self, dry_run: bool) -> BatchOptions {
        BatchOptions {
            default_stroke_width: self.default_stroke_width,
            target_group: self.target_group,
            target_user: self.target_user.unwrap_or(UNSCOPED_GROUP),
            verbosity: self.verbosity,
            dry_run,
        }
    }
}
