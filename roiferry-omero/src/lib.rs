// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use dirs::home_dir;

/// Location of the default transfer configuration file
pub fn get_roiferry_config() -> std::path::PathBuf {
    if let Ok(roiferry_config) = std::env::var("ROIFERRY_CONFIG") {
        if !roiferry_config.is_empty() {
            return std::path::PathBuf::from(roiferry_config);
        }
    }

    if let Some(home) = home_dir() {
        return home.join(".roiferry").join("config.json");
    }

    std::path::PathBuf::from("/.roiferry/config.json")
}

pub mod request;
pub mod session;

pub use session::{WebConnector, WebSession};
