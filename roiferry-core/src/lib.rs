// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

pub mod batch;
pub mod codec;
pub mod config;
pub mod constant;
pub mod error;
pub mod io;
pub mod roi;
pub mod session;
pub mod ut;
