// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Livemap bridge: value objects, wire codec, configuration and errors shared
// across all crates.

pub mod codec;
pub mod config;
pub mod error;
pub mod geo;
pub mod types;

pub use config::LivemapConfig;
pub use error::{LivemapError, Result};
pub use geo::*;
pub use types::*;
