// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for the livemap bridge.

use std::time::Duration;

use thiserror::Error;

/// Top-level error type for all bridge operations.
#[derive(Debug, Error)]
pub enum LivemapError {
    // -- Wire codec --
    #[error("cannot decode {type_name}: {reason}")]
    Decode {
        type_name: &'static str,
        reason: String,
    },

    #[error("cannot encode command argument: {0}")]
    Encode(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Web runtime --
    #[error("script execution failed: {0}")]
    ScriptExecution(String),

    #[error("no result from web runtime within {0:?}")]
    Timeout(Duration),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("unsupported channel: {0}")]
    UnsupportedChannel(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -- Platform bridge --
    #[error("platform bridge error: {0}")]
    Bridge(String),

    #[error("capability not available: {0}")]
    CapabilityUnavailable(String),
}

impl LivemapError {
    /// Build a `Decode` error for the named wire type.
    pub fn decode(type_name: &'static str, reason: impl std::fmt::Display) -> Self {
        Self::Decode {
            type_name,
            reason: reason.to_string(),
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LivemapError>;
