// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Null adapters for desktop/CI builds and for builds without the vendor
// positioning SDK.
//
// Nothing here fails loudly: permissions come back denied, the camera is
// absent, and positioning reports `CapabilityUnavailable`.

use livemap_core::error::{LivemapError, Result};
use livemap_core::types::{Permission, PermissionState};

use crate::traits::*;

/// No-op host returned on platforms without a native bridge.
pub struct StubHost;

impl HostBridge for StubHost {
    fn platform_name(&self) -> &str {
        "Desktop (stub)"
    }
}

impl PermissionProvider for StubHost {
    fn status(&self, permission: Permission) -> PermissionState {
        tracing::debug!(permission = permission.as_str(), "permission status on stub host");
        PermissionState::Denied
    }

    fn request(&self, permission: Permission, completion: PermissionCompletion) {
        tracing::warn!(permission = permission.as_str(), "permission request on stub host");
        completion(false);
    }
}

impl CameraOverlay for StubHost {
    fn is_available(&self) -> bool {
        false
    }

    fn set_visible(&self, visible: bool) {
        tracing::debug!(visible, "CameraOverlay::set_visible called on stub host");
    }
}

/// Positioning factory used when no vendor SDK is linked.
pub struct NoPositioning;

impl LocationProviderFactory for NoPositioning {
    fn is_available(&self) -> bool {
        false
    }

    fn create(
        &self,
        _api_key: &str,
        _on_location: LocationCallback,
    ) -> Result<Box<dyn LocationProvider>> {
        Err(LivemapError::CapabilityUnavailable(
            "no indoor positioning SDK linked into this build".into(),
        ))
    }
}

/// Web runtime that drops every script. Useful for headless hosts.
pub struct DetachedRuntime;

impl WebRuntime for DetachedRuntime {
    fn platform_name(&self) -> &str {
        "detached"
    }

    fn register_channel(&self, name: &str) -> Result<()> {
        tracing::debug!(channel = name, "register_channel on detached runtime");
        Ok(())
    }

    fn load_url(&self, url: &str) -> Result<()> {
        tracing::warn!(url, "load_url on detached runtime");
        Err(LivemapError::Bridge("no web runtime attached".into()))
    }

    fn evaluate_script(&self, script: &str) {
        tracing::debug!(bytes = script.len(), "script dropped by detached runtime");
    }

    fn call_async_script(&self, _body: &str, completion: ScriptCompletion) {
        completion(Err("no web runtime attached".into()));
    }
}
