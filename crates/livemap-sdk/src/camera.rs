// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Camera gate: the AR camera preview is shown only with camera permission.
//
// A refusal, whether read from the current status or answered at the prompt,
// and a device without a camera all end the same way: preview hidden, AR
// forced off, "camera" reported denied to the page, native camera disabled.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, info, warn};

use livemap_bridge::traits::HostBridge;
use livemap_core::error::LivemapError;
use livemap_core::types::{ArViewMode, Permission, PermissionState};

use crate::command::Livemap;

pub struct CameraGate {
    host: Rc<dyn HostBridge>,
    states: Rc<RefCell<HashMap<Permission, PermissionState>>>,
}

impl CameraGate {
    pub fn new(host: Rc<dyn HostBridge>) -> Self {
        Self {
            host,
            states: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// Last status seen for `permission`.
    pub fn permission_state(&self, permission: Permission) -> PermissionState {
        self.states
            .borrow()
            .get(&permission)
            .copied()
            .unwrap_or_default()
    }

    /// The page asked for the camera.
    pub fn start(&self, map: &Livemap) {
        if !self.host.is_available() {
            let err = LivemapError::CapabilityUnavailable("no camera on this device".into());
            warn!(error = %err, "camera start refused");
            deny(&*self.host, map);
            return;
        }

        let status = self.host.status(Permission::Camera);
        record(&self.states, status);
        debug!(?status, "camera permission status");

        match status {
            PermissionState::Granted => self.host.set_visible(true),
            PermissionState::Denied => deny(&*self.host, map),
            PermissionState::Undetermined => {
                let host = self.host.clone();
                let states = self.states.clone();
                let map = map.clone();
                self.host.request(
                    Permission::Camera,
                    Box::new(move |granted| {
                        info!(granted, "camera permission answered");
                        if granted {
                            record(&states, PermissionState::Granted);
                            host.set_visible(true);
                        } else {
                            record(&states, PermissionState::Denied);
                            deny(&*host, &map);
                        }
                    }),
                );
            }
        }
    }

    /// The page stopped the camera.
    pub fn stop(&self) {
        self.host.set_visible(false);
    }
}

fn record(states: &RefCell<HashMap<Permission, PermissionState>>, state: PermissionState) {
    states.borrow_mut().insert(Permission::Camera, state);
}

fn deny(host: &dyn HostBridge, map: &Livemap) {
    host.set_visible(false);
    map.force_ar_view_mode(ArViewMode::Off);
    map.set_permissions_denied(&[Permission::Camera]);
    map.disable_camera_native();
}
