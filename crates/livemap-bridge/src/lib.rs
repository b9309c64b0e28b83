// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Livemap native platform bridge abstractions.
//!
//! Defines the traits through which the bridge session reaches the embedded
//! web runtime and the device (camera permission, camera preview, vendor
//! positioning), plus the platform dispatch that picks an implementation.

pub mod traits;

#[cfg(target_os = "ios")]
pub mod ios;

pub mod stub;

use std::rc::Rc;

/// Returns the host bridge implementation for the target operating system.
///
/// RETURNS: a shared trait object (`dyn HostBridge`) that abstracts away the
/// underlying native SDK details.
pub fn platform_host() -> Rc<dyn traits::HostBridge> {
    #[cfg(target_os = "ios")]
    {
        // iOS: AVFoundation authorization through `objc2` message sends.
        Rc::new(ios::IosHost::new())
    }
    #[cfg(not(target_os = "ios"))]
    {
        // DESKTOP/CI: denies every permission, no camera.
        Rc::new(stub::StubHost)
    }
}

/// Returns the positioning factory for this build.
///
/// No vendor SDK is linked by this crate; hosts that link one pass their own
/// factory to the session instead.
pub fn platform_positioning() -> Rc<dyn traits::LocationProviderFactory> {
    Rc::new(stub::NoPositioning)
}
