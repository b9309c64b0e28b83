// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Livemap SDK: drives the embedded livemap web application: commands out,
// typed events in, the load handshake, and the camera and positioning gates.
//
// The host owns one `LivemapSession` per web view and forwards every
// `RuntimeSignal` its runtime adapter reports (e.g.
// `livemap_bridge::ios::IosWebView`) to `LivemapSession::handle_signal`,
// typically through a `Weak` handle to the session.

pub mod camera;
pub mod channel;
pub mod command;
pub mod delegate;
pub mod events;
pub mod positioning;
pub mod scripts;
pub mod session;

#[cfg(test)]
mod testing;

pub use camera::CameraGate;
pub use channel::{CHANNELS, Channel};
pub use command::{Command, Dispatch, Livemap};
pub use delegate::{LivemapDelegate, NoDelegate};
pub use events::{ActionTarget, ContentUpdate, MapEvent};
pub use positioning::PositioningProxy;
pub use session::{Capabilities, LifecycleState, LivemapSession};
