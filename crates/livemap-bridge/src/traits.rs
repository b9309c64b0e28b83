// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for the embedded web runtime and the
// native capabilities the map reaches through the bridge.
//
// Every trait is used from the single thread that owns the bridge session.
// Completion closures are therefore not `Send`; implementations must invoke
// them on that same thread.

use livemap_core::error::Result;
use livemap_core::types::{Permission, PermissionState, ProviderLocation};
use serde_json::Value;

/// Outcome of an asynchronous script: the resolved value or the runtime's
/// error message.
pub type ScriptOutcome = std::result::Result<Value, String>;

/// Continuation for [`WebRuntime::call_async_script`].
pub type ScriptCompletion = Box<dyn FnOnce(ScriptOutcome)>;

/// Continuation for [`PermissionProvider::request`]; `true` when granted.
pub type PermissionCompletion = Box<dyn FnOnce(bool)>;

/// Receives fixes from a running [`LocationProvider`].
pub type LocationCallback = Box<dyn FnMut(ProviderLocation)>;

/// Something the web runtime reports back to the bridge session.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeSignal {
    /// A page script posted `body` to the native channel `channel`.
    Message { channel: String, body: Value },
    /// A navigation committed; `url` is the runtime's new current URL.
    NavigationCommitted { url: Option<String> },
    /// The runtime's URL changed without a full navigation (history API).
    UrlChanged { url: String },
    /// The main frame finished loading.
    NavigationFinished,
    /// A provisional or committed navigation failed.
    NavigationFailed { reason: String },
}

/// The embedded browser engine hosting the livemap page.
pub trait WebRuntime {
    /// Human-readable engine name (e.g. "WKWebView").
    fn platform_name(&self) -> &str;

    /// Make `name` available to page scripts as a message channel.
    fn register_channel(&self, name: &str) -> Result<()>;

    /// Start navigating to `url`, bypassing any cached copy.
    fn load_url(&self, url: &str) -> Result<()>;

    /// Run `script` in the page context. Fire-and-forget: failures are
    /// logged by the implementation and never reported back.
    fn evaluate_script(&self, script: &str);

    /// Run `body` as the body of an async function in the page context and
    /// hand its resolved value (or rejection) to `completion`.
    fn call_async_script(&self, body: &str, completion: ScriptCompletion);

    /// JavaScript expression of a function that posts one message to the
    /// native channel `channel`.
    fn message_sink(&self, channel: &str) -> String {
        format!("window.webkit.messageHandlers.{channel}.postMessage")
    }
}

/// OS permission checks and prompts.
pub trait PermissionProvider {
    /// Current authorization status, without prompting.
    fn status(&self, permission: Permission) -> PermissionState;

    /// Prompt the user. `completion` runs once with the decision.
    fn request(&self, permission: Permission, completion: PermissionCompletion);
}

/// The camera preview shown behind the transparent map in AR mode.
pub trait CameraOverlay {
    /// Whether the device has a usable back camera.
    fn is_available(&self) -> bool;

    /// Show or hide the preview.
    fn set_visible(&self, visible: bool);
}

/// A running indoor positioning source.
pub trait LocationProvider {
    fn start(&mut self) -> Result<()>;

    fn stop(&mut self);
}

/// Builds vendor positioning providers when the vendor SDK is linked.
pub trait LocationProviderFactory {
    /// Whether `create` can succeed at all on this build.
    fn is_available(&self) -> bool;

    /// Construct a provider for `api_key` that reports fixes to `on_location`.
    fn create(
        &self,
        api_key: &str,
        on_location: LocationCallback,
    ) -> Result<Box<dyn LocationProvider>>;
}

/// Unified host bridge that groups the device capabilities.
pub trait HostBridge: PermissionProvider + CameraOverlay {
    /// Human-readable platform name (e.g. "iOS", "Desktop (stub)").
    fn platform_name(&self) -> &str;
}

/// Answer a page's camera capture request from the OS camera permission,
/// prompting when it is still undetermined. `decide` runs once.
pub fn decide_camera_capture<P: PermissionProvider + ?Sized>(permissions: &P, decide: PermissionCompletion) {
    match permissions.status(Permission::Camera) {
        PermissionState::Granted => decide(true),
        PermissionState::Denied => decide(false),
        PermissionState::Undetermined => permissions.request(Permission::Camera, decide),
    }
}
