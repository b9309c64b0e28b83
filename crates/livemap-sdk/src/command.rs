// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command channel: native calls turned into script injected into the page.
//
// Every script is produced by `Command::to_script`. Arguments are
// `serde_json::Value`s rendered with serde_json, so string arguments are
// always quoted and escaped and no native reference can reach the page.
//
// Fire-and-forget commands return immediately. Call-with-result commands
// resolve through `WebRuntime::call_async_script`, bounded by the configured
// call timeout. Nothing is buffered before the map reports ready.

use std::rc::Rc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use livemap_bridge::traits::WebRuntime;
use livemap_core::codec;
use livemap_core::config::DEFAULT_CALL_TIMEOUT_MS;
use livemap_core::error::{LivemapError, Result};
use livemap_core::geo::{Attitude, BoundingBox, Coordinates};
use livemap_core::types::{
    ArViewMode, EaseToOptions, Filters, FitBoundsOptions, Marker, Permission, Pinpoint,
    PolylineOptions, ProviderLocation,
};

const LIVEMAP: &str = "window.livemap";
const WEMAP_SDK: &str = "window.WemapSDK";
const POLESTAR_PROVIDER: &str = "window.__nativeJsProviders.polestar";

/// `drawPolyline` and `addMarker` resolve to an object; only its id is kept.
const PROJECT_ID: &str = "({id}) => id";

/// How a command is submitted to the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    FireAndForget,
    CallWithResult,
}

/// A remote invocation: `<object>.<method>(<args>)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    object: &'static str,
    method: &'static str,
    args: Vec<Value>,
    projection: Option<&'static str>,
}

impl Command {
    pub fn new(object: &'static str, method: &'static str) -> Self {
        Self {
            object,
            method,
            args: Vec::new(),
            projection: None,
        }
    }

    /// A method of `window.livemap`.
    pub fn livemap(method: &'static str) -> Self {
        Self::new(LIVEMAP, method)
    }

    /// Append an already-encoded argument.
    pub fn arg(mut self, value: Value) -> Self {
        self.args.push(value);
        self
    }

    /// Append a value object, encoded through the wire codec.
    pub fn encoded<T: Serialize + ?Sized>(self, value: &T) -> Result<Self> {
        Ok(self.arg(codec::encode(value)?))
    }

    /// Apply `projection` (a JS function expression) to the resolved value.
    pub fn project(mut self, projection: &'static str) -> Self {
        self.projection = Some(projection);
        self
    }

    /// `window.livemap.openEvent` and the like.
    pub fn target(&self) -> String {
        format!("{}.{}", self.object, self.method)
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// The script text for `dispatch`.
    ///
    /// ```
    /// use livemap_sdk::command::{Command, Dispatch};
    /// use serde_json::json;
    ///
    /// let open = Command::livemap("openEvent").arg(json!(12));
    /// assert_eq!(
    ///     open.to_script(Dispatch::FireAndForget),
    ///     "promise = window.livemap.openEvent(12);"
    /// );
    /// ```
    pub fn to_script(&self, dispatch: Dispatch) -> String {
        let args = self
            .args
            .iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let call = format!("{}({args})", self.target());
        match (dispatch, self.projection) {
            (Dispatch::FireAndForget, _) => format!("promise = {call};"),
            (Dispatch::CallWithResult, None) => format!("return {call};"),
            (Dispatch::CallWithResult, Some(projection)) => {
                format!("return {call}.then({projection});")
            }
        }
    }
}

/// Command handle for one embedded map.
///
/// Cheap to clone; every clone drives the same web runtime. Delegate
/// callbacks receive the handle of the session that produced the event.
#[derive(Clone)]
pub struct Livemap {
    runtime: Rc<dyn WebRuntime>,
    call_timeout: Duration,
}

impl Livemap {
    pub fn new(runtime: Rc<dyn WebRuntime>, call_timeout: Duration) -> Self {
        Self {
            runtime,
            call_timeout,
        }
    }

    /// Handle with the default call timeout.
    pub fn with_default_timeout(runtime: Rc<dyn WebRuntime>) -> Self {
        Self::new(runtime, Duration::from_millis(DEFAULT_CALL_TIMEOUT_MS))
    }

    pub fn runtime(&self) -> &Rc<dyn WebRuntime> {
        &self.runtime
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// Submit `command` without waiting for it to run.
    pub fn send(&self, command: &Command) {
        debug!(command = %command.target(), "fire-and-forget");
        self.runtime
            .evaluate_script(&command.to_script(Dispatch::FireAndForget));
    }

    /// Submit `command` and hand its resolved value to `on_done` once the
    /// runtime completes it.
    ///
    /// No timeout applies here; `on_done` runs on the runtime's own
    /// completion, so hosts that cannot poll a future from the thread the
    /// runtime completes on use this form.
    pub fn call_value_with(&self, command: &Command, on_done: impl FnOnce(Result<Value>) + 'static) {
        debug!(command = %command.target(), "call-with-result");
        self.runtime.call_async_script(
            &command.to_script(Dispatch::CallWithResult),
            Box::new(move |outcome| on_done(outcome.map_err(LivemapError::ScriptExecution))),
        );
    }

    /// Like [`Livemap::call_value_with`], decoding the resolved value as `T`.
    pub fn call_with<T: DeserializeOwned + 'static>(
        &self,
        command: &Command,
        on_done: impl FnOnce(Result<T>) + 'static,
    ) {
        self.call_value_with(command, move |result| {
            on_done(result.and_then(codec::decode))
        });
    }

    /// Submit `command` and wait for its resolved value, at most the call
    /// timeout.
    pub async fn call_value(&self, command: &Command) -> Result<Value> {
        let target = command.target();
        let (tx, rx) = oneshot::channel();
        self.call_value_with(command, move |result| {
            // The receiver is gone when the caller stopped waiting.
            let _ = tx.send(result);
        });

        match tokio::time::timeout(self.call_timeout, rx).await {
            Err(_) => {
                warn!(command = %target, timeout = ?self.call_timeout, "call timed out");
                Err(LivemapError::Timeout(self.call_timeout))
            }
            Ok(Err(_)) => Err(LivemapError::Bridge(format!(
                "{target}: completion dropped by the web runtime"
            ))),
            Ok(Ok(result)) => result,
        }
    }

    /// Submit `command` and decode its resolved value as `T`.
    pub async fn call<T: DeserializeOwned>(&self, command: &Command) -> Result<T> {
        let value = self.call_value(command).await?;
        codec::decode(value)
    }

    // -- Content ------------------------------------------------------------

    /// Open an event. Only meaningful on maps that use events.
    pub fn open_event(&self, id: i64) {
        self.send(&Command::livemap("openEvent").arg(json!(id)));
    }

    /// Close the open event and go back to the search view.
    pub fn close_event(&self) {
        self.send(&Command::livemap("closeEvent"));
    }

    pub fn open_pinpoint(&self, id: i64) {
        self.send(&Command::livemap("openPinpoint").arg(json!(id)));
    }

    pub fn close_pinpoint(&self) {
        self.send(&Command::livemap("closePinpoint"));
    }

    /// Replace the map's pinpoints.
    pub fn set_pinpoints(&self, pinpoints: &[Pinpoint]) -> Result<()> {
        self.send(&Command::livemap("setPinpoints").encoded(pinpoints)?);
        Ok(())
    }

    pub fn set_filters(&self, filters: &Filters) -> Result<()> {
        self.send(&Command::livemap("setFilters").encoded(filters)?);
        Ok(())
    }

    pub fn set_source_lists(&self, lists: &[i64]) {
        self.send(&Command::livemap("setSourceLists").arg(json!(lists)));
    }

    pub fn set_indoor_feature_state(&self, id: i64, selected: bool) {
        self.send(
            &Command::livemap("setIndoorFeatureState")
                .arg(json!(id))
                .arg(json!({ "selected": selected })),
        );
    }

    // -- Navigation ---------------------------------------------------------

    /// Open the destination pinpoint, then start navigating to it from the
    /// user's location.
    pub fn navigate_to_pinpoint(&self, id: i64) {
        self.open_pinpoint(id);
        self.send(&Command::livemap("navigateToPinpoint").arg(json!(id)));
    }

    pub fn stop_navigation(&self) {
        self.send(&Command::livemap("stopNavigation"));
    }

    // -- Session ------------------------------------------------------------

    pub fn sign_in_by_token(&self, access_token: &str) {
        self.send(&Command::livemap("signInByToken").arg(json!(access_token)));
    }

    pub fn sign_out(&self) {
        self.send(&Command::livemap("signOut"));
    }

    pub fn enable_sidebar(&self) {
        self.send(&Command::livemap("enableSidebar"));
    }

    pub fn disable_sidebar(&self) {
        self.send(&Command::livemap("disableSidebar"));
    }

    pub fn enable_analytics(&self) {
        self.send(&Command::livemap("enableAnalytics"));
    }

    pub fn disable_analytics(&self) {
        self.send(&Command::livemap("disableAnalytics"));
    }

    // -- Camera -------------------------------------------------------------

    pub fn set_zoom(&self, zoom: f64) {
        self.send(&Command::livemap("setZoom").arg(json!(zoom)));
    }

    pub async fn get_zoom(&self) -> Result<f64> {
        self.call(&Command::livemap("getZoom")).await
    }

    pub fn set_center(&self, center: &Coordinates) -> Result<()> {
        self.send(&Command::livemap("setCenter").encoded(center)?);
        Ok(())
    }

    pub fn center_to(&self, center: &Coordinates, zoom: f64) -> Result<()> {
        self.send(&Command::livemap("centerTo").encoded(center)?.arg(json!(zoom)));
        Ok(())
    }

    /// Center the map on the user's location.
    pub fn around_me(&self) {
        self.send(&Command::livemap("aroundMe"));
    }

    pub fn ease_to(&self, options: &EaseToOptions) -> Result<()> {
        self.send(&Command::livemap("easeTo").encoded(options)?);
        Ok(())
    }

    /// Fit the view on `bounds`, sent as `[west, south, east, north]`.
    pub fn fit_bounds(&self, bounds: &BoundingBox, options: &FitBoundsOptions) -> Result<()> {
        self.send(
            &Command::livemap("fitBounds")
                .arg(json!(bounds.to_bounds_array()))
                .encoded(options)?,
        );
        Ok(())
    }

    // -- Drawing ------------------------------------------------------------

    /// Draw a polyline and return its id. With `use_network` set the web app
    /// routes between the points instead of drawing straight segments.
    pub async fn draw_polyline(
        &self,
        coordinates: &[Coordinates],
        options: Option<&PolylineOptions>,
    ) -> Result<String> {
        let mut command = Command::livemap("drawPolyline").encoded(coordinates)?;
        if let Some(options) = options {
            command = command.encoded(options)?;
        }
        self.call(&command.project(PROJECT_ID)).await
    }

    pub fn remove_polyline(&self, id: &str) {
        self.send(&Command::livemap("removePolyline").arg(json!(id)));
    }

    /// Add a marker and return its id.
    pub async fn add_marker(&self, marker: &Marker) -> Result<String> {
        let command = Command::livemap("addMarker").encoded(marker)?.project(PROJECT_ID);
        self.call(&command).await
    }

    pub fn remove_marker(&self, id: &str) {
        self.send(&Command::livemap("removeMarker").arg(json!(id)));
    }

    // -- Positioning --------------------------------------------------------

    /// Turn off the web app's own positioning. `set_user_location` still works.
    pub fn disable_positioning_system(&self) {
        self.send(&Command::livemap("disablePositioningSystem"));
    }

    pub async fn disable_positioning_system_and_wait(&self) -> Result<()> {
        self.call_value(&Command::livemap("disablePositioningSystem"))
            .await
            .map(drop)
    }

    /// Show the user marker at `location` (on its floor for indoor maps).
    pub fn set_user_location(&self, location: &Coordinates) -> Result<()> {
        self.send(&Command::livemap("setUserLocation").encoded(location)?);
        Ok(())
    }

    pub async fn set_user_location_and_wait(&self, location: &Coordinates) -> Result<()> {
        let command = Command::livemap("setUserLocation").encoded(location)?;
        self.call_value(&command).await.map(drop)
    }

    pub async fn get_user_location(&self) -> Result<Coordinates> {
        self.call(&Command::livemap("getUserLocation")).await
    }

    pub async fn get_device_attitude(&self) -> Result<Attitude> {
        self.call(&Command::livemap("getDeviceAttitude")).await
    }

    pub fn set_device_attitude(&self, attitude: &Attitude) -> Result<()> {
        self.send(&Command::livemap("setDeviceAttitude").encoded(attitude)?);
        Ok(())
    }

    pub async fn set_device_attitude_and_wait(&self, attitude: &Attitude) -> Result<()> {
        let command = Command::livemap("setDeviceAttitude").encoded(attitude)?;
        self.call_value(&command).await.map(drop)
    }

    /// Push a fix from a native location provider to the web provider
    /// callback, which takes the fix as JSON text.
    pub fn provide_location(&self, location: &ProviderLocation) -> Result<()> {
        let text = codec::encode_string(location)?;
        self.send(&Command::new(POLESTAR_PROVIDER, "callbackPosition").arg(Value::String(text)));
        Ok(())
    }

    // -- AR -----------------------------------------------------------------

    pub fn force_ar_view_mode(&self, mode: ArViewMode) {
        self.send(&Command::livemap("forceARViewMode").arg(json!(mode.as_str())));
    }

    pub fn set_permissions_denied(&self, permissions: &[Permission]) {
        let names: Vec<&str> = permissions.iter().map(Permission::as_str).collect();
        self.send(&Command::livemap("setPermissionsDenied").arg(json!(names)));
    }

    /// Ask the page to start the native camera. The page answers on the
    /// `onStartCamera` channel.
    pub fn enable_camera_native(&self) {
        self.send(&Command::new(WEMAP_SDK, "enableCameraNative"));
    }

    /// Ask the page to stop the native camera. The page answers on the
    /// `onStopCamera` channel.
    pub fn disable_camera_native(&self) {
        self.send(&Command::new(WEMAP_SDK, "disableCameraNative"));
    }
}

impl std::fmt::Debug for Livemap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Livemap")
            .field("runtime", &self.runtime.platform_name())
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}
