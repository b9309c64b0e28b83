// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recording fakes for the bridge traits, shared by the unit tests of every
// module in this crate.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use livemap_bridge::traits::*;
use livemap_core::error::{LivemapError, Result};
use livemap_core::geo::Coordinates;
use livemap_core::types::{
    Event, IndoorFeature, IndoorLevel, Permission, PermissionState, Pinpoint, ProviderLocation,
};
use livemap_core::{ContentUpdatedQuery, MapMoved};

use crate::command::Livemap;
use crate::delegate::LivemapDelegate;
use crate::events::{ActionTarget, ContentUpdate};

// ---------------------------------------------------------------------------
// Web runtime
// ---------------------------------------------------------------------------

/// Web runtime that records every script and answers async calls from a
/// queue of canned outcomes. Calls with no canned outcome stay pending.
#[derive(Default)]
pub struct FakeRuntime {
    channels: RefCell<Vec<String>>,
    loaded: RefCell<Vec<String>>,
    scripts: RefCell<Vec<String>>,
    async_calls: RefCell<Vec<String>>,
    responses: RefCell<VecDeque<ScriptOutcome>>,
    pending: RefCell<Vec<ScriptCompletion>>,
    fail_loads: Cell<bool>,
}

impl FakeRuntime {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Queue the outcome of the next async call.
    pub fn respond(&self, outcome: ScriptOutcome) {
        self.responses.borrow_mut().push_back(outcome);
    }

    pub fn fail_loads(&self) {
        self.fail_loads.set(true);
    }

    pub fn channels(&self) -> Vec<String> {
        self.channels.borrow().clone()
    }

    pub fn loaded_urls(&self) -> Vec<String> {
        self.loaded.borrow().clone()
    }

    pub fn scripts(&self) -> Vec<String> {
        self.scripts.borrow().clone()
    }

    pub fn async_calls(&self) -> Vec<String> {
        self.async_calls.borrow().clone()
    }

    pub fn pending_calls(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Complete the oldest pending async call with `outcome`.
    pub fn complete_pending(&self, outcome: ScriptOutcome) {
        let completion = {
            let mut pending = self.pending.borrow_mut();
            (!pending.is_empty()).then(|| pending.remove(0))
        };
        if let Some(completion) = completion {
            completion(outcome);
        }
    }

    /// Scripts that contain `needle`.
    pub fn scripts_containing(&self, needle: &str) -> usize {
        self.scripts.borrow().iter().filter(|s| s.contains(needle)).count()
    }

    pub fn clear_scripts(&self) {
        self.scripts.borrow_mut().clear();
    }
}

impl WebRuntime for FakeRuntime {
    fn platform_name(&self) -> &str {
        "fake"
    }

    fn register_channel(&self, name: &str) -> Result<()> {
        self.channels.borrow_mut().push(name.to_string());
        Ok(())
    }

    fn load_url(&self, url: &str) -> Result<()> {
        if self.fail_loads.get() {
            return Err(LivemapError::Bridge("load refused".into()));
        }
        self.loaded.borrow_mut().push(url.to_string());
        Ok(())
    }

    fn evaluate_script(&self, script: &str) {
        self.scripts.borrow_mut().push(script.to_string());
    }

    fn call_async_script(&self, body: &str, completion: ScriptCompletion) {
        self.async_calls.borrow_mut().push(body.to_string());
        let canned = self.responses.borrow_mut().pop_front();
        match canned {
            Some(outcome) => completion(outcome),
            None => self.pending.borrow_mut().push(completion),
        }
    }
}

// ---------------------------------------------------------------------------
// Host capabilities
// ---------------------------------------------------------------------------

/// Camera host with a scripted authorization status and prompt answer.
///
/// When `answer` is `None` the prompt stays open until [`FakeHost::answer`].
pub struct FakeHost {
    pub status: Cell<PermissionState>,
    pub prompt_answer: Cell<Option<bool>>,
    pub camera_present: Cell<bool>,
    pub visibility: RefCell<Vec<bool>>,
    pub requests: Cell<usize>,
    open_prompt: RefCell<Option<PermissionCompletion>>,
}

impl FakeHost {
    pub fn new(status: PermissionState) -> Rc<Self> {
        Rc::new(Self {
            status: Cell::new(status),
            prompt_answer: Cell::new(None),
            camera_present: Cell::new(true),
            visibility: RefCell::new(Vec::new()),
            requests: Cell::new(0),
            open_prompt: RefCell::new(None),
        })
    }

    /// Answer an open permission prompt.
    pub fn answer(&self, granted: bool) {
        let completion = self.open_prompt.borrow_mut().take();
        if let Some(completion) = completion {
            completion(granted);
        }
    }

    pub fn last_visibility(&self) -> Option<bool> {
        self.visibility.borrow().last().copied()
    }
}

impl HostBridge for FakeHost {
    fn platform_name(&self) -> &str {
        "fake"
    }
}

impl PermissionProvider for FakeHost {
    fn status(&self, _permission: Permission) -> PermissionState {
        self.status.get()
    }

    fn request(&self, _permission: Permission, completion: PermissionCompletion) {
        self.requests.set(self.requests.get() + 1);
        match self.prompt_answer.get() {
            Some(granted) => completion(granted),
            None => *self.open_prompt.borrow_mut() = Some(completion),
        }
    }
}

impl CameraOverlay for FakeHost {
    fn is_available(&self) -> bool {
        self.camera_present.get()
    }

    fn set_visible(&self, visible: bool) {
        self.visibility.borrow_mut().push(visible);
    }
}

/// Shared log of what fake providers were asked to do.
#[derive(Default)]
pub struct ProviderLog {
    pub created_with: RefCell<Vec<String>>,
    pub starts: Cell<usize>,
    pub stops: Cell<usize>,
    pub callback: RefCell<Option<LocationCallback>>,
}

impl ProviderLog {
    /// Deliver a fix through the callback of the most recent provider.
    pub fn emit(&self, location: ProviderLocation) {
        if let Some(callback) = self.callback.borrow_mut().as_mut() {
            callback(location);
        }
    }
}

pub struct FakePositioning {
    pub log: Rc<ProviderLog>,
}

impl FakePositioning {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            log: Rc::new(ProviderLog::default()),
        })
    }
}

struct FakeProvider {
    log: Rc<ProviderLog>,
}

impl LocationProvider for FakeProvider {
    fn start(&mut self) -> Result<()> {
        self.log.starts.set(self.log.starts.get() + 1);
        Ok(())
    }

    fn stop(&mut self) {
        self.log.stops.set(self.log.stops.get() + 1);
    }
}

impl LocationProviderFactory for FakePositioning {
    fn is_available(&self) -> bool {
        true
    }

    fn create(
        &self,
        api_key: &str,
        on_location: LocationCallback,
    ) -> Result<Box<dyn LocationProvider>> {
        self.log.created_with.borrow_mut().push(api_key.to_string());
        *self.log.callback.borrow_mut() = Some(on_location);
        Ok(Box::new(FakeProvider {
            log: self.log.clone(),
        }))
    }
}

// ---------------------------------------------------------------------------
// Delegate
// ---------------------------------------------------------------------------

/// Delegate that writes one line per callback.
#[derive(Default)]
pub struct RecordingDelegate {
    pub calls: RefCell<Vec<String>>,
}

impl RecordingDelegate {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls.borrow().iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn push(&self, entry: String) {
        self.calls.borrow_mut().push(entry);
    }
}

impl LivemapDelegate for RecordingDelegate {
    fn wait_for_ready(&self, _map: &Livemap) {
        self.push("ready".into());
    }

    fn on_url_change(&self, _map: &Livemap, previous: &str, next: &str) {
        self.push(format!("url {previous} -> {next}"));
    }

    fn on_event_open(&self, _map: &Livemap, event: &Event) {
        self.push(format!("event_open {}", event.id));
    }

    fn on_event_close(&self, _map: &Livemap) {
        self.push("event_close".into());
    }

    fn on_pinpoint_open(&self, _map: &Livemap, pinpoint: &Pinpoint) {
        self.push(format!("pinpoint_open {}", pinpoint.id));
    }

    fn on_pinpoint_close(&self, _map: &Livemap) {
        self.push("pinpoint_close".into());
    }

    fn on_guiding_started(&self, _map: &Livemap) {
        self.push("guiding_started".into());
    }

    fn on_user_login(&self, _map: &Livemap) {
        self.push("user_login".into());
    }

    fn on_action_button_click(&self, _map: &Livemap, target: &ActionTarget, action_type: &str) {
        let entry = match target {
            ActionTarget::Pinpoint(p) => format!("action pinpoint {} {action_type}", p.id),
            ActionTarget::Event(e) => format!("action event {} {action_type}", e.id),
        };
        self.push(entry);
    }

    fn on_content_updated(&self, _map: &Livemap, update: &ContentUpdate, query: &ContentUpdatedQuery) {
        let query = query.query.clone().unwrap_or_default();
        let entry = match update {
            ContentUpdate::Pinpoints(items) => format!("content pinpoints {} {query}", items.len()),
            ContentUpdate::Events(items) => format!("content events {} {query}", items.len()),
        };
        self.push(entry);
    }

    fn on_map_moved(&self, _map: &Livemap, moved: &MapMoved) {
        self.push(format!("moved {:?}", moved.zoom));
    }

    fn on_map_click(&self, _map: &Livemap, coordinates: &Coordinates) {
        self.push(format!("click {} {}", coordinates.latitude, coordinates.longitude));
    }

    fn on_indoor_feature_click(&self, _map: &Livemap, feature: &IndoorFeature) {
        self.push(format!("indoor_feature {}", feature.wemap_id));
    }

    fn on_indoor_level_changed(&self, _map: &Livemap, level: &IndoorLevel) {
        self.push(format!("indoor_level {}", level.short_name));
    }

    fn on_permissions_denied(&self, _map: &Livemap, permissions: &[String]) {
        self.push(format!("denied {}", permissions.join(",")));
    }

    fn on_navigation_failed(&self, _map: &Livemap, error: &LivemapError) {
        self.push(format!("navigation_failed {error}"));
    }
}
