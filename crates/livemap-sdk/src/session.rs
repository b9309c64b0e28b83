// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge session: one per embedded web runtime.
//
// Lifecycle:
//   Constructed --load()--> Loading --navigation finished--> Loaded
//     --readiness probe injected--> Handshaking --onLoadingFinished--> Ready
//
// `is_ready` only becomes true once the page finished loading *and* the web
// application's own ready promise resolved. Every finished navigation is a new
// document, so readiness and listener attachment start over. URL changes are
// tracked independently of the lifecycle.
//
// The session is confined to the thread that owns the web view; it is
// neither `Send` nor `Sync`.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use livemap_bridge::traits::{HostBridge, LocationProviderFactory, RuntimeSignal, WebRuntime};
use livemap_core::config::LivemapConfig;
use livemap_core::error::{LivemapError, Result};
use livemap_core::types::SessionId;

use crate::camera::CameraGate;
use crate::channel::{CHANNELS, Channel};
use crate::command::Livemap;
use crate::delegate::{LivemapDelegate, deliver};
use crate::events::MapEvent;
use crate::positioning::PositioningProxy;
use crate::scripts;

/// Where the session is in the page load handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Constructed,
    Loading,
    Loaded,
    Handshaking,
    Ready,
}

/// Device capabilities available to a session.
#[derive(Clone)]
pub struct Capabilities {
    pub host: Rc<dyn HostBridge>,
    pub positioning: Rc<dyn LocationProviderFactory>,
}

impl Capabilities {
    pub fn new(host: Rc<dyn HostBridge>, positioning: Rc<dyn LocationProviderFactory>) -> Self {
        Self { host, positioning }
    }

    /// The host bridge of the current platform, without vendor positioning.
    pub fn platform() -> Self {
        Self::new(
            livemap_bridge::platform_host(),
            livemap_bridge::platform_positioning(),
        )
    }
}

pub struct LivemapSession {
    id: SessionId,
    config: LivemapConfig,
    map: Livemap,
    delegate: Rc<dyn LivemapDelegate>,
    camera: CameraGate,
    positioning: PositioningProxy,
    state: Cell<LifecycleState>,
    is_ready: Cell<bool>,
    listeners_attached: Cell<bool>,
    current_url: RefCell<String>,
    registered: RefCell<BTreeSet<Channel>>,
}

impl LivemapSession {
    /// Create a session and register every message channel on `runtime`.
    pub fn new(
        runtime: Rc<dyn WebRuntime>,
        config: LivemapConfig,
        delegate: Rc<dyn LivemapDelegate>,
        capabilities: Capabilities,
    ) -> Result<Self> {
        let map = Livemap::new(runtime, config.call_timeout());
        let session = Self {
            id: SessionId::new(),
            config,
            map,
            delegate,
            camera: CameraGate::new(capabilities.host),
            positioning: PositioningProxy::new(capabilities.positioning),
            state: Cell::new(LifecycleState::Constructed),
            is_ready: Cell::new(false),
            listeners_attached: Cell::new(false),
            current_url: RefCell::new(String::new()),
            registered: RefCell::new(BTreeSet::new()),
        };
        session.register_channels()?;
        info!(
            session = %session.id,
            runtime = session.map.runtime().platform_name(),
            "livemap session created"
        );
        Ok(session)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn config(&self) -> &LivemapConfig {
        &self.config
    }

    /// Command handle for this session's map.
    pub fn map(&self) -> &Livemap {
        &self.map
    }

    pub fn state(&self) -> LifecycleState {
        self.state.get()
    }

    pub fn is_ready(&self) -> bool {
        self.is_ready.get()
    }

    /// Last known page URL; empty until the first load.
    pub fn current_url(&self) -> String {
        self.current_url.borrow().clone()
    }

    pub fn registered_channels(&self) -> Vec<&'static str> {
        self.registered.borrow().iter().map(|c| c.name()).collect()
    }

    pub fn camera(&self) -> &CameraGate {
        &self.camera
    }

    pub fn positioning(&self) -> &PositioningProxy {
        &self.positioning
    }

    fn register_channels(&self) -> Result<()> {
        for (name, channel) in CHANNELS {
            if self.registered.borrow().contains(&channel) {
                continue;
            }
            self.map.runtime().register_channel(name)?;
            self.registered.borrow_mut().insert(channel);
        }
        Ok(())
    }

    /// Build the content URL from the configuration and start loading it.
    #[instrument(skip(self), fields(session = %self.id))]
    pub fn load(&self) -> Result<()> {
        let url = self.config.content_url()?;
        self.map.runtime().load_url(url.as_str())?;

        self.is_ready.set(false);
        self.listeners_attached.set(false);
        self.state.set(LifecycleState::Loading);

        let first_load = self.current_url.borrow().is_empty();
        if first_load {
            *self.current_url.borrow_mut() = url.to_string();
        }
        info!(%url, anonymous = self.config.is_anonymous(), "loading livemap");
        Ok(())
    }

    /// Entry point for everything the web runtime reports.
    pub fn handle_signal(&self, signal: RuntimeSignal) {
        match signal {
            RuntimeSignal::Message { channel, body } => self.on_message(&channel, body),
            RuntimeSignal::NavigationCommitted { url } => self.on_navigation_committed(url.as_deref()),
            RuntimeSignal::UrlChanged { url } => self.on_url_changed(&url),
            RuntimeSignal::NavigationFinished => self.on_navigation_finished(),
            RuntimeSignal::NavigationFailed { reason } => self.on_navigation_failed(&reason),
        }
    }

    pub fn on_navigation_committed(&self, url: Option<&str>) {
        if let Some(url) = url {
            self.on_url_changed(url);
        }
        if self.config.enable_positioning {
            self.positioning.install(&self.map);
        }
    }

    /// The page finished loading: probe for the web application's readiness.
    #[instrument(skip(self), fields(session = %self.id))]
    pub fn on_navigation_finished(&self) {
        let previous = self.state.get();
        if previous != LifecycleState::Loading {
            debug!(state = ?previous, "navigation finished outside load(), treating as a new page");
        }
        self.is_ready.set(false);
        self.listeners_attached.set(false);
        self.state.set(LifecycleState::Loaded);

        let runtime = self.map.runtime();
        runtime.evaluate_script(&scripts::readiness_probe(&**runtime));
        self.state.set(LifecycleState::Handshaking);
    }

    /// Navigation failed. Logged and reported to the delegate; the lifecycle
    /// state is left as it was.
    pub fn on_navigation_failed(&self, reason: &str) {
        let err = LivemapError::Navigation(reason.to_string());
        error!(session = %self.id, state = ?self.state.get(), error = %err, "navigation failed");
        self.delegate.on_navigation_failed(&self.map, &err);
    }

    /// Report a URL change to the delegate when `url` differs from the last
    /// known one.
    pub fn on_url_changed(&self, url: &str) {
        let previous = {
            let current = self.current_url.borrow();
            if current.as_str() == url {
                return;
            }
            current.clone()
        };
        *self.current_url.borrow_mut() = url.to_string();
        debug!(session = %self.id, %previous, next = url, "url changed");
        self.delegate.on_url_change(&self.map, &previous, url);
    }

    /// A page script posted `body` on `channel`.
    #[instrument(skip(self, body), fields(session = %self.id))]
    pub fn on_message(&self, channel: &str, body: Value) {
        let channel = match Channel::from_name(channel) {
            Ok(channel) => channel,
            Err(e) => {
                warn!(error = %e, "discarding message");
                return;
            }
        };

        match channel {
            Channel::LoadingFinished => self.on_ready_signal(),
            Channel::ParametersLoaded => debug!("web parameters loaded"),
            Channel::Log => {
                let message = body.as_str().map(str::to_owned).unwrap_or_else(|| body.to_string());
                debug!(target: "livemap::web", session = %self.id, %message);
            }
            Channel::StartCamera => self.camera.start(&self.map),
            Channel::StopCamera => self.camera.stop(),
            c if c.is_positioning() => self.positioning.handle(c, &body, &self.map),
            _ => match MapEvent::decode(channel, body) {
                Ok(Some(event)) => deliver(&*self.delegate, &self.map, &event),
                Ok(None) => {}
                Err(e) => warn!(%channel, error = %e, "discarding undecodable payload"),
            },
        }
    }

    fn on_ready_signal(&self) {
        match self.state.get() {
            LifecycleState::Loaded | LifecycleState::Handshaking => {}
            state => {
                debug!(?state, "ignoring ready signal");
                return;
            }
        }

        if !self.listeners_attached.replace(true) {
            let runtime = self.map.runtime();
            runtime.evaluate_script(&scripts::listener_script(&**runtime));
        }
        self.is_ready.set(true);
        self.state.set(LifecycleState::Ready);
        info!("livemap ready");
        self.delegate.wait_for_ready(&self.map);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delegate::NoDelegate;
    use crate::testing::{FakeHost, FakePositioning, FakeRuntime, RecordingDelegate};
    use livemap_bridge::stub::{NoPositioning, StubHost};
    use livemap_core::types::PermissionState;
    use rstest::rstest;
    use serde_json::{Value, json};

    const READY: &str = "onLoadingFinished";

    struct Harness {
        fake: Rc<FakeRuntime>,
        delegate: Rc<RecordingDelegate>,
        session: LivemapSession,
    }

    fn harness_with(config: LivemapConfig, capabilities: Capabilities) -> Harness {
        let fake = FakeRuntime::new();
        let delegate = RecordingDelegate::new();
        let session = LivemapSession::new(fake.clone(), config, delegate.clone(), capabilities)
            .expect("session");
        Harness {
            fake,
            delegate,
            session,
        }
    }

    fn harness() -> Harness {
        harness_with(
            LivemapConfig::new("T", 42),
            Capabilities::new(Rc::new(StubHost), Rc::new(NoPositioning)),
        )
    }

    fn ready(h: &Harness) {
        h.session.load().expect("load");
        h.session.handle_signal(RuntimeSignal::NavigationFinished);
        h.session.on_message(READY, json!({ "type": "livemapReady" }));
    }

    #[test]
    fn registers_every_channel_once() {
        let h = harness();
        assert_eq!(h.fake.channels().len(), CHANNELS.len());
        assert_eq!(h.session.registered_channels().len(), CHANNELS.len());

        h.session.register_channels().expect("re-register");
        assert_eq!(h.fake.channels().len(), CHANNELS.len());
        assert_eq!(h.session.state(), LifecycleState::Constructed);
    }

    #[test]
    fn load_builds_url_and_enters_loading() {
        let h = harness();
        h.session.load().expect("load");

        let loaded = h.fake.loaded_urls();
        assert_eq!(
            loaded,
            vec!["https://livemap.getwemap.com/dom.html?token=T&emmid=42&clicktofullscreen=false"]
        );
        assert_eq!(h.session.state(), LifecycleState::Loading);
        assert_eq!(h.session.current_url(), loaded[0]);
        assert!(!h.session.is_ready());
    }

    #[test]
    fn failed_load_keeps_state() {
        let h = harness();
        h.fake.fail_loads();
        assert!(h.session.load().is_err());
        assert_eq!(h.session.state(), LifecycleState::Constructed);
        assert_eq!(h.session.current_url(), "");
    }

    #[test]
    fn handshake_reaches_ready_once() {
        let h = harness();
        h.session.load().expect("load");

        h.session.handle_signal(RuntimeSignal::NavigationFinished);
        assert_eq!(h.session.state(), LifecycleState::Handshaking);
        assert_eq!(h.fake.scripts_containing("waitForReady().then(() =>"), 1);
        assert!(!h.session.is_ready());

        h.session.on_message(READY, json!({ "type": "livemapReady" }));
        h.session.on_message(READY, json!({ "type": "livemapReady" }));

        assert!(h.session.is_ready());
        assert_eq!(h.session.state(), LifecycleState::Ready);
        assert_eq!(h.delegate.count("ready"), 1);
        assert_eq!(h.fake.scripts_containing("addEventListener('eventOpen'"), 1);
    }

    #[test]
    fn ready_before_page_load_is_ignored() {
        let h = harness();
        h.session.load().expect("load");
        h.session.on_message(READY, json!({}));

        assert!(!h.session.is_ready());
        assert_eq!(h.session.state(), LifecycleState::Loading);
        assert_eq!(h.delegate.count("ready"), 0);
    }

    #[test]
    fn reload_fires_ready_again() {
        let h = harness();
        ready(&h);
        ready(&h);

        assert_eq!(h.delegate.count("ready"), 2);
        assert_eq!(h.fake.scripts_containing("addEventListener('eventOpen'"), 2);
    }

    #[test]
    fn unknown_channel_leaves_state_untouched() {
        let h = harness();
        h.session.load().expect("load");
        h.session.on_navigation_finished();

        h.session.on_message("onFloorChanged", json!({ "floor": 1 }));

        assert_eq!(h.session.state(), LifecycleState::Handshaking);
        assert!(!h.session.is_ready());
        assert!(h.delegate.calls().is_empty());
    }

    #[test]
    fn malformed_payload_is_dropped() {
        let h = harness();
        ready(&h);

        h.session.on_message("onMapClick", json!({ "longitude": 3.88 }));
        h.session.on_message("onPinpointOpen", json!("not an object"));

        assert!(h.session.is_ready());
        assert_eq!(h.delegate.calls(), vec!["ready"]);
    }

    #[test]
    fn map_events_reach_delegate() {
        let h = harness();
        ready(&h);

        let pinpoint = json!({
            "id": 5, "latitude": 1.0, "longitude": 2.0, "name": "P", "description": "",
        });
        h.session.on_message(
            "onActionButtonClick",
            json!({ "itemType": "pinpoint", "item": pinpoint, "actionType": "share" }),
        );
        h.session.on_message("onMapClick", json!({ "latitude": 1.5, "longitude": 2.5 }));
        h.session.on_message("onIndoorFeatureClick", json!({ "wemapId": 77 }));
        h.session.on_message("log", json!("hello from the page"));
        h.session.on_message("parametersLoaded", json!({}));

        assert_eq!(
            h.delegate.calls(),
            vec!["ready", "action pinpoint 5 share", "click 1.5 2.5", "indoor_feature 77"]
        );
    }

    fn place(id: i64) -> Value {
        json!({ "id": id, "latitude": 43.61, "longitude": 3.88, "name": "P", "description": "" })
    }

    #[rstest]
    #[case::pinpoints(
        json!({ "type": "pinpoints", "items": [place(1), place(2)], "query": { "query": "parc" } }),
        Some("content pinpoints 2 parc")
    )]
    #[case::events(
        json!({
            "type": "events",
            "items": [{ "id": 9, "name": "Concert", "description": "", "point": place(1), "dates": [] }],
            "query": {},
        }),
        Some("content events 1 ")
    )]
    #[case::unknown_type(json!({ "type": "lists", "items": [], "query": {} }), None)]
    fn content_updates_route_by_type(#[case] payload: Value, #[case] expected: Option<&str>) {
        let h = harness();
        ready(&h);

        h.session.on_message("onContentUpdated", payload);

        assert_eq!(h.delegate.count("content"), usize::from(expected.is_some()));
        if let Some(expected) = expected {
            assert_eq!(h.delegate.calls().last().map(String::as_str), Some(expected));
        }
        assert!(h.session.is_ready());
    }

    #[test]
    fn url_change_fires_only_on_difference() {
        let h = harness();
        h.session.load().expect("load");
        let first = h.session.current_url();

        h.session.on_url_changed(&first);
        h.session.handle_signal(RuntimeSignal::NavigationCommitted {
            url: Some(first.clone()),
        });
        assert!(h.delegate.calls().is_empty());

        let next = format!("{first}#/pinpoints/5");
        h.session.handle_signal(RuntimeSignal::UrlChanged { url: next.clone() });
        h.session.handle_signal(RuntimeSignal::UrlChanged { url: next.clone() });

        assert_eq!(h.delegate.calls(), vec![format!("url {first} -> {next}")]);
        assert_eq!(h.session.current_url(), next);
    }

    #[test]
    fn url_change_works_before_load() {
        let h = harness();
        h.session.on_url_changed("about:blank");
        assert_eq!(h.delegate.calls(), vec!["url  -> about:blank"]);
        assert_eq!(h.session.state(), LifecycleState::Constructed);
    }

    #[test]
    fn navigation_failure_reaches_hook_without_state_change() {
        let h = harness();
        h.session.load().expect("load");
        h.session.handle_signal(RuntimeSignal::NavigationFailed {
            reason: "offline".into(),
        });

        assert_eq!(h.session.state(), LifecycleState::Loading);
        assert_eq!(h.delegate.calls(), vec!["navigation_failed navigation failed: offline"]);
    }

    #[test]
    fn camera_denial_through_session() {
        let host = FakeHost::new(PermissionState::Denied);
        let h = harness_with(
            LivemapConfig::new("T", 42),
            Capabilities::new(host.clone(), Rc::new(NoPositioning)),
        );
        ready(&h);
        h.fake.clear_scripts();

        h.session.on_message("onStartCamera", json!({ "type": "cameraStarted" }));

        assert_eq!(host.last_visibility(), Some(false));
        assert_eq!(h.fake.scripts_containing(r#"setPermissionsDenied(["camera"])"#), 1);
        assert_eq!(h.fake.scripts_containing("disableCameraNative()"), 1);
        assert_eq!(h.fake.scripts_containing(r#"forceARViewMode("OFF")"#), 1);

        h.session.on_message("onStopCamera", json!({}));
        assert_eq!(host.last_visibility(), Some(false));
    }

    #[test]
    fn positioning_binding_follows_config() {
        let positioning = FakePositioning::new();
        let enabled = harness_with(
            LivemapConfig::new("T", 42).with_positioning(true),
            Capabilities::new(Rc::new(StubHost), positioning.clone()),
        );
        enabled.session.on_navigation_committed(None);
        assert_eq!(enabled.fake.scripts_containing("getPoleStarProvider"), 1);

        enabled
            .session
            .on_message("setPolestarLocationProviderApiKey", json!("secret"));
        enabled.session.on_message("startPolestarLocationProvider", json!(""));
        assert_eq!(*positioning.log.created_with.borrow(), vec!["secret"]);
        assert!(enabled.session.positioning().is_running());

        let disabled = harness_with(
            LivemapConfig::new("T", 42),
            Capabilities::new(Rc::new(StubHost), FakePositioning::new()),
        );
        disabled.session.on_navigation_committed(None);
        assert!(disabled.fake.scripts().is_empty());
    }

    #[test]
    fn sessions_are_independent() {
        let a = harness();
        let b = harness();
        ready(&a);

        assert!(a.session.is_ready());
        assert!(!b.session.is_ready());
        assert_ne!(a.session.id(), b.session.id());
        assert!(b.fake.scripts().is_empty());
    }

    #[test]
    fn anonymous_session_loads_fixed_parameters() {
        let fake = FakeRuntime::new();
        let session = LivemapSession::new(
            fake.clone(),
            LivemapConfig::anonymous(),
            Rc::new(NoDelegate),
            Capabilities::platform(),
        )
        .expect("session");
        session.load().expect("load");

        let url = &fake.loaded_urls()[0];
        assert!(url.contains("dist=ufe"), "{url}");
        assert!(!url.contains("token="), "{url}");
    }

    #[tokio::test]
    async fn delegate_handle_drives_async_calls() {
        let h = harness();
        ready(&h);
        h.fake.respond(Ok(json!(15.5)));

        let zoom = h.session.map().get_zoom().await.expect("zoom");
        assert_eq!(zoom, 15.5);
    }
}
