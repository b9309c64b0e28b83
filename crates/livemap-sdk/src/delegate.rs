// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Host-facing callbacks. Every method has an empty default, so a delegate
// implements only the events it cares about.

use livemap_core::error::LivemapError;
use livemap_core::geo::{Coordinates, MapMoved};
use livemap_core::types::{ContentUpdatedQuery, Event, IndoorFeature, IndoorLevel, Pinpoint};

use crate::command::Livemap;
use crate::events::{ActionTarget, ContentUpdate, MapEvent};

/// Receives map events. `map` is the command handle of the session that
/// produced the event.
#[allow(unused_variables)]
pub trait LivemapDelegate {
    /// The web application finished its own initialisation. Commands sent
    /// before this point may be ignored by the page.
    fn wait_for_ready(&self, map: &Livemap) {}

    /// The page URL changed. `previous` and `next` always differ.
    fn on_url_change(&self, map: &Livemap, previous: &str, next: &str) {}

    /// A navigation failed. Session state is left as it was.
    fn on_navigation_failed(&self, map: &Livemap, error: &LivemapError) {}

    fn on_event_open(&self, map: &Livemap, event: &Event) {}

    fn on_event_close(&self, map: &Livemap) {}

    fn on_pinpoint_open(&self, map: &Livemap, pinpoint: &Pinpoint) {}

    fn on_pinpoint_close(&self, map: &Livemap) {}

    fn on_guiding_started(&self, map: &Livemap) {}

    fn on_guiding_stopped(&self, map: &Livemap) {}

    fn on_user_login(&self, map: &Livemap) {}

    fn on_user_logout(&self, map: &Livemap) {}

    fn on_action_button_click(&self, map: &Livemap, target: &ActionTarget, action_type: &str) {}

    /// Search results changed.
    fn on_content_updated(&self, map: &Livemap, update: &ContentUpdate, query: &ContentUpdatedQuery) {}

    fn on_map_moved(&self, map: &Livemap, moved: &MapMoved) {}

    fn on_map_click(&self, map: &Livemap, coordinates: &Coordinates) {}

    fn on_map_long_click(&self, map: &Livemap, coordinates: &Coordinates) {}

    fn on_indoor_feature_click(&self, map: &Livemap, feature: &IndoorFeature) {}

    fn on_indoor_level_changed(&self, map: &Livemap, level: &IndoorLevel) {}

    fn on_indoor_levels_changed(&self, map: &Livemap, levels: &[IndoorLevel]) {}

    /// The page gave up on features whose permission was refused.
    fn on_permissions_denied(&self, map: &Livemap, permissions: &[String]) {}

    /// The booking button of an open event was tapped.
    fn on_book_event_clicked(&self, map: &Livemap, event: &Event) {}

    /// The itinerary button of an open pinpoint was tapped.
    fn on_go_to_pinpoint_clicked(&self, map: &Livemap, pinpoint: &Pinpoint) {}
}

/// Delegate that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDelegate;

impl LivemapDelegate for NoDelegate {}

/// Route a decoded event to its delegate method.
pub(crate) fn deliver(delegate: &dyn LivemapDelegate, map: &Livemap, event: &MapEvent) {
    match event {
        MapEvent::EventOpen(e) => delegate.on_event_open(map, e),
        MapEvent::EventClose => delegate.on_event_close(map),
        MapEvent::PinpointOpen(p) => delegate.on_pinpoint_open(map, p),
        MapEvent::PinpointClose => delegate.on_pinpoint_close(map),
        MapEvent::GuidingStarted => delegate.on_guiding_started(map),
        MapEvent::GuidingStopped => delegate.on_guiding_stopped(map),
        MapEvent::UserLogin => delegate.on_user_login(map),
        MapEvent::UserLogout => delegate.on_user_logout(map),
        MapEvent::ActionButtonClick {
            target,
            action_type,
        } => delegate.on_action_button_click(map, target, action_type),
        MapEvent::ContentUpdated { update, query } => delegate.on_content_updated(map, update, query),
        MapEvent::MapMoved(moved) => delegate.on_map_moved(map, moved),
        MapEvent::MapClick(c) => delegate.on_map_click(map, c),
        MapEvent::MapLongClick(c) => delegate.on_map_long_click(map, c),
        MapEvent::IndoorFeatureClick(f) => delegate.on_indoor_feature_click(map, f),
        MapEvent::IndoorLevelChanged(l) => delegate.on_indoor_level_changed(map, l),
        MapEvent::IndoorLevelsChanged(levels) => delegate.on_indoor_levels_changed(map, levels),
        MapEvent::PermissionsDenied(names) => delegate.on_permissions_denied(map, names),
        MapEvent::BookEventClicked(e) => delegate.on_book_event_clicked(map, e),
        MapEvent::GoToPinpointClicked(p) => delegate.on_go_to_pinpoint_clicked(map, p),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeRuntime, RecordingDelegate};

    #[test]
    fn unimplemented_handlers_are_no_ops() {
        let fake = FakeRuntime::new();
        let map = Livemap::with_default_timeout(fake.clone());

        deliver(&NoDelegate, &map, &MapEvent::GuidingStopped);
        deliver(&NoDelegate, &map, &MapEvent::PermissionsDenied(vec!["camera".into()]));
        assert!(fake.scripts().is_empty());
    }

    #[test]
    fn delivers_to_matching_handler() {
        let fake = FakeRuntime::new();
        let map = Livemap::with_default_timeout(fake.clone());
        let delegate = RecordingDelegate::new();

        deliver(&*delegate, &map, &MapEvent::MapClick(Coordinates::new(1.5, 2.5)));
        deliver(&*delegate, &map, &MapEvent::UserLogin);
        // No recording override: default no-op.
        deliver(&*delegate, &map, &MapEvent::UserLogout);

        assert_eq!(delegate.calls(), vec!["click 1.5 2.5", "user_login"]);
    }

    struct OpensOnClick;

    impl LivemapDelegate for OpensOnClick {
        fn on_pinpoint_close(&self, map: &Livemap) {
            map.open_pinpoint(1);
        }
    }

    #[test]
    fn handlers_can_issue_commands() {
        let fake = FakeRuntime::new();
        let map = Livemap::with_default_timeout(fake.clone());

        deliver(&OpensOnClick, &map, &MapEvent::PinpointClose);
        assert_eq!(fake.scripts(), vec!["promise = window.livemap.openPinpoint(1);"]);
    }
}
