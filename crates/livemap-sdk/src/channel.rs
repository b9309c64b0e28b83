// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The closed set of message channels the page may post to.

use std::fmt;

use livemap_core::error::{LivemapError, Result};

/// A native message channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    // Bookkeeping
    ParametersLoaded,
    LoadingFinished,
    Log,
    // Map events
    EventOpen,
    EventClose,
    PinpointOpen,
    PinpointClose,
    GuidingStarted,
    GuidingStopped,
    UserLogin,
    UserLogout,
    ActionButtonClick,
    ContentUpdated,
    LivemapMoved,
    MapClick,
    MapLongClick,
    IndoorFeatureClick,
    IndoorLevelChanged,
    IndoorLevelsChanged,
    PermissionsDenied,
    BookEventClicked,
    GoToPinpointClicked,
    // Camera
    StartCamera,
    StopCamera,
    // Native positioning provider
    SetPositioningApiKey,
    StartPositioning,
    StopPositioning,
}

/// Wire name of every channel. Registration walks this table.
pub const CHANNELS: [(&str, Channel); 27] = [
    ("parametersLoaded", Channel::ParametersLoaded),
    ("onLoadingFinished", Channel::LoadingFinished),
    ("log", Channel::Log),
    ("onEventOpen", Channel::EventOpen),
    ("onEventClose", Channel::EventClose),
    ("onPinpointOpen", Channel::PinpointOpen),
    ("onPinpointClose", Channel::PinpointClose),
    ("onGuidingStarted", Channel::GuidingStarted),
    ("onGuidingStopped", Channel::GuidingStopped),
    ("onUserLogin", Channel::UserLogin),
    ("onUserLogout", Channel::UserLogout),
    ("onActionButtonClick", Channel::ActionButtonClick),
    ("onContentUpdated", Channel::ContentUpdated),
    ("onLivemapMoved", Channel::LivemapMoved),
    ("onMapClick", Channel::MapClick),
    ("onMapLongClick", Channel::MapLongClick),
    ("onIndoorFeatureClick", Channel::IndoorFeatureClick),
    ("onIndoorLevelChanged", Channel::IndoorLevelChanged),
    ("onIndoorLevelsChanged", Channel::IndoorLevelsChanged),
    ("onPermissionsDenied", Channel::PermissionsDenied),
    ("onBookEventClicked", Channel::BookEventClicked),
    ("onGoToPinpointClicked", Channel::GoToPinpointClicked),
    ("onStartCamera", Channel::StartCamera),
    ("onStopCamera", Channel::StopCamera),
    ("setPolestarLocationProviderApiKey", Channel::SetPositioningApiKey),
    ("startPolestarLocationProvider", Channel::StartPositioning),
    ("stopPolestarLocationProvider", Channel::StopPositioning),
];

impl Channel {
    /// Look up a wire name. Names outside [`CHANNELS`] are
    /// [`LivemapError::UnsupportedChannel`].
    pub fn from_name(name: &str) -> Result<Self> {
        CHANNELS
            .iter()
            .find(|(wire, _)| *wire == name)
            .map(|(_, channel)| *channel)
            .ok_or_else(|| LivemapError::UnsupportedChannel(name.to_string()))
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::ParametersLoaded => "parametersLoaded",
            Self::LoadingFinished => "onLoadingFinished",
            Self::Log => "log",
            Self::EventOpen => "onEventOpen",
            Self::EventClose => "onEventClose",
            Self::PinpointOpen => "onPinpointOpen",
            Self::PinpointClose => "onPinpointClose",
            Self::GuidingStarted => "onGuidingStarted",
            Self::GuidingStopped => "onGuidingStopped",
            Self::UserLogin => "onUserLogin",
            Self::UserLogout => "onUserLogout",
            Self::ActionButtonClick => "onActionButtonClick",
            Self::ContentUpdated => "onContentUpdated",
            Self::LivemapMoved => "onLivemapMoved",
            Self::MapClick => "onMapClick",
            Self::MapLongClick => "onMapLongClick",
            Self::IndoorFeatureClick => "onIndoorFeatureClick",
            Self::IndoorLevelChanged => "onIndoorLevelChanged",
            Self::IndoorLevelsChanged => "onIndoorLevelsChanged",
            Self::PermissionsDenied => "onPermissionsDenied",
            Self::BookEventClicked => "onBookEventClicked",
            Self::GoToPinpointClicked => "onGoToPinpointClicked",
            Self::StartCamera => "onStartCamera",
            Self::StopCamera => "onStopCamera",
            Self::SetPositioningApiKey => "setPolestarLocationProviderApiKey",
            Self::StartPositioning => "startPolestarLocationProvider",
            Self::StopPositioning => "stopPolestarLocationProvider",
        }
    }

    /// The `window.livemap.addEventListener` event that feeds this channel,
    /// for channels wired by the listener script.
    pub fn web_event(self) -> Option<&'static str> {
        let event = match self {
            Self::EventOpen => "eventOpen",
            Self::EventClose => "eventClose",
            Self::PinpointOpen => "pinpointOpen",
            Self::PinpointClose => "pinpointClose",
            Self::GuidingStarted => "guidingStarted",
            Self::GuidingStopped => "guidingStopped",
            Self::UserLogin => "userLogin",
            Self::UserLogout => "userLogout",
            Self::ActionButtonClick => "actionButtonClick",
            Self::ContentUpdated => "contentUpdated",
            Self::LivemapMoved => "livemapMoved",
            Self::MapClick => "mapClick",
            Self::MapLongClick => "mapLongClick",
            Self::IndoorFeatureClick => "indoorFeatureClick",
            Self::IndoorLevelChanged => "indoorLevelChanged",
            Self::IndoorLevelsChanged => "indoorLevelsChanged",
            Self::PermissionsDenied => "permissionsDenied",
            _ => return None,
        };
        Some(event)
    }

    pub fn is_positioning(self) -> bool {
        matches!(
            self,
            Self::SetPositioningApiKey | Self::StartPositioning | Self::StopPositioning
        )
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn table_and_names_agree() {
        for (wire, channel) in CHANNELS {
            assert_eq!(channel.name(), wire);
            assert_eq!(Channel::from_name(wire).expect("known channel"), channel);
        }
    }

    #[test]
    fn table_has_no_duplicates() {
        let mut names: Vec<&str> = CHANNELS.iter().map(|(n, _)| *n).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), CHANNELS.len());
    }

    #[rstest]
    #[case("onFloorChanged")]
    #[case("onIndoorLevelChangedCallback")]
    #[case("OnMapClick")]
    #[case("")]
    fn unknown_names_are_unsupported(#[case] name: &str) {
        match Channel::from_name(name) {
            Err(LivemapError::UnsupportedChannel(got)) => assert_eq!(got, name),
            other => panic!("expected UnsupportedChannel, got {other:?}"),
        }
    }

    #[rstest]
    #[case(Channel::EventOpen, Some("eventOpen"))]
    #[case(Channel::ContentUpdated, Some("contentUpdated"))]
    #[case(Channel::PermissionsDenied, Some("permissionsDenied"))]
    #[case(Channel::LoadingFinished, None)]
    #[case(Channel::StartCamera, None)]
    #[case(Channel::BookEventClicked, None)]
    fn web_event_names(#[case] channel: Channel, #[case] expected: Option<&str>) {
        assert_eq!(channel.web_event(), expected);
    }

    #[test]
    fn positioning_channels() {
        let positioning: Vec<Channel> = CHANNELS
            .iter()
            .map(|(_, c)| *c)
            .filter(|c| c.is_positioning())
            .collect();
        assert_eq!(
            positioning,
            vec![
                Channel::SetPositioningApiKey,
                Channel::StartPositioning,
                Channel::StopPositioning
            ]
        );
    }
}
