// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Typed decoding of the payloads posted on map event channels.
//
// Payload shapes, per channel:
//   onEventOpen / onBookEventClicked       {type, data: Event}
//   onPinpointOpen / onGoToPinpointClicked {type, data: Pinpoint}
//   onActionButtonClick                    {itemType, item, actionType}
//   onContentUpdated                       {type, items, query}
//   onLivemapMoved                         MapMoved
//   onMapClick / onMapLongClick            Coordinates
//   onIndoorFeatureClick                   IndoorFeature
//   onIndoorLevelChanged                   {indoorLevel: IndoorLevel}
//   onIndoorLevelsChanged                  {indoorLevels: [IndoorLevel]}
//   onPermissionsDenied                    {permissions: [string]}
// Close/guiding/login notifications carry no data.

use serde_json::Value;

use livemap_core::codec::{self, field, optional_field};
use livemap_core::error::{LivemapError, Result};
use livemap_core::geo::{Coordinates, MapMoved};
use livemap_core::types::{ContentUpdatedQuery, Event, IndoorFeature, IndoorLevel, Pinpoint};

use crate::channel::Channel;

/// What an action button was attached to.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionTarget {
    Pinpoint(Pinpoint),
    Event(Event),
}

/// Items listed after a search or filter change.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentUpdate {
    Pinpoints(Vec<Pinpoint>),
    Events(Vec<Event>),
}

/// A decoded map event, ready for the delegate.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    EventOpen(Event),
    EventClose,
    PinpointOpen(Pinpoint),
    PinpointClose,
    GuidingStarted,
    GuidingStopped,
    UserLogin,
    UserLogout,
    ActionButtonClick {
        target: ActionTarget,
        action_type: String,
    },
    ContentUpdated {
        update: ContentUpdate,
        query: ContentUpdatedQuery,
    },
    MapMoved(MapMoved),
    MapClick(Coordinates),
    MapLongClick(Coordinates),
    IndoorFeatureClick(IndoorFeature),
    IndoorLevelChanged(IndoorLevel),
    IndoorLevelsChanged(Vec<IndoorLevel>),
    PermissionsDenied(Vec<String>),
    BookEventClicked(Event),
    GoToPinpointClicked(Pinpoint),
}

impl MapEvent {
    /// Decode `payload` as posted on `channel`.
    ///
    /// Channels the session consumes itself (readiness, logging, camera,
    /// positioning) yield `Ok(None)`.
    pub fn decode(channel: Channel, payload: Value) -> Result<Option<Self>> {
        let event = match channel {
            Channel::ParametersLoaded
            | Channel::LoadingFinished
            | Channel::Log
            | Channel::StartCamera
            | Channel::StopCamera
            | Channel::SetPositioningApiKey
            | Channel::StartPositioning
            | Channel::StopPositioning => return Ok(None),

            Channel::EventOpen => Self::EventOpen(field(&payload, "data")?),
            Channel::EventClose => Self::EventClose,
            Channel::PinpointOpen => Self::PinpointOpen(field(&payload, "data")?),
            Channel::PinpointClose => Self::PinpointClose,
            Channel::GuidingStarted => Self::GuidingStarted,
            Channel::GuidingStopped => Self::GuidingStopped,
            Channel::UserLogin => Self::UserLogin,
            Channel::UserLogout => Self::UserLogout,
            Channel::BookEventClicked => Self::BookEventClicked(field(&payload, "data")?),
            Channel::GoToPinpointClicked => Self::GoToPinpointClicked(field(&payload, "data")?),
            Channel::ActionButtonClick => decode_action_button(&payload)?,
            Channel::ContentUpdated => decode_content_update(&payload)?,
            Channel::LivemapMoved => Self::MapMoved(codec::decode(payload)?),
            Channel::MapClick => Self::MapClick(codec::decode(payload)?),
            Channel::MapLongClick => Self::MapLongClick(codec::decode(payload)?),
            Channel::IndoorFeatureClick => Self::IndoorFeatureClick(codec::decode(payload)?),
            Channel::IndoorLevelChanged => Self::IndoorLevelChanged(field(&payload, "indoorLevel")?),
            Channel::IndoorLevelsChanged => {
                Self::IndoorLevelsChanged(field(&payload, "indoorLevels")?)
            }
            Channel::PermissionsDenied => Self::PermissionsDenied(field(&payload, "permissions")?),
        };
        Ok(Some(event))
    }
}

fn decode_action_button(payload: &Value) -> Result<MapEvent> {
    let item_type: String = field(payload, "itemType")?;
    let action_type: String = field(payload, "actionType")?;
    let target = match item_type.as_str() {
        "pinpoint" => ActionTarget::Pinpoint(field(payload, "item")?),
        "event" => ActionTarget::Event(field(payload, "item")?),
        other => {
            return Err(LivemapError::decode(
                "ActionTarget",
                format!("unknown itemType `{other}`"),
            ));
        }
    };
    Ok(MapEvent::ActionButtonClick {
        target,
        action_type,
    })
}

fn decode_content_update(payload: &Value) -> Result<MapEvent> {
    let kind: String = field(payload, "type")?;
    let update = match kind.as_str() {
        "pinpoints" => ContentUpdate::Pinpoints(field(payload, "items")?),
        "events" => ContentUpdate::Events(field(payload, "items")?),
        other => {
            return Err(LivemapError::decode(
                "ContentUpdate",
                format!("unknown type `{other}`"),
            ));
        }
    };
    let query = optional_field(payload, "query")?.unwrap_or_default();
    Ok(MapEvent::ContentUpdated { update, query })
}
