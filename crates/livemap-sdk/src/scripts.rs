// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page scripts injected by the session: readiness probe, event listeners,
// and the native provider binding. Channel access goes through
// `WebRuntime::message_sink` so the scripts work on any engine.

use livemap_bridge::traits::WebRuntime;

use crate::channel::{CHANNELS, Channel};

/// How a listener turns the web event argument into the posted body.
enum Forward {
    /// Post the argument unchanged.
    Payload,
    /// Post `{type}` only.
    Notice(&'static str),
    /// Post `{type, data: arg.<key>}`.
    Data(&'static str, &'static str),
}

fn forward(channel: Channel) -> Forward {
    match channel {
        Channel::EventOpen => Forward::Data("eventOpen", "event"),
        Channel::PinpointOpen => Forward::Data("openPinpoint", "pinpoint"),
        Channel::EventClose => Forward::Notice("eventClose"),
        Channel::PinpointClose => Forward::Notice("pinpointClose"),
        Channel::GuidingStarted => Forward::Notice("guidingStarted"),
        Channel::GuidingStopped => Forward::Notice("guidingStopped"),
        Channel::UserLogin => Forward::Notice("userLogin"),
        Channel::UserLogout => Forward::Notice("userLogout"),
        _ => Forward::Payload,
    }
}

/// Posts to `onLoadingFinished` once `window.livemap.waitForReady()` resolves.
pub fn readiness_probe(runtime: &dyn WebRuntime) -> String {
    let ready = runtime.message_sink(Channel::LoadingFinished.name());
    format!(
        "window.livemap.waitForReady().then(() => {{\n    {ready}({{type: 'livemapReady'}});\n}});"
    )
}

/// Subscribes every listener-fed channel to its livemap event, and installs
/// the camera hooks and the button hooks for booking and itinerary.
pub fn listener_script(runtime: &dyn WebRuntime) -> String {
    let sink = |channel: Channel| runtime.message_sink(channel.name());
    let mut script = String::from("window.livemap.waitForReady().then(() => {\n");

    for (_, channel) in CHANNELS {
        let Some(event) = channel.web_event() else {
            continue;
        };
        let post = sink(channel);
        let callback = match forward(channel) {
            Forward::Payload => format!("json => {post}(json)"),
            Forward::Notice(kind) => format!("() => {post}({{type: '{kind}'}})"),
            Forward::Data(kind, key) => {
                format!("arg => {post}({{type: '{kind}', data: arg.{key}}})")
            }
        };
        script.push_str(&format!(
            "    window.livemap.addEventListener('{event}', {callback});\n"
        ));
    }

    let start = sink(Channel::StartCamera);
    let stop = sink(Channel::StopCamera);
    let log = sink(Channel::Log);
    script.push_str(&format!(
        "    try {{\n        window.WemapSDK = {{\n            enableCameraNative: () => {start}({{type: 'cameraStarted'}}),\n            disableCameraNative: () => {stop}({{type: 'cameraStopped'}}),\n        }};\n    }} catch (e) {{\n        {log}(e.message);\n    }}\n"
    ));

    let go_to = sink(Channel::GoToPinpointClicked);
    let book = sink(Channel::BookEventClicked);
    script.push_str(&format!(
        r#"    const hookButton = (selector, post, once) => {{
        let handler;
        return {{
            attach: arg => {{
                const button = document.getElementsByClassName(selector)[0];
                if (button) {{
                    handler = () => post(arg);
                    button.addEventListener('click', handler, {{once}});
                }}
            }},
            detach: () => {{
                const button = document.getElementsByClassName(selector)[0];
                if (button && handler) {{
                    button.removeEventListener('click', handler);
                }}
            }},
        }};
    }};
    const goTo = hookButton('wemap-navigation-button',
        arg => {go_to}({{type: 'goToPinpointClicked', data: arg.pinpoint}}), true);
    const book = hookButton('wemap-template-button agenda',
        arg => {book}({{type: 'bookEventClicked', data: arg.event}}), false);
    window.livemap.addEventListener('pinpointOpen', goTo.attach);
    window.livemap.addEventListener('pinpointClose', goTo.detach);
    window.livemap.addEventListener('eventOpen', book.attach);
    window.livemap.addEventListener('eventClose', book.detach);
"#
    ));

    script.push_str("});");
    script
}

/// Creates the object native providers hang off.
pub const NATIVE_PROVIDERS_OBJECT: &str = "window.__nativeProviders = window.__nativeProviders || {};";

/// Exposes the native indoor provider to the page as `getPoleStarProvider`.
pub fn positioning_binding(runtime: &dyn WebRuntime) -> String {
    let set_key = runtime.message_sink(Channel::SetPositioningApiKey.name());
    let start = runtime.message_sink(Channel::StartPositioning.name());
    let stop = runtime.message_sink(Channel::StopPositioning.name());
    format!(
        "window.__nativeProviders.getPoleStarProvider = () => ({{\n    setApiKey: apiKey => {set_key}(apiKey),\n    checkAvailability: () => true,\n    start: () => {start}(''),\n    stop: () => {stop}(''),\n}});"
    )
}
