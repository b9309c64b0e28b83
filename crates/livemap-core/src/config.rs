// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge configuration and content URL construction.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{LivemapError, Result};
use crate::geo::BoundingBox;
use crate::types::{IntroCard, OfflineOptions};

/// Public livemap deployment.
pub const DEFAULT_ROOT_URL: &str = "https://livemap.getwemap.com";

/// Routing backend used by the anonymous (UFE) distribution.
pub const DEFAULT_ROUTING_URL: &str = "https://routingdev.maaap.it";

/// Default bound on call-with-result commands.
pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 10_000;

/// Settings for one embedded map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LivemapConfig {
    /// Wemap API token. Ignored in anonymous mode.
    pub token: Option<String>,
    /// Map identifier (`emmid`). `None` selects anonymous mode.
    pub map_id: Option<i64>,
    /// Root of the livemap deployment; `/dom.html` is appended.
    pub root_url: String,
    /// Routing backend announced to the anonymous distribution.
    pub routing_url: String,
    /// Restrict panning to this area.
    pub max_bounds: Option<BoundingBox>,
    pub intro_card: Option<IntroCard>,
    /// Extra raw `key=value` query parameters appended in token mode.
    pub url_parameters: Vec<String>,
    /// Expose the native indoor positioning provider to the web application.
    pub enable_positioning: bool,
    pub offline: Option<OfflineOptions>,
    /// Upper bound on the wait for a call-with-result command, in milliseconds.
    pub call_timeout_ms: u64,
}

impl Default for LivemapConfig {
    fn default() -> Self {
        Self {
            token: None,
            map_id: None,
            root_url: DEFAULT_ROOT_URL.to_string(),
            routing_url: DEFAULT_ROUTING_URL.to_string(),
            max_bounds: None,
            intro_card: None,
            url_parameters: Vec::new(),
            enable_positioning: false,
            offline: None,
            call_timeout_ms: DEFAULT_CALL_TIMEOUT_MS,
        }
    }
}

impl LivemapConfig {
    /// Token-mode configuration for a given map.
    pub fn new(token: impl Into<String>, map_id: i64) -> Self {
        Self {
            token: Some(token.into()),
            map_id: Some(map_id),
            ..Default::default()
        }
    }

    /// Anonymous (UFE) configuration.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_root_url(mut self, root_url: impl Into<String>) -> Self {
        self.root_url = root_url.into();
        self
    }

    pub fn with_max_bounds(mut self, bounds: BoundingBox) -> Self {
        self.max_bounds = Some(bounds);
        self
    }

    pub fn with_intro_card(mut self, intro_card: IntroCard) -> Self {
        self.intro_card = Some(intro_card);
        self
    }

    pub fn with_offline(mut self, offline: OfflineOptions) -> Self {
        self.offline = Some(offline);
        self
    }

    pub fn with_positioning(mut self, enabled: bool) -> Self {
        self.enable_positioning = enabled;
        self
    }

    pub fn is_anonymous(&self) -> bool {
        self.map_id.is_none()
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    /// Build the page URL the web runtime should load.
    pub fn content_url(&self) -> Result<Url> {
        let base = format!("{}/dom.html", self.root_url.trim_end_matches('/'));
        let mut url = Url::parse(&base)
            .map_err(|e| LivemapError::InvalidConfig(format!("root url {base:?}: {e}")))?;

        {
            let mut query = url.query_pairs_mut();
            match self.map_id {
                None => {
                    query
                        .append_pair("dist", "ufe")
                        .append_pair("arviewenabled", "true")
                        .append_pair("routingtype", "osrm")
                        .append_pair("routingmode", "walking")
                        .append_pair("routingurl", &self.routing_url)
                        .append_pair("homecontrol", "false")
                        .append_pair("clicktofullscreen", "false");
                }
                Some(map_id) => {
                    query
                        .append_pair("token", self.token.as_deref().unwrap_or_default())
                        .append_pair("emmid", &map_id.to_string())
                        .append_pair("clicktofullscreen", "false");

                    if let Some(bounds) = &self.max_bounds {
                        query.append_pair("maxbounds", &bounds.to_url_parameter());
                    }
                    if let Some(intro_card) = &self.intro_card {
                        let json = serde_json::to_string(intro_card)?;
                        query.append_pair("introcard", &json);
                    }
                    if let Some(offline) = &self.offline {
                        query.append_pair("offline", &offline.to_url_parameter()?);
                    }
                    for raw in &self.url_parameters {
                        let (key, value) = raw.split_once('=').ok_or_else(|| {
                            LivemapError::InvalidConfig(format!(
                                "url parameter {raw:?} is not key=value"
                            ))
                        })?;
                        query.append_pair(key, value);
                    }
                }
            }
        }

        Ok(url)
    }
}
