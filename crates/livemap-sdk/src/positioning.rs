// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Proxy between the page's native-provider binding and a vendor indoor
// positioning SDK. Without an SDK the factory is `NoPositioning` and every
// request is logged and dropped.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, info, warn};

use livemap_bridge::traits::{LocationProvider, LocationProviderFactory};

use crate::channel::Channel;
use crate::command::Livemap;
use crate::scripts;

pub struct PositioningProxy {
    factory: Rc<dyn LocationProviderFactory>,
    api_key: RefCell<Option<String>>,
    provider: RefCell<Option<Box<dyn LocationProvider>>>,
}

impl PositioningProxy {
    pub fn new(factory: Rc<dyn LocationProviderFactory>) -> Self {
        Self {
            factory,
            api_key: RefCell::new(None),
            provider: RefCell::new(None),
        }
    }

    pub fn is_available(&self) -> bool {
        self.factory.is_available()
    }

    pub fn api_key(&self) -> Option<String> {
        self.api_key.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.provider.borrow().is_some()
    }

    /// Expose the provider to the page. Runs on every committed navigation.
    pub fn install(&self, map: &Livemap) {
        let runtime = map.runtime();
        runtime.evaluate_script(scripts::NATIVE_PROVIDERS_OBJECT);
        if self.factory.is_available() {
            runtime.evaluate_script(&scripts::positioning_binding(&**runtime));
        } else {
            debug!("no positioning SDK, provider binding not installed");
        }
    }

    /// Handle a message on one of the positioning channels.
    pub fn handle(&self, channel: Channel, body: &Value, map: &Livemap) {
        match channel {
            Channel::SetPositioningApiKey => self.set_api_key(body),
            Channel::StartPositioning => self.start(map),
            Channel::StopPositioning => self.stop(),
            other => warn!(channel = %other, "not a positioning channel"),
        }
    }

    fn set_api_key(&self, body: &Value) {
        let Some(key) = body.as_str() else {
            warn!("positioning API key is not a string");
            return;
        };
        let changed = self.api_key.borrow().as_deref() != Some(key);
        if changed {
            // A provider built for another key is discarded.
            if let Some(mut provider) = self.provider.borrow_mut().take() {
                provider.stop();
            }
            *self.api_key.borrow_mut() = Some(key.to_string());
        }
    }

    fn start(&self, map: &Livemap) {
        let mut slot = self.provider.borrow_mut();
        if slot.is_none() {
            let Some(key) = self.api_key() else {
                warn!("positioning start before an API key was set");
                return;
            };
            let map = map.clone();
            let created = self.factory.create(
                &key,
                Box::new(move |location| {
                    if let Err(e) = map.provide_location(&location) {
                        warn!(error = %e, "cannot forward location fix");
                    }
                }),
            );
            match created {
                Ok(provider) => *slot = Some(provider),
                Err(e) => {
                    warn!(error = %e, "positioning provider unavailable");
                    return;
                }
            }
        }

        if let Some(provider) = slot.as_mut() {
            match provider.start() {
                Ok(()) => info!("positioning provider started"),
                Err(e) => warn!(error = %e, "positioning provider failed to start"),
            }
        }
    }

    fn stop(&self) {
        match self.provider.borrow_mut().as_mut() {
            Some(provider) => {
                provider.stop();
                info!("positioning provider stopped");
            }
            None => debug!("positioning stop without a provider"),
        }
    }
}
