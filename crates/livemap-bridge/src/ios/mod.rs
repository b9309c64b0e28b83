// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// iOS platform bridge via objc2.
//
// Requires compilation with the iOS SDK (Xcode). `IosWebView` adapts a
// host-owned `WKWebView` to `WebRuntime`: script message handlers, navigation
// and UI delegate, and a key-value observer on the view's URL, all removed
// again when the adapter is dropped. `IosHost` answers camera authorization
// through AVFoundation and toggles the host's camera preview view.
//
// Everything here runs on the main thread. WebKit already calls its
// delegates and completion handlers there; the AVFoundation access prompt
// does not, so its answer is re-posted to the main queue before any bridge
// state is touched.

#![cfg(target_os = "ios")]

use std::cell::RefCell;
use std::ffi::c_void;
use std::rc::Rc;

use block2::{DynBlock, RcBlock};
use objc2::rc::Retained;
use objc2::runtime::{AnyObject, Bool, NSObject, NSObjectProtocol, ProtocolObject};
use objc2::{MainThreadMarker, MainThreadOnly, class, define_class, msg_send};
use objc2_foundation::{NSData, NSError, NSString, NSURL, NSURLRequest};
use objc2_ui_kit::UIView;
use objc2_web_kit::{
    WKContentWorld, WKFrameInfo, WKMediaCaptureType, WKNavigation, WKNavigationDelegate,
    WKPermissionDecision, WKScriptMessage, WKScriptMessageHandler, WKSecurityOrigin, WKUIDelegate,
    WKUserContentController, WKWebView,
};
use serde_json::Value;

use livemap_core::error::{LivemapError, Result};
use livemap_core::types::{Permission, PermissionState};

use crate::traits::*;

// ---------------------------------------------------------------------------
// AVFoundation FFI
// ---------------------------------------------------------------------------

#[link(name = "AVFoundation", kind = "framework")]
unsafe extern "C" {
    static AVMediaTypeVideo: &'static NSString;
}

/// `AVAuthorizationStatus` raw values.
const AV_STATUS_NOT_DETERMINED: isize = 0;
const AV_STATUS_AUTHORIZED: isize = 3;

/// `NSURLRequestReloadIgnoringLocalAndRemoteCacheData`.
const RELOAD_IGNORING_CACHE: usize = 4;

/// `NSJSONWritingFragmentsAllowed`.
const JSON_FRAGMENTS_ALLOWED: usize = 1 << 2;

/// `NSKeyValueObservingOptionNew`.
const KVO_OPTION_NEW: usize = 1;

/// Observed `WKWebView` key path.
const URL_KEY_PATH: &str = "URL";

type SignalSink = Rc<dyn Fn(RuntimeSignal)>;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Assert that we are on the main thread and return the marker.
fn require_main_thread() -> Result<MainThreadMarker> {
    MainThreadMarker::new()
        .ok_or_else(|| LivemapError::Bridge("must be called from the main thread".into()))
}

/// Convert a script message body (NSString, NSNumber, NSArray, NSDictionary)
/// into JSON. Bodies NSJSONSerialization cannot represent become `Null`.
fn body_to_json(body: &AnyObject) -> Value {
    if let Some(text) = body.downcast_ref::<NSString>() {
        return Value::String(text.to_string());
    }

    // SAFETY: isValidJSONObject: and dataWithJSONObject:options:error: are
    // class methods of NSJSONSerialization. The validity check runs first so
    // the serializer never raises on unsupported objects.
    let data: Option<Retained<NSData>> = unsafe {
        let valid: Bool = msg_send![class!(NSJSONSerialization), isValidJSONObject: body];
        if !valid.as_bool() {
            return Value::Null;
        }
        msg_send![
            class!(NSJSONSerialization),
            dataWithJSONObject: body,
            options: JSON_FRAGMENTS_ALLOWED,
            error: std::ptr::null_mut::<*mut NSError>()
        ]
    };

    data.and_then(|d| serde_json::from_slice(&d.to_vec()).ok())
        .unwrap_or(Value::Null)
}

/// `localizedDescription` of a possibly-nil `NSError *`.
///
/// SAFETY: `error` must be nil or a valid `NSError *` for the duration of
/// the call (WebKit completion handler arguments are).
unsafe fn error_message(error: *mut NSError) -> Option<String> {
    unsafe { error.as_ref() }.map(|e| e.localizedDescription().to_string())
}

// ---------------------------------------------------------------------------
// Script message, navigation, UI and URL observer delegate
// ---------------------------------------------------------------------------

fn current_url(web_view: &WKWebView) -> Option<String> {
    // SAFETY: URL is a readonly WKWebView property, main thread.
    unsafe { web_view.URL() }
        .and_then(|u| u.absoluteString())
        .map(|s| s.to_string())
}

struct BridgeDelegateIvars {
    sink: SignalSink,
    host: Rc<dyn HostBridge>,
}

// SAFETY: define_class! #[unsafe(super(NSObject))] declares BridgeDelegate
// as an ObjC class inheriting from NSObject. MainThreadOnly matches WebKit,
// which calls every delegate protocol and URL change on the main thread.
define_class! {
    #[unsafe(super(NSObject))]
    #[thread_kind = MainThreadOnly]
    #[name = "LivemapBridgeDelegate"]
    #[ivars = BridgeDelegateIvars]
    struct BridgeDelegate;

    impl BridgeDelegate {
        #[unsafe(method(observeValueForKeyPath:ofObject:change:context:))]
        fn observe_value(
            &self,
            key_path: Option<&NSString>,
            object: Option<&AnyObject>,
            _change: *mut AnyObject,
            _context: *mut c_void,
        ) {
            if key_path.map(|k| k.to_string()).as_deref() != Some(URL_KEY_PATH) {
                return;
            }
            let url = object
                .and_then(|o| o.downcast_ref::<WKWebView>())
                .and_then(current_url);
            if let Some(url) = url {
                (self.ivars().sink)(RuntimeSignal::UrlChanged { url });
            }
        }
    }

    unsafe impl NSObjectProtocol for BridgeDelegate {}

    unsafe impl WKScriptMessageHandler for BridgeDelegate {
        #[unsafe(method(userContentController:didReceiveScriptMessage:))]
        fn did_receive(&self, _controller: &WKUserContentController, message: &WKScriptMessage) {
            // SAFETY: name and body are readonly WKScriptMessage properties.
            let (channel, body) = unsafe { (message.name().to_string(), message.body()) };
            (self.ivars().sink)(RuntimeSignal::Message {
                channel,
                body: body_to_json(&body),
            });
        }
    }

    unsafe impl WKNavigationDelegate for BridgeDelegate {
        #[unsafe(method(webView:didCommitNavigation:))]
        fn did_commit(&self, web_view: &WKWebView, _navigation: Option<&WKNavigation>) {
            let url = current_url(web_view);
            (self.ivars().sink)(RuntimeSignal::NavigationCommitted { url });
        }

        #[unsafe(method(webView:didFinishNavigation:))]
        fn did_finish(&self, _web_view: &WKWebView, _navigation: Option<&WKNavigation>) {
            (self.ivars().sink)(RuntimeSignal::NavigationFinished);
        }

        #[unsafe(method(webView:didFailNavigation:withError:))]
        fn did_fail(&self, _web_view: &WKWebView, _navigation: Option<&WKNavigation>, error: &NSError) {
            (self.ivars().sink)(RuntimeSignal::NavigationFailed {
                reason: error.localizedDescription().to_string(),
            });
        }

        #[unsafe(method(webView:didFailProvisionalNavigation:withError:))]
        fn did_fail_provisional(
            &self,
            _web_view: &WKWebView,
            _navigation: Option<&WKNavigation>,
            error: &NSError,
        ) {
            (self.ivars().sink)(RuntimeSignal::NavigationFailed {
                reason: error.localizedDescription().to_string(),
            });
        }
    }

    unsafe impl WKUIDelegate for BridgeDelegate {
        // Page getUserMedia requests follow the app's camera permission
        // instead of WebKit's per-origin prompt.
        #[unsafe(method(webView:requestMediaCapturePermissionForOrigin:initiatedByFrame:type:decisionHandler:))]
        fn request_media_capture(
            &self,
            _web_view: &WKWebView,
            _origin: &WKSecurityOrigin,
            _frame: &WKFrameInfo,
            kind: WKMediaCaptureType,
            decision_handler: &DynBlock<dyn Fn(WKPermissionDecision)>,
        ) {
            if kind == WKMediaCaptureType::Microphone {
                decision_handler.call((WKPermissionDecision::Prompt,));
                return;
            }
            let decision_handler = decision_handler.copy();
            decide_camera_capture(
                &*self.ivars().host,
                Box::new(move |granted| {
                    tracing::debug!(granted, "iOS: page camera capture decided");
                    let decision = if granted {
                        WKPermissionDecision::Grant
                    } else {
                        WKPermissionDecision::Deny
                    };
                    decision_handler.call((decision,));
                }),
            );
        }
    }
}

impl BridgeDelegate {
    fn new(mtm: MainThreadMarker, sink: SignalSink, host: Rc<dyn HostBridge>) -> Retained<Self> {
        let this = mtm.alloc::<Self>().set_ivars(BridgeDelegateIvars { sink, host });
        // SAFETY: Standard NSObject init via super.
        unsafe { msg_send![super(this), init] }
    }
}

// ---------------------------------------------------------------------------
// IosWebView
// ---------------------------------------------------------------------------

/// `WebRuntime` over a host-owned `WKWebView`.
///
/// The host creates and lays out the view; this adapter installs itself as
/// navigation and UI delegate, script message handler and URL observer, and
/// forwards everything to `sink` (normally `LivemapSession::handle_signal`).
/// Page camera capture requests are decided through `host`.
pub struct IosWebView {
    web_view: Retained<WKWebView>,
    delegate: Retained<BridgeDelegate>,
    registered: RefCell<Vec<String>>,
    mtm: MainThreadMarker,
}

impl IosWebView {
    pub fn attach(
        web_view: Retained<WKWebView>,
        host: Rc<dyn HostBridge>,
        sink: impl Fn(RuntimeSignal) + 'static,
    ) -> Result<Self> {
        let mtm = require_main_thread()?;
        let delegate = BridgeDelegate::new(mtm, Rc::new(sink), host);

        // SAFETY: both delegate setters store weak references and the KVO
        // registration does not retain the observer; `delegate` is retained
        // by `self` and unregistered in `Drop`.
        unsafe {
            web_view.setNavigationDelegate(Some(ProtocolObject::from_ref(&*delegate)));
            web_view.setUIDelegate(Some(ProtocolObject::from_ref(&*delegate)));
            let _: () = msg_send![
                &*web_view,
                addObserver: &*delegate,
                forKeyPath: &*NSString::from_str(URL_KEY_PATH),
                options: KVO_OPTION_NEW,
                context: std::ptr::null_mut::<c_void>()
            ];
        }

        Ok(Self {
            web_view,
            delegate,
            registered: RefCell::new(Vec::new()),
            mtm,
        })
    }

    fn content_controller(&self) -> Retained<WKUserContentController> {
        // SAFETY: configuration returns a copy-free view of the live
        // configuration; userContentController is never nil.
        unsafe { self.web_view.configuration().userContentController() }
    }
}

impl WebRuntime for IosWebView {
    fn platform_name(&self) -> &str {
        "WKWebView"
    }

    fn register_channel(&self, name: &str) -> Result<()> {
        if self.registered.borrow().iter().any(|n| n == name) {
            return Err(LivemapError::Bridge(format!("channel {name} already registered")));
        }
        let controller = self.content_controller();
        // SAFETY: addScriptMessageHandler:name: retains the handler. WebKit
        // raises on a duplicate name; duplicates are refused above and every
        // name is removed again in `Drop`.
        unsafe {
            controller.addScriptMessageHandler_name(
                ProtocolObject::from_ref(&*self.delegate),
                &NSString::from_str(name),
            );
        }
        self.registered.borrow_mut().push(name.to_string());
        Ok(())
    }

    fn load_url(&self, url: &str) -> Result<()> {
        let ns_url = NSURL::URLWithString(&NSString::from_str(url))
            .ok_or_else(|| LivemapError::Bridge(format!("failed to parse URL: {url}")))?;

        // SAFETY: requestWithURL:cachePolicy:timeoutInterval: is a documented
        // NSURLRequest factory; loadRequest: runs on the main thread.
        unsafe {
            let request: Retained<NSURLRequest> = msg_send![
                class!(NSURLRequest),
                requestWithURL: &*ns_url,
                cachePolicy: RELOAD_IGNORING_CACHE,
                timeoutInterval: 60.0f64
            ];
            let _navigation: Option<Retained<WKNavigation>> = self.web_view.loadRequest(&request);
        }
        tracing::info!(url, "iOS: WKWebView navigation started");
        Ok(())
    }

    fn evaluate_script(&self, script: &str) {
        let handler = RcBlock::new(|_result: *mut AnyObject, error: *mut NSError| {
            // SAFETY: WebKit passes nil or a valid NSError.
            if let Some(message) = unsafe { error_message(error) } {
                tracing::warn!(error = %message, "iOS: evaluateJavaScript failed");
            }
        });
        // SAFETY: evaluateJavaScript:completionHandler: on the main thread.
        unsafe {
            self.web_view
                .evaluateJavaScript_completionHandler(&NSString::from_str(script), Some(&*handler));
        }
    }

    fn call_async_script(&self, body: &str, completion: ScriptCompletion) {
        // Always resolve to a JSON string so the result crosses the bridge as
        // one NSString regardless of the JS value's type.
        let wrapped = format!("return JSON.stringify(await (async () => {{ {body} }})());");
        let completion = RefCell::new(Some(completion));

        let handler = RcBlock::new(move |result: *mut AnyObject, error: *mut NSError| {
            let Some(completion) = completion.borrow_mut().take() else {
                return;
            };
            // SAFETY: WebKit passes nil or valid objects to this handler.
            if let Some(message) = unsafe { error_message(error) } {
                completion(Err(message));
                return;
            }
            let text = unsafe { result.as_ref() }
                .and_then(|obj| obj.downcast_ref::<NSString>())
                .map(|s| s.to_string());
            let outcome = match text {
                None => Ok(Value::Null),
                Some(text) => serde_json::from_str(&text).map_err(|e| e.to_string()),
            };
            completion(outcome);
        });

        // SAFETY: callAsyncJavaScript:arguments:inFrame:inContentWorld:
        // completionHandler: (iOS 14+) on the main thread, page world.
        unsafe {
            let world = WKContentWorld::pageWorld(self.mtm);
            self.web_view
                .callAsyncJavaScript_arguments_inFrame_inContentWorld_completionHandler(
                    &NSString::from_str(&wrapped),
                    None,
                    None,
                    &world,
                    Some(&*handler),
                );
        }
    }
}

impl Drop for IosWebView {
    fn drop(&mut self) {
        let controller = self.content_controller();
        for name in self.registered.borrow_mut().drain(..) {
            // SAFETY: removes a handler this adapter added, main thread.
            unsafe { controller.removeScriptMessageHandlerForName(&NSString::from_str(&name)) };
        }
        // SAFETY: the observer was added in `attach` with the same key path.
        unsafe {
            let _: () = msg_send![
                &*self.web_view,
                removeObserver: &*self.delegate,
                forKeyPath: &*NSString::from_str(URL_KEY_PATH)
            ];
            self.web_view.setNavigationDelegate(None);
            self.web_view.setUIDelegate(None);
        }
        tracing::debug!("iOS: bridge detached from WKWebView");
    }
}

// ---------------------------------------------------------------------------
// IosHost -- AVFoundation authorization + preview visibility
// ---------------------------------------------------------------------------

thread_local! {
    /// Completions waiting for the camera access prompt. Main thread only.
    static PENDING_CAMERA_REQUESTS: RefCell<Vec<PermissionCompletion>> = const { RefCell::new(Vec::new()) };
}

/// Concrete iOS host bridge.
pub struct IosHost {
    camera_view: RefCell<Option<Retained<UIView>>>,
}

impl IosHost {
    pub fn new() -> Self {
        Self {
            camera_view: RefCell::new(None),
        }
    }

    /// The view that renders the camera preview behind the map.
    pub fn set_camera_view(&self, view: Retained<UIView>) {
        *self.camera_view.borrow_mut() = Some(view);
    }
}

impl Default for IosHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostBridge for IosHost {
    fn platform_name(&self) -> &str {
        "iOS"
    }
}

impl PermissionProvider for IosHost {
    fn status(&self, permission: Permission) -> PermissionState {
        match permission {
            Permission::Camera => {
                // SAFETY: authorizationStatusForMediaType: is a class method
                // returning the NSInteger-backed AVAuthorizationStatus.
                let status: isize = unsafe {
                    msg_send![class!(AVCaptureDevice), authorizationStatusForMediaType: AVMediaTypeVideo]
                };
                match status {
                    AV_STATUS_NOT_DETERMINED => PermissionState::Undetermined,
                    AV_STATUS_AUTHORIZED => PermissionState::Granted,
                    _ => PermissionState::Denied,
                }
            }
        }
    }

    fn request(&self, permission: Permission, completion: PermissionCompletion) {
        match permission {
            Permission::Camera => {
                let first = PENDING_CAMERA_REQUESTS.with(|pending| {
                    let mut pending = pending.borrow_mut();
                    pending.push(completion);
                    pending.len() == 1
                });
                if !first {
                    return;
                }

                // AVFoundation answers on an arbitrary queue: only the bool
                // crosses threads, the completions stay in the main-thread
                // thread-local until the main queue drains them.
                let handler = RcBlock::new(|granted: Bool| {
                    let granted = granted.as_bool();
                    let on_main = RcBlock::new(move || {
                        let waiting = PENDING_CAMERA_REQUESTS.with(|p| std::mem::take(&mut *p.borrow_mut()));
                        for completion in waiting {
                            completion(granted);
                        }
                    });
                    // SAFETY: mainQueue and addOperationWithBlock: are
                    // thread-safe NSOperationQueue APIs.
                    unsafe {
                        let queue: Retained<AnyObject> = msg_send![class!(NSOperationQueue), mainQueue];
                        let _: () = msg_send![&*queue, addOperationWithBlock: &*on_main];
                    }
                });

                // SAFETY: requestAccessForMediaType:completionHandler: copies
                // the block.
                unsafe {
                    let _: () = msg_send![
                        class!(AVCaptureDevice),
                        requestAccessForMediaType: AVMediaTypeVideo,
                        completionHandler: &*handler
                    ];
                }
            }
        }
    }
}

impl CameraOverlay for IosHost {
    fn is_available(&self) -> bool {
        // SAFETY: defaultDeviceWithMediaType: returns nil on the simulator.
        let device: Option<Retained<AnyObject>> = unsafe {
            msg_send![class!(AVCaptureDevice), defaultDeviceWithMediaType: AVMediaTypeVideo]
        };
        device.is_some()
    }

    fn set_visible(&self, visible: bool) {
        match self.camera_view.borrow().as_ref() {
            Some(view) => view.setHidden(!visible),
            None => tracing::warn!(visible, "iOS: no camera view installed"),
        }
    }
}
