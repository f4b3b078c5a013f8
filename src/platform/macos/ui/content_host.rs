//! Overlay windows: a borderless, resizable NSWindow hosting a WKWebView.
//!
//! Each window has a drag strip along the top (the web view leaves it
//! uncovered) and rounded corners. Showing uses `orderFrontRegardless`, so
//! the overlay appears above other apps without activating this one.

use std::ffi::c_void;

use block2::RcBlock;
use log::{debug, warn};

use crate::controller::{ContentHost, ContentHostFactory, EditAction, WindowCommand};
use crate::error::{OverlayError, Result};
use crate::events::{AppEvent, EventPublisher};
use crate::model::{Frame, OverlayDescriptor, CORNER_RADIUS, DEFAULT_WINDOW_SIZE, DRAG_AREA_HEIGHT};
use crate::platform::macos::ffi::bridge::{
    find_class, frame_from_rect, get_class, id, msg_send, nil, nsstring, rect_from_frame, sel,
    string_from_ns, AnyObject, Bool, CGColor, ClassBuilder, NSApp, NSPoint, NSRect, NSSize,
    ObjectExt, Sel, NO, YES,
};

// NSWindowStyleMaskBorderless | NSWindowStyleMaskResizable
const STYLE_MASK: u64 = 1 << 3;
const BACKING_BUFFERED: u64 = 2;
const NORMAL_WINDOW_LEVEL: isize = 0;
const FLOATING_WINDOW_LEVEL: isize = 3;
// CanJoinAllSpaces | FullScreenAuxiliary
const COLLECTION_BEHAVIOR: u64 = 1 | (1 << 8);
// NSViewWidthSizable | NSViewHeightSizable
const AUTORESIZE_FILL: u64 = 2 | 16;

/// Per-overlay context shared by the window and its navigation delegate.
struct NavContext {
    overlay_id: String,
    events: EventPublisher,
}

/// NSWindow subclass that can become key while borderless, so the web
/// view accepts typing after the user clicks into it. It also answers the
/// edit, hide and quit shortcuts itself since there is no main menu.
unsafe fn overlay_window_class() -> &'static objc2::runtime::AnyClass {
    if let Some(cls) = find_class(c"MultiOverlayWindow") {
        return cls;
    }
    let superclass = get_class("NSWindow");
    let Some(mut builder) = ClassBuilder::new(c"MultiOverlayWindow", superclass) else {
        return get_class("NSWindow");
    };
    builder.add_ivar::<*mut c_void>(c"_context");
    builder.add_method(
        sel!(canBecomeKeyWindow),
        can_become_key as unsafe extern "C-unwind" fn(_, _) -> _,
    );
    builder.add_method(
        sel!(performKeyEquivalent:),
        perform_key_equivalent as unsafe extern "C-unwind" fn(_, _, _) -> _,
    );
    builder.register()
}

unsafe extern "C-unwind" fn can_become_key(_this: &AnyObject, _cmd: Sel) -> Bool {
    YES
}

unsafe extern "C-unwind" fn perform_key_equivalent(this: &AnyObject, _cmd: Sel, event: id) -> Bool {
    let flags: usize = msg_send![event, modifierFlags];
    let chars: id = msg_send![event, charactersIgnoringModifiers];
    let command = string_from_ns(chars)
        .and_then(|key| WindowCommand::from_key(flags as u64, &key));

    match command {
        Some(WindowCommand::Edit(action)) => {
            let action = match action {
                EditAction::SelectAll => sel!(selectAll:),
                EditAction::Copy => sel!(copy:),
                EditAction::Cut => sel!(cut:),
                EditAction::Paste => sel!(paste:),
            };
            // nil target walks the responder chain from the first responder
            let _: Bool = msg_send![NSApp(), sendAction: action, to: nil, from: this];
            YES
        }
        Some(command) => {
            if let Some(ctx) = context_of(this) {
                if let Some(event) = command.event(&ctx.overlay_id) {
                    ctx.events.publish(event);
                }
            }
            YES
        }
        None => msg_send![super(this, get_class("NSWindow")), performKeyEquivalent: event],
    }
}

/// WKNavigationDelegate that turns load results into bus events.
unsafe fn navigation_delegate_class() -> &'static objc2::runtime::AnyClass {
    if let Some(cls) = find_class(c"MultiOverlayNavigationDelegate") {
        return cls;
    }
    let superclass = get_class("NSObject");
    let Some(mut builder) = ClassBuilder::new(c"MultiOverlayNavigationDelegate", superclass)
    else {
        return get_class("NSObject");
    };
    builder.add_ivar::<*mut c_void>(c"_context");
    builder.add_method(
        sel!(webView:didFinishNavigation:),
        did_finish as unsafe extern "C-unwind" fn(_, _, _, _),
    );
    builder.add_method(
        sel!(webView:didFailNavigation:withError:),
        did_fail as unsafe extern "C-unwind" fn(_, _, _, _, _),
    );
    builder.add_method(
        sel!(webView:didFailProvisionalNavigation:withError:),
        did_fail as unsafe extern "C-unwind" fn(_, _, _, _, _),
    );
    builder.register()
}

unsafe fn context_of(this: &AnyObject) -> Option<&NavContext> {
    let ptr = *this.load_ivar::<*mut c_void>(c"_context");
    (ptr as *const NavContext).as_ref()
}

unsafe extern "C-unwind" fn did_finish(this: &AnyObject, _cmd: Sel, _webview: id, _nav: id) {
    if let Some(ctx) = context_of(this) {
        ctx.events.publish(AppEvent::ContentReady(ctx.overlay_id.clone()));
    }
}

unsafe extern "C-unwind" fn did_fail(
    this: &AnyObject,
    _cmd: Sel,
    _webview: id,
    _nav: id,
    error: id,
) {
    if let Some(ctx) = context_of(this) {
        let reason = if error.is_null() {
            None
        } else {
            let description: id = msg_send![error, localizedDescription];
            string_from_ns(description)
        };
        ctx.events.publish(AppEvent::ContentLoadFailed {
            id: ctx.overlay_id.clone(),
            reason: reason.unwrap_or_else(|| "unknown error".into()),
        });
    }
}

/// A live overlay window.
pub struct WebOverlayHost {
    overlay_id: String,
    window: id,
    webview: id,
    delegate: id,
    context: *mut NavContext,
}

impl WebOverlayHost {
    /// # Safety
    /// Main thread only.
    unsafe fn create(overlay: &OverlayDescriptor, events: EventPublisher) -> Result<Self> {
        let Some(webview_class) = find_class(c"WKWebView") else {
            return Err(OverlayError::HostUnavailable("WebKit is not available".into()));
        };

        let rect = initial_rect();
        let window: id = msg_send![overlay_window_class(), alloc];
        let window: id = msg_send![
            window,
            initWithContentRect: rect,
            styleMask: STYLE_MASK,
            backing: BACKING_BUFFERED,
            defer: NO
        ];
        if window.is_null() {
            return Err(OverlayError::HostUnavailable(format!(
                "could not allocate a window for '{}'",
                overlay.id
            )));
        }
        let _: () = msg_send![window, setReleasedWhenClosed: NO];
        let _: () = msg_send![window, setMovableByWindowBackground: YES];
        let _: () = msg_send![window, setCollectionBehavior: COLLECTION_BEHAVIOR];
        let _: () = msg_send![window, setOpaque: NO];
        let clear: id = msg_send![get_class("NSColor"), clearColor];
        let _: () = msg_send![window, setBackgroundColor: clear];
        let title = nsstring(&overlay.name);
        let _: () = msg_send![window, setTitle: &*title];

        let content: id = msg_send![window, contentView];
        let _: () = msg_send![content, setWantsLayer: YES];
        let layer: id = msg_send![content, layer];
        if !layer.is_null() {
            let bg: id = msg_send![get_class("NSColor"), windowBackgroundColor];
            let cg: *const CGColor = msg_send![bg, CGColor];
            let _: () = msg_send![layer, setBackgroundColor: cg];
            let _: () = msg_send![layer, setCornerRadius: CORNER_RADIUS];
            let _: () = msg_send![layer, setMasksToBounds: YES];
        }

        let bounds: NSRect = msg_send![content, bounds];
        let web_rect = NSRect::new(
            NSPoint::new(0.0, 0.0),
            NSSize::new(
                bounds.size.width,
                (bounds.size.height - DRAG_AREA_HEIGHT).max(0.0),
            ),
        );
        let config: id = msg_send![get_class("WKWebViewConfiguration"), new];
        let webview: id = msg_send![webview_class, alloc];
        let webview: id = msg_send![webview, initWithFrame: web_rect, configuration: config];
        let _: () = msg_send![config, release];
        if webview.is_null() {
            let _: () = msg_send![window, release];
            return Err(OverlayError::HostUnavailable(format!(
                "could not allocate a web view for '{}'",
                overlay.id
            )));
        }
        let _: () = msg_send![webview, setAutoresizingMask: AUTORESIZE_FILL];
        let _: () = msg_send![content, addSubview: webview];

        let context = Box::into_raw(Box::new(NavContext {
            overlay_id: overlay.id.clone(),
            events,
        }));
        let delegate: id = msg_send![navigation_delegate_class(), new];
        (*delegate).store_ivar::<*mut c_void>(c"_context", context as *mut c_void);
        let _: () = msg_send![webview, setNavigationDelegate: delegate];
        if (*window).class().instance_variable(c"_context").is_some() {
            (*window).store_ivar::<*mut c_void>(c"_context", context as *mut c_void);
        }

        debug!("Created overlay window for '{}'", overlay.id);
        Ok(Self {
            overlay_id: overlay.id.clone(),
            window,
            webview,
            delegate,
            context,
        })
    }
}

/// Default-size rect centred on the main screen.
unsafe fn initial_rect() -> NSRect {
    let (width, height) = DEFAULT_WINDOW_SIZE;
    let screen: id = msg_send![get_class("NSScreen"), mainScreen];
    if screen.is_null() {
        return NSRect::new(NSPoint::new(100.0, 100.0), NSSize::new(width, height));
    }
    let visible: NSRect = msg_send![screen, visibleFrame];
    NSRect::new(
        NSPoint::new(
            visible.origin.x + (visible.size.width - width) / 2.0,
            visible.origin.y + (visible.size.height - height) / 2.0,
        ),
        NSSize::new(width, height),
    )
}

impl ContentHost for WebOverlayHost {
    fn navigate(&mut self, url: &str) -> Result<()> {
        unsafe {
            let ns_url: id = msg_send![get_class("NSURL"), URLWithString: &*nsstring(url)];
            if ns_url.is_null() {
                return Err(OverlayError::ContentLoadFailed {
                    id: self.overlay_id.clone(),
                    reason: format!("invalid URL {url}"),
                });
            }
            let request: id = msg_send![get_class("NSURLRequest"), requestWithURL: ns_url];
            let _: id = msg_send![self.webview, loadRequest: request];
        }
        Ok(())
    }

    fn show(&mut self) {
        unsafe {
            let _: () = msg_send![self.window, orderFrontRegardless];
        }
    }

    fn hide(&mut self) {
        unsafe {
            let _: () = msg_send![self.window, orderOut: nil];
        }
    }

    fn set_pinned(&mut self, pinned: bool) {
        let level = if pinned {
            FLOATING_WINDOW_LEVEL
        } else {
            NORMAL_WINDOW_LEVEL
        };
        unsafe {
            let _: () = msg_send![self.window, setLevel: level];
        }
    }

    fn set_frame(&mut self, frame: Frame) {
        unsafe {
            let _: () = msg_send![self.window, setFrame: rect_from_frame(frame), display: YES];
        }
    }

    fn frame(&self) -> Option<Frame> {
        if self.window.is_null() {
            return None;
        }
        let rect: NSRect = unsafe { msg_send![self.window, frame] };
        Some(frame_from_rect(rect))
    }

    fn destroy(&mut self) {
        if self.window.is_null() {
            return;
        }
        unsafe {
            let _: () = msg_send![self.webview, setNavigationDelegate: nil];
            if (*self.window).class().instance_variable(c"_context").is_some() {
                (*self.window).store_ivar::<*mut c_void>(c"_context", std::ptr::null_mut());
            }
            let _: () = msg_send![self.webview, stopLoading];
            let _: () = msg_send![self.window, close];
            let _: () = msg_send![self.webview, release];
            let _: () = msg_send![self.window, release];
            let _: () = msg_send![self.delegate, release];
            drop(Box::from_raw(self.context));
        }
        self.window = nil;
        self.webview = nil;
        self.delegate = nil;
        self.context = std::ptr::null_mut();
        debug!("Destroyed overlay window for '{}'", self.overlay_id);
    }
}

impl Drop for WebOverlayHost {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Creates [`WebOverlayHost`]s on the main thread.
#[derive(Debug, Default)]
pub struct WebHostFactory;

impl ContentHostFactory for WebHostFactory {
    fn create(
        &mut self,
        overlay: &OverlayDescriptor,
        events: EventPublisher,
    ) -> Result<Box<dyn ContentHost>> {
        match unsafe { WebOverlayHost::create(overlay, events) } {
            Ok(host) => Ok(Box::new(host)),
            Err(e) => {
                warn!("Content host for '{}' unavailable: {}", overlay.id, e);
                Err(e)
            }
        }
    }

    /// Every web view uses the default data store, so one call covers all
    /// overlays. Removal finishes asynchronously.
    fn clear_website_data(&mut self) -> Result<()> {
        unsafe {
            let Some(store_class) = find_class(c"WKWebsiteDataStore") else {
                return Err(OverlayError::WebData("WebKit is not available".into()));
            };
            let store: id = msg_send![store_class, defaultDataStore];
            if store.is_null() {
                return Err(OverlayError::WebData("no default data store".into()));
            }
            let types: id = msg_send![store_class, allWebsiteDataTypes];
            let since: id = msg_send![get_class("NSDate"), distantPast];
            let done = RcBlock::new(|| debug!("Website data removed"));
            let _: () = msg_send![
                store,
                removeDataOfTypes: types,
                modifiedSince: since,
                completionHandler: &*done
            ];
        }
        Ok(())
    }
}
