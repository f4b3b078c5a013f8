//! Main-thread glue between AppKit and the dispatcher.
//!
//! The dispatcher lives in a thread-local slot and is driven by a repeating
//! NSTimer added in common run loop modes, so ticks keep firing while a menu
//! is tracking. A tick that arrives while the dispatcher is already borrowed
//! (the launch menu's modal loop runs inside a tick) is skipped.
//!
//! Every menu action is an Objective-C method on one shared target object
//! that only publishes onto the event bus.

use std::cell::{Cell, RefCell};
use std::time::{Duration, Instant};

use log::{debug, error, info};

use crate::events::{AppEvent, CaptureTarget, EventPublisher};
use crate::handlers::{Dispatcher, Flow};
use crate::platform::macos::ffi::bridge::{
    find_class, get_class, id, msg_send, nil, nsstring, sel, string_from_ns, AnyObject,
    ClassBuilder, NSApp, ObjectExt, Sel, YES,
};

thread_local! {
    static DISPATCHER: RefCell<Option<Dispatcher>> = const { RefCell::new(None) };
    static PUBLISHER: RefCell<Option<EventPublisher>> = const { RefCell::new(None) };
    static MENU_PICK: RefCell<Option<String>> = const { RefCell::new(None) };
    static TARGET: Cell<id> = const { Cell::new(std::ptr::null_mut()) };
}

/// Hand the dispatcher to the main loop.
pub fn install_dispatcher(dispatcher: Dispatcher) {
    let publisher = dispatcher.publisher();
    PUBLISHER.with(|slot| *slot.borrow_mut() = Some(publisher));
    DISPATCHER.with(|slot| *slot.borrow_mut() = Some(dispatcher));
}

/// Shut the dispatcher down and drop it. Safe to call more than once; a
/// call made while a tick holds the dispatcher is a no-op.
pub fn shutdown_dispatcher() {
    let dispatcher = DISPATCHER.with(|slot| match slot.try_borrow_mut() {
        Ok(mut guard) => guard.take(),
        Err(_) => None,
    });
    if let Some(mut dispatcher) = dispatcher {
        dispatcher.shutdown();
    }
}

/// Enqueue an event from an AppKit callback.
pub fn publish(event: AppEvent) {
    PUBLISHER.with(|slot| {
        if let Some(publisher) = slot.borrow().as_ref() {
            publisher.publish(event);
        }
    });
}

/// Entry id chosen in the last launch menu, if any.
pub fn take_menu_pick() -> Option<String> {
    MENU_PICK.with(|slot| slot.borrow_mut().take())
}

/// The shared action target, created on first use.
pub fn app_target() -> id {
    TARGET.with(|slot| {
        if slot.get().is_null() {
            let target: id = unsafe { msg_send![target_class(), new] };
            slot.set(target);
        }
        slot.get()
    })
}

/// Start the repeating main-loop timer.
///
/// # Safety
/// Must be called from main thread with valid autorelease pool.
pub unsafe fn start_tick_timer(interval: Duration) -> id {
    let target = app_target();
    let prev: id = *(*target).load_ivar::<id>(c"_tickTimer");
    if prev != nil {
        let _: () = msg_send![prev, invalidate];
        (*target).store_ivar::<id>(c"_tickTimer", nil);
    }

    let timer: id = msg_send![
        get_class("NSTimer"),
        timerWithTimeInterval: interval.as_secs_f64(),
        target: target,
        selector: sel!(tick:),
        userInfo: nil,
        repeats: YES
    ];
    // Common modes keep the timer firing while menus track
    let run_loop: id = msg_send![get_class("NSRunLoop"), currentRunLoop];
    let common_modes = nsstring("kCFRunLoopCommonModes");
    let _: () = msg_send![run_loop, addTimer: timer, forMode: &*common_modes];

    (*target).store_ivar::<id>(c"_tickTimer", timer);
    debug!("Main loop ticking every {:?}", interval);
    timer
}

fn run_tick() {
    let outcome = DISPATCHER.with(|slot| {
        let Ok(mut guard) = slot.try_borrow_mut() else {
            return None;
        };
        guard.as_mut().map(|dispatcher| dispatcher.tick(Instant::now()))
    });

    match outcome {
        None | Some(Ok(Flow::Continue)) => {}
        Some(Ok(Flow::Quit)) => {
            // Already shut down by the tick; drop it before AppKit tears down
            DISPATCHER.with(|slot| slot.borrow_mut().take());
            info!("Quitting");
            unsafe {
                let _: () = msg_send![NSApp(), terminate: nil];
            }
        }
        Some(Err(e)) => {
            error!("Fatal: {}", e);
            shutdown_dispatcher();
            std::process::exit(1);
        }
    }
}

unsafe fn target_class() -> &'static objc2::runtime::AnyClass {
    if let Some(cls) = find_class(c"MultiOverlayAppTarget") {
        return cls;
    }
    let superclass = get_class("NSObject");
    let Some(mut builder) = ClassBuilder::new(c"MultiOverlayAppTarget", superclass) else {
        return get_class("NSObject");
    };
    builder.add_ivar::<id>(c"_tickTimer");

    builder.add_method(
        sel!(tick:),
        tick as unsafe extern "C-unwind" fn(_, _, _),
    );
    builder.add_method(
        sel!(launchMenuPick:),
        launch_menu_pick as unsafe extern "C-unwind" fn(_, _, _),
    );
    builder.add_method(
        sel!(statusToggle:),
        status_toggle as unsafe extern "C-unwind" fn(_, _, _),
    );
    builder.add_method(
        sel!(statusOpenMenu:),
        status_open_menu as unsafe extern "C-unwind" fn(_, _, _),
    );
    builder.add_method(
        sel!(statusSetShortcut:),
        status_set_shortcut as unsafe extern "C-unwind" fn(_, _, _),
    );
    builder.add_method(
        sel!(statusSetMenuShortcut:),
        status_set_menu_shortcut as unsafe extern "C-unwind" fn(_, _, _),
    );
    builder.add_method(
        sel!(statusClearShortcut:),
        status_clear_shortcut as unsafe extern "C-unwind" fn(_, _, _),
    );
    builder.add_method(
        sel!(statusReload:),
        status_reload as unsafe extern "C-unwind" fn(_, _, _),
    );
    builder.add_method(
        sel!(statusClearWebData:),
        status_clear_web_data as unsafe extern "C-unwind" fn(_, _, _),
    );
    builder.add_method(
        sel!(statusRetryPermission:),
        status_retry_permission as unsafe extern "C-unwind" fn(_, _, _),
    );
    builder.add_method(
        sel!(statusQuit:),
        status_quit as unsafe extern "C-unwind" fn(_, _, _),
    );
    builder.add_method(
        sel!(statusNoop:),
        status_noop as unsafe extern "C-unwind" fn(_, _, _),
    );
    builder.register()
}

/// Overlay id stored as the sender menu item's represented object.
unsafe fn represented_id(sender: id) -> Option<String> {
    if sender.is_null() {
        return None;
    }
    let value: id = msg_send![sender, representedObject];
    string_from_ns(value)
}

unsafe extern "C-unwind" fn tick(_this: &AnyObject, _cmd: Sel, _timer: id) {
    run_tick();
}

unsafe extern "C-unwind" fn launch_menu_pick(_this: &AnyObject, _cmd: Sel, sender: id) {
    let pick = represented_id(sender);
    MENU_PICK.with(|slot| *slot.borrow_mut() = pick);
}

unsafe extern "C-unwind" fn status_toggle(_this: &AnyObject, _cmd: Sel, sender: id) {
    if let Some(id) = represented_id(sender) {
        publish(AppEvent::ToggleOverlay(id));
    }
}

unsafe extern "C-unwind" fn status_open_menu(_this: &AnyObject, _cmd: Sel, _sender: id) {
    publish(AppEvent::OpenLaunchMenu);
}

unsafe extern "C-unwind" fn status_set_shortcut(_this: &AnyObject, _cmd: Sel, sender: id) {
    if let Some(id) = represented_id(sender) {
        publish(AppEvent::BeginShortcutCapture(CaptureTarget::Overlay(id)));
    }
}

unsafe extern "C-unwind" fn status_set_menu_shortcut(_this: &AnyObject, _cmd: Sel, _sender: id) {
    publish(AppEvent::BeginShortcutCapture(CaptureTarget::LaunchMenu));
}

unsafe extern "C-unwind" fn status_clear_shortcut(_this: &AnyObject, _cmd: Sel, sender: id) {
    if let Some(id) = represented_id(sender) {
        publish(AppEvent::ClearShortcut(id));
    }
}

unsafe extern "C-unwind" fn status_reload(_this: &AnyObject, _cmd: Sel, sender: id) {
    if let Some(id) = represented_id(sender) {
        publish(AppEvent::ReloadOverlay(id));
    }
}

unsafe extern "C-unwind" fn status_clear_web_data(_this: &AnyObject, _cmd: Sel, _sender: id) {
    publish(AppEvent::ClearWebData);
}

unsafe extern "C-unwind" fn status_retry_permission(_this: &AnyObject, _cmd: Sel, _sender: id) {
    publish(AppEvent::RetryPermission);
}

unsafe extern "C-unwind" fn status_quit(_this: &AnyObject, _cmd: Sel, _sender: id) {
    publish(AppEvent::RequestQuit);
}

unsafe extern "C-unwind" fn status_noop(_this: &AnyObject, _cmd: Sel, _sender: id) {}
