//! System observers for listener keep-alive and shutdown.
//!
//! Sleep/wake, session switches and Space changes can leave the event tap
//! silently disabled, so each of them enqueues a reinstall.

use block2::RcBlock;

use crate::events::{AppEvent, EventPublisher};
use crate::platform::macos::ffi::bridge::{get_class, id, msg_send, nil, nsstring};

/// Observe system events that may disrupt the event tap.
///
/// Watches for:
/// - Wake from sleep
/// - Session became active (unlock/login)
/// - Active Space changed (Mission Control / Spaces)
///
/// # Safety
/// Must be called from main thread with valid autorelease pool.
pub unsafe fn install_wakeup_space_observers(publisher: &EventPublisher) {
    let ws: id = msg_send![get_class("NSWorkspace"), sharedWorkspace];
    let nc: id = msg_send![ws, notificationCenter];

    for name in [
        "NSWorkspaceDidWakeNotification",
        "NSWorkspaceSessionDidBecomeActiveNotification",
        "NSWorkspaceActiveSpaceDidChangeNotification",
    ] {
        let publisher = publisher.clone();
        let block = RcBlock::new(move |_note: id| {
            publisher.publish(AppEvent::ReinstallListener);
        });
        let name = nsstring(name);
        let _: id = msg_send![
            nc,
            addObserverForName: &*name,
            object: nil,
            queue: nil,
            usingBlock: &*block
        ];
    }
}

/// Run `on_terminate` when the app is about to quit for any reason
/// (logout, `terminate:` from elsewhere).
///
/// # Safety
/// Must be called from main thread with valid autorelease pool.
pub unsafe fn install_termination_observer(on_terminate: fn()) {
    let center: id = msg_send![get_class("NSNotificationCenter"), defaultCenter];
    let block = RcBlock::new(move |_note: id| {
        on_terminate();
    });
    let name = nsstring("NSApplicationWillTerminateNotification");
    let _: id = msg_send![
        center,
        addObserverForName: &*name,
        object: nil,
        queue: nil,
        usingBlock: &*block
    ];
}
