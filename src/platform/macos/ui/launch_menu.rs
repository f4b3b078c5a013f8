//! Launch menu rendered as an NSMenu popped up at the mouse location.

use log::debug;

use crate::menu::{MenuEntry, MenuPresenter};
use crate::platform::macos::app::{app_target, take_menu_pick};
use crate::platform::macos::ffi::bridge::{
    get_class, id, msg_send, nil, nsstring, sel, Bool, NSPoint, NSSize, NO,
};

const ICON_SIZE: f64 = 16.0;

/// Pops up the launch menu and blocks in AppKit's menu tracking loop until
/// the user picks an entry or dismisses the menu.
#[derive(Debug, Default)]
pub struct CursorMenuPresenter;

impl MenuPresenter for CursorMenuPresenter {
    fn present(&mut self, entries: &[MenuEntry]) -> Option<String> {
        unsafe {
            // Discard a stale pick from an earlier menu
            let _ = take_menu_pick();

            let menu: id = msg_send![get_class("NSMenu"), new];
            let _: () = msg_send![menu, setAutoenablesItems: NO];

            for entry in entries {
                let item = menu_item(entry);
                let _: () = msg_send![menu, addItem: item];
                let _: () = msg_send![item, release];
            }

            let location: NSPoint = msg_send![get_class("NSEvent"), mouseLocation];
            let shown: Bool = msg_send![
                menu,
                popUpMenuPositioningItem: nil,
                atLocation: location,
                inView: nil
            ];
            let _: () = msg_send![menu, release];
            debug!("Launch menu closed (item chosen: {})", shown.as_bool());

            take_menu_pick()
        }
    }
}

/// # Safety
/// Main thread only.
unsafe fn menu_item(entry: &MenuEntry) -> id {
    let title = nsstring(&entry.name);
    let empty = nsstring("");
    let item: id = msg_send![get_class("NSMenuItem"), alloc];
    let item: id = msg_send![
        item,
        initWithTitle: &*title,
        action: sel!(launchMenuPick:),
        keyEquivalent: &*empty
    ];
    let _: () = msg_send![item, setTarget: app_target()];
    let represented = nsstring(&entry.id);
    let _: () = msg_send![item, setRepresentedObject: &*represented];
    if !entry.shortcut_label.is_empty() {
        let tip = nsstring(&entry.shortcut_label);
        let _: () = msg_send![item, setToolTip: &*tip];
    }

    if entry.icon.is_file() {
        let path = nsstring(&entry.icon.to_string_lossy());
        let icon: id = msg_send![get_class("NSImage"), alloc];
        let icon: id = msg_send![icon, initWithContentsOfFile: &*path];
        if !icon.is_null() {
            let _: () = msg_send![icon, setSize: NSSize::new(ICON_SIZE, ICON_SIZE)];
            let _: () = msg_send![item, setImage: icon];
            let _: () = msg_send![icon, release];
        }
    }
    item
}
