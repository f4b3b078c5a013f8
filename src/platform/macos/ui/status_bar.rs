//! Status bar (menu bar) item with dropdown menu.
//!
//! Lists every overlay with its shortcut and a checkmark while shown, plus
//! the launch menu, shortcut editing, home page and web cache entries, a
//! permission retry entry and Quit.
//! Menu actions only publish events; the dispatcher does the work.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::controller::{Lifecycle, StatusSink};
use crate::hotkeys::HotkeyTable;
use crate::listener::ListenerState;
use crate::model::{OverlayDescriptor, APP_NAME, LAUNCH_MENU_ID};
use crate::platform::macos::app::app_target;
use crate::platform::macos::ffi::bridge::{
    get_class, id, msg_send, nil, nsstring, sel, Bool, NSSize, Sel, NO, YES,
};

// NSControlStateValue
const STATE_OFF: isize = 0;
const STATE_ON: isize = 1;
const STATE_MIXED: isize = -1;

pub struct StatusBar {
    status_item: id,
    overlays: Vec<OverlayDescriptor>,
    toggle_items: HashMap<String, id>,
    menu_shortcut_item: id,
    listener_item: id,
    retry_item: id,
    labels: RefCell<HashMap<String, String>>,
}

impl StatusBar {
    /// Install the status bar item with menu.
    ///
    /// # Safety
    /// Must be called from main thread, after the app is initialized.
    pub unsafe fn install(overlays: Vec<OverlayDescriptor>) -> Self {
        let status_bar: id = msg_send![get_class("NSStatusBar"), systemStatusBar];
        // NSVariableStatusItemLength = -1.0
        let status_item: id = msg_send![status_bar, statusItemWithLength: -1.0f64];
        let _: id = msg_send![status_item, retain];
        set_icon(status_item);

        let menu: id = msg_send![get_class("NSMenu"), new];
        let _: () = msg_send![menu, setAutoenablesItems: NO];

        let mut toggle_items = HashMap::new();
        for overlay in &overlays {
            let item = add_item(menu, &overlay.name, sel!(statusToggle:), Some(&overlay.id));
            toggle_items.insert(overlay.id.clone(), item);
        }
        add_separator(menu);

        let menu_shortcut_item =
            add_item(menu, "Open Launch Menu", sel!(statusOpenMenu:), None);

        let shortcuts: id = msg_send![get_class("NSMenu"), new];
        for overlay in &overlays {
            add_item(
                shortcuts,
                &format!("Set Shortcut for {}…", overlay.name),
                sel!(statusSetShortcut:),
                Some(&overlay.id),
            );
        }
        add_item(
            shortcuts,
            "Set Launch Menu Shortcut…",
            sel!(statusSetMenuShortcut:),
            None,
        );
        add_separator(shortcuts);
        for overlay in &overlays {
            add_item(
                shortcuts,
                &format!("Clear Shortcut for {}", overlay.name),
                sel!(statusClearShortcut:),
                Some(&overlay.id),
            );
        }
        let shortcuts_parent = add_item(menu, "Shortcuts", sel!(statusNoop:), None);
        let _: () = msg_send![menu, setSubmenu: shortcuts, forItem: shortcuts_parent];
        let _: () = msg_send![shortcuts, release];

        let home_pages: id = msg_send![get_class("NSMenu"), new];
        for overlay in &overlays {
            add_item(home_pages, &overlay.name, sel!(statusReload:), Some(&overlay.id));
        }
        let home_parent = add_item(menu, "Go to Website", sel!(statusNoop:), None);
        let _: () = msg_send![menu, setSubmenu: home_pages, forItem: home_parent];
        let _: () = msg_send![home_pages, release];
        add_item(menu, "Clear Web Cache", sel!(statusClearWebData:), None);
        add_separator(menu);

        let listener_item = add_item(menu, "Shortcuts: starting…", sel!(statusNoop:), None);
        let _: () = msg_send![listener_item, setEnabled: NO];
        let retry_item = add_item(
            menu,
            "Retry Accessibility Permission",
            sel!(statusRetryPermission:),
            None,
        );
        let _: () = msg_send![retry_item, setHidden: YES];
        add_separator(menu);

        add_item(menu, &format!("Quit {APP_NAME}"), sel!(statusQuit:), None);

        let _: () = msg_send![status_item, setMenu: menu];
        let _: () = msg_send![menu, release];

        Self {
            status_item,
            overlays,
            toggle_items,
            menu_shortcut_item,
            listener_item,
            retry_item,
            labels: RefCell::new(HashMap::new()),
        }
    }

    fn title_for(&self, id: &str, name: &str) -> String {
        match self.labels.borrow().get(id) {
            Some(label) => format!("{name}  ({label})"),
            None => name.to_string(),
        }
    }
}

impl StatusSink for StatusBar {
    fn lifecycle_changed(&self, id: &str, lifecycle: Lifecycle) {
        let Some(&item) = self.toggle_items.get(id) else {
            return;
        };
        let state = match lifecycle {
            Lifecycle::ShownPinned => STATE_ON,
            Lifecycle::Loading => STATE_MIXED,
            Lifecycle::Uncreated | Lifecycle::Hidden => STATE_OFF,
        };
        unsafe {
            let _: () = msg_send![item, setState: state];
        }
    }

    fn listener_changed(&self, state: ListenerState) {
        let (text, needs_retry) = match state {
            ListenerState::Running => ("Shortcuts: active", false),
            ListenerState::Recovering { .. } => ("Shortcuts: reconnecting…", false),
            ListenerState::Stopped => ("Shortcuts: off (accessibility permission needed)", true),
            ListenerState::Degraded => ("Shortcuts: unavailable", true),
        };
        unsafe {
            let title = nsstring(text);
            let _: () = msg_send![self.listener_item, setTitle: &*title];
            let _: () = msg_send![self.retry_item, setHidden: Bool::new(!needs_retry)];
        }
    }

    fn bindings_changed(&self, table: &HotkeyTable) {
        {
            let mut labels = self.labels.borrow_mut();
            labels.clear();
            for binding in table.bindings() {
                labels.insert(binding.overlay_id, binding.shortcut.to_string());
            }
        }
        unsafe {
            for overlay in &self.overlays {
                if let Some(&item) = self.toggle_items.get(&overlay.id) {
                    let title = nsstring(&self.title_for(&overlay.id, &overlay.name));
                    let _: () = msg_send![item, setTitle: &*title];
                }
            }
            let title = nsstring(&self.title_for(LAUNCH_MENU_ID, "Open Launch Menu"));
            let _: () = msg_send![self.menu_shortcut_item, setTitle: &*title];
        }
    }
}

impl Drop for StatusBar {
    fn drop(&mut self) {
        unsafe {
            let status_bar: id = msg_send![get_class("NSStatusBar"), systemStatusBar];
            let _: () = msg_send![status_bar, removeStatusItem: self.status_item];
            let _: () = msg_send![self.status_item, release];
        }
    }
}

/// Set the icon from StatusBarIcon.png in Resources, falling back to text.
unsafe fn set_icon(status_item: id) {
    let button: id = msg_send![status_item, button];
    if button == nil {
        return;
    }
    let bundle: id = msg_send![get_class("NSBundle"), mainBundle];
    let name = nsstring("StatusBarIcon");
    let ext = nsstring("png");
    let path: id = msg_send![bundle, pathForResource: &*name, ofType: &*ext];
    let icon: id = if path.is_null() {
        nil
    } else {
        let icon: id = msg_send![get_class("NSImage"), alloc];
        msg_send![icon, initWithContentsOfFile: path]
    };

    if icon != nil {
        let _: () = msg_send![icon, setSize: NSSize::new(18.0, 18.0)];
        // Template images adapt to light/dark mode
        let _: () = msg_send![icon, setTemplate: YES];
        let _: () = msg_send![button, setImage: icon];
        let _: () = msg_send![icon, release];
    } else {
        let title = nsstring("◎");
        let _: () = msg_send![button, setTitle: &*title];
    }
}

/// Append an item targeting the app target. `represented` becomes the
/// item's represented object (an overlay id).
unsafe fn add_item(menu: id, title: &str, action: Sel, represented: Option<&str>) -> id {
    let title = nsstring(title);
    let empty = nsstring("");
    let item: id = msg_send![get_class("NSMenuItem"), alloc];
    let item: id = msg_send![
        item,
        initWithTitle: &*title,
        action: action,
        keyEquivalent: &*empty
    ];
    let _: () = msg_send![item, setTarget: app_target()];
    if let Some(value) = represented {
        let value = nsstring(value);
        let _: () = msg_send![item, setRepresentedObject: &*value];
    }
    let _: () = msg_send![menu, addItem: item];
    // The menu retains the item; callers keep a weak handle
    let _: () = msg_send![item, release];
    item
}

unsafe fn add_separator(menu: id) {
    let separator: id = msg_send![get_class("NSMenuItem"), separatorItem];
    let _: () = msg_send![menu, addItem: separator];
}
