//! macOS entry point: assembles the core around the AppKit front end and
//! runs the application loop.

use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use log::info;

use multi_overlay::config::{AppConfig, AppPaths};
use multi_overlay::controller::OverlayController;
use multi_overlay::events::{AppEvent, EventBus};
use multi_overlay::handlers::{Dispatcher, Services};
use multi_overlay::hotkeys::{load_table, SharedHotkeyTable};
use multi_overlay::listener::{GlobalListener, KeyFilter};
use multi_overlay::menu::LaunchMenu;
use multi_overlay::platform::macos::app::{install_dispatcher, shutdown_dispatcher, start_tick_timer};
use multi_overlay::platform::macos::ffi::bridge::{autoreleasepool, msg_send, Bool, NSApp};
use multi_overlay::platform::macos::input::{
    install_termination_observer, install_wakeup_space_observers, MacEventTap, MacPermissionGate,
};
use multi_overlay::platform::macos::ui::{CursorMenuPresenter, StatusBar, WebHostFactory};
use multi_overlay::registry::{OverlayRegistry, Registry};
use multi_overlay::storage::{JsonFileStore, PersistenceStore};

/// Main entry point for macOS. Returns when the app terminates.
pub fn run(config: AppConfig, paths: AppPaths, registry: Registry, site: Option<String>) {
    autoreleasepool(|| unsafe {
        let app = NSApp();
        // NSApplicationActivationPolicyAccessory = 1: no Dock icon
        let _: Bool = msg_send![app, setActivationPolicy: 1i64];

        let registry: Arc<dyn OverlayRegistry> = Arc::new(registry);
        let store: Arc<dyn PersistenceStore> = Arc::new(JsonFileStore::new(paths.state_dir.clone()));
        let table = Arc::new(SharedHotkeyTable::new(load_table(
            store.as_ref(),
            registry.as_ref(),
        )));
        info!("Loaded {} shortcut bindings", table.snapshot().len());

        let bus = EventBus::new();
        let publisher = bus.publisher();

        let filter = Arc::new(KeyFilter::new(Arc::clone(&table), bus.publisher()));
        let listener = GlobalListener::new(
            Box::new(MacEventTap::new()),
            Box::new(MacPermissionGate),
            filter,
            config.backoff,
            config.liveness_interval(),
        );

        let status = Rc::new(StatusBar::install(registry.list()));
        let controller = OverlayController::new(
            Arc::clone(&registry),
            Arc::clone(&store),
            Box::new(WebHostFactory),
            status.clone(),
            bus.publisher(),
        )
        .with_policy(config.show_policy)
        .with_stall_warning(config.load_stall_warn());

        let menu = LaunchMenu::new(
            Arc::clone(&registry),
            Arc::clone(&table),
            Box::new(CursorMenuPresenter),
            bus.publisher(),
        );

        let services = Services {
            registry,
            store,
            table,
            status,
        };
        let mut dispatcher = Dispatcher::new(bus, services, controller, listener, menu);
        dispatcher.start(Instant::now());

        install_wakeup_space_observers(&publisher);
        install_termination_observer(shutdown_dispatcher);

        if let Some(id) = site {
            publisher.publish(AppEvent::ToggleOverlay(id));
        }

        install_dispatcher(dispatcher);
        start_tick_timer(config.tick_interval());

        let _: () = msg_send![app, run];
    });
}
