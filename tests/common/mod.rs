//! In-memory stand-ins for the OS side (event tap, permission, content
//! hosts, menus, status UI), shared by the integration tests.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use multi_overlay::controller::{
    ContentHost, ContentHostFactory, Lifecycle, OverlayController, StatusSink,
};
use multi_overlay::error::{OverlayError, Result};
use multi_overlay::events::{EventBus, EventPublisher};
use multi_overlay::handlers::{Dispatcher, Services};
use multi_overlay::hotkeys::{HotkeyTable, SharedHotkeyTable};
use multi_overlay::listener::{
    BackoffConfig, EventTap, GlobalListener, KeyEvent, KeyFilter, ListenerState, PermissionGate,
};
use multi_overlay::menu::{LaunchMenu, MenuEntry, MenuPresenter};
use multi_overlay::model::{Frame, OverlayDescriptor, Shortcut};
use multi_overlay::registry::{OverlayRegistry, Registry};
use multi_overlay::storage::{MemoryStore, PersistenceStore};

// === Registry ===

pub fn descriptor(id: &str, default: Option<Shortcut>) -> OverlayDescriptor {
    OverlayDescriptor {
        id: id.to_string(),
        name: id.to_uppercase(),
        url: format!("https://{id}.example.com"),
        icon_path: PathBuf::from(format!("/icons/{id}.png")),
        default_shortcut: default,
        description: String::new(),
    }
}

/// Registry of `ids`, none with a default shortcut.
pub fn registry(ids: &[&str]) -> Arc<dyn OverlayRegistry> {
    Arc::new(ids.iter().map(|id| descriptor(id, None)).collect::<Registry>())
}

// === Content hosts ===

/// Everything the fake hosts were asked to do, keyed by overlay id.
#[derive(Debug, Default)]
pub struct HostLog {
    pub created: Vec<String>,
    pub navigations: Vec<(String, String)>,
    pub shows: Vec<String>,
    pub hides: Vec<String>,
    pub destroyed: Vec<String>,
    pub pinned: HashMap<String, bool>,
    /// Current on-screen frame; tests write here to simulate the user
    /// dragging a window.
    pub frames: HashMap<String, Frame>,
    pub data_clears: usize,
}

impl HostLog {
    pub fn created_count(&self, id: &str) -> usize {
        self.created.iter().filter(|c| *c == id).count()
    }

    pub fn navigations_of(&self, id: &str) -> usize {
        self.navigations.iter().filter(|(n, _)| n == id).count()
    }
}

pub struct FakeHost {
    id: String,
    log: Rc<RefCell<HostLog>>,
}

impl ContentHost for FakeHost {
    fn navigate(&mut self, url: &str) -> Result<()> {
        self.log
            .borrow_mut()
            .navigations
            .push((self.id.clone(), url.to_string()));
        Ok(())
    }

    fn show(&mut self) {
        self.log.borrow_mut().shows.push(self.id.clone());
    }

    fn hide(&mut self) {
        self.log.borrow_mut().hides.push(self.id.clone());
    }

    fn set_pinned(&mut self, pinned: bool) {
        self.log.borrow_mut().pinned.insert(self.id.clone(), pinned);
    }

    fn set_frame(&mut self, frame: Frame) {
        self.log.borrow_mut().frames.insert(self.id.clone(), frame);
    }

    fn frame(&self) -> Option<Frame> {
        self.log.borrow().frames.get(&self.id).copied()
    }

    fn destroy(&mut self) {
        self.log.borrow_mut().destroyed.push(self.id.clone());
    }
}

#[derive(Clone, Default)]
pub struct FakeFactory {
    pub log: Rc<RefCell<HostLog>>,
    pub unavailable: Rc<Cell<bool>>,
}

impl ContentHostFactory for FakeFactory {
    fn create(
        &mut self,
        overlay: &OverlayDescriptor,
        _events: EventPublisher,
    ) -> Result<Box<dyn ContentHost>> {
        if self.unavailable.get() {
            return Err(OverlayError::HostUnavailable("out of windows".into()));
        }
        self.log.borrow_mut().created.push(overlay.id.clone());
        Ok(Box::new(FakeHost {
            id: overlay.id.clone(),
            log: Rc::clone(&self.log),
        }))
    }

    fn clear_website_data(&mut self) -> Result<()> {
        self.log.borrow_mut().data_clears += 1;
        Ok(())
    }
}

// === Status UI ===

#[derive(Default)]
pub struct RecordingSink {
    pub lifecycles: RefCell<Vec<(String, Lifecycle)>>,
    pub listener_states: RefCell<Vec<ListenerState>>,
    pub binding_updates: Cell<usize>,
}

impl StatusSink for RecordingSink {
    fn lifecycle_changed(&self, id: &str, lifecycle: Lifecycle) {
        self.lifecycles.borrow_mut().push((id.to_string(), lifecycle));
    }

    fn listener_changed(&self, state: ListenerState) {
        self.listener_states.borrow_mut().push(state);
    }

    fn bindings_changed(&self, _table: &HotkeyTable) {
        self.binding_updates.set(self.binding_updates.get() + 1);
    }
}

// === Event tap ===

/// Shared view into a [`FakeTap`] after it was boxed into the listener.
#[derive(Default)]
pub struct TapLog {
    pub installs: Cell<u32>,
    pub uninstalls: Cell<u32>,
    pub enabled: Cell<bool>,
    pub fail_install: Cell<bool>,
    pub filter: RefCell<Option<Arc<KeyFilter>>>,
}

impl TapLog {
    /// Deliver an event the way the OS callback would.
    pub fn deliver(&self, event: KeyEvent) -> multi_overlay::listener::Disposition {
        let filter = self.filter.borrow();
        let filter = filter.as_ref().expect("tap is not installed");
        filter.handle(&event)
    }
}

pub struct FakeTap(pub Rc<TapLog>);

impl EventTap for FakeTap {
    fn install(&mut self, filter: Arc<KeyFilter>) -> Result<()> {
        if self.0.fail_install.get() {
            return Err(OverlayError::ListenerInstall("tap refused".into()));
        }
        self.0.installs.set(self.0.installs.get() + 1);
        self.0.enabled.set(true);
        *self.0.filter.borrow_mut() = Some(filter);
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.0.enabled.get()
    }

    fn uninstall(&mut self) {
        if self.0.filter.borrow_mut().take().is_some() {
            self.0.uninstalls.set(self.0.uninstalls.get() + 1);
        }
        self.0.enabled.set(false);
    }
}

pub struct FakeGate(pub Rc<Cell<bool>>);

impl PermissionGate for FakeGate {
    fn is_trusted(&self, _prompt: bool) -> bool {
        self.0.get()
    }
}

pub fn backoff() -> BackoffConfig {
    BackoffConfig {
        base_ms: 100,
        max_ms: 1_000,
        retry_budget: 3,
        stable_reset_ms: 60_000,
    }
}

/// A listener over a fake tap with a fresh table and bus.
pub struct ListenerRig {
    pub bus: EventBus,
    pub table: Arc<SharedHotkeyTable>,
    pub taps: Rc<TapLog>,
    pub trusted: Rc<Cell<bool>>,
    pub listener: GlobalListener,
}

pub fn listener_rig(table: HotkeyTable) -> ListenerRig {
    listener_rig_with(table, backoff())
}

pub fn listener_rig_with(table: HotkeyTable, backoff: BackoffConfig) -> ListenerRig {
    let bus = EventBus::new();
    let table = Arc::new(SharedHotkeyTable::new(table));
    let taps = Rc::new(TapLog::default());
    let trusted = Rc::new(Cell::new(true));
    let filter = Arc::new(KeyFilter::new(Arc::clone(&table), bus.publisher()));
    let listener = GlobalListener::new(
        Box::new(FakeTap(Rc::clone(&taps))),
        Box::new(FakeGate(Rc::clone(&trusted))),
        filter,
        backoff,
        Duration::from_secs(2),
    );
    ListenerRig {
        bus,
        table,
        taps,
        trusted,
        listener,
    }
}

// === Launch menu ===

/// Answers each `present` call with the next scripted pick.
#[derive(Default)]
pub struct ScriptedPresenter {
    pub picks: VecDeque<Option<String>>,
    pub shown: Rc<RefCell<Vec<Vec<MenuEntry>>>>,
}

impl MenuPresenter for ScriptedPresenter {
    fn present(&mut self, entries: &[MenuEntry]) -> Option<String> {
        self.shown.borrow_mut().push(entries.to_vec());
        self.picks.pop_front().flatten()
    }
}

// === Whole app ===

pub struct App {
    pub dispatcher: Dispatcher,
    pub hosts: Rc<RefCell<HostLog>>,
    pub unavailable: Rc<Cell<bool>>,
    pub taps: Rc<TapLog>,
    pub trusted: Rc<Cell<bool>>,
    pub sink: Rc<RecordingSink>,
    pub store: Arc<MemoryStore>,
    pub menus_shown: Rc<RefCell<Vec<Vec<MenuEntry>>>>,
}

impl App {
    pub fn publisher(&self) -> EventPublisher {
        self.dispatcher.publisher()
    }

    pub fn lifecycle(&self, id: &str) -> Lifecycle {
        self.dispatcher.controller().lifecycle(id)
    }
}

/// Dispatcher over fakes. `picks` scripts the launch menu answers.
pub fn app(
    registry: Arc<dyn OverlayRegistry>,
    table: HotkeyTable,
    picks: Vec<Option<&str>>,
) -> App {
    let bus = EventBus::new();
    let store = Arc::new(MemoryStore::new());
    let table = Arc::new(SharedHotkeyTable::new(table));
    let sink = Rc::new(RecordingSink::default());

    let taps = Rc::new(TapLog::default());
    let trusted = Rc::new(Cell::new(true));
    let filter = Arc::new(KeyFilter::new(Arc::clone(&table), bus.publisher()));
    let listener = GlobalListener::new(
        Box::new(FakeTap(Rc::clone(&taps))),
        Box::new(FakeGate(Rc::clone(&trusted))),
        filter,
        backoff(),
        Duration::from_secs(2),
    );

    let factory = FakeFactory::default();
    let hosts = Rc::clone(&factory.log);
    let unavailable = Rc::clone(&factory.unavailable);
    let persistence: Arc<dyn PersistenceStore> = store.clone();
    let controller = OverlayController::new(
        Arc::clone(&registry),
        Arc::clone(&persistence),
        Box::new(factory),
        sink.clone(),
        bus.publisher(),
    );

    let presenter = ScriptedPresenter {
        picks: picks.into_iter().map(|p| p.map(str::to_owned)).collect(),
        shown: Rc::default(),
    };
    let menus_shown = Rc::clone(&presenter.shown);
    let menu = LaunchMenu::new(
        Arc::clone(&registry),
        Arc::clone(&table),
        Box::new(presenter),
        bus.publisher(),
    );

    let services = Services {
        registry,
        store: persistence,
        table,
        status: sink.clone(),
    };
    let dispatcher = Dispatcher::new(bus, services, controller, listener, menu);

    App {
        dispatcher,
        hosts,
        unavailable,
        taps,
        trusted,
        sink,
        store,
        menus_shown,
    }
}
