#![allow(unsafe_code)]

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::os::raw::{c_int, c_void};
use std::panic;
use std::rc::{Rc, Weak};

use gtkbind_sys::LibraryConfig;
use tracing::{debug, warn};

use crate::arena::{Entry, ResourceArena, ResourceId, ResourceKind};
use crate::error::{Error, Result};
use crate::toolkit::{GtkToolkit, HeadlessToolkit, IdleSource, RawHandle, Toolkit};
use crate::trampoline::{self, TrampolineId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    /// `quit` was requested and the loop has not returned yet.
    Quitting,
}

pub(crate) struct ContextInner {
    pub(crate) toolkit: Rc<dyn Toolkit>,
    pub(crate) arena: RefCell<ResourceArena>,
    next_trampoline: Cell<u64>,
    dispatch_depth: Cell<u32>,
    deferred: RefCell<Vec<RawHandle>>,
    flush_scheduled: Cell<bool>,
    loop_state: Cell<LoopState>,
    initialized: Cell<bool>,
    /// First handler panic not yet handed back to the caller.
    panic: RefCell<Option<Box<dyn Any + Send>>>,
}

impl Drop for ContextInner {
    fn drop(&mut self) {
        for raw in self.deferred.take() {
            self.toolkit.widget_destroy(raw);
            self.toolkit.object_unref(raw);
        }
    }
}

/// Owner of every native resource created through it, and of the main loop.
///
/// A context is reference counted and not `Send`: all handles, components and callbacks that
/// came from it stay on the thread that created it.
///
/// ```compile_fail
/// fn assert_send<T: Send>() {}
/// assert_send::<gtkbind::Context>();
/// ```
#[derive(Clone)]
pub struct Context {
    pub(crate) inner: Rc<ContextInner>,
}

#[derive(Clone)]
pub struct WeakContext {
    inner: Weak<ContextInner>,
}

impl WeakContext {
    pub fn upgrade(&self) -> Option<Context> {
        self.inner.upgrade().map(|inner| Context { inner })
    }
}

impl Context {
    /// A context without a display. Every native call is recorded by `toolkit`.
    pub fn headless(toolkit: Rc<HeadlessToolkit>) -> Self {
        Self::with_toolkit(toolkit)
    }

    pub(crate) fn with_toolkit(toolkit: Rc<dyn Toolkit>) -> Self {
        Self {
            inner: Rc::new(ContextInner {
                toolkit,
                arena: RefCell::new(ResourceArena::default()),
                next_trampoline: Cell::new(0),
                dispatch_depth: Cell::new(0),
                deferred: RefCell::new(Vec::new()),
                flush_scheduled: Cell::new(false),
                loop_state: Cell::new(LoopState::Idle),
                initialized: Cell::new(false),
                panic: RefCell::new(None),
            }),
        }
    }

    /// Loads GTK 3 and binds the context to it.
    pub fn gtk(config: &LibraryConfig) -> Result<Self> {
        let toolkit = GtkToolkit::load(config)?;
        Ok(Self::with_toolkit(Rc::new(toolkit)))
    }

    pub fn from_env() -> Result<Self> {
        Self::gtk(&LibraryConfig::from_env())
    }

    pub fn downgrade(&self) -> WeakContext {
        WeakContext {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Initializes the toolkit once per context.
    pub fn init(&self) {
        if self.inner.initialized.replace(true) {
            return;
        }
        self.toolkit().init();
    }

    /// Blocks in the native main loop until [`quit`](Self::quit).
    ///
    /// A signal handler that panics stops the loop, and the panic resumes from here. A panic
    /// caught while no loop was running resumes before the loop is entered.
    pub fn run(&self) -> Result<()> {
        if self.inner.loop_state.get() != LoopState::Idle {
            return Err(Error::LoopAlreadyRunning);
        }
        if let Some(payload) = self.take_panic() {
            panic::resume_unwind(payload);
        }
        self.init();
        self.inner.loop_state.set(LoopState::Running);
        debug!("entering main loop");
        self.toolkit().main();
        self.inner.loop_state.set(LoopState::Idle);
        debug!("main loop returned");
        if let Some(payload) = self.take_panic() {
            panic::resume_unwind(payload);
        }
        Ok(())
    }

    /// Asks the running loop to return. Ignored when no loop runs or a quit is pending.
    pub fn quit(&self) {
        match self.inner.loop_state.get() {
            LoopState::Running => {
                self.inner.loop_state.set(LoopState::Quitting);
                debug!("quitting main loop");
                self.toolkit().main_quit();
            }
            LoopState::Idle | LoopState::Quitting => {}
        }
    }

    /// Takes the payload of a signal handler panic that has not been resumed yet. Handlers
    /// emitted outside [`run`](Self::run), for instance by a synchronous destroy, leave their
    /// panic here.
    pub fn take_panic(&self) -> Option<Box<dyn Any + Send>> {
        self.inner.panic.borrow_mut().take()
    }

    pub(crate) fn stash_panic(&self, payload: Box<dyn Any + Send>) {
        let mut slot = self.inner.panic.borrow_mut();
        if slot.is_none() {
            *slot = Some(payload);
        }
    }

    pub fn loop_state(&self) -> LoopState {
        self.inner.loop_state.get()
    }

    /// True while a signal handler registered through this context runs.
    pub fn is_dispatching(&self) -> bool {
        self.inner.dispatch_depth.get() > 0
    }

    /// Number of live arena slots.
    pub fn live_resources(&self) -> usize {
        self.inner.arena.borrow().live()
    }

    /// Native destroys queued from inside signal handlers.
    pub fn pending_destroys(&self) -> usize {
        self.inner.deferred.borrow().len()
    }

    /// Runs queued native destroys now. Normally done by an idle source.
    pub fn flush_deferred(&self) {
        self.inner.flush_scheduled.set(false);
        let pending = self.inner.deferred.take();
        for raw in pending {
            self.toolkit().widget_destroy(raw);
            self.toolkit().object_unref(raw);
        }
    }

    pub(crate) fn toolkit(&self) -> &dyn Toolkit {
        &*self.inner.toolkit
    }

    pub(crate) fn next_trampoline(&self) -> TrampolineId {
        let next = self.inner.next_trampoline.get() + 1;
        self.inner.next_trampoline.set(next);
        TrampolineId::new(next)
    }

    pub(crate) fn enter_dispatch(&self) -> DispatchGuard<'_> {
        let depth = &self.inner.dispatch_depth;
        depth.set(depth.get() + 1);
        DispatchGuard { depth }
    }

    pub(crate) fn register(&self, kind: ResourceKind, raw: RawHandle) -> ResourceId {
        let id = self.inner.arena.borrow_mut().insert(raw, kind);
        if kind.is_widget() {
            self.watch_destroy(id, raw);
        }
        id
    }

    pub(crate) fn raw(&self, id: ResourceId) -> Result<RawHandle> {
        self.inner
            .arena
            .borrow()
            .get(id)
            .map(|entry| entry.raw)
            .ok_or(Error::StaleResource { id })
    }

    pub(crate) fn is_live(&self, id: ResourceId) -> bool {
        self.inner.arena.borrow().get(id).is_some()
    }

    pub(crate) fn child_slot(&self, id: ResourceId) -> Option<ResourceId> {
        let occupant = self.inner.arena.borrow().get(id).and_then(|entry| entry.child)?;
        self.is_live(occupant).then_some(occupant)
    }

    pub(crate) fn set_child_slot(&self, id: ResourceId, child: Option<ResourceId>) {
        if let Some(entry) = self.inner.arena.borrow_mut().get_mut(id) {
            entry.child = child;
        }
    }

    /// Takes a reference before the widget leaves its container, so the toolkit does not
    /// finalize it.
    pub(crate) fn hold_ref(&self, id: ResourceId) -> Result<()> {
        let raw = {
            let mut arena = self.inner.arena.borrow_mut();
            let entry = arena.get_mut(id).ok_or(Error::StaleResource { id })?;
            if entry.held_ref {
                return Ok(());
            }
            entry.held_ref = true;
            entry.raw
        };
        self.toolkit().object_ref(raw);
        Ok(())
    }

    /// Returns the reference taken by [`hold_ref`](Self::hold_ref) once a container owns the
    /// widget again.
    pub(crate) fn release_ref(&self, id: ResourceId) {
        let raw = {
            let mut arena = self.inner.arena.borrow_mut();
            match arena.get_mut(id) {
                Some(entry) if entry.held_ref => {
                    entry.held_ref = false;
                    entry.raw
                }
                _ => return,
            }
        };
        self.toolkit().object_unref(raw);
    }

    /// Releases every binding, frees the slot and destroys the native object. Inside a signal
    /// handler the native destroy waits for the next idle iteration.
    pub(crate) fn destroy(&self, id: ResourceId) {
        let Some(entry) = self.inner.arena.borrow_mut().remove(id) else {
            return;
        };
        let Entry {
            raw,
            kind,
            bindings,
            watch,
            held_ref,
            ..
        } = entry;
        debug!(resource = %id, %kind, "destroying resource");
        trampoline::release(self, raw, bindings, watch);
        if !kind.owns_native() {
            return;
        }
        if !kind.is_widget() {
            self.toolkit().object_unref(raw);
            return;
        }
        if self.is_dispatching() {
            if !held_ref {
                self.toolkit().object_ref(raw);
            }
            self.defer_destroy(id, raw);
        } else {
            self.toolkit().widget_destroy(raw);
            if held_ref {
                self.toolkit().object_unref(raw);
            }
        }
    }

    /// The toolkit destroyed the object itself. Frees the slot without another native destroy.
    pub(crate) fn native_destroyed(&self, id: ResourceId, watch: TrampolineId) {
        let entry = {
            let mut arena = self.inner.arena.borrow_mut();
            let watched = arena
                .get(id)
                .and_then(|entry| entry.watch)
                .is_some_and(|current| current.trampoline == watch);
            if !watched {
                return;
            }
            arena.remove(id)
        };
        let Some(entry) = entry else { return };
        debug!(resource = %id, kind = %entry.kind, "native object destroyed by the toolkit");
        trampoline::release(self, entry.raw, entry.bindings, entry.watch);
        if entry.held_ref {
            self.toolkit().object_unref(entry.raw);
        }
    }

    fn defer_destroy(&self, id: ResourceId, raw: RawHandle) {
        warn!(
            resource = %id,
            "destroy requested inside a signal handler; deferring native destroy"
        );
        self.inner.deferred.borrow_mut().push(raw);
        if self.inner.flush_scheduled.replace(true) {
            return;
        }
        let data = Box::into_raw(Box::new(self.downgrade())).cast::<c_void>();
        self.toolkit().idle_add(IdleSource {
            function: flush_source,
            data,
            notify: drop_flush_data,
        });
    }
}

pub(crate) struct DispatchGuard<'a> {
    depth: &'a Cell<u32>,
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

unsafe extern "C" fn flush_source(data: *mut c_void) -> c_int {
    // SAFETY: `data` is the boxed `WeakContext` created in `defer_destroy`, freed only by
    // `drop_flush_data` after this source is removed.
    let Some(weak) = (unsafe { data.cast::<WeakContext>().as_ref() }) else {
        return 0;
    };
    if let Some(context) = weak.upgrade() {
        context.flush_deferred();
    }
    0
}

unsafe extern "C" fn drop_flush_data(data: *mut c_void) {
    if !data.is_null() {
        // SAFETY: see `flush_source`; the toolkit calls this exactly once.
        drop(unsafe { Box::from_raw(data.cast::<WeakContext>()) });
    }
}
