#![allow(unsafe_code)]

//! Native signal callbacks routed to managed closures.
//!
//! The toolkit never sees a closure. It gets one of two static entry points and a boxed
//! [`Ticket`] naming the context, the resource, the signal and the binding generation. On
//! every emission the ticket is resolved against the arena; a ticket whose binding was
//! replaced or whose resource is gone resolves to nothing.

use std::ffi::{CStr, CString};
use std::fmt;
use std::os::raw::{c_int, c_void};
use std::panic::{self, AssertUnwindSafe};
use std::ptr::null_mut;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;
use tracing::{debug, error, trace, warn};

use crate::arena::{DestroyWatch, ResourceId, SignalBinding, SignalHandler};
use crate::context::{Context, ContextInner};
use crate::error::{Error, Result};
use crate::toolkit::{NativeButtonEvent, NativeTrampoline, RawHandle, TrampolineEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrampolineId(u64);

impl TrampolineId {
    pub(crate) fn new(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for TrampolineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Native shape of a signal handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signature {
    /// `void (*)(GtkWidget *instance, gpointer data)`.
    Notify,
    /// `gboolean (*)(GtkWidget *instance, GdkEvent *event, gpointer data)`.
    Event,
}

impl Signature {
    fn entry(self) -> TrampolineEntry {
        match self {
            Signature::Notify => TrampolineEntry::Notify(notify_trampoline),
            Signature::Event => TrampolineEntry::Event(event_trampoline),
        }
    }
}

/// Result of an event handler. Ignored for [`Signature::Notify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    Proceed,
    Stop,
}

/// What a handler learns about the emission.
#[derive(Debug)]
pub struct SignalArgs<'a> {
    signal: &'a str,
    resource: ResourceId,
    button: Option<u32>,
}

impl SignalArgs<'_> {
    pub fn signal(&self) -> &str {
        self.signal
    }

    pub fn resource(&self) -> ResourceId {
        self.resource
    }

    /// Mouse button of a `button-press-event` or `button-release-event`.
    pub fn button(&self) -> Option<u32> {
        self.button
    }
}

enum Role {
    Binding,
    DestroyWatch,
}

struct Ticket {
    context: Weak<ContextInner>,
    resource: ResourceId,
    signal: Box<str>,
    trampoline: TrampolineId,
    role: Role,
}

pub(crate) fn c_text(text: &str, what: &'static str) -> Result<CString> {
    CString::new(text).map_err(|_| Error::InvalidText { what })
}

unsafe extern "C" fn notify_trampoline(_instance: *mut c_void, data: *mut c_void) {
    // SAFETY: `data` is the ticket installed with this handler; the toolkit keeps it alive
    // for the duration of the emission.
    if let Some(ticket) = unsafe { data.cast::<Ticket>().as_ref() } {
        dispatch(ticket, None);
    }
}

unsafe extern "C" fn event_trampoline(
    _instance: *mut c_void,
    event: *mut c_void,
    data: *mut c_void,
) -> c_int {
    // SAFETY: as in `notify_trampoline`.
    let Some(ticket) = (unsafe { data.cast::<Ticket>().as_ref() }) else {
        return 0;
    };
    let button = button_of(&ticket.signal, event);
    match dispatch(ticket, button) {
        Propagation::Stop => 1,
        Propagation::Proceed => 0,
    }
}

unsafe extern "C" fn release_ticket(data: *mut c_void, _closure: *mut c_void) {
    if !data.is_null() {
        // SAFETY: `data` came from `Box::into_raw` in `install` and is released once.
        drop(unsafe { Box::from_raw(data.cast::<Ticket>()) });
    }
}

fn button_of(signal: &str, event: *mut c_void) -> Option<u32> {
    if event.is_null() || !matches!(signal, "button-press-event" | "button-release-event") {
        return None;
    }
    // SAFETY: GTK passes a `GdkEventButton` to both button signals.
    Some(unsafe { (*event.cast::<NativeButtonEvent>()).button })
}

fn dispatch(ticket: &Ticket, button: Option<u32>) -> Propagation {
    let Some(inner) = ticket.context.upgrade() else {
        return Propagation::Proceed;
    };
    let context = Context { inner };
    let resource = ticket.resource;
    let trampoline = ticket.trampoline;
    match ticket.role {
        Role::DestroyWatch => {
            context.native_destroyed(resource, trampoline);
            Propagation::Proceed
        }
        Role::Binding => {
            let signal: Box<str> = ticket.signal.clone();
            let Some(handler) = context.handler_for(resource, &signal, trampoline) else {
                trace!(%resource, signal = &*signal, %trampoline, "inert trampoline fired");
                return Propagation::Proceed;
            };
            trace!(%resource, signal = &*signal, %trampoline, "dispatching signal");
            let args = SignalArgs {
                signal: &signal,
                resource,
                button,
            };
            let _depth = context.enter_dispatch();
            match panic::catch_unwind(AssertUnwindSafe(|| handler(&args))) {
                Ok(propagation) => propagation,
                Err(payload) => {
                    error!(%resource, signal = &*signal, "signal handler panicked");
                    context.stash_panic(payload);
                    context.quit();
                    Propagation::Proceed
                }
            }
        }
    }
}

/// Drops the ticket when the toolkit refuses the connection.
fn install(
    context: &Context,
    raw: RawHandle,
    signal: &CStr,
    ticket: Ticket,
    signature: Signature,
    after: bool,
) -> u64 {
    let data = Box::into_raw(Box::new(ticket)).cast::<c_void>();
    let native = NativeTrampoline {
        entry: signature.entry(),
        data,
        destroy: release_ticket,
    };
    let native_id = context.toolkit().signal_connect(raw, signal, native, after);
    if native_id == 0 {
        // SAFETY: the toolkit did not take ownership of `data`.
        unsafe { release_ticket(data, null_mut()) };
    }
    native_id
}

/// Disconnects a slot's bindings and destroy watch natively. The handlers are dropped after
/// the native calls, outside any arena borrow.
pub(crate) fn release(
    context: &Context,
    raw: RawHandle,
    bindings: FxHashMap<String, SignalBinding>,
    watch: Option<DestroyWatch>,
) {
    for binding in bindings.values() {
        context.toolkit().signal_disconnect(raw, binding.native_id);
    }
    if let Some(watch) = watch {
        context.toolkit().signal_disconnect(raw, watch.native_id);
    }
    drop(bindings);
}

impl Context {
    /// Binds `handler` to `signal`, replacing and disconnecting any earlier binding for the
    /// same resource and signal first.
    pub(crate) fn connect(
        &self,
        resource: ResourceId,
        signal: &str,
        signature: Signature,
        handler: SignalHandler,
    ) -> Result<TrampolineId> {
        self.disconnect(resource, signal);
        let raw = self.raw(resource)?;
        let name = c_text(signal, "signal name")?;
        let trampoline = self.next_trampoline();
        let ticket = Ticket {
            context: Rc::downgrade(&self.inner),
            resource,
            signal: signal.into(),
            trampoline,
            role: Role::Binding,
        };
        let native_id = install(self, raw, &name, ticket, signature, false);
        if native_id == 0 {
            return Err(Error::UnknownSignal {
                signal: signal.to_string(),
            });
        }
        let binding = SignalBinding {
            trampoline,
            native_id,
            signature,
            handler,
        };
        if let Some(entry) = self.inner.arena.borrow_mut().get_mut(resource) {
            entry.bindings.insert(signal.to_string(), binding);
        }
        debug!(%resource, signal, ?signature, %trampoline, "connected signal");
        Ok(trampoline)
    }

    /// Returns whether a binding existed. Stale resources have none.
    pub(crate) fn disconnect(&self, resource: ResourceId, signal: &str) -> bool {
        let removed = {
            let mut arena = self.inner.arena.borrow_mut();
            arena
                .get_mut(resource)
                .and_then(|entry| entry.bindings.remove(signal).map(|binding| (entry.raw, binding)))
        };
        let Some((raw, binding)) = removed else {
            return false;
        };
        self.toolkit().signal_disconnect(raw, binding.native_id);
        debug!(%resource, signal, trampoline = %binding.trampoline, "disconnected signal");
        true
    }

    pub(crate) fn binding(
        &self,
        resource: ResourceId,
        signal: &str,
    ) -> Option<(TrampolineId, Signature)> {
        let arena = self.inner.arena.borrow();
        let binding = arena.get(resource)?.bindings.get(signal)?;
        Some((binding.trampoline, binding.signature))
    }

    fn handler_for(
        &self,
        resource: ResourceId,
        signal: &str,
        trampoline: TrampolineId,
    ) -> Option<SignalHandler> {
        let arena = self.inner.arena.borrow();
        let binding = arena.get(resource)?.bindings.get(signal)?;
        (binding.trampoline == trampoline).then(|| Rc::clone(&binding.handler))
    }

    /// Installs the internal `destroy` handler, connected after user handlers so theirs still
    /// run when the toolkit destroys the widget.
    pub(crate) fn watch_destroy(&self, resource: ResourceId, raw: RawHandle) {
        let trampoline = self.next_trampoline();
        let ticket = Ticket {
            context: Rc::downgrade(&self.inner),
            resource,
            signal: "destroy".into(),
            trampoline,
            role: Role::DestroyWatch,
        };
        let native_id = install(self, raw, c"destroy", ticket, Signature::Notify, true);
        if native_id == 0 {
            warn!(%resource, "toolkit refused the destroy watch");
            return;
        }
        if let Some(entry) = self.inner.arena.borrow_mut().get_mut(resource) {
            entry.watch = Some(DestroyWatch {
                trampoline,
                native_id,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::arena::ResourceKind;
    use crate::toolkit::{HeadlessToolkit, Toolkit};

    fn setup() -> (Rc<HeadlessToolkit>, Context, RawHandle, ResourceId) {
        let toolkit = Rc::new(HeadlessToolkit::new());
        let context = Context::headless(toolkit.clone());
        let raw = toolkit.button_new(c"Press").expect("button");
        let id = context.register(ResourceKind::Button, raw);
        (toolkit, context, raw, id)
    }

    fn counter(hits: &Rc<Cell<u32>>) -> SignalHandler {
        let hits = Rc::clone(hits);
        Rc::new(move |_: &SignalArgs<'_>| {
            hits.set(hits.get() + 1);
            Propagation::Proceed
        })
    }

    #[test]
    fn emission_reaches_the_bound_handler() {
        let (toolkit, context, raw, id) = setup();
        let hits = Rc::new(Cell::new(0));
        context
            .connect(id, "clicked", Signature::Notify, counter(&hits))
            .expect("connect");
        toolkit.emit(raw, "clicked");
        toolkit.emit(raw, "clicked");
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn replacement_leaves_one_native_handler() {
        let (toolkit, context, raw, id) = setup();
        let first = Rc::new(Cell::new(0));
        let second = Rc::new(Cell::new(0));
        let old = context
            .connect(id, "clicked", Signature::Notify, counter(&first))
            .expect("connect");
        let new = context
            .connect(id, "clicked", Signature::Notify, counter(&second))
            .expect("reconnect");
        assert_ne!(old, new);
        assert_eq!(toolkit.handler_count(raw, "clicked"), 1);
        toolkit.emit(raw, "clicked");
        assert_eq!((first.get(), second.get()), (0, 1));
        assert_eq!(toolkit.released_tickets(), 1);
    }

    #[test]
    fn disconnect_is_a_no_op_without_binding() {
        let (toolkit, context, _raw, id) = setup();
        assert!(!context.disconnect(id, "clicked"));
        assert!(toolkit.criticals().is_empty());
    }

    #[test]
    fn event_handler_sees_the_button_and_can_stop() {
        let (toolkit, context, raw, id) = setup();
        let seen = Rc::new(Cell::new(None));
        let record = Rc::clone(&seen);
        context
            .connect(
                id,
                "button-press-event",
                Signature::Event,
                Rc::new(move |args: &SignalArgs<'_>| {
                    record.set(args.button());
                    Propagation::Stop
                }),
            )
            .expect("connect");
        assert!(toolkit.press_button(raw, 3));
        assert_eq!(seen.get(), Some(3));
    }

    #[test]
    fn destroy_releases_every_ticket() {
        let (toolkit, context, raw, id) = setup();
        let hits = Rc::new(Cell::new(0));
        context
            .connect(id, "clicked", Signature::Notify, counter(&hits))
            .expect("connect");
        context.destroy(id);
        assert_eq!(toolkit.connected_handlers(), 0);
        // binding plus destroy watch
        assert_eq!(toolkit.released_tickets(), 2);
        toolkit.emit(raw, "clicked");
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn destroy_by_the_toolkit_frees_the_slot() {
        let (toolkit, context, raw, id) = setup();
        let window = toolkit.window_new().expect("window");
        toolkit.container_add(window, raw);
        toolkit.close_window(window);
        assert!(!context.is_live(id));
        assert!(toolkit.criticals().is_empty());
    }

    #[test]
    fn handler_may_destroy_its_own_widget() {
        let (toolkit, context, raw, id) = setup();
        let inner = context.clone();
        context
            .connect(
                id,
                "clicked",
                Signature::Notify,
                Rc::new(move |args: &SignalArgs<'_>| {
                    inner.destroy(args.resource());
                    Propagation::Proceed
                }),
            )
            .expect("connect");
        toolkit.emit(raw, "clicked");
        assert!(!context.is_live(id));
        assert!(toolkit.is_alive(raw), "native destroy waits for idle");
        assert_eq!(context.pending_destroys(), 1);
        toolkit.run_idle();
        assert!(!toolkit.is_alive(raw));
        assert_eq!(toolkit.extra_refs(raw), 0);
        assert!(toolkit.criticals().is_empty());
    }
}
