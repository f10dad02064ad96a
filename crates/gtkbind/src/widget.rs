use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::arena::{ResourceId, ResourceKind};
use crate::context::{Context, WeakContext};
use crate::error::{Error, Result};
use crate::toolkit::RawHandle;
use crate::trampoline::{c_text, Propagation, SignalArgs, Signature, TrampolineId};

/// Size request value meaning "no constraint".
pub const UNCONSTRAINED: i32 = -1;

/// Managed handle to one native resource.
///
/// Clones share the resource. After [`destroy`](Self::destroy), here or through any clone, the
/// handle is null: operations that need the native object fail with
/// [`Error::StaleResource`], `show` and `destroy` do nothing.
#[derive(Clone)]
pub struct Widget {
    context: Context,
    id: ResourceId,
    kind: ResourceKind,
}

impl Widget {
    /// Takes ownership of a freshly created native object.
    pub(crate) fn adopt(
        context: &Context,
        kind: ResourceKind,
        raw: Option<RawHandle>,
    ) -> Result<Self> {
        let raw = raw.ok_or(Error::NativeAllocation { kind })?;
        let id = context.register(kind, raw);
        debug!(resource = %id, %kind, "created native resource");
        Ok(Self {
            context: context.clone(),
            id,
            kind,
        })
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn is_live(&self) -> bool {
        self.context.is_live(self.id)
    }

    pub(crate) fn raw(&self) -> Result<RawHandle> {
        self.context.raw(self.id)
    }

    pub fn downgrade(&self) -> WeakWidget {
        WeakWidget {
            context: self.context.downgrade(),
            id: self.id,
            kind: self.kind,
        }
    }

    pub fn show(&self) {
        if let Ok(raw) = self.raw() {
            self.context.toolkit().widget_show_all(raw);
        }
    }

    /// `-1` ([`UNCONSTRAINED`]) leaves a dimension to the toolkit.
    pub fn set_size(&self, width: i32, height: i32) -> Result<()> {
        let raw = self.raw()?;
        self.context
            .toolkit()
            .widget_set_size_request(raw, width.max(UNCONSTRAINED), height.max(UNCONSTRAINED));
        Ok(())
    }

    pub fn set_name(&self, name: &str) -> Result<()> {
        let name = c_text(name, "widget name")?;
        let raw = self.raw()?;
        self.context.toolkit().widget_set_name(raw, &name);
        Ok(())
    }

    pub fn add_class(&self, class: &str) -> Result<()> {
        let class = c_text(class, "style class")?;
        let raw = self.raw()?;
        self.context.toolkit().widget_add_class(raw, &class);
        Ok(())
    }

    pub fn remove_class(&self, class: &str) -> Result<()> {
        let class = c_text(class, "style class")?;
        let raw = self.raw()?;
        self.context.toolkit().widget_remove_class(raw, &class);
        Ok(())
    }

    /// Binds `handler` to `signal`. An existing binding for the same signal is disconnected
    /// first, so at most one handler per signal is ever live.
    pub fn connect_signal<F>(
        &self,
        signal: &str,
        signature: Signature,
        handler: F,
    ) -> Result<TrampolineId>
    where
        F: Fn(&SignalArgs<'_>) -> Propagation + 'static,
    {
        self.context.connect(self.id, signal, signature, Rc::new(handler))
    }

    /// [`connect_signal`](Self::connect_signal) for `(instance, data)` signals.
    pub fn connect_notify<F>(&self, signal: &str, handler: F) -> Result<TrampolineId>
    where
        F: Fn() + 'static,
    {
        self.connect_signal(signal, Signature::Notify, move |_| {
            handler();
            Propagation::Proceed
        })
    }

    /// Returns whether a binding was removed.
    pub fn disconnect_signal(&self, signal: &str) -> bool {
        self.context.disconnect(self.id, signal)
    }

    /// The live binding for `signal`, if any.
    pub fn binding(&self, signal: &str) -> Option<(TrampolineId, Signature)> {
        self.context.binding(self.id, signal)
    }

    pub fn destroy(&self) {
        self.context.destroy(self.id);
    }
}

impl PartialEq for Widget {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Rc::ptr_eq(&self.context.inner, &other.context.inner)
    }
}

impl Eq for Widget {}

impl fmt::Debug for Widget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Widget")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("live", &self.is_live())
            .finish()
    }
}

/// Non-owning counterpart of [`Widget`] for use inside signal handlers.
#[derive(Clone)]
pub struct WeakWidget {
    context: WeakContext,
    id: ResourceId,
    kind: ResourceKind,
}

impl WeakWidget {
    /// `None` once the context is gone or the resource was destroyed.
    pub fn upgrade(&self) -> Option<Widget> {
        let context = self.context.upgrade()?;
        if !context.is_live(self.id) {
            return None;
        }
        Some(Widget {
            context,
            id: self.id,
            kind: self.kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::toolkit::{HeadlessToolkit, NativeCall, Toolkit};

    fn label(toolkit: &Rc<HeadlessToolkit>, context: &Context) -> Widget {
        Widget::adopt(context, ResourceKind::Label, toolkit.label_new(c"text")).expect("label")
    }

    #[test]
    fn null_constructor_result_is_an_allocation_error() {
        let toolkit = Rc::new(HeadlessToolkit::new());
        let context = Context::headless(toolkit.clone());
        toolkit.fail_allocations(1);
        let err = Widget::adopt(&context, ResourceKind::Grid, toolkit.grid_new())
            .expect_err("null handle");
        assert!(matches!(err, Error::NativeAllocation { kind: ResourceKind::Grid }));
        assert_eq!(context.live_resources(), 0);
    }

    #[test]
    fn destroyed_widget_rejects_native_operations() {
        let toolkit = Rc::new(HeadlessToolkit::new());
        let context = Context::headless(toolkit.clone());
        let widget = label(&toolkit, &context);
        let copy = widget.clone();
        widget.destroy();
        assert!(!copy.is_live());
        assert!(matches!(copy.set_name("late"), Err(Error::StaleResource { .. })));
        copy.show();
        copy.destroy();
        assert!(toolkit.criticals().is_empty());
    }

    #[test]
    fn size_below_unconstrained_is_clamped() {
        let toolkit = Rc::new(HeadlessToolkit::new());
        let context = Context::headless(toolkit.clone());
        let widget = label(&toolkit, &context);
        widget.set_size(-5, 40).expect("size");
        let raw = widget.raw().expect("raw");
        assert!(toolkit.calls().contains(&NativeCall::SetSizeRequest {
            widget: raw,
            width: -1,
            height: 40,
        }));
    }

    #[test]
    fn interior_nul_is_rejected_before_any_native_call() {
        let toolkit = Rc::new(HeadlessToolkit::new());
        let context = Context::headless(toolkit.clone());
        let widget = label(&toolkit, &context);
        toolkit.clear_calls();
        assert!(matches!(widget.add_class("a\0b"), Err(Error::InvalidText { .. })));
        assert!(toolkit.calls().is_empty());
    }

    #[test]
    fn weak_widget_does_not_outlive_destroy() {
        let toolkit = Rc::new(HeadlessToolkit::new());
        let context = Context::headless(toolkit.clone());
        let widget = label(&toolkit, &context);
        let weak = widget.downgrade();
        assert_eq!(weak.upgrade(), Some(widget.clone()));
        widget.destroy();
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn connect_notify_ignores_signal_arguments() {
        let toolkit = Rc::new(HeadlessToolkit::new());
        let context = Context::headless(toolkit.clone());
        let widget = label(&toolkit, &context);
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        widget
            .connect_notify("activate-link", move || counter.set(counter.get() + 1))
            .expect("connect");
        assert!(matches!(widget.binding("activate-link"), Some((_, Signature::Notify))));
        toolkit.emit(widget.raw().expect("raw"), "activate-link");
        assert_eq!(hits.get(), 1);
        assert!(widget.disconnect_signal("activate-link"));
        assert!(widget.binding("activate-link").is_none());
    }
}
