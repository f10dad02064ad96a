#![allow(unsafe_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::ffi::CStr;
use std::os::raw::c_void;
use std::ptr::null_mut;

use rustc_hash::FxHashMap;
use tracing::trace;

use super::{
    IdleSource, NativeButtonEvent, NativeTrampoline, Orientation, RawHandle, Toolkit,
    TrampolineEntry,
};

/// One recorded toolkit call. Pure reads (text getters, content-area lookup) are not recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeCall {
    Init,
    Main,
    MainQuit,
    New { kind: &'static str, handle: RawHandle },
    SetTitle { window: RawHandle, title: String },
    SetDefaultSize { window: RawHandle, width: i32, height: i32 },
    SetTransientFor { window: RawHandle, parent: RawHandle },
    ContainerAdd { container: RawHandle, child: RawHandle },
    ContainerRemove { container: RawHandle, child: RawHandle },
    ShowAll(RawHandle),
    Destroy(RawHandle),
    SetSizeRequest { widget: RawHandle, width: i32, height: i32 },
    SetName { widget: RawHandle, name: String },
    AddClass { widget: RawHandle, class: String },
    RemoveClass { widget: RawHandle, class: String },
    SetLabel { widget: RawHandle, label: String },
    SetText { widget: RawHandle, text: String },
    SetPlaceholder { widget: RawHandle, text: String },
    PackStart { container: RawHandle, child: RawHandle, expand: bool, fill: bool, padding: u32 },
    GridAttach {
        grid: RawHandle,
        child: RawHandle,
        column: i32,
        row: i32,
        width: i32,
        height: i32,
    },
    SetRowSpacing { grid: RawHandle, spacing: u32 },
    SetColumnSpacing { grid: RawHandle, spacing: u32 },
    DialogAddButton { dialog: RawHandle, button: RawHandle, label: String, response: i32 },
    MenuAppend { menu: RawHandle, item: RawHandle },
    MenuAttach { menu: RawHandle, widget: RawHandle },
    MenuPopup(RawHandle),
    CssLoad { provider: RawHandle, ok: bool },
    AddProvider { widget: RawHandle, provider: RawHandle, priority: u32 },
    AddProviderForScreen { widget: RawHandle, provider: RawHandle, priority: u32 },
    Ref(RawHandle),
    Unref(RawHandle),
    Connect { instance: RawHandle, signal: String, handler: u64, after: bool },
    Disconnect { instance: RawHandle, handler: u64 },
    IdleAdd,
}

impl NativeCall {
    /// Signal and reference bookkeeping, as opposed to calls that shape the widget tree.
    pub fn is_bookkeeping(&self) -> bool {
        matches!(
            self,
            NativeCall::Connect { .. }
                | NativeCall::Disconnect { .. }
                | NativeCall::Ref(_)
                | NativeCall::Unref(_)
                | NativeCall::IdleAdd
        )
    }
}

/// Why the most recent `main` returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    Quit,
    /// No idle source and no scripted step was left. A real loop would block here.
    Drained,
}

type Step = Box<dyn FnOnce(&HeadlessToolkit)>;

struct Object {
    kind: &'static str,
    name: String,
    alive: bool,
    destroying: bool,
    parent: Option<RawHandle>,
    children: Vec<RawHandle>,
    text: String,
    extra_refs: i32,
}

struct Handler {
    id: u64,
    instance: RawHandle,
    signal: String,
    trampoline: NativeTrampoline,
    after: bool,
}

#[derive(Default)]
struct State {
    next_object: usize,
    next_handler: u64,
    objects: FxHashMap<RawHandle, Object>,
    order: Vec<RawHandle>,
    handlers: Vec<Handler>,
    calls: Vec<NativeCall>,
    criticals: Vec<String>,
    idle: VecDeque<IdleSource>,
    script: VecDeque<Step>,
    loop_depth: u32,
    quit_requested: bool,
    last_exit: Option<LoopExit>,
    emission_depth: u32,
    pending_release: Vec<NativeTrampoline>,
    released: usize,
    fail_allocations: u32,
}

impl State {
    fn allocate(&mut self, kind: &'static str, text: &str) -> Option<RawHandle> {
        if self.fail_allocations > 0 {
            self.fail_allocations -= 1;
            return None;
        }
        self.next_object += 1;
        let address = 0x1000 + self.next_object * 0x10;
        let handle = RawHandle::from_ptr(address as *mut c_void)?;
        self.objects.insert(
            handle,
            Object {
                kind,
                name: format!("{kind}{}", self.next_object),
                alive: true,
                destroying: false,
                parent: None,
                children: Vec::new(),
                text: text.to_string(),
                extra_refs: 0,
            },
        );
        self.order.push(handle);
        Some(handle)
    }

    fn created(&mut self, kind: &'static str, text: &str) -> Option<RawHandle> {
        let handle = self.allocate(kind, text)?;
        self.calls.push(NativeCall::New { kind, handle });
        Some(handle)
    }

    /// Flags use of an unknown or destroyed object the way GTK prints a critical.
    fn check(&mut self, handle: RawHandle, op: &str) -> bool {
        match self.objects.get(&handle) {
            Some(object) if object.alive => true,
            Some(object) => {
                let message = format!("{op}: {} was destroyed", object.name);
                self.criticals.push(message);
                false
            }
            None => {
                self.criticals.push(format!("{op}: unknown object {handle:?}"));
                false
            }
        }
    }

    fn link(&mut self, container: RawHandle, child: RawHandle, op: &str) {
        if !self.check(container, op) || !self.check(child, op) {
            return;
        }
        if let Some(parent) = self.objects.get(&child).and_then(|object| object.parent) {
            let name = self.name(child);
            let parent = self.name(parent);
            self.criticals.push(format!("{op}: {name} already has parent {parent}"));
            return;
        }
        if let Some(object) = self.objects.get_mut(&child) {
            object.parent = Some(container);
        }
        if let Some(object) = self.objects.get_mut(&container) {
            object.children.push(child);
        }
    }

    fn unlink(&mut self, child: RawHandle) {
        let parent = self.objects.get_mut(&child).and_then(|object| object.parent.take());
        if let Some(object) = parent.and_then(|parent| self.objects.get_mut(&parent)) {
            object.children.retain(|candidate| *candidate != child);
        }
    }

    fn name(&self, handle: RawHandle) -> String {
        self.objects
            .get(&handle)
            .map(|object| object.name.clone())
            .unwrap_or_else(|| format!("{handle:?}"))
    }

    fn set_text(&mut self, handle: RawHandle, text: &str) -> bool {
        match self.objects.get_mut(&handle) {
            Some(object) if object.text != text => {
                object.text = text.to_string();
                true
            }
            _ => false,
        }
    }

    fn describe(&self, call: &NativeCall) -> String {
        let n = |handle: &RawHandle| self.name(*handle);
        match call {
            NativeCall::Init => "init".to_string(),
            NativeCall::Main => "main".to_string(),
            NativeCall::MainQuit => "main_quit".to_string(),
            NativeCall::New { handle, .. } => format!("new {}", n(handle)),
            NativeCall::SetTitle { window, title } => format!("set_title {} {title:?}", n(window)),
            NativeCall::SetDefaultSize { window, width, height } => {
                format!("set_default_size {} {width}x{height}", n(window))
            }
            NativeCall::SetTransientFor { window, parent } => {
                format!("set_transient_for {} {}", n(window), n(parent))
            }
            NativeCall::ContainerAdd { container, child } => {
                format!("container_add {} {}", n(container), n(child))
            }
            NativeCall::ContainerRemove { container, child } => {
                format!("container_remove {} {}", n(container), n(child))
            }
            NativeCall::ShowAll(widget) => format!("show_all {}", n(widget)),
            NativeCall::Destroy(widget) => format!("destroy {}", n(widget)),
            NativeCall::SetSizeRequest { widget, width, height } => {
                format!("set_size_request {} {width}x{height}", n(widget))
            }
            NativeCall::SetName { widget, name } => format!("set_name {} {name:?}", n(widget)),
            NativeCall::AddClass { widget, class } => format!("add_class {} {class:?}", n(widget)),
            NativeCall::RemoveClass { widget, class } => {
                format!("remove_class {} {class:?}", n(widget))
            }
            NativeCall::SetLabel { widget, label } => format!("set_label {} {label:?}", n(widget)),
            NativeCall::SetText { widget, text } => format!("set_text {} {text:?}", n(widget)),
            NativeCall::SetPlaceholder { widget, text } => {
                format!("set_placeholder {} {text:?}", n(widget))
            }
            NativeCall::PackStart { container, child, expand, fill, padding } => format!(
                "pack_start {} {} expand={expand} fill={fill} padding={padding}",
                n(container),
                n(child)
            ),
            NativeCall::GridAttach { grid, child, column, row, width, height } => format!(
                "grid_attach {} {} at {column},{row} span {width}x{height}",
                n(grid),
                n(child)
            ),
            NativeCall::SetRowSpacing { grid, spacing } => {
                format!("set_row_spacing {} {spacing}", n(grid))
            }
            NativeCall::SetColumnSpacing { grid, spacing } => {
                format!("set_column_spacing {} {spacing}", n(grid))
            }
            NativeCall::DialogAddButton { dialog, button, label, response } => format!(
                "dialog_add_button {} {} {label:?} response={response}",
                n(dialog),
                n(button)
            ),
            NativeCall::MenuAppend { menu, item } => format!("menu_append {} {}", n(menu), n(item)),
            NativeCall::MenuAttach { menu, widget } => {
                format!("menu_attach {} {}", n(menu), n(widget))
            }
            NativeCall::MenuPopup(menu) => format!("menu_popup {}", n(menu)),
            NativeCall::CssLoad { provider, ok } => format!("css_load {} ok={ok}", n(provider)),
            NativeCall::AddProvider { widget, provider, priority } => {
                format!("add_provider {} {} priority={priority}", n(widget), n(provider))
            }
            NativeCall::AddProviderForScreen { widget, provider, priority } => format!(
                "add_provider_for_screen {} {} priority={priority}",
                n(widget),
                n(provider)
            ),
            NativeCall::Ref(object) => format!("ref {}", n(object)),
            NativeCall::Unref(object) => format!("unref {}", n(object)),
            NativeCall::Connect { instance, signal, handler, after } => format!(
                "connect {} {signal:?} id={handler}{}",
                n(instance),
                if *after { " after" } else { "" }
            ),
            NativeCall::Disconnect { instance, handler } => {
                format!("disconnect {} id={handler}", n(instance))
            }
            NativeCall::IdleAdd => "idle_add".to_string(),
        }
    }
}

/// A toolkit with no display behind it.
///
/// Objects are fabricated addresses that are never dereferenced. Signal handlers are stored
/// with their real trampoline and ticket, so [`emit`](Self::emit) runs exactly the code a GTK
/// emission would. Destroying a container destroys its children, `"destroy"` is emitted before
/// that, and tickets of handlers disconnected mid-emission are released once the outermost
/// emission returns, the way GObject keeps a closure alive while it is being invoked.
#[derive(Default)]
pub struct HeadlessToolkit {
    state: RefCell<State>,
}

impl HeadlessToolkit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<NativeCall> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// One line per recorded call, skipping signal and reference bookkeeping.
    pub fn transcript(&self) -> String {
        let state = self.state.borrow();
        state
            .calls
            .iter()
            .filter(|call| !call.is_bookkeeping())
            .map(|call| state.describe(call))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn describe(&self, call: &NativeCall) -> String {
        self.state.borrow().describe(call)
    }

    pub fn name_of(&self, handle: RawHandle) -> String {
        self.state.borrow().name(handle)
    }

    /// Every object of `kind` in creation order, destroyed ones included.
    pub fn created(&self, kind: &str) -> Vec<RawHandle> {
        let state = self.state.borrow();
        state
            .order
            .iter()
            .copied()
            .filter(|handle| state.objects.get(handle).is_some_and(|object| object.kind == kind))
            .collect()
    }

    /// First live object whose label or text equals `text`.
    pub fn find_by_text(&self, text: &str) -> Option<RawHandle> {
        let state = self.state.borrow();
        state.order.iter().copied().find(|handle| {
            state
                .objects
                .get(handle)
                .is_some_and(|object| object.alive && object.text == text)
        })
    }

    pub fn is_alive(&self, handle: RawHandle) -> bool {
        self.state.borrow().objects.get(&handle).is_some_and(|object| object.alive)
    }

    pub fn parent_of(&self, handle: RawHandle) -> Option<RawHandle> {
        self.state.borrow().objects.get(&handle).and_then(|object| object.parent)
    }

    pub fn children_of(&self, handle: RawHandle) -> Vec<RawHandle> {
        self.state
            .borrow()
            .objects
            .get(&handle)
            .map(|object| object.children.clone())
            .unwrap_or_default()
    }

    pub fn text_of(&self, handle: RawHandle) -> Option<String> {
        self.state.borrow().objects.get(&handle).map(|object| object.text.clone())
    }

    /// References taken through `object_ref` and not yet returned.
    pub fn extra_refs(&self, handle: RawHandle) -> i32 {
        self.state.borrow().objects.get(&handle).map_or(0, |object| object.extra_refs)
    }

    pub fn handler_count(&self, instance: RawHandle, signal: &str) -> usize {
        self.state
            .borrow()
            .handlers
            .iter()
            .filter(|handler| handler.instance == instance && handler.signal == signal)
            .count()
    }

    pub fn connected_handlers(&self) -> usize {
        self.state.borrow().handlers.len()
    }

    /// Number of tickets handed back through their destroy notify.
    pub fn released_tickets(&self) -> usize {
        self.state.borrow().released
    }

    /// Misuse GTK would report as a critical warning: calls on destroyed objects, double
    /// parenting, quitting without a loop, unknown handler ids.
    pub fn criticals(&self) -> Vec<String> {
        self.state.borrow().criticals.clone()
    }

    /// Makes the next `count` constructors return null.
    pub fn fail_allocations(&self, count: u32) {
        self.state.borrow_mut().fail_allocations = count;
    }

    pub fn last_loop_exit(&self) -> Option<LoopExit> {
        self.state.borrow().last_exit
    }

    pub fn loop_running(&self) -> bool {
        self.state.borrow().loop_depth > 0
    }

    pub fn pending_idle(&self) -> usize {
        self.state.borrow().idle.len()
    }

    /// Queues a step for `main` to run once every pending idle source has run.
    pub fn queue(&self, step: impl FnOnce(&HeadlessToolkit) + 'static) {
        self.state.borrow_mut().script.push_back(Box::new(step));
    }

    /// Runs idle sources until none is left. Returns how many ran.
    pub fn run_idle(&self) -> usize {
        let mut ran = 0;
        while self.run_one_idle() {
            ran += 1;
        }
        ran
    }

    /// Emits `signal` on `instance`. Returns `true` when an event handler stopped emission.
    pub fn emit(&self, instance: RawHandle, signal: &str) -> bool {
        self.emit_with(instance, signal, null_mut())
    }

    pub fn press_button(&self, instance: RawHandle, button: u32) -> bool {
        let mut event = NativeButtonEvent::press(button);
        let event_ptr = (&mut event as *mut NativeButtonEvent).cast::<c_void>();
        self.emit_with(instance, "button-press-event", event_ptr)
    }

    /// Replaces the text the way typing does and emits `"changed"`.
    pub fn type_text(&self, entry: RawHandle, text: &str) {
        let changed = self.state.borrow_mut().set_text(entry, text);
        if changed {
            self.emit(entry, "changed");
        }
    }

    /// What the window manager's close button does: destroy without going through the
    /// widget layer.
    pub fn close_window(&self, window: RawHandle) {
        self.destroy_native(window);
    }

    fn emit_with(&self, instance: RawHandle, signal: &str, event: *mut c_void) -> bool {
        let targets: Vec<(u64, TrampolineEntry, *mut c_void)> = {
            let state = self.state.borrow();
            let (mut normal, mut after): (Vec<&Handler>, Vec<&Handler>) = state
                .handlers
                .iter()
                .filter(|handler| handler.instance == instance && handler.signal == signal)
                .partition(|handler| !handler.after);
            normal.append(&mut after);
            normal
                .into_iter()
                .map(|handler| (handler.id, handler.trampoline.entry, handler.trampoline.data))
                .collect()
        };
        trace!(signal, handlers = targets.len(), "headless emission");
        self.state.borrow_mut().emission_depth += 1;
        let mut stopped = false;
        for (id, entry, data) in targets {
            let connected = self.state.borrow().handlers.iter().any(|handler| handler.id == id);
            if !connected {
                continue;
            }
            match entry {
                // SAFETY: `data` is the ticket registered with this entry and is only released
                // after the outermost emission returns.
                TrampolineEntry::Notify(entry) => unsafe { entry(instance.as_ptr(), data) },
                TrampolineEntry::Event(entry) => {
                    if unsafe { entry(instance.as_ptr(), event, data) } != 0 {
                        stopped = true;
                        break;
                    }
                }
            }
        }
        let released = {
            let mut state = self.state.borrow_mut();
            state.emission_depth -= 1;
            if state.emission_depth == 0 {
                std::mem::take(&mut state.pending_release)
            } else {
                Vec::new()
            }
        };
        for trampoline in released {
            self.release(trampoline);
        }
        stopped
    }

    fn release(&self, trampoline: NativeTrampoline) {
        self.state.borrow_mut().released += 1;
        // SAFETY: each trampoline is released exactly once, with the data it was connected with.
        unsafe { (trampoline.destroy)(trampoline.data, null_mut()) }
    }

    fn detach_handlers(&self, matches: impl Fn(&Handler) -> bool) {
        let released = {
            let mut state = self.state.borrow_mut();
            let (removed, kept): (Vec<Handler>, Vec<Handler>) = std::mem::take(&mut state.handlers)
                .into_iter()
                .partition(|handler| matches(handler));
            state.handlers = kept;
            let trampolines = removed.into_iter().map(|handler| handler.trampoline);
            if state.emission_depth > 0 {
                state.pending_release.extend(trampolines);
                Vec::new()
            } else {
                trampolines.collect()
            }
        };
        for trampoline in released {
            self.release(trampoline);
        }
    }

    fn destroy_native(&self, handle: RawHandle) {
        {
            let mut state = self.state.borrow_mut();
            match state.objects.get_mut(&handle) {
                Some(object) if object.alive && !object.destroying => object.destroying = true,
                _ => return,
            }
        }
        self.emit(handle, "destroy");
        let children = self.children_of(handle);
        for child in children {
            self.destroy_native(child);
        }
        {
            let mut state = self.state.borrow_mut();
            state.unlink(handle);
            if let Some(object) = state.objects.get_mut(&handle) {
                object.alive = false;
                object.destroying = false;
            }
        }
        self.detach_handlers(|handler| handler.instance == handle);
    }

    fn run_one_idle(&self) -> bool {
        let Some(source) = self.state.borrow_mut().idle.pop_front() else {
            return false;
        };
        // SAFETY: the source was registered through `idle_add` and not yet removed.
        let again = unsafe { (source.function)(source.data) } != 0;
        if again {
            self.state.borrow_mut().idle.push_back(source);
        } else {
            unsafe { (source.notify)(source.data) }
        }
        true
    }

    fn record(&self, call: NativeCall) {
        self.state.borrow_mut().calls.push(call);
    }

    fn record_on(&self, handle: RawHandle, op: &str, call: NativeCall) -> bool {
        let mut state = self.state.borrow_mut();
        state.calls.push(call);
        state.check(handle, op)
    }
}

fn text(value: &CStr) -> String {
    value.to_string_lossy().into_owned()
}

fn validate_css(css: &str) -> Result<(), String> {
    let mut depth = 0usize;
    for (offset, ch) in css.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' if depth == 0 => return Err(format!("<data>:{offset}: unexpected '}}'")),
            '}' => depth -= 1,
            _ => {}
        }
    }
    if depth == 0 {
        Ok(())
    } else {
        Err("<data>: unterminated block".to_string())
    }
}

impl Toolkit for HeadlessToolkit {
    fn init(&self) {
        self.record(NativeCall::Init);
    }

    fn main(&self) {
        {
            let mut state = self.state.borrow_mut();
            state.calls.push(NativeCall::Main);
            state.loop_depth += 1;
            state.quit_requested = false;
        }
        let exit = loop {
            if self.state.borrow().quit_requested {
                break LoopExit::Quit;
            }
            if self.run_one_idle() {
                continue;
            }
            let step = self.state.borrow_mut().script.pop_front();
            match step {
                Some(step) => step(self),
                None => break LoopExit::Drained,
            }
        };
        let mut state = self.state.borrow_mut();
        state.loop_depth -= 1;
        state.quit_requested = false;
        state.last_exit = Some(exit);
    }

    fn main_quit(&self) {
        let mut state = self.state.borrow_mut();
        state.calls.push(NativeCall::MainQuit);
        if state.loop_depth == 0 {
            state.criticals.push("gtk_main_quit: no main loop running".to_string());
        } else {
            state.quit_requested = true;
        }
    }

    fn window_new(&self) -> Option<RawHandle> {
        self.state.borrow_mut().created("window", "")
    }

    fn window_set_title(&self, window: RawHandle, title: &CStr) {
        let title = text(title);
        let call = NativeCall::SetTitle {
            window,
            title: title.clone(),
        };
        self.record_on(window, "gtk_window_set_title", call);
        self.state.borrow_mut().set_text(window, &title);
    }

    fn window_set_default_size(&self, window: RawHandle, width: i32, height: i32) {
        self.record_on(
            window,
            "gtk_window_set_default_size",
            NativeCall::SetDefaultSize { window, width, height },
        );
    }

    fn window_set_transient_for(&self, window: RawHandle, parent: RawHandle) {
        self.record_on(
            window,
            "gtk_window_set_transient_for",
            NativeCall::SetTransientFor { window, parent },
        );
    }

    fn container_add(&self, container: RawHandle, child: RawHandle) {
        let mut state = self.state.borrow_mut();
        state.calls.push(NativeCall::ContainerAdd { container, child });
        state.link(container, child, "gtk_container_add");
    }

    fn container_remove(&self, container: RawHandle, child: RawHandle) {
        let mut state = self.state.borrow_mut();
        state.calls.push(NativeCall::ContainerRemove { container, child });
        if !state.check(container, "gtk_container_remove") {
            return;
        }
        if state.objects.get(&child).and_then(|object| object.parent) != Some(container) {
            let message = format!(
                "gtk_container_remove: {} is not a child of {}",
                state.name(child),
                state.name(container)
            );
            state.criticals.push(message);
            return;
        }
        state.unlink(child);
    }

    fn widget_show_all(&self, widget: RawHandle) {
        self.record_on(widget, "gtk_widget_show_all", NativeCall::ShowAll(widget));
    }

    fn widget_destroy(&self, widget: RawHandle) {
        let referenced_corpse = {
            let state = self.state.borrow();
            state
                .objects
                .get(&widget)
                .is_some_and(|object| !object.alive && object.extra_refs > 0)
        };
        if referenced_corpse {
            // GTK tolerates destroying an object that is already destroyed but still referenced.
            self.record(NativeCall::Destroy(widget));
            return;
        }
        if self.record_on(widget, "gtk_widget_destroy", NativeCall::Destroy(widget)) {
            self.destroy_native(widget);
        }
    }

    fn widget_set_size_request(&self, widget: RawHandle, width: i32, height: i32) {
        self.record_on(
            widget,
            "gtk_widget_set_size_request",
            NativeCall::SetSizeRequest { widget, width, height },
        );
    }

    fn widget_set_name(&self, widget: RawHandle, name: &CStr) {
        let call = NativeCall::SetName {
            widget,
            name: text(name),
        };
        self.record_on(widget, "gtk_widget_set_name", call);
    }

    fn widget_add_class(&self, widget: RawHandle, class: &CStr) {
        self.record_on(
            widget,
            "gtk_style_context_add_class",
            NativeCall::AddClass { widget, class: text(class) },
        );
    }

    fn widget_remove_class(&self, widget: RawHandle, class: &CStr) {
        self.record_on(
            widget,
            "gtk_style_context_remove_class",
            NativeCall::RemoveClass { widget, class: text(class) },
        );
    }

    fn button_new(&self, label: &CStr) -> Option<RawHandle> {
        self.state.borrow_mut().created("button", &text(label))
    }

    fn button_set_label(&self, button: RawHandle, label: &CStr) {
        let label = text(label);
        let call = NativeCall::SetLabel {
            widget: button,
            label: label.clone(),
        };
        if self.record_on(button, "gtk_button_set_label", call) {
            self.state.borrow_mut().set_text(button, &label);
        }
    }

    fn box_new(&self, orientation: Orientation, _spacing: i32) -> Option<RawHandle> {
        let kind = match orientation {
            Orientation::Horizontal => "hbox",
            Orientation::Vertical => "vbox",
        };
        self.state.borrow_mut().created(kind, "")
    }

    fn box_pack_start(
        &self,
        container: RawHandle,
        child: RawHandle,
        expand: bool,
        fill: bool,
        padding: u32,
    ) {
        let mut state = self.state.borrow_mut();
        state.calls.push(NativeCall::PackStart { container, child, expand, fill, padding });
        state.link(container, child, "gtk_box_pack_start");
    }

    fn grid_new(&self) -> Option<RawHandle> {
        self.state.borrow_mut().created("grid", "")
    }

    fn grid_attach(
        &self,
        grid: RawHandle,
        child: RawHandle,
        column: i32,
        row: i32,
        width: i32,
        height: i32,
    ) {
        let mut state = self.state.borrow_mut();
        state.calls.push(NativeCall::GridAttach { grid, child, column, row, width, height });
        state.link(grid, child, "gtk_grid_attach");
    }

    fn grid_set_row_spacing(&self, grid: RawHandle, spacing: u32) {
        self.record_on(
            grid,
            "gtk_grid_set_row_spacing",
            NativeCall::SetRowSpacing { grid, spacing },
        );
    }

    fn grid_set_column_spacing(&self, grid: RawHandle, spacing: u32) {
        self.record_on(
            grid,
            "gtk_grid_set_column_spacing",
            NativeCall::SetColumnSpacing { grid, spacing },
        );
    }

    fn label_new(&self, label: &CStr) -> Option<RawHandle> {
        self.state.borrow_mut().created("label", &text(label))
    }

    fn label_set_text(&self, label: RawHandle, value: &CStr) {
        let value = text(value);
        let call = NativeCall::SetText {
            widget: label,
            text: value.clone(),
        };
        if self.record_on(label, "gtk_label_set_text", call) {
            self.state.borrow_mut().set_text(label, &value);
        }
    }

    fn label_text(&self, label: RawHandle) -> String {
        self.text_of(label).unwrap_or_default()
    }

    fn entry_new(&self) -> Option<RawHandle> {
        self.state.borrow_mut().created("entry", "")
    }

    fn entry_text(&self, entry: RawHandle) -> String {
        self.text_of(entry).unwrap_or_default()
    }

    fn entry_set_text(&self, entry: RawHandle, value: &CStr) {
        let value = text(value);
        let call = NativeCall::SetText {
            widget: entry,
            text: value.clone(),
        };
        if self.record_on(entry, "gtk_entry_set_text", call) {
            let changed = self.state.borrow_mut().set_text(entry, &value);
            if changed {
                self.emit(entry, "changed");
            }
        }
    }

    fn entry_set_placeholder(&self, entry: RawHandle, value: &CStr) {
        self.record_on(
            entry,
            "gtk_entry_set_placeholder_text",
            NativeCall::SetPlaceholder { widget: entry, text: text(value) },
        );
    }

    fn dialog_new(&self) -> Option<RawHandle> {
        let mut state = self.state.borrow_mut();
        let dialog = state.created("dialog", "")?;
        if let Some(area) = state.allocate("content-area", "") {
            state.link(dialog, area, "gtk_dialog_new");
        }
        Some(dialog)
    }

    fn dialog_add_button(
        &self,
        dialog: RawHandle,
        label: &CStr,
        response: i32,
    ) -> Option<RawHandle> {
        let mut state = self.state.borrow_mut();
        if !state.check(dialog, "gtk_dialog_add_button") {
            return None;
        }
        let label = text(label);
        let button = state.allocate("button", &label)?;
        state.calls.push(NativeCall::DialogAddButton { dialog, button, label, response });
        state.link(dialog, button, "gtk_dialog_add_button");
        Some(button)
    }

    fn dialog_content_area(&self, dialog: RawHandle) -> Option<RawHandle> {
        let state = self.state.borrow();
        let object = state.objects.get(&dialog).filter(|object| object.alive)?;
        object.children.iter().copied().find(|child| {
            state.objects.get(child).is_some_and(|object| object.kind == "content-area")
        })
    }

    fn menu_new(&self) -> Option<RawHandle> {
        self.state.borrow_mut().created("menu", "")
    }

    fn menu_item_new(&self, label: &CStr) -> Option<RawHandle> {
        self.state.borrow_mut().created("menu-item", &text(label))
    }

    fn menu_shell_append(&self, menu: RawHandle, item: RawHandle) {
        let mut state = self.state.borrow_mut();
        state.calls.push(NativeCall::MenuAppend { menu, item });
        state.link(menu, item, "gtk_menu_shell_append");
    }

    fn menu_attach_to_widget(&self, menu: RawHandle, widget: RawHandle) {
        let mut state = self.state.borrow_mut();
        state.calls.push(NativeCall::MenuAttach { menu, widget });
        state.check(menu, "gtk_menu_attach_to_widget");
        state.check(widget, "gtk_menu_attach_to_widget");
    }

    fn menu_popup_at_pointer(&self, menu: RawHandle) {
        self.record_on(menu, "gtk_menu_popup_at_pointer", NativeCall::MenuPopup(menu));
    }

    fn css_provider_new(&self) -> Option<RawHandle> {
        self.state.borrow_mut().created("css-provider", "")
    }

    fn css_provider_load_from_data(&self, provider: RawHandle, css: &CStr) -> Result<(), String> {
        let result = validate_css(&css.to_string_lossy());
        self.record_on(
            provider,
            "gtk_css_provider_load_from_data",
            NativeCall::CssLoad { provider, ok: result.is_ok() },
        );
        result
    }

    fn css_provider_load_from_path(&self, provider: RawHandle, path: &CStr) -> Result<(), String> {
        let path = text(path);
        let result = std::fs::read_to_string(&path)
            .map_err(|err| format!("{path}: {err}"))
            .and_then(|css| validate_css(&css));
        self.record_on(
            provider,
            "gtk_css_provider_load_from_path",
            NativeCall::CssLoad { provider, ok: result.is_ok() },
        );
        result
    }

    fn style_add_provider(&self, widget: RawHandle, provider: RawHandle, priority: u32) {
        self.record_on(
            widget,
            "gtk_style_context_add_provider",
            NativeCall::AddProvider { widget, provider, priority },
        );
    }

    fn style_add_provider_for_screen(&self, widget: RawHandle, provider: RawHandle, priority: u32) {
        self.record_on(
            widget,
            "gtk_style_context_add_provider_for_screen",
            NativeCall::AddProviderForScreen { widget, provider, priority },
        );
    }

    fn object_ref(&self, object: RawHandle) {
        let mut state = self.state.borrow_mut();
        state.calls.push(NativeCall::Ref(object));
        if let Some(target) = state.objects.get_mut(&object) {
            target.extra_refs += 1;
        }
    }

    fn object_unref(&self, object: RawHandle) {
        let mut state = self.state.borrow_mut();
        state.calls.push(NativeCall::Unref(object));
        let Some(target) = state.objects.get_mut(&object) else {
            return;
        };
        if target.kind == "css-provider" {
            target.alive = false;
            return;
        }
        target.extra_refs -= 1;
        if target.extra_refs < 0 {
            let message = format!("g_object_unref: {} has no reference to drop", target.name);
            state.criticals.push(message);
        }
    }

    fn signal_connect(
        &self,
        instance: RawHandle,
        signal: &CStr,
        trampoline: NativeTrampoline,
        after: bool,
    ) -> u64 {
        let mut state = self.state.borrow_mut();
        if !state.check(instance, "g_signal_connect_data") {
            return 0;
        }
        state.next_handler += 1;
        let id = state.next_handler;
        let signal = text(signal);
        state.calls.push(NativeCall::Connect {
            instance,
            signal: signal.clone(),
            handler: id,
            after,
        });
        state.handlers.push(Handler { id, instance, signal, trampoline, after });
        id
    }

    fn signal_disconnect(&self, instance: RawHandle, handler: u64) {
        {
            let mut state = self.state.borrow_mut();
            state.calls.push(NativeCall::Disconnect { instance, handler });
            let known = state
                .handlers
                .iter()
                .any(|candidate| candidate.id == handler && candidate.instance == instance);
            if !known {
                let message = format!(
                    "g_signal_handler_disconnect: {} has no handler with id {handler}",
                    state.name(instance)
                );
                state.criticals.push(message);
                return;
            }
        }
        self.detach_handlers(|candidate| candidate.id == handler);
    }

    fn idle_add(&self, source: IdleSource) {
        let mut state = self.state.borrow_mut();
        state.calls.push(NativeCall::IdleAdd);
        state.idle.push_back(source);
    }
}
