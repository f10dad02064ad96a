#![allow(unsafe_code)]

use std::ffi::{CStr, c_char};
use std::marker::PhantomData;
use std::os::raw::{c_int, c_ulong, c_void};
use std::ptr::{null, null_mut};
use std::sync::OnceLock;
use std::thread::{self, ThreadId};

use gtkbind_sys::constants::{G_PRIORITY_DEFAULT_IDLE, GTK_WINDOW_TOPLEVEL};
use gtkbind_sys::{LibraryConfig, NativeFunctionTable};
use tracing::debug;

use super::{IdleSource, NativeTrampoline, Orientation, RawHandle, Toolkit};
use crate::error::{Error, Result};

/// `G_CONNECT_AFTER`.
const CONNECT_AFTER: c_int = 1;

static GTK_THREAD: OnceLock<ThreadId> = OnceLock::new();

/// Forwards every operation to the process-wide GTK 3 function table.
///
/// GTK is bound to the first thread that creates a `GtkToolkit`; creating one anywhere else
/// fails with [`Error::WrongThread`]. The toolkit itself is neither `Send` nor `Sync`, so it
/// cannot leave that thread afterwards.
pub(crate) struct GtkToolkit {
    table: &'static NativeFunctionTable,
    _thread_bound: PhantomData<*const ()>,
}

impl GtkToolkit {
    pub(crate) fn load(config: &LibraryConfig) -> Result<Self> {
        let table = gtkbind_sys::load_table(config)?;
        Self::new(table)
    }

    pub(crate) fn new(table: &'static NativeFunctionTable) -> Result<Self> {
        let current = thread::current().id();
        let owner = *GTK_THREAD.get_or_init(|| current);
        if owner != current {
            return Err(Error::WrongThread);
        }
        Ok(Self {
            table,
            _thread_bound: PhantomData,
        })
    }
}

fn handle(ptr: *mut c_void) -> Option<RawHandle> {
    RawHandle::from_ptr(ptr)
}

fn owned_text(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    // SAFETY: GTK returns NUL-terminated UTF-8 owned by the widget; it is copied right away.
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

impl GtkToolkit {
    /// Reads and frees a `GError*` left behind by a failed call.
    fn take_error(&self, error: *mut c_void) -> String {
        if error.is_null() {
            return "unknown error".to_string();
        }
        #[repr(C)]
        struct GError {
            domain: u32,
            code: c_int,
            message: *const c_char,
        }
        // SAFETY: a non-null out-error from GTK points at a live GError.
        let message = owned_text(unsafe { (*(error as *const GError)).message });
        unsafe { (self.table.g_error_free)(error) };
        message
    }

    fn style_context(&self, widget: RawHandle) -> Option<*mut c_void> {
        let context = unsafe { (self.table.gtk_widget_get_style_context)(widget.as_ptr()) };
        (!context.is_null()).then_some(context)
    }
}

// SAFETY (whole impl): every `RawHandle` passed in is a live object of the kind the method
// expects, guaranteed by the resource arena, and every `&CStr` outlives the call.
impl Toolkit for GtkToolkit {
    fn init(&self) {
        debug!("gtk_init");
        unsafe { (self.table.gtk_init)(null_mut(), null_mut()) }
    }

    fn main(&self) {
        unsafe { (self.table.gtk_main)() }
    }

    fn main_quit(&self) {
        unsafe { (self.table.gtk_main_quit)() }
    }

    fn window_new(&self) -> Option<RawHandle> {
        handle(unsafe { (self.table.gtk_window_new)(GTK_WINDOW_TOPLEVEL) })
    }

    fn window_set_title(&self, window: RawHandle, title: &CStr) {
        unsafe { (self.table.gtk_window_set_title)(window.as_ptr(), title.as_ptr()) }
    }

    fn window_set_default_size(&self, window: RawHandle, width: i32, height: i32) {
        unsafe { (self.table.gtk_window_set_default_size)(window.as_ptr(), width, height) }
    }

    fn window_set_transient_for(&self, window: RawHandle, parent: RawHandle) {
        unsafe { (self.table.gtk_window_set_transient_for)(window.as_ptr(), parent.as_ptr()) }
    }

    fn container_add(&self, container: RawHandle, child: RawHandle) {
        unsafe { (self.table.gtk_container_add)(container.as_ptr(), child.as_ptr()) }
    }

    fn container_remove(&self, container: RawHandle, child: RawHandle) {
        unsafe { (self.table.gtk_container_remove)(container.as_ptr(), child.as_ptr()) }
    }

    fn widget_show_all(&self, widget: RawHandle) {
        unsafe { (self.table.gtk_widget_show_all)(widget.as_ptr()) }
    }

    fn widget_destroy(&self, widget: RawHandle) {
        unsafe { (self.table.gtk_widget_destroy)(widget.as_ptr()) }
    }

    fn widget_set_size_request(&self, widget: RawHandle, width: i32, height: i32) {
        unsafe { (self.table.gtk_widget_set_size_request)(widget.as_ptr(), width, height) }
    }

    fn widget_set_name(&self, widget: RawHandle, name: &CStr) {
        unsafe { (self.table.gtk_widget_set_name)(widget.as_ptr(), name.as_ptr()) }
    }

    fn widget_add_class(&self, widget: RawHandle, class: &CStr) {
        if let Some(context) = self.style_context(widget) {
            unsafe { (self.table.gtk_style_context_add_class)(context, class.as_ptr()) }
        }
    }

    fn widget_remove_class(&self, widget: RawHandle, class: &CStr) {
        if let Some(context) = self.style_context(widget) {
            unsafe { (self.table.gtk_style_context_remove_class)(context, class.as_ptr()) }
        }
    }

    fn button_new(&self, label: &CStr) -> Option<RawHandle> {
        handle(unsafe { (self.table.gtk_button_new_with_label)(label.as_ptr()) })
    }

    fn button_set_label(&self, button: RawHandle, label: &CStr) {
        unsafe { (self.table.gtk_button_set_label)(button.as_ptr(), label.as_ptr()) }
    }

    fn box_new(&self, orientation: Orientation, spacing: i32) -> Option<RawHandle> {
        handle(unsafe { (self.table.gtk_box_new)(orientation.native(), spacing) })
    }

    fn box_pack_start(
        &self,
        container: RawHandle,
        child: RawHandle,
        expand: bool,
        fill: bool,
        padding: u32,
    ) {
        unsafe {
            (self.table.gtk_box_pack_start)(
                container.as_ptr(),
                child.as_ptr(),
                c_int::from(expand),
                c_int::from(fill),
                padding,
            )
        }
    }

    fn grid_new(&self) -> Option<RawHandle> {
        handle(unsafe { (self.table.gtk_grid_new)() })
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
        unsafe {
            (self.table.gtk_grid_attach)(grid.as_ptr(), child.as_ptr(), column, row, width, height)
        }
    }

    fn grid_set_row_spacing(&self, grid: RawHandle, spacing: u32) {
        unsafe { (self.table.gtk_grid_set_row_spacing)(grid.as_ptr(), spacing) }
    }

    fn grid_set_column_spacing(&self, grid: RawHandle, spacing: u32) {
        unsafe { (self.table.gtk_grid_set_column_spacing)(grid.as_ptr(), spacing) }
    }

    fn label_new(&self, text: &CStr) -> Option<RawHandle> {
        handle(unsafe { (self.table.gtk_label_new)(text.as_ptr()) })
    }

    fn label_set_text(&self, label: RawHandle, text: &CStr) {
        unsafe { (self.table.gtk_label_set_text)(label.as_ptr(), text.as_ptr()) }
    }

    fn label_text(&self, label: RawHandle) -> String {
        owned_text(unsafe { (self.table.gtk_label_get_text)(label.as_ptr()) })
    }

    fn entry_new(&self) -> Option<RawHandle> {
        handle(unsafe { (self.table.gtk_entry_new)() })
    }

    fn entry_text(&self, entry: RawHandle) -> String {
        owned_text(unsafe { (self.table.gtk_entry_get_text)(entry.as_ptr()) })
    }

    fn entry_set_text(&self, entry: RawHandle, text: &CStr) {
        unsafe { (self.table.gtk_entry_set_text)(entry.as_ptr(), text.as_ptr()) }
    }

    fn entry_set_placeholder(&self, entry: RawHandle, text: &CStr) {
        unsafe { (self.table.gtk_entry_set_placeholder_text)(entry.as_ptr(), text.as_ptr()) }
    }

    fn dialog_new(&self) -> Option<RawHandle> {
        handle(unsafe { (self.table.gtk_dialog_new)() })
    }

    fn dialog_add_button(
        &self,
        dialog: RawHandle,
        label: &CStr,
        response: i32,
    ) -> Option<RawHandle> {
        let add = self.table.gtk_dialog_add_button;
        handle(unsafe { add(dialog.as_ptr(), label.as_ptr(), response) })
    }

    fn dialog_content_area(&self, dialog: RawHandle) -> Option<RawHandle> {
        handle(unsafe { (self.table.gtk_dialog_get_content_area)(dialog.as_ptr()) })
    }

    fn menu_new(&self) -> Option<RawHandle> {
        handle(unsafe { (self.table.gtk_menu_new)() })
    }

    fn menu_item_new(&self, label: &CStr) -> Option<RawHandle> {
        handle(unsafe { (self.table.gtk_menu_item_new_with_label)(label.as_ptr()) })
    }

    fn menu_shell_append(&self, menu: RawHandle, item: RawHandle) {
        unsafe { (self.table.gtk_menu_shell_append)(menu.as_ptr(), item.as_ptr()) }
    }

    fn menu_attach_to_widget(&self, menu: RawHandle, widget: RawHandle) {
        unsafe { (self.table.gtk_menu_attach_to_widget)(menu.as_ptr(), widget.as_ptr(), null()) }
    }

    fn menu_popup_at_pointer(&self, menu: RawHandle) {
        unsafe { (self.table.gtk_menu_popup_at_pointer)(menu.as_ptr(), null()) }
    }

    fn css_provider_new(&self) -> Option<RawHandle> {
        handle(unsafe { (self.table.gtk_css_provider_new)() })
    }

    fn css_provider_load_from_data(&self, provider: RawHandle, css: &CStr) -> Result<(), String> {
        let mut error = null_mut();
        let load = self.table.gtk_css_provider_load_from_data;
        let ok = unsafe { load(provider.as_ptr(), css.as_ptr(), -1, &mut error) };
        if ok != 0 { Ok(()) } else { Err(self.take_error(error)) }
    }

    fn css_provider_load_from_path(&self, provider: RawHandle, path: &CStr) -> Result<(), String> {
        let mut error = null_mut();
        let load = self.table.gtk_css_provider_load_from_path;
        let ok = unsafe { load(provider.as_ptr(), path.as_ptr(), &mut error) };
        if ok != 0 { Ok(()) } else { Err(self.take_error(error)) }
    }

    fn style_add_provider(&self, widget: RawHandle, provider: RawHandle, priority: u32) {
        if let Some(context) = self.style_context(widget) {
            let add = self.table.gtk_style_context_add_provider;
            unsafe { add(context, provider.as_ptr(), priority) }
        }
    }

    fn style_add_provider_for_screen(&self, widget: RawHandle, provider: RawHandle, priority: u32) {
        let screen = unsafe { (self.table.gtk_widget_get_screen)(widget.as_ptr()) };
        if screen.is_null() {
            return;
        }
        let add = self.table.gtk_style_context_add_provider_for_screen;
        unsafe { add(screen, provider.as_ptr(), priority) }
    }

    fn object_ref(&self, object: RawHandle) {
        unsafe { (self.table.g_object_ref)(object.as_ptr()) };
    }

    fn object_unref(&self, object: RawHandle) {
        unsafe { (self.table.g_object_unref)(object.as_ptr()) }
    }

    fn signal_connect(
        &self,
        instance: RawHandle,
        signal: &CStr,
        trampoline: NativeTrampoline,
        after: bool,
    ) -> u64 {
        let flags = if after { CONNECT_AFTER } else { 0 };
        let id = unsafe {
            (self.table.g_signal_connect_data)(
                instance.as_ptr(),
                signal.as_ptr(),
                trampoline.entry.address(),
                trampoline.data,
                trampoline.destroy as *const c_void,
                flags,
            )
        };
        u64::from(id)
    }

    fn signal_disconnect(&self, instance: RawHandle, handler: u64) {
        // Ids come from `signal_connect` and fit the native width.
        unsafe { (self.table.g_signal_handler_disconnect)(instance.as_ptr(), handler as c_ulong) }
    }

    fn idle_add(&self, source: IdleSource) {
        unsafe {
            (self.table.g_idle_add_full)(
                G_PRIORITY_DEFAULT_IDLE,
                source.function as *const c_void,
                source.data,
                source.notify as *const c_void,
            );
        }
    }
}
