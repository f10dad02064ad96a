//! The seam between managed code and the native widget toolkit.
//!
//! Everything above this module talks to the crate-private `Toolkit` trait. `GtkToolkit`
//! forwards to the loaded GTK 3 function table. [`HeadlessToolkit`] records calls and drives
//! the real trampolines so the widget layer can be exercised without a display.
//!
//! Native pointers never leave the crate. A [`RawHandle`] handed out by [`HeadlessToolkit`]
//! only identifies a fabricated object, and application code cannot build one:
//!
//! ```compile_fail
//! use std::os::raw::c_void;
//! let _ = gtkbind::toolkit::RawHandle::from_ptr(0x10 as *mut c_void);
//! ```
//!
//! Nor can it reach the native operations themselves:
//!
//! ```compile_fail
//! use gtkbind::toolkit::Toolkit;
//! ```

mod gtk;
mod headless;

use std::ffi::CStr;
use std::fmt;
use std::os::raw::{c_int, c_void};
use std::ptr::NonNull;

pub(crate) use gtk::GtkToolkit;
pub use headless::{HeadlessToolkit, LoopExit, NativeCall};

/// Opaque, non-null native object pointer.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawHandle(NonNull<c_void>);

impl RawHandle {
    pub(crate) fn from_ptr(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    pub(crate) fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }
}

impl fmt::Debug for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawHandle({:p})", self.0)
    }
}

pub(crate) type NotifyFn = unsafe extern "C" fn(instance: *mut c_void, data: *mut c_void);
pub(crate) type EventFn =
    unsafe extern "C" fn(instance: *mut c_void, event: *mut c_void, data: *mut c_void) -> c_int;
/// `GClosureNotify`: receives the connect-time data and the closure.
pub(crate) type DestroyNotifyFn = unsafe extern "C" fn(data: *mut c_void, closure: *mut c_void);
/// `GSourceFunc`: non-zero keeps the source installed.
pub(crate) type SourceFn = unsafe extern "C" fn(data: *mut c_void) -> c_int;
/// `GDestroyNotify`.
pub(crate) type SourceNotifyFn = unsafe extern "C" fn(data: *mut c_void);

/// Native entry point of a signal handler.
#[derive(Clone, Copy)]
pub(crate) enum TrampolineEntry {
    Notify(NotifyFn),
    Event(EventFn),
}

impl TrampolineEntry {
    pub(crate) fn address(self) -> *const c_void {
        match self {
            TrampolineEntry::Notify(entry) => entry as *const c_void,
            TrampolineEntry::Event(entry) => entry as *const c_void,
        }
    }
}

impl fmt::Debug for TrampolineEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrampolineEntry::Notify(_) => f.write_str("Notify"),
            TrampolineEntry::Event(_) => f.write_str("Event"),
        }
    }
}

/// Everything the native signal-connect primitive needs. The toolkit must call `destroy`
/// with `data` exactly once, after the handler is disconnected and no emission still uses it.
#[derive(Debug, Clone, Copy)]
pub(crate) struct NativeTrampoline {
    pub entry: TrampolineEntry,
    pub data: *mut c_void,
    pub destroy: DestroyNotifyFn,
}

/// An idle callback. `notify` is called with `data` once the source is removed.
#[derive(Debug, Clone, Copy)]
pub(crate) struct IdleSource {
    pub function: SourceFn,
    pub data: *mut c_void,
    pub notify: SourceNotifyFn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    pub(crate) fn native(self) -> c_int {
        match self {
            Orientation::Horizontal => gtkbind_sys::constants::GTK_ORIENTATION_HORIZONTAL,
            Orientation::Vertical => gtkbind_sys::constants::GTK_ORIENTATION_VERTICAL,
        }
    }
}

/// Leading fields of GTK 3's `GdkEventButton`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub(crate) struct NativeButtonEvent {
    pub event_type: c_int,
    pub window: *mut c_void,
    pub send_event: i8,
    pub time: u32,
    pub x: f64,
    pub y: f64,
    pub axes: *mut f64,
    pub state: u32,
    pub button: u32,
    pub device: *mut c_void,
    pub x_root: f64,
    pub y_root: f64,
}

impl NativeButtonEvent {
    pub(crate) fn press(button: u32) -> Self {
        Self {
            event_type: gtkbind_sys::constants::GDK_BUTTON_PRESS,
            window: std::ptr::null_mut(),
            send_event: 0,
            time: 0,
            x: 0.0,
            y: 0.0,
            axes: std::ptr::null_mut(),
            state: 0,
            button,
            device: std::ptr::null_mut(),
            x_root: 0.0,
            y_root: 0.0,
        }
    }
}

/// Native operations used by the widget layer. Constructors return `None` when the toolkit
/// hands back a null object.
pub(crate) trait Toolkit {
    fn init(&self);
    fn main(&self);
    fn main_quit(&self);

    fn window_new(&self) -> Option<RawHandle>;
    fn window_set_title(&self, window: RawHandle, title: &CStr);
    fn window_set_default_size(&self, window: RawHandle, width: i32, height: i32);
    fn window_set_transient_for(&self, window: RawHandle, parent: RawHandle);

    fn container_add(&self, container: RawHandle, child: RawHandle);
    fn container_remove(&self, container: RawHandle, child: RawHandle);

    fn widget_show_all(&self, widget: RawHandle);
    fn widget_destroy(&self, widget: RawHandle);
    fn widget_set_size_request(&self, widget: RawHandle, width: i32, height: i32);
    fn widget_set_name(&self, widget: RawHandle, name: &CStr);
    fn widget_add_class(&self, widget: RawHandle, class: &CStr);
    fn widget_remove_class(&self, widget: RawHandle, class: &CStr);

    fn button_new(&self, label: &CStr) -> Option<RawHandle>;
    fn button_set_label(&self, button: RawHandle, label: &CStr);

    fn box_new(&self, orientation: Orientation, spacing: i32) -> Option<RawHandle>;
    fn box_pack_start(
        &self,
        container: RawHandle,
        child: RawHandle,
        expand: bool,
        fill: bool,
        padding: u32,
    );

    fn grid_new(&self) -> Option<RawHandle>;
    fn grid_attach(
        &self,
        grid: RawHandle,
        child: RawHandle,
        column: i32,
        row: i32,
        width: i32,
        height: i32,
    );
    fn grid_set_row_spacing(&self, grid: RawHandle, spacing: u32);
    fn grid_set_column_spacing(&self, grid: RawHandle, spacing: u32);

    fn label_new(&self, text: &CStr) -> Option<RawHandle>;
    fn label_set_text(&self, label: RawHandle, text: &CStr);
    fn label_text(&self, label: RawHandle) -> String;

    fn entry_new(&self) -> Option<RawHandle>;
    fn entry_text(&self, entry: RawHandle) -> String;
    fn entry_set_text(&self, entry: RawHandle, text: &CStr);
    fn entry_set_placeholder(&self, entry: RawHandle, text: &CStr);

    fn dialog_new(&self) -> Option<RawHandle>;
    fn dialog_add_button(
        &self,
        dialog: RawHandle,
        label: &CStr,
        response: i32,
    ) -> Option<RawHandle>;
    fn dialog_content_area(&self, dialog: RawHandle) -> Option<RawHandle>;

    fn menu_new(&self) -> Option<RawHandle>;
    fn menu_item_new(&self, label: &CStr) -> Option<RawHandle>;
    fn menu_shell_append(&self, menu: RawHandle, item: RawHandle);
    fn menu_attach_to_widget(&self, menu: RawHandle, widget: RawHandle);
    fn menu_popup_at_pointer(&self, menu: RawHandle);

    fn css_provider_new(&self) -> Option<RawHandle>;
    /// `Err` carries the toolkit's parse message.
    fn css_provider_load_from_data(&self, provider: RawHandle, css: &CStr) -> Result<(), String>;
    fn css_provider_load_from_path(&self, provider: RawHandle, path: &CStr) -> Result<(), String>;
    fn style_add_provider(&self, widget: RawHandle, provider: RawHandle, priority: u32);
    fn style_add_provider_for_screen(&self, widget: RawHandle, provider: RawHandle, priority: u32);

    fn object_ref(&self, object: RawHandle);
    fn object_unref(&self, object: RawHandle);

    /// Returns the native handler id, `0` when the signal is unknown. On `0` the toolkit has
    /// not taken ownership of `trampoline.data`.
    fn signal_connect(
        &self,
        instance: RawHandle,
        signal: &CStr,
        trampoline: NativeTrampoline,
        after: bool,
    ) -> u64;
    fn signal_disconnect(&self, instance: RawHandle, handler: u64);

    fn idle_add(&self, source: IdleSource);
}
