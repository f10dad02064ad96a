#![allow(unsafe_code)]

use std::os::raw::{c_char, c_int, c_uint, c_ulong, c_void};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::debug;

use crate::config::LibraryConfig;
use crate::error::LoadError;
use crate::platform::LibraryKind;
use crate::signature::{NativeValue, SymbolSignature};

/// One opened shared library. Lives until process exit.
#[derive(Debug)]
pub struct LoadedLibrary {
    kind: LibraryKind,
    path: PathBuf,
    library: libloading::Library,
}

impl LoadedLibrary {
    /// Opens `path` without consulting or filling the process-wide cache.
    pub fn open(kind: LibraryKind, path: &Path) -> Result<Self, LoadError> {
        // SAFETY: GTK, GObject and GLib run no unsound initializers on load.
        let library =
            unsafe { libloading::Library::new(path) }.map_err(|source| {
                LoadError::LibraryNotFound {
                    kind,
                    path: path.to_path_buf(),
                    source,
                }
            })?;
        Ok(Self {
            kind,
            path: path.to_path_buf(),
            library,
        })
    }

    pub fn kind(&self) -> LibraryKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn symbol<T: Copy>(&'static self, symbol: &'static str) -> Result<T, LoadError> {
        // SAFETY: `T` is the function pointer type declared next to the symbol name in
        // `native_functions!`, which mirrors the GTK 3 headers.
        let bound = unsafe { self.library.get::<T>(symbol.as_bytes()) };
        bound.map(|symbol| *symbol).map_err(|source| LoadError::SymbolMissing {
            kind: self.kind,
            symbol: symbol.trim_end_matches('\0').to_string(),
            source,
        })
    }
}

static GTK: OnceLock<LoadedLibrary> = OnceLock::new();
static GOBJECT: OnceLock<LoadedLibrary> = OnceLock::new();
static GLIB: OnceLock<LoadedLibrary> = OnceLock::new();
static TABLE: OnceLock<NativeFunctionTable> = OnceLock::new();

fn library_cell(kind: LibraryKind) -> &'static OnceLock<LoadedLibrary> {
    match kind {
        LibraryKind::Gtk => &GTK,
        LibraryKind::GObject => &GOBJECT,
        LibraryKind::GLib => &GLIB,
    }
}

/// Opens `kind` once per process. Later calls return the cached library even if `config`
/// names a different path. Failures are not cached.
pub fn load(
    kind: LibraryKind,
    config: &LibraryConfig,
) -> Result<&'static LoadedLibrary, LoadError> {
    let cell = library_cell(kind);
    if let Some(loaded) = cell.get() {
        return Ok(loaded);
    }
    let path = config.path_for(kind)?;
    let opened = LoadedLibrary::open(kind, &path)?;
    debug!(%kind, path = %path.display(), "opened native library");
    Ok(cell.get_or_init(|| opened))
}

/// Opens the three libraries and binds every entry point, once per process.
pub fn load_table(config: &LibraryConfig) -> Result<&'static NativeFunctionTable, LoadError> {
    if let Some(table) = TABLE.get() {
        return Ok(table);
    }
    let libraries = Libraries {
        gtk: load(LibraryKind::Gtk, config)?,
        gobject: load(LibraryKind::GObject, config)?,
        glib: load(LibraryKind::GLib, config)?,
    };
    let table = NativeFunctionTable::bind(&libraries)?;
    debug!(symbols = SIGNATURES.len(), "bound native function table");
    Ok(TABLE.get_or_init(|| table))
}

/// The table if a previous [`load_table`] succeeded.
pub fn loaded_table() -> Option<&'static NativeFunctionTable> {
    TABLE.get()
}

pub fn signature(name: &str) -> Option<&'static SymbolSignature> {
    SIGNATURES.iter().find(|signature| signature.name == name)
}

struct Libraries {
    gtk: &'static LoadedLibrary,
    gobject: &'static LoadedLibrary,
    glib: &'static LoadedLibrary,
}

impl Libraries {
    fn get(&self, kind: LibraryKind) -> &'static LoadedLibrary {
        match kind {
            LibraryKind::Gtk => self.gtk,
            LibraryKind::GObject => self.gobject,
            LibraryKind::GLib => self.glib,
        }
    }
}

macro_rules! native_functions {
    (@ret) => { () };
    (@ret $ret:ty) => { $ret };
    ($(
        $library:ident {
            $( fn $name:ident($($arg:ident: $ty:ty),* $(,)?) $(-> $ret:ty)?; )*
        }
    )*) => {
        /// Typed entry points, one field per bound symbol.
        #[derive(Clone, Copy)]
        pub struct NativeFunctionTable {
            $($( pub $name: unsafe extern "C" fn($($arg: $ty),*) $(-> $ret)?, )*)*
        }

        /// Descriptors for every field of [`NativeFunctionTable`], in declaration order.
        pub static SIGNATURES: &[SymbolSignature] = &[
            $($(
                SymbolSignature {
                    name: stringify!($name),
                    library: LibraryKind::$library,
                    params: &[$(<$ty as NativeValue>::KIND),*],
                    result: <native_functions!(@ret $($ret)?) as NativeValue>::KIND,
                },
            )*)*
        ];

        impl NativeFunctionTable {
            fn bind(libraries: &Libraries) -> Result<Self, LoadError> {
                Ok(Self {
                    $($(
                        $name: libraries
                            .get(LibraryKind::$library)
                            .symbol::<unsafe extern "C" fn($($ty),*) $(-> $ret)?>(
                                concat!(stringify!($name), "\0"),
                            )?,
                    )*)*
                })
            }
        }
    };
}

native_functions! {
    Gtk {
        fn gtk_init(argc: *mut c_int, argv: *mut *mut *mut c_char);
        fn gtk_main();
        fn gtk_main_quit();

        fn gtk_window_new(window_type: c_int) -> *mut c_void;
        fn gtk_window_set_title(window: *mut c_void, title: *const c_char);
        fn gtk_window_set_default_size(window: *mut c_void, width: c_int, height: c_int);
        fn gtk_window_set_transient_for(window: *mut c_void, parent: *mut c_void);

        fn gtk_container_add(container: *mut c_void, widget: *mut c_void);
        fn gtk_container_remove(container: *mut c_void, widget: *mut c_void);

        fn gtk_widget_show_all(widget: *mut c_void);
        fn gtk_widget_destroy(widget: *mut c_void);
        fn gtk_widget_set_size_request(widget: *mut c_void, width: c_int, height: c_int);
        fn gtk_widget_set_name(widget: *mut c_void, name: *const c_char);
        fn gtk_widget_get_style_context(widget: *mut c_void) -> *mut c_void;
        fn gtk_widget_get_screen(widget: *mut c_void) -> *mut c_void;

        fn gtk_button_new_with_label(label: *const c_char) -> *mut c_void;
        fn gtk_button_set_label(button: *mut c_void, label: *const c_char);

        fn gtk_box_new(orientation: c_int, spacing: c_int) -> *mut c_void;
        fn gtk_box_pack_start(
            container: *mut c_void,
            child: *mut c_void,
            expand: c_int,
            fill: c_int,
            padding: c_uint,
        );

        fn gtk_grid_new() -> *mut c_void;
        fn gtk_grid_attach(
            grid: *mut c_void,
            child: *mut c_void,
            left: c_int,
            top: c_int,
            width: c_int,
            height: c_int,
        );
        fn gtk_grid_set_row_spacing(grid: *mut c_void, spacing: c_uint);
        fn gtk_grid_set_column_spacing(grid: *mut c_void, spacing: c_uint);

        fn gtk_label_new(text: *const c_char) -> *mut c_void;
        fn gtk_label_set_text(label: *mut c_void, text: *const c_char);
        fn gtk_label_get_text(label: *mut c_void) -> *const c_char;

        fn gtk_entry_new() -> *mut c_void;
        fn gtk_entry_get_text(entry: *mut c_void) -> *const c_char;
        fn gtk_entry_set_text(entry: *mut c_void, text: *const c_char);
        fn gtk_entry_set_placeholder_text(entry: *mut c_void, text: *const c_char);

        fn gtk_dialog_new() -> *mut c_void;
        fn gtk_dialog_add_button(
            dialog: *mut c_void,
            button_text: *const c_char,
            response_id: c_int,
        ) -> *mut c_void;
        fn gtk_dialog_get_content_area(dialog: *mut c_void) -> *mut c_void;

        fn gtk_menu_new() -> *mut c_void;
        fn gtk_menu_item_new_with_label(label: *const c_char) -> *mut c_void;
        fn gtk_menu_shell_append(menu_shell: *mut c_void, child: *mut c_void);
        fn gtk_menu_popup_at_pointer(menu: *mut c_void, trigger_event: *const c_void);
        fn gtk_menu_attach_to_widget(
            menu: *mut c_void,
            attach_widget: *mut c_void,
            detacher: *const c_void,
        );

        fn gtk_css_provider_new() -> *mut c_void;
        fn gtk_css_provider_load_from_data(
            provider: *mut c_void,
            data: *const c_char,
            length: isize,
            error: *mut *mut c_void,
        ) -> c_int;
        fn gtk_css_provider_load_from_path(
            provider: *mut c_void,
            path: *const c_char,
            error: *mut *mut c_void,
        ) -> c_int;
        fn gtk_style_context_add_provider(
            context: *mut c_void,
            provider: *mut c_void,
            priority: c_uint,
        );
        fn gtk_style_context_add_provider_for_screen(
            screen: *mut c_void,
            provider: *mut c_void,
            priority: c_uint,
        );
        fn gtk_style_context_add_class(context: *mut c_void, class_name: *const c_char);
        fn gtk_style_context_remove_class(context: *mut c_void, class_name: *const c_char);
    }
    GObject {
        fn g_signal_connect_data(
            instance: *mut c_void,
            detailed_signal: *const c_char,
            c_handler: *const c_void,
            data: *mut c_void,
            destroy_data: *const c_void,
            connect_flags: c_int,
        ) -> c_ulong;
        fn g_signal_handler_disconnect(instance: *mut c_void, handler_id: c_ulong);
        fn g_object_ref(object: *mut c_void) -> *mut c_void;
        fn g_object_unref(object: *mut c_void);
    }
    GLib {
        fn g_idle_add_full(
            priority: c_int,
            function: *const c_void,
            data: *mut c_void,
            notify: *const c_void,
        ) -> c_uint;
        fn g_error_free(error: *mut c_void);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::signature::ValueKind;

    #[test]
    fn signatures_have_unique_names() {
        let mut seen = HashSet::new();
        for signature in SIGNATURES {
            assert!(seen.insert(signature.name), "duplicate {}", signature.name);
        }
    }

    #[test]
    fn pack_start_signature_matches_header() {
        let signature = signature("gtk_box_pack_start").expect("gtk_box_pack_start");
        assert_eq!(signature.library, LibraryKind::Gtk);
        assert_eq!(
            signature.params,
            &[
                ValueKind::Pointer,
                ValueKind::Pointer,
                ValueKind::I32,
                ValueKind::I32,
                ValueKind::U32,
            ]
        );
        assert_eq!(signature.result, ValueKind::Void);
    }

    #[test]
    fn signal_connect_lives_in_gobject() {
        let signature = signature("g_signal_connect_data").expect("g_signal_connect_data");
        assert_eq!(signature.library, LibraryKind::GObject);
        assert_eq!(signature.params.len(), 6);
        assert!(matches!(signature.result, ValueKind::U64 | ValueKind::U32));
    }

    #[test]
    fn signature_display_is_readable() {
        let signature = signature("gtk_entry_get_text").expect("gtk_entry_get_text");
        assert_eq!(signature.to_string(), "gtk_entry_get_text(pointer) -> pointer");
    }

    #[test]
    fn unknown_symbol_has_no_signature() {
        assert!(signature("gtk_frobnicate").is_none());
    }

    #[test]
    fn opening_missing_file_is_library_not_found() {
        let err = LoadedLibrary::open(
            LibraryKind::Gtk,
            Path::new("/nonexistent/gtkbind/libgtk-3.so.0"),
        )
        .expect_err("missing library must fail");
        match err {
            LoadError::LibraryNotFound { kind, path, .. } => {
                assert_eq!(kind, LibraryKind::Gtk);
                assert_eq!(path, PathBuf::from("/nonexistent/gtkbind/libgtk-3.so.0"));
            }
            other => panic!("unexpected error {other}"),
        }
    }
}
