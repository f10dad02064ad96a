use std::fmt;

use serde::Deserialize;

/// The three shared libraries the binding layer opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryKind {
    Gtk,
    GObject,
    GLib,
}

impl LibraryKind {
    pub const ALL: [LibraryKind; 3] = [LibraryKind::Gtk, LibraryKind::GObject, LibraryKind::GLib];

    /// Name of the environment variable that overrides the default file name.
    pub fn env_var(self) -> &'static str {
        match self {
            LibraryKind::Gtk => "GTKBIND_GTK_LIBRARY",
            LibraryKind::GObject => "GTKBIND_GOBJECT_LIBRARY",
            LibraryKind::GLib => "GTKBIND_GLIB_LIBRARY",
        }
    }

    pub fn default_file_name(self) -> Option<&'static str> {
        default_file_name(Platform::current()?, self)
    }
}

impl fmt::Display for LibraryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LibraryKind::Gtk => "gtk",
            LibraryKind::GObject => "gobject",
            LibraryKind::GLib => "glib",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
}

impl Platform {
    pub fn current() -> Option<Platform> {
        if cfg!(target_os = "windows") {
            Some(Platform::Windows)
        } else if cfg!(target_os = "macos") {
            Some(Platform::MacOs)
        } else if cfg!(unix) {
            Some(Platform::Linux)
        } else {
            None
        }
    }
}

pub fn default_file_name(platform: Platform, kind: LibraryKind) -> Option<&'static str> {
    let name = match (platform, kind) {
        (Platform::Linux, LibraryKind::Gtk) => "libgtk-3.so.0",
        (Platform::Linux, LibraryKind::GObject) => "libgobject-2.0.so.0",
        (Platform::Linux, LibraryKind::GLib) => "libglib-2.0.so.0",
        (Platform::MacOs, LibraryKind::Gtk) => "libgtk-3.0.dylib",
        (Platform::MacOs, LibraryKind::GObject) => "libgobject-2.0.0.dylib",
        (Platform::MacOs, LibraryKind::GLib) => "libglib-2.0.0.dylib",
        (Platform::Windows, LibraryKind::Gtk) => "libgtk-3-0.dll",
        (Platform::Windows, LibraryKind::GObject) => "libgobject-2.0-0.dll",
        (Platform::Windows, LibraryKind::GLib) => "libglib-2.0-0.dll",
    };
    Some(name)
}
