use std::path::PathBuf;

use serde::Deserialize;

use crate::error::LoadError;
use crate::platform::LibraryKind;

/// Where to find the native libraries. Unset entries fall back to the platform default file
/// name, which the dynamic linker resolves through its usual search path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LibraryConfig {
    pub gtk: Option<PathBuf>,
    pub gobject: Option<PathBuf>,
    pub glib: Option<PathBuf>,
}

impl LibraryConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var_os(key).map(PathBuf::from))
    }

    pub fn from_lookup<F>(mut lookup: F) -> Self
    where
        F: FnMut(&str) -> Option<PathBuf>,
    {
        let mut read = |kind: LibraryKind| {
            lookup(kind.env_var()).filter(|path| !path.as_os_str().is_empty())
        };
        Self {
            gtk: read(LibraryKind::Gtk),
            gobject: read(LibraryKind::GObject),
            glib: read(LibraryKind::GLib),
        }
    }

    pub fn with_path(mut self, kind: LibraryKind, path: impl Into<PathBuf>) -> Self {
        *self.slot_mut(kind) = Some(path.into());
        self
    }

    pub fn path_for(&self, kind: LibraryKind) -> Result<PathBuf, LoadError> {
        if let Some(path) = self.slot(kind) {
            return Ok(path.clone());
        }
        kind.default_file_name()
            .map(PathBuf::from)
            .ok_or(LoadError::UnsupportedPlatform { kind })
    }

    fn slot(&self, kind: LibraryKind) -> Option<&PathBuf> {
        match kind {
            LibraryKind::Gtk => self.gtk.as_ref(),
            LibraryKind::GObject => self.gobject.as_ref(),
            LibraryKind::GLib => self.glib.as_ref(),
        }
    }

    fn slot_mut(&mut self, kind: LibraryKind) -> &mut Option<PathBuf> {
        match kind {
            LibraryKind::Gtk => &mut self.gtk,
            LibraryKind::GObject => &mut self.gobject,
            LibraryKind::GLib => &mut self.glib,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn lookup_overrides_only_named_libraries() {
        let env: HashMap<&str, PathBuf> =
            HashMap::from([("GTKBIND_GTK_LIBRARY", PathBuf::from("/opt/gtk/libgtk-3.so"))]);
        let config = LibraryConfig::from_lookup(|key| env.get(key).cloned());
        assert_eq!(config.gtk, Some(PathBuf::from("/opt/gtk/libgtk-3.so")));
        assert_eq!(config.gobject, None);
        assert_eq!(config.glib, None);
    }

    #[test]
    fn empty_override_is_ignored() {
        let config = LibraryConfig::from_lookup(|_| Some(PathBuf::new()));
        assert_eq!(config, LibraryConfig::default());
    }

    #[test]
    fn explicit_path_wins_over_default() {
        let config = LibraryConfig::default().with_path(LibraryKind::GLib, "/tmp/libglib.so");
        assert_eq!(
            config.path_for(LibraryKind::GLib).expect("path"),
            PathBuf::from("/tmp/libglib.so")
        );
    }

    #[test]
    fn deserializes_from_json() {
        let config: LibraryConfig =
            serde_json::from_str(r#"{ "gobject": "/usr/lib/libgobject-2.0.so.0" }"#)
                .expect("config json");
        assert_eq!(
            config.gobject,
            Some(PathBuf::from("/usr/lib/libgobject-2.0.so.0"))
        );
        assert!(config.gtk.is_none());
    }
}
