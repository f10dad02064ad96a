//! Runtime loader for the GTK 3 shared libraries.
//!
//! Nothing here links against GTK at build time. [`load_table`] opens GTK, GObject and GLib
//! with `libloading`, binds a fixed set of entry points into a [`NativeFunctionTable`] and
//! keeps it for the rest of the process.

mod config;
pub mod constants;
mod error;
mod platform;
mod signature;
mod table;

pub use config::LibraryConfig;
pub use constants::{constant, NamedConstant, CONSTANTS};
pub use error::LoadError;
pub use platform::{default_file_name, LibraryKind, Platform};
pub use signature::{NativeValue, SymbolSignature, ValueKind};
pub use table::{
    load, load_table, loaded_table, signature, LoadedLibrary, NativeFunctionTable, SIGNATURES,
};
