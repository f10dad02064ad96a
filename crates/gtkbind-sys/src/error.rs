use std::path::PathBuf;

use crate::platform::LibraryKind;

/// Failure to bring up the native function table. Every variant is fatal: the rest of the
/// binding layer assumes the complete table exists.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("{kind} library not found at {}: {source}", path.display())]
    LibraryNotFound {
        kind: LibraryKind,
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },
    #[error("{kind} library is missing required symbol `{symbol}`: {source}")]
    SymbolMissing {
        kind: LibraryKind,
        symbol: String,
        #[source]
        source: libloading::Error,
    },
    #[error("no default {kind} library name for this platform; set {}", kind.env_var())]
    UnsupportedPlatform { kind: LibraryKind },
}
