use gtkbind_sys::LoadError;

use crate::arena::{ResourceId, ResourceKind};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("native constructor for {kind} returned null")]
    NativeAllocation { kind: ResourceKind },
    #[error("application has no root window; call create_window before run")]
    NoRootWindow,
    #[error("no handler registered under `{name}`")]
    HandlerNotFound { name: String },
    #[error("resource {id} was already destroyed")]
    StaleResource { id: ResourceId },
    #[error("{what} contains an interior NUL byte")]
    InvalidText { what: &'static str },
    #[error("signal `{signal}` is not known to the native toolkit")]
    UnknownSignal { signal: String },
    #[error("{kind} holds a single child and already has one")]
    ChildSlotOccupied { kind: &'static str },
    #[error("children of a {kind} need an explicit placement")]
    PlacementRequired { kind: &'static str },
    #[error("{kind} cannot hold children")]
    NotAContainer { kind: &'static str },
    #[error("{placement} placement is not valid inside a {kind}")]
    PlacementMismatch {
        kind: &'static str,
        placement: &'static str,
    },
    #[error("`{operation}` does not apply to a {kind}")]
    Unsupported {
        operation: &'static str,
        kind: &'static str,
    },
    #[error("component already has a parent")]
    AlreadyParented,
    #[error("appending the component would make it its own ancestor")]
    CyclicTree,
    #[error("component was destroyed")]
    Destroyed,
    #[error("main loop is already running")]
    LoopAlreadyRunning,
    #[error("native toolkit was initialized on another thread")]
    WrongThread,
    #[error("invalid UI definition: {0}")]
    Definition(#[from] serde_json::Error),
}
