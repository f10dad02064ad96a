//! Managed GTK 3 widgets over a runtime-loaded native library.
//!
//! A [`Context`] owns every native resource created through it and the main loop. Resources
//! are reached through generation-checked [`ResourceId`]s, so a handle to a destroyed widget
//! fails with [`Error::StaleResource`] instead of touching freed memory. Signal handlers are
//! bound per `(resource, signal)`; connecting again replaces the earlier handler, and
//! destroying a resource disconnects its handlers before the native destroy.
//!
//! On top of the handles sit the [`Component`] tree and the JSON-driven [`Renderer`].
//! [`HeadlessToolkit`] stands in for GTK in tests.

mod app;
mod arena;
mod component;
mod context;
mod error;
mod render;
pub mod toolkit;
mod trampoline;
mod widget;
pub mod widgets;

pub use app::Application;
pub use arena::{ResourceId, ResourceKind};
pub use component::{
    ChangeHandler, ClickHandler, Component, ComponentKind, Mounted, WeakComponent,
};
pub use context::{Context, LoopState, WeakContext};
pub use error::{Error, Result};
pub use render::{
    AttachDef, BoxDef, ButtonDef, ContextMenuDef, DialogButtonDef, DialogDef, EntryDef, Event,
    EventHandler, GridDef, HandlerRegistry, LabelDef, MenuItemDef, OrientationDef, PackDef,
    Renderer, RendererOptions, UiNode, UnresolvedHandler, WidgetDef, WindowDef,
};
pub use toolkit::{HeadlessToolkit, Orientation};
pub use trampoline::{Propagation, SignalArgs, Signature, TrampolineId};
pub use widget::{WeakWidget, Widget, UNCONSTRAINED};

pub use gtkbind_sys as sys;
