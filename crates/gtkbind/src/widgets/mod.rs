//! Typed wrappers, one per native widget class.
//!
//! Every constructor performs exactly one native "new" call. Shared behaviour is expressed
//! through the capability traits [`Container`], [`Clickable`] and [`TextBearing`].

mod button;
mod dialog;
mod entry;
mod grid;
mod label;
mod layout;
mod menu;
mod style;
mod window;

pub use button::Button;
pub use dialog::{Dialog, ResponseHandler};
pub use entry::Entry;
pub use grid::Grid;
pub use label::Label;
pub use layout::BoxWidget;
pub use menu::{Menu, MenuItem};
pub use style::StyleProvider;
pub use window::Window;

use crate::error::{Error, Result};
use crate::toolkit::{RawHandle, Toolkit};
use crate::trampoline::TrampolineId;
use crate::widget::Widget;

/// Box packing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packing {
    pub expand: bool,
    pub fill: bool,
    pub padding: u32,
}

impl Default for Packing {
    fn default() -> Self {
        Self {
            expand: true,
            fill: true,
            padding: 0,
        }
    }
}

/// Grid cell, in columns and rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    pub column: i32,
    pub row: i32,
    pub width: i32,
    pub height: i32,
}

impl GridCell {
    pub fn at(column: i32, row: i32) -> Self {
        Self {
            column,
            row,
            width: 1,
            height: 1,
        }
    }
}

/// Where a child goes inside its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    /// The container's own default: the only child slot, or a box packed with
    /// [`Packing::default`].
    #[default]
    Default,
    Packed(Packing),
    Cell(GridCell),
    /// Owned by the parent but not placed inside it: dialogs and context menus.
    Floating,
}

impl Placement {
    pub fn name(&self) -> &'static str {
        match self {
            Placement::Default => "default",
            Placement::Packed(_) => "packed",
            Placement::Cell(_) => "cell",
            Placement::Floating => "floating",
        }
    }
}

pub trait Container {
    fn attach_child(&self, child: &Widget, placement: &Placement) -> Result<()>;
    fn detach_child(&self, child: &Widget) -> Result<()>;
}

pub trait Clickable {
    fn on_click(&self, handler: impl Fn() + 'static) -> Result<TrampolineId>;
}

pub trait TextBearing {
    fn set_text(&self, text: &str) -> Result<()>;
    fn text(&self) -> Result<String>;
}

/// Runs a native add and returns any reference held from an earlier detach.
fn attach_native(
    container: &Widget,
    child: &Widget,
    add: impl FnOnce(&dyn Toolkit, RawHandle, RawHandle),
) -> Result<()> {
    let parent = container.raw()?;
    let raw = child.raw()?;
    let context = container.context();
    add(context.toolkit(), parent, raw);
    context.release_ref(child.id());
    Ok(())
}

/// Removes `child` from `container`, holding a reference so it survives the removal.
fn detach_native(container: &Widget, child: &Widget) -> Result<()> {
    let parent = container.raw()?;
    let raw = child.raw()?;
    let context = container.context();
    context.hold_ref(child.id())?;
    context.toolkit().container_remove(parent, raw);
    Ok(())
}

/// Attach for containers that hold one child. `owner` carries the slot bookkeeping, which
/// differs from `container` for a dialog and its content area.
fn attach_single(
    owner: &Widget,
    container: &Widget,
    child: &Widget,
    placement: &Placement,
) -> Result<()> {
    let kind = owner.kind().name();
    if *placement != Placement::Default {
        return Err(Error::PlacementMismatch {
            kind,
            placement: placement.name(),
        });
    }
    let context = owner.context();
    match context.child_slot(owner.id()) {
        Some(occupant) if occupant == child.id() => return Ok(()),
        Some(_) => return Err(Error::ChildSlotOccupied { kind }),
        None => {}
    }
    attach_native(container, child, |toolkit, parent, raw| toolkit.container_add(parent, raw))?;
    context.set_child_slot(owner.id(), Some(child.id()));
    Ok(())
}

fn detach_single(owner: &Widget, container: &Widget, child: &Widget) -> Result<()> {
    detach_native(container, child)?;
    let context = owner.context();
    if context.child_slot(owner.id()) == Some(child.id()) {
        context.set_child_slot(owner.id(), None);
    }
    Ok(())
}
