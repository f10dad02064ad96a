use std::ops::Deref;

use crate::arena::ResourceKind;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::widget::Widget;

use super::{attach_native, detach_native, Container, Placement};

/// Table layout; every child needs a [`Placement::Cell`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    widget: Widget,
}

impl Grid {
    pub fn new(context: &Context) -> Result<Self> {
        let raw = context.toolkit().grid_new();
        Ok(Self {
            widget: Widget::adopt(context, ResourceKind::Grid, raw)?,
        })
    }

    pub fn set_row_spacing(&self, spacing: u32) -> Result<()> {
        let raw = self.widget.raw()?;
        self.widget.context().toolkit().grid_set_row_spacing(raw, spacing);
        Ok(())
    }

    pub fn set_column_spacing(&self, spacing: u32) -> Result<()> {
        let raw = self.widget.raw()?;
        self.widget.context().toolkit().grid_set_column_spacing(raw, spacing);
        Ok(())
    }

    pub fn widget(&self) -> &Widget {
        &self.widget
    }
}

impl Deref for Grid {
    type Target = Widget;

    fn deref(&self) -> &Widget {
        &self.widget
    }
}

impl Container for Grid {
    fn attach_child(&self, child: &Widget, placement: &Placement) -> Result<()> {
        let cell = match placement {
            Placement::Cell(cell) => *cell,
            Placement::Default => return Err(Error::PlacementRequired { kind: "grid" }),
            other => {
                return Err(Error::PlacementMismatch {
                    kind: "grid",
                    placement: other.name(),
                });
            }
        };
        attach_native(&self.widget, child, |toolkit, grid, raw| {
            toolkit.grid_attach(grid, raw, cell.column, cell.row, cell.width, cell.height)
        })
    }

    fn detach_child(&self, child: &Widget) -> Result<()> {
        detach_native(&self.widget, child)
    }
}
