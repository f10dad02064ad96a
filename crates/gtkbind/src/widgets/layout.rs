use std::ops::Deref;

use crate::arena::ResourceKind;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::toolkit::Orientation;
use crate::widget::Widget;

use super::{attach_native, detach_native, Container, Packing, Placement};

/// Linear box. Children are packed from the start in the order they are attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxWidget {
    widget: Widget,
    orientation: Orientation,
}

impl BoxWidget {
    pub fn new(context: &Context, orientation: Orientation, spacing: i32) -> Result<Self> {
        let raw = context.toolkit().box_new(orientation, spacing);
        Ok(Self {
            widget: Widget::adopt(context, ResourceKind::Box, raw)?,
            orientation,
        })
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn pack(&self, child: &Widget, packing: Packing) -> Result<()> {
        attach_native(&self.widget, child, |toolkit, container, raw| {
            toolkit.box_pack_start(container, raw, packing.expand, packing.fill, packing.padding)
        })
    }

    pub fn widget(&self) -> &Widget {
        &self.widget
    }
}

impl Deref for BoxWidget {
    type Target = Widget;

    fn deref(&self) -> &Widget {
        &self.widget
    }
}

impl Container for BoxWidget {
    fn attach_child(&self, child: &Widget, placement: &Placement) -> Result<()> {
        match placement {
            Placement::Default => self.pack(child, Packing::default()),
            Placement::Packed(packing) => self.pack(child, *packing),
            other => Err(Error::PlacementMismatch {
                kind: "box",
                placement: other.name(),
            }),
        }
    }

    fn detach_child(&self, child: &Widget) -> Result<()> {
        detach_native(&self.widget, child)
    }
}
