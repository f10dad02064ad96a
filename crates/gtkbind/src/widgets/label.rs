use std::ops::Deref;

use crate::arena::ResourceKind;
use crate::context::Context;
use crate::error::Result;
use crate::trampoline::c_text;
use crate::widget::Widget;

use super::TextBearing;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    widget: Widget,
}

impl Label {
    pub fn new(context: &Context, text: &str) -> Result<Self> {
        let text = c_text(text, "label text")?;
        let raw = context.toolkit().label_new(&text);
        Ok(Self {
            widget: Widget::adopt(context, ResourceKind::Label, raw)?,
        })
    }

    pub fn widget(&self) -> &Widget {
        &self.widget
    }
}

impl Deref for Label {
    type Target = Widget;

    fn deref(&self) -> &Widget {
        &self.widget
    }
}

impl TextBearing for Label {
    fn set_text(&self, text: &str) -> Result<()> {
        let text = c_text(text, "label text")?;
        let raw = self.widget.raw()?;
        self.widget.context().toolkit().label_set_text(raw, &text);
        Ok(())
    }

    fn text(&self) -> Result<String> {
        let raw = self.widget.raw()?;
        Ok(self.widget.context().toolkit().label_text(raw))
    }
}
