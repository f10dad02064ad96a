use std::ops::Deref;

use crate::arena::ResourceKind;
use crate::context::Context;
use crate::error::Result;
use crate::trampoline::{c_text, TrampolineId};
use crate::widget::Widget;

use super::TextBearing;

/// Single-line text input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    widget: Widget,
}

impl Entry {
    pub fn new(context: &Context) -> Result<Self> {
        let raw = context.toolkit().entry_new();
        Ok(Self {
            widget: Widget::adopt(context, ResourceKind::Entry, raw)?,
        })
    }

    pub fn set_placeholder(&self, text: &str) -> Result<()> {
        let text = c_text(text, "entry placeholder")?;
        let raw = self.widget.raw()?;
        self.widget.context().toolkit().entry_set_placeholder(raw, &text);
        Ok(())
    }

    /// Calls `handler` with the current text after every change.
    pub fn on_changed(&self, handler: impl Fn(&str) + 'static) -> Result<TrampolineId> {
        let entry = self.widget.downgrade();
        self.widget.connect_notify("changed", move || {
            let Some(entry) = entry.upgrade() else { return };
            let Ok(raw) = entry.raw() else { return };
            let text = entry.context().toolkit().entry_text(raw);
            handler(&text);
        })
    }

    pub fn widget(&self) -> &Widget {
        &self.widget
    }
}

impl Deref for Entry {
    type Target = Widget;

    fn deref(&self) -> &Widget {
        &self.widget
    }
}

impl TextBearing for Entry {
    fn set_text(&self, text: &str) -> Result<()> {
        let text = c_text(text, "entry text")?;
        let raw = self.widget.raw()?;
        self.widget.context().toolkit().entry_set_text(raw, &text);
        Ok(())
    }

    fn text(&self) -> Result<String> {
        let raw = self.widget.raw()?;
        Ok(self.widget.context().toolkit().entry_text(raw))
    }
}
