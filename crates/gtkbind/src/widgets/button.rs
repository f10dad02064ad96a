use std::ops::Deref;

use crate::arena::ResourceKind;
use crate::context::Context;
use crate::error::Result;
use crate::toolkit::RawHandle;
use crate::trampoline::{c_text, TrampolineId};
use crate::widget::Widget;

use super::Clickable;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    widget: Widget,
}

impl Button {
    pub fn new(context: &Context, label: &str) -> Result<Self> {
        let label = c_text(label, "button label")?;
        let raw = context.toolkit().button_new(&label);
        Self::adopt(context, raw)
    }

    /// Wraps a button the toolkit created on our behalf, such as a dialog action.
    pub(crate) fn adopt(context: &Context, raw: Option<RawHandle>) -> Result<Self> {
        Ok(Self {
            widget: Widget::adopt(context, ResourceKind::Button, raw)?,
        })
    }

    pub fn set_label(&self, label: &str) -> Result<()> {
        let label = c_text(label, "button label")?;
        let raw = self.widget.raw()?;
        self.widget.context().toolkit().button_set_label(raw, &label);
        Ok(())
    }

    pub fn widget(&self) -> &Widget {
        &self.widget
    }
}

impl Deref for Button {
    type Target = Widget;

    fn deref(&self) -> &Widget {
        &self.widget
    }
}

impl Clickable for Button {
    fn on_click(&self, handler: impl Fn() + 'static) -> Result<TrampolineId> {
        self.widget.connect_notify("clicked", handler)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::toolkit::HeadlessToolkit;

    #[test]
    fn click_handler_is_replaced_not_stacked() {
        let toolkit = Rc::new(HeadlessToolkit::new());
        let context = Context::headless(toolkit.clone());
        let button = Button::new(&context, "Save").expect("button");
        let clicks = Rc::new(Cell::new(0));
        for step in [1, 10] {
            let clicks = Rc::clone(&clicks);
            button
                .on_click(move || clicks.set(clicks.get() + step))
                .expect("on_click");
        }
        let raw = toolkit.find_by_text("Save").expect("native button");
        toolkit.emit(raw, "clicked");
        assert_eq!(clicks.get(), 10);
        assert_eq!(toolkit.handler_count(raw, "clicked"), 1);
    }

    #[test]
    fn relabel_updates_native_text() {
        let toolkit = Rc::new(HeadlessToolkit::new());
        let context = Context::headless(toolkit.clone());
        let button = Button::new(&context, "Save").expect("button");
        button.set_label("Save as").expect("label");
        assert!(toolkit.find_by_text("Save as").is_some());
    }
}
