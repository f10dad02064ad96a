use std::ops::Deref;

use crate::arena::ResourceKind;
use crate::context::Context;
use crate::error::Result;
use crate::trampoline::{c_text, TrampolineId};
use crate::widget::Widget;

use super::Clickable;

/// Popup menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    widget: Widget,
}

impl Menu {
    pub fn new(context: &Context) -> Result<Self> {
        let raw = context.toolkit().menu_new();
        Ok(Self {
            widget: Widget::adopt(context, ResourceKind::Menu, raw)?,
        })
    }

    pub(crate) fn from_widget(widget: Widget) -> Self {
        Self { widget }
    }

    pub fn append(&self, item: &MenuItem) -> Result<()> {
        let menu = self.widget.raw()?;
        let raw = item.raw()?;
        self.widget.context().toolkit().menu_shell_append(menu, raw);
        Ok(())
    }

    pub fn attach_to(&self, widget: &Widget) -> Result<()> {
        let menu = self.widget.raw()?;
        let target = widget.raw()?;
        self.widget.context().toolkit().menu_attach_to_widget(menu, target);
        Ok(())
    }

    /// Shows the menu at the pointer, attaching it to `trigger` first when given.
    pub fn popup(&self, trigger: Option<&Widget>) -> Result<()> {
        if let Some(trigger) = trigger {
            self.attach_to(trigger)?;
        }
        let menu = self.widget.raw()?;
        let toolkit = self.widget.context().toolkit();
        toolkit.widget_show_all(menu);
        toolkit.menu_popup_at_pointer(menu);
        Ok(())
    }

    pub fn widget(&self) -> &Widget {
        &self.widget
    }
}

impl Deref for Menu {
    type Target = Widget;

    fn deref(&self) -> &Widget {
        &self.widget
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    widget: Widget,
}

impl MenuItem {
    pub fn new(context: &Context, label: &str) -> Result<Self> {
        let label = c_text(label, "menu item label")?;
        let raw = context.toolkit().menu_item_new(&label);
        Ok(Self {
            widget: Widget::adopt(context, ResourceKind::MenuItem, raw)?,
        })
    }

    pub fn widget(&self) -> &Widget {
        &self.widget
    }
}

impl Deref for MenuItem {
    type Target = Widget;

    fn deref(&self) -> &Widget {
        &self.widget
    }
}

impl Clickable for MenuItem {
    fn on_click(&self, handler: impl Fn() + 'static) -> Result<TrampolineId> {
        self.widget.connect_notify("activate", handler)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::toolkit::{HeadlessToolkit, NativeCall};
    use crate::widgets::Button;

    #[test]
    fn popup_attaches_to_trigger_first() {
        let toolkit = Rc::new(HeadlessToolkit::new());
        let context = Context::headless(toolkit.clone());
        let menu = Menu::new(&context).expect("menu");
        let anchor = Button::new(&context, "More").expect("button");
        toolkit.clear_calls();
        menu.popup(Some(&anchor)).expect("popup");
        let menu_raw = menu.raw().expect("menu");
        let anchor_raw = anchor.raw().expect("anchor");
        assert_eq!(
            toolkit.calls(),
            vec![
                NativeCall::MenuAttach { menu: menu_raw, widget: anchor_raw },
                NativeCall::ShowAll(menu_raw),
                NativeCall::MenuPopup(menu_raw),
            ]
        );
    }

    #[test]
    fn items_activate_their_handler() {
        let toolkit = Rc::new(HeadlessToolkit::new());
        let context = Context::headless(toolkit.clone());
        let menu = Menu::new(&context).expect("menu");
        let item = MenuItem::new(&context, "Copy").expect("item");
        menu.append(&item).expect("append");
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        item.on_click(move || counter.set(counter.get() + 1)).expect("on_click");
        toolkit.emit(item.raw().expect("item"), "activate");
        assert_eq!(hits.get(), 1);
        menu.destroy();
        assert!(!item.is_live());
    }
}
