use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use crate::arena::ResourceKind;
use crate::context::Context;
use crate::error::Result;
use crate::trampoline::c_text;
use crate::widget::Widget;

use super::{attach_single, detach_single, Button, Clickable, Container, Placement, Window};

pub type ResponseHandler = Rc<dyn Fn(i32)>;

/// Modal-style dialog with a content area and a row of response buttons.
#[derive(Clone)]
pub struct Dialog {
    widget: Widget,
    content: Widget,
    on_response: Rc<RefCell<Option<ResponseHandler>>>,
}

impl Dialog {
    pub fn new(context: &Context, title: &str) -> Result<Self> {
        let title = c_text(title, "dialog title")?;
        let raw = context.toolkit().dialog_new();
        let widget = Widget::adopt(context, ResourceKind::Dialog, raw)?;
        let handle = widget.raw()?;
        context.toolkit().window_set_title(handle, &title);
        let area = context.toolkit().dialog_content_area(handle);
        let content = Widget::adopt(context, ResourceKind::ContentArea, area)?;
        Ok(Self {
            widget,
            content,
            on_response: Rc::new(RefCell::new(None)),
        })
    }

    pub fn set_title(&self, title: &str) -> Result<()> {
        let title = c_text(title, "dialog title")?;
        let raw = self.widget.raw()?;
        self.widget.context().toolkit().window_set_title(raw, &title);
        Ok(())
    }

    pub fn set_default_size(&self, width: i32, height: i32) -> Result<()> {
        let raw = self.widget.raw()?;
        self.widget
            .context()
            .toolkit()
            .window_set_default_size(raw, width, height);
        Ok(())
    }

    pub fn set_transient_for(&self, window: &Window) -> Result<()> {
        let raw = self.widget.raw()?;
        let parent = window.raw()?;
        self.widget
            .context()
            .toolkit()
            .window_set_transient_for(raw, parent);
        Ok(())
    }

    /// Adds a plain action button. Clicking it does nothing until a handler is bound.
    pub fn add_button(&self, label: &str, response: i32) -> Result<Button> {
        let label = c_text(label, "dialog button label")?;
        let raw = self.widget.raw()?;
        let context = self.widget.context();
        let button = context.toolkit().dialog_add_button(raw, &label, response);
        Button::adopt(context, button)
    }

    /// Adds a button that runs `callback`, then the dialog-wide response handler, then
    /// destroys the dialog.
    pub fn add_response_button(
        &self,
        label: &str,
        response: i32,
        callback: Option<ResponseHandler>,
    ) -> Result<Button> {
        let button = self.add_button(label, response)?;
        let dialog = self.widget.downgrade();
        let on_response = Rc::clone(&self.on_response);
        button.on_click(move || {
            if let Some(callback) = &callback {
                callback(response);
            }
            let handler = on_response.borrow().clone();
            if let Some(handler) = handler {
                handler(response);
            }
            if let Some(dialog) = dialog.upgrade() {
                dialog.destroy();
            }
        })?;
        Ok(button)
    }

    pub fn set_response_handler(&self, handler: Option<ResponseHandler>) {
        *self.on_response.borrow_mut() = handler;
    }

    pub fn set_content(&self, child: &Widget) -> Result<()> {
        self.attach_child(child, &Placement::Default)
    }

    pub fn content_area(&self) -> &Widget {
        &self.content
    }

    pub fn present(&self) {
        self.widget.show();
    }

    pub fn widget(&self) -> &Widget {
        &self.widget
    }
}

impl Deref for Dialog {
    type Target = Widget;

    fn deref(&self) -> &Widget {
        &self.widget
    }
}

impl PartialEq for Dialog {
    fn eq(&self, other: &Self) -> bool {
        self.widget == other.widget
    }
}

impl fmt::Debug for Dialog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dialog")
            .field("widget", &self.widget)
            .field("content", &self.content)
            .finish_non_exhaustive()
    }
}

impl Container for Dialog {
    fn attach_child(&self, child: &Widget, placement: &Placement) -> Result<()> {
        attach_single(&self.widget, &self.content, child, placement)
    }

    fn detach_child(&self, child: &Widget) -> Result<()> {
        detach_single(&self.widget, &self.content, child)
    }
}
