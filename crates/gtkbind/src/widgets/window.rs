use std::ops::Deref;

use crate::arena::ResourceKind;
use crate::context::Context;
use crate::error::Result;
use crate::trampoline::{c_text, TrampolineId};
use crate::widget::Widget;

use super::{attach_single, detach_single, Container, Placement};

/// Top-level window. Holds at most one child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    widget: Widget,
}

impl Window {
    pub fn new(context: &Context, title: &str, width: i32, height: i32) -> Result<Self> {
        let title = c_text(title, "window title")?;
        let raw = context.toolkit().window_new();
        let widget = Widget::adopt(context, ResourceKind::Window, raw)?;
        let handle = widget.raw()?;
        context.toolkit().window_set_title(handle, &title);
        context.toolkit().window_set_default_size(handle, width, height);
        Ok(Self { widget })
    }

    pub fn set_title(&self, title: &str) -> Result<()> {
        let title = c_text(title, "window title")?;
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

    /// Quits the context's main loop when the window is destroyed, including by the user
    /// closing it.
    pub fn quit_on_destroy(&self) -> Result<TrampolineId> {
        let context = self.widget.context().downgrade();
        self.widget.connect_notify("destroy", move || {
            if let Some(context) = context.upgrade() {
                context.quit();
            }
        })
    }

    pub fn widget(&self) -> &Widget {
        &self.widget
    }
}

impl Deref for Window {
    type Target = Widget;

    fn deref(&self) -> &Widget {
        &self.widget
    }
}

impl Container for Window {
    fn attach_child(&self, child: &Widget, placement: &Placement) -> Result<()> {
        attach_single(&self.widget, &self.widget, child, placement)
    }

    fn detach_child(&self, child: &Widget) -> Result<()> {
        detach_single(&self.widget, &self.widget, child)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::error::Error;
    use crate::toolkit::{HeadlessToolkit, LoopExit};
    use crate::widgets::{Label, TextBearing};

    #[test]
    fn second_child_is_rejected() {
        let toolkit = Rc::new(HeadlessToolkit::new());
        let context = Context::headless(toolkit.clone());
        let window = Window::new(&context, "Main", 320, 200).expect("window");
        let first = Label::new(&context, "one").expect("label");
        let second = Label::new(&context, "two").expect("label");
        window.attach_child(&first, &Placement::Default).expect("first child");
        let err = window
            .attach_child(&second, &Placement::Default)
            .expect_err("second child");
        assert!(matches!(err, Error::ChildSlotOccupied { kind: "window" }));
        assert_eq!(first.text().expect("text"), "one");
    }

    #[test]
    fn slot_frees_up_after_detach() {
        let toolkit = Rc::new(HeadlessToolkit::new());
        let context = Context::headless(toolkit.clone());
        let window = Window::new(&context, "Main", 320, 200).expect("window");
        let first = Label::new(&context, "one").expect("label");
        let second = Label::new(&context, "two").expect("label");
        window.attach_child(&first, &Placement::Default).expect("attach");
        window.detach_child(&first).expect("detach");
        window.attach_child(&second, &Placement::Default).expect("attach replacement");
        assert!(toolkit.criticals().is_empty());
    }

    #[test]
    fn closing_the_window_quits_the_loop() {
        let toolkit = Rc::new(HeadlessToolkit::new());
        let context = Context::headless(toolkit.clone());
        let window = Window::new(&context, "Main", 320, 200).expect("window");
        window.quit_on_destroy().expect("connect");
        let raw = window.raw().expect("raw");
        toolkit.queue(move |toolkit| toolkit.close_window(raw));
        context.run().expect("run");
        assert_eq!(toolkit.last_loop_exit(), Some(LoopExit::Quit));
        assert!(!window.is_live());
    }
}
