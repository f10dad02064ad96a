use std::rc::Rc;

use tracing::debug;

use crate::context::Context;
use crate::error::Result;
use crate::widget::Widget;
use crate::widgets::{
    BoxWidget, Button, Clickable, Container, Dialog, Entry, Grid, Label, Menu, MenuItem,
    TextBearing, Window,
};

use super::props::{ChangeHandler, ClickHandler, Common, Props};

/// The typed wrapper behind a mounted component.
#[derive(Debug, Clone, PartialEq)]
pub enum Mounted {
    Window(Window),
    Box(BoxWidget),
    Grid(Grid),
    Button(Button),
    Label(Label),
    Entry(Entry),
    Dialog(Dialog),
    ContextMenu(Menu),
}

impl Mounted {
    pub fn widget(&self) -> &Widget {
        match self {
            Mounted::Window(window) => window.widget(),
            Mounted::Box(boxed) => boxed.widget(),
            Mounted::Grid(grid) => grid.widget(),
            Mounted::Button(button) => button.widget(),
            Mounted::Label(label) => label.widget(),
            Mounted::Entry(entry) => entry.widget(),
            Mounted::Dialog(dialog) => dialog.widget(),
            Mounted::ContextMenu(menu) => menu.widget(),
        }
    }

    /// The container face of the wrapper; `None` for leaves and menus.
    pub fn container(&self) -> Option<&dyn Container> {
        match self {
            Mounted::Window(window) => Some(window),
            Mounted::Box(boxed) => Some(boxed),
            Mounted::Grid(grid) => Some(grid),
            Mounted::Dialog(dialog) => Some(dialog),
            Mounted::Button(_)
            | Mounted::Label(_)
            | Mounted::Entry(_)
            | Mounted::ContextMenu(_) => None,
        }
    }
}

/// Creates the native widget for `props`, then applies kind-specific state and handlers.
pub(crate) fn realize(context: &Context, props: &Props, common: &Common) -> Result<Mounted> {
    let mounted = match props {
        Props::Window {
            title,
            width,
            height,
            quit_on_destroy,
        } => {
            let window = Window::new(context, title, *width, *height)?;
            if *quit_on_destroy {
                window.quit_on_destroy()?;
            }
            Mounted::Window(window)
        }
        Props::Box { orientation, spacing } => {
            Mounted::Box(BoxWidget::new(context, *orientation, *spacing)?)
        }
        Props::Grid {
            row_spacing,
            column_spacing,
        } => {
            let grid = Grid::new(context)?;
            if *row_spacing > 0 {
                grid.set_row_spacing(*row_spacing)?;
            }
            if *column_spacing > 0 {
                grid.set_column_spacing(*column_spacing)?;
            }
            Mounted::Grid(grid)
        }
        Props::Button { label, on_click } => {
            let button = Button::new(context, label)?;
            if let Some(handler) = on_click {
                bind_click(&button, handler)?;
            }
            Mounted::Button(button)
        }
        Props::Label { text } => Mounted::Label(Label::new(context, text)?),
        Props::Entry {
            text,
            placeholder,
            on_change,
        } => {
            let entry = Entry::new(context)?;
            if let Some(placeholder) = placeholder {
                entry.set_placeholder(placeholder)?;
            }
            if !text.is_empty() {
                entry.set_text(text)?;
            }
            if let Some(handler) = on_change {
                bind_change(&entry, handler)?;
            }
            Mounted::Entry(entry)
        }
        Props::Dialog {
            title,
            size,
            buttons,
            on_response,
        } => {
            let dialog = Dialog::new(context, title)?;
            if let Some((width, height)) = size {
                dialog.set_default_size(*width, *height)?;
            }
            dialog.set_response_handler(on_response.clone());
            for button in buttons {
                let callback = button.callback.clone();
                dialog.add_response_button(&button.label, button.response, callback)?;
            }
            Mounted::Dialog(dialog)
        }
        Props::ContextMenu { items } => {
            let menu = Menu::new(context)?;
            for item in items {
                append_item(context, &menu, &item.label, item.callback.as_ref())?;
            }
            Mounted::ContextMenu(menu)
        }
    };
    apply_common(mounted.widget(), common)?;
    debug!(resource = %mounted.widget().id(), kind = props.kind().name(), "mounted component");
    Ok(mounted)
}

fn apply_common(widget: &Widget, common: &Common) -> Result<()> {
    if let Some(name) = &common.name {
        widget.set_name(name)?;
    }
    for class in &common.classes {
        widget.add_class(class)?;
    }
    if let Some((width, height)) = common.size {
        widget.set_size(width, height)?;
    }
    Ok(())
}

pub(crate) fn bind_click(button: &Button, handler: &ClickHandler) -> Result<()> {
    let handler = Rc::clone(handler);
    button.on_click(move || handler())?;
    Ok(())
}

pub(crate) fn bind_change(entry: &Entry, handler: &ChangeHandler) -> Result<()> {
    let handler = Rc::clone(handler);
    entry.on_changed(move |text| handler(text))?;
    Ok(())
}

pub(crate) fn append_item(
    context: &Context,
    menu: &Menu,
    label: &str,
    callback: Option<&ClickHandler>,
) -> Result<MenuItem> {
    let item = MenuItem::new(context, label)?;
    menu.append(&item)?;
    if let Some(callback) = callback {
        let callback = Rc::clone(callback);
        item.on_click(move || callback())?;
    }
    Ok(item)
}
