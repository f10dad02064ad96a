//! Managed composition tree.
//!
//! A [`Component`] describes a widget before it exists. [`Component::mount`] realizes it and
//! its children in order, and children appended afterwards are mounted and attached on the
//! spot, so both orders end in the same native tree. Every component moves through
//! `Unmounted -> Mounted -> Destroyed`; the last state is terminal.

mod mounted;
mod props;

use std::cell::RefCell;
use std::fmt;
use std::mem;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use crate::context::Context;
use crate::error::{Error, Result};
use crate::toolkit::Orientation;
use crate::trampoline::{Propagation, Signature};
use crate::widget::Widget;
use crate::widgets::{GridCell, Menu, Packing, Placement, ResponseHandler, TextBearing, Window};

pub use mounted::Mounted;
pub use props::{ChangeHandler, ClickHandler, ComponentKind};

use props::{Common, DialogButton, MenuEntry, Props};

/// Mouse button that opens context menus.
const SECONDARY_BUTTON: u32 = 3;

const TRIGGER_SIGNAL: &str = "button-press-event";

enum State {
    Unmounted,
    Mounted(Mounted),
    Destroyed,
}

struct Node {
    context: Context,
    id: Option<String>,
    props: Props,
    common: Common,
    placement: Placement,
    state: State,
    children: Vec<Component>,
    parent: Weak<RefCell<Node>>,
}

/// A node of the widget tree. Clones share the node.
#[derive(Clone)]
pub struct Component {
    node: Rc<RefCell<Node>>,
}

#[derive(Clone)]
pub struct WeakComponent {
    node: Weak<RefCell<Node>>,
}

impl WeakComponent {
    pub fn upgrade(&self) -> Option<Component> {
        self.node.upgrade().map(|node| Component { node })
    }
}

impl Component {
    fn from_props(context: &Context, props: Props) -> Self {
        Self {
            node: Rc::new(RefCell::new(Node {
                context: context.clone(),
                id: None,
                props,
                common: Common::default(),
                placement: Placement::Default,
                state: State::Unmounted,
                children: Vec::new(),
                parent: Weak::new(),
            })),
        }
    }

    /// A top-level window. It quits the main loop when destroyed unless
    /// [`set_quit_on_destroy`](Self::set_quit_on_destroy) turns that off.
    pub fn window(context: &Context, title: &str, width: i32, height: i32) -> Self {
        Self::from_props(
            context,
            Props::Window {
                title: title.to_owned(),
                width,
                height,
                quit_on_destroy: true,
            },
        )
    }

    pub fn vbox(context: &Context) -> Self {
        Self::boxed(context, Orientation::Vertical, 0)
    }

    pub fn hbox(context: &Context) -> Self {
        Self::boxed(context, Orientation::Horizontal, 0)
    }

    pub fn boxed(context: &Context, orientation: Orientation, spacing: i32) -> Self {
        Self::from_props(context, Props::Box { orientation, spacing })
    }

    pub fn grid(context: &Context) -> Self {
        Self::from_props(
            context,
            Props::Grid {
                row_spacing: 0,
                column_spacing: 0,
            },
        )
    }

    pub fn button(context: &Context, label: &str) -> Self {
        Self::from_props(
            context,
            Props::Button {
                label: label.to_owned(),
                on_click: None,
            },
        )
    }

    pub fn label(context: &Context, text: &str) -> Self {
        Self::from_props(context, Props::Label { text: text.to_owned() })
    }

    pub fn entry(context: &Context) -> Self {
        Self::from_props(
            context,
            Props::Entry {
                text: String::new(),
                placeholder: None,
                on_change: None,
            },
        )
    }

    pub fn dialog(context: &Context, title: &str) -> Self {
        Self::from_props(
            context,
            Props::Dialog {
                title: title.to_owned(),
                size: None,
                buttons: Vec::new(),
                on_response: None,
            },
        )
    }

    pub fn context_menu(context: &Context) -> Self {
        Self::from_props(context, Props::ContextMenu { items: Vec::new() })
    }

    pub fn with_id(self, id: impl Into<String>) -> Self {
        self.node.borrow_mut().id = Some(id.into());
        self
    }

    pub fn id(&self) -> Option<String> {
        self.node.borrow().id.clone()
    }

    pub fn kind(&self) -> ComponentKind {
        self.node.borrow().props.kind()
    }

    pub fn context(&self) -> Context {
        self.node.borrow().context.clone()
    }

    pub fn downgrade(&self) -> WeakComponent {
        WeakComponent {
            node: Rc::downgrade(&self.node),
        }
    }

    pub fn parent(&self) -> Option<Component> {
        self.node.borrow().parent.upgrade().map(|node| Component { node })
    }

    pub fn children(&self) -> Vec<Component> {
        self.node.borrow().children.clone()
    }

    pub fn placement(&self) -> Placement {
        self.node.borrow().placement
    }

    /// This component and all of its descendants.
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(Component::node_count).sum::<usize>()
    }

    /// First component in this subtree carrying `id`, searched depth first.
    pub fn find(&self, id: &str) -> Option<Component> {
        if self.node.borrow().id.as_deref() == Some(id) {
            return Some(self.clone());
        }
        self.children().iter().find_map(|child| child.find(id))
    }

    /// Mounted with a native widget that is still alive.
    pub fn is_mounted(&self) -> bool {
        self.widget().is_some_and(|widget| widget.is_live())
    }

    pub fn is_destroyed(&self) -> bool {
        matches!(self.node.borrow().state, State::Destroyed)
    }

    pub fn mounted(&self) -> Option<Mounted> {
        match &self.node.borrow().state {
            State::Mounted(mounted) => Some(mounted.clone()),
            State::Unmounted | State::Destroyed => None,
        }
    }

    pub fn widget(&self) -> Option<Widget> {
        self.mounted().map(|mounted| mounted.widget().clone())
    }

    /// Creates the native widget and mounts the children under it. Repeated calls return the
    /// same widget without touching the toolkit.
    pub fn mount(&self) -> Result<Widget> {
        let (context, props, common) = {
            let node = self.node.borrow();
            match &node.state {
                State::Mounted(mounted) => {
                    let widget = mounted.widget();
                    return if widget.is_live() {
                        Ok(widget.clone())
                    } else {
                        Err(Error::Destroyed)
                    };
                }
                State::Destroyed => return Err(Error::Destroyed),
                State::Unmounted => (node.context.clone(), node.props.clone(), node.common.clone()),
            }
        };
        let mounted = mounted::realize(&context, &props, &common)?;
        let widget = mounted.widget().clone();
        self.node.borrow_mut().state = State::Mounted(mounted);
        for child in self.children() {
            self.attach_mounted(&child)?;
        }
        Ok(widget)
    }

    /// Appends `child` with the parent's default placement: the single slot of a window or
    /// dialog, or default packing in a box. Dialogs and context menus float.
    pub fn append_child(&self, child: &Component) -> Result<()> {
        self.append_with(child, Placement::Default)
    }

    pub fn append_packed(&self, child: &Component, packing: Packing) -> Result<()> {
        self.append_with(child, Placement::Packed(packing))
    }

    /// Places `child` in a grid cell.
    pub fn attach(
        &self,
        child: &Component,
        column: i32,
        row: i32,
        width: i32,
        height: i32,
    ) -> Result<()> {
        self.append_with(
            child,
            Placement::Cell(GridCell {
                column,
                row,
                width,
                height,
            }),
        )
    }

    fn append_with(&self, child: &Component, placement: Placement) -> Result<()> {
        if self.is_destroyed() || child.is_destroyed() {
            return Err(Error::Destroyed);
        }
        if child.parent().is_some() {
            return Err(Error::AlreadyParented);
        }
        if self == child || self.has_ancestor(child) {
            return Err(Error::CyclicTree);
        }
        let placement = if child.kind().is_floating() {
            if placement != Placement::Default {
                return Err(Error::PlacementMismatch {
                    kind: child.kind().name(),
                    placement: placement.name(),
                });
            }
            Placement::Floating
        } else {
            self.check_placement(placement)?;
            placement
        };
        {
            let mut node = child.node.borrow_mut();
            node.parent = Rc::downgrade(&self.node);
            node.placement = placement;
        }
        self.node.borrow_mut().children.push(child.clone());
        if let Err(err) = self.attach_mounted(child) {
            self.unlink(child);
            return Err(err);
        }
        Ok(())
    }

    fn check_placement(&self, placement: Placement) -> Result<()> {
        let kind = self.kind();
        if !kind.is_container() {
            return Err(Error::NotAContainer { kind: kind.name() });
        }
        match (kind, placement) {
            (ComponentKind::Grid, Placement::Default) => {
                Err(Error::PlacementRequired { kind: kind.name() })
            }
            (ComponentKind::Grid, Placement::Cell(_))
            | (ComponentKind::Box, Placement::Default | Placement::Packed(_)) => Ok(()),
            (_, Placement::Default) if kind.single_child() => {
                let occupied = self
                    .children()
                    .iter()
                    .any(|child| child.placement() != Placement::Floating);
                if occupied {
                    Err(Error::ChildSlotOccupied { kind: kind.name() })
                } else {
                    Ok(())
                }
            }
            (_, other) => Err(Error::PlacementMismatch {
                kind: kind.name(),
                placement: other.name(),
            }),
        }
    }

    fn has_ancestor(&self, candidate: &Component) -> bool {
        let mut current = self.parent();
        while let Some(component) = current {
            if component == *candidate {
                return true;
            }
            current = component.parent();
        }
        false
    }

    /// Mounts `child` and attaches it, if this component is mounted.
    fn attach_mounted(&self, child: &Component) -> Result<()> {
        let Some(parent) = self.mounted() else {
            return Ok(());
        };
        let widget = child.mount()?;
        match child.placement() {
            Placement::Floating => self.attach_floating(&parent, child),
            placement => match parent.container() {
                Some(container) => container.attach_child(&widget, &placement),
                None => Err(Error::NotAContainer {
                    kind: self.kind().name(),
                }),
            },
        }
    }

    fn attach_floating(&self, parent: &Mounted, child: &Component) -> Result<()> {
        match child.mounted() {
            Some(Mounted::ContextMenu(menu)) => {
                let trigger = parent.widget();
                menu.attach_to(trigger)?;
                let menu = menu.widget().downgrade();
                trigger.connect_signal(TRIGGER_SIGNAL, Signature::Event, move |args| {
                    if args.button() != Some(SECONDARY_BUTTON) {
                        return Propagation::Proceed;
                    }
                    let Some(widget) = menu.upgrade() else {
                        return Propagation::Proceed;
                    };
                    if let Err(err) = Menu::from_widget(widget).popup(None) {
                        warn!(%err, "failed to open context menu");
                    }
                    Propagation::Stop
                })?;
            }
            Some(Mounted::Dialog(dialog)) => {
                if let Some(window) = self.nearest_window() {
                    dialog.set_transient_for(&window)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn nearest_window(&self) -> Option<Window> {
        let mut current = Some(self.clone());
        while let Some(component) = current {
            if let Some(Mounted::Window(window)) = component.mounted() {
                return Some(window);
            }
            current = component.parent();
        }
        None
    }

    fn unlink(&self, child: &Component) -> bool {
        let removed = {
            let mut node = self.node.borrow_mut();
            let before = node.children.len();
            node.children.retain(|existing| existing != child);
            node.children.len() != before
        };
        if removed {
            child.node.borrow_mut().parent = Weak::new();
        }
        removed
    }

    /// Unlinks `child` and removes its widget from this one. The child stays mounted and can
    /// be appended again. Returns whether `child` was a child of this component.
    pub fn remove_child(&self, child: &Component) -> bool {
        if !self.unlink(child) {
            return false;
        }
        let (Some(parent), Some(mounted)) = (self.mounted(), child.mounted()) else {
            return true;
        };
        if !parent.widget().is_live() || !mounted.widget().is_live() {
            return true;
        }
        let detached = match (child.placement(), parent.container()) {
            (Placement::Floating, _) => {
                if matches!(mounted, Mounted::ContextMenu(_)) {
                    parent.widget().disconnect_signal(TRIGGER_SIGNAL);
                }
                Ok(())
            }
            (_, Some(container)) => container.detach_child(mounted.widget()),
            (_, None) => Ok(()),
        };
        if let Err(err) = detached {
            warn!(%err, "failed to detach child widget");
        }
        true
    }

    /// Destroys the children, then this component. Later calls do nothing.
    pub fn destroy(&self) {
        let (state, children) = {
            let mut node = self.node.borrow_mut();
            if matches!(node.state, State::Destroyed) {
                return;
            }
            let state = mem::replace(&mut node.state, State::Destroyed);
            (state, mem::take(&mut node.children))
        };
        for child in &children {
            child.node.borrow_mut().parent = Weak::new();
            child.destroy();
        }
        if let Some(parent) = self.parent() {
            parent.unlink(self);
            if let (ComponentKind::ContextMenu, Some(trigger)) = (self.kind(), parent.widget()) {
                trigger.disconnect_signal(TRIGGER_SIGNAL);
            }
        }
        if let State::Mounted(mounted) = state {
            debug!(resource = %mounted.widget().id(), "destroying component");
            mounted.widget().destroy();
        }
    }

    fn update(
        &self,
        operation: &'static str,
        apply: impl FnOnce(&mut Props) -> bool,
    ) -> Result<()> {
        let mut node = self.node.borrow_mut();
        if matches!(node.state, State::Destroyed) {
            return Err(Error::Destroyed);
        }
        if apply(&mut node.props) {
            Ok(())
        } else {
            Err(Error::Unsupported {
                operation,
                kind: node.props.kind().name(),
            })
        }
    }

    fn update_common(&self, apply: impl FnOnce(&mut Common)) -> Result<()> {
        let mut node = self.node.borrow_mut();
        if matches!(node.state, State::Destroyed) {
            return Err(Error::Destroyed);
        }
        apply(&mut node.common);
        Ok(())
    }

    /// Window or dialog title.
    pub fn set_title(&self, title: &str) -> Result<()> {
        self.update("set_title", |props| match props {
            Props::Window { title: current, .. } | Props::Dialog { title: current, .. } => {
                title.clone_into(current);
                true
            }
            _ => false,
        })?;
        match self.mounted() {
            Some(Mounted::Window(window)) => window.set_title(title),
            Some(Mounted::Dialog(dialog)) => dialog.set_title(title),
            _ => Ok(()),
        }
    }

    /// Window or dialog size before the user resizes it.
    pub fn set_default_size(&self, width: i32, height: i32) -> Result<()> {
        self.update("set_default_size", |props| match props {
            Props::Window {
                width: w, height: h, ..
            } => {
                (*w, *h) = (width, height);
                true
            }
            Props::Dialog { size, .. } => {
                *size = Some((width, height));
                true
            }
            _ => false,
        })?;
        match self.mounted() {
            Some(Mounted::Window(window)) => window.set_default_size(width, height),
            Some(Mounted::Dialog(dialog)) => dialog.set_default_size(width, height),
            _ => Ok(()),
        }
    }

    pub fn set_quit_on_destroy(&self, enabled: bool) -> Result<()> {
        self.update("set_quit_on_destroy", |props| match props {
            Props::Window { quit_on_destroy, .. } => {
                *quit_on_destroy = enabled;
                true
            }
            _ => false,
        })?;
        if let Some(Mounted::Window(window)) = self.mounted() {
            if enabled {
                window.quit_on_destroy()?;
            } else {
                window.disconnect_signal("destroy");
            }
        }
        Ok(())
    }

    pub fn set_label(&self, label: &str) -> Result<()> {
        self.update("set_label", |props| match props {
            Props::Button { label: current, .. } => {
                label.clone_into(current);
                true
            }
            _ => false,
        })?;
        match self.mounted() {
            Some(Mounted::Button(button)) => button.set_label(label),
            _ => Ok(()),
        }
    }

    /// Replaces the button's click handler.
    pub fn set_click_handler(&self, handler: impl Fn() + 'static) -> Result<()> {
        let handler: ClickHandler = Rc::new(handler);
        self.update("set_click_handler", |props| match props {
            Props::Button { on_click, .. } => {
                *on_click = Some(Rc::clone(&handler));
                true
            }
            _ => false,
        })?;
        match self.mounted() {
            Some(Mounted::Button(button)) => mounted::bind_click(&button, &handler),
            _ => Ok(()),
        }
    }

    /// Label or entry text.
    pub fn set_text(&self, text: &str) -> Result<()> {
        self.update("set_text", |props| match props {
            Props::Label { text: current } | Props::Entry { text: current, .. } => {
                text.clone_into(current);
                true
            }
            _ => false,
        })?;
        match self.mounted() {
            Some(Mounted::Label(label)) => label.set_text(text),
            Some(Mounted::Entry(entry)) => entry.set_text(text),
            _ => Ok(()),
        }
    }

    /// Label or entry text, read from the native widget once mounted.
    pub fn text(&self) -> Result<String> {
        match self.mounted() {
            Some(Mounted::Label(label)) => return label.text(),
            Some(Mounted::Entry(entry)) => return entry.text(),
            _ => {}
        }
        let node = self.node.borrow();
        match &node.props {
            Props::Label { text } | Props::Entry { text, .. } => Ok(text.clone()),
            other => Err(Error::Unsupported {
                operation: "text",
                kind: other.kind().name(),
            }),
        }
    }

    pub fn set_placeholder(&self, placeholder: &str) -> Result<()> {
        self.update("set_placeholder", |props| match props {
            Props::Entry { placeholder: current, .. } => {
                *current = Some(placeholder.to_owned());
                true
            }
            _ => false,
        })?;
        match self.mounted() {
            Some(Mounted::Entry(entry)) => entry.set_placeholder(placeholder),
            _ => Ok(()),
        }
    }

    /// Calls `handler` with the entry's text after every change.
    pub fn on_change(&self, handler: impl Fn(&str) + 'static) -> Result<()> {
        let handler: ChangeHandler = Rc::new(handler);
        self.update("on_change", |props| match props {
            Props::Entry { on_change, .. } => {
                *on_change = Some(Rc::clone(&handler));
                true
            }
            _ => false,
        })?;
        match self.mounted() {
            Some(Mounted::Entry(entry)) => mounted::bind_change(&entry, &handler),
            _ => Ok(()),
        }
    }

    pub fn set_row_spacing(&self, spacing: u32) -> Result<()> {
        self.update("set_row_spacing", |props| match props {
            Props::Grid { row_spacing, .. } => {
                *row_spacing = spacing;
                true
            }
            _ => false,
        })?;
        match self.mounted() {
            Some(Mounted::Grid(grid)) => grid.set_row_spacing(spacing),
            _ => Ok(()),
        }
    }

    pub fn set_column_spacing(&self, spacing: u32) -> Result<()> {
        self.update("set_column_spacing", |props| match props {
            Props::Grid { column_spacing, .. } => {
                *column_spacing = spacing;
                true
            }
            _ => false,
        })?;
        match self.mounted() {
            Some(Mounted::Grid(grid)) => grid.set_column_spacing(spacing),
            _ => Ok(()),
        }
    }

    /// Adds a dialog action. Clicking it runs `callback`, then the dialog's response handler,
    /// then destroys the dialog.
    pub fn add_button(
        &self,
        label: &str,
        response: i32,
        callback: Option<ResponseHandler>,
    ) -> Result<()> {
        let button = DialogButton {
            label: label.to_owned(),
            response,
            callback,
        };
        let callback = button.callback.clone();
        self.update("add_button", |props| match props {
            Props::Dialog { buttons, .. } => {
                buttons.push(button);
                true
            }
            _ => false,
        })?;
        if let Some(Mounted::Dialog(dialog)) = self.mounted() {
            dialog.add_response_button(label, response, callback)?;
        }
        Ok(())
    }

    pub fn set_response_handler(&self, handler: impl Fn(i32) + 'static) -> Result<()> {
        let handler: ResponseHandler = Rc::new(handler);
        self.update("set_response_handler", |props| match props {
            Props::Dialog { on_response, .. } => {
                *on_response = Some(Rc::clone(&handler));
                true
            }
            _ => false,
        })?;
        if let Some(Mounted::Dialog(dialog)) = self.mounted() {
            dialog.set_response_handler(Some(handler));
        }
        Ok(())
    }

    /// Puts `child` in the dialog's content area.
    pub fn set_content(&self, child: &Component) -> Result<()> {
        if self.kind() != ComponentKind::Dialog {
            return Err(Error::Unsupported {
                operation: "set_content",
                kind: self.kind().name(),
            });
        }
        self.append_child(child)
    }

    /// Mounts the dialog if needed and shows it.
    pub fn present(&self) -> Result<()> {
        if self.kind() != ComponentKind::Dialog {
            return Err(Error::Unsupported {
                operation: "present",
                kind: self.kind().name(),
            });
        }
        self.mount()?.show();
        Ok(())
    }

    pub fn add_item(&self, label: &str, callback: Option<ClickHandler>) -> Result<()> {
        let entry = MenuEntry {
            label: label.to_owned(),
            callback,
        };
        let callback = entry.callback.clone();
        self.update("add_item", |props| match props {
            Props::ContextMenu { items } => {
                items.push(entry);
                true
            }
            _ => false,
        })?;
        if let Some(Mounted::ContextMenu(menu)) = self.mounted() {
            mounted::append_item(&self.context(), &menu, label, callback.as_ref())?;
        }
        Ok(())
    }

    /// Opens the context menu at the pointer, mounting it first if needed.
    pub fn popup(&self) -> Result<()> {
        if self.kind() != ComponentKind::ContextMenu {
            return Err(Error::Unsupported {
                operation: "popup",
                kind: self.kind().name(),
            });
        }
        self.mount()?;
        match self.mounted() {
            Some(Mounted::ContextMenu(menu)) => menu.popup(None),
            _ => Ok(()),
        }
    }

    /// `-1` leaves a dimension unconstrained.
    pub fn set_size(&self, width: i32, height: i32) -> Result<()> {
        self.update_common(|common| common.size = Some((width, height)))?;
        match self.widget() {
            Some(widget) => widget.set_size(width, height),
            None => Ok(()),
        }
    }

    pub fn set_name(&self, name: &str) -> Result<()> {
        self.update_common(|common| common.name = Some(name.to_owned()))?;
        match self.widget() {
            Some(widget) => widget.set_name(name),
            None => Ok(()),
        }
    }

    pub fn add_class(&self, class: &str) -> Result<()> {
        self.update_common(|common| {
            if !common.classes.iter().any(|existing| existing == class) {
                common.classes.push(class.to_owned());
            }
        })?;
        match self.widget() {
            Some(widget) => widget.add_class(class),
            None => Ok(()),
        }
    }

    pub fn remove_class(&self, class: &str) -> Result<()> {
        self.update_common(|common| common.classes.retain(|existing| existing != class))?;
        match self.widget() {
            Some(widget) => widget.remove_class(class),
            None => Ok(()),
        }
    }

    /// Shows the widget and its children. Does nothing before mount.
    pub fn show(&self) {
        if let Some(widget) = self.widget() {
            widget.show();
        }
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }
}

impl Eq for Component {}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.node.borrow();
        let state = match &node.state {
            State::Unmounted => "unmounted",
            State::Mounted(_) => "mounted",
            State::Destroyed => "destroyed",
        };
        f.debug_struct("Component")
            .field("kind", &node.props.kind())
            .field("id", &node.id)
            .field("state", &state)
            .field("children", &node.children.len())
            .finish()
    }
}
