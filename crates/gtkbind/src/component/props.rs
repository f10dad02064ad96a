use std::fmt;
use std::rc::Rc;

use crate::toolkit::Orientation;
use crate::widgets::ResponseHandler;

pub type ClickHandler = Rc<dyn Fn()>;
pub type ChangeHandler = Rc<dyn Fn(&str)>;

/// What a component turns into when mounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Window,
    Box,
    Grid,
    Button,
    Label,
    Entry,
    Dialog,
    ContextMenu,
}

impl ComponentKind {
    pub fn name(self) -> &'static str {
        match self {
            ComponentKind::Window => "window",
            ComponentKind::Box => "box",
            ComponentKind::Grid => "grid",
            ComponentKind::Button => "button",
            ComponentKind::Label => "label",
            ComponentKind::Entry => "entry",
            ComponentKind::Dialog => "dialog",
            ComponentKind::ContextMenu => "context-menu",
        }
    }

    /// Owned by the parent component without being placed inside the parent widget.
    pub fn is_floating(self) -> bool {
        matches!(self, ComponentKind::Dialog | ComponentKind::ContextMenu)
    }

    /// Accepts at most one placed child.
    pub(crate) fn single_child(self) -> bool {
        matches!(self, ComponentKind::Window | ComponentKind::Dialog)
    }

    pub(crate) fn is_container(self) -> bool {
        matches!(
            self,
            ComponentKind::Window | ComponentKind::Box | ComponentKind::Grid | ComponentKind::Dialog
        )
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone)]
pub(crate) struct DialogButton {
    pub(crate) label: String,
    pub(crate) response: i32,
    pub(crate) callback: Option<ResponseHandler>,
}

#[derive(Clone)]
pub(crate) struct MenuEntry {
    pub(crate) label: String,
    pub(crate) callback: Option<ClickHandler>,
}

/// Kind-specific state, kept in sync with the native widget once mounted.
#[derive(Clone)]
pub(crate) enum Props {
    Window {
        title: String,
        width: i32,
        height: i32,
        quit_on_destroy: bool,
    },
    Box {
        orientation: Orientation,
        spacing: i32,
    },
    Grid {
        row_spacing: u32,
        column_spacing: u32,
    },
    Button {
        label: String,
        on_click: Option<ClickHandler>,
    },
    Label {
        text: String,
    },
    Entry {
        text: String,
        placeholder: Option<String>,
        on_change: Option<ChangeHandler>,
    },
    Dialog {
        title: String,
        size: Option<(i32, i32)>,
        buttons: Vec<DialogButton>,
        on_response: Option<ResponseHandler>,
    },
    ContextMenu {
        items: Vec<MenuEntry>,
    },
}

impl Props {
    pub(crate) fn kind(&self) -> ComponentKind {
        match self {
            Props::Window { .. } => ComponentKind::Window,
            Props::Box { .. } => ComponentKind::Box,
            Props::Grid { .. } => ComponentKind::Grid,
            Props::Button { .. } => ComponentKind::Button,
            Props::Label { .. } => ComponentKind::Label,
            Props::Entry { .. } => ComponentKind::Entry,
            Props::Dialog { .. } => ComponentKind::Dialog,
            Props::ContextMenu { .. } => ComponentKind::ContextMenu,
        }
    }
}

/// Properties every widget kind understands.
#[derive(Debug, Clone, Default)]
pub(crate) struct Common {
    pub(crate) name: Option<String>,
    pub(crate) classes: Vec<String>,
    pub(crate) size: Option<(i32, i32)>,
}
