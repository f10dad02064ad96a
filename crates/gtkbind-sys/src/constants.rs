use std::os::raw::c_int;

pub const GTK_WINDOW_TOPLEVEL: c_int = 0;

pub const GTK_ORIENTATION_HORIZONTAL: c_int = 0;
pub const GTK_ORIENTATION_VERTICAL: c_int = 1;

pub const GTK_STYLE_PROVIDER_PRIORITY_FALLBACK: u32 = 1;
pub const GTK_STYLE_PROVIDER_PRIORITY_THEME: u32 = 200;
pub const GTK_STYLE_PROVIDER_PRIORITY_SETTINGS: u32 = 400;
pub const GTK_STYLE_PROVIDER_PRIORITY_APPLICATION: u32 = 600;
pub const GTK_STYLE_PROVIDER_PRIORITY_USER: u32 = 800;

pub const GTK_POS_LEFT: c_int = 0;
pub const GTK_POS_RIGHT: c_int = 1;
pub const GTK_POS_TOP: c_int = 2;
pub const GTK_POS_BOTTOM: c_int = 3;

pub const GTK_DIALOG_MODAL: c_int = 1 << 0;
pub const GTK_DIALOG_DESTROY_WITH_PARENT: c_int = 1 << 1;

pub const GTK_RESPONSE_NONE: c_int = -1;
pub const GTK_RESPONSE_REJECT: c_int = -2;
pub const GTK_RESPONSE_ACCEPT: c_int = -3;
pub const GTK_RESPONSE_DELETE_EVENT: c_int = -4;
pub const GTK_RESPONSE_OK: c_int = -5;
pub const GTK_RESPONSE_CANCEL: c_int = -6;
pub const GTK_RESPONSE_CLOSE: c_int = -7;
pub const GTK_RESPONSE_YES: c_int = -8;
pub const GTK_RESPONSE_NO: c_int = -9;
pub const GTK_RESPONSE_APPLY: c_int = -10;
pub const GTK_RESPONSE_HELP: c_int = -11;

pub const G_PRIORITY_DEFAULT_IDLE: c_int = 200;

pub const GTK_STOCK_OPEN: &str = "gtk-open";
pub const GTK_STOCK_CANCEL: &str = "gtk-cancel";
pub const GTK_STOCK_SAVE: &str = "gtk-save";

/// GDK event type tag for a single button press.
pub const GDK_BUTTON_PRESS: c_int = 4;
pub const GDK_BUTTON_SECONDARY: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedConstant {
    Int(i64),
    Str(&'static str),
}

impl NamedConstant {
    pub fn as_int(self) -> Option<i64> {
        match self {
            NamedConstant::Int(value) => Some(value),
            NamedConstant::Str(_) => None,
        }
    }

    pub fn as_str(self) -> Option<&'static str> {
        match self {
            NamedConstant::Str(value) => Some(value),
            NamedConstant::Int(_) => None,
        }
    }
}

macro_rules! named {
    ($($name:ident => $kind:ident),* $(,)?) => {
        pub static CONSTANTS: &[(&str, NamedConstant)] = &[
            $( (stringify!($name), NamedConstant::$kind($name as _)), )*
        ];
    };
}

named! {
    GTK_WINDOW_TOPLEVEL => Int,
    GTK_ORIENTATION_HORIZONTAL => Int,
    GTK_ORIENTATION_VERTICAL => Int,
    GTK_STYLE_PROVIDER_PRIORITY_FALLBACK => Int,
    GTK_STYLE_PROVIDER_PRIORITY_THEME => Int,
    GTK_STYLE_PROVIDER_PRIORITY_SETTINGS => Int,
    GTK_STYLE_PROVIDER_PRIORITY_APPLICATION => Int,
    GTK_STYLE_PROVIDER_PRIORITY_USER => Int,
    GTK_POS_LEFT => Int,
    GTK_POS_RIGHT => Int,
    GTK_POS_TOP => Int,
    GTK_POS_BOTTOM => Int,
    GTK_DIALOG_MODAL => Int,
    GTK_DIALOG_DESTROY_WITH_PARENT => Int,
    GTK_RESPONSE_NONE => Int,
    GTK_RESPONSE_REJECT => Int,
    GTK_RESPONSE_ACCEPT => Int,
    GTK_RESPONSE_DELETE_EVENT => Int,
    GTK_RESPONSE_OK => Int,
    GTK_RESPONSE_CANCEL => Int,
    GTK_RESPONSE_CLOSE => Int,
    GTK_RESPONSE_YES => Int,
    GTK_RESPONSE_NO => Int,
    GTK_RESPONSE_APPLY => Int,
    GTK_RESPONSE_HELP => Int,
    G_PRIORITY_DEFAULT_IDLE => Int,
    GDK_BUTTON_PRESS => Int,
    GDK_BUTTON_SECONDARY => Int,
    GTK_STOCK_OPEN => Str,
    GTK_STOCK_CANCEL => Str,
    GTK_STOCK_SAVE => Str,
}

pub fn constant(name: &str) -> Option<NamedConstant> {
    CONSTANTS
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, value)| *value)
}
