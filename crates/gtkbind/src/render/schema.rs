//! JSON description of a widget tree.

use serde::{Deserialize, Serialize};

use crate::toolkit::Orientation;
use crate::widgets::Packing;

/// One node of a UI definition: `{"type": ..., "id"?, "children"?, ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub widget: WidgetDef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<UiNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    /// Packing inside a parent box.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pack: Option<PackDef>,
    /// Cell inside a parent grid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attach: Option<AttachDef>,
}

impl UiNode {
    /// This node and all of its descendants.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(UiNode::count).sum::<usize>()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum WidgetDef {
    Window(WindowDef),
    Box(BoxDef),
    Grid(GridDef),
    Button(ButtonDef),
    Label(LabelDef),
    Entry(EntryDef),
    Dialog(DialogDef),
    ContextMenu(ContextMenuDef),
}

fn default_window_width() -> i32 {
    800
}

fn default_window_height() -> i32 {
    600
}

fn default_true() -> bool {
    true
}

fn default_span() -> i32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowDef {
    pub title: String,
    #[serde(default = "default_window_width")]
    pub width: i32,
    #[serde(default = "default_window_height")]
    pub height: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrientationDef {
    Horizontal,
    #[default]
    Vertical,
}

impl From<OrientationDef> for Orientation {
    fn from(value: OrientationDef) -> Self {
        match value {
            OrientationDef::Horizontal => Orientation::Horizontal,
            OrientationDef::Vertical => Orientation::Vertical,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxDef {
    #[serde(default)]
    pub orientation: OrientationDef,
    #[serde(default)]
    pub spacing: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridDef {
    #[serde(default)]
    pub row_spacing: u32,
    #[serde(default)]
    pub column_spacing: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonDef {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_click: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelDef {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_change: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogDef {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<DialogButtonDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_response: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogButtonDef {
    pub label: String,
    pub response: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_click: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextMenuDef {
    #[serde(default)]
    pub items: Vec<MenuItemDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemDef {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_click: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackDef {
    #[serde(default = "default_true")]
    pub expand: bool,
    #[serde(default = "default_true")]
    pub fill: bool,
    #[serde(default)]
    pub padding: u32,
}

impl From<PackDef> for Packing {
    fn from(value: PackDef) -> Self {
        Packing {
            expand: value.expand,
            fill: value.fill,
            padding: value.padding,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachDef {
    pub column: i32,
    pub row: i32,
    #[serde(default = "default_span")]
    pub width: i32,
    #[serde(default = "default_span")]
    pub height: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let node: UiNode = serde_json::from_str(
            r#"{"type": "window", "title": "Main", "children": [
                {"type": "box", "children": [
                    {"type": "button", "label": "Go", "pack": {"padding": 4}}
                ]}
            ]}"#,
        )
        .expect("definition");
        assert_eq!(
            node.widget,
            WidgetDef::Window(WindowDef {
                title: "Main".to_owned(),
                width: 800,
                height: 600,
            })
        );
        let column = &node.children[0];
        assert_eq!(
            column.widget,
            WidgetDef::Box(BoxDef {
                orientation: OrientationDef::Vertical,
                spacing: 0,
            })
        );
        let pack = column.children[0].pack.expect("pack");
        assert_eq!(Packing::from(pack), Packing { expand: true, fill: true, padding: 4 });
        assert_eq!(node.count(), 3);
    }

    #[test]
    fn kebab_case_tags_and_camel_case_fields() {
        let node: UiNode = serde_json::from_str(
            r#"{"type": "context-menu", "id": "menu", "items": [{"label": "Copy", "onClick": "copy"}]}"#,
        )
        .expect("definition");
        assert_eq!(node.id.as_deref(), Some("menu"));
        let WidgetDef::ContextMenu(menu) = node.widget else {
            panic!("expected a context menu, got {:?}", node.widget);
        };
        assert_eq!(menu.items[0].on_click.as_deref(), Some("copy"));
    }

    #[test]
    fn unknown_types_are_rejected() {
        let err = serde_json::from_str::<UiNode>(r#"{"type": "webview", "url": "about:blank"}"#)
            .expect_err("unknown type");
        assert!(err.to_string().contains("webview"), "{err}");
    }

    #[test]
    fn grid_attach_spans_default_to_one() {
        let node: UiNode = serde_json::from_str(
            r#"{"type": "label", "text": "A", "attach": {"column": 2, "row": 1}}"#,
        )
        .expect("definition");
        assert_eq!(
            node.attach,
            Some(AttachDef { column: 2, row: 1, width: 1, height: 1 })
        );
    }
}
