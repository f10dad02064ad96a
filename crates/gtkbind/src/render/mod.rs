//! Builds component trees from JSON definitions.
//!
//! Handler names in a definition (`onClick`, `onChange`, `onResponse`) are resolved against
//! the [`HandlerRegistry`] while the tree is built. A name nobody registered leaves the widget
//! inert and is recorded in [`Renderer::unresolved_handlers`], or fails the build when
//! [`RendererOptions::strict_handlers`] is set.

mod handlers;
mod schema;

use std::rc::Rc;

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::component::{ClickHandler, Component};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::widget::UNCONSTRAINED;
use crate::widgets::ResponseHandler;

pub use handlers::{Event, EventHandler, HandlerRegistry};
pub use schema::{
    AttachDef, BoxDef, ButtonDef, ContextMenuDef, DialogButtonDef, DialogDef, EntryDef, GridDef,
    LabelDef, MenuItemDef, OrientationDef, PackDef, UiNode, WidgetDef, WindowDef,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RendererOptions {
    /// Fail with [`Error::HandlerNotFound`] instead of leaving the widget inert.
    pub strict_handlers: bool,
}

/// A handler name the registry did not know when the tree was built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedHandler {
    pub node_id: Option<String>,
    /// Definition field that named the handler, such as `onClick` or `buttons[1].onClick`.
    pub field: String,
    pub name: String,
}

pub struct Renderer {
    context: Context,
    options: RendererOptions,
    handlers: HandlerRegistry,
    components: FxHashMap<String, Component>,
    unresolved: Vec<UnresolvedHandler>,
}

impl Renderer {
    pub fn new(context: &Context) -> Self {
        Self::with_options(context, RendererOptions::default())
    }

    pub fn with_options(context: &Context, options: RendererOptions) -> Self {
        Self {
            context: context.clone(),
            options,
            handlers: HandlerRegistry::new(),
            components: FxHashMap::default(),
            unresolved: Vec::new(),
        }
    }

    /// Registers a handler definitions can name. Replaces an earlier handler of the same name.
    pub fn register(&mut self, name: impl Into<String>, handler: impl Fn(&Event) + 'static) {
        self.handlers.register(name, handler);
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    pub fn handlers_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.handlers
    }

    pub fn parse(json: &str) -> Result<UiNode> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builds the component tree without mounting it.
    pub fn build(&mut self, definition: &UiNode) -> Result<Component> {
        let root = self.build_node(definition)?;
        debug!(nodes = root.node_count(), "built component tree");
        Ok(root)
    }

    /// Builds, mounts and shows the tree, then runs the main loop until it quits.
    pub fn render(&mut self, definition: &UiNode) -> Result<Component> {
        self.context.init();
        let root = self.build(definition)?;
        root.mount()?;
        root.show();
        self.context.run()?;
        Ok(root)
    }

    pub fn render_json(&mut self, json: &str) -> Result<Component> {
        let definition = Self::parse(json)?;
        self.render(&definition)
    }

    /// The component built from the node carrying `id`.
    pub fn get_component(&self, id: &str) -> Option<Component> {
        self.components.get(id).cloned()
    }

    pub fn unresolved_handlers(&self) -> &[UnresolvedHandler] {
        &self.unresolved
    }

    fn build_node(&mut self, definition: &UiNode) -> Result<Component> {
        let mut component = self.create(definition)?;
        if let Some(name) = &definition.name {
            component.set_name(name)?;
        }
        for class in &definition.classes {
            component.add_class(class)?;
        }
        if let Some(id) = &definition.id {
            component = component.with_id(id.clone());
            if self.components.insert(id.clone(), component.clone()).is_some() {
                warn!(%id, "duplicate component id; the later node wins");
            }
        }
        for child_definition in &definition.children {
            let child = self.build_node(child_definition)?;
            match (child_definition.attach, child_definition.pack) {
                (Some(cell), _) => {
                    component.attach(&child, cell.column, cell.row, cell.width, cell.height)?
                }
                (None, Some(pack)) => component.append_packed(&child, pack.into())?,
                (None, None) => component.append_child(&child)?,
            }
        }
        Ok(component)
    }

    fn create(&mut self, definition: &UiNode) -> Result<Component> {
        let context = &self.context;
        let node_id = definition.id.as_deref();
        let component = match &definition.widget {
            WidgetDef::Window(window) => {
                Component::window(context, &window.title, window.width, window.height)
            }
            WidgetDef::Box(boxed) => {
                Component::boxed(context, boxed.orientation.into(), boxed.spacing)
            }
            WidgetDef::Grid(grid) => {
                let component = Component::grid(context);
                component.set_row_spacing(grid.row_spacing)?;
                component.set_column_spacing(grid.column_spacing)?;
                component
            }
            WidgetDef::Button(button) => {
                let component = Component::button(context, &button.label);
                let on_click = button.on_click.as_deref();
                if let Some(handler) = self.resolve(node_id, "onClick", on_click)? {
                    let source = definition.id.clone();
                    component.set_click_handler(move || {
                        handler(&Event {
                            source: source.clone(),
                            signal: "clicked",
                            ..Event::default()
                        });
                    })?;
                }
                component
            }
            WidgetDef::Label(label) => Component::label(context, &label.text),
            WidgetDef::Entry(entry) => {
                let component = Component::entry(context);
                if let Some(text) = &entry.text {
                    component.set_text(text)?;
                }
                if let Some(placeholder) = &entry.placeholder {
                    component.set_placeholder(placeholder)?;
                }
                let on_change = entry.on_change.as_deref();
                if let Some(handler) = self.resolve(node_id, "onChange", on_change)? {
                    let source = definition.id.clone();
                    component.on_change(move |text| {
                        handler(&Event {
                            source: source.clone(),
                            signal: "changed",
                            text: Some(text.to_owned()),
                            response: None,
                        });
                    })?;
                }
                component
            }
            WidgetDef::Dialog(dialog) => self.create_dialog(definition, dialog)?,
            WidgetDef::ContextMenu(menu) => {
                let component = Component::context_menu(context);
                for (index, item) in menu.items.iter().enumerate() {
                    let field = format!("items[{index}].onClick");
                    let callback = self
                        .resolve(node_id, &field, item.on_click.as_deref())?
                        .map(|handler| {
                            let source = definition.id.clone();
                            Rc::new(move || {
                                handler(&Event {
                                    source: source.clone(),
                                    signal: "activate",
                                    ..Event::default()
                                });
                            }) as ClickHandler
                        });
                    component.add_item(&item.label, callback)?;
                }
                component
            }
        };
        Ok(component)
    }

    fn create_dialog(&mut self, definition: &UiNode, dialog: &DialogDef) -> Result<Component> {
        let node_id = definition.id.as_deref();
        let component = Component::dialog(&self.context, &dialog.title);
        if dialog.width.is_some() || dialog.height.is_some() {
            component.set_default_size(
                dialog.width.unwrap_or(UNCONSTRAINED),
                dialog.height.unwrap_or(UNCONSTRAINED),
            )?;
        }
        for (index, button) in dialog.buttons.iter().enumerate() {
            let field = format!("buttons[{index}].onClick");
            let callback = self
                .resolve(node_id, &field, button.on_click.as_deref())?
                .map(|handler| response_callback(handler, definition.id.clone()));
            component.add_button(&button.label, button.response, callback)?;
        }
        if let Some(handler) = self.resolve(node_id, "onResponse", dialog.on_response.as_deref())? {
            let callback = response_callback(handler, definition.id.clone());
            component.set_response_handler(move |response| callback(response))?;
        }
        Ok(component)
    }

    fn resolve(
        &mut self,
        node_id: Option<&str>,
        field: &str,
        name: Option<&str>,
    ) -> Result<Option<EventHandler>> {
        let Some(name) = name else {
            return Ok(None);
        };
        if let Some(handler) = self.handlers.get(name) {
            return Ok(Some(handler));
        }
        if self.options.strict_handlers {
            return Err(Error::HandlerNotFound { name: name.to_owned() });
        }
        warn!(
            node = node_id.unwrap_or("<anonymous>"),
            field,
            handler = name,
            "handler is not registered; widget stays inert"
        );
        self.unresolved.push(UnresolvedHandler {
            node_id: node_id.map(str::to_owned),
            field: field.to_owned(),
            name: name.to_owned(),
        });
        Ok(None)
    }
}

fn response_callback(handler: EventHandler, source: Option<String>) -> ResponseHandler {
    Rc::new(move |response| {
        handler(&Event {
            source: source.clone(),
            signal: "response",
            response: Some(response),
            ..Event::default()
        });
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::toolkit::HeadlessToolkit;

    fn renderer() -> (Rc<HeadlessToolkit>, Renderer) {
        let toolkit = Rc::new(HeadlessToolkit::new());
        let context = Context::headless(toolkit.clone());
        (toolkit, Renderer::new(&context))
    }

    #[test]
    fn handlers_receive_the_source_id() {
        let (toolkit, mut renderer) = renderer();
        let events = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&events);
        renderer.register("save", move |event| seen.borrow_mut().push(event.clone()));
        let definition = Renderer::parse(
            r#"{"type": "button", "id": "save-button", "label": "Save", "onClick": "save"}"#,
        )
        .expect("definition");
        let button = renderer.build(&definition).expect("build");
        let raw = button.mount().expect("mount").raw().expect("raw");
        toolkit.emit(raw, "clicked");
        assert_eq!(
            *events.borrow(),
            vec![Event {
                source: Some("save-button".to_owned()),
                signal: "clicked",
                text: None,
                response: None,
            }]
        );
    }

    #[test]
    fn entry_changes_carry_the_text() {
        let (toolkit, mut renderer) = renderer();
        let texts = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&texts);
        renderer.register("search", move |event| {
            seen.borrow_mut().push(event.text.clone().unwrap_or_default());
        });
        let definition = Renderer::parse(
            r#"{"type": "entry", "id": "query", "placeholder": "Search", "onChange": "search"}"#,
        )
        .expect("definition");
        let entry = renderer.build(&definition).expect("build");
        let raw = entry.mount().expect("mount").raw().expect("raw");
        toolkit.type_text(raw, "gtk");
        assert_eq!(*texts.borrow(), vec!["gtk".to_owned()]);
        assert_eq!(entry.text().expect("text"), "gtk");
    }

    #[test]
    fn strict_mode_rejects_unknown_handlers() {
        let toolkit = Rc::new(HeadlessToolkit::new());
        let context = Context::headless(toolkit.clone());
        let options = RendererOptions {
            strict_handlers: true,
        };
        let mut renderer = Renderer::with_options(&context, options);
        let json = r#"{"type": "button", "label": "Go", "onClick": "missing"}"#;
        let definition = Renderer::parse(json).expect("definition");
        let err = renderer.build(&definition).expect_err("strict");
        assert!(matches!(err, Error::HandlerNotFound { ref name } if name == "missing"));
    }

    #[test]
    fn invalid_json_is_a_definition_error() {
        let err = Renderer::parse(r#"{"type": "button""#).expect_err("truncated");
        assert!(matches!(err, Error::Definition(_)));
    }
}
