use std::cell::RefCell;
use std::rc::Rc;

use gtkbind::toolkit::{HeadlessToolkit, LoopExit};
use gtkbind::{ComponentKind, Context, Error, Renderer, UnresolvedHandler};

const SETTINGS: &str = r#"{
    "type": "window",
    "id": "root",
    "title": "Settings",
    "width": 480,
    "height": 320,
    "children": [{
        "type": "box",
        "id": "body",
        "spacing": 8,
        "children": [
            {"type": "label", "text": "Display name"},
            {"type": "entry", "id": "name", "placeholder": "Ada"},
            {
                "type": "grid",
                "id": "options",
                "rowSpacing": 4,
                "children": [
                    {"type": "label", "text": "Theme", "attach": {"column": 0, "row": 0}},
                    {"type": "button", "id": "theme", "label": "Dark", "attach": {"column": 1, "row": 0}}
                ]
            },
            {"type": "button", "id": "save", "label": "Save", "onClick": "save", "pack": {"expand": false}},
            {"type": "dialog", "id": "confirm", "title": "Saved", "buttons": [{"label": "OK", "response": -5}]}
        ]
    }]
}"#;

fn headless() -> (Rc<HeadlessToolkit>, Context) {
    let toolkit = Rc::new(HeadlessToolkit::new());
    let context = Context::headless(toolkit.clone());
    (toolkit, context)
}

#[test]
fn every_node_becomes_a_component() {
    let (_toolkit, context) = headless();
    let mut renderer = Renderer::new(&context);
    renderer.register("save", |_| {});
    let definition = Renderer::parse(SETTINGS).expect("definition");
    let root = renderer.build(&definition).expect("build");

    assert_eq!(definition.count(), 9);
    assert_eq!(root.node_count(), definition.count());
    let expected = [
        ("root", ComponentKind::Window),
        ("body", ComponentKind::Box),
        ("name", ComponentKind::Entry),
        ("options", ComponentKind::Grid),
        ("theme", ComponentKind::Button),
        ("save", ComponentKind::Button),
        ("confirm", ComponentKind::Dialog),
    ];
    for (id, kind) in expected {
        let component = renderer.get_component(id).unwrap_or_else(|| panic!("missing `{id}`"));
        assert_eq!(component.kind(), kind, "{id}");
        assert_eq!(component.id().as_deref(), Some(id));
        assert_eq!(root.find(id), Some(component));
    }
    assert!(renderer.get_component("nope").is_none());
    assert!(renderer.unresolved_handlers().is_empty());
    assert!(!root.is_mounted());
}

#[test]
fn definition_ids_carry_over_to_components() {
    let (_toolkit, context) = headless();
    let mut renderer = Renderer::new(&context);
    let definition = Renderer::parse(
        r#"{"type": "box", "id": "root", "children": [
            {"type": "label", "id": "status", "text": "Ready"},
            {"type": "label", "text": "anonymous"}
        ]}"#,
    )
    .expect("definition");
    let root = renderer.build(&definition).expect("build");

    assert_eq!(root.id().as_deref(), Some("root"));
    let status = root.find("status").expect("status label");
    assert_eq!(Some(&status), renderer.get_component("status").as_ref());
    assert_eq!(status.kind(), ComponentKind::Label);
    let children = root.children();
    assert!(children[1].id().is_none());
}

#[test]
fn unknown_handler_names_leave_the_widget_inert() {
    let (toolkit, context) = headless();
    let mut renderer = Renderer::new(&context);
    let definition = Renderer::parse(
        r#"{"type": "box", "children": [
            {"type": "button", "id": "go", "label": "Go", "onClick": "launch"},
            {"type": "context-menu", "items": [{"label": "Copy", "onClick": "copy"}]}
        ]}"#,
    )
    .expect("definition");
    let root = renderer.build(&definition).expect("lenient build");
    root.mount().expect("mount");

    assert_eq!(
        renderer.unresolved_handlers(),
        [
            UnresolvedHandler {
                node_id: Some("go".to_owned()),
                field: "onClick".to_owned(),
                name: "launch".to_owned(),
            },
            UnresolvedHandler {
                node_id: None,
                field: "items[0].onClick".to_owned(),
                name: "copy".to_owned(),
            },
        ]
    );
    let button = toolkit.find_by_text("Go").expect("native button");
    assert_eq!(toolkit.handler_count(button, "clicked"), 0);
    assert!(!toolkit.emit(button, "clicked"));
    assert!(toolkit.criticals().is_empty());
}

#[test]
fn handlers_registered_after_build_are_not_picked_up() {
    let (_toolkit, context) = headless();
    let mut renderer = Renderer::new(&context);
    let definition = Renderer::parse(r#"{"type": "button", "label": "Late", "onClick": "late"}"#)
        .expect("definition");
    renderer.build(&definition).expect("build");
    renderer.register("late", |_| {});
    assert_eq!(renderer.unresolved_handlers().len(), 1);
    assert!(renderer.handlers().contains("late"));
}

#[test]
fn a_window_takes_a_single_child() {
    let (_toolkit, context) = headless();
    let mut renderer = Renderer::new(&context);
    let definition = Renderer::parse(
        r#"{"type": "window", "title": "Two", "children": [
            {"type": "label", "text": "one"},
            {"type": "label", "text": "two"}
        ]}"#,
    )
    .expect("definition");
    let err = renderer.build(&definition).expect_err("second child");
    assert!(matches!(err, Error::ChildSlotOccupied { kind: "window" }));
}

#[test]
fn grid_children_must_say_where_they_go() {
    let (_toolkit, context) = headless();
    let mut renderer = Renderer::new(&context);
    let definition = Renderer::parse(
        r#"{"type": "grid", "children": [{"type": "label", "text": "lost"}]}"#,
    )
    .expect("definition");
    let err = renderer.build(&definition).expect_err("no attach");
    assert!(matches!(err, Error::PlacementRequired { kind: "grid" }));
}

#[test]
fn dialog_handlers_run_in_order() {
    let (toolkit, context) = headless();
    let mut renderer = Renderer::new(&context);
    let log = Rc::new(RefCell::new(Vec::new()));
    let seen = Rc::clone(&log);
    renderer.register("ok", move |event| {
        seen.borrow_mut().push(format!("ok {:?} {:?}", event.source, event.response));
    });
    let seen = Rc::clone(&log);
    renderer.register("respond", move |event| {
        seen.borrow_mut().push(format!("respond {:?}", event.response));
    });
    let definition = Renderer::parse(
        r#"{"type": "window", "title": "Main", "children": [{
            "type": "dialog", "id": "confirm", "title": "Apply?", "onResponse": "respond",
            "buttons": [
                {"label": "Cancel", "response": -6},
                {"label": "Apply", "response": -10, "onClick": "ok"}
            ]
        }]}"#,
    )
    .expect("definition");
    let root = renderer.build(&definition).expect("build");
    root.mount().expect("mount");

    let apply = toolkit.find_by_text("Apply").expect("native button");
    toolkit.emit(apply, "clicked");
    assert_eq!(
        *log.borrow(),
        vec![r#"ok Some("confirm") Some(-10)"#.to_owned(), "respond Some(-10)".to_owned()]
    );
    let dialog = renderer.get_component("confirm").expect("dialog");
    assert!(!dialog.is_mounted());
    toolkit.run_idle();
    assert!(toolkit.find_by_text("Cancel").is_none());
}

#[test]
fn render_shows_the_tree_and_runs_until_quit() {
    let (toolkit, context) = headless();
    let mut renderer = Renderer::new(&context);
    let quitter = context.downgrade();
    renderer.register("quit", move |_| {
        if let Some(context) = quitter.upgrade() {
            context.quit();
        }
    });
    toolkit.queue(|toolkit| {
        let raw = toolkit.find_by_text("Quit").expect("native button");
        toolkit.emit(raw, "clicked");
    });

    let root = renderer
        .render_json(
            r#"{"type": "window", "title": "Hello", "width": 320, "height": 200, "children": [{
                "type": "box", "orientation": "horizontal", "spacing": 6, "children": [
                    {"type": "label", "text": "Name"},
                    {"type": "button", "label": "Quit", "onClick": "quit", "pack": {"expand": false}}
                ]
            }]}"#,
        )
        .expect("render");

    assert!(root.is_mounted());
    assert_eq!(toolkit.last_loop_exit(), Some(LoopExit::Quit));
    insta::assert_snapshot!(toolkit.transcript(), @r#"
    init
    new window1
    set_title window1 "Hello"
    set_default_size window1 320x200
    new hbox2
    new label3
    pack_start hbox2 label3 expand=true fill=true padding=0
    new button4
    pack_start hbox2 button4 expand=false fill=true padding=0
    container_add window1 hbox2
    show_all window1
    main
    main_quit
    "#);
}
