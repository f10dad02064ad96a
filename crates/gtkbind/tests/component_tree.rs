use std::rc::Rc;

use gtkbind::toolkit::{HeadlessToolkit, NativeCall};
use gtkbind::{Component, Context, Error};

fn headless() -> (Rc<HeadlessToolkit>, Context) {
    let toolkit = Rc::new(HeadlessToolkit::new());
    let context = Context::headless(toolkit.clone());
    (toolkit, context)
}

fn creations(toolkit: &HeadlessToolkit) -> usize {
    toolkit
        .calls()
        .iter()
        .filter(|call| matches!(call, NativeCall::New { .. }))
        .count()
}

#[test]
fn mount_twice_creates_once() {
    let (toolkit, context) = headless();
    let column = Component::vbox(&context);
    column.append_child(&Component::button(&context, "Go")).expect("append");

    let first = column.mount().expect("first mount");
    let calls_after_first = toolkit.calls().len();
    let second = column.mount().expect("second mount");

    assert_eq!(first, second);
    assert_eq!(toolkit.calls().len(), calls_after_first);
    assert_eq!(creations(&toolkit), 2);
}

#[test]
fn append_before_and_after_mount_build_the_same_tree() {
    let (early, early_context) = headless();
    let column = Component::vbox(&early_context);
    column.append_child(&Component::button(&early_context, "A")).expect("append");
    column.append_child(&Component::label(&early_context, "B")).expect("append");
    column.mount().expect("mount");

    let (late, late_context) = headless();
    let column = Component::vbox(&late_context);
    column.mount().expect("mount");
    column.append_child(&Component::button(&late_context, "A")).expect("append");
    column.append_child(&Component::label(&late_context, "B")).expect("append");

    assert_eq!(early.transcript(), late.transcript());
    insta::assert_snapshot!(late.transcript(), @r"
    new vbox1
    new button2
    pack_start vbox1 button2 expand=true fill=true padding=0
    new label3
    pack_start vbox1 label3 expand=true fill=true padding=0
    ");
}

#[test]
fn destroy_runs_leaves_first_and_only_once() {
    let (toolkit, context) = headless();
    let window = Component::window(&context, "Main", 400, 300);
    let column = Component::vbox(&context);
    column.append_child(&Component::button(&context, "Go")).expect("append");
    column.append_child(&Component::label(&context, "Status")).expect("append");
    window.append_child(&column).expect("append");
    window.mount().expect("mount");
    toolkit.clear_calls();

    window.destroy();
    window.destroy();
    column.destroy();

    let destroyed: Vec<String> = toolkit
        .calls()
        .iter()
        .filter(|call| matches!(call, NativeCall::Destroy(_)))
        .map(|call| toolkit.describe(call))
        .collect();
    assert_eq!(
        destroyed,
        vec!["destroy button3", "destroy label4", "destroy vbox2", "destroy window1"]
    );
    assert!(window.is_destroyed() && column.is_destroyed());
    assert_eq!(context.live_resources(), 0);
    assert!(toolkit.criticals().is_empty(), "{:?}", toolkit.criticals());
}

#[test]
fn destroying_a_subtree_unlinks_it_from_its_parent() {
    let (_toolkit, context) = headless();
    let window = Component::window(&context, "Main", 400, 300);
    let first = Component::label(&context, "first");
    window.append_child(&first).expect("append");
    window.mount().expect("mount");

    first.destroy();
    assert!(window.children().is_empty());
    window
        .append_child(&Component::label(&context, "second"))
        .expect("slot is free again");
}

#[test]
fn remove_child_detaches_the_native_widget() {
    let (toolkit, context) = headless();
    let left = Component::vbox(&context);
    let right = Component::hbox(&context);
    let button = Component::button(&context, "Move me");
    left.append_child(&button).expect("append");
    left.mount().expect("mount left");
    right.mount().expect("mount right");

    let left_raw = toolkit.created("vbox")[0];
    let right_raw = toolkit.created("hbox")[0];
    let button_raw = toolkit.find_by_text("Move me").expect("button");

    assert!(left.remove_child(&button));
    assert!(button.parent().is_none());
    assert!(button.is_mounted());
    assert!(toolkit.calls().contains(&NativeCall::ContainerRemove {
        container: left_raw,
        child: button_raw,
    }));
    assert_eq!(toolkit.parent_of(button_raw), None);
    assert_eq!(toolkit.extra_refs(button_raw), 1);

    right.append_child(&button).expect("re-append");
    assert_eq!(toolkit.parent_of(button_raw), Some(right_raw));
    assert_eq!(toolkit.extra_refs(button_raw), 0);
    assert_eq!(creations(&toolkit), 3);
    assert!(toolkit.criticals().is_empty(), "{:?}", toolkit.criticals());
}

#[test]
fn failed_attach_leaves_the_child_unparented() {
    let (_toolkit, context) = headless();
    let window = Component::window(&context, "Main", 400, 300);
    window.append_child(&Component::label(&context, "only")).expect("append");
    let extra = Component::button(&context, "extra");

    let err = window.append_child(&extra).expect_err("second child");
    assert!(matches!(err, Error::ChildSlotOccupied { kind: "window" }));
    assert!(extra.parent().is_none());
    assert_eq!(window.children().len(), 1);
}

#[test]
fn dialog_buttons_answer_then_close_the_dialog() {
    let (toolkit, context) = headless();
    let window = Component::window(&context, "Main", 400, 300);
    let dialog = Component::dialog(&context, "Delete file?");
    let log = Rc::new(std::cell::RefCell::new(Vec::new()));

    let per_button = Rc::clone(&log);
    let on_delete = move |response: i32| per_button.borrow_mut().push(format!("button {response}"));
    dialog.add_button("Delete", -8, Some(Rc::new(on_delete))).expect("button");
    let dialog_wide = Rc::clone(&log);
    dialog
        .set_response_handler(move |response| {
            dialog_wide.borrow_mut().push(format!("dialog {response}"))
        })
        .expect("handler");
    dialog
        .set_content(&Component::label(&context, "This cannot be undone."))
        .expect("content");
    window.append_child(&dialog).expect("append");
    window.mount().expect("mount");
    dialog.present().expect("present");

    let delete = toolkit.find_by_text("Delete").expect("button");
    toolkit.emit(delete, "clicked");
    assert_eq!(*log.borrow(), vec!["button -8", "dialog -8"]);
    assert!(!dialog.is_mounted());
    assert_eq!(context.pending_destroys(), 1);

    toolkit.run_idle();
    assert!(!toolkit.is_alive(delete));
    assert!(toolkit.find_by_text("This cannot be undone.").is_none());
    assert!(toolkit.criticals().is_empty(), "{:?}", toolkit.criticals());
}
