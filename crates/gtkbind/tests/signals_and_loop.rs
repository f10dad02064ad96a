use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use gtkbind::toolkit::{HeadlessToolkit, LoopExit, NativeCall};
use gtkbind::widgets::{Button, Clickable};
use gtkbind::{Component, Context, Error, LoopState};

fn headless() -> (Rc<HeadlessToolkit>, Context) {
    let toolkit = Rc::new(HeadlessToolkit::new());
    let context = Context::headless(toolkit.clone());
    (toolkit, context)
}

#[test]
fn reconnecting_replaces_the_handler() {
    let (toolkit, context) = headless();
    let button = Button::new(&context, "Go").expect("button");
    let first = Rc::new(Cell::new(0));
    let second = Rc::new(Cell::new(0));

    let counter = Rc::clone(&first);
    let old = button.on_click(move || counter.set(counter.get() + 1)).expect("first");
    let counter = Rc::clone(&second);
    let new = button.on_click(move || counter.set(counter.get() + 1)).expect("second");
    assert_ne!(old, new);

    let raw = toolkit.find_by_text("Go").expect("native button");
    assert_eq!(toolkit.handler_count(raw, "clicked"), 1);
    toolkit.emit(raw, "clicked");
    toolkit.emit(raw, "clicked");
    assert_eq!((first.get(), second.get()), (0, 2));
    assert_eq!(toolkit.released_tickets(), 1);
}

#[test]
fn destroy_disconnects_before_the_native_destroy() {
    let (toolkit, context) = headless();
    let button = Button::new(&context, "Go").expect("button");
    button.on_click(|| panic!("handler outlived its widget")).expect("connect");
    let raw = toolkit.find_by_text("Go").expect("native button");

    button.destroy();
    let calls = toolkit.calls();
    let disconnect = calls
        .iter()
        .rposition(|call| matches!(call, NativeCall::Disconnect { .. }))
        .expect("disconnect");
    let destroy = calls
        .iter()
        .position(|call| *call == NativeCall::Destroy(raw))
        .expect("destroy");
    assert!(disconnect < destroy);
    assert_eq!(toolkit.connected_handlers(), 0);
    assert!(matches!(button.on_click(|| {}), Err(Error::StaleResource { .. })));
}

#[test]
fn a_handler_can_destroy_its_own_component() {
    let (toolkit, context) = headless();
    let button = Component::button(&context, "Close");
    let weak = button.downgrade();
    button
        .set_click_handler(move || {
            if let Some(button) = weak.upgrade() {
                button.destroy();
            }
        })
        .expect("handler");
    button.mount().expect("mount");
    let raw = toolkit.find_by_text("Close").expect("native button");

    toolkit.emit(raw, "clicked");
    assert!(button.is_destroyed());
    assert!(toolkit.is_alive(raw));
    assert_eq!(context.pending_destroys(), 1);

    toolkit.run_idle();
    assert!(!toolkit.is_alive(raw));
    assert_eq!(toolkit.extra_refs(raw), 0);
    assert_eq!(context.live_resources(), 0);
    assert!(toolkit.criticals().is_empty(), "{:?}", toolkit.criticals());
}

#[test]
fn run_blocks_until_a_handler_quits() {
    let (toolkit, context) = headless();
    let window = Component::window(&context, "Main", 200, 100);
    let button = Component::button(&context, "Quit");
    let quitter = context.downgrade();
    button
        .set_click_handler(move || {
            if let Some(context) = quitter.upgrade() {
                context.quit();
            }
        })
        .expect("handler");
    window.append_child(&button).expect("append");
    window.mount().expect("mount");
    window.show();

    let observed = Rc::new(Cell::new(None));
    let state = Rc::clone(&observed);
    let inside = context.clone();
    toolkit.queue(move |toolkit| {
        state.set(Some(inside.loop_state()));
        let raw = toolkit.find_by_text("Quit").expect("native button");
        toolkit.emit(raw, "clicked");
    });
    context.run().expect("run");

    assert_eq!(observed.get(), Some(LoopState::Running));
    assert_eq!(context.loop_state(), LoopState::Idle);
    assert_eq!(toolkit.last_loop_exit(), Some(LoopExit::Quit));
    assert!(toolkit.transcript().ends_with("main\nmain_quit"));

    let settled = toolkit.calls().len();
    context.quit();
    assert_eq!(toolkit.calls().len(), settled);
}

#[test]
fn closing_the_root_window_quits_and_frees_everything() {
    let (toolkit, context) = headless();
    let window = Component::window(&context, "Main", 200, 100);
    window.append_child(&Component::label(&context, "Hello")).expect("append");
    window.mount().expect("mount");
    toolkit.queue(|toolkit| {
        let raw = toolkit.created("window")[0];
        toolkit.close_window(raw);
    });

    context.run().expect("run");
    assert_eq!(toolkit.last_loop_exit(), Some(LoopExit::Quit));
    assert!(!window.is_mounted());
    assert!(matches!(window.mount(), Err(Error::Destroyed)));
    assert_eq!(context.live_resources(), 0);
    window.destroy();
    assert!(toolkit.criticals().is_empty(), "{:?}", toolkit.criticals());
}

#[test]
fn a_window_can_opt_out_of_quitting() {
    let (toolkit, context) = headless();
    let window = Component::window(&context, "Palette", 200, 100);
    window.set_quit_on_destroy(false).expect("opt out");
    window.mount().expect("mount");
    toolkit.queue(|toolkit| {
        let raw = toolkit.created("window")[0];
        toolkit.close_window(raw);
    });

    context.run().expect("run");
    assert_eq!(toolkit.last_loop_exit(), Some(LoopExit::Drained));
}

#[test]
fn a_panicking_handler_stops_the_loop_and_resumes_in_run() {
    let (toolkit, context) = headless();
    let button = Button::new(&context, "Boom").expect("button");
    button.on_click(|| panic!("boom")).expect("connect");
    toolkit.queue(|toolkit| {
        let raw = toolkit.find_by_text("Boom").expect("native button");
        toolkit.emit(raw, "clicked");
    });

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| context.run()));
    let payload = outcome.expect_err("panic resumes");
    assert_eq!(payload.downcast_ref::<&str>(), Some(&"boom"));
    assert_eq!(context.loop_state(), LoopState::Idle);
    assert_eq!(toolkit.last_loop_exit(), Some(LoopExit::Quit));
}

#[test]
fn a_panic_outside_the_loop_stays_with_its_context() {
    let (toolkit, context) = headless();
    let button = Button::new(&context, "Boom").expect("button");
    button.on_click(|| panic!("early")).expect("connect");
    let raw = toolkit.find_by_text("Boom").expect("native button");
    toolkit.emit(raw, "clicked");
    assert_eq!(context.loop_state(), LoopState::Idle);

    let (other_toolkit, other) = headless();
    other_toolkit.queue(|_| {});
    other.run().expect("unrelated context runs cleanly");
    assert_eq!(other_toolkit.last_loop_exit(), Some(LoopExit::Drained));

    toolkit.clear_calls();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| context.run()));
    let payload = outcome.expect_err("pending panic resumes");
    assert_eq!(payload.downcast_ref::<&str>(), Some(&"early"));
    assert!(!toolkit.calls().contains(&NativeCall::Main));
    assert!(context.take_panic().is_none());
    context.run().expect("loop runs once the panic is handed back");
}

#[test]
fn take_panic_hands_back_a_payload_once() {
    let (toolkit, context) = headless();
    let button = Button::new(&context, "Boom").expect("button");
    button.on_click(|| panic!("taken")).expect("connect");
    toolkit.emit(toolkit.find_by_text("Boom").expect("native button"), "clicked");

    let payload = context.take_panic().expect("payload");
    assert_eq!(payload.downcast_ref::<&str>(), Some(&"taken"));
    assert!(context.take_panic().is_none());
    context.run().expect("nothing left to resume");
    assert_eq!(toolkit.last_loop_exit(), Some(LoopExit::Drained));
}
