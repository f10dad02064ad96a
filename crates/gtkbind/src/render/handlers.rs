use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

/// What a named handler is told about the event that triggered it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Event {
    /// `id` of the node whose widget emitted the event.
    pub source: Option<String>,
    pub signal: &'static str,
    /// Entry text after a change.
    pub text: Option<String>,
    /// Response code of a dialog button.
    pub response: Option<i32>,
}

pub type EventHandler = Rc<dyn Fn(&Event)>;

/// Handlers a UI definition refers to by name.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: FxHashMap<String, EventHandler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `name`, replacing any earlier one. Returns whether a
    /// handler was replaced.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: impl Fn(&Event) + 'static,
    ) -> bool {
        self.handlers.insert(name.into(), Rc::new(handler)).is_some()
    }

    pub fn get(&self, name: &str) -> Option<EventHandler> {
        self.handlers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("HandlerRegistry").field("names", &names).finish()
    }
}
