use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::toolkit::RawHandle;
use crate::trampoline::{Propagation, SignalArgs, Signature, TrampolineId};

/// Generation-checked index into the resource arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId {
    index: u32,
    generation: u32,
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Window,
    Box,
    Grid,
    Button,
    Label,
    Entry,
    Dialog,
    /// A dialog's content area. Owned and destroyed by its dialog.
    ContentArea,
    Menu,
    MenuItem,
    StyleProvider,
}

impl ResourceKind {
    pub fn name(self) -> &'static str {
        match self {
            ResourceKind::Window => "window",
            ResourceKind::Box => "box",
            ResourceKind::Grid => "grid",
            ResourceKind::Button => "button",
            ResourceKind::Label => "label",
            ResourceKind::Entry => "entry",
            ResourceKind::Dialog => "dialog",
            ResourceKind::ContentArea => "dialog content area",
            ResourceKind::Menu => "menu",
            ResourceKind::MenuItem => "menu item",
            ResourceKind::StyleProvider => "style provider",
        }
    }

    pub fn is_widget(self) -> bool {
        !matches!(self, ResourceKind::StyleProvider)
    }

    /// Whether destroying the handle issues a native destroy or unref.
    pub(crate) fn owns_native(self) -> bool {
        !matches!(self, ResourceKind::ContentArea)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub(crate) type SignalHandler = Rc<dyn Fn(&SignalArgs<'_>) -> Propagation>;

pub(crate) struct SignalBinding {
    pub(crate) trampoline: TrampolineId,
    pub(crate) native_id: u64,
    pub(crate) signature: Signature,
    pub(crate) handler: SignalHandler,
}

/// Internal `destroy` handler that frees the slot when the toolkit destroys the object on its
/// own, for instance when a parent container goes away.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DestroyWatch {
    pub(crate) trampoline: TrampolineId,
    pub(crate) native_id: u64,
}

pub(crate) struct Entry {
    pub(crate) raw: RawHandle,
    pub(crate) kind: ResourceKind,
    pub(crate) bindings: FxHashMap<String, SignalBinding>,
    pub(crate) watch: Option<DestroyWatch>,
    /// Occupant of a single-child container slot.
    pub(crate) child: Option<ResourceId>,
    /// A reference taken when the widget was detached from its container.
    pub(crate) held_ref: bool,
}

struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

#[derive(Default)]
pub(crate) struct ResourceArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl ResourceArena {
    pub(crate) fn insert(&mut self, raw: RawHandle, kind: ResourceKind) -> ResourceId {
        let entry = Entry {
            raw,
            kind,
            bindings: FxHashMap::default(),
            watch: None,
            child: None,
            held_ref: false,
        };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            return ResourceId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            entry: Some(entry),
        });
        ResourceId {
            index,
            generation: 0,
        }
    }

    pub(crate) fn get(&self, id: ResourceId) -> Option<&Entry> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: ResourceId) -> Option<&mut Entry> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_mut())
    }

    /// Frees the slot. The id, and every copy of it, is stale afterwards.
    pub(crate) fn remove(&mut self, id: ResourceId) -> Option<Entry> {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)?;
        let entry = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(entry)
    }

    pub(crate) fn live(&self) -> usize {
        self.slots.iter().filter(|slot| slot.entry.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use std::os::raw::c_void;

    use super::*;

    fn raw(address: usize) -> RawHandle {
        RawHandle::from_ptr(address as *mut c_void).expect("non-null")
    }

    #[test]
    fn removed_ids_go_stale() {
        let mut arena = ResourceArena::default();
        let id = arena.insert(raw(0x10), ResourceKind::Button);
        assert!(arena.get(id).is_some());
        assert!(arena.remove(id).is_some());
        assert!(arena.get(id).is_none());
        assert!(arena.remove(id).is_none());
    }

    #[test]
    fn reused_slot_gets_a_new_generation() {
        let mut arena = ResourceArena::default();
        let first = arena.insert(raw(0x10), ResourceKind::Label);
        arena.remove(first);
        let second = arena.insert(raw(0x20), ResourceKind::Label);
        assert_ne!(first, second);
        assert!(arena.get(first).is_none());
        assert_eq!(arena.get(second).map(|entry| entry.raw), Some(raw(0x20)));
        assert_eq!(arena.live(), 1);
    }
}
