//! Object identity.
//!
//! Every pattern object owns an [`ObjectId`], which registers an integer id in
//! the process-wide [`IdRegistry`] on construction and frees it on drop. Freed
//! ids are reused (smallest first), but each slot carries a generation that is
//! bumped on release, so a [`Handle`] taken before the release never resolves
//! to whatever object reuses the id later.

use std::collections::{BTreeMap, BTreeSet};

use parking_lot::Mutex;
use tracing::warn;

use crate::model::ObjectType;

/// Generation-checked reference to a registered id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle {
    id: u32,
    generation: u32,
}

const DETACHED_GENERATION: u32 = u32::MAX;

impl Handle {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// A handle for `id` that never resolves.
    pub fn detached(id: u32) -> Handle {
        Handle {
            id,
            generation: DETACHED_GENERATION,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Slot {
    generation: u32,
    kind: Option<ObjectType>,
}

/// Id allocator with free-list reuse. Id 0 is reserved and never handed out.
///
/// Slots are sparse: only ids that were ever claimed have one, so honouring a
/// large requested id costs the same as a small one.
#[derive(Debug)]
pub struct IdRegistry {
    slots: BTreeMap<u32, Slot>,
    free: BTreeSet<u32>, // released ids, never live
    next: u32,           // no id at or above this was handed out in order
    live: usize,
}

impl Default for IdRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl IdRegistry {
    pub const fn new() -> Self {
        IdRegistry {
            slots: BTreeMap::new(),
            free: BTreeSet::new(),
            next: 1,
            live: 0,
        }
    }

    /// Register an object of `kind`. A requested id is honoured when it is not
    /// live; otherwise (and for `None`/`Some(0)`) the smallest free id is used.
    pub fn acquire(&mut self, requested: Option<u32>, kind: ObjectType) -> Handle {
        if let Some(id) = requested.filter(|&id| id != 0) {
            if !self.is_live(id) {
                return self.claim(id, kind);
            }
            warn!(id, %kind, "requested id is already live, assigning a fresh one");
        }
        let id = self.smallest_free();
        self.claim(id, kind)
    }

    /// Free the id behind `handle`. Stale handles are ignored.
    pub fn release(&mut self, handle: Handle) -> bool {
        let Some(slot) = self.slots.get_mut(&handle.id) else {
            return false;
        };
        if slot.kind.is_none() || slot.generation != handle.generation {
            return false;
        }
        slot.kind = None;
        slot.generation = (slot.generation + 1) % DETACHED_GENERATION;
        self.free.insert(handle.id);
        self.live -= 1;
        true
    }

    /// Current handle of a live id.
    pub fn lookup(&self, id: u32) -> Option<Handle> {
        let slot = self.slots.get(&id)?;
        slot.kind.map(|_| Handle {
            id,
            generation: slot.generation,
        })
    }

    /// Kind of the object behind `handle`, or `None` once that object is gone.
    pub fn resolve(&self, handle: Handle) -> Option<ObjectType> {
        let slot = self.slots.get(&handle.id)?;
        if slot.generation == handle.generation {
            slot.kind
        } else {
            None
        }
    }

    pub fn kind_of(&self, id: u32) -> Option<ObjectType> {
        self.slots.get(&id).and_then(|s| s.kind)
    }

    pub fn is_live(&self, id: u32) -> bool {
        self.kind_of(id).is_some()
    }

    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Smallest id that is not live: the lowest released id, or the first id
    /// at or above `next` that no requested id has taken.
    fn smallest_free(&mut self) -> u32 {
        while self.is_live(self.next) {
            match self.next.checked_add(1) {
                Some(n) => self.next = n,
                None => break,
            }
        }
        match self.free.first() {
            Some(&id) if id < self.next => id,
            _ => self.next,
        }
    }

    fn claim(&mut self, id: u32, kind: ObjectType) -> Handle {
        self.free.remove(&id);
        let slot = self.slots.entry(id).or_default();
        slot.kind = Some(kind);
        self.live += 1;
        Handle {
            id,
            generation: slot.generation,
        }
    }
}

static REGISTRY: Mutex<IdRegistry> = parking_lot::const_mutex(IdRegistry::new());

pub fn lookup(id: u32) -> Option<Handle> {
    REGISTRY.lock().lookup(id)
}

pub fn resolve(handle: Handle) -> Option<ObjectType> {
    REGISTRY.lock().resolve(handle)
}

pub fn kind_of(id: u32) -> Option<ObjectType> {
    REGISTRY.lock().kind_of(id)
}

pub fn is_live(id: u32) -> bool {
    REGISTRY.lock().is_live(id)
}

pub fn live_count() -> usize {
    REGISTRY.lock().live_count()
}

/// Owner of one registered id. Cloning registers a fresh id of the same kind,
/// so clones are never aliases of their source.
#[derive(Debug)]
pub struct ObjectId {
    handle: Handle,
    kind: ObjectType,
}

impl ObjectId {
    pub fn new(kind: ObjectType) -> Self {
        Self::acquire(None, kind)
    }

    /// Register under `id` if it is free (see [`IdRegistry::acquire`]).
    pub fn with_id(id: u32, kind: ObjectType) -> Self {
        Self::acquire(Some(id), kind)
    }

    fn acquire(requested: Option<u32>, kind: ObjectType) -> Self {
        let handle = REGISTRY.lock().acquire(requested, kind);
        ObjectId { handle, kind }
    }

    pub fn get(&self) -> u32 {
        self.handle.id
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn kind(&self) -> ObjectType {
        self.kind
    }
}

impl Clone for ObjectId {
    fn clone(&self) -> Self {
        ObjectId::new(self.kind)
    }
}

impl Drop for ObjectId {
    fn drop(&mut self) {
        REGISTRY.lock().release(self.handle);
    }
}
