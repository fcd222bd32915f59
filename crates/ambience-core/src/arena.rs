//! Slot arena holding live actors.
//!
//! Actors live in a `Vec` of slots; a removed actor's slot goes on a free
//! list and is reused by the next insert with its generation bumped, so a
//! stale [`ActorHandle`] can never reach the new occupant. Iteration visits
//! occupied slots in index order.

use std::collections::BTreeMap;

use ambience_types::ActorId;

use crate::actor::Actor;

/// Generation-checked reference to an arena slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActorHandle {
    index: usize,
    generation: u32,
}

impl ActorHandle {
    /// Slot index.
    pub const fn index(self) -> usize {
        self.index
    }

    /// Slot generation at the time the handle was issued.
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    actor: Option<Actor>,
}

/// Slot storage plus an id index.
#[derive(Debug, Default)]
pub struct ActorArena {
    slots: Vec<Slot>,
    free: Vec<usize>,
    by_id: BTreeMap<ActorId, ActorHandle>,
}

impl ActorArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an actor, reusing a free slot when one exists.
    ///
    /// The caller checks for duplicate ids first; inserting an id twice
    /// orphans the older slot's index entry.
    pub fn insert(&mut self, actor: Actor) -> ActorHandle {
        let id = actor.id();
        let reusable = self
            .free
            .pop()
            .and_then(|index| self.slots.get_mut(index).map(|slot| (index, slot)));
        let handle = if let Some((index, slot)) = reusable {
            slot.generation = slot.generation.wrapping_add(1);
            slot.actor = Some(actor);
            ActorHandle {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len();
            self.slots.push(Slot {
                generation: 0,
                actor: Some(actor),
            });
            ActorHandle {
                index,
                generation: 0,
            }
        };
        self.by_id.insert(id, handle);
        handle
    }

    /// Handle for an id, if the actor is live.
    pub fn handle(&self, id: ActorId) -> Option<ActorHandle> {
        self.by_id.get(&id).copied()
    }

    /// Whether an actor with this id is live.
    pub fn contains(&self, id: ActorId) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Actor behind a handle, `None` if the handle is stale.
    pub fn get(&self, handle: ActorHandle) -> Option<&Actor> {
        self.slots
            .get(handle.index)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.actor.as_ref())
    }

    /// Mutable actor behind a handle, `None` if the handle is stale.
    pub fn get_mut(&mut self, handle: ActorHandle) -> Option<&mut Actor> {
        self.slots
            .get_mut(handle.index)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.actor.as_mut())
    }

    /// Remove the actor with this id and free its slot.
    pub fn remove(&mut self, id: ActorId) -> Option<Actor> {
        let handle = self.by_id.remove(&id)?;
        let slot = self.slots.get_mut(handle.index)?;
        let actor = slot.actor.take();
        if actor.is_some() {
            self.free.push(handle.index);
        }
        actor
    }

    /// Drop every actor. Slots are kept for reuse.
    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.actor.take().is_some() {
                self.free.push(index);
            }
        }
        self.by_id.clear();
    }

    /// Number of live actors.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether no actor is live.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Live actors in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Actor> {
        self.slots.iter().filter_map(|slot| slot.actor.as_ref())
    }

    /// Mutable live actors in slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Actor> {
        self.slots.iter_mut().filter_map(|slot| slot.actor.as_mut())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::stub::StubAccessor;

    fn actor(id: ActorId) -> Actor {
        Actor::new(id, Box::new(StubAccessor::new()), &EngineConfig::default())
    }

    #[test]
    fn insert_and_lookup() {
        let mut arena = ActorArena::new();
        let id = ActorId::new();
        let handle = arena.insert(actor(id));
        assert_eq!(arena.handle(id), Some(handle));
        assert_eq!(arena.get(handle).unwrap().id(), id);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn stale_handle_misses_reused_slot() {
        let mut arena = ActorArena::new();
        let first = ActorId::new();
        let old = arena.insert(actor(first));
        arena.remove(first).unwrap();

        let second = ActorId::new();
        let new = arena.insert(actor(second));
        assert_eq!(old.index(), new.index());
        assert_ne!(old.generation(), new.generation());
        assert!(arena.get(old).is_none());
        assert_eq!(arena.get(new).unwrap().id(), second);
    }

    #[test]
    fn iteration_follows_slot_order() {
        let mut arena = ActorArena::new();
        let ids: Vec<ActorId> = (0..3).map(|_| ActorId::new()).collect();
        for id in &ids {
            arena.insert(actor(*id));
        }
        arena.remove(ids[1]).unwrap();
        let seen: Vec<ActorId> = arena.iter().map(Actor::id).collect();
        assert_eq!(seen, vec![ids[0], ids[2]]);
    }

    #[test]
    fn clear_frees_every_slot() {
        let mut arena = ActorArena::new();
        for _ in 0..4 {
            arena.insert(actor(ActorId::new()));
        }
        arena.clear();
        assert!(arena.is_empty());
        assert_eq!(arena.iter().count(), 0);
        let handle = arena.insert(actor(ActorId::new()));
        assert!(handle.index() < 4);
    }

    #[test]
    fn removing_unknown_id_is_none() {
        let mut arena = ActorArena::new();
        assert!(arena.remove(ActorId::new()).is_none());
    }
}
