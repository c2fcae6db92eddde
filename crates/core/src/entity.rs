//! Entity storage consumed by the spatial engines.
//!
//! Entities are owned here and referenced everywhere else by [`EntityId`]. A
//! removed entity simply stops resolving, so stale ids held by targeting code
//! come back as "not found" rather than dangling.

use slotmap::SlotMap;

use crate::error::SpatialError;
use crate::types::{EntityId, EntityKind, Pos};

#[derive(Clone, Debug)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub kind: EntityKind,
    pub pos: Pos,
    pub alive: bool,
    pub blocked: bool,
    pub blocks_sight: bool,
}

impl Entity {
    pub fn creature(name: impl Into<String>, pos: Pos) -> Self {
        Self {
            id: EntityId::default(),
            name: name.into(),
            kind: EntityKind::Creature,
            pos,
            alive: true,
            blocked: true,
            blocks_sight: false,
        }
    }

    pub fn object(name: impl Into<String>, pos: Pos, blocked: bool) -> Self {
        Self {
            id: EntityId::default(),
            name: name.into(),
            kind: EntityKind::Object,
            pos,
            alive: true,
            blocked,
            blocks_sight: false,
        }
    }

    pub fn is_living_creature(&self) -> bool {
        self.kind == EntityKind::Creature && self.alive
    }

    /// Living creature that occupies its cell for movement and projectiles.
    pub fn is_blocking_creature(&self) -> bool {
        self.is_living_creature() && self.blocked
    }

    pub fn is_blocking_object(&self) -> bool {
        self.kind == EntityKind::Object && self.blocked
    }
}

#[derive(Clone, Debug, Default)]
pub struct Entities {
    inner: SlotMap<EntityId, Entity>,
}

impl Entities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity: Entity) -> EntityId {
        let id = self.inner.insert(entity);
        self.inner[id].id = id;
        id
    }

    pub fn spawn_creature(&mut self, name: impl Into<String>, pos: Pos) -> EntityId {
        self.insert(Entity::creature(name, pos))
    }

    pub fn spawn_object(&mut self, name: impl Into<String>, pos: Pos, blocked: bool) -> EntityId {
        self.insert(Entity::object(name, pos, blocked))
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.inner.get(id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.inner.get_mut(id)
    }

    /// Like [`Entities::get`], but a missing id is an [`SpatialError::IndexNotFound`].
    pub fn require(&self, id: EntityId) -> Result<&Entity, SpatialError> {
        self.inner.get(id).ok_or(SpatialError::IndexNotFound { id })
    }

    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.inner.remove(id)
    }

    pub fn kill(&mut self, id: EntityId) -> Result<(), SpatialError> {
        let entity = self.inner.get_mut(id).ok_or(SpatialError::IndexNotFound { id })?;
        entity.alive = false;
        Ok(())
    }

    pub fn move_to(&mut self, id: EntityId, pos: Pos) -> Result<(), SpatialError> {
        let entity = self.inner.get_mut(id).ok_or(SpatialError::IndexNotFound { id })?;
        entity.pos = pos;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// All entities in storage order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.inner.values()
    }

    pub fn living_creatures(&self) -> impl Iterator<Item = &Entity> {
        self.inner.values().filter(|e| e.is_living_creature())
    }

    pub fn blocking_creature_at(&self, pos: Pos) -> Option<EntityId> {
        self.inner.values().find(|e| e.pos == pos && e.is_blocking_creature()).map(|e| e.id)
    }

    pub fn blocking_object_at(&self, pos: Pos) -> Option<EntityId> {
        self.inner.values().find(|e| e.pos == pos && e.is_blocking_object()).map(|e| e.id)
    }

    /// True when a living blocking creature stands on `pos`.
    pub fn is_occupied(&self, pos: Pos) -> bool {
        self.blocking_creature_at(pos).is_some()
    }
}
