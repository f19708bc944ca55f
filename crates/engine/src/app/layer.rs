use super::entity::{CallbackError, Collidable, Entity, EntityId, EntityIdAllocator};
use super::loading::{LoadCounter, LoadDone};
use super::rendering::Surface;

enum Slot {
    Plain(Box<dyn Entity>),
    Collidable(Box<dyn Collidable>),
}

impl Slot {
    fn update(&mut self, elapsed_ms: f64, delta_time: f64) -> Result<(), CallbackError> {
        match self {
            Slot::Plain(entity) => entity.update(elapsed_ms, delta_time),
            Slot::Collidable(entity) => entity.update(elapsed_ms, delta_time),
        }
    }

    fn draw(&self, surface: &mut Surface) -> Result<(), CallbackError> {
        match self {
            Slot::Plain(entity) => entity.draw(surface),
            Slot::Collidable(entity) => entity.draw(surface),
        }
    }

    fn load(&mut self, done: LoadDone) {
        match self {
            Slot::Plain(entity) => entity.load(done),
            Slot::Collidable(entity) => entity.load(done),
        }
    }
}

struct Member {
    id: EntityId,
    slot: Slot,
}

/// Named, ordered container of entities.
///
/// Entities update and draw in insertion order. Entities added through
/// [`Layer::add_collidable`] also join the layer's collidable subset, which the
/// collision scan reads in insertion order; membership only changes through
/// `add_*` and `remove`.
pub struct Layer {
    name: String,
    pub z_index: i32,
    pub visible: bool,
    members: Vec<Member>,
    collidables: Vec<usize>,
    allocator: EntityIdAllocator,
}

impl Layer {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            z_index: 0,
            visible: true,
            members: Vec::new(),
            collidables: Vec::new(),
            allocator: EntityIdAllocator::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_entity<E: Entity + 'static>(&mut self, entity: E) -> EntityId {
        self.push(Slot::Plain(Box::new(entity)))
    }

    pub fn add_collidable<C: Collidable + 'static>(&mut self, entity: C) -> EntityId {
        let index = self.members.len();
        let id = self.push(Slot::Collidable(Box::new(entity)));
        self.collidables.push(index);
        id
    }

    fn push(&mut self, slot: Slot) -> EntityId {
        let id = self.allocator.allocate();
        self.members.push(Member { id, slot });
        id
    }

    pub fn remove(&mut self, id: EntityId) -> bool {
        let Some(index) = self.members.iter().position(|member| member.id == id) else {
            return false;
        };
        self.members.remove(index);
        self.rebuild_collidables();
        true
    }

    fn rebuild_collidables(&mut self) {
        self.collidables.clear();
        for (index, member) in self.members.iter().enumerate() {
            if matches!(member.slot, Slot::Collidable(_)) {
                self.collidables.push(index);
            }
        }
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.members.iter().any(|member| member.id == id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn collidable_count(&self) -> usize {
        self.collidables.len()
    }

    pub fn entity_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.members.iter().map(|member| member.id)
    }

    pub fn update(&mut self, elapsed_ms: f64, delta_time: f64) -> Result<(), CallbackError> {
        for member in &mut self.members {
            member.slot.update(elapsed_ms, delta_time)?;
        }
        Ok(())
    }

    pub fn draw(&self, surface: &mut Surface) -> Result<(), CallbackError> {
        if !self.visible {
            return Ok(());
        }
        for member in &self.members {
            member.slot.draw(surface)?;
        }
        Ok(())
    }

    /// Loads every entity and calls `done` once all of them have finished.
    pub fn load(&mut self, done: LoadDone) {
        let counter = LoadCounter::new(self.members.len(), done);
        for member in &mut self.members {
            member.slot.load(counter.completion());
        }
    }

    pub(crate) fn collidable(&self, index: usize) -> Option<&dyn Collidable> {
        let member = self.members.get(*self.collidables.get(index)?)?;
        match &member.slot {
            Slot::Collidable(entity) => Some(entity.as_ref()),
            Slot::Plain(_) => None,
        }
    }

    pub(crate) fn collidable_mut(&mut self, index: usize) -> Option<&mut dyn Collidable> {
        let member = self.members.get_mut(*self.collidables.get(index)?)?;
        match &mut member.slot {
            Slot::Collidable(entity) => Some(entity.as_mut()),
            Slot::Plain(_) => None,
        }
    }

    /// Mutable access to collidable `source` alongside shared access to a
    /// different collidable `target` of the same layer.
    pub(crate) fn collidable_pair(
        &mut self,
        source: usize,
        target: usize,
    ) -> Option<(&mut dyn Collidable, &dyn Collidable)> {
        let source_index = *self.collidables.get(source)?;
        let target_index = *self.collidables.get(target)?;
        let (source_member, target_member) =
            split_pair(&mut self.members, source_index, target_index)?;
        match (&mut source_member.slot, &target_member.slot) {
            (Slot::Collidable(source), Slot::Collidable(target)) => {
                Some((source.as_mut(), target.as_ref()))
            }
            _ => None,
        }
    }
}

impl std::fmt::Debug for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Layer")
            .field("name", &self.name)
            .field("z_index", &self.z_index)
            .field("visible", &self.visible)
            .field("entities", &self.members.len())
            .field("collidables", &self.collidables.len())
            .finish()
    }
}

/// `(&mut items[first], &items[second])` for two distinct indices.
pub(crate) fn split_pair<T>(items: &mut [T], first: usize, second: usize) -> Option<(&mut T, &T)> {
    if first == second || first >= items.len() || second >= items.len() {
        return None;
    }
    if first < second {
        let (head, tail) = items.split_at_mut(second);
        Some((&mut head[first], &tail[0]))
    } else {
        let (head, tail) = items.split_at_mut(first);
        Some((&mut tail[0], &head[second]))
    }
}
