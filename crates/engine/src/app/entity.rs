use super::loading::LoadDone;
use super::rendering::Surface;

/// Error type returned by entity and game-loop callbacks. The engine never
/// recovers from these; they abort the current tick and surface to the host.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

#[derive(Debug, Default)]
pub(crate) struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub(crate) fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_position(position: Vec2, width: f32, height: f32) -> Self {
        Self::new(position.x, position.y, width, height)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Strict overlap test: rectangles that only share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// Anything a layer can hold.
pub trait Entity {
    fn update(&mut self, elapsed_ms: f64, delta_time: f64) -> Result<(), CallbackError> {
        let _ = (elapsed_ms, delta_time);
        Ok(())
    }

    fn draw(&self, surface: &mut Surface) -> Result<(), CallbackError>;

    /// Loads any assets the entity needs. `done` must be called exactly once.
    fn load(&mut self, done: LoadDone) {
        done();
    }

    fn debug_name(&self) -> &str {
        "entity"
    }
}

/// Entity capability for overlap testing and reacting to overlap.
///
/// The pair test is allowed to be asymmetric: the engine asks every ordered
/// pair independently and never assumes `a.collides_with(b) == b.collides_with(a)`.
pub trait Collidable: Entity {
    fn bounds(&self) -> Rect;

    fn collides_with(&self, other: &dyn Collidable) -> bool {
        self.bounds().intersects(&other.bounds())
    }

    fn on_collide(&mut self, other: &dyn Collidable) -> Result<(), CallbackError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocator_never_reuses_ids() {
        let mut allocator = EntityIdAllocator::default();
        let first = allocator.allocate();
        let second = allocator.allocate();
        let third = allocator.allocate();

        assert_eq!(first, EntityId(0));
        assert_eq!(second, EntityId(1));
        assert_eq!(third, EntityId(2));
    }

    #[test]
    fn overlapping_rects_intersect_both_ways() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);

        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn touching_edges_do_not_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let right = Rect::new(10.0, 0.0, 10.0, 10.0);
        let below = Rect::new(0.0, 10.0, 10.0, 10.0);

        assert!(!a.intersects(&right));
        assert!(!a.intersects(&below));
    }

    #[test]
    fn contained_rect_intersects() {
        let outer = Rect::new(0.0, 0.0, 100.0, 100.0);
        let inner = Rect::from_position(Vec2::new(40.0, 40.0), 2.0, 2.0);

        assert!(outer.intersects(&inner));
        assert!(inner.intersects(&outer));
    }
}
