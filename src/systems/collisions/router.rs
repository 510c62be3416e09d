use std::collections::BTreeSet;

use serde::Serialize;

use crate::core::Rng;
use crate::rigid_body::BodyId;
use crate::rigid_body_system::{Pair, PhysicsWorld};

use super::validator::Validator;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct HandlerId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollisionPhase {
    Start,
    Active,
    End,
}

/// What a handler callback may touch while a pair is dispatched
pub struct CollisionContext<'a> {
    pub world: &'a mut PhysicsWorld,
    /// Scene clock in milliseconds
    pub now_ms: f64,
    removals: &'a mut Vec<HandlerId>,
}

impl CollisionContext<'_> {
    /// Ask for a handler to be removed once the current phase is dispatched
    pub fn remove_handler(&mut self, id: HandlerId) {
        self.removals.push(id);
    }
}

/// Called with the pair in validator order (first-validator body first)
pub type CollisionCallback = Box<dyn FnMut(&mut CollisionContext<'_>, BodyId, BodyId)>;

pub struct CollisionHandler {
    pub first: Validator,
    pub second: Validator,
    on_start: Option<CollisionCallback>,
    on_active: Option<CollisionCallback>,
    on_end: Option<CollisionCallback>,
}

impl CollisionHandler {
    pub fn new(first: impl Into<Validator>, second: impl Into<Validator>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
            on_start: None,
            on_active: None,
            on_end: None,
        }
    }

    pub fn on_start<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut CollisionContext<'_>, BodyId, BodyId) + 'static,
    {
        self.on_start = Some(Box::new(f));
        self
    }

    pub fn on_active<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut CollisionContext<'_>, BodyId, BodyId) + 'static,
    {
        self.on_active = Some(Box::new(f));
        self
    }

    pub fn on_end<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut CollisionContext<'_>, BodyId, BodyId) + 'static,
    {
        self.on_end = Some(Box::new(f));
        self
    }

    fn callback(&mut self, phase: CollisionPhase) -> Option<&mut CollisionCallback> {
        match phase {
            CollisionPhase::Start => self.on_start.as_mut(),
            CollisionPhase::Active => self.on_active.as_mut(),
            CollisionPhase::End => self.on_end.as_mut(),
        }
    }

    /// Order `(a, b)` so the first body satisfies `first` and the second
    /// satisfies `second`. Tries `(a, b)` before `(b, a)`; `None` when
    /// neither orientation validates or a body no longer exists.
    pub fn validated_pair(&self, world: &PhysicsWorld, a: BodyId, b: BodyId) -> Option<(BodyId, BodyId)> {
        let (body_a, body_b) = (world.body(a)?, world.body(b)?);
        if self.first.matches(body_a, world) && self.second.matches(body_b, world) {
            Some((a, b))
        } else if self.first.matches(body_b, world) && self.second.matches(body_a, world) {
            Some((b, a))
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Removal {
    Removed,
    /// A live pair still matches; dropped at the next `after_update`
    Deferred,
    NotFound,
}

/// Validator-based pub/sub over the world's collision pairs
pub struct CollisionRouter {
    handlers: Vec<(HandlerId, CollisionHandler)>,
    marked_for_removal: BTreeSet<HandlerId>,
    rng: Rng,
    attached: bool,
}

impl CollisionRouter {
    pub fn new(seed: u32) -> Self {
        Self {
            handlers: Vec::new(),
            marked_for_removal: BTreeSet::new(),
            rng: Rng::new(seed),
            attached: true,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn contains(&self, id: HandlerId) -> bool {
        self.handlers.iter().any(|(h, _)| *h == id)
    }

    pub fn is_marked_for_removal(&self, id: HandlerId) -> bool {
        self.marked_for_removal.contains(&id)
    }

    /// Store `handler` under a fresh random id. Handlers are dispatched in
    /// registration order.
    pub fn add_collision_handler(&mut self, handler: CollisionHandler) -> HandlerId {
        let id = loop {
            let candidate = HandlerId(self.rng.next_u32());
            if !self.contains(candidate) {
                break candidate;
            }
        };
        self.handlers.push((id, handler));
        id
    }

    /// Remove now, or defer to the next drain when the handler matches a live pair
    pub fn remove_collision_handler(&mut self, id: HandlerId, world: &PhysicsWorld) -> Removal {
        let Some(idx) = self.handlers.iter().position(|(h, _)| *h == id) else {
            return Removal::NotFound;
        };
        let handler = &self.handlers[idx].1;
        let in_contact = world
            .pairs()
            .iter()
            .any(|pair| handler.validated_pair(world, pair.body_a, pair.body_b).is_some());

        if in_contact {
            self.marked_for_removal.insert(id);
            Removal::Deferred
        } else {
            self.handlers.remove(idx);
            Removal::Removed
        }
    }

    pub fn get_validated_pair(&self, id: HandlerId, world: &PhysicsWorld, a: BodyId, b: BodyId) -> Option<(BodyId, BodyId)> {
        let (_, handler) = self.handlers.iter().find(|(h, _)| *h == id)?;
        handler.validated_pair(world, a, b)
    }

    /// Offer every pair of `phase` to every handler not awaiting removal
    pub fn dispatch(&mut self, phase: CollisionPhase, pairs: &[Pair], world: &mut PhysicsWorld, now_ms: f64) {
        if !self.attached || pairs.is_empty() {
            return;
        }

        let mut removals = Vec::new();
        for pair in pairs {
            for (id, handler) in self.handlers.iter_mut() {
                if self.marked_for_removal.contains(id) {
                    continue;
                }
                let Some((first, second)) = handler.validated_pair(world, pair.body_a, pair.body_b) else {
                    continue;
                };
                if let Some(callback) = handler.callback(phase) {
                    let mut ctx = CollisionContext {
                        world: &mut *world,
                        now_ms,
                        removals: &mut removals,
                    };
                    callback(&mut ctx, first, second);
                }
            }
        }

        for id in removals {
            self.remove_collision_handler(id, world);
        }
    }

    /// Drain handlers whose removal was deferred. Runs once per step after all
    /// of the step's events went out.
    pub fn after_update(&mut self) {
        if self.marked_for_removal.is_empty() {
            return;
        }
        let marked = std::mem::take(&mut self.marked_for_removal);
        self.handlers.retain(|(id, _)| !marked.contains(id));
    }

    /// Drop all handlers and stop dispatching. Safe to call repeatedly.
    pub fn destroy(&mut self) {
        self.handlers.clear();
        self.marked_for_removal.clear();
        self.attached = false;
    }
}

impl Default for CollisionRouter {
    fn default() -> Self {
        Self::new(0x5eed_c011)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::core::Vec2;
    use crate::rigid_body::{BodyOptions, Shape};

    fn labelled(world: &mut PhysicsWorld, label: &str, x: f32) -> BodyId {
        world.create_dynamic_body(Vec2::new(x, 0.0), Shape::circle(5.0), BodyOptions::labelled(label))
    }

    #[test]
    fn validated_pair_is_orientation_normalized() {
        let mut world = PhysicsWorld::new(Vec2::zero());
        let a = labelled(&mut world, "a", 0.0);
        let b = labelled(&mut world, "b", 100.0);
        let c1 = labelled(&mut world, "c", 200.0);
        let c2 = labelled(&mut world, "c", 300.0);
        let handler = CollisionHandler::new("a", "b");

        assert_eq!(handler.validated_pair(&world, a, b), Some((a, b)));
        assert_eq!(handler.validated_pair(&world, b, a), Some((a, b)));
        assert_eq!(handler.validated_pair(&world, c1, c2), None);
    }

    #[test]
    fn dispatch_calls_matching_phase_in_validator_order() {
        let mut world = PhysicsWorld::new(Vec2::zero());
        let a = labelled(&mut world, "a", 0.0);
        let b = labelled(&mut world, "b", 1.0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();

        let mut router = CollisionRouter::default();
        router.add_collision_handler(
            CollisionHandler::new("a", "b").on_start(move |_, first, second| log.borrow_mut().push((first, second))),
        );

        router.dispatch(CollisionPhase::Start, &[Pair::new(b, a)], &mut world, 0.0);
        router.dispatch(CollisionPhase::End, &[Pair::new(a, b)], &mut world, 0.0);
        assert_eq!(*seen.borrow(), vec![(a, b)]);
    }

    #[test]
    fn removal_is_immediate_without_live_pairs() {
        let world = PhysicsWorld::new(Vec2::zero());
        let mut router = CollisionRouter::default();
        let id = router.add_collision_handler(CollisionHandler::new(true, true));
        assert_eq!(router.remove_collision_handler(id, &world), Removal::Removed);
        assert!(!router.contains(id));
        assert_eq!(router.remove_collision_handler(id, &world), Removal::NotFound);
    }

    #[test]
    fn removal_is_deferred_while_a_pair_matches() {
        let mut world = PhysicsWorld::new(Vec2::zero());
        let a = labelled(&mut world, "a", 0.0);
        let b = labelled(&mut world, "b", 4.0);
        world.step(1.0 / 60.0);
        assert!(world.is_touching(a, b));

        let mut router = CollisionRouter::default();
        let id = router.add_collision_handler(CollisionHandler::new("a", "b"));
        assert_eq!(router.remove_collision_handler(id, &world), Removal::Deferred);
        assert!(router.contains(id));
        router.after_update();
        assert!(!router.contains(id));
    }

    #[test]
    fn handler_awaiting_removal_gets_no_more_events() {
        let mut world = PhysicsWorld::new(Vec2::zero());
        let a = labelled(&mut world, "a", 0.0);
        let b = labelled(&mut world, "b", 4.0);
        world.step(1.0 / 60.0);
        let calls = Rc::new(RefCell::new(0));
        let counter = calls.clone();

        let mut router = CollisionRouter::default();
        let id = router.add_collision_handler(
            CollisionHandler::new("a", "b").on_active(move |_, _, _| *counter.borrow_mut() += 1),
        );
        router.dispatch(CollisionPhase::Active, &[Pair::new(a, b)], &mut world, 0.0);
        assert_eq!(*calls.borrow(), 1);

        assert_eq!(router.remove_collision_handler(id, &world), Removal::Deferred);
        router.dispatch(CollisionPhase::Active, &[Pair::new(a, b)], &mut world, 16.0);
        assert_eq!(*calls.borrow(), 1);
        router.after_update();
        assert!(!router.contains(id));
    }

    #[test]
    fn handler_can_remove_itself_during_dispatch() {
        let mut world = PhysicsWorld::new(Vec2::zero());
        let a = labelled(&mut world, "a", 0.0);
        let b = labelled(&mut world, "b", 100.0);
        let mut router = CollisionRouter::default();
        let own_id = Rc::new(RefCell::new(None));
        let slot = own_id.clone();
        let id = router.add_collision_handler(CollisionHandler::new("a", "b").on_start(move |ctx, _, _| {
            if let Some(id) = *slot.borrow() {
                ctx.remove_handler(id);
            }
        }));
        *own_id.borrow_mut() = Some(id);

        router.dispatch(CollisionPhase::Start, &[Pair::new(a, b)], &mut world, 0.0);
        assert!(!router.contains(id));
    }

    #[test]
    fn destroy_is_idempotent_and_detaches() {
        let mut world = PhysicsWorld::new(Vec2::zero());
        let a = labelled(&mut world, "a", 0.0);
        let b = labelled(&mut world, "b", 1.0);
        let calls = Rc::new(RefCell::new(0));
        let counter = calls.clone();
        let mut router = CollisionRouter::default();
        router.add_collision_handler(CollisionHandler::new(true, true).on_start(move |_, _, _| *counter.borrow_mut() += 1));

        router.destroy();
        router.destroy();
        assert!(router.is_empty());
        router.dispatch(CollisionPhase::Start, &[Pair::new(a, b)], &mut world, 0.0);
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn ids_are_unique() {
        let mut router = CollisionRouter::new(7);
        let ids: BTreeSet<HandlerId> = (0..64)
            .map(|_| router.add_collision_handler(CollisionHandler::new(true, true)))
            .collect();
        assert_eq!(ids.len(), 64);
    }
}
