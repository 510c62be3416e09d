use std::collections::HashSet;

use crate::core::Vec2;
use crate::rigid_body::{Body, BodyId, BodyOptions, Shape};

use super::collision::{collide, Contact};
use super::constraint::{Constraint, ConstraintId, ConstraintSpec};

/// Speed cap (px/s) to keep per-step cost bounded and avoid tunneling
const MAX_SPEED: f32 = 2400.0;
/// Share of the penetration corrected per step
const POSITION_CORRECTION: f32 = 0.8;
/// Penetration allowed before correcting, avoids jitter on resting contacts
const PENETRATION_SLOP: f32 = 0.05;

/// Unordered body pair; `body_a` always holds the lower id
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pair {
    pub body_a: BodyId,
    pub body_b: BodyId,
}

impl Pair {
    pub fn new(a: BodyId, b: BodyId) -> Self {
        if a <= b {
            Self { body_a: a, body_b: b }
        } else {
            Self { body_a: b, body_b: a }
        }
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.body_a == id || self.body_b == id
    }
}

/// Pairs that began, continued or stopped touching during one step
#[derive(Clone, Debug, Default)]
pub struct StepEvents {
    pub start: Vec<Pair>,
    pub active: Vec<Pair>,
    pub end: Vec<Pair>,
}

/// Manages all rigid bodies and constraints in the scene
pub struct PhysicsWorld {
    bodies: Vec<Body>,
    constraints: Vec<Constraint>,
    next_body_id: u32,
    next_constraint_id: u32,
    gravity: Vec2,
    /// Live pairs after the last step, sorted
    pairs: Vec<Pair>,
}

impl PhysicsWorld {
    pub fn new(gravity: Vec2) -> Self {
        Self {
            bodies: Vec::new(),
            constraints: Vec::new(),
            next_body_id: 1,
            next_constraint_id: 1,
            gravity,
            pairs: Vec::new(),
        }
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    pub fn create_static_body(&mut self, position: Vec2, shape: Shape, opts: BodyOptions) -> BodyId {
        self.insert_body(position, shape, true, opts)
    }

    pub fn create_dynamic_body(&mut self, position: Vec2, shape: Shape, opts: BodyOptions) -> BodyId {
        self.insert_body(position, shape, false, opts)
    }

    fn insert_body(&mut self, position: Vec2, shape: Shape, is_static: bool, opts: BodyOptions) -> BodyId {
        let id = BodyId(self.next_body_id);
        self.next_body_id = self.next_body_id.saturating_add(1);
        self.bodies.push(Body::new(id, position, shape, is_static, opts));
        id
    }

    /// Remove a body, its constraints and its live pairs. No `end` event is emitted.
    pub fn remove_body(&mut self, id: BodyId) -> Option<Body> {
        let idx = self.bodies.iter().position(|b| b.id == id)?;
        // keep insertion order, point queries depend on it
        let body = self.bodies.remove(idx);
        self.constraints.retain(|c| !c.involves(id));
        self.pairs.retain(|p| !p.contains(id));
        Some(body)
    }

    /// Remove everything (used when the scene is torn down)
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.constraints.clear();
        self.pairs.clear();
        self.next_body_id = 1;
        self.next_constraint_id = 1;
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id == id)
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.iter_mut().find(|b| b.id == id)
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.body(id).is_some()
    }

    /// Bodies in insertion order
    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Compound root of a body (the body itself when it has no parent)
    pub fn root_of(&self, id: BodyId) -> BodyId {
        self.body(id).and_then(|b| b.parent).unwrap_or(id)
    }

    pub fn set_position(&mut self, id: BodyId, position: Vec2) -> bool {
        match self.body_mut(id) {
            Some(body) => {
                body.position = position;
                true
            }
            None => false,
        }
    }

    pub fn set_angle(&mut self, id: BodyId, angle: f32) -> bool {
        match self.body_mut(id) {
            Some(body) => {
                body.angle = angle;
                true
            }
            None => false,
        }
    }

    pub fn set_velocity(&mut self, id: BodyId, velocity: Vec2) -> bool {
        match self.body_mut(id) {
            Some(body) if !body.is_static => {
                body.velocity = velocity;
                true
            }
            _ => false,
        }
    }

    /// Bodies whose outline contains `point`, in insertion order
    pub fn intersect_point(&self, point: Vec2) -> Vec<BodyId> {
        self.bodies
            .iter()
            .filter(|b| b.contains_point(point))
            .map(|b| b.id)
            .collect()
    }

    pub fn add_constraint(&mut self, spec: ConstraintSpec) -> ConstraintId {
        let id = ConstraintId(self.next_constraint_id);
        self.next_constraint_id = self.next_constraint_id.saturating_add(1);
        self.constraints.push(Constraint {
            id,
            body_a: spec.body_a,
            point_a: spec.point_a,
            body_b: spec.body_b,
            point_b: spec.point_b,
            length: spec.length.max(0.0),
            stiffness: spec.stiffness.clamp(0.0, 1.0),
        });
        id
    }

    pub fn remove_constraint(&mut self, id: ConstraintId) -> bool {
        let before = self.constraints.len();
        self.constraints.retain(|c| c.id != id);
        self.constraints.len() != before
    }

    pub fn constraint_mut(&mut self, id: ConstraintId) -> Option<&mut Constraint> {
        self.constraints.iter_mut().find(|c| c.id == id)
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn has_constraint_on(&self, body: BodyId) -> bool {
        self.constraints.iter().any(|c| c.involves(body))
    }

    /// Live pairs as of the last step
    pub fn pairs(&self) -> &[Pair] {
        &self.pairs
    }

    pub fn is_touching(&self, a: BodyId, b: BodyId) -> bool {
        self.pairs.binary_search(&Pair::new(a, b)).is_ok()
    }

    /// Advance by `dt` seconds and report pair transitions
    pub fn step(&mut self, dt: f32) -> StepEvents {
        if dt <= 0.0 || !dt.is_finite() {
            return StepEvents::default();
        }

        self.integrate_velocities(dt);
        self.solve_constraints(dt);
        self.integrate_positions(dt);

        let contacts = self.detect();
        self.resolve(&contacts);

        let mut current: Vec<Pair> = contacts.iter().map(|(pair, _)| *pair).collect();
        current.sort();
        current.dedup();

        let previous: HashSet<Pair> = self.pairs.iter().copied().collect();
        let now: HashSet<Pair> = current.iter().copied().collect();

        let mut events = StepEvents::default();
        for pair in &current {
            if previous.contains(pair) {
                events.active.push(*pair);
            } else {
                events.start.push(*pair);
            }
        }
        for pair in &self.pairs {
            if !now.contains(pair) {
                events.end.push(*pair);
            }
        }

        self.pairs = current;
        events
    }

    fn integrate_velocities(&mut self, dt: f32) {
        let gravity = self.gravity;
        for body in self.bodies.iter_mut().filter(|b| !b.is_static) {
            body.velocity += gravity * dt;
            let damping = (1.0 - body.friction_air).clamp(0.0, 1.0);
            body.velocity = body.velocity * damping;
            body.angular_velocity *= damping;

            let speed = body.velocity.length();
            if speed > MAX_SPEED {
                body.velocity = body.velocity * (MAX_SPEED / speed);
            }
        }
    }

    fn solve_constraints(&mut self, dt: f32) {
        for i in 0..self.constraints.len() {
            let c = self.constraints[i].clone();
            let Some(b) = self.index_of(c.body_b) else {
                continue;
            };
            let (anchor, pulled_a) = match c.body_a {
                Some(id) => {
                    let Some(a) = self.index_of(id) else {
                        continue;
                    };
                    let body_a = &self.bodies[a];
                    let arm = c.point_a.rotate(body_a.angle);
                    (body_a.position + arm, (!body_a.is_static).then_some((a, arm)))
                }
                None => (c.point_a, None),
            };

            let body_b = &self.bodies[b];
            let moves_b = !body_b.is_static;
            if !moves_b && pulled_a.is_none() {
                continue;
            }

            let arm_b = c.point_b.rotate(body_b.angle);
            let delta = anchor - (body_b.position + arm_b);
            let dist = delta.length();
            if dist <= c.length || dist < 1e-4 {
                continue;
            }

            let share = if moves_b && pulled_a.is_some() { 0.5 } else { 1.0 };
            let correction = delta * ((dist - c.length) / dist * c.stiffness * share);
            if moves_b {
                pull(&mut self.bodies[b], arm_b, correction, c.stiffness, dt);
            }
            if let Some((a, arm_a)) = pulled_a {
                pull(&mut self.bodies[a], arm_a, -correction, c.stiffness, dt);
            }
        }
    }

    fn integrate_positions(&mut self, dt: f32) {
        for body in self.bodies.iter_mut().filter(|b| !b.is_static) {
            body.position += body.velocity * dt;
            body.angle += body.angular_velocity * dt;
        }
    }

    fn detect(&self) -> Vec<(Pair, Contact)> {
        let mut contacts = Vec::new();
        for (i, a) in self.bodies.iter().enumerate() {
            for b in self.bodies.iter().skip(i + 1) {
                if a.is_static && b.is_static {
                    continue;
                }
                // parts of one compound never collide with each other
                if a.parent == Some(b.id) || b.parent == Some(a.id) || (a.parent.is_some() && a.parent == b.parent) {
                    continue;
                }
                if let Some(contact) = collide(a, b) {
                    let pair = Pair::new(a.id, b.id);
                    // normal must point from pair.body_a to pair.body_b
                    let contact = if pair.body_a == a.id {
                        contact
                    } else {
                        Contact {
                            normal: -contact.normal,
                            depth: contact.depth,
                        }
                    };
                    contacts.push((pair, contact));
                }
            }
        }
        contacts
    }

    fn resolve(&mut self, contacts: &[(Pair, Contact)]) {
        for (pair, contact) in contacts {
            let (Some(ia), Some(ib)) = (self.index_of(pair.body_a), self.index_of(pair.body_b)) else {
                continue;
            };
            let (a, b) = (&self.bodies[ia], &self.bodies[ib]);
            if a.is_sensor || b.is_sensor {
                continue;
            }

            let inv_a = a.inverse_mass();
            let inv_b = b.inverse_mass();
            let inv_sum = inv_a + inv_b;
            if inv_sum <= 0.0 {
                continue;
            }

            let n = contact.normal;
            let separation = n * ((contact.depth - PENETRATION_SLOP).max(0.0) * POSITION_CORRECTION / inv_sum);

            let rel = b.velocity - a.velocity;
            let vn = rel.dot(n);
            let restitution = a.restitution.max(b.restitution);
            let friction = a.friction.min(b.friction);

            let mut impulse = Vec2::zero();
            if vn < 0.0 {
                let j = -(1.0 + restitution) * vn / inv_sum;
                impulse = n * j;

                let tangent = (rel - n * vn).normalize();
                let vt = rel.dot(tangent);
                let jt = (-vt / inv_sum).clamp(-friction * j, friction * j);
                impulse += tangent * jt;
            }

            {
                let a = &mut self.bodies[ia];
                a.position -= separation * inv_a;
                a.velocity -= impulse * inv_a;
            }
            {
                let b = &mut self.bodies[ib];
                b.position += separation * inv_b;
                b.velocity += impulse * inv_b;
            }
        }
    }

    fn index_of(&self, id: BodyId) -> Option<usize> {
        self.bodies.iter().position(|b| b.id == id)
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(Vec2::new(0.0, 980.0))
    }
}

/// Move `body` by `correction` applied at `arm`; an off-centre pull swings it
fn pull(body: &mut Body, arm: Vec2, correction: Vec2, stiffness: f32, dt: f32) {
    body.position += correction;
    body.velocity += correction * (1.0 / dt) * stiffness;
    let lever = arm.length_squared().max(1.0);
    body.angular_velocity += arm.cross(correction) / lever * stiffness / dt;
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn ball_lands_on_floor_and_reports_start_then_active() {
        let mut world = PhysicsWorld::default();
        let floor = world.create_static_body(Vec2::new(0.0, 100.0), Shape::rect(400.0, 20.0), BodyOptions::labelled("floor"));
        let ball = world.create_dynamic_body(Vec2::new(0.0, 70.0), Shape::circle(10.0), BodyOptions::labelled("ball"));

        let mut started = false;
        let mut active = false;
        for _ in 0..120 {
            let events = world.step(DT);
            started |= events.start.contains(&Pair::new(floor, ball));
            active |= started && events.active.contains(&Pair::new(floor, ball));
        }
        assert!(started);
        assert!(active);

        let y = world.body(ball).unwrap().position.y;
        assert!(y < 90.5 && y > 75.0, "ball should rest on the floor, y = {y}");
    }

    #[test]
    fn end_event_when_bodies_part() {
        let mut world = PhysicsWorld::new(Vec2::zero());
        let sensor = world.create_static_body(
            Vec2::new(0.0, 0.0),
            Shape::circle(10.0),
            BodyOptions { is_sensor: true, ..BodyOptions::default() },
        );
        let mover = world.create_dynamic_body(Vec2::new(5.0, 0.0), Shape::circle(2.0), BodyOptions::default());

        let events = world.step(DT);
        assert_eq!(events.start, vec![Pair::new(sensor, mover)]);

        world.set_position(mover, Vec2::new(100.0, 0.0));
        let events = world.step(DT);
        assert_eq!(events.end, vec![Pair::new(sensor, mover)]);
        assert!(world.pairs().is_empty());
    }

    #[test]
    fn static_pairs_are_never_reported() {
        let mut world = PhysicsWorld::default();
        world.create_static_body(Vec2::zero(), Shape::rect(10.0, 10.0), BodyOptions::default());
        world.create_static_body(Vec2::zero(), Shape::rect(10.0, 10.0), BodyOptions::default());
        let events = world.step(DT);
        assert!(events.start.is_empty());
    }

    #[test]
    fn point_query_keeps_insertion_order() {
        let mut world = PhysicsWorld::default();
        let a = world.create_static_body(Vec2::zero(), Shape::rect(50.0, 50.0), BodyOptions::default());
        let b = world.create_dynamic_body(Vec2::zero(), Shape::circle(10.0), BodyOptions::default());
        let c = world.create_static_body(Vec2::new(3.0, 0.0), Shape::circle(5.0), BodyOptions::default());
        assert_eq!(world.intersect_point(Vec2::new(1.0, 1.0)), vec![a, b, c]);

        world.remove_body(a);
        assert_eq!(world.intersect_point(Vec2::new(1.0, 1.0)), vec![b, c]);
    }

    #[test]
    fn removing_body_drops_its_constraints() {
        let mut world = PhysicsWorld::default();
        let body = world.create_dynamic_body(Vec2::zero(), Shape::circle(10.0), BodyOptions::default());
        world.add_constraint(ConstraintSpec {
            body_a: None,
            point_a: Vec2::new(0.0, -50.0),
            body_b: body,
            point_b: Vec2::zero(),
            length: 0.0,
            stiffness: 0.2,
        });
        assert_eq!(world.constraints().len(), 1);
        world.remove_body(body);
        assert!(world.constraints().is_empty());
    }

    #[test]
    fn spring_pulls_body_toward_anchor() {
        let mut world = PhysicsWorld::new(Vec2::zero());
        let body = world.create_dynamic_body(Vec2::zero(), Shape::circle(10.0), BodyOptions::default());
        world.add_constraint(ConstraintSpec {
            body_a: None,
            point_a: Vec2::new(100.0, 0.0),
            body_b: body,
            point_b: Vec2::zero(),
            length: 0.0,
            stiffness: 0.2,
        });
        world.step(DT);
        let x = world.body(body).unwrap().position.x;
        assert!(x > 10.0, "x = {x}");
    }

    #[test]
    fn spring_between_bodies_pulls_both_ends() {
        let mut world = PhysicsWorld::new(Vec2::zero());
        let a = world.create_dynamic_body(Vec2::zero(), Shape::circle(5.0), BodyOptions::default());
        let b = world.create_dynamic_body(Vec2::new(200.0, 0.0), Shape::circle(5.0), BodyOptions::default());
        world.add_constraint(ConstraintSpec {
            body_a: Some(a),
            point_a: Vec2::zero(),
            body_b: b,
            point_b: Vec2::zero(),
            length: 50.0,
            stiffness: 0.5,
        });
        world.step(DT);
        assert!(world.body(a).unwrap().position.x > 0.0);
        assert!(world.body(b).unwrap().position.x < 200.0);

        world.remove_body(a);
        assert!(world.constraints().is_empty());
    }
}
