use crate::core::Vec2;
use crate::rigid_body::BodyId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintId(pub u32);

/// Spring between an anchor and an offset on a body.
///
/// Without `body_a` the anchor is the world point `point_a`; with it,
/// `point_a` is an offset on `body_a` and both ends are pulled.
#[derive(Clone, Debug)]
pub struct Constraint {
    pub id: ConstraintId,
    pub body_a: Option<BodyId>,
    /// World anchor (follows the pointer while dragging), or local offset on `body_a`
    pub point_a: Vec2,
    pub body_b: BodyId,
    /// Offset on `body_b`, in body-local coordinates
    pub point_b: Vec2,
    pub length: f32,
    /// 0..1 share of the error corrected per step
    pub stiffness: f32,
}

impl Constraint {
    pub fn involves(&self, body: BodyId) -> bool {
        self.body_b == body || self.body_a == Some(body)
    }
}

/// Parameters for [`PhysicsWorld::add_constraint`](super::PhysicsWorld::add_constraint)
#[derive(Clone, Debug)]
pub struct ConstraintSpec {
    pub body_a: Option<BodyId>,
    pub point_a: Vec2,
    pub body_b: BodyId,
    pub point_b: Vec2,
    pub length: f32,
    pub stiffness: f32,
}
