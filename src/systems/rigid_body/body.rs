use serde::Serialize;

use crate::core::Vec2;

use super::shape::Shape;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BodyId(pub u32);

/// Axis-aligned bounds in world space
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn overlaps(&self, other: &Bounds) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Creation options (mirrors the engine's body option bag)
#[derive(Clone, Debug)]
pub struct BodyOptions {
    pub label: String,
    pub angle: f32,
    pub is_sensor: bool,
    pub friction: f32,
    pub friction_air: f32,
    pub restitution: f32,
    pub density: f32,
    pub user_draggable: bool,
    pub parent: Option<BodyId>,
}

impl Default for BodyOptions {
    fn default() -> Self {
        Self {
            label: "Body".to_string(),
            angle: 0.0,
            is_sensor: false,
            friction: 0.1,
            friction_air: 0.01,
            restitution: 0.0,
            density: 0.001,
            user_draggable: false,
            parent: None,
        }
    }
}

impl BodyOptions {
    pub fn labelled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }
}

/// Rigid body - moves as a single unit
#[derive(Clone, Debug)]
pub struct Body {
    pub id: BodyId,
    pub label: String,
    /// Compound root; string validators also match the parent's label
    pub parent: Option<BodyId>,
    pub shape: Shape,

    // === Physics State ===
    /// World position (center of mass)
    pub position: Vec2,
    /// Pixels per second
    pub velocity: Vec2,
    /// Rotation angle (radians)
    pub angle: f32,
    /// Radians per second
    pub angular_velocity: f32,
    pub mass: f32,
    pub inertia: f32,

    pub is_static: bool,
    /// Sensors report collisions but are never pushed apart
    pub is_sensor: bool,

    // === Material properties ===
    pub friction: f32,
    pub friction_air: f32,
    /// Bounciness (0.0 = no bounce, 1.0 = full elastic)
    pub restitution: f32,

    pub user_draggable: bool,
}

impl Body {
    pub(crate) fn new(id: BodyId, position: Vec2, shape: Shape, is_static: bool, opts: BodyOptions) -> Self {
        let (mass, inertia) = if is_static {
            (f32::INFINITY, f32::INFINITY)
        } else {
            let mass = (shape.area() * opts.density).max(0.001);
            let half = shape.half_extents();
            // Box approximation: I = m (w² + h²) / 12
            let inertia = (mass * ((2.0 * half.x).powi(2) + (2.0 * half.y).powi(2)) / 12.0).max(0.001);
            (mass, inertia)
        };

        Self {
            id,
            label: opts.label,
            parent: opts.parent,
            shape,
            position,
            velocity: Vec2::zero(),
            angle: opts.angle,
            angular_velocity: 0.0,
            mass,
            inertia,
            is_static,
            is_sensor: opts.is_sensor,
            friction: opts.friction,
            friction_air: opts.friction_air,
            restitution: opts.restitution.clamp(0.0, 1.0),
            user_draggable: opts.user_draggable,
        }
    }

    pub fn inverse_mass(&self) -> f32 {
        if self.is_static {
            0.0
        } else {
            1.0 / self.mass
        }
    }

    pub fn inverse_inertia(&self) -> f32 {
        if self.is_static {
            0.0
        } else {
            1.0 / self.inertia
        }
    }

    /// Transform a body-local offset to world coordinates
    #[inline]
    pub fn local_to_world(&self, local: Vec2) -> Vec2 {
        self.position + local.rotate(self.angle)
    }

    #[inline]
    pub fn world_to_local(&self, world: Vec2) -> Vec2 {
        (world - self.position).rotate(-self.angle)
    }

    pub fn contains_point(&self, world: Vec2) -> bool {
        self.bounds().contains(world) && self.shape.contains_local(self.world_to_local(world))
    }

    /// Bounds of the rotated shape
    pub fn bounds(&self) -> Bounds {
        if let Shape::Circle { radius } = self.shape {
            let r = Vec2::new(radius, radius);
            return Bounds {
                min: self.position - r,
                max: self.position + r,
            };
        }
        let half = self.shape.half_extents();
        let (sin, cos) = self.angle.sin_cos();
        let ex = (half.x * cos).abs() + (half.y * sin).abs();
        let ey = (half.x * sin).abs() + (half.y * cos).abs();
        let e = Vec2::new(ex, ey);
        Bounds {
            min: self.position - e,
            max: self.position + e,
        }
    }

    /// Largest distance from the centroid to the bounds (corners included)
    pub fn max_radius(&self) -> f32 {
        let b = self.bounds();
        let c = self.position;
        let corners = [
            Vec2::new(b.max.x, b.max.y),
            Vec2::new(b.min.x, b.min.y),
            Vec2::new(b.max.x, b.min.y),
            Vec2::new(b.min.x, b.max.y),
        ];
        corners
            .iter()
            .map(|corner| corner.distance(c))
            .fold(0.0f32, f32::max)
    }
}
