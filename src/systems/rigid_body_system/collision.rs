use crate::core::Vec2;
use crate::rigid_body::{Body, Shape};

/// Penetration between two bodies. `normal` points from the first body to the second.
#[derive(Clone, Copy, Debug)]
pub(super) struct Contact {
    pub normal: Vec2,
    pub depth: f32,
}

struct Obb {
    center: Vec2,
    axes: [Vec2; 2],
    half: Vec2,
}

impl Obb {
    fn of(body: &Body) -> Self {
        Self {
            center: body.position,
            axes: [Vec2::from_angle(body.angle), Vec2::from_angle(body.angle).perp()],
            half: body.shape.half_extents(),
        }
    }

    fn projected_radius(&self, axis: Vec2) -> f32 {
        self.half.x * self.axes[0].dot(axis).abs() + self.half.y * self.axes[1].dot(axis).abs()
    }
}

fn circle_radius(body: &Body) -> Option<f32> {
    match body.shape {
        Shape::Circle { radius } => Some(radius),
        _ => None,
    }
}

pub(super) fn collide(a: &Body, b: &Body) -> Option<Contact> {
    if !a.bounds().overlaps(&b.bounds()) {
        return None;
    }

    match (circle_radius(a), circle_radius(b)) {
        (Some(ra), Some(rb)) => circle_circle(a.position, ra, b.position, rb),
        (None, Some(rb)) => circle_obb(&Obb::of(a), b.position, rb),
        (Some(ra), None) => circle_obb(&Obb::of(b), a.position, ra).map(|c| Contact {
            normal: -c.normal,
            depth: c.depth,
        }),
        (None, None) => obb_obb(&Obb::of(a), &Obb::of(b)),
    }
}

fn circle_circle(ca: Vec2, ra: f32, cb: Vec2, rb: f32) -> Option<Contact> {
    let d = cb - ca;
    let dist = d.length();
    if dist >= ra + rb {
        return None;
    }
    let normal = if dist > 1e-4 { d * (1.0 / dist) } else { Vec2::new(0.0, 1.0) };
    Some(Contact {
        normal,
        depth: ra + rb - dist,
    })
}

/// Normal points from the box toward the circle
fn circle_obb(obb: &Obb, center: Vec2, radius: f32) -> Option<Contact> {
    let d = center - obb.center;
    let lx = d.dot(obb.axes[0]);
    let ly = d.dot(obb.axes[1]);
    let cx = lx.clamp(-obb.half.x, obb.half.x);
    let cy = ly.clamp(-obb.half.y, obb.half.y);
    let closest = obb.center + obb.axes[0] * cx + obb.axes[1] * cy;
    let delta = center - closest;
    let dist = delta.length();

    if dist > 1e-4 {
        if dist >= radius {
            return None;
        }
        return Some(Contact {
            normal: delta * (1.0 / dist),
            depth: radius - dist,
        });
    }

    // Center inside the box: push out along the shallowest face
    let px = obb.half.x - lx.abs();
    let py = obb.half.y - ly.abs();
    if px < py {
        let sign = if lx < 0.0 { -1.0 } else { 1.0 };
        Some(Contact {
            normal: obb.axes[0] * sign,
            depth: px + radius,
        })
    } else {
        let sign = if ly < 0.0 { -1.0 } else { 1.0 };
        Some(Contact {
            normal: obb.axes[1] * sign,
            depth: py + radius,
        })
    }
}

/// Separating axis test over both boxes' face normals
fn obb_obb(a: &Obb, b: &Obb) -> Option<Contact> {
    let d = b.center - a.center;
    let mut best: Option<Contact> = None;

    for axis in [a.axes[0], a.axes[1], b.axes[0], b.axes[1]] {
        let dist = d.dot(axis);
        let overlap = a.projected_radius(axis) + b.projected_radius(axis) - dist.abs();
        if overlap <= 0.0 {
            return None;
        }
        if best.map_or(true, |c| overlap < c.depth) {
            let normal = if dist < 0.0 { -axis } else { axis };
            best = Some(Contact { normal, depth: overlap });
        }
    }

    best
}
