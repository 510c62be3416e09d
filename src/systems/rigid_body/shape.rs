use serde::{Deserialize, Serialize};

use crate::core::Vec2;

/// Collision shape in body-local coordinates, centred on (0,0).
///
/// Capsules and polygons collide as their oriented bounding box; point
/// queries use the exact outline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Shape {
    #[serde(alias = "rect")]
    Rectangle { width: f32, height: f32 },
    Circle { radius: f32 },
    Capsule { width: f32, height: f32 },
    Polygon { vertices: Vec<Vec2> },
}

impl Shape {
    pub fn rect(width: f32, height: f32) -> Self {
        Shape::Rectangle { width, height }
    }

    pub fn circle(radius: f32) -> Self {
        Shape::Circle { radius }
    }

    /// Half extents of the local bounding box
    pub fn half_extents(&self) -> Vec2 {
        match self {
            Shape::Rectangle { width, height } | Shape::Capsule { width, height } => {
                Vec2::new(width / 2.0, height / 2.0)
            }
            Shape::Circle { radius } => Vec2::new(*radius, *radius),
            Shape::Polygon { vertices } => {
                let mut half = Vec2::zero();
                for v in vertices {
                    half.x = half.x.max(v.x.abs());
                    half.y = half.y.max(v.y.abs());
                }
                half
            }
        }
    }

    pub fn area(&self) -> f32 {
        match self {
            Shape::Rectangle { width, height } => width * height,
            Shape::Capsule { width, height } => {
                let r = width.min(*height) / 2.0;
                width * height - (4.0 - std::f32::consts::PI) * r * r
            }
            Shape::Circle { radius } => std::f32::consts::PI * radius * radius,
            Shape::Polygon { vertices } => {
                let n = vertices.len();
                let mut twice = 0.0;
                for i in 0..n {
                    let a = vertices[i];
                    let b = vertices[(i + 1) % n];
                    twice += a.cross(b);
                }
                (twice / 2.0).abs()
            }
        }
    }

    /// Is a body-local point inside the outline?
    pub fn contains_local(&self, p: Vec2) -> bool {
        match self {
            Shape::Rectangle { width, height } => {
                p.x.abs() <= width / 2.0 && p.y.abs() <= height / 2.0
            }
            Shape::Circle { radius } => p.length_squared() <= radius * radius,
            Shape::Capsule { width, height } => {
                // Segment along the long axis, swept by half the short side
                let r = width.min(*height) / 2.0;
                let (hx, hy) = if width >= height {
                    (width / 2.0 - r, 0.0)
                } else {
                    (0.0, height / 2.0 - r)
                };
                let closest = Vec2::new(p.x.clamp(-hx, hx), p.y.clamp(-hy, hy));
                (p - closest).length_squared() <= r * r
            }
            Shape::Polygon { vertices } => point_in_polygon(vertices, p),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let positive = |v: f32| v.is_finite() && v > 0.0;
        match self {
            Shape::Rectangle { width, height } | Shape::Capsule { width, height } => {
                if positive(*width) && positive(*height) {
                    Ok(())
                } else {
                    Err(format!("dimensions must be positive, got {width}x{height}"))
                }
            }
            Shape::Circle { radius } => {
                if positive(*radius) {
                    Ok(())
                } else {
                    Err(format!("radius must be positive, got {radius}"))
                }
            }
            Shape::Polygon { vertices } => {
                if vertices.len() < 3 {
                    Err(format!("polygon needs at least 3 vertices, got {}", vertices.len()))
                } else if vertices.iter().any(|v| !v.is_finite()) {
                    Err("polygon has non-finite vertices".to_string())
                } else {
                    Ok(())
                }
            }
        }
    }
}

fn point_in_polygon(vertices: &[Vec2], p: Vec2) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[j];
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}
