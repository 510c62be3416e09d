use std::f32::consts::PI;

/// Linear counter tween from `from` to `to` over `duration_ms`
#[derive(Clone, Debug)]
pub struct Tween {
    from: f32,
    to: f32,
    duration_ms: f32,
    elapsed_ms: f32,
}

impl Tween {
    pub fn new(from: f32, to: f32, duration_ms: f32) -> Self {
        Self {
            from,
            to,
            duration_ms: duration_ms.max(0.0),
            elapsed_ms: 0.0,
        }
    }

    /// Advance and return the current value
    pub fn advance(&mut self, dt_ms: f32) -> f32 {
        self.elapsed_ms = (self.elapsed_ms + dt_ms.max(0.0)).min(self.duration_ms);
        self.value()
    }

    pub fn value(&self) -> f32 {
        if self.duration_ms <= f32::EPSILON {
            return self.to;
        }
        let t = (self.elapsed_ms / self.duration_ms).clamp(0.0, 1.0);
        self.from + (self.to - self.from) * t
    }

    pub fn is_complete(&self) -> bool {
        self.elapsed_ms >= self.duration_ms
    }
}

/// Wrap an angle to [-PI, PI]
pub fn wrap_angle(angle: f32) -> f32 {
    let mut a = (angle + PI) % (2.0 * PI);
    if a < 0.0 {
        a += 2.0 * PI;
    }
    a - PI
}

/// Signed shortest rotation from `from` to `to`
pub fn shortest_between(from: f32, to: f32) -> f32 {
    wrap_angle(to - from)
}
