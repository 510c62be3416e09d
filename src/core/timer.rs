/// Frame-driven timer. Advanced by the per-frame update instead of a wall clock.
#[derive(Clone, Debug)]
pub struct Timer {
    delay_ms: f64,
    elapsed_ms: f64,
}

impl Timer {
    /// Fires every `delay_ms`
    pub fn looping(delay_ms: f64) -> Self {
        Self {
            delay_ms: delay_ms.max(1.0),
            elapsed_ms: 0.0,
        }
    }

    /// Advance by `dt_ms`, returning how many times the timer fired.
    pub fn tick(&mut self, dt_ms: f64) -> u32 {
        self.elapsed_ms += dt_ms.max(0.0);
        let mut fired = 0;
        while self.elapsed_ms >= self.delay_ms {
            self.elapsed_ms -= self.delay_ms;
            fired += 1;
        }
        fired
    }
}
