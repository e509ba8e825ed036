/// Exponential approach from one positive value to another over a fixed time,
/// holding the target afterwards.
///
/// Targets are never zero: recipes ramp toward a small floor (0.01) so the
/// curve stays well defined and the tail never turns denormal.
#[derive(Clone, Copy, Debug)]
pub struct ExpRamp {
    value: f32,
    target: f32,
    factor: f32,
    remaining: u32,
}

impl ExpRamp {
    pub fn new(from: f32, to: f32, duration_secs: f32, sample_rate: f32) -> Self {
        debug_assert!(from > 0.0 && to > 0.0, "exponential ramps need positive endpoints");
        let samples = (duration_secs * sample_rate).round().max(1.0) as u32;
        Self {
            value: from,
            target: to,
            factor: (to / from).powf(1.0 / samples as f32),
            remaining: samples,
        }
    }

    pub fn constant(value: f32) -> Self {
        Self {
            value,
            target: value,
            factor: 1.0,
            remaining: 0,
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// Current value, then advance by one sample.
    pub fn next(&mut self) -> f32 {
        let out = self.value;
        if self.remaining > 0 {
            self.remaining -= 1;
            self.value = if self.remaining == 0 {
                self.target
            } else {
                self.value * self.factor
            };
        }
        out
    }
}
