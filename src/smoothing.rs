use std::ops::{Add, Mul, Sub};

/// Exponential-decay tracker that lags behind a moving target.
///
/// Each `update` closes the gap to the target by `1 - e^(-rate * dt)`, so the
/// result is frame-rate independent. Used for the camera follow height, where
/// the raw avatar root bobs with every step.
#[derive(Debug, Clone, Copy)]
pub struct Hysteresis<T> {
    value: T,
    /// Decay rate in 1/seconds. Higher follows the target more tightly.
    pub rate: f32,
}

impl<T> Hysteresis<T>
where
    T: Copy + Add<Output = T> + Sub<Output = T> + Mul<f32, Output = T>,
{
    pub fn new(initial: T, rate: f32) -> Self {
        Self { value: initial, rate }
    }

    pub fn value(&self) -> T {
        self.value
    }

    /// Snap to `value` with no lag.
    pub fn reset(&mut self, value: T) {
        self.value = value;
    }

    pub fn update(&mut self, target: T, dt: f32) -> T {
        if dt <= 0.0 {
            return self.value;
        }
        let keep = (-self.rate * dt).exp();
        self.value = target + (self.value - target) * keep;
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn converges_toward_target() {
        let mut h = Hysteresis::new(0.0_f32, 5.0);
        let first = h.update(10.0, 0.1);
        assert!(first > 0.0 && first < 10.0);
        for _ in 0..200 {
            h.update(10.0, 0.1);
        }
        assert!((h.value() - 10.0).abs() < 1e-3);
    }

    #[test]
    fn zero_dt_is_a_no_op() {
        let mut h = Hysteresis::new(Vec3::ONE, 5.0);
        assert_eq!(h.update(Vec3::ZERO, 0.0), Vec3::ONE);
    }

    #[test]
    fn lag_is_frame_rate_independent() {
        let mut coarse = Hysteresis::new(0.0_f32, 3.0);
        let mut fine = Hysteresis::new(0.0_f32, 3.0);
        coarse.update(1.0, 0.5);
        for _ in 0..5 {
            fine.update(1.0, 0.1);
        }
        assert!((coarse.value() - fine.value()).abs() < 1e-4);
    }
}
