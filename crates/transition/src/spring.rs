//! Spring timing curve.
//!
//! Maps elapsed time to normalized progress with a damped harmonic
//! oscillator, parameterized the way view-animation APIs usually expose it:
//! a fixed duration, a damping ratio, and an initial velocity expressed in
//! "total distances per second".
//!
//! The displacement from the target, `x(t) = 1 - progress(t)`, solves
//!
//!   x'' + 2ζω x' + ω² x = 0,   x(0) = 1,   x'(0) = -v₀
//!
//! The natural frequency ω is chosen so the slowest decaying term of the
//! solution has shrunk to [`SETTLE_EPSILON`] when the duration elapses. At
//! and after the duration the curve reports exactly 1.0.

use std::time::Duration;

/// Default transition duration.
pub const DEFAULT_DURATION: Duration = Duration::from_millis(350);

/// Default damping ratio (under-damped, a small overshoot).
pub const DEFAULT_DAMPING_RATIO: f64 = 0.7;

/// Default initial velocity in normalized units per second.
pub const DEFAULT_INITIAL_VELOCITY: f64 = 12.0;

/// Envelope amplitude at which the spring counts as settled.
const SETTLE_EPSILON: f64 = 0.001;

/// Damping ratios below this would need an unbounded frequency to settle.
const MIN_DAMPING_RATIO: f64 = 0.01;

/// Tolerance for treating the damping ratio as critical.
const CRITICAL_TOLERANCE: f64 = 1e-9;

/// Closed-form spring progress curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringCurve {
    duration: Duration,
    damping_ratio: f64,
    initial_velocity: f64,
    omega: f64,
}

impl Default for SpringCurve {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION, DEFAULT_DAMPING_RATIO, DEFAULT_INITIAL_VELOCITY)
    }
}

impl SpringCurve {
    /// Create a curve. The damping ratio is clamped to a small positive
    /// minimum.
    pub fn new(duration: Duration, damping_ratio: f64, initial_velocity: f64) -> Self {
        let damping_ratio = damping_ratio.max(MIN_DAMPING_RATIO);
        let secs = duration.as_secs_f64();
        let omega = if secs > 0.0 {
            -SETTLE_EPSILON.ln() / (decay_factor(damping_ratio) * secs)
        } else {
            0.0
        };
        Self {
            duration,
            damping_ratio,
            initial_velocity,
            omega,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn damping_ratio(&self) -> f64 {
        self.damping_ratio
    }

    pub fn initial_velocity(&self) -> f64 {
        self.initial_velocity
    }

    /// Natural (undamped) angular frequency in radians per second.
    pub fn natural_frequency(&self) -> f64 {
        self.omega
    }

    /// Whether the curve has reached its end at `elapsed`.
    pub fn is_finished(&self, elapsed: Duration) -> bool {
        elapsed >= self.duration
    }

    /// Normalized progress at `elapsed`. Starts at 0, ends at exactly 1, and
    /// may exceed 1 in between when under-damped.
    pub fn progress(&self, elapsed: Duration) -> f64 {
        if self.is_finished(elapsed) {
            return 1.0;
        }
        let t = elapsed.as_secs_f64();
        if t <= 0.0 {
            return 0.0;
        }
        1.0 - self.displacement(t)
    }

    fn displacement(&self, t: f64) -> f64 {
        let zeta = self.damping_ratio;
        let omega = self.omega;
        let v0 = self.initial_velocity;

        if (zeta - 1.0).abs() < CRITICAL_TOLERANCE {
            (-omega * t).exp() * (1.0 + (omega - v0) * t)
        } else if zeta < 1.0 {
            let omega_d = omega * (1.0 - zeta * zeta).sqrt();
            let b = (zeta * omega - v0) / omega_d;
            (-zeta * omega * t).exp() * ((omega_d * t).cos() + b * (omega_d * t).sin())
        } else {
            let root = (zeta * zeta - 1.0).sqrt();
            let r1 = -omega * (zeta - root);
            let r2 = -omega * (zeta + root);
            let a = (-v0 - r2) / (r1 - r2);
            a * (r1 * t).exp() + (1.0 - a) * (r2 * t).exp()
        }
    }
}

/// Decay rate of the slowest term relative to ω.
fn decay_factor(zeta: f64) -> f64 {
    if zeta <= 1.0 {
        zeta
    } else {
        zeta - (zeta * zeta - 1.0).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(curve: &SpringCurve) -> Vec<f64> {
        (0..=350).map(|ms| curve.progress(Duration::from_millis(ms))).collect()
    }

    #[test]
    fn test_endpoints() {
        let curve = SpringCurve::default();
        assert_eq!(curve.progress(Duration::ZERO), 0.0);
        assert_eq!(curve.progress(DEFAULT_DURATION), 1.0);
        assert_eq!(curve.progress(Duration::from_secs(2)), 1.0);
    }

    #[test]
    fn test_initial_slope_matches_velocity() {
        let curve = SpringCurve::default();
        let p = curve.progress(Duration::from_millis(1));
        // ~12 distances per second over 1ms.
        assert!(p > 0.008 && p < 0.016, "p = {}", p);
    }

    #[test]
    fn test_settles_before_duration() {
        let curve = SpringCurve::default();
        let near_end = curve.progress(Duration::from_millis(349));
        assert!((near_end - 1.0).abs() < 0.01, "near_end = {}", near_end);
    }

    #[test]
    fn test_underdamped_overshoots() {
        let curve = SpringCurve::default();
        let peak = samples(&curve).into_iter().fold(f64::MIN, f64::max);
        assert!(peak > 1.0);
        assert!(peak < 1.5);
    }

    #[test]
    fn test_critical_and_overdamped_finish() {
        for zeta in [1.0, 1.8] {
            let curve = SpringCurve::new(DEFAULT_DURATION, zeta, 0.0);
            let values = samples(&curve);
            assert_eq!(values[0], 0.0);
            assert_eq!(*values.last().unwrap(), 1.0);
            // No velocity kick and no oscillation: monotonic rise.
            assert!(values.windows(2).all(|w| w[1] >= w[0] - 1e-12));
            assert!((values[349] - 1.0).abs() < 0.01);
        }
    }

    #[test]
    fn test_zero_duration() {
        let curve = SpringCurve::new(Duration::ZERO, 0.7, 12.0);
        assert!(curve.is_finished(Duration::ZERO));
        assert_eq!(curve.progress(Duration::ZERO), 1.0);
    }

    #[test]
    fn test_damping_ratio_clamped() {
        let curve = SpringCurve::new(DEFAULT_DURATION, 0.0, 12.0);
        assert_eq!(curve.damping_ratio(), MIN_DAMPING_RATIO);
        assert!(curve.natural_frequency().is_finite());
    }
}
