use std::sync::Arc;

use parking_lot::RwLock;

/// Shared variation intensity, always within 0.0-1.0.
#[derive(Debug, Clone)]
pub struct SpiceLevel {
    inner: Arc<RwLock<f32>>,
}

impl SpiceLevel {
    pub fn new(level: f32) -> Self {
        let level = if level.is_finite() { level.clamp(0.0, 1.0) } else { 0.5 };
        Self {
            inner: Arc::new(RwLock::new(level)),
        }
    }

    pub fn get(&self) -> f32 {
        *self.inner.read()
    }

    /// Store a new level, clamped. Returns the stored value, or `None` when
    /// `level` is not a number.
    pub fn set(&self, level: f32) -> Option<f32> {
        if level.is_nan() {
            return None;
        }
        let level = level.clamp(0.0, 1.0);
        *self.inner.write() = level;
        Some(level)
    }
}

impl Default for SpiceLevel {
    fn default() -> Self {
        Self::new(0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamps_and_ignores_nan() {
        let spice = SpiceLevel::default();
        assert_eq!(spice.get(), 0.5);

        assert_eq!(spice.set(1.7), Some(1.0));
        assert_eq!(spice.set(-3.0), Some(0.0));
        assert_eq!(spice.set(f32::NAN), None);
        assert_eq!(spice.get(), 0.0);

        let observer = spice.clone();
        spice.set(0.3);
        assert_eq!(observer.get(), 0.3);

        assert_eq!(SpiceLevel::new(f32::INFINITY).get(), 0.5);
    }
}
