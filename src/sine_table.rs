use core::f32::consts::PI;
use micromath::F32Ext;

use crate::config::TABLE_LEN;

/// Duty percentage that corresponds to zero output voltage.
pub const ZERO_DUTY: f32 = 50.0;

/// One electrical cycle of duty percentages in `[0, 100]`, centred on [`ZERO_DUTY`].
///
/// Entry 0 is the rising zero crossing; the last entry closes the cycle back at 50.
#[derive(Debug, Clone, PartialEq)]
pub struct SineTable<const N: usize> {
    values: [f32; N],
}

pub static SINE_TABLE: SineTable<TABLE_LEN> = SineTable::new([
    50.0, 59.755, 69.134, 77.779, 85.355, 91.573, 96.194, 99.039, 100.0, 99.039, 96.194, 91.573,
    85.355, 77.779, 69.134, 59.755, 50.0, 40.245, 30.866, 22.221, 14.645, 8.427, 3.806, 0.961, 0.0,
    0.961, 3.806, 8.427, 14.645, 22.221, 30.866, 40.245, 50.0,
]);

impl<const N: usize> SineTable<N> {
    pub const fn new(values: [f32; N]) -> Self {
        Self { values }
    }

    /// `50 + 50 * sin(2πi / (N - 1))`, so both ends sit on the zero crossing.
    pub fn synthesize() -> Self {
        let step = if N > 1 { 2.0 * PI / (N - 1) as f32 } else { 0.0 };
        let mut values = [ZERO_DUTY; N];
        for (i, value) in values.iter_mut().enumerate() {
            let duty = ZERO_DUTY + ZERO_DUTY * F32Ext::sin(step * i as f32);
            *value = duty.clamp(0.0, 100.0);
        }
        Self { values }
    }

    #[inline(always)]
    pub fn value_at(&self, index: usize) -> f32 {
        self.values[index]
    }

    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Table entry scaled about the zero-output level.
    #[inline(always)]
    pub fn scaled_duty(&self, index: usize, scale: f32) -> f32 {
        (self.values[index] - ZERO_DUTY) * scale + ZERO_DUTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_in_duty_range() {
        for i in 0..SINE_TABLE.len() {
            let value = SINE_TABLE.value_at(i);
            assert!((0.0..=100.0).contains(&value), "table[{i}] = {value}");
        }
        assert_eq!(SINE_TABLE.value_at(0), 50.0);
        assert_eq!(SINE_TABLE.value_at(TABLE_LEN - 1), 50.0);
    }

    #[test]
    fn test_half_cycles_mirror_about_zero_duty() {
        let half = (TABLE_LEN - 1) / 2;
        for i in 0..=half {
            let rising = SINE_TABLE.value_at(i) - ZERO_DUTY;
            let falling = SINE_TABLE.value_at(i + half) - ZERO_DUTY;
            assert!((rising + falling).abs() < 1e-3, "i={i} {rising} vs {falling}");
        }
        assert_eq!(SINE_TABLE.value_at(half / 2), 100.0);
        assert_eq!(SINE_TABLE.value_at(half + half / 2), 0.0);
    }

    #[test]
    fn test_synthesized_matches_shipped_table() {
        let synthesized = SineTable::<TABLE_LEN>::synthesize();
        for i in 0..TABLE_LEN {
            let diff = (synthesized.value_at(i) - SINE_TABLE.value_at(i)).abs();
            assert!(diff < 0.25, "table[{i}]: {} vs {}", synthesized.value_at(i), SINE_TABLE.value_at(i));
        }
    }

    #[test]
    fn test_scaled_duty_is_centred() {
        for i in 0..TABLE_LEN {
            assert_eq!(SINE_TABLE.scaled_duty(i, 0.0), ZERO_DUTY);
            let full = SINE_TABLE.scaled_duty(i, 1.0);
            assert!((full - SINE_TABLE.value_at(i)).abs() < 1e-4);
            let half = SINE_TABLE.scaled_duty(i, 0.5);
            assert!((half - (25.0 + SINE_TABLE.value_at(i) / 2.0)).abs() < 1e-4);
        }
    }
}
