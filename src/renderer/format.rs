//! Pure conversions from kilobyte counts into numbers a gauge can draw.

use std::fmt;

/// Kilobyte counts above this no longer fit six digits and switch to megabytes.
pub const LARGE_VALUE_THRESHOLD_KB: u64 = 999_999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Kilobytes,
    Megabytes,
}

impl Unit {
    pub fn suffix(&self) -> &'static str {
        match self {
            Unit::Kilobytes => "kB",
            Unit::Megabytes => "MB",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayMagnitude {
    pub value: u64,
    pub unit: Unit,
}

impl fmt::Display for DisplayMagnitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit.suffix())
    }
}

pub fn choose_unit(value_kb: u64, force_mb: bool) -> Unit {
    if force_mb || value_kb > LARGE_VALUE_THRESHOLD_KB {
        Unit::Megabytes
    } else {
        Unit::Kilobytes
    }
}

pub fn to_magnitude(value_kb: u64, unit: Unit) -> DisplayMagnitude {
    let value = match unit {
        Unit::Kilobytes => value_kb,
        Unit::Megabytes => value_kb / 1024,
    };
    DisplayMagnitude { value, unit }
}

/// Decimal digits of `value`, least significant first.
///
/// At most `max_digits` are produced; higher digits are dropped. Zero yields a
/// single `0`.
pub fn to_digits(mut value: u64, max_digits: usize) -> Vec<u8> {
    let mut digits = Vec::with_capacity(max_digits);
    while digits.len() < max_digits {
        digits.push((value % 10) as u8);
        value /= 10;
        if value == 0 {
            break;
        }
    }
    digits
}

/// `numerator / denominator * 100`, rounded to nearest. Not clamped to 100.
pub fn percentage(numerator: u64, denominator: u64) -> u64 {
    if denominator == 0 {
        return 0;
    }
    let numerator = numerator as u128 * 100;
    let denominator = denominator as u128;
    u64::try_from((numerator + denominator / 2) / denominator).unwrap_or(u64::MAX)
}

/// Splits `width_px` proportionally between three quantities of `total`.
///
/// Each segment is floored; the running sum never exceeds `width_px`.
pub fn bar_segments(used: u64, buffers: u64, cached: u64, total: u64, width_px: u32) -> (u32, u32, u32) {
    if total == 0 {
        return (0, 0, 0);
    }

    let mut remaining = width_px;
    let mut segment = |quantity: u64| {
        let px = (quantity as u128 * width_px as u128 / total as u128).min(remaining as u128) as u32;
        remaining -= px;
        px
    };

    let seg0 = segment(used);
    let seg1 = segment(buffers);
    let seg2 = segment(cached);
    (seg0, seg1, seg2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_digits(digits: &[u8]) -> u64 {
        digits.iter().rev().fold(0, |acc, d| acc * 10 + *d as u64)
    }

    #[test]
    fn test_choose_unit() {
        assert_eq!(choose_unit(999_999, false), Unit::Kilobytes);
        assert_eq!(choose_unit(1_000_000, false), Unit::Megabytes);
        assert_eq!(choose_unit(10, true), Unit::Megabytes);
        assert_eq!(choose_unit(0, false), Unit::Kilobytes);
    }

    #[test]
    fn test_to_magnitude() {
        assert_eq!(to_magnitude(8_000_000, Unit::Megabytes).value, 7812);
        assert_eq!(to_magnitude(16_384, Unit::Kilobytes).value, 16_384);
        assert_eq!(to_magnitude(16_384, Unit::Megabytes).to_string(), "16 MB");
    }

    #[test]
    fn test_to_digits() {
        assert_eq!(to_digits(0, 6), vec![0]);
        assert_eq!(to_digits(1234, 6), vec![4, 3, 2, 1]);
        assert_eq!(to_digits(1_234_567, 6), vec![7, 6, 5, 4, 3, 2]);
        assert!(to_digits(42, 0).is_empty());
    }

    #[test]
    fn test_digits_reconstruct_value() {
        let mut value = 0;
        while value <= 999_999 {
            assert_eq!(from_digits(&to_digits(value, 6)), value);
            value += 997;
        }
        for value in [1, 9, 10, 99, 100, 100_000, 999_999] {
            assert_eq!(from_digits(&to_digits(value, 6)), value);
        }
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(5, 0), 0);
        assert_eq!(percentage(100, 100), 100);
        assert_eq!(percentage(150, 100), 150);
        assert_eq!(percentage(4_000_000, 8_000_000), 50);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(u64::MAX, u64::MAX), 100);
        assert_eq!(percentage(u64::MAX, 1), u64::MAX);
        assert_eq!(percentage(u64::MAX / 10, 1), u64::MAX);
    }

    #[test]
    fn test_bar_segments() {
        assert_eq!(bar_segments(4_000_000, 500_000, 1_500_000, 8_000_000, 46), (23, 2, 8));
        assert_eq!(bar_segments(1, 1, 1, 0, 46), (0, 0, 0));
        assert_eq!(bar_segments(100, 0, 0, 100, 46), (46, 0, 0));
    }

    #[test]
    fn test_bar_segments_never_overflow_width() {
        let (a, b, c) = bar_segments(90, 90, 90, 100, 46);
        assert_eq!((a, b, c), (41, 5, 0));
        assert!(a + b + c <= 46);
    }
}
