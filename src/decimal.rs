//! Precision, scale, and trailing-zero extraction for exact decimals.
//!
//! The analysis scans the decimal's canonical textual rendering rather than
//! any binary floating-point intermediate, so `123.450` reports scale 3 and
//! one trailing zero exactly as written.

use rust_decimal::Decimal;

/// Digit statistics for one decimal value, or the elementwise maximum
/// across a column of them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecimalInfo {
    /// Total count of significant digits.
    pub precision: u32,
    /// Digit count to the right of the decimal point.
    pub scale: u32,
    /// Consecutive zero digits most recently seen in the fractional part.
    /// Tracked for every value but never rendered into DDL.
    pub trailing_zeros: u32,
}

impl DecimalInfo {
    /// Elementwise-max combine. Associative, so a column aggregate is a
    /// plain left-fold in row order.
    pub fn merge(self, other: DecimalInfo) -> DecimalInfo {
        DecimalInfo {
            precision: self.precision.max(other.precision),
            scale: self.scale.max(other.scale),
            trailing_zeros: self.trailing_zeros.max(other.trailing_zeros),
        }
    }
}

/// Extracts [`DecimalInfo`] from one value.
///
/// Leading zeros in the integer part carry no significance; every
/// fractional digit counts toward both precision and scale. A value whose
/// digits are all zero still reports precision >= 1.
pub fn analyze(value: &Decimal) -> DecimalInfo {
    let rendered = value.to_string();

    let mut precision = 0u32;
    let mut scale = 0u32;
    let mut trailing_zeros = 0u32;
    let mut in_fraction = false;
    let mut non_zero_seen = false;

    for ch in rendered.chars() {
        if in_fraction {
            if ch == '0' {
                trailing_zeros += 1;
            } else {
                non_zero_seen = true;
                trailing_zeros = 0;
            }
            precision += 1;
            scale += 1;
        } else if ch == '.' {
            in_fraction = true;
        } else if ch != '-' && (ch != '0' || non_zero_seen) {
            non_zero_seen = true;
            precision += 1;
        }
    }

    // A literal zero would otherwise report precision 0.
    if !non_zero_seen {
        precision += 1;
    }

    DecimalInfo {
        precision,
        scale,
        trailing_zeros,
    }
}
