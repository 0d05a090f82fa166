//! Raw-to-engineering unit conversion.
//!
//! Devices report raw 12-bit ADC counts. Each equipment/metric binding maps
//! the raw domain `[RAW_DOMAIN_MIN, RAW_DOMAIN_MAX]` linearly onto its own
//! `[valor_minimo, valor_maximo]` range.

/// Lower bound of the device ADC domain.
pub const RAW_DOMAIN_MIN: f64 = 0.0;

/// Upper bound of the device ADC domain (12-bit, zero based).
pub const RAW_DOMAIN_MAX: f64 = 4095.0;

/// Engineering range configured on an equipment/metric binding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionRange {
    pub min: f64,
    pub max: f64,
}

impl ConversionRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// Round to two decimal places (half away from zero).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Linearly rescale a raw device value into the binding's range.
///
/// The divisor is the fixed raw domain width, so a degenerate range
/// (`min == max`) simply yields a constant.
pub fn rescale(raw: f64, range: ConversionRange) -> f64 {
    let converted = (raw - RAW_DOMAIN_MIN) * (range.max - range.min)
        / (RAW_DOMAIN_MAX - RAW_DOMAIN_MIN)
        + range.min;
    round2(converted)
}

/// Produce the stored engineering value for a bound reading.
///
/// A caller-supplied converted value is trusted as-is (only rounded); it is
/// never re-derived from `raw`.
pub fn convert(raw: f64, supplied: Option<f64>, range: ConversionRange) -> f64 {
    match supplied {
        Some(value) => round2(value),
        None => rescale(raw, range),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RANGE: ConversionRange = ConversionRange {
        min: 0.0,
        max: 100.0,
    };

    #[test]
    fn raw_zero_maps_to_range_min() {
        let range = ConversionRange::new(-20.0, 80.0);
        assert_eq!(rescale(0.0, range), -20.0);
    }

    #[test]
    fn raw_max_maps_to_range_max() {
        let range = ConversionRange::new(-20.0, 80.0);
        assert_eq!(rescale(RAW_DOMAIN_MAX, range), 80.0);
        assert_eq!(rescale(4095.0, RANGE), 100.0);
    }

    #[test]
    fn midpoint_rounds_to_two_decimals() {
        // 2047 * 100 / 4095 = 49.98779...
        assert_eq!(rescale(2047.0, RANGE), 49.99);
    }

    #[test]
    fn conversion_is_monotonic_in_raw() {
        let mut previous = f64::MIN;
        for raw in (0..=4095).step_by(35) {
            let value = rescale(raw as f64, RANGE);
            assert!(value >= previous, "raw {raw} produced {value} < {previous}");
            previous = value;
        }
    }

    #[test]
    fn degenerate_range_is_constant() {
        let range = ConversionRange::new(12.5, 12.5);
        assert_eq!(rescale(0.0, range), 12.5);
        assert_eq!(rescale(3000.0, range), 12.5);
    }

    #[test]
    fn supplied_value_is_passed_through_rounded() {
        assert_eq!(convert(4095.0, Some(12.3456), RANGE), 12.35);
        assert_eq!(convert(0.0, Some(-7.001), RANGE), -7.0);
    }

    #[test]
    fn missing_supplied_value_is_derived() {
        assert_eq!(convert(4095.0, None, RANGE), 100.0);
    }
}
