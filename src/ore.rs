//! Authored ore-density scaling.
//!
//! The `ore_multiplier` layer stores 0-15. Value 8 leaves host ore density
//! unchanged, 15 quadruples it and values toward 1 approach a quarter.
//! Zero means "not painted" and never changes anything.

/// Raw value that leaves density unchanged.
pub const NEUTRAL: u8 = 8;

/// Multiplier for a raw control value.
pub fn multiplier(raw: u8) -> f32 {
    let raw = raw.min(15) as f32;
    let neutral = NEUTRAL as f32;
    if raw >= neutral {
        4f32.powf((raw - neutral) / 7.0)
    } else {
        0.25f32.powf((neutral - raw) / 8.0)
    }
}

/// Scale one host ore-density byte. Returns `None` when `raw` is unpainted.
///
/// Zero density stays zero: the curve only scales ore the host placed.
pub fn scale_density(density: u8, raw: u8) -> Option<u8> {
    if raw == 0 {
        return None;
    }
    let scaled = (density as f32 * multiplier(raw)).round();
    Some(scaled.clamp(0.0, 255.0) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curve_anchors() {
        assert_eq!(multiplier(8), 1.0);
        assert!((multiplier(15) - 4.0).abs() < 1e-5);
        assert!((multiplier(4) - 0.5).abs() < 1e-5);
        assert!(multiplier(1) > 0.25 && multiplier(1) < 0.3);
    }

    #[test]
    fn test_curve_monotonic() {
        for raw in 1..15u8 {
            assert!(multiplier(raw + 1) > multiplier(raw));
        }
    }

    #[test]
    fn test_zero_never_applied() {
        assert_eq!(scale_density(100, 0), None);
        assert_eq!(scale_density(100, 8), Some(100));
    }

    #[test]
    fn test_scaling_clamps_and_keeps_zero() {
        assert_eq!(scale_density(100, 15), Some(255));
        assert_eq!(scale_density(0, 15), Some(0));
        assert_eq!(scale_density(60, 15), Some(240));
        assert_eq!(scale_density(100, 4), Some(50));
    }
}
