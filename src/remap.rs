//! Recognized control layers and low-bit-depth value remapping.
//!
//! The authoring tool stores most control layers at 4 bits (0-15). Host
//! fields are full bytes, so authored values are rescaled before they are
//! compared against or blended into host data.

/// Control layers the pipeline consults. Other layers in a file are loaded
/// but ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerKind {
    WaterOcean,
    WaterBeach,
    VegetationForest,
    VegetationShrubbery,
    VegetationFlowers,
    ClimateTemperature,
    ClimateMoisture,
    ClimateTectonic,
    OreMultiplier,
}

impl LayerKind {
    pub fn all() -> &'static [Self] {
        &[
            Self::WaterOcean,
            Self::WaterBeach,
            Self::VegetationForest,
            Self::VegetationShrubbery,
            Self::VegetationFlowers,
            Self::ClimateTemperature,
            Self::ClimateMoisture,
            Self::ClimateTectonic,
            Self::OreMultiplier,
        ]
    }

    /// Name of the layer inside a raster file.
    pub fn name(&self) -> &'static str {
        match self {
            Self::WaterOcean => "water_ocean",
            Self::WaterBeach => "water_beach",
            Self::VegetationForest => "vegetation_forest",
            Self::VegetationShrubbery => "vegetation_shrubbery",
            Self::VegetationFlowers => "vegetation_flowers",
            Self::ClimateTemperature => "climate_temperature",
            Self::ClimateMoisture => "climate_moisture",
            Self::ClimateTectonic => "climate_tectonic",
            Self::OreMultiplier => "ore_multiplier",
        }
    }

    /// Case-insensitive lookup by file layer name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }

    /// Maximum authored value, for layers stored at reduced bit depth.
    pub fn source_max(&self) -> Option<u8> {
        source_max(self.name())
    }
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Layers whose authored values live in `0..=srcMax` rather than a full byte.
const FIXED_DOMAIN: &[(&str, u8)] = &[
    ("water_ocean", 15),
    ("water_beach", 15),
    ("vegetation_forest", 15),
    ("vegetation_shrubbery", 15),
    ("vegetation_flowers", 15),
    ("climate_temperature", 15),
    ("climate_moisture", 15),
    ("climate_tectonic", 15),
];

/// Authored domain maximum for a layer name, if it is stored at reduced depth.
pub fn source_max(layer_name: &str) -> Option<u8> {
    FIXED_DOMAIN
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(layer_name))
        .map(|&(_, max)| max)
}

/// Rescale an authored byte to the full 0-255 range.
///
/// Layers outside the fixed-domain table pass through unchanged. Zero always
/// maps to zero and any non-zero input maps to a non-zero output, so the
/// "painted" test gives the same answer before and after remapping.
pub fn remap(layer_name: &str, raw: u8) -> u8 {
    match source_max(layer_name) {
        Some(src_max) if src_max > 0 => {
            let scaled = (raw as f32 * 255.0 / src_max as f32).round();
            scaled.clamp(0.0, 255.0) as u8
        }
        _ => raw,
    }
}

/// Whether a raw authored byte counts as painted.
#[inline]
pub fn is_painted(raw: u8) -> bool {
    raw >= 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remap_endpoints() {
        for kind in LayerKind::all() {
            let Some(max) = kind.source_max() else { continue };
            assert_eq!(remap(kind.name(), 0), 0);
            assert_eq!(remap(kind.name(), max), 255);
        }
    }

    #[test]
    fn test_remap_monotonic() {
        for kind in LayerKind::all() {
            let mut prev = 0u8;
            for raw in 0..=255u8 {
                let value = remap(kind.name(), raw);
                assert!(value >= prev, "{} not monotonic at {}", kind, raw);
                prev = value;
            }
        }
    }

    #[test]
    fn test_remap_rounds_and_clamps() {
        // 8 * 255 / 15 = 136
        assert_eq!(remap("vegetation_forest", 8), 136);
        assert_eq!(remap("vegetation_forest", 1), 17);
        // Beyond the authored domain still saturates to a byte.
        assert_eq!(remap("vegetation_forest", 200), 255);
    }

    #[test]
    fn test_unlisted_layers_pass_through() {
        assert_eq!(remap("ore_multiplier", 9), 9);
        assert_eq!(remap("custom_paint", 200), 200);
    }

    #[test]
    fn test_names_are_case_insensitive() {
        assert_eq!(LayerKind::from_name("WATER_Ocean"), Some(LayerKind::WaterOcean));
        assert_eq!(remap("Climate_Moisture", 15), 255);
        assert_eq!(LayerKind::from_name("roads"), None);
    }

    #[test]
    fn test_remap_preserves_painted() {
        for raw in 0..=15u8 {
            assert_eq!(is_painted(raw), is_painted(remap("water_beach", raw)));
        }
    }
}
