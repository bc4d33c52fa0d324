//! Byte channels inside host map cells.
//!
//! Scalar maps store one byte-range value per cell. The climate map packs
//! three independent bytes into one cell; writing one channel must leave the
//! other two bit-for-bit unchanged.

/// Read/write access to one byte channel of an `i32` map cell.
pub trait CellChannel {
    fn read(&self, cell: i32) -> u8;
    fn write(&self, cell: i32, value: u8) -> i32;
}

/// Whole cell holds a single byte-range value.
#[derive(Clone, Copy, Debug, Default)]
pub struct Scalar;

impl CellChannel for Scalar {
    #[inline]
    fn read(&self, cell: i32) -> u8 {
        cell.clamp(0, 255) as u8
    }

    #[inline]
    fn write(&self, _cell: i32, value: u8) -> i32 {
        value as i32
    }
}

/// Climate axes packed as `temperature << 16 | moisture << 8 | tectonic`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClimateChannel {
    Temperature,
    Moisture,
    Tectonic,
}

impl ClimateChannel {
    pub fn all() -> &'static [Self] {
        &[Self::Temperature, Self::Moisture, Self::Tectonic]
    }

    #[inline]
    pub fn shift(&self) -> u32 {
        match self {
            Self::Temperature => 16,
            Self::Moisture => 8,
            Self::Tectonic => 0,
        }
    }
}

impl CellChannel for ClimateChannel {
    #[inline]
    fn read(&self, cell: i32) -> u8 {
        ((cell >> self.shift()) & 0xFF) as u8
    }

    #[inline]
    fn write(&self, cell: i32, value: u8) -> i32 {
        let mask = 0xFF << self.shift();
        (cell & !mask) | ((value as i32) << self.shift())
    }
}

/// Compose a packed climate cell.
pub fn pack_climate(temperature: u8, moisture: u8, tectonic: u8) -> i32 {
    ((temperature as i32) << 16) | ((moisture as i32) << 8) | tectonic as i32
}

/// Split a packed climate cell into `(temperature, moisture, tectonic)`.
pub fn unpack_climate(cell: i32) -> (u8, u8, u8) {
    (
        ClimateChannel::Temperature.read(cell),
        ClimateChannel::Moisture.read(cell),
        ClimateChannel::Tectonic.read(cell),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_unpack() {
        let cell = pack_climate(200, 17, 255);
        assert_eq!(unpack_climate(cell), (200, 17, 255));
        assert_eq!(cell, 0x00C8_11FF);
    }

    #[test]
    fn test_write_preserves_other_channels() {
        // High byte is not a climate axis but must survive writes untouched.
        let cell = 0x7F00_0000 | pack_climate(10, 20, 30);
        let moved = ClimateChannel::Moisture.write(cell, 99);
        assert_eq!(unpack_climate(moved), (10, 99, 30));
        assert_eq!(moved & 0x7F00_0000, 0x7F00_0000);
        assert_eq!(ClimateChannel::Moisture.write(moved, 20), cell);
    }

    #[test]
    fn test_scalar_clamps_reads() {
        assert_eq!(Scalar.read(-4), 0);
        assert_eq!(Scalar.read(300), 255);
        assert_eq!(Scalar.write(77, 12), 12);
    }
}
