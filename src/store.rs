//! Persistence of the calibrated trim value across power cycles.
//!
//! One byte in nonvolatile storage at a fixed, platform-chosen cell. Writes
//! are assumed to always succeed; there is no versioning and no failure
//! signaling. The erased-flash value 0xFF doubles as the "no stored value"
//! sentinel.

use crate::calibration::TrimRegister;

/// Sentinel meaning "nothing has been stored yet".
pub const TRIM_UNSET: u8 = 0xFF;

/// A single addressable byte of nonvolatile storage.
pub trait NonvolatileByte {
    /// Read the cell.
    fn read(&mut self) -> u8;
    /// Overwrite the cell.
    fn write(&mut self, value: u8);
}

impl<N: NonvolatileByte + ?Sized> NonvolatileByte for &mut N {
    fn read(&mut self) -> u8 {
        N::read(self)
    }
    fn write(&mut self, value: u8) {
        N::write(self, value)
    }
}

/// Loads and saves the last computed trim value.
pub struct CalibrationStore<N: NonvolatileByte> {
    cell: N,
}

impl<N: NonvolatileByte> CalibrationStore<N> {
    /// Wrap the platform's storage cell.
    pub const fn new(cell: N) -> Self {
        Self { cell }
    }

    /// The stored trim value, or `None` if the cell holds the unset
    /// sentinel.
    pub fn load(&mut self) -> Option<u8> {
        match self.cell.read() {
            TRIM_UNSET => None,
            value => Some(value),
        }
    }

    /// Persist a trim value, unconditionally overwriting any previous one.
    pub fn save(&mut self, trim: u8) {
        self.cell.write(trim);
    }

    /// Boot-time preset: write the stored value straight into the trim
    /// register, if there is one. A best-effort starting point that reduces
    /// calibration drift after a prior successful run; returns whether the
    /// register was written.
    pub fn restore_into<T: TrimRegister>(&mut self, trim: &mut T) -> bool {
        match self.load() {
            Some(value) => {
                trim.set(value);
                true
            }
            None => false,
        }
    }
}
