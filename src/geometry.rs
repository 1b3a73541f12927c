//! Rotation-dependent panel geometry.
//!
//! The 0.96" bar panel exposes an 80x160 visible window that sits offset
//! inside the controller's larger addressable memory. Rotating the logical
//! frame swaps the active dimensions and the offset pair along with the
//! MADCTL axis bits; everything here is a pure function of [`Rotation`] so
//! it can be exercised without hardware.

use crate::command::{MADCTL_MV, MADCTL_MX, MADCTL_MY, MADCTL_RGB};
use crate::error::ConfigError;

/// Native panel width in pixels at rotation 0.
pub const WIDTH: u16 = 80;
/// Native panel height in pixels at rotation 0.
pub const HEIGHT: u16 = 160;

/// Logical display rotation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Convert a rotation given in degrees, modulo 360.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidRotation`] unless the value reduces to one of
    /// 0, 90, 180 or 270.
    pub fn from_degrees(degrees: u16) -> Result<Self, ConfigError> {
        match degrees % 360 {
            0 => Ok(Rotation::Deg0),
            90 => Ok(Rotation::Deg90),
            180 => Ok(Rotation::Deg180),
            270 => Ok(Rotation::Deg270),
            _ => Err(ConfigError::InvalidRotation(degrees)),
        }
    }

    /// The rotation in degrees.
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// MADCTL orientation bits for this rotation.
    ///
    /// 180 degrees is the raw panel scan order; the other rotations mirror
    /// and/or swap axes relative to it.
    pub(crate) fn madctl(self) -> u8 {
        match self {
            Rotation::Deg0 => MADCTL_RGB | MADCTL_MX | MADCTL_MY,
            Rotation::Deg90 => MADCTL_RGB | MADCTL_MY | MADCTL_MV,
            Rotation::Deg180 => MADCTL_RGB,
            Rotation::Deg270 => MADCTL_RGB | MADCTL_MX | MADCTL_MV,
        }
    }

    /// Active (width, height): the native pair, swapped when the axes are.
    pub fn dimensions(self) -> (u16, u16) {
        if self.swaps_axes() {
            (HEIGHT, WIDTH)
        } else {
            (WIDTH, HEIGHT)
        }
    }

    /// Active offset of the visible window inside controller memory,
    /// derived from the hardware offset pair measured at rotation 0.
    pub fn offset(self, hw_offset: (u16, u16)) -> (u16, u16) {
        if self.swaps_axes() {
            (hw_offset.1, hw_offset.0)
        } else {
            hw_offset
        }
    }

    fn swaps_axes(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}
