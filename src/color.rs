//! RGB565 color packing.
//!
//! The panel consumes 16-bit 5/6/5 color, two bytes per pixel, high byte
//! first. Down-conversion from 8-bit channels drops the low bits and is
//! lossy by construction; nothing here converts back up.

use embedded_graphics_core::pixelcolor::raw::{RawData, RawU16};
use embedded_graphics_core::pixelcolor::{Rgb565, Rgb888, RgbColor};

use crate::error::ConfigError;

/// Pack 8-bit channels into 16-bit RGB565.
pub fn pack565(r: u8, g: u8, b: u8) -> u16 {
    ((u16::from(r) & 0xF8) << 8) | ((u16::from(g) & 0xFC) << 3) | (u16::from(b) >> 3)
}

/// A packed RGB565 color, ready for the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Color(u16);

impl Color {
    pub const BLACK: Self = Color(0x0000);
    pub const WHITE: Self = Color(0xFFFF);
    pub const RED: Self = Color(0xF800);
    pub const GREEN: Self = Color(0x07E0);
    pub const BLUE: Self = Color(0x001F);

    /// Pack an 8-bit RGB triple.
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Color(pack565(r, g, b))
    }

    /// Parse a `#RRGGBB` hex string (the `#` is optional).
    ///
    /// # Errors
    ///
    /// [`ConfigError::MalformedColor`] unless the input is exactly six hex
    /// digits. No hardware I/O happens on the error path.
    pub fn from_hex(hex: &str) -> Result<Self, ConfigError> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(ConfigError::MalformedColor);
        }
        let channel =
            |s: &str| u8::from_str_radix(s, 16).map_err(|_| ConfigError::MalformedColor);
        Ok(Self::new(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        ))
    }

    /// The raw packed value.
    pub fn raw(self) -> u16 {
        self.0
    }

    /// Wire form, high byte first.
    pub fn to_be_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }
}

impl From<Rgb888> for Color {
    fn from(color: Rgb888) -> Self {
        Self::new(color.r(), color.g(), color.b())
    }
}

impl From<Rgb565> for Color {
    fn from(color: Rgb565) -> Self {
        Color(RawU16::from(color).into_inner())
    }
}

impl From<Color> for Rgb565 {
    fn from(color: Color) -> Self {
        RawU16::new(color.0).into()
    }
}

impl From<(u8, u8, u8)> for Color {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::new(r, g, b)
    }
}
