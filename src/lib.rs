//! Driver for ST7735S-based 0.96" 80x160 bar TFT panels.
//!
//! The panel speaks a command/data protocol over SPI with three extra
//! control lines (data/command select, reset, backlight). This crate brings
//! the controller from reset to a displaying state, handles rotation and
//! the offset of the visible window inside controller memory, converts
//! caller-rendered RGB888 frames to the panel's big-endian RGB565 format
//! and streams them in bus-sized chunks, recovering best-effort from
//! transfer faults so an always-on status display survives bus glitches.
//!
//! ```rust,ignore
//! use st7735s::{Frame, Panel, PanelConfig, Rotation, SpiInterface};
//!
//! let iface = SpiInterface::new(spi_device, dc_pin, rst_pin, bl_pin);
//! let mut panel = Panel::open(
//!     iface,
//!     delay,
//!     PanelConfig {
//!         rotation: Rotation::Deg270,
//!         ..PanelConfig::default()
//!     },
//! )?;
//!
//! // one fully rendered RGB888 frame per refresh cycle
//! let frame = Frame::new(&pixels, 160, 80)?;
//! panel.display(&frame)?;
//! ```
//!
//! Fully synchronous and single-owner: the bus and control lines belong to
//! one `Panel` for its lifetime, and callers serialize access by ownership.

// command:   ST7735S command bytes and MADCTL bits
// interface: command/data framing, chunked transfers, control lines
// geometry:  rotation -> orientation bits, active dimensions and offsets
// color:     RGB565 packing and hex parsing
// frame:     caller-rendered RGB888 frames, resampling, wire encoding
// panel:     facade - bring-up, rotation, fill, blit, fault recovery

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod color;
pub mod command;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod interface;
pub mod panel;

pub use color::{Color, pack565};
pub use error::{ConfigError, Error};
pub use frame::Frame;
pub use geometry::{HEIGHT, Rotation, WIDTH};
pub use interface::{InterfaceError, MAX_TRANSFER_SIZE, PanelInterface, SpiInterface};
pub use panel::{FaultPolicy, Panel, PanelConfig, PrimedWindow};
