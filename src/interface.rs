//! Bus transport: command/data framing over SPI plus the panel control
//! lines.
//!
//! The controller distinguishes command and data bytes through the DC line;
//! every transaction is either a single command byte (DC low) or a data
//! payload (DC high) split into chunks the bus can accept in one transfer.

use core::fmt::{self, Debug};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;

/// Largest payload handed to the bus in one physical transfer. Linux spidev
/// and most DMA engines reject anything bigger.
pub const MAX_TRANSFER_SIZE: usize = 4096;

/// Hardware transport to the panel controller.
///
/// Implementations propagate their errors; the fault policy (recover,
/// swallow or surface) belongs to [`Panel`](crate::panel::Panel), which owns
/// the state needed to re-initialize after a fault.
pub trait PanelInterface {
    type Error: Debug;

    /// Drive DC to command state and transfer exactly one byte. No further
    /// line state is restored afterwards.
    fn write_command(&mut self, command: u8) -> Result<(), Self::Error>;

    /// Drive DC to data state and transfer the payload, split into chunks
    /// of at most [`MAX_TRANSFER_SIZE`] bytes. The split is a raw
    /// byte-stream split; chunk boundaries carry no meaning.
    fn write_data(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Hardware reset: RST high, low, high with the panel's mandatory
    /// settle delays (5 ms / 10 ms / 150 ms).
    fn reset<D: DelayNs>(&mut self, delay: &mut D);

    /// Drive the backlight line.
    fn backlight(&mut self, on: bool) -> Result<(), Self::Error>;

    /// Close and reopen the underlying bus handle with its original
    /// configuration, where the platform has such a lifecycle (spidev-style
    /// handles). Transports without one return `Ok(())`.
    fn reopen(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Release the bus handle and control lines. Must be idempotent;
    /// transports that release by drop have nothing to do here.
    fn close(&mut self) {}
}

/// Errors raised by [`SpiInterface`].
#[derive(Debug)]
pub enum InterfaceError<SpiErr, PinErr> {
    /// SPI transfer error.
    Spi(SpiErr),
    /// Control line error.
    Pin(PinErr),
}

impl<SpiErr: Debug, PinErr: Debug> fmt::Display for InterfaceError<SpiErr, PinErr> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterfaceError::Spi(e) => write!(f, "SPI error: {e:?}"),
            InterfaceError::Pin(e) => write!(f, "pin error: {e:?}"),
        }
    }
}

impl<SpiErr: Debug, PinErr: Debug> core::error::Error for InterfaceError<SpiErr, PinErr> {}

/// [`PanelInterface`] over embedded-hal 1.0 traits.
///
/// `SPI` is a [`SpiDevice`] carrying the bus, chip select and clock
/// configuration; `DC`, `RST` and `BL` are the data/command, reset and
/// backlight lines. All four are owned exclusively for the lifetime of the
/// interface and released when it drops.
pub struct SpiInterface<SPI, DC, RST, BL> {
    spi: SPI,
    dc: DC,
    rst: RST,
    bl: BL,
}

impl<SPI, DC, RST, BL> SpiInterface<SPI, DC, RST, BL> {
    pub fn new(spi: SPI, dc: DC, rst: RST, bl: BL) -> Self {
        Self { spi, dc, rst, bl }
    }
}

impl<SPI, DC, RST, BL, PinErr> PanelInterface for SpiInterface<SPI, DC, RST, BL>
where
    SPI: SpiDevice,
    SPI::Error: Debug,
    DC: OutputPin<Error = PinErr>,
    RST: OutputPin<Error = PinErr>,
    BL: OutputPin<Error = PinErr>,
    PinErr: Debug,
{
    type Error = InterfaceError<SPI::Error, PinErr>;

    fn write_command(&mut self, command: u8) -> Result<(), Self::Error> {
        self.dc.set_low().map_err(InterfaceError::Pin)?;
        self.spi.write(&[command]).map_err(InterfaceError::Spi)
    }

    fn write_data(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.dc.set_high().map_err(InterfaceError::Pin)?;
        for chunk in data.chunks(MAX_TRANSFER_SIZE) {
            self.spi.write(chunk).map_err(InterfaceError::Spi)?;
        }
        Ok(())
    }

    fn reset<D: DelayNs>(&mut self, delay: &mut D) {
        let _ = self.rst.set_high();
        delay.delay_ms(5);
        let _ = self.rst.set_low();
        delay.delay_ms(10);
        let _ = self.rst.set_high();
        delay.delay_ms(150);
    }

    fn backlight(&mut self, on: bool) -> Result<(), Self::Error> {
        if on {
            self.bl.set_high().map_err(InterfaceError::Pin)
        } else {
            self.bl.set_low().map_err(InterfaceError::Pin)
        }
    }
}
