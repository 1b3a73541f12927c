//! Panel driver facade: bring-up, rotation, fills and frame blits.
//!
//! A [`Panel`] owns its bus interface and delay exclusively and is fully
//! synchronous; every operation blocks for the duration of the transfer.
//! Steady-state transfer faults trigger a best-effort bus recovery and are
//! absorbed or surfaced according to [`FaultPolicy`]. Bring-up faults are
//! always fatal: no valid fallback state exists before the panel has
//! initialized once.

use embedded_graphics_core::geometry::{OriginDimensions, Size};
use embedded_hal::delay::DelayNs;
use log::{debug, error, info, warn};

use crate::color::Color;
use crate::command as cmd;
use crate::error::Error;
use crate::frame::{Frame, encode_stream};
use crate::geometry::Rotation;
use crate::interface::{MAX_TRANSFER_SIZE, PanelInterface};

/// How steady-state transfer faults are reported to the caller.
///
/// Recovery is attempted under both policies; the flag only controls
/// whether the originating fault is surfaced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FaultPolicy {
    /// Absorb faults after recovery. A status display keeps running on a
    /// glitchy bus at the cost of the occasional dropped frame.
    #[default]
    Resilient,
    /// Surface faults as [`Error::Transfer`].
    Strict,
}

/// Construction-time panel configuration.
///
/// The bus, chip select, clock and control lines are carried by the
/// interface handed to [`Panel::open`]; this struct holds the remaining
/// panel parameters.
#[derive(Clone, Copy, Debug)]
pub struct PanelConfig {
    /// Initial rotation.
    pub rotation: Rotation,
    /// Drive the panel in inverted-color mode.
    pub invert: bool,
    /// Offset of the visible window inside controller memory at rotation 0.
    /// 84-pin style bar modules sit at (24, 0).
    pub offset: (u16, u16),
    /// Transfer-fault reporting policy.
    pub fault_policy: FaultPolicy,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            rotation: Rotation::Deg0,
            invert: false,
            offset: (24, 0),
            fault_policy: FaultPolicy::Resilient,
        }
    }
}

/// Proof that an addressing window was just primed.
///
/// Produced only by [`Panel::set_window`] and consumed by
/// [`Panel::write_pixels`], so a pixel payload cannot be issued without the
/// window set that must directly precede it.
#[derive(Debug)]
pub struct PrimedWindow {
    bytes: usize,
}

impl PrimedWindow {
    /// Payload length the primed window expects, in bytes.
    pub fn byte_len(&self) -> usize {
        self.bytes
    }
}

/// Driver for an ST7735S bar panel.
pub struct Panel<IF: PanelInterface, D> {
    bus: IF,
    delay: D,
    config: PanelConfig,
    rotation: Rotation,
    width: u16,
    height: u16,
    x_offset: u16,
    y_offset: u16,
    closed: bool,
}

impl<IF, D> Panel<IF, D>
where
    IF: PanelInterface,
    D: DelayNs,
{
    /// Bring the panel from reset to a displaying, black-filled state.
    ///
    /// Runs the hardware reset, switches the backlight on, executes the
    /// controller init sequence, applies the configured rotation and fills
    /// the active rectangle with black.
    ///
    /// # Errors
    ///
    /// [`Error::BringUp`] on any failure; the interface is closed before
    /// returning, so no resources leak from a half-constructed panel.
    pub fn open(bus: IF, delay: D, config: PanelConfig) -> Result<Self, Error<IF::Error>> {
        let (width, height) = config.rotation.dimensions();
        let (x_offset, y_offset) = config.rotation.offset(config.offset);
        let mut panel = Self {
            bus,
            delay,
            config,
            rotation: config.rotation,
            width,
            height,
            x_offset,
            y_offset,
            closed: false,
        };

        if let Err(e) = panel.bring_up() {
            panel.close();
            return Err(Error::BringUp(e));
        }

        info!(
            "panel ready (rotation={}, offset=({}, {}))",
            panel.rotation.degrees(),
            config.offset.0,
            config.offset.1
        );
        Ok(panel)
    }

    /// Re-orient the panel and re-prime the full-frame window.
    pub fn set_rotation(&mut self, rotation: Rotation) -> Result<(), Error<IF::Error>> {
        self.check_open()?;
        match self.apply_rotation(rotation) {
            Ok(()) => Ok(()),
            Err(e) => self.handle_fault(e),
        }
    }

    /// Solid-fill the active rectangle.
    pub fn fill(&mut self, color: Color) -> Result<(), Error<IF::Error>> {
        self.check_open()?;
        match self.fill_raw(color) {
            Ok(()) => Ok(()),
            Err(e) => self.handle_fault(e),
        }
    }

    /// Blit a rendered frame to the panel.
    ///
    /// A frame whose declared size differs from the active rectangle is
    /// resampled to fit; this is a silent normalization, not an error. The
    /// wire always carries exactly `2 * width * height` bytes.
    pub fn display(&mut self, frame: &Frame<'_>) -> Result<(), Error<IF::Error>> {
        self.check_open()?;
        let stream = encode_stream(frame, u32::from(self.width), u32::from(self.height));
        let result = (|| {
            let window = self.prime_window(0, 0, self.width - 1, self.height - 1)?;
            self.write_pixels_raw(window, &stream)
        })();
        match result {
            Ok(()) => Ok(()),
            Err(e) => self.handle_fault(e),
        }
    }

    /// Prime the addressing window for a pixel payload that directly
    /// follows. Coordinates are inclusive, in active-rotation logical
    /// space; the active offset is applied before transmission.
    pub fn set_window(
        &mut self,
        x0: u16,
        y0: u16,
        x1: u16,
        y1: u16,
    ) -> Result<PrimedWindow, Error<IF::Error>> {
        self.check_open()?;
        match self.prime_window(x0, y0, x1, y1) {
            Ok(window) => Ok(window),
            Err(e) => {
                // Under the resilient policy the token is still handed out;
                // the following transfer lands on the recovered panel or
                // faults again.
                let bytes = window_bytes(x0, y0, x1, y1);
                self.handle_fault(e).map(|()| PrimedWindow { bytes })
            }
        }
    }

    /// Stream a pixel payload into a just-primed window.
    pub fn write_pixels(
        &mut self,
        window: PrimedWindow,
        data: &[u8],
    ) -> Result<(), Error<IF::Error>> {
        self.check_open()?;
        match self.write_pixels_raw(window, data) {
            Ok(()) => Ok(()),
            Err(e) => self.handle_fault(e),
        }
    }

    /// Switch the backlight. Failures are logged, never fatal.
    pub fn backlight(&mut self, on: bool) {
        if self.closed {
            return;
        }
        if let Err(e) = self.bus.backlight(on) {
            warn!("backlight control failed: {e:?}");
        }
    }

    /// Current rotation.
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Active width in pixels.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Active height in pixels.
    pub fn height(&self) -> u16 {
        self.height
    }

    // ── Raw operations (faults propagate; callers apply the policy) ─────

    fn bring_up(&mut self) -> Result<(), IF::Error> {
        self.bus.reset(&mut self.delay);
        if let Err(e) = self.bus.backlight(true) {
            warn!("backlight on failed: {e:?}");
        }
        self.run_init(self.config.invert)?;
        self.apply_rotation(self.config.rotation)?;
        self.fill_raw(Color::BLACK)
    }

    /// Controller init sequence. Ordering and settle delays are the
    /// ST7735S power-up contract; skipping or reordering steps yields a
    /// panel that accepts commands but displays garbage.
    fn run_init(&mut self, invert: bool) -> Result<(), IF::Error> {
        self.bus.write_command(cmd::SWRESET)?;
        self.delay.delay_ms(150);

        self.bus.write_command(cmd::SLPOUT)?;
        self.delay.delay_ms(500);

        // Frame rate control: normal, idle, partial
        self.bus.write_command(cmd::FRMCTR1)?;
        self.bus.write_data(&[0x01, 0x2C, 0x2D])?;
        self.bus.write_command(cmd::FRMCTR2)?;
        self.bus.write_data(&[0x01, 0x2C, 0x2D])?;
        self.bus.write_command(cmd::FRMCTR3)?;
        self.bus.write_data(&[0x01, 0x2C, 0x2D, 0x01, 0x2C, 0x2D])?;

        self.bus.write_command(cmd::INVCTR)?;
        self.bus.write_data(&[0x07])?;

        // Power control
        self.bus.write_command(cmd::PWCTR1)?;
        self.bus.write_data(&[0xA2, 0x02, 0x84])?;
        self.bus.write_command(cmd::PWCTR2)?;
        self.bus.write_data(&[0xC5])?;
        self.bus.write_command(cmd::PWCTR3)?;
        self.bus.write_data(&[0x0A, 0x00])?;
        self.bus.write_command(cmd::PWCTR4)?;
        self.bus.write_data(&[0x8A, 0x2A])?;
        self.bus.write_command(cmd::PWCTR5)?;
        self.bus.write_data(&[0x8A, 0xEE])?;

        self.bus.write_command(cmd::VMCTR1)?;
        self.bus.write_data(&[0x0E])?;

        self.bus.write_command(cmd::COLMOD)?;
        self.bus.write_data(&[cmd::COLMOD_16BIT])?;

        self.bus
            .write_command(if invert { cmd::INVON } else { cmd::NORON })?;
        self.delay.delay_ms(10);

        self.bus.write_command(cmd::DISPON)?;
        self.delay.delay_ms(100);
        Ok(())
    }

    fn apply_rotation(&mut self, rotation: Rotation) -> Result<(), IF::Error> {
        self.rotation = rotation;
        (self.width, self.height) = rotation.dimensions();
        (self.x_offset, self.y_offset) = rotation.offset(self.config.offset);

        self.bus.write_command(cmd::MADCTL)?;
        self.bus.write_data(&[rotation.madctl()])?;
        self.prime_window(0, 0, self.width - 1, self.height - 1)?;
        debug!("rotation set to {} degrees", rotation.degrees());
        Ok(())
    }

    fn prime_window(
        &mut self,
        x0: u16,
        y0: u16,
        x1: u16,
        y1: u16,
    ) -> Result<PrimedWindow, IF::Error> {
        let bytes = window_bytes(x0, y0, x1, y1);
        let (cx0, cx1) = (x0 + self.x_offset, x1 + self.x_offset);
        let (cy0, cy1) = (y0 + self.y_offset, y1 + self.y_offset);

        self.bus.write_command(cmd::CASET)?;
        self.bus
            .write_data(&[(cx0 >> 8) as u8, cx0 as u8, (cx1 >> 8) as u8, cx1 as u8])?;
        self.bus.write_command(cmd::RASET)?;
        self.bus
            .write_data(&[(cy0 >> 8) as u8, cy0 as u8, (cy1 >> 8) as u8, cy1 as u8])?;
        self.bus.write_command(cmd::RAMWR)?;
        Ok(PrimedWindow { bytes })
    }

    fn write_pixels_raw(&mut self, window: PrimedWindow, data: &[u8]) -> Result<(), IF::Error> {
        if data.len() != window.byte_len() {
            warn!(
                "pixel payload is {} bytes, window expects {}",
                data.len(),
                window.byte_len()
            );
        }
        self.bus.write_data(data)
    }

    fn fill_raw(&mut self, color: Color) -> Result<(), IF::Error> {
        let window = self.prime_window(0, 0, self.width - 1, self.height - 1)?;

        let [hi, lo] = color.to_be_bytes();
        let mut chunk = [0u8; MAX_TRANSFER_SIZE];
        for px in chunk.chunks_exact_mut(2) {
            px[0] = hi;
            px[1] = lo;
        }

        let mut remaining = window.byte_len();
        while remaining > 0 {
            let n = remaining.min(MAX_TRANSFER_SIZE);
            self.bus.write_data(&chunk[..n])?;
            remaining -= n;
        }
        Ok(())
    }

    // ── Fault handling ───────────────────────────────────────────────────

    /// Recover best-effort, then report the fault per policy.
    fn handle_fault(&mut self, fault: IF::Error) -> Result<(), Error<IF::Error>> {
        error!("bus transfer failed: {fault:?}");
        self.recover();
        match self.config.fault_policy {
            FaultPolicy::Resilient => Ok(()),
            FaultPolicy::Strict => Err(Error::Transfer(fault)),
        }
    }

    /// Reopen the bus, reset, re-init with the last-used invert setting and
    /// reapply the last-used rotation. One attempt per fault; a failed
    /// recovery is logged and the panel stays up for the next operation.
    fn recover(&mut self) {
        warn!("attempting bus recovery");
        match self.try_recover() {
            Ok(()) => info!("bus recovery complete"),
            Err(e) => error!("bus recovery failed: {e:?}"),
        }
    }

    fn try_recover(&mut self) -> Result<(), IF::Error> {
        self.bus.reopen()?;
        self.bus.reset(&mut self.delay);
        self.run_init(self.config.invert)?;
        self.apply_rotation(self.rotation)?;
        Ok(())
    }
}

impl<IF: PanelInterface, D> Panel<IF, D> {
    /// Release the bus and control lines. Safe to call repeatedly; also
    /// invoked on drop.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.bus.close();
        self.closed = true;
    }

    /// Whether the panel has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn check_open(&self) -> Result<(), Error<IF::Error>> {
        if self.closed { Err(Error::Closed) } else { Ok(()) }
    }
}

impl<IF: PanelInterface, D> Drop for Panel<IF, D> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<IF: PanelInterface, D> OriginDimensions for Panel<IF, D> {
    fn size(&self) -> Size {
        Size::new(u32::from(self.width), u32::from(self.height))
    }
}

fn window_bytes(x0: u16, y0: u16, x1: u16, y1: u16) -> usize {
    let pixels = (x1 - x0 + 1) as usize * (y1 - y0 + 1) as usize;
    pixels * 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use alloc::vec::Vec;

    #[derive(Debug, PartialEq)]
    struct Fault;

    /// Records the full command/data traffic; can fail the next write.
    #[derive(Default)]
    struct MockBus {
        commands: Vec<u8>,
        data: Vec<Vec<u8>>,
        writes: Vec<(u8, Vec<u8>)>,
        resets: usize,
        reopens: usize,
        closes: usize,
        fail_next: bool,
    }

    impl MockBus {
        fn should_fail(&mut self) -> bool {
            core::mem::take(&mut self.fail_next)
        }

        /// Data payloads sent after `command`, in order.
        fn data_for(&self, command: u8) -> Vec<&Vec<u8>> {
            self.writes
                .iter()
                .filter(|(c, _)| *c == command)
                .map(|(_, d)| d)
                .collect()
        }
    }

    impl PanelInterface for MockBus {
        type Error = Fault;

        fn write_command(&mut self, command: u8) -> Result<(), Fault> {
            if self.should_fail() {
                return Err(Fault);
            }
            self.commands.push(command);
            Ok(())
        }

        fn write_data(&mut self, data: &[u8]) -> Result<(), Fault> {
            if self.should_fail() {
                return Err(Fault);
            }
            self.data.push(data.to_vec());
            if let Some(&command) = self.commands.last() {
                self.writes.push((command, data.to_vec()));
            }
            Ok(())
        }

        fn reset<DL: DelayNs>(&mut self, _delay: &mut DL) {
            self.resets += 1;
        }

        fn backlight(&mut self, _on: bool) -> Result<(), Fault> {
            Ok(())
        }

        fn reopen(&mut self) -> Result<(), Fault> {
            self.reopens += 1;
            Ok(())
        }

        fn close(&mut self) {
            self.closes += 1;
        }
    }

    struct NoopDelay;

    impl DelayNs for NoopDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    fn open_panel(config: PanelConfig) -> Panel<MockBus, NoopDelay> {
        Panel::open(MockBus::default(), NoopDelay, config).unwrap()
    }

    fn solid_frame(r: u8, g: u8, b: u8, w: u32, h: u32) -> Vec<u8> {
        [r, g, b].repeat((w * h) as usize)
    }

    #[test]
    fn open_runs_the_init_sequence_in_order() {
        let panel = open_panel(PanelConfig::default());
        let expected = [
            cmd::SWRESET,
            cmd::SLPOUT,
            cmd::FRMCTR1,
            cmd::FRMCTR2,
            cmd::FRMCTR3,
            cmd::INVCTR,
            cmd::PWCTR1,
            cmd::PWCTR2,
            cmd::PWCTR3,
            cmd::PWCTR4,
            cmd::PWCTR5,
            cmd::VMCTR1,
            cmd::COLMOD,
            cmd::NORON,
            cmd::DISPON,
            cmd::MADCTL,
            cmd::CASET,
            cmd::RASET,
            cmd::RAMWR,
        ];
        assert_eq!(panel.bus.commands[..expected.len()], expected);
        assert_eq!(panel.bus.resets, 1);
    }

    #[test]
    fn open_honors_the_invert_flag() {
        let panel = open_panel(PanelConfig {
            invert: true,
            ..PanelConfig::default()
        });
        assert!(panel.bus.commands.contains(&cmd::INVON));
        assert!(!panel.bus.commands.contains(&cmd::NORON));
    }

    #[test]
    fn open_fills_the_panel_black() {
        let panel = open_panel(PanelConfig::default());
        let fill_bytes: usize = panel
            .bus
            .data_for(cmd::RAMWR)
            .iter()
            .map(|d| d.len())
            .sum();
        assert_eq!(fill_bytes, 80 * 160 * 2);
        assert!(
            panel
                .bus
                .data_for(cmd::RAMWR)
                .iter()
                .all(|d| d.iter().all(|&b| b == 0x00))
        );
    }

    #[test]
    fn bring_up_failure_is_fatal() {
        let mut bus = MockBus::default();
        bus.fail_next = true;
        let err = Panel::open(bus, NoopDelay, PanelConfig::default())
            .err()
            .expect("bring-up must fail");
        assert!(matches!(err, Error::BringUp(Fault)));
    }

    #[test]
    fn window_coordinates_carry_the_active_offset() {
        // rotation 270 with hardware offset (24, 0): active 160x80,
        // active offset (0, 24)
        let mut panel = open_panel(PanelConfig {
            rotation: Rotation::Deg270,
            ..PanelConfig::default()
        });
        assert_eq!((panel.width(), panel.height()), (160, 80));

        let window = panel.set_window(0, 0, 159, 79).unwrap();
        assert_eq!(window.byte_len(), 160 * 80 * 2);

        let caset = panel.bus.data_for(cmd::CASET);
        let raset = panel.bus.data_for(cmd::RASET);
        assert_eq!(caset.last().unwrap().as_slice(), [0, 0, 0, 159]);
        assert_eq!(raset.last().unwrap().as_slice(), [0, 24, 0, 103]);
    }

    #[test]
    fn rotation_zero_windows_carry_the_raw_hardware_offset() {
        let mut panel = open_panel(PanelConfig::default());
        panel.set_window(0, 0, 79, 159).unwrap();
        assert_eq!(
            panel.bus.data_for(cmd::CASET).last().unwrap().as_slice(),
            [0, 24, 0, 103]
        );
        assert_eq!(
            panel.bus.data_for(cmd::RASET).last().unwrap().as_slice(),
            [0, 0, 0, 159]
        );
    }

    #[test]
    fn set_rotation_reissues_orientation_and_full_window() {
        let mut panel = open_panel(PanelConfig::default());
        panel.set_rotation(Rotation::Deg90).unwrap();
        assert_eq!((panel.width(), panel.height()), (160, 80));
        assert_eq!(
            panel.bus.data_for(cmd::MADCTL).last().unwrap().as_slice(),
            [Rotation::Deg90.madctl()]
        );
        assert_eq!(panel.bus.commands.last(), Some(&cmd::RAMWR));
    }

    #[test]
    fn display_transmits_the_exact_active_byte_count() {
        let mut panel = open_panel(PanelConfig::default());
        // wrong-sized frame still produces a full-panel stream
        let data = solid_frame(0, 0, 255, 40, 40);
        let frame = Frame::new(&data, 40, 40).unwrap();
        panel.display(&frame).unwrap();

        let stream = panel.bus.data_for(cmd::RAMWR).last().unwrap().clone();
        assert_eq!(stream.len(), 80 * 160 * 2);
        assert!(stream.chunks_exact(2).all(|px| px == [0x00, 0x1F]));
    }

    #[test]
    fn end_to_end_red_frame_at_270_degrees() {
        let mut panel = open_panel(PanelConfig {
            rotation: Rotation::Deg270,
            ..PanelConfig::default()
        });
        assert_eq!((panel.width(), panel.height()), (160, 80));

        panel.fill(Color::from_hex("#000000").unwrap()).unwrap();

        let data = solid_frame(255, 0, 0, 160, 80);
        let frame = Frame::new(&data, 160, 80).unwrap();
        panel.display(&frame).unwrap();

        let stream = panel.bus.data_for(cmd::RAMWR).last().unwrap().clone();
        assert_eq!(stream.len(), 160 * 80 * 2);
        assert!(stream.chunks_exact(2).all(|px| px == [0xF8, 0x00]));
    }

    #[test]
    fn fill_streams_bus_maximum_chunks() {
        let mut panel = open_panel(PanelConfig::default());
        let before = panel.bus.data.len();
        panel.fill(Color::WHITE).unwrap();
        let chunks: Vec<usize> = panel.bus.data[before..]
            .iter()
            .map(|d| d.len())
            // skip the CASET/RASET parameter payloads
            .filter(|&len| len > 4)
            .collect();
        assert_eq!(chunks, [4096, 4096, 4096, 4096, 4096, 4096, 1024]);
    }

    #[test]
    fn transfer_fault_during_display_is_absorbed_and_recovered() {
        let mut panel = open_panel(PanelConfig::default());
        let resets_before = panel.bus.resets;

        panel.bus.fail_next = true;
        let data = solid_frame(255, 255, 255, 80, 160);
        let frame = Frame::new(&data, 80, 160).unwrap();
        panel.display(&frame).unwrap();

        assert_eq!(panel.bus.reopens, 1);
        assert_eq!(panel.bus.resets, resets_before + 1);
        assert!(!panel.is_closed());

        // the panel is still usable
        panel.display(&frame).unwrap();
    }

    #[test]
    fn strict_policy_surfaces_transfer_faults() {
        let mut panel = open_panel(PanelConfig {
            fault_policy: FaultPolicy::Strict,
            ..PanelConfig::default()
        });
        panel.bus.fail_next = true;
        match panel.fill(Color::RED) {
            Err(Error::Transfer(Fault)) => {}
            other => panic!("expected Transfer, got {other:?}"),
        }
        // recovery was still attempted
        assert_eq!(panel.bus.reopens, 1);
    }

    #[test]
    fn close_releases_the_bus_exactly_once() {
        let mut panel = open_panel(PanelConfig::default());
        panel.close();
        panel.close();
        assert_eq!(panel.bus.closes, 1);
        assert!(panel.is_closed());

        match panel.fill(Color::BLACK) {
            Err(Error::Closed) => {}
            other => panic!("expected Closed, got {other:?}"),
        }
    }

    #[test]
    fn drop_closes_the_panel() {
        let panel = open_panel(PanelConfig::default());
        drop(panel);
    }

    #[test]
    fn invalid_degrees_are_rejected_without_io() {
        let err = Rotation::from_degrees(123).unwrap_err();
        assert_eq!(err, ConfigError::InvalidRotation(123));
    }
}
