//! Caller-rendered pixel frames and their wire encoding.
//!
//! A [`Frame`] borrows one fully rendered RGB888 image for the duration of
//! a single blit; the driver never caches it. Encoding resamples to the
//! active panel rectangle when the declared size differs, so the byte count
//! on the wire is always `2 * width * height` of the target.

use alloc::vec::Vec;
use log::debug;

use crate::color::pack565;
use crate::error::ConfigError;

/// A rectangular RGB888 pixel buffer, row-major, top-to-bottom,
/// left-to-right, three bytes per pixel.
#[derive(Clone, Copy, Debug)]
pub struct Frame<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
}

impl<'a> Frame<'a> {
    /// Wrap packed RGB triples with their declared dimensions.
    ///
    /// # Errors
    ///
    /// [`ConfigError::EmptyFrame`] on zero dimensions,
    /// [`ConfigError::FrameSize`] if `data.len() != width * height * 3`.
    pub fn new(data: &'a [u8], width: u32, height: u32) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::EmptyFrame);
        }
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(ConfigError::FrameSize {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8) {
        let i = ((y * self.width + x) * 3) as usize;
        (self.data[i], self.data[i + 1], self.data[i + 2])
    }
}

/// Encode a frame as the big-endian RGB565 stream for a `width x height`
/// window, resampling first when the declared size differs.
pub(crate) fn encode_stream(frame: &Frame<'_>, width: u32, height: u32) -> Vec<u8> {
    if frame.width == width && frame.height == height {
        return pack_rgb(frame.data);
    }
    debug!(
        "frame {}x{} resampled to {}x{}",
        frame.width, frame.height, width, height
    );
    pack_rgb(&resample(frame, width, height))
}

fn pack_rgb(rgb: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(rgb.len() / 3 * 2);
    for px in rgb.chunks_exact(3) {
        out.extend_from_slice(&pack565(px[0], px[1], px[2]).to_be_bytes());
    }
    out
}

// 16.16 fixed-point source coordinates.
const FP: u32 = 16;

/// Area-average resample to `width x height`. Integer-only; exact on
/// constant-color input.
fn resample(frame: &Frame<'_>, width: u32, height: u32) -> Vec<u8> {
    let x_step = (u64::from(frame.width) << FP) / u64::from(width);
    let y_step = (u64::from(frame.height) << FP) / u64::from(height);

    let mut out = Vec::with_capacity(width as usize * height as usize * 3);
    for oy in 0..u64::from(height) {
        let y0 = oy * y_step;
        let y1 = y0 + y_step;
        for ox in 0..u64::from(width) {
            let x0 = ox * x_step;
            let x1 = x0 + x_step;

            let (mut acc_r, mut acc_g, mut acc_b, mut acc_w) = (0u64, 0u64, 0u64, 0u64);
            for sy in (y0 >> FP)..=((y1 - 1) >> FP) {
                let wy = y1.min((sy + 1) << FP) - y0.max(sy << FP);
                for sx in (x0 >> FP)..=((x1 - 1) >> FP) {
                    let wx = x1.min((sx + 1) << FP) - x0.max(sx << FP);
                    let w = wx * wy >> FP;
                    let (r, g, b) = frame.pixel(sx as u32, sy as u32);
                    acc_r += w * u64::from(r);
                    acc_g += w * u64::from(g);
                    acc_b += w * u64::from(b);
                    acc_w += w;
                }
            }
            out.push(((acc_r + acc_w / 2) / acc_w) as u8);
            out.push(((acc_g + acc_w / 2) / acc_w) as u8);
            out.push(((acc_b + acc_w / 2) / acc_w) as u8);
        }
    }
    out
}
