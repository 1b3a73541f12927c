// ST7735S command set, the subset used for bring-up, orientation and
// pixel streaming.

pub const SWRESET: u8 = 0x01;
pub const SLPOUT: u8 = 0x11;
pub const NORON: u8 = 0x20;
pub const INVON: u8 = 0x21;
pub const DISPON: u8 = 0x29;
pub const CASET: u8 = 0x2A;
pub const RASET: u8 = 0x2B;
pub const RAMWR: u8 = 0x2C;
pub const MADCTL: u8 = 0x36;
pub const COLMOD: u8 = 0x3A;
pub const FRMCTR1: u8 = 0xB1;
pub const FRMCTR2: u8 = 0xB2;
pub const FRMCTR3: u8 = 0xB3;
pub const INVCTR: u8 = 0xB4;
pub const PWCTR1: u8 = 0xC0;
pub const PWCTR2: u8 = 0xC1;
pub const PWCTR3: u8 = 0xC2;
pub const PWCTR4: u8 = 0xC3;
pub const PWCTR5: u8 = 0xC4;
pub const VMCTR1: u8 = 0xC5;

// MADCTL orientation bits
pub const MADCTL_RGB: u8 = 0x00;
pub const MADCTL_MV: u8 = 0x20; // swap row/column addressing
pub const MADCTL_MX: u8 = 0x40; // mirror X
pub const MADCTL_MY: u8 = 0x80; // mirror Y

/// COLMOD parameter for 16-bit-per-pixel (RGB565) interface format.
pub const COLMOD_16BIT: u8 = 0x05;
