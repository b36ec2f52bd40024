//! Device constants: clock targets, report geometry, HID descriptor.

/// Clock the device's own logic runs at. 2^24 Hz, derived from twice the
/// 2^23 Hz application clock the downstream hardware expects; 1.7% away
/// from the 16.5 MHz the USB engine wants, so it gets its own calibration
/// pass.
pub const DEVICE_CLOCK_HZ: u32 = 16_777_216;

/// Clock the USB engine is tuned for (PLL-derived 16.5 MHz).
pub const USB_CLOCK_HZ: u32 = 16_500_000;

/// Size of the opaque input/output report used for egress.
pub const REPORT_LEN: usize = 8;

/// Capacity of the inbound reassembly buffer. Declared transfer lengths
/// beyond this are silently truncated.
pub const INBOUND_CAPACITY: usize = 32;

/// Size of the GET_REPORT status payload (two little-endian calibration
/// measurements plus the live trim value).
pub const STATUS_PAYLOAD_LEN: usize = 5;

/// How long to hold the bus disconnected at boot so the host re-enumerates.
pub const REENUMERATE_DELAY_MS: u32 = 300;

/// HID report descriptor: one 8-byte opaque input report and one 32-byte
/// buffered feature report. Vendor-defined payload semantics.
pub const REPORT_DESCRIPTOR: [u8; 29] = [
    0x06, 0x00, 0xFF, // USAGE_PAGE (Vendor Defined)
    0x09, 0x01, // USAGE (Vendor Usage 1)
    0xA1, 0x01, // COLLECTION (Application)
    0x15, 0x00, //   LOGICAL_MINIMUM (0)
    0x26, 0xFF, 0x00, //   LOGICAL_MAXIMUM (255)
    0x75, 0x08, //   REPORT_SIZE (8)
    0x95, REPORT_LEN as u8, //   REPORT_COUNT (8)
    0x09, 0x00, //   USAGE (Undefined)
    0x82, 0x02, 0x01, //   INPUT (Data,Var,Abs,Buf)
    0x95, INBOUND_CAPACITY as u8, //   REPORT_COUNT (32)
    0x09, 0x00, //   USAGE (Undefined)
    0xB2, 0x02, 0x01, //   FEATURE (Data,Var,Abs,Buf)
    0xC0, // END_COLLECTION
];
