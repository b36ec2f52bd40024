//! Mock hardware for exercising the core without a USB engine.
//!
//! The oscillator fake is split the same way the real seams are: a trim
//! register and a frame timer sharing one trim cell, with the timer's
//! response scripted as a deterministic frequency-response function.

use core::cell::Cell;

use embedded_hal::delay::DelayNs;
use vusb_hid_serial::{
    FrameTimer, NonvolatileByte, ReportSink, TrimRegister, UsbPort, Watchdog, TRIM_UNSET,
};

/// Trim register backed by a shared cell so the mock timer can see writes.
pub struct MockTrim<'a>(pub &'a Cell<u8>);

impl TrimRegister for MockTrim<'_> {
    fn get(&self) -> u8 {
        self.0.get()
    }
    fn set(&mut self, value: u8) {
        self.0.set(value);
    }
}

/// Frame timer whose measurement is a pure function of the current trim.
pub struct MockFrameTimer<'a> {
    trim: &'a Cell<u8>,
    response: fn(u8) -> u16,
    pub measurements: usize,
}

impl<'a> MockFrameTimer<'a> {
    pub fn new(trim: &'a Cell<u8>, response: fn(u8) -> u16) -> Self {
        Self {
            trim,
            response,
            measurements: 0,
        }
    }
}

impl FrameTimer for MockFrameTimer<'_> {
    fn measure_frame_length(&mut self) -> u16 {
        self.measurements += 1;
        (self.response)(self.trim.get())
    }
}

/// One byte of fake EEPROM, starting out erased.
pub struct MockEeprom {
    pub cell: u8,
    pub writes: usize,
}

impl MockEeprom {
    pub fn erased() -> Self {
        Self {
            cell: TRIM_UNSET,
            writes: 0,
        }
    }
}

impl NonvolatileByte for MockEeprom {
    fn read(&mut self) -> u8 {
        self.cell
    }
    fn write(&mut self, value: u8) {
        self.cell = value;
        self.writes += 1;
    }
}

/// Interrupt-channel sink that records every report handed to it.
pub struct MockSink {
    pub ready: bool,
    pub sent: Vec<[u8; 8]>,
}

impl MockSink {
    pub fn new(ready: bool) -> Self {
        Self {
            ready,
            sent: Vec::new(),
        }
    }
}

impl ReportSink for MockSink {
    fn interrupt_ready(&mut self) -> bool {
        self.ready
    }
    fn send_report(&mut self, report: &[u8; 8]) {
        self.sent.push(*report);
    }
}

/// Watchdog that counts its feedings.
#[derive(Default)]
pub struct MockWatchdog {
    pub feeds: usize,
}

impl Watchdog for MockWatchdog {
    fn feed(&mut self) {
        self.feeds += 1;
    }
}

/// Bus port recording the attach/detach sequence.
#[derive(Default)]
pub struct MockPort {
    pub events: Vec<&'static str>,
}

impl UsbPort for MockPort {
    fn disconnect(&mut self) {
        self.events.push("disconnect");
    }
    fn connect(&mut self) {
        self.events.push("connect");
    }
}

/// Delay provider that just tallies requested nanoseconds.
#[derive(Default)]
pub struct MockDelay {
    pub total_ns: u64,
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
    }
}
