#![no_std]
#![warn(missing_docs)]

//! Core logic for a crystal-less USB HID serial bridge.
//!
//! Targets microcontrollers that run a software USB engine straight from the
//! internal RC oscillator. No crystal means no trustworthy clock: the only
//! timing reference is one bit-time of a USB Start-of-Frame, which the engine
//! exposes as a single integer frame-length measurement. This crate owns the
//! two pieces with real invariants built on top of that primitive:
//!
//! - [`calibration`]: converges the oscillator trim register onto a target
//!   frequency using noisy, quantized single-sample measurements (binary
//!   search plus neighborhood refinement, with a split-range mode for
//!   oscillators with two overlapping 128-step regions).
//! - [`bridge`]: reassembles host-initiated, length-prefixed, zero-padded
//!   chunked transfers into a clean byte stream, and serializes single bytes
//!   back out through a one-slot egress report.
//!
//! The USB protocol engine itself (enumeration, bit-banging, CRC, endpoint
//! management) is an external collaborator, reached only through the
//! capability traits in each module. So are the trim register, the
//! nonvolatile store, and the watchdog. That keeps the whole core
//! deterministic and host-testable with scripted fakes.
//!
//! # Main loop
//!
//! ```no_run
//! use vusb_hid_serial::{CalibrationStore, SearchMode, SerialDevice};
//! # use vusb_hid_serial::{FrameTimer, NonvolatileByte, ReportSink, TrimRegister, Watchdog};
//! # struct Trim(u8);
//! # impl TrimRegister for Trim {
//! #     fn get(&self) -> u8 { self.0 }
//! #     fn set(&mut self, value: u8) { self.0 = value; }
//! # }
//! # struct Timer;
//! # impl FrameTimer for Timer {
//! #     fn measure_frame_length(&mut self) -> u16 { 0 }
//! # }
//! # struct Eeprom;
//! # impl NonvolatileByte for Eeprom {
//! #     fn read(&mut self) -> u8 { 0xFF }
//! #     fn write(&mut self, _: u8) {}
//! # }
//! # struct Engine;
//! # impl ReportSink for Engine {
//! #     fn interrupt_ready(&mut self) -> bool { true }
//! #     fn send_report(&mut self, _: &[u8; 8]) {}
//! # }
//! # struct Wdt;
//! # impl Watchdog for Wdt {
//! #     fn feed(&mut self) {}
//! # }
//! # let (mut trim, mut timer, mut engine, mut wdt) = (Trim(0), Timer, Engine, Wdt);
//! let mut store = CalibrationStore::new(Eeprom);
//! let mut device = SerialDevice::new(SearchMode::SingleRange);
//!
//! // Best-effort starting point from the previous run, then calibrate
//! // for real once the engine reports reset-ready.
//! store.restore_into(&mut trim);
//! device.on_reset_ready(&mut trim, &mut timer, &mut store);
//!
//! loop {
//!     // The platform polls the USB engine here, then:
//!     device.service(&mut wdt, &mut engine);
//!     let mut buf = [0u8; 32];
//!     if let Some(len) = device.read(&mut buf) {
//!         if len > 0 {
//!             device.write(buf[0]); // echo first byte back to the host
//!         }
//!     }
//! }
//! ```

#[cfg(feature = "defmt")]
use defmt as _;

pub mod bridge;
pub mod calibration;
pub mod config;
pub mod control;
pub mod device;
pub mod store;

pub use bridge::{InboundState, ReportSink, SerialBridge};
pub use calibration::{
    frame_length_target, CalibrationResult, Calibrator, FrameTimer, SearchMode, TrimRegister,
};
pub use control::{ControlDispatcher, SetupAction, SetupPacket};
pub use device::{SerialDevice, UsbPort, Watchdog};
pub use store::{CalibrationStore, NonvolatileByte, TRIM_UNSET};
