//! Control request classification and the idle-rate byte.
//!
//! The device speaks the HID class request set over its control endpoint,
//! but only as far as the report plumbing needs: GET/SET_REPORT defer the
//! actual payload work to the read- and write-path providers on
//! [`crate::SerialDevice`], GET/SET_IDLE round-trip one byte of host
//! bookkeeping, and everything else (including vendor requests) gets a
//! zero-length acknowledge.

/// HID class request codes (bRequest).
pub mod request {
    /// Host reads the feature/status report.
    pub const GET_REPORT: u8 = 0x01;
    /// Host reads the idle rate.
    pub const GET_IDLE: u8 = 0x02;
    /// Host writes a report (opens an inbound transfer).
    pub const SET_REPORT: u8 = 0x09;
    /// Host sets the idle rate.
    pub const SET_IDLE: u8 = 0x0A;
}

/// bmRequestType type-field mask and the class value.
const REQUEST_TYPE_MASK: u8 = 0x60;
const REQUEST_TYPE_CLASS: u8 = 0x20;

/// The 8-byte SETUP packet, as handed over by the USB engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetupPacket {
    /// bmRequestType.
    pub request_type: u8,
    /// bRequest.
    pub request: u8,
    /// wValue.
    pub value: u16,
    /// wIndex.
    pub index: u16,
    /// wLength.
    pub length: u16,
}

impl SetupPacket {
    /// Decode the raw 8-byte SETUP data (little-endian words).
    pub fn from_bytes(raw: &[u8; 8]) -> Self {
        Self {
            request_type: raw[0],
            request: raw[1],
            value: u16::from_le_bytes([raw[2], raw[3]]),
            index: u16::from_le_bytes([raw[4], raw[5]]),
            length: u16::from_le_bytes([raw[6], raw[7]]),
        }
    }

    /// Whether this is a class-type request.
    pub fn is_class(&self) -> bool {
        self.request_type & REQUEST_TYPE_MASK == REQUEST_TYPE_CLASS
    }
}

/// What the caller must do next for a classified request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SetupAction {
    /// GET_REPORT: produce the status payload via the read-path provider.
    SendStatus,
    /// GET_IDLE: respond with this stored idle-rate byte.
    SendIdleRate(u8),
    /// SET_REPORT: an inbound transfer of `length` bytes follows chunk by
    /// chunk through the write-path provider.
    ReceiveReport {
        /// Declared transfer length (wLength), not yet clamped.
        length: u16,
    },
    /// Anything else: acknowledge with a zero-length response.
    Ack,
}

/// Classifies control requests and owns the idle-rate byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct ControlDispatcher {
    idle_rate: u8,
}

impl ControlDispatcher {
    /// Dispatcher with the idle rate at its power-on default (0).
    pub const fn new() -> Self {
        Self { idle_rate: 0 }
    }

    /// Classify one SETUP packet, updating the idle rate as a side effect.
    ///
    /// There is only one report type, so the report ID in wValue is not
    /// inspected.
    pub fn dispatch(&mut self, setup: &SetupPacket) -> SetupAction {
        if !setup.is_class() {
            return SetupAction::Ack;
        }
        match setup.request {
            request::GET_REPORT => SetupAction::SendStatus,
            request::GET_IDLE => SetupAction::SendIdleRate(self.idle_rate),
            request::SET_IDLE => {
                // Idle rate travels in the high byte of wValue.
                self.idle_rate = (setup.value >> 8) as u8;
                SetupAction::Ack
            }
            request::SET_REPORT => SetupAction::ReceiveReport {
                length: setup.length,
            },
            _ => SetupAction::Ack,
        }
    }

    /// Current idle-rate byte.
    pub fn idle_rate(&self) -> u8 {
        self.idle_rate
    }
}
