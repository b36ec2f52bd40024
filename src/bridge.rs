//! Serial bridge: inbound report reassembly and one-slot egress.
//!
//! Inbound, the host pushes a length-prefixed transfer as one or more
//! fixed-size report chunks, zero-padded at the transport's convenience. The
//! bridge strips the padding, reassembles the payload and hands it to the
//! consumer in exactly one read. Outbound, there is no queue at all: one
//! pending byte, overwritten on every write, sent as slot 0 of an otherwise
//! zeroed report whenever the engine's interrupt channel is ready.

use heapless::Vec;

use crate::config::{INBOUND_CAPACITY, REPORT_LEN};

/// Egress capability of the USB engine: a one-report-deep interrupt
/// channel.
pub trait ReportSink {
    /// Whether the interrupt channel can accept another report.
    fn interrupt_ready(&mut self) -> bool;
    /// Hand a report to the engine for delivery.
    fn send_report(&mut self, report: &[u8; REPORT_LEN]);
}

/// Inbound reassembly state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InboundState {
    /// No transfer open.
    Idle,
    /// Transfer open, `remaining` input bytes still expected.
    Receiving {
        /// Input byte positions left before the transfer completes.
        remaining: u8,
    },
    /// Payload frozen, waiting for its single consumer read.
    Ready,
}

/// Inbound reassembly state machine plus the one-slot egress.
///
/// The buffer holds at most [`INBOUND_CAPACITY`] payload bytes and always
/// carries a synthetic zero terminator once [`InboundState::Ready`].
pub struct SerialBridge {
    inbound: Vec<u8, { INBOUND_CAPACITY + 1 }>,
    state: InboundState,
    pending: Option<u8>,
}

impl SerialBridge {
    /// Create an idle bridge.
    pub const fn new() -> Self {
        Self {
            inbound: Vec::new(),
            state: InboundState::Idle,
            pending: None,
        }
    }

    /// Current inbound state.
    pub fn state(&self) -> InboundState {
        self.state
    }

    /// Open a new transfer of `declared_len` input bytes.
    ///
    /// Lengths beyond the buffer capacity are silently truncated to it. A
    /// zero length completes immediately with an empty payload. Any transfer
    /// already in flight is discarded.
    pub fn begin_receive(&mut self, declared_len: u16) {
        self.inbound.clear();
        let len = declared_len.min(INBOUND_CAPACITY as u16) as u8;
        if len == 0 {
            let _ = self.inbound.push(0);
            self.state = InboundState::Ready;
        } else {
            self.state = InboundState::Receiving { remaining: len };
        }
    }

    /// Feed one report chunk into the open transfer. Returns whether the
    /// transfer just completed (so the dispatcher can acknowledge it).
    ///
    /// `remaining` counts input byte positions, not stored bytes: zero bytes
    /// are transport padding and are dropped, but they still consume their
    /// position. A chunk longer than the open remainder is truncated to it.
    /// With no transfer open the chunk is ignored and reported complete.
    pub fn ingest(&mut self, chunk: &[u8]) -> bool {
        let remaining = match self.state {
            InboundState::Receiving { remaining } => remaining,
            _ => return true,
        };

        let take = (remaining as usize).min(chunk.len());
        for &byte in &chunk[..take] {
            if byte != 0 {
                let _ = self.inbound.push(byte);
            }
        }

        let remaining = remaining - take as u8;
        if remaining == 0 {
            let _ = self.inbound.push(0); // terminator
            self.state = InboundState::Ready;
            true
        } else {
            self.state = InboundState::Receiving { remaining };
            false
        }
    }

    /// Consume a completed transfer: copy the payload (up to, excluding, the
    /// zero terminator) into `out` and return its length. Returns `None`
    /// unless a transfer is [`InboundState::Ready`]; exactly one read per
    /// completed transfer, after which the bridge is idle again.
    pub fn poll(&mut self, out: &mut [u8; INBOUND_CAPACITY]) -> Option<usize> {
        if self.state != InboundState::Ready {
            return None;
        }
        let len = self
            .inbound
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.inbound.len());
        out[..len].copy_from_slice(&self.inbound[..len]);
        self.inbound.clear();
        self.state = InboundState::Idle;
        Some(len)
    }

    /// Stage one byte for egress. Last write wins: a byte staged before the
    /// previous one was flushed simply replaces it.
    pub fn write(&mut self, byte: u8) {
        self.pending = Some(byte);
    }

    /// Send the staged byte if the sink's interrupt channel is ready.
    /// Returns whether a report went out.
    pub fn flush<S: ReportSink>(&mut self, sink: &mut S) -> bool {
        if let Some(byte) = self.pending {
            if sink.interrupt_ready() {
                let mut report = [0u8; REPORT_LEN];
                report[0] = byte;
                sink.send_report(&report);
                self.pending = None;
                return true;
            }
        }
        false
    }
}

impl Default for SerialBridge {
    fn default() -> Self {
        Self::new()
    }
}
