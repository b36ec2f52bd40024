//! High-level device facade: ties the dispatcher, bridge, calibrator and
//! store together the way the firmware's event hooks would.
//!
//! The platform binary owns the actual main loop, the USB engine and the
//! interrupt vectors. It calls in here at three points: once at boot
//! ([`SerialDevice::reenumerate`] plus [`CalibrationStore::restore_into`]),
//! once at the engine's reset-ready event ([`SerialDevice::on_reset_ready`]),
//! and once per loop iteration ([`SerialDevice::service`]).

use embedded_hal::delay::DelayNs;

use crate::bridge::{ReportSink, SerialBridge};
use crate::calibration::{
    frame_length_target, CalibrationResult, Calibrator, FrameTimer, SearchMode, TrimRegister,
};
use crate::config::{
    DEVICE_CLOCK_HZ, INBOUND_CAPACITY, REENUMERATE_DELAY_MS, STATUS_PAYLOAD_LEN, USB_CLOCK_HZ,
};
use crate::control::{ControlDispatcher, SetupAction, SetupPacket};
use crate::store::{CalibrationStore, NonvolatileByte};

/// Supervisory watchdog. The main loop must feed it every iteration;
/// missing the bound interval causes an unconditional full restart, which is
/// the system's only fault-recovery mechanism.
pub trait Watchdog {
    /// Reset the watchdog countdown.
    fn feed(&mut self);
}

/// Bus attach/detach control, used only to force re-enumeration at boot.
pub trait UsbPort {
    /// Pull the device off the bus.
    fn disconnect(&mut self);
    /// Put the device back on the bus.
    fn connect(&mut self);
}

/// The assembled serial-bridge device.
pub struct SerialDevice {
    dispatcher: ControlDispatcher,
    bridge: SerialBridge,
    calibrator: Calibrator,
    device_result: CalibrationResult,
    bus_result: CalibrationResult,
}

impl SerialDevice {
    /// Create the device with the given calibration search mode. Calibration
    /// results start zeroed until [`Self::on_reset_ready`] runs.
    pub const fn new(mode: SearchMode) -> Self {
        Self {
            dispatcher: ControlDispatcher::new(),
            bridge: SerialBridge::new(),
            calibrator: Calibrator::new(mode),
            device_result: CalibrationResult {
                frame_length: 0,
                trim: 0,
            },
            bus_result: CalibrationResult {
                frame_length: 0,
                trim: 0,
            },
        }
    }

    /// Force the host to re-enumerate: drop off the bus, wait out the
    /// disconnect debounce, reattach.
    pub fn reenumerate<P: UsbPort, D: DelayNs>(port: &mut P, delay: &mut D) {
        port.disconnect();
        delay.delay_ms(REENUMERATE_DELAY_MS);
        port.connect();
    }

    /// Reset-ready hook: calibrate for both targets and persist the
    /// device-target trim.
    ///
    /// Runs with all interrupts masked for its full duration; the frame
    /// measurement counts raw cycles and any preemption invalidates it. The
    /// device-target pass runs first so the trim left committed in the
    /// register afterwards is the bus-rate one the USB engine needs. Only
    /// the device-target trim is persisted.
    pub fn on_reset_ready<T, F, N>(
        &mut self,
        trim: &mut T,
        timer: &mut F,
        store: &mut CalibrationStore<N>,
    ) where
        T: TrimRegister,
        F: FrameTimer,
        N: NonvolatileByte,
    {
        let (device_result, bus_result) = critical_section::with(|_| {
            let device = self
                .calibrator
                .calibrate(trim, timer, frame_length_target(DEVICE_CLOCK_HZ));
            let bus = self
                .calibrator
                .calibrate(trim, timer, frame_length_target(USB_CLOCK_HZ));
            (device, bus)
        });
        self.device_result = device_result;
        self.bus_result = bus_result;
        store.save(device_result.trim);
        #[cfg(feature = "defmt")]
        defmt::debug!(
            "calibrated: device trim={} bus trim={}",
            device_result.trim,
            bus_result.trim
        );
    }

    /// Classify one SETUP packet and, for SET_REPORT, open the inbound
    /// transfer. The returned action tells the engine glue what to do for
    /// the data stage.
    pub fn handle_setup(&mut self, setup: &SetupPacket) -> SetupAction {
        let action = self.dispatcher.dispatch(setup);
        if let SetupAction::ReceiveReport { length } = action {
            self.bridge.begin_receive(length);
        }
        action
    }

    /// Read-path provider for GET_REPORT: bus-rate measurement (LE), then
    /// device-target measurement (LE), then the live trim register value.
    pub fn status_report<T: TrimRegister>(&self, trim: &T) -> [u8; STATUS_PAYLOAD_LEN] {
        let mut payload = [0u8; STATUS_PAYLOAD_LEN];
        payload[0..2].copy_from_slice(&self.bus_result.frame_length.to_le_bytes());
        payload[2..4].copy_from_slice(&self.device_result.frame_length.to_le_bytes());
        payload[4] = trim.get();
        payload
    }

    /// Write-path provider: forward one SET_REPORT data-stage chunk into the
    /// bridge. Returns whether the transfer just completed.
    pub fn write_chunk(&mut self, chunk: &[u8]) -> bool {
        self.bridge.ingest(chunk)
    }

    /// Consume a completed inbound transfer, if one is ready.
    pub fn read(&mut self, out: &mut [u8; INBOUND_CAPACITY]) -> Option<usize> {
        self.bridge.poll(out)
    }

    /// Stage one byte for egress (last write wins until flushed).
    pub fn write(&mut self, byte: u8) {
        self.bridge.write(byte);
    }

    /// One main-loop iteration's worth of housekeeping: feed the watchdog,
    /// push pending egress out if the interrupt channel is ready.
    pub fn service<W: Watchdog, S: ReportSink>(&mut self, watchdog: &mut W, sink: &mut S) {
        watchdog.feed();
        self.bridge.flush(sink);
    }

    /// The idle-rate byte the host last configured.
    pub fn idle_rate(&self) -> u8 {
        self.dispatcher.idle_rate()
    }
}
