//! RC oscillator self-calibration against the USB Start-of-Frame reference.
//!
//! A Start-of-Frame bit-time is the only clock reference available before
//! enumeration completes. The engine turns it into one integer frame-length
//! measurement proportional to the real oscillator frequency; this module
//! drives the trim register through a search that minimizes the distance
//! between that measurement and a precomputed target.
//!
//! The search has no failure path. It always performs a fixed number of
//! measurements (8 + 3 in single-range mode, 2 × 7 in split-range mode) and
//! always commits *some* trim value, regardless of measurement noise.
//!
//! Calibration counts raw cycles, so the caller must hold all interrupts
//! masked for the full duration of [`Calibrator::calibrate`]; any preemption
//! invalidates the measurement. [`crate::SerialDevice::on_reset_ready`] does
//! this via `critical_section`.

/// Oscillator trim register capability. A single 8-bit hardware register;
/// writes take effect before the next frame measurement.
pub trait TrimRegister {
    /// Read the current trim value.
    fn get(&self) -> u8;
    /// Write a new trim value.
    fn set(&mut self, value: u8);
}

/// Frame timing capability: one integer measurement sampled over one USB
/// frame, proportional to the real oscillator frequency.
pub trait FrameTimer {
    /// Measure the length of one bus frame in CPU cycles.
    fn measure_frame_length(&mut self) -> u16;
}

/// Frame-length target for a clock frequency: `round(1499 * hz / 10.5e6)`.
///
/// Computed once per target at startup; all subsequent arithmetic is
/// integer-only.
pub const fn frame_length_target(clock_hz: u32) -> u16 {
    ((1499 * clock_hz as u64 + 5_250_000) / 10_500_000) as u16
}

/// Which trim-register topology the search assumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SearchMode {
    /// One monotonic 0..=255 range.
    #[default]
    SingleRange,
    /// Two overlapping 128-value regions with independent monotonic
    /// response (version 5.x oscillators); each region is searched on its
    /// own and the globally best probe wins.
    SplitRange,
}

/// Outcome of one calibration pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationResult {
    /// The winning measurement, reported as target plus absolute deviation.
    pub frame_length: u16,
    /// The trim value committed to the register.
    pub trim: u8,
}

/// Drives a [`TrimRegister`] and [`FrameTimer`] through the frequency
/// search.
#[derive(Debug, Clone, Copy, Default)]
pub struct Calibrator {
    mode: SearchMode,
}

impl Calibrator {
    /// Create a calibrator for the given register topology.
    pub const fn new(mode: SearchMode) -> Self {
        Self { mode }
    }

    /// Converge the trim register onto `target`, commit the winning value
    /// and return it together with its deviation-adjusted measurement.
    pub fn calibrate<T, F>(&self, trim: &mut T, timer: &mut F, target: u16) -> CalibrationResult
    where
        T: TrimRegister,
        F: FrameTimer,
    {
        match self.mode {
            SearchMode::SingleRange => Self::single_range(trim, timer, target),
            SearchMode::SplitRange => Self::split_range(trim, timer, target),
        }
    }

    /// Binary search over the full range, then a 3-point neighborhood pass.
    ///
    /// The measurement is quantized, so after the 8 halving steps the
    /// candidate is only guaranteed to be within one trim unit of optimal;
    /// the neighborhood pass resolves that last rounding ambiguity.
    fn single_range<T, F>(trim: &mut T, timer: &mut F, target: u16) -> CalibrationResult
    where
        T: TrimRegister,
        F: FrameTimer,
    {
        let mut candidate: u8 = 0;
        let mut step: u8 = 128;
        while step > 0 {
            trim.set(candidate + step);
            let x = timer.measure_frame_length();
            if x < target {
                // frequency still too low
                candidate += step;
            }
            step >>= 1;
        }

        // Neighborhood refinement: first minimum wins. The wrap at 0/255 is
        // deliberate; it keeps the measurement count fixed at exactly three.
        let mut best_trim = candidate.wrapping_sub(1);
        trim.set(best_trim);
        let mut best_dev = timer.measure_frame_length().abs_diff(target);
        for t in [candidate, candidate.wrapping_add(1)] {
            trim.set(t);
            let dev = timer.measure_frame_length().abs_diff(target);
            if dev < best_dev {
                best_dev = dev;
                best_trim = t;
            }
        }

        trim.set(best_trim);
        CalibrationResult {
            frame_length: target.saturating_add(best_dev),
            trim: best_trim,
        }
    }

    /// Independent binary search inside each 128-wide region, tracking the
    /// single best probe seen anywhere. No separate refinement pass: with
    /// seven probes per region every neighbor of the converged candidate has
    /// already been measured or dominated.
    fn split_range<T, F>(trim: &mut T, timer: &mut F, target: u16) -> CalibrationResult
    where
        T: TrimRegister,
        F: FrameTimer,
    {
        let mut best_trim: u8 = 0;
        let mut best_dev = u16::MAX;
        for base in [0u8, 128u8] {
            let mut candidate = base;
            let mut step: u8 = 64;
            while step > 0 {
                let probe = candidate + step;
                trim.set(probe);
                let x = timer.measure_frame_length();
                let dev = x.abs_diff(target);
                if dev < best_dev {
                    best_dev = dev;
                    best_trim = probe;
                }
                if x < target {
                    candidate = probe;
                }
                step >>= 1;
            }
        }

        trim.set(best_trim);
        CalibrationResult {
            frame_length: target.saturating_add(best_dev),
            trim: best_trim,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    struct SharedTrim<'a>(&'a Cell<u8>);

    impl TrimRegister for SharedTrim<'_> {
        fn get(&self) -> u8 {
            self.0.get()
        }
        fn set(&mut self, value: u8) {
            self.0.set(value);
        }
    }

    struct ScriptedTimer<'a> {
        trim: &'a Cell<u8>,
        measurements: &'a Cell<usize>,
        response: fn(u8) -> u16,
    }

    impl FrameTimer for ScriptedTimer<'_> {
        fn measure_frame_length(&mut self) -> u16 {
            self.measurements.set(self.measurements.get() + 1);
            (self.response)(self.trim.get())
        }
    }

    fn run(
        mode: SearchMode,
        target: u16,
        response: fn(u8) -> u16,
    ) -> (CalibrationResult, u8, usize) {
        let trim = Cell::new(0u8);
        let measurements = Cell::new(0usize);
        let result = Calibrator::new(mode).calibrate(
            &mut SharedTrim(&trim),
            &mut ScriptedTimer {
                trim: &trim,
                measurements: &measurements,
                response,
            },
            target,
        );
        (result, trim.get(), measurements.get())
    }

    #[test]
    fn target_rounding() {
        assert_eq!(frame_length_target(16_500_000), 2356);
        assert_eq!(frame_length_target(16_777_216), 2395);
    }

    #[test]
    fn single_range_converges_on_exact_hit() {
        // f(t) = 1500 + 5t: target 2395 is hit exactly at t = 179.
        let (result, committed, count) = run(SearchMode::SingleRange, 2395, |t| {
            1500 + 5 * t as u16
        });
        assert_eq!(result.trim, 179);
        assert_eq!(committed, 179);
        assert_eq!(result.frame_length, 2395);
        assert_eq!(count, 8 + 3);
    }

    #[test]
    fn single_range_picks_nearest_on_inexact_target() {
        // Target 2356 falls between t = 171 (2355) and t = 172 (2360).
        let (result, committed, _) = run(SearchMode::SingleRange, 2356, |t| 1500 + 5 * t as u16);
        assert_eq!(result.trim, 171);
        assert_eq!(committed, 171);
        assert_eq!(result.frame_length, 2357);
    }

    #[test]
    fn single_range_tie_keeps_first_candidate() {
        // Flat response: every probe deviates equally, so the first
        // neighborhood candidate (binary result minus one) must win.
        let (result, _, count) = run(SearchMode::SingleRange, 2400, |_| 2300);
        assert_eq!(count, 11);
        // Every probe reads low, so the binary search commits every step
        // and the candidate ends at 255; the first refinement probe is 254.
        assert_eq!(result.trim, 254);
        assert_eq!(result.frame_length, 2400 + 100);
    }

    #[test]
    fn single_range_result_beats_all_excluded_trims() {
        let response = |t: u8| 1500 + 5 * t as u16;
        let target = 2398; // between two trim steps
        let (result, _, _) = run(SearchMode::SingleRange, target, response);
        let winning_dev = response(result.trim).abs_diff(target);
        // Only the 3-candidate neighborhood may beat the winner.
        let neighborhood = [
            result.trim.wrapping_sub(1),
            result.trim,
            result.trim.wrapping_add(1),
        ];
        for t in 0..=255u8 {
            if !neighborhood.contains(&t) {
                assert!(response(t).abs_diff(target) >= winning_dev, "trim {t}");
            }
        }
    }

    #[test]
    fn split_range_tracks_global_best() {
        // Region 0 tops out at 2308; region 1 hits the target exactly at
        // t = 192 on its very first probe.
        let response = |t: u8| {
            if t < 128 {
                1800 + 4 * t as u16
            } else {
                2100 + 4 * (t as u16 - 128)
            }
        };
        let (result, committed, count) = run(SearchMode::SplitRange, 2356, response);
        assert_eq!(count, 14);
        assert_eq!(result.trim, 192);
        assert_eq!(committed, 192);
        assert_eq!(result.frame_length, 2356);
    }

    #[test]
    fn split_range_prefers_better_region() {
        // Monotonic across the whole range: the best probe lives in
        // region 0 and region 1's probes must not displace it.
        let response = |t: u8| 2300 + t as u16;
        let (result, _, count) = run(SearchMode::SplitRange, 2356, response);
        assert_eq!(count, 14);
        assert_eq!(response(result.trim), 2356);
        assert!(result.trim < 128);
    }
}
