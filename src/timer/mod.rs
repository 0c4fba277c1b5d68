//! Cycle-accurate timing and performance statistics.
//!
//! A [`Timer`] reads a [`CycleCounter`] into named latches and turns cycle
//! differences into seconds with a period calibrated once at construction.
//! On top of the latches it keeps the running totals the status overlay shows:
//! frames drawn, bytes uploaded and time spent uploading.
//!
//! # Key types
//!
//! - [`Timer`] owns the latches and counters
//! - [`CycleCounter`] and [`ReferenceClock`] are the time sources; [`Tsc`] and
//!   [`MonotonicClock`] are the real ones
//! - [`Calibration`] is the measured counter frequency
//!
//! A timer whose calibration failed keeps working but reports
//! [`Timer::status`] as `false` and every derived value in seconds is zero or
//! infinite. Callers must check the status before trusting any number.

mod clock;

pub use clock::{Calibration, CycleCounter, MonotonicClock, ReferenceClock, Tsc};

const BYTES_PER_MEGABYTE: f64 = 1_048_576.0;
/// Minimum interval between two refreshes of a "current" value on screen.
const ANTI_BLINK_SECONDS: f64 = 0.5;

/// Latches and running statistics over a calibrated cycle counter.
#[derive(Debug)]
pub struct Timer<C = Tsc> {
    counter: C,
    calibration: Option<Calibration>,
    latch_application: u64,
    latch_performance: u64,
    latch_frame: u64,
    latch_transfer: u64,
    latch_anti_blink_fps: Option<u64>,
    latch_anti_blink_mbps: Option<u64>,
    frames_count: u64,
    bytes_count_total: u64,
    transfer_cycles_total: u64,
}

impl Timer<Tsc> {
    /// Detects the time stamp counter and calibrates it against the OS
    /// monotonic clock. Blocks for about one second.
    pub fn new() -> Option<Self> {
        let Some(tsc) = Tsc::detect() else {
            log::error!("Processor reports no time stamp counter or no SSE");
            return None;
        };
        let timer = Self::calibrated(tsc, &MonotonicClock::new());
        if timer.status() {
            log::info!("Time stamp counter runs at {:.3} MHz", timer.tsc_frequency() / 1e6);
        }
        Some(timer)
    }
}

impl<C: CycleCounter> Timer<C> {
    /// A timer over `counter` with a known calibration.
    pub fn with_calibration(counter: C, calibration: Calibration) -> Self {
        Self::build(counter, Some(calibration))
    }

    /// A timer over `counter`, calibrated against `clock`.
    ///
    /// If calibration fails the timer is still returned, with a failed status.
    pub fn calibrated(counter: C, clock: &(impl ReferenceClock + ?Sized)) -> Self {
        let calibration = Calibration::measure(&counter, clock);
        if calibration.is_none() {
            log::error!("Cycle counter calibration failed");
        }
        Self::build(counter, calibration)
    }

    fn build(counter: C, calibration: Option<Calibration>) -> Self {
        Self {
            counter,
            calibration,
            latch_application: 0,
            latch_performance: 0,
            latch_frame: 0,
            latch_transfer: 0,
            latch_anti_blink_fps: None,
            latch_anti_blink_mbps: None,
            frames_count: 0,
            bytes_count_total: 0,
            transfer_cycles_total: 0,
        }
    }

    /// `true` if the counter was calibrated successfully.
    pub fn status(&self) -> bool {
        self.calibration.is_some()
    }

    /// Cycles per second, or zero if uncalibrated.
    pub fn tsc_frequency(&self) -> f64 {
        self.calibration.map_or(0.0, |c| c.frequency)
    }

    /// Seconds per cycle, or zero if uncalibrated.
    pub fn tsc_period(&self) -> f64 {
        self.calibration.map_or(0.0, |c| c.period)
    }

    /// Restarts every statistic: performance and anti-blink latches move to
    /// now, frame, byte and busy-time totals drop to zero. The application
    /// latch and the calibration are kept.
    pub fn reset_statistics(&mut self) {
        let now = self.now();
        self.latch_performance = now;
        self.latch_anti_blink_fps = Some(now);
        self.latch_anti_blink_mbps = Some(now);
        self.latch_frame = 0;
        self.latch_transfer = 0;
        self.frames_count = 0;
        self.bytes_count_total = 0;
        self.transfer_cycles_total = 0;
    }

    pub fn start_application(&mut self) {
        self.latch_application = self.now();
    }

    /// Seconds since [`start_application`](Self::start_application).
    pub fn application_seconds(&self) -> f64 {
        self.seconds_since(self.latch_application)
    }

    pub fn start_performance(&mut self) {
        self.latch_performance = self.now();
    }

    /// Seconds since the last [`start_performance`](Self::start_performance)
    /// or [`reset_statistics`](Self::reset_statistics).
    pub fn performance_seconds(&self) -> f64 {
        self.seconds_since(self.latch_performance)
    }

    /// Marks the start of a frame and counts it.
    pub fn start_frame(&mut self) {
        self.latch_frame = self.now();
        self.frames_count += 1;
    }

    /// Instantaneous frame rate: the reciprocal of the time since
    /// [`start_frame`](Self::start_frame).
    pub fn stop_frame(&self) -> f64 {
        1.0 / self.seconds_since(self.latch_frame)
    }

    pub fn start_transfer(&mut self) {
        self.latch_transfer = self.now();
    }

    /// Closes a transfer window of `bytes` bytes and returns its throughput in
    /// megabytes per second. The bytes and the elapsed time are added to the
    /// running totals.
    pub fn stop_transfer(&mut self, bytes: u64) -> f64 {
        let cycles = self.now().wrapping_sub(self.latch_transfer);
        self.bytes_count_total += bytes;
        self.transfer_cycles_total += cycles;
        bytes as f64 / BYTES_PER_MEGABYTE / self.cycles_to_seconds(cycles)
    }

    /// Total seconds spent inside transfer windows.
    pub fn transfer_seconds(&self) -> f64 {
        self.cycles_to_seconds(self.transfer_cycles_total)
    }

    /// Frames counted per second since the performance latch. Zero until
    /// any time has passed.
    pub fn average_fps(&self) -> f64 {
        per_second(self.frames_count as f64, self.performance_seconds())
    }

    /// Megabytes moved per second of transfer time. Zero until the first
    /// transfer has been timed.
    pub fn average_mbps(&self) -> f64 {
        per_second(self.megabytes_count(), self.transfer_seconds())
    }

    pub fn frames_count(&self) -> u64 {
        self.frames_count
    }

    pub fn megabytes_count(&self) -> f64 {
        self.bytes_count_total as f64 / BYTES_PER_MEGABYTE
    }

    /// `true` at most once per half second; gates redraws of the current FPS.
    pub fn anti_blink_fps(&mut self) -> bool {
        let now = self.now();
        let fire = self.anti_blink_elapsed(self.latch_anti_blink_fps, now);
        if fire {
            self.latch_anti_blink_fps = Some(now);
        }
        fire
    }

    /// `true` at most once per half second; gates redraws of the current MBPS.
    pub fn anti_blink_mbps(&mut self) -> bool {
        let now = self.now();
        let fire = self.anti_blink_elapsed(self.latch_anti_blink_mbps, now);
        if fire {
            self.latch_anti_blink_mbps = Some(now);
        }
        fire
    }

    fn anti_blink_elapsed(&self, latch: Option<u64>, now: u64) -> bool {
        match latch {
            None => true,
            Some(latch) => self.cycles_to_seconds(now.wrapping_sub(latch)) >= ANTI_BLINK_SECONDS,
        }
    }

    fn now(&self) -> u64 {
        self.counter.cycles()
    }

    fn seconds_since(&self, latch: u64) -> f64 {
        self.cycles_to_seconds(self.now().wrapping_sub(latch))
    }

    fn cycles_to_seconds(&self, cycles: u64) -> f64 {
        cycles as f64 * self.tsc_period()
    }
}

fn per_second(amount: f64, seconds: f64) -> f64 {
    if seconds > 0.0 { amount / seconds } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use super::*;

    #[derive(Clone, Default)]
    struct ManualCounter(Rc<Cell<u64>>);

    impl ManualCounter {
        fn advance(&self, cycles: u64) {
            self.0.set(self.0.get() + cycles);
        }
    }

    impl CycleCounter for ManualCounter {
        fn cycles(&self) -> u64 {
            self.0.get()
        }
    }

    /// 1 kHz counter: one cycle is one millisecond.
    fn millisecond_timer() -> (ManualCounter, Timer<ManualCounter>) {
        let counter = ManualCounter::default();
        let timer = Timer::with_calibration(counter.clone(), Calibration::from_frequency(1000.0));
        (counter, timer)
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= 1e-9 * expected.abs().max(1.0),
            "{actual} != {expected}"
        );
    }

    #[test]
    fn average_fps_is_frames_over_elapsed_time() {
        let (counter, mut timer) = millisecond_timer();
        counter.advance(12_345);
        timer.reset_statistics();
        for _ in 0..10 {
            timer.start_frame();
            counter.advance(50);
            assert_close(timer.stop_frame(), 20.0);
        }
        assert_eq!(timer.frames_count(), 10);
        assert_close(timer.performance_seconds(), 0.5);
        assert_close(timer.average_fps(), 20.0);
    }

    #[test]
    fn transfers_accumulate_bytes_and_busy_time() {
        let (counter, mut timer) = millisecond_timer();
        timer.reset_statistics();

        timer.start_transfer();
        counter.advance(250);
        assert_close(timer.stop_transfer(1_048_576), 4.0);

        counter.advance(1_000);
        timer.start_transfer();
        counter.advance(750);
        assert_close(timer.stop_transfer(3 * 1_048_576), 4.0);

        assert_close(timer.megabytes_count(), 4.0);
        assert_close(timer.transfer_seconds(), 1.0);
        assert_close(timer.average_mbps(), 4.0);
    }

    #[test]
    fn averages_are_zero_before_anything_was_timed() {
        let (counter, mut timer) = millisecond_timer();
        timer.reset_statistics();
        assert_eq!(timer.average_mbps(), 0.0);
        assert_eq!(timer.average_fps(), 0.0);

        timer.start_transfer();
        counter.advance(500);
        timer.stop_transfer(1_048_576);
        assert_close(timer.average_mbps(), 2.0);

        timer.reset_statistics();
        assert_eq!(timer.average_mbps(), 0.0);
        assert!(!timer.average_mbps().is_nan());
    }

    #[test]
    fn anti_blink_fires_once_per_half_second() {
        let (counter, mut timer) = millisecond_timer();
        assert!(timer.anti_blink_fps());
        counter.advance(100);
        assert!(!timer.anti_blink_fps());
        counter.advance(400);
        assert!(timer.anti_blink_fps());
        assert!(!timer.anti_blink_fps());
    }

    #[test]
    fn anti_blink_latches_are_independent() {
        let (counter, mut timer) = millisecond_timer();
        timer.reset_statistics();
        counter.advance(600);
        assert!(timer.anti_blink_fps());
        assert!(timer.anti_blink_mbps());
        assert!(!timer.anti_blink_fps());
        assert!(!timer.anti_blink_mbps());
    }

    #[test]
    fn reset_clears_statistics_but_not_application_time() {
        let (counter, mut timer) = millisecond_timer();
        timer.start_application();
        timer.reset_statistics();
        timer.start_frame();
        timer.start_transfer();
        counter.advance(2_000);
        timer.stop_transfer(4_000);

        timer.reset_statistics();
        assert_eq!(timer.frames_count(), 0);
        assert_eq!(timer.megabytes_count(), 0.0);
        assert_eq!(timer.transfer_seconds(), 0.0);
        assert_eq!(timer.performance_seconds(), 0.0);
        assert_close(timer.application_seconds(), 2.0);
        assert!(!timer.anti_blink_fps());
    }

    #[test]
    fn uncalibrated_timer_reports_failure() {
        struct DeadClock;
        impl ReferenceClock for DeadClock {
            fn frequency(&self) -> Option<u64> {
                None
            }
            fn ticks(&self) -> Option<u64> {
                None
            }
        }
        let timer = Timer::calibrated(ManualCounter::default(), &DeadClock);
        assert!(!timer.status());
        assert_eq!(timer.tsc_period(), 0.0);
        assert_eq!(timer.tsc_frequency(), 0.0);
    }
}
