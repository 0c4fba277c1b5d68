//! Cycle counter and reference clock sources.
//!
//! The timer never reads wall-clock time per frame. It reads a free-running
//! [`CycleCounter`] and converts cycles to seconds with a period measured once
//! against a [`ReferenceClock`] by [`Calibration::measure`].

use instant::Instant;

/// A free-running, monotonically increasing counter.
pub trait CycleCounter {
    fn cycles(&self) -> u64;
}

/// A clock with a known tick rate, used only to calibrate a [`CycleCounter`].
///
/// Both methods return `None` when the clock cannot be read.
pub trait ReferenceClock {
    /// Ticks per second.
    fn frequency(&self) -> Option<u64>;
    fn ticks(&self) -> Option<u64>;
}

/// CPUID leaf 1, EDX: time stamp counter present.
const CPUID_EDX_TSC: u32 = 1 << 4;
/// CPUID leaf 1, EDX: SSE present.
const CPUID_EDX_SSE: u32 = 1 << 25;

/// The processor's time stamp counter.
#[derive(Clone, Copy, Debug)]
pub struct Tsc {
    _detected: (),
}

impl Tsc {
    /// Returns the counter if the processor reports both a time stamp counter
    /// and SSE.
    pub fn detect() -> Option<Self> {
        let edx = cpuid_features()?;
        let required = CPUID_EDX_TSC | CPUID_EDX_SSE;
        (edx & required == required).then_some(Self { _detected: () })
    }
}

impl CycleCounter for Tsc {
    #[inline(always)]
    fn cycles(&self) -> u64 {
        read_tsc()
    }
}

// `__cpuid` is a safe function on newer toolchains.
#[cfg(target_arch = "x86_64")]
#[allow(unused_unsafe)]
fn cpuid_features() -> Option<u32> {
    use core::arch::x86_64::__cpuid;
    let max_leaf = unsafe { __cpuid(0) }.eax;
    if max_leaf < 1 {
        return None;
    }
    Some(unsafe { __cpuid(1) }.edx)
}

#[cfg(target_arch = "x86")]
#[allow(unused_unsafe)]
fn cpuid_features() -> Option<u32> {
    use core::arch::x86::{__cpuid, has_cpuid};
    if !has_cpuid() {
        return None;
    }
    let max_leaf = unsafe { __cpuid(0) }.eax;
    if max_leaf < 1 {
        return None;
    }
    Some(unsafe { __cpuid(1) }.edx)
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
fn cpuid_features() -> Option<u32> {
    None
}

#[cfg(target_arch = "x86_64")]
#[inline(always)]
fn read_tsc() -> u64 {
    unsafe { core::arch::x86_64::_rdtsc() }
}

#[cfg(target_arch = "x86")]
#[inline(always)]
fn read_tsc() -> u64 {
    unsafe { core::arch::x86::_rdtsc() }
}

// Unreachable in practice: `Tsc::detect` never succeeds on these targets.
#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
fn read_tsc() -> u64 {
    0
}

/// Monotonic OS clock with nanosecond ticks.
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceClock for MonotonicClock {
    fn frequency(&self) -> Option<u64> {
        Some(1_000_000_000)
    }

    fn ticks(&self) -> Option<u64> {
        u64::try_from(self.origin.elapsed().as_nanos()).ok()
    }
}

/// Counter frequency and its reciprocal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Calibration {
    /// Cycles per second.
    pub frequency: f64,
    /// Seconds per cycle.
    pub period: f64,
}

impl Calibration {
    /// A calibration for a counter known to run at `cycles_per_second`.
    pub fn from_frequency(cycles_per_second: f64) -> Self {
        let period = 1.0 / cycles_per_second;
        Self {
            frequency: 1.0 / period,
            period,
        }
    }

    /// Counts the cycles elapsing over one reference second.
    ///
    /// The measurement starts on a reference tick edge, so the partially
    /// elapsed tick at call time is not counted. Busy-waits for about one
    /// second. Returns `None` if the reference clock fails at any point or
    /// the counter did not advance.
    pub fn measure<C, R>(counter: &C, clock: &R) -> Option<Self>
    where
        C: CycleCounter + ?Sized,
        R: ReferenceClock + ?Sized,
    {
        let ticks_per_second = clock.frequency()?;
        let first = clock.ticks()?;
        let mut edge = first;
        while edge == first {
            edge = clock.ticks()?;
        }
        let start = counter.cycles();
        let target = edge.checked_add(ticks_per_second)?;
        let mut now = edge;
        while now < target {
            now = clock.ticks()?;
        }
        let delta = counter.cycles().wrapping_sub(start);
        if delta == 0 {
            return None;
        }
        Some(Self::from_frequency(delta as f64))
    }
}
