// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic host time used by frame instrumentation.
//!
//! [`HostTime`] is a point in time in monotonic ticks and [`Duration`] a span
//! in the same units. [`Timebase`] converts ticks to nanoseconds
//! (`nanos = ticks * numer / denom`), using `u128` intermediates.
//!
//! [`now`] reads the process monotonic clock with a nanosecond timebase
//! ([`Timebase::NANOS`]). Compositor code takes the clock as a plain function
//! pointer so tests can substitute a deterministic one.

use core::fmt;
use core::ops::{Add, Sub};
use std::sync::OnceLock;
use std::time::Instant;

/// A point in time expressed as monotonic ticks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HostTime(pub u64);

impl HostTime {
    /// Returns the raw tick value.
    #[inline]
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// Returns the duration since `earlier`, or zero if `earlier` is later.
    #[inline]
    #[must_use]
    pub const fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration(self.0.saturating_sub(earlier.0))
    }
}

impl Add<Duration> for HostTime {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Duration) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for HostTime {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: Self) -> Duration {
        Duration(self.0 - rhs.0)
    }
}

impl fmt::Debug for HostTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostTime({})", self.0)
    }
}

/// Rational conversion factor from ticks to nanoseconds.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timebase {
    /// Numerator of the ticks-to-nanoseconds ratio.
    pub numer: u32,
    /// Denominator of the ticks-to-nanoseconds ratio.
    pub denom: u32,
}

impl Timebase {
    /// A timebase where ticks are already nanoseconds.
    pub const NANOS: Self = Self { numer: 1, denom: 1 };

    /// Creates a new timebase.
    ///
    /// # Panics
    ///
    /// Panics if `denom` is zero.
    #[inline]
    #[must_use]
    pub const fn new(numer: u32, denom: u32) -> Self {
        assert!(denom != 0, "timebase denominator must not be zero");
        Self { numer, denom }
    }

    /// Converts a tick count to nanoseconds.
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "u128 intermediate avoids overflow; truncation back to u64 is intentional"
    )]
    pub const fn ticks_to_nanos(self, ticks: u64) -> u64 {
        (ticks as u128 * self.numer as u128 / self.denom as u128) as u64
    }

    /// Converts nanoseconds to a tick count.
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "u128 intermediate avoids overflow; truncation back to u64 is intentional"
    )]
    pub const fn nanos_to_ticks(self, nanos: u64) -> u64 {
        (nanos as u128 * self.denom as u128 / self.numer as u128) as u64
    }
}

impl fmt::Debug for Timebase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timebase({}/{})", self.numer, self.denom)
    }
}

/// A duration in ticks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(pub u64);

impl Duration {
    /// A zero-length duration.
    pub const ZERO: Self = Self(0);

    /// Returns the raw tick value.
    #[inline]
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// Creates a duration from nanoseconds.
    #[inline]
    #[must_use]
    pub const fn from_nanos(nanos: u64, timebase: Timebase) -> Self {
        Self(timebase.nanos_to_ticks(nanos))
    }

    /// The frame budget at `refresh_rate` frames per second.
    ///
    /// # Panics
    ///
    /// Panics if `refresh_rate` is zero.
    #[inline]
    #[must_use]
    pub const fn frame_budget(refresh_rate: u32, timebase: Timebase) -> Self {
        assert!(refresh_rate != 0, "refresh rate must not be zero");
        Self::from_nanos(1_000_000_000 / refresh_rate as u64, timebase)
    }

    /// Converts to fractional milliseconds.
    #[inline]
    #[must_use]
    pub fn to_millis_f64(self, timebase: Timebase) -> f64 {
        timebase.ticks_to_nanos(self.0) as f64 / 1_000_000.0
    }

    /// Saturating subtraction.
    #[inline]
    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Add for Duration {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Duration({})", self.0)
    }
}

/// Reads the monotonic clock in nanoseconds since the first call.
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    reason = "u64 nanoseconds cover centuries of process uptime"
)]
pub fn now() -> HostTime {
    static ORIGIN: OnceLock<Instant> = OnceLock::new();
    let origin = ORIGIN.get_or_init(Instant::now);
    HostTime(origin.elapsed().as_nanos() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_budget_at_60hz() {
        let budget = Duration::frame_budget(60, Timebase::NANOS);
        assert_eq!(budget.ticks(), 16_666_666);
        assert!((budget.to_millis_f64(Timebase::NANOS) - 16.666_666).abs() < 1e-6);
    }

    #[test]
    fn timebase_conversion() {
        let tb = Timebase::new(125, 3);
        assert_eq!(tb.ticks_to_nanos(24_000_000), 1_000_000_000, "24 MHz → 1s");
        assert_eq!(tb.nanos_to_ticks(1_000_000_000), 24_000_000);
    }

    #[test]
    fn host_time_arithmetic() {
        let t = HostTime(1000);
        assert_eq!((t + Duration(200)).ticks(), 1200);
        assert_eq!(HostTime(1500) - t, Duration(500));
        assert_eq!(t.saturating_duration_since(HostTime(1500)), Duration::ZERO);
    }

    #[test]
    fn clock_is_monotonic() {
        let a = now();
        let b = now();
        assert!(b >= a);
    }
}
