//! Zero-cost phase timing.
//!
//! With the `timing` feature enabled, phases report their duration through
//! `log::debug!`. Without it, every type here is zero-sized and compiles away.
//!
//! Usage:
//!   RUST_LOG=union_graph=debug cargo test --features timing

use std::time::Duration;

/// Timer that tracks elapsed time when timing is enabled.
#[cfg(feature = "timing")]
pub struct Timer(std::time::Instant);

#[cfg(feature = "timing")]
impl Timer {
    #[inline]
    pub fn start() -> Self {
        Self(std::time::Instant::now())
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.0.elapsed()
    }

    /// Log the time since `start` under `phase`.
    pub fn report(&self, phase: &str) {
        log::debug!("{phase}: {:.3} ms", self.elapsed().as_secs_f64() * 1e3);
    }
}

/// Dummy timer when feature is disabled (zero-sized).
#[cfg(not(feature = "timing"))]
pub struct Timer;

#[cfg(not(feature = "timing"))]
impl Timer {
    #[inline(always)]
    pub fn start() -> Self {
        Self
    }

    #[inline(always)]
    pub fn elapsed(&self) -> Duration {
        Duration::ZERO
    }

    #[inline(always)]
    pub fn report(&self, _phase: &str) {}
}
