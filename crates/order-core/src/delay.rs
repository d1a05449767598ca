//! Duration of the simulated work step.
//!
//! Workers ask a [`ProcessingDelay`] how long each order should take. The
//! production source is [`RandomDelay`]; tests substitute a [`FixedDelay`] or
//! a closure to get deterministic timings.

use rand::Rng;
use std::time::Duration;

/// Source of per-order work durations.
pub trait ProcessingDelay: Send + Sync {
	/// Returns the duration of the next work step.
	fn next_delay(&self) -> Duration;
}

/// Uniformly random duration in `[min, max)`.
///
/// When `max <= min` every call returns `min`.
#[derive(Debug, Clone, Copy)]
pub struct RandomDelay {
	min: Duration,
	max: Duration,
}

impl RandomDelay {
	pub fn new(min: Duration, max: Duration) -> Self {
		Self { min, max }
	}

	pub fn from_millis(min_ms: u64, max_ms: u64) -> Self {
		Self::new(Duration::from_millis(min_ms), Duration::from_millis(max_ms))
	}
}

impl ProcessingDelay for RandomDelay {
	fn next_delay(&self) -> Duration {
		if self.max <= self.min {
			return self.min;
		}
		let nanos = rand::thread_rng().gen_range(self.min.as_nanos()..self.max.as_nanos());
		Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
	}
}

/// Always the same duration.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

impl ProcessingDelay for FixedDelay {
	fn next_delay(&self) -> Duration {
		self.0
	}
}

impl<F> ProcessingDelay for F
where
	F: Fn() -> Duration + Send + Sync,
{
	fn next_delay(&self) -> Duration {
		self()
	}
}
