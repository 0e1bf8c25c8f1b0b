//! Safety limits for interpreter stepping and timing analysis.
//!
//! The interpreters execute branch instructions the way the original game
//! engine does, which means a malformed program can cycle without ever
//! reaching a Wait. The limits below bound how far a single `step()` call
//! or a timing walk may advance before giving up for that tick.

use crate::constants;

/// Iteration limits protecting against non-terminating programs.
///
/// Hitting a limit is a recovered condition: the interpreter simply stops
/// advancing for that tick and the analyzer returns a partial map. No
/// error is raised either way.
///
/// # Presets
///
/// - `default()`: 1024 elements per step / 1024 analyzer iterations
/// - `lenient()`: 4096 / 4096, for heavily branching editor previews
/// - `strict()`: 256 / 256, for quick validation passes
///
/// # Examples
///
/// ```
/// use partanim::limits::StepLimits;
///
/// let limits = StepLimits::default();
/// assert_eq!(limits.max_elements_per_step, 1024);
///
/// let custom = StepLimits::new(100, 200);
/// assert_eq!(custom.max_timing_iterations, 200);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepLimits {
	/// Maximum number of elements executed within one `step()` call.
	pub max_elements_per_step: usize,
	/// Maximum number of iterations of one timing-analysis walk.
	pub max_timing_iterations: usize,
}

impl Default for StepLimits {
	fn default() -> Self {
		Self {
			max_elements_per_step: constants::DEFAULT_STEP_CAP,
			max_timing_iterations: constants::DEFAULT_TIMING_CAP,
		}
	}
}

impl StepLimits {
	/// Creates custom limits.
	pub fn new(max_elements_per_step: usize, max_timing_iterations: usize) -> Self {
		Self {
			max_elements_per_step,
			max_timing_iterations,
		}
	}

	/// Higher limits for complex, heavily branching programs.
	pub fn lenient() -> Self {
		Self::new(4096, 4096)
	}

	/// Lower limits for quick validation of simple programs.
	pub fn strict() -> Self {
		Self::new(256, 256)
	}
}
