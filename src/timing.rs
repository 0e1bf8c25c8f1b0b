//! Timing analysis for keyframe programs.
//!
//! An editor timeline needs to know *when* each element begins without
//! running the program in real time. [`analyze`] walks a keyframe program
//! once, accumulating keyframe durations and recording each element's
//! first-visit start time. Branches are followed the way the interpreter
//! follows them, with one difference that guarantees termination: a Loop
//! jumps only on its first arrival and falls through on the next, so loops
//! are unrolled exactly once rather than `count` times.
//!
//! A program whose branch graph never runs off the end (for example a
//! backward Goto cycle, or branches referencing deleted keyframes) is cut
//! off by the iteration cap; the map collected up to that point is
//! returned with [`TimingMap::is_complete`] reporting `false`. Neither
//! case is an error.
//!
//! # Examples
//!
//! ```
//! use partanim::keyframe::{Keyframe, KeyframeProgram};
//! use partanim::limits::StepLimits;
//! use partanim::timing::analyze;
//!
//! let mut program = KeyframeProgram::new();
//! program.push_keyframe(Keyframe::new("a", 10));
//! program.push_keyframe(Keyframe::new("b", 5));
//! program.push_keyframe(Keyframe::new("c", 1));
//!
//! let map = analyze(&program, &StepLimits::default());
//! assert_eq!(map.time_of(0), Some(0));
//! assert_eq!(map.time_of(1), Some(10));
//! assert_eq!(map.time_of(2), Some(15));
//! assert!(map.is_complete());
//! ```

use std::collections::HashSet;

use crate::keyframe::{KeyframeElement, KeyframeProgram};
use crate::limits::StepLimits;

/// Cumulative start times of a keyframe program's elements, for UI
/// scrubbing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingMap {
	times: Vec<Option<u32>>,
	complete: bool,
}

impl TimingMap {
	/// Cumulative elapsed time at which the element at `index` first
	/// begins, or `None` if the walk never reached it.
	pub fn time_of(&self, index: usize) -> Option<u32> {
		self.times.get(index).copied().flatten()
	}

	/// Returns `false` if the walk was cut off by the iteration cap
	/// before reaching the end of the program.
	pub fn is_complete(&self) -> bool {
		self.complete
	}

	/// Total time of the walked portion of the program, fragments and
	/// unreached elements excluded.
	pub fn len(&self) -> usize {
		self.times.len()
	}

	/// Returns `true` if the analyzed program had no elements.
	pub fn is_empty(&self) -> bool {
		self.times.is_empty()
	}
}

/// Walks `program` once and annotates each element with its cumulative
/// start time.
pub fn analyze(program: &KeyframeProgram, limits: &StepLimits) -> TimingMap {
	let element_count = program.len();
	let mut times: Vec<Option<u32>> = vec![None; element_count];
	let mut loops_taken: HashSet<usize> = HashSet::new();
	let mut cursor = 0usize;
	let mut time = 0u32;
	let mut complete = true;

	let mut iterations = 0usize;
	loop {
		iterations += 1;
		if iterations > limits.max_timing_iterations {
			log::debug!(
				"timing walk aborted after {} iterations; returning partial map",
				limits.max_timing_iterations
			);
			complete = false;
			break;
		}
		let Some(element) = program.elements().get(cursor) else {
			break;
		};
		if times[cursor].is_none() {
			times[cursor] = Some(time);
		}

		match element {
			KeyframeElement::Keyframe {
				key,
				..
			} => {
				time += u32::from(key.duration);
				cursor += 1;
			}
			KeyframeElement::Parent {
				..
			}
			| KeyframeElement::Notify {
				..
			} => cursor += 1,
			KeyframeElement::Goto {
				target,
			} => {
				let Some(target_index) = program.key_index(*target) else {
					// Dangling branch: nothing further can be timed.
					break;
				};
				cursor = target_index;
			}
			KeyframeElement::Loop {
				target,
				..
			} => {
				if loops_taken.insert(cursor) {
					let Some(target_index) = program.key_index(*target) else {
						break;
					};
					cursor = target_index;
				} else {
					// Unrolled once already; fall through.
					cursor += 1;
				}
			}
		}
	}

	TimingMap {
		times,
		complete,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::keyframe::Keyframe;

	#[test]
	fn test_sequential_durations_accumulate() {
		let mut program = KeyframeProgram::new();
		program.push_keyframe(Keyframe::new("a", 4));
		program.push(KeyframeElement::Notify {
			value: 1,
		});
		program.push_keyframe(Keyframe::new("b", 6));

		let map = analyze(&program, &StepLimits::default());
		assert_eq!(map.time_of(0), Some(0));
		assert_eq!(map.time_of(1), Some(4));
		assert_eq!(map.time_of(2), Some(4));
		assert!(map.is_complete());
	}

	#[test]
	fn test_fragment_adds_no_time() {
		let mut program = KeyframeProgram::new();
		program.push_keyframe(Keyframe::new("marker", 0));
		program.push_keyframe(Keyframe::new("pose", 8));
		program.push_keyframe(Keyframe::new("tail", 1));

		let map = analyze(&program, &StepLimits::default());
		assert_eq!(map.time_of(1), Some(0));
		assert_eq!(map.time_of(2), Some(8));
	}

	#[test]
	fn test_loop_unrolls_exactly_once() {
		// body(3) / Loop x5 / tail(2): the interpreter would run the body
		// six times, but timing unrolls the loop once, so the tail starts
		// at 6, not 18.
		let mut program = KeyframeProgram::new();
		let body = program.push_keyframe(Keyframe::new("body", 3));
		program.push(KeyframeElement::Loop {
			target: body,
			count: 5,
		});
		program.push_keyframe(Keyframe::new("tail", 2));

		let map = analyze(&program, &StepLimits::default());
		assert_eq!(map.time_of(0), Some(0));
		assert_eq!(map.time_of(1), Some(3));
		assert_eq!(map.time_of(2), Some(6));
		assert!(map.is_complete());
	}

	#[test]
	fn test_backward_goto_records_times_then_caps() {
		let mut program = KeyframeProgram::new();
		let start = program.push_keyframe(Keyframe::new("start", 2));
		program.push_keyframe(Keyframe::new("next", 3));
		program.push(KeyframeElement::Goto {
			target: start,
		});

		let map = analyze(&program, &StepLimits::strict());
		// First-visit times are all recorded before the cap cuts the
		// cycle off.
		assert_eq!(map.time_of(0), Some(0));
		assert_eq!(map.time_of(1), Some(2));
		assert_eq!(map.time_of(2), Some(5));
		assert!(!map.is_complete());
	}

	#[test]
	fn test_dangling_branch_ends_walk() {
		let mut program = KeyframeProgram::new();
		program.push_keyframe(Keyframe::new("a", 1));
		let missing = program.allocate_key();
		program.push(KeyframeElement::Goto {
			target: missing,
		});
		program.push_keyframe(Keyframe::new("unreachable", 1));

		let map = analyze(&program, &StepLimits::default());
		assert_eq!(map.time_of(0), Some(0));
		assert_eq!(map.time_of(1), Some(1));
		assert_eq!(map.time_of(2), None);
		assert!(map.is_complete());
	}

	#[test]
	fn test_empty_program() {
		let map = analyze(&KeyframeProgram::new(), &StepLimits::default());
		assert!(map.is_empty());
		assert!(map.is_complete());
	}
}
