//! Stepping interpreter for linear programs.
//!
//! The interpreter advances one animation tick per [`step`] call,
//! maintaining a [`RuntimeState`] that the external renderer reads after
//! each tick. It simulates the original engine's player exactly: delay
//! counters tick down by two, the transform fields snap back to identity at
//! every non-waiting step, and branch instructions relocate the cursor
//! in-pass.
//!
//! [`step`]: LinearInterpreter::step
//!
//! # Examples
//!
//! ```
//! use partanim::linear::{LabelNames, LinearInterpreter, LinearProgram};
//!
//! // SetImage(1), Wait(2)
//! let words = [0x1001, 0x0002];
//! let program = LinearProgram::decode(&words, &LabelNames::new())?;
//!
//! let mut interp = LinearInterpreter::new(&program);
//! interp.step();
//! assert_eq!(interp.state().image, Some(1));
//! # Ok::<(), partanim::ScriptError>(())
//! ```

use crate::limits::StepLimits;
use crate::linear::{LinearElement, LinearProgram};
use crate::state::{CatalogBounds, RuntimeState};

/// What executing one element tells the stepping loop to do next.
enum Flow {
	/// Keep executing at the (already updated) cursor.
	Continue,
	/// The pass is over for this tick (a Wait started holding).
	Stop,
}

/// Executes a [`LinearProgram`] one animation tick at a time.
pub struct LinearInterpreter<'a> {
	program: &'a LinearProgram,
	bounds: CatalogBounds,
	limits: StepLimits,
	cursor: usize,
	state: RuntimeState,
}

impl<'a> LinearInterpreter<'a> {
	/// Creates an interpreter over `program` with unbounded catalogs and
	/// default safety limits.
	pub fn new(program: &'a LinearProgram) -> Self {
		Self::with_catalog(program, CatalogBounds::unbounded())
	}

	/// Creates an interpreter that resolves image/palette/parent indices
	/// against the given catalog sizes.
	pub fn with_catalog(program: &'a LinearProgram, bounds: CatalogBounds) -> Self {
		Self {
			program,
			bounds,
			limits: StepLimits::default(),
			cursor: 0,
			state: RuntimeState::new(),
		}
	}

	/// Replaces the safety limits.
	pub fn set_limits(&mut self, limits: StepLimits) {
		self.limits = limits;
	}

	/// The computed per-tick output state.
	pub fn state(&self) -> &RuntimeState {
		&self.state
	}

	/// Current element index.
	pub fn cursor(&self) -> usize {
		self.cursor
	}

	/// Restarts execution from the first element with a fresh state.
	///
	/// This is the only way to re-run a program deterministically.
	pub fn reset(&mut self) {
		self.cursor = 0;
		self.state = RuntimeState::new();
	}

	/// Advances the program by one animation tick.
	///
	/// Never blocks and never panics on malformed programs: a pass that
	/// executes more elements than the configured cap simply stops
	/// advancing for this tick.
	pub fn step(&mut self) {
		if self.state.delay > 0 {
			self.state.delay = self.state.delay.saturating_sub(2);
			if self.state.delay > 0 {
				return;
			}
		}

		// Transform state does not persist across Wait boundaries.
		self.state.reset_transients();

		for _ in 0..self.limits.max_elements_per_step {
			let Some(element) = self.program.elements().get(self.cursor) else {
				return;
			};
			match self.execute(element.clone()) {
				Flow::Continue => {}
				Flow::Stop => return,
			}
		}
		log::debug!(
			"step aborted after {} elements without reaching a Wait",
			self.limits.max_elements_per_step
		);
	}

	/// Scrubbing query: has execution already advanced past `index` in the
	/// current pass?
	pub fn has_passed(&self, index: usize) -> bool {
		self.cursor > index
	}

	/// Fast-forwards by calling [`step`](Self::step) in a tight loop until
	/// execution passes `index` or `max_ticks` ticks have elapsed.
	///
	/// Returns `true` if the element was passed. Used by the external
	/// orchestrator to scrub one part ahead of its siblings.
	pub fn advance_until(&mut self, index: usize, max_ticks: usize) -> bool {
		for _ in 0..max_ticks {
			if self.has_passed(index) {
				return true;
			}
			self.step();
		}
		self.has_passed(index)
	}

	fn execute(&mut self, element: LinearElement) -> Flow {
		match element {
			LinearElement::Wait {
				count,
			} => {
				self.state.delay = count;
				if count > 0 {
					self.state.keys_since_branch += 1;
				}
				self.cursor += 1;
				Flow::Stop
			}
			LinearElement::SetImage {
				image,
			} => {
				self.state.image = self.bounds.resolve_image(image);
				self.cursor += 1;
				Flow::Continue
			}
			LinearElement::SetPalette {
				palette,
			} => {
				self.state.palette = self.bounds.resolve_palette(palette);
				self.cursor += 1;
				Flow::Continue
			}
			LinearElement::SetPosition {
				position,
			} => {
				self.state.position = position;
				self.cursor += 1;
				Flow::Continue
			}
			LinearElement::SetRotation {
				rotation,
			} => {
				self.state.rotation = rotation;
				self.cursor += 1;
				Flow::Continue
			}
			LinearElement::SetScale {
				mode,
				percent,
			} => {
				self.state.scale.apply(mode, percent);
				self.cursor += 1;
				Flow::Continue
			}
			LinearElement::SetParent {
				part,
			} => {
				self.state.parent = self.bounds.resolve_parent(part);
				self.cursor += 1;
				Flow::Continue
			}
			LinearElement::SetNotify {
				value,
			} => {
				self.state.notify = value;
				self.cursor += 1;
				Flow::Continue
			}
			LinearElement::SetUnknown {
				value,
			} => {
				self.state.unknown = value;
				self.cursor += 1;
				Flow::Continue
			}
			LinearElement::Label {
				..
			} => {
				self.cursor += 1;
				Flow::Continue
			}
			LinearElement::Goto {
				target,
			} => {
				let Some(target_index) = self.program.label_index(target) else {
					// Dangling branch: stop advancing for this tick.
					return Flow::Stop;
				};
				if target_index < self.cursor && self.state.keys_since_branch < 2 {
					// The program cycled without producing a real hold.
					self.state.complete = true;
				}
				self.state.keys_since_branch = 0;
				self.cursor = target_index;
				Flow::Continue
			}
			LinearElement::Loop {
				target,
				count,
			} => {
				let Some(target_index) = self.program.label_index(target) else {
					return Flow::Stop;
				};
				if self.state.repeat == 0 {
					// First arrival: arm the counter and run the body again.
					self.state.repeat = count;
					self.cursor = target_index;
				} else {
					self.state.repeat -= 1;
					if self.state.repeat != 0 {
						self.cursor = target_index;
					} else {
						self.cursor += 1;
					}
				}
				Flow::Continue
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::linear::LabelNames;
	use crate::value::{PositionDelta, ResourceRef};

	fn decode(words: &[u16]) -> LinearProgram {
		LinearProgram::decode(words, &LabelNames::new()).expect("program should decode")
	}

	#[test]
	fn test_wait_holds_for_half_count_ticks() {
		// SetImage(1), Wait(4)
		let program = decode(&[0x1001, 0x0004]);
		let mut interp = LinearInterpreter::new(&program);

		interp.step();
		assert_eq!(interp.state().image, Some(1));
		assert_eq!(interp.state().remaining_delay(), 4);

		// Delay ticks down by two per step.
		interp.step();
		assert_eq!(interp.state().remaining_delay(), 2);
		interp.step();
		assert_eq!(interp.state().remaining_delay(), 0);
	}

	#[test]
	fn test_transients_reset_at_wait_boundary() {
		// SetPosition(flag, 10, 0, 0), Wait(1), Wait(1)
		let program = decode(&[0x3001, 0x000A, 0x0000, 0x0000, 0x0001, 0x0001]);
		let mut interp = LinearInterpreter::new(&program);

		interp.step();
		assert_eq!(interp.state().position, PositionDelta::new(true, 10, 0, 0));

		// The next pass snaps the transform back to identity.
		interp.step();
		assert!(interp.state().position.is_identity());
	}

	#[test]
	fn test_resource_state_persists_across_waits() {
		// SetImage(3), Wait(1), Wait(1)
		let program = decode(&[0x1003, 0x0001, 0x0001]);
		let mut interp = LinearInterpreter::new(&program);

		interp.step();
		interp.step();
		assert_eq!(interp.state().image, Some(3));
	}

	#[test]
	fn test_loop_runs_body_count_plus_one_times() {
		// offset 0: SetNotify(0) - notify doubles as an execution counter
		// offset 1: Wait(1)      - loop body, the Loop targets offset 1
		// offset 2: Loop(1, 2)
		// offset 4: SetNotify(9)
		// offset 5: Wait(1)
		let program = decode(&[0x8200, 0x0001, 0x7001, 0x0002, 0x8209, 0x0001]);
		let mut interp = LinearInterpreter::new(&program);

		let mut waits = 0;
		for _ in 0..64 {
			interp.step();
			if interp.state().notify == 9 {
				break;
			}
			if interp.state().remaining_delay() > 0 {
				waits += 1;
			}
		}
		// Wait(1) at the loop target executed exactly count + 1 = 3 times.
		assert_eq!(waits, 3);
		assert_eq!(interp.state().notify, 9);
	}

	#[test]
	fn test_backward_goto_without_holds_sets_complete() {
		// Wait(1), Goto 0x0000
		let program = decode(&[0x0001, 0x2000]);
		let mut interp = LinearInterpreter::new(&program);

		interp.step();
		assert!(!interp.state().complete);
		// Second pass takes the backward branch with only one keyframe
		// executed since the last branch.
		interp.step();
		assert!(interp.state().complete);
	}

	#[test]
	fn test_backward_goto_with_real_holds_keeps_running() {
		// Wait(1) x3, Goto 0x0000
		let program = decode(&[0x0001, 0x0001, 0x0001, 0x2000]);
		let mut interp = LinearInterpreter::new(&program);

		for _ in 0..12 {
			interp.step();
		}
		assert!(!interp.state().complete);
	}

	#[test]
	fn test_step_cap_recovers_from_waitless_cycle() {
		// SetImage(0), Goto 0x0000 - no Wait anywhere.
		let program = decode(&[0x1000, 0x2000]);
		let mut interp = LinearInterpreter::new(&program);

		// Must return rather than hang; the cap ends the pass.
		interp.step();
		assert_eq!(interp.state().image, Some(0));
	}

	#[test]
	fn test_program_end_stops_quietly() {
		let program = decode(&[0x1001, 0x0001]);
		let mut interp = LinearInterpreter::new(&program);

		for _ in 0..8 {
			interp.step();
		}
		assert_eq!(interp.cursor(), program.len());
		assert_eq!(interp.state().image, Some(1));
	}

	#[test]
	fn test_catalog_bounds_clamp_indices() {
		// SetImage(5), SetParent(7), Wait(1)
		let program = decode(&[0x1005, 0x8107, 0x0001]);
		let mut interp =
			LinearInterpreter::with_catalog(&program, CatalogBounds::new(4, 4, 4));

		interp.step();
		assert_eq!(interp.state().image, None);
		assert_eq!(interp.state().parent, None);
	}

	#[test]
	fn test_reset_restores_defaults() {
		let program = decode(&[0x1001, 0x0004]);
		let mut interp = LinearInterpreter::new(&program);

		interp.step();
		assert!(interp.state().image.is_some());

		interp.reset();
		assert_eq!(interp.cursor(), 0);
		assert_eq!(interp.state(), &RuntimeState::new());
	}

	#[test]
	fn test_has_passed_and_advance_until() {
		// Wait(2), Wait(2), Wait(2)
		let program = decode(&[0x0002, 0x0002, 0x0002]);
		let mut interp = LinearInterpreter::new(&program);

		assert!(!interp.has_passed(1));
		assert!(interp.advance_until(1, 16));
		assert!(interp.has_passed(1));

		// An unreachable element leaves the interpreter where the program
		// ends, reporting failure.
		let mut other = LinearInterpreter::new(&program);
		assert!(!other.advance_until(100, 16));
	}

	#[test]
	fn test_dangling_branch_stops_the_pass() {
		let mut program = decode(&[0x0001, 0x2000]);
		// Delete the label the Goto references.
		program.elements_mut().retain(|element| {
			!matches!(element, crate::linear::LinearElement::Label { .. })
		});

		let mut interp = LinearInterpreter::new(&program);
		for _ in 0..4 {
			interp.step();
		}
		// The interpreter neither hangs nor panics.
		assert_eq!(interp.state().image, None);
	}

	#[test]
	fn test_explicit_image_clear() {
		// SetImage(2), Wait(1), SetImage(none), Wait(1)
		let program = decode(&[0x1002, 0x0001, 0x1FFF, 0x0001]);
		let mut interp = LinearInterpreter::new(&program);

		interp.step();
		assert_eq!(interp.state().image, Some(2));
		interp.step();
		assert_eq!(interp.state().image, None);

		// Sanity: the element really was an explicit clear.
		assert!(program.elements().iter().any(|element| matches!(
			element,
			LinearElement::SetImage {
				image: ResourceRef::None
			}
		)));
	}
}
