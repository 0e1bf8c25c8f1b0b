//! Stepping interpreter for keyframe programs.
//!
//! Functionally equivalent to the linear interpreter: driving both
//! representations of the same program tick-by-tick from `reset()` yields
//! identical [`RuntimeState`] sequences. The only structural difference is
//! that the cursor walks grouped elements, so one executed keyframe does
//! the work of a whole linear run-plus-Wait.
//!
//! Zero-duration keyframes (fragments) apply only their resource fields;
//! their transform fields are data for the editor, never runtime state.

use crate::keyframe::{Keyframe, KeyframeElement, KeyframeProgram};
use crate::limits::StepLimits;
use crate::state::{CatalogBounds, RuntimeState};

enum Flow {
	Continue,
	Stop,
}

/// Executes a [`KeyframeProgram`] one animation tick at a time.
pub struct KeyframeInterpreter<'a> {
	program: &'a KeyframeProgram,
	bounds: CatalogBounds,
	limits: StepLimits,
	cursor: usize,
	state: RuntimeState,
}

impl<'a> KeyframeInterpreter<'a> {
	/// Creates an interpreter over `program` with unbounded catalogs and
	/// default safety limits.
	pub fn new(program: &'a KeyframeProgram) -> Self {
		Self::with_catalog(program, CatalogBounds::unbounded())
	}

	/// Creates an interpreter that resolves image/palette/parent indices
	/// against the given catalog sizes.
	pub fn with_catalog(program: &'a KeyframeProgram, bounds: CatalogBounds) -> Self {
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
	pub fn reset(&mut self) {
		self.cursor = 0;
		self.state = RuntimeState::new();
	}

	/// Advances the program by one animation tick.
	///
	/// On the first call the interpreter executes the first keyframe
	/// immediately; afterwards it holds for each keyframe's duration,
	/// passing through parent/notify/branch elements between poses. A pass
	/// that executes more elements than the configured cap stops advancing
	/// for this tick rather than hanging.
	pub fn step(&mut self) {
		if self.state.delay > 0 {
			self.state.delay = self.state.delay.saturating_sub(2);
			if self.state.delay > 0 {
				return;
			}
		}

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
			"step aborted after {} elements without reaching a timed keyframe",
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
	pub fn advance_until(&mut self, index: usize, max_ticks: usize) -> bool {
		for _ in 0..max_ticks {
			if self.has_passed(index) {
				return true;
			}
			self.step();
		}
		self.has_passed(index)
	}

	fn execute(&mut self, element: KeyframeElement) -> Flow {
		match element {
			KeyframeElement::Keyframe {
				key,
				..
			} => {
				self.apply_keyframe(&key);
				self.cursor += 1;
				if key.duration > 0 {
					self.state.delay = key.duration;
					self.state.keys_since_branch += 1;
					Flow::Stop
				} else {
					Flow::Continue
				}
			}
			KeyframeElement::Parent {
				part,
			} => {
				self.state.parent = self.bounds.resolve_parent(part);
				self.cursor += 1;
				Flow::Continue
			}
			KeyframeElement::Notify {
				value,
			} => {
				self.state.notify = value;
				self.cursor += 1;
				Flow::Continue
			}
			KeyframeElement::Goto {
				target,
			} => {
				let Some(target_index) = self.program.key_index(target) else {
					return Flow::Stop;
				};
				if target_index < self.cursor && self.state.keys_since_branch < 2 {
					self.state.complete = true;
				}
				self.state.keys_since_branch = 0;
				self.cursor = target_index;
				Flow::Continue
			}
			KeyframeElement::Loop {
				target,
				count,
			} => {
				let Some(target_index) = self.program.key_index(target) else {
					return Flow::Stop;
				};
				if self.state.repeat == 0 {
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

	/// Writes a keyframe's present fields into the runtime state.
	///
	/// Fragments (duration 0) apply only their resource fields; the
	/// transform fields of a fragment are recorded data, not runtime
	/// state.
	fn apply_keyframe(&mut self, key: &Keyframe) {
		if let Some(image) = key.image {
			self.state.image = self.bounds.resolve_image(image);
		}
		if let Some(palette) = key.palette {
			self.state.palette = self.bounds.resolve_palette(palette);
		}
		if let Some(unknown) = key.unknown {
			self.state.unknown = unknown;
		}
		if key.duration == 0 {
			return;
		}
		if let Some(position) = key.position {
			self.state.position = position;
		}
		if let Some(rotation) = key.rotation {
			self.state.rotation = rotation;
		}
		if let Some(scale) = key.scale {
			self.state.scale = scale;
		}
	}
}
