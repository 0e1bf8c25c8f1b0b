//! This crate decodes, edits, converts, and executes part animation scripts:
//! the 16-bit-word bytecode that drives individual sprite parts of a layered
//! character animation.
//!
//! # Representations
//!
//! The same program exists in three forms, all interconvertible:
//!
//! - **Words**: the raw instruction stream, one [`instruction::Instruction`]
//!   per one to four 16-bit words
//! - **Linear**: [`linear::LinearProgram`], instructions 1:1 plus named
//!   [`linear::LinearElement::Label`] markers; branches reference labels by
//!   stable id instead of word offset, so edits never corrupt targets
//! - **Keyframe**: [`keyframe::KeyframeProgram`], runs of state changes
//!   grouped with their hold into timed [`keyframe::Keyframe`] poses, the
//!   shape an editor timeline works with
//!
//! Both program forms have a stepping interpreter
//! ([`linear::LinearInterpreter`], [`keyframe::KeyframeInterpreter`])
//! producing identical per-tick [`state::RuntimeState`] sequences, and
//! [`timing::analyze`] annotates a keyframe program with cumulative start
//! times without running it in real time.
//!
//! # Examples
//!
//! Using the prelude (recommended):
//!
//! ```
//! use partanim::prelude::*;
//!
//! // SetImage(1), Wait(10), Goto(0): show image 1 for 10 ticks, repeat.
//! let words = [0x1001, 0x000A, 0x2000];
//! let program = LinearProgram::decode(&words, &LabelNames::new())?;
//!
//! let mut interp = LinearInterpreter::new(&program);
//! interp.step();
//! assert_eq!(interp.state().image, Some(1));
//! # Ok::<(), partanim::ScriptError>(())
//! ```
//!
//! Or use explicit paths:
//!
//! ```
//! use partanim::linear::{LabelNames, LinearProgram};
//!
//! let program = LinearProgram::decode(&[0x0005], &LabelNames::new())?;
//! # Ok::<(), partanim::ScriptError>(())
//! ```

pub mod constants;
pub mod convert;
pub mod error;
pub mod instruction;
pub mod keyframe;
pub mod limits;
pub mod linear;
pub mod state;
pub mod timing;
pub mod value;

/// `use partanim::prelude::*;` to import commonly used items.
pub mod prelude;

pub use error::ScriptError;
