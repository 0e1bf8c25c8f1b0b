//! Prelude module for `partanim`.
//!
//! This module provides a convenient way to import commonly used types,
//! functions, and constants.
//!
//! # Examples
//!
//! ```
//! use partanim::prelude::*;
//!
//! let mut program = KeyframeProgram::new();
//! let idle = program.push_keyframe(Keyframe::new("idle", 10));
//! program.push(KeyframeElement::Goto { target: idle });
//!
//! let linear = keyframe_to_linear(&program);
//! let (words, names) = linear.encode()?;
//! # Ok::<(), partanim::ScriptError>(())
//! ```

#[doc(inline)]
pub use crate::error::ScriptError;

// Wire level
#[doc(inline)]
pub use crate::instruction::Instruction;

// Linear representation
#[doc(inline)]
pub use crate::linear::{
	LabelId,
	LabelNames,
	LinearElement,
	LinearInterpreter,
	LinearProgram,
};

// Keyframe representation
#[doc(inline)]
pub use crate::keyframe::{
	KeyId,
	Keyframe,
	KeyframeElement,
	KeyframeInterpreter,
	KeyframeProgram,
};

// Conversion and analysis
#[doc(inline)]
pub use crate::convert::{ConvertStats, keyframe_to_linear, linear_to_keyframe};

#[doc(inline)]
pub use crate::timing::{TimingMap, analyze};

// Runtime
#[doc(inline)]
pub use crate::limits::StepLimits;

#[doc(inline)]
pub use crate::state::{CatalogBounds, RuntimeState};

#[doc(inline)]
pub use crate::value::{PositionDelta, ResourceRef, Rotation, ScaleMode, ScaleTriple};
