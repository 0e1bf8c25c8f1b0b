//! Converters between the linear and keyframe program representations.
//!
//! Both directions are structural, total functions: nothing authored is
//! silently dropped, and interpreting the converted program tick-by-tick
//! yields the same [`RuntimeState`] sequence as interpreting the original.
//!
//! Linear to keyframe applies the same grouping rule the keyframe decoder
//! would apply to raw words: a run of non-branch state instructions
//! terminated by a Wait becomes one [`Keyframe`] whose duration is the
//! Wait's count. A branch arriving mid-run forces a keyframe boundary; the
//! partial keyframe is flushed as a zero-duration fragment and a warning
//! is logged, because its transform fields will no longer apply at
//! runtime. The same happens to a run left dangling at the end of the
//! program.
//!
//! Keyframe to linear re-emits each keyframe as a label plus its state
//! instructions plus the Wait, then deletes every label no branch
//! references.
//!
//! [`RuntimeState`]: crate::state::RuntimeState
//!
//! # Examples
//!
//! ```
//! use partanim::convert::{keyframe_to_linear, linear_to_keyframe};
//! use partanim::linear::{LabelNames, LinearProgram};
//!
//! // SetImage(1), Wait(10), Goto 0x0000
//! let words = [0x1001, 0x000A, 0x2000];
//! let linear = LinearProgram::decode(&words, &LabelNames::new())?;
//!
//! let (keyframes, stats) = linear_to_keyframe(&linear);
//! assert_eq!(stats.forced_flushes, 0);
//! assert_eq!(keyframes.keyframe_count(), 1);
//!
//! let back = keyframe_to_linear(&keyframes);
//! let (encoded, _names) = back.encode()?;
//! assert_eq!(encoded, words);
//! # Ok::<(), partanim::ScriptError>(())
//! ```

use std::collections::{HashMap, HashSet};

use crate::keyframe::{KeyId, Keyframe, KeyframeElement, KeyframeProgram};
use crate::linear::{LabelId, LinearElement, LinearProgram};
use crate::value::ScaleMode;

/// What a linear-to-keyframe conversion had to recover from.
///
/// All of these are warnings, not errors: the converted program is always
/// usable. They exist so an editor can surface the spots where the linear
/// source did not fit the keyframe shape cleanly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertStats {
	/// Keyframes flushed early because a branch interrupted their run.
	/// Each flush demotes the keyframe to a zero-duration fragment.
	pub forced_flushes: usize,
	/// A run without a terminating Wait reached the end of the program and
	/// was flushed as a fragment.
	pub dangling_flush: bool,
	/// Labels that never attached to any keyframe; branches to them stay
	/// dangling.
	pub stray_labels: usize,
}

/// Intermediate element with branch targets still in label space.
enum Pending {
	Key(Keyframe, Vec<LabelId>),
	Parent(u8),
	Notify(u8),
	Goto(LabelId),
	Loop(LabelId, u16),
}

/// Converts a linear program into the equivalent keyframe program.
///
/// Recovered irregularities (forced flushes, dangling runs, stray labels)
/// are logged as warnings and reported in the returned [`ConvertStats`].
pub fn linear_to_keyframe(program: &LinearProgram) -> (KeyframeProgram, ConvertStats) {
	let mut stats = ConvertStats::default();
	let mut pending: Vec<Pending> = Vec::new();
	let mut building: Option<Keyframe> = None;
	let mut labels: Vec<LabelId> = Vec::new();
	let mut first_label_name: Option<String> = None;

	let mut flush = |building: &mut Option<Keyframe>,
	                 labels: &mut Vec<LabelId>,
	                 first_label_name: &mut Option<String>,
	                 pending: &mut Vec<Pending>,
	                 duration: u16| {
		let mut key = building.take().unwrap_or_default();
		key.duration = duration;
		key.name = first_label_name
			.take()
			.unwrap_or_else(|| format!("key_{}", count_keys(pending)));
		pending.push(Pending::Key(key, std::mem::take(labels)));
	};

	for (index, element) in program.elements().iter().enumerate() {
		match element {
			LinearElement::Label {
				id,
				name,
			} => {
				labels.push(*id);
				if first_label_name.is_none() {
					first_label_name = Some(name.clone());
				}
			}
			LinearElement::Wait {
				count,
			} => {
				flush(&mut building, &mut labels, &mut first_label_name, &mut pending, *count);
			}
			LinearElement::SetImage {
				image,
			} => {
				building.get_or_insert_with(Keyframe::default).image = Some(*image);
			}
			LinearElement::SetPalette {
				palette,
			} => {
				building.get_or_insert_with(Keyframe::default).palette = Some(*palette);
			}
			LinearElement::SetUnknown {
				value,
			} => {
				building.get_or_insert_with(Keyframe::default).unknown = Some(*value);
			}
			LinearElement::SetPosition {
				position,
			} => {
				building.get_or_insert_with(Keyframe::default).position = Some(*position);
			}
			LinearElement::SetRotation {
				rotation,
			} => {
				building.get_or_insert_with(Keyframe::default).rotation = Some(*rotation);
			}
			LinearElement::SetScale {
				mode,
				percent,
			} => {
				let key = building.get_or_insert_with(Keyframe::default);
				let mut scale = key.scale.unwrap_or_default();
				scale.apply(*mode, *percent);
				key.scale = Some(scale);
			}
			// Parent and notify are field-disjoint from the keyframe
			// state, so emitting them in place keeps tick-identical
			// semantics even mid-run.
			LinearElement::SetParent {
				part,
			} => pending.push(Pending::Parent(*part)),
			LinearElement::SetNotify {
				value,
			} => pending.push(Pending::Notify(*value)),
			LinearElement::Goto {
				target,
			} => {
				if building.is_some() {
					warn_forced_flush(index, &mut stats);
					flush(&mut building, &mut labels, &mut first_label_name, &mut pending, 0);
				}
				pending.push(Pending::Goto(*target));
			}
			LinearElement::Loop {
				target,
				count,
			} => {
				if building.is_some() {
					warn_forced_flush(index, &mut stats);
					flush(&mut building, &mut labels, &mut first_label_name, &mut pending, 0);
				}
				pending.push(Pending::Loop(*target, *count));
			}
		}
	}

	if building.is_some() {
		log::warn!("Run without terminating Wait at end of program; flushing as fragment");
		stats.dangling_flush = true;
		flush(&mut building, &mut labels, &mut first_label_name, &mut pending, 0);
	}
	if !labels.is_empty() {
		log::warn!("{} label(s) at end of program attach to no keyframe", labels.len());
		stats.stray_labels = labels.len();
	}

	// Resolve label-space branch targets into keyframe ids.
	let mut next_key = 0u32;
	let mut label_to_key: HashMap<LabelId, KeyId> = HashMap::new();
	let mut key_ids: Vec<KeyId> = Vec::new();
	for element in &pending {
		if let Pending::Key(_, attached) = element {
			let id = KeyId::from_raw(next_key);
			next_key += 1;
			key_ids.push(id);
			for label in attached {
				label_to_key.insert(*label, id);
			}
		}
	}

	let mut keys = key_ids.into_iter();
	let mut resolve = |label: LabelId, label_to_key: &mut HashMap<LabelId, KeyId>| {
		*label_to_key.entry(label).or_insert_with(|| {
			// Branch to a label that attached to no keyframe: mint a
			// dangling id so the branch renders as "missing".
			let id = KeyId::from_raw(next_key);
			next_key += 1;
			id
		})
	};

	let elements = pending
		.into_iter()
		.map(|element| match element {
			Pending::Key(key, _) => KeyframeElement::Keyframe {
				id: keys.next().unwrap_or_else(|| unreachable!("id per keyframe")),
				key,
			},
			Pending::Parent(part) => KeyframeElement::Parent {
				part,
			},
			Pending::Notify(value) => KeyframeElement::Notify {
				value,
			},
			Pending::Goto(label) => KeyframeElement::Goto {
				target: resolve(label, &mut label_to_key),
			},
			Pending::Loop(label, count) => KeyframeElement::Loop {
				target: resolve(label, &mut label_to_key),
				count,
			},
		})
		.collect();

	(KeyframeProgram::from_elements(elements), stats)
}

/// Converts a keyframe program into the equivalent linear program.
///
/// Every keyframe emits a label named after it, its state instructions,
/// and (for non-fragments) the Wait holding them. Labels that end up
/// unreferenced are deleted afterwards, so a branch-free program encodes
/// with an empty name table.
pub fn keyframe_to_linear(program: &KeyframeProgram) -> LinearProgram {
	let mut next_label = 0u32;
	let mut key_to_label: HashMap<KeyId, LabelId> = HashMap::new();
	for element in program.elements() {
		if let KeyframeElement::Keyframe {
			id,
			..
		} = element
		{
			key_to_label.insert(*id, LabelId::from_raw(next_label));
			next_label += 1;
		}
	}

	let mut resolve = |key: KeyId, key_to_label: &mut HashMap<KeyId, LabelId>| {
		*key_to_label.entry(key).or_insert_with(|| {
			let id = LabelId::from_raw(next_label);
			next_label += 1;
			id
		})
	};

	let mut elements: Vec<LinearElement> = Vec::new();
	let mut key_index = 0usize;
	for element in program.elements() {
		match element {
			KeyframeElement::Keyframe {
				id,
				key,
			} => {
				let name = if key.name.is_empty() {
					format!("key_{key_index}")
				} else {
					key.name.clone()
				};
				key_index += 1;
				elements.push(LinearElement::Label {
					id: key_to_label[id],
					name,
				});
				if key.duration > 0 {
					if let Some(position) = key.position {
						if !position.is_identity() {
							elements.push(LinearElement::SetPosition {
								position,
							});
						}
					}
					if let Some(rotation) = key.rotation {
						if !rotation.is_zero() {
							elements.push(LinearElement::SetRotation {
								rotation,
							});
						}
					}
					if let Some(scale) = key.scale {
						if !scale.is_default() {
							if scale.is_uniform() {
								elements.push(LinearElement::SetScale {
									mode: ScaleMode::Uniform,
									percent: scale.x,
								});
							} else {
								for (mode, percent) in [
									(ScaleMode::X, scale.x),
									(ScaleMode::Y, scale.y),
									(ScaleMode::Z, scale.z),
								] {
									if percent != crate::constants::SCALE_DEFAULT {
										elements.push(LinearElement::SetScale {
											mode,
											percent,
										});
									}
								}
							}
						}
					}
				}
				if let Some(image) = key.image {
					elements.push(LinearElement::SetImage {
						image,
					});
				}
				if let Some(palette) = key.palette {
					elements.push(LinearElement::SetPalette {
						palette,
					});
				}
				if let Some(value) = key.unknown {
					elements.push(LinearElement::SetUnknown {
						value,
					});
				}
				if key.duration > 0 {
					elements.push(LinearElement::Wait {
						count: key.duration,
					});
				}
			}
			KeyframeElement::Parent {
				part,
			} => elements.push(LinearElement::SetParent {
				part: *part,
			}),
			KeyframeElement::Notify {
				value,
			} => elements.push(LinearElement::SetNotify {
				value: *value,
			}),
			KeyframeElement::Goto {
				target,
			} => elements.push(LinearElement::Goto {
				target: resolve(*target, &mut key_to_label),
			}),
			KeyframeElement::Loop {
				target,
				count,
			} => elements.push(LinearElement::Loop {
				target: resolve(*target, &mut key_to_label),
				count: *count,
			}),
		}
	}

	// Dead-label elimination: labels are metadata, keep only the ones a
	// branch still needs.
	let referenced: HashSet<LabelId> =
		elements.iter().filter_map(LinearElement::branch_target).collect();
	elements.retain(|element| match element {
		LinearElement::Label {
			id,
			..
		} => referenced.contains(id),
		_ => true,
	});

	LinearProgram::from_elements(elements)
}

fn count_keys(pending: &[Pending]) -> usize {
	pending
		.iter()
		.filter(|element| matches!(element, Pending::Key(..)))
		.count()
}

fn warn_forced_flush(index: usize, stats: &mut ConvertStats) {
	log::warn!(
		"Branch at element {index} interrupts a partially built keyframe; flushing it as a fragment"
	);
	stats.forced_flushes += 1;
}
