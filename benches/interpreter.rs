//! Benchmark suite for program decoding and interpreter stepping
//!
//! `step()` runs once per animated part per tick, so its cost bounds how
//! many parts a scene can animate.
//!
//! Run with: cargo bench

use std::hint::black_box;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use partanim::convert::linear_to_keyframe;
use partanim::linear::{LabelNames, LinearInterpreter, LinearProgram};

/// Builds a looping program with `poses` image/position/wait groups.
fn synthetic_words(poses: u16) -> Vec<u16> {
	let mut words = Vec::new();
	for pose in 0..poses {
		words.push(0x1000 | (pose & 0x0FFF)); // SetImage(pose)
		words.push(0x3001); // SetPosition(flag, pose, -1, 0)
		words.push(pose);
		words.push(0xFFFF);
		words.push(0x0000);
		words.push(0x0002); // Wait(2)
	}
	words.push(0x2000); // Goto 0
	words
}

fn bench_decode(c: &mut Criterion) {
	let mut group = c.benchmark_group("decode");
	let words = synthetic_words(64);
	group.throughput(Throughput::Elements(words.len() as u64));
	group.bench_function("linear", |b| {
		b.iter(|| LinearProgram::decode(black_box(&words), &LabelNames::new()));
	});
	group.finish();
}

fn bench_step(c: &mut Criterion) {
	let words = synthetic_words(64);
	let program = LinearProgram::decode(&words, &LabelNames::new()).unwrap();

	let mut group = c.benchmark_group("interpreter");
	group.throughput(Throughput::Elements(1000));
	group.bench_function("step_1000_ticks", |b| {
		b.iter(|| {
			let mut interp = LinearInterpreter::new(&program);
			for _ in 0..1000 {
				interp.step();
			}
			black_box(interp.state().clone())
		});
	});
	group.finish();
}

fn bench_convert(c: &mut Criterion) {
	let words = synthetic_words(64);
	let program = LinearProgram::decode(&words, &LabelNames::new()).unwrap();

	c.bench_function("linear_to_keyframe", |b| {
		b.iter(|| linear_to_keyframe(black_box(&program)));
	});
}

criterion_group!(benches, bench_decode, bench_step, bench_convert);
criterion_main!(benches);
