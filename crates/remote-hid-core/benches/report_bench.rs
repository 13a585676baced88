//! Criterion benchmarks for report encoding and text planning.
//!
//! Run with:
//! ```bash
//! cargo bench --package remote-hid-core --bench report_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use remote_hid_core::report::{descriptor, encoder};
use remote_hid_core::{plan_text, ConsumerUsage, HidKeyCode, Modifiers, MouseButtons, Report};

fn bench_mouse_move(c: &mut Criterion) {
    let buttons = MouseButtons::from_bits(0x01);
    c.bench_function("encoder/mouse_move", |b| {
        b.iter(|| encoder::mouse_move(black_box(buttons), black_box(300), black_box(-12)))
    });
}

fn bench_key_press(c: &mut Criterion) {
    c.bench_function("encoder/key_press", |b| {
        b.iter(|| encoder::key_press(black_box(Modifiers::LEFT_CTRL), black_box(HidKeyCode::KeyC)))
    });
}

fn bench_report_to_vec(c: &mut Criterion) {
    let report: Report = encoder::consumer_press(ConsumerUsage::Mute).into();
    c.bench_function("report/to_vec", |b| b.iter(|| black_box(report).to_vec()));
}

fn bench_plan_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_text");
    for len in [16usize, 256, 4096] {
        let text: String = "Hello, World! ".chars().cycle().take(len).collect();
        group.bench_with_input(BenchmarkId::from_parameter(len), &text, |b, text| {
            b.iter(|| plan_text(black_box(text)))
        });
    }
    group.finish();
}

fn bench_descriptor_walk(c: &mut Criterion) {
    c.bench_function("descriptor/report_layouts", |b| {
        b.iter(|| descriptor::report_layouts(black_box(descriptor::COMBO_DESCRIPTOR)))
    });
}

criterion_group!(
    benches,
    bench_mouse_move,
    bench_key_press,
    bench_report_to_vec,
    bench_plan_text,
    bench_descriptor_walk
);
criterion_main!(benches);
