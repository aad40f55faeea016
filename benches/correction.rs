use criterion::{black_box, criterion_group, criterion_main, Criterion};
use opencv::core::Mat;
use underwater_color::{
    analyze_and_classify, auto_tune, image_buffer, process, FusionMethod, ProcessingParameters,
};

/// 640x480 green lake frame with gradients and a repeating texture
fn lake_frame() -> Mat {
    let (rows, cols) = (480, 640);
    let data: Vec<[u8; 3]> = (0..rows * cols)
        .map(|i| {
            let x = i % cols;
            let y = i / cols;
            let t = ((x / 8 + y / 8) % 2) as u8 * 20;
            [
                (40 + x * 60 / cols) as u8 + t,
                (110 + y * 80 / rows) as u8 + t,
                (30 + x * 30 / cols) as u8 + t / 2,
            ]
        })
        .collect();
    image_buffer::from_bgr_pixels(rows as i32, cols as i32, &data).expect("bench frame")
}

fn benchmark_analysis(c: &mut Criterion) {
    let frame = lake_frame();
    c.bench_function("analyze_and_classify_640x480", |b| {
        b.iter(|| analyze_and_classify(black_box(&frame)).expect("analysis"))
    });
    c.bench_function("auto_tune_640x480", |b| {
        b.iter(|| auto_tune(black_box(&frame), None).expect("tuning"))
    });
}

fn benchmark_pipeline(c: &mut Criterion) {
    let frame = lake_frame();
    let params = auto_tune(&frame, None).expect("tuning");
    let fused = ProcessingParameters {
        fusion_enabled: true,
        fusion_method: FusionMethod::Pca,
        ..params.clone()
    };

    let mut group = c.benchmark_group("process_640x480");
    group.sample_size(20);
    group.bench_function("tuned", |b| {
        b.iter(|| process(black_box(&frame), black_box(&params)).expect("process"))
    });
    group.bench_function("tuned_pca_fusion", |b| {
        b.iter(|| process(black_box(&frame), black_box(&fused)).expect("process"))
    });
    group.finish();
}

criterion_group!(benches, benchmark_analysis, benchmark_pipeline);
criterion_main!(benches);
