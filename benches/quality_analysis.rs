use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fossil_capture::{AnalyzerConfig, QualityAnalyzer};
use image::{Rgb, RgbImage};

fn specimen(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let dx = x as f32 - width as f32 / 2.0;
        let dy = y as f32 - height as f32 / 2.0;
        if dx * dx + dy * dy < (height as f32 / 4.0).powi(2) {
            Rgb([110, 95, 80])
        } else if (x + y) % 2 == 0 {
            Rgb([180, 180, 175])
        } else {
            Rgb([196, 196, 190])
        }
    })
}

fn benchmark_quality_analysis(c: &mut Criterion) {
    let image = specimen(1280, 960);

    let post = QualityAnalyzer::new(AnalyzerConfig::post_capture()).unwrap();
    c.bench_function("analyze_post_capture_1280x960", |b| {
        b.iter(|| post.analyze(black_box(&image)))
    });

    let live = QualityAnalyzer::new(AnalyzerConfig::real_time()).unwrap();
    c.bench_function("analyze_real_time_1280x960", |b| {
        b.iter(|| live.analyze(black_box(&image)))
    });

    let mut sequential = AnalyzerConfig::default();
    sequential.parallel = false;
    let sequential = QualityAnalyzer::new(sequential).unwrap();
    c.bench_function("analyze_sequential_1280x960", |b| {
        b.iter(|| sequential.analyze(black_box(&image)))
    });
}

criterion_group!(benches, benchmark_quality_analysis);
criterion_main!(benches);
