use criterion::{Criterion, black_box, criterion_group, criterion_main};
use tm_curve::{ResampleMode, SmoothingSpline, resample};

fn noisy_arc(n: usize) -> (Vec<f64>, Vec<f64>) {
    let mut x = Vec::with_capacity(n);
    let mut y = Vec::with_capacity(n);
    for i in 0..n {
        let t = i as f64 / n as f64 * 3.0;
        let jitter = ((i * 37) % 11) as f64 * 1e-3;
        x.push(10.0 * t.cos() + jitter);
        y.push(6.0 * t.sin() - jitter);
    }
    (x, y)
}

fn bench_parametric(c: &mut Criterion) {
    let (x, y) = noisy_arc(400);

    c.bench_function("resample_parametric_400_to_1000", |b| {
        b.iter(|| {
            let out = resample(
                black_box(&x),
                black_box(&y),
                1000,
                ResampleMode::ParametricSpline { s: 0.0 },
            )
            .expect("valid curve");
            black_box(out);
        });
    });
}

fn bench_smoothing_search(c: &mut Criterion) {
    let t: Vec<f64> = (0..1000).map(|i| i as f64 * 0.1).collect();
    let y: Vec<f64> = t
        .iter()
        .enumerate()
        .map(|(i, v)| v.sin() + ((i * 13) % 7) as f64 * 0.05)
        .collect();

    c.bench_function("smoothing_spline_1000_s_eq_n", |b| {
        b.iter(|| {
            let sp = SmoothingSpline::fit(black_box(&t), black_box(&y), 1000.0)
                .expect("valid knots");
            black_box(sp.residual());
        });
    });
}

criterion_group!(benches, bench_parametric, bench_smoothing_search);
criterion_main!(benches);
