use criterion::{Criterion, black_box, criterion_group, criterion_main};
use tm_core::linspace;
use tm_xcorr::{XCorrConfig, xcorr_map};

fn stack(rows: usize, k: usize) -> (Vec<Vec<f64>>, Vec<f64>, Vec<f64>) {
    let x = linspace(0.0, 1.0, k);
    let z = (0..rows)
        .map(|r| {
            let center = 0.3 + 0.01 * r as f64;
            x.iter()
                .map(|&v| (-(v - center).powi(2) / 0.002).exp() + 0.05)
                .collect()
        })
        .collect();
    let y = (0..rows).map(|r| r as f64).collect();
    (z, x, y)
}

fn bench_map(c: &mut Criterion) {
    let (z, x, y) = stack(32, 200);

    c.bench_function("xcorr_map_32x200_raw", |b| {
        b.iter(|| {
            let map = xcorr_map(black_box(&z), &x, &y, &XCorrConfig { resample: false })
                .expect("valid stack");
            black_box(map.ccmax);
        });
    });

    c.bench_function("xcorr_map_32x200_regridded", |b| {
        b.iter(|| {
            let map =
                xcorr_map(black_box(&z), &x, &y, &XCorrConfig::default()).expect("valid stack");
            black_box(map.ccmax);
        });
    });
}

criterion_group!(benches, bench_map);
criterion_main!(benches);
